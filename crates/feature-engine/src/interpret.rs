//! Interpreters for the body-producing features: extrude, revolve, and
//! boolean. Each computes everything it needs, runs the kernel ops, and
//! only then commits registry edits — a failing feature leaves the
//! registry exactly as it found it.

use anvil_types::{
    dot, palette_color, sub, BodyId, BodyOp, BooleanFeature, ErrorCode, ExtrudeDirection,
    ExtrudeExtent, ExtrudeFeature, FeatureId, MergeScope, Profile, RevolveFeature, TopoRef,
    THROUGH_ALL_DISTANCE,
};
use modeling_ops::{execute_boolean, execute_extrude, execute_revolve, OpOutput};

use crate::context::Session;
use crate::planes::sketch_line_axis;
use crate::types::{BodyEntry, InterpretError};

pub fn interpret_extrude(
    session: &mut Session<'_>,
    feature_id: FeatureId,
    extrude: &ExtrudeFeature,
) -> Result<(), InterpretError> {
    let profile = profile_of(session, extrude.sketch, &[])?;
    let distance = extent_distance(session, extrude, &profile)?;
    let output = execute_extrude(session.kernel, &profile, distance)?;
    integrate_body(
        session,
        feature_id,
        output,
        extrude.op,
        extrude.merge_scope,
        &extrude.target_bodies,
        extrude.result_body_name.as_deref(),
        extrude.result_body_color.as_deref(),
    )
}

pub fn interpret_revolve(
    session: &mut Session<'_>,
    feature_id: FeatureId,
    revolve: &RevolveFeature,
) -> Result<(), InterpretError> {
    // The axis line is construction geometry for the profile.
    let profile = profile_of(session, revolve.sketch, &[revolve.axis.as_str()])?;
    let (axis_origin, axis_dir) = sketch_line_axis(session, revolve.sketch, &revolve.axis)?;
    let angle = revolve.angle.to_radians();
    let output = execute_revolve(session.kernel, &profile, axis_origin, axis_dir, angle)?;
    integrate_body(
        session,
        feature_id,
        output,
        revolve.op,
        revolve.merge_scope,
        &revolve.target_bodies,
        revolve.result_body_name.as_deref(),
        revolve.result_body_color.as_deref(),
    )
}

pub fn interpret_boolean(
    session: &mut Session<'_>,
    _feature_id: FeatureId,
    boolean: &BooleanFeature,
) -> Result<(), InterpretError> {
    let target_index = session.body_index_by_source(boolean.target).ok_or_else(|| {
        InterpretError::invalid_reference(format!("target {} has no body", boolean.target))
    })?;
    let tool_index = session.body_index_by_source(boolean.tool).ok_or_else(|| {
        InterpretError::invalid_reference(format!("tool {} has no body", boolean.tool))
    })?;
    if target_index == tool_index {
        return Err(InterpretError::invalid_reference(
            "boolean target and tool are the same body",
        ));
    }

    let target_handle = session.registry[target_index].handle;
    let tool_handle = session.registry[tool_index].handle;
    let output = execute_boolean(session.kernel, &target_handle, &tool_handle, boolean.operation)?;

    // The result replaces the target; the tool is consumed.
    session.registry[target_index].handle = output.handle;
    session.registry[target_index].roles = output.roles;
    session.registry.remove(tool_index);
    Ok(())
}

/// Extract the closed profile of a previously-solved sketch.
pub(crate) fn profile_of(
    session: &Session<'_>,
    sketch: FeatureId,
    exclude: &[&str],
) -> Result<Profile, InterpretError> {
    let state = session.sketches.get(&sketch).ok_or_else(|| {
        InterpretError::new(
            ErrorCode::SketchNotFound,
            format!("sketch {sketch} has no solved result"),
        )
    })?;
    state.solver.to_profile(exclude).ok_or_else(|| {
        InterpretError::new(
            ErrorCode::NoClosedProfile,
            format!("sketch {sketch} contains no closed region"),
        )
    })
}

/// Signed sweep distance per the extent rule, in millimetres.
fn extent_distance(
    session: &Session<'_>,
    extrude: &ExtrudeFeature,
    profile: &Profile,
) -> Result<f64, InterpretError> {
    let sign = match extrude.direction {
        ExtrudeDirection::Normal => 1.0,
        ExtrudeDirection::Reverse => -1.0,
    };
    match extrude.extent {
        ExtrudeExtent::Blind => Ok(extrude.distance * session.scale * sign),
        ExtrudeExtent::ThroughAll => Ok(THROUGH_ALL_DISTANCE * session.scale * sign),
        ExtrudeExtent::ToFace => {
            let target = extrude.extent_ref.as_ref().ok_or_else(|| {
                InterpretError::invalid_reference("toFace extent without a face reference")
            })?;
            let (entry_index, face) = session.resolve_face(target)?;
            let handle = session.registry[entry_index].handle;
            let centroid = session
                .kernel
                .queries()
                .face_centroid(&handle, face)
                .ok_or_else(|| {
                    InterpretError::invalid_reference(format!("{target} has no centroid"))
                })?;
            Ok(signed_offset(profile, centroid))
        }
        ExtrudeExtent::ToVertex => {
            // Signed distance along the sketch normal, like toFace;
            // falls back to blind when the vertex cannot be resolved.
            let position = extrude
                .extent_ref
                .as_ref()
                .and_then(|r| match r {
                    v @ TopoRef::Vertex { .. } => session.resolve_vertex(v).ok(),
                    _ => None,
                });
            match position {
                Some(p) => Ok(signed_offset(profile, p)),
                None => Ok(extrude.distance * session.scale * sign),
            }
        }
    }
}

fn signed_offset(profile: &Profile, point: anvil_types::Vec3) -> f64 {
    dot(sub(point, profile.plane.origin), profile.plane.normal)
}

/// Fold a new body into the registry per op and merge policy.
#[allow(clippy::too_many_arguments)]
fn integrate_body(
    session: &mut Session<'_>,
    feature_id: FeatureId,
    output: OpOutput,
    op: BodyOp,
    merge_scope: MergeScope,
    target_bodies: &[FeatureId],
    name: Option<&str>,
    color: Option<&str>,
) -> Result<(), InterpretError> {
    match op {
        BodyOp::Cut => {
            if session.registry.is_empty() {
                return Err(InterpretError::build("nothing to cut from"));
            }
            // Subtract the tool from every body, in insertion order;
            // stage the new handles, then commit all at once.
            let targets: Vec<_> = session.registry.iter().map(|e| e.handle).collect();
            let mut staged = Vec::with_capacity(targets.len());
            for target in targets {
                let result = session.kernel.subtract(&target, &output.handle)?;
                staged.push(result);
            }
            for (entry, handle) in session.registry.iter_mut().zip(staged) {
                entry.handle = handle;
            }
            Ok(())
        }
        BodyOp::Add => {
            match merge_scope {
                MergeScope::New => {
                    push_new_body(session, feature_id, output, name, color);
                    Ok(())
                }
                MergeScope::Specific => {
                    let mut resolved: Vec<usize> = Vec::new();
                    for target in target_bodies {
                        if let Some(index) = session.body_index_by_source(*target) {
                            resolved.push(index);
                        }
                    }
                    if resolved.is_empty() {
                        push_new_body(session, feature_id, output, name, color);
                        return Ok(());
                    }
                    merge_into(session, output, &resolved)
                }
                MergeScope::Auto => {
                    let overlapping: Vec<usize> = session
                        .registry
                        .iter()
                        .enumerate()
                        .filter(|(_, entry)| {
                            session
                                .kernel
                                .queries()
                                .overlaps(&entry.handle, &output.handle)
                        })
                        .map(|(i, _)| i)
                        .collect();
                    if overlapping.is_empty() {
                        push_new_body(session, feature_id, output, name, color);
                        return Ok(());
                    }
                    merge_into(session, output, &overlapping)
                }
            }
        }
    }
}

fn push_new_body(
    session: &mut Session<'_>,
    feature_id: FeatureId,
    output: OpOutput,
    name: Option<&str>,
    color: Option<&str>,
) {
    let ordinal = session
        .registry
        .iter()
        .filter(|e| e.id.source == feature_id)
        .count() as u32;
    let name = name
        .map(|n| n.to_string())
        .unwrap_or_else(|| format!("Body {}", session.bodies_created + 1));
    let color = color
        .map(|c| c.to_string())
        .unwrap_or_else(|| palette_color(session.bodies_created).to_string());
    session.registry.push(BodyEntry {
        id: BodyId::new(feature_id, ordinal),
        handle: output.handle,
        name,
        color,
        roles: output.roles,
    });
    session.bodies_created += 1;
}

/// Union the new body into the listed registry entries, in order. The
/// first target keeps its identity; the rest collapse into it.
fn merge_into(
    session: &mut Session<'_>,
    output: OpOutput,
    targets: &[usize],
) -> Result<(), InterpretError> {
    let mut acc = output.handle;
    let mut staged = Vec::with_capacity(targets.len());
    for &index in targets {
        let target = session.registry[index].handle;
        acc = session.kernel.union(&target, &acc)?;
        staged.push(index);
    }
    let keep = staged[0];
    session.registry[keep].handle = acc;
    session.registry[keep].roles = Vec::new();
    // Remove collapsed entries from the back so indices stay valid.
    for &index in staged[1..].iter().rev() {
        session.registry.remove(index);
    }
    Ok(())
}
