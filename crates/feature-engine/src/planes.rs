//! Plane and axis resolution.
//!
//! Datum planes carry their basis verbatim; derived planes compute one
//! from upstream features at interpretation time. Face-based planes
//! must land on a planar face, and a reversed face flips the sketch
//! basis normal.

use anvil_types::{
    add, cross, dot, normalized, scale, sub, AxisDefinition, AxisFeature, PlaneBasis,
    PlaneDefinition, PlaneFeature, PlaneRef, SketchEntity, Vec3,
};
use geo_kernel::SurfaceKind;

use crate::context::Session;
use crate::types::InterpretError;

pub fn resolve_plane_feature(
    session: &Session<'_>,
    plane: &PlaneFeature,
) -> Result<PlaneBasis, InterpretError> {
    let s = session.scale;
    match &plane.definition {
        PlaneDefinition::Datum => {
            let normal = normalized(plane.normal)
                .ok_or_else(|| InterpretError::invalid_reference("plane normal is zero"))?;
            let x_dir = normalized(plane.x_dir)
                .ok_or_else(|| InterpretError::invalid_reference("plane x direction is zero"))?;
            Ok(PlaneBasis::new(scale_vec(plane.origin, s), normal, x_dir))
        }
        PlaneDefinition::OffsetFromPlane { base, offset } => {
            let base_basis = session.planes.get(base).copied().ok_or_else(|| {
                InterpretError::invalid_reference(format!("plane {base} not resolved"))
            })?;
            Ok(PlaneBasis::new(
                add(base_basis.origin, scale(base_basis.normal, offset * s)),
                base_basis.normal,
                base_basis.x_dir,
            ))
        }
        PlaneDefinition::OffsetFromFace { face, offset } => {
            let basis = face_plane(session, face)?;
            Ok(PlaneBasis::new(
                add(basis.origin, scale(basis.normal, offset * s)),
                basis.normal,
                basis.x_dir,
            ))
        }
        PlaneDefinition::Midplane { first, second } => {
            let a = session.planes.get(first).copied().ok_or_else(|| {
                InterpretError::invalid_reference(format!("plane {first} not resolved"))
            })?;
            let b = session.planes.get(second).copied().ok_or_else(|| {
                InterpretError::invalid_reference(format!("plane {second} not resolved"))
            })?;
            let normal = normalized(add(a.normal, b.normal)).unwrap_or(a.normal);
            Ok(PlaneBasis::new(
                scale(add(a.origin, b.origin), 0.5),
                normal,
                a.x_dir,
            ))
        }
        PlaneDefinition::AxisAngle {
            base,
            axis,
            angle_degrees,
        } => {
            let basis = session.planes.get(base).copied().ok_or_else(|| {
                InterpretError::invalid_reference(format!("plane {base} not resolved"))
            })?;
            let (axis_origin, axis_dir) = session.axes.get(axis).copied().ok_or_else(|| {
                InterpretError::invalid_reference(format!("axis {axis} not resolved"))
            })?;
            let angle = angle_degrees.to_radians();
            let rotate = |v: Vec3| rotate_about(v, axis_dir, angle);
            let origin = add(axis_origin, rotate(sub(basis.origin, axis_origin)));
            Ok(PlaneBasis::new(origin, rotate(basis.normal), rotate(basis.x_dir)))
        }
        PlaneDefinition::ThreePoint { a, b, c } => {
            let pa = scale_vec(*a, s);
            let pb = scale_vec(*b, s);
            let pc = scale_vec(*c, s);
            let x_dir = normalized(sub(pb, pa)).ok_or_else(|| {
                InterpretError::invalid_reference("three-point plane: first two points coincide")
            })?;
            let normal = normalized(cross(sub(pb, pa), sub(pc, pa))).ok_or_else(|| {
                InterpretError::invalid_reference("three-point plane: points are collinear")
            })?;
            Ok(PlaneBasis::new(pa, normal, x_dir))
        }
    }
}

pub fn resolve_axis_feature(
    session: &Session<'_>,
    axis: &AxisFeature,
) -> Result<(Vec3, Vec3), InterpretError> {
    let s = session.scale;
    match &axis.definition {
        AxisDefinition::Datum => {
            let dir = normalized(axis.direction)
                .ok_or_else(|| InterpretError::invalid_reference("axis direction is zero"))?;
            Ok((scale_vec(axis.origin, s), dir))
        }
        AxisDefinition::TwoPoint { a, b } => {
            let pa = scale_vec(*a, s);
            let pb = scale_vec(*b, s);
            let dir = normalized(sub(pb, pa))
                .ok_or_else(|| InterpretError::invalid_reference("axis endpoints coincide"))?;
            Ok((pa, dir))
        }
        AxisDefinition::AlongEdge { edge } => {
            let geometry = session.resolve_edge(edge)?;
            let (start, end) = geometry.endpoints();
            let dir = normalized(sub(end, start)).ok_or_else(|| {
                InterpretError::invalid_reference("edge endpoints coincide (closed edge?)")
            })?;
            Ok((start, dir))
        }
        AxisDefinition::AlongSketchLine { sketch, line } => {
            sketch_line_axis(session, *sketch, line)
        }
    }
}

/// World-space axis from a line of a solved sketch.
pub fn sketch_line_axis(
    session: &Session<'_>,
    sketch: anvil_types::FeatureId,
    line: &str,
) -> Result<(Vec3, Vec3), InterpretError> {
    let state = session.sketches.get(&sketch).ok_or_else(|| {
        InterpretError::new(
            anvil_types::ErrorCode::SketchNotFound,
            format!("sketch {sketch} has no solved result"),
        )
    })?;
    let (start_id, end_id) = match state.solver.entities.get(line) {
        Some(SketchEntity::Line { start, end, .. }) => (start.clone(), end.clone()),
        _ => {
            return Err(InterpretError::invalid_reference(format!(
                "entity {line:?} is not a line in sketch {sketch}"
            )))
        }
    };
    let (su, sv) = state.solver.get_point(&start_id).ok_or_else(|| {
        InterpretError::invalid_reference(format!("line {line:?} start point missing"))
    })?;
    let (eu, ev) = state.solver.get_point(&end_id).ok_or_else(|| {
        InterpretError::invalid_reference(format!("line {line:?} end point missing"))
    })?;
    let start = state.plane.to_world(su, sv);
    let end = state.plane.to_world(eu, ev);
    let dir = normalized(sub(end, start))
        .ok_or_else(|| InterpretError::invalid_reference("axis line is degenerate"))?;
    Ok((start, dir))
}

/// Resolve a sketch's plane reference: a plane feature or a planar face
/// of a prior body. Reversed faces flip the basis normal.
pub fn resolve_plane_ref(
    session: &Session<'_>,
    plane_ref: &PlaneRef,
) -> Result<PlaneBasis, InterpretError> {
    match plane_ref {
        PlaneRef::PlaneFeatureId { target } => {
            session.planes.get(target).copied().ok_or_else(|| {
                InterpretError::invalid_reference(format!("plane feature {target} not resolved"))
            })
        }
        PlaneRef::FaceRef { target } => face_plane(session, target),
    }
}

fn face_plane(
    session: &Session<'_>,
    face_ref: &anvil_types::TopoRef,
) -> Result<PlaneBasis, InterpretError> {
    let (entry_index, face) = session.resolve_face(face_ref)?;
    let handle = session.registry[entry_index].handle;
    let queries = session.kernel.queries();
    if queries.face_surface(&handle, face) != Some(SurfaceKind::Plane) {
        return Err(InterpretError::invalid_reference(format!(
            "{face_ref} is not a planar face"
        )));
    }
    let basis = queries.face_plane(&handle, face).ok_or_else(|| {
        InterpretError::invalid_reference(format!("{face_ref} has no plane frame"))
    })?;
    if queries.face_is_reversed(&handle, face) {
        Ok(basis.flipped())
    } else {
        Ok(basis)
    }
}

pub(crate) fn scale_vec(v: Vec3, s: f64) -> Vec3 {
    [v[0] * s, v[1] * s, v[2] * s]
}

pub(crate) fn rotate_about(v: Vec3, axis: Vec3, angle: f64) -> Vec3 {
    let axis = normalized(axis).unwrap_or([0.0, 0.0, 1.0]);
    let (sin, cos) = angle.sin_cos();
    let kxv = cross(axis, v);
    let kdv = dot(axis, v);
    [
        v[0] * cos + kxv[0] * sin + axis[0] * kdv * (1.0 - cos),
        v[1] * cos + kxv[1] * sin + axis[1] * kdv * (1.0 - cos),
        v[2] * cos + kxv[2] * sin + axis[2] * kdv * (1.0 - cos),
    ]
}
