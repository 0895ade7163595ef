//! The rebuild orchestrator: re-derive the body set from scratch by
//! walking `featureOrder`, dispatching each feature to its interpreter,
//! and assembling the publishable output.
//!
//! Status machine per feature: computed | error | suppressed | gated.
//! The rebuild gate truncates the walk; errors do not — downstream
//! features keep evaluating so independent branches still produce
//! bodies. Kernel panics are caught and coerced to BUILD_ERROR; no
//! partial state escapes a failed feature.

use std::panic::{catch_unwind, AssertUnwindSafe};

use anvil_types::{
    BodySummary, ErrorCode, Feature, FeatureError, FeatureId, FeatureKind, FeatureStatus,
    NumericContext,
};
use doc_store::Document;
use geo_kernel::{AnalyticKernel, KernelSession};

use crate::context::Session;
use crate::interpret::{interpret_boolean, interpret_extrude, interpret_revolve};
use crate::planes::{resolve_axis_feature, resolve_plane_feature};
use crate::refs::RefIndex;
use crate::sketch::interpret_sketch;
use crate::types::{InterpretError, RebuildOutput};

type KernelFactory = Box<dyn Fn() -> Box<dyn KernelSession> + Send>;

/// The rebuild-domain engine. Owns the kernel session policy; each
/// rebuild runs against a fresh kernel so handles and topology are a
/// pure function of the document.
pub struct RebuildEngine {
    kernel_factory: KernelFactory,
    ctx: NumericContext,
}

impl RebuildEngine {
    pub fn new(kernel_factory: KernelFactory) -> Self {
        Self {
            kernel_factory,
            ctx: NumericContext::standard(),
        }
    }

    /// Engine backed by the deterministic analytic kernel.
    pub fn analytic() -> Self {
        Self::new(Box::new(|| {
            Box::new(AnalyticKernel::new()) as Box<dyn KernelSession>
        }))
    }

    pub fn numeric_context(&self) -> NumericContext {
        self.ctx
    }

    /// Full rebuild of `doc`. Never panics; per-feature failures land
    /// in the error list with the walk continuing behind them.
    pub fn rebuild(&self, doc: &Document) -> RebuildOutput {
        let mut kernel = (self.kernel_factory)();
        let scale = doc.units().to_mm();
        let mut session = Session::new(kernel.as_mut(), scale, self.ctx);
        let mut output = RebuildOutput::default();
        walk(&mut session, doc, &mut output);
        publish(&mut session, &mut output, scale);
        output
    }

    /// Transient sweep preview: rebuild, then sweep the named sketch
    /// without touching the body registry. Returns the preview mesh in
    /// document units.
    pub fn preview(
        &self,
        doc: &Document,
        spec: &PreviewSpec,
    ) -> Result<anvil_types::TriangleMesh, InterpretError> {
        let mut kernel = (self.kernel_factory)();
        let scale = doc.units().to_mm();
        let mut session = Session::new(kernel.as_mut(), scale, self.ctx);
        let mut output = RebuildOutput::default();
        walk(&mut session, doc, &mut output);

        let handle = match spec {
            PreviewSpec::Extrude {
                sketch,
                distance,
                direction,
            } => {
                let profile = crate::interpret::profile_of(&session, *sketch, &[])?;
                let sign = match direction {
                    anvil_types::ExtrudeDirection::Normal => 1.0,
                    anvil_types::ExtrudeDirection::Reverse => -1.0,
                };
                session.kernel.extrude(
                    &profile,
                    &geo_kernel::ExtrudeSpec {
                        distance: distance * scale * sign,
                    },
                )?
            }
            PreviewSpec::Revolve {
                sketch,
                axis,
                angle,
            } => {
                let profile = crate::interpret::profile_of(&session, *sketch, &[axis.as_str()])?;
                let (axis_origin, axis_dir) =
                    crate::planes::sketch_line_axis(&session, *sketch, axis)?;
                session.kernel.revolve(
                    &profile,
                    &geo_kernel::RevolveSpec {
                        axis_origin,
                        axis_dir,
                        angle: angle.to_radians(),
                    },
                )?
            }
        };
        let mut mesh = session.kernel.tessellate(&handle)?;
        if (scale - 1.0).abs() > f64::EPSILON {
            for p in &mut mesh.positions {
                *p /= scale;
            }
        }
        Ok(mesh)
    }

    /// STEP text for the last body of a full rebuild, via whatever the
    /// active kernel backend supports.
    pub fn export_step(&self, doc: &Document, name: &str) -> Result<String, InterpretError> {
        let mut kernel = (self.kernel_factory)();
        let scale = doc.units().to_mm();
        let mut session = Session::new(kernel.as_mut(), scale, self.ctx);
        let mut output = RebuildOutput::default();
        walk(&mut session, doc, &mut output);
        let entry = session
            .registry
            .last()
            .ok_or_else(|| InterpretError::build("no solid available for export"))?;
        session
            .kernel
            .export_step(&entry.handle, name)
            .map_err(|e| InterpretError::build(e.to_string()))
    }
}

/// A transient sweep requested by the UI while a dialog is open.
#[derive(Debug, Clone, PartialEq)]
pub enum PreviewSpec {
    Extrude {
        sketch: FeatureId,
        distance: f64,
        direction: anvil_types::ExtrudeDirection,
    },
    Revolve {
        sketch: FeatureId,
        axis: anvil_types::EntityId,
        angle: f64,
    },
}

/// Walk `featureOrder`, interpreting each feature and recording its
/// status. Shared by rebuilds, previews, and exports.
fn walk(session: &mut Session<'_>, doc: &Document, output: &mut RebuildOutput) {
    let order: Vec<FeatureId> = doc.feature_order().to_vec();
    let gate_index = doc
        .rebuild_gate()
        .and_then(|gate| order.iter().position(|&id| id == gate));

    for (position, &feature_id) in order.iter().enumerate() {
        if let Some(gate) = gate_index {
            if position > gate {
                output.statuses.insert(feature_id, FeatureStatus::Gated);
                continue;
            }
        }

        let feature = match doc.feature(feature_id) {
            Ok(feature) => feature,
            Err(parse_error) => {
                output.statuses.insert(feature_id, FeatureStatus::Error);
                output.errors.push(FeatureError::new(
                    feature_id,
                    ErrorCode::BuildError,
                    parse_error.to_string(),
                ));
                continue;
            }
        };

        if feature.suppressed {
            output.statuses.insert(feature_id, FeatureStatus::Suppressed);
            continue;
        }

        let result = catch_unwind(AssertUnwindSafe(|| {
            interpret_feature(session, &feature, output)
        }))
        .unwrap_or_else(|_| {
            Err(InterpretError::build(
                "kernel panicked during interpretation",
            ))
        });

        match result {
            Ok(()) => {
                output.statuses.insert(feature_id, FeatureStatus::Computed);
            }
            Err(err) => {
                output.statuses.insert(feature_id, FeatureStatus::Error);
                output.errors.push(err.to_feature_error(feature_id));
            }
        }
    }
}

fn interpret_feature(
    session: &mut Session<'_>,
    feature: &Feature,
    output: &mut RebuildOutput,
) -> Result<(), InterpretError> {
    match &feature.kind {
        FeatureKind::Origin => Ok(()),
        FeatureKind::Plane(plane) => {
            let basis = resolve_plane_feature(session, plane)?;
            session.planes.insert(feature.id, basis);
            Ok(())
        }
        FeatureKind::Axis(axis) => {
            let resolved = resolve_axis_feature(session, axis)?;
            session.axes.insert(feature.id, resolved);
            Ok(())
        }
        FeatureKind::Sketch(sketch) => {
            let solution = interpret_sketch(session, feature.id, sketch)?;
            output.sketches.push(solution);
            Ok(())
        }
        FeatureKind::Extrude(extrude) => interpret_extrude(session, feature.id, extrude),
        FeatureKind::Revolve(revolve) => interpret_revolve(session, feature.id, revolve),
        FeatureKind::Boolean(boolean) => interpret_boolean(session, feature.id, boolean),
    }
}

/// Assemble summaries, the reference index, and per-body meshes once
/// the walk is done.
fn publish(session: &mut Session<'_>, output: &mut RebuildOutput, scale: f64) {
    output.ref_index = RefIndex::build(&session.registry, session.kernel.queries());

    let entries: Vec<_> = session.registry.iter().cloned().collect();
    for entry in &entries {
        let face_count = session.kernel.queries().face_count(&entry.handle) as u32;
        output.bodies.push(BodySummary {
            id: entry.id,
            source_feature: entry.id.source,
            face_count,
            name: entry.name.clone(),
            color: entry.color.clone(),
        });
    }

    for entry in &entries {
        match session.kernel.tessellate(&entry.handle) {
            Ok(mut mesh) => {
                if (scale - 1.0).abs() > f64::EPSILON {
                    for p in &mut mesh.positions {
                        *p /= scale;
                    }
                }
                output
                    .meshes
                    .push((entry.id.source, mesh, entry.color.clone()));
            }
            Err(err) => {
                output.errors.push(FeatureError::new(
                    entry.id.source,
                    ErrorCode::BuildError,
                    format!("tessellation failed: {err}"),
                ));
            }
        }
    }
}
