use std::collections::BTreeMap;

use anvil_types::{
    BodyId, BodySummary, DofReport, EntityId, ErrorCode, FaceSelector, FeatureError, FeatureId,
    PlaneBasis, SolveOutcome, StatusMap, TriangleMesh,
};
use geo_kernel::SolidHandle;
use serde::{Deserialize, Serialize};

/// One body in the registry, exclusively owned by the rebuild domain.
#[derive(Debug, Clone)]
pub struct BodyEntry {
    pub id: BodyId,
    pub handle: SolidHandle,
    pub name: String,
    pub color: String,
    /// Face role tokens published through the reference index.
    pub roles: Vec<(u32, FaceSelector)>,
}

/// Solver output for one sketch, published as `sketch-solved`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SketchSolution {
    pub sketch: FeatureId,
    pub outcome: SolveOutcome,
    pub dof: DofReport,
    /// World frame of the sketch plane, for the viewer.
    pub plane: PlaneBasis,
    /// Every solved point, in document units.
    pub points: BTreeMap<EntityId, (f64, f64)>,
    /// Points whose solved position drifted beyond epsilon from the
    /// stored ones; the bridge writes these back under a solver origin.
    pub moved: Vec<(EntityId, f64, f64)>,
}

/// Everything one rebuild publishes.
#[derive(Debug, Clone, Default)]
pub struct RebuildOutput {
    pub bodies: Vec<BodySummary>,
    pub statuses: StatusMap,
    pub errors: Vec<FeatureError>,
    pub ref_index: crate::refs::RefIndex,
    /// One mesh per body, in registry order: (source feature, mesh, color).
    pub meshes: Vec<(FeatureId, TriangleMesh, String)>,
    pub sketches: Vec<SketchSolution>,
}

/// Interpreter-level failure: an error code plus its message, attached
/// to the offending feature by the orchestrator.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{code:?}: {message}")]
pub struct InterpretError {
    pub code: ErrorCode,
    pub message: String,
}

impl InterpretError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn invalid_reference(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidReference, message)
    }

    pub fn build(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BuildError, message)
    }

    pub fn to_feature_error(&self, feature: FeatureId) -> FeatureError {
        FeatureError::new(feature, self.code, self.message.clone())
    }
}

impl From<modeling_ops::OpError> for InterpretError {
    fn from(err: modeling_ops::OpError) -> Self {
        match err {
            modeling_ops::OpError::NoProfile => {
                Self::new(ErrorCode::NoClosedProfile, "no closed profile")
            }
            modeling_ops::OpError::Kernel(geo_kernel::KernelError::SelfIntersecting) => {
                Self::new(ErrorCode::SelfIntersecting, "profile is self-intersecting")
            }
            modeling_ops::OpError::Kernel(k) => Self::build(k.to_string()),
        }
    }
}

impl From<geo_kernel::KernelError> for InterpretError {
    fn from(err: geo_kernel::KernelError) -> Self {
        match err {
            geo_kernel::KernelError::SelfIntersecting => {
                Self::new(ErrorCode::SelfIntersecting, "profile is self-intersecting")
            }
            other => Self::build(other.to_string()),
        }
    }
}
