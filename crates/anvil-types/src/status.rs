use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ids::{BodyId, FeatureId};

/// Per-feature rebuild status, published after every rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FeatureStatus {
    /// Waiting for the walk to reach it. Transient; never published.
    Queued,
    Computed,
    Error,
    Suppressed,
    /// After the rebuild gate; skipped without interpretation.
    Gated,
}

/// Rebuild failure taxonomy. Codes are stable wire strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NoClosedProfile,
    SelfIntersecting,
    InvalidReference,
    SketchNotFound,
    BuildError,
}

/// One entry of the rebuild error list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureError {
    pub feature_id: FeatureId,
    pub code: ErrorCode,
    pub message: String,
}

impl FeatureError {
    pub fn new(feature_id: FeatureId, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            feature_id,
            code,
            message: message.into(),
        }
    }
}

/// Classification of a constraint solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SolveOutcome {
    Solved,
    SolvedWithWarnings,
    OverConstrained,
    UnderConstrained,
}

/// Degrees-of-freedom accounting for a sketch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DofReport {
    pub total: i32,
    pub constrained: i32,
    pub remaining: i32,
    pub is_fully_constrained: bool,
    pub is_over_constrained: bool,
}

/// Summary of one body, as published in `rebuild-complete`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BodySummary {
    pub id: BodyId,
    pub source_feature: FeatureId,
    pub face_count: u32,
    pub name: String,
    pub color: String,
}

/// The status mapping published alongside bodies and errors.
pub type StatusMap = BTreeMap<FeatureId, FeatureStatus>;
