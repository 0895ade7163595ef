use anvil_types::FeatureId;

/// Errors from the document layer.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DocError {
    #[error("malformed update bytes: {0}")]
    MalformedUpdate(String),

    #[error("feature not found: {0}")]
    FeatureNotFound(FeatureId),

    #[error("document schema version {found} is newer than supported version {supported}")]
    FutureSchemaVersion { found: u32, supported: u32 },

    #[error("invalid document json: {0}")]
    InvalidJson(String),

    #[error("schema violation: {0}")]
    Schema(String),
}

/// Errors from materializing a typed feature out of a raw record.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ParseError {
    #[error("malformed feature record: {0}")]
    Malformed(String),

    #[error("feature record id {record} does not match its map key {key}")]
    IdMismatch { key: FeatureId, record: FeatureId },

    #[error("{field} out of range: {detail}")]
    OutOfRange {
        field: &'static str,
        detail: String,
    },
}
