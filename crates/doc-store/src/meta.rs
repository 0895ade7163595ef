use anvil_types::Units;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Loader compatibility gate. Bump on breaking record-shape changes.
pub const SCHEMA_VERSION: u32 = 1;

/// The `meta` slot of the document root: small scalars only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMeta {
    pub schema_version: u32,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    #[serde(default)]
    pub units: Units,
}

impl DocumentMeta {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            schema_version: SCHEMA_VERSION,
            name: name.into(),
            created_at: now,
            modified_at: now,
            units: Units::Mm,
        }
    }
}
