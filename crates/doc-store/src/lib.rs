pub mod document;
pub mod errors;
pub mod meta;
pub mod observer;
pub mod pos;
pub mod schema;
pub mod update;

pub use document::{Document, Txn};
pub use errors::{DocError, ParseError};
pub use meta::{DocumentMeta, SCHEMA_VERSION};
pub use observer::{DocArea, DocPath, Origin, SubscriptionId, TransactionEvent};
pub use pos::PosKey;
pub use schema::{parse_feature, serialize_feature, validate_document, SchemaViolation};
pub use update::{SiteId, StateVector, Update};
