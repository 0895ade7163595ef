//! Update bundles exchanged between replicas.
//!
//! One bundle per transaction: `{site, seq, lamport, ops}`. Bundles from
//! a site apply in seq order; a receiver buffers gaps and drops
//! duplicates, so `apply_update` is idempotent and delivery order does
//! not matter.

use std::collections::BTreeMap;

use anvil_types::FeatureId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::DocError;
use crate::pos::PosKey;

/// Replica identifier. Unique per document replica.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SiteId(pub u64);

/// Per-site high-water marks: how many transactions of each site a
/// replica has applied. Sent on connect so the other side can compute a
/// single catch-up delta.
pub type StateVector = BTreeMap<SiteId, u64>;

/// One replicated operation. Field writes are last-writer-wins keyed by
/// the update's (lamport, site) tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Op {
    SetMeta {
        field: String,
        value: Value,
    },
    SetGate {
        gate: Option<FeatureId>,
    },
    CreateFeature {
        id: FeatureId,
        record: Value,
        pos: PosKey,
    },
    /// Replace the whole record (feature edits from the UI).
    SetFeature {
        id: FeatureId,
        record: Value,
    },
    /// Write one nested field of a record, e.g. a solved sketch point.
    SetFeatureField {
        id: FeatureId,
        path: Vec<String>,
        value: Value,
    },
    RemoveFeature {
        id: FeatureId,
    },
}

impl Op {
    /// The feature this op touches, if any.
    pub fn feature(&self) -> Option<FeatureId> {
        match self {
            Op::CreateFeature { id, .. }
            | Op::SetFeature { id, .. }
            | Op::SetFeatureField { id, .. }
            | Op::RemoveFeature { id } => Some(*id),
            _ => None,
        }
    }
}

/// One transaction's worth of ops, as shipped between replicas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Update {
    pub site: SiteId,
    /// 1-based transaction counter of the originating site.
    pub seq: u64,
    pub lamport: u64,
    pub ops: Vec<Op>,
}

impl Update {
    pub fn encode(&self) -> Vec<u8> {
        serde_json::to_vec(self).expect("update encoding is infallible")
    }

    pub fn decode(bytes: &[u8]) -> Result<Update, DocError> {
        serde_json::from_slice(bytes).map_err(|e| DocError::MalformedUpdate(e.to_string()))
    }
}

/// Encode several updates as one delta payload.
pub fn encode_bundle(updates: &[Update]) -> Vec<u8> {
    serde_json::to_vec(updates).expect("update encoding is infallible")
}

/// Decode a payload that is either a single update or a bundle.
pub fn decode_bundle(bytes: &[u8]) -> Result<Vec<Update>, DocError> {
    if bytes.first() == Some(&b'[') {
        serde_json::from_slice(bytes).map_err(|e| DocError::MalformedUpdate(e.to_string()))
    } else {
        Update::decode(bytes).map(|u| vec![u])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_round_trips() {
        let update = Update {
            site: SiteId(7),
            seq: 3,
            lamport: 41,
            ops: vec![Op::SetGate { gate: None }],
        };
        let bytes = update.encode();
        assert_eq!(Update::decode(&bytes).unwrap(), update);
    }

    #[test]
    fn bundle_decodes_single_and_list() {
        let update = Update {
            site: SiteId(1),
            seq: 1,
            lamport: 1,
            ops: vec![],
        };
        assert_eq!(decode_bundle(&update.encode()).unwrap().len(), 1);
        let bundle = encode_bundle(&[update.clone(), update]);
        assert_eq!(decode_bundle(&bundle).unwrap().len(), 2);
    }

    #[test]
    fn malformed_bytes_are_rejected() {
        assert!(matches!(
            Update::decode(b"{not json"),
            Err(DocError::MalformedUpdate(_))
        ));
    }
}
