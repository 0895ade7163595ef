use std::collections::BTreeSet;

use anvil_types::FeatureId;
use serde::{Deserialize, Serialize};

/// Who initiated a transaction. Observers use this to tell solver
/// write-backs apart from user edits (the undo layer and the rebuild
/// invalidation loop both depend on the distinction).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Origin {
    User,
    Solver,
    Remote,
    Load,
}

/// Which part of the document tree a transaction touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DocArea {
    Meta,
    State,
    Features,
    Order,
}

/// Subscription path for `observe_deep`: the root, one of the four
/// top-level slots, or a single feature subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocPath {
    Root,
    Meta,
    State,
    Features,
    Order,
    Feature(FeatureId),
}

impl DocPath {
    pub(crate) fn matches(&self, event: &TransactionEvent) -> bool {
        match self {
            DocPath::Root => true,
            DocPath::Meta => event.areas.contains(&DocArea::Meta),
            DocPath::State => event.areas.contains(&DocArea::State),
            DocPath::Features => event.areas.contains(&DocArea::Features),
            DocPath::Order => event.areas.contains(&DocArea::Order),
            DocPath::Feature(id) => event.features.contains(id),
        }
    }
}

/// What observers see after each committed transaction: a consistent
/// summary plus the encoded update for transport to other replicas.
#[derive(Debug, Clone)]
pub struct TransactionEvent {
    pub origin: Origin,
    pub areas: BTreeSet<DocArea>,
    pub features: BTreeSet<FeatureId>,
    /// The transaction's update bundle, ready to forward.
    pub update: Vec<u8>,
}

/// Handle returned by `observe_deep`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SubscriptionId(pub(crate) u64);
