//! ModelScript — drives an authoring document and a worker session
//! through the real message path, with named-feature access for
//! readable tests.

use std::collections::HashMap;

use anvil_types::{Feature, FeatureId, FeatureKind};
use doc_store::{Document, Origin, SiteId};
use worker_bridge::{ControlMessage, ResultMessage, WorkerSession};

pub struct ModelScript {
    pub doc: Document,
    pub worker: WorkerSession,
    named: HashMap<String, FeatureId>,
    clock_ms: u64,
    synced: bool,
}

impl ModelScript {
    /// Fresh seeded document plus a worker on the analytic kernel.
    pub fn new() -> Self {
        Self {
            doc: Document::seeded(SiteId(1), "part"),
            worker: WorkerSession::new(SiteId(100)),
            named: HashMap::new(),
            clock_ms: 0,
            synced: false,
        }
    }

    pub fn xy_plane(&self) -> FeatureId {
        self.doc.feature_order()[1]
    }

    pub fn id(&self, name: &str) -> FeatureId {
        self.named[name]
    }

    /// Append a feature under a script-local name.
    pub fn add(&mut self, name: &str, kind: FeatureKind) -> FeatureId {
        let id = self
            .doc
            .transact(Origin::User, |txn| txn.append_feature(Feature::new(name, kind)));
        self.named.insert(name.to_string(), id);
        id
    }

    pub fn suppress(&mut self, name: &str, suppressed: bool) {
        let id = self.id(name);
        self.doc
            .transact(Origin::User, |txn| txn.set_suppressed(id, suppressed));
    }

    pub fn set_gate(&mut self, name: Option<&str>) {
        let gate = name.map(|n| self.id(n));
        self.doc.transact(Origin::User, |txn| txn.set_gate(gate));
    }

    /// Edit a feature record in place.
    pub fn edit(&mut self, name: &str, f: impl FnOnce(&mut Feature)) {
        let id = self.id(name);
        let mut feature = self.doc.feature(id).expect("named feature parses");
        f(&mut feature);
        self.doc
            .transact(Origin::User, |txn| txn.set_feature(&feature));
    }

    /// Ship pending document changes to the worker and run the
    /// debounced rebuild, returning everything it published.
    pub fn sync_and_rebuild(&mut self) -> Vec<ResultMessage> {
        let delta = if self.synced {
            self.doc.encode_since(&self.worker.mirror().state_vector())
        } else {
            self.doc.encode_full()
        };
        let msg = if self.synced {
            ControlMessage::DocumentUpdate { update: delta }
        } else {
            ControlMessage::InitSync { update: delta }
        };
        self.synced = true;
        self.worker.handle(msg, self.clock_ms);
        self.clock_ms += 20;
        self.worker.tick(self.clock_ms);
        self.worker.drain()
    }

    /// Send an arbitrary control message and drain the replies.
    pub fn send(&mut self, msg: ControlMessage) -> Vec<ResultMessage> {
        self.worker.handle(msg, self.clock_ms);
        self.clock_ms += 20;
        self.worker.tick(self.clock_ms);
        self.worker.drain()
    }
}

impl Default for ModelScript {
    fn default() -> Self {
        Self::new()
    }
}
