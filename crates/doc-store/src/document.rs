//! The replicated document: an observable tree with four top-level
//! slots (`meta`, `state`, `featuresById`, `featureOrder`).
//!
//! Every mutation happens inside `transact`, which produces exactly one
//! update bundle and fires observers once. Applying the same bundle on
//! any replica, in any delivery order, converges: per-site seq numbers
//! gate duplicates and gaps, and field writes are last-writer-wins
//! keyed by (lamport, site).

use std::collections::{BTreeMap, BTreeSet};

use anvil_types::{Feature, FeatureId, PlaneFeature, PlaneDefinition, PlaneRole, FeatureKind, Units};
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::errors::{DocError, ParseError};
use crate::meta::{DocumentMeta, SCHEMA_VERSION};
use crate::observer::{DocArea, DocPath, Origin, SubscriptionId, TransactionEvent};
use crate::pos::PosKey;
use crate::schema;
use crate::update::{decode_bundle, encode_bundle, Op, SiteId, StateVector, Update};

/// (lamport, site) write tag for last-writer-wins fields.
type Stamp = (u64, SiteId);

#[derive(Debug, Clone)]
struct FeatureSlot {
    record: Value,
    pos: PosKey,
}

/// A write that arrived before the feature it targets.
#[derive(Debug, Clone)]
struct DeferredWrite {
    stamp: Stamp,
    path: Option<Vec<String>>,
    value: Value,
}

type ObserverFn = Box<dyn FnMut(&TransactionEvent)>;

pub struct Document {
    site: SiteId,
    seq: u64,
    lamport: u64,

    meta: DocumentMeta,
    gate: Option<FeatureId>,
    slots: BTreeMap<FeatureId, FeatureSlot>,
    tombstones: BTreeSet<FeatureId>,
    order: Vec<FeatureId>,

    meta_stamps: BTreeMap<String, Stamp>,
    gate_stamp: Stamp,
    record_stamps: BTreeMap<FeatureId, Stamp>,
    field_regs: BTreeMap<(FeatureId, String), (Stamp, Vec<String>, Value)>,
    deferred: BTreeMap<FeatureId, Vec<DeferredWrite>>,

    applied: StateVector,
    pending: BTreeMap<SiteId, BTreeMap<u64, Update>>,
    log: Vec<Update>,

    observers: Vec<(SubscriptionId, DocPath, ObserverFn)>,
    next_sub: u64,
}

impl Document {
    /// An empty document. Most callers want `seeded` instead: a
    /// non-empty document must start with the origin and default datums.
    pub fn new(site: SiteId, name: impl Into<String>) -> Self {
        Self {
            site,
            seq: 0,
            lamport: 0,
            meta: DocumentMeta::new(name),
            gate: None,
            slots: BTreeMap::new(),
            tombstones: BTreeSet::new(),
            order: Vec::new(),
            meta_stamps: BTreeMap::new(),
            gate_stamp: (0, SiteId(0)),
            record_stamps: BTreeMap::new(),
            field_regs: BTreeMap::new(),
            deferred: BTreeMap::new(),
            applied: StateVector::new(),
            pending: BTreeMap::new(),
            log: Vec::new(),
            observers: Vec::new(),
            next_sub: 0,
        }
    }

    /// A document seeded with the origin and the xy/xz/yz datum planes
    /// at positions 0–3, as every non-empty document requires.
    pub fn seeded(site: SiteId, name: impl Into<String>) -> Self {
        let mut doc = Self::new(site, name);
        let meta = doc.meta.clone();
        doc.transact(Origin::Load, |txn| {
            // Meta travels as ops so replicas converge on it too.
            txn.set_meta_raw("schemaVersion", serde_json::json!(meta.schema_version));
            txn.set_meta_raw("name", serde_json::json!(meta.name));
            txn.set_meta_raw("createdAt", serde_json::json!(meta.created_at));
            txn.set_meta_raw("modifiedAt", serde_json::json!(meta.modified_at));
            txn.set_meta_raw("units", serde_json::json!(meta.units));
            txn.append_feature(Feature::new("Origin", FeatureKind::Origin));
            for (role, plane_name) in [
                (PlaneRole::Xy, "XY Plane"),
                (PlaneRole::Xz, "XZ Plane"),
                (PlaneRole::Yz, "YZ Plane"),
            ] {
                let (origin, normal, x_dir) = role.basis();
                txn.append_feature(Feature::new(
                    plane_name,
                    FeatureKind::Plane(PlaneFeature {
                        origin,
                        normal,
                        x_dir,
                        role: Some(role),
                        definition: PlaneDefinition::Datum,
                    }),
                ));
            }
        });
        doc
    }

    pub fn site(&self) -> SiteId {
        self.site
    }

    pub fn meta(&self) -> &DocumentMeta {
        &self.meta
    }

    pub fn units(&self) -> Units {
        self.meta.units
    }

    pub fn rebuild_gate(&self) -> Option<FeatureId> {
        self.gate
    }

    /// The ordered feature sequence — the only source of dependency order.
    pub fn feature_order(&self) -> &[FeatureId] {
        &self.order
    }

    pub fn feature_record(&self, id: FeatureId) -> Option<&Value> {
        self.slots.get(&id).map(|s| &s.record)
    }

    /// Materialize a typed feature from its raw record.
    pub fn feature(&self, id: FeatureId) -> Result<Feature, ParseError> {
        let record = self
            .feature_record(id)
            .ok_or_else(|| ParseError::Malformed(format!("no record for feature {id}")))?;
        let feature = schema::parse_feature(record)?;
        if feature.id != id {
            return Err(ParseError::IdMismatch {
                key: id,
                record: feature.id,
            });
        }
        Ok(feature)
    }

    pub fn contains(&self, id: FeatureId) -> bool {
        self.slots.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    // ── Transactions ────────────────────────────────────────────────────

    /// Run `f` against a transaction handle; all mutations batch into a
    /// single atomic update and observers fire once.
    pub fn transact<R>(&mut self, origin: Origin, f: impl FnOnce(&mut Txn<'_>) -> R) -> R {
        let mut txn = Txn {
            doc: self,
            ops: Vec::new(),
            appended: Vec::new(),
        };
        let result = f(&mut txn);
        let ops = std::mem::take(&mut txn.ops);
        if !ops.is_empty() {
            self.commit(origin, ops);
        }
        result
    }

    fn commit(&mut self, origin: Origin, ops: Vec<Op>) {
        self.lamport += 1;
        self.seq += 1;
        let update = Update {
            site: self.site,
            seq: self.seq,
            lamport: self.lamport,
            ops,
        };
        self.integrate(update, origin);
    }

    // ── Remote updates ──────────────────────────────────────────────────

    /// Apply an update payload from another replica. Idempotent:
    /// already-seen updates are dropped, out-of-order updates are
    /// buffered until their predecessors arrive. Malformed bytes reject
    /// the whole payload; nothing is partially applied.
    pub fn apply_update(&mut self, bytes: &[u8]) -> Result<(), DocError> {
        let updates = decode_bundle(bytes)?;
        for update in updates {
            self.enqueue(update);
        }
        Ok(())
    }

    fn enqueue(&mut self, update: Update) {
        let seen = self.applied.get(&update.site).copied().unwrap_or(0);
        if update.seq <= seen {
            return;
        }
        if update.seq == seen + 1 {
            self.integrate(update, Origin::Remote);
            self.drain_pending();
        } else {
            self.pending
                .entry(update.site)
                .or_default()
                .insert(update.seq, update);
        }
    }

    fn drain_pending(&mut self) {
        loop {
            let mut next: Option<Update> = None;
            for (site, queue) in &self.pending {
                let seen = self.applied.get(site).copied().unwrap_or(0);
                if let Some(u) = queue.get(&(seen + 1)) {
                    next = Some(u.clone());
                    break;
                }
            }
            match next {
                Some(u) => {
                    if let Some(queue) = self.pending.get_mut(&u.site) {
                        queue.remove(&u.seq);
                    }
                    self.integrate(u, Origin::Remote);
                }
                None => break,
            }
        }
    }

    /// Single integration path for local and remote updates, so every
    /// replica runs identical logic.
    fn integrate(&mut self, update: Update, origin: Origin) {
        self.lamport = self.lamport.max(update.lamport);
        let stamp: Stamp = (update.lamport, update.site);

        let mut areas = BTreeSet::new();
        let mut features = BTreeSet::new();

        for op in &update.ops {
            if let Some(id) = op.feature() {
                features.insert(id);
            }
            self.apply_op(op, stamp, &mut areas);
        }

        self.applied.insert(update.site, update.seq);
        let encoded = update.encode();
        self.log.push(update);

        let event = TransactionEvent {
            origin,
            areas,
            features,
            update: encoded,
        };
        self.notify(&event);
    }

    fn apply_op(&mut self, op: &Op, stamp: Stamp, areas: &mut BTreeSet<DocArea>) {
        match op {
            Op::SetMeta { field, value } => {
                let current = self
                    .meta_stamps
                    .get(field)
                    .copied()
                    .unwrap_or((0, SiteId(0)));
                if stamp > current {
                    self.meta_stamps.insert(field.clone(), stamp);
                    self.apply_meta(field, value);
                    areas.insert(DocArea::Meta);
                }
            }
            Op::SetGate { gate } => {
                if stamp > self.gate_stamp {
                    self.gate_stamp = stamp;
                    // A gate may not point at a deleted feature.
                    self.gate = gate.filter(|id| !self.tombstones.contains(id));
                    areas.insert(DocArea::State);
                }
            }
            Op::CreateFeature { id, record, pos } => {
                if self.tombstones.contains(id) || self.slots.contains_key(id) {
                    return;
                }
                self.slots.insert(
                    *id,
                    FeatureSlot {
                        record: record.clone(),
                        pos: pos.clone(),
                    },
                );
                self.record_stamps.insert(*id, stamp);
                if let Some(writes) = self.deferred.remove(id) {
                    let mut writes = writes;
                    writes.sort_by_key(|w| w.stamp);
                    for w in writes {
                        match w.path {
                            None => self.apply_record_write(*id, w.value, w.stamp),
                            Some(path) => self.apply_field_write(*id, path, w.value, w.stamp),
                        }
                    }
                }
                self.rebuild_order();
                areas.insert(DocArea::Features);
                areas.insert(DocArea::Order);
            }
            Op::SetFeature { id, record } => {
                if self.tombstones.contains(id) {
                    return;
                }
                if !self.slots.contains_key(id) {
                    self.deferred.entry(*id).or_default().push(DeferredWrite {
                        stamp,
                        path: None,
                        value: record.clone(),
                    });
                    return;
                }
                self.apply_record_write(*id, record.clone(), stamp);
                areas.insert(DocArea::Features);
            }
            Op::SetFeatureField { id, path, value } => {
                if self.tombstones.contains(id) {
                    return;
                }
                if !self.slots.contains_key(id) {
                    self.deferred.entry(*id).or_default().push(DeferredWrite {
                        stamp,
                        path: Some(path.clone()),
                        value: value.clone(),
                    });
                    return;
                }
                self.apply_field_write(*id, path.clone(), value.clone(), stamp);
                areas.insert(DocArea::Features);
            }
            Op::RemoveFeature { id } => {
                // Deletion wins permanently; ids never recycle.
                self.tombstones.insert(*id);
                self.slots.remove(id);
                self.record_stamps.remove(id);
                self.deferred.remove(id);
                self.field_regs.retain(|(fid, _), _| fid != id);
                if self.gate == Some(*id) {
                    self.gate = None;
                    self.gate_stamp = self.gate_stamp.max(stamp);
                    areas.insert(DocArea::State);
                }
                self.rebuild_order();
                areas.insert(DocArea::Features);
                areas.insert(DocArea::Order);
            }
        }
    }

    fn apply_record_write(&mut self, id: FeatureId, record: Value, stamp: Stamp) {
        let current = self
            .record_stamps
            .get(&id)
            .copied()
            .unwrap_or((0, SiteId(0)));
        if stamp <= current {
            return;
        }
        self.record_stamps.insert(id, stamp);
        if let Some(slot) = self.slots.get_mut(&id) {
            slot.record = record;
        }
        // Re-overlay any field writes newer than this record, in stamp
        // order, so the end state is independent of arrival order.
        let mut newer: Vec<(Stamp, Vec<String>, Value)> = self
            .field_regs
            .iter()
            .filter(|((fid, _), (s, _, _))| *fid == id && *s > stamp)
            .map(|(_, (s, path, value))| (*s, path.clone(), value.clone()))
            .collect();
        newer.sort_by(|a, b| a.0.cmp(&b.0));
        for (_, path, value) in newer {
            if let Some(slot) = self.slots.get_mut(&id) {
                write_path(&mut slot.record, &path, value);
            }
        }
    }

    fn apply_field_write(&mut self, id: FeatureId, path: Vec<String>, value: Value, stamp: Stamp) {
        let key = (id, path.join("/"));
        if let Some((existing, _, _)) = self.field_regs.get(&key) {
            if stamp <= *existing {
                return;
            }
        }
        let record_stamp = self
            .record_stamps
            .get(&id)
            .copied()
            .unwrap_or((0, SiteId(0)));
        self.field_regs
            .insert(key, (stamp, path.clone(), value.clone()));
        if stamp > record_stamp {
            if let Some(slot) = self.slots.get_mut(&id) {
                write_path(&mut slot.record, &path, value);
            }
        }
    }

    fn apply_meta(&mut self, field: &str, value: &Value) {
        match field {
            "name" => {
                if let Some(s) = value.as_str() {
                    self.meta.name = s.to_string();
                }
            }
            "units" => {
                if let Ok(units) = serde_json::from_value::<Units>(value.clone()) {
                    self.meta.units = units;
                }
            }
            "schemaVersion" => {
                if let Some(v) = value.as_u64() {
                    self.meta.schema_version = v as u32;
                }
            }
            "createdAt" => {
                if let Ok(ts) = serde_json::from_value::<DateTime<Utc>>(value.clone()) {
                    self.meta.created_at = ts;
                }
            }
            "modifiedAt" => {
                if let Ok(ts) = serde_json::from_value::<DateTime<Utc>>(value.clone()) {
                    self.meta.modified_at = ts;
                }
            }
            // Unknown meta keys are carried by newer schema versions;
            // ignore rather than reject.
            _ => {}
        }
    }

    fn rebuild_order(&mut self) {
        let mut entries: Vec<(&PosKey, &FeatureId)> =
            self.slots.iter().map(|(id, slot)| (&slot.pos, id)).collect();
        entries.sort();
        self.order = entries.into_iter().map(|(_, id)| *id).collect();
    }

    // ── Sync ────────────────────────────────────────────────────────────

    /// Per-site high-water marks of everything this replica has applied.
    pub fn state_vector(&self) -> StateVector {
        self.applied.clone()
    }

    /// One delta payload containing every update the peer (described by
    /// its state vector) has not seen.
    pub fn encode_since(&self, peer: &StateVector) -> Vec<u8> {
        let missing: Vec<Update> = self
            .log
            .iter()
            .filter(|u| u.seq > peer.get(&u.site).copied().unwrap_or(0))
            .cloned()
            .collect();
        encode_bundle(&missing)
    }

    /// The full history, for bootstrapping a fresh mirror.
    pub fn encode_full(&self) -> Vec<u8> {
        self.encode_since(&StateVector::new())
    }

    // ── Observers ───────────────────────────────────────────────────────

    /// Subscribe to transactions touching `path` or any descendant.
    pub fn observe_deep(
        &mut self,
        path: DocPath,
        callback: impl FnMut(&TransactionEvent) + 'static,
    ) -> SubscriptionId {
        self.next_sub += 1;
        let id = SubscriptionId(self.next_sub);
        self.observers.push((id, path, Box::new(callback)));
        id
    }

    pub fn unobserve(&mut self, id: SubscriptionId) {
        self.observers.retain(|(sub, _, _)| *sub != id);
    }

    fn notify(&mut self, event: &TransactionEvent) {
        // Observers may not re-enter the document; they get the event only.
        let mut observers = std::mem::take(&mut self.observers);
        for (_, path, callback) in observers.iter_mut() {
            if path.matches(event) {
                callback(event);
            }
        }
        // Subscriptions added during callbacks are lost; acceptable, as
        // callbacks only receive the event and cannot reach the document.
        self.observers = observers;
    }

    // ── JSON import/export ──────────────────────────────────────────────

    /// Loss-less JSON projection of the document tree.
    pub fn to_json(&self) -> Value {
        let features: serde_json::Map<String, Value> = self
            .slots
            .iter()
            .map(|(id, slot)| (id.to_string(), slot.record.clone()))
            .collect();
        serde_json::json!({
            "meta": self.meta,
            "state": { "rebuildGate": self.gate },
            "featuresById": features,
            "featureOrder": self.order,
        })
    }

    /// Rebuild a document from its JSON projection. Rejects unknown
    /// top-level siblings and future schema versions.
    pub fn from_json(site: SiteId, value: &Value) -> Result<Self, DocError> {
        let obj = value
            .as_object()
            .ok_or_else(|| DocError::InvalidJson("document root must be an object".into()))?;
        for key in obj.keys() {
            if !matches!(key.as_str(), "meta" | "state" | "featuresById" | "featureOrder") {
                return Err(DocError::Schema(format!("unexpected top-level slot {key:?}")));
            }
        }

        let meta: DocumentMeta = serde_json::from_value(
            obj.get("meta")
                .cloned()
                .ok_or_else(|| DocError::InvalidJson("missing meta".into()))?,
        )
        .map_err(|e| DocError::InvalidJson(e.to_string()))?;
        if meta.schema_version > SCHEMA_VERSION {
            return Err(DocError::FutureSchemaVersion {
                found: meta.schema_version,
                supported: SCHEMA_VERSION,
            });
        }

        let gate: Option<FeatureId> = obj
            .get("state")
            .and_then(|s| s.get("rebuildGate"))
            .cloned()
            .map(|v| serde_json::from_value(v))
            .transpose()
            .map_err(|e| DocError::InvalidJson(e.to_string()))?
            .flatten();

        let order: Vec<FeatureId> = serde_json::from_value(
            obj.get("featureOrder")
                .cloned()
                .ok_or_else(|| DocError::InvalidJson("missing featureOrder".into()))?,
        )
        .map_err(|e| DocError::InvalidJson(e.to_string()))?;

        let records = obj
            .get("featuresById")
            .and_then(|v| v.as_object())
            .ok_or_else(|| DocError::InvalidJson("missing featuresById".into()))?;

        if records.len() != order.len() {
            return Err(DocError::Schema(format!(
                "featureOrder length {} does not match featuresById size {}",
                order.len(),
                records.len()
            )));
        }

        // Validate the order/map agreement up front: the seeding
        // transaction below must not be able to fail halfway.
        for id in &order {
            if !records.contains_key(&id.to_string()) {
                return Err(DocError::Schema(format!(
                    "featureOrder id {id} not in featuresById"
                )));
            }
        }

        let mut doc = Self::new(site, meta.name.clone());
        doc.transact(Origin::Load, |txn| {
            txn.set_meta_raw("schemaVersion", serde_json::json!(meta.schema_version));
            txn.set_meta_raw("name", serde_json::json!(meta.name));
            txn.set_meta_raw("createdAt", serde_json::json!(meta.created_at));
            txn.set_meta_raw("modifiedAt", serde_json::json!(meta.modified_at));
            txn.set_meta_raw("units", serde_json::json!(meta.units));
            for id in &order {
                let record = records.get(&id.to_string()).expect("validated above");
                txn.append_record(*id, record.clone());
            }
            txn.set_gate(gate);
        });
        Ok(doc)
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("site", &self.site)
            .field("features", &self.order.len())
            .field("gate", &self.gate)
            .finish()
    }
}

/// Write `value` at `path` inside a record, creating intermediate
/// objects as needed.
fn write_path(record: &mut Value, path: &[String], value: Value) {
    if path.is_empty() {
        *record = value;
        return;
    }
    let mut cursor = record;
    for segment in &path[..path.len() - 1] {
        if !cursor.is_object() {
            *cursor = Value::Object(serde_json::Map::new());
        }
        cursor = cursor
            .as_object_mut()
            .expect("just ensured object")
            .entry(segment.clone())
            .or_insert(Value::Null);
    }
    if !cursor.is_object() {
        *cursor = Value::Object(serde_json::Map::new());
    }
    cursor
        .as_object_mut()
        .expect("just ensured object")
        .insert(path[path.len() - 1].clone(), value);
}

/// Mutation handle passed to `transact` closures.
pub struct Txn<'a> {
    doc: &'a Document,
    ops: Vec<Op>,
    /// Positions allocated earlier in this transaction, so successive
    /// appends order correctly before the commit lands.
    appended: Vec<PosKey>,
}

impl Txn<'_> {
    fn last_pos(&self) -> Option<PosKey> {
        if let Some(pos) = self.appended.last() {
            return Some(pos.clone());
        }
        self.doc
            .order
            .last()
            .and_then(|id| self.doc.slots.get(id))
            .map(|slot| slot.pos.clone())
    }

    /// Append a typed feature at the end of `featureOrder`.
    pub fn append_feature(&mut self, feature: Feature) -> FeatureId {
        let id = feature.id;
        let record = schema::serialize_feature(&feature);
        self.append_record(id, record);
        id
    }

    /// Append a raw record. The record's own id wins over the map key
    /// at parse time, so callers must keep them equal.
    pub fn append_record(&mut self, id: FeatureId, record: Value) {
        let pos = PosKey::between(self.last_pos().as_ref(), None, self.doc.site);
        self.appended.push(pos.clone());
        self.ops.push(Op::CreateFeature { id, record, pos });
    }

    /// Insert a typed feature before the feature currently at `index`.
    pub fn insert_feature_at(&mut self, index: usize, feature: Feature) -> FeatureId {
        let id = feature.id;
        let record = schema::serialize_feature(&feature);
        let before = index
            .checked_sub(1)
            .and_then(|i| self.doc.order.get(i))
            .and_then(|fid| self.doc.slots.get(fid))
            .map(|slot| slot.pos.clone());
        let after = self
            .doc
            .order
            .get(index)
            .and_then(|fid| self.doc.slots.get(fid))
            .map(|slot| slot.pos.clone());
        let pos = PosKey::between(before.as_ref(), after.as_ref(), self.doc.site);
        self.ops.push(Op::CreateFeature { id, record, pos });
        id
    }

    /// Replace a feature's whole record.
    pub fn set_feature(&mut self, feature: &Feature) {
        self.ops.push(Op::SetFeature {
            id: feature.id,
            record: schema::serialize_feature(feature),
        });
    }

    pub fn remove_feature(&mut self, id: FeatureId) {
        self.ops.push(Op::RemoveFeature { id });
    }

    pub fn rename_feature(&mut self, id: FeatureId, name: impl Into<String>) {
        self.set_field(id, &["name"], serde_json::json!(name.into()));
    }

    pub fn set_suppressed(&mut self, id: FeatureId, suppressed: bool) {
        self.set_field(id, &["suppressed"], serde_json::json!(suppressed));
    }

    pub fn set_visible(&mut self, id: FeatureId, visible: bool) {
        self.set_field(id, &["visible"], serde_json::json!(visible));
    }

    /// Write one solved sketch point back into the document. Tagged by
    /// the transaction origin, so undo and the rebuild mirror can tell
    /// solver writes from user edits.
    pub fn set_sketch_point(&mut self, sketch: FeatureId, point: &str, x: f64, y: f64) {
        self.set_field(
            sketch,
            &["data", "pointsById", point, "x"],
            serde_json::json!(x),
        );
        self.set_field(
            sketch,
            &["data", "pointsById", point, "y"],
            serde_json::json!(y),
        );
    }

    pub fn set_field(&mut self, id: FeatureId, path: &[&str], value: Value) {
        self.ops.push(Op::SetFeatureField {
            id,
            path: path.iter().map(|s| s.to_string()).collect(),
            value,
        });
    }

    pub fn set_gate(&mut self, gate: Option<FeatureId>) {
        self.ops.push(Op::SetGate { gate });
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.set_meta_raw("name", serde_json::json!(name.into()));
    }

    pub fn set_units(&mut self, units: Units) {
        self.set_meta_raw("units", serde_json::json!(units));
    }

    pub fn set_modified(&mut self, at: DateTime<Utc>) {
        self.set_meta_raw("modifiedAt", serde_json::json!(at));
    }

    pub fn set_meta_raw(&mut self, field: &str, value: Value) {
        self.ops.push(Op::SetMeta {
            field: field.to_string(),
            value,
        });
    }
}
