use std::cell::RefCell;
use std::rc::Rc;

use anvil_types::*;
use doc_store::{DocArea, DocPath, Document, Origin, SiteId};

fn extrude_kind(sketch: FeatureId) -> FeatureKind {
    FeatureKind::Extrude(ExtrudeFeature {
        sketch,
        distance: 3.0,
        extent: ExtrudeExtent::Blind,
        extent_ref: None,
        direction: ExtrudeDirection::Normal,
        op: BodyOp::Add,
        merge_scope: MergeScope::Auto,
        target_bodies: vec![],
        result_body_name: None,
        result_body_color: None,
    })
}

fn sketch_kind(plane: FeatureId) -> FeatureKind {
    FeatureKind::Sketch(SketchFeature {
        plane: PlaneRef::PlaneFeatureId { target: plane },
        data: SketchData::default(),
    })
}

#[test]
fn seeded_document_has_origin_and_datums_first() {
    let doc = Document::seeded(SiteId(1), "part");
    let order = doc.feature_order();
    assert_eq!(order.len(), 4);
    assert!(matches!(
        doc.feature(order[0]).unwrap().kind,
        FeatureKind::Origin
    ));
    for (i, role) in [PlaneRole::Xy, PlaneRole::Xz, PlaneRole::Yz]
        .into_iter()
        .enumerate()
    {
        match doc.feature(order[i + 1]).unwrap().kind {
            FeatureKind::Plane(p) => assert_eq!(p.role, Some(role)),
            other => panic!("expected plane, got {other:?}"),
        }
    }
    assert!(doc_store::validate_document(&doc).is_empty());
}

#[test]
fn replicas_converge_regardless_of_delivery_order() {
    let mut a = Document::seeded(SiteId(1), "part");
    let mut b = Document::new(SiteId(2), "part");
    b.apply_update(&a.encode_full()).unwrap();

    // Concurrent edits on both sides.
    let plane = a.feature_order()[1];
    let sketch_a = a.transact(Origin::User, |txn| {
        txn.append_feature(Feature::new("Sketch A", sketch_kind(plane)))
    });
    let sketch_b = b.transact(Origin::User, |txn| {
        txn.append_feature(Feature::new("Sketch B", sketch_kind(plane)))
    });
    let updates_a = a.encode_since(&b.state_vector());
    let updates_b = b.encode_since(&a.state_vector());

    a.apply_update(&updates_b).unwrap();
    b.apply_update(&updates_a).unwrap();

    assert_eq!(a.feature_order(), b.feature_order());
    assert_eq!(a.to_json(), b.to_json());
    assert!(a.contains(sketch_a) && a.contains(sketch_b));
}

#[test]
fn apply_update_is_idempotent() {
    let mut a = Document::seeded(SiteId(1), "part");
    let mut b = Document::new(SiteId(2), "part");

    let full = a.encode_full();
    b.apply_update(&full).unwrap();
    let snapshot = b.to_json();
    b.apply_update(&full).unwrap();
    b.apply_update(&full).unwrap();
    assert_eq!(b.to_json(), snapshot);

    // Same after an extra local edit on a, delivered twice.
    let plane = a.feature_order()[1];
    a.transact(Origin::User, |txn| {
        txn.append_feature(Feature::new("Sketch", sketch_kind(plane)));
    });
    let delta = a.encode_since(&b.state_vector());
    b.apply_update(&delta).unwrap();
    let snapshot = b.to_json();
    b.apply_update(&delta).unwrap();
    assert_eq!(b.to_json(), snapshot);
    assert_eq!(a.to_json(), b.to_json());
}

#[test]
fn out_of_order_updates_are_buffered_until_complete() {
    let mut a = Document::seeded(SiteId(1), "part");
    let plane = a.feature_order()[1];
    a.transact(Origin::User, |txn| {
        txn.append_feature(Feature::new("S1", sketch_kind(plane)));
    });
    a.transact(Origin::User, |txn| {
        txn.append_feature(Feature::new("S2", sketch_kind(plane)));
    });

    // Deliver update 3 before 2.
    let mut b = Document::new(SiteId(2), "part");
    let all = a.encode_full();
    let mut updates: Vec<serde_json::Value> = serde_json::from_slice(&all).unwrap();
    updates.reverse();
    for u in &updates {
        b.apply_update(&serde_json::to_vec(u).unwrap()).unwrap();
    }
    assert_eq!(a.to_json(), b.to_json());
}

#[test]
fn malformed_update_is_rejected_whole() {
    let mut doc = Document::seeded(SiteId(1), "part");
    let before = doc.to_json();
    assert!(doc.apply_update(b"{definitely not an update").is_err());
    assert_eq!(doc.to_json(), before);
}

#[test]
fn observers_fire_once_per_transaction_with_origin() {
    let mut doc = Document::seeded(SiteId(1), "part");
    let events: Rc<RefCell<Vec<(Origin, bool)>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = events.clone();
    doc.observe_deep(DocPath::Features, move |event| {
        sink.borrow_mut()
            .push((event.origin, event.areas.contains(&DocArea::Order)));
    });

    let plane = doc.feature_order()[1];
    let sketch = doc.transact(Origin::User, |txn| {
        let id = txn.append_feature(Feature::new("S1", sketch_kind(plane)));
        txn.append_feature(Feature::new("S2", sketch_kind(plane)));
        id
    });
    // Two appends, one transaction, one callback.
    assert_eq!(events.borrow().len(), 1);
    assert_eq!(events.borrow()[0], (Origin::User, true));

    doc.transact(Origin::Solver, |txn| {
        txn.set_sketch_point(sketch, "p1", 1.0, 2.0);
    });
    assert_eq!(events.borrow().len(), 2);
    assert_eq!(events.borrow()[1].0, Origin::Solver);
}

#[test]
fn state_slot_and_gate_clearing_on_delete() {
    let mut doc = Document::seeded(SiteId(1), "part");
    let plane = doc.feature_order()[1];
    let sketch = doc.transact(Origin::User, |txn| {
        txn.append_feature(Feature::new("Sketch", sketch_kind(plane)))
    });
    doc.transact(Origin::User, |txn| txn.set_gate(Some(sketch)));
    assert_eq!(doc.rebuild_gate(), Some(sketch));

    doc.transact(Origin::User, |txn| txn.remove_feature(sketch));
    assert_eq!(doc.rebuild_gate(), None);
    assert!(!doc.contains(sketch));
    assert_eq!(doc.feature_order().len(), 4);
}

#[test]
fn rename_and_suppress_edit_fields_in_place() {
    let mut doc = Document::seeded(SiteId(1), "part");
    let plane = doc.feature_order()[1];
    let sketch = doc.transact(Origin::User, |txn| {
        txn.append_feature(Feature::new("Sketch", sketch_kind(plane)))
    });
    doc.transact(Origin::User, |txn| {
        txn.rename_feature(sketch, "Base Profile");
        txn.set_suppressed(sketch, true);
    });
    let feature = doc.feature(sketch).unwrap();
    assert_eq!(feature.name, "Base Profile");
    assert!(feature.suppressed);
}

#[test]
fn json_round_trip_is_lossless() {
    let mut doc = Document::seeded(SiteId(1), "part");
    let plane = doc.feature_order()[1];
    let sketch = doc.transact(Origin::User, |txn| {
        txn.append_feature(Feature::new("Sketch", sketch_kind(plane)))
    });
    doc.transact(Origin::User, |txn| {
        txn.append_feature(Feature::new("Extrude", extrude_kind(sketch)));
        txn.set_gate(Some(sketch));
    });

    let json = doc.to_json();
    let restored = Document::from_json(SiteId(9), &json).unwrap();
    assert_eq!(restored.to_json(), json);
    assert_eq!(restored.feature_order(), doc.feature_order());
    assert_eq!(restored.rebuild_gate(), Some(sketch));
}

#[test]
fn json_import_rejects_sibling_top_level_slot() {
    let doc = Document::seeded(SiteId(1), "part");
    let mut json = doc.to_json();
    json["extras"] = serde_json::json!({});
    assert!(matches!(
        Document::from_json(SiteId(2), &json),
        Err(doc_store::DocError::Schema(_))
    ));
}

#[test]
fn json_import_rejects_future_schema_version() {
    let doc = Document::seeded(SiteId(1), "part");
    let mut json = doc.to_json();
    json["meta"]["schemaVersion"] = serde_json::json!(99);
    assert!(matches!(
        Document::from_json(SiteId(2), &json),
        Err(doc_store::DocError::FutureSchemaVersion { .. })
    ));
}

#[test]
fn forward_reference_is_flagged_by_validation() {
    let mut doc = Document::seeded(SiteId(1), "part");
    let plane = doc.feature_order()[1];
    // Extrude first, referencing a sketch appended after it.
    let phantom_sketch = Feature::new("Sketch", sketch_kind(plane));
    let sketch_id = phantom_sketch.id;
    doc.transact(Origin::User, |txn| {
        txn.append_feature(Feature::new("Extrude", extrude_kind(sketch_id)));
        txn.append_feature(phantom_sketch);
    });
    let violations = doc_store::validate_document(&doc);
    assert!(violations
        .iter()
        .any(|v| matches!(v, doc_store::SchemaViolation::ForwardReference { .. })));
}

#[test]
fn concurrent_field_edits_resolve_by_last_writer() {
    let mut a = Document::seeded(SiteId(1), "part");
    let plane = a.feature_order()[1];
    let sketch = a.transact(Origin::User, |txn| {
        txn.append_feature(Feature::new("Sketch", sketch_kind(plane)))
    });
    let mut b = Document::new(SiteId(2), "part");
    b.apply_update(&a.encode_full()).unwrap();

    a.transact(Origin::User, |txn| txn.rename_feature(sketch, "From A"));
    b.transact(Origin::User, |txn| txn.rename_feature(sketch, "From B"));

    let ua = a.encode_since(&b.state_vector());
    let ub = b.encode_since(&a.state_vector());
    a.apply_update(&ub).unwrap();
    b.apply_update(&ua).unwrap();

    assert_eq!(
        a.feature(sketch).unwrap().name,
        b.feature(sketch).unwrap().name
    );
}
