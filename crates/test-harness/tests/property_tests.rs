//! The quantified invariants of the core, checked over the real
//! document → worker → messages path.

use anvil_types::*;
use doc_store::{Document, SiteId};
use test_harness::*;
use worker_bridge::{ControlMessage, ResultMessage, WorkerSession};

fn s2_script() -> ModelScript {
    let mut script = ModelScript::new();
    let xy = script.xy_plane();
    let sketch = script.add("sketch1", rect_sketch(xy, 0.0, 0.0, 10.0, 5.0));
    script.add("extrude1", FeatureKind::Extrude(blind_extrude(sketch, 3.0)));
    let hole = script.add("sketch2", circle_sketch(xy, 5.0, 2.5, 1.0));
    script.add("extrude2", FeatureKind::Extrude(through_all_cut(hole)));
    script
}

#[test]
fn determinism_two_mirrors_publish_identical_payloads() {
    let script = s2_script();
    let update = script.doc.encode_full();

    let run = |site: u64| {
        let mut worker = WorkerSession::new(SiteId(site));
        worker.handle(
            ControlMessage::InitSync {
                update: update.clone(),
            },
            0,
        );
        worker.tick(16);
        serde_json::to_string(&worker.drain()).unwrap()
    };

    // Different mirror sites, bit-identical published payloads.
    assert_eq!(run(100), run(200));
}

#[test]
fn ordering_rebuild_messages_follow_the_contract() {
    let mut script = s2_script();
    let messages = script.sync_and_rebuild();
    assert_message_order(&messages);
    // Exactly one rebuild-complete per request.
    assert_eq!(
        messages
            .iter()
            .filter(|m| matches!(m, ResultMessage::RebuildComplete { .. }))
            .count(),
        1
    );
}

#[test]
fn gate_property_statuses_split_exactly_at_the_gate() {
    let mut script = s2_script();
    script.set_gate(Some("extrude1"));
    let messages = script.sync_and_rebuild();

    let order: Vec<FeatureId> = script.doc.feature_order().to_vec();
    let gate_pos = order
        .iter()
        .position(|&id| id == script.id("extrude1"))
        .unwrap();
    for (i, id) in order.iter().enumerate() {
        let status = status_of(&messages, *id);
        if i <= gate_pos {
            assert!(
                matches!(
                    status,
                    FeatureStatus::Computed | FeatureStatus::Error | FeatureStatus::Suppressed
                ),
                "feature {i} before gate has status {status:?}"
            );
        } else {
            assert_eq!(status, FeatureStatus::Gated, "feature {i} after gate");
        }
    }
}

#[test]
fn reference_before_use_holds_after_clean_rebuild() {
    let mut script = s2_script();
    let messages = script.sync_and_rebuild();
    assert_eq!(error_count(&messages), 0);

    let order: Vec<FeatureId> = script.doc.feature_order().to_vec();
    for (position, id) in order.iter().enumerate() {
        let feature = script.doc.feature(*id).unwrap();
        for target in feature.references() {
            let target_pos = order.iter().position(|&o| o == target);
            assert!(
                matches!(target_pos, Some(p) if p < position),
                "feature at {position} references {target} which is not earlier"
            );
        }
    }
}

#[test]
fn solver_fixpoint_no_rebuild_storm_after_writeback() {
    let mut script = ModelScript::new();
    let xy = script.xy_plane();
    let mut kind = rect_sketch(xy, 0.0, 0.3, 10.0, 5.0);
    if let FeatureKind::Sketch(s) = &mut kind {
        s.data.points_by_id.get_mut("p2").unwrap().y = 0.7;
        s.data.constraints_by_id.insert(
            "c1".into(),
            SketchConstraint::Horizontal {
                items: PointsOrLine::Line { line: "l1".into() },
            },
        );
    }
    script.add("sketch1", kind);

    let messages = script.sync_and_rebuild();
    assert_eq!(
        messages
            .iter()
            .filter(|m| matches!(m, ResultMessage::RebuildStart))
            .count(),
        1
    );

    // The solver write-back must not schedule further rebuilds.
    for t in 100..200 {
        script.worker.tick(t);
    }
    assert!(script.worker.drain().is_empty());
    assert!(!script.worker.rebuild_pending());
}

#[test]
fn round_trip_export_import_rebuilds_identically() {
    let mut script = s2_script();
    let first = script.sync_and_rebuild();

    let json = script.doc.to_json();
    let restored = Document::from_json(SiteId(7), &json).unwrap();
    assert_eq!(restored.to_json(), json);

    let mut worker = WorkerSession::new(SiteId(300));
    worker.handle(
        ControlMessage::InitSync {
            update: restored.encode_full(),
        },
        0,
    );
    worker.tick(16);
    let second = worker.drain();

    assert_eq!(body_count(&first), body_count(&second));
    assert_eq!(face_counts(&first), face_counts(&second));
}

#[test]
fn merge_policy_body_counts() {
    let overlapping = |scope: MergeScope, target_first: bool| {
        let mut script = ModelScript::new();
        let xy = script.xy_plane();
        let s1 = script.add("s1", rect_sketch(xy, 0.0, 0.0, 10.0, 5.0));
        let e1 = script.add("e1", FeatureKind::Extrude(blind_extrude(s1, 3.0)));
        let s2 = script.add("s2", rect_sketch(xy, 5.0, 0.0, 10.0, 5.0));
        let mut extrude = blind_extrude(s2, 3.0);
        extrude.merge_scope = scope;
        if target_first {
            extrude.target_bodies = vec![e1];
        }
        script.add("e2", FeatureKind::Extrude(extrude));
        let messages = script.sync_and_rebuild();
        body_count(&messages)
    };

    assert_eq!(overlapping(MergeScope::Auto, false), 1);
    assert_eq!(overlapping(MergeScope::New, false), 2);
    assert_eq!(overlapping(MergeScope::Specific, true), 1);
    // Specific without a resolvable target falls back to a new body.
    assert_eq!(overlapping(MergeScope::Specific, false), 2);
}

#[test]
fn disjoint_auto_extrudes_stay_separate_bodies() {
    let mut script = ModelScript::new();
    let xy = script.xy_plane();
    let s1 = script.add("s1", rect_sketch(xy, 0.0, 0.0, 4.0, 4.0));
    script.add("e1", FeatureKind::Extrude(blind_extrude(s1, 2.0)));
    let s2 = script.add("s2", rect_sketch(xy, 20.0, 0.0, 4.0, 4.0));
    script.add("e2", FeatureKind::Extrude(blind_extrude(s2, 2.0)));

    let messages = script.sync_and_rebuild();
    assert_eq!(body_count(&messages), 2);

    // Palette cycles across new bodies.
    match rebuild_complete(&messages) {
        ResultMessage::RebuildComplete { bodies, .. } => {
            assert_eq!(bodies[0].color, "#6699cc");
            assert_eq!(bodies[1].color, "#99cc99");
        }
        _ => unreachable!(),
    }
}

#[test]
fn units_scale_mesh_output_back_to_document_units() {
    let mut script = ModelScript::new();
    script
        .doc
        .transact(doc_store::Origin::User, |txn| txn.set_units(Units::In));
    let xy = script.xy_plane();
    let s1 = script.add("s1", rect_sketch(xy, 0.0, 0.0, 2.0, 1.0));
    script.add("e1", FeatureKind::Extrude(blind_extrude(s1, 1.0)));

    let messages = script.sync_and_rebuild();
    assert_eq!(error_count(&messages), 0);
    let mesh = messages
        .iter()
        .find_map(|m| match m {
            ResultMessage::Mesh { mesh, .. } => Some(mesh),
            _ => None,
        })
        .unwrap();
    // Positions come back in inches, not millimetres.
    let max = mesh.positions.iter().cloned().fold(f64::MIN, f64::max);
    assert!((max - 2.0).abs() < 1e-9, "max coordinate {max}");
}
