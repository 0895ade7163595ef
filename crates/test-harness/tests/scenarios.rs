//! End-to-end scenarios through the real worker message path.

use anvil_types::*;
use test_harness::*;
use worker_bridge::{ControlMessage, ResultMessage};

#[test]
fn s1_rectangle_extrude() {
    let mut script = ModelScript::new();
    let xy = script.xy_plane();
    let sketch = script.add("sketch1", rect_sketch(xy, 0.0, 0.0, 10.0, 5.0));
    script.add("extrude1", FeatureKind::Extrude(blind_extrude(sketch, 3.0)));

    let messages = script.sync_and_rebuild();
    assert_message_order(&messages);
    assert_eq!(body_count(&messages), 1);
    assert_eq!(face_counts(&messages), vec![6]);
    assert_eq!(error_count(&messages), 0);
}

#[test]
fn s2_cut_through() {
    let mut script = ModelScript::new();
    let xy = script.xy_plane();
    let sketch = script.add("sketch1", rect_sketch(xy, 0.0, 0.0, 10.0, 5.0));
    script.add("extrude1", FeatureKind::Extrude(blind_extrude(sketch, 3.0)));
    let hole = script.add("sketch2", circle_sketch(xy, 5.0, 2.5, 1.0));
    script.add("extrude2", FeatureKind::Extrude(through_all_cut(hole)));

    let messages = script.sync_and_rebuild();
    assert_message_order(&messages);
    assert_eq!(body_count(&messages), 1);
    assert_eq!(face_counts(&messages), vec![7]);
    assert_eq!(error_count(&messages), 0);
}

#[test]
fn s3_gated_rebuild() {
    let mut script = ModelScript::new();
    let xy = script.xy_plane();
    let sketch = script.add("sketch1", rect_sketch(xy, 0.0, 0.0, 10.0, 5.0));
    script.add("extrude1", FeatureKind::Extrude(blind_extrude(sketch, 3.0)));
    script.set_gate(Some("sketch1"));

    let messages = script.sync_and_rebuild();
    assert_eq!(
        status_of(&messages, script.id("sketch1")),
        FeatureStatus::Computed
    );
    assert_eq!(
        status_of(&messages, script.id("extrude1")),
        FeatureStatus::Gated
    );
    assert_eq!(body_count(&messages), 0);
}

#[test]
fn s4_suppressed_upstream() {
    let mut script = ModelScript::new();
    let xy = script.xy_plane();
    let sketch1 = script.add("sketch1", rect_sketch(xy, 0.0, 0.0, 10.0, 5.0));
    script.add("extrude1", FeatureKind::Extrude(blind_extrude(sketch1, 3.0)));
    let sketch2 = script.add("sketch2", circle_sketch(xy, 5.0, 2.5, 1.0));
    script.add("extrude2", FeatureKind::Extrude(through_all_cut(sketch2)));
    script.suppress("extrude1", true);

    let messages = script.sync_and_rebuild();
    assert_eq!(
        status_of(&messages, script.id("sketch1")),
        FeatureStatus::Computed
    );
    assert_eq!(
        status_of(&messages, script.id("extrude1")),
        FeatureStatus::Suppressed
    );
    assert_eq!(
        status_of(&messages, script.id("sketch2")),
        FeatureStatus::Computed
    );
    assert_eq!(
        status_of(&messages, script.id("extrude2")),
        FeatureStatus::Error
    );
    assert_eq!(body_count(&messages), 0);

    match rebuild_complete(&messages) {
        ResultMessage::RebuildComplete { errors, .. } => {
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].feature_id, script.id("extrude2"));
            assert_eq!(errors[0].code, ErrorCode::BuildError);
        }
        _ => unreachable!(),
    }
}

#[test]
fn s5_over_constrained_sketch_still_builds() {
    let mut script = ModelScript::new();
    let xy = script.xy_plane();
    let mut kind = rect_sketch(xy, 0.0, 0.0, 10.0, 5.0);
    if let FeatureKind::Sketch(s) = &mut kind {
        s.data.points_by_id.get_mut("p1").unwrap().fixed = true;
        s.data.points_by_id.get_mut("p2").unwrap().fixed = true;
        s.data.constraints_by_id.insert(
            "c1".into(),
            SketchConstraint::Distance {
                between: PointsOrLine::Line { line: "l1".into() },
                value: 42.0,
            },
        );
    }
    let sketch = script.add("sketch1", kind);
    script.add("extrude1", FeatureKind::Extrude(blind_extrude(sketch, 3.0)));

    let messages = script.sync_and_rebuild();
    let solved = messages
        .iter()
        .find_map(|m| match m {
            ResultMessage::SketchSolved {
                sketch_id,
                status,
                dof,
                ..
            } if *sketch_id == sketch => Some((*status, *dof)),
            _ => None,
        })
        .expect("sketch-solved published");
    assert_eq!(solved.0, SolveOutcome::OverConstrained);
    assert!(solved.1.is_over_constrained);
    assert_eq!(
        status_of(&messages, script.id("sketch1")),
        FeatureStatus::Computed
    );
    assert_eq!(body_count(&messages), 1);
}

#[test]
fn s6_external_attachment_tracks_edge_midpoint() {
    let mut script = ModelScript::new();
    let xy = script.xy_plane();
    let sketch = script.add("sketch1", rect_sketch(xy, 0.0, 0.0, 10.0, 5.0));
    let base = script.add("extrude1", FeatureKind::Extrude(blind_extrude(sketch, 3.0)));

    // Sketch on the box's top face; its center point rides the
    // midpoint of the first top edge.
    let top_face: TopoRef = format!("face:{base}:top").parse().unwrap();
    let mut kind = circle_sketch_on(PlaneRef::FaceRef { target: top_face }, 0.0, 0.0, 1.0);
    if let FeatureKind::Sketch(s) = &mut kind {
        s.data.points_by_id.get_mut("pc").unwrap().attached_to = Some(ExternalAttachment {
            target: TopoRef::edge(base, 4),
            param: 0.5,
        });
    }
    let hole_sketch = script.add("sketch2", kind);
    script.add(
        "extrude2",
        FeatureKind::Extrude(ExtrudeFeature {
            direction: ExtrudeDirection::Reverse,
            ..through_all_cut(hole_sketch)
        }),
    );

    let attached_world = |messages: &[ResultMessage]| -> Vec3 {
        messages
            .iter()
            .find_map(|m| match m {
                ResultMessage::SketchSolved {
                    sketch_id,
                    points,
                    plane_transform,
                    ..
                } if *sketch_id == hole_sketch => {
                    let (u, v) = points["pc"];
                    Some(plane_transform.to_world(u, v))
                }
                _ => None,
            })
            .expect("hole sketch solved")
    };

    let messages = script.sync_and_rebuild();
    assert_eq!(error_count(&messages), 0);
    let before = attached_world(&messages);
    assert!((before[0] - 5.0).abs() < 1e-9);
    assert!(before[1].abs() < 1e-9);
    assert!((before[2] - 3.0).abs() < 1e-9);

    // Grow the base extrude; the attachment must follow the edge.
    script.edit("extrude1", |f| {
        if let FeatureKind::Extrude(e) = &mut f.kind {
            e.distance = 5.0;
        }
    });
    let messages = script.sync_and_rebuild();
    assert_eq!(error_count(&messages), 0);
    let after = attached_world(&messages);
    assert!((after[0] - 5.0).abs() < 1e-9);
    assert!(after[1].abs() < 1e-9);
    assert!(
        (after[2] - 5.0).abs() < 1e-9,
        "cut stays anchored to the lifted edge, z = {}",
        after[2]
    );
}

#[test]
fn preview_extrude_returns_mesh_without_touching_bodies() {
    let mut script = ModelScript::new();
    let xy = script.xy_plane();
    let sketch = script.add("sketch1", rect_sketch(xy, 0.0, 0.0, 4.0, 4.0));
    let first = script.sync_and_rebuild();
    assert_eq!(body_count(&first), 0);

    let messages = script.send(ControlMessage::PreviewExtrude {
        sketch_id: sketch,
        distance: 2.0,
        direction: ExtrudeDirection::Normal,
        op: BodyOp::Add,
    });
    let mesh = messages
        .iter()
        .find_map(|m| match m {
            ResultMessage::PreviewMesh { mesh, .. } => Some(mesh),
            _ => None,
        })
        .expect("preview mesh");
    assert!(!mesh.positions.is_empty());

    // Previewing an unknown sketch reports preview-error.
    let messages = script.send(ControlMessage::PreviewExtrude {
        sketch_id: FeatureId::new(),
        distance: 2.0,
        direction: ExtrudeDirection::Normal,
        op: BodyOp::Add,
    });
    assert!(messages
        .iter()
        .any(|m| matches!(m, ResultMessage::PreviewError { .. })));
}

#[test]
fn exports_stl_step_json() {
    let mut script = ModelScript::new();
    let xy = script.xy_plane();
    let sketch = script.add("sketch1", rect_sketch(xy, 0.0, 0.0, 10.0, 5.0));
    script.add("extrude1", FeatureKind::Extrude(blind_extrude(sketch, 3.0)));
    script.sync_and_rebuild();

    // Binary STL.
    let messages = script.send(ControlMessage::ExportStl {
        binary: true,
        name: Some("part".into()),
    });
    match &messages[0] {
        ResultMessage::StlExported { data, binary } => {
            assert!(*binary);
            assert!(!data.is_empty());
        }
        other => panic!("unexpected {other:?}"),
    }

    // ASCII STL.
    let messages = script.send(ControlMessage::ExportStl {
        binary: false,
        name: Some("part".into()),
    });
    match &messages[0] {
        ResultMessage::StlExported { data, binary } => {
            assert!(!*binary);
            assert!(data.starts_with("solid part"));
        }
        other => panic!("unexpected {other:?}"),
    }

    // STEP is not supported by the analytic backend.
    let messages = script.send(ControlMessage::ExportStep { name: None });
    assert!(matches!(messages[0], ResultMessage::Error { .. }));

    // JSON export is the loss-less document projection.
    let messages = script.send(ControlMessage::ExportJson);
    match &messages[0] {
        ResultMessage::JsonExported { content } => {
            assert_eq!(*content, script.doc.to_json());
        }
        other => panic!("unexpected {other:?}"),
    }
}
