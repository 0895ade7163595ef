//! Feature-record builders used across the scenario suite.

use anvil_types::*;

/// Rectangle sketch on a plane feature: points p1..p4, lines l1..l4.
pub fn rect_sketch(plane: FeatureId, x: f64, y: f64, w: f64, h: f64) -> FeatureKind {
    let mut data = SketchData::default();
    for (id, px, py) in [
        ("p1", x, y),
        ("p2", x + w, y),
        ("p3", x + w, y + h),
        ("p4", x, y + h),
    ] {
        data.points_by_id.insert(id.into(), SketchPoint::at(px, py));
    }
    for (id, start, end) in [
        ("l1", "p1", "p2"),
        ("l2", "p2", "p3"),
        ("l3", "p3", "p4"),
        ("l4", "p4", "p1"),
    ] {
        data.entities_by_id.insert(
            id.into(),
            SketchEntity::Line {
                start: start.into(),
                end: end.into(),
                construction: false,
            },
        );
    }
    FeatureKind::Sketch(SketchFeature {
        plane: PlaneRef::PlaneFeatureId { target: plane },
        data,
    })
}

/// Circle sketch: point pc, circle k1.
pub fn circle_sketch(plane: FeatureId, cx: f64, cy: f64, r: f64) -> FeatureKind {
    circle_sketch_on(PlaneRef::PlaneFeatureId { target: plane }, cx, cy, r)
}

/// Circle sketch on an arbitrary plane reference (e.g. a face).
pub fn circle_sketch_on(plane: PlaneRef, cx: f64, cy: f64, r: f64) -> FeatureKind {
    let mut data = SketchData::default();
    data.points_by_id.insert("pc".into(), SketchPoint::at(cx, cy));
    data.entities_by_id.insert(
        "k1".into(),
        SketchEntity::Circle {
            center: "pc".into(),
            radius: r,
        },
    );
    FeatureKind::Sketch(SketchFeature { plane, data })
}

/// Blind additive extrude with auto merge — the common case.
pub fn blind_extrude(sketch: FeatureId, distance: f64) -> ExtrudeFeature {
    ExtrudeFeature {
        sketch,
        distance,
        extent: ExtrudeExtent::Blind,
        extent_ref: None,
        direction: ExtrudeDirection::Normal,
        op: BodyOp::Add,
        merge_scope: MergeScope::Auto,
        target_bodies: vec![],
        result_body_name: None,
        result_body_color: None,
    }
}

/// Through-all cut.
pub fn through_all_cut(sketch: FeatureId) -> ExtrudeFeature {
    ExtrudeFeature {
        extent: ExtrudeExtent::ThroughAll,
        op: BodyOp::Cut,
        ..blind_extrude(sketch, 0.0)
    }
}
