use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ids::EntityId;
use crate::refs::TopoRef;

/// The geometric content of a sketch feature: points, curves, and
/// constraints, each keyed by opaque entity ids.
///
/// BTreeMaps keep key iteration lexicographic regardless of insertion
/// order — the solver walks these maps directly, so the same document
/// produces bit-identical solved positions on every replica.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SketchData {
    #[serde(rename = "pointsById", default)]
    pub points_by_id: BTreeMap<EntityId, SketchPoint>,
    #[serde(rename = "entitiesById", default)]
    pub entities_by_id: BTreeMap<EntityId, SketchEntity>,
    #[serde(rename = "constraintsById", default)]
    pub constraints_by_id: BTreeMap<EntityId, SketchConstraint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SketchPoint {
    pub x: f64,
    pub y: f64,
    /// Pinned in the solver.
    #[serde(default)]
    pub fixed: bool,
    /// Anchors this point to an edge or vertex of a prior body. The
    /// projected world position overrides (x, y) and pins the point.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attached_to: Option<ExternalAttachment>,
}

impl SketchPoint {
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            fixed: false,
            attached_to: None,
        }
    }
}

/// External reference from a sketch point to prior-body topology.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalAttachment {
    pub target: TopoRef,
    /// Position along an edge, 0 at the start vertex, 1 at the end.
    /// Ignored for vertex targets.
    #[serde(default = "half")]
    pub param: f64,
}

fn half() -> f64 {
    0.5
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SketchEntity {
    Line {
        start: EntityId,
        end: EntityId,
        #[serde(default)]
        construction: bool,
    },
    Arc {
        start: EntityId,
        end: EntityId,
        center: EntityId,
        ccw: bool,
    },
    Circle {
        center: EntityId,
        radius: f64,
    },
}

impl SketchEntity {
    pub fn is_construction(&self) -> bool {
        matches!(self, SketchEntity::Line { construction: true, .. })
    }

    /// Point ids this entity depends on.
    pub fn point_ids(&self) -> Vec<&EntityId> {
        match self {
            SketchEntity::Line { start, end, .. } => vec![start, end],
            SketchEntity::Arc {
                start, end, center, ..
            } => vec![start, end, center],
            SketchEntity::Circle { center, .. } => vec![center],
        }
    }
}

/// Either two points or one line — the argument shape shared by the
/// horizontal, vertical, and distance constraints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "of", rename_all = "camelCase")]
pub enum PointsOrLine {
    Points { a: EntityId, b: EntityId },
    Line { line: EntityId },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SketchConstraint {
    /// Two points share xy.
    Coincident { a: EntityId, b: EntityId },
    /// Endpoints share y.
    Horizontal {
        #[serde(flatten)]
        items: PointsOrLine,
    },
    /// Endpoints share x.
    Vertical {
        #[serde(flatten)]
        items: PointsOrLine,
    },
    /// Point pinned at (x, y).
    Fixed { point: EntityId, x: f64, y: f64 },
    /// Euclidean distance between two points, or a line's length.
    Distance {
        #[serde(flatten)]
        between: PointsOrLine,
        value: f64,
    },
    /// Directed angle between two lines, degrees.
    Angle {
        line_a: EntityId,
        line_b: EntityId,
        value: f64,
    },
    Parallel { line_a: EntityId, line_b: EntityId },
    Perpendicular { line_a: EntityId, line_b: EntityId },
    EqualLength { line_a: EntityId, line_b: EntityId },
    /// C¹ contact between a line and an arc at the shared endpoint.
    Tangent { line: EntityId, arc: EntityId },
    /// Two points mirrored across an axis line.
    Symmetric {
        a: EntityId,
        b: EntityId,
        axis: EntityId,
    },
}

impl SketchConstraint {
    /// Point ids referenced directly (not through an entity).
    pub fn point_ids(&self) -> Vec<&EntityId> {
        match self {
            SketchConstraint::Coincident { a, b } => vec![a, b],
            SketchConstraint::Horizontal { items } | SketchConstraint::Vertical { items } => {
                match items {
                    PointsOrLine::Points { a, b } => vec![a, b],
                    PointsOrLine::Line { .. } => vec![],
                }
            }
            SketchConstraint::Fixed { point, .. } => vec![point],
            SketchConstraint::Distance { between, .. } => match between {
                PointsOrLine::Points { a, b } => vec![a, b],
                PointsOrLine::Line { .. } => vec![],
            },
            SketchConstraint::Symmetric { a, b, .. } => vec![a, b],
            _ => vec![],
        }
    }

    /// Entity ids referenced (lines, arcs).
    pub fn entity_ids(&self) -> Vec<&EntityId> {
        match self {
            SketchConstraint::Horizontal { items } | SketchConstraint::Vertical { items } => {
                match items {
                    PointsOrLine::Points { .. } => vec![],
                    PointsOrLine::Line { line } => vec![line],
                }
            }
            SketchConstraint::Distance { between, .. } => match between {
                PointsOrLine::Points { .. } => vec![],
                PointsOrLine::Line { line } => vec![line],
            },
            SketchConstraint::Angle { line_a, line_b, .. }
            | SketchConstraint::Parallel { line_a, line_b }
            | SketchConstraint::Perpendicular { line_a, line_b }
            | SketchConstraint::EqualLength { line_a, line_b } => vec![line_a, line_b],
            SketchConstraint::Tangent { line, arc } => vec![line, arc],
            SketchConstraint::Symmetric { axis, .. } => vec![axis],
            _ => vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sketch_maps_iterate_lexicographically() {
        let mut data = SketchData::default();
        data.points_by_id.insert("p9".into(), SketchPoint::at(0.0, 0.0));
        data.points_by_id.insert("p10".into(), SketchPoint::at(1.0, 0.0));
        data.points_by_id.insert("a1".into(), SketchPoint::at(2.0, 0.0));

        let keys: Vec<&str> = data.points_by_id.keys().map(|k| k.as_str()).collect();
        // Lexicographic, not numeric or insertion order.
        assert_eq!(keys, vec!["a1", "p10", "p9"]);
    }

    #[test]
    fn distance_constraint_serializes_flat() {
        let c = SketchConstraint::Distance {
            between: PointsOrLine::Points {
                a: "p1".into(),
                b: "p2".into(),
            },
            value: 5.0,
        };
        let value = serde_json::to_value(&c).unwrap();
        assert_eq!(value["type"], "distance");
        assert_eq!(value["of"], "points");
        assert_eq!(value["value"], 5.0);
        let back: SketchConstraint = serde_json::from_value(value).unwrap();
        assert_eq!(back, c);
    }
}
