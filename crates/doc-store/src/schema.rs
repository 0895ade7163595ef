//! Feature schema: materialize typed features from raw records and
//! validate document-level invariants.
//!
//! Parsing checks record shape, numeric ranges, and reference
//! well-formedness (string shape only). Whether a referenced feature
//! exists and appears earlier in `featureOrder` is the rebuilder's job.

use std::collections::BTreeSet;

use anvil_types::{Feature, FeatureId, FeatureKind, PlaneRole, SketchEntity};
use serde_json::Value;

use crate::document::Document;
use crate::errors::ParseError;

/// Materialize a typed `Feature` from a raw tree record.
pub fn parse_feature(record: &Value) -> Result<Feature, ParseError> {
    let feature: Feature = serde_json::from_value(record.clone())
        .map_err(|e| ParseError::Malformed(e.to_string()))?;
    check_ranges(&feature)?;
    Ok(feature)
}

/// Serialize a typed feature back to its record form. Round-trips
/// exactly through `parse_feature`.
pub fn serialize_feature(feature: &Feature) -> Value {
    serde_json::to_value(feature).expect("feature serialization is infallible")
}

fn check_ranges(feature: &Feature) -> Result<(), ParseError> {
    match &feature.kind {
        FeatureKind::Extrude(e) => {
            if !e.distance.is_finite() {
                return Err(ParseError::OutOfRange {
                    field: "distance",
                    detail: format!("{} is not finite", e.distance),
                });
            }
        }
        FeatureKind::Revolve(r) => {
            if !r.angle.is_finite() || r.angle == 0.0 {
                return Err(ParseError::OutOfRange {
                    field: "angle",
                    detail: format!("{} degrees", r.angle),
                });
            }
        }
        FeatureKind::Sketch(s) => {
            for (id, point) in &s.data.points_by_id {
                if !point.x.is_finite() || !point.y.is_finite() {
                    return Err(ParseError::OutOfRange {
                        field: "point",
                        detail: format!("point {id} has non-finite coordinates"),
                    });
                }
                if let Some(attach) = &point.attached_to {
                    if !(0.0..=1.0).contains(&attach.param) {
                        return Err(ParseError::OutOfRange {
                            field: "param",
                            detail: format!("point {id} param {} not in [0, 1]", attach.param),
                        });
                    }
                }
            }
            for (id, entity) in &s.data.entities_by_id {
                if let SketchEntity::Circle { radius, .. } = entity {
                    if !radius.is_finite() || *radius <= 0.0 {
                        return Err(ParseError::OutOfRange {
                            field: "radius",
                            detail: format!("circle {id} radius {radius}"),
                        });
                    }
                }
            }
        }
        FeatureKind::Plane(p) => {
            let n = p.normal;
            if n[0] * n[0] + n[1] * n[1] + n[2] * n[2] < 1e-24 {
                return Err(ParseError::OutOfRange {
                    field: "normal",
                    detail: "zero-length plane normal".into(),
                });
            }
        }
        _ => {}
    }
    Ok(())
}

/// One document-level invariant violation.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaViolation {
    /// A record failed to parse.
    BadRecord { id: FeatureId, detail: String },
    /// Missing origin/datum seeding at positions 0–3.
    MissingDefaults { detail: String },
    /// A reference names a feature at or after the referencing one.
    ForwardReference { from: FeatureId, to: FeatureId },
    /// A sketch constraint or entity names an id outside its sketch.
    DanglingSketchRef { sketch: FeatureId, entity: String },
}

/// Validate the whole-document invariants of §3: seeding, order
/// agreement, reference-before-use, and sketch-local resolution.
pub fn validate_document(doc: &Document) -> Vec<SchemaViolation> {
    let mut violations = Vec::new();
    let order = doc.feature_order();

    if !order.is_empty() {
        let mut ok = order.len() >= 4;
        if ok {
            ok = matches!(
                doc.feature(order[0]).map(|f| f.kind),
                Ok(FeatureKind::Origin)
            );
            for (i, role) in [PlaneRole::Xy, PlaneRole::Xz, PlaneRole::Yz]
                .into_iter()
                .enumerate()
            {
                match doc.feature(order[i + 1]) {
                    Ok(Feature {
                        kind: FeatureKind::Plane(p),
                        ..
                    }) if p.role == Some(role) => {}
                    _ => ok = false,
                }
            }
        }
        if !ok {
            violations.push(SchemaViolation::MissingDefaults {
                detail: "origin and xy/xz/yz datums must occupy positions 0-3".into(),
            });
        }
    }

    let mut seen: BTreeSet<FeatureId> = BTreeSet::new();
    for &id in order {
        let feature = match doc.feature(id) {
            Ok(f) => f,
            Err(e) => {
                violations.push(SchemaViolation::BadRecord {
                    id,
                    detail: e.to_string(),
                });
                seen.insert(id);
                continue;
            }
        };

        for target in feature.references() {
            if !seen.contains(&target) {
                violations.push(SchemaViolation::ForwardReference { from: id, to: target });
            }
        }

        if let FeatureKind::Sketch(s) = &feature.kind {
            for (eid, entity) in &s.data.entities_by_id {
                for pid in entity.point_ids() {
                    if !s.data.points_by_id.contains_key(pid) {
                        violations.push(SchemaViolation::DanglingSketchRef {
                            sketch: id,
                            entity: format!("{eid} -> point {pid}"),
                        });
                    }
                }
            }
            for (cid, constraint) in &s.data.constraints_by_id {
                for pid in constraint.point_ids() {
                    if !s.data.points_by_id.contains_key(pid) {
                        violations.push(SchemaViolation::DanglingSketchRef {
                            sketch: id,
                            entity: format!("{cid} -> point {pid}"),
                        });
                    }
                }
                for eid in constraint.entity_ids() {
                    if !s.data.entities_by_id.contains_key(eid) {
                        violations.push(SchemaViolation::DanglingSketchRef {
                            sketch: id,
                            entity: format!("{cid} -> entity {eid}"),
                        });
                    }
                }
            }
        }

        seen.insert(id);
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use anvil_types::{BooleanFeature, BooleanOp};

    #[test]
    fn parse_rejects_unknown_discriminant() {
        let raw = serde_json::json!({
            "id": uuid::Uuid::new_v4(),
            "type": "loft",
            "name": "Loft 1",
        });
        assert!(matches!(parse_feature(&raw), Err(ParseError::Malformed(_))));
    }

    #[test]
    fn parse_rejects_zero_revolve_angle() {
        let feature = Feature::new(
            "r",
            FeatureKind::Revolve(anvil_types::RevolveFeature {
                sketch: FeatureId::new(),
                axis: "l1".into(),
                angle: 0.0,
                op: anvil_types::BodyOp::Add,
                merge_scope: anvil_types::MergeScope::Auto,
                target_bodies: vec![],
                result_body_name: None,
                result_body_color: None,
            }),
        );
        let record = serialize_feature(&feature);
        assert!(matches!(
            parse_feature(&record),
            Err(ParseError::OutOfRange { field: "angle", .. })
        ));
    }

    #[test]
    fn parse_rejects_attachment_param_outside_unit_range() {
        let mut data = anvil_types::SketchData::default();
        let mut point = anvil_types::SketchPoint::at(0.0, 0.0);
        point.attached_to = Some(anvil_types::ExternalAttachment {
            target: anvil_types::TopoRef::edge(FeatureId::new(), 0),
            param: 1.5,
        });
        data.points_by_id.insert("p1".into(), point);
        let feature = Feature::new(
            "s",
            FeatureKind::Sketch(anvil_types::SketchFeature {
                plane: anvil_types::PlaneRef::PlaneFeatureId {
                    target: FeatureId::new(),
                },
                data,
            }),
        );
        assert!(matches!(
            parse_feature(&serialize_feature(&feature)),
            Err(ParseError::OutOfRange { field: "param", .. })
        ));
    }

    #[test]
    fn round_trip_is_exact() {
        let feature = Feature::new(
            "Boolean 1",
            FeatureKind::Boolean(BooleanFeature {
                operation: BooleanOp::Intersect,
                target: FeatureId::new(),
                tool: FeatureId::new(),
            }),
        );
        let record = serialize_feature(&feature);
        let back = parse_feature(&record).unwrap();
        assert_eq!(back, feature);
        assert_eq!(serialize_feature(&back), record);
    }
}
