use serde::{Deserialize, Serialize};

use crate::geom::Vec3;
use crate::ids::{EntityId, FeatureId};
use crate::refs::TopoRef;
use crate::sketch::SketchData;

/// One node of the parametric history. The record shape on the wire is
/// `{id, type, name, suppressed, visible, ...variant fields}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub id: FeatureId,
    pub name: String,
    #[serde(default)]
    pub suppressed: bool,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(flatten)]
    pub kind: FeatureKind,
}

fn default_visible() -> bool {
    true
}

impl Feature {
    pub fn new(name: impl Into<String>, kind: FeatureKind) -> Self {
        Self {
            id: FeatureId::new(),
            name: name.into(),
            suppressed: false,
            visible: true,
            kind,
        }
    }

    /// Short discriminant name, used in status reporting and default
    /// feature naming.
    pub fn type_name(&self) -> &'static str {
        match self.kind {
            FeatureKind::Origin => "origin",
            FeatureKind::Plane(_) => "plane",
            FeatureKind::Axis(_) => "axis",
            FeatureKind::Sketch(_) => "sketch",
            FeatureKind::Extrude(_) => "extrude",
            FeatureKind::Revolve(_) => "revolve",
            FeatureKind::Boolean(_) => "boolean",
        }
    }

    /// Every cross-feature reference this feature carries, in record
    /// order. Used by validation (reference-before-use) and by
    /// suppression propagation.
    pub fn references(&self) -> Vec<FeatureId> {
        let mut out = Vec::new();
        match &self.kind {
            FeatureKind::Origin => {}
            FeatureKind::Plane(p) => match &p.definition {
                PlaneDefinition::Datum => {}
                PlaneDefinition::OffsetFromPlane { base, .. } => out.push(*base),
                PlaneDefinition::OffsetFromFace { face, .. } => {
                    if let TopoRef::Face { feature, .. } = face {
                        out.push(*feature);
                    }
                }
                PlaneDefinition::Midplane { first, second } => {
                    out.push(*first);
                    out.push(*second);
                }
                PlaneDefinition::AxisAngle { base, axis, .. } => {
                    out.push(*base);
                    out.push(*axis);
                }
                PlaneDefinition::ThreePoint { .. } => {}
            },
            FeatureKind::Axis(a) => match &a.definition {
                AxisDefinition::Datum | AxisDefinition::TwoPoint { .. } => {}
                AxisDefinition::AlongEdge { edge } => {
                    if let TopoRef::Edge { feature, .. } = edge {
                        out.push(*feature);
                    }
                }
                AxisDefinition::AlongSketchLine { sketch, .. } => out.push(*sketch),
            },
            FeatureKind::Sketch(s) => {
                match &s.plane {
                    PlaneRef::PlaneFeatureId { target } => out.push(*target),
                    PlaneRef::FaceRef { target } => {
                        if let TopoRef::Face { feature, .. } = target {
                            out.push(*feature);
                        }
                    }
                }
                for point in s.data.points_by_id.values() {
                    if let Some(attach) = &point.attached_to {
                        match &attach.target {
                            TopoRef::Edge { feature, .. } | TopoRef::Vertex { feature, .. } => {
                                out.push(*feature)
                            }
                            _ => {}
                        }
                    }
                }
            }
            FeatureKind::Extrude(e) => {
                out.push(e.sketch);
                if let Some(TopoRef::Face { feature, .. } | TopoRef::Vertex { feature, .. }) =
                    &e.extent_ref
                {
                    out.push(*feature);
                }
                out.extend(e.target_bodies.iter().copied());
            }
            FeatureKind::Revolve(r) => {
                out.push(r.sketch);
                out.extend(r.target_bodies.iter().copied());
            }
            FeatureKind::Boolean(b) => {
                out.push(b.target);
                out.push(b.tool);
            }
        }
        out
    }
}

/// Tagged feature variant. The `type` field of the raw record is the
/// discriminant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FeatureKind {
    Origin,
    Plane(PlaneFeature),
    Axis(AxisFeature),
    Sketch(SketchFeature),
    Extrude(ExtrudeFeature),
    Revolve(RevolveFeature),
    Boolean(BooleanFeature),
}

/// Role of a default datum plane. Datums with a role have a fixed
/// basis; derived planes have `role = None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaneRole {
    Xy,
    Xz,
    Yz,
}

impl PlaneRole {
    pub fn basis(self) -> (Vec3, Vec3, Vec3) {
        match self {
            PlaneRole::Xy => ([0.0; 3], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0]),
            PlaneRole::Xz => ([0.0; 3], [0.0, -1.0, 0.0], [1.0, 0.0, 0.0]),
            PlaneRole::Yz => ([0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaneFeature {
    pub origin: Vec3,
    pub normal: Vec3,
    pub x_dir: Vec3,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<PlaneRole>,
    pub definition: PlaneDefinition,
}

/// How a plane's basis is derived at rebuild time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PlaneDefinition {
    /// Basis is stored verbatim (the three default datums, or a free plane).
    Datum,
    OffsetFromPlane { base: FeatureId, offset: f64 },
    OffsetFromFace { face: TopoRef, offset: f64 },
    Midplane { first: FeatureId, second: FeatureId },
    AxisAngle { base: FeatureId, axis: FeatureId, angle_degrees: f64 },
    ThreePoint { a: Vec3, b: Vec3, c: Vec3 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AxisFeature {
    pub origin: Vec3,
    pub direction: Vec3,
    pub definition: AxisDefinition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum AxisDefinition {
    Datum,
    AlongEdge { edge: TopoRef },
    TwoPoint { a: Vec3, b: Vec3 },
    AlongSketchLine { sketch: FeatureId, line: EntityId },
}

/// Reference from a sketch to the plane it lives on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PlaneRef {
    /// A plane feature, by id.
    PlaneFeatureId {
        #[serde(rename = "ref")]
        target: FeatureId,
    },
    /// A planar face of a prior body, `face:<featureId>:<faceIndex>`.
    FaceRef {
        #[serde(rename = "ref")]
        target: TopoRef,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SketchFeature {
    pub plane: PlaneRef,
    pub data: SketchData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExtrudeExtent {
    Blind,
    ThroughAll,
    ToFace,
    ToVertex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExtrudeDirection {
    Normal,
    Reverse,
}

/// Whether a swept feature adds material or removes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BodyOp {
    Add,
    Cut,
}

/// How an additive result combines with the existing body set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MergeScope {
    /// Union with every existing body sharing volume with the result.
    Auto,
    /// Always a fresh body.
    New,
    /// Union into the listed target bodies, in order.
    Specific,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtrudeFeature {
    pub sketch: FeatureId,
    pub distance: f64,
    pub extent: ExtrudeExtent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extent_ref: Option<TopoRef>,
    pub direction: ExtrudeDirection,
    pub op: BodyOp,
    pub merge_scope: MergeScope,
    #[serde(default)]
    pub target_bodies: Vec<FeatureId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_body_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_body_color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevolveFeature {
    pub sketch: FeatureId,
    /// A sketch line used as the revolution axis; treated as
    /// construction geometry when extracting the profile.
    pub axis: EntityId,
    pub angle: f64,
    pub op: BodyOp,
    pub merge_scope: MergeScope,
    #[serde(default)]
    pub target_bodies: Vec<FeatureId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_body_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_body_color: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BooleanOp {
    Union,
    Subtract,
    Intersect,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BooleanFeature {
    pub operation: BooleanOp,
    pub target: FeatureId,
    pub tool: FeatureId,
}
