//! Persistent reference strings embedded in feature records.
//!
//! Syntax:
//! - `face:<featureId>:<selector>` — selector is a numeric ordinal or a
//!   geometric role token (`top`, `bottom`, `side<i>`, `lateral<i>`, `cap<i>`)
//! - `edge:<featureId>:<edgeIndex>`
//! - `vertex:<featureId>:<vertexIndex>`
//! - `point:<x>,<y>,<z>`

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ids::FeatureId;

/// A parsed persistent reference to upstream topology.
#[derive(Debug, Clone, PartialEq)]
pub enum TopoRef {
    Face {
        feature: FeatureId,
        selector: FaceSelector,
    },
    Edge {
        feature: FeatureId,
        index: u32,
    },
    Vertex {
        feature: FeatureId,
        index: u32,
    },
    /// Coordinate literal, used by three-point plane definitions.
    Point { x: f64, y: f64, z: f64 },
}

impl TopoRef {
    pub fn face(feature: FeatureId, selector: FaceSelector) -> Self {
        TopoRef::Face { feature, selector }
    }

    pub fn edge(feature: FeatureId, index: u32) -> Self {
        TopoRef::Edge { feature, index }
    }

    pub fn vertex(feature: FeatureId, index: u32) -> Self {
        TopoRef::Vertex { feature, index }
    }

    /// The feature a topological reference anchors to, if any.
    pub fn feature(&self) -> Option<FeatureId> {
        match self {
            TopoRef::Face { feature, .. }
            | TopoRef::Edge { feature, .. }
            | TopoRef::Vertex { feature, .. } => Some(*feature),
            TopoRef::Point { .. } => None,
        }
    }
}

/// How a face reference picks a face among a feature's output: either a
/// raw kernel ordinal or a role assigned by the operation that made it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FaceSelector {
    Index(u32),
    Top,
    Bottom,
    Side(u32),
    Lateral(u32),
    Cap(u32),
}

impl fmt::Display for FaceSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaceSelector::Index(i) => write!(f, "{i}"),
            FaceSelector::Top => write!(f, "top"),
            FaceSelector::Bottom => write!(f, "bottom"),
            FaceSelector::Side(i) => write!(f, "side{i}"),
            FaceSelector::Lateral(i) => write!(f, "lateral{i}"),
            FaceSelector::Cap(i) => write!(f, "cap{i}"),
        }
    }
}

impl FromStr for FaceSelector {
    type Err = RefParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(i) = s.parse::<u32>() {
            return Ok(FaceSelector::Index(i));
        }
        let parse_indexed = |prefix: &str| -> Option<Result<u32, RefParseError>> {
            s.strip_prefix(prefix).map(|rest| {
                rest.parse::<u32>()
                    .map_err(|_| RefParseError::BadSelector(s.to_string()))
            })
        };
        match s {
            "top" => Ok(FaceSelector::Top),
            "bottom" => Ok(FaceSelector::Bottom),
            _ => {
                if let Some(i) = parse_indexed("side") {
                    return Ok(FaceSelector::Side(i?));
                }
                if let Some(i) = parse_indexed("lateral") {
                    return Ok(FaceSelector::Lateral(i?));
                }
                if let Some(i) = parse_indexed("cap") {
                    return Ok(FaceSelector::Cap(i?));
                }
                Err(RefParseError::BadSelector(s.to_string()))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RefParseError {
    #[error("unknown reference kind in {0:?}")]
    UnknownKind(String),
    #[error("malformed reference {0:?}")]
    Malformed(String),
    #[error("bad feature id in reference {0:?}")]
    BadFeatureId(String),
    #[error("bad face selector {0:?}")]
    BadSelector(String),
    #[error("bad index in reference {0:?}")]
    BadIndex(String),
    #[error("bad coordinate literal {0:?}")]
    BadCoordinate(String),
}

impl fmt::Display for TopoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TopoRef::Face { feature, selector } => write!(f, "face:{feature}:{selector}"),
            TopoRef::Edge { feature, index } => write!(f, "edge:{feature}:{index}"),
            TopoRef::Vertex { feature, index } => write!(f, "vertex:{feature}:{index}"),
            TopoRef::Point { x, y, z } => write!(f, "point:{x},{y},{z}"),
        }
    }
}

impl FromStr for TopoRef {
    type Err = RefParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, rest) = s
            .split_once(':')
            .ok_or_else(|| RefParseError::Malformed(s.to_string()))?;

        match kind {
            "point" => {
                let mut coords = rest.split(',').map(|c| c.trim().parse::<f64>());
                match (coords.next(), coords.next(), coords.next(), coords.next()) {
                    (Some(Ok(x)), Some(Ok(y)), Some(Ok(z)), None) => {
                        Ok(TopoRef::Point { x, y, z })
                    }
                    _ => Err(RefParseError::BadCoordinate(s.to_string())),
                }
            }
            "face" | "edge" | "vertex" => {
                let (id_str, tail) = rest
                    .split_once(':')
                    .ok_or_else(|| RefParseError::Malformed(s.to_string()))?;
                let feature: FeatureId = id_str
                    .parse()
                    .map_err(|_| RefParseError::BadFeatureId(s.to_string()))?;
                match kind {
                    "face" => Ok(TopoRef::Face {
                        feature,
                        selector: tail.parse()?,
                    }),
                    "edge" => Ok(TopoRef::Edge {
                        feature,
                        index: tail
                            .parse()
                            .map_err(|_| RefParseError::BadIndex(s.to_string()))?,
                    }),
                    _ => Ok(TopoRef::Vertex {
                        feature,
                        index: tail
                            .parse()
                            .map_err(|_| RefParseError::BadIndex(s.to_string()))?,
                    }),
                }
            }
            _ => Err(RefParseError::UnknownKind(s.to_string())),
        }
    }
}

// References travel as their string form inside records and messages.
impl Serialize for TopoRef {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TopoRef {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
