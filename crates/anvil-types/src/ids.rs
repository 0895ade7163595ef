use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque stable identifier of a feature. Ids never move, rename, or
/// recycle within a document.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct FeatureId(pub Uuid);

impl FeatureId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn nil() -> Self {
        Self(Uuid::nil())
    }
}

impl Default for FeatureId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for FeatureId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(FeatureId)
    }
}

/// Sketch-local entity identifier (point, curve, or constraint key).
/// Opaque strings; all iteration over them is in lexicographic order so
/// that every replica solves in the same sequence.
pub type EntityId = String;

/// Stable body identifier: the feature that created the body plus an
/// ordinal for features that produce several bodies. Survives rebuilds
/// because it never encodes kernel handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BodyId {
    pub source: FeatureId,
    pub index: u32,
}

impl BodyId {
    pub fn new(source: FeatureId, index: u32) -> Self {
        Self { source, index }
    }
}

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "body:{}:{}", self.source, self.index)
    }
}

impl FromStr for BodyId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, ':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some("body"), Some(id), Some(idx)) => {
                let source = id.parse().map_err(|_| format!("bad body id uuid: {s}"))?;
                let index = idx.parse().map_err(|_| format!("bad body ordinal: {s}"))?;
                Ok(BodyId { source, index })
            }
            _ => Err(format!("bad body id: {s}")),
        }
    }
}

// Body ids travel as strings in messages and the reference index.
impl Serialize for BodyId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for BodyId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_id_round_trips_through_string_form() {
        let id = BodyId::new(FeatureId::new(), 3);
        let s = id.to_string();
        assert_eq!(s.parse::<BodyId>().unwrap(), id);
    }

    #[test]
    fn body_id_rejects_garbage() {
        assert!("face:xyz".parse::<BodyId>().is_err());
        assert!("body:not-a-uuid:0".parse::<BodyId>().is_err());
    }
}
