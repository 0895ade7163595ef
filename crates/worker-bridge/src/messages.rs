//! The typed message protocol between the authoring domain (UI thread)
//! and the rebuild domain (worker). Serialized as JSON; binary payloads
//! (CRDT updates, STL buffers) travel base64-encoded.

use std::collections::BTreeMap;

use anvil_types::{
    BodyOp, BodySummary, DofReport, EntityId, ExtrudeDirection, FeatureError, FeatureId,
    PlaneBasis, SolveOutcome, StatusMap,
};
use feature_engine::RefIndex;
use serde::{Deserialize, Serialize};

/// Serde helper: bytes as base64 strings inside JSON messages.
mod b64 {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        STANDARD.decode(s).map_err(serde::de::Error::custom)
    }
}

/// Rebuild control messages, authoring domain → rebuild domain.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ControlMessage {
    /// Full catch-up payload for a late-joining mirror.
    InitSync {
        #[serde(with = "b64")]
        update: Vec<u8>,
    },
    /// One incremental CRDT update bundle.
    DocumentUpdate {
        #[serde(with = "b64")]
        update: Vec<u8>,
    },
    PreviewExtrude {
        sketch_id: FeatureId,
        distance: f64,
        direction: ExtrudeDirection,
        op: BodyOp,
    },
    PreviewRevolve {
        sketch_id: FeatureId,
        axis_entity_id: EntityId,
        angle: f64,
        op: BodyOp,
    },
    ClearPreview,
    ExportStl {
        #[serde(default)]
        binary: bool,
        #[serde(default)]
        name: Option<String>,
    },
    ExportStep {
        #[serde(default)]
        name: Option<String>,
    },
    ExportJson,
}

/// Result messages, rebuild domain → authoring domain.
///
/// Per-rebuild ordering: `rebuild-start`, then every `sketch-solved`,
/// then `rebuild-complete`, then one `mesh` per body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ResultMessage {
    Ready,
    RebuildStart,
    RebuildComplete {
        bodies: Vec<BodySummary>,
        status: StatusMap,
        errors: Vec<FeatureError>,
        ref_index: RefIndex,
    },
    Mesh {
        feature_id: FeatureId,
        mesh: anvil_types::TriangleMesh,
        color: String,
    },
    SketchSolved {
        sketch_id: FeatureId,
        points: BTreeMap<EntityId, (f64, f64)>,
        status: SolveOutcome,
        plane_transform: PlaneBasis,
        dof: DofReport,
    },
    PreviewMesh {
        mesh: anvil_types::TriangleMesh,
        op: BodyOp,
    },
    PreviewError {
        message: String,
    },
    Error {
        message: String,
    },
    StlExported {
        /// Base64 for binary STL, plain text for ASCII.
        data: String,
        binary: bool,
    },
    StepExported {
        data: String,
    },
    JsonExported {
        content: serde_json::Value,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_messages_use_kebab_case_tags() {
        let msg = ControlMessage::ExportStl {
            binary: true,
            name: Some("part".into()),
        };
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], "export-stl");

        let init = ControlMessage::InitSync {
            update: vec![1, 2, 3],
        };
        let value = serde_json::to_value(&init).unwrap();
        assert_eq!(value["type"], "init-sync");
        assert!(value["update"].is_string());
        let back: ControlMessage = serde_json::from_value(value).unwrap();
        match back {
            ControlMessage::InitSync { update } => assert_eq!(update, vec![1, 2, 3]),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn result_message_field_names_are_camel_case() {
        let msg = ResultMessage::SketchSolved {
            sketch_id: FeatureId::new(),
            points: BTreeMap::new(),
            status: SolveOutcome::Solved,
            plane_transform: PlaneBasis::world_xy(),
            dof: DofReport {
                total: 8,
                constrained: 8,
                remaining: 0,
                is_fully_constrained: true,
                is_over_constrained: false,
            },
        };
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], "sketch-solved");
        assert!(value.get("sketchId").is_some());
        assert!(value.get("planeTransform").is_some());
        assert!(value["dof"].get("isFullyConstrained").is_some());
    }
}
