//! Persistent-reference index: stable descriptors for faces, edges,
//! and vertices of the bodies a rebuild produced.
//!
//! Descriptors name the creating feature plus either a geometric role
//! token (`top`, `bottom`, `side2`, `lateral0`, `cap1`) or a raw
//! ordinal. The index is rebuilt after interpretation on every rebuild;
//! kernel indices may shift between rebuilds, descriptors do not.
//! Lookups on descriptors that no longer match return None, which
//! surfaces as `INVALID_REFERENCE` in the depending feature.

use std::collections::BTreeMap;

use anvil_types::{BodyId, FaceSelector, TopoRef};
use geo_kernel::KernelQuery;
use serde::{Deserialize, Serialize};

use crate::types::BodyEntry;

/// Resolved target of a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefTarget {
    pub body: BodyId,
    pub index: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefIndex {
    pub faces: BTreeMap<String, RefTarget>,
    pub edges: BTreeMap<String, RefTarget>,
    pub vertices: BTreeMap<String, RefTarget>,
}

impl RefIndex {
    /// Index every entity of every registry body under its source
    /// feature, ordinals always, role tokens where the operation
    /// assigned them.
    pub fn build(registry: &[BodyEntry], queries: &dyn KernelQuery) -> Self {
        let mut index = RefIndex::default();
        for entry in registry {
            let feature = entry.id.source;
            for face in 0..queries.face_count(&entry.handle) as u32 {
                index.faces.insert(
                    format!("face:{feature}:{face}"),
                    RefTarget {
                        body: entry.id,
                        index: face,
                    },
                );
            }
            for (face, selector) in &entry.roles {
                if matches!(selector, FaceSelector::Index(_)) {
                    continue;
                }
                index.faces.insert(
                    format!("face:{feature}:{selector}"),
                    RefTarget {
                        body: entry.id,
                        index: *face,
                    },
                );
            }
            for edge in 0..queries.edge_count(&entry.handle) as u32 {
                index.edges.insert(
                    format!("edge:{feature}:{edge}"),
                    RefTarget {
                        body: entry.id,
                        index: edge,
                    },
                );
            }
            for vertex in 0..queries.vertex_count(&entry.handle) as u32 {
                index.vertices.insert(
                    format!("vertex:{feature}:{vertex}"),
                    RefTarget {
                        body: entry.id,
                        index: vertex,
                    },
                );
            }
        }
        index
    }

    /// Resolve a parsed reference. None means the descriptor does not
    /// match anything in this rebuild.
    pub fn resolve(&self, r: &TopoRef) -> Option<RefTarget> {
        match r {
            TopoRef::Face { .. } => self.faces.get(&r.to_string()).copied(),
            TopoRef::Edge { .. } => self.edges.get(&r.to_string()).copied(),
            TopoRef::Vertex { .. } => self.vertices.get(&r.to_string()).copied(),
            TopoRef::Point { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anvil_types::{FeatureId, PlaneBasis, Profile, ProfileRing};
    use geo_kernel::{AnalyticKernel, ExtrudeSpec, Kernel};

    #[test]
    fn index_contains_ordinals_and_roles() {
        let mut kernel = AnalyticKernel::new();
        let profile = Profile {
            plane: PlaneBasis::world_xy(),
            rings: vec![ProfileRing::Polygon {
                points: vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]],
                entities: Vec::new(),
            }],
        };
        let output = modeling_ops::execute_extrude(&mut kernel, &profile, 2.0).unwrap();
        let feature = FeatureId::new();
        let registry = vec![BodyEntry {
            id: BodyId::new(feature, 0),
            handle: output.handle,
            name: "Body 1".into(),
            color: "#6699cc".into(),
            roles: output.roles,
        }];

        let index = RefIndex::build(&registry, &kernel);
        assert!(index.faces.contains_key(&format!("face:{feature}:0")));
        assert!(index.faces.contains_key(&format!("face:{feature}:top")));
        assert!(index.faces.contains_key(&format!("face:{feature}:bottom")));
        assert_eq!(index.edges.len(), 12);
        assert_eq!(index.vertices.len(), 8);

        let top: TopoRef = format!("face:{feature}:top").parse().unwrap();
        let resolved = index.resolve(&top).unwrap();
        assert_eq!(resolved.body, BodyId::new(feature, 0));

        // A descriptor for a feature that produced nothing resolves to None.
        let missing: TopoRef = format!("face:{}:top", FeatureId::new()).parse().unwrap();
        assert!(index.resolve(&missing).is_none());
    }
}
