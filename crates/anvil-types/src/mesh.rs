use serde::{Deserialize, Serialize};

/// Tessellated triangle mesh for a single body.
///
/// Flat buffers so the worker can move them across the thread boundary
/// without copying. Positions are kept in f64 document units; narrowing
/// for GPU upload is the viewer's concern.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriangleMesh {
    /// [x0, y0, z0, x1, y1, z1, ...]
    pub positions: Vec<f64>,
    /// Per-vertex normals, same layout as positions.
    pub normals: Vec<f64>,
    /// Triangle indices into the position array.
    pub indices: Vec<u32>,
    /// Maps contiguous index ranges back to kernel faces, for picking.
    pub face_map: Vec<FaceSpan>,
}

impl TriangleMesh {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }
}

/// One contiguous run of triangle indices belonging to a logical face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceSpan {
    /// Kernel face index within the owning body.
    pub face_index: u32,
    /// Start offset into `indices` (inclusive).
    pub start: u32,
    /// End offset into `indices` (exclusive).
    pub end: u32,
}
