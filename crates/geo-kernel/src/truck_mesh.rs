//! Tessellation of truck solids into `TriangleMesh`, with per-face
//! spans for picking. Wraps truck-meshalgo's triangulation.

use anvil_types::{FaceSpan, TriangleMesh};
use truck_meshalgo::prelude::*;
use truck_meshalgo::tessellation::MeshableShape;

use crate::types::KernelError;

type TruckSolid = truck_modeling::Solid;

/// Tessellate a truck solid. Each face is meshed as part of the solid,
/// then the meshed faces are walked in order to build the face map.
pub fn tessellate_solid(solid: &TruckSolid, tolerance: f64) -> Result<TriangleMesh, KernelError> {
    let meshed_solid = solid.triangulation(tolerance);

    let mut positions: Vec<f64> = Vec::new();
    let mut normals: Vec<f64> = Vec::new();
    let mut indices: Vec<u32> = Vec::new();
    let mut face_map: Vec<FaceSpan> = Vec::new();

    let mut face_index = 0u32;
    for shell in meshed_solid.boundaries().iter() {
        for face in shell.face_iter() {
            let current_face = face_index;
            face_index += 1;

            // Each meshed face's surface is Option<PolygonMesh>.
            let maybe_mesh: Option<PolygonMesh> = face.surface();
            let Some(face_mesh) = maybe_mesh else {
                continue;
            };

            // Inverted faces need their mesh inverted too.
            let face_mesh = if !face.orientation() {
                let mut m = face_mesh;
                m.invert();
                m
            } else {
                face_mesh
            };

            let start = indices.len() as u32;
            let base_vertex = (positions.len() / 3) as u32;

            let mesh_positions = face_mesh.positions();
            let mesh_normals = face_mesh.normals();
            let tri_faces = face_mesh.tri_faces();

            for pos in mesh_positions {
                positions.push(pos[0]);
                positions.push(pos[1]);
                positions.push(pos[2]);
            }

            if mesh_normals.is_empty() {
                for _ in 0..mesh_positions.len() {
                    normals.extend_from_slice(&[0.0, 0.0, 1.0]);
                }
            } else {
                for norm in mesh_normals {
                    normals.push(norm[0]);
                    normals.push(norm[1]);
                    normals.push(norm[2]);
                }
            }

            for tri in tri_faces {
                for v in tri.iter() {
                    indices.push(v.pos as u32 + base_vertex);
                }
            }

            let end = indices.len() as u32;
            if end > start {
                face_map.push(FaceSpan {
                    face_index: current_face,
                    start,
                    end,
                });
            }
        }
    }

    if positions.is_empty() {
        return Err(KernelError::TessellationFailed {
            reason: "triangulation produced no geometry".to_string(),
        });
    }

    Ok(TriangleMesh {
        positions,
        normals,
        indices,
        face_map,
    })
}
