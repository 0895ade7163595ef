//! STL encoding from triangle meshes — binary and ASCII layouts.
//!
//! Binary: 80-byte header, u32 LE triangle count, then 50 bytes per
//! triangle (normal + three vertices as f32 LE + u16 attribute).

use anvil_types::TriangleMesh;

/// Encode meshes as one binary STL buffer.
pub fn to_binary_stl(meshes: &[&TriangleMesh], name: &str) -> Vec<u8> {
    let tri_count: usize = meshes.iter().map(|m| m.triangle_count()).sum();
    let mut buf = Vec::with_capacity(84 + tri_count * 50);

    let header = format!("binary STL: {name}");
    let header_bytes = header.as_bytes();
    buf.extend_from_slice(&header_bytes[..header_bytes.len().min(80)]);
    buf.resize(80, 0u8);
    buf.extend_from_slice(&(tri_count as u32).to_le_bytes());

    for mesh in meshes {
        for tri in mesh.indices.chunks(3) {
            let [v0, v1, v2] = triangle_vertices(mesh, tri);
            let normal = face_normal(v0, v1, v2);
            for c in normal {
                buf.extend_from_slice(&(c as f32).to_le_bytes());
            }
            for v in [v0, v1, v2] {
                for c in v {
                    buf.extend_from_slice(&(c as f32).to_le_bytes());
                }
            }
            buf.extend_from_slice(&0u16.to_le_bytes());
        }
    }
    buf
}

/// Encode meshes as an ASCII STL document.
pub fn to_ascii_stl(meshes: &[&TriangleMesh], name: &str) -> String {
    let mut out = String::new();
    out.push_str(&format!("solid {name}\n"));
    for mesh in meshes {
        for tri in mesh.indices.chunks(3) {
            let [v0, v1, v2] = triangle_vertices(mesh, tri);
            let n = face_normal(v0, v1, v2);
            out.push_str(&format!("  facet normal {:e} {:e} {:e}\n", n[0], n[1], n[2]));
            out.push_str("    outer loop\n");
            for v in [v0, v1, v2] {
                out.push_str(&format!("      vertex {:e} {:e} {:e}\n", v[0], v[1], v[2]));
            }
            out.push_str("    endloop\n");
            out.push_str("  endfacet\n");
        }
    }
    out.push_str(&format!("endsolid {name}\n"));
    out
}

fn triangle_vertices(mesh: &TriangleMesh, tri: &[u32]) -> [[f64; 3]; 3] {
    let at = |i: u32| {
        let base = i as usize * 3;
        [
            mesh.positions[base],
            mesh.positions[base + 1],
            mesh.positions[base + 2],
        ]
    };
    [at(tri[0]), at(tri[1]), at(tri[2])]
}

fn face_normal(v0: [f64; 3], v1: [f64; 3], v2: [f64; 3]) -> [f64; 3] {
    let e1 = [v1[0] - v0[0], v1[1] - v0[1], v1[2] - v0[2]];
    let e2 = [v2[0] - v0[0], v2[1] - v0[1], v2[2] - v0[2]];
    let n = [
        e1[1] * e2[2] - e1[2] * e2[1],
        e1[2] * e2[0] - e1[0] * e2[2],
        e1[0] * e2[1] - e1[1] * e2[0],
    ];
    let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
    if len > 1e-12 {
        [n[0] / len, n[1] / len, n[2] / len]
    } else {
        [0.0, 0.0, 0.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad_mesh() -> TriangleMesh {
        TriangleMesh {
            positions: vec![
                0.0, 0.0, 0.0, //
                1.0, 0.0, 0.0, //
                1.0, 1.0, 0.0, //
                0.0, 1.0, 0.0,
            ],
            normals: vec![0.0; 12],
            indices: vec![0, 1, 2, 0, 2, 3],
            face_map: Vec::new(),
        }
    }

    #[test]
    fn binary_stl_layout_is_exact() {
        let mesh = quad_mesh();
        let buf = to_binary_stl(&[&mesh], "unit");
        assert_eq!(buf.len(), 80 + 4 + 2 * 50);
        let count = u32::from_le_bytes([buf[80], buf[81], buf[82], buf[83]]);
        assert_eq!(count, 2);
    }

    #[test]
    fn ascii_stl_has_matching_facets() {
        let mesh = quad_mesh();
        let text = to_ascii_stl(&[&mesh], "unit");
        assert!(text.starts_with("solid unit"));
        assert!(text.trim_end().ends_with("endsolid unit"));
        assert_eq!(text.matches("facet normal").count(), 2);
        assert_eq!(text.matches("vertex").count(), 6);
    }
}
