//! Tessellation of analytic solids into triangle meshes.
//!
//! Planar caps (with hole loops) go through earcut; walls are quad
//! splits; cylinders and revolved faces are sampled at a fixed angular
//! resolution. Triangle counts and vertex positions are exact functions
//! of the face data, so meshes are reproducible bit-for-bit.

use anvil_types::{add, cross, dot, normalized, scale, sub, FaceSpan, TriangleMesh, Vec3};

use crate::analytic::{polygonize, CIRCLE_SEGMENTS};
use crate::types::{FaceData, FaceGeom, KernelError, SolidModel};

/// Angular steps for a full revolution of a revolved face.
const REVOLVE_SEGMENTS: f64 = 48.0;

pub fn tessellate_model(model: &SolidModel) -> Result<TriangleMesh, KernelError> {
    let mut out = MeshBuilder::default();
    for (index, face) in model.faces.iter().enumerate() {
        out.begin_face();
        emit_face(face, &mut out)?;
        out.end_face(index as u32);
    }
    Ok(out.finish())
}

#[derive(Default)]
struct MeshBuilder {
    positions: Vec<f64>,
    normals: Vec<f64>,
    indices: Vec<u32>,
    face_map: Vec<FaceSpan>,
    face_start: u32,
}

impl MeshBuilder {
    fn begin_face(&mut self) {
        self.face_start = self.indices.len() as u32;
    }

    fn end_face(&mut self, face_index: u32) {
        let end = self.indices.len() as u32;
        if end > self.face_start {
            self.face_map.push(FaceSpan {
                face_index,
                start: self.face_start,
                end,
            });
        }
    }

    fn push_vertex(&mut self, p: Vec3, n: Vec3) -> u32 {
        let index = (self.positions.len() / 3) as u32;
        self.positions.extend_from_slice(&p);
        self.normals.extend_from_slice(&n);
        index
    }

    fn push_triangle(&mut self, a: u32, b: u32, c: u32) {
        self.indices.extend_from_slice(&[a, b, c]);
    }

    fn finish(self) -> TriangleMesh {
        TriangleMesh {
            positions: self.positions,
            normals: self.normals,
            indices: self.indices,
            face_map: self.face_map,
        }
    }
}

fn emit_face(face: &FaceData, out: &mut MeshBuilder) -> Result<(), KernelError> {
    match &face.geom {
        FaceGeom::Cap {
            basis,
            outer,
            holes,
            outward,
        } => {
            let outer_pts = polygonize(outer);
            let hole_pts: Vec<Vec<[f64; 2]>> = holes.iter().map(polygonize).collect();

            let mut flat: Vec<f64> = Vec::new();
            let mut hole_starts: Vec<usize> = Vec::new();
            for p in &outer_pts {
                flat.push(p[0]);
                flat.push(p[1]);
            }
            for hole in &hole_pts {
                hole_starts.push(flat.len() / 2);
                for p in hole {
                    flat.push(p[0]);
                    flat.push(p[1]);
                }
            }

            let triangles = earcutr::earcut(&flat, &hole_starts, 2).map_err(|e| {
                KernelError::TessellationFailed {
                    reason: format!("earcut: {e:?}"),
                }
            })?;

            let flip = dot(*outward, basis.normal) < 0.0;
            let base = out.positions.len() as u32 / 3;
            for uv in flat.chunks(2) {
                let world = basis.to_world(uv[0], uv[1]);
                out.push_vertex(world, *outward);
            }
            for tri in triangles.chunks(3) {
                if tri.len() < 3 {
                    continue;
                }
                let (a, b, c) = (
                    base + tri[0] as u32,
                    base + tri[1] as u32,
                    base + tri[2] as u32,
                );
                if flip {
                    out.push_triangle(a, c, b);
                } else {
                    out.push_triangle(a, b, c);
                }
            }
            Ok(())
        }
        FaceGeom::Wall { corners, outward } => {
            let i0 = out.push_vertex(corners[0], *outward);
            let i1 = out.push_vertex(corners[1], *outward);
            let i2 = out.push_vertex(corners[2], *outward);
            let i3 = out.push_vertex(corners[3], *outward);
            // Keep the winding facing outward regardless of sweep sign.
            let n = cross(
                sub(corners[1], corners[0]),
                sub(corners[2], corners[0]),
            );
            if dot(n, *outward) >= 0.0 {
                out.push_triangle(i0, i1, i2);
                out.push_triangle(i0, i2, i3);
            } else {
                out.push_triangle(i0, i2, i1);
                out.push_triangle(i0, i3, i2);
            }
            Ok(())
        }
        FaceGeom::Cylinder {
            base_center,
            axis,
            radius,
            height,
            outward,
        } => {
            let axis_n = normalized(*axis).unwrap_or([0.0, 0.0, 1.0]);
            let (u, v) = crate::types::tangent_frame(axis_n);
            let top_offset = scale(axis_n, *height);
            let segments = CIRCLE_SEGMENTS as u32;
            let base = out.positions.len() as u32 / 3;
            for s in 0..segments {
                let angle = std::f64::consts::TAU * (s as f64) / (segments as f64);
                let radial = add(scale(u, angle.cos()), scale(v, angle.sin()));
                let normal = if *outward {
                    radial
                } else {
                    scale(radial, -1.0)
                };
                let p_base = add(*base_center, scale(radial, *radius));
                out.push_vertex(p_base, normal);
                out.push_vertex(add(p_base, top_offset), normal);
            }
            for s in 0..segments {
                let next = (s + 1) % segments;
                let (b0, t0) = (base + s * 2, base + s * 2 + 1);
                let (b1, t1) = (base + next * 2, base + next * 2 + 1);
                if *outward {
                    out.push_triangle(b0, b1, t1);
                    out.push_triangle(b0, t1, t0);
                } else {
                    out.push_triangle(b0, t1, b1);
                    out.push_triangle(b0, t0, t1);
                }
            }
            Ok(())
        }
        FaceGeom::Revolved {
            axis_origin,
            axis_dir,
            radial,
            p0,
            p1,
            angle,
        } => {
            let steps = ((angle.abs() / std::f64::consts::TAU) * REVOLVE_SEGMENTS)
                .ceil()
                .max(4.0) as u32;
            // Outward normal of the profile segment in (r, z), assuming
            // a counter-clockwise profile loop.
            let dr = p1[0] - p0[0];
            let dz = p1[1] - p0[1];
            let len = (dr * dr + dz * dz).sqrt();
            if len < 1e-12 {
                return Ok(());
            }
            let (nr, nz) = (dz / len, -dr / len);

            let base = out.positions.len() as u32 / 3;
            for s in 0..=steps {
                let theta = angle * (s as f64) / (steps as f64);
                let dir = rotate(*radial, *axis_dir, theta);
                let at = |rz: [f64; 2]| {
                    add(
                        *axis_origin,
                        add(scale(dir, rz[0]), scale(*axis_dir, rz[1])),
                    )
                };
                let normal = add(scale(dir, nr), scale(*axis_dir, nz));
                out.push_vertex(at(*p0), normal);
                out.push_vertex(at(*p1), normal);
            }
            for s in 0..steps {
                let (a0, a1) = (base + s * 2, base + s * 2 + 1);
                let (b0, b1) = (base + (s + 1) * 2, base + (s + 1) * 2 + 1);
                if *angle >= 0.0 {
                    out.push_triangle(a0, b0, b1);
                    out.push_triangle(a0, b1, a1);
                } else {
                    out.push_triangle(a0, b1, b0);
                    out.push_triangle(a0, a1, b1);
                }
            }
            Ok(())
        }
    }
}

fn rotate(v: Vec3, axis: Vec3, angle: f64) -> Vec3 {
    let (sin, cos) = angle.sin_cos();
    let kxv = cross(axis, v);
    let kdv = dot(axis, v);
    [
        v[0] * cos + kxv[0] * sin + axis[0] * kdv * (1.0 - cos),
        v[1] * cos + kxv[1] * sin + axis[1] * kdv * (1.0 - cos),
        v[2] * cos + kxv[2] * sin + axis[2] * kdv * (1.0 - cos),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytic::AnalyticKernel;
    use crate::traits::{ExtrudeSpec, Kernel};
    use anvil_types::{PlaneBasis, Profile, ProfileRing};

    #[test]
    fn box_mesh_covers_all_faces() {
        let mut kernel = AnalyticKernel::new();
        let profile = Profile {
            plane: PlaneBasis::world_xy(),
            rings: vec![ProfileRing::Polygon {
                points: vec![[0.0, 0.0], [2.0, 0.0], [2.0, 1.0], [0.0, 1.0]],
                entities: Vec::new(),
            }],
        };
        let handle = kernel.extrude(&profile, &ExtrudeSpec { distance: 1.0 }).unwrap();
        let mesh = kernel.tessellate(&handle).unwrap();

        assert_eq!(mesh.face_map.len(), 6);
        // Caps are 2 triangles each, walls 2 each: 12 triangles total.
        assert_eq!(mesh.triangle_count(), 12);
        // Spans tile the index buffer exactly.
        let mut cursor = 0;
        for span in &mesh.face_map {
            assert_eq!(span.start, cursor);
            cursor = span.end;
        }
        assert_eq!(cursor as usize, mesh.indices.len());
        assert_eq!(mesh.positions.len(), mesh.normals.len());
    }

    #[test]
    fn holed_cap_triangulates_around_the_hole() {
        let mut kernel = AnalyticKernel::new();
        let base = kernel
            .extrude(
                &Profile {
                    plane: PlaneBasis::world_xy(),
                    rings: vec![ProfileRing::Polygon {
                        points: vec![[0.0, 0.0], [10.0, 0.0], [10.0, 5.0], [0.0, 5.0]],
                        entities: Vec::new(),
                    }],
                },
                &ExtrudeSpec { distance: 3.0 },
            )
            .unwrap();
        let tool = kernel
            .extrude(
                &Profile {
                    plane: PlaneBasis::world_xy(),
                    rings: vec![ProfileRing::Circle {
                        center: [5.0, 2.5],
                        radius: 1.0,
                        entity: "k1".into(),
                    }],
                },
                &ExtrudeSpec { distance: 1000.0 },
            )
            .unwrap();
        let cut = kernel.subtract(&base, &tool).unwrap();
        let mesh = kernel.tessellate(&cut).unwrap();

        assert_eq!(mesh.face_map.len(), 7);
        // The holed caps need far more than two triangles now.
        let cap_span = &mesh.face_map[0];
        assert!((cap_span.end - cap_span.start) / 3 > 8);
        // All indices valid.
        let vcount = mesh.vertex_count() as u32;
        assert!(mesh.indices.iter().all(|&i| i < vcount));
    }
}
