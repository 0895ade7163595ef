//! TruckKernel — real B-Rep geometry behind the kernel contract,
//! wrapping truck's sweep, shapeops, and stepio APIs.
//!
//! Profile rings become line-segment wires (circles are sampled at the
//! same resolution the analytic backend uses, so the two agree on
//! coarse shape), faces come from `try_attach_plane`, and sweeps from
//! `tsweep`/`rsweep`.

use std::collections::HashMap;

use anvil_types::{PlaneBasis, Profile, TriangleMesh, Vec3};

// Import truck types selectively to avoid shadowing std::result::Result.
use truck_modeling::builder;
use truck_modeling::geometry::Surface;
use truck_modeling::topology::{Edge, Face, Solid, Wire};
use truck_modeling::{InnerSpace, Point3, Rad, Vector3};

use crate::analytic::{ccw_points, polygonize};
use crate::traits::{ExtrudeSpec, Kernel, KernelQuery, RevolveSpec};
use crate::truck_mesh;
use crate::types::{EdgeKind, KernelError, SolidHandle, SurfaceKind};

const BOOLEAN_TOLERANCE: f64 = 0.05;

pub struct TruckKernel {
    next_handle: u64,
    solids: HashMap<u64, Solid>,
}

impl TruckKernel {
    pub fn new() -> Self {
        Self {
            next_handle: 1,
            solids: HashMap::new(),
        }
    }

    fn store(&mut self, solid: Solid) -> SolidHandle {
        let handle = SolidHandle(self.next_handle);
        self.next_handle += 1;
        self.solids.insert(handle.id(), solid);
        handle
    }

    pub(crate) fn get(&self, handle: &SolidHandle) -> Result<&Solid, KernelError> {
        self.solids.get(&handle.id()).ok_or(KernelError::UnknownSolid)
    }

    /// Planar face for a profile: one wire per ring, holes wound
    /// opposite the outer boundary.
    fn profile_face(&self, profile: &Profile) -> Result<Face, KernelError> {
        if profile.rings.is_empty() {
            return Err(KernelError::InvalidProfile {
                reason: "profile has no rings".to_string(),
            });
        }
        let basis = profile.plane;
        let mut wires: Vec<Wire> = Vec::new();
        for (ring_index, ring) in profile.rings.iter().enumerate() {
            let mut pts2 = ccw_points(polygonize(ring));
            if ring_index > 0 {
                pts2.reverse();
            }
            if pts2.len() < 3 {
                return Err(KernelError::InvalidProfile {
                    reason: "ring has fewer than 3 points".to_string(),
                });
            }
            let pts3: Vec<Point3> = pts2
                .iter()
                .map(|p| {
                    let w = basis.to_world(p[0], p[1]);
                    Point3::new(w[0], w[1], w[2])
                })
                .collect();

            let n = pts3.len();
            let vertices: Vec<_> = pts3.iter().map(|&p| builder::vertex(p)).collect();
            let mut wire_edges: Vec<Edge> = Vec::new();
            for i in 0..n {
                let j = (i + 1) % n;
                let edge = Edge::new(
                    &vertices[i],
                    &vertices[j],
                    truck_modeling::geometry::Curve::Line(truck_modeling::geometry::Line(
                        pts3[i], pts3[j],
                    )),
                );
                wire_edges.push(edge);
            }
            wires.push(Wire::from_iter(wire_edges));
        }

        builder::try_attach_plane(&wires).map_err(|e| KernelError::InvalidProfile {
            reason: format!("failed to attach plane: {e}"),
        })
    }
}

impl Default for TruckKernel {
    fn default() -> Self {
        Self::new()
    }
}

impl Kernel for TruckKernel {
    fn extrude(
        &mut self,
        profile: &Profile,
        spec: &ExtrudeSpec,
    ) -> Result<SolidHandle, KernelError> {
        let face = self.profile_face(profile)?;
        let n = profile.plane.normal;
        let dir = Vector3::new(n[0], n[1], n[2]);
        if dir.magnitude() < 1e-12 {
            return Err(KernelError::InvalidProfile {
                reason: "profile plane normal is zero".to_string(),
            });
        }
        let sweep_vec = dir.normalize() * spec.distance;
        let solid = builder::tsweep(&face, sweep_vec);
        Ok(self.store(solid))
    }

    fn revolve(
        &mut self,
        profile: &Profile,
        spec: &RevolveSpec,
    ) -> Result<SolidHandle, KernelError> {
        let face = self.profile_face(profile)?;
        let origin = Point3::new(spec.axis_origin[0], spec.axis_origin[1], spec.axis_origin[2]);
        let axis = Vector3::new(spec.axis_dir[0], spec.axis_dir[1], spec.axis_dir[2]);
        if axis.magnitude() < 1e-12 {
            return Err(KernelError::InvalidProfile {
                reason: "revolve axis has zero length".to_string(),
            });
        }
        let solid = builder::rsweep(&face, origin, axis.normalize(), Rad(spec.angle));
        Ok(self.store(solid))
    }

    fn union(&mut self, a: &SolidHandle, b: &SolidHandle) -> Result<SolidHandle, KernelError> {
        let solid_a = self.get(a)?.clone();
        let solid_b = self.get(b)?.clone();
        let result = truck_shapeops::or(&solid_a, &solid_b, BOOLEAN_TOLERANCE).ok_or_else(|| {
            KernelError::BooleanFailed {
                reason: "truck or() returned None".to_string(),
            }
        })?;
        Ok(self.store(result))
    }

    fn subtract(&mut self, a: &SolidHandle, b: &SolidHandle) -> Result<SolidHandle, KernelError> {
        let solid_a = self.get(a)?.clone();
        let mut solid_b = self.get(b)?.clone();
        // Subtraction = A ∩ ¬B; not() flips in place.
        solid_b.not();
        let result =
            truck_shapeops::and(&solid_a, &solid_b, BOOLEAN_TOLERANCE).ok_or_else(|| {
                KernelError::BooleanFailed {
                    reason: "truck and() returned None for subtraction".to_string(),
                }
            })?;
        Ok(self.store(result))
    }

    fn intersect(&mut self, a: &SolidHandle, b: &SolidHandle) -> Result<SolidHandle, KernelError> {
        let solid_a = self.get(a)?.clone();
        let solid_b = self.get(b)?.clone();
        let result =
            truck_shapeops::and(&solid_a, &solid_b, BOOLEAN_TOLERANCE).ok_or_else(|| {
                KernelError::BooleanFailed {
                    reason: "truck and() returned None".to_string(),
                }
            })?;
        Ok(self.store(result))
    }

    fn tessellate(&mut self, solid: &SolidHandle) -> Result<TriangleMesh, KernelError> {
        let truck_solid = self.get(solid)?;
        truck_mesh::tessellate_solid(truck_solid, 0.01)
    }

    fn export_step(&self, solid: &SolidHandle, name: &str) -> Result<String, KernelError> {
        use truck_stepio::out::{CompleteStepDisplay, StepHeaderDescriptor, StepModels};

        let truck_solid = self.get(solid)?;
        let compressed = truck_solid.compress();
        // StepModels implements FromIterator for &CompressedSolid.
        let models: StepModels<_, _, _> = std::iter::once(&compressed).collect();
        let header = StepHeaderDescriptor {
            file_name: name.to_string(),
            time_stamp: "1970-01-01T00:00:00".to_string(),
            authors: Vec::new(),
            organization: Vec::new(),
            organization_system: "truck".to_string(),
            authorization: String::new(),
        };
        let display = CompleteStepDisplay::new(models, header);
        Ok(display.to_string())
    }
}

fn nth_face(solid: &Solid, index: u32) -> Option<&Face> {
    let mut i = 0;
    for shell in solid.boundaries().iter() {
        for face in shell.face_iter() {
            if i == index {
                return Some(face);
            }
            i += 1;
        }
    }
    None
}

impl KernelQuery for TruckKernel {
    fn face_count(&self, solid: &SolidHandle) -> usize {
        match self.get(solid) {
            Ok(s) => s
                .boundaries()
                .iter()
                .map(|shell| shell.face_iter().count())
                .sum(),
            Err(_) => 0,
        }
    }

    fn face_surface(&self, solid: &SolidHandle, face: u32) -> Option<SurfaceKind> {
        let s = self.get(solid).ok()?;
        let f = nth_face(s, face)?;
        Some(match f.oriented_surface() {
            Surface::Plane(_) => SurfaceKind::Plane,
            Surface::RevolutedCurve(_) => SurfaceKind::Revolved,
            _ => SurfaceKind::Other,
        })
    }

    fn face_plane(&self, solid: &SolidHandle, face: u32) -> Option<PlaneBasis> {
        let s = self.get(solid).ok()?;
        let f = nth_face(s, face)?;
        match f.oriented_surface() {
            Surface::Plane(plane) => {
                let o = plane.origin();
                let n = plane.normal();
                let normal = [n[0], n[1], n[2]];
                let (x_dir, _) = crate::types::tangent_frame(normal);
                Some(PlaneBasis::new([o[0], o[1], o[2]], normal, x_dir))
            }
            _ => None,
        }
    }

    fn face_is_reversed(&self, solid: &SolidHandle, face: u32) -> bool {
        self.get(solid)
            .ok()
            .and_then(|s| nth_face(s, face))
            .map(|f| !f.orientation())
            .unwrap_or(false)
    }

    fn face_centroid(&self, solid: &SolidHandle, face: u32) -> Option<Vec3> {
        let s = self.get(solid).ok()?;
        let f = nth_face(s, face)?;
        let mut acc = [0.0; 3];
        let mut count = 0.0;
        for wire in f.boundaries() {
            for v in wire.vertex_iter() {
                let p = v.point();
                acc[0] += p[0];
                acc[1] += p[1];
                acc[2] += p[2];
                count += 1.0;
            }
        }
        if count > 0.0 {
            Some([acc[0] / count, acc[1] / count, acc[2] / count])
        } else {
            None
        }
    }

    fn face_normal(&self, solid: &SolidHandle, face: u32) -> Option<Vec3> {
        let s = self.get(solid).ok()?;
        let f = nth_face(s, face)?;
        match f.oriented_surface() {
            Surface::Plane(plane) => {
                let n = plane.normal();
                Some([n[0], n[1], n[2]])
            }
            _ => None,
        }
    }

    fn face_area(&self, solid: &SolidHandle, face: u32) -> Option<f64> {
        // Rough polygonal area from the boundary, good enough for
        // role ranking.
        let s = self.get(solid).ok()?;
        let f = nth_face(s, face)?;
        let normal = self.face_normal(solid, face)?;
        let mut pts: Vec<Vec3> = Vec::new();
        for wire in f.boundaries() {
            for v in wire.vertex_iter() {
                let p = v.point();
                pts.push([p[0], p[1], p[2]]);
            }
            break;
        }
        if pts.len() < 3 {
            return None;
        }
        let mut acc = [0.0; 3];
        for i in 0..pts.len() {
            let j = (i + 1) % pts.len();
            let c = anvil_types::cross(pts[i], pts[j]);
            acc = anvil_types::add(acc, c);
        }
        Some(anvil_types::dot(acc, normal).abs() / 2.0)
    }

    fn edge_count(&self, solid: &SolidHandle) -> usize {
        let Ok(s) = self.get(solid) else { return 0 };
        let mut seen = std::collections::HashSet::new();
        let mut count = 0;
        for shell in s.boundaries().iter() {
            for edge in shell.edge_iter() {
                if seen.insert(edge.id()) {
                    count += 1;
                }
            }
        }
        count
    }

    fn edge_geometry(&self, solid: &SolidHandle, edge: u32) -> Option<EdgeKind> {
        let s = self.get(solid).ok()?;
        let mut seen = std::collections::HashSet::new();
        let mut i = 0;
        for shell in s.boundaries().iter() {
            for e in shell.edge_iter() {
                if !seen.insert(e.id()) {
                    continue;
                }
                if i == edge {
                    let front = e.front().point();
                    let back = e.back().point();
                    return Some(EdgeKind::Segment {
                        start: [front[0], front[1], front[2]],
                        end: [back[0], back[1], back[2]],
                    });
                }
                i += 1;
            }
        }
        None
    }

    fn vertex_count(&self, solid: &SolidHandle) -> usize {
        let Ok(s) = self.get(solid) else { return 0 };
        let mut seen = std::collections::HashSet::new();
        let mut count = 0;
        for shell in s.boundaries().iter() {
            for v in shell.vertex_iter() {
                if seen.insert(v.id()) {
                    count += 1;
                }
            }
        }
        count
    }

    fn vertex_position(&self, solid: &SolidHandle, vertex: u32) -> Option<Vec3> {
        let s = self.get(solid).ok()?;
        let mut seen = std::collections::HashSet::new();
        let mut i = 0;
        for shell in s.boundaries().iter() {
            for v in shell.vertex_iter() {
                if !seen.insert(v.id()) {
                    continue;
                }
                if i == vertex {
                    let p = v.point();
                    return Some([p[0], p[1], p[2]]);
                }
                i += 1;
            }
        }
        None
    }

    fn bounding_box(&self, solid: &SolidHandle) -> Option<(Vec3, Vec3)> {
        let s = self.get(solid).ok()?;
        let mut lo = [f64::MAX; 3];
        let mut hi = [f64::MIN; 3];
        for shell in s.boundaries().iter() {
            for v in shell.vertex_iter() {
                let p = v.point();
                for i in 0..3 {
                    lo[i] = lo[i].min(p[i]);
                    hi[i] = hi[i].max(p[i]);
                }
            }
        }
        if lo[0] > hi[0] {
            None
        } else {
            Some((lo, hi))
        }
    }

    fn overlaps(&self, a: &SolidHandle, b: &SolidHandle) -> bool {
        match (self.bounding_box(a), self.bounding_box(b)) {
            (Some(ba), Some(bb)) => crate::types::bbox_overlap(&ba, &bb, 1e-9),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anvil_types::ProfileRing;

    fn rect_profile() -> Profile {
        Profile {
            plane: PlaneBasis::world_xy(),
            rings: vec![ProfileRing::Polygon {
                points: vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]],
                entities: Vec::new(),
            }],
        }
    }

    #[test]
    fn truck_extrude_rect_has_six_faces() {
        let mut kernel = TruckKernel::new();
        let handle = kernel
            .extrude(&rect_profile(), &ExtrudeSpec { distance: 2.0 })
            .unwrap();
        assert_eq!(kernel.face_count(&handle), 6);
        assert_eq!(kernel.edge_count(&handle), 12);
        assert_eq!(kernel.vertex_count(&handle), 8);
    }

    #[test]
    fn truck_tessellation_covers_faces() {
        let mut kernel = TruckKernel::new();
        let handle = kernel
            .extrude(&rect_profile(), &ExtrudeSpec { distance: 2.0 })
            .unwrap();
        let mesh = kernel.tessellate(&handle).unwrap();
        assert!(!mesh.positions.is_empty());
        assert!(!mesh.indices.is_empty());
        assert_eq!(mesh.face_map.len(), 6);
        let covered: u32 = mesh.face_map.iter().map(|s| s.end - s.start).sum();
        assert_eq!(covered as usize, mesh.indices.len());
    }

    #[test]
    fn truck_bounding_box_matches_sweep() {
        let mut kernel = TruckKernel::new();
        let handle = kernel
            .extrude(&rect_profile(), &ExtrudeSpec { distance: 2.0 })
            .unwrap();
        let (lo, hi) = kernel.bounding_box(&handle).unwrap();
        let eps = 1e-9;
        assert!((hi[2] - lo[2] - 2.0).abs() < eps);
        assert!((hi[0] - lo[0] - 1.0).abs() < eps);
    }
}
