//! AnalyticKernel — deterministic profile-driven topology.
//!
//! The default rebuild backend. Solids are built directly from sweep
//! parameters, so face structure is an exact function of the inputs:
//! a swept polygon yields two caps plus one wall per edge, a swept
//! circle yields two caps plus one cylindrical face, and a piercing
//! cut adds hole loops to the pierced caps plus the tool's lateral
//! faces. No floating-point CSG is involved anywhere, which is what
//! makes rebuild outputs bit-identical across replicas.
//!
//! Booleans outside the piercing-cut case fall back to conservative
//! face merges; the truck backend exists for true CSG.

use std::collections::BTreeMap;

use anvil_types::{
    add, cross, dot, normalized, scale, sub, PlaneBasis, Profile, ProfileRing, TriangleMesh, Vec3,
};

use crate::mesh;
use crate::traits::{ExtrudeSpec, Kernel, KernelQuery, RevolveSpec};
use crate::types::{
    bbox_overlap, EdgeKind, FaceData, FaceGeom, KernelError, SolidHandle, SolidModel, SurfaceKind,
    SweepInfo,
};

/// Segments used when a circle must be approximated by a polygon.
pub(crate) const CIRCLE_SEGMENTS: usize = 32;
const EPS: f64 = 1e-9;

pub struct AnalyticKernel {
    next_handle: u64,
    solids: BTreeMap<u64, SolidModel>,
}

impl AnalyticKernel {
    pub fn new() -> Self {
        Self {
            next_handle: 1,
            solids: BTreeMap::new(),
        }
    }

    fn store(&mut self, model: SolidModel) -> SolidHandle {
        let handle = SolidHandle(self.next_handle);
        self.next_handle += 1;
        self.solids.insert(handle.id(), model);
        handle
    }

    fn get(&self, handle: &SolidHandle) -> Result<&SolidModel, KernelError> {
        self.solids.get(&handle.id()).ok_or(KernelError::UnknownSolid)
    }

    /// Direct access for tests and the STL oracle.
    pub fn model(&self, handle: &SolidHandle) -> Option<&SolidModel> {
        self.solids.get(&handle.id())
    }
}

impl Default for AnalyticKernel {
    fn default() -> Self {
        Self::new()
    }
}

impl Kernel for AnalyticKernel {
    fn extrude(
        &mut self,
        profile: &Profile,
        spec: &ExtrudeSpec,
    ) -> Result<SolidHandle, KernelError> {
        let model = build_prism(profile, spec.distance)?;
        Ok(self.store(model))
    }

    fn revolve(
        &mut self,
        profile: &Profile,
        spec: &RevolveSpec,
    ) -> Result<SolidHandle, KernelError> {
        let model = build_revolved(profile, spec)?;
        Ok(self.store(model))
    }

    fn union(&mut self, a: &SolidHandle, b: &SolidHandle) -> Result<SolidHandle, KernelError> {
        let ma = self.get(a)?.clone();
        let mb = self.get(b)?.clone();
        Ok(self.store(merge_models(ma, mb)))
    }

    fn subtract(&mut self, a: &SolidHandle, b: &SolidHandle) -> Result<SolidHandle, KernelError> {
        let target = self.get(a)?.clone();
        let tool = self.get(b)?.clone();

        if !bbox_overlap(&target.bbox, &tool.bbox, EPS) {
            // The tool misses the target entirely.
            return Ok(self.store(target));
        }
        if let Some(cut) = try_piercing_cut(&target, &tool) {
            return Ok(self.store(cut));
        }
        // Conservative fallback: keep the target's skin and add the
        // tool's faces turned inward as the pocket boundary.
        let mut pocket = tool;
        for face in &mut pocket.faces {
            face.reversed = !face.reversed;
            if let Some(n) = face.normal.as_mut() {
                *n = scale(*n, -1.0);
            }
        }
        let mut result = merge_models(target.clone(), pocket);
        result.bbox = target.bbox;
        Ok(self.store(result))
    }

    fn intersect(&mut self, a: &SolidHandle, b: &SolidHandle) -> Result<SolidHandle, KernelError> {
        let ma = self.get(a)?.clone();
        let mb = self.get(b)?.clone();
        if !bbox_overlap(&ma.bbox, &mb.bbox, EPS) {
            return Err(KernelError::BooleanFailed {
                reason: "intersection is empty".to_string(),
            });
        }
        if bbox_contains(&ma.bbox, &mb.bbox) {
            return Ok(self.store(mb));
        }
        if bbox_contains(&mb.bbox, &ma.bbox) {
            return Ok(self.store(ma));
        }
        // Approximate by the shared axis-aligned extent.
        let lo = [
            ma.bbox.0[0].max(mb.bbox.0[0]),
            ma.bbox.0[1].max(mb.bbox.0[1]),
            ma.bbox.0[2].max(mb.bbox.0[2]),
        ];
        let hi = [
            ma.bbox.1[0].min(mb.bbox.1[0]),
            ma.bbox.1[1].min(mb.bbox.1[1]),
            ma.bbox.1[2].min(mb.bbox.1[2]),
        ];
        let model = make_box_model(lo, hi)?;
        Ok(self.store(model))
    }

    fn tessellate(&mut self, solid: &SolidHandle) -> Result<TriangleMesh, KernelError> {
        let model = self.get(solid)?;
        mesh::tessellate_model(model)
    }

    fn export_step(&self, _solid: &SolidHandle, _name: &str) -> Result<String, KernelError> {
        Err(KernelError::NotSupported {
            operation: "export_step (analytic backend)".to_string(),
        })
    }
}

impl KernelQuery for AnalyticKernel {
    fn face_count(&self, solid: &SolidHandle) -> usize {
        self.model(solid).map(|m| m.faces.len()).unwrap_or(0)
    }

    fn face_surface(&self, solid: &SolidHandle, face: u32) -> Option<SurfaceKind> {
        self.model(solid)?.faces.get(face as usize).map(|f| f.surface)
    }

    fn face_plane(&self, solid: &SolidHandle, face: u32) -> Option<PlaneBasis> {
        let data = self.model(solid)?.faces.get(face as usize)?;
        match &data.geom {
            FaceGeom::Cap { basis, outward, .. } => {
                // The sketchable frame faces outward.
                if dot(*outward, basis.normal) >= 0.0 {
                    Some(*basis)
                } else {
                    Some(basis.flipped())
                }
            }
            FaceGeom::Wall { corners, outward } => {
                let x_dir = normalized(sub(corners[1], corners[0]))?;
                Some(PlaneBasis::new(corners[0], *outward, x_dir))
            }
            _ => None,
        }
    }

    fn face_is_reversed(&self, solid: &SolidHandle, face: u32) -> bool {
        self.model(solid)
            .and_then(|m| m.faces.get(face as usize))
            .map(|f| f.reversed)
            .unwrap_or(false)
    }

    fn face_centroid(&self, solid: &SolidHandle, face: u32) -> Option<Vec3> {
        self.model(solid)?.faces.get(face as usize).map(|f| f.centroid)
    }

    fn face_normal(&self, solid: &SolidHandle, face: u32) -> Option<Vec3> {
        self.model(solid)?.faces.get(face as usize).and_then(|f| f.normal)
    }

    fn face_area(&self, solid: &SolidHandle, face: u32) -> Option<f64> {
        self.model(solid)?.faces.get(face as usize).map(|f| f.area)
    }

    fn edge_count(&self, solid: &SolidHandle) -> usize {
        self.model(solid).map(|m| m.edges.len()).unwrap_or(0)
    }

    fn edge_geometry(&self, solid: &SolidHandle, edge: u32) -> Option<EdgeKind> {
        self.model(solid)?.edges.get(edge as usize).cloned()
    }

    fn vertex_count(&self, solid: &SolidHandle) -> usize {
        self.model(solid).map(|m| m.vertices.len()).unwrap_or(0)
    }

    fn vertex_position(&self, solid: &SolidHandle, vertex: u32) -> Option<Vec3> {
        self.model(solid)?.vertices.get(vertex as usize).copied()
    }

    fn bounding_box(&self, solid: &SolidHandle) -> Option<(Vec3, Vec3)> {
        self.model(solid).map(|m| m.bbox)
    }

    fn overlaps(&self, a: &SolidHandle, b: &SolidHandle) -> bool {
        match (self.model(a), self.model(b)) {
            (Some(ma), Some(mb)) => bbox_overlap(&ma.bbox, &mb.bbox, EPS),
            _ => false,
        }
    }
}

// ── Prism construction ──────────────────────────────────────────────────

pub(crate) fn build_prism(profile: &Profile, distance: f64) -> Result<SolidModel, KernelError> {
    if distance.abs() < EPS {
        return Err(KernelError::InvalidProfile {
            reason: "zero extrusion distance".to_string(),
        });
    }
    let outer = profile.outer().ok_or_else(|| KernelError::InvalidProfile {
        reason: "profile has no rings".to_string(),
    })?;
    if outer.signed_area().abs() < EPS {
        return Err(KernelError::InvalidProfile {
            reason: "profile region is degenerate".to_string(),
        });
    }
    if let ProfileRing::Polygon { points, .. } = outer {
        if !polygon_is_simple(points) {
            return Err(KernelError::SelfIntersecting);
        }
    }

    let basis = profile.plane;
    let n = normalized(basis.normal).ok_or_else(|| KernelError::InvalidProfile {
        reason: "profile plane normal is zero".to_string(),
    })?;
    let outer = oriented_ccw(outer.clone());
    let holes: Vec<ProfileRing> = profile.holes().iter().map(|r| oriented_ccw(r.clone())).collect();

    let offset = scale(n, distance);
    let top_basis = PlaneBasis::new(add(basis.origin, offset), basis.normal, basis.x_dir);
    let sign = distance.signum();

    let cap_area = outer.signed_area().abs()
        - holes.iter().map(|h| h.signed_area().abs()).sum::<f64>();

    let mut faces: Vec<FaceData> = Vec::new();
    let mut edges: Vec<EdgeKind> = Vec::new();
    let mut vertices: Vec<Vec3> = Vec::new();

    // Caps first: [0] bottom (against the sweep), [1] top.
    let bottom_normal = scale(n, -sign);
    let top_normal = scale(n, sign);
    faces.push(cap_face(&basis, &outer, &holes, bottom_normal, cap_area));
    faces.push(cap_face(&top_basis, &outer, &holes, top_normal, cap_area));

    // Lateral faces: outer ring, then each hole ring.
    lateral_faces(
        &basis, &outer, n, distance, false, &mut faces, &mut edges, &mut vertices,
    );
    for hole in &holes {
        lateral_faces(
            &basis, hole, n, distance, true, &mut faces, &mut edges, &mut vertices,
        );
    }

    let bbox = model_bbox(&vertices, &faces);
    Ok(SolidModel {
        faces,
        edges,
        vertices,
        bbox,
        sweep: Some(SweepInfo {
            basis,
            rings: std::iter::once(outer).chain(holes).collect(),
            distance,
        }),
    })
}

fn cap_face(
    basis: &PlaneBasis,
    outer: &ProfileRing,
    holes: &[ProfileRing],
    outward: Vec3,
    area: f64,
) -> FaceData {
    let centroid = ring_centroid_world(outer, basis);
    FaceData {
        surface: SurfaceKind::Plane,
        geom: FaceGeom::Cap {
            basis: *basis,
            outer: outer.clone(),
            holes: holes.to_vec(),
            outward,
        },
        area,
        centroid,
        normal: Some(outward),
        reversed: false,
    }
}

/// Walls (polygon rings) or a cylindrical face (circle rings), plus the
/// ring's edge and vertex records. Hole rings face inward.
#[allow(clippy::too_many_arguments)]
fn lateral_faces(
    basis: &PlaneBasis,
    ring: &ProfileRing,
    n: Vec3,
    distance: f64,
    is_hole: bool,
    faces: &mut Vec<FaceData>,
    edges: &mut Vec<EdgeKind>,
    vertices: &mut Vec<Vec3>,
) {
    let offset = scale(n, distance);
    match ring {
        ProfileRing::Polygon { points, .. } => {
            let k = points.len();
            let base: Vec<Vec3> = points.iter().map(|p| basis.to_world(p[0], p[1])).collect();
            let top: Vec<Vec3> = base.iter().map(|p| add(*p, offset)).collect();

            vertices.extend(base.iter().copied());
            vertices.extend(top.iter().copied());

            for i in 0..k {
                let j = (i + 1) % k;
                edges.push(EdgeKind::Segment {
                    start: base[i],
                    end: base[j],
                });
            }
            for i in 0..k {
                let j = (i + 1) % k;
                edges.push(EdgeKind::Segment {
                    start: top[i],
                    end: top[j],
                });
            }
            for i in 0..k {
                edges.push(EdgeKind::Segment {
                    start: base[i],
                    end: top[i],
                });
            }

            for i in 0..k {
                let j = (i + 1) % k;
                let dir = sub(base[j], base[i]);
                let mut outward = normalized(cross(dir, n)).unwrap_or([0.0, 0.0, 1.0]);
                if is_hole {
                    outward = scale(outward, -1.0);
                }
                let corners = [base[i], base[j], top[j], top[i]];
                let area = anvil_types::norm(dir) * distance.abs();
                let centroid = [
                    (base[i][0] + base[j][0] + top[j][0] + top[i][0]) / 4.0,
                    (base[i][1] + base[j][1] + top[j][1] + top[i][1]) / 4.0,
                    (base[i][2] + base[j][2] + top[j][2] + top[i][2]) / 4.0,
                ];
                faces.push(FaceData {
                    surface: SurfaceKind::Plane,
                    geom: FaceGeom::Wall { corners, outward },
                    area,
                    centroid,
                    normal: Some(outward),
                    reversed: false,
                });
            }
        }
        ProfileRing::Circle { center, radius, .. } => {
            let c_base = basis.to_world(center[0], center[1]);
            let c_top = add(c_base, offset);
            edges.push(EdgeKind::Circle {
                center: c_base,
                normal: n,
                radius: *radius,
            });
            edges.push(EdgeKind::Circle {
                center: c_top,
                normal: n,
                radius: *radius,
            });
            let (base_center, height) = if distance >= 0.0 {
                (c_base, distance)
            } else {
                (c_top, -distance)
            };
            faces.push(FaceData {
                surface: SurfaceKind::Cylinder,
                geom: FaceGeom::Cylinder {
                    base_center,
                    axis: n,
                    radius: *radius,
                    height,
                    outward: !is_hole,
                },
                area: std::f64::consts::TAU * radius * distance.abs(),
                centroid: scale(add(c_base, c_top), 0.5),
                normal: None,
                reversed: false,
            });
        }
    }
}

// ── Revolved construction ───────────────────────────────────────────────

fn build_revolved(profile: &Profile, spec: &RevolveSpec) -> Result<SolidModel, KernelError> {
    let axis = normalized(spec.axis_dir).ok_or_else(|| KernelError::InvalidProfile {
        reason: "revolve axis has zero length".to_string(),
    })?;
    if spec.angle.abs() < EPS {
        return Err(KernelError::InvalidProfile {
            reason: "zero revolve angle".to_string(),
        });
    }
    if profile.rings.is_empty() {
        return Err(KernelError::InvalidProfile {
            reason: "profile has no rings".to_string(),
        });
    }

    // Work on polygonized rings in (r, z) coordinates about the axis.
    let mut ring_rz: Vec<Vec<[f64; 2]>> = Vec::new();
    let mut radial: Option<Vec3> = None;
    for ring in &profile.rings {
        let points = polygonize(ring);
        let mut rz = Vec::with_capacity(points.len());
        for p in &points {
            let w = profile.plane.to_world(p[0], p[1]);
            let rel = sub(w, spec.axis_origin);
            let z = dot(rel, axis);
            let r_vec = sub(rel, scale(axis, z));
            let r_len = anvil_types::norm(r_vec);
            if r_len > EPS && radial.is_none() {
                radial = normalized(r_vec);
            }
            let r = match radial {
                Some(dir) => dot(r_vec, dir),
                None => 0.0,
            };
            if r < -EPS {
                return Err(KernelError::SelfIntersecting);
            }
            rz.push([r.max(0.0), z]);
        }
        ring_rz.push(ccw_points(rz));
    }
    let radial = radial.ok_or_else(|| KernelError::InvalidProfile {
        reason: "profile lies entirely on the revolve axis".to_string(),
    })?;

    let full = spec.angle.abs() >= std::f64::consts::TAU - 1e-6;
    let mut faces: Vec<FaceData> = Vec::new();
    let mut edges: Vec<EdgeKind> = Vec::new();
    let mut vertices: Vec<Vec3> = Vec::new();

    let to_world = |rz: [f64; 2]| -> Vec3 {
        add(
            spec.axis_origin,
            add(scale(radial, rz[0]), scale(axis, rz[1])),
        )
    };

    for rz in &ring_rz {
        let k = rz.len();
        for i in 0..k {
            let j = (i + 1) % k;
            let p0 = rz[i];
            let p1 = rz[j];
            if p0[0] < EPS && p1[0] < EPS {
                // Segment on the axis sweeps to nothing.
                continue;
            }
            let avg_r = (p0[0] + p1[0]) / 2.0;
            let length = ((p1[0] - p0[0]).powi(2) + (p1[1] - p0[1]).powi(2)).sqrt();
            let mid = to_world([avg_r, (p0[1] + p1[1]) / 2.0]);
            faces.push(FaceData {
                surface: SurfaceKind::Revolved,
                geom: FaceGeom::Revolved {
                    axis_origin: spec.axis_origin,
                    axis_dir: axis,
                    radial,
                    p0,
                    p1,
                    angle: spec.angle,
                },
                area: length * spec.angle.abs() * avg_r,
                centroid: mid,
                normal: None,
                reversed: false,
            });
        }

        // Profile edges and vertices at the sweep start.
        for i in 0..k {
            let j = (i + 1) % k;
            edges.push(EdgeKind::Segment {
                start: to_world(rz[i]),
                end: to_world(rz[j]),
            });
        }
        vertices.extend(rz.iter().map(|p| to_world(*p)));

        if full {
            for p in rz {
                if p[0] > EPS {
                    edges.push(EdgeKind::Circle {
                        center: add(spec.axis_origin, scale(axis, p[1])),
                        normal: axis,
                        radius: p[0],
                    });
                }
            }
        }
    }

    if !full {
        // Start and end caps in the (r, z) plane.
        let tangential = cross(radial, axis);
        let outer_rz = ring_rz[0].clone();
        let hole_rz: Vec<ProfileRing> = ring_rz[1..]
            .iter()
            .map(|rz| ProfileRing::Polygon {
                points: rz.clone(),
                entities: Vec::new(),
            })
            .collect();
        let outer_ring = ProfileRing::Polygon {
            points: outer_rz,
            entities: Vec::new(),
        };
        let cap_area = outer_ring.signed_area().abs()
            - hole_rz.iter().map(|h| h.signed_area().abs()).sum::<f64>();

        let start_basis = PlaneBasis::new(spec.axis_origin, tangential, radial);
        faces.push(cap_face(
            &start_basis,
            &outer_ring,
            &hole_rz,
            scale(tangential, -spec.angle.signum()),
            cap_area,
        ));

        let end_radial = rotate_about(radial, axis, spec.angle);
        let end_tangential = cross(end_radial, axis);
        let end_basis = PlaneBasis::new(spec.axis_origin, end_tangential, end_radial);
        faces.push(cap_face(
            &end_basis,
            &outer_ring,
            &hole_rz,
            scale(end_tangential, spec.angle.signum()),
            cap_area,
        ));

        // End-cap vertices and profile edges.
        let to_end = |rz: [f64; 2]| -> Vec3 {
            add(
                spec.axis_origin,
                add(scale(end_radial, rz[0]), scale(axis, rz[1])),
            )
        };
        for rz in &ring_rz {
            let k = rz.len();
            for i in 0..k {
                let j = (i + 1) % k;
                edges.push(EdgeKind::Segment {
                    start: to_end(rz[i]),
                    end: to_end(rz[j]),
                });
            }
            vertices.extend(rz.iter().map(|p| to_end(*p)));
        }
    }

    if faces.is_empty() {
        return Err(KernelError::InvalidProfile {
            reason: "revolution produced no faces".to_string(),
        });
    }

    let bbox = revolved_bbox(&ring_rz, spec.axis_origin, axis, radial, spec.angle);
    Ok(SolidModel {
        faces,
        edges,
        vertices,
        bbox,
        sweep: None,
    })
}

fn rotate_about(v: Vec3, axis: Vec3, angle: f64) -> Vec3 {
    // Rodrigues rotation.
    let (sin, cos) = angle.sin_cos();
    let k = axis;
    let kxv = cross(k, v);
    let kdv = dot(k, v);
    [
        v[0] * cos + kxv[0] * sin + k[0] * kdv * (1.0 - cos),
        v[1] * cos + kxv[1] * sin + k[1] * kdv * (1.0 - cos),
        v[2] * cos + kxv[2] * sin + k[2] * kdv * (1.0 - cos),
    ]
}

fn revolved_bbox(
    rings: &[Vec<[f64; 2]>],
    axis_origin: Vec3,
    axis: Vec3,
    radial: Vec3,
    angle: f64,
) -> (Vec3, Vec3) {
    let mut lo = [f64::MAX; 3];
    let mut hi = [f64::MIN; 3];
    let steps = 24;
    for rz in rings {
        for p in rz {
            for s in 0..=steps {
                let theta = angle * (s as f64) / (steps as f64);
                let dir = rotate_about(radial, axis, theta);
                let w = add(axis_origin, add(scale(dir, p[0]), scale(axis, p[1])));
                for i in 0..3 {
                    lo[i] = lo[i].min(w[i]);
                    hi[i] = hi[i].max(w[i]);
                }
            }
        }
    }
    (lo, hi)
}

// ── Booleans ────────────────────────────────────────────────────────────

fn merge_models(mut a: SolidModel, b: SolidModel) -> SolidModel {
    a.faces.extend(b.faces);
    a.edges.extend(b.edges);
    a.vertices.extend(b.vertices);
    for i in 0..3 {
        a.bbox.0[i] = a.bbox.0[i].min(b.bbox.0[i]);
        a.bbox.1[i] = a.bbox.1[i].max(b.bbox.1[i]);
    }
    a.sweep = None;
    a
}

fn bbox_contains(outer: &(Vec3, Vec3), inner: &(Vec3, Vec3)) -> bool {
    (0..3).all(|i| outer.0[i] <= inner.0[i] + EPS && outer.1[i] >= inner.1[i] - EPS)
}

/// Recognize a tool that fully pierces the target along its own sweep
/// axis and carve real hole topology: hole loops on the pierced caps
/// plus inward lateral faces. Returns None when the shape of the cut
/// does not match, letting the caller fall back.
fn try_piercing_cut(target: &SolidModel, tool: &SolidModel) -> Option<SolidModel> {
    let sweep = tool.sweep.as_ref()?;
    let axis = normalized(sweep.basis.normal)?;
    let origin_t = dot(sweep.basis.origin, axis);
    let (tool_lo, tool_hi) = (
        origin_t + sweep.distance.min(0.0),
        origin_t + sweep.distance.max(0.0),
    );

    let (bb_lo, bb_hi) = target.bbox;
    let mut target_lo = f64::MAX;
    let mut target_hi = f64::MIN;
    for corner in bbox_corners(bb_lo, bb_hi) {
        let t = dot(corner, axis);
        target_lo = target_lo.min(t);
        target_hi = target_hi.max(t);
    }
    if tool_lo > target_lo + EPS || tool_hi < target_hi - EPS {
        return None;
    }

    // Caps of the target perpendicular to the tool axis.
    let cap_indices: Vec<usize> = target
        .faces
        .iter()
        .enumerate()
        .filter(|(_, f)| {
            matches!(f.geom, FaceGeom::Cap { .. })
                && f.normal
                    .map(|n| dot(n, axis).abs() > 1.0 - 1e-6)
                    .unwrap_or(false)
        })
        .map(|(i, _)| i)
        .collect();
    if cap_indices.len() < 2 {
        return None;
    }

    let cross_section = sweep.rings.first()?.clone();

    // Project the cross-section into each cap's frame, and require it
    // to land inside the cap's outer ring.
    let mut projections: Vec<(usize, ProfileRing)> = Vec::new();
    for &i in &cap_indices {
        let (cap_basis, cap_outer) = match &target.faces[i].geom {
            FaceGeom::Cap { basis, outer, .. } => (*basis, outer.clone()),
            _ => return None,
        };
        let projected = project_ring(&cross_section, &sweep.basis, &cap_basis);
        if !ring_inside_ring(&projected, &cap_outer) {
            return None;
        }
        projections.push((i, projected));
    }

    let mut result = target.clone();
    let hole_area = cross_section.signed_area().abs();
    for (i, projected) in projections {
        if let FaceGeom::Cap { holes, .. } = &mut result.faces[i].geom {
            holes.push(projected);
        }
        result.faces[i].area = (result.faces[i].area - hole_area).max(0.0);
    }

    // The tool's lateral boundary, clipped to the target extent and
    // turned inward.
    let span = target_hi - target_lo;
    match &cross_section {
        ProfileRing::Circle { center, radius, .. } => {
            let c_world = sweep.basis.to_world(center[0], center[1]);
            let c_t = dot(c_world, axis);
            let base_center = add(c_world, scale(axis, target_lo - c_t));
            result.faces.push(FaceData {
                surface: SurfaceKind::Cylinder,
                geom: FaceGeom::Cylinder {
                    base_center,
                    axis,
                    radius: *radius,
                    height: span,
                    outward: false,
                },
                area: std::f64::consts::TAU * radius * span,
                centroid: add(base_center, scale(axis, span / 2.0)),
                normal: None,
                reversed: false,
            });
            result.edges.push(EdgeKind::Circle {
                center: base_center,
                normal: axis,
                radius: *radius,
            });
            result.edges.push(EdgeKind::Circle {
                center: add(base_center, scale(axis, span)),
                normal: axis,
                radius: *radius,
            });
        }
        ProfileRing::Polygon { points, .. } => {
            let k = points.len();
            let base: Vec<Vec3> = points
                .iter()
                .map(|p| {
                    let w = sweep.basis.to_world(p[0], p[1]);
                    let t = dot(w, axis);
                    add(w, scale(axis, target_lo - t))
                })
                .collect();
            for i in 0..k {
                let j = (i + 1) % k;
                let top_i = add(base[i], scale(axis, span));
                let top_j = add(base[j], scale(axis, span));
                let dir = sub(base[j], base[i]);
                let outward = normalized(cross(dir, axis))
                    .map(|v| scale(v, -1.0))
                    .unwrap_or([0.0, 0.0, 1.0]);
                result.faces.push(FaceData {
                    surface: SurfaceKind::Plane,
                    geom: FaceGeom::Wall {
                        corners: [base[i], base[j], top_j, top_i],
                        outward,
                    },
                    area: anvil_types::norm(dir) * span,
                    centroid: scale(add(add(base[i], base[j]), add(top_i, top_j)), 0.25),
                    normal: Some(outward),
                    reversed: false,
                });
                result.edges.push(EdgeKind::Segment {
                    start: base[i],
                    end: base[j],
                });
                result.edges.push(EdgeKind::Segment {
                    start: top_i,
                    end: top_j,
                });
            }
        }
    }

    result.sweep = None;
    Some(result)
}

fn bbox_corners(lo: Vec3, hi: Vec3) -> [Vec3; 8] {
    [
        [lo[0], lo[1], lo[2]],
        [hi[0], lo[1], lo[2]],
        [lo[0], hi[1], lo[2]],
        [hi[0], hi[1], lo[2]],
        [lo[0], lo[1], hi[2]],
        [hi[0], lo[1], hi[2]],
        [lo[0], hi[1], hi[2]],
        [hi[0], hi[1], hi[2]],
    ]
}

/// Re-express a ring from one plane frame in another parallel frame.
fn project_ring(ring: &ProfileRing, from: &PlaneBasis, to: &PlaneBasis) -> ProfileRing {
    match ring {
        ProfileRing::Circle {
            center,
            radius,
            entity,
        } => {
            let w = from.to_world(center[0], center[1]);
            let (u, v) = to.to_local(w);
            ProfileRing::Circle {
                center: [u, v],
                radius: *radius,
                entity: entity.clone(),
            }
        }
        ProfileRing::Polygon { points, entities } => ProfileRing::Polygon {
            points: points
                .iter()
                .map(|p| {
                    let w = from.to_world(p[0], p[1]);
                    let (u, v) = to.to_local(w);
                    [u, v]
                })
                .collect(),
            entities: entities.clone(),
        },
    }
}

fn ring_inside_ring(inner: &ProfileRing, outer: &ProfileRing) -> bool {
    let (ilo, ihi) = ring_bbox(inner);
    let (olo, ohi) = ring_bbox(outer);
    ilo[0] >= olo[0] - EPS && ilo[1] >= olo[1] - EPS && ihi[0] <= ohi[0] + EPS && ihi[1] <= ohi[1] + EPS
}

fn ring_bbox(ring: &ProfileRing) -> ([f64; 2], [f64; 2]) {
    match ring {
        ProfileRing::Circle { center, radius, .. } => (
            [center[0] - radius, center[1] - radius],
            [center[0] + radius, center[1] + radius],
        ),
        ProfileRing::Polygon { points, .. } => {
            let mut lo = [f64::MAX; 2];
            let mut hi = [f64::MIN; 2];
            for p in points {
                lo[0] = lo[0].min(p[0]);
                lo[1] = lo[1].min(p[1]);
                hi[0] = hi[0].max(p[0]);
                hi[1] = hi[1].max(p[1]);
            }
            (lo, hi)
        }
    }
}

// ── Shared helpers ──────────────────────────────────────────────────────

pub(crate) fn polygonize(ring: &ProfileRing) -> Vec<[f64; 2]> {
    match ring {
        ProfileRing::Polygon { points, .. } => points.clone(),
        ProfileRing::Circle { center, radius, .. } => sample_circle(*center, *radius),
    }
}

pub(crate) fn sample_circle(center: [f64; 2], radius: f64) -> Vec<[f64; 2]> {
    (0..CIRCLE_SEGMENTS)
        .map(|i| {
            let angle = std::f64::consts::TAU * (i as f64) / (CIRCLE_SEGMENTS as f64);
            [
                center[0] + radius * angle.cos(),
                center[1] + radius * angle.sin(),
            ]
        })
        .collect()
}

pub(crate) fn ccw_points(mut points: Vec<[f64; 2]>) -> Vec<[f64; 2]> {
    let n = points.len();
    let mut area = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        area += points[i][0] * points[j][1] - points[j][0] * points[i][1];
    }
    if area < 0.0 {
        points.reverse();
    }
    points
}

fn oriented_ccw(ring: ProfileRing) -> ProfileRing {
    match ring {
        ProfileRing::Polygon { mut points, entities } => {
            let mut area = 0.0;
            let n = points.len();
            for i in 0..n {
                let j = (i + 1) % n;
                area += points[i][0] * points[j][1] - points[j][0] * points[i][1];
            }
            if area < 0.0 {
                points.reverse();
            }
            ProfileRing::Polygon { points, entities }
        }
        circle => circle,
    }
}

fn polygon_is_simple(points: &[[f64; 2]]) -> bool {
    let n = points.len();
    if n < 3 {
        return false;
    }
    for i in 0..n {
        let a0 = points[i];
        let a1 = points[(i + 1) % n];
        for j in (i + 1)..n {
            // Skip adjacent segments (they share a vertex).
            if j == i || (j + 1) % n == i || (i + 1) % n == j {
                continue;
            }
            let b0 = points[j];
            let b1 = points[(j + 1) % n];
            if segments_cross(a0, a1, b0, b1) {
                return false;
            }
        }
    }
    true
}

fn segments_cross(a0: [f64; 2], a1: [f64; 2], b0: [f64; 2], b1: [f64; 2]) -> bool {
    let d = |p: [f64; 2], q: [f64; 2], r: [f64; 2]| {
        (q[0] - p[0]) * (r[1] - p[1]) - (q[1] - p[1]) * (r[0] - p[0])
    };
    let d1 = d(b0, b1, a0);
    let d2 = d(b0, b1, a1);
    let d3 = d(a0, a1, b0);
    let d4 = d(a0, a1, b1);
    ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
}

fn ring_centroid_world(ring: &ProfileRing, basis: &PlaneBasis) -> Vec3 {
    match ring {
        ProfileRing::Circle { center, .. } => basis.to_world(center[0], center[1]),
        ProfileRing::Polygon { points, .. } => {
            let n = points.len().max(1) as f64;
            let (mut u, mut v) = (0.0, 0.0);
            for p in points {
                u += p[0];
                v += p[1];
            }
            basis.to_world(u / n, v / n)
        }
    }
}

fn model_bbox(vertices: &[Vec3], faces: &[FaceData]) -> (Vec3, Vec3) {
    let mut lo = [f64::MAX; 3];
    let mut hi = [f64::MIN; 3];
    let mut grow = |p: Vec3| {
        for i in 0..3 {
            lo[i] = lo[i].min(p[i]);
            hi[i] = hi[i].max(p[i]);
        }
    };
    for &v in vertices {
        grow(v);
    }
    for face in faces {
        if let FaceGeom::Cylinder {
            base_center,
            axis,
            radius,
            height,
            ..
        } = &face.geom
        {
            let top = add(*base_center, scale(*axis, *height));
            for c in [base_center, &top] {
                grow([c[0] - radius, c[1] - radius, c[2] - radius]);
                grow([c[0] + radius, c[1] + radius, c[2] + radius]);
            }
        }
    }
    if lo[0] > hi[0] {
        ([0.0; 3], [0.0; 3])
    } else {
        (lo, hi)
    }
}

fn make_box_model(lo: Vec3, hi: Vec3) -> Result<SolidModel, KernelError> {
    let profile = Profile {
        plane: PlaneBasis::new([lo[0], lo[1], lo[2]], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0]),
        rings: vec![ProfileRing::Polygon {
            points: vec![
                [0.0, 0.0],
                [hi[0] - lo[0], 0.0],
                [hi[0] - lo[0], hi[1] - lo[1]],
                [0.0, hi[1] - lo[1]],
            ],
            entities: Vec::new(),
        }],
    };
    build_prism(&profile, hi[2] - lo[2])
}
