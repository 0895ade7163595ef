use anvil_types::{PlaneBasis, Profile, TriangleMesh, Vec3};

use crate::types::{EdgeKind, KernelError, SolidHandle, SurfaceKind};

/// Sweep distance for an extrusion, signed along the profile plane
/// normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtrudeSpec {
    pub distance: f64,
}

/// Revolution around a world-space axis. `angle` in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RevolveSpec {
    pub axis_origin: Vec3,
    pub axis_dir: Vec3,
    pub angle: f64,
}

/// Shape construction operations the rebuild pipeline consumes. The
/// rebuilder never touches B-Rep structures directly — any kernel that
/// honors this contract can sit behind it.
pub trait Kernel {
    /// Sweep a closed profile along its plane normal.
    fn extrude(&mut self, profile: &Profile, spec: &ExtrudeSpec)
        -> Result<SolidHandle, KernelError>;

    /// Sweep a closed profile around an axis.
    fn revolve(&mut self, profile: &Profile, spec: &RevolveSpec)
        -> Result<SolidHandle, KernelError>;

    fn union(&mut self, a: &SolidHandle, b: &SolidHandle) -> Result<SolidHandle, KernelError>;

    /// a minus b.
    fn subtract(&mut self, a: &SolidHandle, b: &SolidHandle) -> Result<SolidHandle, KernelError>;

    fn intersect(&mut self, a: &SolidHandle, b: &SolidHandle) -> Result<SolidHandle, KernelError>;

    fn tessellate(&mut self, solid: &SolidHandle) -> Result<TriangleMesh, KernelError>;

    /// STEP AP203 text for a solid. Backends without STEP support
    /// return `NotSupported`.
    fn export_step(&self, solid: &SolidHandle, name: &str) -> Result<String, KernelError>;
}

/// Read-only topology queries: face classification for sketch planes,
/// edge/vertex geometry for external attachments, bounds for merge
/// decisions.
pub trait KernelQuery {
    fn face_count(&self, solid: &SolidHandle) -> usize;

    fn face_surface(&self, solid: &SolidHandle, face: u32) -> Option<SurfaceKind>;

    /// Sketchable frame of a planar face; None for curved faces.
    fn face_plane(&self, solid: &SolidHandle, face: u32) -> Option<PlaneBasis>;

    /// Whether the face's stored orientation opposes its geometric
    /// normal. Callers flip the sketch basis for reversed faces.
    fn face_is_reversed(&self, solid: &SolidHandle, face: u32) -> bool;

    fn face_centroid(&self, solid: &SolidHandle, face: u32) -> Option<Vec3>;

    fn face_normal(&self, solid: &SolidHandle, face: u32) -> Option<Vec3>;

    fn face_area(&self, solid: &SolidHandle, face: u32) -> Option<f64>;

    fn edge_count(&self, solid: &SolidHandle) -> usize;

    fn edge_geometry(&self, solid: &SolidHandle, edge: u32) -> Option<EdgeKind>;

    fn vertex_count(&self, solid: &SolidHandle) -> usize;

    fn vertex_position(&self, solid: &SolidHandle, vertex: u32) -> Option<Vec3>;

    fn bounding_box(&self, solid: &SolidHandle) -> Option<(Vec3, Vec3)>;

    /// Shared-volume test used by the auto merge policy.
    fn overlaps(&self, a: &SolidHandle, b: &SolidHandle) -> bool;
}

/// Both kernel halves on one object, with an explicit read-only view to
/// satisfy the borrow checker when an operation needs `&mut` for
/// construction and `&` for queries.
pub trait KernelSession: Kernel + KernelQuery {
    fn queries(&self) -> &dyn KernelQuery;
}

impl<T: Kernel + KernelQuery> KernelSession for T {
    fn queries(&self) -> &dyn KernelQuery {
        self
    }
}
