use anvil_types::{PlaneBasis, ProfileRing, Vec3};
use serde::{Deserialize, Serialize};

/// Opaque handle to a solid in the kernel session. Never persisted;
/// valid only while the session that produced it lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SolidHandle(pub(crate) u64);

impl SolidHandle {
    pub(crate) fn id(&self) -> u64 {
        self.0
    }
}

/// Errors from kernel operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum KernelError {
    #[error("invalid profile: {reason}")]
    InvalidProfile { reason: String },

    #[error("profile is self-intersecting")]
    SelfIntersecting,

    #[error("boolean operation failed: {reason}")]
    BooleanFailed { reason: String },

    #[error("tessellation failed: {reason}")]
    TessellationFailed { reason: String },

    #[error("unknown solid handle")]
    UnknownSolid,

    #[error("face index {index} out of range")]
    FaceOutOfRange { index: u32 },

    #[error("operation not supported: {operation}")]
    NotSupported { operation: String },

    #[error("kernel error: {message}")]
    Other { message: String },
}

/// Surface classification of a face, as reported by topology queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SurfaceKind {
    Plane,
    Cylinder,
    Revolved,
    Other,
}

/// Geometry of one edge, exposed for external sketch attachments.
#[derive(Debug, Clone, PartialEq)]
pub enum EdgeKind {
    Segment { start: Vec3, end: Vec3 },
    Circle { center: Vec3, normal: Vec3, radius: f64 },
}

impl EdgeKind {
    /// Point at normalized parameter t in [0, 1]. Segments interpolate
    /// between endpoints; circles sweep from their seam.
    pub fn point_at(&self, t: f64) -> Vec3 {
        match self {
            EdgeKind::Segment { start, end } => anvil_types::lerp(*start, *end, t),
            EdgeKind::Circle {
                center,
                normal,
                radius,
            } => {
                let (u, v) = tangent_frame(*normal);
                let angle = t * std::f64::consts::TAU;
                [
                    center[0] + radius * (u[0] * angle.cos() + v[0] * angle.sin()),
                    center[1] + radius * (u[1] * angle.cos() + v[1] * angle.sin()),
                    center[2] + radius * (u[2] * angle.cos() + v[2] * angle.sin()),
                ]
            }
        }
    }

    pub fn endpoints(&self) -> (Vec3, Vec3) {
        match self {
            EdgeKind::Segment { start, end } => (*start, *end),
            EdgeKind::Circle { .. } => {
                let p = self.point_at(0.0);
                (p, p)
            }
        }
    }
}

/// Two deterministic tangent vectors orthogonal to a normal.
pub fn tangent_frame(n: Vec3) -> (Vec3, Vec3) {
    let up = if n[0].abs() < 0.9 {
        [1.0, 0.0, 0.0]
    } else {
        [0.0, 1.0, 0.0]
    };
    let u = anvil_types::normalized(anvil_types::cross(up, n)).unwrap_or([1.0, 0.0, 0.0]);
    let v = anvil_types::cross(n, u);
    (u, v)
}

/// Analytic surface data backing one face of a `SolidModel`.
#[derive(Debug, Clone, PartialEq)]
pub enum FaceGeom {
    /// Planar cap with optional hole loops, in cap-plane coordinates.
    Cap {
        basis: PlaneBasis,
        outer: ProfileRing,
        holes: Vec<ProfileRing>,
        /// Outward face normal (may oppose `basis.normal`).
        outward: Vec3,
    },
    /// Planar side wall of a swept polygon edge.
    Wall { corners: [Vec3; 4], outward: Vec3 },
    /// Lateral face of a swept circle.
    Cylinder {
        base_center: Vec3,
        axis: Vec3,
        radius: f64,
        height: f64,
        /// false for hole walls, which face inward.
        outward: bool,
    },
    /// One profile segment (r, z) swept around an axis.
    Revolved {
        axis_origin: Vec3,
        axis_dir: Vec3,
        /// Radial reference direction at sweep angle zero.
        radial: Vec3,
        p0: [f64; 2],
        p1: [f64; 2],
        angle: f64,
    },
}

/// One face of an analytic solid.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceData {
    pub surface: SurfaceKind,
    pub geom: FaceGeom,
    pub area: f64,
    pub centroid: Vec3,
    /// Outward unit normal for planar faces.
    pub normal: Option<Vec3>,
    pub reversed: bool,
}

/// Sweep provenance kept on extruded solids so the boolean stage can
/// recognize a piercing cut and carve true hole topology.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepInfo {
    pub basis: PlaneBasis,
    pub rings: Vec<ProfileRing>,
    pub distance: f64,
}

/// Deterministic analytic B-Rep-lite: faces with explicit surface data,
/// plus edge and vertex tables for attachment queries.
#[derive(Debug, Clone, PartialEq)]
pub struct SolidModel {
    pub faces: Vec<FaceData>,
    pub edges: Vec<EdgeKind>,
    pub vertices: Vec<Vec3>,
    pub bbox: (Vec3, Vec3),
    pub sweep: Option<SweepInfo>,
}

impl SolidModel {
    pub fn bbox_volume(&self) -> f64 {
        let (lo, hi) = self.bbox;
        (hi[0] - lo[0]).max(0.0) * (hi[1] - lo[1]).max(0.0) * (hi[2] - lo[2]).max(0.0)
    }
}

/// Axis-aligned overlap with positive shared volume.
pub fn bbox_overlap(a: &(Vec3, Vec3), b: &(Vec3, Vec3), eps: f64) -> bool {
    for i in 0..3 {
        if a.1[i] - eps <= b.0[i] || b.1[i] - eps <= a.0[i] {
            return false;
        }
    }
    true
}
