/// Central tolerance context. Interpreters and the solver take their
/// epsilons from here instead of hard-coding them at call sites.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericContext {
    /// Below this, two lengths (in mm) are the same. Also the solver
    /// write-back threshold: solved positions closer than this to the
    /// stored ones are not written back.
    pub length_eps: f64,
    /// Radians.
    pub angle_eps: f64,
    /// mm³, used by shared-volume tests in merge policy.
    pub volume_eps: f64,
}

impl NumericContext {
    pub const fn standard() -> Self {
        Self {
            length_eps: 1e-9,
            angle_eps: 1e-9,
            volume_eps: 1e-12,
        }
    }
}

impl Default for NumericContext {
    fn default() -> Self {
        Self::standard()
    }
}

/// Conventional sweep magnitude for through-all extents. A fixed
/// constant can under-cut very large models; sizing it from the target
/// bodies' bounding volume is a known alternative.
pub const THROUGH_ALL_DISTANCE: f64 = 1000.0;

/// Default display extent (width and height) of a datum plane.
pub const DATUM_PLANE_EXTENT: f64 = 100.0;
