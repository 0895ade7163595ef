use anvil_types::FaceSelector;
use geo_kernel::{KernelError, SolidHandle};

/// Result of one kernel-level operation: the produced body plus the
/// face roles the persistent-reference index will publish. Nothing here
/// touches the body registry — the caller commits outputs only after
/// the whole feature succeeds.
#[derive(Debug, Clone)]
pub struct OpOutput {
    pub handle: SolidHandle,
    /// (kernel face index, role selector) pairs for faces with a
    /// geometric role. Faces without a role stay reachable through
    /// their ordinal.
    pub roles: Vec<(u32, FaceSelector)>,
}

/// Errors from modeling operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum OpError {
    #[error("kernel error: {0}")]
    Kernel(#[from] KernelError),

    #[error("no closed profile available for the operation")]
    NoProfile,
}
