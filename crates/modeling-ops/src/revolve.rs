use anvil_types::{FaceSelector, Profile, Vec3};
use geo_kernel::{KernelQuery, KernelSession, RevolveSpec, SolidHandle, SurfaceKind};

use crate::types::{OpError, OpOutput};

/// Run a revolution and assign lateral/cap roles.
pub fn execute_revolve(
    kernel: &mut dyn KernelSession,
    profile: &Profile,
    axis_origin: Vec3,
    axis_dir: Vec3,
    angle: f64,
) -> Result<OpOutput, OpError> {
    let handle = kernel.revolve(
        profile,
        &RevolveSpec {
            axis_origin,
            axis_dir,
            angle,
        },
    )?;
    let roles = assign_revolve_roles(kernel.queries(), &handle);
    Ok(OpOutput { handle, roles })
}

/// Swept faces are lateral, planar faces (present only for partial
/// revolutions) are caps, each indexed in face order.
pub(crate) fn assign_revolve_roles(
    queries: &dyn KernelQuery,
    handle: &SolidHandle,
) -> Vec<(u32, FaceSelector)> {
    let count = queries.face_count(handle) as u32;
    let mut roles = Vec::new();
    let mut lateral = 0;
    let mut cap = 0;
    for face in 0..count {
        match queries.face_surface(handle, face) {
            Some(SurfaceKind::Plane) => {
                roles.push((face, FaceSelector::Cap(cap)));
                cap += 1;
            }
            _ => {
                roles.push((face, FaceSelector::Lateral(lateral)));
                lateral += 1;
            }
        }
    }
    roles
}
