use anvil_types::{dot, normalized, FaceSelector, Profile, Vec3};
use geo_kernel::{ExtrudeSpec, KernelQuery, KernelSession, SolidHandle, SurfaceKind};

use crate::types::{OpError, OpOutput};

/// Run an extrusion and assign cap/side roles to the result's faces.
pub fn execute_extrude(
    kernel: &mut dyn KernelSession,
    profile: &Profile,
    distance: f64,
) -> Result<OpOutput, OpError> {
    let handle = kernel.extrude(profile, &ExtrudeSpec { distance })?;
    let sweep_dir = normalized(profile.plane.normal).unwrap_or([0.0, 0.0, 1.0]);
    let sweep_dir = if distance < 0.0 {
        [-sweep_dir[0], -sweep_dir[1], -sweep_dir[2]]
    } else {
        sweep_dir
    };
    let roles = assign_extrude_roles(kernel.queries(), &handle, sweep_dir);
    Ok(OpOutput { handle, roles })
}

/// Cap/side classification by ranking face normals against the sweep
/// direction: the best-aligned planar face is the top, the best
/// opposed one the bottom, everything else a side in face order.
pub(crate) fn assign_extrude_roles(
    queries: &dyn KernelQuery,
    handle: &SolidHandle,
    sweep_dir: Vec3,
) -> Vec<(u32, FaceSelector)> {
    let count = queries.face_count(handle) as u32;
    let mut top: Option<(u32, f64)> = None;
    let mut bottom: Option<(u32, f64)> = None;

    for face in 0..count {
        if queries.face_surface(handle, face) != Some(SurfaceKind::Plane) {
            continue;
        }
        let Some(normal) = queries.face_normal(handle, face) else {
            continue;
        };
        let alignment = dot(normal, sweep_dir);
        if alignment > 0.5 && top.map(|(_, a)| alignment > a).unwrap_or(true) {
            top = Some((face, alignment));
        }
        if alignment < -0.5 && bottom.map(|(_, a)| alignment < a).unwrap_or(true) {
            bottom = Some((face, alignment));
        }
    }

    let mut roles = Vec::new();
    let mut side_index = 0;
    for face in 0..count {
        if top.map(|(i, _)| i == face).unwrap_or(false) {
            roles.push((face, FaceSelector::Top));
        } else if bottom.map(|(i, _)| i == face).unwrap_or(false) {
            roles.push((face, FaceSelector::Bottom));
        } else {
            roles.push((face, FaceSelector::Side(side_index)));
            side_index += 1;
        }
    }
    roles
}

#[cfg(test)]
mod tests {
    use super::*;
    use anvil_types::{PlaneBasis, ProfileRing};
    use geo_kernel::AnalyticKernel;

    fn rect_profile() -> Profile {
        Profile {
            plane: PlaneBasis::world_xy(),
            rings: vec![ProfileRing::Polygon {
                points: vec![[0.0, 0.0], [4.0, 0.0], [4.0, 2.0], [0.0, 2.0]],
                entities: Vec::new(),
            }],
        }
    }

    #[test]
    fn extrude_assigns_top_bottom_and_sides() {
        let mut kernel = AnalyticKernel::new();
        let output = execute_extrude(&mut kernel, &rect_profile(), 3.0).unwrap();

        let selectors: Vec<FaceSelector> = output.roles.iter().map(|(_, s)| *s).collect();
        assert!(selectors.contains(&FaceSelector::Top));
        assert!(selectors.contains(&FaceSelector::Bottom));
        let sides = selectors
            .iter()
            .filter(|s| matches!(s, FaceSelector::Side(_)))
            .count();
        assert_eq!(sides, 4);
    }

    #[test]
    fn reverse_extrude_swaps_caps() {
        let mut kernel = AnalyticKernel::new();
        let output = execute_extrude(&mut kernel, &rect_profile(), -3.0).unwrap();
        // Face 1 is the sweep-end cap; with a negative distance the
        // sweep direction flips, so it is still Top relative to travel.
        let top_face = output
            .roles
            .iter()
            .find(|(_, s)| *s == FaceSelector::Top)
            .map(|(f, _)| *f)
            .unwrap();
        let n = kernel.face_normal(&output.handle, top_face).unwrap();
        assert!(n[2] < 0.0, "top cap faces the sweep direction");
    }
}
