use anvil_types::BooleanOp;
use geo_kernel::{KernelSession, SolidHandle};

use crate::types::{OpError, OpOutput};

/// Run a boolean between two existing bodies. The result's faces are
/// published by ordinal only; role tokens do not survive booleans.
pub fn execute_boolean(
    kernel: &mut dyn KernelSession,
    target: &SolidHandle,
    tool: &SolidHandle,
    op: BooleanOp,
) -> Result<OpOutput, OpError> {
    let handle = match op {
        BooleanOp::Union => kernel.union(target, tool)?,
        BooleanOp::Subtract => kernel.subtract(target, tool)?,
        BooleanOp::Intersect => kernel.intersect(target, tool)?,
    };
    Ok(OpOutput {
        handle,
        roles: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use anvil_types::{PlaneBasis, Profile, ProfileRing};
    use geo_kernel::{AnalyticKernel, ExtrudeSpec, Kernel, KernelQuery};

    fn box_at(x: f64, w: f64) -> Profile {
        Profile {
            plane: PlaneBasis::new([x, 0.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0]),
            rings: vec![ProfileRing::Polygon {
                points: vec![[0.0, 0.0], [w, 0.0], [w, 1.0], [0.0, 1.0]],
                entities: Vec::new(),
            }],
        }
    }

    #[test]
    fn union_of_overlapping_boxes_is_one_body() {
        let mut kernel = AnalyticKernel::new();
        let a = kernel.extrude(&box_at(0.0, 2.0), &ExtrudeSpec { distance: 1.0 }).unwrap();
        let b = kernel.extrude(&box_at(1.0, 2.0), &ExtrudeSpec { distance: 1.0 }).unwrap();
        assert!(kernel.overlaps(&a, &b));
        let out = execute_boolean(&mut kernel, &a, &b, BooleanOp::Union).unwrap();
        assert!(kernel.face_count(&out.handle) > 0);
    }

    #[test]
    fn intersect_of_disjoint_boxes_fails() {
        let mut kernel = AnalyticKernel::new();
        let a = kernel.extrude(&box_at(0.0, 1.0), &ExtrudeSpec { distance: 1.0 }).unwrap();
        let b = kernel.extrude(&box_at(10.0, 1.0), &ExtrudeSpec { distance: 1.0 }).unwrap();
        assert!(matches!(
            execute_boolean(&mut kernel, &a, &b, BooleanOp::Intersect),
            Err(OpError::Kernel(_))
        ));
    }
}
