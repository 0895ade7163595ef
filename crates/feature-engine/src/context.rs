//! Per-rebuild session state: caches, the body registry, and resolution
//! helpers shared by the interpreters. One session per rebuild; nothing
//! outlives it except the published output.

use std::collections::BTreeMap;

use anvil_types::{
    DofReport, FaceSelector, FeatureId, NumericContext, PlaneBasis, SolveOutcome, TopoRef, Vec3,
};
use geo_kernel::{EdgeKind, KernelSession};
use sketch_solver::SolverSketch;

use crate::types::{BodyEntry, InterpretError};

/// A solved sketch retained for downstream profile extraction.
#[derive(Debug, Clone)]
pub struct SolvedSketchState {
    pub solver: SolverSketch,
    pub outcome: SolveOutcome,
    pub dof: DofReport,
    pub plane: PlaneBasis,
}

pub struct Session<'a> {
    pub kernel: &'a mut dyn KernelSession,
    /// Document-unit → millimetre factor.
    pub scale: f64,
    pub ctx: NumericContext,
    pub planes: BTreeMap<FeatureId, PlaneBasis>,
    pub axes: BTreeMap<FeatureId, (Vec3, Vec3)>,
    pub sketches: BTreeMap<FeatureId, SolvedSketchState>,
    pub registry: Vec<BodyEntry>,
    /// Bodies created so far, for palette cycling.
    pub bodies_created: usize,
}

impl<'a> Session<'a> {
    pub fn new(kernel: &'a mut dyn KernelSession, scale: f64, ctx: NumericContext) -> Self {
        Self {
            kernel,
            scale,
            ctx,
            planes: BTreeMap::new(),
            axes: BTreeMap::new(),
            sketches: BTreeMap::new(),
            registry: Vec::new(),
            bodies_created: 0,
        }
    }

    pub fn body_index_by_source(&self, feature: FeatureId) -> Option<usize> {
        self.registry.iter().position(|b| b.id.source == feature)
    }

    /// Resolve a face reference against the bodies built so far.
    pub fn resolve_face(&self, r: &TopoRef) -> Result<(usize, u32), InterpretError> {
        let TopoRef::Face { feature, selector } = r else {
            return Err(InterpretError::invalid_reference(format!(
                "{r} is not a face reference"
            )));
        };
        let entry_index = self.body_index_by_source(*feature).ok_or_else(|| {
            InterpretError::invalid_reference(format!("feature {feature} produced no body"))
        })?;
        let entry = &self.registry[entry_index];
        let face = match selector {
            FaceSelector::Index(i) => {
                let count = self.kernel.queries().face_count(&entry.handle) as u32;
                if *i >= count {
                    return Err(InterpretError::invalid_reference(format!(
                        "face index {i} out of range ({count} faces)"
                    )));
                }
                *i
            }
            role => entry
                .roles
                .iter()
                .find(|(_, s)| s == role)
                .map(|(f, _)| *f)
                .ok_or_else(|| {
                    InterpretError::invalid_reference(format!(
                        "no face with role {role} on body {}",
                        entry.id
                    ))
                })?,
        };
        Ok((entry_index, face))
    }

    pub fn resolve_edge(&self, r: &TopoRef) -> Result<EdgeKind, InterpretError> {
        let TopoRef::Edge { feature, index } = r else {
            return Err(InterpretError::invalid_reference(format!(
                "{r} is not an edge reference"
            )));
        };
        let entry_index = self.body_index_by_source(*feature).ok_or_else(|| {
            InterpretError::invalid_reference(format!("feature {feature} produced no body"))
        })?;
        let entry = &self.registry[entry_index];
        self.kernel
            .queries()
            .edge_geometry(&entry.handle, *index)
            .ok_or_else(|| {
                InterpretError::invalid_reference(format!("edge index {index} out of range"))
            })
    }

    pub fn resolve_vertex(&self, r: &TopoRef) -> Result<Vec3, InterpretError> {
        let TopoRef::Vertex { feature, index } = r else {
            return Err(InterpretError::invalid_reference(format!(
                "{r} is not a vertex reference"
            )));
        };
        let entry_index = self.body_index_by_source(*feature).ok_or_else(|| {
            InterpretError::invalid_reference(format!("feature {feature} produced no body"))
        })?;
        let entry = &self.registry[entry_index];
        self.kernel
            .queries()
            .vertex_position(&entry.handle, *index)
            .ok_or_else(|| {
                InterpretError::invalid_reference(format!("vertex index {index} out of range"))
            })
    }
}
