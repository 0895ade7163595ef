use std::collections::BTreeMap;

use anvil_types::{
    DofReport, EntityId, PlaneBasis, Profile, SketchConstraint, SketchEntity, SolveOutcome,
};

/// Errors from building a solver sketch.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SolverError {
    #[error("duplicate entity id {0:?}")]
    DuplicateId(EntityId),

    #[error("entity {entity:?} references unknown point {point:?}")]
    UnknownPoint { entity: EntityId, point: EntityId },

    #[error("constraint {constraint:?} references unknown entity {entity:?}")]
    UnknownEntity {
        constraint: EntityId,
        entity: EntityId,
    },
}

/// A point as the solver sees it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverPoint {
    pub x: f64,
    pub y: f64,
    /// Pinned: the solver never moves it.
    pub fixed: bool,
}

/// One sketch rooted on a plane, being fed to the constraint solver.
///
/// This is an owned session object threaded through the interpreters —
/// building one per rebuild of a sketch keeps solver state out of any
/// process-wide location. All three maps iterate in lexicographic key
/// order, so the relaxation sequence is identical on every replica.
#[derive(Debug, Clone)]
pub struct SolverSketch {
    pub plane: PlaneBasis,
    pub points: BTreeMap<EntityId, SolverPoint>,
    pub entities: BTreeMap<EntityId, SketchEntity>,
    pub constraints: BTreeMap<EntityId, SketchConstraint>,
}

impl SolverSketch {
    pub fn new(plane: PlaneBasis) -> Self {
        Self {
            plane,
            points: BTreeMap::new(),
            entities: BTreeMap::new(),
            constraints: BTreeMap::new(),
        }
    }

    pub fn add_point(
        &mut self,
        id: impl Into<EntityId>,
        x: f64,
        y: f64,
        fixed: bool,
    ) -> Result<(), SolverError> {
        let id = id.into();
        if self.points.contains_key(&id) {
            return Err(SolverError::DuplicateId(id));
        }
        self.points.insert(id, SolverPoint { x, y, fixed });
        Ok(())
    }

    pub fn add_line(
        &mut self,
        id: impl Into<EntityId>,
        start: impl Into<EntityId>,
        end: impl Into<EntityId>,
        construction: bool,
    ) -> Result<(), SolverError> {
        self.add_entity(
            id.into(),
            SketchEntity::Line {
                start: start.into(),
                end: end.into(),
                construction,
            },
        )
    }

    pub fn add_arc(
        &mut self,
        id: impl Into<EntityId>,
        start: impl Into<EntityId>,
        end: impl Into<EntityId>,
        center: impl Into<EntityId>,
        ccw: bool,
    ) -> Result<(), SolverError> {
        self.add_entity(
            id.into(),
            SketchEntity::Arc {
                start: start.into(),
                end: end.into(),
                center: center.into(),
                ccw,
            },
        )
    }

    pub fn add_circle(
        &mut self,
        id: impl Into<EntityId>,
        center: impl Into<EntityId>,
        radius: f64,
    ) -> Result<(), SolverError> {
        self.add_entity(
            id.into(),
            SketchEntity::Circle {
                center: center.into(),
                radius,
            },
        )
    }

    pub fn add_entity(&mut self, id: EntityId, entity: SketchEntity) -> Result<(), SolverError> {
        if self.entities.contains_key(&id) {
            return Err(SolverError::DuplicateId(id));
        }
        for point in entity.point_ids() {
            if !self.points.contains_key(point) {
                return Err(SolverError::UnknownPoint {
                    entity: id.clone(),
                    point: point.clone(),
                });
            }
        }
        self.entities.insert(id, entity);
        Ok(())
    }

    pub fn add_constraint(
        &mut self,
        id: impl Into<EntityId>,
        constraint: SketchConstraint,
    ) -> Result<(), SolverError> {
        let id = id.into();
        if self.constraints.contains_key(&id) {
            return Err(SolverError::DuplicateId(id));
        }
        for point in constraint.point_ids() {
            if !self.points.contains_key(point) {
                return Err(SolverError::UnknownPoint {
                    entity: id.clone(),
                    point: point.clone(),
                });
            }
        }
        for entity in constraint.entity_ids() {
            if !self.entities.contains_key(entity) {
                return Err(SolverError::UnknownEntity {
                    constraint: id.clone(),
                    entity: entity.clone(),
                });
            }
        }
        self.constraints.insert(id, constraint);
        Ok(())
    }

    pub fn get_point(&self, id: &str) -> Option<(f64, f64)> {
        self.points.get(id).map(|p| (p.x, p.y))
    }

    /// All solved positions, keyed by point id.
    pub fn positions(&self) -> BTreeMap<EntityId, (f64, f64)> {
        self.points
            .iter()
            .map(|(id, p)| (id.clone(), (p.x, p.y)))
            .collect()
    }

    /// Run the relaxation solve. See `solver::solve`.
    pub fn solve(&mut self) -> SolveReport {
        crate::solver::solve(self)
    }

    /// Extract the closed region for sweeping, skipping construction
    /// entities and anything in `exclude` (e.g. a revolve axis line).
    /// None when the sketch has no closed, non-empty region.
    pub fn to_profile(&self, exclude: &[&str]) -> Option<Profile> {
        crate::profiles::to_profile(self, exclude)
    }
}

/// Outcome of one solve: classification, DOF accounting, residual.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveReport {
    pub outcome: SolveOutcome,
    pub dof: DofReport,
    pub iterations: usize,
    pub max_error: f64,
    pub warnings: Vec<String>,
}

impl SolveReport {
    pub fn converged(&self) -> bool {
        matches!(
            self.outcome,
            SolveOutcome::Solved | SolveOutcome::SolvedWithWarnings | SolveOutcome::UnderConstrained
        )
    }
}
