//! Sketch interpretation: materialize a solver sketch on its plane,
//! feed points/entities/constraints, solve, and report which solved
//! positions drifted from the document.

use anvil_types::{EntityId, FeatureId, PointsOrLine, SketchConstraint, SketchFeature, TopoRef};
use sketch_solver::{SolverError, SolverSketch};

use crate::context::{Session, SolvedSketchState};
use crate::planes::resolve_plane_ref;
use crate::types::{InterpretError, SketchSolution};

pub fn interpret_sketch(
    session: &mut Session<'_>,
    feature_id: FeatureId,
    sketch: &SketchFeature,
) -> Result<SketchSolution, InterpretError> {
    let plane = resolve_plane_ref(session, &sketch.plane)?;
    let s = session.scale;
    let mut solver = SolverSketch::new(plane);

    // Points first; lexicographic key order throughout.
    for (id, point) in &sketch.data.points_by_id {
        let (x, y, fixed) = match &point.attached_to {
            Some(attachment) => {
                let world = match &attachment.target {
                    edge @ TopoRef::Edge { .. } => {
                        session.resolve_edge(edge)?.point_at(attachment.param)
                    }
                    vertex @ TopoRef::Vertex { .. } => session.resolve_vertex(vertex)?,
                    other => {
                        return Err(InterpretError::invalid_reference(format!(
                            "point {id:?} attached to unsupported target {other}"
                        )))
                    }
                };
                let (u, v) = plane.to_local(world);
                (u, v, true)
            }
            None => (point.x * s, point.y * s, point.fixed),
        };
        solver
            .add_point(id.clone(), x, y, fixed)
            .map_err(solver_error)?;
    }

    for (id, entity) in &sketch.data.entities_by_id {
        let entity = match entity {
            anvil_types::SketchEntity::Circle { center, radius } => {
                anvil_types::SketchEntity::Circle {
                    center: center.clone(),
                    radius: radius * s,
                }
            }
            other => other.clone(),
        };
        solver.add_entity(id.clone(), entity).map_err(solver_error)?;
    }

    for (id, constraint) in &sketch.data.constraints_by_id {
        solver
            .add_constraint(id.clone(), scale_constraint(constraint, s))
            .map_err(solver_error)?;
    }

    let report = solver.solve();

    // Compare against the stored coordinates; only drifts beyond
    // epsilon are written back (the fixpoint condition).
    let mut moved: Vec<(EntityId, f64, f64)> = Vec::new();
    for (id, point) in &sketch.data.points_by_id {
        if point.attached_to.is_some() {
            // Attachment positions are derived, not authored.
            continue;
        }
        if let Some((x, y)) = solver.get_point(id) {
            let dx = (x - point.x * s).abs();
            let dy = (y - point.y * s).abs();
            if dx.max(dy) > session.ctx.length_eps {
                moved.push((id.clone(), x / s, y / s));
            }
        }
    }

    let points = solver
        .positions()
        .into_iter()
        .map(|(id, (x, y))| (id, (x / s, y / s)))
        .collect();

    let solution = SketchSolution {
        sketch: feature_id,
        outcome: report.outcome,
        dof: report.dof,
        plane,
        points,
        moved,
    };

    session.sketches.insert(
        feature_id,
        SolvedSketchState {
            solver,
            outcome: report.outcome,
            dof: report.dof,
            plane,
        },
    );

    Ok(solution)
}

fn solver_error(err: SolverError) -> InterpretError {
    InterpretError::build(err.to_string())
}

/// Scale length-valued constraints into millimetres. Angles pass
/// through; they convert to radians at the kernel boundary only.
fn scale_constraint(constraint: &SketchConstraint, s: f64) -> SketchConstraint {
    match constraint {
        SketchConstraint::Fixed { point, x, y } => SketchConstraint::Fixed {
            point: point.clone(),
            x: x * s,
            y: y * s,
        },
        SketchConstraint::Distance { between, value } => SketchConstraint::Distance {
            between: match between {
                PointsOrLine::Points { a, b } => PointsOrLine::Points {
                    a: a.clone(),
                    b: b.clone(),
                },
                PointsOrLine::Line { line } => PointsOrLine::Line { line: line.clone() },
            },
            value: value * s,
        },
        other => other.clone(),
    }
}
