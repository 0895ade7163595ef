//! Iterative relaxation solve.
//!
//! Each pass walks the constraints in key order and projects the
//! offending points a step toward satisfaction; fixed points never
//! move, free points absorb the correction. The loop ends when the
//! largest residual falls under `SOLVE_EPS` or the iteration budget
//! runs out. Everything here is a pure function of the sketch content,
//! so two replicas produce bit-identical positions.

use std::collections::BTreeMap;

use anvil_types::{DofReport, EntityId, PointsOrLine, SketchConstraint, SketchEntity};

use crate::status::classify;
use crate::types::{SolveReport, SolverPoint, SolverSketch};

/// Convergence threshold on the largest residual (mm / radians).
pub const SOLVE_EPS: f64 = 1e-9;
/// Residual under which a non-converged solve still counts as loose.
pub const LOOSE_EPS: f64 = 1e-6;
const MAX_ITERATIONS: usize = 250;

type Points = BTreeMap<EntityId, SolverPoint>;

pub fn solve(sketch: &mut SolverSketch) -> SolveReport {
    let mut warnings: Vec<String> = Vec::new();
    let mut max_error = 0.0_f64;
    let mut iterations = 0;
    let mut converged = sketch.constraints.is_empty();

    for iteration in 0..MAX_ITERATIONS {
        iterations = iteration + 1;
        max_error = 0.0;

        let constraints: Vec<(EntityId, SketchConstraint)> = sketch
            .constraints
            .iter()
            .map(|(id, c)| (id.clone(), c.clone()))
            .collect();

        for (_, constraint) in &constraints {
            let err = apply_constraint(constraint, &sketch.entities, &mut sketch.points);
            if err > max_error {
                max_error = err;
            }
        }

        if max_error < SOLVE_EPS {
            converged = true;
            break;
        }
    }

    // A residual that stalled just above the strict threshold is still
    // a usable solve; report it as converged with a warning.
    if !converged && max_error < LOOSE_EPS {
        converged = true;
        warnings.push(format!(
            "solver stopped at residual {max_error:.3e} after {iterations} iterations"
        ));
    }

    let mut dof = analyze_dof(sketch);
    // A solve that cannot satisfy its constraints is over-constrained
    // in practice even when the global equation count disagrees
    // (e.g. two pinned points fighting one distance).
    if !converged {
        dof.is_over_constrained = true;
        dof.is_fully_constrained = false;
    }
    let outcome = classify(converged, max_error, &dof, &warnings);
    SolveReport {
        outcome,
        dof,
        iterations,
        max_error,
        warnings,
    }
}

/// Degrees-of-freedom accounting. Points contribute two, circle radii
/// one; fixed flags and constraint equations consume them.
pub fn analyze_dof(sketch: &SolverSketch) -> DofReport {
    let mut total: i32 = 0;
    let mut constrained: i32 = 0;

    for point in sketch.points.values() {
        total += 2;
        if point.fixed {
            constrained += 2;
        }
    }
    for entity in sketch.entities.values() {
        if matches!(entity, SketchEntity::Circle { .. }) {
            total += 1;
        }
    }
    for constraint in sketch.constraints.values() {
        constrained += equation_count(constraint);
    }

    let remaining = total - constrained;
    DofReport {
        total,
        constrained,
        remaining,
        is_fully_constrained: remaining == 0,
        is_over_constrained: remaining < 0,
    }
}

fn equation_count(constraint: &SketchConstraint) -> i32 {
    match constraint {
        SketchConstraint::Coincident { .. } => 2,
        SketchConstraint::Fixed { .. } => 2,
        SketchConstraint::Symmetric { .. } => 2,
        _ => 1,
    }
}

/// Project one constraint; returns its residual before the move.
fn apply_constraint(
    constraint: &SketchConstraint,
    entities: &BTreeMap<EntityId, SketchEntity>,
    points: &mut Points,
) -> f64 {
    match constraint {
        SketchConstraint::Coincident { a, b } => {
            let (pa, pb) = match (get(points, a), get(points, b)) {
                (Some(pa), Some(pb)) => (pa, pb),
                _ => return 0.0,
            };
            let err = dist(pa, pb);
            pull_together(points, a, b, pb, pa);
            err
        }
        SketchConstraint::Horizontal { items } => align_axis(items, entities, points, 1),
        SketchConstraint::Vertical { items } => align_axis(items, entities, points, 0),
        SketchConstraint::Fixed { point, x, y } => {
            let p = match get(points, point) {
                Some(p) => p,
                None => return 0.0,
            };
            let err = dist(p, (*x, *y));
            set_point(points, point, (*x, *y));
            err
        }
        SketchConstraint::Distance { between, value } => match between {
            PointsOrLine::Points { a, b } => point_distance(points, a, b, *value),
            PointsOrLine::Line { line } => {
                let (start, end) = match line_ends(entities, line) {
                    Some(ends) => ends,
                    None => return 0.0,
                };
                point_distance(points, &start, &end, *value)
            }
        },
        SketchConstraint::Angle {
            line_a,
            line_b,
            value,
        } => {
            let (sa, ea) = match line_ends(entities, line_a) {
                Some(x) => x,
                None => return 0.0,
            };
            let (sb, eb) = match line_ends(entities, line_b) {
                Some(x) => x,
                None => return 0.0,
            };
            let da = match direction(points, &sa, &ea) {
                Some(d) => d,
                None => return 0.0,
            };
            let db = match direction(points, &sb, &eb) {
                Some(d) => d,
                None => return 0.0,
            };
            let target = value.to_radians();
            let current = db.1.atan2(db.0) - da.1.atan2(da.0);
            let mut delta = target - current;
            while delta > std::f64::consts::PI {
                delta -= std::f64::consts::TAU;
            }
            while delta < -std::f64::consts::PI {
                delta += std::f64::consts::TAU;
            }
            let err = delta.abs();
            if err > SOLVE_EPS {
                let (cos, sin) = (target.cos(), target.sin());
                let target_db = (da.0 * cos - da.1 * sin, da.0 * sin + da.1 * cos);
                rotate_line_to(points, &sb, &eb, target_db);
            }
            err
        }
        SketchConstraint::Parallel { line_a, line_b } => {
            let (sa, ea) = match line_ends(entities, line_a) {
                Some(x) => x,
                None => return 0.0,
            };
            let (sb, eb) = match line_ends(entities, line_b) {
                Some(x) => x,
                None => return 0.0,
            };
            let (da, db) = match (direction(points, &sa, &ea), direction(points, &sb, &eb)) {
                (Some(da), Some(db)) => (da, db),
                _ => return 0.0,
            };
            let cross = da.0 * db.1 - da.1 * db.0;
            let err = cross.abs();
            if err > SOLVE_EPS {
                // Align both lines to the sign-matched average direction.
                let sign = if da.0 * db.0 + da.1 * db.1 >= 0.0 { 1.0 } else { -1.0 };
                let avg = (da.0 + db.0 * sign, da.1 + db.1 * sign);
                let len = (avg.0 * avg.0 + avg.1 * avg.1).sqrt();
                if len > 1e-12 {
                    let dir = (avg.0 / len, avg.1 / len);
                    rotate_line_to(points, &sa, &ea, dir);
                    rotate_line_to(points, &sb, &eb, (dir.0 * sign, dir.1 * sign));
                }
            }
            err
        }
        SketchConstraint::Perpendicular { line_a, line_b } => {
            let (sa, ea) = match line_ends(entities, line_a) {
                Some(x) => x,
                None => return 0.0,
            };
            let (sb, eb) = match line_ends(entities, line_b) {
                Some(x) => x,
                None => return 0.0,
            };
            let (da, db) = match (direction(points, &sa, &ea), direction(points, &sb, &eb)) {
                (Some(da), Some(db)) => (da, db),
                _ => return 0.0,
            };
            let dot = da.0 * db.0 + da.1 * db.1;
            let err = dot.abs();
            if err > SOLVE_EPS {
                // Remove from each line the component along the other.
                let nb = normalize2((db.0 - dot * da.0, db.1 - dot * da.1));
                if let Some(nb) = nb {
                    rotate_line_to(points, &sb, &eb, nb);
                }
                let na = normalize2((da.0 - dot * db.0, da.1 - dot * db.1));
                if let Some(na) = na {
                    rotate_line_to(points, &sa, &ea, na);
                }
            }
            err
        }
        SketchConstraint::EqualLength { line_a, line_b } => {
            let (sa, ea) = match line_ends(entities, line_a) {
                Some(x) => x,
                None => return 0.0,
            };
            let (sb, eb) = match line_ends(entities, line_b) {
                Some(x) => x,
                None => return 0.0,
            };
            let la = match (get(points, &sa), get(points, &ea)) {
                (Some(p), Some(q)) => dist(p, q),
                _ => return 0.0,
            };
            let lb = match (get(points, &sb), get(points, &eb)) {
                (Some(p), Some(q)) => dist(p, q),
                _ => return 0.0,
            };
            let err = (la - lb).abs();
            if err > SOLVE_EPS {
                let avg = (la + lb) / 2.0;
                set_line_length(points, &sa, &ea, avg);
                set_line_length(points, &sb, &eb, avg);
            }
            err
        }
        SketchConstraint::Tangent { line, arc } => tangent_line_arc(entities, points, line, arc),
        SketchConstraint::Symmetric { a, b, axis } => {
            let (s, e) = match line_ends(entities, axis) {
                Some(x) => x,
                None => return 0.0,
            };
            let (ps, pe) = match (get(points, &s), get(points, &e)) {
                (Some(ps), Some(pe)) => (ps, pe),
                _ => return 0.0,
            };
            let (pa, pb) = match (get(points, a), get(points, b)) {
                (Some(pa), Some(pb)) => (pa, pb),
                _ => return 0.0,
            };
            let target_b = reflect(pa, ps, pe);
            let target_a = reflect(pb, ps, pe);
            let err = dist(pb, target_b);
            if err > SOLVE_EPS {
                pull_together(points, a, b, target_a, target_b);
            }
            err
        }
    }
}

// ── Point-level projection helpers ─────────────────────────────────────

fn get(points: &Points, id: &str) -> Option<(f64, f64)> {
    points.get(id).map(|p| (p.x, p.y))
}

fn set_point(points: &mut Points, id: &str, target: (f64, f64)) {
    if let Some(p) = points.get_mut(id) {
        if !p.fixed {
            p.x = target.0;
            p.y = target.1;
        }
    }
}

fn is_fixed(points: &Points, id: &str) -> bool {
    points.get(id).map(|p| p.fixed).unwrap_or(true)
}

/// Move two points toward their targets. Two free points each step
/// halfway (the next pass recomputes targets, so the pair converges);
/// when one is pinned, the free one jumps straight to its target,
/// which the caller computed against the pinned position.
fn pull_together(
    points: &mut Points,
    a: &str,
    b: &str,
    target_a: (f64, f64),
    target_b: (f64, f64),
) {
    let fa = is_fixed(points, a);
    let fb = is_fixed(points, b);
    match (fa, fb) {
        (false, false) => {
            let pa = get(points, a).unwrap_or(target_a);
            let pb = get(points, b).unwrap_or(target_b);
            set_point(points, a, mid(pa, target_a));
            set_point(points, b, mid(pb, target_b));
        }
        (true, false) => set_point(points, b, target_b),
        (false, true) => set_point(points, a, target_a),
        (true, true) => {}
    }
}

fn mid(a: (f64, f64), b: (f64, f64)) -> (f64, f64) {
    ((a.0 + b.0) / 2.0, (a.1 + b.1) / 2.0)
}

fn dist(a: (f64, f64), b: (f64, f64)) -> f64 {
    ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
}

fn normalize2(v: (f64, f64)) -> Option<(f64, f64)> {
    let len = (v.0 * v.0 + v.1 * v.1).sqrt();
    if len < 1e-12 {
        None
    } else {
        Some((v.0 / len, v.1 / len))
    }
}

fn reflect(p: (f64, f64), s: (f64, f64), e: (f64, f64)) -> (f64, f64) {
    let axis = match normalize2((e.0 - s.0, e.1 - s.1)) {
        Some(a) => a,
        None => return p,
    };
    let v = (p.0 - s.0, p.1 - s.1);
    let along = v.0 * axis.0 + v.1 * axis.1;
    let proj = (s.0 + along * axis.0, s.1 + along * axis.1);
    (2.0 * proj.0 - p.0, 2.0 * proj.1 - p.1)
}

fn line_ends(
    entities: &BTreeMap<EntityId, SketchEntity>,
    id: &str,
) -> Option<(EntityId, EntityId)> {
    match entities.get(id) {
        Some(SketchEntity::Line { start, end, .. }) => Some((start.clone(), end.clone())),
        _ => None,
    }
}

fn direction(points: &Points, start: &str, end: &str) -> Option<(f64, f64)> {
    let s = get(points, start)?;
    let e = get(points, end)?;
    normalize2((e.0 - s.0, e.1 - s.1))
}

/// Share y (axis = 1) or x (axis = 0) between two points or a line's
/// endpoints. Returns the residual.
fn align_axis(
    items: &PointsOrLine,
    entities: &BTreeMap<EntityId, SketchEntity>,
    points: &mut Points,
    axis: usize,
) -> f64 {
    let (a, b) = match items {
        PointsOrLine::Points { a, b } => (a.clone(), b.clone()),
        PointsOrLine::Line { line } => match line_ends(entities, line) {
            Some(ends) => ends,
            None => return 0.0,
        },
    };
    let (pa, pb) = match (get(points, &a), get(points, &b)) {
        (Some(pa), Some(pb)) => (pa, pb),
        _ => return 0.0,
    };
    let (va, vb) = if axis == 1 { (pa.1, pb.1) } else { (pa.0, pb.0) };
    let err = (va - vb).abs();
    if err > SOLVE_EPS {
        let shared = match (is_fixed(points, &a), is_fixed(points, &b)) {
            (true, _) => va,
            (_, true) => vb,
            _ => (va + vb) / 2.0,
        };
        let apply = |p: (f64, f64), v: f64| {
            if axis == 1 {
                (p.0, v)
            } else {
                (v, p.1)
            }
        };
        set_point(points, &a, apply(pa, shared));
        set_point(points, &b, apply(pb, shared));
    }
    err
}

fn point_distance(points: &mut Points, a: &str, b: &str, value: f64) -> f64 {
    let (pa, pb) = match (get(points, a), get(points, b)) {
        (Some(pa), Some(pb)) => (pa, pb),
        _ => return 0.0,
    };
    let current = dist(pa, pb);
    let err = (current - value).abs();
    if err <= SOLVE_EPS {
        return err;
    }
    if current > 1e-12 {
        let dir = ((pb.0 - pa.0) / current, (pb.1 - pa.1) / current);
        let target_a = (pb.0 - dir.0 * value, pb.1 - dir.1 * value);
        let target_b = (pa.0 + dir.0 * value, pa.1 + dir.1 * value);
        pull_together(points, a, b, target_a, target_b);
    } else if value > 1e-12 {
        // Coincident points with a positive target: separate along x.
        let target_a = (pa.0 - value / 2.0, pa.1);
        let target_b = (pb.0 + value / 2.0, pb.1);
        pull_together(points, a, b, target_a, target_b);
    }
    err
}

/// Re-aim a line along `dir`, preserving its length. The pivot is the
/// midpoint, or a pinned endpoint when one end is fixed.
fn rotate_line_to(points: &mut Points, start: &str, end: &str, dir: (f64, f64)) {
    let (s, e) = match (get(points, start), get(points, end)) {
        (Some(s), Some(e)) => (s, e),
        _ => return,
    };
    let len = dist(s, e);
    if len < 1e-12 {
        return;
    }
    // Orient the target so the line does not flip end-for-end.
    let current = ((e.0 - s.0) / len, (e.1 - s.1) / len);
    let dir = if current.0 * dir.0 + current.1 * dir.1 < 0.0 {
        (-dir.0, -dir.1)
    } else {
        dir
    };
    match (is_fixed(points, start), is_fixed(points, end)) {
        (false, false) => {
            let m = mid(s, e);
            let half = len / 2.0;
            set_point(points, start, (m.0 - dir.0 * half, m.1 - dir.1 * half));
            set_point(points, end, (m.0 + dir.0 * half, m.1 + dir.1 * half));
        }
        (true, false) => set_point(points, end, (s.0 + dir.0 * len, s.1 + dir.1 * len)),
        (false, true) => set_point(points, start, (e.0 - dir.0 * len, e.1 - dir.1 * len)),
        (true, true) => {}
    }
}

/// Scale a line to `length` about its midpoint (or a pinned endpoint).
fn set_line_length(points: &mut Points, start: &str, end: &str, length: f64) {
    let (s, e) = match (get(points, start), get(points, end)) {
        (Some(s), Some(e)) => (s, e),
        _ => return,
    };
    let current = dist(s, e);
    if current < 1e-12 {
        return;
    }
    let dir = ((e.0 - s.0) / current, (e.1 - s.1) / current);
    match (is_fixed(points, start), is_fixed(points, end)) {
        (false, false) => {
            let m = mid(s, e);
            let half = length / 2.0;
            set_point(points, start, (m.0 - dir.0 * half, m.1 - dir.1 * half));
            set_point(points, end, (m.0 + dir.0 * half, m.1 + dir.1 * half));
        }
        (true, false) => set_point(points, end, (s.0 + dir.0 * length, s.1 + dir.1 * length)),
        (false, true) => set_point(points, start, (e.0 - dir.0 * length, e.1 - dir.1 * length)),
        (true, true) => {}
    }
}

/// Line–arc tangency: the arc center must sit at radius distance from
/// the line. Moves the free side(s) along the line normal.
fn tangent_line_arc(
    entities: &BTreeMap<EntityId, SketchEntity>,
    points: &mut Points,
    line: &str,
    arc: &str,
) -> f64 {
    let (start, end) = match line_ends(entities, line) {
        Some(x) => x,
        None => return 0.0,
    };
    let (center_id, radius) = match entities.get(arc) {
        Some(SketchEntity::Arc { center, start, .. }) => {
            let c = match get(points, center) {
                Some(c) => c,
                None => return 0.0,
            };
            let s = match get(points, start) {
                Some(s) => s,
                None => return 0.0,
            };
            (center.clone(), dist(c, s))
        }
        Some(SketchEntity::Circle { center, radius }) => (center.clone(), *radius),
        _ => return 0.0,
    };
    let (s, e, c) = match (get(points, &start), get(points, &end), get(points, &center_id)) {
        (Some(s), Some(e), Some(c)) => (s, e, c),
        _ => return 0.0,
    };
    let axis = match normalize2((e.0 - s.0, e.1 - s.1)) {
        Some(a) => a,
        None => return 0.0,
    };
    let normal = (-axis.1, axis.0);
    let signed = (c.0 - s.0) * normal.0 + (c.1 - s.1) * normal.1;
    let target = if signed >= 0.0 { radius } else { -radius };
    let shift = target - signed;
    let err = shift.abs();
    if err <= SOLVE_EPS {
        return err;
    }

    let center_free = !is_fixed(points, &center_id);
    let line_free = !is_fixed(points, &start) || !is_fixed(points, &end);
    let (wc, wl) = match (center_free, line_free) {
        (true, true) => (0.5, 0.5),
        (true, false) => (1.0, 0.0),
        (false, true) => (0.0, 1.0),
        (false, false) => return err,
    };
    if wc > 0.0 {
        set_point(
            points,
            &center_id,
            (c.0 + normal.0 * shift * wc, c.1 + normal.1 * shift * wc),
        );
    }
    if wl > 0.0 {
        set_point(
            points,
            &start,
            (s.0 - normal.0 * shift * wl, s.1 - normal.1 * shift * wl),
        );
        set_point(
            points,
            &end,
            (e.0 - normal.0 * shift * wl, e.1 - normal.1 * shift * wl),
        );
    }
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use anvil_types::{PlaneBasis, SolveOutcome};

    fn sketch() -> SolverSketch {
        SolverSketch::new(PlaneBasis::world_xy())
    }

    #[test]
    fn unconstrained_sketch_solves_trivially() {
        let mut s = sketch();
        s.add_point("p1", 1.0, 2.0, false).unwrap();
        let report = s.solve();
        assert_eq!(report.outcome, SolveOutcome::UnderConstrained);
        assert_eq!(s.get_point("p1"), Some((1.0, 2.0)));
    }

    #[test]
    fn coincident_merges_two_free_points() {
        let mut s = sketch();
        s.add_point("a", 0.0, 0.0, false).unwrap();
        s.add_point("b", 2.0, 2.0, false).unwrap();
        s.add_constraint(
            "c1",
            SketchConstraint::Coincident {
                a: "a".into(),
                b: "b".into(),
            },
        )
        .unwrap();
        let report = s.solve();
        assert!(report.converged());
        let pa = s.get_point("a").unwrap();
        let pb = s.get_point("b").unwrap();
        assert!(dist(pa, pb) < 1e-8);
        assert!(dist(pa, (1.0, 1.0)) < 1e-8);
    }

    #[test]
    fn coincident_respects_fixed_point() {
        let mut s = sketch();
        s.add_point("a", 0.0, 0.0, true).unwrap();
        s.add_point("b", 2.0, 2.0, false).unwrap();
        s.add_constraint(
            "c1",
            SketchConstraint::Coincident {
                a: "a".into(),
                b: "b".into(),
            },
        )
        .unwrap();
        s.solve();
        assert_eq!(s.get_point("a"), Some((0.0, 0.0)));
        assert!(dist(s.get_point("b").unwrap(), (0.0, 0.0)) < 1e-8);
    }

    #[test]
    fn distance_between_points_reaches_target() {
        let mut s = sketch();
        s.add_point("a", 0.0, 0.0, false).unwrap();
        s.add_point("b", 1.0, 0.0, false).unwrap();
        s.add_constraint(
            "c1",
            SketchConstraint::Distance {
                between: PointsOrLine::Points {
                    a: "a".into(),
                    b: "b".into(),
                },
                value: 5.0,
            },
        )
        .unwrap();
        let report = s.solve();
        assert!(report.converged());
        let d = dist(s.get_point("a").unwrap(), s.get_point("b").unwrap());
        assert!((d - 5.0).abs() < 1e-8);
    }

    #[test]
    fn horizontal_line_levels_endpoints() {
        let mut s = sketch();
        s.add_point("a", 0.0, 0.0, false).unwrap();
        s.add_point("b", 3.0, 1.0, false).unwrap();
        s.add_line("l1", "a", "b", false).unwrap();
        s.add_constraint(
            "c1",
            SketchConstraint::Horizontal {
                items: PointsOrLine::Line { line: "l1".into() },
            },
        )
        .unwrap();
        s.solve();
        let pa = s.get_point("a").unwrap();
        let pb = s.get_point("b").unwrap();
        assert!((pa.1 - pb.1).abs() < 1e-9);
    }

    #[test]
    fn perpendicular_lines_end_orthogonal() {
        let mut s = sketch();
        s.add_point("a", 0.0, 0.0, true).unwrap();
        s.add_point("b", 2.0, 0.2, false).unwrap();
        s.add_point("c", 0.1, 1.8, false).unwrap();
        s.add_line("l1", "a", "b", false).unwrap();
        s.add_line("l2", "a", "c", false).unwrap();
        s.add_constraint(
            "c1",
            SketchConstraint::Perpendicular {
                line_a: "l1".into(),
                line_b: "l2".into(),
            },
        )
        .unwrap();
        let report = s.solve();
        assert!(report.converged());
        let b = s.get_point("b").unwrap();
        let c = s.get_point("c").unwrap();
        let dot = b.0 * c.0 + b.1 * c.1;
        assert!(dot.abs() < 1e-7, "dot = {dot}");
    }

    #[test]
    fn inconsistent_fixed_distance_is_over_constrained() {
        // Both endpoints pinned 1 apart, but a distance of 5 demanded.
        let mut s = sketch();
        s.add_point("a", 0.0, 0.0, true).unwrap();
        s.add_point("b", 1.0, 0.0, true).unwrap();
        s.add_line("l1", "a", "b", false).unwrap();
        s.add_constraint(
            "c1",
            SketchConstraint::Distance {
                between: PointsOrLine::Line { line: "l1".into() },
                value: 5.0,
            },
        )
        .unwrap();
        let report = s.solve();
        assert_eq!(report.outcome, SolveOutcome::OverConstrained);
        assert!(report.dof.is_over_constrained);
        // Pinned points did not move.
        assert_eq!(s.get_point("a"), Some((0.0, 0.0)));
        assert_eq!(s.get_point("b"), Some((1.0, 0.0)));
    }

    #[test]
    fn symmetric_points_mirror_across_axis() {
        let mut s = sketch();
        s.add_point("s", 0.0, -5.0, true).unwrap();
        s.add_point("e", 0.0, 5.0, true).unwrap();
        s.add_line("axis", "s", "e", true).unwrap();
        s.add_point("a", -2.0, 1.0, true).unwrap();
        s.add_point("b", 3.0, 1.5, false).unwrap();
        s.add_constraint(
            "c1",
            SketchConstraint::Symmetric {
                a: "a".into(),
                b: "b".into(),
                axis: "axis".into(),
            },
        )
        .unwrap();
        let report = s.solve();
        assert!(report.converged());
        let b = s.get_point("b").unwrap();
        assert!(dist(b, (2.0, 1.0)) < 1e-7);
    }

    #[test]
    fn tangent_line_circle_reaches_radius_distance() {
        let mut s = sketch();
        s.add_point("a", -5.0, 0.0, true).unwrap();
        s.add_point("b", 5.0, 0.0, true).unwrap();
        s.add_line("l1", "a", "b", false).unwrap();
        s.add_point("c", 0.0, 2.5, false).unwrap();
        s.add_circle("k1", "c", 1.0).unwrap();
        s.add_constraint(
            "t1",
            SketchConstraint::Tangent {
                line: "l1".into(),
                arc: "k1".into(),
            },
        )
        .unwrap();
        let report = s.solve();
        assert!(report.converged());
        let c = s.get_point("c").unwrap();
        assert!((c.1 - 1.0).abs() < 1e-8, "center y = {}", c.1);
    }

    #[test]
    fn solve_is_deterministic_across_runs() {
        let build = || {
            let mut s = sketch();
            s.add_point("p1", 0.1, -0.2, false).unwrap();
            s.add_point("p2", 2.2, 0.3, false).unwrap();
            s.add_point("p3", 2.0, 1.8, false).unwrap();
            s.add_line("l1", "p1", "p2", false).unwrap();
            s.add_line("l2", "p2", "p3", false).unwrap();
            s.add_constraint(
                "c1",
                SketchConstraint::Horizontal {
                    items: PointsOrLine::Line { line: "l1".into() },
                },
            )
            .unwrap();
            s.add_constraint(
                "c2",
                SketchConstraint::Perpendicular {
                    line_a: "l1".into(),
                    line_b: "l2".into(),
                },
            )
            .unwrap();
            s.add_constraint(
                "c3",
                SketchConstraint::Distance {
                    between: PointsOrLine::Line { line: "l1".into() },
                    value: 2.0,
                },
            )
            .unwrap();
            s.solve();
            s.positions()
        };
        let first = build();
        let second = build();
        // Bit-identical, not merely close.
        for (id, (x, y)) in &first {
            let (x2, y2) = second[id];
            assert_eq!(x.to_bits(), x2.to_bits(), "{id} x drifted");
            assert_eq!(y.to_bits(), y2.to_bits(), "{id} y drifted");
        }
    }
}
