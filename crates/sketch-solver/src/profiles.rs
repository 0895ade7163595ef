//! Closed-profile extraction from solved sketch geometry.
//!
//! Planar-graph minimal face detection:
//! 1. Standalone circles are closed profiles by themselves.
//! 2. Non-construction lines and arcs become pairs of directed
//!    half-edges; at each vertex the outgoing edges sort by departure
//!    angle.
//! 3. A tightest-turn walk over unused half-edges traces the minimal
//!    faces; the shoelace winding classifies outer loops vs holes, and
//!    the unbounded wrapping face is discarded.
//!
//! Arcs are discretized at a fixed angular step so the polygonization
//! is a pure function of the solved geometry.

use std::collections::{BTreeMap, BTreeSet};

use anvil_types::{EntityId, Profile, ProfileRing, SketchEntity};

use crate::types::SolverSketch;

/// Angular resolution for arc discretization: segments per full turn.
const ARC_SEGMENTS_PER_TURN: f64 = 32.0;

type Pos = (f64, f64);
type Positions = BTreeMap<EntityId, Pos>;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct DirectedEdge {
    from: EntityId,
    to: EntityId,
    entity: EntityId,
}

/// Extract every closed ring from the sketch, already classified by
/// winding. Entities named in `exclude` and construction geometry are
/// ignored.
pub fn extract_rings(
    entities: &BTreeMap<EntityId, SketchEntity>,
    positions: &Positions,
    exclude: &[&str],
) -> Vec<ProfileRing> {
    let excluded: BTreeSet<&str> = exclude.iter().copied().collect();
    let mut rings = Vec::new();

    // Standalone circles.
    for (id, entity) in entities {
        if excluded.contains(id.as_str()) {
            continue;
        }
        if let SketchEntity::Circle { center, radius } = entity {
            if let Some(&c) = positions.get(center) {
                rings.push(ProfileRing::Circle {
                    center: [c.0, c.1],
                    radius: *radius,
                    entity: id.clone(),
                });
            }
        }
    }

    // Directed half-edge graph over lines and arcs.
    let mut edges: Vec<DirectedEdge> = Vec::new();
    for (id, entity) in entities {
        if excluded.contains(id.as_str()) || entity.is_construction() {
            continue;
        }
        let ends = match entity {
            SketchEntity::Line { start, end, .. } => Some((start, end)),
            SketchEntity::Arc { start, end, .. } => Some((start, end)),
            SketchEntity::Circle { .. } => None,
        };
        if let Some((start, end)) = ends {
            edges.push(DirectedEdge {
                from: start.clone(),
                to: end.clone(),
                entity: id.clone(),
            });
            edges.push(DirectedEdge {
                from: end.clone(),
                to: start.clone(),
                entity: id.clone(),
            });
        }
    }

    if edges.is_empty() {
        return rings;
    }

    let mut adjacency: BTreeMap<EntityId, Vec<DirectedEdge>> = BTreeMap::new();
    for edge in &edges {
        adjacency
            .entry(edge.from.clone())
            .or_default()
            .push(edge.clone());
    }
    for (vertex, out_edges) in adjacency.iter_mut() {
        let from = match positions.get(vertex) {
            Some(&p) => p,
            None => continue,
        };
        out_edges.sort_by(|a, b| {
            let angle_a = departure_angle(from, positions, a);
            let angle_b = departure_angle(from, positions, b);
            angle_a
                .partial_cmp(&angle_b)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.cmp(b))
        });
    }

    let mut used: BTreeSet<DirectedEdge> = BTreeSet::new();
    let mut faces: Vec<(Vec<[f64; 2]>, Vec<EntityId>)> = Vec::new();

    for seed in &edges {
        if used.contains(seed) {
            continue;
        }

        let mut ring_points: Vec<[f64; 2]> = Vec::new();
        let mut ring_entities: Vec<EntityId> = Vec::new();
        let mut current = seed.clone();
        let mut closed = false;

        loop {
            if !used.insert(current.clone()) {
                break;
            }
            append_edge_points(&current, entities, positions, &mut ring_points);
            if ring_entities.last() != Some(&current.entity) {
                ring_entities.push(current.entity.clone());
            }

            match next_half_edge(&adjacency, &current, positions) {
                Some(next) => {
                    if next == *seed {
                        closed = true;
                        break;
                    }
                    current = next;
                }
                None => break,
            }
        }

        if closed && ring_points.len() >= 3 {
            faces.push((ring_points, ring_entities));
        }
    }

    // Drop the unbounded face: the clockwise loop with the largest
    // absolute area wraps the whole sketch.
    if faces.len() > 1 {
        let mut drop_index = None;
        let mut max_area = 0.0_f64;
        for (i, (points, _)) in faces.iter().enumerate() {
            let area = shoelace(points);
            if area < 0.0 && area.abs() > max_area {
                max_area = area.abs();
                drop_index = Some(i);
            }
        }
        if let Some(i) = drop_index {
            faces.remove(i);
        }
    } else if faces.len() == 1 {
        // A single closed loop traced clockwise is the same loop seen
        // from its unbounded side; keep it, oriented outward.
    }

    for (mut points, entities) in faces {
        if shoelace(&points) < 0.0 {
            points.reverse();
        }
        rings.push(ProfileRing::Polygon { points, entities });
    }

    rings
}

/// Assemble the sweepable profile: the largest closed ring is the outer
/// boundary, rings contained in it are holes. None when nothing closes.
pub fn to_profile(sketch: &SolverSketch, exclude: &[&str]) -> Option<Profile> {
    let positions = sketch.positions();
    let rings = extract_rings(&sketch.entities, &positions, exclude);
    if rings.is_empty() {
        return None;
    }

    let outer_index = rings
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| {
            a.signed_area()
                .abs()
                .partial_cmp(&b.signed_area().abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|(i, _)| i)?;

    let outer = rings[outer_index].clone();
    let mut ordered = vec![outer.clone()];
    for (i, ring) in rings.into_iter().enumerate() {
        if i == outer_index {
            continue;
        }
        if ring_inside(&ring, &outer) {
            ordered.push(ring);
        }
        // Disjoint sibling regions are not part of this profile.
    }

    Some(Profile {
        plane: sketch.plane,
        rings: ordered,
    })
}

fn representative_point(ring: &ProfileRing) -> [f64; 2] {
    match ring {
        ProfileRing::Polygon { points, .. } => points.first().copied().unwrap_or([0.0, 0.0]),
        ProfileRing::Circle { center, radius, .. } => [center[0] + radius, center[1]],
    }
}

fn ring_inside(inner: &ProfileRing, outer: &ProfileRing) -> bool {
    let probe = match inner {
        ProfileRing::Circle { center, .. } => [center[0], center[1]],
        _ => representative_point(inner),
    };
    match outer {
        ProfileRing::Polygon { points, .. } => point_in_polygon(probe, points),
        ProfileRing::Circle { center, radius, .. } => {
            let dx = probe[0] - center[0];
            let dy = probe[1] - center[1];
            (dx * dx + dy * dy).sqrt() < *radius
        }
    }
}

fn point_in_polygon(p: [f64; 2], polygon: &[[f64; 2]]) -> bool {
    let mut inside = false;
    let n = polygon.len();
    let mut j = n.wrapping_sub(1);
    for i in 0..n {
        let (xi, yi) = (polygon[i][0], polygon[i][1]);
        let (xj, yj) = (polygon[j][0], polygon[j][1]);
        if ((yi > p[1]) != (yj > p[1]))
            && (p[0] < (xj - xi) * (p[1] - yi) / (yj - yi) + xi)
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

fn shoelace(points: &[[f64; 2]]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut area = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        area += points[i][0] * points[j][1] - points[j][0] * points[i][1];
    }
    area / 2.0
}

fn departure_angle(from: Pos, positions: &Positions, edge: &DirectedEdge) -> f64 {
    let to = positions.get(&edge.to).copied().unwrap_or((0.0, 0.0));
    (to.1 - from.1).atan2(to.0 - from.0)
}

/// The tightest-right-turn successor at `current.to`: the outgoing edge
/// with the smallest positive CCW rotation from the arrival direction.
fn next_half_edge(
    adjacency: &BTreeMap<EntityId, Vec<DirectedEdge>>,
    current: &DirectedEdge,
    positions: &Positions,
) -> Option<DirectedEdge> {
    let out_edges = adjacency.get(&current.to)?;
    let vertex = positions.get(&current.to)?;
    let from = positions.get(&current.from)?;
    let incoming = (from.1 - vertex.1).atan2(from.0 - vertex.0);

    let mut best: Option<&DirectedEdge> = None;
    let mut best_delta = f64::MAX;
    for edge in out_edges {
        if edge.to == current.from && edge.entity == current.entity {
            continue;
        }
        let angle = departure_angle(*vertex, positions, edge);
        let mut delta = angle - incoming;
        while delta <= 0.0 {
            delta += std::f64::consts::TAU;
        }
        while delta > std::f64::consts::TAU {
            delta -= std::f64::consts::TAU;
        }
        if delta < best_delta {
            best_delta = delta;
            best = Some(edge);
        }
    }
    best.cloned()
}

/// Append the polyline of one traversed half-edge, excluding its end
/// point (the next edge contributes it).
fn append_edge_points(
    edge: &DirectedEdge,
    entities: &BTreeMap<EntityId, SketchEntity>,
    positions: &Positions,
    out: &mut Vec<[f64; 2]>,
) {
    let from = match positions.get(&edge.from) {
        Some(&p) => p,
        None => return,
    };
    out.push([from.0, from.1]);

    if let Some(SketchEntity::Arc {
        start,
        end,
        center,
        ccw,
    }) = entities.get(&edge.entity)
    {
        let (s, e, c) = match (positions.get(start), positions.get(end), positions.get(center)) {
            (Some(&s), Some(&e), Some(&c)) => (s, e, c),
            _ => return,
        };
        let forward = edge.from == *start;
        let (a0, a1, sweep_ccw) = if forward {
            (angle_of(s, c), angle_of(e, c), *ccw)
        } else {
            (angle_of(e, c), angle_of(s, c), !*ccw)
        };
        let radius = ((s.0 - c.0).powi(2) + (s.1 - c.1).powi(2)).sqrt();
        let sweep = arc_sweep(a0, a1, sweep_ccw);
        let steps = ((sweep.abs() / std::f64::consts::TAU) * ARC_SEGMENTS_PER_TURN)
            .ceil()
            .max(2.0) as usize;
        for i in 1..steps {
            let t = i as f64 / steps as f64;
            let angle = a0 + sweep * t;
            out.push([c.0 + radius * angle.cos(), c.1 + radius * angle.sin()]);
        }
    }
}

fn angle_of(p: Pos, center: Pos) -> f64 {
    (p.1 - center.1).atan2(p.0 - center.0)
}

fn arc_sweep(a0: f64, a1: f64, ccw: bool) -> f64 {
    let mut sweep = a1 - a0;
    if ccw {
        while sweep <= 0.0 {
            sweep += std::f64::consts::TAU;
        }
    } else {
        while sweep >= 0.0 {
            sweep -= std::f64::consts::TAU;
        }
    }
    sweep
}

#[cfg(test)]
mod tests {
    use super::*;
    use anvil_types::PlaneBasis;

    fn rect_sketch() -> SolverSketch {
        let mut s = SolverSketch::new(PlaneBasis::world_xy());
        s.add_point("p1", 0.0, 0.0, false).unwrap();
        s.add_point("p2", 10.0, 0.0, false).unwrap();
        s.add_point("p3", 10.0, 5.0, false).unwrap();
        s.add_point("p4", 0.0, 5.0, false).unwrap();
        s.add_line("l1", "p1", "p2", false).unwrap();
        s.add_line("l2", "p2", "p3", false).unwrap();
        s.add_line("l3", "p3", "p4", false).unwrap();
        s.add_line("l4", "p4", "p1", false).unwrap();
        s
    }

    #[test]
    fn rectangle_yields_one_outer_polygon() {
        let sketch = rect_sketch();
        let profile = sketch.to_profile(&[]).unwrap();
        assert_eq!(profile.rings.len(), 1);
        match &profile.rings[0] {
            ProfileRing::Polygon { points, entities } => {
                assert_eq!(points.len(), 4);
                assert_eq!(entities.len(), 4);
                assert!((shoelace(points) - 50.0).abs() < 1e-9);
            }
            other => panic!("expected polygon, got {other:?}"),
        }
    }

    #[test]
    fn open_chain_yields_no_profile() {
        let mut s = SolverSketch::new(PlaneBasis::world_xy());
        s.add_point("p1", 0.0, 0.0, false).unwrap();
        s.add_point("p2", 1.0, 0.0, false).unwrap();
        s.add_point("p3", 1.0, 1.0, false).unwrap();
        s.add_line("l1", "p1", "p2", false).unwrap();
        s.add_line("l2", "p2", "p3", false).unwrap();
        assert!(s.to_profile(&[]).is_none());
    }

    #[test]
    fn circle_inside_rectangle_becomes_hole() {
        let mut sketch = rect_sketch();
        sketch.add_point("pc", 5.0, 2.5, false).unwrap();
        sketch.add_circle("k1", "pc", 1.0).unwrap();
        let profile = sketch.to_profile(&[]).unwrap();
        assert_eq!(profile.rings.len(), 2);
        assert!(matches!(profile.rings[0], ProfileRing::Polygon { .. }));
        match &profile.rings[1] {
            ProfileRing::Circle { center, radius, .. } => {
                assert_eq!(*center, [5.0, 2.5]);
                assert_eq!(*radius, 1.0);
            }
            other => panic!("expected circle hole, got {other:?}"),
        }
    }

    #[test]
    fn standalone_circle_is_its_own_profile() {
        let mut s = SolverSketch::new(PlaneBasis::world_xy());
        s.add_point("pc", 1.0, 2.0, false).unwrap();
        s.add_circle("k1", "pc", 3.0).unwrap();
        let profile = s.to_profile(&[]).unwrap();
        assert_eq!(profile.rings.len(), 1);
        assert!(matches!(profile.rings[0], ProfileRing::Circle { .. }));
    }

    #[test]
    fn construction_and_excluded_entities_are_skipped() {
        let mut sketch = rect_sketch();
        // A construction diagonal and an excluded axis line.
        sketch.add_line("z_diag", "p1", "p3", true).unwrap();
        sketch.add_point("a1", -1.0, 0.0, false).unwrap();
        sketch.add_point("a2", -1.0, 5.0, false).unwrap();
        sketch.add_line("z_axis", "a1", "a2", false).unwrap();

        let profile = sketch.to_profile(&["z_axis"]).unwrap();
        assert_eq!(profile.rings.len(), 1);
        match &profile.rings[0] {
            ProfileRing::Polygon { entities, .. } => {
                assert!(!entities.contains(&"z_diag".to_string()));
                assert!(!entities.contains(&"z_axis".to_string()));
            }
            other => panic!("expected polygon, got {other:?}"),
        }
    }

    #[test]
    fn arc_edges_are_discretized() {
        // Half-disc: line across the bottom, arc over the top.
        let mut s = SolverSketch::new(PlaneBasis::world_xy());
        s.add_point("p1", -1.0, 0.0, false).unwrap();
        s.add_point("p2", 1.0, 0.0, false).unwrap();
        s.add_point("pc", 0.0, 0.0, false).unwrap();
        s.add_line("l1", "p1", "p2", false).unwrap();
        s.add_arc("a1", "p2", "p1", "pc", true).unwrap();
        let profile = s.to_profile(&[]).unwrap();
        assert_eq!(profile.rings.len(), 1);
        match &profile.rings[0] {
            ProfileRing::Polygon { points, .. } => {
                assert!(points.len() > 6, "arc should contribute samples");
                let area = shoelace(points);
                let half_disc = std::f64::consts::PI / 2.0;
                assert!((area - half_disc).abs() < 0.05, "area = {area}");
            }
            other => panic!("expected polygon, got {other:?}"),
        }
    }
}
