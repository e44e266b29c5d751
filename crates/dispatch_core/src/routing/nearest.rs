use crate::geo::{distance_km, Coordinate};

use super::planner::RoutePlanner;

/// Greedy nearest-neighbor sequencing.
///
/// From the current position, always visit the closest unvisited stop. Ties
/// go to the stop listed first. O(n²) in the number of stops.
#[derive(Debug, Default, Clone, Copy)]
pub struct NearestNeighborPlanner;

impl RoutePlanner for NearestNeighborPlanner {
    fn sequence(&self, origin: Coordinate, stops: &[Coordinate]) -> Vec<usize> {
        let mut visited = vec![false; stops.len()];
        let mut order = Vec::with_capacity(stops.len());
        let mut current = origin;

        for _ in 0..stops.len() {
            let mut best: Option<(usize, f64)> = None;
            for (i, stop) in stops.iter().enumerate() {
                if visited[i] {
                    continue;
                }
                let d = distance_km(current, *stop);
                if best.map_or(true, |(_, best_d)| d < best_d) {
                    best = Some((i, d));
                }
            }
            let Some((next, _)) = best else { break };
            visited[next] = true;
            order.push(next);
            current = stops[next];
        }
        order
    }

    fn name(&self) -> &'static str {
        "nearest_neighbor"
    }
}
