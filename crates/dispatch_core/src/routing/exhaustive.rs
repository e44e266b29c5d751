use crate::geo::{distance_km, Coordinate};

use super::nearest::NearestNeighborPlanner;
use super::planner::RoutePlanner;

/// Exact shortest open path by depth-first permutation search.
///
/// Branches are explored in index order and pruned once their partial length
/// reaches the best complete path, so among equal-length optima the
/// lexicographically first order wins. Batches larger than `max_stops` are
/// sequenced by [`NearestNeighborPlanner`] instead.
#[derive(Debug, Clone, Copy)]
pub struct ExhaustivePlanner {
    pub max_stops: usize,
}

impl ExhaustivePlanner {
    pub fn new(max_stops: usize) -> Self {
        Self { max_stops }
    }
}

struct Search<'a> {
    stops: &'a [Coordinate],
    visited: Vec<bool>,
    path: Vec<usize>,
    best_len: f64,
    best: Vec<usize>,
}

impl Search<'_> {
    fn descend(&mut self, current: Coordinate, length: f64) {
        if length >= self.best_len {
            return;
        }
        if self.path.len() == self.stops.len() {
            self.best_len = length;
            self.best = self.path.clone();
            return;
        }
        for i in 0..self.stops.len() {
            if self.visited[i] {
                continue;
            }
            let next = self.stops[i];
            self.visited[i] = true;
            self.path.push(i);
            self.descend(next, length + distance_km(current, next));
            self.path.pop();
            self.visited[i] = false;
        }
    }
}

impl RoutePlanner for ExhaustivePlanner {
    fn sequence(&self, origin: Coordinate, stops: &[Coordinate]) -> Vec<usize> {
        if stops.len() > self.max_stops {
            return NearestNeighborPlanner.sequence(origin, stops);
        }
        let mut search = Search {
            stops,
            visited: vec![false; stops.len()],
            path: Vec::with_capacity(stops.len()),
            best_len: f64::INFINITY,
            best: (0..stops.len()).collect(),
        };
        search.descend(origin, 0.0);
        search.best
    }

    fn name(&self) -> &'static str {
        "exhaustive"
    }
}
