use crate::geo::Coordinate;

/// Orders the drop-off stops of a batch.
///
/// Implementations return a permutation of `0..stops.len()`: the visiting
/// order of the stops when leaving `origin` (the hub). The path is open; the
/// driver does not return to the hub after the last drop-off.
///
/// # Examples
///
/// ```rust
/// use dispatch_core::geo::Coordinate;
/// use dispatch_core::routing::{NearestNeighborPlanner, RoutePlanner};
///
/// let hub = Coordinate::new(52.52, 13.405);
/// let stops = [Coordinate::new(52.56, 13.405), Coordinate::new(52.53, 13.405)];
/// assert_eq!(NearestNeighborPlanner.sequence(hub, &stops), vec![1, 0]);
/// ```
pub trait RoutePlanner: Send + Sync {
    fn sequence(&self, origin: Coordinate, stops: &[Coordinate]) -> Vec<usize>;

    fn name(&self) -> &'static str;
}

/// Total open-path length in km for a visiting order.
pub fn path_length_km(origin: Coordinate, stops: &[Coordinate], order: &[usize]) -> f64 {
    let mut current = origin;
    let mut total = 0.0;
    for &index in order {
        total += crate::geo::distance_km(current, stops[index]);
        current = stops[index];
    }
    total
}
