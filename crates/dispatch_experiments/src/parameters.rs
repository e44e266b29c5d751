//! Parameter variation for sweeps: grid search and random sampling.

use std::collections::HashSet;

use dispatch_core::scenario::{RoutingStrategy, ScenarioParams};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;
use tracing::warn;

/// One point of the space: the swept values only.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ParameterCombination {
    seed: u64,
    driver_count: usize,
    clustering_radius_km: f64,
    order_count: usize,
    routing_strategy: RoutingStrategy,
}

impl ParameterCombination {
    /// Hashable identity; radii compare by bit pattern.
    fn key(&self) -> (u64, usize, u64, usize, RoutingStrategy) {
        (
            self.seed,
            self.driver_count,
            self.clustering_radius_km.to_bits(),
            self.order_count,
            self.routing_strategy,
        )
    }

    fn apply(&self, base: &ScenarioParams) -> ScenarioParams {
        base.clone()
            .with_seed(self.seed)
            .with_driver_count(self.driver_count)
            .with_clustering_radius_km(self.clustering_radius_km)
            .with_order_count(self.order_count)
            .with_routing_strategy(self.routing_strategy)
    }
}

/// A single run configuration with its sweep metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterSet {
    pub params: ScenarioParams,
    pub experiment_id: String,
    /// Position in the generated sweep.
    pub run_id: usize,
}

impl ParameterSet {
    pub fn new(params: ScenarioParams, experiment_id: impl Into<String>, run_id: usize) -> Self {
        Self {
            params,
            experiment_id: experiment_id.into(),
            run_id,
        }
    }

    pub fn seed(&self) -> u64 {
        self.params.seed
    }
}

/// Values to explore per dimension. An empty dimension uses the base value.
#[derive(Debug, Clone)]
pub struct ParameterSpace {
    base: ScenarioParams,
    experiment_id: String,
    seeds: Vec<u64>,
    driver_counts: Vec<usize>,
    clustering_radii_km: Vec<f64>,
    order_counts: Vec<usize>,
    routing_strategies: Vec<RoutingStrategy>,
}

impl Default for ParameterSpace {
    fn default() -> Self {
        Self::new(ScenarioParams::default())
    }
}

impl ParameterSpace {
    pub fn new(base: ScenarioParams) -> Self {
        Self {
            base,
            experiment_id: "sweep".to_string(),
            seeds: Vec::new(),
            driver_counts: Vec::new(),
            clustering_radii_km: Vec::new(),
            order_counts: Vec::new(),
            routing_strategies: Vec::new(),
        }
    }

    /// Grid over default base parameters.
    pub fn grid() -> Self {
        Self::default()
    }

    pub fn with_base(mut self, base: ScenarioParams) -> Self {
        self.base = base;
        self
    }

    pub fn experiment_id(mut self, id: impl Into<String>) -> Self {
        self.experiment_id = id.into();
        self
    }

    pub fn seeds(mut self, seeds: Vec<u64>) -> Self {
        self.seeds = seeds;
        self
    }

    pub fn driver_counts(mut self, counts: Vec<usize>) -> Self {
        self.driver_counts = counts;
        self
    }

    pub fn clustering_radii_km(mut self, radii: Vec<f64>) -> Self {
        self.clustering_radii_km = radii;
        self
    }

    pub fn order_counts(mut self, counts: Vec<usize>) -> Self {
        self.order_counts = counts;
        self
    }

    pub fn routing_strategies(mut self, strategies: Vec<RoutingStrategy>) -> Self {
        self.routing_strategies = strategies;
        self
    }

    fn seeds_or_base(&self) -> Vec<u64> {
        or_base(&self.seeds, self.base.seed)
    }

    fn driver_counts_or_base(&self) -> Vec<usize> {
        or_base(&self.driver_counts, self.base.driver_count)
    }

    fn radii_or_base(&self) -> Vec<f64> {
        or_base(&self.clustering_radii_km, self.base.clustering_radius_km)
    }

    fn order_counts_or_base(&self) -> Vec<usize> {
        or_base(&self.order_counts, self.base.order_count)
    }

    fn strategies_or_base(&self) -> Vec<RoutingStrategy> {
        or_base(&self.routing_strategies, self.base.routing_strategy)
    }

    /// Number of grid points before invalid combinations are dropped.
    pub fn grid_size(&self) -> usize {
        self.seeds_or_base().len()
            * self.driver_counts_or_base().len()
            * self.radii_or_base().len()
            * self.order_counts_or_base().len()
            * self.strategies_or_base().len()
    }

    fn combinations(&self) -> Vec<ParameterCombination> {
        let mut out = Vec::with_capacity(self.grid_size());
        for seed in self.seeds_or_base() {
            for driver_count in self.driver_counts_or_base() {
                for clustering_radius_km in self.radii_or_base() {
                    for order_count in self.order_counts_or_base() {
                        for routing_strategy in self.strategies_or_base() {
                            out.push(ParameterCombination {
                                seed,
                                driver_count,
                                clustering_radius_km,
                                order_count,
                                routing_strategy,
                            });
                        }
                    }
                }
            }
        }
        out
    }

    /// Full Cartesian product in dimension order (seed outermost). Sets that
    /// fail validation are dropped with a warning.
    pub fn generate(&self) -> Vec<ParameterSet> {
        self.into_sets(self.combinations())
    }

    /// `count` distinct grid points drawn uniformly at random. Returns fewer
    /// when the grid is smaller than `count`.
    pub fn sample_random(&self, count: usize, seed: u64) -> Vec<ParameterSet> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut combinations = self.combinations();
        combinations.shuffle(&mut rng);

        let mut seen = HashSet::new();
        let picked: Vec<ParameterCombination> = combinations
            .into_iter()
            .filter(|combination| seen.insert(combination.key()))
            .take(count)
            .collect();
        self.into_sets(picked)
    }

    fn into_sets(&self, combinations: Vec<ParameterCombination>) -> Vec<ParameterSet> {
        combinations
            .into_iter()
            .map(|combination| combination.apply(&self.base))
            .filter(|params| match params.validate() {
                Ok(()) => true,
                Err(err) => {
                    warn!(error = %err, seed = params.seed, "skipping invalid parameter set");
                    false
                }
            })
            .enumerate()
            .map(|(run_id, params)| ParameterSet::new(params, self.experiment_id.clone(), run_id))
            .collect()
    }
}

fn or_base<T: Clone>(values: &[T], base: T) -> Vec<T> {
    if values.is_empty() {
        vec![base]
    } else {
        values.to_vec()
    }
}
