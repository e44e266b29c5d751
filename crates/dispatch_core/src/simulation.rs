//! Caller-owned simulation context.
//!
//! A [`SimulationContext`] owns one world and schedule. Independent runs use
//! independent contexts; nothing is shared between them. The context never
//! owns a timer: hosts call [`SimulationContext::advance_tick`] directly or
//! feed real elapsed time to [`SimulationContext::advance_for_elapsed`].

use std::time::Duration;

use bevy_ecs::prelude::{Schedule, World};
use serde::Serialize;
use tracing::{info, warn};

use crate::clock::SimulationClock;
use crate::ecs::{BatchDispatch, Driver, EntityIndex, OrderId, OrderLifecycle, OrderStatus};
use crate::error::{ConfigError, SimError, SimResult};
use crate::report::{
    batch_views, driver_views, order_views, project_run, tick_report, BatchView, DriverView,
    OrderView, RunReport, Totals,
};
use crate::runner::{is_run_complete, run_next_tick, simulation_schedule};
use crate::scenario::{build_scenario, populate_demand, DemandSummary, ScenarioParams};
use crate::systems::telemetry_snapshot::count_states;
use crate::telemetry::{RejectedAdvance, SimCounts, SimSnapshots, SimTelemetry, TickActivity};

/// Simulated minutes per real second at a speed multiplier of 1.0.
pub const SIM_MINUTES_PER_REAL_SECOND: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RunState {
    /// Configured; demand may or may not be generated yet.
    Initialized,
    Running,
    Paused,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TickReport {
    pub tick: u64,
    pub now: f64,
    /// False when the run was already complete and nothing changed.
    pub advanced: bool,
    pub complete: bool,
    pub activity: TickActivity,
    pub counts: SimCounts,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimStatus {
    pub state: RunState,
    pub tick: u64,
    pub now: f64,
    pub demand: Option<DemandSummary>,
    pub speed_multiplier: f64,
    pub counts: SimCounts,
}

/// Outcome of a manual status advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum StatusAdvance {
    Advanced {
        order_id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    },
    AlreadyDelivered {
        order_id: OrderId,
    },
    /// The order is ready but its batch has no driver yet.
    AwaitingDispatch {
        order_id: OrderId,
        status: OrderStatus,
    },
    UnknownOrder {
        order_id: OrderId,
    },
}

pub struct SimulationContext {
    params: ScenarioParams,
    world: World,
    schedule: Schedule,
    state: RunState,
    demand: Option<DemandSummary>,
    speed_multiplier: f64,
    /// Fractional ticks owed from earlier `advance_for_elapsed` calls.
    tick_carry: f64,
}

impl SimulationContext {
    /// Validate `params` and build a fresh run. Fails before any state
    /// exists when the configuration is rejected.
    pub fn new(params: ScenarioParams) -> SimResult<Self> {
        let mut world = World::new();
        build_scenario(&mut world, &params)?;
        Ok(Self {
            params,
            world,
            schedule: simulation_schedule(),
            state: RunState::Initialized,
            demand: None,
            speed_multiplier: 1.0,
            tick_carry: 0.0,
        })
    }

    /// Replace the configuration and rebuild. On error the current run is kept.
    pub fn initialize(&mut self, params: ScenarioParams) -> SimResult<()> {
        *self = Self::new(params)?;
        Ok(())
    }

    pub fn params(&self) -> &ScenarioParams {
        &self.params
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn speed_multiplier(&self) -> f64 {
        self.speed_multiplier
    }

    /// Generate orders and batches. Calling it again returns the existing
    /// summary without regenerating.
    pub fn generate_demand(&mut self) -> SimResult<DemandSummary> {
        if let Some(summary) = self.demand {
            return Ok(summary);
        }
        let summary = populate_demand(&mut self.world)?;
        self.demand = Some(summary);
        Ok(summary)
    }

    /// Begin (or continue) interactive stepping at `speed_multiplier`.
    /// Generates demand first when needed.
    pub fn start(&mut self, speed_multiplier: f64) -> SimResult<()> {
        if !(speed_multiplier.is_finite() && speed_multiplier > 0.0) {
            return Err(ConfigError::SpeedMultiplier {
                value: speed_multiplier,
            }
            .into());
        }
        self.generate_demand()?;
        self.speed_multiplier = speed_multiplier;
        if self.state != RunState::Completed {
            self.state = RunState::Running;
        }
        info!(speed_multiplier, "simulation started");
        Ok(())
    }

    /// Returns whether the state changed.
    pub fn pause(&mut self) -> bool {
        if self.state == RunState::Running {
            self.state = RunState::Paused;
            true
        } else {
            false
        }
    }

    pub fn resume(&mut self) -> bool {
        if self.state == RunState::Paused {
            self.state = RunState::Running;
            true
        } else {
            false
        }
    }

    /// Discard the current run and rebuild it from the stored configuration.
    pub fn reset(&mut self) -> SimResult<()> {
        let params = self.params.clone();
        *self = Self::new(params)?;
        info!(seed = self.params.seed, "simulation reset");
        Ok(())
    }

    /// Advance exactly one tick regardless of pause state.
    pub fn advance_tick(&mut self) -> SimResult<TickReport> {
        if self.demand.is_none() {
            return Err(SimError::DemandNotGenerated);
        }
        let advanced = run_next_tick(&mut self.world, &mut self.schedule);
        let complete = is_run_complete(&mut self.world);
        if complete && self.state != RunState::Completed {
            self.state = RunState::Completed;
            info!(tick = self.clock().tick(), now = self.clock().now(), "simulation completed");
        }

        let activity = if advanced {
            *self.world.resource::<TickActivity>()
        } else {
            TickActivity::default()
        };
        Ok(TickReport {
            tick: self.clock().tick(),
            now: self.clock().now(),
            advanced,
            complete,
            activity,
            counts: self.counts(),
        })
    }

    /// Convert real elapsed time into ticks at the current speed multiplier
    /// and run them. Fractions of a tick carry over to the next call. Does
    /// nothing unless running.
    pub fn advance_for_elapsed(&mut self, real_elapsed: Duration) -> SimResult<Vec<TickReport>> {
        if self.state != RunState::Running {
            return Ok(Vec::new());
        }
        let sim_minutes =
            real_elapsed.as_secs_f64() * SIM_MINUTES_PER_REAL_SECOND * self.speed_multiplier;
        let owed = sim_minutes / self.params.tick_minutes + self.tick_carry;
        let whole = owed.floor();
        self.tick_carry = owed - whole;

        let mut reports = Vec::new();
        for _ in 0..whole as u64 {
            let report = self.advance_tick()?;
            let complete = report.complete;
            reports.push(report);
            if complete {
                self.tick_carry = 0.0;
                break;
            }
        }
        Ok(reports)
    }

    /// Tick until every order is delivered, then report.
    pub fn run_to_completion(&mut self, max_ticks: usize) -> SimResult<RunReport> {
        self.generate_demand()?;
        for _ in 0..max_ticks {
            if self.advance_tick()?.complete {
                return self.report();
            }
        }
        if is_run_complete(&mut self.world) {
            return self.report();
        }
        Err(SimError::TickBudgetExhausted { max_ticks })
    }

    /// Non-interactive run: plan and settle everything without ticking.
    pub fn full_run(&self) -> SimResult<RunReport> {
        project_run(&self.params)
    }

    /// Move one order exactly one status forward, bypassing time gates.
    /// Delivered or unknown orders, and ready orders whose batch has no
    /// driver yet, are reported and left unchanged.
    pub fn advance_order_status(&mut self, order_id: OrderId) -> StatusAdvance {
        let clock = self.clock();
        let (entity, batch_entity) = self
            .world
            .get_resource::<EntityIndex>()
            .map(|index| {
                let entity = index.orders.get(&order_id).copied();
                let batch = entity
                    .and_then(|e| self.world.get::<OrderLifecycle>(e))
                    .and_then(|lifecycle| lifecycle.batch_id)
                    .and_then(|batch_id| index.batches.get(&batch_id).copied());
                (entity, batch)
            })
            .unwrap_or((None, None));
        let dispatched = batch_entity
            .and_then(|e| self.world.get::<BatchDispatch>(e))
            .is_some_and(|dispatch| dispatch.assignment.is_some());

        let outcome = match entity.and_then(|e| self.world.get_mut::<OrderLifecycle>(e)) {
            None => StatusAdvance::UnknownOrder { order_id },
            Some(lifecycle) if lifecycle.status == OrderStatus::Ready && !dispatched => {
                StatusAdvance::AwaitingDispatch {
                    order_id,
                    status: lifecycle.status,
                }
            }
            Some(mut lifecycle) => {
                let from = lifecycle.status;
                match lifecycle.advance(clock.now(), clock.tick()) {
                    Some(to) => StatusAdvance::Advanced { order_id, from, to },
                    None => StatusAdvance::AlreadyDelivered { order_id },
                }
            }
        };

        match outcome {
            StatusAdvance::Advanced { .. } => {}
            StatusAdvance::AlreadyDelivered { .. }
            | StatusAdvance::AwaitingDispatch { .. }
            | StatusAdvance::UnknownOrder { .. } => {
                warn!(order = order_id.0, ?outcome, "status advance rejected");
                let status = match outcome {
                    StatusAdvance::AlreadyDelivered { .. } => Some(OrderStatus::Delivered),
                    StatusAdvance::AwaitingDispatch { status, .. } => Some(status),
                    _ => None,
                };
                if let Some(mut telemetry) = self.world.get_resource_mut::<SimTelemetry>() {
                    telemetry.rejected_advances.push(RejectedAdvance {
                        order_id,
                        status,
                        at: clock.now(),
                    });
                }
            }
        }
        outcome
    }

    pub fn status(&mut self) -> SimStatus {
        let clock = self.clock();
        SimStatus {
            state: self.state,
            tick: clock.tick(),
            now: clock.now(),
            demand: self.demand,
            speed_multiplier: self.speed_multiplier,
            counts: self.counts(),
        }
    }

    pub fn orders(&mut self) -> Vec<OrderView> {
        order_views(&mut self.world)
    }

    pub fn drivers(&mut self) -> Vec<DriverView> {
        driver_views(&mut self.world)
    }

    pub fn batches(&mut self) -> Vec<BatchView> {
        batch_views(&mut self.world)
    }

    pub fn totals(&mut self) -> SimResult<Totals> {
        Ok(self.report()?.totals)
    }

    pub fn report(&mut self) -> SimResult<RunReport> {
        tick_report(&mut self.world)
    }

    pub fn snapshots(&self) -> Option<&SimSnapshots> {
        self.world.get_resource::<SimSnapshots>()
    }

    pub fn telemetry(&self) -> Option<&SimTelemetry> {
        self.world.get_resource::<SimTelemetry>()
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    fn clock(&self) -> SimulationClock {
        self.world
            .get_resource::<SimulationClock>()
            .copied()
            .unwrap_or_default()
    }

    fn counts(&mut self) -> SimCounts {
        let now = self.clock().now();
        let orders: Vec<OrderStatus> = self
            .world
            .query::<&OrderLifecycle>()
            .iter(&self.world)
            .map(|lifecycle| lifecycle.status)
            .collect();
        let drivers: Vec<_> = self
            .world
            .query::<&Driver>()
            .iter(&self.world)
            .map(|driver| driver.state_at(now))
            .collect();
        let mut batches = self.world.query::<&BatchDispatch>();
        count_states(orders, drivers, batches.iter(&self.world))
    }
}
