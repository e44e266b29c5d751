use bevy_ecs::prelude::Resource;

/// Discrete simulation clock. Time is `tick * tick_minutes` simulated minutes.
#[derive(Debug, Clone, Copy, PartialEq, Resource)]
pub struct SimulationClock {
    tick: u64,
    tick_minutes: f64,
}

impl Default for SimulationClock {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl SimulationClock {
    pub fn new(tick_minutes: f64) -> Self {
        Self {
            tick: 0,
            tick_minutes,
        }
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn tick_minutes(&self) -> f64 {
        self.tick_minutes
    }

    /// Elapsed simulated minutes.
    pub fn now(&self) -> f64 {
        self.tick as f64 * self.tick_minutes
    }

    pub fn advance(&mut self) -> f64 {
        self.tick += 1;
        self.now()
    }

    /// Time of the first tick (tick 1 or later) whose `now` is at or after
    /// `at`. Uses the same arithmetic as [`SimulationClock::now`], so
    /// `now >= at` holds from exactly this tick in a ticking run.
    pub fn first_tick_at_or_after(tick_minutes: f64, at: f64) -> f64 {
        let time = |tick: u64| tick as f64 * tick_minutes;
        let mut tick = (at / tick_minutes).ceil().max(1.0) as u64;
        while time(tick) < at {
            tick += 1;
        }
        while tick > 1 && time(tick - 1) >= at {
            tick -= 1;
        }
        time(tick)
    }
}
