//! Fabricated "still working" progress while a real review is in flight.
//!
//! The simulator is a cancellable periodic task. Each tick draws a random
//! step and hands it to a caller-supplied callback, which applies it to the
//! key's displayed progress and reports whether simulation should continue.
//! Stopping is cooperative: the cancellation flag is checked at the top of
//! every tick and while sleeping, so at most one in-progress tick can still
//! reach the callback after [`SimulationHandle::stop`].

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::state::ProjectId;

/// Timing and shape of the simulated progress signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulatorConfig {
    /// Shortest delay between two ticks.
    pub tick_min: Duration,
    /// Random extra delay added on top of `tick_min`, drawn from `[0, tick_jitter)`.
    pub tick_jitter: Duration,
    /// Largest step a single tick may add. Steps are drawn from `1..=max_step`.
    pub max_step: u8,
    /// Hard cap for simulated progress; always below 100.
    pub ceiling: u8,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            tick_min: Duration::from_millis(350),
            tick_jitter: Duration::from_millis(120),
            max_step: 3,
            ceiling: 92,
        }
    }
}

impl SimulatorConfig {
    /// Normalise out-of-range values: the ceiling stays below 100 and a tick
    /// always advances by at least one.
    pub fn sanitized(mut self) -> Self {
        self.ceiling = self.ceiling.min(99);
        self.max_step = self.max_step.max(1);
        self
    }

    pub fn next_delay(&self, rng: &mut impl Rng) -> Duration {
        let jitter_ms = self.tick_jitter.as_millis() as u64;
        let extra = if jitter_ms == 0 {
            0
        } else {
            rng.gen_range(0..jitter_ms)
        };
        self.tick_min + Duration::from_millis(extra)
    }

    pub fn next_step(&self, rng: &mut impl Rng) -> u8 {
        rng.gen_range(1..=self.max_step.max(1))
    }

    /// Apply one step to `current`, capped at the ceiling and never lower
    /// than `current`.
    pub fn advance(&self, current: u8, step: u8) -> u8 {
        current.saturating_add(step).min(self.ceiling).max(current)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProgressSimulator {
    config: SimulatorConfig,
}

impl ProgressSimulator {
    pub fn new(config: SimulatorConfig) -> Self {
        Self {
            config: config.sanitized(),
        }
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// Start ticking for `project_id`.
    ///
    /// The first tick fires immediately. `on_tick` receives the drawn step
    /// and returns `false` to end the simulation (e.g. when the caller's
    /// ticket has gone stale). Cancelling `parent` stops the simulation too.
    pub fn start<F>(
        &self,
        project_id: ProjectId,
        parent: &CancellationToken,
        mut on_tick: F,
    ) -> SimulationHandle
    where
        F: FnMut(u8) -> bool + Send + 'static,
    {
        let token = parent.child_token();
        let tick_token = token.clone();
        let config = self.config;

        let join = tokio::spawn(async move {
            let mut rng = StdRng::from_entropy();
            loop {
                if tick_token.is_cancelled() {
                    break;
                }
                let step = config.next_step(&mut rng);
                if !on_tick(step) {
                    break;
                }
                let delay = config.next_delay(&mut rng);
                tokio::select! {
                    _ = tick_token.cancelled() => break,
                    _ = tokio::time::sleep(delay) => {}
                }
            }
            tracing::trace!(target: "review", project_id, "simulation stopped");
        });

        SimulationHandle {
            token,
            join: Some(join),
        }
    }
}

/// Owned handle to a running simulation. Dropping it stops the simulation.
#[derive(Debug)]
pub struct SimulationHandle {
    token: CancellationToken,
    join: Option<JoinHandle<()>>,
}

impl SimulationHandle {
    /// Request the simulation to stop. Idempotent.
    pub fn stop(&self) {
        self.token.cancel();
    }

    #[cfg(test)]
    fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Stop and wait until the ticking task has exited.
    pub async fn stopped(mut self) {
        self.token.cancel();
        if let Some(join) = self.join.take() {
            let _ = join.await;
        }
    }
}

impl Drop for SimulationHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
