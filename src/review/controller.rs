use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use super::backend::ReviewBackend;
use super::registry::ReviewRegistry;
use super::simulator::{ProgressSimulator, SimulatorConfig};
use super::state::{ProjectId, ReviewEvent, ReviewState};
use super::task::ReviewTask;

/// Capacity of the review event channel.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Timing knobs for the review orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewTimings {
    pub simulator: SimulatorConfig,
    /// Pause between merging the real result and committing `completed`.
    pub settle: Duration,
}

impl Default for ReviewTimings {
    fn default() -> Self {
        Self {
            simulator: SimulatorConfig::default(),
            settle: Duration::from_millis(500),
        }
    }
}

/// State shared between the controller and its spawned review tasks.
pub(crate) struct Shared {
    registry: Mutex<ReviewRegistry>,
    pub(crate) backend: Arc<dyn ReviewBackend>,
    pub(crate) simulator: ProgressSimulator,
    pub(crate) settle: Duration,
    events: broadcast::Sender<ReviewEvent>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, ReviewRegistry> {
        // Registry operations never leave it half-updated, so a poisoned lock is still usable.
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` against the registry and publish the state it returns.
    ///
    /// The event is sent while the lock is held so that, per key, events are
    /// observed in the same order as the registry writes. Each published
    /// event bumps the registry revision.
    pub(crate) fn update(
        &self,
        project_id: ProjectId,
        f: impl FnOnce(&mut ReviewRegistry) -> Option<ReviewState>,
    ) -> bool {
        let mut registry = self.lock();
        match f(&mut registry) {
            Some(state) => {
                let revision = registry.next_revision();
                let event = ReviewEvent::new(project_id, state).at_revision(revision);
                let _ = self.events.send(event);
                true
            }
            None => false,
        }
    }
}

/// Public surface of the review orchestrator.
///
/// Cheap to clone; all clones drive the same registry. `start` spawns onto
/// the current tokio runtime, so it must be called from within one.
#[derive(Clone)]
pub struct ReviewController {
    shared: Arc<Shared>,
}

impl ReviewController {
    pub fn new(backend: Arc<dyn ReviewBackend>, timings: ReviewTimings) -> Self {
        let (events, _rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            shared: Arc::new(Shared {
                registry: Mutex::new(ReviewRegistry::new()),
                backend,
                simulator: ProgressSimulator::new(timings.simulator),
                settle: timings.settle,
                events,
            }),
        }
    }

    /// Start a review of `project_id`.
    ///
    /// Fire-and-forget: progress is observed through [`Self::get_state`] or
    /// [`Self::subscribe`]. Starting a key that is already running does
    /// nothing and returns `false`.
    pub fn start(&self, project_id: ProjectId) -> bool {
        let cancel = CancellationToken::new();
        let mut ticket = None;
        self.shared.update(project_id, |registry| {
            ticket = registry.register(project_id, cancel.clone());
            ticket.map(|_| registry.state(project_id))
        });

        let Some(ticket) = ticket else {
            tracing::debug!(target: "review", project_id, "review already running, start ignored");
            return false;
        };

        tracing::info!(target: "review", project_id, ticket = ticket.id(), "review started");
        let task = ReviewTask::new(project_id, ticket, cancel, Arc::clone(&self.shared));
        tokio::spawn(task.run());
        true
    }

    /// Cancel the active review of `project_id`.
    ///
    /// The in-flight request is aborted and the state becomes `cancelled`.
    /// Returns `false` (and leaves the state untouched) if nothing was running.
    pub fn cancel(&self, project_id: ProjectId) -> bool {
        let cancelled = self.shared.update(project_id, |registry| {
            registry
                .cancel(project_id)
                .then(|| registry.state(project_id))
        });
        if cancelled {
            tracing::info!(target: "review", project_id, "review cancelled");
        }
        cancelled
    }

    /// Cancel every active review. Returns how many were cancelled.
    pub fn cancel_all(&self) -> usize {
        let keys = self.shared.lock().active_keys();
        keys.into_iter().filter(|id| self.cancel(*id)).count()
    }

    pub fn get_state(&self, project_id: ProjectId) -> ReviewState {
        self.shared.lock().state(project_id)
    }

    pub fn is_active(&self, project_id: ProjectId) -> bool {
        self.shared.lock().is_active(project_id)
    }

    /// States of every key touched so far, ordered by project id.
    pub fn snapshot(&self) -> BTreeMap<ProjectId, ReviewState> {
        self.shared.lock().snapshot()
    }

    /// [`Self::snapshot`] plus the revision it reflects. Every event with a
    /// higher revision happened after the snapshot was taken.
    pub fn snapshot_with_revision(&self) -> (u64, BTreeMap<ProjectId, ReviewState>) {
        let registry = self.shared.lock();
        (registry.revision(), registry.snapshot())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ReviewEvent> {
        self.shared.events.subscribe()
    }

    /// Wait until `project_id` is no longer running and return its state.
    pub async fn wait_settled(&self, project_id: ProjectId) -> ReviewState {
        let mut rx = self.subscribe();
        loop {
            let state = self.get_state(project_id);
            if !state.is_running() {
                return state;
            }
            match rx.recv().await {
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return self.get_state(project_id),
            }
        }
    }
}
