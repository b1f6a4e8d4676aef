//! One review, from request to terminal state.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use tokio_util::sync::CancellationToken;

use super::backend::ReviewReport;
use super::controller::Shared;
use super::registry::ReviewTicket;
use super::state::{ProjectId, ReviewState};
use crate::errors::ReviewError;

/// Drives a single registered review.
///
/// Owns the review's cancellation token and, while the real call is in
/// flight, its [`SimulationHandle`](super::simulator::SimulationHandle).
/// Every write goes through the registry with this task's ticket, so once
/// the review is cancelled (or otherwise superseded) nothing this task does
/// can change the visible state.
pub(crate) struct ReviewTask {
    project_id: ProjectId,
    ticket: ReviewTicket,
    cancel: CancellationToken,
    shared: Arc<Shared>,
}

impl ReviewTask {
    pub(crate) fn new(
        project_id: ProjectId,
        ticket: ReviewTicket,
        cancel: CancellationToken,
        shared: Arc<Shared>,
    ) -> Self {
        Self {
            project_id,
            ticket,
            cancel,
            shared,
        }
    }

    pub(crate) async fn run(self) {
        let project_id = self.project_id;
        let ticket = self.ticket;

        let tick_shared = Arc::clone(&self.shared);
        let config = *self.shared.simulator.config();
        let simulation = self
            .shared
            .simulator
            .start(project_id, &self.cancel, move |step| {
                tick_shared.update(project_id, |registry| {
                    registry.apply_tick(project_id, ticket, |current| {
                        config.advance(current, step)
                    })
                })
            });

        let call = AssertUnwindSafe(self.shared.backend.review(project_id)).catch_unwind();
        let outcome = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            result = call => Some(result.unwrap_or_else(|payload| Err(panic_error(payload)))),
        };
        simulation.stopped().await;

        match outcome {
            None => {
                tracing::debug!(target: "review", project_id, "in-flight review aborted");
            }
            Some(Ok(report)) => self.complete(report).await,
            Some(Err(err)) => self.fail(err),
        }
    }

    async fn complete(&self, report: ReviewReport) {
        let project_id = self.project_id;
        let ticket = self.ticket;

        let merged = self.shared.update(project_id, |registry| {
            registry.merge_real(project_id, ticket, report.percent)
        });
        if !merged {
            tracing::debug!(target: "review", project_id, "stale result dropped before merge");
            return;
        }

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                tracing::debug!(target: "review", project_id, "cancelled while settling");
                return;
            }
            _ = tokio::time::sleep(self.shared.settle) => {}
        }

        let state = ReviewState::completed(report.percent, report.comment);
        let committed = self.shared.update(project_id, |registry| {
            registry
                .commit(project_id, ticket, state.clone())
                .then_some(state)
        });
        if committed {
            tracing::info!(
                target: "review",
                project_id,
                percent = report.percent,
                "review completed"
            );
        }
    }

    fn fail(&self, err: ReviewError) {
        let project_id = self.project_id;
        let ticket = self.ticket;
        let state = ReviewState::failed(err.to_string());

        let committed = self.shared.update(project_id, |registry| {
            registry
                .commit(project_id, ticket, state.clone())
                .then_some(state)
        });
        if committed {
            tracing::warn!(target: "review", project_id, error = %err, "review failed");
        }
    }
}

/// A panicking backend fails its review instead of leaving the key running.
fn panic_error(payload: Box<dyn Any + Send>) -> ReviewError {
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    ReviewError::Panicked(message)
}
