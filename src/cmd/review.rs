//! Live AI review command — `taskdeck review`.

use anyhow::Result;
use std::sync::Arc;
use tokio::sync::broadcast;

use taskdeck::config::DeckConfig;
use taskdeck::review::{HttpReviewBackend, ProjectId, ReviewController, ReviewPhase};
use taskdeck::ui::{ReviewBoard, UiMode};

pub async fn cmd_review(config: &DeckConfig, project_ids: &[ProjectId], ui: &str) -> Result<()> {
    let mut ids = Vec::with_capacity(project_ids.len());
    for id in project_ids {
        if !ids.contains(id) {
            ids.push(*id);
        }
    }

    let backend = Arc::new(HttpReviewBackend::new(config.api_base()));
    let controller = ReviewController::new(backend, config.timings());
    let board = ReviewBoard::new(UiMode::parse(ui));
    let mut events = controller.subscribe();

    for id in &ids {
        board.track(*id, &controller.get_state(*id));
        controller.start(*id);
    }

    let settled = futures_util::future::join_all(ids.iter().map(|id| controller.wait_settled(*id)));
    tokio::pin!(settled);

    let mut interrupted = false;
    let finals = loop {
        tokio::select! {
            states = &mut settled => break states,
            event = events.recv() => match event {
                Ok(event) => board.handle_event(&event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "review board lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {}
            },
            _ = tokio::signal::ctrl_c(), if !interrupted => {
                interrupted = true;
                let cancelled = controller.cancel_all();
                tracing::info!(cancelled, "interrupted, cancelling reviews");
            }
        }
    };

    while let Ok(event) = events.try_recv() {
        board.handle_event(&event);
    }

    let results: Vec<_> = ids.iter().copied().zip(finals).collect();
    for (id, state) in &results {
        board.track(*id, state);
    }
    board.finish(&results);

    let unfinished = results
        .iter()
        .filter(|(_, state)| state.phase() != ReviewPhase::Completed)
        .count();
    if unfinished > 0 {
        anyhow::bail!("{} of {} reviews did not complete", unfinished, results.len());
    }
    Ok(())
}
