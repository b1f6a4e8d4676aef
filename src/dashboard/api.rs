use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use crate::review::{ProjectId, ReviewController, ReviewState};

// ── Shared application state ──────────────────────────────────────────

pub struct AppState {
    pub controller: ReviewController,
}

pub type SharedState = Arc<AppState>;

// ── Response payload types ────────────────────────────────────────────

/// One row of the review snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectReview {
    pub project_id: ProjectId,
    pub state: ReviewState,
}

pub fn snapshot_rows(controller: &ReviewController) -> Vec<ProjectReview> {
    to_rows(controller.snapshot())
}

pub fn to_rows(snapshot: BTreeMap<ProjectId, ReviewState>) -> Vec<ProjectReview> {
    snapshot
        .into_iter()
        .map(|(project_id, state)| ProjectReview { project_id, state })
        .collect()
}

// ── Router ────────────────────────────────────────────────────────────

pub fn api_router() -> Router<SharedState> {
    Router::new()
        .route("/api/reviews", get(list_reviews))
        .route("/api/reviews/{id}", get(get_review).post(start_review))
        .route("/api/reviews/{id}/cancel", post(cancel_review))
        .route("/health", get(health_check))
}

// ── Handlers ──────────────────────────────────────────────────────────

async fn health_check() -> &'static str {
    "ok"
}

async fn list_reviews(State(state): State<SharedState>) -> impl IntoResponse {
    Json(snapshot_rows(&state.controller))
}

async fn get_review(
    State(state): State<SharedState>,
    Path(id): Path<ProjectId>,
) -> impl IntoResponse {
    Json(state.controller.get_state(id))
}

/// 202 when a review was launched, 200 when one was already running.
async fn start_review(
    State(state): State<SharedState>,
    Path(id): Path<ProjectId>,
) -> impl IntoResponse {
    let status = if state.controller.start(id) {
        StatusCode::ACCEPTED
    } else {
        StatusCode::OK
    };
    (status, Json(state.controller.get_state(id)))
}

async fn cancel_review(
    State(state): State<SharedState>,
    Path(id): Path<ProjectId>,
) -> impl IntoResponse {
    state.controller.cancel(id);
    Json(state.controller.get_state(id))
}
