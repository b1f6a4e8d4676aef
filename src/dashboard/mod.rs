//! Dashboard surface for the review orchestrator.
//!
//! Exposes [`ReviewController`](crate::review::ReviewController) over a small
//! JSON API and pushes every [`ReviewEvent`](crate::review::ReviewEvent) to
//! WebSocket clients. A new socket first receives a snapshot of every touched
//! key, then live events.

pub mod api;
pub mod server;
pub mod ws;

pub use server::{ServerConfig, build_router, start_server};
