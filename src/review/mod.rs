//! AI review orchestration — live progress for per-project reviews.
//!
//! ## Overview
//!
//! A review is a long server-side operation that eventually returns a
//! completion percentage and a comment. While it is in flight the operator
//! sees a simulated progress bar that creeps forward; when the real answer
//! arrives the bar is reconciled with it and, after a short settle delay,
//! the final result is committed. Reviews can be cancelled at any point and
//! any number of projects can be reviewed at once.
//!
//! ## Module Map
//!
//! ```text
//! ┌──────────────┐ start/cancel ┌────────────────────────────────────────────┐
//! │ presentation │ ───────────> │  controller.rs  (ReviewController)         │
//! │ (CLI board,  │ <─────────── │     │  owns Mutex<ReviewRegistry>          │
//! │  dashboard)  │  ReviewEvent │     │  broadcasts ReviewEvent              │
//! └──────────────┘              │     │ tokio::spawn(ReviewTask::run)        │
//!                               │     v                                      │
//!                               │  task.rs  (ReviewTask)                     │
//!                               │     ├─ simulator.rs  (SimulationHandle)    │
//!                               │     └─ backend.rs    (ReviewBackend)       │
//!                               └────────────────────────────────────────────┘
//! ```
//!
//! | Module       | Responsibility                                              |
//! |--------------|-------------------------------------------------------------|
//! | `state`      | `ReviewState`, `ReviewPhase`, `ReviewEvent`                 |
//! | `registry`   | key → state and key → in-flight ticket, staleness checks    |
//! | `simulator`  | cancellable periodic task producing capped random steps     |
//! | `task`       | one review: simulate, call, merge, settle, commit           |
//! | `backend`    | `ReviewBackend` trait, HTTP implementation, response parsing|
//! | `controller` | public `start` / `cancel` / `get_state` surface             |
//!
//! ## Lifecycle of one key
//!
//! `idle → running → completed | failed | cancelled`. A terminal state
//! stays visible until the key is started again. Only the holder of the
//! current [`ReviewTicket`] may write a key's state; cancelling removes the
//! ticket, so anything still in flight for the old review is ignored.

pub mod backend;
pub mod controller;
pub mod registry;
pub mod simulator;
pub mod state;
mod task;

pub use backend::{HttpReviewBackend, NO_DATA_COMMENT, ReviewBackend, ReviewReport};
pub use controller::{ReviewController, ReviewTimings};
pub use registry::{ReviewRegistry, ReviewTicket};
pub use simulator::{ProgressSimulator, SimulationHandle, SimulatorConfig};
pub use state::{
    CANCELLED_MESSAGE, FALLBACK_ERROR_MESSAGE, ProjectId, ReviewEvent, ReviewPhase, ReviewState,
};
