//! Users, projects and tasks as served by the tracker's admin API.

pub mod client;
pub mod models;

pub use client::AdminClient;
pub use models::{Project, Task, TaskStatus, User, filter_users};
