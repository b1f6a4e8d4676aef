//! CLI command implementations.
//!
//! | Module   | Commands handled        |
//! |----------|-------------------------|
//! | `users`  | `Users`, `SetStatus`    |
//! | `review` | `Review`                |
//! | `serve`  | `Serve`                 |
//! | `config` | `Config`                |

pub mod config;
pub mod review;
pub mod serve;
pub mod users;

pub use config::cmd_config;
pub use review::cmd_review;
pub use serve::cmd_serve;
pub use users::{cmd_set_status, cmd_users};
