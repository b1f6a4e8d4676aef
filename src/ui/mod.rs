pub mod board;
pub mod icons;

pub use board::{ReviewBoard, UiMode, status_line};
