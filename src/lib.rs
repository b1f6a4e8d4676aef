pub mod admin;
pub mod config;
pub mod dashboard;
pub mod errors;
pub mod review;
pub mod ui;
