//! KHAZNA — CBE T-Bill auction yield tracker and return calculator
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod calc;
pub mod config;
pub mod dashboard;
pub mod engine;
pub mod extract;
pub mod fetch;
pub mod store;
pub mod types;
