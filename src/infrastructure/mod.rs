//! Infrastructure layer module
//!
//! - Configuration loading (figment)
//! - Logging setup (tracing-subscriber, tracing-appender)
//! - Project initialization and runtime wiring

pub mod config;
pub mod logging;
pub mod setup;
