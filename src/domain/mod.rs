//! Domain layer for the Recursive Hunter agent
//!
//! This module contains the core models, error types and the port traits
//! that adapters implement.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DomainError, DomainResult};
