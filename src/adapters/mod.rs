//! Infrastructure adapters for external systems.

pub mod generation;
pub mod http;
pub mod mock;
pub mod offline;
pub mod search;
pub mod sqlite;
