//! Recursive Hunter - self-correcting sales targeting agent
//!
//! The hunter turns a product description into a versioned Ideal Customer
//! Profile strategy, classifies leads against it with web evidence, records
//! lessons when leads turn out to be poor fits, and pivots the strategy when
//! too many leads in a pass are disregarded. Market triggers (a competitor
//! outage or price hike) produce drafted outreach for the affected leads.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): models, errors and port traits
//! - **Adapters** (`adapters`): SQLite persistence, HTTP providers, offline and mock providers
//! - **Service Layer** (`services`): mismatch policy, composition, scoring, pivots, triggers
//! - **Application Layer** (`application`): the [`Hunter`] facade
//! - **Infrastructure Layer** (`infrastructure`): configuration, logging, runtime wiring
//! - **CLI Layer** (`cli`): the `hunter` command
//!
//! # Example
//!
//! ```ignore
//! use recursive_hunter::infrastructure::setup::Runtime;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = recursive_hunter::ConfigLoader::load(None)?;
//!     let runtime = Runtime::open(&config).await?;
//!     let submission = runtime.hunter.submit_product("Managed Postgres hosting", None).await?;
//!     println!("now on strategy v{:?}", submission.final_version());
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

pub use application::{Hunter, Submission};
pub use domain::errors::{DomainError, DomainResult};
pub use domain::models::{
    Classification, Config, Lead, Lesson, LessonType, Strategy, TriggerEvent, ValidationReport,
};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{EventBus, MismatchTier, MismatchVerdict};
