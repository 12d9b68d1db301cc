//! Service layer: the strategy, validation, pivot and trigger pipelines.

pub mod event_bus;
pub mod lead_scorer;
pub mod mismatch_policy;
pub mod outreach_drafter;
pub mod pivot_controller;
pub mod provider_guard;
pub mod response_decoder;
pub mod strategy_composer;
pub mod strategy_service;
pub mod trigger_pivot;
pub mod validation_service;

pub use event_bus::{EventBus, EventBusConfig};
pub use lead_scorer::LeadScorer;
pub use mismatch_policy::{MismatchTier, MismatchVerdict};
pub use outreach_drafter::GenerativeOutreachDrafter;
pub use pivot_controller::PivotController;
pub use strategy_composer::StrategyComposer;
pub use strategy_service::{StrategyGeneration, StrategyService};
pub use trigger_pivot::TriggerPivotDrafter;
pub use validation_service::ValidationService;
