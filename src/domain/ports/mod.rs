//! Port trait definitions (Hexagonal Architecture)
//!
//! This module defines the interfaces adapters must implement:
//! - StrategyRepository: versioned strategy lineage
//! - LeadRepository: leads, scores, classifications and evidence links
//! - LessonRepository: append-only lesson log
//! - ResearchProvider / GenerationProvider / EvidenceProvider / OutreachDrafter:
//!   external collaborators
//! - EventSink: best-effort progress broadcast

pub mod event_sink;
pub mod lead_repository;
pub mod lesson_repository;
pub mod providers;
pub mod strategy_repository;

pub use event_sink::{EventSink, NullEventSink};
pub use lead_repository::LeadRepository;
pub use lesson_repository::LessonRepository;
pub use providers::{EvidenceProvider, GenerationProvider, OutreachDrafter, ResearchProvider};
pub use strategy_repository::StrategyRepository;
