//! Domain models.

pub mod config;
pub mod event;
pub mod evidence;
pub mod lead;
pub mod lesson;
pub mod research;
pub mod strategy;
pub mod tech_stack;
pub mod trigger;
pub mod validation;

pub use config::{
    Config, DatabaseConfig, GenerationConfig, LoggingConfig, ProviderMode, ProvidersConfig,
    RetryConfig, SearchConfig, ValidationConfig,
};
pub use event::{EventKind, HunterEvent};
pub use evidence::{Evidence, EvidenceSource, FactCheck};
pub use lead::{validate_score, Classification, Lead, LeadOutcome, NewLead};
pub use lesson::{Lesson, LessonSubject, LessonType};
pub use research::{CompetitorInsight, MarketResearch};
pub use strategy::{preview, ComposeMode, Strategy, StrategyDraft};
pub use tech_stack::{TechStack, DATABASE_TECHNOLOGIES, TECH_VOCABULARY};
pub use trigger::{OutreachDraft, OutreachEmail, TriggerEvent, TriggerOutcome};
pub use validation::{round_rate, LeadValidationResult, LeadVerdict, PivotDecision, ValidationReport};
