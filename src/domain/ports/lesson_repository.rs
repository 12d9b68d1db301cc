//! Lesson log port.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Lesson, LessonType};

/// Append-only lesson storage.
#[async_trait]
pub trait LessonRepository: Send + Sync {
    /// Append a lesson. Fails with `UnknownLead`/`UnknownStrategy` when the
    /// subject does not exist.
    async fn append(&self, lesson: &Lesson) -> DomainResult<()>;

    /// Append a strategy-level lesson to whichever strategy is current at
    /// the moment of the write. Fails with `NoStrategy` if none exists.
    async fn append_to_current_strategy(
        &self,
        lesson_type: LessonType,
        details: &str,
    ) -> DomainResult<Lesson>;

    /// Every lesson, oldest first.
    async fn all_chronological(&self) -> DomainResult<Vec<Lesson>>;

    /// Lessons attached to a lead, oldest first.
    async fn for_lead(&self, domain: &str) -> DomainResult<Vec<Lesson>>;

    /// Lessons attached to a strategy version, oldest first.
    async fn for_strategy(&self, version: u32) -> DomainResult<Vec<Lesson>>;

    /// Number of stored lessons.
    async fn count(&self) -> DomainResult<u64>;
}
