//! Domain errors for the Recursive Hunter agent.

use thiserror::Error;

/// Domain-level errors that can occur in the targeting feedback loop.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An external collaborator (research, generation, fact-check, drafting) failed
    /// or exceeded its time budget.
    #[error("{provider} provider failed: {message}")]
    ProviderError {
        /// Provider name
        provider: String,
        /// Failure message
        message: String,
    },

    /// Provider output could not be decoded into the expected structure.
    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),

    /// Another writer allocated the strategy version first.
    #[error("Strategy version conflict: attempted v{attempted}, current is {}", .current.map_or_else(|| "none".to_string(), |v| format!("v{v}")))]
    VersionConflict {
        /// Version this writer tried to allocate
        attempted: u32,
        /// Latest version at the time of the conflict
        current: Option<u32>,
    },

    /// No lead with this domain
    #[error("Lead not found: {0}")]
    UnknownLead(String),

    /// No strategy with this version
    #[error("Strategy not found: v{0}")]
    UnknownStrategy(u32),

    /// No strategy has been generated yet
    #[error("No strategy exists yet")]
    NoStrategy,

    /// The strategy has no leads to validate
    #[error("Validation pass for strategy v{version} has no scored leads")]
    EmptyValidationPass {
        /// Strategy that was to be validated
        version: u32,
    },

    /// The store cannot be reached
    #[error("Persistence unavailable: {0}")]
    PersistenceUnavailable(String),

    /// Query failure
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// A stored value could not be decoded
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Input rejected before any write
    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}

/// Result alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;

impl DomainError {
    /// Provider failure tagged with the provider name.
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ProviderError {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Returns true when the caller may re-read state and try again.
    ///
    /// Only strategy version races qualify; provider and decoding failures surface as-is.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::VersionConflict { .. })
    }

    /// True for the unknown-lead, unknown-strategy and no-strategy cases.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::UnknownLead(_) | Self::UnknownStrategy(_) | Self::NoStrategy
        )
    }
}

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                Self::PersistenceUnavailable(err.to_string())
            }
            other => Self::DatabaseError(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}
