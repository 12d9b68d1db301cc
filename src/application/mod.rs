//! Application layer: the Hunter facade over the services.

pub mod hunter;

pub use hunter::{Hunter, ImportSummary, LeadDetail, Submission, SubmissionRound};
