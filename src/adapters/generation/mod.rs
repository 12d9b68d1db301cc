//! Generation provider adapters.

pub mod envelope;
pub mod pioneer;

pub use envelope::GenerationEnvelope;
pub use pioneer::PioneerClient;
