//! Progress broadcast port.

use crate::domain::models::EventKind;

/// Best-effort progress sink.
///
/// `publish` must not block and must not fail; a listener that cannot keep up
/// is dropped by the sink, never by the caller.
pub trait EventSink: Send + Sync {
    /// Deliver one event.
    fn publish(&self, kind: EventKind);
}

/// Sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn publish(&self, _kind: EventKind) {}
}
