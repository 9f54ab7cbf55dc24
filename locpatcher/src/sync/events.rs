//! Worker → UI event stream.
//!
//! The session never touches UI state. It emits [`SyncEvent`]s through an
//! [`EventSink`]; the usual sink is the sending half of an mpsc channel whose
//! receiver lives on the UI thread. Emitting never blocks and a disconnected
//! receiver is ignored, so a UI that stops listening cannot stall a download.

use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};

/// How a status line should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Neutral progress information.
    Info,
    /// Operation finished well.
    Success,
    /// Something needs attention but work continues.
    Warning,
    /// A failure.
    Error,
}

/// Events emitted by a [`SyncSession`](super::SyncSession).
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    /// Short human-readable status line.
    Status { message: String, severity: Severity },

    /// Per-item progress (scan/validate index, or bytes of the current file).
    StepProgress { value: u64, max: u64, label: String },

    /// Whole-operation progress (phase, or bytes across all files).
    ActionProgress { value: u64, max: u64, label: String },

    /// Every path of a freshly fetched patch list, for the tracked-file list.
    ManifestReady(Vec<String>),

    /// Paths reconciled by a clear operation, to drop from the tracked-file list.
    FilesDeleted(Vec<String>),
}

/// Receiver of session events.
pub trait EventSink: Send {
    /// Deliver one event. Must not block.
    fn emit(&self, event: SyncEvent);
}

impl EventSink for Sender<SyncEvent> {
    fn emit(&self, event: SyncEvent) {
        // Receiver gone means nobody is watching; keep working.
        let _ = self.send(event);
    }
}

/// Sink that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: SyncEvent) {}
}

/// Sink that keeps every event in memory.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<SyncEvent>>>,
}

impl RecordingSink {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events seen so far.
    pub fn events(&self) -> Vec<SyncEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: SyncEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn test_channel_sink_delivers() {
        let (tx, rx) = mpsc::channel();
        tx.emit(SyncEvent::ManifestReady(vec!["a".to_string()]));

        assert_eq!(
            rx.try_recv().unwrap(),
            SyncEvent::ManifestReady(vec!["a".to_string()])
        );
    }

    #[test]
    fn test_channel_sink_ignores_disconnected_receiver() {
        let (tx, rx) = mpsc::channel::<SyncEvent>();
        drop(rx);
        tx.emit(SyncEvent::FilesDeleted(vec![]));
    }

    #[test]
    fn test_recording_sink_shares_storage() {
        let sink = RecordingSink::new();
        let clone = sink.clone();
        clone.emit(SyncEvent::Status {
            message: "hi".to_string(),
            severity: Severity::Info,
        });
        assert_eq!(sink.events().len(), 1);
    }
}
