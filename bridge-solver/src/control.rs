//! Progress reporting and cooperative cancellation
//!
//! The numeric core never blocks and never spawns; it reports progress
//! through a caller-supplied sink and polls a shared flag between independent
//! units of work (stages, sections, vehicles). A linear solve in flight is
//! always allowed to finish.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, BridgeResult};

/// Shared cancellation flag
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// One progress record. Sequence numbers increase by one per event within an
/// analysis; exactly one event per analysis is terminal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub sequence: u64,
    pub phase: String,
    /// 0..=100
    pub percent: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub terminal: bool,
}

/// Receiver of progress events
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: ProgressEvent);
}

impl<F> ProgressSink for F
where
    F: Fn(ProgressEvent) + Send + Sync,
{
    fn emit(&self, event: ProgressEvent) {
        self(event)
    }
}

/// Sink that drops every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn emit(&self, _event: ProgressEvent) {}
}

/// Progress sink and cancellation flag for one analysis
pub struct AnalysisContext<'a> {
    sink: &'a dyn ProgressSink,
    cancel: CancellationToken,
    sequence: AtomicU64,
}

impl<'a> AnalysisContext<'a> {
    pub fn new(sink: &'a dyn ProgressSink, cancel: CancellationToken) -> Self {
        Self {
            sink,
            cancel,
            sequence: AtomicU64::new(0),
        }
    }

    /// Context that reports nowhere and is never cancelled
    pub fn detached() -> AnalysisContext<'static> {
        AnalysisContext::new(&NullSink, CancellationToken::new())
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    fn next(&self, phase: &str, percent: f64, message: Option<String>, terminal: bool) {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst);
        self.sink.emit(ProgressEvent {
            sequence,
            phase: phase.to_string(),
            percent: percent.clamp(0.0, 100.0),
            message,
            terminal,
        });
    }

    /// Report a non-terminal progress event
    pub fn report(&self, phase: &str, percent: f64, message: Option<String>) {
        self.next(phase, percent, message, false);
    }

    /// Report the single terminal event of the analysis
    pub fn finish(&self, phase: &str, message: Option<String>) {
        self.next(phase, 100.0, message, true);
    }

    /// Fail with `Cancelled` if cancellation was requested
    pub fn checkpoint(&self, phase: &str) -> BridgeResult<()> {
        if self.cancel.is_cancelled() {
            log::info!("Cancellation observed during '{phase}'");
            return Err(BridgeError::Cancelled {
                phase: phase.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_events_are_sequenced() {
        let events = Mutex::new(Vec::new());
        let sink = |e: ProgressEvent| events.lock().unwrap().push(e);
        let ctx = AnalysisContext::new(&sink, CancellationToken::new());
        ctx.report("validate", 0.0, None);
        ctx.report("stages", 150.0, Some("transfer".to_string()));
        ctx.finish("completed", None);

        let events = events.into_inner().unwrap();
        assert_eq!(events.iter().map(|e| e.sequence).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(events[1].percent, 100.0);
        assert_eq!(events.iter().filter(|e| e.terminal).count(), 1);
    }

    #[test]
    fn test_checkpoint_observes_cancellation() {
        let token = CancellationToken::new();
        let ctx = AnalysisContext::new(&NullSink, token.clone());
        assert!(ctx.checkpoint("rating").is_ok());
        token.cancel();
        assert!(matches!(
            ctx.checkpoint("rating"),
            Err(BridgeError::Cancelled { phase }) if phase == "rating"
        ));
    }
}
