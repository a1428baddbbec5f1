//! Event sinks: presentation surface and history consumers.

use crate::error::Result;
use crate::pipeline::error::StationError;
use crate::pipeline::station::Station;
use crate::pipeline::types::QaEvent;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Surface that displays the answer half of each event.
pub trait PresentationSink: Send + 'static {
    fn show(&mut self, text: &str) -> Result<()>;

    fn hide(&mut self) -> Result<()>;

    /// Name for logging/debugging.
    fn name(&self) -> &'static str {
        "presentation"
    }
}

/// Consumer of full events for persistence or analytics.
pub trait HistorySink: Send + 'static {
    fn record(&mut self, event: &QaEvent) -> Result<()>;

    /// Name for logging/debugging.
    fn name(&self) -> &'static str {
        "history"
    }
}

/// Presentation sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullPresentation;

impl PresentationSink for NullPresentation {
    fn show(&mut self, _text: &str) -> Result<()> {
        Ok(())
    }

    fn hide(&mut self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "null-presentation"
    }
}

/// History sink that accumulates events behind a shared handle, for tests
/// and in-memory history views.
#[derive(Default)]
pub struct CollectorSink {
    events: Arc<Mutex<Vec<QaEvent>>>,
}

impl CollectorSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle that stays valid after the sink moves into the pipeline.
    pub fn events_handle(&self) -> Arc<Mutex<Vec<QaEvent>>> {
        self.events.clone()
    }
}

impl HistorySink for CollectorSink {
    fn record(&mut self, event: &QaEvent) -> Result<()> {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "collector"
    }
}

/// Terminal station fanning each event out to the presentation and history
/// sinks.
pub struct SinkStation {
    presentation: Box<dyn PresentationSink>,
    history: Box<dyn HistorySink>,
    emitted: Arc<AtomicU64>,
}

impl SinkStation {
    pub fn new(
        presentation: Box<dyn PresentationSink>,
        history: Box<dyn HistorySink>,
        emitted: Arc<AtomicU64>,
    ) -> Self {
        Self {
            presentation,
            history,
            emitted,
        }
    }
}

impl Station for SinkStation {
    type Input = QaEvent;
    type Output = ();

    fn name(&self) -> &'static str {
        "sink"
    }

    fn process(&mut self, event: QaEvent) -> std::result::Result<Option<()>, StationError> {
        let mut failure = None;

        if let Err(e) = self.presentation.show(&event.answer) {
            failure = Some(format!("presentation failed: {}", e));
        }
        if let Err(e) = self.history.record(&event) {
            failure.get_or_insert(format!("history failed: {}", e));
        }

        // The event counts as emitted even if a sink misbehaved.
        self.emitted.fetch_add(1, Ordering::SeqCst);

        match failure {
            Some(msg) => Err(StationError::Recoverable(msg)),
            None => Ok(None),
        }
    }

    fn shutdown(&mut self) {
        if let Err(e) = self.presentation.hide() {
            eprintln!("[sink] failed to hide presentation: {}", e);
        }
    }
}
