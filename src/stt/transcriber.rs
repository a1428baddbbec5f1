//! Transcription service abstraction.

use crate::error::{AssistError, Result};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// Trait for speech-to-text backends.
///
/// Takes a complete WAV file and returns the recognized text. An empty or
/// whitespace-only result means nothing usable was heard.
pub trait TranscriptionService: Send + Sync {
    fn transcribe(&self, wav_bytes: &[u8]) -> Result<String>;

    /// Name for logging/debugging.
    fn name(&self) -> &'static str {
        "transcription"
    }
}

#[derive(Debug, Clone)]
enum MockOutcome {
    Transcript(String),
    Fail(String),
}

/// Mock transcription service for testing.
///
/// Scripted outcomes are consumed in order, then the fallback repeats.
/// An optional per-call delay simulates recognition latency.
pub struct MockTranscriptionService {
    script: Mutex<VecDeque<MockOutcome>>,
    fallback: MockOutcome,
    delays: Mutex<VecDeque<Duration>>,
    calls: Mutex<Vec<usize>>,
}

impl MockTranscriptionService {
    /// Create a mock that always returns `transcript`.
    pub fn new(transcript: &str) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: MockOutcome::Transcript(transcript.to_string()),
            delays: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock that always fails.
    pub fn failing(message: &str) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: MockOutcome::Fail(message.to_string()),
            delays: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Queue a scripted transcript before the fallback behavior applies.
    pub fn then_transcript(self, transcript: &str) -> Self {
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(MockOutcome::Transcript(transcript.to_string()));
        self
    }

    /// Queue a scripted failure before the fallback behavior applies.
    pub fn then_fail(self, message: &str) -> Self {
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(MockOutcome::Fail(message.to_string()));
        self
    }

    /// Queue a delay applied to the next call, letting tests skew
    /// per-utterance latency. Calls without a queued delay do not sleep.
    pub fn then_delay(self, delay: Duration) -> Self {
        self.delays
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(delay);
        self
    }

    /// Number of completed invocations.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Byte length of the WAV passed to each invocation, in order.
    pub fn recorded_sizes(&self) -> Vec<usize> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl TranscriptionService for MockTranscriptionService {
    fn transcribe(&self, wav_bytes: &[u8]) -> Result<String> {
        let delay = self
            .delays
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }

        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(wav_bytes.len());

        let outcome = self
            .script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());

        match outcome {
            MockOutcome::Transcript(text) => Ok(text),
            MockOutcome::Fail(message) => Err(AssistError::Transcription { message }),
        }
    }

    fn name(&self) -> &'static str {
        "mock-transcription"
    }
}
