//! Data types flowing through the pipeline.

use std::time::{Duration, SystemTime};

/// A question/answer pair emitted once an utterance has been fully processed.
///
/// Events carry the sequence number of the originating utterance and are
/// emitted in non-decreasing sequence order regardless of how long each
/// utterance took to process.
#[derive(Debug, Clone, PartialEq)]
pub struct QaEvent {
    /// Sequence number of the originating utterance.
    pub sequence: u64,
    /// The transcribed question text.
    pub question: String,
    /// The generated answer text.
    pub answer: String,
    /// Wall-clock time at emission.
    pub timestamp: SystemTime,
    /// Elapsed time from utterance finalization to emission.
    pub latency: Duration,
}

impl QaEvent {
    pub fn new(sequence: u64, question: String, answer: String, latency: Duration) -> Self {
        Self {
            sequence,
            question,
            answer,
            timestamp: SystemTime::now(),
            latency,
        }
    }
}
