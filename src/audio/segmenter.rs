//! Voice-activity-based utterance segmentation.
//!
//! Classifies incoming PCM frames as voiced or silent from mean absolute
//! amplitude, buffers voiced spans, and finalizes an [`Utterance`] once
//! silence has lasted long enough. State machine: Idle → Voiced →
//! Silent(grace) → flush → Idle.

use crate::defaults;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Trait for time operations, allowing mock time in tests.
pub trait Clock: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> Instant;
}

/// Real system clock using `std::time::Instant::now()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Mock clock that allows manual time advancement in tests.
#[derive(Debug, Clone)]
pub struct MockClock {
    current: Arc<std::sync::Mutex<Instant>>,
}

impl MockClock {
    /// Creates a new mock clock starting at the current instant.
    pub fn new() -> Self {
        Self {
            current: Arc::new(std::sync::Mutex::new(Instant::now())),
        }
    }

    /// Advances the mock clock by the given duration.
    pub fn advance(&self, duration: std::time::Duration) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        *current += duration;
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn now(&self) -> Instant {
        *self.current.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Configuration for the utterance segmenter.
#[derive(Debug, Clone, Copy)]
pub struct SegmenterConfig {
    /// Normalized mean-amplitude threshold for detecting speech (0.0 to 1.0).
    pub vad_threshold: f32,
    /// Duration of silence before an utterance is finalized (milliseconds).
    pub silence_duration_ms: u32,
    /// Hard cap on buffered audio; reaching it flushes regardless of voice
    /// state.
    pub max_utterance_secs: u32,
    /// Sample rate in Hz, used to convert the cap to a sample count.
    pub sample_rate: u32,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            vad_threshold: defaults::VAD_THRESHOLD,
            silence_duration_ms: defaults::SILENCE_DURATION_MS,
            max_utterance_secs: defaults::MAX_UTTERANCE_SECS,
            sample_rate: defaults::SAMPLE_RATE,
        }
    }
}

/// Current state of the segmenter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmenterState {
    /// No speech buffered.
    Idle,
    /// Speech is being buffered.
    Voiced,
    /// Speech buffered, waiting out the silence grace window.
    Silent,
}

/// A contiguous span of voiced audio bounded by silence — the unit of
/// transcription, classification and answering.
#[derive(Debug, Clone)]
pub struct Utterance {
    /// Monotonic sequence number, assigned at flush time.
    pub sequence: u64,
    /// Concatenated voiced PCM samples.
    pub samples: Vec<i16>,
    /// Timestamp of finalization.
    pub created_at: Instant,
}

impl Utterance {
    /// Duration of the buffered audio at the given sample rate.
    pub fn duration_ms(&self, sample_rate: u32) -> u32 {
        (self.samples.len() as u64 * 1000 / u64::from(sample_rate.max(1))) as u32
    }
}

/// Voice-activity segmenter state machine.
///
/// The sequence counter is shared with the pipeline so that numbering
/// continues monotonically across restart.
pub struct Segmenter<C: Clock = SystemClock> {
    config: SegmenterConfig,
    state: SegmenterState,
    buffer: Vec<i16>,
    silence_start: Option<Instant>,
    sequence: Arc<AtomicU64>,
    max_samples: usize,
    clock: C,
}

impl<C: Clock> Segmenter<C> {
    /// Creates a segmenter with the given configuration, shared sequence
    /// counter and clock.
    pub fn with_clock(config: SegmenterConfig, sequence: Arc<AtomicU64>, clock: C) -> Self {
        let max_samples = config.max_utterance_secs as usize * config.sample_rate as usize;
        Self {
            config,
            state: SegmenterState::Idle,
            buffer: Vec::new(),
            silence_start: None,
            sequence,
            max_samples,
            clock,
        }
    }

    /// Feeds one frame of samples. Returns a finalized utterance when the
    /// silence threshold (or the buffer cap) is reached.
    ///
    /// O(1) amortized per frame; never blocks.
    pub fn push_frame(&mut self, samples: &[i16]) -> Option<Utterance> {
        if samples.is_empty() {
            return None;
        }

        let voiced = mean_abs_amplitude(samples) > self.config.vad_threshold;
        let now = self.clock.now();

        if voiced {
            self.buffer.extend_from_slice(samples);
            self.state = SegmenterState::Voiced;
            self.silence_start = None;

            if self.buffer.len() >= self.max_samples {
                // Cap reached mid-speech: flush to bound memory.
                return Some(self.flush(now));
            }
            return None;
        }

        // Silent frame with nothing buffered is a no-op.
        if self.buffer.is_empty() {
            return None;
        }

        self.state = SegmenterState::Silent;
        let start = *self.silence_start.get_or_insert(now);
        let silent_ms = now.duration_since(start).as_millis() as u64;

        if silent_ms >= u64::from(self.config.silence_duration_ms) {
            return Some(self.flush(now));
        }

        None
    }

    fn flush(&mut self, now: Instant) -> Utterance {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst);
        let samples = std::mem::take(&mut self.buffer);
        self.state = SegmenterState::Idle;
        self.silence_start = None;
        Utterance {
            sequence,
            samples,
            created_at: now,
        }
    }

    /// Discards the in-progress buffer and timing without flushing.
    ///
    /// The shared sequence counter is not reset.
    pub fn reset(&mut self) {
        self.state = SegmenterState::Idle;
        self.buffer.clear();
        self.silence_start = None;
    }

    /// Returns the current segmenter state.
    pub fn state(&self) -> SegmenterState {
        self.state
    }

    /// Number of samples currently buffered.
    pub fn buffered_samples(&self) -> usize {
        self.buffer.len()
    }
}

impl Segmenter<SystemClock> {
    /// Creates a segmenter using the system clock.
    pub fn new(config: SegmenterConfig, sequence: Arc<AtomicU64>) -> Self {
        Self::with_clock(config, sequence, SystemClock)
    }
}

/// Normalized mean absolute amplitude of 16-bit PCM samples (0.0 to 1.0).
pub fn mean_abs_amplitude(samples: &[i16]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: u64 = samples.iter().map(|&s| (s as i32).unsigned_abs() as u64).sum();
    (sum as f64 / samples.len() as f64 / 32768.0) as f32
}
