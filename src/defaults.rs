//! Default configuration constants for prompteur.
//!
//! This module provides shared constants used across different configuration types
//! to ensure consistency and eliminate duplication.

use std::time::Duration;

/// Default audio sample rate in Hz.
///
/// 16kHz is the standard for speech recognition and provides a good balance
/// between quality and computational efficiency for voice applications.
pub const SAMPLE_RATE: u32 = 16000;

/// Bits per sample for the PCM stream and WAV encoding.
pub const BITS_PER_SAMPLE: u16 = 16;

/// Channel count for the PCM stream and WAV encoding (mono).
pub const CHANNELS: u16 = 1;

/// Default Voice Activity Detection (VAD) threshold.
///
/// Normalized mean absolute amplitude (0.0 to 1.0) above which a frame is
/// considered voiced. 0.01 is tuned for typical loopback/microphone levels.
pub const VAD_THRESHOLD: f32 = 0.01;

/// Default silence duration in milliseconds before an utterance is finalized.
///
/// 500ms is short enough to keep answers responsive while tolerating
/// word-to-word pauses within a question.
pub const SILENCE_DURATION_MS: u32 = 500;

/// Hard cap on buffered utterance audio, in seconds.
///
/// Continuous speech with no silence gap would otherwise buffer without
/// bound. When the cap is reached the utterance is flushed regardless of
/// voice state.
pub const MAX_UTTERANCE_SECS: u32 = 30;

/// Default depth of the queue holding finalized utterances that are waiting
/// for the dispatcher.
///
/// Processing is strictly sequential, so this bounds how far speech can run
/// ahead of answers before the overflow policy kicks in.
pub const UTTERANCE_QUEUE_DEPTH: usize = 4;

/// Maximum number of conversation turns kept in the rolling history.
pub const MAX_HISTORY_TURNS: usize = 10;

/// Number of recent history turns included in each completion request.
///
/// Bounds request size independently of total history length.
pub const REQUEST_HISTORY_WINDOW: usize = 6;

/// Default number of attempts against the completion service before the
/// local fallback answer is used.
pub const MAX_RETRIES: u32 = 3;

/// Base delay for exponential retry backoff.
///
/// Attempt `n` (counted from 1) waits `base * 2^n` before the next attempt.
pub const RETRY_BASE_DELAY: Duration = Duration::from_secs(1);

/// Request timeout for both remote services.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default completion model identifier.
pub const DEFAULT_MODEL: &str = "openai/gpt-4-turbo-preview";

/// Default speech-to-text model identifier.
pub const DEFAULT_STT_MODEL: &str = "whisper-1";

/// Default base URL for the completion service (OpenAI-compatible).
pub const DEFAULT_COMPLETION_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Default base URL for the transcription service.
pub const DEFAULT_STT_BASE_URL: &str = "https://api.openai.com/v1";
