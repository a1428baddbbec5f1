//! prompteur - Live interview answer assistant
//!
//! Listens to an audio stream, segments speech into utterances, transcribes
//! them, detects questions and displays generated answers in real time.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod answer;
pub mod audio;
pub mod classify;
pub mod config;
pub mod context;
pub mod defaults;
pub mod error;
pub mod llm;
pub mod pipeline;
pub mod prompt;
pub mod stt;

// Core traits (source → process → sinks)
pub use audio::source::AudioSource;
pub use llm::completion::CompletionService;
pub use pipeline::sink::{CollectorSink, HistorySink, NullPresentation, PresentationSink};
pub use stt::transcriber::TranscriptionService;

// Pipeline
pub use pipeline::orchestrator::{Pipeline, PipelineConfig, PipelineStats};
pub use pipeline::types::QaEvent;

// Error handling
pub use error::{AssistError, Result};

// Config and context
pub use config::Config;
pub use context::{AnswerStyle, ContextStore, Profile};

// Station framework (for advanced users)
pub use pipeline::error::{ErrorReporter, StationError};
pub use pipeline::station::Station;

/// Build version string with optional git commit hash.
///
/// Returns `"0.3.1+abc1234"` when git hash is available, `"0.3.1"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}
