//! Utterance processing pipeline: segmentation, dispatch and event fan-out.

pub mod dispatcher;
pub mod error;
pub mod orchestrator;
pub mod queue;
pub mod sink;
pub mod station;
pub mod types;

pub use dispatcher::DispatcherStation;
pub use error::{ErrorReporter, LogReporter, StationError};
pub use orchestrator::{Pipeline, PipelineConfig, PipelineStats};
pub use queue::{OverflowPolicy, PushOutcome, UtteranceQueue};
pub use sink::{CollectorSink, HistorySink, NullPresentation, PresentationSink, SinkStation};
pub use station::{Station, StationRunner};
pub use types::QaEvent;
