//! Speech-to-text service interface and HTTP implementation.

pub mod remote;
pub mod transcriber;

pub use remote::RemoteTranscriptionService;
pub use transcriber::{MockTranscriptionService, TranscriptionService};
