//! Error types and reporting for pipeline stations.

use std::fmt;

/// Errors raised while a station processes one item.
#[derive(Debug, Clone)]
pub enum StationError {
    /// The item was lost but the station can keep going.
    Recoverable(String),
    /// The station cannot continue and must shut down.
    Fatal(String),
}

impl fmt::Display for StationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StationError::Recoverable(msg) => write!(f, "recoverable: {}", msg),
            StationError::Fatal(msg) => write!(f, "fatal: {}", msg),
        }
    }
}

impl std::error::Error for StationError {}

/// Trait for reporting station errors.
pub trait ErrorReporter: Send + Sync {
    fn report(&self, station: &str, error: &StationError);
}

/// Reporter that logs to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl ErrorReporter for LogReporter {
    fn report(&self, station: &str, error: &StationError) {
        eprintln!("[{}] {}", station, error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_station_error_display() {
        let recoverable = StationError::Recoverable("transcription timed out".to_string());
        assert_eq!(recoverable.to_string(), "recoverable: transcription timed out");

        let fatal = StationError::Fatal("channel closed".to_string());
        assert_eq!(fatal.to_string(), "fatal: channel closed");
    }

    #[test]
    fn test_log_reporter_does_not_panic() {
        LogReporter.report("test", &StationError::Recoverable("x".to_string()));
    }
}
