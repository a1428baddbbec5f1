//! Error types for prompteur.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssistError {
    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Audio errors
    #[error("Audio capture failed: {message}")]
    AudioCapture { message: String },

    #[error("WAV encoding failed: {message}")]
    WavEncode { message: String },

    #[error("WAV decoding failed: {message}")]
    WavDecode { message: String },

    // Transcription errors
    #[error("Transcription failed: {message}")]
    Transcription { message: String },

    // Completion service errors
    #[error("Completion request failed: {message}")]
    Completion { message: String },

    #[error("Completion request failed after {attempts} attempts: {message}")]
    CompletionExhausted { attempts: u32, message: String },

    // Pipeline errors
    #[error("Pipeline is already running")]
    AlreadyRunning,

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, AssistError>;

impl AssistError {
    /// Whether a failed completion request is worth retrying.
    ///
    /// Timeouts, connection failures and non-success statuses are transient;
    /// configuration problems are not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AssistError::Completion { .. } | AssistError::Transcription { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_config_file_not_found_display() {
        let error = AssistError::ConfigFileNotFound {
            path: "/path/to/config.toml".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Configuration file not found at /path/to/config.toml"
        );
    }

    #[test]
    fn test_config_invalid_value_display() {
        let error = AssistError::ConfigInvalidValue {
            key: "api_key".to_string(),
            message: "must not be empty".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid configuration value for api_key: must not be empty"
        );
    }

    #[test]
    fn test_transcription_display() {
        let error = AssistError::Transcription {
            message: "service returned 500".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Transcription failed: service returned 500"
        );
    }

    #[test]
    fn test_completion_exhausted_display() {
        let error = AssistError::CompletionExhausted {
            attempts: 3,
            message: "timeout".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Completion request failed after 3 attempts: timeout"
        );
    }

    #[test]
    fn test_retryable_classification() {
        assert!(
            AssistError::Completion {
                message: "503".into()
            }
            .is_retryable()
        );
        assert!(
            AssistError::Transcription {
                message: "timeout".into()
            }
            .is_retryable()
        );
        assert!(
            !AssistError::ConfigInvalidValue {
                key: "api_key".into(),
                message: "empty".into()
            }
            .is_retryable()
        );
        assert!(!AssistError::AlreadyRunning.is_retryable());
    }

    #[test]
    fn test_from_io_error() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let error: AssistError = io_error.into();
        assert!(error.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_toml_error() {
        let toml_str = "invalid = toml = syntax";
        let toml_error = toml::from_str::<toml::Value>(toml_str).unwrap_err();
        let error: AssistError = toml_error.into();
        assert!(error.to_string().contains("Configuration error"));
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<AssistError>();
        assert_sync::<AssistError>();
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_result() -> Result<i32> {
            Ok(42)
        }
        assert_eq!(returns_result().unwrap(), 42);
    }
}
