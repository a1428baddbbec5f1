//! HTTP transcription service for OpenAI-compatible audio endpoints.

use crate::defaults;
use crate::error::{AssistError, Result};
use crate::stt::transcriber::TranscriptionService;
use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// Configuration for the remote transcription service.
#[derive(Debug, Clone)]
pub struct RemoteTranscriptionConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub language: String,
    pub timeout: Duration,
}

impl Default for RemoteTranscriptionConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::DEFAULT_STT_BASE_URL.to_string(),
            api_key: String::new(),
            model: defaults::DEFAULT_STT_MODEL.to_string(),
            language: "en".to_string(),
            timeout: defaults::REQUEST_TIMEOUT,
        }
    }
}

/// Whisper-style transcription client. Uploads a complete WAV file as
/// multipart form data and returns the recognized text.
pub struct RemoteTranscriptionService {
    config: RemoteTranscriptionConfig,
    client: Client,
}

impl RemoteTranscriptionService {
    pub fn new(config: RemoteTranscriptionConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if !config.api_key.is_empty() {
            let value = HeaderValue::from_str(&format!("Bearer {}", config.api_key)).map_err(
                |e| AssistError::ConfigInvalidValue {
                    key: "api_key".to_string(),
                    message: format!("not a valid header value: {}", e),
                },
            )?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| AssistError::Transcription {
                message: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self { config, client })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/audio/transcriptions",
            self.config.base_url.trim_end_matches('/')
        )
    }
}

impl TranscriptionService for RemoteTranscriptionService {
    fn transcribe(&self, wav_bytes: &[u8]) -> Result<String> {
        let file_part = Part::bytes(wav_bytes.to_vec())
            .file_name("utterance.wav")
            .mime_str("audio/wav")
            .map_err(|e| AssistError::Transcription {
                message: format!("failed to build multipart body: {}", e),
            })?;

        let form = Form::new()
            .part("file", file_part)
            .text("model", self.config.model.clone())
            .text("language", self.config.language.clone());

        let response = self
            .client
            .post(self.endpoint())
            .multipart(form)
            .send()
            .map_err(|e| AssistError::Transcription {
                message: format!("HTTP request failed: {}", e),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .unwrap_or_else(|_| "failed to read error response".to_string());
            return Err(AssistError::Transcription {
                message: format!("status {}: {}", status, body),
            });
        }

        let parsed: TranscriptionResponse =
            response.json().map_err(|e| AssistError::Transcription {
                message: format!("failed to parse response: {}", e),
            })?;

        Ok(parsed.text)
    }

    fn name(&self) -> &'static str {
        "remote-transcription"
    }
}
