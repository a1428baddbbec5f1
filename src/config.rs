use crate::audio::segmenter::SegmenterConfig;
use crate::context::{AnswerStyle, Profile};
use crate::defaults;
use crate::error::{AssistError, Result};
use crate::llm::remote::RemoteCompletionConfig;
use crate::pipeline::orchestrator::PipelineConfig;
use crate::stt::remote::RemoteTranscriptionConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub audio: AudioConfig,
    pub api: ApiConfig,
    pub answer: AnswerConfig,
    pub pipeline: PipelineSection,
}

/// Audio segmentation configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioConfig {
    pub sample_rate: u32,
    pub vad_threshold: f32,
    pub silence_duration_ms: u32,
    pub max_utterance_secs: u32,
}

/// External service configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
    pub api_key: String,
    pub model: String,
    pub completion_base_url: String,
    pub stt_base_url: String,
    pub stt_model: String,
    pub stt_language: String,
}

/// Answer generation configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnswerConfig {
    pub style: AnswerStyle,
    pub job_description: String,
    pub resume: String,
    pub experience: String,
    pub specialization: String,
}

/// Pipeline scheduling configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineSection {
    pub queue_depth: usize,
    pub max_retries: u32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: defaults::SAMPLE_RATE,
            vad_threshold: defaults::VAD_THRESHOLD,
            silence_duration_ms: defaults::SILENCE_DURATION_MS,
            max_utterance_secs: defaults::MAX_UTTERANCE_SECS,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: defaults::DEFAULT_MODEL.to_string(),
            completion_base_url: defaults::DEFAULT_COMPLETION_BASE_URL.to_string(),
            stt_base_url: defaults::DEFAULT_STT_BASE_URL.to_string(),
            stt_model: defaults::DEFAULT_STT_MODEL.to_string(),
            stt_language: "en".to_string(),
        }
    }
}

impl Default for AnswerConfig {
    fn default() -> Self {
        Self {
            style: AnswerStyle::Concise,
            job_description: String::new(),
            resume: String::new(),
            experience: String::new(),
            specialization: String::new(),
        }
    }
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            queue_depth: defaults::UTTERANCE_QUEUE_DEPTH,
            max_retries: defaults::MAX_RETRIES,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Missing fields use default values; a missing file or invalid TOML is
    /// an error.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AssistError::ConfigFileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                AssistError::Io(e)
            }
        })?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file, or return defaults if it doesn't exist
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(AssistError::ConfigFileNotFound { .. }) => Ok(Self::default()),
            Err(e) => Err(e),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - PROMPTEUR_API_KEY → api.api_key
    /// - PROMPTEUR_MODEL → api.model
    /// - PROMPTEUR_STYLE → answer.style (concise|detailed|bullet)
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(key) = std::env::var("PROMPTEUR_API_KEY")
            && !key.is_empty()
        {
            self.api.api_key = key;
        }

        if let Ok(model) = std::env::var("PROMPTEUR_MODEL")
            && !model.is_empty()
        {
            self.api.model = model;
        }

        if let Ok(style) = std::env::var("PROMPTEUR_STYLE") {
            match style.as_str() {
                "concise" => self.answer.style = AnswerStyle::Concise,
                "detailed" => self.answer.style = AnswerStyle::Detailed,
                "bullet" => self.answer.style = AnswerStyle::Bullet,
                _ => {}
            }
        }

        self
    }

    /// Checks the values needed before the pipeline can start.
    pub fn validate(&self) -> Result<()> {
        if self.api.api_key.is_empty() {
            return Err(AssistError::ConfigInvalidValue {
                key: "api.api_key".to_string(),
                message: "missing API credentials".to_string(),
            });
        }
        self.pipeline_config().validate()
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/prompteur/config.toml on Linux.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("prompteur").join("config.toml"))
    }

    pub fn segmenter_config(&self) -> SegmenterConfig {
        SegmenterConfig {
            vad_threshold: self.audio.vad_threshold,
            silence_duration_ms: self.audio.silence_duration_ms,
            max_utterance_secs: self.audio.max_utterance_secs,
            sample_rate: self.audio.sample_rate,
        }
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            segmenter: self.segmenter_config(),
            queue_depth: self.pipeline.queue_depth,
            retry: crate::llm::RetryPolicy {
                max_attempts: self.pipeline.max_retries,
                base_delay: defaults::RETRY_BASE_DELAY,
            },
            ..PipelineConfig::default()
        }
    }

    pub fn profile(&self) -> Profile {
        Profile {
            answer_style: self.answer.style,
            job_description: self.answer.job_description.clone(),
            resume: self.answer.resume.clone(),
            experience: self.answer.experience.clone(),
            specialization: self.answer.specialization.clone(),
        }
    }

    pub fn completion_config(&self) -> RemoteCompletionConfig {
        RemoteCompletionConfig {
            base_url: self.api.completion_base_url.clone(),
            api_key: self.api.api_key.clone(),
            model: self.api.model.clone(),
            timeout: defaults::REQUEST_TIMEOUT,
        }
    }

    pub fn transcription_config(&self) -> RemoteTranscriptionConfig {
        RemoteTranscriptionConfig {
            base_url: self.api.stt_base_url.clone(),
            api_key: self.api.api_key.clone(),
            model: self.api.stt_model.clone(),
            language: self.api.stt_language.clone(),
            timeout: defaults::REQUEST_TIMEOUT,
        }
    }
}
