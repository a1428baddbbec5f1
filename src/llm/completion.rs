//! Chat completion service abstraction.

use crate::error::{AssistError, Result};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// Role of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One role-tagged turn of a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Sampling parameters for a completion request.
///
/// These are fixed at this layer — bounded response length, moderate
/// temperature, light repetition penalties — and not user-tunable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_tokens: 500,
            temperature: 0.7,
            top_p: 0.9,
            frequency_penalty: 0.1,
            presence_penalty: 0.1,
        }
    }
}

/// Trait for chat completion backends.
///
/// This trait allows swapping implementations (remote HTTP service vs mock).
pub trait CompletionService: Send + Sync {
    /// Request a completion for the given ordered turns.
    fn complete(&self, turns: &[ChatTurn], params: &GenerationParams) -> Result<String>;

    /// Name for logging/debugging.
    fn name(&self) -> &'static str {
        "completion"
    }
}

/// Scripted outcome for one mock invocation.
#[derive(Debug, Clone)]
enum MockOutcome {
    Reply(String),
    Fail(String),
}

/// Mock completion service for testing.
///
/// Outcomes are consumed in order; when the script runs out, the last
/// configured reply (or failure) repeats. Optionally sleeps per call to
/// simulate network latency in ordering tests.
pub struct MockCompletionService {
    script: Mutex<VecDeque<MockOutcome>>,
    fallback: MockOutcome,
    delay: Option<Duration>,
    calls: Mutex<Vec<Vec<ChatTurn>>>,
}

impl MockCompletionService {
    /// Create a mock that always replies with `response`.
    pub fn new(response: &str) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: MockOutcome::Reply(response.to_string()),
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock that always fails.
    pub fn failing(message: &str) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: MockOutcome::Fail(message.to_string()),
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Queue a scripted reply before the fallback behavior applies.
    pub fn then_reply(self, response: &str) -> Self {
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(MockOutcome::Reply(response.to_string()));
        self
    }

    /// Queue a scripted failure before the fallback behavior applies.
    pub fn then_fail(self, message: &str) -> Self {
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(MockOutcome::Fail(message.to_string()));
        self
    }

    /// Sleep for `delay` on every call, simulating service latency.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of completed invocations.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// The turn lists passed to each invocation, in order.
    pub fn recorded_calls(&self) -> Vec<Vec<ChatTurn>> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl CompletionService for MockCompletionService {
    fn complete(&self, turns: &[ChatTurn], _params: &GenerationParams) -> Result<String> {
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(turns.to_vec());

        let outcome = self
            .script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());

        match outcome {
            MockOutcome::Reply(text) => Ok(text),
            MockOutcome::Fail(message) => Err(AssistError::Completion { message }),
        }
    }

    fn name(&self) -> &'static str {
        "mock-completion"
    }
}
