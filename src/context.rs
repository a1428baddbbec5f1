//! Rolling conversation history and static interview profile.

use crate::defaults;
use crate::llm::{ChatTurn, Role};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Shape of generated answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerStyle {
    #[default]
    Concise,
    Detailed,
    Bullet,
}

impl AnswerStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnswerStyle::Concise => "concise",
            AnswerStyle::Detailed => "detailed",
            AnswerStyle::Bullet => "bullet",
        }
    }
}

/// Static fields describing the candidate and the role. Read-only inputs to
/// prompt construction, never part of the rolling history.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub answer_style: AnswerStyle,
    pub job_description: String,
    pub resume: String,
    pub experience: String,
    pub specialization: String,
}

/// Bounded conversation history plus the static profile.
///
/// History is capped at a fixed number of turns with oldest-first eviction.
/// Only the most recent few turns are sent with each request, keeping request
/// size bounded independent of session length.
#[derive(Debug, Clone)]
pub struct ContextStore {
    history: VecDeque<ChatTurn>,
    max_turns: usize,
    request_window: usize,
    profile: Profile,
}

impl ContextStore {
    pub fn new(profile: Profile) -> Self {
        Self::with_limits(
            profile,
            defaults::MAX_HISTORY_TURNS,
            defaults::REQUEST_HISTORY_WINDOW,
        )
    }

    pub fn with_limits(profile: Profile, max_turns: usize, request_window: usize) -> Self {
        Self {
            history: VecDeque::with_capacity(max_turns),
            max_turns: max_turns.max(1),
            request_window,
            profile,
        }
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    /// Append a user turn, evicting the oldest turn if the cap is reached.
    pub fn push_user(&mut self, content: impl Into<String>) {
        self.push(ChatTurn::user(content));
    }

    /// Append an assistant turn, evicting the oldest turn if the cap is
    /// reached.
    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.push(ChatTurn::assistant(content));
    }

    fn push(&mut self, turn: ChatTurn) {
        while self.history.len() >= self.max_turns {
            self.history.pop_front();
        }
        self.history.push_back(turn);
    }

    /// The most recent turns to include in a completion request, oldest
    /// first.
    pub fn request_window(&self) -> Vec<ChatTurn> {
        let skip = self.history.len().saturating_sub(self.request_window);
        self.history.iter().skip(skip).cloned().collect()
    }

    /// Full retained history, oldest first.
    pub fn history(&self) -> Vec<ChatTurn> {
        self.history.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }
}
