//! Two-stage question detection.
//!
//! A cheap lexical gate runs first so purely non-question text never costs a
//! network round trip. Gated positives are then confirmed by the completion
//! service; if that call fails the gate result stands.

use crate::llm::{ChatTurn, CompletionService, GenerationParams};
use crate::prompt;
use std::sync::Arc;

/// How a classification was decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassificationMethod {
    /// Lexical gate alone (negative short-circuit or confirmation fallback).
    Lexical,
    /// Completion service confirmed or denied.
    Confirmed,
}

/// Outcome of classifying a transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassificationResult {
    pub is_question: bool,
    pub method: ClassificationMethod,
}

const QUESTION_WORDS: &[&str] = &["what", "how", "why", "when", "where", "who", "which"];

const AUXILIARY_PHRASES: &[&str] = &[
    "can you",
    "could you",
    "would you",
    "do you",
    "are you",
    "is there",
    "have you",
    "will you",
];

const REQUEST_VERBS: &[&str] = &["explain", "describe", "implement", "write", "code", "create", "build", "design"];

const REQUEST_PHRASES: &[&str] = &["tell me", "walk me through", "show me"];

const TECHNICAL_NOUNS: &[&str] = &[
    "algorithm",
    "function",
    "method",
    "class",
    "variable",
    "loop",
    "condition",
];

fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect()
}

fn contains_phrase(tokens: &[String], phrase: &str) -> bool {
    let parts: Vec<&str> = phrase.split_whitespace().collect();
    tokens
        .windows(parts.len())
        .any(|window| window.iter().zip(&parts).all(|(t, p)| t == p))
}

/// Word-boundary-aware pattern match against the question heuristics.
pub fn lexical_gate(text: &str) -> bool {
    if text.trim_end().ends_with('?') {
        return true;
    }

    let tokens = words(text);
    if tokens.is_empty() {
        return false;
    }

    let single_words = QUESTION_WORDS
        .iter()
        .chain(REQUEST_VERBS)
        .chain(TECHNICAL_NOUNS);
    if tokens.iter().any(|t| single_words.clone().any(|w| t == w)) {
        return true;
    }

    AUXILIARY_PHRASES
        .iter()
        .chain(REQUEST_PHRASES)
        .any(|phrase| contains_phrase(&tokens, phrase))
}

/// Gate-then-confirm question classifier.
pub struct QuestionClassifier {
    completion: Arc<dyn CompletionService>,
}

impl QuestionClassifier {
    pub fn new(completion: Arc<dyn CompletionService>) -> Self {
        Self { completion }
    }

    /// Classifies a non-empty transcript.
    ///
    /// Gate negatives short-circuit without touching the network. On a gate
    /// positive the completion service is asked for a YES/NO verdict; a
    /// failed call falls back to the gate result.
    pub fn classify(&self, transcript: &str) -> ClassificationResult {
        if !lexical_gate(transcript) {
            return ClassificationResult {
                is_question: false,
                method: ClassificationMethod::Lexical,
            };
        }

        let turns = [
            ChatTurn::system(prompt::CONFIRMATION_SYSTEM_PROMPT),
            ChatTurn::user(prompt::format_confirmation_prompt(transcript)),
        ];

        match self.completion.complete(&turns, &GenerationParams::default()) {
            Ok(response) => ClassificationResult {
                is_question: response.trim().to_uppercase().contains("YES"),
                method: ClassificationMethod::Confirmed,
            },
            Err(_) => ClassificationResult {
                is_question: true,
                method: ClassificationMethod::Lexical,
            },
        }
    }
}
