//! Contextual answer generation with retry and a local fallback.

use crate::context::{AnswerStyle, ContextStore};
use crate::llm::{ChatTurn, CompletionService, GenerationParams, RetryPolicy, Sleeper, SystemSleeper};
use crate::prompt;
use std::sync::Arc;

/// Deterministic keyword-matched answer used when the completion service is
/// unreachable after all retries.
pub fn fallback_answer(question: &str, style: AnswerStyle) -> String {
    let lowered = question.to_lowercase();

    if lowered.contains("algorithm") {
        return match style {
            AnswerStyle::Bullet => "\u{2022} I would approach this by first understanding the problem constraints\n\
                 \u{2022} Then identify the optimal data structure\n\
                 \u{2022} Implement with clear time/space complexity analysis"
                .to_string(),
            _ => "I would start by analyzing the problem constraints, choose the appropriate \
                  data structure, and implement with consideration for time and space complexity."
                .to_string(),
        };
    }

    if lowered.contains("system design") {
        return match style {
            AnswerStyle::Bullet => "\u{2022} Start with requirements gathering and scale estimation\n\
                 \u{2022} Design the high-level architecture\n\
                 \u{2022} Deep dive into component details\n\
                 \u{2022} Consider scalability and reliability"
                .to_string(),
            _ => "I would begin with requirements gathering, estimate scale, design the \
                  high-level architecture, and then deep dive into component details while \
                  considering scalability."
                .to_string(),
        };
    }

    match style {
        AnswerStyle::Bullet => "\u{2022} Let me think through this step by step\n\
             \u{2022} I would need to understand the specific requirements\n\
             \u{2022} Then apply relevant technical principles\n\
             \u{2022} And ensure the solution is scalable and maintainable"
            .to_string(),
        _ => "That's a great question. Let me think through this systematically, considering \
              the requirements and applying relevant technical principles to ensure a scalable \
              solution."
            .to_string(),
    }
}

/// Generates answers against a completion service, retrying with backoff and
/// degrading to [`fallback_answer`] on exhaustion.
pub struct AnswerGenerator {
    completion: Arc<dyn CompletionService>,
    retry: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
    params: GenerationParams,
}

impl AnswerGenerator {
    pub fn new(completion: Arc<dyn CompletionService>) -> Self {
        Self::with_retry(completion, RetryPolicy::default(), Arc::new(SystemSleeper))
    }

    pub fn with_retry(
        completion: Arc<dyn CompletionService>,
        retry: RetryPolicy,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            completion,
            retry,
            sleeper,
            params: GenerationParams::default(),
        }
    }

    /// Produces an answer for `question`, mutating `context`.
    ///
    /// The question is appended to history as a user turn before the request;
    /// the answer is appended as an assistant turn only on success. Never
    /// fails: retry exhaustion yields the local fallback instead.
    pub fn generate(&self, question: &str, context: &mut ContextStore) -> String {
        let system_prompt = prompt::build_system_prompt(context.profile());
        let style = context.profile().answer_style;

        context.push_user(question);

        let mut turns = Vec::with_capacity(context.len() + 2);
        turns.push(ChatTurn::system(system_prompt));
        turns.extend(context.request_window());
        turns.push(ChatTurn::user(prompt::format_question_prompt(
            question, style,
        )));

        match self
            .retry
            .run(self.sleeper.as_ref(), || {
                self.completion.complete(&turns, &self.params)
            }) {
            Ok(answer) => {
                context.push_assistant(&answer);
                answer
            }
            Err(e) => {
                eprintln!("[answer] generation failed, using fallback: {}", e);
                fallback_answer(question, style)
            }
        }
    }
}
