//! Per-utterance processing: encode, transcribe, classify, answer.

use crate::answer::AnswerGenerator;
use crate::audio::segmenter::Utterance;
use crate::audio::wav::{self, WavSpec};
use crate::classify::QuestionClassifier;
use crate::context::ContextStore;
use crate::llm::{CompletionService, RetryPolicy, Sleeper};
use crate::pipeline::error::StationError;
use crate::pipeline::station::Station;
use crate::pipeline::types::QaEvent;
use crate::stt::TranscriptionService;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Runs one utterance through the full chain and emits a [`QaEvent`] when it
/// turns out to be a question.
///
/// Utterances are processed strictly one at a time in arrival order, which is
/// sequence order. Every stage degrades rather than aborting: transcription
/// failures and non-questions are absorbed, answer generation falls back
/// locally. A generation counter detects results that became stale because
/// the pipeline was stopped mid-flight; those are discarded before emission.
pub struct DispatcherStation {
    transcription: Arc<dyn TranscriptionService>,
    completion: Arc<dyn CompletionService>,
    classifier: QuestionClassifier,
    generator: AnswerGenerator,
    context: Arc<Mutex<ContextStore>>,
    wav_spec: WavSpec,
    generation: Arc<AtomicU64>,
    spawn_generation: u64,
}

impl DispatcherStation {
    pub fn new(
        transcription: Arc<dyn TranscriptionService>,
        completion: Arc<dyn CompletionService>,
        context: Arc<Mutex<ContextStore>>,
    ) -> Self {
        Self {
            transcription,
            classifier: QuestionClassifier::new(completion.clone()),
            generator: AnswerGenerator::new(completion.clone()),
            completion,
            context,
            wav_spec: WavSpec::default(),
            generation: Arc::new(AtomicU64::new(0)),
            spawn_generation: 0,
        }
    }

    /// Replaces the retry policy and sleeper used for answer generation.
    pub fn with_retry(mut self, retry: RetryPolicy, sleeper: Arc<dyn Sleeper>) -> Self {
        self.generator = AnswerGenerator::with_retry(self.completion.clone(), retry, sleeper);
        self
    }

    pub fn with_wav_spec(mut self, spec: WavSpec) -> Self {
        self.wav_spec = spec;
        self
    }

    /// Binds a shared generation counter. The counter's value at bind time
    /// becomes this dispatcher's generation; any later bump marks results as
    /// stale.
    pub fn with_generation(mut self, counter: Arc<AtomicU64>) -> Self {
        self.spawn_generation = counter.load(Ordering::SeqCst);
        self.generation = counter;
        self
    }

    fn stale(&self) -> bool {
        self.generation.load(Ordering::SeqCst) != self.spawn_generation
    }
}

impl Station for DispatcherStation {
    type Input = Utterance;
    type Output = QaEvent;

    fn name(&self) -> &'static str {
        "dispatcher"
    }

    fn process(&mut self, utterance: Utterance) -> Result<Option<QaEvent>, StationError> {
        // Queued utterances left over after a stop are discarded without
        // touching the network.
        if self.stale() {
            return Ok(None);
        }

        let sequence = utterance.sequence;
        let encoded = wav::encode_samples(&utterance.samples, self.wav_spec);

        // Best effort: a failed transcription drops the utterance, never the
        // pipeline.
        let transcript = match self.transcription.transcribe(&encoded) {
            Ok(text) => text,
            Err(e) => {
                return Err(StationError::Recoverable(format!(
                    "transcription failed for utterance {}: {}",
                    sequence, e
                )));
            }
        };

        let question = transcript.trim();
        if question.is_empty() {
            return Ok(None);
        }

        // A stop may have landed while transcription was on the wire; skip
        // the classification call in that case.
        if self.stale() {
            return Ok(None);
        }

        if !self.classifier.classify(question).is_question {
            return Ok(None);
        }

        if self.stale() {
            return Ok(None);
        }

        let answer = {
            let mut context = self.context.lock().unwrap_or_else(|e| e.into_inner());
            self.generator.generate(question, &mut context)
        };

        if self.stale() {
            return Ok(None);
        }

        Ok(Some(QaEvent::new(
            sequence,
            question.to_string(),
            answer,
            utterance.created_at.elapsed(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Profile;
    use crate::llm::MockCompletionService;
    use crate::llm::retry::RecordingSleeper;
    use crate::stt::MockTranscriptionService;
    use std::time::{Duration, Instant};

    fn utterance(sequence: u64) -> Utterance {
        Utterance {
            sequence,
            samples: vec![5000i16; 1600],
            created_at: Instant::now(),
        }
    }

    fn shared_context() -> Arc<Mutex<ContextStore>> {
        Arc::new(Mutex::new(ContextStore::new(Profile::default())))
    }

    fn dispatcher(
        transcription: Arc<MockTranscriptionService>,
        completion: Arc<MockCompletionService>,
    ) -> DispatcherStation {
        DispatcherStation::new(transcription, completion, shared_context()).with_retry(
            RetryPolicy::default(),
            Arc::new(RecordingSleeper::new()),
        )
    }

    #[test]
    fn test_question_produces_event() {
        let transcription = Arc::new(MockTranscriptionService::new(
            "How would you implement a binary search algorithm?",
        ));
        // First call confirms the question, second generates the answer.
        let completion = Arc::new(
            MockCompletionService::new("I would use a divide-and-conquer approach...")
                .then_reply("YES"),
        );
        let mut station = dispatcher(transcription, completion);

        let event = station.process(utterance(3)).unwrap().unwrap();
        assert_eq!(event.sequence, 3);
        assert_eq!(
            event.question,
            "How would you implement a binary search algorithm?"
        );
        assert_eq!(event.answer, "I would use a divide-and-conquer approach...");
    }

    #[test]
    fn test_non_question_is_absorbed() {
        let transcription = Arc::new(MockTranscriptionService::new("I like pizza."));
        let completion = Arc::new(MockCompletionService::new("unused"));
        let mut station = dispatcher(transcription, completion.clone());

        assert!(station.process(utterance(0)).unwrap().is_none());
        // Lexical gate rejected, nothing reached the completion service.
        assert_eq!(completion.call_count(), 0);
    }

    #[test]
    fn test_transcription_failure_is_recoverable() {
        let transcription = Arc::new(MockTranscriptionService::failing("stt unreachable"));
        let completion = Arc::new(MockCompletionService::new("unused"));
        let mut station = dispatcher(transcription, completion);

        match station.process(utterance(1)) {
            Err(StationError::Recoverable(msg)) => {
                assert!(msg.contains("utterance 1"));
                assert!(msg.contains("stt unreachable"));
            }
            other => panic!("Expected recoverable error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_whitespace_transcript_is_absorbed() {
        let transcription = Arc::new(MockTranscriptionService::new("   \n"));
        let completion = Arc::new(MockCompletionService::new("unused"));
        let mut station = dispatcher(transcription, completion.clone());

        assert!(station.process(utterance(0)).unwrap().is_none());
        assert_eq!(completion.call_count(), 0);
    }

    #[test]
    fn test_stale_generation_discards_without_network() {
        let transcription = Arc::new(MockTranscriptionService::new("What is Rust?"));
        let completion = Arc::new(MockCompletionService::new("YES"));
        let generation = Arc::new(AtomicU64::new(1));

        let mut station = DispatcherStation::new(
            transcription.clone(),
            completion,
            shared_context(),
        )
        .with_generation(generation.clone());

        // A later stop bumps the counter, making this dispatcher stale.
        generation.fetch_add(1, Ordering::SeqCst);

        assert!(station.process(utterance(0)).unwrap().is_none());
        assert_eq!(transcription.call_count(), 0);
    }

    #[test]
    fn test_stop_during_transcription_skips_classification() {
        let transcription = Arc::new(
            MockTranscriptionService::new("What is Rust?").then_delay(Duration::from_millis(150)),
        );
        let completion = Arc::new(MockCompletionService::new("YES"));
        let generation = Arc::new(AtomicU64::new(1));

        let mut station =
            DispatcherStation::new(transcription.clone(), completion.clone(), shared_context())
                .with_generation(generation.clone());

        // Bump the counter while the transcription call is on the wire.
        let stopper = std::thread::spawn({
            let generation = generation.clone();
            move || {
                std::thread::sleep(Duration::from_millis(50));
                generation.fetch_add(1, Ordering::SeqCst);
            }
        });

        assert!(station.process(utterance(0)).unwrap().is_none());
        stopper.join().unwrap();

        // Transcription was already committed, but nothing after it ran.
        assert_eq!(transcription.call_count(), 1);
        assert_eq!(completion.call_count(), 0);
    }

    #[test]
    fn test_accepted_question_updates_shared_history() {
        let transcription = Arc::new(MockTranscriptionService::new("Can you explain closures?"));
        let completion = Arc::new(
            MockCompletionService::new("Closures capture their environment.").then_reply("YES"),
        );
        let context = shared_context();

        let mut station =
            DispatcherStation::new(transcription, completion, context.clone()).with_retry(
                RetryPolicy::default(),
                Arc::new(RecordingSleeper::new()),
            );

        station.process(utterance(0)).unwrap().unwrap();

        let history = context.lock().unwrap().history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].content, "Can you explain closures?");
        assert_eq!(history[1].content, "Closures capture their environment.");
    }

    #[test]
    fn test_generation_exhaustion_still_emits_event() {
        let transcription = Arc::new(MockTranscriptionService::new(
            "Walk me through a system design.",
        ));
        // Confirmation succeeds, every generation attempt fails.
        let completion = Arc::new(MockCompletionService::failing("down").then_reply("YES"));
        let mut station = dispatcher(transcription, completion);

        let event = station.process(utterance(2)).unwrap().unwrap();
        assert!(event.answer.contains("requirements gathering"));
    }
}
