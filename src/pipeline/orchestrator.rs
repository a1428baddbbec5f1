//! Pipeline that runs from `start()` until `stop()`.

use crate::audio::segmenter::{Segmenter, SegmenterConfig};
use crate::audio::source::AudioSource;
use crate::audio::wav::WavSpec;
use crate::context::{ContextStore, Profile};
use crate::defaults;
use crate::error::{AssistError, Result};
use crate::llm::{ChatTurn, CompletionService, RetryPolicy, Sleeper, SystemSleeper};
use crate::pipeline::dispatcher::DispatcherStation;
use crate::pipeline::error::{ErrorReporter, LogReporter};
use crate::pipeline::queue::{OverflowPolicy, PushOutcome, UtteranceQueue};
use crate::pipeline::sink::{HistorySink, PresentationSink, SinkStation};
use crate::pipeline::station::StationRunner;
use crate::stt::TranscriptionService;
use crossbeam_channel::bounded;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Configuration for the pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Segmenter configuration.
    pub segmenter: SegmenterConfig,
    /// Depth of the queue holding finalized utterances awaiting dispatch.
    pub queue_depth: usize,
    /// What to do when that queue is full.
    pub overflow: OverflowPolicy,
    /// Buffer size of the event channel between dispatcher and sinks.
    pub event_buffer: usize,
    /// Interval between audio source polls.
    pub poll_interval: Duration,
    /// Retry policy for answer generation.
    pub retry: RetryPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            segmenter: SegmenterConfig::default(),
            queue_depth: defaults::UTTERANCE_QUEUE_DEPTH,
            overflow: OverflowPolicy::DropOldest,
            event_buffer: 16,
            poll_interval: Duration::from_millis(16),
            retry: RetryPolicy::default(),
        }
    }
}

impl PipelineConfig {
    /// Validates values that would otherwise break the running pipeline.
    pub fn validate(&self) -> Result<()> {
        if self.queue_depth == 0 {
            return Err(AssistError::ConfigInvalidValue {
                key: "queue_depth".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if !(0.0..1.0).contains(&self.segmenter.vad_threshold) {
            return Err(AssistError::ConfigInvalidValue {
                key: "vad_threshold".to_string(),
                message: format!(
                    "must be in [0.0, 1.0), got {}",
                    self.segmenter.vad_threshold
                ),
            });
        }
        if self.segmenter.silence_duration_ms == 0 {
            return Err(AssistError::ConfigInvalidValue {
                key: "silence_duration_ms".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        if self.segmenter.sample_rate == 0 {
            return Err(AssistError::ConfigInvalidValue {
                key: "sample_rate".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        if self.segmenter.max_utterance_secs == 0 {
            // A zero cap would flush every voiced frame as its own utterance.
            return Err(AssistError::ConfigInvalidValue {
                key: "max_utterance_secs".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

/// Monotonic counters describing pipeline activity, shared across restarts.
#[derive(Clone, Default)]
pub struct PipelineStats {
    utterances_seen: Arc<AtomicU64>,
    events_emitted: Arc<AtomicU64>,
    dropped_overflow: Arc<AtomicU64>,
}

impl PipelineStats {
    /// Utterances finalized by the segmenter.
    pub fn utterances_seen(&self) -> u64 {
        self.utterances_seen.load(Ordering::SeqCst)
    }

    /// Events delivered to the sinks.
    pub fn events_emitted(&self) -> u64 {
        self.events_emitted.load(Ordering::SeqCst)
    }

    /// Utterances evicted because the queue was full.
    pub fn dropped_overflow(&self) -> u64 {
        self.dropped_overflow.load(Ordering::SeqCst)
    }
}

/// Utterance pipeline: AudioSource → Segmenter → Dispatcher → Sinks.
///
/// Restartable: `stop()` then `start()` continues sequence numbering and
/// conversation history, while in-flight work from the previous session is
/// marked stale and discarded.
pub struct Pipeline {
    config: PipelineConfig,
    transcription: Arc<dyn TranscriptionService>,
    completion: Arc<dyn CompletionService>,
    context: Arc<Mutex<ContextStore>>,
    error_reporter: Arc<dyn ErrorReporter>,
    sleeper: Arc<dyn Sleeper>,
    sequence: Arc<AtomicU64>,
    generation: Arc<AtomicU64>,
    stats: PipelineStats,
    running: Arc<AtomicBool>,
    threads: Vec<JoinHandle<()>>,
}

impl Pipeline {
    pub fn new(
        config: PipelineConfig,
        transcription: Arc<dyn TranscriptionService>,
        completion: Arc<dyn CompletionService>,
        profile: Profile,
    ) -> Self {
        Self {
            config,
            transcription,
            completion,
            context: Arc::new(Mutex::new(ContextStore::new(profile))),
            error_reporter: Arc::new(LogReporter),
            sleeper: Arc::new(SystemSleeper),
            sequence: Arc::new(AtomicU64::new(0)),
            generation: Arc::new(AtomicU64::new(0)),
            stats: PipelineStats::default(),
            running: Arc::new(AtomicBool::new(false)),
            threads: Vec::new(),
        }
    }

    /// Sets a custom error reporter.
    pub fn with_error_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.error_reporter = reporter;
        self
    }

    /// Sets a custom retry sleeper (for tests that must not wait).
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn stats(&self) -> PipelineStats {
        self.stats.clone()
    }

    /// Snapshot of the rolling conversation history.
    pub fn history(&self) -> Vec<ChatTurn> {
        self.context
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .history()
    }

    /// Clears the rolling conversation history. The profile is kept.
    pub fn clear_history(&self) {
        self.context
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    /// Starts the pipeline.
    ///
    /// Fails if already running, if the configuration is invalid, or if the
    /// audio source cannot start. Sequence numbering continues from where a
    /// previous session left off; a fresh generation id isolates this session
    /// from stale in-flight work.
    pub fn start(
        &mut self,
        mut audio_source: Box<dyn AudioSource>,
        presentation: Box<dyn PresentationSink>,
        history: Box<dyn HistorySink>,
    ) -> Result<()> {
        if self.running.load(Ordering::SeqCst) {
            return Err(AssistError::AlreadyRunning);
        }
        self.config.validate()?;

        // New generation: results stamped with an older one are stale.
        self.generation.fetch_add(1, Ordering::SeqCst);

        audio_source.start()?;
        self.running.store(true, Ordering::SeqCst);

        let (queue, utterance_rx) = UtteranceQueue::new(self.config.queue_depth, self.config.overflow);
        let (event_tx, event_rx) = bounded(self.config.event_buffer);

        let dispatcher = DispatcherStation::new(
            self.transcription.clone(),
            self.completion.clone(),
            self.context.clone(),
        )
        .with_retry(self.config.retry, self.sleeper.clone())
        .with_wav_spec(WavSpec {
            sample_rate: self.config.segmenter.sample_rate,
            ..WavSpec::default()
        })
        .with_generation(self.generation.clone());

        let sink_station =
            SinkStation::new(presentation, history, self.stats.events_emitted.clone());

        let dispatcher_runner = StationRunner::spawn(
            dispatcher,
            utterance_rx,
            event_tx,
            self.error_reporter.clone(),
        );

        // SinkStation is terminal and never sends; its output channel exists
        // only to satisfy the runner signature.
        let (sink_out_tx, _sink_out_rx) = bounded::<()>(1);
        let sink_runner = StationRunner::spawn(
            sink_station,
            event_rx,
            sink_out_tx,
            self.error_reporter.clone(),
        );

        // Ingestion thread: polls the source and runs segmentation inline.
        // Segmentation is O(1) per frame and never touches the network, so
        // frame delivery is never delayed by utterance processing.
        let ingest_running = self.running.clone();
        let mut segmenter = Segmenter::new(self.config.segmenter, self.sequence.clone());
        let stats = self.stats.clone();
        let poll_interval = self.config.poll_interval;
        let source_is_finite = audio_source.is_finite();

        let ingest_handle = thread::spawn(move || {
            let mut consecutive_errors: u32 = 0;
            const MAX_CONSECUTIVE_ERRORS: u32 = 10;

            while ingest_running.load(Ordering::SeqCst) {
                let samples = match audio_source.read_samples() {
                    Ok(s) => {
                        consecutive_errors = 0;
                        s
                    }
                    Err(e) => {
                        consecutive_errors += 1;
                        if consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
                            eprintln!(
                                "[pipeline] audio capture failed {} times in a row: {}",
                                consecutive_errors, e
                            );
                            break;
                        }
                        thread::sleep(poll_interval);
                        continue;
                    }
                };

                if samples.is_empty() {
                    if source_is_finite {
                        break;
                    }
                    // Live source: empty reads are normal while the device
                    // warms up.
                    thread::sleep(poll_interval);
                    continue;
                }

                if let Some(utterance) = segmenter.push_frame(&samples) {
                    stats.utterances_seen.fetch_add(1, Ordering::SeqCst);
                    match queue.push(utterance) {
                        PushOutcome::Queued => {}
                        PushOutcome::DroppedOldest(seq) => {
                            stats.dropped_overflow.fetch_add(1, Ordering::SeqCst);
                            eprintln!("[pipeline] queue full, dropped utterance {}", seq);
                        }
                        PushOutcome::Disconnected => break,
                    }
                }

                thread::sleep(poll_interval);
            }

            // The loop also exits on its own (exhausted finite source,
            // repeated capture failures); clear the shared flag so
            // `is_running()` reflects that without waiting for `stop()`.
            ingest_running.store(false, Ordering::SeqCst);

            // Exiting without flushing discards the in-progress buffer.
            if let Err(e) = audio_source.stop() {
                eprintln!("[pipeline] failed to stop audio capture: {}", e);
            }
        });

        self.threads = vec![ingest_handle];
        self.threads.push(thread::spawn(move || {
            if let Err(msg) = dispatcher_runner.join() {
                eprintln!("[pipeline] {}", msg);
            }
        }));
        self.threads.push(thread::spawn(move || {
            if let Err(msg) = sink_runner.join() {
                eprintln!("[pipeline] {}", msg);
            }
        }));

        Ok(())
    }

    /// Stops the pipeline.
    ///
    /// Discards the in-progress segmenter buffer, lets queued utterances
    /// drain as stale no-ops, and bumps the generation counter so in-flight
    /// network results are discarded instead of emitted. Idempotent.
    pub fn stop(&mut self) {
        let was_running = self.running.swap(false, Ordering::SeqCst);
        if !was_running && self.threads.is_empty() {
            return;
        }

        // Anything still in flight now belongs to a dead generation.
        self.generation.fetch_add(1, Ordering::SeqCst);

        let deadline = Instant::now() + Duration::from_secs(2);
        let poll = Duration::from_millis(20);

        loop {
            let mut remaining = Vec::new();
            for handle in self.threads.drain(..) {
                if handle.is_finished() {
                    if let Err(panic_info) = handle.join() {
                        let msg = panic_info
                            .downcast_ref::<&str>()
                            .copied()
                            .or_else(|| panic_info.downcast_ref::<String>().map(|s| s.as_str()))
                            .unwrap_or("unknown panic");
                        eprintln!("[pipeline] thread panicked: {}", msg);
                    }
                } else {
                    remaining.push(handle);
                }
            }
            self.threads = remaining;

            if self.threads.is_empty() {
                break;
            }

            if Instant::now() >= deadline {
                eprintln!(
                    "[pipeline] shutdown timeout, detaching {} thread(s)",
                    self.threads.len()
                );
                // Detached threads see the bumped generation and discard
                // their results before exiting.
                self.threads.clear();
                break;
            }

            thread::sleep(poll);
        }
    }
}
