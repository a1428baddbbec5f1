//! Audio frame sources feeding the pipeline.

use crate::error::{AssistError, Result};

/// Trait for audio source devices.
///
/// This trait allows swapping implementations (real capture transport vs mock).
/// Sources produce mono 16-bit PCM at the sample rate fixed at pipeline
/// construction; there is no format negotiation.
pub trait AudioSource: Send {
    /// Start capturing audio from the source.
    fn start(&mut self) -> Result<()>;

    /// Stop capturing audio from the source.
    fn stop(&mut self) -> Result<()>;

    /// Read the next frame of samples from the source.
    ///
    /// An empty vector means no data is currently available. Finite sources
    /// (files, scripted mocks) return empty forever once exhausted.
    fn read_samples(&mut self) -> Result<Vec<i16>>;

    /// Whether this source ends on its own (file/mock) or streams until
    /// stopped (live capture).
    fn is_finite(&self) -> bool {
        false
    }
}

/// One phase of a scripted frame sequence: `count` reads each returning
/// `samples`.
#[derive(Debug, Clone)]
pub struct FramePhase {
    pub samples: Vec<i16>,
    pub count: u32,
}

/// Mock audio source for testing.
#[derive(Debug, Clone)]
pub struct MockAudioSource {
    is_started: bool,
    phases: Vec<FramePhase>,
    phase_index: usize,
    reads_in_phase: u32,
    live: bool,
    should_fail_start: bool,
    should_fail_read: bool,
    error_message: String,
}

impl MockAudioSource {
    /// Create a new mock audio source with no scripted frames.
    pub fn new() -> Self {
        Self {
            is_started: false,
            phases: Vec::new(),
            phase_index: 0,
            reads_in_phase: 0,
            live: false,
            should_fail_start: false,
            should_fail_read: false,
            error_message: "mock audio error".to_string(),
        }
    }

    /// Script a sequence of frame phases played back in order.
    pub fn with_frame_sequence(mut self, phases: Vec<FramePhase>) -> Self {
        self.phases = phases;
        self
    }

    /// Mark the source as live (infinite); empty reads mean "no data yet".
    pub fn as_live_source(mut self) -> Self {
        self.live = true;
        self
    }

    /// Configure the mock to fail on start.
    pub fn with_start_failure(mut self) -> Self {
        self.should_fail_start = true;
        self
    }

    /// Configure the mock to fail on every read.
    pub fn with_read_failure(mut self) -> Self {
        self.should_fail_read = true;
        self
    }

    /// Check if the audio source is started.
    pub fn is_started(&self) -> bool {
        self.is_started
    }
}

impl Default for MockAudioSource {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioSource for MockAudioSource {
    fn start(&mut self) -> Result<()> {
        if self.should_fail_start {
            return Err(AssistError::AudioCapture {
                message: self.error_message.clone(),
            });
        }
        self.is_started = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.is_started = false;
        Ok(())
    }

    fn read_samples(&mut self) -> Result<Vec<i16>> {
        if self.should_fail_read {
            return Err(AssistError::AudioCapture {
                message: self.error_message.clone(),
            });
        }

        while self.phase_index < self.phases.len() {
            let phase = &self.phases[self.phase_index];
            if self.reads_in_phase < phase.count {
                self.reads_in_phase += 1;
                return Ok(phase.samples.clone());
            }
            self.phase_index += 1;
            self.reads_in_phase = 0;
        }

        Ok(Vec::new())
    }

    fn is_finite(&self) -> bool {
        !self.live
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_plays_phases_in_order() {
        let mut source = MockAudioSource::new().with_frame_sequence(vec![
            FramePhase {
                samples: vec![1i16; 4],
                count: 2,
            },
            FramePhase {
                samples: vec![2i16; 4],
                count: 1,
            },
        ]);

        assert_eq!(source.read_samples().unwrap(), vec![1i16; 4]);
        assert_eq!(source.read_samples().unwrap(), vec![1i16; 4]);
        assert_eq!(source.read_samples().unwrap(), vec![2i16; 4]);
        assert!(source.read_samples().unwrap().is_empty());
        assert!(source.read_samples().unwrap().is_empty());
    }

    #[test]
    fn test_mock_is_finite_unless_live() {
        assert!(MockAudioSource::new().is_finite());
        assert!(!MockAudioSource::new().as_live_source().is_finite());
    }

    #[test]
    fn test_mock_start_failure() {
        let mut source = MockAudioSource::new().with_start_failure();
        let result = source.start();
        assert!(result.is_err());
        match result {
            Err(AssistError::AudioCapture { message }) => {
                assert_eq!(message, "mock audio error");
            }
            _ => panic!("Expected AudioCapture error"),
        }
        assert!(!source.is_started());
    }

    #[test]
    fn test_mock_read_failure() {
        let mut source = MockAudioSource::new().with_read_failure();
        assert!(source.read_samples().is_err());
    }

    #[test]
    fn test_mock_start_stop_toggle() {
        let mut source = MockAudioSource::new();
        source.start().unwrap();
        assert!(source.is_started());
        source.stop().unwrap();
        assert!(!source.is_started());
    }

    #[test]
    fn test_trait_is_object_safe() {
        let mut source: Box<dyn AudioSource> = Box::new(MockAudioSource::new());
        source.start().unwrap();
        assert!(source.read_samples().unwrap().is_empty());
    }
}
