//! Station abstraction and threaded runner.

use crate::pipeline::error::{ErrorReporter, StationError};
use crossbeam_channel::{Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// A processing stage in the pipeline.
///
/// Each station receives input from a channel, processes it, and sends
/// output to the next stage. Stations run in their own threads.
pub trait Station: Send + 'static {
    type Input: Send + 'static;
    type Output: Send + 'static;

    /// Processes a single input item.
    ///
    /// Returns `Ok(Some(output))` on success, `Ok(None)` when the item is
    /// absorbed (filtered, degraded or stale), or `Err` on failure.
    fn process(&mut self, input: Self::Input) -> Result<Option<Self::Output>, StationError>;

    /// Name for logging and error reporting.
    fn name(&self) -> &'static str;

    /// Called once when the station shuts down.
    fn shutdown(&mut self) {}
}

/// Drives a station on a dedicated thread until its input channel closes or
/// a fatal error stops it.
///
/// The station moves into the thread and comes back out of [`join`], so a
/// caller can inspect state the station accumulated while running.
///
/// [`join`]: StationRunner::join
pub struct StationRunner<S: Station> {
    handle: JoinHandle<S>,
    station_name: &'static str,
}

impl<S: Station> StationRunner<S> {
    pub fn spawn(
        station: S,
        input_rx: Receiver<S::Input>,
        output_tx: Sender<S::Output>,
        error_reporter: Arc<dyn ErrorReporter>,
    ) -> Self {
        let station_name = station.name();
        let handle = thread::spawn(move || run(station, input_rx, output_tx, error_reporter));
        Self {
            handle,
            station_name,
        }
    }

    /// Waits for the station thread to finish and returns the station.
    pub fn join(self) -> Result<S, String> {
        self.handle
            .join()
            .map_err(|_| format!("station '{}' thread panicked", self.station_name))
    }

    pub fn name(&self) -> &'static str {
        self.station_name
    }
}

fn run<S: Station>(
    mut station: S,
    input_rx: Receiver<S::Input>,
    output_tx: Sender<S::Output>,
    error_reporter: Arc<dyn ErrorReporter>,
) -> S {
    loop {
        // Upstream hung up: normal end of stream.
        let Ok(input) = input_rx.recv() else { break };

        match station.process(input) {
            Ok(Some(output)) => {
                // Downstream hung up: nothing left to produce for.
                if output_tx.send(output).is_err() {
                    break;
                }
            }
            Ok(None) => {}
            Err(err) => {
                let fatal = matches!(err, StationError::Fatal(_));
                error_reporter.report(station.name(), &err);
                if fatal {
                    break;
                }
            }
        }
    }

    station.shutdown();
    station
}
