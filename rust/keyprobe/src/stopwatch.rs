use std::time::{Duration, Instant};

/// A wall-clock stopwatch.
///
/// Elapsed time accumulates across `start`/`stop` pairs. While running,
/// [`elapsed`](Stopwatch::elapsed) includes the current interval.
#[derive(Debug, Clone, Default)]
pub struct Stopwatch {
    started_at: Option<Instant>,
    elapsed: Duration,
}

impl Stopwatch {
    /// Creates a stopped stopwatch with zero elapsed time.
    pub fn new() -> Stopwatch {
        Stopwatch::default()
    }

    pub fn start_new() -> Stopwatch {
        let mut stopwatch = Stopwatch::new();
        stopwatch.start();
        stopwatch
    }

    /// Starts measuring. A no-op if already running.
    pub fn start(&mut self) {
        if self.started_at.is_none() {
            self.started_at = Some(Instant::now());
        }
    }

    /// Freezes the elapsed time. A no-op if already stopped.
    pub fn stop(&mut self) {
        if let Some(started_at) = self.started_at.take() {
            self.elapsed += started_at.elapsed();
        }
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn elapsed(&self) -> Duration {
        match self.started_at {
            Some(started_at) => self.elapsed + started_at.elapsed(),
            None => self.elapsed,
        }
    }

    /// Stops the stopwatch and clears the elapsed time.
    pub fn reset(&mut self) {
        self.started_at = None;
        self.elapsed = Duration::ZERO;
    }
}
