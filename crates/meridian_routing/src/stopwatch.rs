use std::time::{Duration, Instant};

use tracing::debug;

/// Accumulating stopwatch for profiling phases that run many times
pub struct Stopwatch {
    name: &'static str,
    started_at: Option<Instant>,
    total: Duration,
    laps: usize,
}

impl Stopwatch {
    pub fn new(name: &'static str) -> Self {
        Stopwatch {
            name,
            started_at: None,
            total: Duration::ZERO,
            laps: 0,
        }
    }

    pub fn started(name: &'static str) -> Self {
        let mut stopwatch = Self::new(name);
        stopwatch.start();
        stopwatch
    }

    pub fn start(&mut self) {
        self.started_at = Some(Instant::now());
    }

    pub fn stop(&mut self) {
        if let Some(started_at) = self.started_at.take() {
            self.total += started_at.elapsed();
            self.laps += 1;
        }
    }

    /// Time accumulated over all laps, including the running one
    pub fn total_duration(&self) -> Duration {
        match self.started_at {
            Some(started_at) => self.total + started_at.elapsed(),
            None => self.total,
        }
    }

    pub fn laps(&self) -> usize {
        self.laps
    }

    pub fn report(&self) {
        debug!(
            stopwatch = self.name,
            laps = self.laps,
            "{:?}",
            self.total_duration()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulates_laps() {
        let mut stopwatch = Stopwatch::new("test");
        stopwatch.start();
        stopwatch.stop();
        stopwatch.start();
        stopwatch.stop();
        stopwatch.stop();
        assert_eq!(stopwatch.laps(), 2);
        assert!(stopwatch.started_at.is_none());
    }
}
