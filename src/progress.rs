//! Progress ring arithmetic
//!
//! The ring advances by a fixed percentage on every timer tick:
//! `tick / max_duration * 100`. A 15 s clip with 100 ms ticks moves about
//! 0.67% per tick and closes after 150 ticks.

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressRing {
    max_duration: Duration,
    tick_interval: Duration,
    ticks: u32,
}

impl ProgressRing {
    pub fn new(max_duration: Duration, tick_interval: Duration) -> Self {
        Self {
            max_duration,
            tick_interval,
            ticks: 0,
        }
    }

    pub fn from_settings(max_duration_secs: u32, tick_interval_ms: u64) -> Self {
        Self::new(
            Duration::from_secs(max_duration_secs as u64),
            Duration::from_millis(tick_interval_ms),
        )
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    pub fn max_duration(&self) -> Duration {
        self.max_duration
    }

    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    /// Percentage added per tick
    pub fn step_percent(&self) -> f64 {
        if self.max_duration.is_zero() {
            return 100.0;
        }
        self.tick_interval.as_secs_f64() / self.max_duration.as_secs_f64() * 100.0
    }

    /// Progress in percent, capped at 100
    pub fn percent(&self) -> f64 {
        (self.ticks as f64 * self.step_percent()).min(100.0)
    }

    /// Arc to draw, clockwise from twelve o'clock
    pub fn sweep_degrees(&self) -> f64 {
        self.percent() / 100.0 * 360.0
    }

    pub fn elapsed(&self) -> Duration {
        self.tick_interval * self.ticks
    }

    pub fn is_complete(&self) -> bool {
        self.ticks as f64 * self.step_percent() >= 100.0 - 1e-9
    }

    /// Advance one tick; returns true once the ring is full
    pub fn tick(&mut self) -> bool {
        if !self.is_complete() {
            self.ticks += 1;
        }
        self.is_complete()
    }

    pub fn reset(&mut self) {
        self.ticks = 0;
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            ticks: self.ticks,
            percent: self.percent(),
            sweep_degrees: self.sweep_degrees(),
            elapsed_ms: self.elapsed().as_millis() as u64,
        }
    }
}

/// Serializable view of the ring for the UI
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub ticks: u32,
    pub percent: f64,
    pub sweep_degrees: f64,
    pub elapsed_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_step() {
        let ring = ProgressRing::from_settings(15, 100);
        assert!((ring.step_percent() - 100.0 / 150.0).abs() < 1e-9);
    }

    #[test]
    fn test_five_seconds_is_a_third() {
        let mut ring = ProgressRing::from_settings(15, 100);
        for _ in 0..50 {
            assert!(!ring.tick());
        }
        assert!((ring.percent() - 33.333).abs() < 0.01);
        assert!((ring.sweep_degrees() - 120.0).abs() < 0.01);
        assert_eq!(ring.elapsed(), Duration::from_secs(5));
    }

    #[test]
    fn test_completes_at_max_duration() {
        let mut ring = ProgressRing::from_settings(1, 100);
        for _ in 0..9 {
            assert!(!ring.tick());
        }
        assert!(ring.tick());
        assert_eq!(ring.ticks(), 10);
        assert!(ring.tick());
        assert_eq!(ring.ticks(), 10);
        assert!((ring.percent() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_reset() {
        let mut ring = ProgressRing::from_settings(15, 100);
        ring.tick();
        ring.reset();
        assert_eq!(ring.snapshot().ticks, 0);
        assert_eq!(ring.snapshot().sweep_degrees, 0.0);
    }
}
