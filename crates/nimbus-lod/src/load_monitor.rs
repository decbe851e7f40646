//! Aggregate load tracking that decides when emergency mode should engage.
//!
//! [`LoadMonitor`] keeps a rolling window of frame times and compares the
//! average, together with the live entity count, against enter/exit limits.
//! The exit limit sits below the enter limit so the mode does not flap.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::LodError;

/// Load monitor limits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadMonitorConfig {
    /// Frames averaged. Frame-time limits are only evaluated once the window is full.
    pub window: usize,
    /// Average frame time (seconds) above which the layer is overloaded.
    pub enter_frame_time: f32,
    /// Average frame time (seconds) below which an overloaded layer recovers.
    pub exit_frame_time: f32,
    /// Live entity count above which the layer is overloaded regardless of timing.
    pub entity_ceiling: usize,
}

impl Default for LoadMonitorConfig {
    fn default() -> Self {
        Self {
            window: 60,
            enter_frame_time: 1.0 / 30.0,
            exit_frame_time: 1.0 / 50.0,
            entity_ceiling: 4000,
        }
    }
}

impl LoadMonitorConfig {
    /// Check window size and threshold ordering.
    pub fn validate(&self) -> Result<(), LodError> {
        if self.window == 0 {
            return Err(LodError::InvalidMonitor("window must hold at least one frame"));
        }
        if !(self.exit_frame_time > 0.0 && self.exit_frame_time <= self.enter_frame_time) {
            return Err(LodError::InvalidMonitor(
                "exit frame time must be positive and not above the enter frame time",
            ));
        }
        Ok(())
    }
}

/// Change of load state reported by [`LoadMonitor::record_frame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadTransition {
    /// Load crossed the enter limit.
    Overloaded,
    /// Load fell back under the exit limit.
    Recovered,
}

/// Rolling frame-time and entity-count monitor.
#[derive(Debug, Clone)]
pub struct LoadMonitor {
    config: LoadMonitorConfig,
    samples: VecDeque<f32>,
    sum: f64,
    overloaded: bool,
}

impl LoadMonitor {
    /// Create a monitor with validated limits.
    pub fn new(config: LoadMonitorConfig) -> Result<Self, LodError> {
        config.validate()?;
        Ok(Self {
            samples: VecDeque::with_capacity(config.window),
            config,
            sum: 0.0,
            overloaded: false,
        })
    }

    /// Record one frame. Returns a transition when the load state changes.
    pub fn record_frame(&mut self, frame_time: f32, entity_count: usize) -> Option<LoadTransition> {
        if self.samples.len() == self.config.window
            && let Some(old) = self.samples.pop_front()
        {
            self.sum -= f64::from(old);
        }
        let frame_time = frame_time.max(0.0);
        self.samples.push_back(frame_time);
        self.sum += f64::from(frame_time);

        let window_full = self.samples.len() == self.config.window;
        let average = self.average_frame_time();
        let crowded = entity_count > self.config.entity_ceiling;

        if !self.overloaded {
            let slow = window_full && average > self.config.enter_frame_time;
            if slow || crowded {
                self.overloaded = true;
                return Some(LoadTransition::Overloaded);
            }
        } else {
            let fast = average < self.config.exit_frame_time;
            if fast && !crowded {
                self.overloaded = false;
                return Some(LoadTransition::Recovered);
            }
        }
        None
    }

    /// Mean frame time over the samples currently held.
    pub fn average_frame_time(&self) -> f32 {
        if self.samples.is_empty() {
            0.0
        } else {
            (self.sum / self.samples.len() as f64) as f32
        }
    }

    /// Whether the monitor is currently in the overloaded state.
    pub fn is_overloaded(&self) -> bool {
        self.overloaded
    }

    /// Frames currently sampled.
    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Limits in use.
    pub fn config(&self) -> &LoadMonitorConfig {
        &self.config
    }

    /// Drop all samples and leave the overloaded state.
    pub fn reset(&mut self) {
        self.samples.clear();
        self.sum = 0.0;
        self.overloaded = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monitor(window: usize) -> LoadMonitor {
        LoadMonitor::new(LoadMonitorConfig {
            window,
            enter_frame_time: 0.030,
            exit_frame_time: 0.020,
            entity_ceiling: 100,
        })
        .unwrap()
    }

    /// Slow frames trigger only after the window fills.
    #[test]
    fn test_slow_frames_trigger_after_full_window() {
        let mut m = monitor(4);
        for _ in 0..3 {
            assert_eq!(m.record_frame(0.050, 10), None);
        }
        assert_eq!(m.record_frame(0.050, 10), Some(LoadTransition::Overloaded));
        assert!(m.is_overloaded());
        assert_eq!(m.record_frame(0.050, 10), None);
    }

    /// Recovery needs the average below the exit limit, not just below enter.
    #[test]
    fn test_hysteresis() {
        let mut m = monitor(2);
        m.record_frame(0.040, 10);
        assert_eq!(m.record_frame(0.040, 10), Some(LoadTransition::Overloaded));
        assert_eq!(m.record_frame(0.025, 10), None);
        assert_eq!(m.record_frame(0.018, 10), None);
        assert_eq!(m.record_frame(0.010, 10), Some(LoadTransition::Recovered));
        assert!(!m.is_overloaded());
    }

    #[test]
    fn test_entity_ceiling_triggers_immediately() {
        let mut m = monitor(60);
        assert_eq!(m.record_frame(0.001, 101), Some(LoadTransition::Overloaded));
        assert_eq!(m.record_frame(0.001, 101), None);
        assert_eq!(m.record_frame(0.001, 50), Some(LoadTransition::Recovered));
    }

    #[test]
    fn test_rolling_average() {
        let mut m = monitor(3);
        for t in [0.010, 0.020, 0.030, 0.040] {
            m.record_frame(t, 0);
        }
        assert_eq!(m.sample_count(), 3);
        assert!((m.average_frame_time() - 0.030).abs() < 1e-6);
        m.reset();
        assert_eq!(m.sample_count(), 0);
        assert_eq!(m.average_frame_time(), 0.0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let bad = LoadMonitorConfig {
            exit_frame_time: 0.05,
            enter_frame_time: 0.03,
            ..LoadMonitorConfig::default()
        };
        assert!(LoadMonitor::new(bad).is_err());
        let empty = LoadMonitorConfig {
            window: 0,
            ..LoadMonitorConfig::default()
        };
        assert!(LoadMonitor::new(empty).is_err());
    }
}
