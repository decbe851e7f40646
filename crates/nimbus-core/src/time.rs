//! Per-frame timing handed in by the host loop.

/// Timing for a single frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameTick {
    /// Seconds since the host started.
    pub time: f64,
    /// Seconds elapsed since the previous frame.
    pub delta: f32,
}

impl FrameTick {
    /// Create a tick from absolute time and delta.
    pub fn new(time: f64, delta: f32) -> Self {
        Self {
            time,
            delta: delta.max(0.0),
        }
    }

    /// The tick that follows this one after `delta` seconds.
    pub fn advance(&self, delta: f32) -> Self {
        Self::new(self.time + delta as f64, delta)
    }
}
