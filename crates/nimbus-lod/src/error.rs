//! LOD configuration errors.

use nimbus_core::EntityType;

/// Errors raised while building LOD tables and profiles.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LodError {
    /// An importance weight outside `0..=10`.
    #[error("importance for {entity} must be in 0..=10, got {value}")]
    ImportanceOutOfRange {
        /// Entity type the weight was given for.
        entity: EntityType,
        /// Rejected weight.
        value: u8,
    },

    /// Band thresholds that are not positive and strictly increasing.
    #[error("distance thresholds must be positive and strictly increasing, got {near}/{medium}/{far}")]
    InvalidThresholds {
        /// Near band limit.
        near: f32,
        /// Medium band limit.
        medium: f32,
        /// Far band limit.
        far: f32,
    },

    /// A quality multiplier outside `[0, 1]`.
    #[error("quality multiplier must be in [0, 1], got {0}")]
    InvalidQuality(f32),

    /// An update stride of zero frames.
    #[error("update stride must be at least 1 frame")]
    InvalidStride,

    /// A profile importance gate outside its allowed range.
    #[error("{gate} must be in {min}..=10, got {value}")]
    InvalidImportanceGate {
        /// Profile field name.
        gate: &'static str,
        /// Smallest accepted value.
        min: u8,
        /// Rejected value.
        value: u8,
    },

    /// Inconsistent load monitor thresholds.
    #[error("invalid load monitor settings: {0}")]
    InvalidMonitor(&'static str),
}
