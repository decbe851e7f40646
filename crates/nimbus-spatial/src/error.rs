//! Spatial index construction errors.

use nimbus_core::Aabb;

/// Errors raised while building a quadtree or spatial index.
///
/// Runtime operations never fail; only construction is validated.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SpatialError {
    /// The root rectangle is empty or not finite.
    #[error("quadtree root must be finite with positive extent, got {0:?}")]
    InvalidRoot(Aabb),

    /// `max_objects_per_node` was zero.
    #[error("max objects per node must be at least 1")]
    InvalidNodeCapacity,

    /// The periodic rebuild interval was negative or not finite.
    #[error("rebuild interval must be a finite, non-negative number of seconds, got {0}")]
    InvalidRebuildInterval(f32),
}
