//! Facade construction errors.

use nimbus_config::ConfigError;
use nimbus_lod::LodError;
use nimbus_spatial::SpatialError;

/// Errors raised while assembling a [`crate::PerformanceLayer`].
#[derive(Debug, thiserror::Error)]
pub enum PerfError {
    /// Loading or validating configuration failed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The spatial index rejected its parameters.
    #[error("spatial index: {0}")]
    Spatial(#[from] SpatialError),

    /// The LOD scheduler or load monitor rejected its parameters.
    #[error("lod: {0}")]
    Lod(#[from] LodError),
}
