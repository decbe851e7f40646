//! Configuration for the nimbus performance layer.
//!
//! Settings persist to disk as RON, accept CLI overrides via clap, and are
//! validated against the same rules the subsystems enforce at construction.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    Config, DebugConfig, LodConfig, MaintenanceStrategy, PoolConfig, SpatialConfig,
    default_config_dir,
};
pub use error::ConfigError;
