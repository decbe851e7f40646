//! Command-line argument parsing for the nimbus demo.

use std::path::PathBuf;

use clap::Parser;

use crate::{Config, MaintenanceStrategy};

/// Nimbus command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "nimbus", about = "Nimbus performance layer demo")]
pub struct CliArgs {
    /// Objects a quadtree leaf holds before splitting.
    #[arg(long)]
    pub max_objects_per_node: Option<usize>,

    /// Deepest quadtree level.
    #[arg(long)]
    pub max_depth: Option<u32>,

    /// Seconds between periodic rebuilds. Zero rebuilds every tick.
    #[arg(long)]
    pub rebuild_interval: Option<f32>,

    /// Reinsert on every move instead of rebuilding periodically.
    #[arg(long)]
    pub incremental: bool,

    /// Start in LOD emergency mode.
    #[arg(long)]
    pub emergency: bool,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Frames to simulate.
    #[arg(long, default_value_t = 600)]
    pub frames: u64,

    /// Synthetic actors to spawn.
    #[arg(long, default_value_t = 500)]
    pub entities: usize,

    /// Workload RNG seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    ///
    /// `frames`, `entities`, `seed` and `emergency` drive the run itself and
    /// are read from the arguments directly.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(n) = args.max_objects_per_node {
            self.spatial.max_objects_per_node = n;
        }
        if let Some(depth) = args.max_depth {
            self.spatial.max_depth = depth;
        }
        if let Some(interval) = args.rebuild_interval {
            self.spatial.rebuild_interval_secs = interval;
        }
        if args.incremental {
            self.spatial.maintenance = MaintenanceStrategy::Incremental;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_override() {
        let mut config = Config::default();
        let args = CliArgs {
            max_objects_per_node: Some(4),
            rebuild_interval: Some(0.5),
            log_level: Some("debug".to_string()),
            ..CliArgs::default()
        };
        config.apply_cli_overrides(&args);
        assert_eq!(config.spatial.max_objects_per_node, 4);
        assert_eq!(config.spatial.rebuild_interval_secs, 0.5);
        assert_eq!(config.debug.log_level, "debug");
        // Non-overridden fields retain defaults
        assert_eq!(config.spatial.max_depth, 6);
        assert_eq!(config.spatial.maintenance, MaintenanceStrategy::Periodic);
    }

    #[test]
    fn test_cli_no_override() {
        let original = Config::default();
        let mut config = Config::default();
        config.apply_cli_overrides(&CliArgs::default());
        assert_eq!(config, original);
    }

    #[test]
    fn test_cli_parses_flags() {
        let args = CliArgs::parse_from([
            "nimbus",
            "--max-depth",
            "3",
            "--incremental",
            "--frames",
            "10",
        ]);
        assert_eq!(args.max_depth, Some(3));
        assert!(args.incremental);
        assert!(!args.emergency);
        assert_eq!(args.frames, 10);
        assert_eq!(args.entities, 500);

        let mut config = Config::default();
        config.apply_cli_overrides(&args);
        assert_eq!(config.spatial.maintenance, MaintenanceStrategy::Incremental);
        assert_eq!(config.spatial.max_depth, 3);
    }
}
