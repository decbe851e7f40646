//! Configuration structs with sensible defaults and RON persistence.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use nimbus_core::{Aabb, EntityType};
use nimbus_lod::{
    ImportanceTable, LoadMonitor, LoadMonitorConfig, LodError, LodProfile, LodScheduler,
    LodSettings, LodThresholds,
};
use nimbus_spatial::{MaintenanceMode, QuadtreeConfig, SpatialIndex, SpatialIndexConfig};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const CONFIG_FILE: &str = "config.ron";

/// Top-level configuration of the performance layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Quadtree limits and rebuild policy.
    pub spatial: SpatialConfig,
    /// Effect pool capacities.
    pub pool: PoolConfig,
    /// LOD bands, profiles and load monitoring.
    pub lod: LodConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Which maintenance policy the spatial index runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaintenanceStrategy {
    /// Rebuild the whole tree every `rebuild_interval_secs`.
    #[default]
    Periodic,
    /// Reinsert on every move.
    Incremental,
}

/// Spatial index configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SpatialConfig {
    /// Root rectangle covering the playable world.
    pub world: Aabb,
    /// A leaf splits once it holds more than this many objects.
    pub max_objects_per_node: usize,
    /// Deepest level a node may split to.
    pub max_depth: u32,
    /// Move propagation policy.
    pub maintenance: MaintenanceStrategy,
    /// Seconds between full rebuilds in periodic mode.
    pub rebuild_interval_secs: f32,
}

/// Free-list capacity per effect kind.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PoolConfig {
    /// Floating damage/heal numbers.
    pub floating_text: usize,
    /// Generic shapes.
    pub shape: usize,
    /// Vector graphics.
    pub vector_graphics: usize,
    /// Particles.
    pub spark: usize,
    /// Fill every free list to capacity at startup.
    pub prewarm: bool,
}

/// LOD configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LodConfig {
    /// Band boundaries.
    pub thresholds: LodThresholds,
    /// Space around the viewport that still counts as on-screen.
    pub margin: f32,
    /// Initial viewport rectangle until the host reports one.
    pub viewport: Aabb,
    /// Profile under ordinary load.
    pub normal: LodProfile,
    /// Profile in emergency mode.
    pub emergency: LodProfile,
    /// Importance overrides on top of the built-in table.
    pub importance: BTreeMap<EntityType, u8>,
    /// Load monitor window and thresholds.
    pub monitor: LoadMonitorConfig,
    /// Let the load monitor toggle emergency mode.
    pub auto_emergency: bool,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
    /// Log a stats line every this many frames (0 disables).
    pub log_stats_every_frames: u32,
}

// --- Default implementations ---

impl Default for SpatialConfig {
    fn default() -> Self {
        Self {
            world: Aabb::new(0.0, 0.0, 4096.0, 4096.0),
            max_objects_per_node: 10,
            max_depth: 6,
            maintenance: MaintenanceStrategy::Periodic,
            rebuild_interval_secs: 0.25,
        }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            floating_text: 64,
            shape: 32,
            vector_graphics: 16,
            spark: 128,
            prewarm: false,
        }
    }
}

impl Default for LodConfig {
    fn default() -> Self {
        Self {
            thresholds: LodThresholds::default(),
            margin: 100.0,
            viewport: Aabb::new(0.0, 0.0, 1280.0, 720.0),
            normal: LodProfile::normal(),
            emergency: LodProfile::emergency(),
            importance: BTreeMap::new(),
            monitor: LoadMonitorConfig::default(),
            auto_emergency: true,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_stats_every_frames: 300,
        }
    }
}

// --- Conversions into subsystem settings ---

impl SpatialConfig {
    /// Maintenance mode for the spatial index.
    pub fn maintenance_mode(&self) -> MaintenanceMode {
        match self.maintenance {
            MaintenanceStrategy::Periodic => MaintenanceMode::Periodic {
                interval: self.rebuild_interval_secs,
            },
            MaintenanceStrategy::Incremental => MaintenanceMode::Incremental,
        }
    }

    /// Construction parameters for [`SpatialIndex::new`].
    pub fn index_config(&self) -> SpatialIndexConfig {
        SpatialIndexConfig {
            tree: QuadtreeConfig {
                bounds: self.world,
                max_objects: self.max_objects_per_node,
                max_depth: self.max_depth,
            },
            maintenance: self.maintenance_mode(),
        }
    }
}

impl LodConfig {
    /// Built-in importance table with the configured overrides applied.
    pub fn importance_table(&self) -> Result<ImportanceTable, LodError> {
        ImportanceTable::with_overrides(self.importance.iter().map(|(&ty, &w)| (ty, w)))
    }

    /// Settings for [`LodScheduler::new`].
    pub fn settings(&self) -> Result<LodSettings, LodError> {
        Ok(LodSettings {
            thresholds: self.thresholds,
            margin: self.margin,
            normal: self.normal,
            emergency: self.emergency,
            importance: self.importance_table()?,
        })
    }
}

/// Platform config directory for nimbus, or the working directory if the
/// platform has none.
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("nimbus")
}

// --- Load / Save / Reload ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
            let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join(CONFIG_FILE);
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(4)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);
        let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
        let new_config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }

    /// Reject values the subsystems would refuse at construction.
    pub fn validate(&self) -> Result<(), ConfigError> {
        SpatialIndex::<()>::new(self.spatial.index_config()).map_err(invalid)?;
        let settings = self.lod.settings().map_err(invalid)?;
        LodScheduler::new(settings, self.lod.viewport).map_err(invalid)?;
        LoadMonitor::new(self.lod.monitor).map_err(invalid)?;
        if !(self.lod.margin >= 0.0 && self.lod.margin.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "viewport margin must be finite and non-negative, got {}",
                self.lod.margin
            )));
        }
        Ok(())
    }
}

fn invalid(err: impl std::fmt::Display) -> ConfigError {
    ConfigError::Invalid(err.to_string())
}
