//! Level-of-detail scheduling: distance bands, importance weights, update
//! stride gating, and load-driven emergency mode.

mod bands;
mod error;
mod importance;
mod load_monitor;
mod scheduler;

pub use bands::{BandSettings, LodBand, LodProfile, LodThresholds, MIN_VIP_IMPORTANCE};
pub use error::LodError;
pub use importance::{ImportanceTable, MAX_IMPORTANCE};
pub use load_monitor::{LoadMonitor, LoadMonitorConfig, LoadTransition};
pub use scheduler::{LodFrameStats, LodRecord, LodScheduler, LodSettings};
