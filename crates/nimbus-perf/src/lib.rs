//! Performance-management layer for a real-time 2D simulation.
//!
//! [`PerformanceLayer`] is the host-facing facade. It owns a quadtree spatial
//! index, a per-kind effect pool and a LOD scheduler with automatic
//! emergency mode, and exposes them through one per-frame API.

mod effect;
mod error;
mod layer;

pub use effect::{EffectInstance, EffectKind, EffectParams};
pub use error::PerfError;
pub use layer::{DefaultFactory, EffectPool, PerfStats, PerformanceLayer, TickReport};

pub use nimbus_core::{Aabb, EntityType, FrameTick, Vec2};
pub use nimbus_lod::{LoadTransition, LodBand, LodRecord};
pub use nimbus_pool::InstanceId;
pub use nimbus_spatial::EntityHandle;
