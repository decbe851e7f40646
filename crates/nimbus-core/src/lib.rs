//! Shared leaf types for the Nimbus performance layer: axis-aligned bounds,
//! the closed entity-type enumeration, and the per-frame tick.

mod aabb;
mod entity_type;
mod time;

pub use aabb::{Aabb, spans_overlap};
pub use entity_type::EntityType;
pub use glam::Vec2;
pub use time::FrameTick;
