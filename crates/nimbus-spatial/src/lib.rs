//! Spatial indexing: a region quadtree over entity bounds and a manager that
//! owns the entity registry and keeps the tree current.

mod error;
mod index;
mod quadtree;
mod registry;

pub use error::SpatialError;
pub use index::{MaintenanceMode, SpatialIndex, SpatialIndexConfig, SpatialStats};
pub use quadtree::{QuadEntry, QuadNode, Quadtree, QuadtreeConfig, quadrant_index};
pub use registry::{EntityHandle, EntityRecord, Registry};
