//! Spatial index manager: entity registry plus a quadtree kept current by an
//! explicit maintenance policy.

use nimbus_core::{Aabb, EntityType, FrameTick, Vec2};
use serde::{Deserialize, Serialize};

use crate::{EntityHandle, EntityRecord, Quadtree, QuadtreeConfig, Registry, SpatialError};

/// How moves reach the quadtree.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MaintenanceMode {
    /// Moves only record the latest bounds. The whole tree is cleared and
    /// rebuilt from latest bounds every `interval` seconds, so queries lag
    /// behind movement by at most one interval.
    Periodic {
        /// Seconds between rebuilds.
        interval: f32,
    },
    /// Every move removes and reinserts the entity immediately.
    Incremental,
}

impl Default for MaintenanceMode {
    fn default() -> Self {
        MaintenanceMode::Periodic { interval: 0.25 }
    }
}

/// Construction parameters for a [`SpatialIndex`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpatialIndexConfig {
    /// Quadtree limits and root rectangle.
    pub tree: QuadtreeConfig,
    /// Move propagation policy.
    pub maintenance: MaintenanceMode,
}

/// Diagnostics snapshot of a [`SpatialIndex`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpatialStats {
    /// Registered entities.
    pub indexed_count: usize,
    /// Depth of the deepest quadtree node.
    pub tree_depth: u32,
    /// Quadtree nodes including the root.
    pub node_count: usize,
    /// Entities whose latest bounds are not yet in the tree.
    pub pending_moves: usize,
    /// Full rebuilds performed since construction.
    pub rebuilds: u64,
}

/// Registry of entities and the quadtree over their bounds.
///
/// Register/unregister always touch the tree immediately so queries never
/// return handles that no longer resolve. Only moves are subject to the
/// [`MaintenanceMode`].
#[derive(Debug, Clone)]
pub struct SpatialIndex<O> {
    tree: Quadtree<EntityHandle>,
    registry: Registry<O>,
    mode: MaintenanceMode,
    since_rebuild: f32,
    pending_moves: usize,
    rebuilds: u64,
}

impl<O> SpatialIndex<O> {
    /// Build an empty index.
    pub fn new(config: SpatialIndexConfig) -> Result<Self, SpatialError> {
        if let MaintenanceMode::Periodic { interval } = config.maintenance
            && !(interval.is_finite() && interval >= 0.0)
        {
            return Err(SpatialError::InvalidRebuildInterval(interval));
        }
        Ok(Self {
            tree: Quadtree::new(config.tree)?,
            registry: Registry::new(),
            mode: config.maintenance,
            since_rebuild: 0.0,
            pending_moves: 0,
            rebuilds: 0,
        })
    }

    /// Active maintenance policy.
    pub fn mode(&self) -> MaintenanceMode {
        self.mode
    }

    /// Track a new entity and index it immediately.
    pub fn register(&mut self, owner: O, bounds: Aabb, tag: EntityType) -> EntityHandle {
        let handle = self.registry.insert(EntityRecord::new(owner, tag, bounds));
        self.tree.insert(handle, bounds);
        handle
    }

    /// Stop tracking an entity and hand back its owner reference.
    ///
    /// Returns `None` for unknown or stale handles.
    pub fn unregister(&mut self, handle: EntityHandle) -> Option<O> {
        let record = self.registry.remove(handle)?;
        if record.pending {
            self.pending_moves -= 1;
        }
        if !self.tree.remove(&handle, &record.indexed_bounds) {
            tracing::warn!("Entity {:?} was registered but missing from the quadtree", handle);
        }
        Some(record.owner)
    }

    /// Report new bounds for an entity. Returns `false` for unknown handles.
    ///
    /// In periodic mode the tree keeps the old bounds until the next rebuild.
    pub fn move_to(&mut self, handle: EntityHandle, bounds: Aabb) -> bool {
        let Some(record) = self.registry.get_mut(handle) else {
            return false;
        };
        match self.mode {
            MaintenanceMode::Incremental => {
                self.tree.update(handle, &record.indexed_bounds, bounds);
                record.indexed_bounds = bounds;
                record.bounds = bounds;
            }
            MaintenanceMode::Periodic { .. } => {
                let was_pending = record.pending;
                record.bounds = bounds;
                record.pending = bounds != record.indexed_bounds;
                match (was_pending, record.pending) {
                    (false, true) => self.pending_moves += 1,
                    (true, false) => self.pending_moves -= 1,
                    _ => {}
                }
            }
        }
        true
    }

    /// Look up a registered entity.
    pub fn get(&self, handle: EntityHandle) -> Option<&EntityRecord<O>> {
        self.registry.get(handle)
    }

    /// Whether `handle` is registered.
    pub fn contains(&self, handle: EntityHandle) -> bool {
        self.registry.contains(handle)
    }

    /// Iterate over registered entities.
    pub fn iter(&self) -> impl Iterator<Item = (EntityHandle, &EntityRecord<O>)> {
        self.registry.iter()
    }

    /// Handles whose indexed bounds intersect `rect`.
    pub fn query_range(&self, rect: &Aabb) -> Vec<EntityHandle> {
        self.tree.retrieve(rect).into_iter().map(|e| e.item).collect()
    }

    /// Handles whose indexed bounds center lies within `radius` of `center`.
    pub fn query_radius(&self, center: Vec2, radius: f32) -> Vec<EntityHandle> {
        self.tree
            .retrieve_in_radius(center, radius)
            .into_iter()
            .map(|e| e.item)
            .collect()
    }

    /// Closest entity to `center` within `max_distance`, skipping `exclude`.
    pub fn query_nearest(
        &self,
        center: Vec2,
        max_distance: f32,
        exclude: Option<EntityHandle>,
    ) -> Option<EntityHandle> {
        self.tree
            .find_nearest(center, max_distance, exclude.as_ref())
            .map(|e| e.item)
    }

    /// Advance the rebuild timer. Returns `true` if a rebuild ran this tick.
    pub fn tick(&mut self, tick: &FrameTick) -> bool {
        let MaintenanceMode::Periodic { interval } = self.mode else {
            return false;
        };
        self.since_rebuild += tick.delta;
        if self.since_rebuild < interval {
            return false;
        }
        self.since_rebuild = 0.0;
        self.rebuild();
        true
    }

    /// Clear the tree and reinsert every entity at its latest bounds.
    pub fn rebuild(&mut self) {
        self.tree.clear();
        for (handle, record) in self.registry.iter_mut() {
            record.indexed_bounds = record.bounds;
            record.pending = false;
            self.tree.insert(handle, record.bounds);
        }
        self.pending_moves = 0;
        self.rebuilds += 1;
        tracing::debug!(
            "Spatial index rebuilt: {} entities, depth {}, {} nodes",
            self.tree.len(),
            self.tree.depth(),
            self.tree.node_count()
        );
    }

    /// Drop every entity and collapse the tree. Outstanding handles stop resolving.
    pub fn clear(&mut self) {
        self.tree.clear();
        self.registry.clear();
        self.since_rebuild = 0.0;
        self.pending_moves = 0;
    }

    /// Number of registered entities.
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    /// Whether no entities are registered.
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Diagnostics snapshot.
    pub fn stats(&self) -> SpatialStats {
        SpatialStats {
            indexed_count: self.registry.len(),
            tree_depth: self.tree.depth(),
            node_count: self.tree.node_count(),
            pending_moves: self.pending_moves,
            rebuilds: self.rebuilds,
        }
    }

    /// Number of quadtree nodes holding `handle`; 1 for every registered entity.
    pub fn node_occurrences(&self, handle: EntityHandle) -> usize {
        self.tree.occurrences(&handle)
    }

    /// Underlying quadtree.
    pub fn tree(&self) -> &Quadtree<EntityHandle> {
        &self.tree
    }
}
