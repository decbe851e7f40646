//! Host-facing facade that composes the spatial index, effect pool and LOD
//! scheduler behind one per-frame API.

use nimbus_config::{Config, PoolConfig};
use nimbus_core::{Aabb, EntityType, FrameTick, Vec2};
use nimbus_lod::{LoadMonitor, LoadTransition, LodFrameStats, LodRecord, LodScheduler};
use nimbus_pool::{InstanceFactory, InstanceId, ObjectPool, PoolStats, ReleaseOutcome};
use nimbus_spatial::{EntityHandle, EntityRecord, SpatialIndex, SpatialStats};

use crate::{EffectInstance, EffectKind, EffectParams, PerfError};

/// Pool of effect instances keyed by [`EffectKind`].
pub type EffectPool<F> = ObjectPool<EffectKind, EffectInstance, F>;

/// Factory used when the host does not supply one.
pub type DefaultFactory = fn(EffectKind) -> EffectInstance;

/// Snapshot of the layer's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PerfStats {
    /// Registered entities.
    pub indexed_count: usize,
    /// Depth of the deepest quadtree node.
    pub tree_depth: u32,
    /// Effect instances currently handed out.
    pub pool_active: usize,
    /// Effect instances waiting for reuse.
    pub pool_free: usize,
    /// Classifications this frame that produced quality 0.
    pub culled_count: usize,
    /// Classifications this frame with quality strictly between 0 and 1.
    pub simplified_count: usize,
    /// Emergency profile in effect.
    pub emergency: bool,
    /// Global LOD frame counter.
    pub frame: u64,
}

/// What happened during one [`PerformanceLayer::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TickReport {
    /// The spatial index ran a full rebuild.
    pub rebuilt: bool,
    /// LOD counters of the frame that just ended.
    pub finished: LodFrameStats,
    /// Load state change reported by the monitor.
    pub transition: Option<LoadTransition>,
}

/// The performance-management layer.
///
/// `O` is the host's opaque owner reference stored with each entity. `F`
/// builds effect instances when a kind's free list is empty.
pub struct PerformanceLayer<O, F = DefaultFactory> {
    spatial: SpatialIndex<O>,
    pool: EffectPool<F>,
    lod: LodScheduler,
    monitor: LoadMonitor,
    auto_emergency: bool,
}

impl<O> PerformanceLayer<O> {
    /// Build the layer from configuration with the default effect factory.
    pub fn from_config(config: &Config) -> Result<Self, PerfError> {
        Self::with_factory(config, EffectInstance::new as DefaultFactory)
    }
}

impl<O, F> PerformanceLayer<O, F>
where
    F: InstanceFactory<EffectKind, EffectInstance>,
{
    /// Build the layer from configuration with a host-supplied effect factory.
    pub fn with_factory(config: &Config, factory: F) -> Result<Self, PerfError> {
        let spatial = SpatialIndex::new(config.spatial.index_config())?;
        let lod = LodScheduler::new(config.lod.settings()?, config.lod.viewport)?;
        let monitor = LoadMonitor::new(config.lod.monitor)?;

        let mut pool = ObjectPool::new(factory, 0);
        for kind in EffectKind::ALL {
            let capacity = pool_capacity(&config.pool, kind);
            pool.set_capacity(kind, capacity);
            if config.pool.prewarm {
                pool.prewarm(kind, capacity);
            }
        }

        tracing::info!(
            "Performance layer ready: world {:?}, {:?}",
            config.spatial.world,
            spatial.mode()
        );

        Ok(Self {
            spatial,
            pool,
            lod,
            monitor,
            auto_emergency: config.lod.auto_emergency,
        })
    }

    // --- Spatial index ---

    /// Start tracking an entity.
    pub fn register(&mut self, owner: O, bounds: Aabb, tag: EntityType) -> EntityHandle {
        self.spatial.register(owner, bounds, tag)
    }

    /// Stop tracking an entity. Returns `false` for unknown or stale handles.
    pub fn unregister(&mut self, handle: EntityHandle) -> bool {
        self.spatial.unregister(handle).is_some()
    }

    /// Report new bounds for an entity. Returns `false` for unknown handles.
    pub fn move_entity(&mut self, handle: EntityHandle, bounds: Aabb) -> bool {
        self.spatial.move_to(handle, bounds)
    }

    /// Record of a registered entity.
    pub fn entity(&self, handle: EntityHandle) -> Option<&EntityRecord<O>> {
        self.spatial.get(handle)
    }

    /// Entities whose bounds intersect `rect`.
    pub fn query_range(&self, rect: &Aabb) -> Vec<EntityHandle> {
        self.spatial.query_range(rect)
    }

    /// Entities whose bounds center lies within `radius` of `center`.
    pub fn query_radius(&self, center: Vec2, radius: f32) -> Vec<EntityHandle> {
        self.spatial.query_radius(center, radius)
    }

    /// Closest entity within `max_distance`, skipping `exclude`.
    pub fn query_nearest(
        &self,
        center: Vec2,
        max_distance: f32,
        exclude: Option<EntityHandle>,
    ) -> Option<EntityHandle> {
        self.spatial.query_nearest(center, max_distance, exclude)
    }

    // --- Effect pool ---

    /// Hand out an effect of `kind` initialised from `params`. Never fails.
    pub fn acquire(&mut self, kind: EffectKind, params: &EffectParams) -> InstanceId {
        self.pool.acquire(kind, params)
    }

    /// Return an effect. Returns `false` for unknown or already released ids.
    pub fn release(&mut self, id: InstanceId) -> bool {
        match self.pool.release(id) {
            ReleaseOutcome::Retained => true,
            ReleaseOutcome::Destroyed(instance) => {
                tracing::trace!("Dropped {} effect after {} uses", instance.kind(), instance.uses());
                true
            }
            ReleaseOutcome::Ignored => false,
        }
    }

    /// Active effect behind `id`.
    pub fn effect(&self, id: InstanceId) -> Option<&EffectInstance> {
        self.pool.get(id)
    }

    /// Active effect behind `id`, mutably.
    pub fn effect_mut(&mut self, id: InstanceId) -> Option<&mut EffectInstance> {
        self.pool.get_mut(id)
    }

    /// Pool counters for one kind.
    pub fn pool_stats(&self, kind: EffectKind) -> PoolStats {
        self.pool.stats(kind)
    }

    // --- LOD ---

    /// Classify a point for an entity of type `tag`.
    pub fn classify(&mut self, point: Vec2, tag: EntityType) -> LodRecord {
        self.lod.classify(point, tag)
    }

    /// Classify a registered entity by the center of its latest bounds.
    pub fn classify_entity(&mut self, handle: EntityHandle) -> Option<LodRecord> {
        let record = self.spatial.get(handle)?;
        let (point, tag) = (record.bounds.center(), record.tag);
        Some(self.lod.classify(point, tag))
    }

    /// Whether work gated by `record` should run this frame.
    pub fn should_update(&self, record: &LodRecord) -> bool {
        self.lod.should_update(record)
    }

    /// Update the viewport and the camera center distances are measured from.
    pub fn set_view(&mut self, viewport: Aabb, camera: Vec2) {
        self.lod.set_viewport(viewport);
        self.lod.set_camera(camera);
    }

    /// Force the emergency profile until disabled or the monitor recovers.
    pub fn enable_emergency_mode(&mut self) {
        self.lod.enable_emergency_mode();
    }

    /// Restore the normal profile until the monitor next reports overload.
    pub fn disable_emergency_mode(&mut self) {
        self.lod.disable_emergency_mode();
    }

    /// Whether the emergency profile is in effect.
    pub fn is_emergency(&self) -> bool {
        self.lod.is_emergency()
    }

    // --- Frame loop ---

    /// End the current frame.
    ///
    /// Advances the rebuild timer, the LOD frame counter and the load monitor.
    /// With automatic emergency enabled, monitor transitions toggle the
    /// emergency profile.
    pub fn tick(&mut self, tick: &FrameTick) -> TickReport {
        let rebuilt = self.spatial.tick(tick);
        let finished = self.lod.advance_frame();
        let transition = self.monitor.record_frame(tick.delta, self.spatial.len());

        if self.auto_emergency {
            match transition {
                Some(LoadTransition::Overloaded) => {
                    tracing::warn!(
                        "Load high (avg frame {:.1} ms, {} entities)",
                        self.monitor.average_frame_time() * 1000.0,
                        self.spatial.len()
                    );
                    self.lod.enable_emergency_mode();
                }
                Some(LoadTransition::Recovered) => self.lod.disable_emergency_mode(),
                None => {}
            }
        }

        TickReport {
            rebuilt,
            finished,
            transition,
        }
    }

    /// Counter snapshot.
    pub fn stats(&self) -> PerfStats {
        let spatial = self.spatial.stats();
        let pool = self.pool.totals();
        let lod = self.lod.frame_stats();
        PerfStats {
            indexed_count: spatial.indexed_count,
            tree_depth: spatial.tree_depth,
            pool_active: pool.active,
            pool_free: pool.free,
            culled_count: lod.culled,
            simplified_count: lod.simplified,
            emergency: self.lod.is_emergency(),
            frame: self.lod.frame(),
        }
    }

    /// Spatial index diagnostics.
    pub fn spatial_stats(&self) -> SpatialStats {
        self.spatial.stats()
    }

    /// Underlying spatial index.
    pub fn spatial(&self) -> &SpatialIndex<O> {
        &self.spatial
    }

    /// Underlying LOD scheduler.
    pub fn lod(&self) -> &LodScheduler {
        &self.lod
    }

    /// Drop every entity, effect and LOD counter.
    pub fn shutdown(&mut self) {
        self.spatial.clear();
        self.pool.clear();
        self.lod.reset();
        self.monitor.reset();
        tracing::info!("Performance layer shut down");
    }
}

fn pool_capacity(config: &PoolConfig, kind: EffectKind) -> usize {
    match kind {
        EffectKind::FloatingText => config.floating_text,
        EffectKind::Shape => config.shape,
        EffectKind::VectorGraphics => config.vector_graphics,
        EffectKind::Spark => config.spark,
    }
}
