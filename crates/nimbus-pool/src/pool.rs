//! Per-kind free lists over a single instance store.

use std::fmt::Debug;
use std::hash::Hash;
use std::ops::AddAssign;

use rustc_hash::FxHashMap;

/// Implemented by instances the pool can recycle.
pub trait Poolable {
    /// Values applied to an instance every time it is handed out.
    type Params;

    /// Overwrite all mutable visual state from `params` and make the instance live.
    fn reset(&mut self, params: &Self::Params);

    /// Hide the instance and put it in its inactive state.
    fn deactivate(&mut self);
}

/// Host capability that constructs a fresh instance of a kind.
pub trait InstanceFactory<K, T> {
    /// Build a new, not yet initialised instance.
    fn create(&mut self, kind: K) -> T;
}

impl<K, T, F> InstanceFactory<K, T> for F
where
    F: FnMut(K) -> T,
{
    fn create(&mut self, kind: K) -> T {
        self(kind)
    }
}

/// Identity of a pooled instance.
///
/// Assigned once when the instance is constructed and kept across reuse, so
/// two acquisitions returning the same id received the same instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(u64);

impl InstanceId {
    /// Raw serial number.
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Counters for one kind (or summed over all kinds).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolStats {
    /// Instances currently handed out.
    pub active: usize,
    /// Instances waiting in the free list.
    pub free: usize,
    /// Instances constructed through the factory.
    pub created: u64,
    /// Acquisitions served from the free list.
    pub reused: u64,
    /// Instances dropped on release or capacity shrink.
    pub destroyed: u64,
}

impl AddAssign for PoolStats {
    fn add_assign(&mut self, rhs: Self) {
        self.active += rhs.active;
        self.free += rhs.free;
        self.created += rhs.created;
        self.reused += rhs.reused;
        self.destroyed += rhs.destroyed;
    }
}

/// Result of [`ObjectPool::release`].
#[derive(Debug, PartialEq)]
pub enum ReleaseOutcome<T> {
    /// The instance went back onto its kind's free list.
    Retained,
    /// The free list was full; the instance is handed back for final teardown.
    Destroyed(T),
    /// The id was unknown or the instance was not active.
    Ignored,
}

impl<T> ReleaseOutcome<T> {
    /// Whether the instance left the active set.
    pub fn is_released(&self) -> bool {
        !matches!(self, ReleaseOutcome::Ignored)
    }
}

#[derive(Debug)]
struct PoolEntry<K, T> {
    kind: K,
    instance: T,
    active: bool,
}

/// Reuse pool for short-lived instances of several kinds.
///
/// Every stored instance is either active (handed out) or on its kind's free
/// list, never both. Releasing an instance twice without re-acquiring it is a
/// caller error; the pool ignores the second release rather than corrupting
/// the free list.
pub struct ObjectPool<K, T, F> {
    entries: FxHashMap<InstanceId, PoolEntry<K, T>>,
    free: FxHashMap<K, Vec<InstanceId>>,
    capacities: FxHashMap<K, usize>,
    stats: FxHashMap<K, PoolStats>,
    default_capacity: usize,
    factory: F,
    next_id: u64,
}

impl<K, T, F> ObjectPool<K, T, F>
where
    K: Copy + Eq + Hash + Debug,
    T: Poolable,
    F: InstanceFactory<K, T>,
{
    /// Create an empty pool. Kinds without an explicit capacity retain up to
    /// `default_capacity` free instances.
    pub fn new(factory: F, default_capacity: usize) -> Self {
        Self {
            entries: FxHashMap::default(),
            free: FxHashMap::default(),
            capacities: FxHashMap::default(),
            stats: FxHashMap::default(),
            default_capacity,
            factory,
            next_id: 0,
        }
    }

    /// Builder form of [`ObjectPool::set_capacity`].
    pub fn with_capacity(mut self, kind: K, capacity: usize) -> Self {
        self.set_capacity(kind, capacity);
        self
    }

    /// Free-list capacity for `kind`.
    pub fn capacity(&self, kind: K) -> usize {
        self.capacities
            .get(&kind)
            .copied()
            .unwrap_or(self.default_capacity)
    }

    /// Change the free-list capacity for `kind`, destroying surplus free instances.
    pub fn set_capacity(&mut self, kind: K, capacity: usize) {
        self.capacities.insert(kind, capacity);
        let Some(free) = self.free.get_mut(&kind) else {
            return;
        };
        if free.len() <= capacity {
            return;
        }
        let surplus: Vec<InstanceId> = free.drain(capacity..).collect();
        let stats = self.stats.entry(kind).or_default();
        for id in surplus {
            self.entries.remove(&id);
            stats.free -= 1;
            stats.destroyed += 1;
        }
        tracing::trace!("Pool {:?}: capacity shrunk to {}", kind, capacity);
    }

    fn construct(&mut self, kind: K) -> (InstanceId, T) {
        let id = InstanceId(self.next_id);
        self.next_id += 1;
        self.stats.entry(kind).or_default().created += 1;
        (id, self.factory.create(kind))
    }

    /// Hand out an instance of `kind` initialised from `params`.
    ///
    /// Reuses a free instance when available and constructs one otherwise.
    pub fn acquire(&mut self, kind: K, params: &T::Params) -> InstanceId {
        let reusable = self.free.get_mut(&kind).and_then(Vec::pop);
        if let Some(id) = reusable
            && let Some(entry) = self.entries.get_mut(&id)
        {
            entry.instance.reset(params);
            entry.active = true;
            let stats = self.stats.entry(kind).or_default();
            stats.free -= 1;
            stats.active += 1;
            stats.reused += 1;
            tracing::trace!("Pool {:?}: reused instance {}", kind, id.0);
            return id;
        }

        let (id, mut instance) = self.construct(kind);
        instance.reset(params);
        self.entries.insert(
            id,
            PoolEntry {
                kind,
                instance,
                active: true,
            },
        );
        self.stats.entry(kind).or_default().active += 1;
        id
    }

    /// Return an instance to the pool.
    ///
    /// The instance is deactivated. It is retained if its kind's free list has
    /// room and dropped from the pool otherwise.
    pub fn release(&mut self, id: InstanceId) -> ReleaseOutcome<T> {
        let kind = match self.entries.get_mut(&id) {
            Some(entry) if entry.active => {
                entry.active = false;
                entry.instance.deactivate();
                entry.kind
            }
            Some(entry) => {
                tracing::warn!("Pool {:?}: instance {} released twice", entry.kind, id.0);
                return ReleaseOutcome::Ignored;
            }
            None => return ReleaseOutcome::Ignored,
        };

        let capacity = self.capacity(kind);
        let free = self.free.entry(kind).or_default();
        let stats = self.stats.entry(kind).or_default();
        stats.active -= 1;

        if free.len() < capacity {
            free.push(id);
            stats.free += 1;
            return ReleaseOutcome::Retained;
        }

        stats.destroyed += 1;
        tracing::trace!("Pool {:?}: free list full, destroying instance {}", kind, id.0);
        match self.entries.remove(&id) {
            Some(entry) => ReleaseOutcome::Destroyed(entry.instance),
            None => ReleaseOutcome::Ignored,
        }
    }

    /// Construct up to `count` instances straight into the free list of `kind`.
    ///
    /// Bounded by the kind's remaining free capacity. Returns how many were built.
    pub fn prewarm(&mut self, kind: K, count: usize) -> usize {
        let have = self.free.get(&kind).map_or(0, Vec::len);
        let room = self.capacity(kind).saturating_sub(have);
        let n = count.min(room);
        for _ in 0..n {
            let (id, mut instance) = self.construct(kind);
            instance.deactivate();
            self.entries.insert(
                id,
                PoolEntry {
                    kind,
                    instance,
                    active: false,
                },
            );
            self.free.entry(kind).or_default().push(id);
            self.stats.entry(kind).or_default().free += 1;
        }
        n
    }

    /// Active instance behind `id`.
    pub fn get(&self, id: InstanceId) -> Option<&T> {
        self.entries
            .get(&id)
            .filter(|e| e.active)
            .map(|e| &e.instance)
    }

    /// Active instance behind `id`, mutably.
    pub fn get_mut(&mut self, id: InstanceId) -> Option<&mut T> {
        self.entries
            .get_mut(&id)
            .filter(|e| e.active)
            .map(|e| &mut e.instance)
    }

    /// Kind of an instance still owned by the pool.
    pub fn kind_of(&self, id: InstanceId) -> Option<K> {
        self.entries.get(&id).map(|e| e.kind)
    }

    /// Whether `id` is currently handed out.
    pub fn is_active(&self, id: InstanceId) -> bool {
        self.entries.get(&id).is_some_and(|e| e.active)
    }

    /// Ids of all active instances.
    pub fn active_ids(&self) -> Vec<InstanceId> {
        let mut ids: Vec<InstanceId> = self
            .entries
            .iter()
            .filter(|(_, e)| e.active)
            .map(|(id, _)| *id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Release every active instance. Returns how many were released.
    pub fn release_all(&mut self) -> usize {
        let ids = self.active_ids();
        let count = ids.len();
        for id in ids {
            let _ = self.release(id);
        }
        count
    }

    /// Counters for `kind`.
    pub fn stats(&self, kind: K) -> PoolStats {
        self.stats.get(&kind).copied().unwrap_or_default()
    }

    /// Counters summed over every kind.
    pub fn totals(&self) -> PoolStats {
        let mut total = PoolStats::default();
        for stats in self.stats.values() {
            total += *stats;
        }
        total
    }

    /// Length of the free list for `kind`.
    pub fn free_len(&self, kind: K) -> usize {
        self.free.get(&kind).map_or(0, Vec::len)
    }

    /// Drop every instance, active or free, and reset all counters.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.free.clear();
        self.stats.clear();
    }
}
