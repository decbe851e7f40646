//! Arena of entity records addressed by generational handles.

use nimbus_core::{Aabb, EntityType};

/// Handle to a registered entity.
///
/// Combines a slot index with a generation counter. When an entity is
/// unregistered its slot may be reused, but the generation is bumped so old
/// handles stop resolving instead of aliasing the new occupant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityHandle {
    index: u32,
    generation: u32,
}

impl EntityHandle {
    /// Slot index inside the registry.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Generation of the slot when this handle was issued.
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

/// What the layer knows about a registered entity.
///
/// The owner reference is opaque: the layer never drops or mutates the
/// entity it describes.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityRecord<O> {
    /// Host-side reference to the entity.
    pub owner: O,
    /// Category tag.
    pub tag: EntityType,
    /// Most recently reported bounds.
    pub bounds: Aabb,
    /// Bounds the quadtree currently holds for this entity.
    pub(crate) indexed_bounds: Aabb,
    /// Set by a deferred move, cleared when the tree catches up.
    pub(crate) pending: bool,
}

impl<O> EntityRecord<O> {
    /// Fresh record whose bounds are already in the tree.
    pub(crate) fn new(owner: O, tag: EntityType, bounds: Aabb) -> Self {
        Self {
            owner,
            tag,
            bounds,
            indexed_bounds: bounds,
            pending: false,
        }
    }

    /// Bounds the quadtree currently holds. Differs from `bounds` between a
    /// move and the next rebuild.
    pub fn indexed_bounds(&self) -> Aabb {
        self.indexed_bounds
    }

    /// Whether a move is waiting for the next rebuild.
    pub fn is_stale(&self) -> bool {
        self.pending
    }
}

#[derive(Debug, Clone)]
struct Slot<O> {
    generation: u32,
    record: Option<EntityRecord<O>>,
}

/// Owns all entity records.
#[derive(Debug, Clone)]
pub struct Registry<O> {
    slots: Vec<Slot<O>>,
    free: Vec<u32>,
    len: usize,
}

impl<O> Default for Registry<O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O> Registry<O> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }

    /// Store a record and return its handle.
    pub fn insert(&mut self, record: EntityRecord<O>) -> EntityHandle {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.record = Some(record);
            return EntityHandle {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            record: Some(record),
        });
        EntityHandle {
            index,
            generation: 0,
        }
    }

    /// Remove and return the record behind `handle`, if it is still live.
    pub fn remove(&mut self, handle: EntityHandle) -> Option<EntityRecord<O>> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        let record = slot.record.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        self.len -= 1;
        Some(record)
    }

    /// Look up a live record.
    pub fn get(&self, handle: EntityHandle) -> Option<&EntityRecord<O>> {
        let slot = self.slots.get(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.record.as_ref()
    }

    /// Look up a live record mutably.
    pub fn get_mut(&mut self, handle: EntityHandle) -> Option<&mut EntityRecord<O>> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.record.as_mut()
    }

    /// Whether `handle` refers to a live record.
    pub fn contains(&self, handle: EntityHandle) -> bool {
        self.get(handle).is_some()
    }

    /// Iterate over live records.
    pub fn iter(&self) -> impl Iterator<Item = (EntityHandle, &EntityRecord<O>)> {
        self.slots.iter().enumerate().filter_map(|(i, slot)| {
            slot.record.as_ref().map(|r| {
                (
                    EntityHandle {
                        index: i as u32,
                        generation: slot.generation,
                    },
                    r,
                )
            })
        })
    }

    /// Iterate over live records mutably.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (EntityHandle, &mut EntityRecord<O>)> {
        self.slots.iter_mut().enumerate().filter_map(|(i, slot)| {
            let generation = slot.generation;
            slot.record.as_mut().map(|r| {
                (
                    EntityHandle {
                        index: i as u32,
                        generation,
                    },
                    r,
                )
            })
        })
    }

    /// Number of live records.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no records are live.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Drop every record. Outstanding handles stop resolving.
    pub fn clear(&mut self) {
        self.free.clear();
        for (i, slot) in self.slots.iter_mut().enumerate() {
            if slot.record.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
            }
            self.free.push(i as u32);
        }
        self.len = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(owner: u64) -> EntityRecord<u64> {
        EntityRecord::new(owner, EntityType::Enemy, Aabb::new(0.0, 0.0, 1.0, 1.0))
    }

    #[test]
    fn test_insert_and_get() {
        let mut reg = Registry::new();
        let h = reg.insert(record(42));
        assert_eq!(reg.get(h).map(|r| r.owner), Some(42));
        assert_eq!(reg.len(), 1);
    }

    /// A recycled slot does not resolve through the old handle.
    #[test]
    fn test_stale_handle_after_reuse() {
        let mut reg = Registry::new();
        let old = reg.insert(record(1));
        assert!(reg.remove(old).is_some());
        let new = reg.insert(record(2));
        assert_eq!(old.index(), new.index());
        assert_ne!(old.generation(), new.generation());
        assert!(reg.get(old).is_none());
        assert!(reg.remove(old).is_none());
        assert_eq!(reg.get(new).map(|r| r.owner), Some(2));
    }

    #[test]
    fn test_double_remove_is_noop() {
        let mut reg = Registry::new();
        let h = reg.insert(record(1));
        assert!(reg.remove(h).is_some());
        assert!(reg.remove(h).is_none());
        assert!(reg.is_empty());
    }

    #[test]
    fn test_clear_invalidates_handles() {
        let mut reg = Registry::new();
        let a = reg.insert(record(1));
        let b = reg.insert(record(2));
        reg.clear();
        assert!(!reg.contains(a));
        assert!(!reg.contains(b));
        assert_eq!(reg.iter().count(), 0);
        let c = reg.insert(record(3));
        assert!(reg.contains(c));
        assert_eq!(reg.len(), 1);
    }

    /// A new record is never stale, even when its bounds do not compare equal to themselves.
    #[test]
    fn test_new_record_not_stale() {
        assert!(!record(1).is_stale());
        let nan = EntityRecord::new(2u64, EntityType::Particle, Aabb::new(f32::NAN, 10.0, 5.0, 5.0));
        assert!(!nan.is_stale());
        assert!(nan.indexed_bounds().x.is_nan());
    }
}
