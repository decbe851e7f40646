//! Static importance weights per entity type.

use nimbus_core::EntityType;

use crate::LodError;

/// Highest allowed importance weight.
pub const MAX_IMPORTANCE: u8 = 10;

/// Total map from [`EntityType`] to an importance weight in `0..=10`.
///
/// Backed by an array indexed by the closed enumeration, so every type has a
/// weight and lookups cannot miss.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportanceTable {
    weights: [u8; EntityType::COUNT],
}

impl Default for ImportanceTable {
    fn default() -> Self {
        let mut weights = [0; EntityType::COUNT];
        for ty in EntityType::ALL {
            weights[ty.index()] = default_importance(ty);
        }
        Self { weights }
    }
}

fn default_importance(ty: EntityType) -> u8 {
    match ty {
        EntityType::Player => 10,
        EntityType::Boss => 9,
        EntityType::Elite => 7,
        EntityType::Enemy => 6,
        EntityType::Npc => 5,
        EntityType::Pickup => 5,
        EntityType::Projectile => 4,
        EntityType::DamageNumber => 3,
        EntityType::Particle => 2,
        EntityType::Decoration => 1,
    }
}

impl ImportanceTable {
    /// Defaults with the given weights replaced. Every override is validated.
    pub fn with_overrides<I>(overrides: I) -> Result<Self, LodError>
    where
        I: IntoIterator<Item = (EntityType, u8)>,
    {
        let mut table = Self::default();
        for (ty, weight) in overrides {
            table.set(ty, weight)?;
        }
        Ok(table)
    }

    /// Replace the weight for one type.
    pub fn set(&mut self, entity: EntityType, value: u8) -> Result<(), LodError> {
        if value > MAX_IMPORTANCE {
            return Err(LodError::ImportanceOutOfRange { entity, value });
        }
        self.weights[entity.index()] = value;
        Ok(())
    }

    /// Weight for `entity`.
    #[inline]
    pub fn get(&self, entity: EntityType) -> u8 {
        self.weights[entity.index()]
    }

    /// Weight scaled to `[0, 1]`.
    #[inline]
    pub fn factor(&self, entity: EntityType) -> f32 {
        self.get(entity) as f32 / MAX_IMPORTANCE as f32
    }
}
