//! Closed enumeration of entity categories tracked by the performance layer.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Category tag carried by every registered entity.
///
/// The set is closed so importance lookups are exhaustive: adding a variant
/// forces every table built over [`EntityType::ALL`] to account for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityType {
    /// The controlled character.
    Player,
    /// Boss-class enemy.
    Boss,
    /// Elite enemy.
    Elite,
    /// Regular enemy.
    Enemy,
    /// Friendly or neutral non-player character.
    Npc,
    /// Bullets, arrows, spells in flight.
    Projectile,
    /// Collectable item on the ground.
    Pickup,
    /// Floating damage/heal number.
    DamageNumber,
    /// Cosmetic particle.
    Particle,
    /// Static or ambient decoration.
    Decoration,
}

impl EntityType {
    /// Every variant, in declaration order.
    pub const ALL: [EntityType; 10] = [
        EntityType::Player,
        EntityType::Boss,
        EntityType::Elite,
        EntityType::Enemy,
        EntityType::Npc,
        EntityType::Projectile,
        EntityType::Pickup,
        EntityType::DamageNumber,
        EntityType::Particle,
        EntityType::Decoration,
    ];

    /// Number of variants.
    pub const COUNT: usize = Self::ALL.len();

    /// Dense index in `0..COUNT`, usable for array-backed tables.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Short lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            EntityType::Player => "player",
            EntityType::Boss => "boss",
            EntityType::Elite => "elite",
            EntityType::Enemy => "enemy",
            EntityType::Npc => "npc",
            EntityType::Projectile => "projectile",
            EntityType::Pickup => "pickup",
            EntityType::DamageNumber => "damage_number",
            EntityType::Particle => "particle",
            EntityType::Decoration => "decoration",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
