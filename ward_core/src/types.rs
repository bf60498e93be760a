//! Core types: world coordinates, identity newtypes, explosive classification

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Integer block coordinates within a world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        BlockPos { x, y, z }
    }

    /// Squared Euclidean distance to another position
    pub fn distance_squared(&self, other: &BlockPos) -> i64 {
        let dx = i64::from(self.x) - i64::from(other.x);
        let dy = i64::from(self.y) - i64::from(other.y);
        let dz = i64::from(self.z) - i64::from(other.z);
        dx * dx + dy * dy + dz * dz
    }
}

/// A block position qualified with the world it belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorldPoint {
    pub world: String,
    pub pos: BlockPos,
}

impl WorldPoint {
    pub fn new(world: impl Into<String>, x: i32, y: i32, z: i32) -> Self {
        WorldPoint {
            world: world.into(),
            pos: BlockPos::new(x, y, z),
        }
    }
}

/// Identifier for a placeable block type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockTypeId(pub String);

impl From<&str> for BlockTypeId {
    fn from(s: &str) -> Self {
        BlockTypeId(s.to_string())
    }
}

/// Identifier for an inventory item type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemTypeId(pub String);

impl From<&str> for ItemTypeId {
    fn from(s: &str) -> Self {
        ItemTypeId(s.to_string())
    }
}

/// A player acting on the engine: stable UUID plus the display name
/// used when deriving region ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerRef {
    pub id: Uuid,
    pub name: String,
}

impl PlayerRef {
    pub fn new(id: Uuid, name: impl Into<String>) -> Self {
        PlayerRef {
            id,
            name: name.into(),
        }
    }
}

/// Coarse explosive category used by destructibility allow-lists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExplosiveClass {
    /// A placed and ignited charge block
    PlainCharge,
    /// A creature that self-detonates
    EntityCharge,
    /// A charge carried on a minecart
    MinecartCharge,
    /// A directed explosive projectile (skull or fireball)
    ProjectileCharge,
    /// A detonating crystal
    CrystalCharge,
}

/// The concrete entity kind behind an area-effect event.
///
/// Classification is deliberately lossy: several source kinds fold into one
/// [`ExplosiveClass`] for allow-list purposes, while damage values stay
/// per-kind (skull and fireball projectiles hit very differently).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DetonationSource {
    PrimedCharge,
    ChargedMob,
    ChargeMinecart,
    SkullProjectile,
    Fireball,
    Crystal,
    /// Anything the engine does not govern (e.g. bed explosions)
    Other,
}

impl DetonationSource {
    /// Bucket this source into an explosive class, or `None` when the
    /// engine does not govern it at all.
    pub fn classify(self) -> Option<ExplosiveClass> {
        match self {
            DetonationSource::PrimedCharge => Some(ExplosiveClass::PlainCharge),
            DetonationSource::ChargedMob => Some(ExplosiveClass::EntityCharge),
            DetonationSource::ChargeMinecart => Some(ExplosiveClass::MinecartCharge),
            DetonationSource::SkullProjectile | DetonationSource::Fireball => {
                Some(ExplosiveClass::ProjectileCharge)
            }
            DetonationSource::Crystal => Some(ExplosiveClass::CrystalCharge),
            DetonationSource::Other => None,
        }
    }
}
