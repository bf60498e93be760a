//! External zone store boundary
//!
//! The authoritative protection-zone system lives outside this engine. We
//! only register and deregister volumes with it; containment queries for our
//! own decisions never go through it.

use crate::types::{BlockPos, WorldPoint};
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

/// Failure reported by the external zone store
#[derive(Error, Debug, Clone)]
pub enum ZoneStoreError {
    #[error("zone store has no manager for world {0}")]
    UnknownWorld(String),
    #[error("zone store rejected {id}: {reason}")]
    Rejected { id: String, reason: String },
}

/// The cuboid volume registered with the external store: the axis-aligned
/// cube of half-width `radius` enclosing a region's sphere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneVolume {
    pub id: String,
    pub world: String,
    pub min: BlockPos,
    pub max: BlockPos,
    pub priority: i32,
    pub owner: Uuid,
}

impl ZoneVolume {
    /// Build the enclosing cube for a region centered at `center`
    pub fn enclosing(
        id: impl Into<String>,
        owner: Uuid,
        center: &WorldPoint,
        radius: i32,
        priority: i32,
    ) -> Self {
        let c = center.pos;
        ZoneVolume {
            id: id.into(),
            world: center.world.clone(),
            min: BlockPos::new(c.x - radius, c.y - radius, c.z - radius),
            max: BlockPos::new(c.x + radius, c.y + radius, c.z + radius),
            priority,
            owner,
        }
    }
}

/// Collaborator interface to the external zone store
pub trait ZoneStore {
    fn add_zone(&mut self, zone: ZoneVolume) -> Result<(), ZoneStoreError>;
    fn remove_zone(&mut self, id: &str) -> Result<(), ZoneStoreError>;
}

/// In-memory zone store, for tests and offline tools
#[derive(Debug, Default)]
pub struct MemoryZoneStore {
    zones: HashMap<String, ZoneVolume>,
}

impl MemoryZoneStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.zones.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&ZoneVolume> {
        self.zones.get(id)
    }
}

impl ZoneStore for MemoryZoneStore {
    fn add_zone(&mut self, zone: ZoneVolume) -> Result<(), ZoneStoreError> {
        self.zones.insert(zone.id.clone(), zone);
        Ok(())
    }

    fn remove_zone(&mut self, id: &str) -> Result<(), ZoneStoreError> {
        self.zones.remove(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enclosing_cube() {
        let center = WorldPoint::new("overworld", 100, 64, -50);
        let zone = ZoneVolume::enclosing("alice_0", Uuid::new_v4(), &center, 10, 30);
        assert_eq!(zone.min, BlockPos::new(90, 54, -60));
        assert_eq!(zone.max, BlockPos::new(110, 74, -40));
        assert_eq!(zone.world, "overworld");
        assert_eq!(zone.priority, 30);
    }

    #[test]
    fn test_memory_store_round_trip() {
        let mut store = MemoryZoneStore::new();
        let center = WorldPoint::new("overworld", 0, 0, 0);
        let zone = ZoneVolume::enclosing("bob_1", Uuid::new_v4(), &center, 5, 0);

        store.add_zone(zone).unwrap();
        assert!(store.contains("bob_1"));
        assert_eq!(store.len(), 1);

        store.remove_zone("bob_1").unwrap();
        assert!(store.is_empty());
        // Removing an unknown zone is not an error for the memory store.
        store.remove_zone("bob_1").unwrap();
    }
}
