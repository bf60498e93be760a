//! Region persistence: a flat key -> record file
//!
//! Every region flattens to primitive fields. Per-owner id counters are
//! persisted alongside the records so region ids keep increasing across
//! restarts and deletions instead of reusing freed suffixes.

use crate::region::Region;
use crate::types::WorldPoint;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

/// Persistence-layer failure (file level, not per record)
#[derive(Error, Debug)]
pub enum PersistError {
    #[error("region store I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("region store encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Why a single persisted record was rejected during load
#[derive(Error, Debug)]
pub enum RecordError {
    #[error("owner is not a valid UUID: {0}")]
    BadOwner(String),
    #[error("references unknown world {0}")]
    UnknownWorld(String),
}

/// One region flattened to primitives
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionRecord {
    pub id: String,
    pub owner: String,
    pub world: String,
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub radius: i32,
    pub policy: String,
    pub priority: i32,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub durability_enabled: bool,
    #[serde(default)]
    pub current_health: u32,
    #[serde(default)]
    pub max_health: u32,
    #[serde(default)]
    pub members: Vec<String>,
    #[serde(default)]
    pub co_owners: Vec<String>,
}

impl RegionRecord {
    pub fn from_region(region: &Region) -> Self {
        let mut members: Vec<String> = region.members().map(Uuid::to_string).collect();
        members.sort();
        let mut co_owners: Vec<String> = region.co_owners().map(Uuid::to_string).collect();
        co_owners.sort();

        let (durability_enabled, current_health, max_health) = match region.durability() {
            Some(d) => (true, d.current, d.max),
            None => (false, 0, 0),
        };

        RegionRecord {
            id: region.id.clone(),
            owner: region.owner().to_string(),
            world: region.center.world.clone(),
            x: region.center.pos.x,
            y: region.center.pos.y,
            z: region.center.pos.z,
            radius: region.radius,
            policy: region.policy_id.clone(),
            priority: region.priority,
            hidden: region.hidden,
            durability_enabled,
            current_health,
            max_health,
            members,
            co_owners,
        }
    }

    /// Rebuild the region. Records naming a world the host no longer knows
    /// are rejected; individual malformed member UUIDs are skipped with a
    /// warning rather than poisoning the record.
    pub fn into_region(self, known_worlds: &HashSet<String>) -> Result<Region, RecordError> {
        if !known_worlds.contains(&self.world) {
            return Err(RecordError::UnknownWorld(self.world));
        }
        let owner = Uuid::parse_str(&self.owner).map_err(|_| RecordError::BadOwner(self.owner))?;

        let mut region = Region::new(
            self.id,
            owner,
            WorldPoint::new(self.world, self.x, self.y, self.z),
            self.radius,
            self.policy,
            self.priority,
        );
        region.hidden = self.hidden;

        if self.durability_enabled {
            region.init_durability(self.current_health, self.max_health);
        }

        for raw in self.members.iter().chain(self.co_owners.iter()) {
            if Uuid::parse_str(raw).is_err() {
                log::warn!("region {}: skipping malformed member uuid {raw}", region.id);
            }
        }
        for raw in &self.members {
            if let Ok(uuid) = Uuid::parse_str(raw) {
                region.add_member(uuid);
            }
        }
        for raw in &self.co_owners {
            if let Ok(uuid) = Uuid::parse_str(raw) {
                region.add_co_owner(uuid);
            }
        }

        Ok(region)
    }
}

/// On-disk shape: per-owner id counters plus records keyed by region id.
///
/// Records are held as raw JSON values so one malformed record can be
/// skipped at load time without failing the whole file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegionsFile {
    #[serde(default)]
    pub counters: HashMap<String, u64>,
    #[serde(default)]
    pub regions: BTreeMap<String, serde_json::Value>,
}

/// Storage backend for the region file
pub trait RegionPersistence {
    fn save(&mut self, file: &RegionsFile) -> Result<(), PersistError>;
    fn load(&mut self) -> Result<RegionsFile, PersistError>;
}

/// JSON file on disk. A missing file loads as an empty store.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileStore { path: path.into() }
    }
}

impl RegionPersistence for JsonFileStore {
    fn save(&mut self, file: &RegionsFile) -> Result<(), PersistError> {
        let json = serde_json::to_string_pretty(file)?;
        fs::write(&self.path, json)?;
        Ok(())
    }

    fn load(&mut self) -> Result<RegionsFile, PersistError> {
        if !self.path.exists() {
            return Ok(RegionsFile::default());
        }
        let content = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Keeps the file in memory, for tests
#[derive(Debug, Default)]
pub struct MemoryStore {
    file: RegionsFile,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RegionPersistence for MemoryStore {
    fn save(&mut self, file: &RegionsFile) -> Result<(), PersistError> {
        self.file = file.clone();
        Ok(())
    }

    fn load(&mut self) -> Result<RegionsFile, PersistError> {
        Ok(self.file.clone())
    }
}
