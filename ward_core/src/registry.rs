//! Region registry: ownership of all regions, spatial lookup, quotas,
//! persistence, and external zone-store synchronization

use crate::capability::Quota;
use crate::config::ProtectionPolicy;
use crate::persist::{PersistError, RegionPersistence, RegionRecord, RegionsFile};
use crate::region::Region;
use crate::store::{ZoneStore, ZoneStoreError, ZoneVolume};
use crate::types::{PlayerRef, WorldPoint};
use std::collections::{BTreeMap, HashMap, HashSet};
use thiserror::Error;
use uuid::Uuid;

/// Why a region could not be created
#[derive(Error, Debug)]
pub enum CreationError {
    #[error("region quota reached: {owned} owned, limit {limit}")]
    QuotaExceeded { owned: u32, limit: u32 },
    #[error(transparent)]
    Store(#[from] ZoneStoreError),
}

/// Operation referenced a region id that is not registered
#[derive(Error, Debug)]
#[error("unknown region {0}")]
pub struct UnknownRegion(pub String);

/// Outcome of a load pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub loaded: usize,
    pub skipped: usize,
}

/// Owns every region. All mutation runs on the dispatcher thread, so the
/// registry needs no interior locking; callers hold `&mut` for writes.
pub struct RegionRegistry {
    /// Regions by id. Ordered map so `region_at` scans in a stable order.
    regions: BTreeMap<String, Region>,
    /// Monotonic per-owner id sequence; never decremented on removal
    counters: HashMap<Uuid, u64>,
    zones: Box<dyn ZoneStore>,
    persistence: Box<dyn RegionPersistence>,
}

impl RegionRegistry {
    pub fn new(zones: Box<dyn ZoneStore>, persistence: Box<dyn RegionPersistence>) -> Self {
        RegionRegistry {
            regions: BTreeMap::new(),
            counters: HashMap::new(),
            zones,
            persistence,
        }
    }

    // === Lifecycle ===

    /// Create a region under `policy`, anchored at `point`.
    ///
    /// The external zone volume is registered first; if the store refuses,
    /// nothing is mutated locally and no region is left orphaned. Quota is
    /// resolved by the caller (it depends on the capability oracle).
    pub fn create(
        &mut self,
        owner: &PlayerRef,
        point: WorldPoint,
        policy: &ProtectionPolicy,
        quota: Quota,
    ) -> Result<String, CreationError> {
        let owned = self.count_owned_by(owner.id);
        if !quota.allows(owned) {
            let limit = match quota {
                Quota::Limited(limit) => limit,
                Quota::Unlimited => u32::MAX,
            };
            return Err(CreationError::QuotaExceeded { owned, limit });
        }

        let (id, next_seq) = self.allocate_id(owner);

        let volume = ZoneVolume::enclosing(&id, owner.id, &point, policy.radius, policy.priority);
        self.zones.add_zone(volume)?;

        let mut region = Region::new(
            id.clone(),
            owner.id,
            point,
            policy.radius,
            policy.id.clone(),
            policy.priority,
        );
        if let Some(d) = policy
            .durability
            .as_ref()
            .filter(|d| d.enabled && d.max_health > 0)
        {
            region.init_durability(d.default_health, d.max_health);
        }

        self.counters.insert(owner.id, next_seq);
        self.regions.insert(id.clone(), region);
        self.persist_logged();

        log::info!("created region {id} for {}", owner.name);
        Ok(id)
    }

    /// Remove a region. `Ok(false)` when the id is unknown.
    ///
    /// The external zone is removed first; if the store fails, the region
    /// stays registered so the caller can retry; in-memory state remains
    /// authoritative.
    pub fn remove(&mut self, id: &str) -> Result<bool, ZoneStoreError> {
        if !self.regions.contains_key(id) {
            return Ok(false);
        }

        self.zones.remove_zone(id)?;
        self.regions.remove(id);
        self.persist_logged();

        log::info!("removed region {id}");
        Ok(true)
    }

    /// Next id for this owner: `<lowercased name>_<sequence>`. Skips over
    /// any id that is somehow already taken (owner name collisions).
    fn allocate_id(&self, owner: &PlayerRef) -> (String, u64) {
        let mut seq = self.counters.get(&owner.id).copied().unwrap_or(0);
        let name = owner.name.to_lowercase();
        loop {
            let id = format!("{name}_{seq}");
            if !self.regions.contains_key(&id) {
                return (id, seq + 1);
            }
            seq += 1;
        }
    }

    // === Queries ===

    /// First region containing the point, in registry iteration order.
    /// Containment is the region's sphere; priorities are not consulted at
    /// this layer.
    pub fn region_at(&self, point: &WorldPoint) -> Option<&Region> {
        self.regions.values().find(|r| r.contains(point))
    }

    pub fn get(&self, id: &str) -> Option<&Region> {
        self.regions.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Region> {
        self.regions.get_mut(id)
    }

    pub fn regions_owned_by(&self, owner: Uuid) -> Vec<&Region> {
        self.regions
            .values()
            .filter(|r| r.owner() == owner)
            .collect()
    }

    pub fn count_owned_by(&self, owner: Uuid) -> u32 {
        self.regions.values().filter(|r| r.owner() == owner).count() as u32
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Region> {
        self.regions.values()
    }

    // === Persistence ===

    /// Serialize every region and the id counters to the backing store.
    /// Idempotent; called write-through after every mutation.
    pub fn persist(&mut self) -> Result<(), PersistError> {
        let mut file = RegionsFile::default();
        for (owner, seq) in &self.counters {
            file.counters.insert(owner.to_string(), *seq);
        }
        for region in self.regions.values() {
            let record = RegionRecord::from_region(region);
            file.regions
                .insert(record.id.clone(), serde_json::to_value(&record)?);
        }
        self.persistence.save(&file)
    }

    /// Persist, demoting failure to a severe log line. Used on write-through
    /// paths where in-memory state stays authoritative for a later retry.
    pub fn persist_logged(&mut self) {
        if let Err(e) = self.persist() {
            log::error!("failed to persist regions: {e}");
        }
    }

    /// Load all records, replacing current contents. A record that fails to
    /// decode or references an unknown world is skipped with a warning; one
    /// bad record never aborts the pass. Id counters are seeded past any
    /// suffix already in use.
    pub fn load(&mut self, known_worlds: &HashSet<String>) -> Result<LoadSummary, PersistError> {
        let file = self.persistence.load()?;
        self.regions.clear();
        self.counters.clear();

        for (owner, seq) in &file.counters {
            match Uuid::parse_str(owner) {
                Ok(uuid) => {
                    self.counters.insert(uuid, *seq);
                }
                Err(_) => log::warn!("skipping counter for malformed owner uuid {owner}"),
            }
        }

        let mut summary = LoadSummary::default();
        for (key, value) in file.regions {
            let record: RegionRecord = match serde_json::from_value(value) {
                Ok(record) => record,
                Err(e) => {
                    log::warn!("skipping malformed region record {key}: {e}");
                    summary.skipped += 1;
                    continue;
                }
            };
            let region = match record.into_region(known_worlds) {
                Ok(region) => region,
                Err(e) => {
                    log::warn!("skipping region record {key}: {e}");
                    summary.skipped += 1;
                    continue;
                }
            };

            self.seed_counter(&region);
            self.regions.insert(region.id.clone(), region);
            summary.loaded += 1;
        }

        log::info!(
            "loaded {} regions ({} skipped)",
            summary.loaded,
            summary.skipped
        );
        Ok(summary)
    }

    /// Push the owner's counter past this region's id suffix, so files
    /// written before counters existed still produce fresh ids.
    fn seed_counter(&mut self, region: &Region) {
        if let Some(suffix) = region.id.rsplit('_').next().and_then(|s| s.parse::<u64>().ok()) {
            let counter = self.counters.entry(region.owner()).or_insert(0);
            *counter = (*counter).max(suffix + 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_policy_table;
    use crate::config::PolicyTable;
    use crate::persist::MemoryStore;
    use crate::store::MemoryZoneStore;

    fn policies() -> PolicyTable {
        parse_policy_table(
            r#"
[[policies]]
id = "sentinel_stone"
trigger_block = "iron_block"
radius = 10
priority = 30
destructible = true
allowed_explosives = ["plain_charge"]

[policies.durability]
enabled = true
default_health = 100
max_health = 500
"#,
        )
        .unwrap()
    }

    fn make_registry() -> RegionRegistry {
        RegionRegistry::new(
            Box::new(MemoryZoneStore::new()),
            Box::new(MemoryStore::new()),
        )
    }

    fn alice() -> PlayerRef {
        PlayerRef::new(Uuid::new_v4(), "Alice")
    }

    fn point(x: i32) -> WorldPoint {
        WorldPoint::new("overworld", x, 64, 0)
    }

    /// Zone store that refuses every write
    struct RefusingZoneStore;

    impl ZoneStore for RefusingZoneStore {
        fn add_zone(&mut self, zone: ZoneVolume) -> Result<(), ZoneStoreError> {
            Err(ZoneStoreError::Rejected {
                id: zone.id,
                reason: "refused".to_string(),
            })
        }

        fn remove_zone(&mut self, id: &str) -> Result<(), ZoneStoreError> {
            Err(ZoneStoreError::Rejected {
                id: id.to_string(),
                reason: "refused".to_string(),
            })
        }
    }

    #[test]
    fn test_create_assigns_sequential_ids() {
        let mut registry = make_registry();
        let table = policies();
        let policy = table.by_id("sentinel_stone").unwrap();
        let owner = alice();

        let a = registry
            .create(&owner, point(0), policy, Quota::Limited(10))
            .unwrap();
        let b = registry
            .create(&owner, point(100), policy, Quota::Limited(10))
            .unwrap();
        assert_eq!(a, "alice_0");
        assert_eq!(b, "alice_1");

        let region = registry.get("alice_0").unwrap();
        assert_eq!(region.radius, 10);
        assert_eq!(region.priority, 30);
        assert_eq!(region.durability().unwrap().current, 100);
        assert_eq!(region.durability().unwrap().max, 500);
    }

    #[test]
    fn test_ids_are_not_reused_after_removal() {
        let mut registry = make_registry();
        let table = policies();
        let policy = table.by_id("sentinel_stone").unwrap();
        let owner = alice();

        registry
            .create(&owner, point(0), policy, Quota::Limited(10))
            .unwrap();
        registry
            .create(&owner, point(100), policy, Quota::Limited(10))
            .unwrap();
        assert!(registry.remove("alice_1").unwrap());

        let c = registry
            .create(&owner, point(200), policy, Quota::Limited(10))
            .unwrap();
        assert_eq!(c, "alice_2");
    }

    #[test]
    fn test_quota_enforced_at_boundary() {
        let mut registry = make_registry();
        let table = policies();
        let policy = table.by_id("sentinel_stone").unwrap();
        let owner = alice();

        registry
            .create(&owner, point(0), policy, Quota::Limited(2))
            .unwrap();
        registry
            .create(&owner, point(100), policy, Quota::Limited(2))
            .unwrap();

        let err = registry
            .create(&owner, point(200), policy, Quota::Limited(2))
            .unwrap_err();
        assert!(matches!(
            err,
            CreationError::QuotaExceeded { owned: 2, limit: 2 }
        ));
        assert_eq!(registry.len(), 2);

        // A different owner is unaffected.
        let other = PlayerRef::new(Uuid::new_v4(), "Bob");
        registry
            .create(&other, point(300), policy, Quota::Limited(2))
            .unwrap();
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_store_failure_aborts_creation() {
        let mut registry =
            RegionRegistry::new(Box::new(RefusingZoneStore), Box::new(MemoryStore::new()));
        let table = policies();
        let policy = table.by_id("sentinel_stone").unwrap();
        let owner = alice();

        let err = registry
            .create(&owner, point(0), policy, Quota::Limited(10))
            .unwrap_err();
        assert!(matches!(err, CreationError::Store(_)));
        assert!(registry.is_empty());

        // The sequence was not consumed by the failed attempt.
        let mut ok_registry = make_registry();
        let id = ok_registry
            .create(&owner, point(0), policy, Quota::Limited(10))
            .unwrap();
        assert_eq!(id, "alice_0");
    }

    #[test]
    fn test_remove_unknown_region() {
        let mut registry = make_registry();
        assert!(!registry.remove("nobody_0").unwrap());
    }

    #[test]
    fn test_region_at_first_match_in_iteration_order() {
        let mut registry = make_registry();
        let table = policies();
        let policy = table.by_id("sentinel_stone").unwrap();

        // Two overlapping regions from owners whose ids sort deterministically.
        let first = PlayerRef::new(Uuid::new_v4(), "Anna");
        let second = PlayerRef::new(Uuid::new_v4(), "Zed");
        registry
            .create(&first, point(0), policy, Quota::Limited(10))
            .unwrap();
        registry
            .create(&second, point(5), policy, Quota::Limited(10))
            .unwrap();

        // (3, 64, 0) is inside both spheres; "anna_0" sorts before "zed_0".
        let hit = registry.region_at(&point(3)).unwrap();
        assert_eq!(hit.id, "anna_0");

        // Far away from both.
        assert!(registry.region_at(&point(500)).is_none());
    }

    #[test]
    fn test_persist_load_round_trip() {
        let mut registry = make_registry();
        let table = policies();
        let policy = table.by_id("sentinel_stone").unwrap();
        let owner = alice();
        let friend = Uuid::new_v4();

        registry
            .create(&owner, point(0), policy, Quota::Limited(10))
            .unwrap();
        registry
            .create(&owner, point(100), policy, Quota::Limited(10))
            .unwrap();
        registry.get_mut("alice_0").unwrap().add_member(friend);
        registry.get_mut("alice_0").unwrap().damage(30);
        registry.persist().unwrap();

        // Move the persisted file into a fresh registry.
        let mut file_carrier = MemoryStore::new();
        let mut snapshot = RegionsFile::default();
        for (o, s) in &registry.counters {
            snapshot.counters.insert(o.to_string(), *s);
        }
        for region in registry.iter() {
            let record = RegionRecord::from_region(region);
            snapshot
                .regions
                .insert(record.id.clone(), serde_json::to_value(&record).unwrap());
        }
        file_carrier.save(&snapshot).unwrap();

        let mut restored =
            RegionRegistry::new(Box::new(MemoryZoneStore::new()), Box::new(file_carrier));
        let worlds: HashSet<String> = ["overworld".to_string()].into_iter().collect();
        let summary = restored.load(&worlds).unwrap();

        assert_eq!(summary, LoadSummary { loaded: 2, skipped: 0 });
        let region = restored.get("alice_0").unwrap();
        assert!(region.is_member(friend));
        assert_eq!(region.durability().unwrap().current, 70);

        // Counters survived: the next id continues the sequence.
        let next = restored
            .create(&owner, point(300), policy, Quota::Limited(10))
            .unwrap();
        assert_eq!(next, "alice_2");
    }

    #[test]
    fn test_load_skips_bad_records() {
        let owner = alice();
        let mut file = RegionsFile::default();

        // One good record.
        let mut good = Region::new(
            "alice_0".to_string(),
            owner.id,
            point(0),
            10,
            "sentinel_stone".to_string(),
            30,
        );
        good.init_durability(100, 500);
        let record = RegionRecord::from_region(&good);
        file.regions
            .insert("alice_0".to_string(), serde_json::to_value(&record).unwrap());

        // One record in a world that no longer exists.
        let mut gone = RegionRecord::from_region(&good);
        gone.id = "alice_1".to_string();
        gone.world = "the_void".to_string();
        file.regions
            .insert("alice_1".to_string(), serde_json::to_value(&gone).unwrap());

        // One structurally malformed record.
        file.regions.insert(
            "garbage".to_string(),
            serde_json::json!({ "id": 42, "banana": true }),
        );

        let mut carrier = MemoryStore::new();
        carrier.save(&file).unwrap();
        let mut registry =
            RegionRegistry::new(Box::new(MemoryZoneStore::new()), Box::new(carrier));

        let worlds: HashSet<String> = ["overworld".to_string()].into_iter().collect();
        let summary = registry.load(&worlds).unwrap();
        assert_eq!(summary, LoadSummary { loaded: 1, skipped: 2 });
        assert!(registry.get("alice_0").is_some());

        // The surviving id seeds the counter past itself.
        let table = policies();
        let policy = table.by_id("sentinel_stone").unwrap();
        let next = registry
            .create(&owner, point(300), policy, Quota::Limited(10))
            .unwrap();
        assert_eq!(next, "alice_1");
    }
}
