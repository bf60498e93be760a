//! Protection engine: the single context object handed to every handler
//!
//! Owns the policy table, the region registry, the special-charge marks,
//! and presence tracking. All handlers run to completion on one dispatcher
//! thread, so `&mut self` is the whole concurrency story.

use crate::capability::CapabilityOracle;
use crate::config::{EngineSettings, PolicyTable};
use crate::explosion::ChargeMarks;
use crate::persist::PersistError;
use crate::presence::{PresenceChange, PresenceTracker};
use crate::registry::{LoadSummary, RegionRegistry, UnknownRegion};
use crate::types::WorldPoint;
use std::collections::HashSet;
use std::time::Instant;
use uuid::Uuid;

pub struct ProtectionEngine {
    pub(crate) policies: PolicyTable,
    pub(crate) settings: EngineSettings,
    pub(crate) registry: RegionRegistry,
    pub(crate) charges: ChargeMarks,
    pub(crate) capabilities: Box<dyn CapabilityOracle>,
    pub(crate) presence: PresenceTracker,
}

impl ProtectionEngine {
    pub fn new(
        policies: PolicyTable,
        settings: EngineSettings,
        registry: RegionRegistry,
        capabilities: Box<dyn CapabilityOracle>,
    ) -> Self {
        let charges = ChargeMarks::new(settings.special_charge_timeout());
        let presence = PresenceTracker::new(
            settings.presence_check_interval(),
            settings.presence_idle_timeout(),
        );
        ProtectionEngine {
            policies,
            settings,
            registry,
            charges,
            capabilities,
            presence,
        }
    }

    // === Accessors ===

    pub fn policies(&self) -> &PolicyTable {
        &self.policies
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn registry(&self) -> &RegionRegistry {
        &self.registry
    }

    // === Policy lifecycle ===

    /// Swap in a freshly built policy table. The table validated as a whole
    /// when it was built, so readers never see a partial catalog.
    pub fn reload_policies(&mut self, table: PolicyTable) {
        log::info!("policy table reloaded: {} policies", table.len());
        self.policies = table;
    }

    // === Persistence ===

    pub fn load(&mut self, known_worlds: &HashSet<String>) -> Result<LoadSummary, PersistError> {
        self.registry.load(known_worlds)
    }

    pub fn persist(&mut self) -> Result<(), PersistError> {
        self.registry.persist()
    }

    // === Membership and visibility ===

    /// Returns true when the player was newly added
    pub fn add_member(&mut self, region_id: &str, player: Uuid) -> Result<bool, UnknownRegion> {
        self.mutate_region(region_id, |region| region.add_member(player))
    }

    pub fn remove_member(&mut self, region_id: &str, player: Uuid) -> Result<bool, UnknownRegion> {
        self.mutate_region(region_id, |region| region.remove_member(player))
    }

    pub fn add_co_owner(&mut self, region_id: &str, player: Uuid) -> Result<bool, UnknownRegion> {
        self.mutate_region(region_id, |region| region.add_co_owner(player))
    }

    pub fn remove_co_owner(
        &mut self,
        region_id: &str,
        player: Uuid,
    ) -> Result<bool, UnknownRegion> {
        self.mutate_region(region_id, |region| region.remove_co_owner(player))
    }

    /// Returns true when the flag actually changed
    pub fn set_hidden(&mut self, region_id: &str, hidden: bool) -> Result<bool, UnknownRegion> {
        self.mutate_region(region_id, |region| {
            let changed = region.hidden != hidden;
            region.hidden = hidden;
            changed
        })
    }

    /// Apply a mutation to a region and write through when it changed
    fn mutate_region(
        &mut self,
        region_id: &str,
        mutate: impl FnOnce(&mut crate::region::Region) -> bool,
    ) -> Result<bool, UnknownRegion> {
        let region = self
            .registry
            .get_mut(region_id)
            .ok_or_else(|| UnknownRegion(region_id.to_string()))?;
        let changed = mutate(region);
        if changed {
            self.registry.persist_logged();
        }
        Ok(changed)
    }

    // === Special charges ===

    /// Flag a placed charge instance as able to bypass explosive allow-lists
    pub fn mark_special_charge(&mut self, charge: Uuid, now: Instant) {
        self.charges.mark(charge, now);
    }

    /// Forget a charge that was removed without detonating
    pub fn discard_charge(&mut self, charge: Uuid) {
        self.charges.discard(charge);
    }

    // === Presence ===

    /// Feed one position poll. Rate-limited per player; the region lookup is
    /// skipped entirely when the player is not yet due for a check.
    pub fn poll_position(
        &mut self,
        player: Uuid,
        point: &WorldPoint,
        now: Instant,
    ) -> Option<PresenceChange> {
        if !self.presence.due(player, now) {
            return None;
        }
        let current = self
            .registry
            .region_at(point)
            .map(|r| (r.id.clone(), r.relationship(player)));
        self.presence.observe(player, current, now)
    }

    /// Forget a disconnected player
    pub fn remove_player(&mut self, player: Uuid) {
        self.presence.remove_player(player);
    }

    // === Housekeeping ===

    /// Low-frequency maintenance: reap stale charge marks and idle presence
    /// entries. Drive this from the host's repeating timer.
    pub fn sweep(&mut self, now: Instant) {
        let charges = self.charges.sweep(now);
        let players = self.presence.sweep(now);
        if charges > 0 || players > 0 {
            log::debug!("sweep evicted {charges} charge marks, {players} idle players");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::StaticCapabilities;
    use crate::config::parse_policy_table;
    use crate::persist::MemoryStore;
    use crate::store::MemoryZoneStore;
    use crate::types::PlayerRef;

    fn make_engine() -> ProtectionEngine {
        let policies = parse_policy_table(
            r#"
[[policies]]
id = "sentinel_stone"
trigger_block = "iron_block"
radius = 10
priority = 30
"#,
        )
        .unwrap();
        let registry = RegionRegistry::new(
            Box::new(MemoryZoneStore::new()),
            Box::new(MemoryStore::new()),
        );
        ProtectionEngine::new(
            policies,
            EngineSettings::default(),
            registry,
            Box::new(StaticCapabilities::new()),
        )
    }

    fn seed_region(engine: &mut ProtectionEngine, owner: &PlayerRef) -> String {
        use crate::capability::Quota;
        let table = engine.policies.clone();
        let policy = table.by_id("sentinel_stone").unwrap();
        engine
            .registry
            .create(
                owner,
                WorldPoint::new("overworld", 0, 64, 0),
                policy,
                Quota::Limited(10),
            )
            .unwrap()
    }

    #[test]
    fn test_membership_write_through() {
        let mut engine = make_engine();
        let owner = PlayerRef::new(Uuid::new_v4(), "Alice");
        let id = seed_region(&mut engine, &owner);
        let friend = Uuid::new_v4();

        assert!(engine.add_member(&id, friend).unwrap());
        assert!(!engine.add_member(&id, friend).unwrap());
        assert!(engine.registry().get(&id).unwrap().is_member(friend));

        assert!(engine.remove_member(&id, friend).unwrap());
        assert!(!engine.remove_member(&id, friend).unwrap());
    }

    #[test]
    fn test_unknown_region_errors() {
        let mut engine = make_engine();
        assert!(engine.add_member("ghost_0", Uuid::new_v4()).is_err());
        assert!(engine.set_hidden("ghost_0", true).is_err());
    }

    #[test]
    fn test_set_hidden_reports_change() {
        let mut engine = make_engine();
        let owner = PlayerRef::new(Uuid::new_v4(), "Alice");
        let id = seed_region(&mut engine, &owner);

        assert!(engine.set_hidden(&id, true).unwrap());
        assert!(!engine.set_hidden(&id, true).unwrap());
        assert!(engine.registry().get(&id).unwrap().hidden);
    }

    #[test]
    fn test_reload_swaps_table() {
        let mut engine = make_engine();
        let next = parse_policy_table(
            r#"
[[policies]]
id = "other"
trigger_block = "coal_block"
radius = 5
"#,
        )
        .unwrap();
        engine.reload_policies(next);
        assert!(engine.policies().by_id("sentinel_stone").is_none());
        assert!(engine.policies().by_id("other").is_some());
    }

    #[test]
    fn test_poll_position_reports_transitions() {
        let mut engine = make_engine();
        let owner = PlayerRef::new(Uuid::new_v4(), "Alice");
        let id = seed_region(&mut engine, &owner);
        let now = Instant::now();

        let inside = WorldPoint::new("overworld", 3, 64, 0);
        let outside = WorldPoint::new("overworld", 500, 64, 0);

        let change = engine.poll_position(owner.id, &inside, now);
        assert!(matches!(
            change,
            Some(PresenceChange::Entered { ref region_id, .. }) if *region_id == id
        ));

        // Too soon: rate limited even though the player moved out.
        let change = engine.poll_position(
            owner.id,
            &outside,
            now + std::time::Duration::from_millis(10),
        );
        assert_eq!(change, None);

        let change = engine.poll_position(
            owner.id,
            &outside,
            now + std::time::Duration::from_secs(2),
        );
        assert!(matches!(change, Some(PresenceChange::Left { .. })));
    }
}
