//! Region entity: ownership, membership, spherical containment, durability
//!
//! A region owns its membership sets outright; callers go through the
//! mutator methods and never receive a live handle to the underlying
//! collections.

use crate::types::WorldPoint;
use std::collections::HashSet;
use uuid::Uuid;

/// How a player relates to a region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relationship {
    Owner,
    Member,
    Outsider,
}

/// Health band of a durability-enabled region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurabilityBand {
    /// Above 60% health
    Healthy,
    /// 30-60% health
    Damaged,
    /// Below 30% health
    Critical,
    /// Health exhausted; the region awaits removal
    Destroyed,
}

/// Per-region health pool
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Durability {
    pub current: u32,
    pub max: u32,
}

/// One owned protected volume anchored to a placed block
#[derive(Debug, Clone)]
pub struct Region {
    /// Globally unique id derived from the owner name and a per-owner sequence
    pub id: String,
    owner: Uuid,
    co_owners: HashSet<Uuid>,
    members: HashSet<Uuid>,
    /// The anchor block position; also the center of the protected sphere
    pub center: WorldPoint,
    pub radius: i32,
    /// Id of the policy that created this region, kept even if the policy
    /// disappears on a later reload
    pub policy_id: String,
    /// Copied from the policy at creation time and frozen
    pub priority: i32,
    pub hidden: bool,
    durability: Option<Durability>,
}

impl Region {
    pub fn new(
        id: String,
        owner: Uuid,
        center: WorldPoint,
        radius: i32,
        policy_id: String,
        priority: i32,
    ) -> Self {
        Region {
            id,
            owner,
            co_owners: HashSet::new(),
            members: HashSet::new(),
            center,
            radius,
            policy_id,
            priority,
            hidden: false,
            durability: None,
        }
    }

    // === Containment ===

    /// Whether a point lies inside this region.
    ///
    /// Containment is spherical: Euclidean distance from the anchor, not the
    /// cuboid registered with the external zone store. The sphere is the
    /// authoritative shape for every decision this engine makes.
    pub fn contains(&self, point: &WorldPoint) -> bool {
        if point.world != self.center.world {
            return false;
        }
        let r = i64::from(self.radius);
        point.pos.distance_squared(&self.center.pos) <= r * r
    }

    /// Whether a point is exactly the anchor block
    pub fn is_anchor(&self, point: &WorldPoint) -> bool {
        *point == self.center
    }

    // === Ownership and membership ===

    pub fn owner(&self) -> Uuid {
        self.owner
    }

    /// True for the primary owner and all co-owners
    pub fn is_owner(&self, player: Uuid) -> bool {
        self.owner == player || self.co_owners.contains(&player)
    }

    pub fn is_member(&self, player: Uuid) -> bool {
        self.members.contains(&player)
    }

    /// Owner, co-owner, or member
    pub fn has_access(&self, player: Uuid) -> bool {
        self.is_owner(player) || self.is_member(player)
    }

    pub fn relationship(&self, player: Uuid) -> Relationship {
        if self.is_owner(player) {
            Relationship::Owner
        } else if self.is_member(player) {
            Relationship::Member
        } else {
            Relationship::Outsider
        }
    }

    /// Returns false if the player was already a member
    pub fn add_member(&mut self, player: Uuid) -> bool {
        self.members.insert(player)
    }

    pub fn remove_member(&mut self, player: Uuid) -> bool {
        self.members.remove(&player)
    }

    pub fn add_co_owner(&mut self, player: Uuid) -> bool {
        self.co_owners.insert(player)
    }

    pub fn remove_co_owner(&mut self, player: Uuid) -> bool {
        self.co_owners.remove(&player)
    }

    pub fn members(&self) -> impl Iterator<Item = &Uuid> {
        self.members.iter()
    }

    pub fn co_owners(&self) -> impl Iterator<Item = &Uuid> {
        self.co_owners.iter()
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    // === Durability state machine ===

    /// Give this region a health pool. Used at creation from the policy and
    /// when restoring persisted state.
    pub fn init_durability(&mut self, current: u32, max: u32) {
        self.durability = Some(Durability {
            current: current.min(max),
            max,
        });
    }

    pub fn durability(&self) -> Option<Durability> {
        self.durability
    }

    pub fn durability_enabled(&self) -> bool {
        self.durability.map_or(false, |d| d.max > 0)
    }

    /// Apply damage to the health pool.
    ///
    /// Returns true iff health is exhausted afterwards. Destruction is only
    /// signaled here; removing the region is the caller's responsibility, so
    /// calling again on an already-exhausted region keeps returning true.
    pub fn damage(&mut self, amount: u32) -> bool {
        match &mut self.durability {
            Some(d) if d.max > 0 => {
                d.current = d.current.saturating_sub(amount);
                d.current == 0
            }
            _ => false,
        }
    }

    /// Restore health, clamped at the maximum. Returns the amount actually
    /// applied (0 when durability is disabled).
    pub fn upgrade(&mut self, amount: u32) -> u32 {
        match &mut self.durability {
            Some(d) if d.max > 0 => {
                let applied = amount.min(d.max - d.current);
                d.current += applied;
                applied
            }
            _ => 0,
        }
    }

    pub fn can_upgrade(&self) -> bool {
        self.durability
            .map_or(false, |d| d.max > 0 && d.current < d.max)
    }

    /// Health as a percentage; 100 when durability is disabled
    pub fn health_percent(&self) -> f64 {
        match self.durability {
            Some(d) if d.max > 0 => f64::from(d.current) / f64::from(d.max) * 100.0,
            _ => 100.0,
        }
    }

    pub fn band(&self) -> DurabilityBand {
        let percent = self.health_percent();
        if percent <= 0.0 {
            DurabilityBand::Destroyed
        } else if percent < 30.0 {
            DurabilityBand::Critical
        } else if percent <= 60.0 {
            DurabilityBand::Damaged
        } else {
            DurabilityBand::Healthy
        }
    }
}
