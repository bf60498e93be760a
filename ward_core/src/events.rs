//! Environment event handlers: anchor placement, direct break, upgrade
//!
//! Handlers never format text and never touch the world themselves; they
//! return reason-coded outcomes and the host applies the veto or effect.

use crate::capability::{quota_for, CAP_ADMIN, CAP_CREATE, CAP_DESTROY};
use crate::engine::ProtectionEngine;
use crate::region::Durability;
use crate::registry::CreationError;
use crate::types::{BlockTypeId, ItemTypeId, PlayerRef, WorldPoint};
use uuid::Uuid;

/// Result of placing a block that might be a protection anchor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlacementOutcome {
    /// Not a registered anchor block; placement proceeds normally
    NotAnchor,
    /// A region was created around the placed anchor
    Created {
        region_id: String,
        radius: i32,
        priority: i32,
        destructible: bool,
        durability: Option<Durability>,
    },
    /// Placement must be vetoed
    Refused(PlacementRefusal),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementRefusal {
    MissingCapability,
    QuotaExceeded { owned: u32, limit: u32 },
    StoreFailure,
}

/// Result of a direct break on a block that might be a region anchor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BreakOutcome {
    /// Not the anchor of any region; the break proceeds normally
    NotProtected,
    /// The region was removed along with its anchor
    Removed { region_id: String, owner: Uuid },
    /// The break must be vetoed; the block stays
    Vetoed(BreakRefusal),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakRefusal {
    MissingCapability,
    NotOwner,
    StoreFailure,
}

/// Result of an upgrade interaction on a region anchor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpgradeOutcome {
    /// Not the anchor of any region; nothing to upgrade
    NotProtected,
    Refused(UpgradeRefusal),
    /// Health was restored; the host consumes `items_consumed` of the
    /// upgrade item from the actor
    Upgraded {
        region_id: String,
        applied: u32,
        items_consumed: u32,
        current: u32,
        max: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpgradeRefusal {
    NotOwner,
    /// Durability is disabled for this region (or its policy is gone)
    NotUpgradeable,
    AlreadyAtMax,
    WrongItem { required: ItemTypeId },
    NotEnoughItems { required: u32, held: u32 },
}

impl ProtectionEngine {
    /// A player placed `block` at `point`. When the block is a registered
    /// anchor, gate on the create capability and the owner's quota, then
    /// create the region.
    pub fn handle_place(
        &mut self,
        actor: &PlayerRef,
        point: WorldPoint,
        block: &BlockTypeId,
    ) -> PlacementOutcome {
        let Some(policy) = self.policies.for_block(block) else {
            return PlacementOutcome::NotAnchor;
        };

        if !self.capabilities.has_capability(actor.id, CAP_CREATE) {
            return PlacementOutcome::Refused(PlacementRefusal::MissingCapability);
        }

        let quota = quota_for(
            &*self.capabilities,
            actor.id,
            self.settings.default_region_limit,
        );

        match self.registry.create(actor, point, policy, quota) {
            Ok(region_id) => {
                let durability = self
                    .registry
                    .get(&region_id)
                    .and_then(|region| region.durability());
                PlacementOutcome::Created {
                    region_id,
                    radius: policy.radius,
                    priority: policy.priority,
                    destructible: policy.destructible,
                    durability,
                }
            }
            Err(CreationError::QuotaExceeded { owned, limit }) => {
                PlacementOutcome::Refused(PlacementRefusal::QuotaExceeded { owned, limit })
            }
            Err(CreationError::Store(e)) => {
                log::error!("zone store refused region for {}: {e}", actor.name);
                PlacementOutcome::Refused(PlacementRefusal::StoreFailure)
            }
        }
    }

    /// A player broke `block` at `point`. Only the exact anchor of a region
    /// is guarded here; everything else inside the volume is the external
    /// store's business.
    pub fn handle_break(
        &mut self,
        actor: &PlayerRef,
        point: &WorldPoint,
        block: &BlockTypeId,
    ) -> BreakOutcome {
        if !self.policies.is_protection_block(block) {
            return BreakOutcome::NotProtected;
        }
        let snapshot = self
            .registry
            .region_at(point)
            .map(|r| (r.id.clone(), r.owner(), r.is_anchor(point)));
        let Some((region_id, owner, is_anchor)) = snapshot else {
            return BreakOutcome::NotProtected;
        };
        if !is_anchor {
            return BreakOutcome::NotProtected;
        }

        if !self.capabilities.has_capability(actor.id, CAP_DESTROY) {
            return BreakOutcome::Vetoed(BreakRefusal::MissingCapability);
        }
        let is_owner = self
            .registry
            .get(&region_id)
            .map_or(false, |r| r.is_owner(actor.id));
        if !is_owner && !self.capabilities.has_capability(actor.id, CAP_ADMIN) {
            return BreakOutcome::Vetoed(BreakRefusal::NotOwner);
        }

        match self.registry.remove(&region_id) {
            Ok(true) => BreakOutcome::Removed { region_id, owner },
            Ok(false) => BreakOutcome::NotProtected,
            Err(e) => {
                log::error!("zone store refused removal of {region_id}: {e}");
                BreakOutcome::Vetoed(BreakRefusal::StoreFailure)
            }
        }
    }

    /// A player attempted the upgrade interaction on `block` at `point`
    /// while holding `held_count` of `held_item`. Five independent checks,
    /// each with its own refusal, in a fixed order: ownership, durability,
    /// headroom, item type, item count.
    pub fn handle_upgrade(
        &mut self,
        actor: &PlayerRef,
        point: &WorldPoint,
        block: &BlockTypeId,
        held_item: &ItemTypeId,
        held_count: u32,
    ) -> UpgradeOutcome {
        if !self.policies.is_protection_block(block) {
            return UpgradeOutcome::NotProtected;
        }
        let snapshot = self
            .registry
            .region_at(point)
            .map(|r| (r.id.clone(), r.policy_id.clone(), r.is_anchor(point)));
        let Some((region_id, policy_id, is_anchor)) = snapshot else {
            return UpgradeOutcome::NotProtected;
        };
        if !is_anchor {
            return UpgradeOutcome::NotProtected;
        }

        let is_owner = self
            .registry
            .get(&region_id)
            .map_or(false, |r| r.is_owner(actor.id));
        if !is_owner && !self.capabilities.has_capability(actor.id, CAP_ADMIN) {
            return UpgradeOutcome::Refused(UpgradeRefusal::NotOwner);
        }

        let durable = self
            .registry
            .get(&region_id)
            .map_or(false, |r| r.durability_enabled());
        let Some(upgrade) = self
            .policies
            .by_id(&policy_id)
            .and_then(|p| p.durability.as_ref())
            .filter(|d| d.enabled)
        else {
            return UpgradeOutcome::Refused(UpgradeRefusal::NotUpgradeable);
        };
        if !durable {
            return UpgradeOutcome::Refused(UpgradeRefusal::NotUpgradeable);
        }

        let can_upgrade = self
            .registry
            .get(&region_id)
            .map_or(false, |r| r.can_upgrade());
        if !can_upgrade {
            return UpgradeOutcome::Refused(UpgradeRefusal::AlreadyAtMax);
        }

        if *held_item != upgrade.upgrade_item {
            return UpgradeOutcome::Refused(UpgradeRefusal::WrongItem {
                required: upgrade.upgrade_item.clone(),
            });
        }
        if held_count < upgrade.items_consumed_per_use {
            return UpgradeOutcome::Refused(UpgradeRefusal::NotEnoughItems {
                required: upgrade.items_consumed_per_use,
                held: held_count,
            });
        }

        let amount = upgrade.upgrade_amount_per_use;
        let items_consumed = upgrade.items_consumed_per_use;
        let Some(region) = self.registry.get_mut(&region_id) else {
            return UpgradeOutcome::NotProtected;
        };
        let applied = region.upgrade(amount);
        let durability = region.durability().unwrap_or_default();
        self.registry.persist_logged();

        UpgradeOutcome::Upgraded {
            region_id,
            applied,
            items_consumed,
            current: durability.current,
            max: durability.max,
        }
    }
}
