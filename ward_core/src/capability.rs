//! Capability predicate and quota tiers
//!
//! The engine never evaluates permission strings itself; it asks an opaque
//! boolean oracle supplied by the host.

use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// Capability required to create regions by placing an anchor block
pub const CAP_CREATE: &str = "wardstone.create";
/// Capability required to break an anchor block directly
pub const CAP_DESTROY: &str = "wardstone.destroy";
/// Administrative override: act on regions the actor does not own
pub const CAP_ADMIN: &str = "wardstone.admin";
/// Grants an unbounded region quota
pub const CAP_LIMIT_UNLIMITED: &str = "wardstone.limit.unlimited";

/// Highest quota tier probed when resolving a player's limit
const MAX_QUOTA_TIER: u32 = 100;

/// Opaque yes/no permission oracle supplied by the host environment
pub trait CapabilityOracle {
    fn has_capability(&self, actor: Uuid, capability: &str) -> bool;
}

/// A resolved region quota
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quota {
    Unlimited,
    Limited(u32),
}

impl Quota {
    /// Whether an actor owning `owned` regions may create one more
    pub fn allows(self, owned: u32) -> bool {
        match self {
            Quota::Unlimited => true,
            Quota::Limited(limit) => owned < limit,
        }
    }
}

/// Resolve an actor's region quota: the unlimited grant wins, else the
/// highest `wardstone.limit.<n>` tier held, else the configured default.
pub fn quota_for(oracle: &dyn CapabilityOracle, actor: Uuid, default_limit: u32) -> Quota {
    if oracle.has_capability(actor, CAP_LIMIT_UNLIMITED) {
        return Quota::Unlimited;
    }

    for tier in (1..=MAX_QUOTA_TIER).rev() {
        if oracle.has_capability(actor, &format!("wardstone.limit.{tier}")) {
            return Quota::Limited(tier);
        }
    }

    Quota::Limited(default_limit)
}

/// Fixed grant table, for tests and offline tools
#[derive(Debug, Clone, Default)]
pub struct StaticCapabilities {
    grants: HashMap<Uuid, HashSet<String>>,
}

impl StaticCapabilities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant(&mut self, actor: Uuid, capability: &str) -> &mut Self {
        self.grants
            .entry(actor)
            .or_default()
            .insert(capability.to_string());
        self
    }

    pub fn revoke(&mut self, actor: Uuid, capability: &str) {
        if let Some(set) = self.grants.get_mut(&actor) {
            set.remove(capability);
        }
    }
}

impl CapabilityOracle for StaticCapabilities {
    fn has_capability(&self, actor: Uuid, capability: &str) -> bool {
        self.grants
            .get(&actor)
            .map_or(false, |set| set.contains(capability))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_quota_when_no_grants() {
        let caps = StaticCapabilities::new();
        let actor = Uuid::new_v4();
        assert_eq!(quota_for(&caps, actor, 3), Quota::Limited(3));
    }

    #[test]
    fn test_unlimited_grant_wins() {
        let mut caps = StaticCapabilities::new();
        let actor = Uuid::new_v4();
        caps.grant(actor, CAP_LIMIT_UNLIMITED);
        caps.grant(actor, "wardstone.limit.5");
        assert_eq!(quota_for(&caps, actor, 3), Quota::Unlimited);
        assert!(Quota::Unlimited.allows(u32::MAX - 1));
    }

    #[test]
    fn test_highest_tier_wins() {
        let mut caps = StaticCapabilities::new();
        let actor = Uuid::new_v4();
        caps.grant(actor, "wardstone.limit.5");
        caps.grant(actor, "wardstone.limit.20");
        assert_eq!(quota_for(&caps, actor, 3), Quota::Limited(20));
    }

    #[test]
    fn test_quota_allows() {
        assert!(Quota::Limited(3).allows(2));
        assert!(!Quota::Limited(3).allows(3));
        assert!(!Quota::Limited(0).allows(0));
    }

    #[test]
    fn test_revoke() {
        let mut caps = StaticCapabilities::new();
        let actor = Uuid::new_v4();
        caps.grant(actor, CAP_CREATE);
        assert!(caps.has_capability(actor, CAP_CREATE));
        caps.revoke(actor, CAP_CREATE);
        assert!(!caps.has_capability(actor, CAP_CREATE));
    }
}
