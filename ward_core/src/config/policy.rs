//! Protection policy catalog loading

use super::ConfigError;
use crate::types::{BlockTypeId, ExplosiveClass, ItemTypeId};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Durability parameters of a policy. When `enabled`, regions created from
/// the policy carry a health pool instead of being instantly destructible.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DurabilityPolicy {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_health")]
    pub default_health: u32,
    #[serde(default = "default_max_health")]
    pub max_health: u32,
    #[serde(default = "default_upgrade_item")]
    pub upgrade_item: ItemTypeId,
    #[serde(default = "default_upgrade_amount")]
    pub upgrade_amount_per_use: u32,
    #[serde(default = "default_items_per_use")]
    pub items_consumed_per_use: u32,
}

fn default_health() -> u32 {
    100
}
fn default_max_health() -> u32 {
    1000
}
fn default_upgrade_item() -> ItemTypeId {
    ItemTypeId("diamond".to_string())
}
fn default_upgrade_amount() -> u32 {
    50
}
fn default_items_per_use() -> u32 {
    1
}

/// Static protection rules bound to one placeable anchor block type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtectionPolicy {
    /// Policy name, unique within the table
    pub id: String,
    /// The block type whose placement creates a region under this policy
    pub trigger_block: BlockTypeId,
    pub radius: i32,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub destructible: bool,
    /// Explosive classes allowed to destroy the region. Empty means any
    /// governed class may, provided `destructible` is set.
    #[serde(default)]
    pub allowed_explosives: HashSet<ExplosiveClass>,
    pub durability: Option<DurabilityPolicy>,
}

impl ProtectionPolicy {
    /// Whether an explosion of the given class may destroy regions of this
    /// policy (before any per-charge override is considered).
    pub fn can_be_destroyed_by(&self, class: ExplosiveClass) -> bool {
        if !self.destructible {
            return false;
        }
        self.allowed_explosives.is_empty() || self.allowed_explosives.contains(&class)
    }

    /// Whether this policy gives its regions a health pool
    pub fn durability_enabled(&self) -> bool {
        self.durability
            .as_ref()
            .map_or(false, |d| d.enabled && d.max_health > 0)
    }
}

/// Container for policy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoliciesConfig {
    #[serde(rename = "policies")]
    pub policies: Vec<ProtectionPolicy>,
}

/// Immutable catalog of protection policies, indexed by trigger block and
/// by policy id. Built whole at load/reload; replacing the table is the
/// only way to change it.
#[derive(Debug, Clone, Default)]
pub struct PolicyTable {
    policies: Vec<ProtectionPolicy>,
    by_block: HashMap<BlockTypeId, usize>,
    by_id: HashMap<String, usize>,
}

impl PolicyTable {
    /// Build and validate a table. Any invalid policy rejects the whole
    /// table so a reload never half-applies.
    pub fn from_policies(policies: Vec<ProtectionPolicy>) -> Result<Self, ConfigError> {
        let mut by_block = HashMap::new();
        let mut by_id = HashMap::new();

        for (idx, policy) in policies.iter().enumerate() {
            if policy.radius < 1 {
                return Err(ConfigError::ValidationError(format!(
                    "policy {}: radius must be at least 1",
                    policy.id
                )));
            }
            if let Some(d) = &policy.durability {
                if d.enabled && d.default_health > d.max_health {
                    return Err(ConfigError::ValidationError(format!(
                        "policy {}: default_health {} exceeds max_health {}",
                        policy.id, d.default_health, d.max_health
                    )));
                }
                if d.enabled && (d.upgrade_amount_per_use == 0 || d.items_consumed_per_use == 0) {
                    return Err(ConfigError::ValidationError(format!(
                        "policy {}: upgrade amounts must be positive",
                        policy.id
                    )));
                }
            }
            if by_id.insert(policy.id.clone(), idx).is_some() {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate policy id {}",
                    policy.id
                )));
            }
            if by_block.insert(policy.trigger_block.clone(), idx).is_some() {
                return Err(ConfigError::ValidationError(format!(
                    "policy {}: trigger block {} already registered",
                    policy.id, policy.trigger_block.0
                )));
            }
        }

        Ok(PolicyTable {
            policies,
            by_block,
            by_id,
        })
    }

    /// Look up the policy whose anchor is the given block type
    pub fn for_block(&self, block: &BlockTypeId) -> Option<&ProtectionPolicy> {
        self.by_block.get(block).map(|&i| &self.policies[i])
    }

    /// Look up a policy by id
    pub fn by_id(&self, id: &str) -> Option<&ProtectionPolicy> {
        self.by_id.get(id).map(|&i| &self.policies[i])
    }

    /// Whether the block type is a registered protection anchor
    pub fn is_protection_block(&self, block: &BlockTypeId) -> bool {
        self.by_block.contains_key(block)
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProtectionPolicy> {
        self.policies.iter()
    }
}

/// Load a policy table from a TOML file
pub fn load_policy_table(path: &Path) -> Result<PolicyTable, ConfigError> {
    let config: PoliciesConfig = super::load_toml(path)?;
    PolicyTable::from_policies(config.policies)
}

/// Load a policy table from a TOML string
pub fn parse_policy_table(content: &str) -> Result<PolicyTable, ConfigError> {
    let config: PoliciesConfig = super::parse_toml(content)?;
    PolicyTable::from_policies(config.policies)
}

/// The built-in policy catalog
pub fn default_policies() -> PolicyTable {
    let toml = include_str!("../../config/policies.toml");
    parse_policy_table(toml).unwrap_or_default()
}
