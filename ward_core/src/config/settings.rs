//! Engine settings configuration

use crate::types::DetonationSource;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunable engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Regions a player may own when no quota capability applies
    #[serde(default = "default_region_limit")]
    pub default_region_limit: u32,
    /// Seconds before an unconsumed special-charge mark is swept
    #[serde(default = "default_charge_timeout")]
    pub special_charge_timeout_secs: u64,
    /// Minimum milliseconds between presence checks per player
    #[serde(default = "default_presence_interval")]
    pub presence_check_interval_ms: u64,
    /// Seconds of inactivity before a player is dropped from presence tracking
    #[serde(default = "default_presence_idle")]
    pub presence_idle_timeout_secs: u64,
    #[serde(default)]
    pub explosion_damage: ExplosionDamage,
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings {
            default_region_limit: default_region_limit(),
            special_charge_timeout_secs: default_charge_timeout(),
            presence_check_interval_ms: default_presence_interval(),
            presence_idle_timeout_secs: default_presence_idle(),
            explosion_damage: ExplosionDamage::default(),
        }
    }
}

impl EngineSettings {
    pub fn special_charge_timeout(&self) -> Duration {
        Duration::from_secs(self.special_charge_timeout_secs)
    }

    pub fn presence_check_interval(&self) -> Duration {
        Duration::from_millis(self.presence_check_interval_ms)
    }

    pub fn presence_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.presence_idle_timeout_secs)
    }
}

fn default_region_limit() -> u32 {
    3
}
fn default_charge_timeout() -> u64 {
    300
}
fn default_presence_interval() -> u64 {
    1000
}
fn default_presence_idle() -> u64 {
    300
}

/// Damage a region's health pool takes per explosion, by source kind
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplosionDamage {
    #[serde(default = "default_plain_charge")]
    pub plain_charge: u32,
    #[serde(default = "default_entity_charge")]
    pub entity_charge: u32,
    #[serde(default = "default_minecart_charge")]
    pub minecart_charge: u32,
    #[serde(default = "default_skull_projectile")]
    pub skull_projectile: u32,
    #[serde(default = "default_fireball")]
    pub fireball: u32,
    #[serde(default = "default_crystal")]
    pub crystal: u32,
    #[serde(default = "default_fallback")]
    pub fallback: u32,
}

impl Default for ExplosionDamage {
    fn default() -> Self {
        ExplosionDamage {
            plain_charge: default_plain_charge(),
            entity_charge: default_entity_charge(),
            minecart_charge: default_minecart_charge(),
            skull_projectile: default_skull_projectile(),
            fireball: default_fireball(),
            crystal: default_crystal(),
            fallback: default_fallback(),
        }
    }
}

impl ExplosionDamage {
    /// Damage dealt by one detonation of the given source kind
    pub fn for_source(&self, source: DetonationSource) -> u32 {
        match source {
            DetonationSource::PrimedCharge => self.plain_charge,
            DetonationSource::ChargedMob => self.entity_charge,
            DetonationSource::ChargeMinecart => self.minecart_charge,
            DetonationSource::SkullProjectile => self.skull_projectile,
            DetonationSource::Fireball => self.fireball,
            DetonationSource::Crystal => self.crystal,
            DetonationSource::Other => self.fallback,
        }
    }
}

fn default_plain_charge() -> u32 {
    25
}
fn default_entity_charge() -> u32 {
    20
}
fn default_minecart_charge() -> u32 {
    35
}
fn default_skull_projectile() -> u32 {
    45
}
fn default_fireball() -> u32 {
    15
}
fn default_crystal() -> u32 {
    50
}
fn default_fallback() -> u32 {
    20
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = EngineSettings::default();
        assert_eq!(settings.default_region_limit, 3);
        assert_eq!(settings.special_charge_timeout(), Duration::from_secs(300));
        assert_eq!(settings.presence_check_interval(), Duration::from_millis(1000));
    }

    #[test]
    fn test_damage_table_defaults() {
        let damage = ExplosionDamage::default();
        assert_eq!(damage.for_source(DetonationSource::PrimedCharge), 25);
        assert_eq!(damage.for_source(DetonationSource::ChargeMinecart), 35);
        assert_eq!(damage.for_source(DetonationSource::Crystal), 50);
        assert_eq!(damage.for_source(DetonationSource::SkullProjectile), 45);
        assert_eq!(damage.for_source(DetonationSource::Fireball), 15);
        assert_eq!(damage.for_source(DetonationSource::ChargedMob), 20);
    }

    #[test]
    fn test_parse_partial_settings() {
        let toml = r#"
default_region_limit = 10

[explosion_damage]
plain_charge = 40
"#;
        let settings: EngineSettings = toml::from_str(toml).unwrap();
        assert_eq!(settings.default_region_limit, 10);
        assert_eq!(settings.explosion_damage.plain_charge, 40);
        // Unset fields keep their defaults.
        assert_eq!(settings.explosion_damage.crystal, 50);
        assert_eq!(settings.special_charge_timeout_secs, 300);
    }
}
