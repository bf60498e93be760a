//! ward_core - Land-protection engine for shared voxel worlds
//!
//! This library provides:
//! - PolicyTable: static catalog of per-block protection rules
//! - Region / RegionRegistry: owned protected volumes with spatial lookup,
//!   quotas, and persistence
//! - ProtectionEngine: the context object that resolves placement, breaks,
//!   upgrades, explosions, and presence polls into typed outcomes
//!
//! The engine runs single-threaded under a run-to-completion dispatcher;
//! the command surface, rendering, and the external zone store's own ACL
//! checks all live outside this crate.

pub mod capability;
pub mod config;
pub mod engine;
pub mod events;
pub mod explosion;
pub mod persist;
pub mod prelude;
pub mod presence;
pub mod region;
pub mod registry;
pub mod store;
pub mod types;

// Re-export core types for convenience
pub use capability::{quota_for, CapabilityOracle, Quota, StaticCapabilities};
pub use config::{
    default_policies, load_policy_table, parse_policy_table, ConfigError, DurabilityPolicy,
    EngineSettings, PolicyTable, ProtectionPolicy,
};
pub use engine::ProtectionEngine;
pub use events::{
    BreakOutcome, BreakRefusal, PlacementOutcome, PlacementRefusal, UpgradeOutcome, UpgradeRefusal,
};
pub use explosion::{
    AffectedCell, CellOutcome, ChargeMarks, DetonationEvent, ExplosionReport, ProtectReason,
};
pub use persist::{JsonFileStore, MemoryStore, RegionPersistence, RegionRecord};
pub use presence::{PresenceChange, PresenceTracker};
pub use region::{Durability, DurabilityBand, Region, Relationship};
pub use registry::{CreationError, LoadSummary, RegionRegistry, UnknownRegion};
pub use store::{MemoryZoneStore, ZoneStore, ZoneStoreError, ZoneVolume};
pub use types::{
    BlockPos, BlockTypeId, DetonationSource, ExplosiveClass, ItemTypeId, PlayerRef, WorldPoint,
};
