//! Convenience re-exports for hosts embedding the engine

pub use crate::capability::{CapabilityOracle, Quota, StaticCapabilities};
pub use crate::config::{default_policies, EngineSettings, PolicyTable};
pub use crate::engine::ProtectionEngine;
pub use crate::events::{BreakOutcome, PlacementOutcome, UpgradeOutcome};
pub use crate::explosion::{AffectedCell, CellOutcome, DetonationEvent, ExplosionReport};
pub use crate::persist::{JsonFileStore, MemoryStore};
pub use crate::presence::PresenceChange;
pub use crate::region::{DurabilityBand, Region, Relationship};
pub use crate::registry::RegionRegistry;
pub use crate::store::{MemoryZoneStore, ZoneStore};
pub use crate::types::{BlockTypeId, DetonationSource, ItemTypeId, PlayerRef, WorldPoint};
