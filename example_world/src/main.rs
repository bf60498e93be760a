//! Example world - a scripted session against the protection engine
//!
//! Wires the engine to an in-memory zone store and a temp-file region
//! store, then walks through the main flows:
//! - placing anchors (region creation, quota refusal)
//! - explosions (allow-lists, durability damage, special charges)
//! - upgrading a damaged region
//! - presence polling

use std::time::Instant;

use uuid::Uuid;
use ward_core::capability::{CAP_CREATE, CAP_DESTROY};
use ward_core::prelude::*;

fn separator(title: &str) {
    println!("\n{}", "=".repeat(60));
    println!("  {title}");
    println!("{}\n", "=".repeat(60));
}

fn main() {
    env_logger::init();

    let alice = PlayerRef::new(Uuid::new_v4(), "Alice");
    let bob = PlayerRef::new(Uuid::new_v4(), "Bob");

    let mut caps = StaticCapabilities::new();
    caps.grant(alice.id, CAP_CREATE);
    caps.grant(alice.id, CAP_DESTROY);
    caps.grant(alice.id, "wardstone.limit.2");
    caps.grant(bob.id, CAP_CREATE);

    let registry = RegionRegistry::new(
        Box::new(MemoryZoneStore::new()),
        Box::new(MemoryStore::new()),
    );
    let mut engine = ProtectionEngine::new(
        default_policies(),
        EngineSettings::default(),
        registry,
        Box::new(caps),
    );

    separator("Placing anchors");
    let spots = [(0, "iron_block"), (100, "iron_block"), (200, "iron_block")];
    for (x, block) in spots {
        let outcome = engine.handle_place(
            &alice,
            WorldPoint::new("overworld", x, 64, 0),
            &BlockTypeId::from(block),
        );
        println!("Alice places {block} at x={x}: {outcome:?}");
    }

    separator("Explosions");
    let anchor = WorldPoint::new("overworld", 0, 64, 0);

    // Wrong class: sentinel stones only fall to plain charges.
    let report = engine.resolve_explosion(DetonationEvent {
        source: DetonationSource::ChargeMinecart,
        charge: None,
        attacker: Some(bob.id),
        cells: vec![AffectedCell::new(anchor.clone(), BlockTypeId::from("iron_block"))],
    });
    println!("Minecart charge at the anchor: {:?}", report.outcomes);

    // Right class: chips away at durability.
    for round in 1..=3 {
        let report = engine.resolve_explosion(DetonationEvent {
            source: DetonationSource::PrimedCharge,
            charge: None,
            attacker: Some(bob.id),
            cells: vec![AffectedCell::new(anchor.clone(), BlockTypeId::from("iron_block"))],
        });
        println!("Plain charge #{round}: {:?}", report.outcomes);
    }

    separator("Upgrading");
    let outcome = engine.handle_upgrade(
        &alice,
        &anchor,
        &BlockTypeId::from("iron_block"),
        &ItemTypeId::from("diamond"),
        4,
    );
    println!("Alice upgrades with diamonds: {outcome:?}");

    separator("Special charge");
    let charge = Uuid::new_v4();
    engine.mark_special_charge(charge, Instant::now());
    let report = engine.resolve_explosion(DetonationEvent {
        source: DetonationSource::ChargeMinecart,
        charge: Some(charge),
        attacker: Some(bob.id),
        cells: vec![AffectedCell::new(
            WorldPoint::new("overworld", 100, 64, 0),
            BlockTypeId::from("iron_block"),
        )],
    });
    println!("Marked minecart charge bypasses the allow-list: {:?}", report.outcomes);

    separator("Presence");
    let now = Instant::now();
    let path = [(0, now), (300, now + engine.settings().presence_check_interval())];
    for (x, at) in path {
        if let Some(change) =
            engine.poll_position(bob.id, &WorldPoint::new("overworld", x, 64, 0), at)
        {
            println!("Bob at x={x}: {change:?}");
        }
    }

    separator("Direct break");
    let outcome = engine.handle_break(&alice, &anchor, &BlockTypeId::from("iron_block"));
    println!("Alice breaks her own anchor: {outcome:?}");
    println!(
        "Regions remaining: {}",
        engine.registry().len()
    );
}
