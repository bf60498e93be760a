//! Per-cell explosive resolution
//!
//! Stage order is a fixed contract: classification and policy gates run
//! before any mutation, and mutation runs before the outcomes the
//! presentation layer consumes.

use super::{CellOutcome, DetonationEvent, ExplosionReport, ProtectReason};
use crate::engine::ProtectionEngine;

impl ProtectionEngine {
    /// Resolve an area-effect event against every protected region it
    /// touches.
    ///
    /// Cells the engine claims are absent from `released`; whatever the
    /// decision, the physics system must not destroy them itself. A fault
    /// while resolving one region is logged and skipped so the rest of the
    /// event still resolves.
    pub fn resolve_explosion(&mut self, event: DetonationEvent) -> ExplosionReport {
        // Step 1: classify. Sources the engine does not govern leave the
        // event untouched.
        let Some(class) = event.source.classify() else {
            return ExplosionReport::ungoverned(event.cells);
        };

        // The charge's special mark is consumed now, whether or not any
        // region ends up in the blast.
        let special = event
            .charge
            .map_or(false, |charge| self.charges.consume(charge));
        let damage_amount = self.settings.explosion_damage.for_source(event.source);

        let mut report = ExplosionReport {
            class: Some(class),
            special,
            released: Vec::new(),
            outcomes: Vec::new(),
        };

        for cell in event.cells {
            // Step 2: only registered anchor block types concern us.
            if !self.policies.is_protection_block(&cell.block) {
                report.released.push(cell);
                continue;
            }

            // Step 3: resolve the covering region.
            let snapshot = self.registry.region_at(&cell.point).map(|r| {
                (
                    r.id.clone(),
                    r.owner(),
                    r.policy_id.clone(),
                    r.is_anchor(&cell.point),
                    r.durability_enabled(),
                )
            });
            let Some((region_id, owner, policy_id, is_anchor, durable)) = snapshot else {
                report.released.push(cell);
                continue;
            };

            // Step 4: anchors only react at their own center.
            if !is_anchor {
                report.released.push(cell);
                continue;
            }

            // Step 5: destructibility gate. A vanished policy degrades to
            // "not destructible" instead of failing the event.
            let (allowed, reason) = match self.policies.by_id(&policy_id) {
                Some(policy) => {
                    let reason = if policy.destructible {
                        ProtectReason::ClassNotAllowed
                    } else {
                        ProtectReason::Indestructible
                    };
                    (policy.can_be_destroyed_by(class), reason)
                }
                None => {
                    log::warn!(
                        "region {region_id} references unknown policy {policy_id}; treating as indestructible"
                    );
                    (false, ProtectReason::Indestructible)
                }
            };
            let can_destroy = special || allowed;

            // Step 6: protected. The cell is claimed; the anchor survives.
            if !can_destroy {
                report.outcomes.push(CellOutcome::Protected {
                    region_id,
                    owner,
                    reason,
                });
                continue;
            }

            // Step 7: durability absorbs the blast.
            if durable {
                let Some(region) = self.registry.get_mut(&region_id) else {
                    report.released.push(cell);
                    continue;
                };
                let destroyed = region.damage(damage_amount);
                let durability = region.durability().unwrap_or_default();
                let band = region.band();
                self.registry.persist_logged();

                report.outcomes.push(CellOutcome::Damaged {
                    region_id: region_id.clone(),
                    owner,
                    damage: damage_amount,
                    current: durability.current,
                    max: durability.max,
                    band,
                });

                if destroyed {
                    match self.registry.remove(&region_id) {
                        Ok(_) => report.outcomes.push(CellOutcome::Destroyed {
                            region_id,
                            owner,
                            break_anchor: true,
                        }),
                        Err(e) => {
                            log::error!("failed to deregister destroyed region {region_id}: {e}");
                            report.outcomes.push(CellOutcome::Faulted { region_id });
                        }
                    }
                }
                continue;
            }

            // Step 8: no durability, the legacy instant-destroy path.
            match self.registry.remove(&region_id) {
                Ok(_) => report.outcomes.push(CellOutcome::Destroyed {
                    region_id,
                    owner,
                    break_anchor: false,
                }),
                Err(e) => {
                    log::error!("failed to remove region {region_id}: {e}");
                    report.outcomes.push(CellOutcome::Faulted { region_id });
                }
            }
        }

        report
    }
}
