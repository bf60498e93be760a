//! Presence tracking: which region each player currently stands in
//!
//! Fed by periodic position polls. Checks are rate-limited per player, and
//! players that stop reporting are dropped by the same low-frequency sweep
//! that reaps charge marks.

use crate::region::Relationship;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// A region-occupancy transition worth reporting
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenceChange {
    Entered {
        region_id: String,
        relationship: Relationship,
    },
    Left {
        region_id: String,
    },
    /// Crossed directly from one region into another
    Switched {
        left: String,
        entered: String,
        relationship: Relationship,
    },
}

/// Tracks the last observed region per player
#[derive(Debug)]
pub struct PresenceTracker {
    check_interval: Duration,
    idle_timeout: Duration,
    occupied: HashMap<Uuid, String>,
    last_check: HashMap<Uuid, Instant>,
}

impl PresenceTracker {
    pub fn new(check_interval: Duration, idle_timeout: Duration) -> Self {
        PresenceTracker {
            check_interval,
            idle_timeout,
            occupied: HashMap::new(),
            last_check: HashMap::new(),
        }
    }

    /// Whether this player is due for a presence check. Callers skip the
    /// region lookup entirely when this is false.
    pub fn due(&self, player: Uuid, now: Instant) -> bool {
        self.last_check
            .get(&player)
            .map_or(true, |last| now.duration_since(*last) >= self.check_interval)
    }

    /// Record the region the player currently occupies and report the
    /// transition, if any.
    pub fn observe(
        &mut self,
        player: Uuid,
        current: Option<(String, Relationship)>,
        now: Instant,
    ) -> Option<PresenceChange> {
        self.last_check.insert(player, now);
        let previous = self.occupied.get(&player).cloned();

        match (previous, current) {
            (None, None) => None,
            (Some(prev), Some((cur, relationship))) => {
                if prev == cur {
                    return None;
                }
                self.occupied.insert(player, cur.clone());
                Some(PresenceChange::Switched {
                    left: prev,
                    entered: cur,
                    relationship,
                })
            }
            (None, Some((cur, relationship))) => {
                self.occupied.insert(player, cur.clone());
                Some(PresenceChange::Entered {
                    region_id: cur,
                    relationship,
                })
            }
            (Some(prev), None) => {
                self.occupied.remove(&player);
                Some(PresenceChange::Left { region_id: prev })
            }
        }
    }

    /// Drop a player immediately (disconnect)
    pub fn remove_player(&mut self, player: Uuid) {
        self.occupied.remove(&player);
        self.last_check.remove(&player);
    }

    /// Reap players that have not reported within the idle timeout
    pub fn sweep(&mut self, now: Instant) -> usize {
        let timeout = self.idle_timeout;
        let before = self.last_check.len();
        self.last_check
            .retain(|_, last| now.duration_since(*last) <= timeout);
        let last_check = &self.last_check;
        self.occupied.retain(|player, _| last_check.contains_key(player));
        before - self.last_check.len()
    }

    pub fn tracked_players(&self) -> usize {
        self.last_check.len()
    }
}
