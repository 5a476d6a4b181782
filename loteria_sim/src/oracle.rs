//! Invariant oracle for simulation.
//!
//! The Oracle re-derives every round invariant the slow, obvious way and
//! compares it against what the engine reports:
//! - Playback order is a permutation of `1..=N`
//! - Locked ids form exactly the tail, never the prefix
//! - Healthy rounds lock 4..=6 ids, including the winning start
//! - The prefix ends on a winning id
//! - The cursor stays within the reachable slots
//! - The viewed set only grows within a round
//! - The win flag matches a naive subset check
//! - No win is recorded in a round flagged unwinnable

use loteria_core::{ItemId, RoundState};
use serde::Serialize;
use std::collections::BTreeSet;

/// One broken invariant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OracleViolation {
    /// Round generation it was seen in
    pub generation: u64,

    /// Short name of the check
    pub check: &'static str,

    /// What was observed
    pub detail: String,
}

impl std::fmt::Display for OracleViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[gen {}] {}: {}", self.generation, self.check, self.detail)
    }
}

/// The Oracle - watches a round and records every broken invariant.
#[derive(Debug, Default)]
pub struct Oracle {
    /// Generation of the last observed state
    generation: Option<u64>,

    /// Viewed set at the last observation
    viewed: BTreeSet<ItemId>,

    /// Everything found so far
    violations: Vec<OracleViolation>,
}

impl Oracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn violations(&self) -> &[OracleViolation] {
        &self.violations
    }

    pub fn into_violations(self) -> Vec<OracleViolation> {
        self.violations
    }

    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }

    /// Whether every winning id (and, under the full-complement rule, every
    /// free id) has been viewed.
    pub fn naive_win(state: &RoundState) -> bool {
        let viewed = state.cursor().viewed();
        let window = state.window();
        if viewed.len() < window.run_length as usize {
            return false;
        }

        let window_seen = window.ids().all(|id| viewed.contains(&id));
        if !state.rules().require_full_complement {
            return window_seen;
        }

        window_seen
            && (1..=state.total())
                .filter(|&id| !window.contains(id) && !state.locks().contains(id))
                .all(|id| viewed.contains(&id))
    }

    /// Checks one snapshot. Returns the number of new violations.
    pub fn observe(&mut self, state: &RoundState) -> usize {
        let before = self.violations.len();
        let generation = state.generation();
        let total = state.total();
        let order = state.order();
        let locks = state.locks();

        // Permutation
        let mut sorted = order.ids().to_vec();
        sorted.sort_unstable();
        if sorted != (1..=total).collect::<Vec<_>>() {
            self.flag(generation, "permutation", format!("order is not 1..={}", total));
        }

        // Prefix / tail partition
        if let Some(&id) = order.navigable().iter().find(|&&id| locks.contains(id)) {
            self.flag(generation, "partition", format!("locked id {} in prefix", id));
        }
        let tail: BTreeSet<ItemId> = order.locked_tail().iter().copied().collect();
        if &tail != locks.ids() || tail.len() != order.locked_tail().len() {
            self.flag(generation, "partition", format!("tail {:?} != locks {:?}", order.locked_tail(), locks.ids()));
        }

        // Lock bounds
        if state.health().degenerate.is_none() {
            if !(4..=6).contains(&locks.len()) {
                self.flag(generation, "lock_bounds", format!("{} locks", locks.len()));
            }
            let start = state.window().start;
            if start > 0 && !locks.contains(start) {
                self.flag(generation, "lock_bounds", format!("winning start {} not locked", start));
            }
        }

        // Prefix end
        if !order.is_unwinnable() {
            if let Some(&last) = order.navigable().last() {
                if !state.window().contains(last) {
                    self.flag(generation, "prefix_end", format!("last prefix id {} not winning", last));
                }
            }
        }

        // Cursor bounds
        let index = state.cursor().order_index();
        let reachable = state.reachable_len();
        if index >= reachable.max(1) {
            self.flag(generation, "cursor_bounds", format!("index {} of {} reachable", index, reachable));
        }
        if let Some(id) = state.current_item() {
            if !state.cursor().viewed().contains(&id) {
                self.flag(generation, "cursor_bounds", format!("current id {} not viewed", id));
            }
        }

        // Viewed monotonicity
        let viewed = state.cursor().viewed();
        if self.generation == Some(generation) {
            if !self.viewed.is_subset(viewed) {
                self.flag(generation, "viewed_monotonic", format!("{} ids forgotten", self.viewed.difference(viewed).count()));
            }
        } else if viewed.len() > 1 {
            self.flag(generation, "viewed_monotonic", format!("fresh round starts with {} viewed", viewed.len()));
        }
        self.generation = Some(generation);
        self.viewed = viewed.clone();

        // Win predicate
        let naive = Self::naive_win(state);
        if naive != state.detector().is_winner(viewed) {
            self.flag(generation, "win", format!("naive={} detector={}", naive, !naive));
        }
        if state.has_won() && !naive {
            self.flag(generation, "win", "recorded win no longer holds".to_string());
        }
        if state.has_won() && state.health().unwinnable {
            self.flag(generation, "win", "win recorded in a round flagged unwinnable".to_string());
        }

        self.violations.len() - before
    }

    fn flag(&mut self, generation: u64, check: &'static str, detail: String) {
        let violation = OracleViolation {
            generation,
            check,
            detail,
        };
        tracing::warn!(%violation, "oracle violation");
        self.violations.push(violation);
    }
}
