//! The "GUARD" stage - lock ids fenced around the winning window.
//!
//! Guards keep a second complete run from forming next to the winning one.
//! The guard span is one wider than the run on the far side (`start + 17`
//! for a 16-id run) and each guard slot has a fixed fallback when its
//! preferred position falls off the deck:
//!
//! ```text
//! slot          preferred        fallback
//! start         s       (s > 0)  e + 3
//! before-start  s - 1   (> 0)    e + 2
//! end           e       (<= N)   s - 3
//! after-end     e + 1   (<= N)   s - 2
//! far-before    s - 17  (>= 1)   -
//! far-after     e + 17  (<= N)   -
//! ```

use crate::error::{LoteriaError, Result};
use crate::item::ItemId;
use crate::window::WinningWindow;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Smallest lock set a well-formed round produces.
pub const MIN_LOCKS: usize = 4;

/// Largest lock set a well-formed round produces.
pub const MAX_LOCKS: usize = 6;

/// Which guard position produced a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardSlot {
    Start,
    BeforeStart,
    End,
    AfterEnd,
    FarBefore,
    FarAfter,
}

/// A guard value that landed outside `[1, N]` and was left out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardIssue {
    pub slot: GuardSlot,
    pub value: i64,
}

/// Item ids withheld from normal play for one round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockSet {
    ids: BTreeSet<ItemId>,

    /// Guard anchor `s` (winning start)
    anchor_start: i64,

    /// Guard anchor `e` (winning start + run length + 1)
    anchor_end: i64,

    /// Guards that could not be placed
    issues: Vec<GuardIssue>,
}

impl LockSet {
    pub fn ids(&self) -> &BTreeSet<ItemId> {
        &self.ids
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn issues(&self) -> &[GuardIssue] {
        &self.issues
    }

    /// Guard end anchor, `winningStart + run_length + 1`.
    pub fn guard_end(&self) -> i64 {
        self.anchor_end
    }

    /// Verifies the set against a deck of `total` items.
    ///
    /// Returns [`LoteriaError::DegenerateRound`] when the size leaves
    /// `[MIN_LOCKS, MAX_LOCKS]`, an id leaves `[1, total]`, or a fallback
    /// guard could not be placed.
    pub fn check(&self, total: u32) -> Result<()> {
        if let Some(issue) = self.issues.first() {
            return Err(LoteriaError::degenerate(format!(
                "{:?} guard fell back to {} outside 1..={}",
                issue.slot, issue.value, total
            )));
        }
        if let Some(&id) = self.ids.iter().find(|&&id| id == 0 || id > total) {
            return Err(LoteriaError::degenerate(format!("lock id {} outside 1..={}", id, total)));
        }
        if !(MIN_LOCKS..=MAX_LOCKS).contains(&self.ids.len()) {
            return Err(LoteriaError::degenerate(format!(
                "{} locks, expected {}..={}",
                self.ids.len(),
                MIN_LOCKS,
                MAX_LOCKS
            )));
        }
        Ok(())
    }

    /// Lock ids in the order they are appended to the playback tail:
    /// `s, e`, `s-1, e+1`, `s-2, e+2`, `s-3, e+3`, then the rest ascending.
    pub fn tail_priority(&self) -> Vec<ItemId> {
        let (s, e) = (self.anchor_start, self.anchor_end);
        let tiers = [s, e, s - 1, e + 1, s - 2, e + 2, s - 3, e + 3];

        let mut tail: Vec<ItemId> = Vec::with_capacity(self.ids.len());
        for value in tiers {
            if let Some(id) = in_deck(value, ItemId::MAX) {
                if self.ids.contains(&id) && !tail.contains(&id) {
                    tail.push(id);
                }
            }
        }
        for &id in &self.ids {
            if !tail.contains(&id) {
                tail.push(id);
            }
        }
        tail
    }
}

/// Derives the lock set from the winning window.
#[derive(Debug, Clone, Copy, Default)]
pub struct LockSetCalculator;

impl LockSetCalculator {
    pub fn new() -> Self {
        Self
    }

    /// Applies the guard chain for a deck of `total` items.
    pub fn compute(&self, total: u32, window: &WinningWindow) -> LockSet {
        let n = i64::from(total);
        let run = i64::from(window.run_length);
        let s = i64::from(window.start);
        let e = s + run + 1;

        let mut ids = BTreeSet::new();
        let mut issues = Vec::new();

        let mut place = |slot: GuardSlot, value: i64| match in_deck(value, total) {
            Some(id) => {
                ids.insert(id);
            }
            None => issues.push(GuardIssue { slot, value }),
        };

        // Primary pair and its inner neighbours, each with a fixed fallback
        place(GuardSlot::Start, if s > 0 { s } else { e + 3 });
        place(GuardSlot::BeforeStart, if s - 1 > 0 { s - 1 } else { e + 2 });
        place(GuardSlot::End, if e <= n { e } else { s - 3 });
        place(GuardSlot::AfterEnd, if e + 1 <= n { e + 1 } else { s - 2 });

        // Far guards, one run-length outside the pair; no fallback
        let far_before = s - 1 - run;
        if far_before >= 1 {
            place(GuardSlot::FarBefore, far_before);
        }
        let far_after = e + 1 + run;
        if far_after <= n {
            place(GuardSlot::FarAfter, far_after);
        }

        let locks = LockSet {
            ids,
            anchor_start: s,
            anchor_end: e,
            issues,
        };
        tracing::debug!(start = s, end = e, locks = ?locks.ids, "lock set computed");
        locks
    }
}

fn in_deck(value: i64, total: u32) -> Option<ItemId> {
    if value >= 1 && value <= i64::from(total) {
        Some(value as ItemId)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn locks_for(total: u32, start: u32) -> LockSet {
        LockSetCalculator::new().compute(total, &WinningWindow::new(start, 16))
    }

    #[test]
    fn test_fifty_cards_start_ten() {
        let locks = locks_for(50, 10);

        assert_eq!(locks.ids().iter().copied().collect::<Vec<_>>(), vec![9, 10, 27, 28, 44]);
        assert_eq!(locks.guard_end(), 27);
        assert!(locks.check(50).is_ok());
        assert_eq!(locks.tail_priority(), vec![10, 27, 9, 28, 44]);
    }

    #[test]
    fn test_start_zero_uses_fallbacks() {
        // s = 0, e = 17: start -> e+3, before-start -> e+2
        let locks = locks_for(54, 0);
        assert_eq!(locks.ids().iter().copied().collect::<Vec<_>>(), vec![17, 18, 19, 20, 34]);
        assert!(locks.check(54).is_ok());
        assert_eq!(locks.tail_priority(), vec![17, 18, 19, 20, 34]);
    }

    #[test]
    fn test_start_one_before_start_falls_back() {
        // s - 1 = 0 is off the deck, replaced by e + 2 = 20
        let locks = locks_for(54, 1);
        assert_eq!(locks.ids().iter().copied().collect::<Vec<_>>(), vec![1, 18, 19, 20, 35]);
        assert_eq!(locks.tail_priority(), vec![1, 18, 19, 20, 35]);
    }

    #[test]
    fn test_end_falls_back_on_short_deck() {
        // N = 41, s = 24, e = 41: after-end 42 falls back to s - 2
        let locks = locks_for(41, 24);
        assert_eq!(locks.ids().iter().copied().collect::<Vec<_>>(), vec![7, 22, 23, 24, 41]);
        assert!(locks.check(41).is_ok());
        assert_eq!(locks.tail_priority(), vec![24, 41, 23, 22, 7]);
    }

    #[test]
    fn test_far_guards_both_sides() {
        let locks = locks_for(80, 24);
        assert!(locks.contains(24 - 17));
        assert!(locks.contains(41 + 17));
        assert_eq!(locks.len(), 6);
    }

    #[test]
    fn test_tiny_deck_is_degenerate() {
        // N = 10, s = 2, e = 19: end falls back to -1, after-end to 0
        let locks = locks_for(10, 2);
        assert_eq!(locks.issues().len(), 2);
        assert!(matches!(locks.check(10), Err(LoteriaError::DegenerateRound(_))));
        assert!(locks.ids().iter().all(|&id| (1..=10).contains(&id)));
    }

    #[test]
    fn test_short_deck_loses_fallback_guards() {
        // N = 18, s = 0, e = 17: start -> 20 (off), before-start -> 19 (off),
        // end 17, after-end 18
        let locks = locks_for(18, 0);
        assert_eq!(locks.ids().iter().copied().collect::<Vec<_>>(), vec![17, 18]);
        assert!(locks.check(18).is_err());
    }

    proptest! {
        #[test]
        fn prop_large_decks_stay_in_bounds(total in 41u32..400, start in 0u32..=24) {
            let locks = locks_for(total, start);
            prop_assert!(locks.check(total).is_ok());
            prop_assert!((MIN_LOCKS..=MAX_LOCKS).contains(&locks.len()));
            prop_assert!(locks.ids().iter().all(|&id| id >= 1 && id <= total));
        }

        #[test]
        fn prop_tail_priority_is_the_set(total in 1u32..200, start in 0u32..=24) {
            let locks = locks_for(total, start);
            let mut tail = locks.tail_priority();
            tail.sort_unstable();
            prop_assert_eq!(tail, locks.ids().iter().copied().collect::<Vec<_>>());
        }
    }
}
