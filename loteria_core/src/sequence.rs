//! The "ORDER" stage - the reveal permutation for one round.
//!
//! Winning ids (category A) are spread evenly through the other ids
//! (category B) so the run cannot be spotted by position, and the final
//! navigable slot always holds a winning id. Locked ids follow as a tail.

use crate::item::ItemId;
use crate::lockset::LockSet;
use crate::window::WinningWindow;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// The full reveal sequence of a round. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackOrder {
    ids: Vec<ItemId>,
    navigable_len: usize,
    unwinnable: bool,
}

impl PlaybackOrder {
    /// Every id, prefix then tail.
    pub fn ids(&self) -> &[ItemId] {
        &self.ids
    }

    /// The ids the cursor walks through during normal play.
    pub fn navigable(&self) -> &[ItemId] {
        &self.ids[..self.navigable_len]
    }

    /// Lock ids in guard priority order.
    pub fn locked_tail(&self) -> &[ItemId] {
        &self.ids[self.navigable_len..]
    }

    pub fn navigable_len(&self) -> usize {
        self.navigable_len
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<ItemId> {
        self.ids.get(index).copied()
    }

    /// Slot of `id` in the order, if it was dealt.
    pub fn position_of(&self, id: ItemId) -> Option<usize> {
        self.ids.iter().position(|&x| x == id)
    }

    /// No unlocked winning id made it into the prefix.
    pub fn is_unwinnable(&self) -> bool {
        self.unwinnable
    }
}

/// Builds the reveal permutation.
#[derive(Debug, Clone, Copy, Default)]
pub struct SequenceBuilder;

impl SequenceBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Builds a fresh order for `total` items. Every call shuffles anew.
    pub fn build<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        total: u32,
        window: &WinningWindow,
        locks: &LockSet,
    ) -> PlaybackOrder {
        let (mut winning, mut others): (Vec<ItemId>, Vec<ItemId>) = (1..=total)
            .filter(|&id| !locks.contains(id))
            .partition(|&id| window.contains(id));

        winning.shuffle(rng);
        others.shuffle(rng);

        let mut ids = Vec::with_capacity(total as usize);
        let unwinnable = winning.is_empty();

        if unwinnable {
            tracing::debug!(start = window.start, total, "no unlocked winning ids, round cannot be won");
            ids.extend_from_slice(&others);
        } else {
            let interval = others.len() / winning.len();
            let mut rest = others.iter().copied();

            for &id in &winning {
                ids.extend(rest.by_ref().take(interval));
                ids.push(id);
            }
            ids.extend(rest);

            // Last navigable slot must hold a winning id
            let last_winning = winning[winning.len() - 1];
            let end = ids.len() - 1;
            if !window.contains(ids[end]) {
                if let Some(pos) = ids.iter().rposition(|&id| id == last_winning) {
                    ids.swap(pos, end);
                }
            }
        }

        let navigable_len = ids.len();
        ids.extend(locks.tail_priority());

        PlaybackOrder {
            ids,
            navigable_len,
            unwinnable,
        }
    }
}
