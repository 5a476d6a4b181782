//! Win predicate.

use crate::config::RoundRules;
use crate::item::ItemId;
use crate::lockset::LockSet;
use crate::window::WinningWindow;
use std::collections::BTreeSet;

/// Decides whether a viewed set completes the round.
///
/// A win needs every winning id viewed and, under
/// `require_full_complement`, every id that is neither winning nor locked.
/// The required set is fixed per round, so evaluation is a pure subset test.
#[derive(Debug, Clone)]
pub struct WinnerDetector {
    required: BTreeSet<ItemId>,
    run_length: usize,
}

impl WinnerDetector {
    pub fn new(
        universe: impl IntoIterator<Item = ItemId>,
        window: &WinningWindow,
        locks: &LockSet,
        rules: RoundRules,
    ) -> Self {
        let mut required: BTreeSet<ItemId> = window.ids().collect();
        if rules.require_full_complement {
            required.extend(
                universe
                    .into_iter()
                    .filter(|&id| !window.contains(id) && !locks.contains(id)),
            );
        }

        Self {
            required,
            run_length: window.run_length as usize,
        }
    }

    /// Ids that must all be viewed for a win.
    pub fn required(&self) -> &BTreeSet<ItemId> {
        &self.required
    }

    pub fn is_winner(&self, viewed: &BTreeSet<ItemId>) -> bool {
        if viewed.len() < self.run_length {
            return false;
        }
        self.required.is_subset(viewed)
    }

    /// Required ids not yet viewed.
    pub fn missing<'a>(&'a self, viewed: &'a BTreeSet<ItemId>) -> impl Iterator<Item = ItemId> + 'a {
        self.required.difference(viewed).copied()
    }
}
