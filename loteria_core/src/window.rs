//! Winning window selection.

use crate::config::GameConfig;
use crate::item::ItemId;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// The run of consecutive ids that wins the round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinningWindow {
    /// First id of the run. May be 0, in which case the run starts below
    /// the deck and can never be completed.
    pub start: ItemId,

    /// Number of ids in the run
    pub run_length: u32,
}

impl WinningWindow {
    pub fn new(start: ItemId, run_length: u32) -> Self {
        Self { start, run_length }
    }

    /// `start..start + run_length`, clipped at `ItemId::MAX`.
    pub fn ids(&self) -> Range<ItemId> {
        self.start..self.start.saturating_add(self.run_length)
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.ids().contains(&id)
    }

    /// Last id of the run.
    pub fn last(&self) -> ItemId {
        self.start.saturating_add(self.run_length).saturating_sub(1)
    }
}

/// Draws the winning start uniformly from `[0, max_start]`.
#[derive(Debug, Clone, Copy)]
pub struct WindowSelector {
    max_start: u32,
    run_length: u32,
}

impl WindowSelector {
    pub fn new(max_start: u32, run_length: u32) -> Self {
        Self { max_start, run_length }
    }

    pub fn from_config(config: &GameConfig) -> Self {
        Self::new(config.max_window_start, config.run_length)
    }

    /// One-shot draw for a round over `total` items.
    pub fn select<R: Rng + ?Sized>(&self, rng: &mut R, total: u32) -> WinningWindow {
        let start = rng.gen_range(0..=self.max_start);
        tracing::debug!(start, total, "winning window drawn");
        WinningWindow::new(start, self.run_length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_window_ids() {
        let window = WinningWindow::new(10, 16);
        assert_eq!(window.ids().collect::<Vec<_>>(), (10..=25).collect::<Vec<_>>());
        assert_eq!(window.last(), 25);
        assert!(window.contains(10));
        assert!(window.contains(25));
        assert!(!window.contains(26));
        assert!(!window.contains(9));
    }

    #[test]
    fn test_window_near_id_max_does_not_overflow() {
        let window = WinningWindow::new(u32::MAX - 2, 16);
        assert_eq!(window.ids().count(), 2);
        assert_eq!(window.last(), u32::MAX - 1);
        assert!(window.contains(u32::MAX - 1));
        assert!(!window.contains(u32::MAX));
    }

    #[test]
    fn test_selector_stays_in_range_and_covers_it() {
        let selector = WindowSelector::from_config(&GameConfig::default());
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut seen = [false; 25];

        for _ in 0..2000 {
            let window = selector.select(&mut rng, 54);
            assert!(window.start <= 24);
            assert_eq!(window.run_length, 16);
            seen[window.start as usize] = true;
        }

        assert!(seen.iter().all(|&s| s), "every start in 0..=24 should be drawn");
    }

    #[test]
    fn test_selector_deterministic_for_seed() {
        let selector = WindowSelector::new(24, 16);
        let a = selector.select(&mut ChaCha8Rng::seed_from_u64(9), 54);
        let b = selector.select(&mut ChaCha8Rng::seed_from_u64(9), 54);
        assert_eq!(a, b);
    }
}
