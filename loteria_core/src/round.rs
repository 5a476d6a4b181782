//! Round setup and the single owned state of a round in play.
//!
//! # Pipeline
//!
//! ```text
//! WindowSelector ──► LockSetCalculator ──► SequenceBuilder ──► PlaybackCursor
//!                                 └────► WinnerDetector ◄────────┘ (every step)
//! ```
//!
//! `RoundPlanner` runs the left half once per round; `RoundState` owns the
//! result together with the cursor. A restart swaps the whole value, so the
//! window, locks and order are always replaced together.

use crate::config::{GameConfig, RoundRules};
use crate::cursor::{Direction, PlaybackCursor, StepOutcome, Transition};
use crate::item::ItemId;
use crate::lockset::{LockSet, LockSetCalculator};
use crate::sequence::{PlaybackOrder, SequenceBuilder};
use crate::view::RoundView;
use crate::window::{WindowSelector, WinningWindow};
use crate::winner::WinnerDetector;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Output of round setup.
#[derive(Debug, Clone)]
pub struct RoundPlan {
    pub window: WinningWindow,
    pub locks: LockSet,
    pub order: PlaybackOrder,
}

/// Setup problems that do not stop the round.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundHealth {
    /// Guard arithmetic left the deck; carries the reason.
    pub degenerate: Option<String>,

    /// Some id the win needs lies outside the cursor's reach, so the round
    /// can never be won; restarting is the only way on.
    pub unwinnable: bool,
}

impl RoundHealth {
    pub fn is_healthy(&self) -> bool {
        self.degenerate.is_none() && !self.unwinnable
    }
}

/// Runs the setup pipeline for a deck of fixed size.
#[derive(Debug, Clone)]
pub struct RoundPlanner {
    total: u32,
    selector: WindowSelector,
    calculator: LockSetCalculator,
    builder: SequenceBuilder,
}

impl RoundPlanner {
    pub fn new(config: &GameConfig, total: u32) -> Self {
        Self {
            total,
            selector: WindowSelector::from_config(config),
            calculator: LockSetCalculator::new(),
            builder: SequenceBuilder::new(),
        }
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    /// Draws a window and builds locks and order around it.
    pub fn plan<R: Rng + ?Sized>(&self, rng: &mut R) -> RoundPlan {
        let window = self.selector.select(rng, self.total);
        self.plan_with_window(rng, window)
    }

    /// Builds locks and order around a given window.
    pub fn plan_with_window<R: Rng + ?Sized>(&self, rng: &mut R, window: WinningWindow) -> RoundPlan {
        let locks = self.calculator.compute(self.total, &window);
        let order = self.builder.build(rng, self.total, &window, &locks);
        RoundPlan { window, locks, order }
    }
}

/// One round in play.
#[derive(Debug, Clone)]
pub struct RoundState {
    total: u32,
    rules: RoundRules,
    window: WinningWindow,
    locks: LockSet,
    order: PlaybackOrder,
    detector: WinnerDetector,
    cursor: PlaybackCursor,
    health: RoundHealth,
    steps: u64,
    won_at_step: Option<u64>,
}

impl RoundState {
    pub fn new(generation: u64, plan: RoundPlan, rules: RoundRules, total: u32) -> Self {
        let RoundPlan { window, locks, order } = plan;

        let detector = WinnerDetector::new(1..=total, &window, &locks, rules);
        let reachable = reachable_len(rules, &order);
        let reachable_ids: BTreeSet<ItemId> = order.ids()[..reachable].iter().copied().collect();

        let health = RoundHealth {
            degenerate: locks.check(total).err().map(|e| e.to_string()),
            // Covers an empty unlocked window too: its ids then all sit in the tail
            unwinnable: !detector.required().is_subset(&reachable_ids),
        };
        if let Some(reason) = &health.degenerate {
            tracing::warn!(generation, total, %reason, "degenerate round");
        }
        let cursor = PlaybackCursor::new(generation, &order);

        tracing::info!(
            generation,
            start = window.start,
            locks = ?locks.ids(),
            navigable = order.navigable_len(),
            out_of_reach = detector.missing(&reachable_ids).count(),
            "round ready"
        );

        let mut state = Self {
            total,
            rules,
            window,
            locks,
            order,
            detector,
            cursor,
            health,
            steps: 0,
            won_at_step: None,
        };
        // The seeded first item counts as a viewed-set change
        state.record_win_if_any();
        state
    }

    /// Replaces the round wholesale with a freshly planned one.
    pub fn restart(&mut self, plan: RoundPlan) {
        let generation = self.generation() + 1;
        *self = Self::new(generation, plan, self.rules, self.total);
    }

    /// Invalidates every outstanding ticket without touching the round.
    pub fn retire(&mut self) {
        self.cursor.retire();
    }

    pub fn generation(&self) -> u64 {
        self.cursor.generation()
    }

    /// Deck size the round was planned for.
    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn window(&self) -> &WinningWindow {
        &self.window
    }

    pub fn locks(&self) -> &LockSet {
        &self.locks
    }

    pub fn order(&self) -> &PlaybackOrder {
        &self.order
    }

    pub fn cursor(&self) -> &PlaybackCursor {
        &self.cursor
    }

    pub fn detector(&self) -> &WinnerDetector {
        &self.detector
    }

    pub fn health(&self) -> &RoundHealth {
        &self.health
    }

    pub fn rules(&self) -> RoundRules {
        self.rules
    }

    /// Steps applied this round.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn has_won(&self) -> bool {
        self.won_at_step.is_some()
    }

    pub fn won_at_step(&self) -> Option<u64> {
        self.won_at_step
    }

    /// Slots the cursor may visit: the prefix, or everything under `unlock_tail`.
    pub fn reachable_len(&self) -> usize {
        reachable_len(self.rules, &self.order)
    }

    pub fn current_item(&self) -> Option<ItemId> {
        if self.cursor.viewed().is_empty() {
            return None;
        }
        self.order.get(self.cursor.order_index())
    }

    pub fn can_step(&self, direction: Direction) -> bool {
        !self.cursor.is_navigating() && self.cursor.can_step(direction, self.reachable_len())
    }

    pub fn begin(&mut self, direction: Direction) -> Option<Transition> {
        let reachable = self.reachable_len();
        self.cursor.begin(direction, reachable)
    }

    pub fn complete_step(&mut self, ticket: Transition) -> Option<StepOutcome> {
        let outcome = self.cursor.complete_step(ticket, &self.order, &self.detector)?;
        self.steps += 1;
        tracing::debug!(
            generation = ticket.generation,
            direction = ?ticket.direction,
            index = outcome.order_index,
            item = outcome.item_id,
            viewed = self.cursor.viewed().len(),
            "step applied"
        );
        if outcome.win {
            self.record_win_if_any();
        }
        Some(outcome)
    }

    pub fn reveal(&mut self, ticket: Transition) -> bool {
        self.cursor.reveal(ticket)
    }

    pub fn view(&self) -> RoundView {
        RoundView {
            generation: self.generation(),
            winning_start: self.window.start,
            run_length: self.window.run_length,
            locked_ids: self.locks.ids().clone(),
            order: self.order.ids().to_vec(),
            navigable_len: self.order.navigable_len(),
            order_index: self.cursor.order_index(),
            current_item: self.current_item(),
            viewed_ids: self.cursor.viewed().clone(),
            phase: self.cursor.phase(),
            is_navigating: self.cursor.is_navigating(),
            is_image_visible: self.cursor.is_image_visible(),
            win: self.detector.is_winner(self.cursor.viewed()),
            unwinnable: self.health.unwinnable,
            degenerate: self.health.degenerate.clone(),
        }
    }

    fn record_win_if_any(&mut self) {
        if self.won_at_step.is_none() && self.detector.is_winner(self.cursor.viewed()) {
            self.won_at_step = Some(self.steps);
            tracing::info!(
                generation = self.generation(),
                start = self.window.start,
                step = self.steps,
                "winner, sequence starting from card #{}",
                self.window.start
            );
        }
    }
}

fn reachable_len(rules: RoundRules, order: &PlaybackOrder) -> usize {
    if rules.unlock_tail {
        order.len()
    } else {
        order.navigable_len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::CursorPhase;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::BTreeSet;

    fn state_for(seed: u64, total: u32, start: u32, rules: RoundRules) -> RoundState {
        let planner = RoundPlanner::new(&GameConfig::default(), total);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let plan = planner.plan_with_window(&mut rng, WinningWindow::new(start, 16));
        RoundState::new(1, plan, rules, total)
    }

    fn step(state: &mut RoundState, direction: Direction) -> Option<StepOutcome> {
        let ticket = state.begin(direction)?;
        let outcome = state.complete_step(ticket);
        state.reveal(ticket);
        outcome
    }

    #[test]
    fn test_planner_draws_in_range() {
        let planner = RoundPlanner::new(&GameConfig::default(), 54);
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        for _ in 0..100 {
            let plan = planner.plan(&mut rng);
            assert!(plan.window.start <= 24);
            assert_eq!(plan.order.len(), 54);
        }
    }

    #[test]
    fn test_fifty_cards_start_ten_round() {
        let state = state_for(4, 50, 10, RoundRules::default());
        assert!(state.health().degenerate.is_none());
        // Id 10 sits in the locked tail
        assert!(state.health().unwinnable);
        assert!(!state.health().is_healthy());
        assert_eq!(state.generation(), 1);
        assert_eq!(state.reachable_len(), 45);
        assert_eq!(state.order().locked_tail(), &[10, 27, 9, 28, 44]);

        let view = state.view();
        assert_eq!(view.order_index, 0);
        assert_eq!(view.viewed_ids.len(), 1);
        assert_eq!(view.current_item, Some(state.order().ids()[0]));
        assert_eq!(view.phase, CursorPhase::Idle);
        assert!(!view.win);
    }

    #[test]
    fn test_locked_tail_unreachable_by_default() {
        let mut state = state_for(8, 54, 12, RoundRules::default());
        while step(&mut state, Direction::Forward).is_some() {}

        assert_eq!(state.cursor().order_index(), state.order().navigable_len() - 1);
        assert!(state.order().locked_tail().iter().all(|id| !state.cursor().viewed().contains(id)));
        // The locked window start can never be seen
        assert!(!state.has_won());
        assert_eq!(state.steps(), state.order().navigable_len() as u64 - 1);
    }

    #[test]
    fn test_unlocked_tail_wins_on_first_tail_item() {
        let rules = RoundRules {
            unlock_tail: true,
            ..RoundRules::default()
        };
        let mut state = state_for(8, 54, 12, rules);
        let prefix = state.order().navigable_len();

        let mut win_index = None;
        while let Some(outcome) = step(&mut state, Direction::Forward) {
            if outcome.win && win_index.is_none() {
                win_index = Some(outcome.order_index);
            }
        }

        assert_eq!(win_index, Some(prefix));
        assert_eq!(state.won_at_step(), Some(prefix as u64));
        assert_eq!(state.cursor().order_index(), state.order().len() - 1);
    }

    #[test]
    fn test_viewed_only_grows_both_directions() {
        let mut state = state_for(21, 54, 5, RoundRules::default());
        let mut previous: BTreeSet<ItemId> = state.cursor().viewed().clone();

        for direction in [
            Direction::Forward,
            Direction::Forward,
            Direction::Backward,
            Direction::Forward,
            Direction::Forward,
            Direction::Backward,
            Direction::Backward,
        ] {
            step(&mut state, direction);
            assert!(previous.is_subset(state.cursor().viewed()));
            previous = state.cursor().viewed().clone();
        }
        // Indices 0..=3 were visited
        assert_eq!(state.cursor().viewed().len(), 4);
    }

    #[test]
    fn test_restart_replaces_round() {
        let mut state = state_for(2, 54, 3, RoundRules::default());
        step(&mut state, Direction::Forward);
        step(&mut state, Direction::Forward);
        let old_order = state.order().clone();

        let planner = RoundPlanner::new(&GameConfig::default(), 54);
        let plan = planner.plan(&mut ChaCha8Rng::seed_from_u64(77));
        state.restart(plan);

        assert_eq!(state.generation(), 2);
        assert_eq!(state.cursor().order_index(), 0);
        assert_eq!(state.steps(), 0);
        assert_eq!(
            state.cursor().viewed().iter().copied().collect::<Vec<_>>(),
            vec![state.order().ids()[0]]
        );
        assert_ne!(state.order(), &old_order);
        assert!(state.cursor().is_image_visible());
    }

    #[test]
    fn test_ticket_from_before_restart_is_stale() {
        let mut state = state_for(2, 54, 3, RoundRules::default());
        let ticket = state.begin(Direction::Forward).unwrap();

        let planner = RoundPlanner::new(&GameConfig::default(), 54);
        state.restart(planner.plan(&mut ChaCha8Rng::seed_from_u64(1)));

        assert!(state.complete_step(ticket).is_none());
        assert!(!state.reveal(ticket));
        assert_eq!(state.cursor().viewed().len(), 1);
    }

    #[test]
    fn test_retire_invalidates_tickets() {
        let mut state = state_for(2, 54, 3, RoundRules::default());
        let ticket = state.begin(Direction::Forward).unwrap();
        state.retire();

        assert_eq!(state.generation(), 2);
        assert!(state.complete_step(ticket).is_none());
        assert_eq!(state.cursor().order_index(), 0);
    }

    #[test]
    fn test_unwinnable_when_required_id_out_of_reach() {
        for seed in 0..8 {
            let state = state_for(seed, 50, 10, RoundRules::default());
            let reachable: BTreeSet<ItemId> = state.order().navigable().iter().copied().collect();
            assert!(!state.detector().required().is_subset(&reachable));
            assert!(state.health().unwinnable);
            assert!(state.view().unwinnable);
        }
    }

    #[test]
    fn test_unlocked_tail_round_is_winnable() {
        let rules = RoundRules {
            unlock_tail: true,
            ..RoundRules::default()
        };
        let state = state_for(4, 50, 10, rules);
        assert!(!state.health().unwinnable);
        assert!(state.health().is_healthy());
    }

    #[test]
    fn test_start_zero_is_unwinnable_even_unlocked() {
        // Id 0 is never dealt, so the window can never be completed
        let rules = RoundRules {
            unlock_tail: true,
            ..RoundRules::default()
        };
        let state = state_for(3, 54, 0, rules);
        assert!(state.health().unwinnable);
    }

    #[test]
    fn test_degenerate_round_is_reported() {
        // N = 10 pushes the end guards' fallbacks below 1
        let state = state_for(0, 10, 2, RoundRules::default());
        assert!(state.health().degenerate.is_some());
        assert!(state.view().degenerate.is_some());
    }

    #[test]
    fn test_view_serializes() {
        let state = state_for(6, 50, 10, RoundRules::default());
        let json = serde_json::to_value(state.view()).unwrap();
        assert_eq!(json["winning_start"], 10);
        assert_eq!(json["phase"], "idle");
        assert!(json.get("degenerate").is_none());
    }
}
