//! Playback cursor - the step/animation state machine.
//!
//! The cursor is Sans-IO: it never sleeps. A step is split into three calls
//! that a driver spaces out in time:
//!
//! ```text
//!   Idle ──begin()──► Transitioning ──complete_step()──► (step applied)
//!    ▲                 image hidden                           │
//!    └──────────────────────reveal()──────────────────────────┘
//! ```
//!
//! Every [`Transition`] carries the round generation it was issued under.
//! Once the round is replaced the ticket is stale and both follow-up calls
//! ignore it.

use crate::item::ItemId;
use crate::sequence::PlaybackOrder;
use crate::winner::WinnerDetector;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Navigation direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Forward,
    Backward,
}

/// Cursor phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CursorPhase {
    /// Image visible, actions accepted
    Idle,
    /// Image hidden, one timer in flight
    Transitioning,
}

/// Ticket for one in-flight step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub generation: u64,
    pub direction: Direction,
}

/// Result of applying a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepOutcome {
    pub order_index: usize,
    pub item_id: ItemId,
    pub win: bool,
}

/// Position and viewed-set of one round.
#[derive(Debug, Clone)]
pub struct PlaybackCursor {
    generation: u64,
    order_index: usize,
    viewed: BTreeSet<ItemId>,
    is_navigating: bool,
    is_image_visible: bool,
}

impl PlaybackCursor {
    /// Starts at index 0 with the first navigable id already viewed.
    pub fn new(generation: u64, order: &PlaybackOrder) -> Self {
        let mut viewed = BTreeSet::new();
        if let Some(&first) = order.navigable().first() {
            viewed.insert(first);
        }
        Self {
            generation,
            order_index: 0,
            viewed,
            is_navigating: false,
            is_image_visible: true,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn order_index(&self) -> usize {
        self.order_index
    }

    pub fn viewed(&self) -> &BTreeSet<ItemId> {
        &self.viewed
    }

    pub fn is_navigating(&self) -> bool {
        self.is_navigating
    }

    pub fn is_image_visible(&self) -> bool {
        self.is_image_visible
    }

    pub fn phase(&self) -> CursorPhase {
        if self.is_navigating {
            CursorPhase::Transitioning
        } else {
            CursorPhase::Idle
        }
    }

    /// Whether a step in `direction` would move within `reachable` slots.
    pub fn can_step(&self, direction: Direction, reachable: usize) -> bool {
        match direction {
            Direction::Forward => self.order_index + 1 < reachable,
            Direction::Backward => self.order_index > 0,
        }
    }

    /// Starts a step if the cursor is idle and not at the boundary.
    ///
    /// On `None` nothing changed and no timer should be started.
    pub fn begin(&mut self, direction: Direction, reachable: usize) -> Option<Transition> {
        if self.is_navigating || !self.can_step(direction, reachable) {
            return None;
        }
        self.is_navigating = true;
        self.is_image_visible = false;
        Some(Transition {
            generation: self.generation,
            direction,
        })
    }

    /// Moves the index, records the new id and evaluates the win predicate.
    pub fn complete_step(
        &mut self,
        ticket: Transition,
        order: &PlaybackOrder,
        detector: &WinnerDetector,
    ) -> Option<StepOutcome> {
        if ticket.generation != self.generation || !self.is_navigating {
            return None;
        }
        let next = match ticket.direction {
            Direction::Forward => self.order_index + 1,
            Direction::Backward => self.order_index.checked_sub(1)?,
        };
        let item_id = order.get(next)?;

        self.order_index = next;
        self.viewed.insert(item_id);

        Some(StepOutcome {
            order_index: next,
            item_id,
            win: detector.is_winner(&self.viewed),
        })
    }

    /// Moves to the next generation, orphaning any in-flight ticket.
    ///
    /// Position and viewed set are kept; the cursor settles back to idle.
    pub fn retire(&mut self) {
        self.generation += 1;
        self.is_navigating = false;
        self.is_image_visible = true;
    }

    /// Shows the image and returns to idle.
    pub fn reveal(&mut self, ticket: Transition) -> bool {
        if ticket.generation != self.generation || !self.is_navigating {
            return false;
        }
        self.is_navigating = false;
        self.is_image_visible = true;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RoundRules;
    use crate::lockset::LockSetCalculator;
    use crate::sequence::SequenceBuilder;
    use crate::window::WinningWindow;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn fixture() -> (PlaybackOrder, WinnerDetector) {
        let window = WinningWindow::new(10, 16);
        let locks = LockSetCalculator::new().compute(50, &window);
        let order = SequenceBuilder::new().build(&mut ChaCha8Rng::seed_from_u64(11), 50, &window, &locks);
        let detector = WinnerDetector::new(1..=50, &window, &locks, RoundRules::default());
        (order, detector)
    }

    #[test]
    fn test_new_cursor_views_first_item() {
        let (order, _) = fixture();
        let cursor = PlaybackCursor::new(1, &order);
        assert_eq!(cursor.order_index(), 0);
        assert_eq!(cursor.viewed().len(), 1);
        assert!(cursor.viewed().contains(&order.ids()[0]));
        assert_eq!(cursor.phase(), CursorPhase::Idle);
        assert!(cursor.is_image_visible());
    }

    #[test]
    fn test_full_forward_step() {
        let (order, detector) = fixture();
        let mut cursor = PlaybackCursor::new(1, &order);

        let ticket = cursor.begin(Direction::Forward, order.navigable_len()).unwrap();
        assert_eq!(cursor.phase(), CursorPhase::Transitioning);
        assert!(!cursor.is_image_visible());

        let outcome = cursor.complete_step(ticket, &order, &detector).unwrap();
        assert_eq!(outcome.order_index, 1);
        assert_eq!(outcome.item_id, order.ids()[1]);
        assert!(!outcome.win);
        assert_eq!(cursor.viewed().len(), 2);
        // Still hidden until the reveal timer fires
        assert!(!cursor.is_image_visible());

        assert!(cursor.reveal(ticket));
        assert_eq!(cursor.phase(), CursorPhase::Idle);
        assert!(cursor.is_image_visible());
    }

    #[test]
    fn test_begin_while_navigating_is_noop() {
        let (order, _) = fixture();
        let mut cursor = PlaybackCursor::new(1, &order);
        assert!(cursor.begin(Direction::Forward, order.navigable_len()).is_some());
        assert!(cursor.begin(Direction::Forward, order.navigable_len()).is_none());
        assert!(cursor.begin(Direction::Backward, order.navigable_len()).is_none());
    }

    #[test]
    fn test_retreat_at_start_is_noop() {
        let (order, _) = fixture();
        let mut cursor = PlaybackCursor::new(1, &order);
        assert!(cursor.begin(Direction::Backward, order.navigable_len()).is_none());
        assert_eq!(cursor.phase(), CursorPhase::Idle);
        assert!(cursor.is_image_visible());
    }

    #[test]
    fn test_advance_at_end_is_noop() {
        let (order, detector) = fixture();
        let reachable = order.navigable_len();
        let mut cursor = PlaybackCursor::new(1, &order);
        for _ in 1..reachable {
            let t = cursor.begin(Direction::Forward, reachable).unwrap();
            cursor.complete_step(t, &order, &detector).unwrap();
            cursor.reveal(t);
        }
        assert_eq!(cursor.order_index(), reachable - 1);

        let before = cursor.viewed().clone();
        assert!(cursor.begin(Direction::Forward, reachable).is_none());
        assert_eq!(cursor.order_index(), reachable - 1);
        assert_eq!(cursor.viewed(), &before);
        assert!(cursor.is_image_visible());
    }

    #[test]
    fn test_retreat_keeps_viewed() {
        let (order, detector) = fixture();
        let reachable = order.navigable_len();
        let mut cursor = PlaybackCursor::new(1, &order);

        let t = cursor.begin(Direction::Forward, reachable).unwrap();
        cursor.complete_step(t, &order, &detector);
        cursor.reveal(t);

        let t = cursor.begin(Direction::Backward, reachable).unwrap();
        let outcome = cursor.complete_step(t, &order, &detector).unwrap();
        cursor.reveal(t);

        assert_eq!(outcome.order_index, 0);
        assert_eq!(cursor.viewed().len(), 2);
    }

    #[test]
    fn test_stale_ticket_ignored() {
        let (order, detector) = fixture();
        let mut old = PlaybackCursor::new(1, &order);
        let ticket = old.begin(Direction::Forward, order.navigable_len()).unwrap();

        // Round replaced before the timer fired
        let mut cursor = PlaybackCursor::new(2, &order);
        assert!(cursor.complete_step(ticket, &order, &detector).is_none());
        assert!(!cursor.reveal(ticket));
        assert_eq!(cursor.order_index(), 0);
        assert_eq!(cursor.viewed().len(), 1);
    }

    #[test]
    fn test_retire_orphans_ticket() {
        let (order, detector) = fixture();
        let mut cursor = PlaybackCursor::new(1, &order);
        let ticket = cursor.begin(Direction::Forward, order.navigable_len()).unwrap();

        cursor.retire();
        assert_eq!(cursor.generation(), 2);
        assert_eq!(cursor.phase(), CursorPhase::Idle);
        assert!(cursor.complete_step(ticket, &order, &detector).is_none());
        assert_eq!(cursor.order_index(), 0);
    }

    #[test]
    fn test_reveal_without_transition_ignored() {
        let (order, _) = fixture();
        let mut cursor = PlaybackCursor::new(3, &order);
        let ticket = Transition {
            generation: 3,
            direction: Direction::Forward,
        };
        assert!(!cursor.reveal(ticket));
    }
}
