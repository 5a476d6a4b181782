//! Loteria Core - reveal-game engine for a loteria card deck
//!
//! A round walks the player through a shuffled deck one card at a time.
//! The engine is responsible for:
//! 1. **Setup**: picking the winning window, the guard locks around it and
//!    the reveal order that spreads winning cards evenly
//! 2. **Playback**: a timed step/reveal state machine where stale timers of
//!    a replaced round can never touch the new one
//! 3. **Detection**: deciding when the viewed cards complete the round
//!
//! Everything except [`RoundController`] is Sans-IO and fully deterministic
//! given an RNG, so the same code runs under Tokio and under simulation.

pub mod config;
pub mod controller;
pub mod cursor;
pub mod error;
pub mod item;
pub mod lockset;
pub mod round;
pub mod sequence;
pub mod view;
pub mod window;
pub mod winner;

// Re-export key types for convenience
pub use config::{GameConfig, RoundRules};
pub use controller::RoundController;
pub use cursor::{CursorPhase, Direction, PlaybackCursor, StepOutcome, Transition};
pub use error::{LoteriaError, Result};
pub use item::{Item, ItemId, Roster};
pub use lockset::{GuardIssue, GuardSlot, LockSet, LockSetCalculator};
pub use round::{RoundHealth, RoundPlan, RoundPlanner, RoundState};
pub use sequence::{PlaybackOrder, SequenceBuilder};
pub use view::RoundView;
pub use window::{WindowSelector, WinningWindow};
pub use winner::WinnerDetector;
