//! Round Controller - drives a round against an environment context.
//!
//! This is the integration layer between the Sans-IO round engine
//! (`RoundState` + `PlaybackCursor`) and the environment abstraction
//! (`LoteriaContext`).
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     RoundController                         │
//! │  ┌──────────────────────────────────────────────────────┐   │
//! │  │              Context: LoteriaContext                  │   │
//! │  │  • sleep() → swap delay, reveal delay                │   │
//! │  │  • spawn() → one task per step                       │   │
//! │  │  • derive_rng() → per-round randomness               │   │
//! │  └──────────────────────────────────────────────────────┘   │
//! │                              │                               │
//! │  ┌───────────────────────────────────────┐  ┌────────────┐  │
//! │  │ Arc<Mutex<RoundState>> (one per game) │─►│ watch view │  │
//! │  └───────────────────────────────────────┘  └────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use loteria_core::{GameConfig, Roster, RoundController};
//! use loteria_env::TokioContext;
//!
//! let roster = Roster::from_json_str(&fetched)?;
//! let controller = RoundController::new(TokioContext::shared(), roster, GameConfig::default())?;
//! let mut views = controller.subscribe();
//!
//! controller.advance()?;
//! views.changed().await?;
//! ```

use crate::config::GameConfig;
use crate::cursor::Direction;
use crate::error::Result;
use crate::item::{Item, Roster};
use crate::round::{RoundPlanner, RoundState};
use crate::view::RoundView;
use loteria_env::{LoteriaContext, SessionId};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

/// Owns one session's round and schedules its timers.
pub struct RoundController<Ctx>
where
    Ctx: LoteriaContext,
{
    /// Session identifier (for logging)
    session: SessionId,

    /// Environment context
    context: Arc<Ctx>,

    /// Configuration
    config: GameConfig,

    /// The deck
    roster: Roster,

    /// Setup pipeline for this deck size
    planner: RoundPlanner,

    /// The round, shared with in-flight timer tasks
    state: Arc<Mutex<RoundState>>,

    /// Live snapshot for presentation layers
    views: Arc<watch::Sender<RoundView>>,
}

impl<Ctx> RoundController<Ctx>
where
    Ctx: LoteriaContext,
{
    /// Validates the config and sets up the first round.
    pub fn new(context: Arc<Ctx>, roster: Roster, config: GameConfig) -> Result<Self> {
        config.validate()?;

        // Seeded contexts replay the same session id
        let session = match context.seed() {
            0 => SessionId::new(),
            seed => SessionId::from_seed(seed),
        };
        let planner = RoundPlanner::new(&config, roster.len());
        let generation = 1;
        let plan = planner.plan(&mut context.derive_rng(generation));
        let state = RoundState::new(generation, plan, config.rules, roster.len());

        tracing::info!(%session, items = roster.len(), seed = context.seed(), "session started");

        let (views, _) = watch::channel(state.view());

        Ok(Self {
            session,
            context,
            config,
            roster,
            planner,
            state: Arc::new(Mutex::new(state)),
            views: Arc::new(views),
        })
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Receives a new view after every state change.
    pub fn subscribe(&self) -> watch::Receiver<RoundView> {
        self.views.subscribe()
    }

    /// Current snapshot.
    pub fn view(&self) -> RoundView {
        lock_state(&self.state).view()
    }

    /// The item under the cursor.
    pub fn current_item(&self) -> Option<&Item> {
        let id = lock_state(&self.state).current_item()?;
        self.roster.get(id)
    }

    /// Steps forward. Returns `false` when busy or already at the end.
    pub fn advance(&self) -> Result<bool> {
        self.step(Direction::Forward)
    }

    /// Steps back. Returns `false` when busy or already at the start.
    pub fn retreat(&self) -> Result<bool> {
        self.step(Direction::Backward)
    }

    /// Plans a brand-new round. Timers of the old round become no-ops.
    pub fn restart(&self) -> RoundView {
        let mut state = lock_state(&self.state);
        let mut rng = self.context.derive_rng(state.generation() + 1);
        state.restart(self.planner.plan(&mut rng));
        let view = state.view();
        self.views.send_replace(view.clone());
        view
    }

    /// Orphans every pending timer. Called on drop.
    pub fn end_session(&self) {
        let mut state = lock_state(&self.state);
        state.retire();
        self.views.send_replace(state.view());
        tracing::info!(session = %self.session, generation = state.generation(), "session ended");
    }

    fn step(&self, direction: Direction) -> Result<bool> {
        let ticket = {
            let mut state = lock_state(&self.state);
            match state.begin(direction) {
                Some(ticket) => {
                    self.views.send_replace(state.view());
                    ticket
                }
                None => return Ok(false),
            }
        };

        let context = Arc::clone(&self.context);
        let state = Arc::clone(&self.state);
        let views = Arc::clone(&self.views);
        let swap_delay = self.config.swap_delay();
        let reveal_delay = self.config.reveal_delay();
        let session = self.session;

        let spawned = self.context.spawn("loteria-step", async move {
            context.sleep(swap_delay).await;
            {
                let mut guard = lock_state(&state);
                let Some(outcome) = guard.complete_step(ticket) else {
                    tracing::debug!(%session, generation = ticket.generation, "stale swap timer ignored");
                    return;
                };
                if outcome.win {
                    tracing::debug!(%session, item = outcome.item_id, "win condition holds");
                }
                views.send_replace(guard.view());
            }

            context.sleep(reveal_delay).await;
            let mut guard = lock_state(&state);
            if guard.reveal(ticket) {
                views.send_replace(guard.view());
            } else {
                tracing::debug!(%session, generation = ticket.generation, "stale reveal timer ignored");
            }
        });

        if let Err(e) = spawned {
            // Nothing will ever fire for this ticket
            let mut state = lock_state(&self.state);
            state.reveal(ticket);
            self.views.send_replace(state.view());
            return Err(e.into());
        }
        Ok(true)
    }
}

impl<Ctx> Drop for RoundController<Ctx>
where
    Ctx: LoteriaContext,
{
    fn drop(&mut self) {
        self.end_session();
    }
}

fn lock_state(state: &Mutex<RoundState>) -> MutexGuard<'_, RoundState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
