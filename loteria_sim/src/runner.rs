//! Scenario runner - executes playback scenarios against the round engine.
//!
//! The runner drives the Sans-IO `RoundState` directly. Each timer is
//! modelled as a jump of the `SimContext` virtual clock, so a run is fully
//! determined by its seed.

use crate::context::SimContext;
use crate::exporter::{RoundExport, StepFrame};
use crate::oracle::{Oracle, OracleViolation};
use crate::scenarios::ScenarioId;

use loteria_core::{Direction, GameConfig, RoundPlanner, RoundState};
use loteria_env::LoteriaContext;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// RNG stream for driver decisions, kept apart from the per-round streams.
const ACTION_STREAM: u64 = u64::MAX;

/// Results from running a scenario.
#[derive(Debug, Clone)]
pub struct ScenarioResult {
    /// Scenario that was run
    pub scenario: ScenarioId,

    /// Seed used
    pub seed: u64,

    /// Whether scenario passed all assertions
    pub passed: bool,

    /// Driver actions attempted
    pub total_actions: u64,

    /// Final virtual time in seconds
    pub final_time_secs: f64,

    /// Failure message if any
    pub failure_reason: Option<String>,

    /// Metrics collected during run
    pub metrics: ScenarioMetrics,
}

/// Metrics collected during scenario execution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioMetrics {
    /// Rounds planned, including the first
    pub rounds: u64,

    /// Steps applied
    pub steps: u64,

    /// Actions refused because the cursor was busy or at a boundary
    pub noop_actions: u64,

    /// Rounds that reached a win
    pub wins: u64,

    /// Rounds whose guards left the deck
    pub degenerate_rounds: u64,

    /// Rounds with no reachable winning id
    pub unwinnable_rounds: u64,

    /// Timer firings ignored because their round was replaced
    pub stale_ignored: u64,

    /// Invariant violations found by the oracle
    pub oracle_violations: u64,
}

impl ScenarioMetrics {
    fn absorb(&mut self, other: &ScenarioMetrics) {
        self.rounds += other.rounds;
        self.steps += other.steps;
        self.noop_actions += other.noop_actions;
        self.wins += other.wins;
        self.degenerate_rounds += other.degenerate_rounds;
        self.unwinnable_rounds += other.unwinnable_rounds;
        self.stale_ignored += other.stale_ignored;
        self.oracle_violations += other.oracle_violations;
    }
}

/// Runs playback scenarios.
pub struct ScenarioRunner {
    /// Configuration seed
    seed: u64,

    /// Items in the synthetic deck
    deck_size: u32,

    /// Action budget per scenario
    steps: u64,

    /// Round configuration
    config: GameConfig,
}

impl ScenarioRunner {
    /// Creates a new scenario runner with a 54-card deck.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            deck_size: 54,
            steps: 500,
            config: GameConfig::default(),
        }
    }

    /// Sets the deck size.
    pub fn with_deck_size(mut self, deck_size: u32) -> Self {
        self.deck_size = deck_size;
        self
    }

    /// Sets the action budget.
    pub fn with_steps(mut self, steps: u64) -> Self {
        self.steps = steps;
        self
    }

    /// Sets the round configuration.
    pub fn with_config(mut self, config: GameConfig) -> Self {
        self.config = config;
        self
    }

    /// Runs a scenario and returns the result.
    pub fn run(&self, scenario: ScenarioId) -> ScenarioResult {
        self.execute(scenario, None).0
    }

    /// Runs a scenario and records every round for export.
    pub fn run_with_export(&self, scenario: ScenarioId) -> (ScenarioResult, RoundExport) {
        let export = RoundExport::new(scenario.name(), self.seed);
        let (result, export) = self.execute(scenario, Some(export));
        let mut export = export.unwrap_or_else(|| RoundExport::new(scenario.name(), self.seed));
        export.finalize(result.passed, result.metrics.clone());
        (result, export)
    }

    fn execute(&self, scenario: ScenarioId, export: Option<RoundExport>) -> (ScenarioResult, Option<RoundExport>) {
        info!("Starting scenario: {} (seed={})", scenario.name(), self.seed);

        let context = SimContext::new(self.seed);
        let outcome = match scenario {
            ScenarioId::ForwardSweep => self.run_forward_sweep(&context, export),
            ScenarioId::RandomWalk => self.run_random_walk(&context, export),
            ScenarioId::RestartStorm => self.run_restart_storm(&context, export),
            ScenarioId::SmallDeck => self.run_small_deck(&context, export),
            ScenarioId::FullReveal => self.run_full_reveal(&context, export),
        };

        let failure_reason = outcome
            .failures
            .first()
            .cloned()
            .or_else(|| outcome.violations.first().map(|v| v.to_string()));

        let result = ScenarioResult {
            scenario,
            seed: self.seed,
            passed: failure_reason.is_none(),
            total_actions: outcome.actions,
            final_time_secs: context.now().as_secs_f64(),
            failure_reason,
            metrics: outcome.metrics,
        };
        (result, outcome.export)
    }

    /// SIM-001: ForwardSweep - advance to the end of every prefix.
    ///
    /// **Assertion**: every sweep stops on the last reachable slot, and with
    /// the tail locked no round is ever won.
    fn run_forward_sweep(&self, context: &SimContext, export: Option<RoundExport>) -> Outcome {
        let mut driver = RoundDriver::new(context.clone(), self.config.clone(), self.deck_size, export);
        let mut actions = 0;

        while actions < self.steps {
            actions += 1;
            if driver.step(Direction::Forward) {
                continue;
            }
            let reachable = driver.state.reachable_len();
            let index = driver.state.cursor().order_index();
            if reachable > 0 && index != reachable - 1 {
                driver.fail(format!("sweep stopped at {} of {}", index, reachable));
            }
            driver.restart();
        }

        if !self.config.rules.unlock_tail && driver.metrics.wins > 0 {
            driver.fail(format!("{} wins with the tail locked", driver.metrics.wins));
        }
        driver.finish(actions)
    }

    /// SIM-002: RandomWalk - seeded mix of forward, backward and restart.
    fn run_random_walk(&self, context: &SimContext, export: Option<RoundExport>) -> Outcome {
        let mut rng = context.derive_rng(ACTION_STREAM);
        let mut driver = RoundDriver::new(context.clone(), self.config.clone(), self.deck_size, export);

        for _ in 0..self.steps {
            match rng.gen_range(0..100) {
                0..=44 => {
                    driver.step(Direction::Forward);
                }
                45..=89 => {
                    driver.step(Direction::Backward);
                }
                _ => driver.restart(),
            }
        }
        driver.finish(self.steps)
    }

    /// SIM-003: RestartStorm - restart while a step is in flight.
    ///
    /// **Assertion**: both timers of every interrupted step are ignored.
    fn run_restart_storm(&self, context: &SimContext, export: Option<RoundExport>) -> Outcome {
        let mut rng = context.derive_rng(ACTION_STREAM);
        let mut driver = RoundDriver::new(context.clone(), self.config.clone(), self.deck_size, export);
        let mut interrupted = 0;

        for _ in 0..self.steps {
            if rng.gen_bool(0.5) {
                if driver.interrupted_step(Direction::Forward) {
                    interrupted += 1;
                }
            } else if !driver.step(Direction::Forward) {
                driver.restart();
            }
        }

        if driver.metrics.stale_ignored != 2 * interrupted {
            driver.fail(format!(
                "{} stale firings ignored for {} interrupted steps",
                driver.metrics.stale_ignored, interrupted
            ));
        }
        driver.finish(self.steps)
    }

    /// SIM-004: SmallDeck - decks too small for the guard arithmetic.
    ///
    /// **Assertion**: degenerate rounds are flagged and still play to the end.
    fn run_small_deck(&self, context: &SimContext, mut export: Option<RoundExport>) -> Outcome {
        const ROUNDS_PER_DECK: usize = 3;

        let mut total = Outcome::default();
        for deck_size in 1..=40 {
            let mut driver = RoundDriver::new(context.clone(), self.config.clone(), deck_size, export.take());
            for round in 0..ROUNDS_PER_DECK {
                if round > 0 {
                    driver.restart();
                }
                while driver.step(Direction::Forward) {
                    total.actions += 1;
                }
                total.actions += 1;
            }
            let outcome = driver.finish(0);
            total.merge(outcome);
            export = total.export.take();
        }
        total.export = export;

        if total.metrics.degenerate_rounds == 0 {
            total.failures.push("no degenerate rounds on tiny decks".to_string());
        }
        total
    }

    /// SIM-005: FullReveal - tail unlocked, every round played to its last card.
    ///
    /// **Assertion**: the win fires iff the whole window lies in the deck,
    /// and then exactly on the first tail card.
    fn run_full_reveal(&self, context: &SimContext, export: Option<RoundExport>) -> Outcome {
        let mut config = self.config.clone();
        config.rules.unlock_tail = true;

        let mut driver = RoundDriver::new(context.clone(), config, self.deck_size, export);
        let mut actions = 0;

        while actions < self.steps {
            actions += 1;
            if driver.step(Direction::Forward) {
                continue;
            }

            let state = &driver.state;
            let window = state.window();
            let expected = window.start > 0 && window.last() <= state.total();
            let prefix = state.order().navigable_len() as u64;
            let unwinnable = state.health().unwinnable;
            let start = window.start;
            match (expected, state.won_at_step()) {
                (true, Some(step)) if step == prefix => {}
                (true, other) => {
                    let reason = format!("start {} won at {:?}, expected step {}", window.start, other, prefix);
                    driver.fail(reason);
                }
                (false, Some(step)) => {
                    let reason = format!("start {} won at step {} with window outside deck", window.start, step);
                    driver.fail(reason);
                }
                (false, None) => {}
            }
            if expected == unwinnable {
                let reason = format!("start {}: unwinnable={} contradicts expected win={}", start, expected, expected);
                driver.fail(reason);
            }
            driver.restart();
        }
        driver.finish(actions)
    }
}

/// What a scenario body hands back to `execute`.
#[derive(Debug, Default)]
struct Outcome {
    actions: u64,
    metrics: ScenarioMetrics,
    failures: Vec<String>,
    violations: Vec<OracleViolation>,
    export: Option<RoundExport>,
}

impl Outcome {
    fn merge(&mut self, other: Outcome) {
        self.actions += other.actions;
        self.metrics.absorb(&other.metrics);
        self.failures.extend(other.failures);
        self.violations.extend(other.violations);
        if other.export.is_some() {
            self.export = other.export;
        }
    }
}

/// Plays rounds of one deck size on the virtual clock.
struct RoundDriver {
    context: SimContext,
    config: GameConfig,
    planner: RoundPlanner,
    state: RoundState,
    oracle: Oracle,
    metrics: ScenarioMetrics,
    failures: Vec<String>,
    export: Option<RoundExport>,
}

impl RoundDriver {
    fn new(context: SimContext, config: GameConfig, deck_size: u32, export: Option<RoundExport>) -> Self {
        let planner = RoundPlanner::new(&config, deck_size);
        let generation = 1;
        let plan = planner.plan(&mut context.derive_rng(generation));
        let state = RoundState::new(generation, plan, config.rules, deck_size);

        let mut driver = Self {
            context,
            config,
            planner,
            state,
            oracle: Oracle::new(),
            metrics: ScenarioMetrics::default(),
            failures: Vec::new(),
            export,
        };
        driver.on_new_round();
        driver
    }

    /// Plays one full step. Returns `false` if the cursor refused it.
    fn step(&mut self, direction: Direction) -> bool {
        let Some(ticket) = self.state.begin(direction) else {
            self.metrics.noop_actions += 1;
            return false;
        };

        self.context.advance_time(self.config.swap_delay());
        let had_won = self.state.has_won();
        if self.state.complete_step(ticket).is_some() {
            self.metrics.steps += 1;
        }
        if !had_won && self.state.has_won() {
            self.metrics.wins += 1;
        }

        self.context.advance_time(self.config.reveal_delay());
        self.state.reveal(ticket);
        self.check(match direction {
            Direction::Forward => "forward",
            Direction::Backward => "backward",
        });
        true
    }

    /// Starts a step, restarts before its timers fire, then delivers both
    /// timers late.
    fn interrupted_step(&mut self, direction: Direction) -> bool {
        let Some(ticket) = self.state.begin(direction) else {
            self.metrics.noop_actions += 1;
            self.restart();
            return false;
        };

        self.context.advance_time(self.config.swap_delay() / 2);
        self.restart();

        self.context.advance_time(self.config.swap_delay());
        if self.state.complete_step(ticket).is_none() {
            self.metrics.stale_ignored += 1;
        } else {
            self.fail(format!("stale swap timer of gen {} applied", ticket.generation));
        }

        self.context.advance_time(self.config.reveal_delay());
        if self.state.reveal(ticket) {
            self.fail(format!("stale reveal timer of gen {} applied", ticket.generation));
        } else {
            self.metrics.stale_ignored += 1;
        }
        self.check("late_timers");
        true
    }

    fn restart(&mut self) {
        let generation = self.state.generation() + 1;
        let plan = self.planner.plan(&mut self.context.derive_rng(generation));
        self.state.restart(plan);
        self.on_new_round();
    }

    fn on_new_round(&mut self) {
        self.metrics.rounds += 1;
        let health = self.state.health();
        if health.degenerate.is_some() {
            self.metrics.degenerate_rounds += 1;
        }
        if health.unwinnable {
            self.metrics.unwinnable_rounds += 1;
        }
        if self.state.has_won() {
            self.metrics.wins += 1;
        }
        debug!(
            generation = self.state.generation(),
            deck = self.state.total(),
            start = self.state.window().start,
            "round planned"
        );

        if let Some(export) = &mut self.export {
            export.begin_round(&self.state);
        }
        self.check("new_round");
    }

    fn check(&mut self, action: &str) {
        self.metrics.oracle_violations += self.oracle.observe(&self.state) as u64;
        if let Some(export) = &mut self.export {
            let frame = StepFrame::capture(&self.state, action, self.context.now());
            export.add_frame(&self.state, frame);
        }
    }

    fn fail(&mut self, reason: String) {
        debug!(generation = self.state.generation(), %reason, "assertion failed");
        self.failures.push(reason);
    }

    fn finish(self, actions: u64) -> Outcome {
        Outcome {
            actions,
            metrics: self.metrics,
            failures: self.failures,
            violations: self.oracle.into_violations(),
            export: self.export,
        }
    }
}
