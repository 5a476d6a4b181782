//! JSON exporter for played rounds.
//!
//! Exports every round of a scenario run, with one frame per action, so a
//! run can be replayed or diffed offline.

use crate::runner::ScenarioMetrics;
use loteria_core::{ItemId, RoundState};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::time::Duration;

/// Cursor state after one action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepFrame {
    /// Virtual time in milliseconds
    pub time_ms: u64,

    /// What the driver did
    pub action: String,

    pub order_index: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_id: Option<ItemId>,

    /// Size of the viewed set
    pub viewed: usize,

    pub win: bool,
}

impl StepFrame {
    pub fn capture(state: &RoundState, action: &str, now: Duration) -> Self {
        Self {
            time_ms: now.as_millis() as u64,
            action: action.to_string(),
            order_index: state.cursor().order_index(),
            item_id: state.current_item(),
            viewed: state.cursor().viewed().len(),
            win: state.detector().is_winner(state.cursor().viewed()),
        }
    }
}

/// Setup and play of one round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundRecord {
    pub generation: u64,
    pub deck_size: u32,
    pub winning_start: ItemId,
    pub locked_ids: Vec<ItemId>,
    pub order: Vec<ItemId>,
    pub navigable_len: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub degenerate: Option<String>,

    pub unwinnable: bool,

    /// Step count at which the win fired
    #[serde(skip_serializing_if = "Option::is_none")]
    pub won_at_step: Option<u64>,

    pub frames: Vec<StepFrame>,
}

impl RoundRecord {
    pub fn new(state: &RoundState) -> Self {
        Self {
            generation: state.generation(),
            deck_size: state.total(),
            winning_start: state.window().start,
            locked_ids: state.locks().ids().iter().copied().collect(),
            order: state.order().ids().to_vec(),
            navigable_len: state.order().navigable_len(),
            degenerate: state.health().degenerate.clone(),
            unwinnable: state.health().unwinnable,
            won_at_step: state.won_at_step(),
            frames: Vec::new(),
        }
    }
}

/// Complete scenario export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundExport {
    /// Scenario name
    pub scenario: String,

    /// Seed used
    pub seed: u64,

    /// Virtual duration in milliseconds
    pub duration_ms: u64,

    /// Every round played
    pub rounds: Vec<RoundRecord>,

    /// Final results
    pub passed: bool,

    pub metrics: ScenarioMetrics,
}

impl RoundExport {
    /// Creates a new export container.
    pub fn new(scenario: &str, seed: u64) -> Self {
        Self {
            scenario: scenario.to_string(),
            seed,
            duration_ms: 0,
            rounds: Vec::new(),
            passed: false,
            metrics: ScenarioMetrics::default(),
        }
    }

    /// Opens a record for a freshly planned round.
    pub fn begin_round(&mut self, state: &RoundState) {
        self.rounds.push(RoundRecord::new(state));
    }

    /// Appends a frame to the current round.
    pub fn add_frame(&mut self, state: &RoundState, frame: StepFrame) {
        self.duration_ms = frame.time_ms;
        if let Some(round) = self.rounds.last_mut() {
            round.won_at_step = state.won_at_step();
            round.frames.push(frame);
        }
    }

    /// Finalizes the export.
    pub fn finalize(&mut self, passed: bool, metrics: ScenarioMetrics) {
        self.passed = passed;
        self.metrics = metrics;
    }

    pub fn frame_count(&self) -> usize {
        self.rounds.iter().map(|r| r.frames.len()).sum()
    }

    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: &str) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}
