//! Loteria Deterministic Simulation Harness
//!
//! Plays thousands of rounds against the real round engine with every
//! source of non-determinism under control:
//! - **Time**: a virtual clock that jumps by the configured swap and reveal
//!   delays instead of waiting
//! - **Randomness**: every round draws from its own ChaCha8 stream derived
//!   from a single 64-bit seed
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       ScenarioRunner                         │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │ SimContext (virtual clock + per-round RNG streams)     │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! │        │                                                     │
//! │  ┌─────▼───────┐   begin / complete_step / reveal / restart  │
//! │  │ RoundDriver │────────────────────────► RoundState         │
//! │  └─────────────┘                              │              │
//! │        ▲                                      │              │
//! │  ┌─────┴───────────────────────┐              │              │
//! │  │ Oracle (naive invariants)   │◄─────────────┘              │
//! │  └─────────────────────────────┘                             │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use loteria_sim::{ScenarioRunner, scenarios::ScenarioId};
//!
//! let result = ScenarioRunner::new(42).with_steps(500).run(ScenarioId::RandomWalk);
//! assert!(result.passed);
//! ```

mod context;
mod exporter;
mod oracle;
mod runner;
pub mod scenarios;

pub use context::SimContext;
pub use exporter::{RoundExport, RoundRecord, StepFrame};
pub use oracle::{Oracle, OracleViolation};
pub use runner::{ScenarioMetrics, ScenarioResult, ScenarioRunner};
