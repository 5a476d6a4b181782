//! Loteria Environment Abstraction Layer
//!
//! This crate provides the "Sans-IO" abstraction allowing the loteria
//! round engine to run in both **Production** (tokio) and **Simulation**
//! (virtual clock) environments.
//!
//! # Core Concept: The Reactor Pattern
//!
//! Everything that would make a round non-reproducible is intercepted:
//! - Time (`now()`, `sleep()`)
//! - Task scheduling (`spawn()`)
//! - Randomness (`derive_rng()`)
//!
//! By deriving all entropy from a single 64-bit seed, any odd round
//! becomes reproducible via its seed number.
//!
//! # Example
//!
//! ```ignore
//! use loteria_env::LoteriaContext;
//!
//! async fn reveal_after<Ctx: LoteriaContext>(ctx: &Ctx) {
//!     ctx.sleep(Duration::from_millis(3000)).await;
//!     show_image();
//! }
//! ```

mod context;
mod types;
mod error;
mod tokio_impl;

pub use context::LoteriaContext;
pub use types::SessionId;
pub use error::EnvError;
pub use tokio_impl::TokioContext;
