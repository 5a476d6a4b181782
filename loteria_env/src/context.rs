//! Core environment context trait for loteria rounds.

use async_trait::async_trait;
use rand::RngCore;
use std::future::Future;
use std::time::Duration;

use crate::EnvError;

/// The central interface for Environment Interaction.
///
/// This trait abstracts the "real world" so that the round engine can run
/// in both production (tokio) and simulation (virtual clock) environments.
///
/// # Implementations
///
/// - **Production**: `TokioContext` - wraps `tokio::time`, OS entropy
/// - **Simulation**: `SimContext` - virtual clock, `ChaCha8Rng(seed)`
///
/// # Determinism
///
/// For simulation, all methods that would normally introduce non-determinism
/// (time, randomness) are controlled by the implementation.
#[async_trait]
pub trait LoteriaContext: Send + Sync + 'static {
    /// Random source handed to round setup.
    type Rng: RngCore + Send;

    /// Returns the current monotonic time since context creation.
    ///
    /// In simulation, this is the virtual clock time.
    fn now(&self) -> Duration;

    /// Suspends execution for the given duration.
    ///
    /// In production: wraps `tokio::time::sleep`
    /// In simulation: advances virtual clock
    async fn sleep(&self, duration: Duration);

    /// Spawns a background task.
    ///
    /// Fails with [`EnvError::NoRuntime`] when there is nothing to run
    /// the task on.
    fn spawn<F>(&self, name: &str, future: F) -> Result<(), EnvError>
    where
        F: Future<Output = ()> + Send + 'static;

    /// Derives a random source for one stream (usually a round generation).
    ///
    /// Simulation contexts combine the global seed with `stream` so every
    /// round draws from its own reproducible sequence.
    fn derive_rng(&self, stream: u64) -> Self::Rng;

    /// Returns the context's seed (for logging/debugging).
    ///
    /// In production, returns 0 (not seeded).
    fn seed(&self) -> u64;
}
