//! Production implementation of LoteriaContext using Tokio.

use crate::{EnvError, LoteriaContext};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Production context backed by Tokio and OS entropy.
///
/// Time comes from the system clock, randomness from the OS.
pub struct TokioContext {
    /// Start time for monotonic duration calculations
    start: Instant,
}

impl TokioContext {
    /// Creates a new TokioContext.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Creates an Arc-wrapped context for sharing across tasks.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

impl Default for TokioContext {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LoteriaContext for TokioContext {
    type Rng = StdRng;

    fn now(&self) -> Duration {
        self.start.elapsed()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    fn spawn<F>(&self, name: &str, future: F) -> Result<(), EnvError>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::runtime::Handle::try_current()
            .map_err(|_| EnvError::no_runtime(name))?;
        handle.spawn(future);
        Ok(())
    }

    fn derive_rng(&self, _stream: u64) -> StdRng {
        // Production rounds are never replayed
        StdRng::from_entropy()
    }

    fn seed(&self) -> u64 {
        // Production is not seeded
        0
    }
}
