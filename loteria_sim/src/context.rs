//! Simulation context implementing LoteriaContext for deterministic testing.

use async_trait::async_trait;
use loteria_env::{EnvError, LoteriaContext};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Simulation context backed by deterministic time and RNG.
///
/// This implements `LoteriaContext` using:
/// - A virtual clock that can be advanced manually
/// - Seeded ChaCha8 streams, one per round generation
/// - Simulated sleep that advances virtual time
#[derive(Debug, Clone)]
pub struct SimContext {
    /// Master seed for this simulation
    seed: u64,

    /// Current virtual time (nanoseconds since simulation start)
    virtual_time_ns: Arc<AtomicU64>,
}

impl SimContext {
    /// Creates a new SimContext with the given seed.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            virtual_time_ns: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Creates an Arc-wrapped context for sharing.
    pub fn shared(seed: u64) -> Arc<Self> {
        Arc::new(Self::new(seed))
    }

    /// Advances virtual time by the given duration.
    pub fn advance_time(&self, duration: Duration) {
        self.virtual_time_ns
            .fetch_add(duration.as_nanos() as u64, Ordering::SeqCst);
    }

    /// Returns the current virtual time in nanoseconds.
    pub fn time_ns(&self) -> u64 {
        self.virtual_time_ns.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LoteriaContext for SimContext {
    type Rng = ChaCha8Rng;

    fn now(&self) -> Duration {
        Duration::from_nanos(self.time_ns())
    }

    async fn sleep(&self, duration: Duration) {
        // Virtual time jumps; nothing actually waits
        self.advance_time(duration);
        tokio::task::yield_now().await;
    }

    fn spawn<F>(&self, name: &str, future: F) -> Result<(), EnvError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::runtime::Handle::try_current().map_err(|_| EnvError::no_runtime(name))?;
        handle.spawn(future);
        Ok(())
    }

    fn derive_rng(&self, stream: u64) -> ChaCha8Rng {
        // Combine master seed with the stream for a reproducible sequence
        let combined_seed = self.seed.wrapping_mul(0x517cc1b727220a95) ^ stream;
        ChaCha8Rng::seed_from_u64(combined_seed)
    }

    fn seed(&self) -> u64 {
        self.seed
    }
}
