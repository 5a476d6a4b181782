//! Error types for the loteria round engine.

use loteria_env::EnvError;
use thiserror::Error;

/// Errors surfaced by round setup, roster loading and configuration.
#[derive(Debug, Error)]
pub enum LoteriaError {
    /// The item roster could not be fetched or came back empty.
    ///
    /// Terminal: the round engine is never entered and nothing retries.
    #[error("Roster unavailable: {0}")]
    DataUnavailable(String),

    /// Roster ids are not exactly `1..=N`
    #[error("Invalid roster: {0}")]
    InvalidRoster(String),

    /// Guard arithmetic left the deck bounds
    #[error("Degenerate round: {0}")]
    DegenerateRound(String),

    /// Configuration value out of range
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Environment failure (spawning timers)
    #[error(transparent)]
    Env(#[from] EnvError),

    /// Reading a roster or config file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Roster or config JSON was malformed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LoteriaError {
    /// Creates a data-unavailable error.
    pub fn data_unavailable(msg: impl Into<String>) -> Self {
        Self::DataUnavailable(msg.into())
    }

    /// Creates an invalid-roster error.
    pub fn invalid_roster(msg: impl Into<String>) -> Self {
        Self::InvalidRoster(msg.into())
    }

    /// Creates a degenerate-round error.
    pub fn degenerate(msg: impl Into<String>) -> Self {
        Self::DegenerateRound(msg.into())
    }

    /// Creates an invalid-config error.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, LoteriaError>;
