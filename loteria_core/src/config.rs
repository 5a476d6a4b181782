//! Game configuration.

use crate::error::{LoteriaError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Flags selecting between the win/navigation variants of the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoundRules {
    /// Every non-winning, non-locked item must be seen before a win counts.
    pub require_full_complement: bool,

    /// Let the cursor walk into the locked tail after the prefix.
    pub unlock_tail: bool,
}

impl Default for RoundRules {
    fn default() -> Self {
        Self {
            require_full_complement: true,
            unlock_tail: false,
        }
    }
}

/// Configuration for a loteria session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Number of consecutive ids in the winning run (default: 16)
    pub run_length: u32,

    /// Largest possible winning start, inclusive (default: 24)
    pub max_window_start: u32,

    /// Delay between hiding the image and swapping the item (default: 100ms)
    pub swap_delay_ms: u64,

    /// Delay between swapping the item and revealing it (default: 3000ms)
    pub reveal_delay_ms: u64,

    /// Win and navigation variant
    pub rules: RoundRules,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            run_length: 16,
            max_window_start: 24,
            swap_delay_ms: 100,
            reveal_delay_ms: 3000,
            rules: RoundRules::default(),
        }
    }
}

impl GameConfig {
    /// Loads a config from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Parses a config from JSON text.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let config: GameConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the round engine cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.run_length == 0 {
            return Err(LoteriaError::invalid_config("run_length must be at least 1"));
        }
        if self.reveal_delay_ms == 0 {
            return Err(LoteriaError::invalid_config("reveal_delay_ms must be non-zero"));
        }
        // The end guard `start + run_length + 1` must still be an id
        let headroom = self
            .max_window_start
            .checked_add(self.run_length)
            .and_then(|end| end.checked_add(1));
        if headroom.is_none() {
            return Err(LoteriaError::invalid_config(
                "max_window_start + run_length leaves no room for guard ids",
            ));
        }
        Ok(())
    }

    pub fn swap_delay(&self) -> Duration {
        Duration::from_millis(self.swap_delay_ms)
    }

    pub fn reveal_delay(&self) -> Duration {
        Duration::from_millis(self.reveal_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_config_default() {
        let config = GameConfig::default();
        assert_eq!(config.run_length, 16);
        assert_eq!(config.max_window_start, 24);
        assert_eq!(config.swap_delay(), Duration::from_millis(100));
        assert_eq!(config.reveal_delay(), Duration::from_millis(3000));
        assert!(config.rules.require_full_complement);
        assert!(!config.rules.unlock_tail);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = GameConfig::from_json_str(r#"{"reveal_delay_ms": 500, "rules": {"unlock_tail": true}}"#)
            .unwrap();
        assert_eq!(config.reveal_delay_ms, 500);
        assert_eq!(config.run_length, 16);
        assert!(config.rules.unlock_tail);
        assert!(config.rules.require_full_complement);
    }

    #[test]
    fn test_zero_run_length_rejected() {
        let err = GameConfig::from_json_str(r#"{"run_length": 0}"#).unwrap_err();
        assert!(matches!(err, LoteriaError::InvalidConfig(_)));
    }

    #[test]
    fn test_oversized_window_rejected() {
        let err = GameConfig::from_json_str(r#"{"run_length": 4294967295}"#).unwrap_err();
        assert!(matches!(err, LoteriaError::InvalidConfig(_)));

        let err = GameConfig::from_json_str(r#"{"max_window_start": 4294967290}"#).unwrap_err();
        assert!(matches!(err, LoteriaError::InvalidConfig(_)));

        let config = GameConfig {
            max_window_start: u32::MAX - 17,
            ..GameConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("game.json");
        std::fs::write(&path, r#"{"run_length": 8, "swap_delay_ms": 50}"#).unwrap();

        let config = GameConfig::from_json_file(&path).unwrap();
        assert_eq!(config.run_length, 8);
        assert_eq!(config.swap_delay_ms, 50);
        assert_eq!(config.reveal_delay_ms, GameConfig::default().reveal_delay_ms);
    }

    #[test]
    fn test_missing_config_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = GameConfig::from_json_file(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, LoteriaError::Io(_)));
    }

    #[test]
    fn test_malformed_json_is_serialization_error() {
        let err = GameConfig::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, LoteriaError::Serialization(_)));
    }
}
