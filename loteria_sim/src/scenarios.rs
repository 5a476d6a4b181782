//! Playback scenarios for deterministic simulation.

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioId {
    /// SIM-001: Walk every round to the end of its prefix, then restart
    ForwardSweep,

    /// SIM-002: Seeded mix of forward, backward and restart actions
    RandomWalk,

    /// SIM-003: Restart while a step is in flight
    RestartStorm,

    /// SIM-004: Decks of 1..=40 items where guards leave the deck
    SmallDeck,

    /// SIM-005: Tail unlocked, every round played to its last card
    FullReveal,
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::ForwardSweep,
            ScenarioId::RandomWalk,
            ScenarioId::RestartStorm,
            ScenarioId::SmallDeck,
            ScenarioId::FullReveal,
        ]
    }

    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::ForwardSweep => "forward_sweep",
            ScenarioId::RandomWalk => "random_walk",
            ScenarioId::RestartStorm => "restart_storm",
            ScenarioId::SmallDeck => "small_deck",
            ScenarioId::FullReveal => "full_reveal",
        }
    }

    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::ForwardSweep => "Advance to the end of every prefix, verify the last card is a winning card",
            ScenarioId::RandomWalk => "45% forward, 45% backward, 10% restart; invariants checked after every action",
            ScenarioId::RestartStorm => "Restart mid-transition, verify stale timers never touch the new round",
            ScenarioId::SmallDeck => "Deck sizes 1..=40, verify degenerate rounds are flagged and still playable",
            ScenarioId::FullReveal => "Tail unlocked, verify the win fires exactly when the naive predicate says so",
        }
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "forward_sweep" | "forwardsweep" | "sim-001" => Ok(ScenarioId::ForwardSweep),
            "random_walk" | "randomwalk" | "sim-002" => Ok(ScenarioId::RandomWalk),
            "restart_storm" | "restartstorm" | "sim-003" => Ok(ScenarioId::RestartStorm),
            "small_deck" | "smalldeck" | "sim-004" => Ok(ScenarioId::SmallDeck),
            "full_reveal" | "fullreveal" | "sim-005" => Ok(ScenarioId::FullReveal),
            _ => Err(format!("Unknown scenario: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_parse_back() {
        for scenario in ScenarioId::all() {
            assert_eq!(scenario.name().parse::<ScenarioId>(), Ok(scenario));
            assert_eq!(scenario.to_string(), scenario.name());
        }
    }

    #[test]
    fn test_aliases() {
        assert_eq!("SIM-003".parse::<ScenarioId>(), Ok(ScenarioId::RestartStorm));
        assert_eq!("SmallDeck".parse::<ScenarioId>(), Ok(ScenarioId::SmallDeck));
        assert!("time_warp".parse::<ScenarioId>().is_err());
    }
}
