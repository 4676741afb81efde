use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::combatant::EntityId;

/// Unique identifier for a human player.
pub type PlayerId = u64;

/// Contract every tick-driven game session implements.
///
/// The host owns the clock and the input devices; the session only advances
/// game state when `update` is called.
pub trait Simulation {
    /// Session metadata for menus and logs.
    fn metadata(&self) -> GameMetadata;

    /// Reset the session to a fresh round.
    fn init(&mut self, config: &GameConfig);

    /// Advance one fixed step. Returns events raised during the step.
    fn update(&mut self, dt: f32, inputs: &PlayerInputs) -> Vec<GameEvent>;

    /// Serialize the authoritative state snapshot.
    fn serialize_state(&self) -> Vec<u8>;

    /// Replace state with a previously serialized snapshot.
    fn apply_state(&mut self, state: &[u8]);

    /// Queue an encoded input from a player for the next update.
    fn apply_input(&mut self, player_id: PlayerId, input: &[u8]);

    /// Fixed simulation rate in Hz.
    fn tick_rate(&self) -> f32 {
        50.0
    }

    fn pause(&mut self);

    fn resume(&mut self);

    fn is_paused(&self) -> bool;

    /// Whether the current round is over.
    fn is_round_complete(&self) -> bool;

    /// Scores for the current round.
    fn round_results(&self) -> Vec<PlayerScore>;
}

/// Session metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameMetadata {
    pub name: String,
    pub description: String,
    pub estimated_round_duration: Duration,
}

/// Per-session configuration supplied by the host.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameConfig {
    /// Zero means the round has no time limit.
    pub round_duration: Duration,
    pub custom: HashMap<String, serde_json::Value>,
}

/// Inputs collected by the host for a single tick.
#[derive(Debug, Clone, Default)]
pub struct PlayerInputs {
    pub inputs: HashMap<PlayerId, Vec<u8>>,
}

/// Events emitted by a session during update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    ScoreUpdate { player_id: PlayerId, score: i32 },
    EnemySpawned { enemy: EntityId },
    EnemyKilled { enemy: EntityId },
    PlayerDied { player_id: PlayerId },
    WeaponSwitched { player_id: PlayerId, index: usize },
    ShotFired { player_id: PlayerId, weapon: String },
    RoundComplete,
}

/// Score entry for a player at the end of a round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerScore {
    pub player_id: PlayerId,
    pub score: i32,
}

/// Generates the `Simulation` methods that every session implements the same
/// way: `serialize_state`, `apply_state`, `pause`, `resume`, `is_paused`.
///
/// Requires the implementing struct to have `state: $StateType` and
/// `paused: bool` fields. With `accept_state: method`, a decoded snapshot is
/// only installed when `self.method(&incoming)` returns true, which lets a
/// session restore runtime kept outside `state`.
#[macro_export]
macro_rules! simulation_boilerplate {
    (state_type: $StateType:ty, accept_state: $accept:ident) => {
        $crate::simulation_boilerplate!(@common);

        fn apply_state(&mut self, state: &[u8]) {
            match rmp_serde::from_slice::<$StateType>(state) {
                Ok(s) => {
                    if self.$accept(&s) {
                        self.state = s;
                    }
                },
                Err(e) => tracing::debug!(error = %e, "Dropped malformed state snapshot"),
            }
        }
    };
    (state_type: $StateType:ty) => {
        $crate::simulation_boilerplate!(@common);

        fn apply_state(&mut self, state: &[u8]) {
            match rmp_serde::from_slice::<$StateType>(state) {
                Ok(s) => self.state = s,
                Err(e) => tracing::debug!(error = %e, "Dropped malformed state snapshot"),
            }
        }
    };
    (@common) => {
        fn serialize_state(&self) -> Vec<u8> {
            rmp_serde::to_vec(&self.state).expect("session state serialization must succeed")
        }

        fn pause(&mut self) {
            self.paused = true;
        }

        fn resume(&mut self) {
            self.paused = false;
        }

        fn is_paused(&self) -> bool {
            self.paused
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_survive_msgpack() {
        let events = vec![
            GameEvent::ScoreUpdate {
                player_id: 1,
                score: 3,
            },
            GameEvent::ShotFired {
                player_id: 1,
                weapon: "rifle".to_string(),
            },
            GameEvent::RoundComplete,
        ];
        let bytes = rmp_serde::to_vec(&events).unwrap();
        let back: Vec<GameEvent> = rmp_serde::from_slice(&bytes).unwrap();
        assert_eq!(back, events);
    }

    #[test]
    fn default_config_has_no_time_limit() {
        let config = GameConfig::default();
        assert!(config.round_duration.is_zero());
        assert!(config.custom.is_empty());
    }
}
