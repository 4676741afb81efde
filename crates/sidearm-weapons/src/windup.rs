//! Charge-up before firing.
//!
//! A plain windup accumulates while the trigger is held and the gate is
//! open, firing every tick once full. A forced windup (`force_first_shot`)
//! is a sequence of its own: once started it charges one `dt` per tick
//! regardless of the gate and fires exactly once when full, unless the
//! trigger is released first.

use serde::{Deserialize, Serialize};

use crate::config::WeaponConfig;
use crate::state::WeaponRuntimeState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WindupPhase {
    #[default]
    Idle,
    Charging,
    ForcedCharging,
    /// The forced charge fired this tick; held for one more tick so the
    /// sequence cannot restart before its shot settles.
    Discharged,
}

/// Step the windup by `dt`. Returns true when the weapon should fire.
pub fn advance(
    state: &mut WeaponRuntimeState,
    config: &WeaponConfig,
    gate_open: bool,
    dt: f32,
) -> bool {
    let settling = state.windup == WindupPhase::Discharged;
    let fire = evaluate(state, config, gate_open, dt);
    if settling && state.windup == WindupPhase::Discharged {
        state.windup = WindupPhase::Idle;
    }
    fire
}

fn evaluate(
    state: &mut WeaponRuntimeState,
    config: &WeaponConfig,
    gate_open: bool,
    dt: f32,
) -> bool {
    if state.windup == WindupPhase::ForcedCharging {
        if !state.fire_input {
            tracing::debug!(windup = state.current_windup, "Forced windup released early");
            state.windup = WindupPhase::Idle;
        } else {
            return charge_forced(state, config, dt);
        }
    }

    if !state.fire_input {
        if !state.windup_in_progress() {
            state.current_windup = (state.current_windup - config.windup_decay * dt).max(0.0);
            if state.windup == WindupPhase::Charging {
                state.windup = WindupPhase::Idle;
            }
        }
        state.times_fired = 0;
        return false;
    }

    if !gate_open {
        return false;
    }

    if config.fire_windup <= 0.0 {
        return true;
    }

    if config.force_first_shot {
        if state.windup_in_progress() || state.burst_firing() {
            return false;
        }
        state.windup = WindupPhase::ForcedCharging;
        return charge_forced(state, config, dt);
    }

    if !state.burst_firing() {
        state.current_windup += dt;
        state.windup = WindupPhase::Charging;
    }
    state.current_windup >= config.fire_windup
}

fn charge_forced(state: &mut WeaponRuntimeState, config: &WeaponConfig, dt: f32) -> bool {
    state.current_windup += dt;
    if state.current_windup >= config.fire_windup {
        state.windup = WindupPhase::Discharged;
        return true;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup(config: WeaponConfig) -> (WeaponRuntimeState, WeaponConfig) {
        let mut state = WeaponRuntimeState::new(&config);
        state.fire_input = true;
        (state, config)
    }

    fn charged(fire_windup: f32) -> WeaponConfig {
        WeaponConfig {
            fire_windup,
            windup_decay: 2.0,
            ..WeaponConfig::default()
        }
    }

    #[test]
    fn zero_windup_fires_when_gate_open() {
        let (mut state, config) = setup(WeaponConfig::default());
        assert!(advance(&mut state, &config, true, 0.125));
        assert!(!advance(&mut state, &config, false, 0.125));
    }

    #[test]
    fn charges_while_gate_open_then_fires_every_tick() {
        let (mut state, config) = setup(charged(0.5));
        let fired: Vec<bool> = (0..6)
            .map(|_| advance(&mut state, &config, true, 0.125))
            .collect();
        assert_eq!(fired, vec![false, false, false, true, true, true]);
        assert_eq!(state.windup, WindupPhase::Charging);
    }

    #[test]
    fn closed_gate_pauses_charging() {
        let (mut state, config) = setup(charged(0.5));
        advance(&mut state, &config, true, 0.125);
        advance(&mut state, &config, false, 0.125);
        assert_eq!(state.current_windup, 0.125);
    }

    #[test]
    fn release_decays_and_resets_shot_count() {
        let (mut state, config) = setup(charged(1.0));
        for _ in 0..4 {
            advance(&mut state, &config, true, 0.125);
        }
        assert_eq!(state.current_windup, 0.5);
        state.times_fired = 3;
        state.fire_input = false;

        advance(&mut state, &config, true, 0.125);
        assert_eq!(state.current_windup, 0.25);
        assert_eq!(state.times_fired, 0);
        assert_eq!(state.windup, WindupPhase::Idle);

        advance(&mut state, &config, true, 0.125);
        advance(&mut state, &config, true, 0.125);
        assert_eq!(state.current_windup, 0.0, "decay floors at zero");
    }

    #[test]
    fn forced_windup_fires_once_when_full() {
        let config = WeaponConfig {
            force_first_shot: true,
            ..charged(0.5)
        };
        let (mut state, config) = setup(config);
        let fired: Vec<bool> = (0..4)
            .map(|_| advance(&mut state, &config, true, 0.125))
            .collect();
        assert_eq!(fired, vec![false, false, false, true]);
        assert_eq!(state.windup, WindupPhase::Discharged);
        assert!(state.windup_in_progress());

        // Settling tick: still in progress during evaluation, so no restart.
        assert!(!advance(&mut state, &config, true, 0.125));
        assert_eq!(state.windup, WindupPhase::Idle);
        assert!(!state.windup_in_progress());
    }

    #[test]
    fn forced_windup_keeps_charging_with_gate_closed() {
        let config = WeaponConfig {
            force_first_shot: true,
            ..charged(0.25)
        };
        let (mut state, config) = setup(config);
        assert!(!advance(&mut state, &config, true, 0.125));
        assert!(advance(&mut state, &config, false, 0.125));
    }

    #[test]
    fn forced_windup_release_cancels_without_firing() {
        let config = WeaponConfig {
            force_first_shot: true,
            ..charged(0.5)
        };
        let (mut state, config) = setup(config);
        for _ in 0..3 {
            assert!(!advance(&mut state, &config, true, 0.125));
        }
        state.fire_input = false;
        assert!(!advance(&mut state, &config, true, 0.125));
        assert_eq!(state.windup, WindupPhase::Idle);
        assert!(state.current_windup < 0.375, "decay resumes after cancel");
    }

    #[test]
    fn forced_with_zero_windup_fires_immediately() {
        let config = WeaponConfig {
            force_first_shot: true,
            ..WeaponConfig::default()
        };
        let (mut state, config) = setup(config);
        assert!(advance(&mut state, &config, true, 0.125));
        assert_eq!(state.windup, WindupPhase::Idle);
    }

    #[test]
    fn no_decay_while_forced_sequence_settles() {
        let config = WeaponConfig {
            force_first_shot: true,
            ..charged(0.25)
        };
        let (mut state, config) = setup(config);
        advance(&mut state, &config, true, 0.125);
        advance(&mut state, &config, true, 0.125);
        assert_eq!(state.windup, WindupPhase::Discharged);

        state.fire_input = false;
        advance(&mut state, &config, true, 0.125);
        assert_eq!(state.current_windup, 0.25);
        assert_eq!(state.windup, WindupPhase::Idle);
    }
}
