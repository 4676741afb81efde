//! Burst sequencing as a resumable state machine.
//!
//! A burst discharges, waits for the fire interval, and repeats while the
//! continue rule holds. When it stops, a cooldown always runs before the
//! burst counter clears and the gate can reopen.

use serde::{Deserialize, Serialize};

use crate::config::WeaponConfig;
use crate::state::WeaponRuntimeState;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum BurstPhase {
    #[default]
    Idle,
    /// Between shots, waiting for the fire interval to run out.
    Firing,
    Cooldown {
        remaining: f32,
    },
}

/// Start a burst. Returns true if the first shot should discharge now.
pub fn begin(state: &mut WeaponRuntimeState, config: &WeaponConfig) -> bool {
    if state.burst != BurstPhase::Idle {
        return false;
    }
    state.burst = BurstPhase::Firing;
    next_shot(state, config)
}

/// Resume a running burst. Returns true if a shot should discharge now.
///
/// Called before the fire interval is decremented, so a burst started on
/// this tick is first resumed on the next one.
pub fn resume(state: &mut WeaponRuntimeState, config: &WeaponConfig, dt: f32) -> bool {
    match state.burst {
        BurstPhase::Idle => false,
        BurstPhase::Firing => {
            if state.fire_interval_remaining > 0.0 {
                return false;
            }
            next_shot(state, config)
        },
        BurstPhase::Cooldown { remaining } => {
            let remaining = remaining - dt;
            if remaining <= 0.0 {
                state.current_burst_count = 0;
                state.burst = BurstPhase::Idle;
            } else {
                state.burst = BurstPhase::Cooldown { remaining };
            }
            false
        },
    }
}

/// Drop any running burst and clear its counter.
pub fn cancel(state: &mut WeaponRuntimeState) {
    state.burst = BurstPhase::Idle;
    state.current_burst_count = 0;
}

fn next_shot(state: &mut WeaponRuntimeState, config: &WeaponConfig) -> bool {
    let held = !config.can_interrupt_burst || state.fire_input;
    let loaded = config.max_ammo == 0 || state.current_ammo > 0;
    if held && loaded && state.current_burst_count < config.burst_count {
        return true;
    }
    if !config.can_auto_burst {
        state.fire_input = false;
    }
    tracing::debug!(
        shots = state.current_burst_count,
        cooldown = config.burst_cooldown,
        "Burst finished"
    );
    state.burst = BurstPhase::Cooldown {
        remaining: config.burst_cooldown,
    };
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn burst_config() -> WeaponConfig {
        WeaponConfig {
            burst_count: 3,
            burst_cooldown: 0.5,
            fire_interval: 0.25,
            ..WeaponConfig::default()
        }
    }

    /// Mimics the weapon's bookkeeping after a discharge.
    fn discharge(state: &mut WeaponRuntimeState, config: &WeaponConfig) {
        state.fire_interval_remaining = config.fire_interval;
        state.current_burst_count += 1;
    }

    #[test]
    fn begin_fires_first_shot_immediately() {
        let config = burst_config();
        let mut state = WeaponRuntimeState::new(&config);
        state.fire_input = true;
        assert!(begin(&mut state, &config));
        assert_eq!(state.burst, BurstPhase::Firing);
    }

    #[test]
    fn begin_is_ignored_while_running() {
        let config = burst_config();
        let mut state = WeaponRuntimeState::new(&config);
        state.burst = BurstPhase::Firing;
        assert!(!begin(&mut state, &config));
    }

    #[test]
    fn waits_for_interval_between_shots() {
        let config = burst_config();
        let mut state = WeaponRuntimeState::new(&config);
        begin(&mut state, &config);
        discharge(&mut state, &config);
        assert!(!resume(&mut state, &config, 0.125));
        state.fire_interval_remaining = 0.0;
        assert!(resume(&mut state, &config, 0.125));
    }

    #[test]
    fn exhausted_burst_enters_cooldown_then_resets() {
        let config = burst_config();
        let mut state = WeaponRuntimeState::new(&config);
        state.fire_input = true;
        state.current_burst_count = 3;
        state.burst = BurstPhase::Firing;

        assert!(!resume(&mut state, &config, 0.125));
        assert_eq!(state.burst, BurstPhase::Cooldown { remaining: 0.5 });
        assert!(!state.fire_input, "non-auto burst releases the trigger");

        for _ in 0..3 {
            resume(&mut state, &config, 0.125);
            assert_eq!(state.current_burst_count, 3);
        }
        resume(&mut state, &config, 0.125);
        assert_eq!(state.current_burst_count, 0);
        assert_eq!(state.burst, BurstPhase::Idle);
    }

    #[test]
    fn auto_burst_keeps_trigger() {
        let config = WeaponConfig {
            can_auto_burst: true,
            ..burst_config()
        };
        let mut state = WeaponRuntimeState::new(&config);
        state.fire_input = true;
        state.current_burst_count = 3;
        state.burst = BurstPhase::Firing;
        resume(&mut state, &config, 0.125);
        assert!(state.fire_input);
    }

    #[test]
    fn interruptible_burst_stops_on_release() {
        let config = WeaponConfig {
            can_interrupt_burst: true,
            ..burst_config()
        };
        let mut state = WeaponRuntimeState::new(&config);
        state.fire_input = true;
        assert!(begin(&mut state, &config));
        discharge(&mut state, &config);
        state.fire_input = false;
        state.fire_interval_remaining = 0.0;
        assert!(!resume(&mut state, &config, 0.125));
        assert!(matches!(state.burst, BurstPhase::Cooldown { .. }));
        assert_eq!(state.current_burst_count, 1);
    }

    #[test]
    fn cooldown_runs_even_without_shots() {
        let config = WeaponConfig {
            can_interrupt_burst: true,
            ..burst_config()
        };
        let mut state = WeaponRuntimeState::new(&config);
        assert!(!begin(&mut state, &config));
        assert!(matches!(state.burst, BurstPhase::Cooldown { .. }));
    }

    #[test]
    fn empty_magazine_ends_burst_early() {
        let config = WeaponConfig {
            max_ammo: 4,
            ..burst_config()
        };
        let mut state = WeaponRuntimeState::new(&config);
        state.fire_input = true;
        state.current_ammo = 0;
        state.current_burst_count = 1;
        state.burst = BurstPhase::Firing;
        assert!(!resume(&mut state, &config, 0.125));
        assert!(matches!(state.burst, BurstPhase::Cooldown { .. }));
    }

    #[test]
    fn cancel_clears_everything() {
        let config = burst_config();
        let mut state = WeaponRuntimeState::new(&config);
        state.burst = BurstPhase::Cooldown { remaining: 0.3 };
        state.current_burst_count = 2;
        cancel(&mut state);
        assert_eq!(state.burst, BurstPhase::Idle);
        assert_eq!(state.current_burst_count, 0);
    }
}
