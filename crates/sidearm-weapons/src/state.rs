use serde::{Deserialize, Serialize};

use crate::burst::BurstPhase;
use crate::config::WeaponConfig;
use crate::windup::WindupPhase;

/// Everything about a weapon that changes while it is used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponRuntimeState {
    pub current_ammo: u32,
    /// Seconds until the next discharge is allowed.
    pub fire_interval_remaining: f32,
    pub current_windup: f32,
    /// Shots fired in the current burst. Non-zero keeps the gate closed.
    pub current_burst_count: u32,
    pub fire_input: bool,
    /// Externally imposed hold-fire (menus, cutscenes, sprinting).
    pub fire_blocked: bool,
    /// Discharges since the trigger was last released.
    pub times_fired: u32,
    pub windup: WindupPhase,
    pub burst: BurstPhase,
    pub active: bool,
}

impl WeaponRuntimeState {
    pub fn new(config: &WeaponConfig) -> Self {
        Self {
            current_ammo: config.max_ammo,
            fire_interval_remaining: 0.0,
            current_windup: 0.0,
            current_burst_count: 0,
            fire_input: false,
            fire_blocked: false,
            times_fired: 0,
            windup: WindupPhase::Idle,
            burst: BurstPhase::Idle,
            active: true,
        }
    }

    /// A burst sequence is running or cooling down.
    pub fn burst_firing(&self) -> bool {
        self.burst != BurstPhase::Idle
    }

    /// A forced charge is running or has just discharged.
    pub fn windup_in_progress(&self) -> bool {
        matches!(
            self.windup,
            WindupPhase::ForcedCharging | WindupPhase::Discharged
        )
    }
}
