use crate::config::WeaponConfig;
use crate::state::WeaponRuntimeState;

/// Whether the weapon may start a discharge this tick.
///
/// Closed while the owner is dead, the fire interval is pending, an
/// external block is set, a burst has shots on the counter, or a weapon
/// with a magazine is empty.
pub fn can_fire(state: &WeaponRuntimeState, config: &WeaponConfig, owner_alive: bool) -> bool {
    owner_alive
        && state.fire_interval_remaining <= 0.0
        && !state.fire_blocked
        && (config.burst_count == 0 || state.current_burst_count == 0)
        && (config.max_ammo == 0 || state.current_ammo > 0)
}
