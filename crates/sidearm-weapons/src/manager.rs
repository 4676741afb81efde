use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, WeaponConfig, WeaponLoadout};
use crate::state::WeaponRuntimeState;
use crate::weapon::{FireContext, Weapon, WeaponEvents, WeaponRig};

/// Edge of a button press, as delivered by the input layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputPhase {
    Started,
    Performed,
    Canceled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManagerError {
    NoWeapons,
    StartIndexOutOfRange { index: usize, len: usize },
    Config(ConfigError),
    SnapshotMismatch { expected: usize, found: usize },
}

impl std::fmt::Display for ManagerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoWeapons => write!(f, "weapon manager needs at least one weapon"),
            Self::StartIndexOutOfRange { index, len } => {
                write!(f, "start index {index} out of range for {len} weapons")
            },
            Self::Config(e) => write!(f, "invalid weapon config: {e}"),
            Self::SnapshotMismatch { expected, found } => {
                write!(f, "snapshot holds {found} weapons, loadout has {expected}")
            },
        }
    }
}

impl std::error::Error for ManagerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for ManagerError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

/// Serializable runtime of a whole loadout: which slot is active and each
/// weapon's counters, in loadout order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadoutSnapshot {
    pub active: usize,
    pub weapons: Vec<WeaponRuntimeState>,
}

/// A character's ordered set of weapons. Exactly one is active.
#[derive(Debug)]
pub struct WeaponManager {
    weapons: Vec<Weapon>,
    active: usize,
    start: usize,
}

impl WeaponManager {
    pub fn new(mut weapons: Vec<Weapon>, start_index: usize) -> Result<Self, ManagerError> {
        if weapons.is_empty() {
            return Err(ManagerError::NoWeapons);
        }
        if start_index >= weapons.len() {
            return Err(ManagerError::StartIndexOutOfRange {
                index: start_index,
                len: weapons.len(),
            });
        }
        for (i, weapon) in weapons.iter_mut().enumerate() {
            weapon.set_active(i == start_index);
        }
        Ok(Self {
            weapons,
            active: start_index,
            start: start_index,
        })
    }

    /// Build every weapon in `loadout`, asking `rig_for` for each one's
    /// peripherals.
    pub fn from_loadout(
        loadout: &WeaponLoadout,
        mut rig_for: impl FnMut(&WeaponConfig) -> WeaponRig,
    ) -> Result<Self, ManagerError> {
        let weapons = loadout
            .weapons
            .iter()
            .map(|config| Weapon::new(config.clone(), rig_for(config)))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(weapons, loadout.start_index)
    }

    pub fn active(&self) -> &Weapon {
        &self.weapons[self.active]
    }

    pub fn active_mut(&mut self) -> &mut Weapon {
        &mut self.weapons[self.active]
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn weapons(&self) -> &[Weapon] {
        &self.weapons
    }

    pub fn len(&self) -> usize {
        self.weapons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weapons.is_empty()
    }

    /// Cycle to the next weapon on a performed press. Returns the new index
    /// when a switch happened.
    pub fn switch_weapon(&mut self, phase: InputPhase) -> Option<usize> {
        if phase != InputPhase::Performed {
            return None;
        }
        let current = &mut self.weapons[self.active];
        current.set_fire_input(false);
        current.set_active(false);

        self.active = (self.active + 1) % self.weapons.len();
        let next = &mut self.weapons[self.active];
        next.set_active(true);
        tracing::info!(index = self.active, weapon = %next.name(), "Switched weapon");
        Some(self.active)
    }

    /// Reset every weapon and go back to the starting slot.
    pub fn reset(&mut self) {
        self.active = self.start;
        for (i, weapon) in self.weapons.iter_mut().enumerate() {
            weapon.set_active(i == self.start);
            weapon.reset();
        }
    }

    pub fn snapshot(&self) -> LoadoutSnapshot {
        LoadoutSnapshot {
            active: self.active,
            weapons: self.weapons.iter().map(|w| w.state().clone()).collect(),
        }
    }

    /// Load every weapon's runtime from `snapshot`. Nothing changes when the
    /// snapshot does not fit this loadout.
    pub fn restore(&mut self, snapshot: &LoadoutSnapshot) -> Result<(), ManagerError> {
        if snapshot.weapons.len() != self.weapons.len() {
            return Err(ManagerError::SnapshotMismatch {
                expected: self.weapons.len(),
                found: snapshot.weapons.len(),
            });
        }
        if snapshot.active >= self.weapons.len() {
            return Err(ManagerError::StartIndexOutOfRange {
                index: snapshot.active,
                len: self.weapons.len(),
            });
        }

        self.active = snapshot.active;
        for (i, (weapon, state)) in self.weapons.iter_mut().zip(&snapshot.weapons).enumerate() {
            let mut state = state.clone();
            state.active = i == snapshot.active;
            weapon.restore_state(state);
        }
        Ok(())
    }

    /// Forward the trigger state to the active weapon only.
    pub fn on_fire(&mut self, held: bool) {
        self.weapons[self.active].set_fire_input(held);
    }

    /// Tick the active weapon.
    pub fn advance(&mut self, dt: f32, ctx: &mut FireContext<'_>) -> WeaponEvents {
        self.weapons[self.active].advance(dt, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use sidearm_core::collab::VisualEffect;
    use sidearm_core::math::Pose;
    use sidearm_core::test_helpers::{CombatantTable, FakeVisuals, ScriptedRandom, ScriptedRays};

    use crate::burst::BurstPhase;
    use crate::weapon::WeaponEvent;

    fn named(name: &str) -> WeaponConfig {
        WeaponConfig {
            name: name.to_string(),
            fire_interval: 0.0,
            tracer: false,
            ..WeaponConfig::default()
        }
    }

    fn manager(names: &[&str], start: usize) -> WeaponManager {
        let weapons = names
            .iter()
            .map(|n| Weapon::new(named(n), WeaponRig::silent()).unwrap())
            .collect();
        WeaponManager::new(weapons, start).unwrap()
    }

    fn active_count(m: &WeaponManager) -> usize {
        m.weapons().iter().filter(|w| w.is_active()).count()
    }

    fn tick(m: &mut WeaponManager, dt: f32) -> WeaponEvents {
        let rays = ScriptedRays::miss();
        let mut combatants = CombatantTable::default().with(1, 100);
        let mut rng = ScriptedRandom::constant(Vec2::ZERO);
        let mut visuals = FakeVisuals::default();
        let mut ctx = FireContext {
            owner: 1,
            aim: Pose::IDENTITY,
            muzzle: Pose::IDENTITY,
            rays: &rays,
            combatants: &mut combatants,
            rng: &mut rng,
            visuals: Some(&mut visuals as &mut dyn VisualEffect),
        };
        m.advance(dt, &mut ctx)
    }

    #[test]
    fn start_index_is_the_only_active_weapon() {
        let m = manager(&["a", "b", "c"], 1);
        assert_eq!(m.active_index(), 1);
        assert_eq!(m.active().name(), "b");
        assert_eq!(active_count(&m), 1);
    }

    #[test]
    fn n_switches_wrap_to_start() {
        let mut m = manager(&["a", "b", "c", "d"], 2);
        for _ in 0..4 {
            assert!(m.switch_weapon(InputPhase::Performed).is_some());
            assert_eq!(active_count(&m), 1);
            assert!(m.active().is_active());
        }
        assert_eq!(m.active_index(), 2);
    }

    #[test]
    fn only_performed_phase_switches() {
        let mut m = manager(&["a", "b"], 0);
        assert_eq!(m.switch_weapon(InputPhase::Started), None);
        assert_eq!(m.switch_weapon(InputPhase::Canceled), None);
        assert_eq!(m.active_index(), 0);
        assert_eq!(m.switch_weapon(InputPhase::Performed), Some(1));
    }

    #[test]
    fn switch_clears_fire_input() {
        let mut m = manager(&["a", "b"], 0);
        m.on_fire(true);
        assert!(m.active().state().fire_input);
        m.switch_weapon(InputPhase::Performed);
        assert!(!m.weapons()[0].state().fire_input);
        assert!(!m.active().state().fire_input, "new weapon waits for a fresh press");
    }

    #[test]
    fn fire_goes_to_active_weapon_only() {
        let mut m = manager(&["a", "b"], 1);
        m.on_fire(true);
        assert!(!m.weapons()[0].state().fire_input);
        assert!(m.weapons()[1].state().fire_input);
    }

    #[test]
    fn only_active_weapon_ticks() {
        let mut m = manager(&["a", "b"], 0);
        m.on_fire(true);
        let events = tick(&mut m, 0.02);
        assert!(matches!(events[0], WeaponEvent::Discharged { .. }));
        assert_eq!(m.weapons()[0].state().times_fired, 1);
        assert_eq!(m.weapons()[1].state().times_fired, 0);
    }

    #[test]
    fn switching_mid_burst_leaves_weapon_ungated() {
        let config = WeaponConfig {
            burst_count: 3,
            burst_cooldown: 5.0,
            ..named("burst")
        };
        let weapons = vec![
            Weapon::new(config, WeaponRig::silent()).unwrap(),
            Weapon::new(named("b"), WeaponRig::silent()).unwrap(),
        ];
        let mut m = WeaponManager::new(weapons, 0).unwrap();
        m.on_fire(true);
        tick(&mut m, 0.02);
        assert_eq!(m.active().state().burst, BurstPhase::Firing);

        m.switch_weapon(InputPhase::Performed);
        m.switch_weapon(InputPhase::Performed);
        assert_eq!(m.active_index(), 0);
        assert_eq!(m.active().state().current_burst_count, 0);
        m.on_fire(true);
        let events = tick(&mut m, 0.02);
        assert!(matches!(events[0], WeaponEvent::Discharged { .. }));
    }

    #[test]
    fn reset_returns_to_start_with_fresh_weapons() {
        let config = WeaponConfig {
            max_ammo: 5,
            ..named("a")
        };
        let weapons = vec![
            Weapon::new(config, WeaponRig::silent()).unwrap(),
            Weapon::new(named("b"), WeaponRig::silent()).unwrap(),
        ];
        let mut m = WeaponManager::new(weapons, 0).unwrap();
        m.on_fire(true);
        tick(&mut m, 0.02);
        assert_eq!(m.active().state().current_ammo, 4);
        m.switch_weapon(InputPhase::Performed);

        m.reset();
        assert_eq!(m.active_index(), 0);
        assert_eq!(active_count(&m), 1);
        assert_eq!(m.active().state().current_ammo, 5);
        assert_eq!(m.active().state().times_fired, 0);
        assert!(!m.active().state().fire_input);
    }

    #[test]
    fn snapshot_restores_magazines_and_slot() {
        let config = WeaponConfig {
            max_ammo: 10,
            ..named("a")
        };
        let build = || {
            let weapons = vec![
                Weapon::new(config.clone(), WeaponRig::silent()).unwrap(),
                Weapon::new(named("b"), WeaponRig::silent()).unwrap(),
            ];
            WeaponManager::new(weapons, 0).unwrap()
        };
        let mut source = build();
        source.on_fire(true);
        for _ in 0..4 {
            tick(&mut source, 0.02);
        }
        source.switch_weapon(InputPhase::Performed);

        let bytes = rmp_serde::to_vec(&source.snapshot()).unwrap();
        let snapshot: LoadoutSnapshot = rmp_serde::from_slice(&bytes).unwrap();
        let mut restored = build();
        restored.restore(&snapshot).unwrap();

        assert_eq!(restored.active_index(), 1);
        assert_eq!(active_count(&restored), 1);
        assert_eq!(restored.weapons()[0].state().current_ammo, 6);
        assert_eq!(restored.snapshot(), source.snapshot());
    }

    #[test]
    fn mismatched_snapshot_leaves_weapons_alone() {
        let mut m = manager(&["a", "b"], 0);
        let mut snapshot = m.snapshot();
        snapshot.weapons.pop();
        assert_eq!(
            m.restore(&snapshot),
            Err(ManagerError::SnapshotMismatch {
                expected: 2,
                found: 1
            })
        );

        let mut snapshot = m.snapshot();
        snapshot.active = 5;
        m.weapons[0].set_fire_input(true);
        let before = m.snapshot();
        assert!(m.restore(&snapshot).is_err());
        assert_eq!(m.snapshot(), before);
    }

    #[test]
    fn empty_list_rejected() {
        assert_eq!(
            WeaponManager::new(Vec::new(), 0).unwrap_err(),
            ManagerError::NoWeapons
        );
    }

    #[test]
    fn start_out_of_range_rejected() {
        let weapons = vec![Weapon::new(named("a"), WeaponRig::silent()).unwrap()];
        assert_eq!(
            WeaponManager::new(weapons, 1).unwrap_err(),
            ManagerError::StartIndexOutOfRange { index: 1, len: 1 }
        );
    }

    #[test]
    fn builds_from_default_loadout() {
        let loadout = WeaponLoadout::default();
        let mut rigs = 0;
        let m = WeaponManager::from_loadout(&loadout, |_| {
            rigs += 1;
            WeaponRig::silent()
        })
        .unwrap();
        assert_eq!(m.len(), loadout.weapons.len());
        assert_eq!(rigs, loadout.weapons.len());
        assert_eq!(m.active().name(), "rifle");
    }

    #[test]
    fn invalid_loadout_weapon_surfaces_config_error() {
        let loadout = WeaponLoadout {
            start_index: 0,
            weapons: vec![WeaponConfig {
                projectiles_per_shot: 0,
                ..named("broken")
            }],
        };
        let err = WeaponManager::from_loadout(&loadout, |_| WeaponRig::silent()).unwrap_err();
        assert!(matches!(err, ManagerError::Config(_)));
    }
}
