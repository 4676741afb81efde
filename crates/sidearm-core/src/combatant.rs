use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::collab::LayerMask;

/// Unique identifier for anything the simulation can address (characters,
/// hit volumes).
pub type EntityId = u64;

/// Outcome of a health change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthChange {
    pub previous: i32,
    pub current: i32,
}

impl HealthChange {
    /// True only for the change that took health from positive to zero.
    pub fn died(&self) -> bool {
        self.current <= 0 && self.previous > 0
    }
}

/// Hit points clamped to `[0, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    pub current: i32,
    pub max: i32,
}

impl Health {
    pub fn full(max: i32) -> Self {
        let max = max.max(0);
        Self { current: max, max }
    }

    pub fn is_alive(&self) -> bool {
        self.current > 0
    }

    /// Add `change` (negative wounds, positive heals) and clamp.
    pub fn apply(&mut self, change: i32) -> HealthChange {
        let previous = self.current;
        self.current = previous.saturating_add(change).clamp(0, self.max);
        HealthChange {
            previous,
            current: self.current,
        }
    }
}

/// A melee swing resolved by the host against an overlap query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeleeStrike {
    pub attacker: EntityId,
    pub center: Vec3,
    pub half_extents: Vec3,
    pub rotation: Quat,
    pub damage: i32,
    pub mask: LayerMask,
}

/// Capability of anything that can take part in combat.
pub trait Combatant {
    fn id(&self) -> EntityId;

    fn health(&self) -> i32;

    fn is_alive(&self) -> bool {
        self.health() > 0
    }

    /// Apply a signed health change. Negative values wound.
    fn apply_damage(&mut self, change: i32) -> HealthChange;

    /// Start a melee swing if one is allowed right now.
    fn melee_attack(&mut self) -> Option<MeleeStrike>;
}

/// Resolves hit targets to their combat capability.
pub trait CombatantLookup {
    /// The combatant behind `id`, or `None` if the object cannot take damage.
    fn combatant_mut(&mut self, id: EntityId) -> Option<&mut dyn Combatant>;

    /// Whether `id` is a living combatant. Unknown ids are not alive.
    fn is_alive(&self, id: EntityId) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_clamps_to_bounds() {
        let mut hp = Health::full(100);
        hp.apply(50);
        assert_eq!(hp.current, 100);
        hp.apply(-250);
        assert_eq!(hp.current, 0);
    }

    #[test]
    fn death_reported_once() {
        let mut hp = Health::full(10);
        assert!(!hp.apply(-4).died());
        assert!(hp.apply(-6).died());
        assert!(!hp.apply(-6).died(), "already dead, no second death");
        assert!(!hp.is_alive());
    }

    #[test]
    fn healing_a_dead_health_pool_revives_without_death() {
        let mut hp = Health::full(10);
        hp.apply(-10);
        let change = hp.apply(5);
        assert!(!change.died());
        assert!(hp.is_alive());
    }

    #[test]
    fn saturating_change_does_not_overflow() {
        let mut hp = Health::full(10);
        hp.apply(i32::MIN);
        assert_eq!(hp.current, 0);
        hp.apply(i32::MAX);
        assert_eq!(hp.current, 10);
    }
}
