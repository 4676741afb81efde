use glam::Vec3;
use serde::{Deserialize, Serialize};

use sidearm_core::combatant::{Combatant, EntityId, MeleeStrike};
use sidearm_core::math::{Pose, yaw_towards};

use crate::character::{Character, CharacterKind};
use crate::config::EnemyPrefab;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnemyState {
    /// No target to pursue.
    Patrol,
    Chase,
    /// Target is in reach: stand, face it and swing.
    Attack,
}

/// Where an enemy's target currently stands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetSighting {
    pub id: EntityId,
    pub position: Vec3,
    pub alive: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enemy {
    pub body: Character,
    pub prefab: String,
    pub state: EnemyState,
    pub target: Option<EntityId>,
    pub attack_range: f32,
    /// Counts down after death; the enemy is removed when it reaches zero.
    pub despawn_timer: Option<f32>,
}

impl Enemy {
    /// A freshly spawned enemy already knows its target and starts chasing.
    pub fn spawn(id: EntityId, prefab: &EnemyPrefab, pose: Pose, target: Option<EntityId>) -> Self {
        Self {
            body: Character::new(id, CharacterKind::Enemy, prefab.stats.clone(), pose),
            prefab: prefab.name.clone(),
            state: if target.is_some() {
                EnemyState::Chase
            } else {
                EnemyState::Patrol
            },
            target,
            attack_range: prefab.attack_range,
            despawn_timer: None,
        }
    }

    pub fn id(&self) -> EntityId {
        self.body.id
    }

    pub fn is_dying(&self) -> bool {
        self.despawn_timer.is_some()
    }

    /// Run one step of the state machine. Returns a melee swing when the
    /// enemy attacks this tick.
    pub fn think(&mut self, sighting: Option<TargetSighting>, dt: f32) -> Option<MeleeStrike> {
        self.body.tick(dt);
        if !self.body.is_alive() {
            return None;
        }

        let Some(target) = sighting.filter(|s| Some(s.id) == self.target) else {
            self.state = EnemyState::Patrol;
            return None;
        };

        let in_reach = horizontal_distance(self.body.pose.position, target.position)
            <= self.attack_range;
        self.state = if in_reach {
            EnemyState::Attack
        } else {
            EnemyState::Chase
        };

        match self.state {
            EnemyState::Patrol => None,
            EnemyState::Chase => {
                self.approach(target.position, dt);
                None
            },
            EnemyState::Attack => {
                self.body.pose.rotation = yaw_towards(self.body.pose.position, target.position);
                if target.alive {
                    self.body.melee_attack()
                } else {
                    None
                }
            },
        }
    }

    /// Straight-line pursuit that stops at the edge of attack range.
    fn approach(&mut self, goal: Vec3, dt: f32) {
        let here = self.body.pose.position;
        self.body.pose.rotation = yaw_towards(here, goal);
        let offset = Vec3::new(goal.x - here.x, 0.0, goal.z - here.z);
        let distance = offset.length();
        if distance <= f32::EPSILON {
            return;
        }
        let step = (self.body.stats.move_speed * dt).min((distance - self.attack_range).max(0.0));
        self.body.pose.position += offset / distance * step;
    }

    /// Start the corpse timer. Returns false if the enemy was already dying.
    pub fn begin_dying(&mut self, linger: f32) -> bool {
        if self.is_dying() {
            return false;
        }
        self.despawn_timer = Some(linger);
        true
    }

    /// Count down the corpse timer. Returns true once the enemy should be
    /// removed.
    pub fn tick_corpse(&mut self, dt: f32) -> bool {
        match self.despawn_timer.as_mut() {
            Some(remaining) => {
                *remaining -= dt;
                *remaining <= 0.0
            },
            None => false,
        }
    }
}

fn horizontal_distance(a: Vec3, b: Vec3) -> f32 {
    let dx = a.x - b.x;
    let dz = a.z - b.z;
    (dx * dx + dz * dz).sqrt()
}
