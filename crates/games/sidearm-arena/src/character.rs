use glam::{Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use sidearm_core::combatant::{Combatant, EntityId, Health, HealthChange, MeleeStrike};
use sidearm_core::math::Pose;

use crate::config::{CharacterStats, PlayerConfig};

/// Pitch is held inside this range (degrees) so the view never flips.
pub const PITCH_LIMIT_DEGREES: f32 = 85.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CharacterKind {
    Player,
    Enemy,
}

/// A body in the arena: health, movement stats, melee and a pose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub id: EntityId,
    pub kind: CharacterKind,
    pub pose: Pose,
    pub health: Health,
    pub stats: CharacterStats,
    /// Seconds until the next melee swing is allowed.
    pub melee_cooldown: f32,
}

impl Character {
    pub fn new(id: EntityId, kind: CharacterKind, stats: CharacterStats, pose: Pose) -> Self {
        Self {
            id,
            kind,
            pose,
            health: Health::full(stats.max_health),
            stats,
            melee_cooldown: 0.0,
        }
    }

    /// Center of the spherical hit volume.
    pub fn volume_center(&self) -> Vec3 {
        self.pose.position + Vec3::Y * self.stats.center_height
    }

    /// Count down timers that run whether or not the character acts.
    pub fn tick(&mut self, dt: f32) {
        self.melee_cooldown = (self.melee_cooldown - dt).max(0.0);
    }
}

impl Combatant for Character {
    fn id(&self) -> EntityId {
        self.id
    }

    fn health(&self) -> i32 {
        self.health.current
    }

    fn apply_damage(&mut self, change: i32) -> HealthChange {
        let result = self.health.apply(change);
        if result.died() {
            tracing::info!(id = self.id, kind = ?self.kind, "Character died");
        }
        result
    }

    fn melee_attack(&mut self) -> Option<MeleeStrike> {
        if !self.is_alive() || self.melee_cooldown > 0.0 {
            return None;
        }
        let melee = &self.stats.melee;
        self.melee_cooldown = melee.cooldown;
        Some(MeleeStrike {
            attacker: self.id,
            center: self.pose.transform_point(melee.offset),
            half_extents: melee.bounds / 2.0,
            rotation: self.pose.rotation,
            damage: melee.damage,
            mask: melee.mask,
        })
    }
}

/// The player-controlled character and its view angles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerCharacter {
    pub body: Character,
    /// Yaw (x) and pitch (y) in degrees.
    pub look: Vec2,
    /// Set on death; the session waits for a respawn request.
    pub respawn_pending: bool,
}

impl PlayerCharacter {
    pub fn spawn(id: EntityId, config: &PlayerConfig) -> Self {
        Self {
            body: Character::new(
                id,
                CharacterKind::Player,
                config.stats.clone(),
                Pose::from_position(config.spawn_position),
            ),
            look: Vec2::ZERO,
            respawn_pending: false,
        }
    }

    /// Turn by `look_input` scaled by look speed. Pitch is clamped, yaw wraps.
    pub fn look(&mut self, look_input: Vec2, config: &PlayerConfig, dt: f32) {
        self.look += look_input * config.look_speed * dt;
        self.look.y = self.look.y.clamp(-PITCH_LIMIT_DEGREES, PITCH_LIMIT_DEGREES);
        self.look.x %= 360.0;
        self.body.pose.rotation = Quat::from_rotation_y(self.look.x.to_radians());
    }

    /// Walk relative to the facing direction. `move_input` is (strafe, forward).
    pub fn walk(&mut self, move_input: Vec2, dt: f32) {
        let local = Vec3::new(move_input.x, 0.0, move_input.y).clamp_length_max(1.0);
        let velocity = self.body.pose.rotation * local * self.body.stats.move_speed;
        self.body.pose.position += velocity * dt;
    }

    /// Eye position looking along the current yaw and pitch.
    pub fn aim_pose(&self, config: &PlayerConfig) -> Pose {
        let pitch = (-self.look.y + config.aim_pitch_offset).to_radians();
        Pose::new(
            self.body.pose.position + Vec3::Y * config.eye_height,
            self.body.pose.rotation * Quat::from_rotation_x(pitch),
        )
    }

    pub fn muzzle_pose(&self, config: &PlayerConfig) -> Pose {
        let aim = self.aim_pose(config);
        Pose::new(aim.transform_point(config.muzzle_offset), aim.rotation)
    }
}
