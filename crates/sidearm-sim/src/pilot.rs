use glam::Vec3;

use sidearm_arena::config::PlayerConfig;
use sidearm_arena::{ArenaInput, ArenaState};

/// Aim error (degrees) under which the pilot pulls the trigger.
const FIRE_CONE_DEGREES: f32 = 3.0;
/// Horizontal distance under which the pilot swings instead of only shooting.
const MELEE_DISTANCE: f32 = 1.6;

/// Scripted stand-in for a human: turns towards the nearest living enemy,
/// shoots when lined up, swings when cornered and cycles weapons.
#[derive(Debug, Clone)]
pub struct Pilot {
    /// Seconds between weapon switches. Zero never switches.
    pub switch_every: f32,
    last_switch: f32,
}

impl Pilot {
    pub fn new(switch_every: f32) -> Self {
        Self {
            switch_every,
            last_switch: 0.0,
        }
    }

    pub fn decide(&mut self, state: &ArenaState, config: &PlayerConfig, dt: f32) -> ArenaInput {
        let player = &state.player;
        if player.respawn_pending {
            self.last_switch = 0.0;
            return ArenaInput {
                respawn: true,
                ..ArenaInput::default()
            };
        }

        let mut input = ArenaInput::default();
        if self.switch_every > 0.0 && state.elapsed - self.last_switch >= self.switch_every {
            self.last_switch = state.elapsed;
            input.switch_weapon = true;
        }

        let eye = player.body.pose.position + Vec3::Y * config.eye_height;
        let target = state
            .enemies
            .iter()
            .filter(|e| e.body.health.is_alive())
            .map(|e| e.body.volume_center())
            .min_by(|a, b| a.distance_squared(eye).total_cmp(&b.distance_squared(eye)));
        let Some(target) = target else {
            return input;
        };

        let to_target = target - eye;
        let flat = Vec3::new(to_target.x, 0.0, to_target.z).length();
        let want_yaw = to_target.x.atan2(to_target.z).to_degrees();
        let want_pitch = to_target.y.atan2(flat).to_degrees() - config.aim_pitch_offset;

        let yaw_error = wrap_degrees(want_yaw - player.look.x);
        let pitch_error = want_pitch - player.look.y;
        input.look_x = turn_rate(yaw_error, config.look_speed.x, dt);
        input.look_y = turn_rate(pitch_error, config.look_speed.y, dt);

        input.fire = yaw_error.abs() < FIRE_CONE_DEGREES && pitch_error.abs() < FIRE_CONE_DEGREES;
        input.melee = flat < MELEE_DISTANCE;
        input
    }
}

/// Look input that covers `error` degrees this tick, capped at full deflection.
fn turn_rate(error: f32, speed: f32, dt: f32) -> f32 {
    if speed <= 0.0 || dt <= 0.0 {
        return 0.0;
    }
    (error / (speed * dt)).clamp(-1.0, 1.0)
}

/// Map an angle into `[-180, 180)`.
fn wrap_degrees(angle: f32) -> f32 {
    let wrapped = (angle + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped.is_finite() { wrapped } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sidearm_arena::ArenaGame;
    use sidearm_arena::config::{ArenaConfig, SpawnerConfig};
    use sidearm_core::math::Pose;
    use sidearm_weapons::WeaponLoadout;

    fn quiet_game() -> ArenaGame {
        let config = ArenaConfig {
            spawner: SpawnerConfig {
                spawn_count: 0,
                ..SpawnerConfig::default()
            },
            ..ArenaConfig::default()
        };
        ArenaGame::with_config(config, WeaponLoadout::default()).unwrap()
    }

    #[test]
    fn wraps_into_half_open_range() {
        assert_eq!(wrap_degrees(190.0), -170.0);
        assert_eq!(wrap_degrees(-190.0), 170.0);
        assert_eq!(wrap_degrees(180.0), -180.0);
        assert_eq!(wrap_degrees(45.0), 45.0);
    }

    #[test]
    fn idle_without_enemies() {
        let game = quiet_game();
        let mut pilot = Pilot::new(0.0);
        let input = pilot.decide(game.state(), &game.config().player, 0.02);
        assert_eq!(input, ArenaInput::default());
    }

    #[test]
    fn turns_towards_enemy_on_the_right() {
        let mut game = quiet_game();
        game.spawn_enemy(0, Pose::from_position(Vec3::new(10.0, 0.0, 0.0)));
        let mut pilot = Pilot::new(0.0);
        let input = pilot.decide(game.state(), &game.config().player, 0.02);
        assert_eq!(input.look_x, 1.0);
        assert!(!input.fire, "not lined up yet");
        assert!(!input.melee);
    }

    #[test]
    fn fires_when_lined_up() {
        let mut game = quiet_game();
        let config = game.config().player.clone();
        // Straight ahead, with the hit volume center at eye height.
        game.spawn_enemy(
            0,
            Pose::from_position(Vec3::new(0.0, config.eye_height - 1.0, 10.0)),
        );
        let mut pilot = Pilot::new(0.0);
        let input = pilot.decide(game.state(), &config, 0.02);
        assert!(input.fire);
        assert!(input.look_x.abs() < 1e-4);
    }

    #[test]
    fn swings_at_close_enemies() {
        let mut game = quiet_game();
        game.spawn_enemy(0, Pose::from_position(Vec3::new(0.0, 0.0, 1.0)));
        let mut pilot = Pilot::new(0.0);
        assert!(pilot.decide(game.state(), &game.config().player, 0.02).melee);
    }

    #[test]
    fn switches_on_schedule() {
        let game = quiet_game();
        let mut state = game.state().clone();
        let mut pilot = Pilot::new(5.0);
        state.elapsed = 4.0;
        assert!(!pilot.decide(&state, &game.config().player, 0.02).switch_weapon);
        state.elapsed = 5.0;
        assert!(pilot.decide(&state, &game.config().player, 0.02).switch_weapon);
        state.elapsed = 6.0;
        assert!(!pilot.decide(&state, &game.config().player, 0.02).switch_weapon);
    }

    #[test]
    fn requests_respawn_after_death() {
        let game = quiet_game();
        let mut state = game.state().clone();
        state.player.respawn_pending = true;
        let input = Pilot::new(0.0).decide(&state, &game.config().player, 0.02);
        assert!(input.respawn);
        assert!(!input.fire);
    }
}
