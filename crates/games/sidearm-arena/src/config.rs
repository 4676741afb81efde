use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use sidearm_core::collab::LayerMask;

/// Collision layer of the static ground.
pub const GROUND_LAYER: u8 = 0;
/// Collision layer of the player's hit volume.
pub const PLAYER_LAYER: u8 = 8;
/// Collision layer of enemy hit volumes.
pub const ENEMY_LAYER: u8 = 9;

/// Melee swing shape and strength, in the attacker's local frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeleeConfig {
    /// Full size of the hit box.
    pub bounds: Vec3,
    /// Hit box center relative to the attacker.
    pub offset: Vec3,
    pub damage: i32,
    /// Seconds between swings.
    pub cooldown: f32,
    pub mask: LayerMask,
}

impl Default for MeleeConfig {
    fn default() -> Self {
        Self {
            bounds: Vec3::new(1.2, 1.6, 1.4),
            offset: Vec3::new(0.0, 1.0, 0.9),
            damage: 10,
            cooldown: 1.0,
            mask: LayerMask::layer(PLAYER_LAYER),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterStats {
    pub max_health: i32,
    /// Units per second.
    pub move_speed: f32,
    /// Radius of the spherical hit volume.
    pub radius: f32,
    /// Height of the hit volume's center above the character's feet.
    pub center_height: f32,
    pub melee: MeleeConfig,
}

impl Default for CharacterStats {
    fn default() -> Self {
        Self {
            max_health: 100,
            move_speed: 4.0,
            radius: 0.5,
            center_height: 1.0,
            melee: MeleeConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub stats: CharacterStats,
    /// Degrees per second per unit of look input (yaw, pitch).
    pub look_speed: Vec2,
    pub eye_height: f32,
    /// Degrees added to the aim pitch.
    pub aim_pitch_offset: f32,
    pub spawn_position: Vec3,
    /// Tracer origin relative to the eye.
    pub muzzle_offset: Vec3,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            stats: CharacterStats {
                max_health: 100,
                move_speed: 6.0,
                melee: MeleeConfig {
                    damage: 20,
                    cooldown: 0.6,
                    mask: LayerMask::layer(ENEMY_LAYER),
                    ..MeleeConfig::default()
                },
                ..CharacterStats::default()
            },
            look_speed: Vec2::new(120.0, 90.0),
            eye_height: 1.6,
            aim_pitch_offset: 0.0,
            spawn_position: Vec3::ZERO,
            muzzle_offset: Vec3::new(0.25, -0.2, 0.5),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyPrefab {
    pub name: String,
    pub stats: CharacterStats,
    /// Distance at which the enemy stops chasing and starts swinging.
    pub attack_range: f32,
}

impl Default for EnemyPrefab {
    fn default() -> Self {
        Self {
            name: "grunt".to_string(),
            stats: CharacterStats {
                max_health: 30,
                move_speed: 3.5,
                ..CharacterStats::default()
            },
            attack_range: 1.8,
        }
    }
}

impl EnemyPrefab {
    pub fn brute() -> Self {
        Self {
            name: "brute".to_string(),
            stats: CharacterStats {
                max_health: 80,
                move_speed: 2.0,
                radius: 0.8,
                center_height: 1.2,
                melee: MeleeConfig {
                    bounds: Vec3::new(1.8, 2.0, 1.8),
                    offset: Vec3::new(0.0, 1.2, 1.2),
                    damage: 25,
                    cooldown: 1.8,
                    ..MeleeConfig::default()
                },
            },
            attack_range: 2.2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnPoint {
    pub position: Vec3,
    pub yaw_degrees: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnerConfig {
    /// Seconds between spawns.
    pub spawn_rate: f32,
    /// Enemies that may still be spawned. Each enemy death adds one back.
    pub spawn_count: u32,
    /// Added to the ground point found under a spawn point.
    pub spawn_offset: Vec3,
    /// How far below a spawn point to look for ground.
    pub probe_distance: f32,
    pub points: Vec<SpawnPoint>,
    pub prefabs: Vec<EnemyPrefab>,
}

impl Default for SpawnerConfig {
    fn default() -> Self {
        let corner = |x: f32, z: f32, yaw_degrees: f32| SpawnPoint {
            position: Vec3::new(x, 10.0, z),
            yaw_degrees,
        };
        Self {
            spawn_rate: 3.0,
            spawn_count: 15,
            spawn_offset: Vec3::ZERO,
            probe_distance: 100.0,
            points: vec![
                corner(-20.0, -20.0, 45.0),
                corner(20.0, -20.0, -45.0),
                corner(-20.0, 20.0, 135.0),
                corner(20.0, 20.0, -135.0),
            ],
            prefabs: vec![EnemyPrefab::default(), EnemyPrefab::brute()],
        }
    }
}

/// Data-driven configuration for the arena session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    pub player: PlayerConfig,
    pub spawner: SpawnerConfig,
    pub ground_height: f32,
    /// Seconds a dead enemy stays in the world before it is removed.
    pub corpse_linger_secs: f32,
    /// Zero means the round never ends on time.
    pub round_duration_secs: f32,
    /// Seed for spawn picks and spread.
    pub seed: u64,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            player: PlayerConfig::default(),
            spawner: SpawnerConfig::default(),
            ground_height: 0.0,
            corpse_linger_secs: 2.0,
            round_duration_secs: 0.0,
            seed: 0x5eed,
        }
    }
}

impl ArenaConfig {
    /// Load from `$SIDEARM_ARENA_CONFIG` or `config/arena.toml`, falling back
    /// to defaults.
    pub fn load() -> Self {
        let path = std::env::var("SIDEARM_ARENA_CONFIG")
            .ok()
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| "config/arena.toml".to_string());
        let Ok(contents) = std::fs::read_to_string(&path) else {
            tracing::info!("No {path} found, using defaults");
            return Self::default();
        };
        match Self::from_toml_str(&contents) {
            Ok(config) => {
                tracing::info!("Loaded arena configuration from {path}");
                config
            },
            Err(e) => {
                tracing::warn!("Failed to parse {path}: {e}, using defaults");
                Self::default()
            },
        }
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ArenaConfigError> {
        let config: Self =
            toml::from_str(contents).map_err(|e| ArenaConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ArenaConfigError> {
        validate_stats("player.stats", &self.player.stats)?;
        check(
            "player.look_speed",
            self.player.look_speed.is_finite(),
            "must be finite",
        )?;

        let spawner = &self.spawner;
        check(
            "spawner.spawn_rate",
            spawner.spawn_rate.is_finite() && spawner.spawn_rate >= 0.0,
            "must be >= 0",
        )?;
        check(
            "spawner.probe_distance",
            spawner.probe_distance.is_finite() && spawner.probe_distance > 0.0,
            "must be > 0",
        )?;
        if spawner.spawn_count > 0 {
            check(
                "spawner.points",
                !spawner.points.is_empty(),
                "must not be empty while spawn_count > 0",
            )?;
            check(
                "spawner.prefabs",
                !spawner.prefabs.is_empty(),
                "must not be empty while spawn_count > 0",
            )?;
        }
        for prefab in &spawner.prefabs {
            validate_stats("spawner.prefabs.stats", &prefab.stats)?;
            check(
                "spawner.prefabs.attack_range",
                prefab.attack_range.is_finite() && prefab.attack_range >= 0.0,
                "must be >= 0",
            )?;
        }

        check(
            "corpse_linger_secs",
            self.corpse_linger_secs.is_finite() && self.corpse_linger_secs >= 0.0,
            "must be >= 0",
        )?;
        check(
            "round_duration_secs",
            self.round_duration_secs.is_finite() && self.round_duration_secs >= 0.0,
            "must be >= 0",
        )
    }
}

fn validate_stats(field: &'static str, stats: &CharacterStats) -> Result<(), ArenaConfigError> {
    check(field, stats.max_health > 0, "max_health must be > 0")?;
    check(
        field,
        stats.move_speed.is_finite() && stats.move_speed >= 0.0,
        "move_speed must be >= 0",
    )?;
    check(
        field,
        stats.radius.is_finite() && stats.radius > 0.0,
        "radius must be > 0",
    )?;
    check(field, stats.melee.damage >= 0, "melee.damage must be >= 0")?;
    check(
        field,
        stats.melee.cooldown.is_finite() && stats.melee.cooldown >= 0.0,
        "melee.cooldown must be >= 0",
    )?;
    check(
        field,
        stats.melee.bounds.is_finite() && stats.melee.bounds.min_element() >= 0.0,
        "melee.bounds must be >= 0",
    )
}

fn check(field: &'static str, ok: bool, reason: &'static str) -> Result<(), ArenaConfigError> {
    if ok {
        Ok(())
    } else {
        Err(ArenaConfigError::Invalid { field, reason })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArenaConfigError {
    Parse(String),
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

impl std::fmt::Display for ArenaConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(e) => write!(f, "parse error: {e}"),
            Self::Invalid { field, reason } => write!(f, "{field}: {reason}"),
        }
    }
}

impl std::error::Error for ArenaConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(ArenaConfig::default().validate(), Ok(()));
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let toml = r#"
            seed = 42

            [spawner]
            spawn_rate = 1.5
            spawn_count = 4
        "#;
        let config = ArenaConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.seed, 42);
        assert_eq!(config.spawner.spawn_rate, 1.5);
        assert_eq!(config.spawner.spawn_count, 4);
        assert_eq!(config.spawner.points.len(), 4);
        assert_eq!(config.player, PlayerConfig::default());
    }

    #[test]
    fn spawner_without_points_rejected() {
        let toml = r#"
            [spawner]
            spawn_count = 3
            points = []
        "#;
        assert_eq!(
            ArenaConfig::from_toml_str(toml),
            Err(ArenaConfigError::Invalid {
                field: "spawner.points",
                reason: "must not be empty while spawn_count > 0",
            })
        );
    }

    #[test]
    fn exhausted_spawner_may_be_empty() {
        let config = ArenaConfig {
            spawner: SpawnerConfig {
                spawn_count: 0,
                points: Vec::new(),
                prefabs: Vec::new(),
                ..SpawnerConfig::default()
            },
            ..ArenaConfig::default()
        };
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn zero_health_player_rejected() {
        let mut config = ArenaConfig::default();
        config.player.stats.max_health = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn negative_melee_damage_rejected() {
        let mut config = ArenaConfig::default();
        config.player.stats.melee.damage = i32::MIN;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("melee.damage"), "{err}");

        let mut config = ArenaConfig::default();
        config.spawner.prefabs[0].stats.melee.damage = -5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn shipped_config_matches_defaults() {
        let shipped =
            ArenaConfig::from_toml_str(include_str!("../../../../config/arena.toml")).unwrap();
        assert_eq!(shipped.player, PlayerConfig::default());
        assert_eq!(shipped.spawner, SpawnerConfig::default());
        assert_eq!(shipped.corpse_linger_secs, 2.0);
    }

    #[test]
    fn bad_toml_is_parse_error() {
        assert!(matches!(
            ArenaConfig::from_toml_str("seed = \"abc\""),
            Err(ArenaConfigError::Parse(_))
        ));
    }
}
