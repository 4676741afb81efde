use glam::Vec2;
use serde::{Deserialize, Serialize};
use sidearm_core::collab::LayerMask;

/// Tuning for a single weapon. Loaded once and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponConfig {
    pub name: String,
    /// Rounds per magazine. Zero means the weapon never runs dry.
    pub max_ammo: u32,
    /// Health removed from a combatant per projectile hit.
    pub damage: i32,
    pub projectiles_per_shot: u32,
    /// Seconds between discharges.
    pub fire_interval: f32,
    /// Hold through a full windup before the first shot, even if the
    /// trigger would otherwise fire immediately.
    pub force_first_shot: bool,
    /// Seconds of held input needed before the weapon fires.
    pub fire_windup: f32,
    /// Windup lost per second while the trigger is released.
    pub windup_decay: f32,
    pub reset_windup_after_firing: bool,
    pub max_range: f32,
    /// Spread projectiles over an even pattern instead of random samples.
    pub unified_spread: bool,
    pub min_spread: Vec2,
    pub max_spread: Vec2,
    /// Shots per burst. Zero fires continuously while held.
    pub burst_count: u32,
    pub burst_cooldown: f32,
    pub can_interrupt_burst: bool,
    /// Keep the trigger held after a burst so the next one starts on its own.
    pub can_auto_burst: bool,
    pub tracer: bool,
    /// Tracer travel speed in units per second.
    pub tracer_speed: f32,
    pub collision_mask: LayerMask,
    /// The fire clip loops while the trigger is held instead of playing per shot.
    pub use_looped_sound: bool,
    pub fire_clip: Option<String>,
    pub first_shot_clip: Option<String>,
    pub min_windup_pitch: f32,
    pub max_windup_pitch: f32,
}

impl Default for WeaponConfig {
    fn default() -> Self {
        Self {
            name: "rifle".to_string(),
            max_ammo: 0,
            damage: 10,
            projectiles_per_shot: 1,
            fire_interval: 0.1,
            force_first_shot: false,
            fire_windup: 0.0,
            windup_decay: 1.0,
            reset_windup_after_firing: false,
            max_range: 100.0,
            unified_spread: false,
            min_spread: Vec2::ZERO,
            max_spread: Vec2::ZERO,
            burst_count: 0,
            burst_cooldown: 0.0,
            can_interrupt_burst: false,
            can_auto_burst: false,
            tracer: true,
            tracer_speed: 200.0,
            collision_mask: LayerMask::ALL,
            use_looped_sound: false,
            fire_clip: Some("rifle_fire".to_string()),
            first_shot_clip: None,
            min_windup_pitch: 1.0,
            max_windup_pitch: 1.0,
        }
    }
}

impl WeaponConfig {
    /// Automatic rifle: continuous fire with a slight spread.
    pub fn rifle() -> Self {
        Self {
            min_spread: Vec2::splat(-0.5),
            max_spread: Vec2::splat(0.5),
            ..Self::default()
        }
    }

    pub fn shotgun() -> Self {
        Self {
            name: "shotgun".to_string(),
            max_ammo: 8,
            damage: 8,
            projectiles_per_shot: 8,
            fire_interval: 0.8,
            max_range: 30.0,
            unified_spread: true,
            min_spread: Vec2::splat(-3.0),
            max_spread: Vec2::splat(3.0),
            fire_clip: Some("shotgun_fire".to_string()),
            ..Self::default()
        }
    }

    /// Three-round burst that finishes even if the trigger is released.
    pub fn burst_carbine() -> Self {
        Self {
            name: "burst_carbine".to_string(),
            damage: 14,
            fire_interval: 0.08,
            burst_count: 3,
            burst_cooldown: 0.35,
            min_spread: Vec2::splat(-0.3),
            max_spread: Vec2::splat(0.3),
            fire_clip: Some("carbine_fire".to_string()),
            ..Self::default()
        }
    }

    /// Spins up before firing and keeps a looping fire sound while held.
    pub fn minigun() -> Self {
        Self {
            name: "minigun".to_string(),
            damage: 6,
            fire_interval: 0.04,
            fire_windup: 0.75,
            windup_decay: 0.5,
            min_spread: Vec2::splat(-1.2),
            max_spread: Vec2::splat(1.2),
            use_looped_sound: true,
            fire_clip: Some("minigun_loop".to_string()),
            first_shot_clip: Some("minigun_spinup".to_string()),
            min_windup_pitch: 0.6,
            max_windup_pitch: 1.4,
            ..Self::default()
        }
    }

    /// Charged single shot: the trigger must be held through the whole charge.
    pub fn charge_rifle() -> Self {
        Self {
            name: "charge_rifle".to_string(),
            damage: 60,
            fire_interval: 1.0,
            fire_windup: 0.6,
            windup_decay: 4.0,
            force_first_shot: true,
            reset_windup_after_firing: true,
            max_range: 200.0,
            tracer_speed: 400.0,
            fire_clip: Some("charge_release".to_string()),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let finite = [
            ("fire_interval", self.fire_interval),
            ("fire_windup", self.fire_windup),
            ("windup_decay", self.windup_decay),
            ("max_range", self.max_range),
            ("burst_cooldown", self.burst_cooldown),
            ("tracer_speed", self.tracer_speed),
            ("min_spread.x", self.min_spread.x),
            ("min_spread.y", self.min_spread.y),
            ("max_spread.x", self.max_spread.x),
            ("max_spread.y", self.max_spread.y),
            ("min_windup_pitch", self.min_windup_pitch),
            ("max_windup_pitch", self.max_windup_pitch),
        ];
        for (field, value) in finite {
            if !value.is_finite() {
                return Err(self.invalid(field, "must be finite"));
            }
        }

        for (field, value) in [
            ("fire_interval", self.fire_interval),
            ("fire_windup", self.fire_windup),
            ("windup_decay", self.windup_decay),
            ("burst_cooldown", self.burst_cooldown),
            ("tracer_speed", self.tracer_speed),
        ] {
            if value < 0.0 {
                return Err(self.invalid(field, "must be >= 0"));
            }
        }

        if self.damage < 0 {
            return Err(self.invalid("damage", "must be >= 0"));
        }
        if self.projectiles_per_shot == 0 {
            return Err(self.invalid("projectiles_per_shot", "must be > 0"));
        }
        if self.max_range <= 0.0 {
            return Err(self.invalid("max_range", "must be > 0"));
        }
        if self.min_spread.x > self.max_spread.x || self.min_spread.y > self.max_spread.y {
            return Err(self.invalid("min_spread", "must not exceed max_spread"));
        }
        Ok(())
    }

    fn invalid(&self, field: &'static str, reason: &'static str) -> ConfigError {
        ConfigError::Invalid {
            weapon: self.name.clone(),
            field,
            reason,
        }
    }
}

/// The weapons a player starts with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponLoadout {
    /// Index of the weapon that is active on spawn.
    pub start_index: usize,
    pub weapons: Vec<WeaponConfig>,
}

impl Default for WeaponLoadout {
    fn default() -> Self {
        Self {
            start_index: 0,
            weapons: vec![
                WeaponConfig::rifle(),
                WeaponConfig::shotgun(),
                WeaponConfig::burst_carbine(),
                WeaponConfig::minigun(),
            ],
        }
    }
}

impl WeaponLoadout {
    /// Load from `$SIDEARM_WEAPONS_CONFIG` or `config/weapons.toml`, falling
    /// back to the built-in loadout.
    pub fn load() -> Self {
        let path = std::env::var("SIDEARM_WEAPONS_CONFIG")
            .ok()
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| "config/weapons.toml".to_string());
        let Ok(contents) = std::fs::read_to_string(&path) else {
            tracing::info!("No {path} found, using default loadout");
            return Self::default();
        };
        match Self::from_toml_str(&contents) {
            Ok(loadout) => {
                tracing::info!(weapons = loadout.weapons.len(), "Loaded loadout from {path}");
                loadout
            },
            Err(e) => {
                tracing::warn!("Failed to parse {path}: {e}, using defaults");
                Self::default()
            },
        }
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let loadout: Self =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        loadout.validate()?;
        Ok(loadout)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.weapons.is_empty() {
            return Err(ConfigError::EmptyLoadout);
        }
        if self.start_index >= self.weapons.len() {
            return Err(ConfigError::StartIndexOutOfRange {
                index: self.start_index,
                len: self.weapons.len(),
            });
        }
        self.weapons.iter().try_for_each(WeaponConfig::validate)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Parse(String),
    Invalid {
        weapon: String,
        field: &'static str,
        reason: &'static str,
    },
    EmptyLoadout,
    StartIndexOutOfRange {
        index: usize,
        len: usize,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(e) => write!(f, "parse error: {e}"),
            Self::Invalid {
                weapon,
                field,
                reason,
            } => write!(f, "weapon '{weapon}': {field} {reason}"),
            Self::EmptyLoadout => write!(f, "loadout has no weapons"),
            Self::StartIndexOutOfRange { index, len } => {
                write!(f, "start index {index} out of range for {len} weapons")
            },
        }
    }
}

impl std::error::Error for ConfigError {}
