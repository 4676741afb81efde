pub mod pilot;

use sidearm_arena::config::ArenaConfig;
use sidearm_arena::{ArenaError, ArenaGame, PLAYER_ID};
use sidearm_core::collab::AudioOutput;
use sidearm_core::game_trait::{GameConfig, GameEvent, PlayerInputs, Simulation};
use sidearm_core::time::FixedClock;
use sidearm_weapons::{WeaponLoadout, WeaponRig};

use pilot::Pilot;

/// Runner settings, overridable through `SIDEARM_SIM_*` environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct SimSettings {
    /// Simulated seconds to play.
    pub seconds: f32,
    /// Host frame length fed to the fixed-step clock.
    pub frame_secs: f32,
    /// Overrides the arena seed when set.
    pub seed: Option<u64>,
    /// Seconds between pilot weapon switches.
    pub switch_every: f32,
}

impl Default for SimSettings {
    fn default() -> Self {
        Self {
            seconds: 60.0,
            frame_secs: 1.0 / 60.0,
            seed: None,
            switch_every: 12.0,
        }
    }
}

impl SimSettings {
    pub fn from_env() -> Self {
        let mut settings = Self::default();
        if let Ok(val) = std::env::var("SIDEARM_SIM_SECONDS")
            && let Ok(n) = val.parse::<f32>()
            && n.is_finite()
            && n > 0.0
        {
            settings.seconds = n;
        }
        if let Ok(val) = std::env::var("SIDEARM_SIM_FRAME_SECS")
            && let Ok(n) = val.parse::<f32>()
            && n.is_finite()
            && n > 0.0
        {
            settings.frame_secs = n;
        }
        if let Ok(val) = std::env::var("SIDEARM_SIM_SEED")
            && let Ok(n) = val.parse::<u64>()
        {
            settings.seed = Some(n);
        }
        if let Ok(val) = std::env::var("SIDEARM_SIM_SWITCH_EVERY")
            && let Ok(n) = val.parse::<f32>()
            && n.is_finite()
            && n >= 0.0
        {
            settings.switch_every = n;
        }
        settings
    }
}

/// Audio sink that only traces what would have played.
struct TracingAudio {
    weapon: String,
}

impl AudioOutput for TracingAudio {
    fn play_one_shot(&mut self, clip: &str) {
        tracing::trace!(weapon = %self.weapon, clip, "play one-shot");
    }

    fn play(&mut self, clip: &str) {
        tracing::trace!(weapon = %self.weapon, clip, "play");
    }

    fn set_looping(&mut self, enable: bool) {
        tracing::trace!(weapon = %self.weapon, enable, "set looping");
    }
}

/// Tallies of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks: u64,
    pub shots: u32,
    pub spawns: u32,
    pub kills: u32,
    pub deaths: u32,
    pub score: i32,
}

impl RunSummary {
    fn record(&mut self, event: &GameEvent) {
        match event {
            GameEvent::ShotFired { .. } => self.shots += 1,
            GameEvent::EnemySpawned { .. } => self.spawns += 1,
            GameEvent::EnemyKilled { .. } => self.kills += 1,
            GameEvent::PlayerDied { .. } => self.deaths += 1,
            _ => {},
        }
    }
}

/// Play the arena headlessly for `settings.seconds` of simulated time.
pub fn run(
    settings: &SimSettings,
    arena: ArenaConfig,
    loadout: WeaponLoadout,
) -> Result<RunSummary, ArenaError> {
    let mut game = ArenaGame::with_rigs(arena, loadout, |weapon| {
        WeaponRig::silent().with_audio(TracingAudio {
            weapon: weapon.name.clone(),
        })
    })?;

    let mut game_config = GameConfig::default();
    if let Some(seed) = settings.seed {
        game_config.custom.insert("seed".to_string(), seed.into());
    }
    game.init(&game_config);

    let hz = game.tick_rate();
    let mut clock = FixedClock::from_hz(hz);
    let dt = clock.step();
    let target = (settings.seconds * hz).round() as u64;
    let mut pilot = Pilot::new(settings.switch_every);
    let mut summary = RunSummary::default();

    'frames: while summary.ticks < target {
        let due = clock.tick(settings.frame_secs);
        for _ in 0..due {
            if summary.ticks >= target || game.is_round_complete() {
                break 'frames;
            }
            let input = pilot.decide(game.state(), &game.config().player, dt);
            let mut inputs = PlayerInputs::default();
            match rmp_serde::to_vec(&input) {
                Ok(bytes) => {
                    inputs.inputs.insert(PLAYER_ID, bytes);
                },
                Err(e) => tracing::warn!(error = %e, "Failed to encode pilot input"),
            }

            for event in game.update(dt, &inputs) {
                tracing::debug!(tick = summary.ticks, ?event, "Game event");
                summary.record(&event);
            }
            summary.ticks += 1;
        }
    }

    summary.score = game
        .round_results()
        .first()
        .map_or(0, |result| result.score);
    Ok(summary)
}
