pub mod character;
pub mod config;
pub mod enemy;
pub mod hit_world;
pub mod spawner;

use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use sidearm_core::collab::{OverlapQuery, SeededRandom};
use sidearm_core::combatant::{Combatant, CombatantLookup, EntityId, MeleeStrike};
use sidearm_core::game_trait::{
    GameConfig, GameEvent, GameMetadata, PlayerId, PlayerInputs, PlayerScore, Simulation,
};
use sidearm_core::math::Pose;
use sidearm_core::simulation_boilerplate;
use sidearm_weapons::{
    FireContext, InputPhase, LoadoutSnapshot, ManagerError, WeaponConfig, WeaponEvent,
    WeaponLoadout, WeaponManager, WeaponRig,
};

use character::{Character, PlayerCharacter};
use config::{ArenaConfig, ArenaConfigError, ENEMY_LAYER, PLAYER_LAYER};
use enemy::{Enemy, TargetSighting};
use hit_world::{HitVolume, HitWorld};
use spawner::SpawnerState;

/// The arena has a single human player. Its character shares the id.
pub const PLAYER_ID: PlayerId = 1;

/// What the HUD shows about the active weapon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponHud {
    pub index: usize,
    pub name: String,
    pub ammo: u32,
    /// Windup progress in `[0, 1]`.
    pub windup: f32,
    /// Share of the fire interval still to wait, in `[0, 1]`.
    pub fire_interval: f32,
    pub burst_firing: bool,
}

impl WeaponHud {
    fn capture(weapons: &WeaponManager) -> Self {
        let weapon = weapons.active();
        Self {
            index: weapons.active_index(),
            name: weapon.name().to_string(),
            ammo: weapon.state().current_ammo,
            windup: weapon.windup_fraction(),
            fire_interval: weapon.fire_interval_fraction(),
            burst_firing: weapon.state().burst_firing(),
        }
    }
}

/// Serializable session snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArenaState {
    pub elapsed: f32,
    pub player: PlayerCharacter,
    pub enemies: Vec<Enemy>,
    pub spawner: SpawnerState,
    pub score: i32,
    pub next_entity: EntityId,
    pub weapon: WeaponHud,
    /// Full weapon runtime; `weapon` is derived from it.
    pub loadout: LoadoutSnapshot,
    pub round_complete: bool,
}

impl ArenaState {
    fn new(config: &ArenaConfig, weapons: &WeaponManager) -> Self {
        Self {
            elapsed: 0.0,
            player: PlayerCharacter::spawn(PLAYER_ID, &config.player),
            enemies: Vec::new(),
            spawner: SpawnerState::new(&config.spawner),
            score: 0,
            next_entity: PLAYER_ID + 1,
            weapon: WeaponHud::capture(weapons),
            loadout: weapons.snapshot(),
            round_complete: false,
        }
    }
}

/// Input from the arena player.
///
/// Axes and `fire` describe the current frame. The remaining flags are
/// presses that must not be lost between frames.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArenaInput {
    /// Strafe, right positive.
    pub move_x: f32,
    /// Forward positive.
    pub move_z: f32,
    pub look_x: f32,
    pub look_y: f32,
    pub fire: bool,
    pub switch_weapon: bool,
    pub melee: bool,
    pub reload: bool,
    pub respawn: bool,
    /// Toggles pause.
    pub pause: bool,
}

impl ArenaInput {
    fn sanitize(&mut self) {
        for axis in [
            &mut self.move_x,
            &mut self.move_z,
            &mut self.look_x,
            &mut self.look_y,
        ] {
            if !axis.is_finite() {
                *axis = 0.0;
            }
        }
    }

    /// Fold a newer frame into this one: axes and fire follow the newest
    /// frame, presses accumulate.
    fn merge(&mut self, newer: ArenaInput) {
        self.move_x = newer.move_x;
        self.move_z = newer.move_z;
        self.look_x = newer.look_x;
        self.look_y = newer.look_y;
        self.fire = newer.fire;
        self.switch_weapon |= newer.switch_weapon;
        self.melee |= newer.melee;
        self.reload |= newer.reload;
        self.respawn |= newer.respawn;
        self.pause |= newer.pause;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArenaError {
    Config(ArenaConfigError),
    Weapons(ManagerError),
}

impl std::fmt::Display for ArenaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(e) => write!(f, "invalid arena config: {e}"),
            Self::Weapons(e) => write!(f, "invalid weapon loadout: {e}"),
        }
    }
}

impl std::error::Error for ArenaError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Weapons(e) => Some(e),
        }
    }
}

impl From<ArenaConfigError> for ArenaError {
    fn from(e: ArenaConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<ManagerError> for ArenaError {
    fn from(e: ManagerError) -> Self {
        Self::Weapons(e)
    }
}

/// Mutable view over every combatant in the arena, keyed by entity id.
struct Roster<'a> {
    player: &'a mut Character,
    enemies: &'a mut [Enemy],
}

impl<'a> Roster<'a> {
    fn new(state: &'a mut ArenaState) -> Self {
        Self {
            player: &mut state.player.body,
            enemies: &mut state.enemies,
        }
    }
}

impl CombatantLookup for Roster<'_> {
    fn combatant_mut(&mut self, id: EntityId) -> Option<&mut dyn Combatant> {
        if self.player.id == id {
            return Some(&mut *self.player as &mut dyn Combatant);
        }
        self.enemies
            .iter_mut()
            .find(|e| e.id() == id)
            .map(|e| &mut e.body as &mut dyn Combatant)
    }

    fn is_alive(&self, id: EntityId) -> bool {
        if self.player.id == id {
            return self.player.is_alive();
        }
        self.enemies
            .iter()
            .any(|e| e.id() == id && e.body.is_alive())
    }
}

fn volume_of(character: &Character, layer: u8) -> HitVolume {
    HitVolume {
        id: character.id,
        center: character.volume_center(),
        radius: character.stats.radius,
        layer,
    }
}

/// Single-player survival arena: waves of melee enemies against the
/// player's weapon loadout.
pub struct ArenaGame {
    state: ArenaState,
    config: ArenaConfig,
    weapons: WeaponManager,
    rng: SeededRandom,
    pending_input: Option<ArenaInput>,
    paused: bool,
    /// Seconds; zero means no time limit.
    round_duration: f32,
}

impl ArenaGame {
    /// Build from `config/arena.toml` and `config/weapons.toml` (or defaults).
    pub fn new() -> Result<Self, ArenaError> {
        Self::with_config(ArenaConfig::load(), WeaponLoadout::load())
    }

    /// Create an arena with explicit configuration and silent weapons.
    pub fn with_config(config: ArenaConfig, loadout: WeaponLoadout) -> Result<Self, ArenaError> {
        Self::with_rigs(config, loadout, |_| WeaponRig::silent())
    }

    /// Create an arena, asking `rig_for` for each weapon's audio and particles.
    pub fn with_rigs(
        config: ArenaConfig,
        loadout: WeaponLoadout,
        rig_for: impl FnMut(&WeaponConfig) -> WeaponRig,
    ) -> Result<Self, ArenaError> {
        config.validate()?;
        let weapons = WeaponManager::from_loadout(&loadout, rig_for)?;
        Ok(Self {
            state: ArenaState::new(&config, &weapons),
            rng: SeededRandom::new(config.seed),
            round_duration: config.round_duration_secs,
            config,
            weapons,
            pending_input: None,
            paused: false,
        })
    }

    pub fn state(&self) -> &ArenaState {
        &self.state
    }

    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    pub fn weapons(&self) -> &WeaponManager {
        &self.weapons
    }

    /// Restart the round after the player died. Does nothing while the
    /// player is alive.
    pub fn respawn(&mut self) {
        if !self.state.player.respawn_pending {
            return;
        }
        tracing::info!(score = self.state.score, "Player respawned, restarting arena");
        self.reset();
    }

    /// Place an enemy built from `spawner.prefabs[prefab]`, targeting the
    /// player. Returns `None` for an unknown prefab.
    pub fn spawn_enemy(&mut self, prefab: usize, pose: Pose) -> Option<EntityId> {
        let prefab = self.config.spawner.prefabs.get(prefab)?;
        let id = self.state.next_entity;
        self.state.next_entity += 1;
        self.state
            .enemies
            .push(Enemy::spawn(id, prefab, pose, Some(PLAYER_ID)));
        tracing::info!(enemy = id, prefab = %prefab.name, position = ?pose.position, "Enemy spawned");
        Some(id)
    }

    /// Bring the weapons in line with an incoming snapshot. Rejects
    /// snapshots taken with a different loadout.
    fn accept_state(&mut self, incoming: &ArenaState) -> bool {
        match self.weapons.restore(&incoming.loadout) {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(error = %e, "Dropped state snapshot for another loadout");
                false
            },
        }
    }

    fn reset(&mut self) {
        self.weapons.reset();
        self.rng = SeededRandom::new(self.config.seed);
        self.state = ArenaState::new(&self.config, &self.weapons);
        self.pending_input = None;
    }

    /// Everything a ray or overlap can touch this tick. Dead characters
    /// have no volume.
    fn hit_world(&self, exclude: Option<EntityId>, with_ground: bool) -> HitWorld {
        let mut world = HitWorld::new(with_ground.then_some(self.config.ground_height));
        let player = &self.state.player.body;
        if player.is_alive() && exclude != Some(player.id) {
            world.push(volume_of(player, PLAYER_LAYER));
        }
        for enemy in &self.state.enemies {
            if enemy.body.is_alive() && exclude != Some(enemy.id()) {
                world.push(volume_of(&enemy.body, ENEMY_LAYER));
            }
        }
        world
    }

    fn move_player(&mut self, input: &ArenaInput, dt: f32) {
        let player = &mut self.state.player;
        player.body.tick(dt);
        player.look(
            Vec2::new(input.look_x, input.look_y),
            &self.config.player,
            dt,
        );
        player.walk(Vec2::new(input.move_x, input.move_z), dt);
    }

    fn handle_weapon_input(&mut self, input: &ArenaInput, events: &mut Vec<GameEvent>) {
        if input.switch_weapon
            && let Some(index) = self.weapons.switch_weapon(InputPhase::Performed)
        {
            events.push(GameEvent::WeaponSwitched {
                player_id: PLAYER_ID,
                index,
            });
        }
        self.weapons.on_fire(input.fire);
        if input.reload {
            self.weapons.active_mut().reload();
        }
    }

    fn fire_weapon(&mut self, dt: f32, events: &mut Vec<GameEvent>) {
        let world = self.hit_world(Some(PLAYER_ID), true);
        let aim = self.state.player.aim_pose(&self.config.player);
        let muzzle = self.state.player.muzzle_pose(&self.config.player);

        let mut roster = Roster::new(&mut self.state);
        let mut ctx = FireContext {
            owner: PLAYER_ID,
            aim,
            muzzle,
            rays: &world,
            combatants: &mut roster,
            rng: &mut self.rng,
            visuals: None,
        };
        let fired = self.weapons.advance(dt, &mut ctx);

        for event in fired {
            if let WeaponEvent::Discharged { .. } = event {
                events.push(GameEvent::ShotFired {
                    player_id: PLAYER_ID,
                    weapon: self.weapons.active().name().to_string(),
                });
            }
        }
    }

    /// Collect this tick's melee swings (player and enemies), then apply
    /// them against one overlap snapshot. Nobody hits themselves.
    fn resolve_melee(&mut self, player_swings: bool, dt: f32) {
        let mut strikes: SmallVec<[MeleeStrike; 8]> = SmallVec::new();
        if player_swings {
            strikes.extend(self.state.player.body.melee_attack());
        }

        let player = &self.state.player.body;
        let sighting = TargetSighting {
            id: player.id,
            position: player.pose.position,
            alive: player.is_alive(),
        };
        for enemy in self.state.enemies.iter_mut().filter(|e| !e.is_dying()) {
            strikes.extend(enemy.think(Some(sighting), dt));
        }

        let world = self.hit_world(None, false);
        for strike in strikes {
            let touched =
                world.overlap_box(strike.center, strike.half_extents, strike.rotation, strike.mask);
            let mut roster = Roster::new(&mut self.state);
            for target in touched.into_iter().filter(|&t| t != strike.attacker) {
                if let Some(combatant) = roster.combatant_mut(target) {
                    let change = combatant.apply_damage(strike.damage.saturating_neg());
                    tracing::debug!(
                        attacker = strike.attacker,
                        target,
                        damage = strike.damage,
                        health = change.current,
                        "Melee hit"
                    );
                }
            }
        }
    }

    fn sweep_deaths(&mut self, dt: f32, events: &mut Vec<GameEvent>) {
        self.state.enemies.retain_mut(|e| !e.tick_corpse(dt));

        let linger = self.config.corpse_linger_secs;
        for enemy in &mut self.state.enemies {
            if enemy.body.is_alive() || !enemy.begin_dying(linger) {
                continue;
            }
            self.state.score += 1;
            self.state.spawner.on_enemy_death();
            tracing::info!(enemy = enemy.id(), score = self.state.score, "Enemy killed");
            events.push(GameEvent::EnemyKilled { enemy: enemy.id() });
            events.push(GameEvent::ScoreUpdate {
                player_id: PLAYER_ID,
                score: self.state.score,
            });
        }

        let player = &mut self.state.player;
        if !player.body.is_alive() && !player.respawn_pending {
            player.respawn_pending = true;
            self.weapons.on_fire(false);
            tracing::info!(score = self.state.score, "Player died, waiting for respawn");
            events.push(GameEvent::PlayerDied {
                player_id: PLAYER_ID,
            });
        }
    }

    fn run_spawner(&mut self, dt: f32, events: &mut Vec<GameEvent>) {
        let ground = HitWorld::new(Some(self.config.ground_height));
        let request =
            self.state
                .spawner
                .tick(&self.config.spawner, dt, &ground, &mut self.rng);
        if let Some(request) = request
            && let Some(enemy) = self.spawn_enemy(request.prefab, request.pose)
        {
            events.push(GameEvent::EnemySpawned { enemy });
        }
    }
}

impl Simulation for ArenaGame {
    fn metadata(&self) -> GameMetadata {
        let estimated = if self.round_duration > 0.0 {
            Duration::try_from_secs_f32(self.round_duration).unwrap_or(Duration::MAX)
        } else {
            Duration::from_secs(300)
        };
        GameMetadata {
            name: "Sidearm Arena".to_string(),
            description: "Hold out against endless melee enemies with a switchable loadout."
                .to_string(),
            estimated_round_duration: estimated,
        }
    }

    fn init(&mut self, config: &GameConfig) {
        self.round_duration = if config.round_duration.is_zero() {
            self.config.round_duration_secs
        } else {
            config.round_duration.as_secs_f32()
        };
        if let Some(seed) = config.custom.get("seed").and_then(|v| v.as_u64()) {
            self.config.seed = seed;
        }
        self.reset();
        self.paused = false;
    }

    fn update(&mut self, dt: f32, inputs: &PlayerInputs) -> Vec<GameEvent> {
        for (&player_id, input) in &inputs.inputs {
            self.apply_input(player_id, input);
        }
        if let Some(pending) = self.pending_input.as_mut()
            && std::mem::take(&mut pending.pause)
        {
            self.paused = !self.paused;
            tracing::info!(paused = self.paused, "Pause toggled by player");
        }
        if self.paused || self.state.round_complete || !dt.is_finite() || dt <= 0.0 {
            return Vec::new();
        }

        let input = self.pending_input.take().unwrap_or_default();
        if self.state.player.respawn_pending {
            if input.respawn {
                self.respawn();
            }
            return Vec::new();
        }

        let mut events = Vec::new();
        self.state.elapsed += dt;

        self.move_player(&input, dt);
        self.handle_weapon_input(&input, &mut events);
        self.fire_weapon(dt, &mut events);
        self.resolve_melee(input.melee, dt);
        self.sweep_deaths(dt, &mut events);
        self.run_spawner(dt, &mut events);
        self.state.weapon = WeaponHud::capture(&self.weapons);
        self.state.loadout = self.weapons.snapshot();

        if self.round_duration > 0.0 && self.state.elapsed >= self.round_duration {
            self.state.round_complete = true;
            tracing::info!(score = self.state.score, "Round complete");
            events.push(GameEvent::RoundComplete);
        }

        events
    }

    simulation_boilerplate!(state_type: ArenaState, accept_state: accept_state);

    fn apply_input(&mut self, player_id: PlayerId, input: &[u8]) {
        if player_id != PLAYER_ID {
            tracing::debug!(player_id, "Dropped input for unknown player");
            return;
        }
        match rmp_serde::from_slice::<ArenaInput>(input) {
            Err(e) => {
                tracing::debug!(player_id, error = %e, "Dropped malformed arena input");
            },
            Ok(mut ai) => {
                ai.sanitize();
                match self.pending_input.as_mut() {
                    Some(existing) => existing.merge(ai),
                    None => self.pending_input = Some(ai),
                }
            },
        }
    }

    fn is_round_complete(&self) -> bool {
        self.state.round_complete
    }

    fn round_results(&self) -> Vec<PlayerScore> {
        vec![PlayerScore {
            player_id: PLAYER_ID,
            score: self.state.score,
        }]
    }
}
