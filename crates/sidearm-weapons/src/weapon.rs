use glam::Vec3;
use smallvec::SmallVec;

use sidearm_core::collab::{
    AudioOutput, ParticleEmitter, RandomSource, RayHit, RayQuery, TriggerInteraction,
    VisualEffect,
};
use sidearm_core::combatant::{CombatantLookup, EntityId};
use sidearm_core::math::Pose;

use crate::burst;
use crate::config::{ConfigError, WeaponConfig};
use crate::gate;
use crate::spread;
use crate::state::WeaponRuntimeState;
use crate::tracer::{TracerRecord, TracerTracker};
use crate::windup::{self, WindupPhase};

/// Something that happened to a weapon during one tick.
#[derive(Debug, Clone, PartialEq)]
pub enum WeaponEvent {
    /// A shot left the barrel. `shot` counts discharges since the trigger
    /// was last released, starting at 1.
    Discharged { shot: u32 },
    /// A projectile struck something. `damage` is zero when the target
    /// cannot take damage.
    ProjectileHit {
        target: Option<EntityId>,
        point: Vec3,
        damage: i32,
        killed: bool,
    },
    ProjectileMissed { direction: Vec3 },
}

pub type WeaponEvents = SmallVec<[WeaponEvent; 8]>;

/// Peripherals bolted onto a single weapon. Either may be absent.
#[derive(Default)]
pub struct WeaponRig {
    pub audio: Option<Box<dyn AudioOutput>>,
    pub particles: Option<Box<dyn ParticleEmitter>>,
}

impl WeaponRig {
    pub fn silent() -> Self {
        Self::default()
    }

    pub fn with_audio(mut self, audio: impl AudioOutput + 'static) -> Self {
        self.audio = Some(Box::new(audio));
        self
    }

    pub fn with_particles(mut self, particles: impl ParticleEmitter + 'static) -> Self {
        self.particles = Some(Box::new(particles));
        self
    }
}

/// Scene services and poses a weapon needs for one tick.
pub struct FireContext<'a> {
    /// The character holding the weapon. Firing stops when it dies.
    pub owner: EntityId,
    /// Origin and orientation of hit-test rays (usually the camera).
    pub aim: Pose,
    /// Where tracers start.
    pub muzzle: Pose,
    pub rays: &'a dyn RayQuery,
    pub combatants: &'a mut dyn CombatantLookup,
    pub rng: &'a mut dyn RandomSource,
    pub visuals: Option<&'a mut dyn VisualEffect>,
}

pub struct Weapon {
    config: WeaponConfig,
    state: WeaponRuntimeState,
    tracers: TracerTracker,
    rig: WeaponRig,
}

impl std::fmt::Debug for Weapon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Weapon")
            .field("config", &self.config.name)
            .field("state", &self.state)
            .field("tracers", &self.tracers.len())
            .finish_non_exhaustive()
    }
}

impl Weapon {
    pub fn new(config: WeaponConfig, rig: WeaponRig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            state: WeaponRuntimeState::new(&config),
            config,
            tracers: TracerTracker::default(),
            rig,
        })
    }

    pub fn config(&self) -> &WeaponConfig {
        &self.config
    }

    pub fn state(&self) -> &WeaponRuntimeState {
        &self.state
    }

    pub fn tracers(&self) -> &TracerTracker {
        &self.tracers
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn is_active(&self) -> bool {
        self.state.active
    }

    /// Enable or disable ticking. Disabling abandons any running burst or
    /// forced windup so the weapon comes back ungated.
    pub fn set_active(&mut self, active: bool) {
        if !active {
            burst::cancel(&mut self.state);
            if self.state.windup_in_progress() {
                self.state.windup = WindupPhase::Idle;
            }
        }
        self.state.active = active;
    }

    /// Replace the runtime state wholesale, as when loading a snapshot.
    /// Live tracers are kept.
    pub fn restore_state(&mut self, state: WeaponRuntimeState) {
        self.state = state;
        if self.config.use_looped_sound
            && let Some(audio) = self.rig.audio.as_mut()
        {
            audio.set_looping(self.state.fire_input);
        }
    }

    pub fn set_fire_input(&mut self, held: bool) {
        self.state.fire_input = held;
        if self.config.use_looped_sound
            && let Some(audio) = self.rig.audio.as_mut()
        {
            audio.set_looping(held);
        }
    }

    pub fn set_fire_blocked(&mut self, blocked: bool) {
        self.state.fire_blocked = blocked;
    }

    /// Fresh magazine, idle sequences and no tracers. The active flag is kept.
    pub fn reset(&mut self) {
        let active = self.state.active;
        self.state = WeaponRuntimeState::new(&self.config);
        self.state.active = active;
        self.tracers = TracerTracker::default();
        if self.config.use_looped_sound
            && let Some(audio) = self.rig.audio.as_mut()
        {
            audio.set_looping(false);
        }
    }

    /// Refill the magazine.
    pub fn reload(&mut self) {
        self.state.current_ammo = self.config.max_ammo;
    }

    /// Windup progress in `[0, 1]`. A weapon without windup is always ready.
    pub fn windup_fraction(&self) -> f32 {
        if self.config.fire_windup <= 0.0 {
            return 1.0;
        }
        (self.state.current_windup / self.config.fire_windup).clamp(0.0, 1.0)
    }

    /// Audio pitch that rises with windup.
    pub fn windup_pitch(&self) -> f32 {
        let t = self.windup_fraction();
        self.config.min_windup_pitch + (self.config.max_windup_pitch - self.config.min_windup_pitch) * t
    }

    /// Share of the fire interval still to wait, in `[0, 1]`.
    pub fn fire_interval_fraction(&self) -> f32 {
        if self.config.fire_interval <= 0.0 {
            return 0.0;
        }
        (self.state.fire_interval_remaining / self.config.fire_interval).clamp(0.0, 1.0)
    }

    /// Run one fixed step. Inactive weapons and non-positive steps do nothing.
    pub fn advance(&mut self, dt: f32, ctx: &mut FireContext<'_>) -> WeaponEvents {
        let mut events = WeaponEvents::new();
        if !self.state.active || !dt.is_finite() || dt <= 0.0 {
            return events;
        }

        let owner_alive = ctx.combatants.is_alive(ctx.owner);
        let gate_open = gate::can_fire(&self.state, &self.config, owner_alive);

        if burst::resume(&mut self.state, &self.config, dt) {
            self.discharge_burst_shot(dt, ctx, &mut events);
        }
        if windup::advance(&mut self.state, &self.config, gate_open, dt) {
            self.try_fire(dt, ctx, &mut events);
        }

        if self.state.fire_interval_remaining > 0.0 {
            self.state.fire_interval_remaining -= dt;
        }
        self.state.current_windup = self
            .state
            .current_windup
            .clamp(0.0, self.config.fire_windup);

        if let Some(visuals) = ctx.visuals.as_deref_mut() {
            self.tracers.advance(visuals);
        }
        events
    }

    fn try_fire(&mut self, dt: f32, ctx: &mut FireContext<'_>, events: &mut WeaponEvents) {
        if self.config.burst_count == 0 {
            self.fire_weapon(dt, ctx, events);
        } else if burst::begin(&mut self.state, &self.config) {
            self.discharge_burst_shot(dt, ctx, events);
        }
    }

    fn discharge_burst_shot(
        &mut self,
        dt: f32,
        ctx: &mut FireContext<'_>,
        events: &mut WeaponEvents,
    ) {
        self.fire_weapon(dt, ctx, events);
        self.state.current_burst_count += 1;
    }

    fn fire_weapon(&mut self, dt: f32, ctx: &mut FireContext<'_>, events: &mut WeaponEvents) {
        self.state.fire_interval_remaining = self.config.fire_interval;
        if let Some(particles) = self.rig.particles.as_mut() {
            particles.emit();
        }
        self.play_discharge_audio();

        self.state.times_fired = self.state.times_fired.saturating_add(1);
        if self.config.reset_windup_after_firing {
            self.state.current_windup = 0.0;
        }
        if self.config.max_ammo > 0 {
            self.state.current_ammo = self.state.current_ammo.saturating_sub(1);
        }
        events.push(WeaponEvent::Discharged {
            shot: self.state.times_fired,
        });
        tracing::debug!(
            weapon = %self.config.name,
            shot = self.state.times_fired,
            ammo = self.state.current_ammo,
            "Weapon discharged"
        );

        let count = self.config.projectiles_per_shot;
        for i in 0..count {
            let sample = if self.config.unified_spread {
                spread::unified_sample(i, count)
            } else {
                ctx.rng.sample_unit_disk()
            };
            let offset =
                spread::spread_offset(sample, self.config.min_spread, self.config.max_spread);
            let local = spread::local_aim(offset, self.config.max_range);
            let direction = ctx.aim.transform_direction(local);

            let hit = ctx.rays.cast(
                ctx.aim.position,
                direction,
                self.config.max_range,
                self.config.collision_mask,
                TriggerInteraction::Ignore,
            );
            match hit {
                Some(hit) => self.resolve_hit(hit, ctx, events),
                None => events.push(WeaponEvent::ProjectileMissed { direction }),
            }

            if !self.config.tracer {
                continue;
            }
            let start = ctx.muzzle.position;
            let end = hit.map_or_else(|| ctx.muzzle.transform_point(local), |h| h.point);
            if let Some(visuals) = ctx.visuals.as_deref_mut() {
                let handle = visuals.spawn_tracer(start, ctx.muzzle.rotation);
                self.tracers.push(TracerRecord::new(
                    handle,
                    start,
                    end,
                    self.config.tracer_speed,
                    dt,
                ));
            }
        }
    }

    fn resolve_hit(&self, hit: RayHit, ctx: &mut FireContext<'_>, events: &mut WeaponEvents) {
        let mut damage = 0;
        let mut killed = false;
        if let Some(target) = hit.target
            && let Some(combatant) = ctx.combatants.combatant_mut(target)
        {
            let change = combatant.apply_damage(self.config.damage.saturating_neg());
            damage = self.config.damage;
            killed = change.died();
            tracing::debug!(
                weapon = %self.config.name,
                target,
                damage,
                health = change.current,
                "Projectile hit"
            );
        }
        events.push(WeaponEvent::ProjectileHit {
            target: hit.target,
            point: hit.point,
            damage,
            killed,
        });
    }

    fn play_discharge_audio(&mut self) {
        let Some(audio) = self.rig.audio.as_mut() else {
            return;
        };
        let fire_clip = self.config.fire_clip.as_deref();
        match self.config.first_shot_clip.as_deref() {
            Some(first) if self.state.times_fired == 0 => {
                audio.play_one_shot(first);
                if let Some(clip) = fire_clip {
                    audio.play(clip);
                }
            },
            _ => {
                if let Some(clip) = fire_clip
                    && !self.config.use_looped_sound
                {
                    audio.play(clip);
                }
            },
        }
    }
}
