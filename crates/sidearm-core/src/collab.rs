//! Narrow interfaces to the engine services the simulation does not own.
//!
//! Physics, rendering, audio and particle systems live outside this
//! workspace. Gameplay code reaches them only through these traits, so a
//! headless host, a test double, or a real engine binding can stand behind
//! each one.

use glam::{Quat, Vec2, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::combatant::EntityId;

/// Bit set of collision layers a query is allowed to touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerMask(pub u32);

impl Default for LayerMask {
    fn default() -> Self {
        Self::ALL
    }
}

impl LayerMask {
    pub const ALL: Self = Self(u32::MAX);
    pub const NONE: Self = Self(0);

    /// Mask containing exactly one layer.
    pub const fn layer(layer: u8) -> Self {
        Self(1 << (layer as u32 & 31))
    }

    pub fn contains(self, layer: u8) -> bool {
        self.0 & Self::layer(layer).0 != 0
    }

    pub fn with(self, layer: u8) -> Self {
        Self(self.0 | Self::layer(layer).0)
    }
}

/// Whether trigger volumes participate in a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TriggerInteraction {
    #[default]
    Ignore,
    Collide,
}

/// Result of a successful ray query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub point: Vec3,
    pub distance: f32,
    /// The object that was hit, if it is addressable by the simulation.
    /// Static geometry reports `None`.
    pub target: Option<EntityId>,
}

/// Hit-test service.
pub trait RayQuery {
    /// Cast a ray from `origin` along `direction` (need not be normalized).
    /// Returns the nearest hit within `max_distance`, or `None` on a miss.
    fn cast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: LayerMask,
        triggers: TriggerInteraction,
    ) -> Option<RayHit>;
}

/// Volume overlap service used by melee.
pub trait OverlapQuery {
    /// Entities whose volume intersects the oriented box.
    fn overlap_box(
        &self,
        center: Vec3,
        half_extents: Vec3,
        rotation: Quat,
        mask: LayerMask,
    ) -> Vec<EntityId>;
}

/// Source of gameplay randomness.
pub trait RandomSource {
    /// A point drawn uniformly from the unit disk.
    fn sample_unit_disk(&mut self) -> Vec2;

    /// A uniformly chosen index in `0..len`. `len` must be non-zero.
    fn pick_index(&mut self, len: usize) -> usize;
}

/// `RandomSource` over a seeded `StdRng`, reproducible for a given seed.
pub struct SeededRandom {
    rng: StdRng,
    seed: u64,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            seed,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl RandomSource for SeededRandom {
    fn sample_unit_disk(&mut self) -> Vec2 {
        // Rejection sampling keeps the distribution uniform over the area.
        loop {
            let x = self.rng.random_range(-1.0f32..=1.0);
            let y = self.rng.random_range(-1.0f32..=1.0);
            if x * x + y * y <= 1.0 {
                return Vec2::new(x, y);
            }
        }
    }

    fn pick_index(&mut self, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }
        self.rng.random_range(0..len)
    }
}

/// Opaque handle to a tracer visual owned by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TracerHandle(pub u64);

/// Tracer visuals. The presentation layer may destroy a tracer at any time;
/// `is_alive` is how the simulation notices.
pub trait VisualEffect {
    fn spawn_tracer(&mut self, position: Vec3, orientation: Quat) -> TracerHandle;
    fn is_alive(&self, handle: TracerHandle) -> bool;
    fn set_position(&mut self, handle: TracerHandle, position: Vec3);
}

/// Muzzle particle burst attached to a weapon.
pub trait ParticleEmitter {
    fn emit(&mut self);
}

/// Weapon-attached audio source.
pub trait AudioOutput {
    /// Fire-and-forget clip layered over whatever is playing.
    fn play_one_shot(&mut self, clip: &str);
    /// Replace the source's current clip and start it.
    fn play(&mut self, clip: &str);
    /// Toggle looping of the current clip.
    fn set_looping(&mut self, enable: bool);
}
