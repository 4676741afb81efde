use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use sidearm_core::collab::{LayerMask, RandomSource, RayQuery, TriggerInteraction};
use sidearm_core::math::Pose;

use crate::config::{GROUND_LAYER, SpawnerConfig};

/// Where and what to spawn, decided by the spawner this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnRequest {
    /// Index into `SpawnerConfig::prefabs`.
    pub prefab: usize,
    pub pose: Pose,
}

/// Spawn timer and remaining budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnerState {
    pub timer: f32,
    pub remaining: u32,
}

impl SpawnerState {
    pub fn new(config: &SpawnerConfig) -> Self {
        Self {
            timer: 0.0,
            remaining: config.spawn_count,
        }
    }

    /// Advance the spawn timer. When a spawn is due, one unit of budget is
    /// spent even if no ground is found under the chosen point.
    pub fn tick(
        &mut self,
        config: &SpawnerConfig,
        dt: f32,
        rays: &dyn RayQuery,
        rng: &mut dyn RandomSource,
    ) -> Option<SpawnRequest> {
        self.timer += dt;
        if self.timer < config.spawn_rate
            || self.remaining == 0
            || config.prefabs.is_empty()
            || config.points.is_empty()
        {
            return None;
        }

        let prefab = rng.pick_index(config.prefabs.len());
        let point = config.points[rng.pick_index(config.points.len())];
        self.timer = 0.0;
        self.remaining -= 1;

        let hit = rays.cast(
            point.position,
            Vec3::NEG_Y,
            config.probe_distance,
            LayerMask::layer(GROUND_LAYER),
            TriggerInteraction::Ignore,
        );
        let Some(hit) = hit else {
            tracing::debug!(position = ?point.position, "No ground under spawn point");
            return None;
        };

        Some(SpawnRequest {
            prefab,
            pose: Pose::new(
                hit.point + config.spawn_offset,
                Quat::from_rotation_y(point.yaw_degrees.to_radians()),
            ),
        })
    }

    /// A spawned enemy died; it may be replaced.
    pub fn on_enemy_death(&mut self) {
        self.remaining = self.remaining.saturating_add(1);
    }
}
