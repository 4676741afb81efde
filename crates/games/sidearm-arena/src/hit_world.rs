//! Headless stand-in for scene physics: characters are spheres, the floor
//! is an infinite horizontal plane.

use glam::{Quat, Vec3};
use smallvec::SmallVec;

use sidearm_core::collab::{LayerMask, OverlapQuery, RayHit, RayQuery, TriggerInteraction};
use sidearm_core::combatant::EntityId;

use crate::config::GROUND_LAYER;

/// Rays starting closer than this to a surface do not hit it.
const MIN_HIT_DISTANCE: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitVolume {
    pub id: EntityId,
    pub center: Vec3,
    pub radius: f32,
    pub layer: u8,
}

/// Snapshot of everything that can be hit during one tick.
#[derive(Debug, Clone, Default)]
pub struct HitWorld {
    volumes: SmallVec<[HitVolume; 16]>,
    ground_height: Option<f32>,
}

impl HitWorld {
    pub fn new(ground_height: Option<f32>) -> Self {
        Self {
            volumes: SmallVec::new(),
            ground_height,
        }
    }

    pub fn push(&mut self, volume: HitVolume) {
        self.volumes.push(volume);
    }

    pub fn volumes(&self) -> &[HitVolume] {
        &self.volumes
    }
}

impl RayQuery for HitWorld {
    fn cast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: LayerMask,
        _triggers: TriggerInteraction,
    ) -> Option<RayHit> {
        let dir = direction.normalize_or_zero();
        if dir == Vec3::ZERO {
            return None;
        }

        let mut nearest: Option<RayHit> = None;
        let mut consider = |distance: f32, target: Option<EntityId>| {
            if distance > MIN_HIT_DISTANCE
                && distance <= max_distance
                && nearest.is_none_or(|n| distance < n.distance)
            {
                nearest = Some(RayHit {
                    point: origin + dir * distance,
                    distance,
                    target,
                });
            }
        };

        for v in &self.volumes {
            if mask.contains(v.layer)
                && let Some(t) = ray_sphere_intersection(origin, dir, v.center, v.radius)
            {
                consider(t, Some(v.id));
            }
        }

        if let Some(height) = self.ground_height
            && mask.contains(GROUND_LAYER)
            && dir.y < 0.0
        {
            consider((height - origin.y) / dir.y, None);
        }

        nearest
    }
}

impl OverlapQuery for HitWorld {
    fn overlap_box(
        &self,
        center: Vec3,
        half_extents: Vec3,
        rotation: Quat,
        mask: LayerMask,
    ) -> Vec<EntityId> {
        let to_local = rotation.inverse();
        self.volumes
            .iter()
            .filter(|v| mask.contains(v.layer))
            .filter(|v| {
                let local = to_local * (v.center - center);
                let closest = local.clamp(-half_extents, half_extents);
                local.distance_squared(closest) <= v.radius * v.radius
            })
            .map(|v| v.id)
            .collect()
    }
}

/// Ray-sphere intersection. `dir` must be normalized. Returns the nearest
/// positive distance.
fn ray_sphere_intersection(origin: Vec3, dir: Vec3, center: Vec3, radius: f32) -> Option<f32> {
    let f = origin - center;
    let b = f.dot(dir);
    let c = f.length_squared() - radius * radius;
    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }

    let sqrt_d = discriminant.sqrt();
    let t1 = -b - sqrt_d;
    let t2 = -b + sqrt_d;
    if t1 > 0.0 {
        Some(t1)
    } else if t2 > 0.0 {
        Some(t2)
    } else {
        None
    }
}
