use glam::Vec3;
use serde::{Deserialize, Serialize};
use sidearm_core::collab::{TracerHandle, VisualEffect};

/// Below this start-to-end distance a tracer is treated as already arrived.
const MIN_TRACER_DISTANCE: f32 = 1e-4;

/// One in-flight tracer visual.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TracerRecord {
    pub handle: TracerHandle,
    pub start: Vec3,
    pub end: Vec3,
    /// Interpolation parameter. Keeps growing past 1 until the visual is
    /// gone; the drawn position stops at `end`.
    pub progress: f32,
    /// Progress added per tick.
    pub increment: f32,
}

impl TracerRecord {
    /// Increment is derived so the tracer covers `speed` units per `dt` tick.
    pub fn new(handle: TracerHandle, start: Vec3, end: Vec3, speed: f32, dt: f32) -> Self {
        let distance = start.distance(end);
        let (progress, increment) = if distance < MIN_TRACER_DISTANCE {
            (1.0, 0.0)
        } else {
            (0.0, speed * dt / distance)
        };
        Self {
            handle,
            start,
            end,
            progress,
            increment,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.start.lerp(self.end, self.progress.clamp(0.0, 1.0))
    }
}

/// Owns every tracer a weapon has spawned and moves them each tick.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TracerTracker {
    records: Vec<TracerRecord>,
}

impl TracerTracker {
    pub fn push(&mut self, record: TracerRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[TracerRecord] {
        &self.records
    }

    /// Move every live tracer one step and forget the ones whose visual was
    /// destroyed.
    pub fn advance(&mut self, visuals: &mut dyn VisualEffect) {
        self.records.retain_mut(|record| {
            if !visuals.is_alive(record.handle) {
                return false;
            }
            visuals.set_position(record.handle, record.position());
            record.progress += record.increment;
            true
        });
    }
}
