use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Position and orientation of something in the world.
///
/// Local space follows the usual game convention: +Z is forward, +Y is up,
/// +X is right.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Pose {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
        }
    }

    /// World-space forward (+Z) axis.
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::Z
    }

    /// Rotate a local-space direction into world space (no translation).
    pub fn transform_direction(&self, local: Vec3) -> Vec3 {
        self.rotation * local
    }

    /// Map a local-space point into world space.
    pub fn transform_point(&self, local: Vec3) -> Vec3 {
        self.position + self.rotation * local
    }
}

/// Rotation about +Y that turns the forward axis from `from` towards `to`.
///
/// Height difference is ignored so characters stay upright. Returns identity
/// when the two points coincide on the XZ plane.
pub fn yaw_towards(from: Vec3, to: Vec3) -> Quat {
    let dx = to.x - from.x;
    let dz = to.z - from.z;
    if dx * dx + dz * dz < 1e-8 {
        return Quat::IDENTITY;
    }
    Quat::from_rotation_y(dx.atan2(dz))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-5
    }

    #[test]
    fn identity_forward_is_z() {
        assert!(close(Pose::IDENTITY.forward(), Vec3::Z));
    }

    #[test]
    fn transform_point_applies_rotation_then_translation() {
        let pose = Pose::new(
            Vec3::new(1.0, 0.0, 0.0),
            Quat::from_rotation_y(std::f32::consts::FRAC_PI_2),
        );
        // +Z rotated 90 degrees about Y lands on +X.
        assert!(close(pose.transform_point(Vec3::Z), Vec3::new(2.0, 0.0, 0.0)));
        assert!(close(pose.transform_direction(Vec3::Z), Vec3::X));
    }

    #[test]
    fn yaw_towards_faces_target() {
        let from = Vec3::new(0.0, 1.0, 0.0);
        let to = Vec3::new(5.0, -3.0, 0.0);
        let rot = yaw_towards(from, to);
        assert!(close(rot * Vec3::Z, Vec3::X));
    }

    #[test]
    fn yaw_towards_same_point_is_identity() {
        assert_eq!(yaw_towards(Vec3::ONE, Vec3::new(1.0, 9.0, 1.0)), Quat::IDENTITY);
    }
}
