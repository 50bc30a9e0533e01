use nalgebra::{Isometry3, Point3, Translation3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

/// A 6-DOF position + orientation sample in world coordinates (meters).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Point3<f32>,
    #[serde(default = "UnitQuaternion::identity")]
    pub rotation: UnitQuaternion<f32>,
}

impl Pose {
    pub fn new(position: Point3<f32>, rotation: UnitQuaternion<f32>) -> Self {
        Self { position, rotation }
    }

    pub fn identity() -> Self {
        Self::new(Point3::origin(), UnitQuaternion::identity())
    }

    /// Pure translation, identity rotation.
    pub fn from_position(x: f32, y: f32, z: f32) -> Self {
        Self::new(Point3::new(x, y, z), UnitQuaternion::identity())
    }

    /// Translation plus intrinsic roll/pitch/yaw in radians.
    pub fn from_position_euler(position: Point3<f32>, roll: f32, pitch: f32, yaw: f32) -> Self {
        Self::new(position, UnitQuaternion::from_euler_angles(roll, pitch, yaw))
    }

    pub fn to_isometry(&self) -> Isometry3<f32> {
        Isometry3::from_parts(Translation3::from(self.position.coords), self.rotation)
    }

    /// Outward normal of the marker plane (local +Z) in world coordinates.
    pub fn normal(&self) -> Vector3<f32> {
        self.rotation * Vector3::z()
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

impl From<Isometry3<f32>> for Pose {
    fn from(iso: Isometry3<f32>) -> Self {
        Self::new(Point3::from(iso.translation.vector), iso.rotation)
    }
}
