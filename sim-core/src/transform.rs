use glam::{Affine3A, Mat4, Quat, Vec3, Vec4};

/// Rigid pose of the head: a rotation followed by a translation.
///
/// Pushed into the simulation once per frame and read-only while a step
/// runs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeadTransform {
    rotation: Quat,
    translation: Vec3,
    affine: Affine3A,
}

impl Default for HeadTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl HeadTransform {
    pub const IDENTITY: Self = Self {
        rotation: Quat::IDENTITY,
        translation: Vec3::ZERO,
        affine: Affine3A::IDENTITY,
    };

    /// Normalizes `rotation`; a zero or non-finite quaternion becomes the
    /// identity.
    pub fn new(rotation: Quat, translation: Vec3) -> Self {
        let rotation = Vec4::from(rotation)
            .try_normalize()
            .map_or(Quat::IDENTITY, Quat::from_vec4);
        Self {
            rotation,
            translation,
            affine: Affine3A::from_rotation_translation(rotation, translation),
        }
    }

    pub fn from_rotation(rotation: Quat) -> Self {
        Self::new(rotation, Vec3::ZERO)
    }

    /// Yaw about `+Y`, then pitch about `+X`, in radians.
    pub fn from_yaw_pitch(yaw: f32, pitch: f32, translation: Vec3) -> Self {
        Self::new(Quat::from_rotation_y(yaw) * Quat::from_rotation_x(pitch), translation)
    }

    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    pub fn translation(&self) -> Vec3 {
        self.translation
    }

    pub fn to_mat4(&self) -> Mat4 {
        Mat4::from(self.affine)
    }

    /// Maps a local-space point into world space.
    #[inline]
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        self.affine.transform_point3(p)
    }

    /// Applies only the linear (rotation) part to a direction.
    #[inline]
    pub fn transform_vector(&self, v: Vec3) -> Vec3 {
        self.affine.transform_vector3(v)
    }

    pub fn inverse(&self) -> Self {
        let rotation = self.rotation.inverse();
        Self::new(rotation, -(rotation * self.translation))
    }

    /// Maps a world-space point back into the head's local frame.
    #[inline]
    pub fn inverse_transform_point(&self, p: Vec3) -> Vec3 {
        self.rotation.inverse() * (p - self.translation)
    }
}
