//! Convex collision volumes that strand tips are kept out of.

use glam::Vec3;

/// A closed volume that can report containment and push points to its
/// boundary.
///
/// Positions are expressed in the head's local frame.
pub trait ColliderVolume: Send + Sync {
    fn contains(&self, p: Vec3) -> bool;

    /// Moves `p` onto the volume's surface.
    fn project_surf(&self, p: Vec3) -> Vec3;
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SphereCollider {
    pub center: Vec3,
    pub radius: f32,
}

impl Default for SphereCollider {
    fn default() -> Self {
        Self {
            center: Vec3::ZERO,
            radius: 1.0,
        }
    }
}

impl SphereCollider {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }
}

impl ColliderVolume for SphereCollider {
    /// Inclusive: points on the surface count as inside.
    #[inline]
    fn contains(&self, p: Vec3) -> bool {
        (p - self.center).length_squared() <= self.radius * self.radius
    }

    /// Pushes `p` out along the ray from the center.
    ///
    /// A point exactly at the center has no ray; it goes straight up.
    fn project_surf(&self, p: Vec3) -> Vec3 {
        let dir = (p - self.center).try_normalize().unwrap_or_else(|| {
            log::trace!("point at collider center {:?}, projecting along +Y", self.center);
            Vec3::Y
        });
        self.center + dir * self.radius
    }
}
