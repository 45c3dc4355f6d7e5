//! Per-frame spring-damper integration of strand tips.
//!
//! Each call to [`StrandDynamics::step`] runs, for every strand:
//! 1. Spring force toward the anchor `head * rest_tip_local` with
//!    stiffness `k_anchor` (unit mass).
//! 2. Damped explicit Euler update of velocity, then of position.
//! 3. [`resolve_head_surface`]: push the tip out of the half-space below
//!    the tangent plane at the strand's root.
//! 4. [`resolve_colliders`]: push the tip out of every collider volume,
//!    working in the head's local frame.
//!
//! Strands never read each other, so the loop may run in parallel
//! (`parallel` feature).

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use glam::Vec3;

use crate::{
    collider::ColliderVolume, config::Config, strand::Strand, transform::HeadTransform,
};

/// Spring-damper integrator observing a set of collider volumes.
///
/// The volumes are borrowed, so they must outlive the integrator.
pub struct StrandDynamics<'c> {
    pub k_anchor: f32,
    pub damping: f32,
    colliders: Vec<&'c dyn ColliderVolume>,
}

impl<'c> StrandDynamics<'c> {
    pub fn new(k_anchor: f32, damping: f32) -> Self {
        Self {
            k_anchor,
            damping,
            colliders: Vec::new(),
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(cfg.k_anchor, cfg.damping)
    }

    pub fn add_collider(&mut self, collider: &'c dyn ColliderVolume) {
        self.colliders.push(collider);
    }

    pub fn with_colliders<C: ColliderVolume>(mut self, colliders: &'c [C]) -> Self {
        self.colliders
            .extend(colliders.iter().map(|c| c as &dyn ColliderVolume));
        self
    }

    pub fn colliders(&self) -> &[&'c dyn ColliderVolume] {
        &self.colliders
    }

    /// Advances every strand by `dt` seconds under the pose `head`.
    ///
    /// Negative `dt` is treated as zero, and a zero step leaves every
    /// strand untouched.
    pub fn step(&self, strands: &mut [Strand], dt: f32, head: &HeadTransform) {
        let dt = dt.max(0.0);
        if dt == 0.0 {
            return;
        }

        let inv = head.inverse();

        #[cfg(feature = "parallel")]
        strands
            .par_iter_mut()
            .for_each(|s| self.step_strand(s, dt, head, &inv));

        #[cfg(not(feature = "parallel"))]
        for s in strands.iter_mut() {
            self.step_strand(s, dt, head, &inv);
        }
    }

    fn step_strand(&self, s: &mut Strand, dt: f32, head: &HeadTransform, inv: &HeadTransform) {
        let anchor = head.transform_point(s.rest_tip_local());
        let force = (anchor - s.tip_position) * self.k_anchor;

        s.tip_velocity += (-s.tip_velocity * self.damping + force) * dt;
        let candidate = s.tip_position + s.tip_velocity * dt;

        let candidate = resolve_head_surface(candidate, s, head);
        s.tip_position = resolve_colliders(candidate, head, inv, &self.colliders);
    }
}

/// Keeps `candidate` on the outer side of the plane through the strand's
/// root, perpendicular to its world-space spawn direction.
///
/// A degenerate normal disables the correction.
pub fn resolve_head_surface(candidate: Vec3, strand: &Strand, head: &HeadTransform) -> Vec3 {
    let Some(normal) = head
        .transform_vector(strand.spawn_direction())
        .try_normalize()
    else {
        log::trace!("degenerate surface normal, skipping plane correction");
        return candidate;
    };

    let root = head.transform_point(strand.spawn_point());
    let d = (candidate - root).dot(normal);
    if d < 0.0 {
        candidate - d * normal
    } else {
        candidate
    }
}

/// Projects `p` out of every collider that contains it.
///
/// Colliders live in the head's local frame, so `p` is taken there with
/// `inv`, corrected against each volume in order, and mapped back.
pub fn resolve_colliders(
    p: Vec3,
    head: &HeadTransform,
    inv: &HeadTransform,
    colliders: &[&dyn ColliderVolume],
) -> Vec3 {
    if colliders.is_empty() {
        return p;
    }

    let mut local = inv.transform_point(p);
    for c in colliders {
        if c.contains(local) {
            local = c.project_surf(local);
        }
    }
    head.transform_point(local)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collider::SphereCollider;
    use approx::assert_abs_diff_eq;
    use glam::Quat;
    use std::f32::consts::FRAC_PI_2;

    const DT: f32 = 1.0 / 60.0;

    fn strand() -> Strand {
        Strand::new(Vec3::new(0.0, 1.0, 0.0), Vec3::Y, 0.5)
    }

    #[test]
    fn zero_dt_is_a_no_op_for_any_pose() {
        let mut strands = vec![strand(), Strand::new(Vec3::X, Vec3::X, 0.5)];
        strands[0].tip_velocity = Vec3::new(0.3, -0.2, 0.1);
        strands[1].tip_position = Vec3::new(0.2, 0.0, 0.0);
        let before = strands.clone();

        let colliders = [SphereCollider::new(Vec3::new(0.0, 1.5, 0.0), 1.0)];
        let dynamics = StrandDynamics::new(4.0, 1.5).with_colliders(&colliders);
        let head = HeadTransform::new(Quat::from_rotation_x(1.0), Vec3::new(3.0, 0.0, 0.0));

        dynamics.step(&mut strands, 0.0, &head);
        assert_eq!(strands, before);

        dynamics.step(&mut strands, -0.5, &head);
        assert_eq!(strands, before);
    }

    #[test]
    fn strand_at_rest_stays_at_rest() {
        let mut strands = vec![strand()];
        let dynamics = StrandDynamics::new(4.0, 1.5);

        for _ in 0..100 {
            dynamics.step(&mut strands, DT, &HeadTransform::IDENTITY);
        }
        assert_eq!(strands[0].tip_position, Vec3::new(0.0, 1.5, 0.0));
        assert_eq!(strands[0].tip_velocity, Vec3::ZERO);
    }

    #[test]
    fn single_step_matches_damped_euler() {
        let mut strands = vec![strand()];
        strands[0].tip_position = Vec3::new(1.0, 1.5, 0.0);
        strands[0].tip_velocity = Vec3::new(0.0, 0.0, 2.0);
        let dynamics = StrandDynamics::new(4.0, 1.5);

        dynamics.step(&mut strands, 0.1, &HeadTransform::IDENTITY);

        // force = (anchor - tip) * k = (-4, 0, 0)
        // v += (-v * 1.5 + force) * 0.1 = (0, 0, 2) + (-0.4, 0, -0.3)
        let v = Vec3::new(-0.4, 0.0, 1.7);
        assert_abs_diff_eq!(strands[0].tip_velocity.x, v.x, epsilon = 1e-6);
        assert_abs_diff_eq!(strands[0].tip_velocity.z, v.z, epsilon = 1e-6);
        let p = Vec3::new(1.0, 1.5, 0.0) + v * 0.1;
        assert_abs_diff_eq!(strands[0].tip_position.x, p.x, epsilon = 1e-6);
        assert_abs_diff_eq!(strands[0].tip_position.y, p.y, epsilon = 1e-6);
        assert_abs_diff_eq!(strands[0].tip_position.z, p.z, epsilon = 1e-6);
    }

    #[test]
    fn converges_to_anchor_under_identity() {
        let mut strands = vec![strand()];
        strands[0].tip_position = Vec3::new(0.4, 1.8, -0.3);
        let dynamics = StrandDynamics::new(4.0, 1.5);

        for _ in 0..3000 {
            dynamics.step(&mut strands, DT, &HeadTransform::IDENTITY);
        }

        let anchor = Vec3::new(0.0, 1.5, 0.0);
        assert!(strands[0].tip_position.distance(anchor) < 1e-4);
        assert!(strands[0].tip_velocity.length() < 1e-4);
    }

    #[test]
    fn follows_rotating_head_to_new_anchor() {
        let mut strands = vec![strand()];
        let dynamics = StrandDynamics::new(4.0, 1.5);
        let head = HeadTransform::from_rotation(Quat::from_rotation_z(FRAC_PI_2));

        for _ in 0..3000 {
            dynamics.step(&mut strands, DT, &head);
        }

        let anchor = head.transform_point(strands[0].rest_tip_local());
        assert_abs_diff_eq!(anchor.x, -1.5, epsilon = 1e-5);
        assert!(strands[0].tip_position.distance(anchor) < 1e-4);
    }

    #[test]
    fn head_surface_pushes_tip_out_of_half_space() {
        let s = strand();
        let head = HeadTransform::IDENTITY;

        let below = Vec3::new(0.2, 0.7, 0.0);
        let fixed = resolve_head_surface(below, &s, &head);
        assert_abs_diff_eq!(fixed.y, 1.0, epsilon = 1e-6);
        assert_eq!(fixed.x, 0.2);

        let above = Vec3::new(0.2, 1.3, 0.0);
        assert_eq!(resolve_head_surface(above, &s, &head), above);
    }

    #[test]
    fn head_surface_uses_world_normal() {
        let s = strand();
        let head = HeadTransform::new(Quat::from_rotation_z(FRAC_PI_2), Vec3::new(0.0, 0.0, 2.0));
        // Root maps to (-1, 0, 2), normal to (-1, 0, 0).
        let inside = Vec3::new(-0.5, 0.3, 2.0);
        let fixed = resolve_head_surface(inside, &s, &head);

        assert_abs_diff_eq!(fixed.x, -1.0, epsilon = 1e-5);
        assert_abs_diff_eq!(fixed.y, 0.3, epsilon = 1e-5);
    }

    #[test]
    fn tip_never_ends_below_root_plane_without_colliders() {
        let mut strands = vec![strand()];
        strands[0].tip_velocity = Vec3::new(0.0, -50.0, 0.0);
        let dynamics = StrandDynamics::new(4.0, 1.5);

        for _ in 0..50 {
            dynamics.step(&mut strands, DT, &HeadTransform::IDENTITY);
            assert!(strands[0].tip_position.y >= 1.0 - 1e-6);
        }
    }

    #[test]
    fn collider_at_anchor_keeps_tip_outside() {
        let radius = 0.2;
        let mut strands = vec![
            strand(),
            Strand::new(Vec3::new(1.0, 0.0, 0.0), Vec3::X, 0.5),
        ];
        // One sphere per strand, centered on its rest anchor.
        let colliders: Vec<SphereCollider> = strands
            .iter()
            .map(|s| SphereCollider::new(s.rest_tip_local(), radius))
            .collect();
        let dynamics = StrandDynamics::new(4.0, 1.5).with_colliders(&colliders);

        for _ in 0..2000 {
            dynamics.step(&mut strands, DT, &HeadTransform::IDENTITY);
        }

        for s in &strands {
            for c in &colliders {
                let d = s.tip_position.distance(c.center);
                assert!(d >= radius - 1e-4, "tip {d} from collider center");
            }
        }
    }

    #[test]
    fn colliders_are_resolved_in_head_frame() {
        let collider = SphereCollider::new(Vec3::new(0.0, 1.5, 0.0), 0.25);
        let colliders: [&dyn ColliderVolume; 1] = [&collider];
        let head = HeadTransform::new(Quat::from_rotation_z(FRAC_PI_2), Vec3::new(5.0, 0.0, 0.0));
        let inv = head.inverse();

        // World position of the collider center, nudged along world +y.
        let center_world = head.transform_point(collider.center);
        let p = center_world + Vec3::new(0.0, 0.1, 0.0);
        let out = resolve_colliders(p, &head, &inv, &colliders);

        assert_abs_diff_eq!(out.distance(center_world), 0.25, epsilon = 1e-5);
        assert_abs_diff_eq!(out.x, center_world.x, epsilon = 1e-5);
        assert!(out.y > center_world.y);
    }

    #[test]
    fn add_collider_registers_borrowed_volume() {
        let a = SphereCollider::default();
        let b = SphereCollider::new(Vec3::ONE, 0.5);
        let mut dynamics = StrandDynamics::from_config(&Config::default());
        dynamics.add_collider(&a);
        dynamics.add_collider(&b);

        assert_eq!(dynamics.colliders().len(), 2);
        assert_eq!(dynamics.k_anchor, Config::default().k_anchor);
        assert!(dynamics.colliders()[1].contains(Vec3::ONE));
    }
}
