use glam::Vec3;

/// One simulated hair.
///
/// The root (`spawn_point`, `spawn_direction`) lives in the mesh's local
/// frame and is fixed at creation. The tip state lives in world space and
/// is advanced every frame by [`crate::dynamics::StrandDynamics::step`].
#[derive(Clone, Debug, PartialEq)]
pub struct Strand {
    spawn_point: Vec3,
    spawn_direction: Vec3,
    rest_length: f32,
    anchor_directions: Option<[Vec3; 3]>,
    ribbon_spread: f32,
    pub tip_position: Vec3,
    pub tip_velocity: Vec3,
}

impl Strand {
    /// Creates a strand at rest, its tip at `spawn_point + spawn_direction * rest_length`.
    ///
    /// `spawn_direction` is normalized here; a zero vector becomes `+Y`.
    pub fn new(spawn_point: Vec3, spawn_direction: Vec3, rest_length: f32) -> Self {
        let spawn_direction = spawn_direction.try_normalize().unwrap_or(Vec3::Y);
        Self {
            spawn_point,
            spawn_direction,
            rest_length,
            anchor_directions: None,
            ribbon_spread: 0.0,
            tip_position: spawn_point + spawn_direction * rest_length,
            tip_velocity: Vec3::ZERO,
        }
    }

    /// Attaches three ribbon anchor directions built by [`ribbon_directions`],
    /// with the anchor points `spread` away from the rest tip.
    pub fn with_ribbon(mut self, spread: f32) -> Self {
        self.anchor_directions = Some(ribbon_directions(self.spawn_direction));
        self.ribbon_spread = spread;
        self
    }

    pub fn spawn_point(&self) -> Vec3 {
        self.spawn_point
    }

    pub fn spawn_direction(&self) -> Vec3 {
        self.spawn_direction
    }

    pub fn rest_length(&self) -> f32 {
        self.rest_length
    }

    pub fn anchor_directions(&self) -> Option<&[Vec3; 3]> {
        self.anchor_directions.as_ref()
    }

    /// Rest position of the tip in the mesh's local frame.
    #[inline]
    pub fn rest_tip_local(&self) -> Vec3 {
        self.spawn_point + self.spawn_direction * self.rest_length
    }

    /// The three ribbon anchor points in the mesh's local frame, around the
    /// rest tip in the plane perpendicular to the spawn direction.
    pub fn ribbon_points_local(&self) -> Option<[Vec3; 3]> {
        let tip = self.rest_tip_local();
        self.anchor_directions
            .map(|dirs| dirs.map(|d| tip + d * self.ribbon_spread))
    }
}

/// Builds an orthonormal basis `(vi, vj, vk)` with `vk` along `axis`.
///
/// The reference axis is `+X` unless it is nearly parallel to `axis`
/// (`|x| > 0.99`), in which case `+Y` is used instead.
pub fn orthonormal_basis(axis: Vec3) -> (Vec3, Vec3, Vec3) {
    let vk = axis.try_normalize().unwrap_or(Vec3::Y);
    let reference = if vk.x.abs() > 0.99 { Vec3::Y } else { Vec3::X };
    let vi = reference.cross(vk).normalize();
    let vj = vk.cross(vi);
    (vi, vj, vk)
}

/// Three unit directions at 0, 120 and 240 degrees around `axis`, lying in
/// the `{vi, vj}` plane of [`orthonormal_basis`].
pub fn ribbon_directions(axis: Vec3) -> [Vec3; 3] {
    let (vi, vj, _) = orthonormal_basis(axis);
    [0.0_f32, 120.0, 240.0].map(|deg| {
        let (s, c) = deg.to_radians().sin_cos();
        vi * c + vj * s
    })
}
