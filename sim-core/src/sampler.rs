//! Spawn-region extraction and uniform random sampling on triangles.

use glam::Vec3;
use rand::Rng;

use crate::{
    error::{HairError, Result},
    mesh::{Mesh, Triangle},
};

/// A point drawn on a triangle together with its barycentric weights and
/// the interpolated unit normal at that point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceSample {
    pub point: Vec3,
    /// Weights of `v[0]`, `v[1]`, `v[2]`; non-negative, summing to 1.
    pub bary: Vec3,
    pub normal: Vec3,
}

/// Collects the triangles eligible for strand spawning.
///
/// A triangle is eligible when every one of its three corners has a mean
/// RGB value strictly below `threshold`; a single corner at or above the
/// threshold excludes it. Output order follows the mesh's triangle order.
///
/// ### Parameters
/// - `mesh` - Mesh snapshot, or `None` if the caller has no mesh.
/// - `threshold` - Darkness cutoff in `0..1`.
///
/// ### Returns
/// - `Ok(triangles)` - possibly empty list of eligible triangles.
/// - `Err(HairError::InvalidMesh)` if `mesh` is `None` or malformed.
pub fn extract_spawn_triangles(mesh: Option<&Mesh>, threshold: f32) -> Result<Vec<Triangle>> {
    let Some(mesh) = mesh else {
        return Err(HairError::InvalidMesh("no mesh provided".into()));
    };
    mesh.validate()?;

    let mut faces = Vec::new();
    let mut min_y = f32::MAX;
    let mut max_y = f32::MIN;

    for i in 0..mesh.triangle_count() {
        let idx = mesh.triangle_indices(i);
        if idx.iter().any(|&k| mesh.brightness(k) >= threshold) {
            continue;
        }

        let tri = mesh.triangle(i);
        for v in &tri.v {
            min_y = min_y.min(v.y);
            max_y = max_y.max(v.y);
        }
        faces.push(tri);
    }

    if faces.is_empty() {
        log::debug!(
            "mesh '{}': no spawn triangles below threshold {threshold}",
            mesh.name
        );
    } else {
        log::debug!(
            "mesh '{}': {} of {} triangles eligible, spawn region y in [{min_y:.3}, {max_y:.3}]",
            mesh.name,
            faces.len(),
            mesh.triangle_count()
        );
    }

    Ok(faces)
}

/// Folds two uniform numbers into barycentric weights covering the
/// triangle uniformly.
///
/// If `u + v > 1` the pair lies in the mirrored half of the unit
/// parallelogram and is reflected back with `u' = 1 - u`, `v' = 1 - v`.
/// The third weight is `1 - u' - v'`, clamped at zero against rounding.
/// Inputs outside `[0, 1]` are clamped first.
pub fn fold_barycentric(u: f32, v: f32) -> Vec3 {
    let mut u = u.clamp(0.0, 1.0);
    let mut v = v.clamp(0.0, 1.0);

    if u + v > 1.0 {
        u = 1.0 - u;
        v = 1.0 - v;
    }

    let c = (1.0 - (u + v)).max(0.0);
    Vec3::new(u, v, c)
}

/// Barycentric-weighted, re-normalized combination of the corner normals.
///
/// Falls back to the face normal, then to `+Y`, when the weighted sum
/// cancels out.
pub fn interpolate_normal(tri: &Triangle, bary: Vec3) -> Vec3 {
    let n = tri.n[0] * bary.x + tri.n[1] * bary.y + tri.n[2] * bary.z;
    n.try_normalize().unwrap_or_else(|| {
        log::trace!("degenerate interpolated normal at {bary:?}");
        (tri.v[1] - tri.v[0])
            .cross(tri.v[2] - tri.v[0])
            .try_normalize()
            .unwrap_or(Vec3::Y)
    })
}

/// Evaluates a sample from explicit `u, v` draws.
///
/// Deterministic counterpart of [`sample_point`]; useful for replaying a
/// specific draw.
pub fn sample_point_from_uv(tri: &Triangle, u: f32, v: f32) -> SurfaceSample {
    let bary = fold_barycentric(u, v);
    let point = tri.v[0] * bary.x + tri.v[1] * bary.y + tri.v[2] * bary.z;
    SurfaceSample {
        point,
        bary,
        normal: interpolate_normal(tri, bary),
    }
}

/// Draws a uniformly distributed point on `tri`.
///
/// ### Parameters
/// - `tri` - Triangle to sample.
/// - `rng` - Source of the two uniform draws in `[0, 1)`.
pub fn sample_point(tri: &Triangle, rng: &mut impl Rng) -> SurfaceSample {
    let u: f32 = rng.random();
    let v: f32 = rng.random();
    sample_point_from_uv(tri, u, v)
}
