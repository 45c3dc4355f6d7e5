//! Strand placement over the dark region of a mesh, and the read-only
//! views the renderer draws from.
//!
//! Placement is rejection sampling with a minimum-distance constraint:
//! 1. Extract the spawn triangles with
//!    [`sampler::extract_spawn_triangles`].
//! 2. For each attempt in the budget, pick a triangle uniformly, draw a
//!    point on it, and ask the [`KdTree`] for the nearest accepted root.
//! 3. Reject the point if that root is closer than `min_separation`;
//!    otherwise create a [`Strand`] there and insert the point.
//!
//! Rejected attempts are not retried, so a field can end up with fewer
//! strands than `max_num_spawns`.

use glam::Vec3;
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    config::Config,
    error::{HairError, Result},
    kdtree::KdTree,
    mesh::Mesh,
    sampler,
    strand::Strand,
    transform::HeadTransform,
    types::StrandId,
};

/// Most strands reserved for up front; the vectors grow past it if needed.
const MAX_PREALLOC: usize = 4096;

fn initial_capacity(max_num_spawns: usize) -> usize {
    max_num_spawns.min(MAX_PREALLOC)
}

/// Outcome counters of one placement run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlacementReport {
    /// Number of eligible triangles.
    pub spawn_triangles: usize,
    pub attempts: usize,
    pub accepted: usize,
    pub rejected: usize,
}

/// World-space root and tip of one strand, ready to draw.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StrandSegment {
    pub id: StrandId,
    pub root: Vec3,
    pub tip: Vec3,
}

/// The set of strands placed on a mesh.
#[derive(Clone, Debug)]
pub struct StrandField {
    pub strands: Vec<Strand>,
    hair_length: f32,
    report: PlacementReport,
}

impl StrandField {
    /// Places strands on the dark region of `mesh`.
    ///
    /// ### Parameters
    /// - `mesh` - Mesh snapshot; `None` is reported as an invalid mesh.
    /// - `cfg` - Supplies `hair_length`, `max_num_spawns`,
    ///   `color_threshold`, `min_separation`, and the ribbon settings.
    /// - `rng` - Drives triangle choice and point sampling.
    ///
    /// ### Returns
    /// - `Ok(field)` with at most `cfg.max_num_spawns` strands.
    /// - `Err(HairError::InvalidMesh)` for an absent or malformed mesh.
    /// - `Err(HairError::NoSpawnRegion)` if no triangle passes the threshold.
    /// - `Err(HairError::InvalidConfig)` if `cfg` fails validation.
    pub fn init(mesh: Option<&Mesh>, cfg: &Config, rng: &mut impl Rng) -> Result<Self> {
        cfg.validate()?;

        let faces = sampler::extract_spawn_triangles(mesh, cfg.color_threshold)?;
        if faces.is_empty() {
            return Err(HairError::NoSpawnRegion {
                threshold: cfg.color_threshold,
            });
        }

        let min_d2 = cfg.min_separation * cfg.min_separation;
        let capacity = initial_capacity(cfg.max_num_spawns);
        let mut index = KdTree::with_capacity(capacity);
        let mut strands = Vec::with_capacity(capacity);
        let mut report = PlacementReport {
            spawn_triangles: faces.len(),
            ..PlacementReport::default()
        };

        for _ in 0..cfg.max_num_spawns {
            report.attempts += 1;

            let tri = &faces[rng.random_range(0..faces.len())];
            let sample = sampler::sample_point(tri, rng);

            if let Some((_, d2)) = index.nearest(sample.point)
                && d2 < min_d2
            {
                report.rejected += 1;
                continue;
            }

            let mut strand = Strand::new(sample.point, sample.normal, cfg.hair_length);
            if cfg.ribbon {
                strand = strand.with_ribbon(cfg.ribbon_spread);
            }
            strands.push(strand);
            index.insert(sample.point);
            report.accepted += 1;
        }

        log::info!(
            "placed {} strands in {} attempts ({} rejected) over {} spawn triangles",
            report.accepted,
            report.attempts,
            report.rejected,
            report.spawn_triangles
        );

        Ok(Self {
            strands,
            hair_length: cfg.hair_length,
            report,
        })
    }

    /// Like [`StrandField::init`], seeding from `cfg.seed` when set and
    /// from the thread RNG otherwise.
    pub fn from_config(mesh: Option<&Mesh>, cfg: &Config) -> Result<Self> {
        match cfg.seed {
            Some(seed) => Self::init(mesh, cfg, &mut StdRng::seed_from_u64(seed)),
            None => Self::init(mesh, cfg, &mut rand::rng()),
        }
    }

    pub fn len(&self) -> usize {
        self.strands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strands.is_empty()
    }

    pub fn hair_length(&self) -> f32 {
        self.hair_length
    }

    pub fn report(&self) -> PlacementReport {
        self.report
    }

    /// Root in world space under `head`, and the simulated tip.
    pub fn segments<'a>(
        &'a self,
        head: &'a HeadTransform,
    ) -> impl Iterator<Item = StrandSegment> + 'a {
        self.strands
            .iter()
            .enumerate()
            .map(move |(id, s)| StrandSegment {
                id,
                root: head.transform_point(s.spawn_point()),
                tip: s.tip_position,
            })
    }

    /// Like [`StrandField::segments`], but every segment is drawn at the
    /// strand's rest length, pointing from the root toward the simulated tip.
    ///
    /// A tip sitting on its root keeps the rest direction.
    pub fn display_segments<'a>(
        &'a self,
        head: &'a HeadTransform,
    ) -> impl Iterator<Item = StrandSegment> + 'a {
        self.segments(head).map(move |seg| {
            let strand = &self.strands[seg.id];
            let dir = (seg.tip - seg.root)
                .try_normalize()
                .unwrap_or_else(|| head.transform_vector(strand.spawn_direction()));
            StrandSegment {
                tip: seg.root + dir * strand.rest_length(),
                ..seg
            }
        })
    }

    /// World-space points each tip is currently pulled toward.
    pub fn rest_anchors<'a>(&'a self, head: &'a HeadTransform) -> impl Iterator<Item = Vec3> + 'a {
        self.strands
            .iter()
            .map(move |s| head.transform_point(s.rest_tip_local()))
    }

    /// World-space ribbon anchor triples; empty unless placed in ribbon mode.
    pub fn ribbon_points<'a>(
        &'a self,
        head: &'a HeadTransform,
    ) -> impl Iterator<Item = [Vec3; 3]> + 'a {
        self.strands
            .iter()
            .filter_map(move |s| s.ribbon_points_local())
            .map(move |pts| pts.map(|p| head.transform_point(p)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use glam::Quat;

    fn two_tone_mesh() -> Mesh {
        Mesh::from_triangles(
            "two-tone",
            &[
                ([Vec3::ZERO, Vec3::X, Vec3::Y], Vec3::ZERO),
                (
                    [Vec3::new(5.0, 0.0, 0.0), Vec3::new(6.0, 0.0, 0.0), Vec3::new(5.0, 1.0, 0.0)],
                    Vec3::ONE,
                ),
            ],
        )
    }

    fn dark_head() -> Mesh {
        let mut mesh = Mesh::uv_sphere(1.0, 24, 32, Vec3::new(0.9, 0.75, 0.65));
        mesh.paint_cap(Vec3::Y, 0.3, Vec3::splat(0.1));
        mesh
    }

    fn cfg(max: usize, min_sep: f32) -> Config {
        Config {
            max_num_spawns: max,
            min_separation: min_sep,
            color_threshold: 0.5,
            ..Config::default()
        }
    }

    #[test]
    fn missing_mesh_fails_with_invalid_mesh() {
        let mut rng = StdRng::seed_from_u64(1);
        let err = StrandField::init(None, &cfg(10, 0.05), &mut rng).unwrap_err();
        assert!(matches!(err, HairError::InvalidMesh(_)));
    }

    #[test]
    fn all_bright_mesh_fails_with_no_spawn_region() {
        let mesh = Mesh::uv_sphere(1.0, 8, 8, Vec3::ONE);
        let mut rng = StdRng::seed_from_u64(1);
        let err = StrandField::init(Some(&mesh), &cfg(10, 0.05), &mut rng).unwrap_err();
        assert!(matches!(err, HairError::NoSpawnRegion { .. }));
    }

    #[test]
    fn single_attempt_lands_in_dark_triangle() {
        let mesh = two_tone_mesh();
        let mut rng = StdRng::seed_from_u64(3);
        let field = StrandField::init(Some(&mesh), &cfg(1, 0.05), &mut rng).unwrap();

        assert_eq!(field.len(), 1);
        let p = field.strands[0].spawn_point();
        // Dark triangle spans x >= 0, y >= 0, x + y <= 1 in the z = 0 plane.
        assert!(p.x >= 0.0 && p.y >= 0.0 && p.x + p.y <= 1.0 + 1e-6);
        assert_eq!(p.z, 0.0);
        assert_eq!(field.strands[0].spawn_direction(), Vec3::Z);
        assert_eq!(
            field.report(),
            PlacementReport {
                spawn_triangles: 1,
                attempts: 1,
                accepted: 1,
                rejected: 0,
            }
        );
    }

    #[test]
    fn separation_wider_than_region_keeps_one_strand() {
        let mesh = two_tone_mesh();
        let mut rng = StdRng::seed_from_u64(9);
        let field = StrandField::init(Some(&mesh), &cfg(100, 10.0), &mut rng).unwrap();

        assert_eq!(field.len(), 1);
        assert_eq!(field.report().attempts, 100);
        assert_eq!(field.report().rejected, 99);
    }

    #[test]
    fn accepted_roots_respect_min_separation() {
        let mesh = dark_head();
        let min_sep = 0.08;
        let mut rng = StdRng::seed_from_u64(11);
        let field = StrandField::init(Some(&mesh), &cfg(1500, min_sep), &mut rng).unwrap();

        assert!(field.len() > 10);
        assert!(field.len() < 1500);
        let report = field.report();
        assert_eq!(report.accepted + report.rejected, report.attempts);
        assert_eq!(report.accepted, field.len());

        for (i, a) in field.strands.iter().enumerate() {
            for b in &field.strands[i + 1..] {
                let d = a.spawn_point().distance(b.spawn_point());
                assert!(d >= min_sep - 1e-6, "roots {d} apart, expected >= {min_sep}");
            }
        }
    }

    #[test]
    fn strands_start_at_rest_along_surface_normal() {
        let mesh = dark_head();
        let mut rng = StdRng::seed_from_u64(5);
        let field = StrandField::init(Some(&mesh), &cfg(200, 0.05), &mut rng).unwrap();

        for s in &field.strands {
            assert_abs_diff_eq!(s.spawn_direction().length(), 1.0, epsilon = 1e-5);
            // On a unit sphere the interpolated normal points roughly outward.
            assert!(s.spawn_direction().dot(s.spawn_point().normalize()) > 0.9);
            assert!(s.spawn_point().y > 0.2);
            assert_eq!(s.tip_velocity, Vec3::ZERO);
            assert_abs_diff_eq!(
                s.tip_position.distance(s.spawn_point()),
                field.hair_length(),
                epsilon = 1e-5
            );
        }
    }

    #[test]
    fn same_seed_gives_same_field() {
        let mesh = dark_head();
        let c = Config {
            seed: Some(1234),
            ..cfg(300, 0.05)
        };
        let a = StrandField::from_config(Some(&mesh), &c).unwrap();
        let b = StrandField::from_config(Some(&mesh), &c).unwrap();

        assert_eq!(a.strands, b.strands);
    }

    #[test]
    fn ribbon_mode_attaches_anchor_directions() {
        let mesh = dark_head();
        let c = Config {
            ribbon: true,
            ..cfg(50, 0.05)
        };
        let mut rng = StdRng::seed_from_u64(2);
        let field = StrandField::init(Some(&mesh), &c, &mut rng).unwrap();

        assert!(field.strands.iter().all(|s| s.anchor_directions().is_some()));
        assert_eq!(
            field.ribbon_points(&HeadTransform::IDENTITY).count(),
            field.len()
        );

        let head = HeadTransform::new(Quat::from_rotation_x(0.8), Vec3::new(1.0, 0.0, 0.0));
        for ((pts, anchor), s) in field
            .ribbon_points(&head)
            .zip(field.rest_anchors(&head))
            .zip(&field.strands)
        {
            let normal = head.transform_vector(s.spawn_direction());
            for p in pts {
                assert_abs_diff_eq!((p - anchor).dot(normal), 0.0, epsilon = 1e-5);
                assert_abs_diff_eq!(p.distance(anchor), c.ribbon_spread, epsilon = 1e-5);
            }
        }
    }

    #[test]
    fn preallocation_is_capped_by_attempt_budget() {
        assert_eq!(initial_capacity(0), 0);
        assert_eq!(initial_capacity(400), 400);
        assert_eq!(initial_capacity(usize::MAX), MAX_PREALLOC);
    }

    #[test]
    fn large_attempt_budget_does_not_preallocate_it() {
        let mesh = two_tone_mesh();
        let mut rng = StdRng::seed_from_u64(8);
        let field = StrandField::init(Some(&mesh), &cfg(200_000, 10.0), &mut rng).unwrap();

        assert_eq!(field.len(), 1);
        assert_eq!(field.report().attempts, 200_000);
        assert!(field.strands.capacity() <= MAX_PREALLOC);
    }

    #[test]
    fn no_ribbon_points_without_ribbon_mode() {
        let mesh = dark_head();
        let mut rng = StdRng::seed_from_u64(2);
        let field = StrandField::init(Some(&mesh), &cfg(50, 0.05), &mut rng).unwrap();
        assert_eq!(field.ribbon_points(&HeadTransform::IDENTITY).count(), 0);
    }

    #[test]
    fn segments_follow_head_transform() {
        let mesh = dark_head();
        let mut rng = StdRng::seed_from_u64(4);
        let field = StrandField::init(Some(&mesh), &cfg(20, 0.05), &mut rng).unwrap();
        let head = HeadTransform::new(Quat::from_rotation_z(0.5), Vec3::new(0.0, 2.0, 0.0));

        for (seg, anchor) in field.segments(&head).zip(field.rest_anchors(&head)) {
            let s = &field.strands[seg.id];
            assert_eq!(seg.root, head.transform_point(s.spawn_point()));
            assert_eq!(seg.tip, s.tip_position);
            assert_eq!(anchor, head.transform_point(s.rest_tip_local()));
        }
    }

    #[test]
    fn display_segments_have_rest_length() {
        let mesh = dark_head();
        let mut rng = StdRng::seed_from_u64(4);
        let mut field = StrandField::init(Some(&mesh), &cfg(20, 0.05), &mut rng).unwrap();
        field.strands[0].tip_position += Vec3::new(3.0, 0.0, 0.0);
        let root = field.strands[1].spawn_point();
        field.strands[1].tip_position = root;

        let head = HeadTransform::IDENTITY;
        for seg in field.display_segments(&head) {
            assert_abs_diff_eq!(seg.root.distance(seg.tip), field.hair_length(), epsilon = 1e-5);
        }
    }
}
