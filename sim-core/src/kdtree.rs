//! Arena-backed 3-D k-d tree used to enforce root spacing during placement.
//!
//! Points are only ever inserted, never removed, so nodes live in a flat
//! `Vec` and refer to their children by [`NodeId`]. The splitting axis
//! cycles x, y, z with depth.

use crate::types::NodeId;
use glam::Vec3;

#[derive(Debug)]
pub struct KdNode {
    pub pos: Vec3,
    pub axis: usize,
    pub left: Option<NodeId>,
    pub right: Option<NodeId>,
}

#[derive(Debug, Default)]
pub struct KdTree {
    pub nodes: Vec<KdNode>,
}

impl KdNode {
    fn leaf(pos: Vec3, axis: usize) -> Self {
        Self {
            pos,
            axis,
            left: None,
            right: None,
        }
    }
}

impl KdTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Inserts a point and returns the id of its node.
    ///
    /// Walks down from the root comparing one coordinate per level, then
    /// hangs the new leaf off the last visited node. Points equal on the
    /// splitting coordinate go right.
    pub fn insert(&mut self, pos: Vec3) -> NodeId {
        let id = self.nodes.len();
        if self.nodes.is_empty() {
            self.nodes.push(KdNode::leaf(pos, 0));
            return id;
        }

        let mut cur = 0;
        loop {
            let node = &self.nodes[cur];
            let go_left = pos[node.axis] < node.pos[node.axis];
            let next = if go_left { node.left } else { node.right };
            match next {
                Some(child) => cur = child,
                None => {
                    let axis = (node.axis + 1) % 3;
                    self.nodes.push(KdNode::leaf(pos, axis));
                    let parent = &mut self.nodes[cur];
                    if go_left {
                        parent.left = Some(id);
                    } else {
                        parent.right = Some(id);
                    }
                    return id;
                }
            }
        }
    }

    /// Finds the stored point closest to `query`.
    ///
    /// ### Returns
    /// - `Some((id, d2))` - node id of the nearest point and its squared
    ///   distance to `query`.
    /// - `None` if the tree is empty.
    pub fn nearest(&self, query: Vec3) -> Option<(NodeId, f32)> {
        if self.nodes.is_empty() {
            return None;
        }

        let mut best = 0;
        let mut best_d2 = f32::INFINITY;

        // Each entry carries a lower bound on the squared distance from
        // `query` to anything in that subtree.
        let mut stack: Vec<(NodeId, f32)> = Vec::with_capacity(32);
        stack.push((0, 0.0));

        while let Some((id, bound)) = stack.pop() {
            if bound >= best_d2 {
                continue;
            }

            let node = &self.nodes[id];
            let d2 = node.pos.distance_squared(query);
            if d2 < best_d2 {
                best_d2 = d2;
                best = id;
            }

            let diff = query[node.axis] - node.pos[node.axis];
            let (near, far) = if diff < 0.0 {
                (node.left, node.right)
            } else {
                (node.right, node.left)
            };

            if let Some(far) = far {
                stack.push((far, bound.max(diff * diff)));
            }
            if let Some(near) = near {
                stack.push((near, bound));
            }
        }

        Some((best, best_d2))
    }

    /// Position of the point nearest to `query`, if any.
    pub fn nearest_point(&self, query: Vec3) -> Option<Vec3> {
        self.nearest(query).map(|(id, _)| self.nodes[id].pos)
    }

    pub fn points(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.nodes.iter().map(|n| n.pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng, rngs::StdRng};

    fn brute_force_nearest(points: &[Vec3], query: Vec3) -> Option<f32> {
        points
            .iter()
            .map(|p| p.distance_squared(query))
            .min_by(|a, b| a.total_cmp(b))
    }

    #[test]
    fn empty_tree_has_no_nearest() {
        let tree = KdTree::new();
        assert!(tree.is_empty());
        assert!(tree.nearest(Vec3::ZERO).is_none());
    }

    #[test]
    fn single_point_is_always_nearest() {
        let mut tree = KdTree::new();
        let id = tree.insert(Vec3::new(1.0, 2.0, 3.0));

        let (found, d2) = tree.nearest(Vec3::new(1.0, 2.0, 4.0)).unwrap();
        assert_eq!(found, id);
        assert_eq!(d2, 1.0);
    }

    #[test]
    fn insert_links_children_by_axis() {
        let mut tree = KdTree::new();
        tree.insert(Vec3::new(0.0, 0.0, 0.0));
        let l = tree.insert(Vec3::new(-1.0, 5.0, 0.0));
        let r = tree.insert(Vec3::new(1.0, -5.0, 0.0));
        let rl = tree.insert(Vec3::new(2.0, -6.0, 0.0));

        assert_eq!(tree.nodes[0].left, Some(l));
        assert_eq!(tree.nodes[0].right, Some(r));
        assert_eq!(tree.nodes[r].axis, 1);
        // Compared on y at depth 1: -6 < -5.
        assert_eq!(tree.nodes[r].left, Some(rl));
        assert_eq!(tree.nodes[rl].axis, 2);
    }

    #[test]
    fn nearest_matches_brute_force() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut tree = KdTree::with_capacity(2000);
        let mut points = Vec::with_capacity(2000);

        for _ in 0..2000 {
            let p = Vec3::new(
                rng.random_range(-1.0..1.0),
                rng.random_range(-1.0..1.0),
                rng.random_range(-1.0..1.0),
            );
            tree.insert(p);
            points.push(p);
        }

        for _ in 0..500 {
            let q = Vec3::new(
                rng.random_range(-1.5..1.5),
                rng.random_range(-1.5..1.5),
                rng.random_range(-1.5..1.5),
            );
            let (id, d2) = tree.nearest(q).unwrap();
            let expected = brute_force_nearest(&points, q).unwrap();
            assert_eq!(d2, expected);
            assert_eq!(tree.nodes[id].pos.distance_squared(q), expected);
        }
    }

    #[test]
    fn sorted_insertion_does_not_overflow() {
        let mut tree = KdTree::new();
        for i in 0..5000 {
            tree.insert(Vec3::splat(i as f32));
        }
        let p = tree.nearest_point(Vec3::splat(4321.2)).unwrap();
        assert_eq!(p, Vec3::splat(4321.0));
        assert_eq!(tree.len(), 5000);
    }

    #[test]
    fn duplicate_points_are_kept() {
        let mut tree = KdTree::new();
        tree.insert(Vec3::ONE);
        tree.insert(Vec3::ONE);

        assert_eq!(tree.len(), 2);
        assert_eq!(tree.nearest(Vec3::ONE).unwrap().1, 0.0);
        assert_eq!(tree.points().count(), 2);
    }
}
