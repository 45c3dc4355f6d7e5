//! Read-only triangle mesh snapshot consumed by the surface sampler.
//!
//! Loading meshes from asset files is left to the caller; this module only
//! holds the vertex attributes and flat index list the sampler needs, plus
//! a procedural sphere used as a stand-in head.

use std::f32::consts::{PI, TAU};

use glam::Vec3;

use crate::error::{HairError, Result};

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }
}

/// One triangle with its corner positions and normals.
///
/// Built on demand while sampling and never retained by the mesh.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Triangle {
    pub v: [Vec3; 3],
    pub n: [Vec3; 3],
}

impl Triangle {
    pub fn new(v: [Vec3; 3], n: [Vec3; 3]) -> Self {
        Self { v, n }
    }

    pub fn area(&self) -> f32 {
        (self.v[1] - self.v[0]).cross(self.v[2] - self.v[0]).length() * 0.5
    }
}

/// Indexed triangle mesh with per-vertex normals and colors.
///
/// Colors are RGB in `0..1`. `indices` holds three entries per triangle.
#[derive(Clone, Debug, Default)]
pub struct Mesh {
    pub name: String,
    pub vertices: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub colors: Vec<Vec3>,
    pub indices: Vec<u32>,
    pub bbox: Aabb,
}

impl Mesh {
    /// Creates a mesh from raw attribute arrays and computes its bounding box.
    pub fn new(
        name: impl Into<String>,
        vertices: Vec<Vec3>,
        normals: Vec<Vec3>,
        colors: Vec<Vec3>,
        indices: Vec<u32>,
    ) -> Self {
        let mut mesh = Self {
            name: name.into(),
            vertices,
            normals,
            colors,
            indices,
            bbox: Aabb::default(),
        };
        mesh.calc_bbox();
        mesh
    }

    /// Builds an unindexed mesh where every triangle has a single flat color.
    ///
    /// Normals are the face normals of each triangle.
    pub fn from_triangles(name: impl Into<String>, tris: &[([Vec3; 3], Vec3)]) -> Self {
        let mut vertices = Vec::with_capacity(tris.len() * 3);
        let mut normals = Vec::with_capacity(tris.len() * 3);
        let mut colors = Vec::with_capacity(tris.len() * 3);

        for (corners, color) in tris {
            let n = (corners[1] - corners[0])
                .cross(corners[2] - corners[0])
                .try_normalize()
                .unwrap_or(Vec3::Y);
            for &c in corners {
                vertices.push(c);
                normals.push(n);
                colors.push(*color);
            }
        }

        let indices = (0..vertices.len() as u32).collect();
        Self::new(name, vertices, normals, colors, indices)
    }

    /// Builds a UV sphere centered at the origin with a uniform color.
    ///
    /// Pole rows emit a single triangle per slice so no zero-area triangles
    /// are produced.
    ///
    /// ### Parameters
    /// - `radius` - Sphere radius.
    /// - `stacks` - Number of latitude bands (clamped to at least 2).
    /// - `slices` - Number of longitude bands (clamped to at least 3).
    /// - `color` - Color assigned to every vertex.
    pub fn uv_sphere(radius: f32, stacks: u32, slices: u32, color: Vec3) -> Self {
        let stacks = stacks.max(2);
        let slices = slices.max(3);
        let ring = slices + 1;

        let mut vertices = Vec::with_capacity(((stacks + 1) * ring) as usize);
        let mut normals = Vec::with_capacity(vertices.capacity());

        for i in 0..=stacks {
            let phi = PI * i as f32 / stacks as f32;
            for j in 0..=slices {
                let theta = TAU * j as f32 / slices as f32;
                let n = Vec3::new(phi.sin() * theta.cos(), phi.cos(), phi.sin() * theta.sin());
                normals.push(n);
                vertices.push(n * radius);
            }
        }

        let mut indices = Vec::with_capacity((stacks * slices * 6) as usize);
        for i in 0..stacks {
            for j in 0..slices {
                let a = i * ring + j;
                let b = a + ring;
                if i != 0 {
                    indices.extend_from_slice(&[a, a + 1, b]);
                }
                if i != stacks - 1 {
                    indices.extend_from_slice(&[a + 1, b + 1, b]);
                }
            }
        }

        let colors = vec![color; vertices.len()];
        Self::new("head", vertices, normals, colors, indices)
    }

    /// Recolors every vertex whose direction from the bbox center lies
    /// within a cone around `axis`.
    ///
    /// ### Parameters
    /// - `axis` - Cone axis; need not be normalized.
    /// - `min_cos` - Cosine of the cone half-angle.
    /// - `color` - New color for vertices inside the cone.
    ///
    /// ### Returns
    /// The number of recolored vertices.
    pub fn paint_cap(&mut self, axis: Vec3, min_cos: f32, color: Vec3) -> usize {
        let axis = axis.try_normalize().unwrap_or(Vec3::Y);
        let center = self.bbox.center();
        let mut painted = 0;
        for (v, c) in self.vertices.iter().zip(self.colors.iter_mut()) {
            let Some(dir) = (*v - center).try_normalize() else {
                continue;
            };
            if dir.dot(axis) >= min_cos {
                *c = color;
                painted += 1;
            }
        }
        painted
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Checks that the attribute arrays and index list are consistent.
    pub fn validate(&self) -> Result<()> {
        if self.vertices.is_empty() || self.indices.is_empty() {
            return Err(HairError::InvalidMesh(format!(
                "mesh '{}' has no geometry",
                self.name
            )));
        }
        if self.normals.len() != self.vertices.len() {
            return Err(HairError::InvalidMesh(format!(
                "mesh '{}' has {} normals for {} vertices",
                self.name,
                self.normals.len(),
                self.vertices.len()
            )));
        }
        if self.colors.len() != self.vertices.len() {
            return Err(HairError::InvalidMesh(format!(
                "mesh '{}' has {} colors for {} vertices",
                self.name,
                self.colors.len(),
                self.vertices.len()
            )));
        }
        if self.indices.len() % 3 != 0 {
            return Err(HairError::InvalidMesh(format!(
                "mesh '{}' index count {} is not a multiple of 3",
                self.name,
                self.indices.len()
            )));
        }
        if let Some(&bad) = self
            .indices
            .iter()
            .find(|&&i| i as usize >= self.vertices.len())
        {
            return Err(HairError::InvalidMesh(format!(
                "mesh '{}' index {bad} out of range",
                self.name
            )));
        }
        Ok(())
    }

    /// Returns the vertex indices of triangle `i`.
    ///
    /// ### Panics
    /// Panics if `i >= self.triangle_count()`.
    #[inline]
    pub fn triangle_indices(&self, i: usize) -> [usize; 3] {
        [
            self.indices[i * 3] as usize,
            self.indices[i * 3 + 1] as usize,
            self.indices[i * 3 + 2] as usize,
        ]
    }

    /// Assembles triangle `i` from the vertex arrays.
    pub fn triangle(&self, i: usize) -> Triangle {
        let idx = self.triangle_indices(i);
        Triangle {
            v: idx.map(|k| self.vertices[k]),
            n: idx.map(|k| self.normals[k]),
        }
    }

    /// Scalar brightness of a vertex: the mean of its RGB channels.
    #[inline]
    pub fn brightness(&self, vertex: usize) -> f32 {
        let c = self.colors[vertex];
        (c.x + c.y + c.z) / 3.0
    }

    /// Recomputes `bbox` from the vertex positions.
    ///
    /// An empty mesh gets a zero-sized box at the origin.
    pub fn calc_bbox(&mut self) {
        if self.vertices.is_empty() {
            self.bbox = Aabb::default();
            return;
        }

        let mut min = Vec3::splat(f32::MAX);
        let mut max = Vec3::splat(f32::MIN);
        for v in &self.vertices {
            min = min.min(*v);
            max = max.max(*v);
        }
        self.bbox = Aabb { min, max };
    }
}
