//! Demo producer: a height field sampled on a regular grid.
//!
//! Stands in for the external tessellator so the viewers have a surface to
//! show without a mesh file. Covers `[0, 4] x [0, 4]` in XY by default, which
//! is the region both cameras frame.

use surfview_common::{Face, Mesh, Point3, PointCloud};

use crate::buffers::MeshError;

/// A scalar height function sampled over a rectangle in the XY plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeightField {
    pub origin: [f64; 2],
    pub size: [f64; 2],
    /// Sample points along X and Y (at least 2 each).
    pub resolution: [u32; 2],
}

impl Default for HeightField {
    fn default() -> Self {
        Self {
            origin: [0.0, 0.0],
            size: [4.0, 4.0],
            resolution: [30, 30],
        }
    }
}

impl HeightField {
    pub fn with_resolution(resolution_u: u32, resolution_v: u32) -> Self {
        Self {
            resolution: [resolution_u, resolution_v],
            ..Self::default()
        }
    }

    fn sample_xy(&self, i: u32, j: u32, nu: u32, nv: u32) -> (f64, f64) {
        let x = self.origin[0] + self.size[0] * f64::from(i) / f64::from(nu - 1);
        let y = self.origin[1] + self.size[1] * f64::from(j) / f64::from(nv - 1);
        (x, y)
    }

    /// Tessellate `height(x, y)` into a triangle mesh.
    ///
    /// Vertices are laid out row by row (`j * nu + i`). Each grid cell becomes
    /// two counter-clockwise triangles seen from +Z. Fails with
    /// [`MeshError::GridTooLarge`] when the vertex indices would not fit `u32`.
    pub fn tessellate(&self, height: impl Fn(f64, f64) -> f64) -> Result<Mesh, MeshError> {
        let nu = self.resolution[0].max(2);
        let nv = self.resolution[1].max(2);
        let vertex_count = (nu as usize)
            .checked_mul(nv as usize)
            .filter(|&n| n <= u32::MAX as usize)
            .ok_or(MeshError::GridTooLarge { nu, nv })?;

        let mut vertices = Vec::with_capacity(vertex_count);
        for j in 0..nv {
            for i in 0..nu {
                let (x, y) = self.sample_xy(i, j, nu, nv);
                vertices.push(Point3::new(x, y, height(x, y)));
            }
        }

        // Every index below is under `vertex_count`, so the u32 math is exact.
        let mut faces = Vec::with_capacity((nu as usize - 1) * (nv as usize - 1) * 2);
        for j in 0..nv - 1 {
            for i in 0..nu - 1 {
                let p00 = j * nu + i;
                let p10 = p00 + 1;
                let p01 = p00 + nu;
                let p11 = p01 + 1;
                faces.push(Face::new(p00, p10, p11));
                faces.push(Face::new(p00, p11, p01));
            }
        }

        Ok(Mesh::new(vertices, faces))
    }

    /// Sample `height(x, y)` at an `n x n` lattice, without connectivity.
    pub fn lattice(&self, n: u32, height: impl Fn(f64, f64) -> f64) -> PointCloud {
        let n = n.max(2);
        let mut points = Vec::with_capacity(n as usize * n as usize);
        for j in 0..n {
            for i in 0..n {
                let (x, y) = self.sample_xy(i, j, n, n);
                points.push(Point3::new(x, y, height(x, y)));
            }
        }
        PointCloud::new(points)
    }
}

/// The demo surface height, roughly within `[-2, 2]` over `[0, 4]^2`.
pub fn demo_height(x: f64, y: f64) -> f64 {
    use std::f64::consts::FRAC_PI_2;
    let ridge = 1.6 * (x * FRAC_PI_2).sin() * (y * FRAC_PI_2 * 0.5).sin();
    let ripple = 0.4 * ((x + y) * FRAC_PI_2).cos();
    ridge + ripple
}

/// Demo surface mesh and a coarse 5x5 sample lattice over it.
pub fn sample_surface(
    resolution_u: u32,
    resolution_v: u32,
) -> Result<(Mesh, PointCloud), MeshError> {
    let field = HeightField::with_resolution(resolution_u, resolution_v);
    Ok((field.tessellate(demo_height)?, field.lattice(5, demo_height)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffers::build_mesh_buffers;
    use crate::edges::dedup_edges;

    #[test]
    fn grid_counts() {
        let mesh = HeightField::with_resolution(4, 3).tessellate(|_, _| 0.0).unwrap();
        assert_eq!(mesh.vertex_count(), 12);
        assert_eq!(mesh.face_count(), 3 * 2 * 2);
        assert!(build_mesh_buffers(&mesh).is_ok());
    }

    #[test]
    fn grid_edge_count_includes_diagonals() {
        // nu * (nv - 1) + nv * (nu - 1) grid lines plus one diagonal per cell
        let mesh = HeightField::with_resolution(4, 3).tessellate(|_, _| 0.0).unwrap();
        let edges = dedup_edges(&mesh.faces);
        assert_eq!(edges.len(), 4 * 2 + 3 * 3 + 6);
    }

    #[test]
    fn resolution_below_two_is_raised() {
        let mesh = HeightField::with_resolution(0, 1).tessellate(|_, _| 0.0).unwrap();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.face_count(), 2);
    }

    #[test]
    fn grid_spans_the_field() {
        let mesh = HeightField::default().tessellate(|x, y| x - y).unwrap();
        let last = mesh.vertices.last().unwrap();
        assert_eq!((last.x, last.y), (4.0, 4.0));
        assert_eq!(mesh.vertices[0].z, 0.0);
    }

    #[test]
    fn oversized_grid_is_rejected() {
        let err = HeightField::with_resolution(70_000, 70_000)
            .tessellate(|_, _| 0.0)
            .unwrap_err();
        assert_eq!(err, MeshError::GridTooLarge { nu: 70_000, nv: 70_000 });
        assert!(sample_surface(u32::MAX, 2).is_err());
    }

    #[test]
    fn sample_surface_stays_near_gradient_range() {
        let (mesh, points) = sample_surface(30, 30).unwrap();
        assert_eq!(points.len(), 25);
        assert!(mesh.vertices.iter().all(|p| p.z.abs() <= 2.0));
    }
}
