// Copyright (C) 2026 the intrinsic-mesh contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Primitive triangulations: grid, sphere and torus, returned as
//! `(positions, triangle incidences)` ready for [`Mesh::new`].
//!
//! [`Mesh::new`]: crate::mesh::Mesh::new

use glam::DVec3;
use std::f64::consts::{PI, TAU};

/// A regular `nx` by `ny` grid of cells over a `lx` by `ly` rectangle in
/// the z = 0 plane, each cell split into two triangles.
pub fn create_grid(nx: usize, ny: usize, lx: f64, ly: f64) -> (Vec<DVec3>, Vec<[usize; 3]>) {
    let dx = lx / nx as f64;
    let dy = ly / ny as f64;
    let mut vertices = Vec::with_capacity((nx + 1) * (ny + 1));
    for j in 0..=ny {
        for i in 0..=nx {
            vertices.push(DVec3::new(i as f64 * dx, j as f64 * dy, 0.0));
        }
    }
    let mut triangles = Vec::with_capacity(2 * nx * ny);
    for j in 0..ny {
        for i in 0..nx {
            let ii = j * (nx + 1) + i;
            let ij = ii + 1;
            let ji = (j + 1) * (nx + 1) + i;
            let jj = ji + 1;
            triangles.push([ii, ij, ji]);
            triangles.push([ij, jj, ji]);
        }
    }
    (vertices, triangles)
}

/// A unit sphere parameterized over the grid: x maps to the polar angle,
/// y to the azimuth. The polar rows collapse to the poles, so the mesh
/// carries degenerate triangles there; intrinsic use requires
/// mollification.
pub fn create_sphere(nx: usize, ny: usize) -> (Vec<DVec3>, Vec<[usize; 3]>) {
    let (mut vertices, triangles) = create_grid(nx, ny, 1.0, 1.0);
    for c in &mut vertices {
        let theta = c.x * PI;
        let phi = c.y * TAU;
        *c = DVec3::new(
            theta.sin() * phi.cos(),
            theta.sin() * phi.sin(),
            theta.cos(),
        );
    }
    (vertices, triangles)
}

/// A closed torus with major radius `big_r` and minor radius `small_r`,
/// sampled on an `nx` by `ny` modular grid. The triangle winding is
/// reversed so the normals face outward.
pub fn create_torus(
    big_r: f64,
    small_r: f64,
    nx: usize,
    ny: usize,
) -> (Vec<DVec3>, Vec<[usize; 3]>) {
    let mut vertices = Vec::with_capacity(nx * ny);
    for j in 0..ny {
        for i in 0..nx {
            let theta = i as f64 / nx as f64 * TAU;
            let phi = j as f64 / ny as f64 * TAU;
            vertices.push(DVec3::new(
                (big_r + small_r * theta.cos()) * phi.cos(),
                (big_r + small_r * theta.cos()) * phi.sin(),
                small_r * theta.sin(),
            ));
        }
    }
    let at = |i: usize, j: usize| (j % ny) * nx + (i % nx);
    let mut triangles = Vec::with_capacity(2 * nx * ny);
    for j in 0..ny {
        for i in 0..nx {
            let ii = at(i, j);
            let ij = at(i + 1, j);
            let ji = at(i, j + 1);
            let jj = at(i + 1, j + 1);
            triangles.push([ii, ji, ij]);
            triangles.push([ij, ji, jj]);
        }
    }
    (vertices, triangles)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::mesh::Mesh;

    #[test]
    fn grid_counts() {
        let (v, f) = create_grid(4, 3, 2.0, 1.0);
        assert_eq!(v.len(), 20);
        assert_eq!(f.len(), 24);
        let mesh = Mesh::new(&v, &f).unwrap();
        // disk: V - E + T = 1
        let chi = mesh.num_vertices() as i64 - mesh.num_edges() as i64
            + mesh.num_triangles() as i64;
        assert_eq!(chi, 1);
    }

    #[test]
    fn torus_is_closed() {
        let (v, f) = create_torus(1.0, 0.3, 8, 8);
        let mesh = Mesh::new(&v, &f).unwrap();
        assert_eq!(mesh.conn().count_border_edges(), 0);
        assert_eq!(mesh.num_vertices(), 64);
        assert_eq!(mesh.num_triangles(), 128);
        // genus one: V - E + T = 0
        let chi = mesh.num_vertices() as i64 - mesh.num_edges() as i64
            + mesh.num_triangles() as i64;
        assert_eq!(chi, 0);
    }

    #[test]
    fn sphere_vertices_on_unit_sphere() {
        let (v, f) = create_sphere(8, 8);
        assert!(v.iter().all(|p| (p.length() - 1.0).abs() < 1e-12));
        assert!(Mesh::new(&v, &f).is_ok());
    }
}
