// Copyright (C) 2026 the intrinsic-mesh contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Cotangent Laplacian and the solvers built on it, all evaluated on the
//! intrinsic metric: heat diffusion, Poisson problems with Dirichlet
//! constraints, and least-squares transfer of intrinsic solutions back to
//! extrinsic vertices.
//!
//! Constraints are imposed by row/column elimination: a constrained row
//! keeps only a unit diagonal, and its column is folded into the right-hand
//! side, which keeps the systems symmetric positive definite for the
//! Cholesky solve.

use super::IntrinsicMesh;
use crate::prelude::*;
use crate::solver;
use nalgebra::DVector;
use nalgebra_sparse::{CooMatrix, CscMatrix};

impl IntrinsicMesh {
    /// The halfedges delimiting the one-ring around vertex `v` (the link,
    /// one halfedge per incident triangle, each starting at a neighbor).
    pub fn v_ring1_he(&self, v: usize) -> SVec<usize> {
        self.conn
            .adj_vh(v)
            .into_iter()
            .map(|h| self.conn.next(h))
            .collect()
    }

    /// Area of influence of a vertex: one third of its one-ring area.
    fn cot_area(&self, ring: &[usize]) -> f64 {
        ring.iter().map(|&h| self.h_area(h)).sum::<f64>() / 3.0
    }

    /// Cotangent weight of the edge from the ring vertex of `h` back to
    /// the ring center: `cot α + cot β` over the angles opposite that edge.
    /// On a border edge only the present side contributes.
    fn cot_wij(&self, h: usize) -> f64 {
        let hb = self.conn.next(h);
        let mut w = 1.0 / self.h_angle(hb).tan();
        let m = self.conn.mate(self.conn.previous(h));
        if m != NONE {
            let ha = self.conn.previous(m);
            w += 1.0 / self.h_angle(ha).tan();
        }
        w
    }

    /// The cotangent Laplacian: `L[i][j] = w_ij / (2 A_i)` off-diagonal
    /// and `L[i][i] = -Σ_j w_ij / (2 A_i)`. Row sums vanish, so the
    /// constant vector spans its null space.
    pub fn laplacian_matrix(&self) -> CscMatrix<f64> {
        let n = self.conn.num_vertices();
        let mut coo = CooMatrix::new(n, n);
        for i in 0..n {
            let ring = self.v_ring1_he(i);
            if ring.is_empty() {
                continue;
            }
            let wi = 1.0 / (2.0 * self.cot_area(&ring));
            let mut wii = 0.0;
            for &he in &ring {
                let j = self.conn.h[he].vertex;
                let wij = self.cot_wij(he);
                wii += wij;
                coo.push(i, j, wij * wi);
            }
            coo.push(i, i, -wii * wi);
        }
        CscMatrix::from(&coo)
    }

    /// The implicit diffusion matrix `M = I + t (-L)`, positive definite
    /// for `t > 0`.
    pub fn diffusion_matrix(&self, t: f64) -> CscMatrix<f64> {
        let n = self.conn.num_vertices();
        let mut coo = CooMatrix::new(n, n);
        for i in 0..n {
            let ring = self.v_ring1_he(i);
            if ring.is_empty() {
                coo.push(i, i, 1.0);
                continue;
            }
            let wi = 1.0 / (2.0 * self.cot_area(&ring));
            let mut wii = 0.0;
            for &he in &ring {
                let j = self.conn.h[he].vertex;
                let wij = self.cot_wij(he);
                wii += wij;
                coo.push(i, j, -t * wij * wi);
            }
            coo.push(i, i, 1.0 + t * wii * wi);
        }
        CscMatrix::from(&coo)
    }

    /// One implicit heat-diffusion step of size `t` with the temperatures
    /// of `initial` held fixed: solves `M x = b` where each source vertex
    /// is imposed by row/column elimination.
    ///
    /// Every free equation is scaled by its vertex area, which turns the
    /// row-normalized diffusion operator into the equivalent symmetric
    /// positive definite system the sparse Cholesky solver expects; the
    /// solution is unchanged.
    pub fn heat_diffusion(&self, initial: &HashMap<usize, f64>, t: f64) -> Result<DVector<f64>> {
        let n = self.conn.num_vertices();
        let mut coo = CooMatrix::new(n, n);
        let mut b = DVector::zeros(n);
        for i in 0..n {
            if let Some(&fixed) = initial.get(&i) {
                coo.push(i, i, 1.0);
                b[i] = fixed;
                continue;
            }
            let ring = self.v_ring1_he(i);
            if ring.is_empty() {
                coo.push(i, i, 1.0);
                continue;
            }
            let ai = 2.0 * self.cot_area(&ring);
            let mut wii = 0.0;
            for &he in &ring {
                let j = self.conn.h[he].vertex;
                let wij = self.cot_wij(he);
                wii += wij;
                let m_ij = -t * wij;
                if let Some(&fixed) = initial.get(&j) {
                    b[i] -= m_ij * fixed;
                } else {
                    coo.push(i, j, m_ij);
                }
            }
            coo.push(i, i, ai + t * wii);
        }
        solver::solve_spd(&CscMatrix::from(&coo), &b)
    }

    /// Solves the Poisson problem `L x = rhs` under the Dirichlet
    /// `constraints`. The system is negated to make it positive definite
    /// before the constrained rows and columns are eliminated, and every
    /// free equation is scaled by its vertex area so the assembled matrix
    /// is the symmetric stiffness form (same solution, Cholesky-friendly).
    pub fn poisson(&self, rhs: &[f64], constraints: &HashMap<usize, f64>) -> Result<DVector<f64>> {
        let n = self.conn.num_vertices();
        if rhs.len() != n {
            bail!(
                "right-hand side has {} entries for {} vertices",
                rhs.len(),
                n
            );
        }
        let mut coo = CooMatrix::new(n, n);
        let mut b = DVector::zeros(n);
        for i in 0..n {
            if let Some(&fixed) = constraints.get(&i) {
                coo.push(i, i, 1.0);
                b[i] = fixed;
                continue;
            }
            let ring = self.v_ring1_he(i);
            if ring.is_empty() {
                coo.push(i, i, 1.0);
                continue;
            }
            let ai = 2.0 * self.cot_area(&ring);
            let mut wii = 0.0;
            b[i] = -rhs[i] * ai;
            for &he in &ring {
                let j = self.conn.h[he].vertex;
                let wij = self.cot_wij(he);
                wii += wij;
                let l_ij = -wij; // area-scaled entry of -L
                if let Some(&fixed) = constraints.get(&j) {
                    b[i] -= l_ij * fixed;
                } else {
                    coo.push(i, j, l_ij);
                }
            }
            coo.push(i, i, wii);
        }
        solver::solve_spd(&CscMatrix::from(&coo), &b)
    }

    /// Transfers a solution sampled at intrinsic vertices back to the
    /// extrinsic vertices by least squares over about `f * |V|` sample
    /// rows: optionally one exact row per shared vertex (`use_v`), plus
    /// random surface points where the extrinsic interpolation is asked to
    /// match the intrinsic one evaluated through point location.
    pub fn data_transfer(&self, solution: &[f64], f: f64, use_v: bool) -> Result<DVector<f64>> {
        let nv = self.conn.num_vertices();
        let ne = self.he.num_vertices();
        if solution.len() != nv {
            bail!(
                "solution has {} entries for {} intrinsic vertices",
                solution.len(),
                nv
            );
        }
        let target = (f * nv as f64) as usize;
        let points = if use_v {
            self.he.generate_random_points(target.saturating_sub(ne))
        } else {
            self.he.generate_random_points(target)
        };
        let nrows = if use_v { ne + points.len() } else { points.len() };
        let mut coo = CooMatrix::new(nrows, ne);
        let mut b = DVector::zeros(nrows);
        let mut row = 0;
        if use_v {
            for i in 0..ne {
                coo.push(i, i, 1.0);
                b[i] = solution[i];
            }
            row = ne;
        }
        for &(te, uvw) in &points {
            let [ve0, ve1, ve2] = self.he.t_incidence(te);
            coo.push(row, ve0, uvw[0]);
            coo.push(row, ve1, uvw[1]);
            coo.push(row, ve2, uvw[2]);
            // the same surface point, sampled on the intrinsic mesh
            let (h0, uvw_i) = self.te_point_location(te, uvw);
            let h1 = self.conn.next(h0);
            let h2 = self.conn.next(h1);
            let v0 = self.conn.h[h0].vertex;
            let v1 = self.conn.h[h1].vertex;
            let v2 = self.conn.h[h2].vertex;
            b[row] = uvw_i[0] * solution[v0] + uvw_i[1] * solution[v1] + uvw_i[2] * solution[v2];
            row += 1;
        }
        solver::solve_least_squares(&CscMatrix::from(&coo), &b)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::mesh::primitives::{create_grid, create_torus};
    use crate::mesh::Mesh;
    use approx::assert_relative_eq;

    fn intrinsic_grid(n: usize) -> IntrinsicMesh {
        let (v, f) = create_grid(n, n, 1.0, 1.0);
        IntrinsicMesh::new(Mesh::new(&v, &f).unwrap(), None).unwrap()
    }

    fn row_sums(m: &CscMatrix<f64>, n: usize) -> Vec<f64> {
        let mut sums = vec![0.0; n];
        for (i, _, value) in m.triplet_iter() {
            sums[i] += value;
        }
        sums
    }

    #[test]
    fn laplacian_annihilates_constants_on_a_closed_mesh() {
        let (v, f) = create_torus(1.0, 0.3, 8, 8);
        let im = IntrinsicMesh::new(Mesh::new(&v, &f).unwrap(), None).unwrap();
        let l = im.laplacian_matrix();
        for s in row_sums(&l, im.num_vertices()) {
            assert_relative_eq!(s, 0.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn diffusion_matrix_rows_sum_to_one() {
        let im = intrinsic_grid(3);
        let m = im.diffusion_matrix(0.1);
        for s in row_sums(&m, im.num_vertices()) {
            assert_relative_eq!(s, 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn heat_from_a_corner_decays_with_distance() {
        let im = intrinsic_grid(4);
        let mut initial = HashMap::new();
        initial.insert(0, 1.0);
        let x = im.heat_diffusion(&initial, 0.1).unwrap();
        assert_relative_eq!(x[0], 1.0);
        let tol = 1e-3;
        for i in 0..x.len() {
            assert!(x[i] >= -tol && x[i] <= 1.0 + tol, "x[{i}] = {}", x[i]);
            assert!(x[i] <= x[0] + tol);
        }
        // heat at the adjacent vertex dominates the opposite corner
        let far = im.num_vertices() - 1;
        assert!(x[1] > x[far]);
    }

    #[test]
    fn heat_diffusion_solves_on_a_refined_mesh() {
        let (v, f) = create_grid(3, 3, 1.0, 0.4);
        let mut im = IntrinsicMesh::new(Mesh::new(&v, &f).unwrap(), None).unwrap();
        im.chew93(25f64.to_radians());
        let mut initial = HashMap::new();
        initial.insert(0, 1.0);
        let x = im.heat_diffusion(&initial, 0.05).unwrap();
        assert_eq!(x.len(), im.num_vertices());
        assert!(x.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn harmonic_interpolation_respects_the_maximum_principle() {
        let im = intrinsic_grid(4);
        let rhs = vec![0.0; im.num_vertices()];
        let mut constraints = HashMap::new();
        constraints.insert(0, 0.0);
        constraints.insert(im.num_vertices() - 1, 1.0);
        let x = im.poisson(&rhs, &constraints).unwrap();
        assert_relative_eq!(x[0], 0.0);
        assert_relative_eq!(x[im.num_vertices() - 1], 1.0);
        let tol = 1e-9;
        for v in x.iter() {
            assert!(*v >= -tol && *v <= 1.0 + tol);
        }
    }

    #[test]
    fn poisson_rejects_a_malformed_rhs() {
        let im = intrinsic_grid(2);
        assert!(im.poisson(&[0.0; 3], &HashMap::new()).is_err());
    }

    #[test]
    fn transfer_recovers_a_linear_field_on_the_identity_mesh() {
        let im = intrinsic_grid(3);
        // a linear field sampled at the (shared) vertices
        let solution: Vec<f64> = (0..im.num_vertices())
            .map(|v| {
                let p = im.extrinsic().position(v);
                p.x + 2.0 * p.y
            })
            .collect();
        let x = im.data_transfer(&solution, 2.0, true).unwrap();
        assert_eq!(x.len(), im.extrinsic().num_vertices());
        for v in 0..x.len() {
            assert_relative_eq!(x[v], solution[v], epsilon = 1e-6);
        }
    }
}
