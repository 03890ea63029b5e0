// Copyright (C) 2026 the intrinsic-mesh contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Sparse linear-algebra entry points.
//!
//! The diffusion and transfer routines only ever need two operations: a
//! direct solve of a symmetric positive definite system and a least-squares
//! solve of a tall rectangular system. Both are provided here on top of
//! `nalgebra-sparse`, keeping the rest of the crate independent of the
//! backing solver.

use anyhow::{anyhow, Result};
use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::factorization::CscCholesky;
use nalgebra_sparse::CscMatrix;

/// Solves `a * x = b` for a sparse symmetric positive definite matrix by
/// Cholesky factorization. Fails when the matrix is not positive definite.
pub fn solve_spd(a: &CscMatrix<f64>, b: &DVector<f64>) -> Result<DVector<f64>> {
    let chol = CscCholesky::factor(a)
        .map_err(|err| anyhow!("sparse Cholesky factorization failed: {err:?}"))?;
    let rhs = DMatrix::from_column_slice(b.len(), 1, b.as_slice());
    let x = chol.solve(&rhs);
    Ok(DVector::from_iterator(b.len(), x.column(0).iter().copied()))
}

/// Least-squares solution of the tall system `a * x ~ b` through the
/// normal equations `aᵀa x = aᵀb`. The input must have full column rank.
pub fn solve_least_squares(a: &CscMatrix<f64>, b: &DVector<f64>) -> Result<DVector<f64>> {
    let at = a.transpose();
    let ata = &at * a;
    let mut atb = DVector::zeros(a.ncols());
    for (i, j, value) in a.triplet_iter() {
        atb[j] += value * b[i];
    }
    solve_spd(&ata, &atb)
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra_sparse::CooMatrix;

    #[test]
    fn solves_a_small_spd_system() {
        let mut coo = CooMatrix::new(2, 2);
        coo.push(0, 0, 4.0);
        coo.push(0, 1, 1.0);
        coo.push(1, 0, 1.0);
        coo.push(1, 1, 3.0);
        let a = CscMatrix::from(&coo);
        let b = DVector::from_vec(vec![1.0, 2.0]);
        let x = solve_spd(&a, &b).unwrap();
        // residual vanishes
        assert_relative_eq!(4.0 * x[0] + x[1], 1.0, epsilon = 1e-12);
        assert_relative_eq!(x[0] + 3.0 * x[1], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn rejects_an_indefinite_system() {
        let mut coo = CooMatrix::new(2, 2);
        coo.push(0, 0, 1.0);
        coo.push(1, 1, -1.0);
        let a = CscMatrix::from(&coo);
        let b = DVector::from_vec(vec![1.0, 1.0]);
        assert!(solve_spd(&a, &b).is_err());
    }

    #[test]
    fn least_squares_fits_a_line() {
        // fit y = c0 + c1 x over four samples of y = 1 + 2x
        let xs = [0.0, 1.0, 2.0, 3.0];
        let mut coo = CooMatrix::new(4, 2);
        for (i, &x) in xs.iter().enumerate() {
            coo.push(i, 0, 1.0);
            coo.push(i, 1, x);
        }
        let a = CscMatrix::from(&coo);
        let b = DVector::from_iterator(4, xs.iter().map(|&x| 1.0 + 2.0 * x));
        let c = solve_least_squares(&a, &b).unwrap();
        assert_relative_eq!(c[0], 1.0, epsilon = 1e-9);
        assert_relative_eq!(c[1], 2.0, epsilon = 1e-9);
    }
}
