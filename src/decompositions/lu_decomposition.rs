//! LU decomposition with partial pivoting (Crout ordering): `P·A = L·U`.
//!
//! A singular matrix is only flagged while decomposing; `solve` and
//! `get_inverse` report it, and the determinant of such a matrix is 0.
use std::cell::OnceCell;

use log::debug;

use crate::decompositions::decomposition_solver::DecompositionSolver;
use crate::linalg_error::{LinAlgError, Result};
use crate::matrices::array2d_real_matrix::Array2DRowRealMatrix;
use crate::matrices::real_matrix::RealMatrix;
use crate::matrices::real_vector::{ArrayRealVector, RealVector};

/// Pivots smaller than this mark the matrix singular.
pub const DEFAULT_TOO_SMALL: f64 = 1e-11;

#[derive(Debug)]
pub struct LUDecomposition {
    /// L below the diagonal (unit diagonal implied), U on and above it
    lu: Vec<Vec<f64>>,
    pivot: Vec<usize>,
    even: bool,
    singular: bool,
    cached_l: OnceCell<Array2DRowRealMatrix>,
    cached_u: OnceCell<Array2DRowRealMatrix>,
    cached_p: OnceCell<Array2DRowRealMatrix>,
}

impl LUDecomposition {
    pub fn new(matrix: &dyn RealMatrix) -> Result<Self> {
        Self::with_threshold(matrix, DEFAULT_TOO_SMALL)
    }

    pub fn with_threshold(matrix: &dyn RealMatrix, singularity_threshold: f64) -> Result<Self> {
        if !matrix.is_square() {
            return Err(LinAlgError::NonSquare {
                rows: matrix.row_dimension(),
                columns: matrix.column_dimension(),
            });
        }
        let m = matrix.column_dimension();
        let mut lu = matrix.get_data();
        let mut pivot: Vec<usize> = (0..m).collect();
        let mut even = true;
        let mut singular = false;

        for col in 0..m {
            // upper part of the column
            for row in 0..col {
                let mut sum = lu[row][col];
                for i in 0..row {
                    sum -= lu[row][i] * lu[i][col];
                }
                lu[row][col] = sum;
            }

            // lower part, tracking the largest candidate pivot
            let mut max = col;
            let mut largest = f64::NEG_INFINITY;
            for row in col..m {
                let mut sum = lu[row][col];
                for i in 0..col {
                    sum -= lu[row][i] * lu[i][col];
                }
                lu[row][col] = sum;
                if sum.abs() > largest {
                    largest = sum.abs();
                    max = row;
                }
            }

            if lu[max][col].abs() < singularity_threshold {
                debug!(
                    "LU: pivot {:e} in column {} is below {:e}, matrix is singular",
                    lu[max][col], col, singularity_threshold
                );
                singular = true;
                break;
            }

            if max != col {
                lu.swap(max, col);
                pivot.swap(max, col);
                even = !even;
            }

            let lu_diag = lu[col][col];
            for row in (col + 1)..m {
                lu[row][col] /= lu_diag;
            }
        }

        Ok(LUDecomposition {
            lu,
            pivot,
            even,
            singular,
            cached_l: OnceCell::new(),
            cached_u: OnceCell::new(),
            cached_p: OnceCell::new(),
        })
    }

    /// Unit lower triangular factor, `None` for a singular matrix.
    pub fn get_l(&self) -> Option<&Array2DRowRealMatrix> {
        if self.singular {
            return None;
        }
        Some(self.cached_l.get_or_init(|| {
            let m = self.pivot.len();
            let mut l = Array2DRowRealMatrix::new(m, m);
            for i in 0..m {
                l.data_mut()[i][..i].copy_from_slice(&self.lu[i][..i]);
                l.data_mut()[i][i] = 1.0;
            }
            l
        }))
    }

    /// Upper triangular factor, `None` for a singular matrix.
    pub fn get_u(&self) -> Option<&Array2DRowRealMatrix> {
        if self.singular {
            return None;
        }
        Some(self.cached_u.get_or_init(|| {
            let m = self.pivot.len();
            let mut u = Array2DRowRealMatrix::new(m, m);
            for i in 0..m {
                u.data_mut()[i][i..].copy_from_slice(&self.lu[i][i..]);
            }
            u
        }))
    }

    /// Row permutation matrix, `None` for a singular matrix.
    pub fn get_p(&self) -> Option<&Array2DRowRealMatrix> {
        if self.singular {
            return None;
        }
        Some(self.cached_p.get_or_init(|| {
            let m = self.pivot.len();
            let mut p = Array2DRowRealMatrix::new(m, m);
            for (i, &j) in self.pivot.iter().enumerate() {
                p.data_mut()[i][j] = 1.0;
            }
            p
        }))
    }

    pub fn get_pivot(&self) -> &[usize] {
        &self.pivot
    }

    pub fn is_singular(&self) -> bool {
        self.singular
    }

    pub fn get_determinant(&self) -> f64 {
        if self.singular {
            return 0.0;
        }
        let sign = if self.even { 1.0 } else { -1.0 };
        (0..self.pivot.len()).fold(sign, |det, i| det * self.lu[i][i])
    }

    pub fn get_solver(&self) -> LUSolver<'_> {
        LUSolver { lu: self }
    }
}

pub struct LUSolver<'a> {
    lu: &'a LUDecomposition,
}

impl DecompositionSolver for LUSolver<'_> {
    fn solve(&self, b: &dyn RealVector) -> Result<ArrayRealVector> {
        let m = self.lu.pivot.len();
        if b.dimension() != m {
            return Err(LinAlgError::DimensionMismatch {
                got: b.dimension(),
                expected: m,
            });
        }
        if self.lu.singular {
            return Err(LinAlgError::Singular);
        }
        let lu = &self.lu.lu;
        let mut bp: Vec<f64> = self.lu.pivot.iter().map(|&p| b.entry(p)).collect();

        // L y = P b
        for col in 0..m {
            let bp_col = bp[col];
            for i in (col + 1)..m {
                bp[i] -= bp_col * lu[i][col];
            }
        }
        // U x = y
        for col in (0..m).rev() {
            bp[col] /= lu[col][col];
            let bp_col = bp[col];
            for i in 0..col {
                bp[i] -= bp_col * lu[i][col];
            }
        }
        Ok(ArrayRealVector::from_vec(bp))
    }

    fn is_non_singular(&self) -> bool {
        !self.lu.singular
    }

    fn row_dimension(&self) -> usize {
        self.lu.pivot.len()
    }

    fn column_dimension(&self) -> usize {
        self.lu.pivot.len()
    }
}
