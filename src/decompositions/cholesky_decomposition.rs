//! Cholesky decomposition `A = L·Lᵗ` of a symmetric positive definite matrix.
use std::cell::OnceCell;

use log::debug;

use crate::decompositions::decomposition_solver::DecompositionSolver;
use crate::linalg_error::{LinAlgError, Result};
use crate::matrices::array2d_real_matrix::Array2DRowRealMatrix;
use crate::matrices::real_matrix::RealMatrix;
use crate::matrices::real_vector::{ArrayRealVector, RealVector};

/// Relative tolerance on `|a_ij - a_ji|` scaled by `max(|a_ij|, |a_ji|)`.
pub const DEFAULT_RELATIVE_SYMMETRY_THRESHOLD: f64 = 1.0e-15;
/// Pivots at or below this value make the matrix non positive definite.
pub const DEFAULT_ABSOLUTE_POSITIVITY_THRESHOLD: f64 = 1.0e-10;

#[derive(Debug)]
pub struct CholeskyDecomposition {
    /// rows of `Lᵗ`
    lt_data: Vec<Vec<f64>>,
    cached_l: OnceCell<Array2DRowRealMatrix>,
    cached_lt: OnceCell<Array2DRowRealMatrix>,
}

impl CholeskyDecomposition {
    pub fn new(matrix: &dyn RealMatrix) -> Result<Self> {
        Self::with_thresholds(
            matrix,
            DEFAULT_RELATIVE_SYMMETRY_THRESHOLD,
            DEFAULT_ABSOLUTE_POSITIVITY_THRESHOLD,
        )
    }

    pub fn with_thresholds(
        matrix: &dyn RealMatrix,
        relative_symmetry_threshold: f64,
        absolute_positivity_threshold: f64,
    ) -> Result<Self> {
        if !matrix.is_square() {
            return Err(LinAlgError::NonSquare {
                rows: matrix.row_dimension(),
                columns: matrix.column_dimension(),
            });
        }
        let order = matrix.row_dimension();
        let mut lt = matrix.get_data();

        // symmetry check, clearing the lower part on the way
        for i in 0..order {
            for j in (i + 1)..order {
                let l_ij = lt[i][j];
                let l_ji = lt[j][i];
                let max_delta = relative_symmetry_threshold * l_ij.abs().max(l_ji.abs());
                if (l_ij - l_ji).abs() > max_delta {
                    return Err(LinAlgError::NonSymmetric {
                        row: i,
                        column: j,
                        threshold: relative_symmetry_threshold,
                    });
                }
                lt[j][i] = 0.0;
            }
        }

        for i in 0..order {
            let (head, tail) = lt.split_at_mut(i + 1);
            let lt_i = &mut head[i];
            if lt_i[i] <= absolute_positivity_threshold {
                debug!(
                    "Cholesky: pivot {:e} at {} is not above {:e}",
                    lt_i[i], i, absolute_positivity_threshold
                );
                return Err(LinAlgError::NonPositiveDefinite);
            }
            lt_i[i] = lt_i[i].sqrt();
            let inverse = 1.0 / lt_i[i];
            for q in ((i + 1)..order).rev() {
                lt_i[q] *= inverse;
                let lt_q = &mut tail[q - i - 1];
                for p in q..order {
                    lt_q[p] -= lt_i[q] * lt_i[p];
                }
            }
        }

        Ok(CholeskyDecomposition {
            lt_data: lt,
            cached_l: OnceCell::new(),
            cached_lt: OnceCell::new(),
        })
    }

    /// Lower triangular factor.
    pub fn get_l(&self) -> &Array2DRowRealMatrix {
        self.cached_l.get_or_init(|| self.get_lt().transpose_dense())
    }

    pub fn get_lt(&self) -> &Array2DRowRealMatrix {
        self.cached_lt
            .get_or_init(|| Array2DRowRealMatrix::from_rows_unchecked(self.lt_data.clone()))
    }

    pub fn get_determinant(&self) -> f64 {
        self.lt_data
            .iter()
            .enumerate()
            .fold(1.0, |det, (i, row)| det * row[i] * row[i])
    }

    pub fn get_solver(&self) -> CholeskySolver<'_> {
        CholeskySolver { cholesky: self }
    }
}

pub struct CholeskySolver<'a> {
    cholesky: &'a CholeskyDecomposition,
}

impl DecompositionSolver for CholeskySolver<'_> {
    fn solve(&self, b: &dyn RealVector) -> Result<ArrayRealVector> {
        let lt = &self.cholesky.lt_data;
        let m = lt.len();
        if b.dimension() != m {
            return Err(LinAlgError::DimensionMismatch {
                got: b.dimension(),
                expected: m,
            });
        }
        let mut x = b.to_array();

        // L y = b
        for j in 0..m {
            x[j] /= lt[j][j];
            let x_j = x[j];
            for i in (j + 1)..m {
                x[i] -= x_j * lt[j][i];
            }
        }
        // Lᵗ x = y
        for j in (0..m).rev() {
            x[j] /= lt[j][j];
            let x_j = x[j];
            for i in 0..j {
                x[i] -= x_j * lt[i][j];
            }
        }
        Ok(ArrayRealVector::from_vec(x))
    }

    /// A successful decomposition is always invertible.
    fn is_non_singular(&self) -> bool {
        true
    }

    fn row_dimension(&self) -> usize {
        self.cholesky.lt_data.len()
    }

    fn column_dimension(&self) -> usize {
        self.cholesky.lt_data.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iterative_solvers::linear_operator::RealLinearOperator;
    use crate::matrices::matrix_utils::create_real_identity_matrix;
    use approx::assert_relative_eq;
    use rand::Rng;

    fn testdata() -> Array2DRowRealMatrix {
        Array2DRowRealMatrix::from_rows(vec![
            vec![4.0, 12.0, -16.0],
            vec![12.0, 37.0, -43.0],
            vec![-16.0, -43.0, 98.0],
        ])
        .unwrap()
    }

    #[test]
    fn test_known_factor() {
        let c = CholeskyDecomposition::new(&testdata()).unwrap();
        let expected = [[2.0, 0.0, 0.0], [6.0, 1.0, 0.0], [-8.0, 5.0, 3.0]];
        let l = c.get_l();
        for i in 0..3 {
            for j in 0..3 {
                assert_relative_eq!(l.entry(i, j), expected[i][j], epsilon = 1e-14);
            }
        }
        assert_relative_eq!(c.get_determinant(), 36.0, epsilon = 1e-12);
        assert!(std::ptr::eq(c.get_l(), c.get_l()));
        assert!(std::ptr::eq(c.get_lt(), c.get_lt()));
    }

    #[test]
    fn test_l_times_lt_is_a_for_random_spd() {
        let mut rng = rand::rng();
        let n = 6;
        let b = Array2DRowRealMatrix::from_rows(
            (0..n)
                .map(|_| (0..n).map(|_| rng.random_range(-1.0..1.0)).collect())
                .collect(),
        )
        .unwrap();
        let a = b
            .transpose_multiply(&b)
            .unwrap()
            .add(&create_real_identity_matrix(n))
            .unwrap();
        let c = CholeskyDecomposition::new(a.as_ref()).unwrap();
        let product = c.get_l().multiply(c.get_lt()).unwrap();
        for i in 0..n {
            for j in 0..n {
                assert_relative_eq!(product.entry(i, j), a.entry(i, j), epsilon = 1e-12);
                if j > i {
                    assert_eq!(c.get_l().entry(i, j), 0.0);
                }
            }
        }
        let x = ArrayRealVector::from_vec((0..n).map(|i| 1.0 + i as f64).collect());
        let rhs = a.operate(&x).unwrap();
        let solved = c.get_solver().solve(&rhs).unwrap();
        assert_relative_eq!(solved.get_distance(&x).unwrap(), 0.0, epsilon = 1e-10);
        let inverse = c.get_solver().get_inverse().unwrap();
        let identity = a.multiply(&inverse).unwrap();
        for i in 0..n {
            assert_relative_eq!(identity.entry(i, i), 1.0, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_rejections() {
        assert!(matches!(
            CholeskyDecomposition::new(&Array2DRowRealMatrix::new(2, 3)),
            Err(LinAlgError::NonSquare { .. })
        ));
        let non_symmetric =
            Array2DRowRealMatrix::from_rows(vec![vec![4.0, 1.0], vec![1.0 + 1e-10, 3.0]]).unwrap();
        assert!(matches!(
            CholeskyDecomposition::new(&non_symmetric),
            Err(LinAlgError::NonSymmetric { row: 0, column: 1, .. })
        ));
        let indefinite =
            Array2DRowRealMatrix::from_rows(vec![vec![1.0, 2.0], vec![2.0, 1.0]]).unwrap();
        assert!(matches!(
            CholeskyDecomposition::new(&indefinite),
            Err(LinAlgError::NonPositiveDefinite)
        ));
        // a looser symmetry tolerance accepts the perturbed matrix
        assert!(CholeskyDecomposition::with_thresholds(&non_symmetric, 1e-9, 1e-10).is_ok());
    }
}
