//! Rank revealing Cholesky decomposition of a positive semi-definite matrix.
//!
//! Full pivoting on the diagonal; the returned root `B` has as many columns as
//! the numerical rank of `A`, with `B·Bᵗ = A`.
use log::debug;

use crate::linalg_error::{LinAlgError, Result};
use crate::matrices::array2d_real_matrix::Array2DRowRealMatrix;
use crate::matrices::real_matrix::RealMatrix;

#[derive(Debug, Clone)]
pub struct RectangularCholeskyDecomposition {
    root: Array2DRowRealMatrix,
    rank: usize,
}

impl RectangularCholeskyDecomposition {
    pub fn new(matrix: &dyn RealMatrix) -> Result<Self> {
        Self::with_small(matrix, 0.0)
    }

    /// Pivots at or below `small` end the decomposition; a remaining diagonal
    /// entry below `-small` means the matrix is indefinite.
    pub fn with_small(matrix: &dyn RealMatrix, small: f64) -> Result<Self> {
        if !matrix.is_square() {
            return Err(LinAlgError::NonSquare {
                rows: matrix.row_dimension(),
                columns: matrix.column_dimension(),
            });
        }
        let order = matrix.row_dimension();
        let mut c = matrix.get_data();
        let mut b = vec![vec![0.0; order]; order];
        let mut index: Vec<usize> = (0..order).collect();

        let mut r = 0;
        while r < order {
            // bring the largest remaining diagonal entry to position r
            let mut swap_r = r;
            for i in (r + 1)..order {
                if c[index[i]][index[i]] > c[index[swap_r]][index[swap_r]] {
                    swap_r = i;
                }
            }
            if swap_r != r {
                index.swap(r, swap_r);
                b.swap(r, swap_r);
            }

            let ir = index[r];
            if c[ir][ir] <= small {
                if r == 0 {
                    return Err(LinAlgError::NonPositiveDefinite);
                }
                if (r..order).any(|i| c[index[i]][index[i]] < -small) {
                    return Err(LinAlgError::NonPositiveDefinite);
                }
                debug!("rectangular Cholesky: rank {} of {}", r, order);
                break;
            }

            let sqrt = c[ir][ir].sqrt();
            b[r][r] = sqrt;
            let inverse = 1.0 / sqrt;
            let inverse2 = 1.0 / c[ir][ir];
            for i in (r + 1)..order {
                let ii = index[i];
                let e = inverse * c[ii][ir];
                b[i][r] = e;
                c[ii][ii] -= c[ii][ir] * c[ii][ir] * inverse2;
                for j in (r + 1)..i {
                    let ij = index[j];
                    let f = c[ii][ij] - e * b[j][r];
                    c[ii][ij] = f;
                    c[ij][ii] = f;
                }
            }
            r += 1;
        }

        let mut root = Array2DRowRealMatrix::new(order, r);
        for i in 0..order {
            root.data_mut()[index[i]].copy_from_slice(&b[i][..r]);
        }
        Ok(RectangularCholeskyDecomposition { root, rank: r })
    }

    /// `B` with `B·Bᵗ = A`, `order × rank`.
    pub fn get_root_matrix(&self) -> &Array2DRowRealMatrix {
        &self.root
    }

    pub fn get_rank(&self) -> usize {
        self.rank
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iterative_solvers::linear_operator::RealLinearOperator;
    use approx::assert_relative_eq;

    fn assert_reconstructs(a: &Array2DRowRealMatrix, root: &Array2DRowRealMatrix) {
        let product = root.multiply_transposed(root).unwrap();
        for i in 0..a.row_dimension() {
            for j in 0..a.column_dimension() {
                assert_relative_eq!(product.entry(i, j), a.entry(i, j), epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_full_rank() {
        let a = Array2DRowRealMatrix::from_rows(vec![
            vec![4.0, 12.0, -16.0],
            vec![12.0, 37.0, -43.0],
            vec![-16.0, -43.0, 98.0],
        ])
        .unwrap();
        let d = RectangularCholeskyDecomposition::with_small(&a, 1e-10).unwrap();
        assert_eq!(d.get_rank(), 3);
        assert_reconstructs(&a, d.get_root_matrix());
    }

    #[test]
    fn test_rank_deficient() {
        // u uᵗ + v vᵗ with u = (1, 2, 0, 1), v = (0, 1, 1, -1)
        let u = [1.0, 2.0, 0.0, 1.0];
        let v = [0.0, 1.0, 1.0, -1.0];
        let data = (0..4)
            .map(|i| (0..4).map(|j| u[i] * u[j] + v[i] * v[j]).collect())
            .collect();
        let a = Array2DRowRealMatrix::from_rows(data).unwrap();
        let d = RectangularCholeskyDecomposition::with_small(&a, 1e-10).unwrap();
        assert_eq!(d.get_rank(), 2);
        assert_eq!(d.get_root_matrix().column_dimension(), 2);
        assert_reconstructs(&a, d.get_root_matrix());
    }

    #[test]
    fn test_indefinite_is_rejected() {
        let a = Array2DRowRealMatrix::from_rows(vec![
            vec![1.0, 0.0, 0.0],
            vec![0.0, 0.0, 0.0],
            vec![0.0, 0.0, -1.0],
        ])
        .unwrap();
        assert!(matches!(
            RectangularCholeskyDecomposition::with_small(&a, 1e-10),
            Err(LinAlgError::NonPositiveDefinite)
        ));
        let zero = Array2DRowRealMatrix::new(2, 2);
        assert!(RectangularCholeskyDecomposition::new(&zero).is_err());
        assert!(RectangularCholeskyDecomposition::new(&Array2DRowRealMatrix::new(2, 3)).is_err());
    }
}
