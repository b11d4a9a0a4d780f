//! Householder QR decomposition `A = Q·R` of any `m × n` matrix.
//!
//! The solver gives the least squares solution of tall systems and the
//! minimum norm solution of wide ones. Rank deficiency is only reported when
//! solving.
use std::cell::OnceCell;

use log::debug;

use crate::decompositions::decomposition_solver::DecompositionSolver;
use crate::linalg_error::{LinAlgError, Result};
use crate::matrices::array2d_real_matrix::Array2DRowRealMatrix;
use crate::matrices::real_matrix::RealMatrix;
use crate::matrices::real_vector::{ArrayRealVector, RealVector};

#[derive(Debug)]
pub struct QRDecomposition {
    /// transposed working array: row `k` holds Householder vector `k` below its diagonal
    qrt: Vec<Vec<f64>>,
    r_diag: Vec<f64>,
    rows: usize,
    columns: usize,
    threshold: f64,
    /// decomposition of `Aᵗ`, only for wide matrices
    transposed: Option<Box<QRDecomposition>>,
    cached_q: OnceCell<Array2DRowRealMatrix>,
    cached_qt: OnceCell<Array2DRowRealMatrix>,
    cached_r: OnceCell<Array2DRowRealMatrix>,
    cached_h: OnceCell<Array2DRowRealMatrix>,
}

impl QRDecomposition {
    pub fn new(matrix: &dyn RealMatrix) -> Self {
        Self::with_threshold(matrix, 0.0)
    }

    /// `threshold` is the magnitude at or below which an `R` diagonal entry counts as zero.
    pub fn with_threshold(matrix: &dyn RealMatrix, threshold: f64) -> Self {
        let rows = matrix.row_dimension();
        let columns = matrix.column_dimension();
        let qrt: Vec<Vec<f64>> = (0..columns)
            .map(|j| (0..rows).map(|i| matrix.entry(i, j)).collect())
            .collect();
        let transposed = if rows < columns {
            debug!("QR: {}x{} matrix is wide, decomposing its transpose as well", rows, columns);
            let t = Array2DRowRealMatrix::from_rows_unchecked(qrt.clone());
            Some(Box::new(Self::with_threshold(&t, threshold)))
        } else {
            None
        };
        let mut qr = QRDecomposition {
            qrt,
            r_diag: vec![0.0; rows.min(columns)],
            rows,
            columns,
            threshold,
            transposed,
            cached_q: OnceCell::new(),
            cached_qt: OnceCell::new(),
            cached_r: OnceCell::new(),
            cached_h: OnceCell::new(),
        };
        for minor in 0..rows.min(columns) {
            qr.householder_reflection(minor);
        }
        qr
    }

    /// Zeroes column `minor` below the diagonal and applies the reflection to the later columns.
    fn householder_reflection(&mut self, minor: usize) {
        let m = self.rows;
        let (head, tail) = self.qrt.split_at_mut(minor + 1);
        let qrt_minor = &mut head[minor];

        let x_norm_sqr: f64 = qrt_minor[minor..m].iter().map(|c| c * c).sum();
        let a = if qrt_minor[minor] > 0.0 {
            -x_norm_sqr.sqrt()
        } else {
            x_norm_sqr.sqrt()
        };
        self.r_diag[minor] = a;

        if a != 0.0 {
            qrt_minor[minor] -= a;
            for qrt_col in tail.iter_mut() {
                let mut alpha: f64 = (minor..m).map(|row| qrt_col[row] * qrt_minor[row]).sum();
                alpha /= a * qrt_minor[minor];
                for row in minor..m {
                    qrt_col[row] += alpha * qrt_minor[row];
                }
            }
        }
    }

    /// Upper trapezoidal factor `R` (`m × n`).
    pub fn get_r(&self) -> &Array2DRowRealMatrix {
        self.cached_r.get_or_init(|| {
            let mut r = Array2DRowRealMatrix::new(self.rows, self.columns);
            for row in 0..self.r_diag.len() {
                r.data_mut()[row][row] = self.r_diag[row];
                for col in (row + 1)..self.columns {
                    r.data_mut()[row][col] = self.qrt[col][row];
                }
            }
            r
        })
    }

    /// Orthogonal factor `Q` (`m × m`).
    pub fn get_q(&self) -> &Array2DRowRealMatrix {
        self.cached_q.get_or_init(|| self.get_qt().transpose_dense())
    }

    pub fn get_qt(&self) -> &Array2DRowRealMatrix {
        self.cached_qt.get_or_init(|| {
            let m = self.rows;
            let p = self.r_diag.len();
            let mut qt = Array2DRowRealMatrix::new(m, m);
            let qta = qt.data_mut();
            for minor in p..m {
                qta[minor][minor] = 1.0;
            }
            for minor in (0..p).rev() {
                let qrt_minor = &self.qrt[minor];
                qta[minor][minor] = 1.0;
                if qrt_minor[minor] != 0.0 {
                    for col in minor..m {
                        let mut alpha: f64 =
                            (minor..m).map(|row| qta[col][row] * qrt_minor[row]).sum();
                        alpha /= self.r_diag[minor] * qrt_minor[minor];
                        for row in minor..m {
                            qta[col][row] += alpha * qrt_minor[row];
                        }
                    }
                }
            }
            qt
        })
    }

    /// Householder vectors, one per column, lower trapezoidal (`m × n`).
    pub fn get_h(&self) -> &Array2DRowRealMatrix {
        self.cached_h.get_or_init(|| {
            let mut h = Array2DRowRealMatrix::new(self.rows, self.columns);
            for i in 0..self.rows {
                for j in 0..(i + 1).min(self.columns) {
                    h.data_mut()[i][j] = self.qrt[j][i] / -self.r_diag[j];
                }
            }
            h
        })
    }

    fn is_full_rank(&self) -> bool {
        self.r_diag.iter().all(|d| d.abs() > self.threshold)
    }

    pub fn get_solver(&self) -> QRSolver<'_> {
        QRSolver { qr: self }
    }

    /// Applies `H_{p-1}⋯H_0` (that is `Qᵗ`) to `y` in place.
    fn apply_qt(&self, y: &mut [f64]) {
        for minor in 0..self.r_diag.len() {
            self.reflect(minor, y);
        }
    }

    /// Applies `H_0⋯H_{p-1}` (that is `Q`) to `y` in place.
    fn apply_q(&self, y: &mut [f64]) {
        for minor in (0..self.r_diag.len()).rev() {
            self.reflect(minor, y);
        }
    }

    fn reflect(&self, minor: usize, y: &mut [f64]) {
        let qrt_minor = &self.qrt[minor];
        if qrt_minor[minor] == 0.0 {
            return;
        }
        let mut dot: f64 = (minor..self.rows).map(|row| y[row] * qrt_minor[row]).sum();
        dot /= self.r_diag[minor] * qrt_minor[minor];
        for row in minor..self.rows {
            y[row] += dot * qrt_minor[row];
        }
    }

    /// Least squares solution for `rows >= columns`.
    fn solve_tall(&self, b: &[f64]) -> Vec<f64> {
        let mut y = b.to_vec();
        self.apply_qt(&mut y);
        let n = self.columns;
        let mut x = vec![0.0; n];
        for row in (0..n).rev() {
            y[row] /= self.r_diag[row];
            let y_row = y[row];
            x[row] = y_row;
            for i in 0..row {
                y[i] -= y_row * self.qrt[row][i];
            }
        }
        x
    }

    /// Minimum norm solution `x = Q·R⁻ᵗ·b` from the decomposition of `Aᵗ`.
    fn solve_wide(transposed: &QRDecomposition, b: &[f64]) -> Vec<f64> {
        let m = b.len();
        let mut z = vec![0.0; transposed.rows];
        for i in 0..m {
            let mut sum = b[i];
            for k in 0..i {
                sum -= transposed.qrt[i][k] * z[k];
            }
            z[i] = sum / transposed.r_diag[i];
        }
        transposed.apply_q(&mut z);
        z
    }
}

pub struct QRSolver<'a> {
    qr: &'a QRDecomposition,
}

impl DecompositionSolver for QRSolver<'_> {
    fn solve(&self, b: &dyn RealVector) -> Result<ArrayRealVector> {
        if b.dimension() != self.qr.rows {
            return Err(LinAlgError::DimensionMismatch {
                got: b.dimension(),
                expected: self.qr.rows,
            });
        }
        if !self.is_non_singular() {
            return Err(LinAlgError::Singular);
        }
        let b = b.to_array();
        let x = match &self.qr.transposed {
            Some(transposed) => QRDecomposition::solve_wide(transposed, &b),
            None => self.qr.solve_tall(&b),
        };
        Ok(ArrayRealVector::from_vec(x))
    }

    fn is_non_singular(&self) -> bool {
        self.qr.is_full_rank() && self.qr.transposed.as_ref().is_none_or(|t| t.is_full_rank())
    }

    fn row_dimension(&self) -> usize {
        self.qr.rows
    }

    fn column_dimension(&self) -> usize {
        self.qr.columns
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iterative_solvers::linear_operator::RealLinearOperator;
    use crate::matrices::matrix_utils::create_real_identity_matrix;
    use approx::assert_relative_eq;
    use rand::Rng;

    fn assert_matrix_eq(a: &dyn RealMatrix, b: &dyn RealMatrix, eps: f64) {
        assert_eq!(a.row_dimension(), b.row_dimension());
        assert_eq!(a.column_dimension(), b.column_dimension());
        for i in 0..a.row_dimension() {
            for j in 0..a.column_dimension() {
                assert_relative_eq!(a.entry(i, j), b.entry(i, j), epsilon = eps);
            }
        }
    }

    fn random_matrix(rows: usize, columns: usize) -> Array2DRowRealMatrix {
        let mut rng = rand::rng();
        Array2DRowRealMatrix::from_rows(
            (0..rows)
                .map(|_| (0..columns).map(|_| rng.random_range(-1.0..1.0)).collect())
                .collect(),
        )
        .unwrap()
    }

    fn shapes() -> Vec<Array2DRowRealMatrix> {
        vec![
            Array2DRowRealMatrix::from_rows(vec![
                vec![12.0, -51.0, 4.0],
                vec![6.0, 167.0, -68.0],
                vec![-4.0, 24.0, -41.0],
            ])
            .unwrap(),
            random_matrix(5, 3),
            random_matrix(3, 5),
        ]
    }

    #[test]
    fn test_q_times_r_is_a() {
        for a in shapes() {
            let qr = QRDecomposition::new(&a);
            let product = qr.get_q().multiply(qr.get_r()).unwrap();
            assert_matrix_eq(product.as_ref(), &a, 1e-12);
        }
    }

    #[test]
    fn test_q_is_orthogonal_and_r_upper() {
        for a in shapes() {
            let qr = QRDecomposition::new(&a);
            let qtq = qr.get_qt().multiply(qr.get_q()).unwrap();
            assert_matrix_eq(qtq.as_ref(), &create_real_identity_matrix(a.row_dimension()), 1e-13);
            let r = qr.get_r();
            for i in 0..r.row_dimension() {
                for j in 0..i.min(r.column_dimension()) {
                    assert_eq!(r.entry(i, j), 0.0);
                }
            }
            let h = qr.get_h();
            for i in 0..h.row_dimension() {
                for j in (i + 1)..h.column_dimension() {
                    assert_eq!(h.entry(i, j), 0.0);
                }
            }
        }
    }

    #[test]
    fn test_known_r_factor() {
        let shapes = shapes();
        let r = QRDecomposition::new(&shapes[0]).get_r().clone();
        let expected = Array2DRowRealMatrix::from_rows(vec![
            vec![-14.0, -21.0, 14.0],
            vec![0.0, -175.0, 70.0],
            vec![0.0, 0.0, 35.0],
        ])
        .unwrap();
        assert_matrix_eq(&r, &expected, 1e-12);
    }

    #[test]
    fn test_random_shapes_reconstruct() {
        for (rows, columns) in [(7, 4), (6, 6), (4, 7)] {
            let a = random_matrix(rows, columns);
            let qr = QRDecomposition::new(&a);
            let q = qr.get_q();
            let product = q.multiply(qr.get_r()).unwrap();
            assert_matrix_eq(product.as_ref(), &a, 1e-12);
            let qtq = q.transpose_multiply(q).unwrap();
            assert_matrix_eq(qtq.as_ref(), &create_real_identity_matrix(rows), 1e-13);
        }
    }

    #[test]
    fn test_factors_are_memoized() {
        let qr = QRDecomposition::new(&random_matrix(4, 3));
        assert!(std::ptr::eq(qr.get_q(), qr.get_q()));
        assert!(std::ptr::eq(qr.get_qt(), qr.get_qt()));
        assert!(std::ptr::eq(qr.get_r(), qr.get_r()));
        assert!(std::ptr::eq(qr.get_h(), qr.get_h()));
    }

    #[test]
    fn test_square_solve() {
        let shapes = shapes();
        let a = &shapes[0];
        let x = ArrayRealVector::from_vec(vec![1.0, -2.0, 0.5]);
        let b = a.operate(&x).unwrap();
        let solved = QRDecomposition::new(a).get_solver().solve(&b).unwrap();
        for i in 0..3 {
            assert_relative_eq!(solved[i], x[i], epsilon = 1e-12);
        }
    }

    #[test]
    fn test_tall_least_squares_matches_normal_equations() {
        // fit y = c0 + c1 t through four points
        let a = Array2DRowRealMatrix::from_rows(vec![
            vec![1.0, 0.0],
            vec![1.0, 1.0],
            vec![1.0, 2.0],
            vec![1.0, 3.0],
        ])
        .unwrap();
        let b = ArrayRealVector::from_vec(vec![1.0, 2.0, 2.0, 4.0]);
        let x = QRDecomposition::new(&a).get_solver().solve(&b).unwrap();
        assert_relative_eq!(x[0], 0.9, epsilon = 1e-12);
        assert_relative_eq!(x[1], 0.9, epsilon = 1e-12);
        // residual is orthogonal to the columns
        let residual = a.operate(&x).unwrap().subtract(&b).unwrap();
        let at_r = a.operate_transpose(&residual).unwrap();
        assert_relative_eq!(at_r.get_norm(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_wide_minimum_norm_solution() {
        let a = Array2DRowRealMatrix::from_rows(vec![vec![1.0, 1.0, 0.0], vec![0.0, 1.0, 1.0]])
            .unwrap();
        let b = ArrayRealVector::from_vec(vec![1.0, 1.0]);
        let solver_qr = QRDecomposition::new(&a);
        let x = solver_qr.get_solver().solve(&b).unwrap();
        assert_relative_eq!(a.operate(&x).unwrap().get_distance(&b).unwrap(), 0.0, epsilon = 1e-14);
        // minimum norm solution lies in the row space: (1/3, 2/3, 1/3)
        assert_relative_eq!(x[0], 1.0 / 3.0, epsilon = 1e-14);
        assert_relative_eq!(x[1], 2.0 / 3.0, epsilon = 1e-14);
        assert_relative_eq!(x[2], 1.0 / 3.0, epsilon = 1e-14);
        let pinv = solver_qr.get_solver().get_inverse().unwrap();
        assert_eq!((pinv.row_dimension(), pinv.column_dimension()), (3, 2));
        let a_pinv = a.multiply(&pinv).unwrap();
        assert_matrix_eq(a_pinv.as_ref(), &create_real_identity_matrix(2), 1e-14);
    }

    #[test]
    fn test_rank_deficiency_is_reported_at_solve_time() {
        let a = Array2DRowRealMatrix::from_rows(vec![
            vec![1.0, 2.0, 3.0],
            vec![2.0, 4.0, 6.0],
            vec![1.0, 1.0, 1.0],
        ])
        .unwrap();
        let qr = QRDecomposition::with_threshold(&a, 1e-10);
        let product = qr.get_q().multiply(qr.get_r()).unwrap();
        assert_matrix_eq(product.as_ref(), &a, 1e-12);
        assert!(!qr.get_solver().is_non_singular());
        let b = ArrayRealVector::from_vec(vec![1.0, 1.0, 1.0]);
        assert!(matches!(qr.get_solver().solve(&b), Err(LinAlgError::Singular)));
        let short = ArrayRealVector::from_vec(vec![1.0]);
        assert!(matches!(
            qr.get_solver().solve(&short),
            Err(LinAlgError::DimensionMismatch { .. })
        ));
    }
}
