//! Eigen decomposition of a real symmetric matrix, `A = V·D·Vᵗ`.
//!
//! The matrix is first reduced to tridiagonal form, then the implicit shift
//! QL algorithm runs on the tridiagonal matrix. Eigenvalues are sorted, in
//! decreasing order unless asked otherwise, and eigenvectors follow them.
use std::cell::OnceCell;

use log::{debug, warn};

use crate::decompositions::decomposition_solver::DecompositionSolver;
use crate::decompositions::tri_diagonal_transformer::TriDiagonalTransformer;
use crate::linalg_error::{LinAlgError, Result};
use crate::matrices::array2d_real_matrix::Array2DRowRealMatrix;
use crate::matrices::diagonal_matrix::DiagonalMatrix;
use crate::matrices::matrix_utils::check_symmetric;
use crate::matrices::real_matrix::RealMatrix;
use crate::matrices::real_vector::{ArrayRealVector, RealVector};

/// Tolerance of the symmetry check and of the solver singularity test.
pub const DEFAULT_EPSILON: f64 = 1e-12;
/// QL sweeps allowed per eigenvalue.
const MAX_ITER: usize = 30;
/// Relative magnitude below which diagonal entries and eigenvalues are flushed to zero.
const PRECISION_EPSILON: f64 = f64::EPSILON / 2.0;

#[derive(Debug)]
pub struct EigenDecompositionSymmetric {
    epsilon: f64,
    eigenvalues: Vec<f64>,
    eigenvectors: Vec<ArrayRealVector>,
    cached_v: OnceCell<Array2DRowRealMatrix>,
    cached_d: OnceCell<DiagonalMatrix>,
    cached_vt: OnceCell<Array2DRowRealMatrix>,
}

impl EigenDecompositionSymmetric {
    pub fn new(matrix: &dyn RealMatrix) -> Result<Self> {
        Self::with_options(matrix, DEFAULT_EPSILON, true)
    }

    pub fn with_options(matrix: &dyn RealMatrix, epsilon: f64, decreasing: bool) -> Result<Self> {
        check_symmetric(matrix, epsilon)?;
        let transformer = TriDiagonalTransformer::new(matrix)?;
        let (eigenvalues, eigenvectors) = find_eigen_vectors(
            transformer.get_main_diagonal().to_vec(),
            transformer.get_secondary_diagonal(),
            transformer.get_q().data_ref().to_vec(),
            decreasing,
        )?;
        Ok(Self::assemble(epsilon, eigenvalues, eigenvectors))
    }

    /// Decomposition of the symmetric tridiagonal matrix with the given main
    /// and secondary diagonals; the reduction stage is skipped.
    pub fn from_tridiagonal(main: &[f64], secondary: &[f64]) -> Result<Self> {
        Self::from_tridiagonal_with_options(main, secondary, DEFAULT_EPSILON, true)
    }

    pub fn from_tridiagonal_with_options(
        main: &[f64],
        secondary: &[f64],
        epsilon: f64,
        decreasing: bool,
    ) -> Result<Self> {
        let size = main.len();
        if size == 0 {
            return Err(LinAlgError::NoData);
        }
        if secondary.len() != size - 1 {
            return Err(LinAlgError::DimensionMismatch {
                got: secondary.len(),
                expected: size - 1,
            });
        }
        let mut z = vec![vec![0.0; size]; size];
        for (i, row) in z.iter_mut().enumerate() {
            row[i] = 1.0;
        }
        let (eigenvalues, eigenvectors) = find_eigen_vectors(main.to_vec(), secondary, z, decreasing)?;
        Ok(Self::assemble(epsilon, eigenvalues, eigenvectors))
    }

    fn assemble(epsilon: f64, eigenvalues: Vec<f64>, eigenvectors: Vec<ArrayRealVector>) -> Self {
        EigenDecompositionSymmetric {
            epsilon,
            eigenvalues,
            eigenvectors,
            cached_v: OnceCell::new(),
            cached_d: OnceCell::new(),
            cached_vt: OnceCell::new(),
        }
    }

    /// Eigenvectors as columns.
    pub fn get_v(&self) -> &Array2DRowRealMatrix {
        self.cached_v
            .get_or_init(|| self.get_vt().transpose_dense())
    }

    pub fn get_d(&self) -> &DiagonalMatrix {
        self.cached_d
            .get_or_init(|| DiagonalMatrix::from_slice(&self.eigenvalues))
    }

    /// Eigenvectors as rows.
    pub fn get_vt(&self) -> &Array2DRowRealMatrix {
        self.cached_vt.get_or_init(|| {
            Array2DRowRealMatrix::from_rows_unchecked(
                self.eigenvectors.iter().map(|v| v.data_ref().to_vec()).collect(),
            )
        })
    }

    pub fn get_epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn get_eigenvalues(&self) -> &[f64] {
        &self.eigenvalues
    }

    /// Eigenvalue `i`; panics when `i` is not below the dimension.
    pub fn get_eigenvalue(&self, i: usize) -> f64 {
        self.eigenvalues[i]
    }

    /// Eigenvector `i`; panics when `i` is not below the dimension.
    pub fn get_eigenvector(&self, i: usize) -> &ArrayRealVector {
        &self.eigenvectors[i]
    }

    pub fn get_determinant(&self) -> f64 {
        self.eigenvalues.iter().product()
    }

    /// `V·√D·Vᵗ`; every eigenvalue must be strictly positive.
    pub fn get_square_root(&self) -> Result<Array2DRowRealMatrix> {
        let mut sqrt_eigenvalues = Vec::with_capacity(self.eigenvalues.len());
        for &eigen in &self.eigenvalues {
            if eigen <= 0.0 {
                return Err(LinAlgError::UnsupportedOperation(format!(
                    "square root of a matrix with eigenvalue {}",
                    eigen
                )));
            }
            sqrt_eigenvalues.push(eigen.sqrt());
        }
        let sqrt_d = DiagonalMatrix::from_vec(sqrt_eigenvalues);
        let v_sqrt_d = self.get_v().multiply(&sqrt_d)?;
        Ok(Array2DRowRealMatrix::from_matrix(
            v_sqrt_d.multiply(self.get_vt())?.as_ref(),
        ))
    }

    pub fn get_solver(&self) -> EigenSymmetricSolver<'_> {
        EigenSymmetricSolver { eigen: self }
    }
}

/// Implicit shift QL on the tridiagonal matrix; `z` starts as the reduction's
/// `Q` (or the identity) and accumulates the rotations.
fn find_eigen_vectors(
    main: Vec<f64>,
    secondary: &[f64],
    mut z: Vec<Vec<f64>>,
    decreasing: bool,
) -> Result<(Vec<f64>, Vec<ArrayRealVector>)> {
    let n = main.len();
    let mut eigenvalues = main;
    let mut e = vec![0.0; n];
    e[..n.saturating_sub(1)].copy_from_slice(&secondary[..n.saturating_sub(1)]);

    let max_absolute_value = eigenvalues
        .iter()
        .chain(e.iter())
        .fold(0.0_f64, |max, x| max.max(x.abs()));
    if max_absolute_value != 0.0 {
        for i in 0..n {
            if eigenvalues[i].abs() <= PRECISION_EPSILON * max_absolute_value {
                eigenvalues[i] = 0.0;
            }
            if e[i].abs() <= PRECISION_EPSILON * max_absolute_value {
                e[i] = 0.0;
            }
        }
    }

    for j in 0..n {
        let mut its = 0;
        loop {
            let mut m = j;
            while m + 1 < n {
                let delta = eigenvalues[m].abs() + eigenvalues[m + 1].abs();
                if e[m].abs() + delta == delta {
                    break;
                }
                m += 1;
            }
            if m == j {
                break;
            }
            if its == MAX_ITER {
                warn!("symmetric eigen: no convergence for eigenvalue {} after {} sweeps", j, MAX_ITER);
                return Err(LinAlgError::ConvergenceFailed {
                    max_iterations: MAX_ITER,
                });
            }
            its += 1;

            let mut q = (eigenvalues[j + 1] - eigenvalues[j]) / (2.0 * e[j]);
            let mut t = (1.0 + q * q).sqrt();
            q = if q < 0.0 {
                eigenvalues[m] - eigenvalues[j] + e[j] / (q - t)
            } else {
                eigenvalues[m] - eigenvalues[j] + e[j] / (q + t)
            };
            let mut u = 0.0;
            let mut s = 1.0;
            let mut c = 1.0;
            let mut i = m as isize - 1;
            while i >= j as isize {
                let iu = i as usize;
                let mut p = s * e[iu];
                let h = c * e[iu];
                if p.abs() >= q.abs() {
                    c = q / p;
                    t = (c * c + 1.0).sqrt();
                    e[iu + 1] = p * t;
                    s = 1.0 / t;
                    c *= s;
                } else {
                    s = p / q;
                    t = (s * s + 1.0).sqrt();
                    e[iu + 1] = q * t;
                    c = 1.0 / t;
                    s *= c;
                }
                if e[iu + 1] == 0.0 {
                    eigenvalues[iu + 1] -= u;
                    e[m] = 0.0;
                    break;
                }
                q = eigenvalues[iu + 1] - u;
                t = (eigenvalues[iu] - q) * s + 2.0 * c * h;
                u = s * t;
                eigenvalues[iu + 1] = q + u;
                q = c * t - h;
                for row in z.iter_mut() {
                    p = row[iu + 1];
                    row[iu + 1] = s * row[iu] + c * p;
                    row[iu] = c * row[iu] - s * p;
                }
                i -= 1;
            }
            if t == 0.0 && i >= j as isize {
                continue;
            }
            eigenvalues[j] -= u;
            e[j] = q;
            e[m] = 0.0;
        }
    }

    // selection sort, swapping eigenvector columns along
    for i in 0..n {
        let mut k = i;
        let mut p = eigenvalues[i];
        for (j, &value) in eigenvalues.iter().enumerate().skip(i + 1) {
            if (value > p) == decreasing {
                k = j;
                p = value;
            }
        }
        if k != i {
            eigenvalues[k] = eigenvalues[i];
            eigenvalues[i] = p;
            for row in z.iter_mut() {
                row.swap(i, k);
            }
        }
    }

    let max_absolute_value = eigenvalues.iter().fold(0.0_f64, |max, x| max.max(x.abs()));
    if max_absolute_value != 0.0 {
        for value in eigenvalues.iter_mut() {
            if value.abs() < PRECISION_EPSILON * max_absolute_value {
                *value = 0.0;
            }
        }
    }
    debug!("symmetric eigen: eigenvalues {:?}", eigenvalues);

    let eigenvectors = (0..n)
        .map(|i| ArrayRealVector::from_vec(z.iter().map(|row| row[i]).collect()))
        .collect();
    Ok((eigenvalues, eigenvectors))
}

pub struct EigenSymmetricSolver<'a> {
    eigen: &'a EigenDecompositionSymmetric,
}

impl DecompositionSolver for EigenSymmetricSolver<'_> {
    /// `Σ (vᵢ·b / λᵢ) vᵢ`
    fn solve(&self, b: &dyn RealVector) -> Result<ArrayRealVector> {
        if !self.is_non_singular() {
            return Err(LinAlgError::Singular);
        }
        let m = self.eigen.eigenvalues.len();
        if b.dimension() != m {
            return Err(LinAlgError::DimensionMismatch {
                got: b.dimension(),
                expected: m,
            });
        }
        let mut bp = ArrayRealVector::new(m);
        for (v, lambda) in self.eigen.eigenvectors.iter().zip(&self.eigen.eigenvalues) {
            let s = v.dot_product(b)? / lambda;
            bp.axpy(s, v)?;
        }
        Ok(bp)
    }

    /// Singular when the largest eigenvalue is 0 or some `|λ|/max|λ|` is within epsilon of 0.
    fn is_non_singular(&self) -> bool {
        let largest = self
            .eigen
            .eigenvalues
            .iter()
            .fold(0.0_f64, |max, x| max.max(x.abs()));
        if largest == 0.0 {
            return false;
        }
        self.eigen
            .eigenvalues
            .iter()
            .all(|x| x.abs() / largest > self.eigen.epsilon)
    }

    fn get_inverse(&self) -> Result<Array2DRowRealMatrix> {
        if !self.is_non_singular() {
            return Err(LinAlgError::Singular);
        }
        let m = self.eigen.eigenvalues.len();
        let mut inverse = Array2DRowRealMatrix::new(m, m);
        for (v, lambda) in self.eigen.eigenvectors.iter().zip(&self.eigen.eigenvalues) {
            let v = v.data_ref();
            for (i, row) in inverse.data_mut().iter_mut().enumerate() {
                for (j, value) in row.iter_mut().enumerate() {
                    *value += v[i] * v[j] / lambda;
                }
            }
        }
        Ok(inverse)
    }

    fn row_dimension(&self) -> usize {
        self.eigen.eigenvalues.len()
    }

    fn column_dimension(&self) -> usize {
        self.eigen.eigenvalues.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iterative_solvers::linear_operator::RealLinearOperator;
    use crate::matrices::matrix_utils::create_real_identity_matrix;
    use approx::assert_relative_eq;
    use nalgebra::{DMatrix, SymmetricEigen};
    use rand::Rng;

    fn assert_matrix_eq(a: &dyn RealMatrix, b: &dyn RealMatrix, eps: f64) {
        for i in 0..a.row_dimension() {
            for j in 0..a.column_dimension() {
                assert_relative_eq!(a.entry(i, j), b.entry(i, j), epsilon = eps);
            }
        }
    }

    fn check_decomposition(a: &Array2DRowRealMatrix, ed: &EigenDecompositionSymmetric, eps: f64) {
        let n = a.row_dimension();
        let vdvt = ed
            .get_v()
            .multiply(ed.get_d())
            .unwrap()
            .multiply(ed.get_vt())
            .unwrap();
        assert_matrix_eq(vdvt.as_ref(), a, eps);
        let vtv = ed.get_vt().multiply(ed.get_v()).unwrap();
        assert_matrix_eq(vtv.as_ref(), &create_real_identity_matrix(n), 1e-13);
        for i in 0..n {
            let v = ed.get_eigenvector(i);
            let av = a.operate(v).unwrap();
            let lv = v.map_multiply(ed.get_eigenvalue(i));
            assert_relative_eq!(av.get_distance(&lv).unwrap(), 0.0, epsilon = eps);
        }
    }

    fn random_symmetric(n: usize) -> Array2DRowRealMatrix {
        let mut rng = rand::rng();
        let mut data = vec![vec![0.0; n]; n];
        for i in 0..n {
            for j in i..n {
                let x = rng.random_range(-1.0..1.0);
                data[i][j] = x;
                data[j][i] = x;
            }
        }
        Array2DRowRealMatrix::from_rows(data).unwrap()
    }

    #[test]
    fn test_tridiagonal_matrix() {
        let a = Array2DRowRealMatrix::from_rows(vec![
            vec![2.0, 1.0, 0.0],
            vec![1.0, 2.0, 1.0],
            vec![0.0, 1.0, 2.0],
        ])
        .unwrap();
        let ed = EigenDecompositionSymmetric::new(&a).unwrap();
        let r2 = 2.0_f64.sqrt();
        assert_relative_eq!(ed.get_eigenvalue(0), 2.0 + r2, epsilon = 1e-14);
        assert_relative_eq!(ed.get_eigenvalue(1), 2.0, epsilon = 1e-14);
        assert_relative_eq!(ed.get_eigenvalue(2), 2.0 - r2, epsilon = 1e-14);
        check_decomposition(&a, &ed, 1e-13);
        assert_relative_eq!(ed.get_determinant(), 4.0, epsilon = 1e-13);

        let direct = EigenDecompositionSymmetric::from_tridiagonal(&[2.0, 2.0, 2.0], &[1.0, 1.0])
            .unwrap();
        for i in 0..3 {
            assert_relative_eq!(direct.get_eigenvalue(i), ed.get_eigenvalue(i), epsilon = 1e-14);
        }
        check_decomposition(&a, &direct, 1e-13);
        assert!(EigenDecompositionSymmetric::from_tridiagonal(&[1.0, 2.0], &[]).is_err());
    }

    #[test]
    fn test_random_against_nalgebra() {
        let a = random_symmetric(8);
        let ed = EigenDecompositionSymmetric::new(&a).unwrap();
        check_decomposition(&a, &ed, 1e-12);
        let oracle = SymmetricEigen::new(DMatrix::from_fn(8, 8, |i, j| a.entry(i, j)));
        let mut expected: Vec<f64> = oracle.eigenvalues.iter().copied().collect();
        expected.sort_by(|x, y| y.total_cmp(x));
        for (got, want) in ed.get_eigenvalues().iter().zip(&expected) {
            assert_relative_eq!(got, want, epsilon = 1e-12);
        }
        let increasing = EigenDecompositionSymmetric::with_options(&a, DEFAULT_EPSILON, false).unwrap();
        assert_relative_eq!(increasing.get_eigenvalue(0), expected[7], epsilon = 1e-12);
    }

    #[test]
    fn test_repeated_eigenvalue() {
        let a = Array2DRowRealMatrix::from_rows(vec![
            vec![3.0, 2.0, 4.0],
            vec![2.0, 0.0, 2.0],
            vec![4.0, 2.0, 3.0],
        ])
        .unwrap();
        let ed = EigenDecompositionSymmetric::new(&a).unwrap();
        assert_relative_eq!(ed.get_eigenvalue(0), 8.0, epsilon = 1e-13);
        assert_relative_eq!(ed.get_eigenvalue(1), -1.0, epsilon = 1e-13);
        assert_relative_eq!(ed.get_eigenvalue(2), -1.0, epsilon = 1e-13);
        check_decomposition(&a, &ed, 1e-13);
        // the dominant eigenvector is a multiple of (2, 1, 2)
        let v = ed.get_eigenvector(0);
        let expected = ArrayRealVector::from_vec(vec![2.0, 1.0, 2.0]);
        assert_relative_eq!(v.cosine(&expected).unwrap().abs(), 1.0, epsilon = 1e-13);
    }

    #[test]
    fn test_tiny_matrix_is_scale_invariant() {
        let base = random_symmetric(5);
        let tiny = Array2DRowRealMatrix::from_matrix(base.scalar_multiply(1e-20).unwrap().as_ref());
        let ed_base = EigenDecompositionSymmetric::new(&base).unwrap();
        let ed_tiny = EigenDecompositionSymmetric::new(&tiny).unwrap();
        for i in 0..5 {
            assert_relative_eq!(
                ed_tiny.get_eigenvalue(i) * 1e20,
                ed_base.get_eigenvalue(i),
                epsilon = 1e-12
            );
        }
        assert!(ed_tiny.get_solver().is_non_singular());
    }

    #[test]
    fn test_small_eigenvalue_out_of_order_is_not_singular() {
        let a = Array2DRowRealMatrix::from_rows(vec![
            vec![3.0, 0.0, 0.0],
            vec![0.0, 1e-9, 0.0],
            vec![0.0, 0.0, 1.0],
        ])
        .unwrap();
        let ed = EigenDecompositionSymmetric::new(&a).unwrap();
        assert_eq!(ed.get_eigenvalues(), &[3.0, 1.0, 1e-9]);
        let solver = ed.get_solver();
        assert!(solver.is_non_singular());
        let x = solver.solve(&ArrayRealVector::from_vec(vec![3.0, 1e-9, 1.0])).unwrap();
        for i in 0..3 {
            assert_relative_eq!(x[i], 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_solver_and_inverse() {
        let a = Array2DRowRealMatrix::from_rows(vec![
            vec![4.0, 12.0, -16.0],
            vec![12.0, 37.0, -43.0],
            vec![-16.0, -43.0, 98.0],
        ])
        .unwrap();
        let ed = EigenDecompositionSymmetric::new(&a).unwrap();
        let inverse = ed.get_solver().get_inverse().unwrap();
        let product = a.multiply(&inverse).unwrap();
        assert_matrix_eq(product.as_ref(), &create_real_identity_matrix(3), 1e-9);
        let b = ArrayRealVector::from_vec(vec![1.0, 2.0, 3.0]);
        let x = ed.get_solver().solve(&b).unwrap();
        assert_relative_eq!(a.operate(&x).unwrap().get_distance(&b).unwrap(), 0.0, epsilon = 1e-10);
        let root = ed.get_square_root().unwrap();
        let squared = root.multiply(&root).unwrap();
        assert_matrix_eq(squared.as_ref(), &a, 1e-9);
    }

    #[test]
    fn test_square_root_of_random_positive_definite() {
        for n in [2, 4, 7] {
            let b = random_symmetric(n);
            let mut a = Array2DRowRealMatrix::from_matrix(b.multiply(&b).unwrap().as_ref());
            for i in 0..n {
                a.add_to_entry(i, i, 1.0).unwrap();
            }
            let root = EigenDecompositionSymmetric::new(&a).unwrap().get_square_root().unwrap();
            let squared = root.multiply(&root).unwrap();
            assert_matrix_eq(squared.as_ref(), &a, 1e-10);
            // the principal root is symmetric
            assert_matrix_eq(&root.transpose_dense(), &root, 1e-10);
        }
    }

    #[test]
    #[should_panic]
    fn test_eigenvector_index_past_dimension_panics() {
        let ed = EigenDecompositionSymmetric::new(&random_symmetric(3)).unwrap();
        ed.get_eigenvector(3);
    }

    #[test]
    fn test_singular_and_invalid_inputs() {
        let singular = Array2DRowRealMatrix::from_rows(vec![vec![1.0, 1.0], vec![1.0, 1.0]]).unwrap();
        let ed = EigenDecompositionSymmetric::new(&singular).unwrap();
        assert!(!ed.get_solver().is_non_singular());
        let b = ArrayRealVector::from_vec(vec![1.0, 1.0]);
        assert!(matches!(ed.get_solver().solve(&b), Err(LinAlgError::Singular)));

        let indefinite = Array2DRowRealMatrix::from_rows(vec![vec![1.0, 2.0], vec![2.0, 1.0]]).unwrap();
        let ed = EigenDecompositionSymmetric::new(&indefinite).unwrap();
        assert_relative_eq!(ed.get_eigenvalue(1), -1.0, epsilon = 1e-14);
        assert!(matches!(
            ed.get_square_root(),
            Err(LinAlgError::UnsupportedOperation(_))
        ));

        let zero = EigenDecompositionSymmetric::new(&Array2DRowRealMatrix::new(2, 2)).unwrap();
        assert!(!zero.get_solver().is_non_singular());

        let non_symmetric =
            Array2DRowRealMatrix::from_rows(vec![vec![1.0, 2.0], vec![3.0, 1.0]]).unwrap();
        assert!(matches!(
            EigenDecompositionSymmetric::new(&non_symmetric),
            Err(LinAlgError::NonSymmetric { .. })
        ));
        assert!(matches!(
            EigenDecompositionSymmetric::new(&Array2DRowRealMatrix::new(2, 3)),
            Err(LinAlgError::NonSquare { .. })
        ));
    }

    #[test]
    fn test_factors_are_memoized() {
        let ed = EigenDecompositionSymmetric::new(&random_symmetric(4)).unwrap();
        assert!(std::ptr::eq(ed.get_v(), ed.get_v()));
        assert!(std::ptr::eq(ed.get_d(), ed.get_d()));
        assert!(std::ptr::eq(ed.get_vt(), ed.get_vt()));
    }
}
