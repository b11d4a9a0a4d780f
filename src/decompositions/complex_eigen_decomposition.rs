//! Eigen decomposition of a real square matrix over the complex numbers,
//! `A·V = V·D` with `D` diagonal and complex.
//!
//! Eigenvalues are read off the real Schur form; each eigenvector comes from
//! two steps of inverse iteration on `A - (λ + ε)·I`, started from the all-ones
//! vector. An eigenvector orthogonal to that start vector (for instance in a
//! symmetric matrix that has `(1, …, 1)` as another eigenvector) is never
//! reached, and the `A·V = V·D` check then fails with `DecompositionFailed`.
use std::cell::OnceCell;

use log::{debug, warn};
use num_complex::Complex;

use crate::decompositions::decomposition_solver::FieldDecompositionSolver;
use crate::decompositions::eigen_decomposition_non_symmetric::eigenvalues_from_schur;
use crate::decompositions::field_lu_decomposition::FieldLUDecomposition;
use crate::decompositions::schur_transformer::SchurTransformer;
use crate::linalg_error::{LinAlgError, Result};
use crate::matrices::array2d_field_matrix::Array2DRowFieldMatrix;
use crate::matrices::field::Field;
use crate::matrices::field_matrix::FieldMatrix;
use crate::matrices::field_vector::ArrayFieldVector;
use crate::matrices::matrix_utils::{create_field_diagonal_matrix, real_to_field_matrix};
use crate::matrices::real_matrix::RealMatrix;

/// Shift added to each eigenvalue before inverse iteration, also the
/// threshold for a Schur subdiagonal entry and for a non-zero imaginary part.
pub const DEFAULT_EPSILON: f64 = 1e-12;
/// Entry-wise tolerance of the `A·V = V·D` check.
pub const DEFAULT_EPSILON_AV_VD_CHECK: f64 = 1e-6;

#[derive(Debug)]
pub struct ComplexEigenDecomposition {
    pub(crate) eigenvalues: Vec<Complex<f64>>,
    pub(crate) eigenvectors: Vec<ArrayFieldVector<Complex<f64>>>,
    pub(crate) v: Array2DRowFieldMatrix<Complex<f64>>,
    pub(crate) d: Array2DRowFieldMatrix<Complex<f64>>,
    epsilon: f64,
    cached_vt: OnceCell<Array2DRowFieldMatrix<Complex<f64>>>,
}

impl ComplexEigenDecomposition {
    pub fn new(matrix: &dyn RealMatrix) -> Result<Self> {
        Self::with_tolerances(matrix, DEFAULT_EPSILON, DEFAULT_EPSILON_AV_VD_CHECK)
    }

    pub fn with_tolerances(matrix: &dyn RealMatrix, epsilon: f64, epsilon_av_vd_check: f64) -> Result<Self> {
        if !matrix.is_square() {
            return Err(LinAlgError::NonSquare {
                rows: matrix.row_dimension(),
                columns: matrix.column_dimension(),
            });
        }
        let schur = SchurTransformer::new(matrix)?;
        // absolute threshold on the subdiagonal
        let eigenvalues = eigenvalues_from_schur(schur.get_t().data_ref(), 1.0, epsilon);
        let a: Array2DRowFieldMatrix<Complex<f64>> = real_to_field_matrix(matrix);
        let eigenvectors = eigenvalues
            .iter()
            .map(|lambda| inverse_iteration(&a, *lambda, epsilon))
            .collect::<Result<Vec<_>>>()?;

        let n = eigenvectors.len();
        let mut v = Array2DRowFieldMatrix::new(n, n);
        for (k, ek) in eigenvectors.iter().enumerate() {
            v.set_column_vector(k, ek)?;
        }
        let d = create_field_diagonal_matrix(&eigenvalues);
        let decomposition = ComplexEigenDecomposition {
            eigenvalues,
            eigenvectors,
            v,
            d,
            epsilon,
            cached_vt: OnceCell::new(),
        };
        decomposition.check_definition(&a, epsilon_av_vd_check)?;
        Ok(decomposition)
    }

    /// Fails unless every entry of `A·V - V·D` is within `tolerance` in modulus.
    fn check_definition(&self, a: &Array2DRowFieldMatrix<Complex<f64>>, tolerance: f64) -> Result<()> {
        let av = a.multiply_dense(&self.v)?;
        let vd = self.v.multiply_dense(&self.d)?;
        for (row_av, row_vd) in av.data_ref().iter().zip(vd.data_ref()) {
            for (x, y) in row_av.iter().zip(row_vd) {
                let gap = (x - y).norm();
                if gap > tolerance {
                    warn!("complex eigen: |AV - VD| = {:e} above {:e}", gap, tolerance);
                    return Err(LinAlgError::DecompositionFailed(format!(
                        "A·V differs from V·D by {:e}",
                        gap
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn get_eigenvalues(&self) -> &[Complex<f64>] {
        &self.eigenvalues
    }

    /// Eigenvalue `i`; panics when `i` is not below the dimension.
    pub fn get_eigenvalue(&self, i: usize) -> Complex<f64> {
        self.eigenvalues[i]
    }

    /// Eigenvector `i`; panics when `i` is not below the dimension.
    pub fn get_eigenvector(&self, i: usize) -> &ArrayFieldVector<Complex<f64>> {
        &self.eigenvectors[i]
    }

    pub fn has_complex_eigenvalues(&self) -> bool {
        self.eigenvalues.iter().any(|z| z.im.abs() > self.epsilon)
    }

    /// Real part of the product of the eigenvalues.
    pub fn get_determinant(&self) -> f64 {
        self.eigenvalues
            .iter()
            .fold(Complex::new(1.0, 0.0), |det, lambda| det * lambda)
            .re
    }

    /// Eigenvectors as columns.
    pub fn get_v(&self) -> &Array2DRowFieldMatrix<Complex<f64>> {
        &self.v
    }

    pub fn get_d(&self) -> &Array2DRowFieldMatrix<Complex<f64>> {
        &self.d
    }

    pub fn get_vt(&self) -> &Array2DRowFieldMatrix<Complex<f64>> {
        self.cached_vt.get_or_init(|| self.v.transpose_dense())
    }

    pub(crate) fn reset_transpose(&mut self) {
        self.cached_vt = OnceCell::new();
    }
}

/// Two inverse iteration steps from the all-ones vector, each scaled by its
/// entry of largest modulus.
fn inverse_iteration(
    a: &Array2DRowFieldMatrix<Complex<f64>>,
    lambda: Complex<f64>,
    epsilon: f64,
) -> Result<ArrayFieldVector<Complex<f64>>> {
    let n = a.row_dimension();
    let mu = lambda + epsilon;
    let mut shifted = a.clone();
    for (i, row) in shifted.data_mut().iter_mut().enumerate() {
        row[i] -= mu;
    }
    let inverse = FieldLUDecomposition::new(&shifted)?.get_solver().get_inverse()?;

    let field = Field::<Complex<f64>>::new();
    let mut eigenvector = ArrayFieldVector::with_field(field, vec![Complex::new(1.0, 0.0); n]);
    for _ in 0..2 {
        let next = inverse.operate(&eigenvector)?;
        let norm = next
            .data_ref()
            .iter()
            .copied()
            .reduce(|largest, z| if largest.norm() < z.norm() { z } else { largest })
            .unwrap_or(Complex::new(1.0, 0.0));
        eigenvector = ArrayFieldVector::with_field(
            field,
            next.data_ref().iter().map(|z| z / norm).collect(),
        );
    }
    debug!("complex eigen: eigenvector for {} computed", lambda);
    Ok(eigenvector)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrices::array2d_real_matrix::Array2DRowRealMatrix;
    use crate::matrices::field_vector::FieldVector;
    use approx::assert_relative_eq;

    fn testdata() -> Array2DRowRealMatrix {
        Array2DRowRealMatrix::from_rows(vec![vec![3.0, -2.0], vec![4.0, -1.0]]).unwrap()
    }

    fn assert_complex_eq(got: Complex<f64>, expected: Complex<f64>, eps: f64) {
        assert_relative_eq!(got.re, expected.re, epsilon = eps);
        assert_relative_eq!(got.im, expected.im, epsilon = eps);
    }

    #[test]
    fn test_eigenvalues_and_determinant() {
        let ed = ComplexEigenDecomposition::new(&testdata()).unwrap();
        assert_complex_eq(ed.get_eigenvalue(0), Complex::new(1.0, 2.0), 1e-14);
        assert_complex_eq(ed.get_eigenvalue(1), Complex::new(1.0, -2.0), 1e-14);
        assert!(ed.has_complex_eigenvalues());
        assert_relative_eq!(ed.get_determinant(), 5.0, epsilon = 1e-10);
    }

    #[test]
    fn test_eigenvectors_and_factors() {
        let ed = ComplexEigenDecomposition::new(&testdata()).unwrap();
        let v0 = ed.get_eigenvector(0);
        assert_complex_eq(v0.entry(0), Complex::new(0.5, 0.5), 1e-10);
        assert_complex_eq(v0.entry(1), Complex::new(1.0, 0.0), 1e-10);
        let v1 = ed.get_eigenvector(1);
        assert_complex_eq(v1.entry(0), Complex::new(0.5, -0.5), 1e-10);
        assert_complex_eq(v1.entry(1), Complex::new(1.0, 0.0), 1e-10);

        let v = ed.get_v();
        assert_complex_eq(v.entry(0, 1), Complex::new(0.5, -0.5), 1e-10);
        assert_complex_eq(ed.get_vt().entry(1, 0), Complex::new(0.5, -0.5), 1e-10);
        assert_eq!(ed.get_d().entry(0, 1), Complex::new(0.0, 0.0));
        assert_complex_eq(ed.get_d().entry(1, 1), Complex::new(1.0, -2.0), 1e-14);
        assert!(std::ptr::eq(ed.get_vt(), ed.get_vt()));
    }

    #[test]
    fn test_real_spectrum() {
        let identity = Array2DRowRealMatrix::from_rows(vec![
            vec![1.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0],
            vec![0.0, 0.0, 1.0],
        ])
        .unwrap();
        let ed = ComplexEigenDecomposition::new(&identity).unwrap();
        assert_eq!(ed.get_eigenvalues().len(), 3);
        for z in ed.get_eigenvalues() {
            assert_eq!(*z, Complex::new(1.0, 0.0));
        }
        assert!(!ed.has_complex_eigenvalues());

        let a = Array2DRowRealMatrix::from_rows(vec![
            vec![2.0, 1.0, 0.0],
            vec![0.0, 3.0, 1.0],
            vec![0.0, 0.0, 5.0],
        ])
        .unwrap();
        let ed = ComplexEigenDecomposition::new(&a).unwrap();
        assert!(!ed.has_complex_eigenvalues());
        assert_relative_eq!(ed.get_determinant(), 30.0, epsilon = 1e-9);
        let mut spectrum: Vec<f64> = ed.get_eigenvalues().iter().map(|z| z.re).collect();
        spectrum.sort_by(|x, y| x.total_cmp(y));
        for (got, expected) in spectrum.iter().zip([2.0, 3.0, 5.0]) {
            assert_relative_eq!(*got, expected, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_start_vector_orthogonal_to_eigenvectors() {
        // (1, 1, 1) is the eigenvector of 0 and is orthogonal to those of 2 and 12
        let a = Array2DRowRealMatrix::from_rows(vec![
            vec![3.0, 1.0, -4.0],
            vec![1.0, 3.0, -4.0],
            vec![-4.0, -4.0, 8.0],
        ])
        .unwrap();
        assert!(matches!(
            ComplexEigenDecomposition::new(&a),
            Err(LinAlgError::DecompositionFailed(_))
        ));
    }

    #[test]
    fn test_failed_check_and_non_square() {
        // a loose shift makes the inverse iteration too inaccurate for a strict check
        assert!(matches!(
            ComplexEigenDecomposition::with_tolerances(&testdata(), 1e-2, 1e-12),
            Err(LinAlgError::DecompositionFailed(_))
        ));
        assert!(matches!(
            ComplexEigenDecomposition::new(&Array2DRowRealMatrix::new(2, 3)),
            Err(LinAlgError::NonSquare { .. })
        ));
    }
}
