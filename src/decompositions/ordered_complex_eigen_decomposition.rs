//! Complex eigen decomposition with eigenpairs sorted by a comparator on
//! the eigenvalues. Eigenvectors move with their eigenvalues and are scaled
//! to unit Euclidean norm; the order of equal eigenvalues is unspecified.
use std::cmp::Ordering;
use std::ops::Deref;

use num_complex::Complex;

use crate::decompositions::complex_eigen_decomposition::{
    ComplexEigenDecomposition, DEFAULT_EPSILON, DEFAULT_EPSILON_AV_VD_CHECK,
};
use crate::linalg_error::Result;
use crate::matrices::array2d_field_matrix::Array2DRowFieldMatrix;
use crate::matrices::field::Field;
use crate::matrices::field_matrix::FieldMatrix;
use crate::matrices::field_vector::ArrayFieldVector;
use crate::matrices::matrix_utils::create_field_diagonal_matrix;
use crate::matrices::real_matrix::RealMatrix;

/// Descending real part, then descending imaginary part.
pub fn default_comparator(a: &Complex<f64>, b: &Complex<f64>) -> Ordering {
    b.re.total_cmp(&a.re).then_with(|| b.im.total_cmp(&a.im))
}

#[derive(Debug)]
pub struct OrderedComplexEigenDecomposition {
    inner: ComplexEigenDecomposition,
}

impl OrderedComplexEigenDecomposition {
    pub fn new(matrix: &dyn RealMatrix) -> Result<Self> {
        Self::with_comparator(
            matrix,
            DEFAULT_EPSILON,
            DEFAULT_EPSILON_AV_VD_CHECK,
            default_comparator,
        )
    }

    pub fn with_comparator<F>(
        matrix: &dyn RealMatrix,
        epsilon: f64,
        epsilon_av_vd_check: f64,
        comparator: F,
    ) -> Result<Self>
    where
        F: Fn(&Complex<f64>, &Complex<f64>) -> Ordering,
    {
        let mut inner = ComplexEigenDecomposition::with_tolerances(matrix, epsilon, epsilon_av_vd_check)?;

        let mut order: Vec<usize> = (0..inner.eigenvalues.len()).collect();
        order.sort_by(|&i, &j| comparator(&inner.eigenvalues[i], &inner.eigenvalues[j]));

        let field = Field::<Complex<f64>>::new();
        let eigenvalues: Vec<Complex<f64>> = order.iter().map(|&k| inner.eigenvalues[k]).collect();
        let eigenvectors: Vec<ArrayFieldVector<Complex<f64>>> = order
            .iter()
            .map(|&k| {
                let column = inner.eigenvectors[k].data_ref();
                let norm = column.iter().map(|z| z.norm_sqr()).sum::<f64>().sqrt();
                let scaled = if norm == 0.0 {
                    column.to_vec()
                } else {
                    column.iter().map(|z| z / norm).collect()
                };
                ArrayFieldVector::with_field(field, scaled)
            })
            .collect();

        let n = eigenvectors.len();
        let mut v = Array2DRowFieldMatrix::new(n, n);
        for (k, ek) in eigenvectors.iter().enumerate() {
            v.set_column_vector(k, ek)?;
        }
        inner.d = create_field_diagonal_matrix(&eigenvalues);
        inner.v = v;
        inner.eigenvalues = eigenvalues;
        inner.eigenvectors = eigenvectors;
        inner.reset_transpose();
        Ok(OrderedComplexEigenDecomposition { inner })
    }

    pub fn into_inner(self) -> ComplexEigenDecomposition {
        self.inner
    }
}

impl Deref for OrderedComplexEigenDecomposition {
    type Target = ComplexEigenDecomposition;

    fn deref(&self) -> &ComplexEigenDecomposition {
        &self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iterative_solvers::linear_operator::RealLinearOperator;
    use crate::matrices::array2d_real_matrix::Array2DRowRealMatrix;
    use crate::matrices::field_vector::FieldVector;
    use crate::matrices::matrix_utils::real_to_field_matrix;
    use approx::assert_relative_eq;

    fn check_definition(a: &Array2DRowRealMatrix, ed: &ComplexEigenDecomposition) {
        let ac: Array2DRowFieldMatrix<Complex<f64>> = real_to_field_matrix(a);
        let av = ac.multiply_dense(ed.get_v()).unwrap();
        let vd = ed.get_v().multiply_dense(ed.get_d()).unwrap();
        for i in 0..a.row_dimension() {
            for j in 0..a.row_dimension() {
                assert!((av.entry(i, j) - vd.entry(i, j)).norm() < 1e-10);
            }
        }
    }

    #[test]
    fn test_default_order_and_definition() {
        let a = Array2DRowRealMatrix::from_rows(vec![
            vec![3.0, -2.0, 0.0],
            vec![4.0, -1.0, 0.0],
            vec![1.0, 1.0, 5.0],
        ])
        .unwrap();
        let ed = OrderedComplexEigenDecomposition::new(&a).unwrap();
        let values = ed.get_eigenvalues();
        assert_relative_eq!(values[0].re, 5.0, epsilon = 1e-12);
        assert_relative_eq!(values[1].im, 2.0, epsilon = 1e-12);
        assert_relative_eq!(values[2].im, -2.0, epsilon = 1e-12);
        check_definition(&a, &ed);
        for i in 0..3 {
            let v = ed.get_eigenvector(i);
            let norm: f64 = (0..3).map(|k| v.entry(k).norm_sqr()).sum();
            assert_relative_eq!(norm, 1.0, epsilon = 1e-12);
            // columns of V follow the eigenvectors
            assert_eq!(ed.get_v().entry(0, i), v.entry(0));
        }
        assert_relative_eq!(ed.get_determinant(), 25.0, epsilon = 1e-9);
    }

    #[test]
    fn test_custom_comparator() {
        let a = Array2DRowRealMatrix::from_rows(vec![
            vec![2.0, 0.0, 0.0],
            vec![0.0, -7.0, 0.0],
            vec![0.0, 0.0, 4.0],
        ])
        .unwrap();
        let by_modulus = |x: &Complex<f64>, y: &Complex<f64>| y.norm().total_cmp(&x.norm());
        let ed = OrderedComplexEigenDecomposition::with_comparator(
            &a,
            DEFAULT_EPSILON,
            DEFAULT_EPSILON_AV_VD_CHECK,
            by_modulus,
        )
        .unwrap();
        let values: Vec<f64> = ed.get_eigenvalues().iter().map(|z| z.re).collect();
        assert_eq!(values, vec![-7.0, 4.0, 2.0]);
        check_definition(&a, &ed);
        assert_relative_eq!(ed.get_eigenvector(0).entry(1).norm(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_equal_eigenvalues() {
        let identity = Array2DRowRealMatrix::from_rows(vec![
            vec![1.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0],
            vec![0.0, 0.0, 1.0],
        ])
        .unwrap();
        let ed = OrderedComplexEigenDecomposition::new(&identity).unwrap().into_inner();
        for z in ed.get_eigenvalues() {
            assert_relative_eq!(z.re, 1.0, epsilon = 1e-15);
            assert_relative_eq!(z.im, 0.0, epsilon = 1e-15);
        }
    }
}
