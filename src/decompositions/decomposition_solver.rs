//! Solvers exposed by the factorizations.
//!
//! A solver borrows its decomposition and holds no state of its own, so it is
//! obtained through `get_solver()` and never built directly.
use crate::linalg_error::{LinAlgError, Result};
use crate::matrices::array2d_field_matrix::Array2DRowFieldMatrix;
use crate::matrices::array2d_real_matrix::Array2DRowRealMatrix;
use crate::matrices::field::FieldElement;
use crate::matrices::field_matrix::FieldMatrix;
use crate::matrices::field_vector::{ArrayFieldVector, FieldVector};
use crate::matrices::matrix_utils::{create_field_identity_matrix, create_real_identity_matrix};
use crate::matrices::real_matrix::RealMatrix;
use crate::matrices::real_vector::{ArrayRealVector, RealVector};

pub trait DecompositionSolver {
    /// Solution (exact or least squares) of `A x = b`.
    fn solve(&self, b: &dyn RealVector) -> Result<ArrayRealVector>;

    fn is_non_singular(&self) -> bool;

    fn row_dimension(&self) -> usize;

    fn column_dimension(&self) -> usize;

    /// Solves `A X = B` column by column.
    fn solve_matrix(&self, b: &dyn RealMatrix) -> Result<Array2DRowRealMatrix> {
        if b.row_dimension() != self.row_dimension() {
            return Err(LinAlgError::MatrixDimensionMismatch {
                got_rows: b.row_dimension(),
                got_columns: b.column_dimension(),
                expected_rows: self.row_dimension(),
                expected_columns: b.column_dimension(),
            });
        }
        let mut x = Array2DRowRealMatrix::new(self.column_dimension(), b.column_dimension());
        for j in 0..b.column_dimension() {
            let column = self.solve(&b.get_column_vector(j)?)?;
            for (i, value) in column.iter().enumerate() {
                x.data_mut()[i][j] = *value;
            }
        }
        Ok(x)
    }

    /// Inverse (or pseudo-inverse) of the decomposed matrix.
    fn get_inverse(&self) -> Result<Array2DRowRealMatrix> {
        self.solve_matrix(&create_real_identity_matrix(self.row_dimension()))
    }
}

/// Field counterpart of [`DecompositionSolver`].
pub trait FieldDecompositionSolver<T: FieldElement> {
    fn solve(&self, b: &dyn FieldVector<T>) -> Result<ArrayFieldVector<T>>;

    fn is_non_singular(&self) -> bool;

    fn row_dimension(&self) -> usize;

    fn column_dimension(&self) -> usize;

    fn solve_matrix(&self, b: &dyn FieldMatrix<T>) -> Result<Array2DRowFieldMatrix<T>> {
        if b.row_dimension() != self.row_dimension() {
            return Err(LinAlgError::MatrixDimensionMismatch {
                got_rows: b.row_dimension(),
                got_columns: b.column_dimension(),
                expected_rows: self.row_dimension(),
                expected_columns: b.column_dimension(),
            });
        }
        let mut x = Array2DRowFieldMatrix::new(self.column_dimension(), b.column_dimension());
        for j in 0..b.column_dimension() {
            let column = self.solve(&b.get_column_vector(j)?)?;
            for (i, value) in column.into_vec().into_iter().enumerate() {
                x.data_mut()[i][j] = value;
            }
        }
        Ok(x)
    }

    fn get_inverse(&self) -> Result<Array2DRowFieldMatrix<T>> {
        self.solve_matrix(&create_field_identity_matrix::<T>(self.row_dimension()))
    }
}
