//! Square matrix storing only its diagonal. Writing a non-zero value off the
//! diagonal is an error.
use crate::iterative_solvers::linear_operator::RealLinearOperator;
use crate::linalg_error::{LinAlgError, Result};
use crate::matrices::array2d_real_matrix::Array2DRowRealMatrix;
use crate::matrices::matrix_utils::{check_column_index, check_row_index};
use crate::matrices::real_matrix::RealMatrix;
use crate::matrices::real_vector::{ArrayRealVector, RealVector};

#[derive(Debug, Clone, PartialEq)]
pub struct DiagonalMatrix {
    data: Vec<f64>,
}

impl DiagonalMatrix {
    pub fn new(dimension: usize) -> Self {
        DiagonalMatrix {
            data: vec![0.0; dimension],
        }
    }

    /// Takes ownership of the diagonal.
    pub fn from_vec(diagonal: Vec<f64>) -> Self {
        DiagonalMatrix { data: diagonal }
    }

    pub fn from_slice(diagonal: &[f64]) -> Self {
        DiagonalMatrix {
            data: diagonal.to_vec(),
        }
    }

    pub fn data_ref(&self) -> &[f64] {
        &self.data
    }

    fn check_same(&self, m: &DiagonalMatrix) -> Result<()> {
        if self.data.len() != m.data.len() {
            return Err(LinAlgError::MatrixDimensionMismatch {
                got_rows: m.data.len(),
                got_columns: m.data.len(),
                expected_rows: self.data.len(),
                expected_columns: self.data.len(),
            });
        }
        Ok(())
    }

    pub fn add_diagonal(&self, m: &DiagonalMatrix) -> Result<DiagonalMatrix> {
        self.check_same(m)?;
        Ok(DiagonalMatrix::from_vec(
            self.data.iter().zip(&m.data).map(|(a, b)| a + b).collect(),
        ))
    }

    pub fn subtract_diagonal(&self, m: &DiagonalMatrix) -> Result<DiagonalMatrix> {
        self.check_same(m)?;
        Ok(DiagonalMatrix::from_vec(
            self.data.iter().zip(&m.data).map(|(a, b)| a - b).collect(),
        ))
    }

    pub fn multiply_diagonal(&self, m: &DiagonalMatrix) -> Result<DiagonalMatrix> {
        self.check_same(m)?;
        Ok(DiagonalMatrix::from_vec(
            self.data.iter().zip(&m.data).map(|(a, b)| a * b).collect(),
        ))
    }

    /// Some diagonal entry is within `threshold` of zero.
    pub fn is_singular(&self, threshold: f64) -> bool {
        self.data.iter().any(|d| d.abs() <= threshold)
    }

    pub fn inverse(&self) -> Result<DiagonalMatrix> {
        self.inverse_with_threshold(0.0)
    }

    pub fn inverse_with_threshold(&self, threshold: f64) -> Result<DiagonalMatrix> {
        if self.is_singular(threshold) {
            return Err(LinAlgError::Singular);
        }
        Ok(DiagonalMatrix::from_vec(
            self.data.iter().map(|d| 1.0 / d).collect(),
        ))
    }

    fn ensure_zero(row: usize, column: usize, value: f64) -> Result<()> {
        if value != 0.0 {
            return Err(LinAlgError::NonZeroOffDiagonal { row, column, value });
        }
        Ok(())
    }
}

impl RealLinearOperator for DiagonalMatrix {
    fn row_dimension(&self) -> usize {
        self.data.len()
    }

    fn column_dimension(&self) -> usize {
        self.data.len()
    }

    fn operate(&self, x: &dyn RealVector) -> Result<ArrayRealVector> {
        if x.dimension() != self.data.len() {
            return Err(LinAlgError::DimensionMismatch {
                got: x.dimension(),
                expected: self.data.len(),
            });
        }
        Ok(ArrayRealVector::from_vec(
            self.data
                .iter()
                .enumerate()
                .map(|(i, d)| d * x.entry(i))
                .collect(),
        ))
    }

    fn operate_transpose(&self, x: &dyn RealVector) -> Result<ArrayRealVector> {
        self.operate(x)
    }

    fn is_transposable(&self) -> bool {
        true
    }
}

impl RealMatrix for DiagonalMatrix {
    fn entry(&self, row: usize, column: usize) -> f64 {
        assert!(row < self.data.len() && column < self.data.len());
        if row == column { self.data[row] } else { 0.0 }
    }

    fn set_entry(&mut self, row: usize, column: usize, value: f64) -> Result<()> {
        check_row_index(self.data.len(), row)?;
        check_column_index(self.data.len(), column)?;
        if row == column {
            self.data[row] = value;
            Ok(())
        } else {
            Self::ensure_zero(row, column, value)
        }
    }

    fn add_to_entry(&mut self, row: usize, column: usize, increment: f64) -> Result<()> {
        check_row_index(self.data.len(), row)?;
        check_column_index(self.data.len(), column)?;
        if row == column {
            self.data[row] += increment;
            Ok(())
        } else {
            Self::ensure_zero(row, column, increment)
        }
    }

    fn multiply_entry(&mut self, row: usize, column: usize, factor: f64) -> Result<()> {
        check_row_index(self.data.len(), row)?;
        check_column_index(self.data.len(), column)?;
        if row == column {
            self.data[row] *= factor;
        }
        Ok(())
    }

    /// Only square shapes can be diagonal.
    fn create_matrix(&self, rows: usize, columns: usize) -> Result<Box<dyn RealMatrix>> {
        if rows != columns {
            return Err(LinAlgError::MatrixDimensionMismatch {
                got_rows: rows,
                got_columns: columns,
                expected_rows: rows,
                expected_columns: rows,
            });
        }
        Ok(Box::new(DiagonalMatrix::new(rows)))
    }

    fn copy(&self) -> Box<dyn RealMatrix> {
        Box::new(self.clone())
    }

    fn multiply(&self, m: &dyn RealMatrix) -> Result<Box<dyn RealMatrix>> {
        if m.row_dimension() != self.data.len() {
            return Err(LinAlgError::DimensionMismatch {
                got: m.row_dimension(),
                expected: self.data.len(),
            });
        }
        let data = self
            .data
            .iter()
            .enumerate()
            .map(|(i, d)| (0..m.column_dimension()).map(|j| d * m.entry(i, j)).collect())
            .collect();
        Ok(Box::new(Array2DRowRealMatrix::from_rows_unchecked(data)))
    }

    fn transpose(&self) -> Result<Box<dyn RealMatrix>> {
        Ok(Box::new(self.clone()))
    }

    fn pre_multiply(&self, v: &dyn RealVector) -> Result<ArrayRealVector> {
        self.operate(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_off_diagonal_writes() {
        let mut d = DiagonalMatrix::from_vec(vec![1.0, 2.0, 3.0]);
        d.set_entry(0, 1, 0.0).unwrap();
        assert!(matches!(
            d.set_entry(0, 1, 1.0),
            Err(LinAlgError::NonZeroOffDiagonal { row: 0, column: 1, .. })
        ));
        assert!(d.add_to_entry(2, 1, 0.5).is_err());
        d.add_to_entry(2, 2, 0.5).unwrap();
        assert_eq!(d.get_entry(2, 2).unwrap(), 3.5);
        assert_eq!(d.get_entry(2, 0).unwrap(), 0.0);
        assert!(d.get_entry(3, 0).is_err());
        assert!(d.create_matrix(2, 3).is_err());
    }

    #[test]
    fn test_algebra() {
        let a = DiagonalMatrix::from_vec(vec![1.0, 2.0]);
        let b = DiagonalMatrix::from_vec(vec![3.0, 4.0]);
        assert_eq!(a.add_diagonal(&b).unwrap().data_ref(), &[4.0, 6.0]);
        assert_eq!(b.subtract_diagonal(&a).unwrap().data_ref(), &[2.0, 2.0]);
        assert_eq!(a.multiply_diagonal(&b).unwrap().data_ref(), &[3.0, 8.0]);
        assert_eq!(b.inverse().unwrap().data_ref(), &[1.0 / 3.0, 0.25]);
        assert!(DiagonalMatrix::new(2).inverse().is_err());
        assert!(a.add_diagonal(&DiagonalMatrix::new(3)).is_err());

        let m = Array2DRowRealMatrix::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        let product = a.multiply(&m).unwrap();
        assert_eq!(product.get_data(), vec![vec![1.0, 2.0], vec![6.0, 8.0]]);
        let ones = Array2DRowRealMatrix::from_rows(vec![vec![1.0, 1.0], vec![1.0, 1.0]]).unwrap();
        let scaled_columns = DiagonalMatrix::from_vec(vec![2.0, 3.0])
            .pre_multiply_matrix(&ones)
            .unwrap();
        assert_eq!(scaled_columns.get_data(), vec![vec![2.0, 3.0], vec![2.0, 3.0]]);
        let scaled_rows = ones.pre_multiply_matrix(&a).unwrap();
        assert_eq!(scaled_rows.get_data(), vec![vec![1.0, 1.0], vec![2.0, 2.0]]);
        let generic = a.add(&b).unwrap();
        assert_eq!(generic.get_data(), vec![vec![4.0, 0.0], vec![0.0, 6.0]]);
        let v = ArrayRealVector::from_vec(vec![1.0, 1.0]);
        assert_eq!(a.operate(&v).unwrap().to_array(), vec![1.0, 2.0]);
    }
}
