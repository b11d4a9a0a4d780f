//! Dense real matrix stored as a vector of rows.
use nalgebra::DMatrix;

use crate::iterative_solvers::linear_operator::RealLinearOperator;
use crate::linalg_error::{LinAlgError, Result};
use crate::matrices::matrix_utils::{
    check_column_index, check_multiplication_compatible, check_rectangular, check_row_index,
};
use crate::matrices::real_matrix::RealMatrix;
use crate::matrices::real_vector::{ArrayRealVector, RealVector};

#[derive(Debug, Clone, PartialEq)]
pub struct Array2DRowRealMatrix {
    data: Vec<Vec<f64>>,
    columns: usize,
}

impl Array2DRowRealMatrix {
    /// Zero matrix.
    pub fn new(rows: usize, columns: usize) -> Self {
        Array2DRowRealMatrix {
            data: vec![vec![0.0; columns]; rows],
            columns,
        }
    }

    /// Takes ownership of the rows after checking they form a non-empty rectangle.
    pub fn from_rows(data: Vec<Vec<f64>>) -> Result<Self> {
        check_rectangular(&data)?;
        let columns = data[0].len();
        Ok(Array2DRowRealMatrix { data, columns })
    }

    /// Copies the rows after checking they form a non-empty rectangle.
    pub fn from_array(data: &[Vec<f64>]) -> Result<Self> {
        Self::from_rows(data.to_vec())
    }

    /// Rows already known to be rectangular.
    pub(crate) fn from_rows_unchecked(data: Vec<Vec<f64>>) -> Self {
        let columns = data.first().map_or(0, |r| r.len());
        Array2DRowRealMatrix { data, columns }
    }

    /// Single column matrix.
    pub fn from_column(v: &[f64]) -> Self {
        Array2DRowRealMatrix {
            data: v.iter().map(|x| vec![*x]).collect(),
            columns: 1,
        }
    }

    /// Dense copy of any real matrix.
    pub fn from_matrix(m: &dyn RealMatrix) -> Self {
        Array2DRowRealMatrix {
            data: m.get_data(),
            columns: m.column_dimension(),
        }
    }

    pub fn data_ref(&self) -> &[Vec<f64>] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [Vec<f64>] {
        &mut self.data
    }

    pub fn into_rows(self) -> Vec<Vec<f64>> {
        self.data
    }

    pub fn transpose_dense(&self) -> Array2DRowRealMatrix {
        let mut out = Array2DRowRealMatrix::new(self.columns, self.data.len());
        for (i, row) in self.data.iter().enumerate() {
            for (j, value) in row.iter().enumerate() {
                out.data[j][i] = *value;
            }
        }
        out
    }

    /// `self * m` between dense matrices without boxing.
    pub fn multiply_dense(&self, m: &Array2DRowRealMatrix) -> Result<Array2DRowRealMatrix> {
        check_multiplication_compatible(self.data.len(), self.columns, m.data.len(), m.columns)?;
        let mut out = Array2DRowRealMatrix::new(self.data.len(), m.columns);
        for (i, row) in self.data.iter().enumerate() {
            for (k, a) in row.iter().enumerate() {
                if *a == 0.0 {
                    continue;
                }
                for (o, b) in out.data[i].iter_mut().zip(&m.data[k]) {
                    *o += a * b;
                }
            }
        }
        Ok(out)
    }

    pub fn to_dmatrix(&self) -> DMatrix<f64> {
        DMatrix::from_fn(self.data.len(), self.columns, |i, j| self.data[i][j])
    }

    /// Kronecker product `self ⊗ b`.
    pub fn kronecker_product(&self, b: &Array2DRowRealMatrix) -> Array2DRowRealMatrix {
        let (br, bc) = (b.data.len(), b.columns);
        let mut out = Array2DRowRealMatrix::new(self.data.len() * br, self.columns * bc);
        for (i, row) in self.data.iter().enumerate() {
            for (j, a) in row.iter().enumerate() {
                for (k, b_row) in b.data.iter().enumerate() {
                    for (l, value) in b_row.iter().enumerate() {
                        out.data[i * br + k][j * bc + l] = a * value;
                    }
                }
            }
        }
        out
    }

    /// Columns stacked on top of each other into a single vector.
    pub fn stack(&self) -> ArrayRealVector {
        let m = self.data.len();
        let mut out = vec![0.0; m * self.columns];
        for (i, row) in self.data.iter().enumerate() {
            for (j, value) in row.iter().enumerate() {
                out[i + j * m] = *value;
            }
        }
        ArrayRealVector::from_vec(out)
    }

    /// Inverse of [`stack`](Self::stack) for a vector holding a square matrix.
    pub fn unstack_square(v: &dyn RealVector) -> Result<Array2DRowRealMatrix> {
        let len = v.dimension();
        let n = (len as f64).sqrt().round() as usize;
        if n * n != len {
            return Err(LinAlgError::DimensionMismatch {
                got: len,
                expected: n * n,
            });
        }
        let mut out = Array2DRowRealMatrix::new(n, n);
        for j in 0..n {
            for i in 0..n {
                out.data[i][j] = v.get_entry(i + j * n)?;
            }
        }
        Ok(out)
    }
}

impl From<&DMatrix<f64>> for Array2DRowRealMatrix {
    fn from(m: &DMatrix<f64>) -> Self {
        let data = (0..m.nrows())
            .map(|i| (0..m.ncols()).map(|j| m[(i, j)]).collect())
            .collect();
        Array2DRowRealMatrix {
            data,
            columns: m.ncols(),
        }
    }
}

impl RealLinearOperator for Array2DRowRealMatrix {
    fn row_dimension(&self) -> usize {
        self.data.len()
    }

    fn column_dimension(&self) -> usize {
        self.columns
    }

    fn operate(&self, x: &dyn RealVector) -> Result<ArrayRealVector> {
        if x.dimension() != self.columns {
            return Err(LinAlgError::DimensionMismatch {
                got: x.dimension(),
                expected: self.columns,
            });
        }
        let x = x.to_array();
        Ok(ArrayRealVector::from_vec(
            self.data
                .iter()
                .map(|row| row.iter().zip(&x).map(|(a, b)| a * b).sum())
                .collect(),
        ))
    }

    fn operate_transpose(&self, x: &dyn RealVector) -> Result<ArrayRealVector> {
        self.pre_multiply(x)
    }

    fn is_transposable(&self) -> bool {
        true
    }
}

impl RealMatrix for Array2DRowRealMatrix {
    fn entry(&self, row: usize, column: usize) -> f64 {
        self.data[row][column]
    }

    fn set_entry(&mut self, row: usize, column: usize, value: f64) -> Result<()> {
        check_row_index(self.data.len(), row)?;
        check_column_index(self.columns, column)?;
        self.data[row][column] = value;
        Ok(())
    }

    fn create_matrix(&self, rows: usize, columns: usize) -> Result<Box<dyn RealMatrix>> {
        Ok(Box::new(Array2DRowRealMatrix::new(rows, columns)))
    }

    fn copy(&self) -> Box<dyn RealMatrix> {
        Box::new(self.clone())
    }

    fn get_data(&self) -> Vec<Vec<f64>> {
        self.data.clone()
    }

    fn multiply(&self, m: &dyn RealMatrix) -> Result<Box<dyn RealMatrix>> {
        check_multiplication_compatible(
            self.data.len(),
            self.columns,
            m.row_dimension(),
            m.column_dimension(),
        )?;
        let columns = m.column_dimension();
        let mut out = Array2DRowRealMatrix::new(self.data.len(), columns);
        let mut column = vec![0.0; self.columns];
        for j in 0..columns {
            for (k, c) in column.iter_mut().enumerate() {
                *c = m.entry(k, j);
            }
            for (i, row) in self.data.iter().enumerate() {
                out.data[i][j] = row.iter().zip(&column).map(|(a, b)| a * b).sum();
            }
        }
        Ok(Box::new(out))
    }

    fn multiply_transposed(&self, m: &dyn RealMatrix) -> Result<Box<dyn RealMatrix>> {
        if self.columns != m.column_dimension() {
            return Err(LinAlgError::DimensionMismatch {
                got: m.column_dimension(),
                expected: self.columns,
            });
        }
        let rows = m.row_dimension();
        let mut out = Array2DRowRealMatrix::new(self.data.len(), rows);
        for j in 0..rows {
            let other: Vec<f64> = (0..self.columns).map(|k| m.entry(j, k)).collect();
            for (i, row) in self.data.iter().enumerate() {
                out.data[i][j] = row.iter().zip(&other).map(|(a, b)| a * b).sum();
            }
        }
        Ok(Box::new(out))
    }

    fn transpose_multiply(&self, m: &dyn RealMatrix) -> Result<Box<dyn RealMatrix>> {
        if self.data.len() != m.row_dimension() {
            return Err(LinAlgError::DimensionMismatch {
                got: m.row_dimension(),
                expected: self.data.len(),
            });
        }
        let columns = m.column_dimension();
        let mut out = Array2DRowRealMatrix::new(self.columns, columns);
        for (k, row) in self.data.iter().enumerate() {
            for j in 0..columns {
                let b = m.entry(k, j);
                if b == 0.0 {
                    continue;
                }
                for (i, a) in row.iter().enumerate() {
                    out.data[i][j] += a * b;
                }
            }
        }
        Ok(Box::new(out))
    }

    fn transpose(&self) -> Result<Box<dyn RealMatrix>> {
        Ok(Box::new(self.transpose_dense()))
    }
}
