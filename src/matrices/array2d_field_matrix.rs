//! Dense field matrix stored as a vector of rows.
use crate::linalg_error::{LinAlgError, Result};
use crate::matrices::field::{Field, FieldElement};
use crate::matrices::field_matrix::FieldMatrix;
use crate::matrices::field_vector::{ArrayFieldVector, FieldVector};
use crate::matrices::matrix_utils::{
    check_column_index, check_multiplication_compatible, check_rectangular, check_row_index,
};

#[derive(Debug, Clone, PartialEq)]
pub struct Array2DRowFieldMatrix<T: FieldElement> {
    field: Field<T>,
    data: Vec<Vec<T>>,
    columns: usize,
}

impl<T: FieldElement> Array2DRowFieldMatrix<T> {
    /// Zero matrix.
    pub fn new(rows: usize, columns: usize) -> Self {
        Array2DRowFieldMatrix {
            field: Field::new(),
            data: vec![vec![T::zero(); columns]; rows],
            columns,
        }
    }

    /// Takes ownership of the rows after checking they form a non-empty rectangle.
    pub fn from_rows(data: Vec<Vec<T>>) -> Result<Self> {
        check_rectangular(&data)?;
        let columns = data[0].len();
        Ok(Array2DRowFieldMatrix {
            field: Field::new(),
            data,
            columns,
        })
    }

    pub fn from_array(data: &[Vec<T>]) -> Result<Self> {
        Self::from_rows(data.to_vec())
    }

    pub(crate) fn from_rows_unchecked(data: Vec<Vec<T>>) -> Self {
        let columns = data.first().map_or(0, |r| r.len());
        Array2DRowFieldMatrix {
            field: Field::new(),
            data,
            columns,
        }
    }

    pub fn from_matrix(m: &dyn FieldMatrix<T>) -> Self {
        Array2DRowFieldMatrix {
            field: Field::new(),
            data: m.get_data(),
            columns: m.column_dimension(),
        }
    }

    pub fn data_ref(&self) -> &[Vec<T>] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [Vec<T>] {
        &mut self.data
    }

    pub fn into_rows(self) -> Vec<Vec<T>> {
        self.data
    }

    pub fn transpose_dense(&self) -> Array2DRowFieldMatrix<T> {
        let mut out = Array2DRowFieldMatrix::new(self.columns, self.data.len());
        for (i, row) in self.data.iter().enumerate() {
            for (j, value) in row.iter().enumerate() {
                out.data[j][i] = value.clone();
            }
        }
        out
    }

    /// `self * m` between dense matrices without boxing.
    pub fn multiply_dense(&self, m: &Array2DRowFieldMatrix<T>) -> Result<Array2DRowFieldMatrix<T>> {
        check_multiplication_compatible(self.data.len(), self.columns, m.data.len(), m.columns)?;
        let mut out: Array2DRowFieldMatrix<T> = Array2DRowFieldMatrix::new(self.data.len(), m.columns);
        for (i, row) in self.data.iter().enumerate() {
            for (k, a) in row.iter().enumerate() {
                if a.is_zero() {
                    continue;
                }
                for (o, b) in out.data[i].iter_mut().zip(&m.data[k]) {
                    *o = o.clone() + a.clone() * b.clone();
                }
            }
        }
        Ok(out)
    }
}

impl<T: FieldElement> FieldMatrix<T> for Array2DRowFieldMatrix<T> {
    fn row_dimension(&self) -> usize {
        self.data.len()
    }

    fn column_dimension(&self) -> usize {
        self.columns
    }

    fn entry(&self, row: usize, column: usize) -> T {
        self.data[row][column].clone()
    }

    fn set_entry(&mut self, row: usize, column: usize, value: T) -> Result<()> {
        check_row_index(self.data.len(), row)?;
        check_column_index(self.columns, column)?;
        self.data[row][column] = value;
        Ok(())
    }

    fn create_matrix(&self, rows: usize, columns: usize) -> Result<Box<dyn FieldMatrix<T>>> {
        Ok(Box::new(Array2DRowFieldMatrix::<T>::new(rows, columns)))
    }

    fn copy(&self) -> Box<dyn FieldMatrix<T>> {
        Box::new(self.clone())
    }

    fn field(&self) -> Field<T> {
        self.field
    }

    fn get_data(&self) -> Vec<Vec<T>> {
        self.data.clone()
    }

    fn multiply(&self, m: &dyn FieldMatrix<T>) -> Result<Box<dyn FieldMatrix<T>>> {
        check_multiplication_compatible(
            self.data.len(),
            self.columns,
            m.row_dimension(),
            m.column_dimension(),
        )?;
        let columns = m.column_dimension();
        let mut out = Array2DRowFieldMatrix::new(self.data.len(), columns);
        for j in 0..columns {
            let column: Vec<T> = (0..self.columns).map(|k| m.entry(k, j)).collect();
            for (i, row) in self.data.iter().enumerate() {
                out.data[i][j] = row
                    .iter()
                    .zip(&column)
                    .fold(T::zero(), |acc, (a, b)| acc + a.clone() * b.clone());
            }
        }
        Ok(Box::new(out))
    }

    fn multiply_transposed(&self, m: &dyn FieldMatrix<T>) -> Result<Box<dyn FieldMatrix<T>>> {
        if self.columns != m.column_dimension() {
            return Err(LinAlgError::DimensionMismatch {
                got: m.column_dimension(),
                expected: self.columns,
            });
        }
        let rows = m.row_dimension();
        let mut out = Array2DRowFieldMatrix::new(self.data.len(), rows);
        for j in 0..rows {
            let other: Vec<T> = (0..self.columns).map(|k| m.entry(j, k)).collect();
            for (i, row) in self.data.iter().enumerate() {
                out.data[i][j] = row
                    .iter()
                    .zip(&other)
                    .fold(T::zero(), |acc, (a, b)| acc + a.clone() * b.clone());
            }
        }
        Ok(Box::new(out))
    }

    fn transpose_multiply(&self, m: &dyn FieldMatrix<T>) -> Result<Box<dyn FieldMatrix<T>>> {
        if self.data.len() != m.row_dimension() {
            return Err(LinAlgError::DimensionMismatch {
                got: m.row_dimension(),
                expected: self.data.len(),
            });
        }
        let columns = m.column_dimension();
        let mut out: Array2DRowFieldMatrix<T> = Array2DRowFieldMatrix::new(self.columns, columns);
        for (k, row) in self.data.iter().enumerate() {
            for j in 0..columns {
                let b = m.entry(k, j);
                if b.is_zero() {
                    continue;
                }
                for (i, a) in row.iter().enumerate() {
                    out.data[i][j] = out.data[i][j].clone() + a.clone() * b.clone();
                }
            }
        }
        Ok(Box::new(out))
    }

    fn transpose(&self) -> Result<Box<dyn FieldMatrix<T>>> {
        Ok(Box::new(self.transpose_dense()))
    }

    fn operate(&self, v: &dyn FieldVector<T>) -> Result<ArrayFieldVector<T>> {
        if v.dimension() != self.columns {
            return Err(LinAlgError::DimensionMismatch {
                got: v.dimension(),
                expected: self.columns,
            });
        }
        let x = v.to_array();
        Ok(ArrayFieldVector::with_field(
            self.field,
            self.data
                .iter()
                .map(|row| {
                    row.iter()
                        .zip(&x)
                        .fold(T::zero(), |acc, (a, b)| acc + a.clone() * b.clone())
                })
                .collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrices::visitors::FieldSumVisitor;
    use num::rational::Rational64;
    use num_complex::Complex;

    fn r(n: i64, d: i64) -> Rational64 {
        Rational64::new(n, d)
    }

    fn testdata() -> Array2DRowFieldMatrix<Rational64> {
        Array2DRowFieldMatrix::from_rows(vec![
            vec![r(1, 1), r(2, 1), r(3, 1)],
            vec![r(2, 1), r(5, 1), r(3, 1)],
            vec![r(1, 1), r(0, 1), r(8, 1)],
        ])
        .unwrap()
    }

    #[test]
    fn test_construction_and_data_round_trip() {
        let m = testdata();
        assert_eq!(Array2DRowFieldMatrix::from_rows(m.get_data()).unwrap(), m);
        assert!(matches!(
            Array2DRowFieldMatrix::<Rational64>::from_rows(vec![]),
            Err(LinAlgError::NoData)
        ));
        assert!(matches!(
            Array2DRowFieldMatrix::from_rows(vec![vec![r(1, 1)], vec![r(1, 1), r(2, 1)]]),
            Err(LinAlgError::RaggedArray { row: 1, .. })
        ));
        let mut copy = m.get_data();
        copy[0][0] = r(9, 1);
        assert_eq!(m.entry(0, 0), r(1, 1));
    }

    #[test]
    fn test_exact_products() {
        let m = testdata();
        // exact inverse of testdata
        let inv = Array2DRowFieldMatrix::from_rows(vec![
            vec![r(-40, 1), r(16, 1), r(9, 1)],
            vec![r(13, 1), r(-5, 1), r(-3, 1)],
            vec![r(5, 1), r(-2, 1), r(-1, 1)],
        ])
        .unwrap();
        let product = m.multiply(&inv).unwrap();
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { r(1, 1) } else { r(0, 1) };
                assert_eq!(product.entry(i, j), expected);
            }
        }
        assert_eq!(m.multiply_dense(&inv).unwrap().data_ref(), product.get_data().as_slice());
        let mt = m.multiply_transposed(&inv).unwrap();
        assert_eq!(mt.get_data(), m.multiply(inv.transpose().unwrap().as_ref()).unwrap().get_data());
        let tm = m.transpose_multiply(&inv).unwrap();
        assert_eq!(tm.get_data(), m.transpose().unwrap().multiply(&inv).unwrap().get_data());
        assert!(m.multiply(&Array2DRowFieldMatrix::<Rational64>::new(2, 2)).is_err());
    }

    #[test]
    fn test_operate_and_premultiply() {
        let m = testdata();
        let v = ArrayFieldVector::from_vec(vec![r(1, 2), r(1, 3), r(0, 1)]).unwrap();
        assert_eq!(m.operate(&v).unwrap().to_array(), vec![r(7, 6), r(8, 3), r(1, 2)]);
        assert_eq!(m.pre_multiply(&v).unwrap().to_array(), vec![r(7, 6), r(8, 3), r(5, 2)]);
        let mut sum = FieldSumVisitor::default();
        assert_eq!(m.walk_in_column_order_preserving(&mut sum), r(25, 1));
    }

    #[test]
    fn test_complex_entries() {
        let i = Complex::new(0.0, 1.0);
        let m = Array2DRowFieldMatrix::from_rows(vec![vec![i, Complex::new(1.0, 0.0)]]).unwrap();
        let square = m.transpose_multiply(&m).unwrap();
        assert_eq!(square.entry(0, 0), Complex::new(-1.0, 0.0));
        assert_eq!(square.entry(0, 1), i);
        assert_eq!(square.get_trace().unwrap(), Complex::new(0.0, 0.0));
    }
}
