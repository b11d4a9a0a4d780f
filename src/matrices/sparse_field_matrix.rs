//! Sparse field matrix backed by an [`OpenIntMap`] keyed by `row * columns + column`.
//!
//! Like the real sparse matrix, products only walk the stored entries and
//! assume `x * 0 == 0`.
use crate::linalg_error::{LinAlgError, Result};
use crate::matrices::field::{Field, FieldElement};
use crate::matrices::field_matrix::FieldMatrix;
use crate::matrices::matrix_utils::{check_column_index, check_row_index};
use crate::matrices::open_int_map::OpenIntMap;

#[derive(Debug, Clone)]
pub struct SparseFieldMatrix<T: FieldElement> {
    field: Field<T>,
    rows: usize,
    columns: usize,
    entries: OpenIntMap<T>,
}

impl<T: FieldElement> SparseFieldMatrix<T> {
    pub fn new(field: Field<T>, rows: usize, columns: usize) -> Result<Self> {
        if rows.checked_mul(columns).is_none() {
            return Err(LinAlgError::UnsupportedOperation(format!(
                "{}x{} sparse matrix does not fit in a linear index",
                rows, columns
            )));
        }
        Ok(SparseFieldMatrix {
            field,
            rows,
            columns,
            entries: OpenIntMap::new(field.zero()),
        })
    }

    /// Sparse copy of any field matrix; zero entries are skipped.
    pub fn from_matrix(m: &dyn FieldMatrix<T>) -> Result<Self> {
        let mut out = Self::new(m.field(), m.row_dimension(), m.column_dimension())?;
        for i in 0..out.rows {
            for j in 0..out.columns {
                out.set_entry(i, j, m.entry(i, j))?;
            }
        }
        Ok(out)
    }

    fn key(&self, row: usize, column: usize) -> usize {
        row * self.columns + column
    }

    pub fn stored_entries(&self) -> usize {
        self.entries.len()
    }

    /// Stored `(row, column, value)` triplets in unspecified order.
    pub fn iter_stored(&self) -> impl Iterator<Item = (usize, usize, &T)> + '_ {
        self.entries
            .iter()
            .map(move |(key, value)| (key / self.columns, key % self.columns, value))
    }

    fn store(&mut self, key: usize, value: T) {
        if value.is_zero() {
            self.entries.remove(key);
        } else {
            self.entries.put(key, value);
        }
    }
}

impl<T: FieldElement> FieldMatrix<T> for SparseFieldMatrix<T> {
    fn row_dimension(&self) -> usize {
        self.rows
    }

    fn column_dimension(&self) -> usize {
        self.columns
    }

    fn entry(&self, row: usize, column: usize) -> T {
        assert!(row < self.rows && column < self.columns);
        self.entries.get(self.key(row, column))
    }

    fn set_entry(&mut self, row: usize, column: usize, value: T) -> Result<()> {
        check_row_index(self.rows, row)?;
        check_column_index(self.columns, column)?;
        let key = self.key(row, column);
        self.store(key, value);
        Ok(())
    }

    fn add_to_entry(&mut self, row: usize, column: usize, increment: T) -> Result<()> {
        check_row_index(self.rows, row)?;
        check_column_index(self.columns, column)?;
        let key = self.key(row, column);
        let value = self.entries.get(key) + increment;
        self.store(key, value);
        Ok(())
    }

    fn multiply_entry(&mut self, row: usize, column: usize, factor: T) -> Result<()> {
        check_row_index(self.rows, row)?;
        check_column_index(self.columns, column)?;
        let key = self.key(row, column);
        let value = self.entries.get(key) * factor;
        self.store(key, value);
        Ok(())
    }

    fn create_matrix(&self, rows: usize, columns: usize) -> Result<Box<dyn FieldMatrix<T>>> {
        Ok(Box::new(SparseFieldMatrix::new(self.field, rows, columns)?))
    }

    fn copy(&self) -> Box<dyn FieldMatrix<T>> {
        Box::new(self.clone())
    }

    fn field(&self) -> Field<T> {
        self.field
    }

    /// `self * mᵗ`, walking only the stored entries of `self`.
    fn multiply_transposed(&self, m: &dyn FieldMatrix<T>) -> Result<Box<dyn FieldMatrix<T>>> {
        if self.columns != m.column_dimension() {
            return Err(LinAlgError::DimensionMismatch {
                got: m.column_dimension(),
                expected: self.columns,
            });
        }
        let out_columns = m.row_dimension();
        let mut out = m.create_matrix(self.rows, out_columns)?;
        for (i, k, value) in self.iter_stored() {
            for j in 0..out_columns {
                out.add_to_entry(i, j, value.clone() * m.entry(j, k))?;
            }
        }
        Ok(out)
    }

    /// `selfᵗ * m`, walking only the stored entries of `self`.
    fn transpose_multiply(&self, m: &dyn FieldMatrix<T>) -> Result<Box<dyn FieldMatrix<T>>> {
        if self.rows != m.row_dimension() {
            return Err(LinAlgError::DimensionMismatch {
                got: m.row_dimension(),
                expected: self.rows,
            });
        }
        let out_columns = m.column_dimension();
        let mut out = m.create_matrix(self.columns, out_columns)?;
        for (k, i, value) in self.iter_stored() {
            for j in 0..out_columns {
                out.add_to_entry(i, j, value.clone() * m.entry(k, j))?;
            }
        }
        Ok(out)
    }
}

impl<T: FieldElement> PartialEq for SparseFieldMatrix<T> {
    fn eq(&self, other: &Self) -> bool {
        self.rows == other.rows
            && self.columns == other.columns
            && self.entries.len() == other.entries.len()
            && self.entries.iter().all(|(k, v)| other.entries.get(k) == *v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrices::array2d_field_matrix::Array2DRowFieldMatrix;
    use num::rational::Rational64;

    fn r(n: i64) -> Rational64 {
        Rational64::from_integer(n)
    }

    fn dense() -> Array2DRowFieldMatrix<Rational64> {
        Array2DRowFieldMatrix::from_rows(vec![
            vec![r(1), r(0), r(2)],
            vec![r(0), r(3), r(0)],
            vec![r(4), r(0), r(5)],
        ])
        .unwrap()
    }

    #[test]
    fn test_zero_results_are_removed() {
        let mut m = SparseFieldMatrix::from_matrix(&dense()).unwrap();
        assert_eq!(m.stored_entries(), 5);
        m.add_to_entry(0, 0, r(-1)).unwrap();
        assert_eq!(m.stored_entries(), 4);
        m.multiply_entry(1, 1, r(0)).unwrap();
        assert_eq!(m.stored_entries(), 3);
        m.set_entry(2, 2, r(0)).unwrap();
        assert_eq!(m.stored_entries(), 2);
        assert_eq!(m.get_entry(2, 2).unwrap(), r(0));
        assert!(m.set_entry(0, 3, r(1)).is_err());
    }

    #[test]
    fn test_transposed_products_match_dense() {
        let d = dense();
        let s = SparseFieldMatrix::from_matrix(&d).unwrap();
        let other = Array2DRowFieldMatrix::from_rows(vec![
            vec![r(1), r(2), r(3)],
            vec![r(-1), r(0), r(1)],
        ])
        .unwrap();
        assert_eq!(
            s.multiply_transposed(&other).unwrap().get_data(),
            d.multiply_transposed(&other).unwrap().get_data()
        );
        let tall = other.transpose().unwrap();
        assert_eq!(
            s.transpose_multiply(tall.as_ref()).unwrap().get_data(),
            d.transpose_multiply(tall.as_ref()).unwrap().get_data()
        );
        assert_eq!(s.multiply(&s).unwrap().get_data(), d.multiply(&d).unwrap().get_data());
        assert!(s.transpose_multiply(&other).is_err());
        let t = s.transpose().unwrap();
        assert_eq!(SparseFieldMatrix::from_matrix(t.as_ref()).unwrap().stored_entries(), 5);
    }
}
