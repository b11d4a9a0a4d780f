//! Sparse real matrix backed by an [`OpenIntMap`] keyed by `row * columns + column`.
//!
//! Products only iterate over the stored entries, which assumes `x * 0 == 0`.
//! Multiplying by vectors or matrices holding `NaN` or infinities therefore
//! drops those values instead of propagating them; this is the documented
//! behaviour of the type and callers may rely on it.
use sprs::{CsMat, TriMat};

use crate::iterative_solvers::linear_operator::RealLinearOperator;
use crate::linalg_error::{LinAlgError, Result};
use crate::matrices::matrix_utils::{
    check_addition_compatible, check_column_index, check_multiplication_compatible,
    check_row_index,
};
use crate::matrices::open_int_map::OpenIntMap;
use crate::matrices::real_matrix::RealMatrix;
use crate::matrices::real_vector::{ArrayRealVector, RealVector};

#[derive(Debug, Clone)]
pub struct OpenMapRealMatrix {
    rows: usize,
    columns: usize,
    entries: OpenIntMap<f64>,
}

impl OpenMapRealMatrix {
    pub fn new(rows: usize, columns: usize) -> Result<Self> {
        if rows.checked_mul(columns).is_none() {
            return Err(LinAlgError::UnsupportedOperation(format!(
                "{}x{} sparse matrix does not fit in a linear index",
                rows, columns
            )));
        }
        Ok(OpenMapRealMatrix {
            rows,
            columns,
            entries: OpenIntMap::new(0.0),
        })
    }

    fn key(&self, row: usize, column: usize) -> usize {
        row * self.columns + column
    }

    /// Number of explicitly stored entries.
    pub fn stored_entries(&self) -> usize {
        self.entries.len()
    }

    /// Stored `(row, column, value)` triplets.
    pub fn iter_stored(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.entries
            .iter()
            .map(move |(key, value)| (key / self.columns, key % self.columns, *value))
    }

    pub fn to_csmat(&self) -> CsMat<f64> {
        let mut triplets = TriMat::new((self.rows, self.columns));
        for (i, j, value) in self.iter_stored() {
            triplets.add_triplet(i, j, value);
        }
        triplets.to_csr()
    }

    /// Sum of two sparse matrices, iterating over stored entries only.
    pub fn add_sparse(&self, m: &OpenMapRealMatrix) -> Result<OpenMapRealMatrix> {
        check_addition_compatible(self.rows, self.columns, m.rows, m.columns)?;
        let mut out = self.clone();
        for (i, j, value) in m.iter_stored() {
            out.add_to_entry(i, j, value)?;
        }
        Ok(out)
    }

    pub fn subtract_sparse(&self, m: &OpenMapRealMatrix) -> Result<OpenMapRealMatrix> {
        check_addition_compatible(self.rows, self.columns, m.rows, m.columns)?;
        let mut out = self.clone();
        for (i, j, value) in m.iter_stored() {
            out.add_to_entry(i, j, -value)?;
        }
        Ok(out)
    }

    /// Sparse product; only stored entries of both operands take part.
    pub fn multiply_sparse(&self, m: &OpenMapRealMatrix) -> Result<OpenMapRealMatrix> {
        check_multiplication_compatible(self.rows, self.columns, m.rows, m.columns)?;
        let mut out = OpenMapRealMatrix::new(self.rows, m.columns)?;
        for (i, k, value) in self.iter_stored() {
            for j in 0..m.columns {
                let right_key = m.key(k, j);
                if m.entries.contains_key(right_key) {
                    out.add_to_entry(i, j, value * m.entries.get(right_key))?;
                }
            }
        }
        Ok(out)
    }
}

impl RealLinearOperator for OpenMapRealMatrix {
    fn row_dimension(&self) -> usize {
        self.rows
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
        let mut out = vec![0.0; self.rows];
        for (i, j, value) in self.iter_stored() {
            out[i] += value * x.entry(j);
        }
        Ok(ArrayRealVector::from_vec(out))
    }

    fn operate_transpose(&self, x: &dyn RealVector) -> Result<ArrayRealVector> {
        self.pre_multiply(x)
    }

    fn is_transposable(&self) -> bool {
        true
    }
}

impl RealMatrix for OpenMapRealMatrix {
    fn entry(&self, row: usize, column: usize) -> f64 {
        assert!(row < self.rows && column < self.columns);
        self.entries.get(self.key(row, column))
    }

    fn set_entry(&mut self, row: usize, column: usize, value: f64) -> Result<()> {
        check_row_index(self.rows, row)?;
        check_column_index(self.columns, column)?;
        let key = self.key(row, column);
        if value == 0.0 {
            self.entries.remove(key);
        } else {
            self.entries.put(key, value);
        }
        Ok(())
    }

    fn create_matrix(&self, rows: usize, columns: usize) -> Result<Box<dyn RealMatrix>> {
        Ok(Box::new(OpenMapRealMatrix::new(rows, columns)?))
    }

    fn copy(&self) -> Box<dyn RealMatrix> {
        Box::new(self.clone())
    }

    fn multiply(&self, m: &dyn RealMatrix) -> Result<Box<dyn RealMatrix>> {
        check_multiplication_compatible(
            self.rows,
            self.columns,
            m.row_dimension(),
            m.column_dimension(),
        )?;
        let out_columns = m.column_dimension();
        let mut out = vec![vec![0.0; out_columns]; self.rows];
        for (i, k, value) in self.iter_stored() {
            for (j, o) in out[i].iter_mut().enumerate() {
                *o += value * m.entry(k, j);
            }
        }
        let mut result = OpenMapRealMatrix::new(self.rows, out_columns)?;
        for (i, row) in out.iter().enumerate() {
            for (j, value) in row.iter().enumerate() {
                result.set_entry(i, j, *value)?;
            }
        }
        Ok(Box::new(result))
    }

    fn pre_multiply(&self, v: &dyn RealVector) -> Result<ArrayRealVector> {
        if v.dimension() != self.rows {
            return Err(LinAlgError::DimensionMismatch {
                got: v.dimension(),
                expected: self.rows,
            });
        }
        let mut out = vec![0.0; self.columns];
        for (i, j, value) in self.iter_stored() {
            out[j] += value * v.entry(i);
        }
        Ok(ArrayRealVector::from_vec(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrices::array2d_real_matrix::Array2DRowRealMatrix;

    fn sparse_from(rows: &[Vec<f64>]) -> OpenMapRealMatrix {
        let mut m = OpenMapRealMatrix::new(rows.len(), rows[0].len()).unwrap();
        for (i, row) in rows.iter().enumerate() {
            for (j, value) in row.iter().enumerate() {
                m.set_entry(i, j, *value).unwrap();
            }
        }
        m
    }

    #[test]
    fn test_zero_entries_are_not_stored() {
        let mut m = sparse_from(&[vec![1.0, 0.0], vec![0.0, 2.0]]);
        assert_eq!(m.stored_entries(), 2);
        m.add_to_entry(0, 0, -1.0).unwrap();
        assert_eq!(m.stored_entries(), 1);
        m.multiply_entry(1, 1, 0.0).unwrap();
        assert_eq!(m.stored_entries(), 0);
        assert!(m.set_entry(2, 0, 1.0).is_err());
    }

    #[test]
    fn test_out_of_range_reads_do_not_alias() {
        let mut m = OpenMapRealMatrix::new(2, 3).unwrap();
        m.set_entry(1, 0, 7.0).unwrap();
        // key (0, 3) would collide with (1, 0)
        assert!(matches!(
            m.get_entry(0, 3),
            Err(LinAlgError::IndexOutOfRange { .. })
        ));
        assert!(m.get_entry(5, 5).is_err());
        assert_eq!(m.get_entry(1, 0).unwrap(), 7.0);
    }

    #[test]
    #[should_panic]
    fn test_unchecked_entry_panics_out_of_range() {
        let mut m = OpenMapRealMatrix::new(2, 3).unwrap();
        m.set_entry(1, 0, 7.0).unwrap();
        m.entry(0, 3);
    }

    #[test]
    fn test_products_match_dense() {
        let rows = vec![
            vec![1.0, 0.0, 2.0],
            vec![0.0, 3.0, 0.0],
            vec![4.0, 0.0, 5.0],
        ];
        let sparse = sparse_from(&rows);
        let dense = Array2DRowRealMatrix::from_rows(rows).unwrap();
        let product = sparse.multiply(&dense).unwrap();
        let expected = dense.multiply(&dense).unwrap();
        assert_eq!(product.get_data(), expected.get_data());
        assert_eq!(
            sparse.multiply_sparse(&sparse).unwrap().get_data(),
            expected.get_data()
        );
        let v = ArrayRealVector::from_vec(vec![1.0, 1.0, 1.0]);
        assert_eq!(sparse.operate(&v).unwrap(), dense.operate(&v).unwrap());
        assert_eq!(sparse.pre_multiply(&v).unwrap(), dense.pre_multiply(&v).unwrap());
        assert_eq!(
            sparse.add_sparse(&sparse).unwrap().get_data(),
            dense.scalar_multiply(2.0).unwrap().get_data()
        );
        assert_eq!(sparse.subtract_sparse(&sparse).unwrap().stored_entries(), 0);
        let transposed = sparse.multiply_transposed(&dense).unwrap();
        assert_eq!(
            transposed.get_data(),
            dense.multiply_transposed(&dense).unwrap().get_data()
        );
    }

    #[test]
    fn test_nan_is_lost_by_sparse_product() {
        let mut m = OpenMapRealMatrix::new(2, 2).unwrap();
        m.set_entry(0, 0, 1.0).unwrap();
        let v = ArrayRealVector::from_vec(vec![1.0, f64::NAN]);
        let y = m.operate(&v).unwrap();
        assert_eq!(y.to_array(), vec![1.0, 0.0]);
        let dense = Array2DRowRealMatrix::from_matrix(&m);
        assert!(dense.operate(&v).unwrap().is_nan());
    }

    #[test]
    fn test_csmat_export() {
        let m = sparse_from(&[vec![0.0, 2.0], vec![3.0, 0.0]]);
        let cs = m.to_csmat();
        assert_eq!(cs.nnz(), 2);
        assert_eq!(cs.get(0, 1), Some(&2.0));
        assert_eq!(cs.get(1, 1), None);
    }
}
