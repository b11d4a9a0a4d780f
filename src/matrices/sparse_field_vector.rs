//! Sparse field vector: only non-zero entries are stored.
use crate::linalg_error::{LinAlgError, Result};
use crate::matrices::field::{Field, FieldElement};
use crate::matrices::field_vector::{ArrayFieldVector, FieldVector, check_same_dimension};
use crate::matrices::matrix_utils::check_vector_index;
use crate::matrices::open_int_map::OpenIntMap;

#[derive(Debug, Clone)]
pub struct SparseFieldVector<T: FieldElement> {
    field: Field<T>,
    entries: OpenIntMap<T>,
    virtual_size: usize,
}

impl<T: FieldElement> SparseFieldVector<T> {
    /// Zero vector of the given dimension.
    pub fn new(field: Field<T>, dimension: usize) -> Self {
        SparseFieldVector {
            field,
            entries: OpenIntMap::new(field.zero()),
            virtual_size: dimension,
        }
    }

    /// Zero vector with storage sized for `expected_size` non-zero entries.
    pub fn with_expected_size(field: Field<T>, dimension: usize, expected_size: usize) -> Self {
        SparseFieldVector {
            field,
            entries: OpenIntMap::with_expected_size(expected_size, field.zero()),
            virtual_size: dimension,
        }
    }

    /// Copies the non-zero entries of `values`.
    pub fn from_slice(field: Field<T>, values: &[T]) -> Self {
        let mut v = Self::with_expected_size(field, values.len(), values.len());
        for (i, value) in values.iter().enumerate() {
            if !value.is_zero() {
                v.entries.put(i, value.clone());
            }
        }
        v
    }

    pub fn stored_entries(&self) -> usize {
        self.entries.len()
    }

    /// Stored `(index, value)` pairs in unspecified order.
    pub fn iter_stored(&self) -> impl Iterator<Item = (usize, &T)> + '_ {
        self.entries.iter()
    }

    /// Sum of two sparse vectors, touching stored entries only.
    pub fn add_sparse(&self, v: &SparseFieldVector<T>) -> Result<SparseFieldVector<T>> {
        check_same_dimension(self.virtual_size, v.virtual_size)?;
        let mut out = self.clone();
        for (i, value) in v.entries.iter() {
            let sum = out.entries.get(i) + value.clone();
            out.set_entry(i, sum)?;
        }
        Ok(out)
    }

    pub fn subtract_sparse(&self, v: &SparseFieldVector<T>) -> Result<SparseFieldVector<T>> {
        check_same_dimension(self.virtual_size, v.virtual_size)?;
        let mut out = self.clone();
        for (i, value) in v.entries.iter() {
            let diff = out.entries.get(i) - value.clone();
            out.set_entry(i, diff)?;
        }
        Ok(out)
    }

    /// Product with a scalar, keeping the result sparse.
    pub fn map_multiply_sparse(&self, d: T) -> SparseFieldVector<T> {
        let mut out = SparseFieldVector::new(self.field, self.virtual_size);
        for (i, value) in self.entries.iter() {
            let product = value.clone() * d.clone();
            if !product.is_zero() {
                out.entries.put(i, product);
            }
        }
        out
    }

    pub fn to_dense(&self) -> ArrayFieldVector<T> {
        ArrayFieldVector::with_field(self.field, self.to_array())
    }
}

impl<T: FieldElement> PartialEq for SparseFieldVector<T> {
    fn eq(&self, other: &Self) -> bool {
        self.virtual_size == other.virtual_size
            && self.entries.len() == other.entries.len()
            && self.entries.iter().all(|(i, v)| other.entries.get(i) == *v)
    }
}

impl<T: FieldElement> FieldVector<T> for SparseFieldVector<T> {
    fn dimension(&self) -> usize {
        self.virtual_size
    }

    fn entry(&self, index: usize) -> T {
        assert!(index < self.virtual_size);
        self.entries.get(index)
    }

    fn set_entry(&mut self, index: usize, value: T) -> Result<()> {
        check_vector_index(self.virtual_size, index)?;
        if value.is_zero() {
            self.entries.remove(index);
        } else {
            self.entries.put(index, value);
        }
        Ok(())
    }

    fn field(&self) -> Field<T> {
        self.field
    }

    fn dot_product(&self, v: &dyn FieldVector<T>) -> Result<T> {
        check_same_dimension(self.virtual_size, v.dimension())?;
        Ok(self
            .entries
            .iter()
            .fold(T::zero(), |acc, (i, value)| acc + value.clone() * v.entry(i)))
    }

    fn map_divide(&self, d: T) -> Result<ArrayFieldVector<T>> {
        if d.is_zero() {
            return Err(LinAlgError::DivisionByZero);
        }
        let mut out = ArrayFieldVector::new(self.field, self.virtual_size);
        for (i, value) in self.entries.iter() {
            out.data_mut()[i] = value.clone() / d.clone();
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num::rational::Rational64;

    fn r(n: i64) -> Rational64 {
        Rational64::from_integer(n)
    }

    #[test]
    fn test_only_non_zero_entries_are_stored() {
        let f = Field::<Rational64>::new();
        let mut v = SparseFieldVector::from_slice(f, &[r(0), r(3), r(0), r(5)]);
        assert_eq!(v.dimension(), 4);
        assert_eq!(v.stored_entries(), 2);
        v.set_entry(1, r(0)).unwrap();
        assert_eq!(v.stored_entries(), 1);
        assert_eq!(v.get_entry(1).unwrap(), r(0));
        assert!(v.set_entry(4, r(1)).is_err());
        assert_eq!(v.to_dense().to_array(), vec![r(0), r(0), r(0), r(5)]);
    }

    #[test]
    fn test_sparse_arithmetic() {
        let f = Field::<Rational64>::new();
        let a = SparseFieldVector::from_slice(f, &[r(1), r(0), r(2)]);
        let b = SparseFieldVector::from_slice(f, &[r(-1), r(4), r(0)]);
        let sum = a.add_sparse(&b).unwrap();
        assert_eq!(sum.to_array(), vec![r(0), r(4), r(2)]);
        assert_eq!(sum.stored_entries(), 2);
        assert_eq!(a.subtract_sparse(&a).unwrap().stored_entries(), 0);
        assert_eq!(a.dot_product(&b).unwrap(), r(-1));
        assert_eq!(a.map_multiply_sparse(r(0)).stored_entries(), 0);
        assert_eq!(a.map_divide(r(2)).unwrap().entry(2), r(1));
        let dense = ArrayFieldVector::from_vec(vec![r(1), r(1), r(1)]).unwrap();
        assert_eq!(a.add(&dense).unwrap().to_array(), vec![r(2), r(1), r(3)]);
        assert!(a.add_sparse(&SparseFieldVector::new(f, 2)).is_err());
        assert_eq!(a, SparseFieldVector::from_slice(f, &[r(1), r(0), r(2)]));
    }
}
