//! Vectors over a generic field: the [`FieldVector`] trait and the dense
//! [`ArrayFieldVector`].
use std::fmt;

use crate::linalg_error::{LinAlgError, Result};
use crate::matrices::array2d_field_matrix::Array2DRowFieldMatrix;
use crate::matrices::field::{Field, FieldElement};
use crate::matrices::matrix_utils::{check_sub_vector_range, check_vector_index};
use crate::matrices::visitors::{FieldVectorChangingVisitor, FieldVectorPreservingVisitor};

pub(crate) fn check_same_dimension(dim: usize, other: usize) -> Result<()> {
    if dim != other {
        return Err(LinAlgError::DimensionMismatch {
            got: other,
            expected: dim,
        });
    }
    Ok(())
}

pub trait FieldVector<T: FieldElement>: fmt::Debug {
    fn dimension(&self) -> usize;

    /// Entry at `index`; panics when `index >= dimension()`.
    fn entry(&self, index: usize) -> T;

    fn set_entry(&mut self, index: usize, value: T) -> Result<()>;

    fn field(&self) -> Field<T> {
        Field::new()
    }

    fn get_entry(&self, index: usize) -> Result<T> {
        check_vector_index(self.dimension(), index)?;
        Ok(self.entry(index))
    }

    fn to_array(&self) -> Vec<T> {
        (0..self.dimension()).map(|i| self.entry(i)).collect()
    }

    fn copy(&self) -> ArrayFieldVector<T> {
        ArrayFieldVector::with_field(self.field(), self.to_array())
    }

    fn add(&self, v: &dyn FieldVector<T>) -> Result<ArrayFieldVector<T>> {
        check_same_dimension(self.dimension(), v.dimension())?;
        Ok(self.zip_with(v, |a, b| a + b))
    }

    fn subtract(&self, v: &dyn FieldVector<T>) -> Result<ArrayFieldVector<T>> {
        check_same_dimension(self.dimension(), v.dimension())?;
        Ok(self.zip_with(v, |a, b| a - b))
    }

    fn ebe_multiply(&self, v: &dyn FieldVector<T>) -> Result<ArrayFieldVector<T>> {
        check_same_dimension(self.dimension(), v.dimension())?;
        Ok(self.zip_with(v, |a, b| a * b))
    }

    fn ebe_divide(&self, v: &dyn FieldVector<T>) -> Result<ArrayFieldVector<T>> {
        check_same_dimension(self.dimension(), v.dimension())?;
        if (0..v.dimension()).any(|i| v.entry(i).is_zero()) {
            return Err(LinAlgError::DivisionByZero);
        }
        Ok(self.zip_with(v, |a, b| a / b))
    }

    /// Entry-wise combination with `v`; dimensions must already match.
    #[doc(hidden)]
    fn zip_with(&self, v: &dyn FieldVector<T>, f: fn(T, T) -> T) -> ArrayFieldVector<T> {
        ArrayFieldVector::with_field(
            self.field(),
            (0..self.dimension())
                .map(|i| f(self.entry(i), v.entry(i)))
                .collect(),
        )
    }

    fn map_add(&self, d: T) -> ArrayFieldVector<T> {
        self.map(&|x: T| x + d.clone())
    }

    fn map_subtract(&self, d: T) -> ArrayFieldVector<T> {
        self.map(&|x: T| x - d.clone())
    }

    fn map_multiply(&self, d: T) -> ArrayFieldVector<T> {
        self.map(&|x: T| x * d.clone())
    }

    fn map_divide(&self, d: T) -> Result<ArrayFieldVector<T>> {
        if d.is_zero() {
            return Err(LinAlgError::DivisionByZero);
        }
        Ok(self.map(&|x: T| x / d.clone()))
    }

    /// Entry-wise reciprocal.
    fn map_inv(&self) -> Result<ArrayFieldVector<T>> {
        if (0..self.dimension()).any(|i| self.entry(i).is_zero()) {
            return Err(LinAlgError::DivisionByZero);
        }
        Ok(self.map(&|x: T| x.reciprocal()))
    }

    #[doc(hidden)]
    fn map(&self, f: &dyn Fn(T) -> T) -> ArrayFieldVector<T> {
        ArrayFieldVector::with_field(
            self.field(),
            (0..self.dimension()).map(|i| f(self.entry(i))).collect(),
        )
    }

    fn dot_product(&self, v: &dyn FieldVector<T>) -> Result<T> {
        check_same_dimension(self.dimension(), v.dimension())?;
        Ok((0..self.dimension()).fold(T::zero(), |acc, i| acc + self.entry(i) * v.entry(i)))
    }

    /// Projection of `self` onto `v`.
    fn projection(&self, v: &dyn FieldVector<T>) -> Result<ArrayFieldVector<T>> {
        let norm2 = v.dot_product(v)?;
        if norm2.is_zero() {
            return Err(LinAlgError::ZeroNorm);
        }
        Ok(v.map_multiply(self.dot_product(v)? / norm2))
    }

    fn outer_product(&self, v: &dyn FieldVector<T>) -> Array2DRowFieldMatrix<T> {
        let data = (0..self.dimension())
            .map(|i| {
                (0..v.dimension())
                    .map(|j| self.entry(i) * v.entry(j))
                    .collect()
            })
            .collect();
        Array2DRowFieldMatrix::from_rows_unchecked(data)
    }

    fn append(&self, v: &dyn FieldVector<T>) -> ArrayFieldVector<T> {
        let mut data = self.to_array();
        data.extend(v.to_array());
        ArrayFieldVector::with_field(self.field(), data)
    }

    fn get_sub_vector(&self, index: usize, n: usize) -> Result<ArrayFieldVector<T>> {
        check_sub_vector_range(self.dimension(), index, n)?;
        Ok(ArrayFieldVector::with_field(
            self.field(),
            (index..index + n).map(|i| self.entry(i)).collect(),
        ))
    }

    fn set_sub_vector(&mut self, index: usize, v: &dyn FieldVector<T>) -> Result<()> {
        check_sub_vector_range(self.dimension(), index, v.dimension())?;
        for i in 0..v.dimension() {
            self.set_entry(index + i, v.entry(i))?;
        }
        Ok(())
    }

    fn set(&mut self, value: T) -> Result<()> {
        for i in 0..self.dimension() {
            self.set_entry(i, value.clone())?;
        }
        Ok(())
    }

    fn walk_in_default_order(
        &mut self,
        visitor: &mut dyn FieldVectorChangingVisitor<T>,
    ) -> Result<T> {
        let dim = self.dimension();
        visitor.start(dim, 0, dim.saturating_sub(1));
        for i in 0..dim {
            let value = visitor.visit(i, self.entry(i));
            self.set_entry(i, value)?;
        }
        Ok(visitor.end())
    }

    fn walk_in_default_order_range(
        &mut self,
        visitor: &mut dyn FieldVectorChangingVisitor<T>,
        start: usize,
        end: usize,
    ) -> Result<T> {
        check_range(self.dimension(), start, end)?;
        visitor.start(self.dimension(), start, end);
        for i in start..=end {
            let value = visitor.visit(i, self.entry(i));
            self.set_entry(i, value)?;
        }
        Ok(visitor.end())
    }

    fn walk_in_default_order_preserving(
        &self,
        visitor: &mut dyn FieldVectorPreservingVisitor<T>,
    ) -> T {
        let dim = self.dimension();
        visitor.start(dim, 0, dim.saturating_sub(1));
        for i in 0..dim {
            visitor.visit(i, &self.entry(i));
        }
        visitor.end()
    }

    fn walk_in_default_order_preserving_range(
        &self,
        visitor: &mut dyn FieldVectorPreservingVisitor<T>,
        start: usize,
        end: usize,
    ) -> Result<T> {
        check_range(self.dimension(), start, end)?;
        visitor.start(self.dimension(), start, end);
        for i in start..=end {
            visitor.visit(i, &self.entry(i));
        }
        Ok(visitor.end())
    }
}

fn check_range(dim: usize, start: usize, end: usize) -> Result<()> {
    check_vector_index(dim, start)?;
    check_vector_index(dim, end)?;
    if end < start {
        return Err(LinAlgError::InvalidRange { start, end });
    }
    Ok(())
}

/// Dense field vector.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayFieldVector<T: FieldElement> {
    data: Vec<T>,
    field: Field<T>,
}

impl<T: FieldElement> ArrayFieldVector<T> {
    /// Zero vector of the given size.
    pub fn new(field: Field<T>, size: usize) -> Self {
        ArrayFieldVector {
            data: vec![field.zero(); size],
            field,
        }
    }

    pub fn filled(size: usize, preset: T) -> Self {
        ArrayFieldVector {
            data: vec![preset; size],
            field: Field::new(),
        }
    }

    /// Takes ownership of `data`; the field is inferred from the entries so at
    /// least one is required.
    pub fn from_vec(data: Vec<T>) -> Result<Self> {
        if data.is_empty() {
            return Err(LinAlgError::NoData);
        }
        Ok(ArrayFieldVector {
            data,
            field: Field::new(),
        })
    }

    /// Defensive copy of `data`; at least one entry is required.
    pub fn from_slice(data: &[T]) -> Result<Self> {
        Self::from_vec(data.to_vec())
    }

    /// Explicit field, so an empty vector is allowed.
    pub fn with_field(field: Field<T>, data: Vec<T>) -> Self {
        ArrayFieldVector { data, field }
    }

    pub fn from_vector(v: &dyn FieldVector<T>) -> Self {
        Self::with_field(v.field(), v.to_array())
    }

    pub fn data_ref(&self) -> &[T] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }
}

impl<T: FieldElement> FieldVector<T> for ArrayFieldVector<T> {
    fn dimension(&self) -> usize {
        self.data.len()
    }

    fn entry(&self, index: usize) -> T {
        self.data[index].clone()
    }

    fn set_entry(&mut self, index: usize, value: T) -> Result<()> {
        check_vector_index(self.data.len(), index)?;
        self.data[index] = value;
        Ok(())
    }

    fn field(&self) -> Field<T> {
        self.field
    }

    fn to_array(&self) -> Vec<T> {
        self.data.clone()
    }
}
