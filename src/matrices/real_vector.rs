//! Real vectors: the [`RealVector`] trait, its dense implementation
//! [`ArrayRealVector`] and the read-only adapter [`UnmodifiableRealVector`].
use std::fmt;
use std::ops::Index;

use nalgebra::DVector;

use crate::linalg_error::{LinAlgError, Result};
use crate::matrices::array2d_real_matrix::Array2DRowRealMatrix;
use crate::matrices::matrix_utils::{check_sub_vector_range, check_vector_index};
use crate::matrices::visitors::{RealVectorChangingVisitor, RealVectorPreservingVisitor};

fn check_same_dimension(dim: usize, other: usize) -> Result<()> {
    if dim != other {
        return Err(LinAlgError::DimensionMismatch {
            got: other,
            expected: dim,
        });
    }
    Ok(())
}

/// Common behaviour of real vectors.
///
/// Implementors provide the dimension, unchecked reads through [`RealVector::entry`]
/// and checked writes; everything else has a default built on top of those.
pub trait RealVector: fmt::Debug {
    fn dimension(&self) -> usize;

    /// Entry at `index`; panics when `index >= dimension()`.
    fn entry(&self, index: usize) -> f64;

    fn set_entry(&mut self, index: usize, value: f64) -> Result<()>;

    /// Contiguous storage when the implementation has one.
    fn as_slice(&self) -> Option<&[f64]> {
        None
    }

    fn get_entry(&self, index: usize) -> Result<f64> {
        check_vector_index(self.dimension(), index)?;
        Ok(self.entry(index))
    }

    fn add_to_entry(&mut self, index: usize, increment: f64) -> Result<()> {
        let value = self.get_entry(index)?;
        self.set_entry(index, value + increment)
    }

    fn to_array(&self) -> Vec<f64> {
        match self.as_slice() {
            Some(data) => data.to_vec(),
            None => (0..self.dimension()).map(|i| self.entry(i)).collect(),
        }
    }

    fn copy(&self) -> ArrayRealVector {
        ArrayRealVector::from_vec(self.to_array())
    }

    fn dot_product(&self, v: &dyn RealVector) -> Result<f64> {
        check_same_dimension(self.dimension(), v.dimension())?;
        Ok((0..self.dimension()).map(|i| self.entry(i) * v.entry(i)).sum())
    }

    /// Euclidean norm.
    fn get_norm(&self) -> f64 {
        (0..self.dimension())
            .map(|i| self.entry(i) * self.entry(i))
            .sum::<f64>()
            .sqrt()
    }

    fn get_l1_norm(&self) -> f64 {
        (0..self.dimension()).map(|i| self.entry(i).abs()).sum()
    }

    fn get_l_inf_norm(&self) -> f64 {
        (0..self.dimension()).fold(0.0, |m, i| f64::max(m, self.entry(i).abs()))
    }

    fn get_distance(&self, v: &dyn RealVector) -> Result<f64> {
        check_same_dimension(self.dimension(), v.dimension())?;
        Ok((0..self.dimension())
            .map(|i| (self.entry(i) - v.entry(i)).powi(2))
            .sum::<f64>()
            .sqrt())
    }

    fn add(&self, v: &dyn RealVector) -> Result<ArrayRealVector> {
        self.combine(1.0, 1.0, v)
    }

    fn subtract(&self, v: &dyn RealVector) -> Result<ArrayRealVector> {
        self.combine(1.0, -1.0, v)
    }

    /// `a * self + b * y`
    fn combine(&self, a: f64, b: f64, y: &dyn RealVector) -> Result<ArrayRealVector> {
        check_same_dimension(self.dimension(), y.dimension())?;
        Ok(ArrayRealVector::from_vec(
            (0..self.dimension())
                .map(|i| a * self.entry(i) + b * y.entry(i))
                .collect(),
        ))
    }

    /// `self = a * self + b * y`
    fn combine_to_self(&mut self, a: f64, b: f64, y: &dyn RealVector) -> Result<()> {
        check_same_dimension(self.dimension(), y.dimension())?;
        for i in 0..self.dimension() {
            let value = a * self.entry(i) + b * y.entry(i);
            self.set_entry(i, value)?;
        }
        Ok(())
    }

    fn map_add(&self, d: f64) -> ArrayRealVector {
        ArrayRealVector::from_vec(self.to_array().into_iter().map(|x| x + d).collect())
    }

    fn map_subtract(&self, d: f64) -> ArrayRealVector {
        self.map_add(-d)
    }

    fn map_multiply(&self, d: f64) -> ArrayRealVector {
        ArrayRealVector::from_vec(self.to_array().into_iter().map(|x| x * d).collect())
    }

    fn map_divide(&self, d: f64) -> ArrayRealVector {
        ArrayRealVector::from_vec(self.to_array().into_iter().map(|x| x / d).collect())
    }

    fn map_add_to_self(&mut self, d: f64) -> Result<()> {
        for i in 0..self.dimension() {
            let value = self.entry(i) + d;
            self.set_entry(i, value)?;
        }
        Ok(())
    }

    fn map_multiply_to_self(&mut self, d: f64) -> Result<()> {
        for i in 0..self.dimension() {
            let value = self.entry(i) * d;
            self.set_entry(i, value)?;
        }
        Ok(())
    }

    fn map_divide_to_self(&mut self, d: f64) -> Result<()> {
        for i in 0..self.dimension() {
            let value = self.entry(i) / d;
            self.set_entry(i, value)?;
        }
        Ok(())
    }

    fn ebe_multiply(&self, v: &dyn RealVector) -> Result<ArrayRealVector> {
        check_same_dimension(self.dimension(), v.dimension())?;
        Ok(ArrayRealVector::from_vec(
            (0..self.dimension())
                .map(|i| self.entry(i) * v.entry(i))
                .collect(),
        ))
    }

    fn ebe_divide(&self, v: &dyn RealVector) -> Result<ArrayRealVector> {
        check_same_dimension(self.dimension(), v.dimension())?;
        Ok(ArrayRealVector::from_vec(
            (0..self.dimension())
                .map(|i| self.entry(i) / v.entry(i))
                .collect(),
        ))
    }

    /// Vector of the same direction with unit norm.
    fn unit_vector(&self) -> Result<ArrayRealVector> {
        let norm = self.get_norm();
        if norm == 0.0 {
            return Err(LinAlgError::ZeroNorm);
        }
        Ok(self.map_divide(norm))
    }

    fn cosine(&self, v: &dyn RealVector) -> Result<f64> {
        let norm = self.get_norm();
        let v_norm = v.get_norm();
        if norm == 0.0 || v_norm == 0.0 {
            return Err(LinAlgError::ZeroNorm);
        }
        Ok(self.dot_product(v)? / (norm * v_norm))
    }

    /// Orthogonal projection of `self` onto `v`.
    fn projection(&self, v: &dyn RealVector) -> Result<ArrayRealVector> {
        let norm2 = v.dot_product(v)?;
        if norm2 == 0.0 {
            return Err(LinAlgError::ZeroNorm);
        }
        Ok(v.map_multiply(self.dot_product(v)? / norm2))
    }

    fn outer_product(&self, v: &dyn RealVector) -> Array2DRowRealMatrix {
        let data = (0..self.dimension())
            .map(|i| {
                (0..v.dimension())
                    .map(|j| self.entry(i) * v.entry(j))
                    .collect()
            })
            .collect();
        Array2DRowRealMatrix::from_rows_unchecked(data)
    }

    fn append(&self, v: &dyn RealVector) -> ArrayRealVector {
        let mut data = self.to_array();
        data.extend(v.to_array());
        ArrayRealVector::from_vec(data)
    }

    fn get_sub_vector(&self, index: usize, n: usize) -> Result<ArrayRealVector> {
        check_sub_vector_range(self.dimension(), index, n)?;
        Ok(ArrayRealVector::from_vec(
            (index..index + n).map(|i| self.entry(i)).collect(),
        ))
    }

    fn set_sub_vector(&mut self, index: usize, v: &dyn RealVector) -> Result<()> {
        check_sub_vector_range(self.dimension(), index, v.dimension())?;
        for i in 0..v.dimension() {
            self.set_entry(index + i, v.entry(i))?;
        }
        Ok(())
    }

    /// Fills the vector with `value`.
    fn set(&mut self, value: f64) -> Result<()> {
        for i in 0..self.dimension() {
            self.set_entry(i, value)?;
        }
        Ok(())
    }

    fn is_nan(&self) -> bool {
        (0..self.dimension()).any(|i| self.entry(i).is_nan())
    }

    /// true when some entry is infinite and none is NaN
    fn is_infinite(&self) -> bool {
        !self.is_nan() && (0..self.dimension()).any(|i| self.entry(i).is_infinite())
    }

    fn walk_in_default_order(&mut self, visitor: &mut dyn RealVectorChangingVisitor) -> Result<f64> {
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
        visitor: &mut dyn RealVectorChangingVisitor,
        start: usize,
        end: usize,
    ) -> Result<f64> {
        check_vector_range(self.dimension(), start, end)?;
        visitor.start(self.dimension(), start, end);
        for i in start..=end {
            let value = visitor.visit(i, self.entry(i));
            self.set_entry(i, value)?;
        }
        Ok(visitor.end())
    }

    fn walk_in_default_order_preserving(
        &self,
        visitor: &mut dyn RealVectorPreservingVisitor,
    ) -> f64 {
        let dim = self.dimension();
        visitor.start(dim, 0, dim.saturating_sub(1));
        for i in 0..dim {
            visitor.visit(i, self.entry(i));
        }
        visitor.end()
    }

    fn walk_in_default_order_preserving_range(
        &self,
        visitor: &mut dyn RealVectorPreservingVisitor,
        start: usize,
        end: usize,
    ) -> Result<f64> {
        check_vector_range(self.dimension(), start, end)?;
        visitor.start(self.dimension(), start, end);
        for i in start..=end {
            visitor.visit(i, self.entry(i));
        }
        Ok(visitor.end())
    }
}

fn check_vector_range(dim: usize, start: usize, end: usize) -> Result<()> {
    check_vector_index(dim, start)?;
    check_vector_index(dim, end)?;
    if end < start {
        return Err(LinAlgError::InvalidRange { start, end });
    }
    Ok(())
}

/// Dense real vector backed by a `Vec<f64>`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ArrayRealVector {
    data: Vec<f64>,
}

impl ArrayRealVector {
    /// Zero vector of the given dimension.
    pub fn new(size: usize) -> Self {
        ArrayRealVector {
            data: vec![0.0; size],
        }
    }

    pub fn filled(size: usize, preset: f64) -> Self {
        ArrayRealVector {
            data: vec![preset; size],
        }
    }

    /// Takes ownership of `data` without copying it.
    pub fn from_vec(data: Vec<f64>) -> Self {
        ArrayRealVector { data }
    }

    /// Defensive copy of `data`.
    pub fn from_slice(data: &[f64]) -> Self {
        ArrayRealVector {
            data: data.to_vec(),
        }
    }

    pub fn from_vector(v: &dyn RealVector) -> Self {
        ArrayRealVector { data: v.to_array() }
    }

    pub fn data_ref(&self) -> &[f64] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    pub fn iter(&self) -> std::slice::Iter<'_, f64> {
        self.data.iter()
    }

    pub fn to_dvector(&self) -> DVector<f64> {
        DVector::from_column_slice(&self.data)
    }

    /// `self += alpha * v` without allocating.
    pub fn axpy(&mut self, alpha: f64, v: &ArrayRealVector) -> Result<()> {
        check_same_dimension(self.dimension(), v.dimension())?;
        for (x, y) in self.data.iter_mut().zip(&v.data) {
            *x += alpha * y;
        }
        Ok(())
    }
}

impl From<DVector<f64>> for ArrayRealVector {
    fn from(v: DVector<f64>) -> Self {
        ArrayRealVector::from_vec(v.as_slice().to_vec())
    }
}

impl From<Vec<f64>> for ArrayRealVector {
    fn from(data: Vec<f64>) -> Self {
        ArrayRealVector::from_vec(data)
    }
}

impl Index<usize> for ArrayRealVector {
    type Output = f64;
    fn index(&self, index: usize) -> &f64 {
        &self.data[index]
    }
}

impl RealVector for ArrayRealVector {
    fn dimension(&self) -> usize {
        self.data.len()
    }

    fn entry(&self, index: usize) -> f64 {
        self.data[index]
    }

    fn set_entry(&mut self, index: usize, value: f64) -> Result<()> {
        check_vector_index(self.data.len(), index)?;
        self.data[index] = value;
        Ok(())
    }

    fn as_slice(&self) -> Option<&[f64]> {
        Some(&self.data)
    }

    fn dot_product(&self, v: &dyn RealVector) -> Result<f64> {
        check_same_dimension(self.dimension(), v.dimension())?;
        Ok(match v.as_slice() {
            Some(other) => self.data.iter().zip(other).map(|(a, b)| a * b).sum(),
            None => self
                .data
                .iter()
                .enumerate()
                .map(|(i, a)| a * v.entry(i))
                .sum(),
        })
    }

    fn get_norm(&self) -> f64 {
        self.data.iter().map(|x| x * x).sum::<f64>().sqrt()
    }

    fn combine_to_self(&mut self, a: f64, b: f64, y: &dyn RealVector) -> Result<()> {
        check_same_dimension(self.dimension(), y.dimension())?;
        for (i, x) in self.data.iter_mut().enumerate() {
            *x = a * *x + b * y.entry(i);
        }
        Ok(())
    }

    fn set(&mut self, value: f64) -> Result<()> {
        self.data.iter_mut().for_each(|x| *x = value);
        Ok(())
    }
}

/// Read-only view of a borrowed vector; every mutator fails with
/// [`LinAlgError::UnsupportedOperation`].
#[derive(Clone, Copy)]
pub struct UnmodifiableRealVector<'a> {
    inner: &'a dyn RealVector,
}

impl<'a> UnmodifiableRealVector<'a> {
    pub fn new(inner: &'a dyn RealVector) -> Self {
        UnmodifiableRealVector { inner }
    }
}

impl fmt::Debug for UnmodifiableRealVector<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("UnmodifiableRealVector")
            .field(&self.inner)
            .finish()
    }
}

fn read_only() -> LinAlgError {
    LinAlgError::UnsupportedOperation("vector is read-only".to_string())
}

impl RealVector for UnmodifiableRealVector<'_> {
    fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    fn entry(&self, index: usize) -> f64 {
        self.inner.entry(index)
    }

    fn set_entry(&mut self, _index: usize, _value: f64) -> Result<()> {
        Err(read_only())
    }

    fn as_slice(&self) -> Option<&[f64]> {
        self.inner.as_slice()
    }

    fn add_to_entry(&mut self, _index: usize, _increment: f64) -> Result<()> {
        Err(read_only())
    }

    fn combine_to_self(&mut self, _a: f64, _b: f64, _y: &dyn RealVector) -> Result<()> {
        Err(read_only())
    }

    fn map_add_to_self(&mut self, _d: f64) -> Result<()> {
        Err(read_only())
    }

    fn map_multiply_to_self(&mut self, _d: f64) -> Result<()> {
        Err(read_only())
    }

    fn map_divide_to_self(&mut self, _d: f64) -> Result<()> {
        Err(read_only())
    }

    fn set(&mut self, _value: f64) -> Result<()> {
        Err(read_only())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrices::real_matrix::RealMatrix;
    use crate::matrices::visitors::SumVisitor;
    use approx::assert_relative_eq;

    #[test]
    fn test_ownership_of_constructors() {
        let raw = vec![1.0, 2.0, 3.0];
        let ptr = raw.as_ptr();
        let owned = ArrayRealVector::from_vec(raw);
        assert_eq!(owned.data_ref().as_ptr(), ptr);
        let copied = ArrayRealVector::from_slice(owned.data_ref());
        assert_ne!(copied.data_ref().as_ptr(), ptr);
        assert_eq!(copied, owned);
    }

    #[test]
    fn test_arithmetic() {
        let v1 = ArrayRealVector::from_vec(vec![1.0, 2.0, 3.0]);
        let v2 = ArrayRealVector::from_vec(vec![4.0, 5.0, 6.0]);
        assert_eq!(v1.add(&v2).unwrap().to_array(), vec![5.0, 7.0, 9.0]);
        assert_eq!(v2.subtract(&v1).unwrap().to_array(), vec![3.0, 3.0, 3.0]);
        assert_eq!(v1.dot_product(&v2).unwrap(), 32.0);
        assert_eq!(v1.ebe_multiply(&v2).unwrap().to_array(), vec![4.0, 10.0, 18.0]);
        assert_eq!(v1.map_add(1.0).to_array(), vec![2.0, 3.0, 4.0]);
        let mut halved = v2.copy();
        halved.map_divide_to_self(2.0).unwrap();
        assert_eq!(halved.to_array(), vec![2.0, 2.5, 3.0]);
        assert_eq!(v1.combine(2.0, -1.0, &v2).unwrap().to_array(), vec![-2.0, -1.0, 0.0]);
        assert_relative_eq!(v1.get_norm(), 14f64.sqrt(), epsilon = 1e-15);
        assert_eq!(v1.get_l1_norm(), 6.0);
        assert_eq!(v1.get_l_inf_norm(), 3.0);
        assert_relative_eq!(v1.get_distance(&v2).unwrap(), 27f64.sqrt(), epsilon = 1e-15);
        let outer = v1.outer_product(&v2);
        assert_eq!(outer.get_entry(2, 1).unwrap(), 15.0);
        let proj = v1.projection(&v2).unwrap();
        assert_relative_eq!(proj[0], 4.0 * 32.0 / 77.0, epsilon = 1e-15);
        assert_relative_eq!(v1.unit_vector().unwrap().get_norm(), 1.0, epsilon = 1e-15);
        assert_eq!(
            ArrayRealVector::new(2).unit_vector(),
            Err(LinAlgError::ZeroNorm)
        );
    }

    #[test]
    fn test_dimension_and_index_errors() {
        let mut v1 = ArrayRealVector::from_vec(vec![1.0, 2.0, 3.0]);
        let v2 = ArrayRealVector::new(2);
        assert_eq!(
            v1.add(&v2),
            Err(LinAlgError::DimensionMismatch { got: 2, expected: 3 })
        );
        assert!(v1.get_entry(3).is_err());
        assert!(v1.set_entry(5, 1.0).is_err());
        assert!(v1.get_sub_vector(2, 2).is_err());
        v1.set_sub_vector(1, &v2).unwrap();
        assert_eq!(v1.to_array(), vec![1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_nan_and_infinite() {
        let v = ArrayRealVector::from_vec(vec![1.0, f64::INFINITY]);
        assert!(v.is_infinite());
        let w = ArrayRealVector::from_vec(vec![f64::NAN, f64::INFINITY]);
        assert!(w.is_nan());
        assert!(!w.is_infinite());
    }

    struct Doubler;
    impl RealVectorChangingVisitor for Doubler {
        fn visit(&mut self, _index: usize, value: f64) -> f64 {
            2.0 * value
        }
    }

    #[test]
    fn test_walks() {
        let mut v = ArrayRealVector::from_vec(vec![1.0, 2.0, 3.0, 4.0]);
        v.walk_in_default_order_range(&mut Doubler, 1, 2).unwrap();
        assert_eq!(v.to_array(), vec![1.0, 4.0, 6.0, 4.0]);
        let mut sum = SumVisitor::default();
        assert_eq!(v.walk_in_default_order_preserving(&mut sum), 15.0);
        assert_eq!(sum.visited, 4);
        assert!(v.walk_in_default_order_range(&mut Doubler, 3, 1).is_err());
    }

    #[test]
    fn test_unmodifiable_view_rejects_mutation() {
        let v = ArrayRealVector::from_vec(vec![1.0, 2.0]);
        let mut view = UnmodifiableRealVector::new(&v);
        assert_eq!(view.get_entry(1).unwrap(), 2.0);
        assert_eq!(view.get_norm(), v.get_norm());
        assert!(view.set_entry(0, 3.0).is_err());
        assert!(view.add_to_entry(0, 3.0).is_err());
        assert!(view.set(0.0).is_err());
        assert!(view.map_multiply_to_self(2.0).is_err());
        assert!(view.map_divide_to_self(2.0).is_err());
        assert!(view.walk_in_default_order(&mut Doubler).is_err());
        assert_eq!(v.to_array(), vec![1.0, 2.0]);
    }

    #[test]
    fn test_nalgebra_interop() {
        let v = ArrayRealVector::from_vec(vec![1.0, -2.0]);
        let d = v.to_dvector();
        assert_eq!(d[1], -2.0);
        assert_eq!(ArrayRealVector::from(d), v);
    }
}
