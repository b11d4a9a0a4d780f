//! Field element capability used by the generic matrices and vectors.
//!
//! Anything that supports `+ - * /`, has a zero and a one and can be approximated
//! by an `f64` (for pivoting and tolerance decisions) is a field element.
use std::fmt::Debug;
use std::marker::PhantomData;
use std::ops::{Add, Div, Mul, Neg, Sub};

use num::BigRational;
use num::rational::Ratio;
use num_complex::Complex;
use num_traits::{One, ToPrimitive, Zero};

pub trait FieldElement:
    Clone
    + PartialEq
    + Debug
    + Zero
    + One
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
    + 'static
{
    /// double precision approximation used for pivot choices and tolerances
    fn real(&self) -> f64;

    fn reciprocal(&self) -> Self {
        Self::one() / self.clone()
    }

    /// multiplication by a small integer, as used by scalar helpers
    fn multiply_by_usize(&self, n: usize) -> Self {
        let mut sum = Self::zero();
        for _ in 0..n {
            sum = sum + self.clone();
        }
        sum
    }
}

impl FieldElement for f64 {
    fn real(&self) -> f64 {
        *self
    }
    fn multiply_by_usize(&self, n: usize) -> Self {
        self * n as f64
    }
}

impl FieldElement for Complex<f64> {
    fn real(&self) -> f64 {
        self.re
    }
    fn multiply_by_usize(&self, n: usize) -> Self {
        self * n as f64
    }
}

impl FieldElement for Ratio<i64> {
    fn real(&self) -> f64 {
        self.to_f64().unwrap_or(f64::NAN)
    }
}

impl FieldElement for BigRational {
    fn real(&self) -> f64 {
        self.to_f64().unwrap_or(f64::NAN)
    }
}

/// Descriptor of the field a matrix or vector lives in.
///
/// The element type already identifies the field; the descriptor is what lets a
/// zero-dimension vector be built when no entry exists.
#[derive(Debug)]
pub struct Field<T: FieldElement> {
    _marker: PhantomData<fn() -> T>,
}

impl<T: FieldElement> Field<T> {
    pub fn new() -> Self {
        Field {
            _marker: PhantomData,
        }
    }
    pub fn zero(&self) -> T {
        T::zero()
    }
    pub fn one(&self) -> T {
        T::one()
    }
}

impl<T: FieldElement> Default for Field<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: FieldElement> Clone for Field<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: FieldElement> Copy for Field<T> {}

impl<T: FieldElement> PartialEq for Field<T> {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}
