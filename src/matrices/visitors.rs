//! Visitor traits used by the `walk_in_*` traversals of matrices and vectors.
//!
//! `start` is called once before the first cell with the full dimensions and the
//! visited range, `visit` once per cell, and the value returned by `end` is the
//! value of the whole walk. "Changing" visitors return the replacement value of
//! each cell, "preserving" ones only observe.
use num_traits::Zero;

use crate::matrices::field::FieldElement;

pub trait RealMatrixChangingVisitor {
    fn start(
        &mut self,
        _rows: usize,
        _columns: usize,
        _start_row: usize,
        _end_row: usize,
        _start_column: usize,
        _end_column: usize,
    ) {
    }
    fn visit(&mut self, row: usize, column: usize, value: f64) -> f64;
    fn end(&mut self) -> f64 {
        0.0
    }
}

pub trait RealMatrixPreservingVisitor {
    fn start(
        &mut self,
        _rows: usize,
        _columns: usize,
        _start_row: usize,
        _end_row: usize,
        _start_column: usize,
        _end_column: usize,
    ) {
    }
    fn visit(&mut self, row: usize, column: usize, value: f64);
    fn end(&mut self) -> f64 {
        0.0
    }
}

pub trait FieldMatrixChangingVisitor<T: FieldElement> {
    fn start(
        &mut self,
        _rows: usize,
        _columns: usize,
        _start_row: usize,
        _end_row: usize,
        _start_column: usize,
        _end_column: usize,
    ) {
    }
    fn visit(&mut self, row: usize, column: usize, value: T) -> T;
    fn end(&mut self) -> T {
        T::zero()
    }
}

pub trait FieldMatrixPreservingVisitor<T: FieldElement> {
    fn start(
        &mut self,
        _rows: usize,
        _columns: usize,
        _start_row: usize,
        _end_row: usize,
        _start_column: usize,
        _end_column: usize,
    ) {
    }
    fn visit(&mut self, row: usize, column: usize, value: &T);
    fn end(&mut self) -> T {
        T::zero()
    }
}

pub trait RealVectorChangingVisitor {
    fn start(&mut self, _dimension: usize, _start: usize, _end: usize) {}
    fn visit(&mut self, index: usize, value: f64) -> f64;
    fn end(&mut self) -> f64 {
        0.0
    }
}

pub trait RealVectorPreservingVisitor {
    fn start(&mut self, _dimension: usize, _start: usize, _end: usize) {}
    fn visit(&mut self, index: usize, value: f64);
    fn end(&mut self) -> f64 {
        0.0
    }
}

pub trait FieldVectorChangingVisitor<T: FieldElement> {
    fn start(&mut self, _dimension: usize, _start: usize, _end: usize) {}
    fn visit(&mut self, index: usize, value: T) -> T;
    fn end(&mut self) -> T {
        T::zero()
    }
}

pub trait FieldVectorPreservingVisitor<T: FieldElement> {
    fn start(&mut self, _dimension: usize, _start: usize, _end: usize) {}
    fn visit(&mut self, index: usize, value: &T);
    fn end(&mut self) -> T {
        T::zero()
    }
}

/// Preserving visitor summing every visited cell; handy for quick checksums.
#[derive(Debug, Default, Clone)]
pub struct SumVisitor {
    pub sum: f64,
    pub visited: usize,
}

impl RealMatrixPreservingVisitor for SumVisitor {
    fn visit(&mut self, _row: usize, _column: usize, value: f64) {
        self.sum += value;
        self.visited += 1;
    }
    fn end(&mut self) -> f64 {
        self.sum
    }
}

impl RealVectorPreservingVisitor for SumVisitor {
    fn visit(&mut self, _index: usize, value: f64) {
        self.sum += value;
        self.visited += 1;
    }
    fn end(&mut self) -> f64 {
        self.sum
    }
}

/// Field counterpart of [`SumVisitor`].
#[derive(Debug, Clone)]
pub struct FieldSumVisitor<T: FieldElement> {
    pub sum: T,
    pub visited: usize,
}

impl<T: FieldElement> Default for FieldSumVisitor<T> {
    fn default() -> Self {
        FieldSumVisitor {
            sum: T::zero(),
            visited: 0,
        }
    }
}

impl<T: FieldElement> FieldMatrixPreservingVisitor<T> for FieldSumVisitor<T> {
    fn visit(&mut self, _row: usize, _column: usize, value: &T) {
        self.sum = self.sum.clone() + value.clone();
        self.visited += 1;
    }
    fn end(&mut self) -> T {
        self.sum.clone()
    }
}

impl<T: FieldElement> FieldVectorPreservingVisitor<T> for FieldSumVisitor<T> {
    fn visit(&mut self, _index: usize, value: &T) {
        self.sum = self.sum.clone() + value.clone();
        self.visited += 1;
    }
    fn end(&mut self) -> T {
        self.sum.clone()
    }
}
