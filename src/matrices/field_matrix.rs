//! The [`FieldMatrix`] trait, the field-generic counterpart of `RealMatrix`.
use std::fmt;

use crate::linalg_error::{LinAlgError, Result};
use crate::matrices::field::{Field, FieldElement};
use crate::matrices::field_vector::{ArrayFieldVector, FieldVector};
use crate::matrices::matrix_utils::{
    check_addition_compatible, check_column_index, check_multiplication_compatible,
    check_rectangular, check_row_index, check_sub_matrix_indices, check_sub_matrix_range,
};
use crate::matrices::visitors::{FieldMatrixChangingVisitor, FieldMatrixPreservingVisitor};

pub trait FieldMatrix<T: FieldElement>: fmt::Debug {
    fn row_dimension(&self) -> usize;

    fn column_dimension(&self) -> usize;

    /// Entry at `(row, column)`; panics when out of bounds.
    fn entry(&self, row: usize, column: usize) -> T;

    fn set_entry(&mut self, row: usize, column: usize, value: T) -> Result<()>;

    fn create_matrix(&self, rows: usize, columns: usize) -> Result<Box<dyn FieldMatrix<T>>>;

    fn copy(&self) -> Box<dyn FieldMatrix<T>>;

    fn field(&self) -> Field<T> {
        Field::new()
    }

    fn is_square(&self) -> bool {
        self.row_dimension() == self.column_dimension()
    }

    fn get_entry(&self, row: usize, column: usize) -> Result<T> {
        check_row_index(self.row_dimension(), row)?;
        check_column_index(self.column_dimension(), column)?;
        Ok(self.entry(row, column))
    }

    fn add_to_entry(&mut self, row: usize, column: usize, increment: T) -> Result<()> {
        let value = self.get_entry(row, column)?;
        self.set_entry(row, column, value + increment)
    }

    fn multiply_entry(&mut self, row: usize, column: usize, factor: T) -> Result<()> {
        let value = self.get_entry(row, column)?;
        self.set_entry(row, column, value * factor)
    }

    fn get_data(&self) -> Vec<Vec<T>> {
        (0..self.row_dimension())
            .map(|i| (0..self.column_dimension()).map(|j| self.entry(i, j)).collect())
            .collect()
    }

    fn add(&self, m: &dyn FieldMatrix<T>) -> Result<Box<dyn FieldMatrix<T>>> {
        check_addition_compatible(
            self.row_dimension(),
            self.column_dimension(),
            m.row_dimension(),
            m.column_dimension(),
        )?;
        let mut out = self.create_matrix(self.row_dimension(), self.column_dimension())?;
        for i in 0..self.row_dimension() {
            for j in 0..self.column_dimension() {
                out.set_entry(i, j, self.entry(i, j) + m.entry(i, j))?;
            }
        }
        Ok(out)
    }

    fn subtract(&self, m: &dyn FieldMatrix<T>) -> Result<Box<dyn FieldMatrix<T>>> {
        check_addition_compatible(
            self.row_dimension(),
            self.column_dimension(),
            m.row_dimension(),
            m.column_dimension(),
        )?;
        let mut out = self.create_matrix(self.row_dimension(), self.column_dimension())?;
        for i in 0..self.row_dimension() {
            for j in 0..self.column_dimension() {
                out.set_entry(i, j, self.entry(i, j) - m.entry(i, j))?;
            }
        }
        Ok(out)
    }

    fn scalar_add(&self, d: T) -> Result<Box<dyn FieldMatrix<T>>> {
        let mut out = self.create_matrix(self.row_dimension(), self.column_dimension())?;
        for i in 0..self.row_dimension() {
            for j in 0..self.column_dimension() {
                out.set_entry(i, j, self.entry(i, j) + d.clone())?;
            }
        }
        Ok(out)
    }

    fn scalar_multiply(&self, d: T) -> Result<Box<dyn FieldMatrix<T>>> {
        let mut out = self.create_matrix(self.row_dimension(), self.column_dimension())?;
        for i in 0..self.row_dimension() {
            for j in 0..self.column_dimension() {
                out.set_entry(i, j, self.entry(i, j) * d.clone())?;
            }
        }
        Ok(out)
    }

    /// `self * m`
    fn multiply(&self, m: &dyn FieldMatrix<T>) -> Result<Box<dyn FieldMatrix<T>>> {
        check_multiplication_compatible(
            self.row_dimension(),
            self.column_dimension(),
            m.row_dimension(),
            m.column_dimension(),
        )?;
        let mut out = self.create_matrix(self.row_dimension(), m.column_dimension())?;
        for i in 0..self.row_dimension() {
            for j in 0..m.column_dimension() {
                let sum = (0..self.column_dimension())
                    .fold(T::zero(), |acc, k| acc + self.entry(i, k) * m.entry(k, j));
                out.set_entry(i, j, sum)?;
            }
        }
        Ok(out)
    }

    /// `m * self`, built in `m`'s storage
    fn pre_multiply_matrix(&self, m: &dyn FieldMatrix<T>) -> Result<Box<dyn FieldMatrix<T>>> {
        check_multiplication_compatible(
            m.row_dimension(),
            m.column_dimension(),
            self.row_dimension(),
            self.column_dimension(),
        )?;
        let mut out = m.create_matrix(m.row_dimension(), self.column_dimension())?;
        for i in 0..m.row_dimension() {
            for j in 0..self.column_dimension() {
                let sum = (0..self.row_dimension())
                    .fold(T::zero(), |acc, k| acc + m.entry(i, k) * self.entry(k, j));
                out.set_entry(i, j, sum)?;
            }
        }
        Ok(out)
    }

    /// `self * mᵗ`; this default materializes the transpose first.
    fn multiply_transposed(&self, m: &dyn FieldMatrix<T>) -> Result<Box<dyn FieldMatrix<T>>> {
        let mt = m.transpose()?;
        self.multiply(mt.as_ref())
    }

    /// `selfᵗ * m`; this default materializes the transpose first.
    fn transpose_multiply(&self, m: &dyn FieldMatrix<T>) -> Result<Box<dyn FieldMatrix<T>>> {
        let t = self.transpose()?;
        t.multiply(m)
    }

    fn power(&self, p: u32) -> Result<Box<dyn FieldMatrix<T>>> {
        let n = self.row_dimension();
        if !self.is_square() {
            return Err(LinAlgError::NonSquare {
                rows: n,
                columns: self.column_dimension(),
            });
        }
        let mut result = self.create_matrix(n, n)?;
        for i in 0..n {
            result.set_entry(i, i, T::one())?;
        }
        let mut base = self.copy();
        let mut p = p;
        while p > 0 {
            if p & 1 == 1 {
                result = result.multiply(base.as_ref())?;
            }
            p >>= 1;
            if p > 0 {
                base = base.multiply(base.as_ref())?;
            }
        }
        Ok(result)
    }

    fn transpose(&self) -> Result<Box<dyn FieldMatrix<T>>> {
        let mut out = self.create_matrix(self.column_dimension(), self.row_dimension())?;
        for i in 0..self.row_dimension() {
            for j in 0..self.column_dimension() {
                let value = self.entry(i, j);
                if !value.is_zero() {
                    out.set_entry(j, i, value)?;
                }
            }
        }
        Ok(out)
    }

    fn get_trace(&self) -> Result<T> {
        if !self.is_square() {
            return Err(LinAlgError::NonSquare {
                rows: self.row_dimension(),
                columns: self.column_dimension(),
            });
        }
        Ok((0..self.row_dimension()).fold(T::zero(), |acc, i| acc + self.entry(i, i)))
    }

    fn get_sub_matrix(
        &self,
        start_row: usize,
        end_row: usize,
        start_column: usize,
        end_column: usize,
    ) -> Result<Box<dyn FieldMatrix<T>>> {
        check_sub_matrix_range(
            self.row_dimension(),
            self.column_dimension(),
            start_row,
            end_row,
            start_column,
            end_column,
        )?;
        let mut out = self.create_matrix(end_row - start_row + 1, end_column - start_column + 1)?;
        for i in start_row..=end_row {
            for j in start_column..=end_column {
                out.set_entry(i - start_row, j - start_column, self.entry(i, j))?;
            }
        }
        Ok(out)
    }

    fn get_sub_matrix_indices(
        &self,
        selected_rows: &[usize],
        selected_columns: &[usize],
    ) -> Result<Box<dyn FieldMatrix<T>>> {
        check_sub_matrix_indices(
            self.row_dimension(),
            self.column_dimension(),
            selected_rows,
            selected_columns,
        )?;
        let mut out = self.create_matrix(selected_rows.len(), selected_columns.len())?;
        for (i, &row) in selected_rows.iter().enumerate() {
            for (j, &column) in selected_columns.iter().enumerate() {
                out.set_entry(i, j, self.entry(row, column))?;
            }
        }
        Ok(out)
    }

    fn set_sub_matrix(&mut self, sub: &[Vec<T>], row: usize, column: usize) -> Result<()> {
        check_rectangular(sub)?;
        let width = sub[0].len();
        check_row_index(self.row_dimension(), row)?;
        check_column_index(self.column_dimension(), column)?;
        check_row_index(self.row_dimension(), row + sub.len() - 1)?;
        check_column_index(self.column_dimension(), column + width - 1)?;
        for (i, line) in sub.iter().enumerate() {
            for (j, value) in line.iter().enumerate() {
                self.set_entry(row + i, column + j, value.clone())?;
            }
        }
        Ok(())
    }

    fn get_row(&self, row: usize) -> Result<Vec<T>> {
        check_row_index(self.row_dimension(), row)?;
        Ok((0..self.column_dimension()).map(|j| self.entry(row, j)).collect())
    }

    fn set_row(&mut self, row: usize, array: &[T]) -> Result<()> {
        check_row_index(self.row_dimension(), row)?;
        if array.len() != self.column_dimension() {
            return Err(LinAlgError::MatrixDimensionMismatch {
                got_rows: 1,
                got_columns: array.len(),
                expected_rows: 1,
                expected_columns: self.column_dimension(),
            });
        }
        for (j, value) in array.iter().enumerate() {
            self.set_entry(row, j, value.clone())?;
        }
        Ok(())
    }

    fn get_column(&self, column: usize) -> Result<Vec<T>> {
        check_column_index(self.column_dimension(), column)?;
        Ok((0..self.row_dimension()).map(|i| self.entry(i, column)).collect())
    }

    fn set_column(&mut self, column: usize, array: &[T]) -> Result<()> {
        check_column_index(self.column_dimension(), column)?;
        if array.len() != self.row_dimension() {
            return Err(LinAlgError::MatrixDimensionMismatch {
                got_rows: array.len(),
                got_columns: 1,
                expected_rows: self.row_dimension(),
                expected_columns: 1,
            });
        }
        for (i, value) in array.iter().enumerate() {
            self.set_entry(i, column, value.clone())?;
        }
        Ok(())
    }

    fn get_row_vector(&self, row: usize) -> Result<ArrayFieldVector<T>> {
        Ok(ArrayFieldVector::with_field(self.field(), self.get_row(row)?))
    }

    fn set_row_vector(&mut self, row: usize, v: &dyn FieldVector<T>) -> Result<()> {
        self.set_row(row, &v.to_array())
    }

    fn get_column_vector(&self, column: usize) -> Result<ArrayFieldVector<T>> {
        Ok(ArrayFieldVector::with_field(self.field(), self.get_column(column)?))
    }

    fn set_column_vector(&mut self, column: usize, v: &dyn FieldVector<T>) -> Result<()> {
        self.set_column(column, &v.to_array())
    }

    fn get_row_matrix(&self, row: usize) -> Result<Box<dyn FieldMatrix<T>>> {
        let values = self.get_row(row)?;
        let mut out = self.create_matrix(1, values.len())?;
        for (j, value) in values.into_iter().enumerate() {
            out.set_entry(0, j, value)?;
        }
        Ok(out)
    }

    fn get_column_matrix(&self, column: usize) -> Result<Box<dyn FieldMatrix<T>>> {
        let values = self.get_column(column)?;
        let mut out = self.create_matrix(values.len(), 1)?;
        for (i, value) in values.into_iter().enumerate() {
            out.set_entry(i, 0, value)?;
        }
        Ok(out)
    }

    /// `self * v`
    fn operate(&self, v: &dyn FieldVector<T>) -> Result<ArrayFieldVector<T>> {
        if v.dimension() != self.column_dimension() {
            return Err(LinAlgError::DimensionMismatch {
                got: v.dimension(),
                expected: self.column_dimension(),
            });
        }
        Ok(ArrayFieldVector::with_field(
            self.field(),
            (0..self.row_dimension())
                .map(|i| {
                    (0..self.column_dimension())
                        .fold(T::zero(), |acc, j| acc + self.entry(i, j) * v.entry(j))
                })
                .collect(),
        ))
    }

    /// `vᵗ * self`
    fn pre_multiply(&self, v: &dyn FieldVector<T>) -> Result<ArrayFieldVector<T>> {
        if v.dimension() != self.row_dimension() {
            return Err(LinAlgError::DimensionMismatch {
                got: v.dimension(),
                expected: self.row_dimension(),
            });
        }
        Ok(ArrayFieldVector::with_field(
            self.field(),
            (0..self.column_dimension())
                .map(|j| {
                    (0..self.row_dimension())
                        .fold(T::zero(), |acc, i| acc + self.entry(i, j) * v.entry(i))
                })
                .collect(),
        ))
    }

    fn walk_in_row_order(&mut self, visitor: &mut dyn FieldMatrixChangingVisitor<T>) -> Result<T> {
        let (rows, columns) = (self.row_dimension(), self.column_dimension());
        visitor.start(rows, columns, 0, rows.saturating_sub(1), 0, columns.saturating_sub(1));
        for i in 0..rows {
            for j in 0..columns {
                let value = visitor.visit(i, j, self.entry(i, j));
                self.set_entry(i, j, value)?;
            }
        }
        Ok(visitor.end())
    }

    fn walk_in_row_order_range(
        &mut self,
        visitor: &mut dyn FieldMatrixChangingVisitor<T>,
        start_row: usize,
        end_row: usize,
        start_column: usize,
        end_column: usize,
    ) -> Result<T> {
        let (rows, columns) = (self.row_dimension(), self.column_dimension());
        check_sub_matrix_range(rows, columns, start_row, end_row, start_column, end_column)?;
        visitor.start(rows, columns, start_row, end_row, start_column, end_column);
        for i in start_row..=end_row {
            for j in start_column..=end_column {
                let value = visitor.visit(i, j, self.entry(i, j));
                self.set_entry(i, j, value)?;
            }
        }
        Ok(visitor.end())
    }

    fn walk_in_row_order_preserving(&self, visitor: &mut dyn FieldMatrixPreservingVisitor<T>) -> T {
        let (rows, columns) = (self.row_dimension(), self.column_dimension());
        visitor.start(rows, columns, 0, rows.saturating_sub(1), 0, columns.saturating_sub(1));
        for i in 0..rows {
            for j in 0..columns {
                visitor.visit(i, j, &self.entry(i, j));
            }
        }
        visitor.end()
    }

    fn walk_in_row_order_preserving_range(
        &self,
        visitor: &mut dyn FieldMatrixPreservingVisitor<T>,
        start_row: usize,
        end_row: usize,
        start_column: usize,
        end_column: usize,
    ) -> Result<T> {
        let (rows, columns) = (self.row_dimension(), self.column_dimension());
        check_sub_matrix_range(rows, columns, start_row, end_row, start_column, end_column)?;
        visitor.start(rows, columns, start_row, end_row, start_column, end_column);
        for i in start_row..=end_row {
            for j in start_column..=end_column {
                visitor.visit(i, j, &self.entry(i, j));
            }
        }
        Ok(visitor.end())
    }

    fn walk_in_column_order(
        &mut self,
        visitor: &mut dyn FieldMatrixChangingVisitor<T>,
    ) -> Result<T> {
        let (rows, columns) = (self.row_dimension(), self.column_dimension());
        visitor.start(rows, columns, 0, rows.saturating_sub(1), 0, columns.saturating_sub(1));
        for j in 0..columns {
            for i in 0..rows {
                let value = visitor.visit(i, j, self.entry(i, j));
                self.set_entry(i, j, value)?;
            }
        }
        Ok(visitor.end())
    }

    fn walk_in_column_order_range(
        &mut self,
        visitor: &mut dyn FieldMatrixChangingVisitor<T>,
        start_row: usize,
        end_row: usize,
        start_column: usize,
        end_column: usize,
    ) -> Result<T> {
        let (rows, columns) = (self.row_dimension(), self.column_dimension());
        check_sub_matrix_range(rows, columns, start_row, end_row, start_column, end_column)?;
        visitor.start(rows, columns, start_row, end_row, start_column, end_column);
        for j in start_column..=end_column {
            for i in start_row..=end_row {
                let value = visitor.visit(i, j, self.entry(i, j));
                self.set_entry(i, j, value)?;
            }
        }
        Ok(visitor.end())
    }

    fn walk_in_column_order_preserving(
        &self,
        visitor: &mut dyn FieldMatrixPreservingVisitor<T>,
    ) -> T {
        let (rows, columns) = (self.row_dimension(), self.column_dimension());
        visitor.start(rows, columns, 0, rows.saturating_sub(1), 0, columns.saturating_sub(1));
        for j in 0..columns {
            for i in 0..rows {
                visitor.visit(i, j, &self.entry(i, j));
            }
        }
        visitor.end()
    }

    fn walk_in_column_order_preserving_range(
        &self,
        visitor: &mut dyn FieldMatrixPreservingVisitor<T>,
        start_row: usize,
        end_row: usize,
        start_column: usize,
        end_column: usize,
    ) -> Result<T> {
        let (rows, columns) = (self.row_dimension(), self.column_dimension());
        check_sub_matrix_range(rows, columns, start_row, end_row, start_column, end_column)?;
        visitor.start(rows, columns, start_row, end_row, start_column, end_column);
        for j in start_column..=end_column {
            for i in start_row..=end_row {
                visitor.visit(i, j, &self.entry(i, j));
            }
        }
        Ok(visitor.end())
    }

    fn walk_in_optimized_order(
        &mut self,
        visitor: &mut dyn FieldMatrixChangingVisitor<T>,
    ) -> Result<T> {
        self.walk_in_row_order(visitor)
    }

    fn walk_in_optimized_order_range(
        &mut self,
        visitor: &mut dyn FieldMatrixChangingVisitor<T>,
        start_row: usize,
        end_row: usize,
        start_column: usize,
        end_column: usize,
    ) -> Result<T> {
        self.walk_in_row_order_range(visitor, start_row, end_row, start_column, end_column)
    }

    fn walk_in_optimized_order_preserving(
        &self,
        visitor: &mut dyn FieldMatrixPreservingVisitor<T>,
    ) -> T {
        self.walk_in_row_order_preserving(visitor)
    }

    fn walk_in_optimized_order_preserving_range(
        &self,
        visitor: &mut dyn FieldMatrixPreservingVisitor<T>,
        start_row: usize,
        end_row: usize,
        start_column: usize,
        end_column: usize,
    ) -> Result<T> {
        self.walk_in_row_order_preserving_range(visitor, start_row, end_row, start_column, end_column)
    }
}
