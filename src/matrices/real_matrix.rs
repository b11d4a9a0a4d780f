//! The [`RealMatrix`] trait: every real matrix is a linear operator with
//! addressable entries. Implementors supply storage access; the algebra,
//! sub-matrix handling and visitor walks are provided on top of it and can be
//! overridden when a storage layout allows something faster.
use std::fmt;

use crate::iterative_solvers::linear_operator::RealLinearOperator;
use crate::linalg_error::{LinAlgError, Result};
use crate::matrices::array2d_real_matrix::Array2DRowRealMatrix;
use crate::matrices::matrix_utils::{
    check_addition_compatible, check_column_index, check_multiplication_compatible,
    check_row_index, check_sub_matrix_indices, check_sub_matrix_range,
};
use crate::matrices::real_vector::{ArrayRealVector, RealVector};
use crate::matrices::visitors::{RealMatrixChangingVisitor, RealMatrixPreservingVisitor};

pub trait RealMatrix: RealLinearOperator + fmt::Debug {
    /// Entry at `(row, column)`; panics when out of bounds.
    fn entry(&self, row: usize, column: usize) -> f64;

    fn set_entry(&mut self, row: usize, column: usize, value: f64) -> Result<()>;

    /// New zero matrix of the same kind with the given shape.
    fn create_matrix(&self, rows: usize, columns: usize) -> Result<Box<dyn RealMatrix>>;

    fn copy(&self) -> Box<dyn RealMatrix>;

    fn get_entry(&self, row: usize, column: usize) -> Result<f64> {
        check_row_index(self.row_dimension(), row)?;
        check_column_index(self.column_dimension(), column)?;
        Ok(self.entry(row, column))
    }

    fn add_to_entry(&mut self, row: usize, column: usize, increment: f64) -> Result<()> {
        let value = self.get_entry(row, column)?;
        self.set_entry(row, column, value + increment)
    }

    fn multiply_entry(&mut self, row: usize, column: usize, factor: f64) -> Result<()> {
        let value = self.get_entry(row, column)?;
        self.set_entry(row, column, value * factor)
    }

    /// Copy of the entries as rows.
    fn get_data(&self) -> Vec<Vec<f64>> {
        (0..self.row_dimension())
            .map(|i| (0..self.column_dimension()).map(|j| self.entry(i, j)).collect())
            .collect()
    }

    fn add(&self, m: &dyn RealMatrix) -> Result<Box<dyn RealMatrix>> {
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

    fn subtract(&self, m: &dyn RealMatrix) -> Result<Box<dyn RealMatrix>> {
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

    fn scalar_add(&self, d: f64) -> Result<Box<dyn RealMatrix>> {
        let mut out = self.create_matrix(self.row_dimension(), self.column_dimension())?;
        for i in 0..self.row_dimension() {
            for j in 0..self.column_dimension() {
                out.set_entry(i, j, self.entry(i, j) + d)?;
            }
        }
        Ok(out)
    }

    fn scalar_multiply(&self, d: f64) -> Result<Box<dyn RealMatrix>> {
        let mut out = self.create_matrix(self.row_dimension(), self.column_dimension())?;
        for i in 0..self.row_dimension() {
            for j in 0..self.column_dimension() {
                out.set_entry(i, j, self.entry(i, j) * d)?;
            }
        }
        Ok(out)
    }

    /// `self * m`
    fn multiply(&self, m: &dyn RealMatrix) -> Result<Box<dyn RealMatrix>> {
        check_multiplication_compatible(
            self.row_dimension(),
            self.column_dimension(),
            m.row_dimension(),
            m.column_dimension(),
        )?;
        let (n_rows, n_cols, n_sum) = (
            self.row_dimension(),
            m.column_dimension(),
            self.column_dimension(),
        );
        let mut out = self.create_matrix(n_rows, n_cols)?;
        for i in 0..n_rows {
            for j in 0..n_cols {
                let sum: f64 = (0..n_sum).map(|k| self.entry(i, k) * m.entry(k, j)).sum();
                out.set_entry(i, j, sum)?;
            }
        }
        Ok(out)
    }

    /// `m * self` as a dense matrix; a diagonal `self` or `m` cannot hold the product.
    fn pre_multiply_matrix(&self, m: &dyn RealMatrix) -> Result<Box<dyn RealMatrix>> {
        check_multiplication_compatible(
            m.row_dimension(),
            m.column_dimension(),
            self.row_dimension(),
            self.column_dimension(),
        )?;
        let mut out = Array2DRowRealMatrix::new(m.row_dimension(), self.column_dimension());
        for i in 0..m.row_dimension() {
            for j in 0..self.column_dimension() {
                let sum: f64 = (0..self.row_dimension())
                    .map(|k| m.entry(i, k) * self.entry(k, j))
                    .sum();
                out.set_entry(i, j, sum)?;
            }
        }
        Ok(Box::new(out))
    }

    /// `self * mᵗ`; this default materializes the transpose first.
    fn multiply_transposed(&self, m: &dyn RealMatrix) -> Result<Box<dyn RealMatrix>> {
        let mt = m.transpose()?;
        self.multiply(mt.as_ref())
    }

    /// `selfᵗ * m`; this default materializes the transpose first.
    fn transpose_multiply(&self, m: &dyn RealMatrix) -> Result<Box<dyn RealMatrix>> {
        let t = self.transpose()?;
        t.multiply(m)
    }

    /// `self^p` for a square matrix, by binary exponentiation.
    fn power(&self, p: u32) -> Result<Box<dyn RealMatrix>> {
        let n = self.row_dimension();
        if n != self.column_dimension() {
            return Err(LinAlgError::NonSquare {
                rows: n,
                columns: self.column_dimension(),
            });
        }
        let mut result = self.create_matrix(n, n)?;
        for i in 0..n {
            result.set_entry(i, i, 1.0)?;
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

    fn transpose(&self) -> Result<Box<dyn RealMatrix>> {
        let mut out = self.create_matrix(self.column_dimension(), self.row_dimension())?;
        for i in 0..self.row_dimension() {
            for j in 0..self.column_dimension() {
                let value = self.entry(i, j);
                if value != 0.0 {
                    out.set_entry(j, i, value)?;
                }
            }
        }
        Ok(out)
    }

    /// Maximum absolute column sum.
    fn get_norm1(&self) -> f64 {
        (0..self.column_dimension())
            .map(|j| (0..self.row_dimension()).map(|i| self.entry(i, j).abs()).sum::<f64>())
            .fold(0.0, f64::max)
    }

    /// Maximum absolute row sum.
    fn get_norm_infty(&self) -> f64 {
        (0..self.row_dimension())
            .map(|i| (0..self.column_dimension()).map(|j| self.entry(i, j).abs()).sum::<f64>())
            .fold(0.0, f64::max)
    }

    fn get_frobenius_norm(&self) -> f64 {
        let mut sum = 0.0;
        for i in 0..self.row_dimension() {
            for j in 0..self.column_dimension() {
                sum += self.entry(i, j).powi(2);
            }
        }
        sum.sqrt()
    }

    fn get_trace(&self) -> Result<f64> {
        if !self.is_square() {
            return Err(LinAlgError::NonSquare {
                rows: self.row_dimension(),
                columns: self.column_dimension(),
            });
        }
        Ok((0..self.row_dimension()).map(|i| self.entry(i, i)).sum())
    }

    /// Sub-matrix over the inclusive ranges `[start_row, end_row] x [start_column, end_column]`.
    fn get_sub_matrix(
        &self,
        start_row: usize,
        end_row: usize,
        start_column: usize,
        end_column: usize,
    ) -> Result<Box<dyn RealMatrix>> {
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
    ) -> Result<Box<dyn RealMatrix>> {
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

    /// Copies a sub-matrix into `destination`, which must be at least as large.
    fn copy_sub_matrix(
        &self,
        start_row: usize,
        end_row: usize,
        start_column: usize,
        end_column: usize,
        destination: &mut [Vec<f64>],
    ) -> Result<()> {
        check_sub_matrix_range(
            self.row_dimension(),
            self.column_dimension(),
            start_row,
            end_row,
            start_column,
            end_column,
        )?;
        let rows = end_row - start_row + 1;
        let columns = end_column - start_column + 1;
        if destination.len() < rows || destination.iter().take(rows).any(|r| r.len() < columns) {
            return Err(LinAlgError::MatrixDimensionMismatch {
                got_rows: destination.len(),
                got_columns: destination.first().map_or(0, |r| r.len()),
                expected_rows: rows,
                expected_columns: columns,
            });
        }
        for i in 0..rows {
            for j in 0..columns {
                destination[i][j] = self.entry(start_row + i, start_column + j);
            }
        }
        Ok(())
    }

    /// Writes `sub` with its upper-left corner at `(row, column)`.
    fn set_sub_matrix(&mut self, sub: &[Vec<f64>], row: usize, column: usize) -> Result<()> {
        if sub.is_empty() || sub[0].is_empty() {
            return Err(LinAlgError::NoData);
        }
        let width = sub[0].len();
        for (r, line) in sub.iter().enumerate() {
            if line.len() != width {
                return Err(LinAlgError::RaggedArray {
                    row: r,
                    got: line.len(),
                    expected: width,
                });
            }
        }
        check_row_index(self.row_dimension(), row)?;
        check_column_index(self.column_dimension(), column)?;
        check_row_index(self.row_dimension(), row + sub.len() - 1)?;
        check_column_index(self.column_dimension(), column + width - 1)?;
        for (i, line) in sub.iter().enumerate() {
            for (j, value) in line.iter().enumerate() {
                self.set_entry(row + i, column + j, *value)?;
            }
        }
        Ok(())
    }

    fn get_row(&self, row: usize) -> Result<Vec<f64>> {
        check_row_index(self.row_dimension(), row)?;
        Ok((0..self.column_dimension()).map(|j| self.entry(row, j)).collect())
    }

    fn set_row(&mut self, row: usize, array: &[f64]) -> Result<()> {
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
            self.set_entry(row, j, *value)?;
        }
        Ok(())
    }

    fn get_column(&self, column: usize) -> Result<Vec<f64>> {
        check_column_index(self.column_dimension(), column)?;
        Ok((0..self.row_dimension()).map(|i| self.entry(i, column)).collect())
    }

    fn set_column(&mut self, column: usize, array: &[f64]) -> Result<()> {
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
            self.set_entry(i, column, *value)?;
        }
        Ok(())
    }

    fn get_row_vector(&self, row: usize) -> Result<ArrayRealVector> {
        Ok(ArrayRealVector::from_vec(self.get_row(row)?))
    }

    fn set_row_vector(&mut self, row: usize, v: &dyn RealVector) -> Result<()> {
        self.set_row(row, &v.to_array())
    }

    fn get_column_vector(&self, column: usize) -> Result<ArrayRealVector> {
        Ok(ArrayRealVector::from_vec(self.get_column(column)?))
    }

    fn set_column_vector(&mut self, column: usize, v: &dyn RealVector) -> Result<()> {
        self.set_column(column, &v.to_array())
    }

    /// Row `row` as a `1 x n` matrix.
    fn get_row_matrix(&self, row: usize) -> Result<Box<dyn RealMatrix>> {
        check_row_index(self.row_dimension(), row)?;
        let mut out = self.create_matrix(1, self.column_dimension())?;
        for j in 0..self.column_dimension() {
            out.set_entry(0, j, self.entry(row, j))?;
        }
        Ok(out)
    }

    fn set_row_matrix(&mut self, row: usize, m: &dyn RealMatrix) -> Result<()> {
        check_row_index(self.row_dimension(), row)?;
        if m.row_dimension() != 1 || m.column_dimension() != self.column_dimension() {
            return Err(LinAlgError::MatrixDimensionMismatch {
                got_rows: m.row_dimension(),
                got_columns: m.column_dimension(),
                expected_rows: 1,
                expected_columns: self.column_dimension(),
            });
        }
        for j in 0..self.column_dimension() {
            self.set_entry(row, j, m.entry(0, j))?;
        }
        Ok(())
    }

    /// Column `column` as an `m x 1` matrix.
    fn get_column_matrix(&self, column: usize) -> Result<Box<dyn RealMatrix>> {
        check_column_index(self.column_dimension(), column)?;
        let mut out = self.create_matrix(self.row_dimension(), 1)?;
        for i in 0..self.row_dimension() {
            out.set_entry(i, 0, self.entry(i, column))?;
        }
        Ok(out)
    }

    fn set_column_matrix(&mut self, column: usize, m: &dyn RealMatrix) -> Result<()> {
        check_column_index(self.column_dimension(), column)?;
        if m.column_dimension() != 1 || m.row_dimension() != self.row_dimension() {
            return Err(LinAlgError::MatrixDimensionMismatch {
                got_rows: m.row_dimension(),
                got_columns: m.column_dimension(),
                expected_rows: self.row_dimension(),
                expected_columns: 1,
            });
        }
        for i in 0..self.row_dimension() {
            self.set_entry(i, column, m.entry(i, 0))?;
        }
        Ok(())
    }

    /// `self * v` on a plain slice.
    fn operate_array(&self, v: &[f64]) -> Result<Vec<f64>> {
        if v.len() != self.column_dimension() {
            return Err(LinAlgError::DimensionMismatch {
                got: v.len(),
                expected: self.column_dimension(),
            });
        }
        Ok((0..self.row_dimension())
            .map(|i| (0..v.len()).map(|j| self.entry(i, j) * v[j]).sum())
            .collect())
    }

    /// `vᵗ * self`
    fn pre_multiply(&self, v: &dyn RealVector) -> Result<ArrayRealVector> {
        if v.dimension() != self.row_dimension() {
            return Err(LinAlgError::DimensionMismatch {
                got: v.dimension(),
                expected: self.row_dimension(),
            });
        }
        Ok(ArrayRealVector::from_vec(
            (0..self.column_dimension())
                .map(|j| (0..self.row_dimension()).map(|i| self.entry(i, j) * v.entry(i)).sum())
                .collect(),
        ))
    }

    fn walk_in_row_order(&mut self, visitor: &mut dyn RealMatrixChangingVisitor) -> Result<f64> {
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

    fn walk_in_row_order_preserving(&self, visitor: &mut dyn RealMatrixPreservingVisitor) -> f64 {
        let (rows, columns) = (self.row_dimension(), self.column_dimension());
        visitor.start(rows, columns, 0, rows.saturating_sub(1), 0, columns.saturating_sub(1));
        for i in 0..rows {
            for j in 0..columns {
                visitor.visit(i, j, self.entry(i, j));
            }
        }
        visitor.end()
    }

    fn walk_in_row_order_range(
        &mut self,
        visitor: &mut dyn RealMatrixChangingVisitor,
        start_row: usize,
        end_row: usize,
        start_column: usize,
        end_column: usize,
    ) -> Result<f64> {
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

    fn walk_in_row_order_preserving_range(
        &self,
        visitor: &mut dyn RealMatrixPreservingVisitor,
        start_row: usize,
        end_row: usize,
        start_column: usize,
        end_column: usize,
    ) -> Result<f64> {
        let (rows, columns) = (self.row_dimension(), self.column_dimension());
        check_sub_matrix_range(rows, columns, start_row, end_row, start_column, end_column)?;
        visitor.start(rows, columns, start_row, end_row, start_column, end_column);
        for i in start_row..=end_row {
            for j in start_column..=end_column {
                visitor.visit(i, j, self.entry(i, j));
            }
        }
        Ok(visitor.end())
    }

    fn walk_in_column_order(&mut self, visitor: &mut dyn RealMatrixChangingVisitor) -> Result<f64> {
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

    fn walk_in_column_order_preserving(
        &self,
        visitor: &mut dyn RealMatrixPreservingVisitor,
    ) -> f64 {
        let (rows, columns) = (self.row_dimension(), self.column_dimension());
        visitor.start(rows, columns, 0, rows.saturating_sub(1), 0, columns.saturating_sub(1));
        for j in 0..columns {
            for i in 0..rows {
                visitor.visit(i, j, self.entry(i, j));
            }
        }
        visitor.end()
    }

    fn walk_in_column_order_range(
        &mut self,
        visitor: &mut dyn RealMatrixChangingVisitor,
        start_row: usize,
        end_row: usize,
        start_column: usize,
        end_column: usize,
    ) -> Result<f64> {
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

    fn walk_in_column_order_preserving_range(
        &self,
        visitor: &mut dyn RealMatrixPreservingVisitor,
        start_row: usize,
        end_row: usize,
        start_column: usize,
        end_column: usize,
    ) -> Result<f64> {
        let (rows, columns) = (self.row_dimension(), self.column_dimension());
        check_sub_matrix_range(rows, columns, start_row, end_row, start_column, end_column)?;
        visitor.start(rows, columns, start_row, end_row, start_column, end_column);
        for j in start_column..=end_column {
            for i in start_row..=end_row {
                visitor.visit(i, j, self.entry(i, j));
            }
        }
        Ok(visitor.end())
    }

    /// Visits every cell once in whatever order suits the storage; row order by default.
    fn walk_in_optimized_order(
        &mut self,
        visitor: &mut dyn RealMatrixChangingVisitor,
    ) -> Result<f64> {
        self.walk_in_row_order(visitor)
    }

    fn walk_in_optimized_order_preserving(
        &self,
        visitor: &mut dyn RealMatrixPreservingVisitor,
    ) -> f64 {
        self.walk_in_row_order_preserving(visitor)
    }

    fn walk_in_optimized_order_range(
        &mut self,
        visitor: &mut dyn RealMatrixChangingVisitor,
        start_row: usize,
        end_row: usize,
        start_column: usize,
        end_column: usize,
    ) -> Result<f64> {
        self.walk_in_row_order_range(visitor, start_row, end_row, start_column, end_column)
    }

    fn walk_in_optimized_order_preserving_range(
        &self,
        visitor: &mut dyn RealMatrixPreservingVisitor,
        start_row: usize,
        end_row: usize,
        start_column: usize,
        end_column: usize,
    ) -> Result<f64> {
        self.walk_in_row_order_preserving_range(visitor, start_row, end_row, start_column, end_column)
    }
}

/// `m * v` for any real matrix, shared by the `operate` implementations.
pub(crate) fn operate_matrix(m: &dyn RealMatrix, v: &dyn RealVector) -> Result<ArrayRealVector> {
    if v.dimension() != m.column_dimension() {
        return Err(LinAlgError::DimensionMismatch {
            got: v.dimension(),
            expected: m.column_dimension(),
        });
    }
    Ok(ArrayRealVector::from_vec(
        (0..m.row_dimension())
            .map(|i| (0..m.column_dimension()).map(|j| m.entry(i, j) * v.entry(j)).sum())
            .collect(),
    ))
}
