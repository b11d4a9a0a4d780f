//! `y = A x` without materialized entries. Every real matrix is a linear
//! operator; iterative solvers only ever see this trait.
use crate::linalg_error::{LinAlgError, Result};
use crate::matrices::real_vector::{ArrayRealVector, RealVector};

pub trait RealLinearOperator {
    fn row_dimension(&self) -> usize;

    fn column_dimension(&self) -> usize;

    /// `A x`; fails with a dimension mismatch when `x` has the wrong size.
    fn operate(&self, x: &dyn RealVector) -> Result<ArrayRealVector>;

    /// `Aᵗ x`, only available when [`is_transposable`](Self::is_transposable) holds.
    fn operate_transpose(&self, _x: &dyn RealVector) -> Result<ArrayRealVector> {
        Err(LinAlgError::UnsupportedOperation(
            "operator is not transposable".to_string(),
        ))
    }

    fn is_transposable(&self) -> bool {
        false
    }

    fn is_square(&self) -> bool {
        self.row_dimension() == self.column_dimension()
    }
}

fn require_square(op: &dyn RealLinearOperator) -> Result<()> {
    if !op.is_square() {
        return Err(LinAlgError::NonSquareOperator {
            rows: op.row_dimension(),
            columns: op.column_dimension(),
        });
    }
    Ok(())
}

fn require_dimension(got: usize, expected: usize) -> Result<()> {
    if got != expected {
        return Err(LinAlgError::DimensionMismatch { got, expected });
    }
    Ok(())
}

/// Shared argument validation of the iterative solvers: square `a`, square
/// `m` of the same size, `b` and `x0` matching `a`.
pub(crate) fn check_parameters(
    a: &dyn RealLinearOperator,
    m: Option<&dyn RealLinearOperator>,
    b: &dyn RealVector,
    x0: &dyn RealVector,
) -> Result<()> {
    require_square(a)?;
    if let Some(m) = m {
        require_square(m)?;
        require_dimension(m.row_dimension(), a.row_dimension())?;
    }
    require_dimension(b.dimension(), a.row_dimension())?;
    require_dimension(x0.dimension(), a.column_dimension())?;
    Ok(())
}

/// Operator defined by a closure, for systems that are never assembled.
pub struct FunctionOperator<F>
where
    F: Fn(&dyn RealVector) -> Vec<f64>,
{
    dimension: usize,
    apply: F,
}

impl<F> FunctionOperator<F>
where
    F: Fn(&dyn RealVector) -> Vec<f64>,
{
    /// Square operator of size `dimension`.
    pub fn new(dimension: usize, apply: F) -> Self {
        FunctionOperator { dimension, apply }
    }
}

impl<F> RealLinearOperator for FunctionOperator<F>
where
    F: Fn(&dyn RealVector) -> Vec<f64>,
{
    fn row_dimension(&self) -> usize {
        self.dimension
    }

    fn column_dimension(&self) -> usize {
        self.dimension
    }

    fn operate(&self, x: &dyn RealVector) -> Result<ArrayRealVector> {
        if x.dimension() != self.dimension {
            return Err(LinAlgError::DimensionMismatch {
                got: x.dimension(),
                expected: self.dimension,
            });
        }
        let y = (self.apply)(x);
        if y.len() != self.dimension {
            return Err(LinAlgError::DimensionMismatch {
                got: y.len(),
                expected: self.dimension,
            });
        }
        Ok(ArrayRealVector::from_vec(y))
    }
}
