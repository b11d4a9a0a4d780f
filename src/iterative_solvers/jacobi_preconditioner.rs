//! Diagonal (Jacobi) preconditioner `M = diag(A)⁻¹`.
use log::debug;

use crate::iterative_solvers::linear_operator::RealLinearOperator;
use crate::linalg_error::{LinAlgError, Result};
use crate::matrices::real_matrix::RealMatrix;
use crate::matrices::real_vector::{ArrayRealVector, RealVector};

#[derive(Debug, Clone, PartialEq)]
pub struct JacobiPreconditioner {
    diagonal: ArrayRealVector,
}

impl JacobiPreconditioner {
    /// Takes the diagonal of `A` as given; applying the preconditioner
    /// divides by it.
    pub fn new(diagonal: Vec<f64>) -> Self {
        JacobiPreconditioner {
            diagonal: ArrayRealVector::from_vec(diagonal),
        }
    }

    /// Extracts the diagonal of an operator with one product per column.
    pub fn create(a: &dyn RealLinearOperator) -> Result<Self> {
        require_square(a)?;
        let n = a.row_dimension();
        let mut unit = ArrayRealVector::new(n);
        let mut diagonal = Vec::with_capacity(n);
        for i in 0..n {
            unit.set_entry(i, 1.0)?;
            diagonal.push(a.operate(&unit)?.entry(i));
            unit.set_entry(i, 0.0)?;
        }
        debug!("jacobi preconditioner built from {} operator products", n);
        Ok(Self::new(diagonal))
    }

    /// Reads the diagonal entries directly.
    pub fn from_matrix(a: &dyn RealMatrix) -> Result<Self> {
        if !a.is_square() {
            return Err(LinAlgError::NonSquareOperator {
                rows: a.row_dimension(),
                columns: a.column_dimension(),
            });
        }
        Ok(Self::new((0..a.row_dimension()).map(|i| a.entry(i, i)).collect()))
    }

    pub fn get_diagonal(&self) -> &ArrayRealVector {
        &self.diagonal
    }

    /// `M^½`, the operator dividing by the square root of the diagonal.
    pub fn sqrt_m(&self) -> JacobiPreconditioner {
        JacobiPreconditioner {
            diagonal: ArrayRealVector::from_vec(self.diagonal.iter().map(|d| d.sqrt()).collect()),
        }
    }
}

fn require_square(a: &dyn RealLinearOperator) -> Result<()> {
    if !a.is_square() {
        return Err(LinAlgError::NonSquareOperator {
            rows: a.row_dimension(),
            columns: a.column_dimension(),
        });
    }
    Ok(())
}

impl RealLinearOperator for JacobiPreconditioner {
    fn row_dimension(&self) -> usize {
        self.diagonal.dimension()
    }

    fn column_dimension(&self) -> usize {
        self.diagonal.dimension()
    }

    fn operate(&self, x: &dyn RealVector) -> Result<ArrayRealVector> {
        x.ebe_divide(&self.diagonal)
    }

    fn operate_transpose(&self, x: &dyn RealVector) -> Result<ArrayRealVector> {
        self.operate(x)
    }

    fn is_transposable(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iterative_solvers::linear_operator::FunctionOperator;
    use crate::matrices::array2d_real_matrix::Array2DRowRealMatrix;
    use approx::assert_relative_eq;

    #[test]
    fn test_diagonal_from_matrix_and_operator() {
        let a = Array2DRowRealMatrix::from_rows(vec![
            vec![4.0, 1.0, 0.0],
            vec![1.0, 9.0, 2.0],
            vec![0.0, 2.0, 16.0],
        ])
        .unwrap();
        let from_entries = JacobiPreconditioner::from_matrix(&a).unwrap();
        let from_products = JacobiPreconditioner::create(&a).unwrap();
        assert_eq!(from_entries, from_products);
        assert_eq!(from_entries.get_diagonal().to_array(), vec![4.0, 9.0, 16.0]);

        let x = ArrayRealVector::from_vec(vec![8.0, 9.0, 4.0]);
        assert_eq!(from_entries.operate(&x).unwrap().to_array(), vec![2.0, 1.0, 0.25]);
        let root = from_entries.sqrt_m();
        let y = root.operate(&x).unwrap();
        assert_relative_eq!(y.entry(0), 4.0);
        assert_relative_eq!(y.entry(1), 3.0);
        assert_relative_eq!(y.entry(2), 1.0);
        assert!(from_entries.operate(&ArrayRealVector::new(2)).is_err());
    }

    #[test]
    fn test_matrix_free_operator() {
        let op = FunctionOperator::new(2, |x: &dyn RealVector| {
            vec![3.0 * x.entry(0) + x.entry(1), x.entry(0) + 5.0 * x.entry(1)]
        });
        let m = JacobiPreconditioner::create(&op).unwrap();
        assert_eq!(m.get_diagonal().to_array(), vec![3.0, 5.0]);
        assert!(matches!(
            JacobiPreconditioner::create(&Array2DRowRealMatrix::new(2, 3)),
            Err(LinAlgError::NonSquareOperator { .. })
        ));
    }
}
