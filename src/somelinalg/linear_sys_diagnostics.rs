use log::{info, warn};

use crate::decompositions::decomposition_solver::DecompositionSolver;
use crate::decompositions::lu_decomposition::LUDecomposition;
use crate::linalg_error::{LinAlgError, Result};
use crate::matrices::array2d_real_matrix::Array2DRowRealMatrix;
use crate::matrices::real_matrix::RealMatrix;
use crate::matrices::real_vector::RealVector;

/// In mathematics, the Rouché–Capelli theorem gives a necessary and sufficient condition for a system of
/// linear equations to have a solution: `A x = b` is solvable if and only if rank(A) = rank([A b]).
/// Ranks are computed by nalgebra with a machine-epsilon tolerance.
pub fn Rouche_Capelli_theorem(A: &dyn RealMatrix, b: &dyn RealVector) -> Result<bool> {
    let (rows, columns) = (A.row_dimension(), A.column_dimension());
    if b.dimension() != rows {
        return Err(LinAlgError::DimensionMismatch {
            got: b.dimension(),
            expected: rows,
        });
    }
    let mut Ab = Array2DRowRealMatrix::new(rows, columns + 1);
    for (i, row) in Ab.data_mut().iter_mut().enumerate() {
        for (j, value) in row.iter_mut().take(columns).enumerate() {
            *value = A.entry(i, j);
        }
        row[columns] = b.entry(i);
    }
    let eps = f64::EPSILON;
    let rank_A = Array2DRowRealMatrix::from_matrix(A).to_dmatrix().rank(eps);
    let rank_Ab = Ab.to_dmatrix().rank(eps);

    let result = rank_A == rank_Ab;
    if !result {
        warn!(
            "The system has no solution. rank(A) = {} != rank([A b]) = {}",
            rank_A, rank_Ab
        );
    }
    Ok(result)
}

/// Singularity as seen by LU with partial pivoting: a pivot below `epsilon`.
pub fn is_singular(A: &dyn RealMatrix, epsilon: f64) -> Result<bool> {
    let lu = LUDecomposition::with_threshold(A, epsilon)?;
    let is_singular = lu.is_singular();
    if is_singular {
        warn!("Matrix is singular. Determinant = {:.8}", lu.get_determinant());
    }
    Ok(is_singular)
}

/// 1-norm condition number `‖A‖₁·‖A⁻¹‖₁`, infinite for a singular matrix.
pub fn condition_number(A: &dyn RealMatrix) -> Result<f64> {
    let lu = LUDecomposition::new(A)?;
    if lu.is_singular() {
        return Ok(f64::INFINITY);
    }
    let inverse = lu.get_solver().get_inverse()?;
    Ok(A.get_norm1() * inverse.get_norm1())
}

pub fn poorly_conditioned(A: &dyn RealMatrix, threshold: f64) -> Result<bool> {
    // the solution of a poorly conditioned system is sensitive to small perturbations of A and b
    let condition_number = condition_number(A)?;
    let poorly_conditioned = condition_number > threshold;
    if poorly_conditioned {
        warn!(
            "The system of linear equations is poorly conditioned. Condition number = {:.2e}",
            condition_number
        );
    }
    Ok(poorly_conditioned)
}

pub fn linear_system_diagnostics(A: &dyn RealMatrix, b: &dyn RealVector, threshold: f64) -> Result<bool> {
    if Rouche_Capelli_theorem(A, b)? {
        if poorly_conditioned(A, threshold)? {
            warn!(
                "The system of linear equations has a solution and the coefficient matrix is poorly conditioned."
            );
            Ok(false)
        } else {
            info!("The system of linear equations has a solution and is well conditioned.");
            Ok(true)
        }
    } else {
        if poorly_conditioned(A, threshold)? {
            warn!(
                "The system of linear equations does not have a solution and the coefficient matrix is poorly conditioned."
            );
        }
        Ok(false)
    }
}

/// famous example of ill-conditioned matrix, `H[i][j] = 1 / (i + j + 1)`
pub fn hilbert_matrix(n: usize) -> Array2DRowRealMatrix {
    let rows = (0..n)
        .map(|i| (0..n).map(|j| 1.0 / (i + j + 1) as f64).collect())
        .collect();
    Array2DRowRealMatrix::from_rows_unchecked(rows)
}

fn binomial(n: u64, k: u64) -> f64 {
    if k > n {
        return 0.0;
    }
    let k = k.min(n - k);
    // exact in u128 for the sizes where the Hilbert inverse fits an f64
    let mut result: u128 = 1;
    for i in 0..k {
        result = result * (n - i) as u128 / (i + 1) as u128;
    }
    result as f64
}

/// Closed-form inverse of the Hilbert matrix; its entries are integers.
pub fn inverse_hilbert_matrix(n: usize) -> Array2DRowRealMatrix {
    let size = n as u64;
    let rows = (0..size)
        .map(|i| {
            (0..size)
                .map(|j| {
                    let aux = binomial(i + j, i);
                    let value = (i + j + 1) as f64
                        * binomial(size + i, size - j - 1)
                        * binomial(size + j, size - i - 1)
                        * aux
                        * aux;
                    if (i + j) % 2 == 0 {
                        value
                    } else {
                        -value
                    }
                })
                .collect()
        })
        .collect();
    Array2DRowRealMatrix::from_rows_unchecked(rows)
}
