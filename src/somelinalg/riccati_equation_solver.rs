//! Continuous-time algebraic Riccati equation
//!
//! ```text
//! Aᵀ·P + P·A − P·B·R⁻¹·Bᵀ·P + Q = 0
//! ```
//!
//! An initial stabilizing `P` comes from the stable invariant subspace of the
//! Hamiltonian matrix; Kleinman's iteration then refines it, each step solving
//! a Lyapunov equation through its Kronecker form.
use log::{debug, info};
use crate::iterative_solvers::linear_operator::RealLinearOperator;
use num_complex::Complex;

use crate::decompositions::complex_eigen_decomposition::{
    DEFAULT_EPSILON, DEFAULT_EPSILON_AV_VD_CHECK,
};
use crate::decompositions::decomposition_solver::{DecompositionSolver, FieldDecompositionSolver};
use crate::decompositions::eigen_decomposition_symmetric::EigenDecompositionSymmetric;
use crate::decompositions::field_lu_decomposition::FieldLUDecomposition;
use crate::decompositions::lu_decomposition::LUDecomposition;
use crate::decompositions::ordered_complex_eigen_decomposition::OrderedComplexEigenDecomposition;
use crate::linalg_error::{LinAlgError, Result};
use crate::matrices::array2d_real_matrix::Array2DRowRealMatrix;
use crate::matrices::field_matrix::FieldMatrix;
use crate::matrices::matrix_utils::{check_multiplication_compatible, create_real_identity_matrix};
use crate::matrices::real_matrix::RealMatrix;

const MAX_ITERATIONS: usize = 100;
const EPSILON: f64 = 1e-8;

#[derive(Debug, Clone)]
pub struct RiccatiEquationSolver {
    P: Array2DRowRealMatrix,
    K: Array2DRowRealMatrix,
}

/// `a + factor·b` between dense matrices of equal shape.
fn axpy(a: &Array2DRowRealMatrix, factor: f64, b: &Array2DRowRealMatrix) -> Array2DRowRealMatrix {
    let mut out = a.clone();
    for (row, b_row) in out.data_mut().iter_mut().zip(b.data_ref()) {
        for (x, y) in row.iter_mut().zip(b_row) {
            *x += factor * y;
        }
    }
    out
}

/// Largest singular value, from the eigenvalues of `Mᵀ·M`.
fn spectral_norm(m: &Array2DRowRealMatrix) -> Result<f64> {
    if m.data_ref().iter().flatten().all(|x| *x == 0.0) {
        return Ok(0.0);
    }
    let mtm = m.transpose_dense().multiply_dense(m)?;
    let eig = EigenDecompositionSymmetric::new(&mtm)?;
    let largest = eig
        .get_eigenvalues()
        .iter()
        .fold(0.0_f64, |acc, lambda| acc.max(*lambda));
    Ok(largest.sqrt())
}

impl RiccatiEquationSolver {
    /// Solves the equation for the system matrices `A` (n×n), `B` (n×m) and
    /// the weights `Q` (n×n), `R` (m×m). `R` must be invertible.
    pub fn new(A: &dyn RealMatrix, B: &dyn RealMatrix, Q: &dyn RealMatrix, R: &dyn RealMatrix) -> Result<Self> {
        if !A.is_square() {
            return Err(LinAlgError::NonSquare {
                rows: A.row_dimension(),
                columns: A.column_dimension(),
            });
        }
        if A.column_dimension() != B.row_dimension() {
            return Err(LinAlgError::DimensionMismatch {
                got: B.row_dimension(),
                expected: A.column_dimension(),
            });
        }
        check_multiplication_compatible(B.row_dimension(), B.column_dimension(), R.row_dimension(), R.column_dimension())?;
        check_multiplication_compatible(A.row_dimension(), A.column_dimension(), Q.row_dimension(), Q.column_dimension())?;
        if !Q.is_square() {
            return Err(LinAlgError::NonSquare {
                rows: Q.row_dimension(),
                columns: Q.column_dimension(),
            });
        }

        let R_inv = LUDecomposition::new(R)?.get_solver().get_inverse()?;
        let A = Array2DRowRealMatrix::from_matrix(A);
        let B = Array2DRowRealMatrix::from_matrix(B);
        let Q = Array2DRowRealMatrix::from_matrix(Q);
        let R = Array2DRowRealMatrix::from_matrix(R);

        let initial_P = Self::initial_P(&A, &B, &Q, &R_inv)?;
        let P = Self::kleinman(&A, &B, &Q, &R, &R_inv, initial_P)?;
        // K = R⁻¹·Bᵀ·P
        let K = R_inv.multiply_dense(&B.transpose_dense())?.multiply_dense(&P)?;
        Ok(RiccatiEquationSolver { P, K })
    }

    /// `P = U21·U11⁻¹` with `[U11; U21]` spanning the stable eigenvectors of
    /// the Hamiltonian `[[A, −B·R⁻¹·Bᵀ], [−Q, −Aᵀ]]`.
    fn initial_P(
        A: &Array2DRowRealMatrix,
        B: &Array2DRowRealMatrix,
        Q: &Array2DRowRealMatrix,
        R_inv: &Array2DRowRealMatrix,
    ) -> Result<Array2DRowRealMatrix> {
        let n = A.row_dimension();
        let m12 = B.multiply_dense(R_inv)?.multiply_dense(&B.transpose_dense())?;
        let mut hamiltonian = Array2DRowRealMatrix::new(2 * n, 2 * n);
        for i in 0..n {
            for j in 0..n {
                let h = hamiltonian.data_mut();
                h[i][j] = A.entry(i, j);
                h[i][n + j] = -m12.entry(i, j);
                h[n + i][j] = -Q.entry(i, j);
                h[n + i][n + j] = -A.entry(j, i);
            }
        }

        // stable eigenvalues first
        let eig = OrderedComplexEigenDecomposition::with_comparator(
            &hamiltonian,
            DEFAULT_EPSILON,
            DEFAULT_EPSILON_AV_VD_CHECK,
            |a: &Complex<f64>, b: &Complex<f64>| a.re.total_cmp(&b.re),
        )?;
        let u = eig.get_v();
        let u11 = u.get_sub_matrix(0, n - 1, 0, n - 1)?;
        let u21 = u.get_sub_matrix(n, 2 * n - 1, 0, n - 1)?;
        let u11_inv = FieldLUDecomposition::new(u11.as_ref())?.get_solver().get_inverse()?;
        let p = u21.multiply(&u11_inv)?;

        // imaginary parts are rounding noise
        let mut out = Array2DRowRealMatrix::new(n, n);
        for (i, row) in out.data_mut().iter_mut().enumerate() {
            for (j, value) in row.iter_mut().enumerate() {
                *value = p.entry(i, j).re;
            }
        }
        debug!("Riccati: initial P from the Hamiltonian {:?}", out.data_ref());
        Ok(out)
    }

    /// Kleinman iteration: `K = −P·B·R⁻¹`, then `P` solves the Lyapunov
    /// equation `Xᵀ·P + P·X = Y` with `X = A + B·Kᵀ`, `Y = −K·R·Kᵀ − Q`.
    fn kleinman(
        A: &Array2DRowRealMatrix,
        B: &Array2DRowRealMatrix,
        Q: &Array2DRowRealMatrix,
        R: &Array2DRowRealMatrix,
        R_inv: &Array2DRowRealMatrix,
        initial_P: Array2DRowRealMatrix,
    ) -> Result<Array2DRowRealMatrix> {
        let n = A.row_dimension();
        let eye = create_real_identity_matrix(n);
        let mut P = initial_P;
        let mut error = 1.0;
        let mut iteration = 1;
        while error > EPSILON {
            let mut K = P.multiply_dense(B)?.multiply_dense(R_inv)?;
            K.data_mut().iter_mut().flatten().for_each(|x| *x = -*x);
            let X = axpy(A, 1.0, &B.multiply_dense(&K.transpose_dense())?);
            let KRKt = K.multiply_dense(R)?.multiply_dense(&K.transpose_dense())?;
            let mut Y = axpy(&KRKt, 1.0, Q);
            Y.data_mut().iter_mut().flatten().for_each(|x| *x = -*x);

            let Xt = X.transpose_dense();
            let lyapunov = axpy(&Xt.kronecker_product(&eye), 1.0, &eye.kronecker_product(&Xt));
            let PX = LUDecomposition::new(&lyapunov)?.get_solver().solve(&Y.stack())?;
            let P_next = Array2DRowRealMatrix::unstack_square(&PX)?;

            error = spectral_norm(&axpy(&P_next, -1.0, &P))?;
            P = P_next;
            iteration += 1;
            debug!("Riccati: iteration {}, |ΔP| = {:e}", iteration, error);
            if iteration > MAX_ITERATIONS {
                return Err(LinAlgError::ConvergenceFailed {
                    max_iterations: MAX_ITERATIONS,
                });
            }
        }
        info!("Riccati: converged after {} Kleinman iterations", iteration - 1);
        Ok(P)
    }

    /// Solution `P` of the equation.
    pub fn get_p(&self) -> &Array2DRowRealMatrix {
        &self.P
    }

    /// Linear quadratic regulator gain `K = R⁻¹·Bᵀ·P`.
    pub fn get_k(&self) -> &Array2DRowRealMatrix {
        &self.K
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linalg_error::ErrorKind;
    use approx::assert_relative_eq;

    fn dense(rows: Vec<Vec<f64>>) -> Array2DRowRealMatrix {
        Array2DRowRealMatrix::from_rows(rows).unwrap()
    }

    /// Aᵀ·P + P·A − P·B·R⁻¹·Bᵀ·P + Q
    fn residual(
        A: &Array2DRowRealMatrix,
        B: &Array2DRowRealMatrix,
        Q: &Array2DRowRealMatrix,
        R: &Array2DRowRealMatrix,
        P: &Array2DRowRealMatrix,
    ) -> Array2DRowRealMatrix {
        let R_inv = LUDecomposition::new(R).unwrap().get_solver().get_inverse().unwrap();
        let atp = A.transpose_dense().multiply_dense(P).unwrap();
        let pa = P.multiply_dense(A).unwrap();
        let quad = P
            .multiply_dense(B)
            .unwrap()
            .multiply_dense(&R_inv)
            .unwrap()
            .multiply_dense(&B.transpose_dense())
            .unwrap()
            .multiply_dense(P)
            .unwrap();
        axpy(&axpy(&axpy(&atp, 1.0, &pa), -1.0, &quad), 1.0, Q)
    }

    #[test]
    fn test_scalar_equation() {
        let one = dense(vec![vec![1.0]]);
        let solver = RiccatiEquationSolver::new(&one, &one, &one, &one).unwrap();
        // 2p - p² + 1 = 0, stabilizing root
        let expected = 1.0 + 2f64.sqrt();
        assert_relative_eq!(solver.get_p().entry(0, 0), expected, epsilon = 1e-8);
        assert_relative_eq!(solver.get_k().entry(0, 0), expected, epsilon = 1e-8);
    }

    #[test]
    fn test_double_integrator() {
        let A = dense(vec![vec![0.0, 1.0], vec![0.0, 0.0]]);
        let B = dense(vec![vec![0.0], vec![1.0]]);
        let Q = create_real_identity_matrix(2);
        let R = dense(vec![vec![1.0]]);
        let solver = RiccatiEquationSolver::new(&A, &B, &Q, &R).unwrap();
        let s3 = 3f64.sqrt();
        let P = solver.get_p();
        assert_relative_eq!(P.entry(0, 0), s3, epsilon = 1e-8);
        assert_relative_eq!(P.entry(0, 1), 1.0, epsilon = 1e-8);
        assert_relative_eq!(P.entry(1, 0), 1.0, epsilon = 1e-8);
        assert_relative_eq!(P.entry(1, 1), s3, epsilon = 1e-8);
        assert_eq!(solver.get_k().row_dimension(), 1);
        assert_relative_eq!(solver.get_k().entry(0, 0), 1.0, epsilon = 1e-8);
        assert_relative_eq!(solver.get_k().entry(0, 1), s3, epsilon = 1e-8);
        let res = residual(&A, &B, &Q, &R, P);
        assert!(res.get_norm1() < 1e-8);
    }

    #[test]
    fn test_two_inputs() {
        let A = dense(vec![vec![-1.0, 2.0], vec![0.5, 0.3]]);
        let B = create_real_identity_matrix(2);
        let Q = dense(vec![vec![2.0, 0.0], vec![0.0, 1.0]]);
        let R = dense(vec![vec![1.0, 0.0], vec![0.0, 4.0]]);
        let solver = RiccatiEquationSolver::new(&A, &B, &Q, &R).unwrap();
        let P = solver.get_p();
        assert!(residual(&A, &B, &Q, &R, P).get_norm1() < 1e-8);
        assert_relative_eq!(P.entry(0, 1), P.entry(1, 0), epsilon = 1e-8);
        assert!(P.entry(0, 0) > 0.0 && P.entry(1, 1) > 0.0);
    }

    #[test]
    fn test_invalid_inputs() {
        let one = dense(vec![vec![1.0]]);
        let rect = Array2DRowRealMatrix::new(2, 3);
        assert_eq!(
            RiccatiEquationSolver::new(&rect, &one, &one, &one).unwrap_err().kind(),
            ErrorKind::NonSquare
        );
        let A = create_real_identity_matrix(2);
        assert!(RiccatiEquationSolver::new(&A, &one, &A, &one).is_err());
        let B = dense(vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
        let singular_R = Array2DRowRealMatrix::new(2, 2);
        assert_eq!(
            RiccatiEquationSolver::new(&A, &B, &A, &singular_R).unwrap_err().kind(),
            ErrorKind::Singular
        );
    }
}
