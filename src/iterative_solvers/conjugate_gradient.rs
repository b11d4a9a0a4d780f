//! Preconditioned conjugate gradient for symmetric positive definite
//! operators.
//!
//! Iteration stops once `‖r‖ ≤ δ·‖b‖`, where `r = b - A·x` is updated
//! recursively. The initial evaluation of the residual counts as the first
//! iteration. With `check` enabled, the solver fails with
//! `NonPositiveDefinite` as soon as `rᵗ·M·r ≤ 0` or `pᵗ·A·p ≤ 0`. Symmetry is
//! never tested.
use log::{info, warn};

use crate::iterative_solvers::iteration_manager::{
    IterationEventKind, IterationManager, IterativeLinearSolverEvent,
};
use crate::iterative_solvers::linear_operator::{check_parameters, RealLinearOperator};
use crate::linalg_error::{LinAlgError, Result};
use crate::matrices::real_vector::{ArrayRealVector, RealVector};

#[derive(Debug)]
pub struct ConjugateGradient {
    manager: IterationManager,
    delta: f64,
    check: bool,
}

fn fire(
    manager: &mut IterationManager,
    kind: IterationEventKind,
    x: &dyn RealVector,
    b: &dyn RealVector,
    r: &dyn RealVector,
    rnorm: f64,
) {
    let event = IterativeLinearSolverEvent::new(manager.get_iterations(), x, b, Some(r), rnorm);
    manager.fire_event(kind, &event);
}

impl ConjugateGradient {
    pub fn new(max_iterations: usize, delta: f64, check: bool) -> Self {
        Self::with_manager(IterationManager::new(max_iterations), delta, check)
    }

    /// Uses a caller-prepared manager, e.g. one with listeners attached.
    pub fn with_manager(manager: IterationManager, delta: f64, check: bool) -> Self {
        ConjugateGradient { manager, delta, check }
    }

    pub fn get_iteration_manager(&self) -> &IterationManager {
        &self.manager
    }

    pub fn get_iteration_manager_mut(&mut self) -> &mut IterationManager {
        &mut self.manager
    }

    pub fn get_delta(&self) -> f64 {
        self.delta
    }

    pub fn should_check(&self) -> bool {
        self.check
    }

    /// Solves `A·x = b` starting from zero.
    pub fn solve(&mut self, a: &dyn RealLinearOperator, b: &dyn RealVector) -> Result<ArrayRealVector> {
        let mut x = ArrayRealVector::new(a.column_dimension());
        self.iterate(a, None, b, &mut x)?;
        Ok(x)
    }

    /// Solves from `x0`, which is left untouched.
    pub fn solve_with_guess(
        &mut self,
        a: &dyn RealLinearOperator,
        b: &dyn RealVector,
        x0: &dyn RealVector,
    ) -> Result<ArrayRealVector> {
        let mut x = ArrayRealVector::from_vector(x0);
        self.iterate(a, None, b, &mut x)?;
        Ok(x)
    }

    /// Solves from `x0`, overwriting it with the solution; the returned
    /// reference is `x0` itself.
    pub fn solve_in_place<'x>(
        &mut self,
        a: &dyn RealLinearOperator,
        b: &dyn RealVector,
        x0: &'x mut ArrayRealVector,
    ) -> Result<&'x mut ArrayRealVector> {
        self.iterate(a, None, b, x0)?;
        Ok(x0)
    }

    /// Solves `A·x = b` with the preconditioner `m ≈ A⁻¹`.
    pub fn solve_preconditioned(
        &mut self,
        a: &dyn RealLinearOperator,
        m: &dyn RealLinearOperator,
        b: &dyn RealVector,
    ) -> Result<ArrayRealVector> {
        let mut x = ArrayRealVector::new(a.column_dimension());
        self.iterate(a, Some(m), b, &mut x)?;
        Ok(x)
    }

    pub fn solve_preconditioned_with_guess(
        &mut self,
        a: &dyn RealLinearOperator,
        m: &dyn RealLinearOperator,
        b: &dyn RealVector,
        x0: &dyn RealVector,
    ) -> Result<ArrayRealVector> {
        let mut x = ArrayRealVector::from_vector(x0);
        self.iterate(a, Some(m), b, &mut x)?;
        Ok(x)
    }

    pub fn solve_preconditioned_in_place<'x>(
        &mut self,
        a: &dyn RealLinearOperator,
        m: &dyn RealLinearOperator,
        b: &dyn RealVector,
        x0: &'x mut ArrayRealVector,
    ) -> Result<&'x mut ArrayRealVector> {
        self.iterate(a, Some(m), b, x0)?;
        Ok(x0)
    }

    fn iterate(
        &mut self,
        a: &dyn RealLinearOperator,
        m: Option<&dyn RealLinearOperator>,
        b: &dyn RealVector,
        x: &mut ArrayRealVector,
    ) -> Result<()> {
        check_parameters(a, m, b, &*x)?;
        let manager = &mut self.manager;
        manager.reset_iteration_count();
        let rmax = self.delta * b.get_norm();

        manager.increment_with_iterate(&*x)?;
        let q = a.operate(&*x)?;
        let mut r = b.subtract(&q)?;
        let mut rnorm = r.get_norm();
        fire(manager, IterationEventKind::InitializationPerformed, &*x, b, &r, rnorm);
        if rnorm <= rmax {
            fire(manager, IterationEventKind::TerminationPerformed, &*x, b, &r, rnorm);
            info!("conjugate gradient: initial guess already within tolerance");
            return Ok(());
        }

        let mut p = ArrayRealVector::new(x.dimension());
        let mut rho_prev = 0.0;
        loop {
            manager.increment_with_iterate(&*x)?;
            fire(manager, IterationEventKind::IterationStarted, &*x, b, &r, rnorm);
            let z = match m {
                Some(m) => m.operate(&r)?,
                None => r.clone(),
            };
            let rho = r.dot_product(&z)?;
            if self.check && rho <= 0.0 {
                warn!("conjugate gradient: preconditioner is not positive definite, rᵗMr = {:e}", rho);
                return Err(LinAlgError::NonPositiveDefinite);
            }
            if manager.get_iterations() == 2 {
                p = z;
            } else {
                p.combine_to_self(rho / rho_prev, 1.0, &z)?;
            }
            let q = a.operate(&p)?;
            let pq = p.dot_product(&q)?;
            if self.check && pq <= 0.0 {
                warn!("conjugate gradient: operator is not positive definite, pᵗAp = {:e}", pq);
                return Err(LinAlgError::NonPositiveDefinite);
            }
            let alpha = rho / pq;
            x.axpy(alpha, &p)?;
            r.axpy(-alpha, &q)?;
            rho_prev = rho;
            rnorm = r.get_norm();
            fire(manager, IterationEventKind::IterationPerformed, &*x, b, &r, rnorm);
            if rnorm <= rmax {
                fire(manager, IterationEventKind::TerminationPerformed, &*x, b, &r, rnorm);
                info!(
                    "conjugate gradient converged after {} iterations, |r| = {:e}",
                    manager.get_iterations(),
                    rnorm
                );
                return Ok(());
            }
        }
    }
}
