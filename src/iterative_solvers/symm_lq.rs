//! SymmLQ (Paige & Saunders, 1975) for `(A - shift·I)·x = b` with `A`
//! symmetric, possibly indefinite, and an optional symmetric positive
//! definite preconditioner `M ≈ A⁻¹`.
//!
//! The Lanczos process builds a tridiagonal `T_k`, factored as `L_k·Q_k`
//! with plane rotations. Two estimates of the solution are tracked: the LQ
//! point `xL` and the CG point reached from it along `w̄`; the solution
//! returned is the one with the smaller residual. When `goodb` is set, the
//! component of `x` along `M·b` is accumulated separately, which helps when
//! `b` is close to an eigenvector of the preconditioned operator.
//!
//! Unlike conjugate gradient, the initial guess only provides storage: the
//! iteration always starts from zero. Residual vectors are not formed, so
//! events carry the residual norm only.
use itertools::izip;
use log::{debug, info, warn};

use crate::iterative_solvers::iteration_manager::{
    IterationEventKind, IterationManager, IterativeLinearSolverEvent,
};
use crate::iterative_solvers::linear_operator::{check_parameters, RealLinearOperator};
use crate::linalg_error::{LinAlgError, Result};
use crate::matrices::real_vector::{ArrayRealVector, RealVector};

const MACH_PREC: f64 = f64::EPSILON;

fn cbrt_mach_prec() -> f64 {
    MACH_PREC.cbrt()
}

/// `y = L·x` and `z = L·y`; a self-adjoint `L` gives `yᵗy = xᵗz`.
fn check_symmetry(x: &ArrayRealVector, y: &ArrayRealVector, z: &ArrayRealVector) -> Result<()> {
    let s = y.dot_product(y)?;
    let t = x.dot_product(z)?;
    let epsa = (s + MACH_PREC) * cbrt_mach_prec();
    if (s - t).abs() > epsa {
        warn!("symmlq: operator is not self-adjoint, |yᵗy - xᵗz| = {:e}", (s - t).abs());
        return Err(LinAlgError::NonSelfAdjointOperator);
    }
    Ok(())
}

fn non_positive_definite(value: f64) -> LinAlgError {
    warn!("symmlq: preconditioner is not positive definite, inner product {:e}", value);
    LinAlgError::NonPositiveDefinite
}

/// Lanczos vectors and the scalars of the LQ factorization at step `k`.
struct LanczosState<'a> {
    a: &'a dyn RealLinearOperator,
    m: Option<&'a dyn RealLinearOperator>,
    b: &'a dyn RealVector,
    goodb: bool,
    shift: f64,
    delta: f64,
    check: bool,
    /// `M·b`
    mb: ArrayRealVector,
    x_l: ArrayRealVector,
    r1: ArrayRealVector,
    r2: ArrayRealVector,
    y: ArrayRealVector,
    wbar: ArrayRealVector,
    beta: f64,
    beta1: f64,
    bstep: f64,
    cgnorm: f64,
    dbar: f64,
    gamma_zeta: f64,
    gbar: f64,
    gmax: f64,
    gmin: f64,
    lqnorm: f64,
    minus_eps_zeta: f64,
    oldb: f64,
    rnorm: f64,
    snprod: f64,
    tnorm: f64,
    ynorm2: f64,
    has_converged: bool,
    b_is_null: bool,
}

impl<'a> LanczosState<'a> {
    fn new(
        a: &'a dyn RealLinearOperator,
        m: Option<&'a dyn RealLinearOperator>,
        b: &'a dyn RealVector,
        goodb: bool,
        shift: f64,
        delta: f64,
        check: bool,
    ) -> Result<Self> {
        let n = b.dimension();
        let mb = match m {
            Some(m) => m.operate(b)?,
            None => ArrayRealVector::from_vector(b),
        };
        Ok(LanczosState {
            a,
            m,
            b,
            goodb,
            shift,
            delta,
            check,
            mb,
            x_l: ArrayRealVector::new(n),
            r1: ArrayRealVector::new(n),
            r2: ArrayRealVector::new(n),
            y: ArrayRealVector::new(n),
            wbar: ArrayRealVector::new(n),
            beta: 0.0,
            beta1: 0.0,
            bstep: 0.0,
            cgnorm: 0.0,
            dbar: 0.0,
            gamma_zeta: 0.0,
            gbar: 0.0,
            gmax: 0.0,
            gmin: 0.0,
            lqnorm: 0.0,
            minus_eps_zeta: 0.0,
            oldb: 0.0,
            rnorm: 0.0,
            snprod: 0.0,
            tnorm: 0.0,
            ynorm2: 0.0,
            has_converged: false,
            b_is_null: false,
        })
    }

    fn precondition(&self, v: &ArrayRealVector) -> Result<ArrayRealVector> {
        match self.m {
            Some(m) => m.operate(v),
            None => Ok(v.clone()),
        }
    }

    /// First Lanczos step; sets `b_is_null` and stops early when `b = 0`.
    fn init(&mut self) -> Result<()> {
        self.x_l.set(0.0)?;
        self.r1 = ArrayRealVector::from_vector(self.b);
        self.y = self.precondition(&self.r1)?;
        if let (Some(m), true) = (self.m, self.check) {
            let my = m.operate(&self.y)?;
            check_symmetry(&self.r1, &self.y, &my)?;
        }

        self.beta1 = self.r1.dot_product(&self.y)?;
        if self.beta1 < 0.0 {
            return Err(non_positive_definite(self.beta1));
        }
        if self.beta1 == 0.0 {
            self.b_is_null = true;
            return Ok(());
        }
        self.b_is_null = false;
        self.beta1 = self.beta1.sqrt();

        // r1 = b, y = M·b
        let v = self.y.map_multiply(1.0 / self.beta1);
        self.y = self.a.operate(&v)?;
        if self.check {
            let ay = self.a.operate(&self.y)?;
            check_symmetry(&v, &self.y, &ay)?;
        }
        self.y.axpy(-self.shift, &v)?;
        let alpha = v.dot_product(&self.y)?;
        self.y.axpy(-alpha / self.beta1, &self.r1)?;

        // keep r2 orthogonal to the first Lanczos vector
        let vty = v.dot_product(&self.y)?;
        let vtv = v.dot_product(&v)?;
        self.y.axpy(-vty / vtv, &v)?;
        self.r2 = self.y.clone();
        if let Some(m) = self.m {
            self.y = m.operate(&self.r2)?;
        }
        self.oldb = self.beta1;
        self.beta = self.r2.dot_product(&self.y)?;
        if self.beta < 0.0 {
            return Err(non_positive_definite(self.beta));
        }
        self.beta = self.beta.sqrt();

        self.cgnorm = self.beta1;
        self.gbar = alpha;
        self.dbar = self.beta;
        self.gamma_zeta = self.beta1;
        self.minus_eps_zeta = 0.0;
        self.bstep = 0.0;
        self.snprod = 1.0;
        self.tnorm = alpha * alpha + self.beta * self.beta;
        self.ynorm2 = 0.0;
        self.gmax = alpha.abs() + MACH_PREC;
        self.gmin = self.gmax;
        self.wbar = if self.goodb {
            ArrayRealVector::new(self.a.row_dimension())
        } else {
            v
        };
        self.update_norms()
    }

    /// One Lanczos step followed by the next plane rotation of `Q`.
    fn update(&mut self) -> Result<()> {
        let v = self.y.map_multiply(1.0 / self.beta);
        self.y = self.a.operate(&v)?;
        let shift = self.shift;
        let back = -self.beta / self.oldb;
        for (yi, vi, ri) in izip!(self.y.data_mut().iter_mut(), v.data_ref(), self.r1.data_ref()) {
            *yi = -shift * vi + back * ri + *yi;
        }
        let alpha = v.dot_product(&self.y)?;
        self.y.axpy(-alpha / self.beta, &self.r2)?;

        // y now holds beta[k+1]·M⁻¹·v[k+1]
        self.r1 = std::mem::take(&mut self.r2);
        self.r2 = self.y.clone();
        if let Some(m) = self.m {
            self.y = m.operate(&self.r2)?;
        }
        self.oldb = self.beta;
        self.beta = self.r2.dot_product(&self.y)?;
        if self.beta < 0.0 {
            return Err(non_positive_definite(self.beta));
        }
        self.beta = self.beta.sqrt();
        self.tnorm += alpha * alpha + self.oldb * self.oldb + self.beta * self.beta;

        let gamma = (self.gbar * self.gbar + self.oldb * self.oldb).sqrt();
        let c = self.gbar / gamma;
        let s = self.oldb / gamma;
        let deltak = c * self.dbar + s * alpha;
        self.gbar = s * self.dbar - c * alpha;
        let eps = s * self.beta;
        self.dbar = -c * self.beta;
        let zeta = self.gamma_zeta / gamma;

        let zeta_c = zeta * c;
        let zeta_s = zeta * s;
        for (xi, wi, vi) in izip!(self.x_l.data_mut().iter_mut(), self.wbar.data_mut().iter_mut(), v.data_ref()) {
            let w = *wi;
            *xi = *xi + w * zeta_c + vi * zeta_s;
            *wi = w * s - vi * c;
        }

        self.bstep += self.snprod * c * zeta;
        self.snprod *= s;
        self.gmax = self.gmax.max(gamma);
        self.gmin = self.gmin.min(gamma);
        self.ynorm2 += zeta * zeta;
        self.gamma_zeta = self.minus_eps_zeta - deltak * zeta;
        self.minus_eps_zeta = -eps * zeta;
        self.update_norms()
    }

    fn update_norms(&mut self) -> Result<()> {
        let anorm = self.tnorm.sqrt();
        let ynorm = self.ynorm2.sqrt();
        let epsa = anorm * MACH_PREC;
        let epsx = anorm * ynorm * MACH_PREC;
        let epsr = anorm * ynorm * self.delta;
        let diag = if self.gbar == 0.0 { epsa } else { self.gbar };
        self.lqnorm = (self.gamma_zeta * self.gamma_zeta + self.minus_eps_zeta * self.minus_eps_zeta).sqrt();
        let qrnorm = self.snprod * self.beta1;
        self.cgnorm = qrnorm * self.beta / diag.abs();

        // T_k can look worse conditioned than T_{k+1}; the last diagonal of
        // L only counts when the LQ point is the one returned
        let acond = if self.lqnorm <= self.cgnorm {
            self.gmax / self.gmin
        } else {
            self.gmax / self.gmin.min(diag.abs())
        };
        if acond * MACH_PREC >= 0.1 {
            warn!("symmlq: condition estimate {:e} too large", acond);
            return Err(LinAlgError::IllConditionedOperator { condition: acond });
        }
        if self.beta1 <= epsx {
            warn!("symmlq: x has converged to an eigenvector of A·M⁻¹");
            return Err(LinAlgError::SingularOperator);
        }
        self.rnorm = self.cgnorm.min(self.lqnorm);
        self.has_converged = self.cgnorm <= epsx || self.cgnorm <= epsr;
        Ok(())
    }

    /// Writes the better of the LQ and CG points into `x`.
    fn refine_solution(&self, x: &mut ArrayRealVector) {
        let out = x.data_mut();
        if self.b_is_null {
            out.fill(0.0);
            return;
        }
        let x_l = self.x_l.data_ref();
        let mb = self.mb.data_ref();
        if self.lqnorm < self.cgnorm {
            if !self.goodb {
                out.copy_from_slice(x_l);
            } else {
                let step = self.bstep / self.beta1;
                for (xi, li, bi) in izip!(out.iter_mut(), x_l, mb) {
                    *xi = li + step * bi;
                }
            }
        } else {
            let anorm = self.tnorm.sqrt();
            let diag = if self.gbar == 0.0 { anorm * MACH_PREC } else { self.gbar };
            let zbar = self.gamma_zeta / diag;
            let step = (self.bstep + self.snprod * zbar) / self.beta1;
            let wbar = self.wbar.data_ref();
            if !self.goodb {
                for (xi, li, wi) in izip!(out.iter_mut(), x_l, wbar) {
                    *xi = li + zbar * wi;
                }
            } else {
                for (xi, li, wi, bi) in izip!(out.iter_mut(), x_l, wbar, mb) {
                    *xi = li + zbar * wi + step * bi;
                }
            }
        }
    }

    fn beta_equals_zero(&self) -> bool {
        self.beta < MACH_PREC
    }
}

fn fire(
    manager: &mut IterationManager,
    kind: IterationEventKind,
    x: &dyn RealVector,
    b: &dyn RealVector,
    rnorm: f64,
) {
    let event = IterativeLinearSolverEvent::new(manager.get_iterations(), x, b, None, rnorm);
    manager.fire_event(kind, &event);
}

#[derive(Debug)]
pub struct SymmLQ {
    manager: IterationManager,
    delta: f64,
    check: bool,
}

impl SymmLQ {
    /// `delta` is the relative residual target; `check` enables the
    /// self-adjointness tests of `A` and `M`, which cost extra products.
    pub fn new(max_iterations: usize, delta: f64, check: bool) -> Self {
        Self::with_manager(IterationManager::new(max_iterations), delta, check)
    }

    pub fn with_manager(manager: IterationManager, delta: f64, check: bool) -> Self {
        SymmLQ { manager, delta, check }
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

    pub fn solve(&mut self, a: &dyn RealLinearOperator, b: &dyn RealVector) -> Result<ArrayRealVector> {
        self.solve_with_options(a, None, b, false, 0.0)
    }

    /// `x0` is only validated; the result is a new vector.
    pub fn solve_with_guess(
        &mut self,
        a: &dyn RealLinearOperator,
        b: &dyn RealVector,
        x0: &dyn RealVector,
    ) -> Result<ArrayRealVector> {
        let mut x = ArrayRealVector::from_vector(x0);
        self.iterate(a, None, b, &mut x, false, 0.0)?;
        Ok(x)
    }

    pub fn solve_in_place<'x>(
        &mut self,
        a: &dyn RealLinearOperator,
        b: &dyn RealVector,
        x0: &'x mut ArrayRealVector,
    ) -> Result<&'x mut ArrayRealVector> {
        self.solve_in_place_with_options(a, None, b, x0, false, 0.0)
    }

    pub fn solve_preconditioned(
        &mut self,
        a: &dyn RealLinearOperator,
        m: &dyn RealLinearOperator,
        b: &dyn RealVector,
    ) -> Result<ArrayRealVector> {
        self.solve_with_options(a, Some(m), b, false, 0.0)
    }

    pub fn solve_preconditioned_with_guess(
        &mut self,
        a: &dyn RealLinearOperator,
        m: &dyn RealLinearOperator,
        b: &dyn RealVector,
        x0: &dyn RealVector,
    ) -> Result<ArrayRealVector> {
        let mut x = ArrayRealVector::from_vector(x0);
        self.iterate(a, Some(m), b, &mut x, false, 0.0)?;
        Ok(x)
    }

    pub fn solve_preconditioned_in_place<'x>(
        &mut self,
        a: &dyn RealLinearOperator,
        m: &dyn RealLinearOperator,
        b: &dyn RealVector,
        x0: &'x mut ArrayRealVector,
    ) -> Result<&'x mut ArrayRealVector> {
        self.solve_in_place_with_options(a, Some(m), b, x0, false, 0.0)
    }

    /// Solves `(A - shift·I)·x = b`, optionally preconditioned, with the
    /// `goodb` refinement when requested.
    pub fn solve_with_options(
        &mut self,
        a: &dyn RealLinearOperator,
        m: Option<&dyn RealLinearOperator>,
        b: &dyn RealVector,
        goodb: bool,
        shift: f64,
    ) -> Result<ArrayRealVector> {
        let mut x = ArrayRealVector::new(a.column_dimension());
        self.iterate(a, m, b, &mut x, goodb, shift)?;
        Ok(x)
    }

    pub fn solve_in_place_with_options<'x>(
        &mut self,
        a: &dyn RealLinearOperator,
        m: Option<&dyn RealLinearOperator>,
        b: &dyn RealVector,
        x: &'x mut ArrayRealVector,
        goodb: bool,
        shift: f64,
    ) -> Result<&'x mut ArrayRealVector> {
        self.iterate(a, m, b, x, goodb, shift)?;
        Ok(x)
    }

    fn iterate(
        &mut self,
        a: &dyn RealLinearOperator,
        m: Option<&dyn RealLinearOperator>,
        b: &dyn RealVector,
        x: &mut ArrayRealVector,
        goodb: bool,
        shift: f64,
    ) -> Result<()> {
        check_parameters(a, m, b, &*x)?;
        let manager = &mut self.manager;
        manager.reset_iteration_count();
        manager.increment_with_iterate(&*x)?;

        let mut state = LanczosState::new(a, m, b, goodb, shift, self.delta, self.check)?;
        state.init()?;
        state.refine_solution(x);
        if state.b_is_null {
            debug!("symmlq: zero right-hand side");
            fire(manager, IterationEventKind::TerminationPerformed, &*x, b, state.rnorm);
            return Ok(());
        }
        let early_stop = state.beta_equals_zero() || state.has_converged;
        fire(manager, IterationEventKind::InitializationPerformed, &*x, b, state.rnorm);
        if !early_stop {
            loop {
                manager.increment_with_iterate(&*x)?;
                fire(manager, IterationEventKind::IterationStarted, &*x, b, state.rnorm);
                state.update()?;
                state.refine_solution(x);
                fire(manager, IterationEventKind::IterationPerformed, &*x, b, state.rnorm);
                if state.has_converged {
                    break;
                }
            }
        }
        fire(manager, IterationEventKind::TerminationPerformed, &*x, b, state.rnorm);
        info!(
            "symmlq finished after {} iterations, residual estimate {:e}",
            manager.get_iterations(),
            state.rnorm
        );
        Ok(())
    }
}
