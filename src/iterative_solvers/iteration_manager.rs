//! Iteration counting and event dispatch for the iterative solvers.
use log::debug;
use strum_macros::{Display, EnumIter};

use crate::linalg_error::{LinAlgError, Result};
use crate::matrices::real_vector::{ArrayRealVector, RealVector, UnmodifiableRealVector};

/// The four moments of a solve at which listeners are notified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum IterationEventKind {
    InitializationPerformed,
    IterationStarted,
    IterationPerformed,
    TerminationPerformed,
}

/// Snapshot of a running solve. Vectors are read-only views: any attempt to
/// mutate them fails.
#[derive(Debug, Clone, Copy)]
pub struct IterativeLinearSolverEvent<'a> {
    iterations: usize,
    solution: UnmodifiableRealVector<'a>,
    right_hand_side: UnmodifiableRealVector<'a>,
    residual: Option<UnmodifiableRealVector<'a>>,
    norm_of_residual: f64,
}

impl<'a> IterativeLinearSolverEvent<'a> {
    pub fn new(
        iterations: usize,
        solution: &'a dyn RealVector,
        right_hand_side: &'a dyn RealVector,
        residual: Option<&'a dyn RealVector>,
        norm_of_residual: f64,
    ) -> Self {
        IterativeLinearSolverEvent {
            iterations,
            solution: UnmodifiableRealVector::new(solution),
            right_hand_side: UnmodifiableRealVector::new(right_hand_side),
            residual: residual.map(UnmodifiableRealVector::new),
            norm_of_residual,
        }
    }

    /// Iterations performed so far; initialization counts as one.
    pub fn get_iterations(&self) -> usize {
        self.iterations
    }

    pub fn get_solution(&self) -> UnmodifiableRealVector<'a> {
        self.solution
    }

    pub fn get_right_hand_side_vector(&self) -> UnmodifiableRealVector<'a> {
        self.right_hand_side
    }

    /// Current residual `b - A x`, when the solver keeps it explicitly.
    pub fn get_residual(&self) -> Result<UnmodifiableRealVector<'a>> {
        self.residual.ok_or_else(|| {
            LinAlgError::UnsupportedOperation("residual is not provided by this solver".to_string())
        })
    }

    pub fn provides_residual(&self) -> bool {
        self.residual.is_some()
    }

    pub fn get_norm_of_residual(&self) -> f64 {
        self.norm_of_residual
    }
}

/// Receives solver events; every callback defaults to doing nothing.
pub trait IterationListener {
    fn initialization_performed(&mut self, _event: &IterativeLinearSolverEvent<'_>) {}

    fn iteration_started(&mut self, _event: &IterativeLinearSolverEvent<'_>) {}

    fn iteration_performed(&mut self, _event: &IterativeLinearSolverEvent<'_>) {}

    fn termination_performed(&mut self, _event: &IterativeLinearSolverEvent<'_>) {}
}

/// Counts iterations against a cap and forwards events to listeners.
pub struct IterationManager {
    max_iterations: usize,
    iterations: usize,
    listeners: Vec<Box<dyn IterationListener>>,
}

impl std::fmt::Debug for IterationManager {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("IterationManager")
            .field("max_iterations", &self.max_iterations)
            .field("iterations", &self.iterations)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl IterationManager {
    pub fn new(max_iterations: usize) -> Self {
        IterationManager {
            max_iterations,
            iterations: 0,
            listeners: Vec::new(),
        }
    }

    pub fn add_iteration_listener(&mut self, listener: Box<dyn IterationListener>) {
        self.listeners.push(listener);
    }

    pub fn clear_iteration_listeners(&mut self) {
        self.listeners.clear();
    }

    pub fn get_iterations(&self) -> usize {
        self.iterations
    }

    pub fn get_max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub fn reset_iteration_count(&mut self) {
        self.iterations = 0;
    }

    /// Fails with `MaxCountExceeded` once the cap would be passed; the
    /// caller attaches its current iterate.
    pub fn increment_iteration_count(&mut self) -> Result<()> {
        if self.iterations >= self.max_iterations {
            debug!("iteration cap {} reached", self.max_iterations);
            return Err(LinAlgError::MaxCountExceeded {
                max: self.max_iterations,
                best: None,
            });
        }
        self.iterations += 1;
        Ok(())
    }

    /// [`increment_iteration_count`](Self::increment_iteration_count) with
    /// `current` copied into the error as the best available solution.
    pub fn increment_with_iterate(&mut self, current: &dyn RealVector) -> Result<()> {
        self.increment_iteration_count().map_err(|e| match e {
            LinAlgError::MaxCountExceeded { max, .. } => LinAlgError::MaxCountExceeded {
                max,
                best: Some(ArrayRealVector::from_vector(current)),
            },
            other => other,
        })
    }

    pub fn fire_event(&mut self, kind: IterationEventKind, event: &IterativeLinearSolverEvent<'_>) {
        for listener in self.listeners.iter_mut() {
            match kind {
                IterationEventKind::InitializationPerformed => listener.initialization_performed(event),
                IterationEventKind::IterationStarted => listener.iteration_started(event),
                IterationEventKind::IterationPerformed => listener.iteration_performed(event),
                IterationEventKind::TerminationPerformed => listener.termination_performed(event),
            }
        }
    }
}
