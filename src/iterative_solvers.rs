//! Krylov solvers working on abstract linear operators
/// y = A x without materializing A
pub mod linear_operator;
/// iteration counting and listener dispatch
pub mod iteration_manager;
/// preconditioned conjugate gradient for symmetric positive definite operators
pub mod conjugate_gradient;
/// SymmLQ (Paige & Saunders) for symmetric, possibly indefinite operators
pub mod symm_lq;
/// diagonal (Jacobi) preconditioner
pub mod jacobi_preconditioner;
