//! some linear algebra functions used throughout the code
#![allow(non_snake_case)]
/// diagnostics for linear systems and matrices: if it is singular
/// or poorly conditioned; Hilbert test matrices
pub mod linear_sys_diagnostics;
/// continuous-time algebraic Riccati equation, solved by Kleinman's iteration
pub mod riccati_equation_solver;
