// Copyright (c)  by Gleb E. Zaslavkiy
//MIT License
#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
//! Dense and sparse linear algebra over reals and abstract fields:
//! storage, factorizations (LU, QR, Cholesky, eigen) and iterative solvers
//! (conjugate gradient, SymmLQ).
pub mod linalg_error;
pub mod matrices;
pub mod decompositions;
pub mod iterative_solvers;
pub mod Utils;
pub mod somelinalg;
