//! matrix factorizations and the solvers they expose
/// common interface of the solvers built from a factorization
pub mod decomposition_solver;
/// LU with partial pivoting over f64
pub mod lu_decomposition;
/// LU over any field
pub mod field_lu_decomposition;
/// Householder QR, least squares for rectangular systems
pub mod qr_decomposition;
pub mod cholesky_decomposition;
/// semi-definite (rank revealing) Cholesky
pub mod rectangular_cholesky_decomposition;
/// Householder reduction of a symmetric matrix to tridiagonal form
pub mod tri_diagonal_transformer;
/// symmetric eigen decomposition (implicit QL)
pub mod eigen_decomposition_symmetric;
/// Householder reduction to upper Hessenberg form
pub mod hessenberg_transformer;
/// Francis double shift QR to real Schur form
pub mod schur_transformer;
/// real eigen decomposition of a general square matrix
pub mod eigen_decomposition_non_symmetric;
/// complex eigenvectors by inverse iteration
pub mod complex_eigen_decomposition;
pub mod ordered_complex_eigen_decomposition;
