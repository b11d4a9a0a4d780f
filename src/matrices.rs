//! matrix and vector storage over reals and over abstract fields
/// field element capability trait and the `Field` descriptor
pub mod field;
/// open addressing map used by the sparse types
pub mod open_int_map;
/// visitor traits for bulk traversal
pub mod visitors;
/// argument checks and matrix factories
pub mod matrix_utils;
pub mod real_vector;
pub mod real_matrix;
/// dense real matrix (vector of rows)
pub mod array2d_real_matrix;
/// sparse real matrix
pub mod open_map_real_matrix;
pub mod diagonal_matrix;
pub mod field_vector;
pub mod sparse_field_vector;
pub mod field_matrix;
/// dense field matrix (vector of rows)
pub mod array2d_field_matrix;
pub mod sparse_field_matrix;
