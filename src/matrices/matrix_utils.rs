//! Index/shape checks shared by every matrix and vector type, plus factories
//! and small algorithms that work on any [`RealMatrix`].
use log::debug;
use strum_macros::{Display, EnumIter};

use crate::decompositions::decomposition_solver::DecompositionSolver;
use crate::decompositions::lu_decomposition::LUDecomposition;
use crate::decompositions::qr_decomposition::QRDecomposition;
use crate::linalg_error::{LinAlgError, Result};
use crate::matrices::array2d_field_matrix::Array2DRowFieldMatrix;
use crate::matrices::array2d_real_matrix::Array2DRowRealMatrix;
use crate::matrices::diagonal_matrix::DiagonalMatrix;
use crate::matrices::field::FieldElement;
use crate::matrices::real_matrix::RealMatrix;
use crate::matrices::real_vector::{ArrayRealVector, RealVector};

fn out_of_range(what: &'static str, index: usize, dim: usize) -> LinAlgError {
    LinAlgError::IndexOutOfRange {
        what,
        index,
        min: 0,
        max: dim.saturating_sub(1),
    }
}

pub fn check_row_index(rows: usize, row: usize) -> Result<()> {
    if row >= rows {
        return Err(out_of_range("row", row, rows));
    }
    Ok(())
}

pub fn check_column_index(columns: usize, column: usize) -> Result<()> {
    if column >= columns {
        return Err(out_of_range("column", column, columns));
    }
    Ok(())
}

pub fn check_vector_index(dimension: usize, index: usize) -> Result<()> {
    if index >= dimension {
        return Err(out_of_range("index", index, dimension));
    }
    Ok(())
}

/// `n` entries starting at `index` must fit in the vector.
pub fn check_sub_vector_range(dimension: usize, index: usize, n: usize) -> Result<()> {
    if n == 0 {
        return Ok(());
    }
    check_vector_index(dimension, index)?;
    check_vector_index(dimension, index + n - 1)
}

/// Inclusive sub-matrix ranges.
pub fn check_sub_matrix_range(
    rows: usize,
    columns: usize,
    start_row: usize,
    end_row: usize,
    start_column: usize,
    end_column: usize,
) -> Result<()> {
    check_row_index(rows, start_row)?;
    check_row_index(rows, end_row)?;
    if end_row < start_row {
        return Err(LinAlgError::InvalidRange {
            start: start_row,
            end: end_row,
        });
    }
    check_column_index(columns, start_column)?;
    check_column_index(columns, end_column)?;
    if end_column < start_column {
        return Err(LinAlgError::InvalidRange {
            start: start_column,
            end: end_column,
        });
    }
    Ok(())
}

pub fn check_sub_matrix_indices(
    rows: usize,
    columns: usize,
    selected_rows: &[usize],
    selected_columns: &[usize],
) -> Result<()> {
    if selected_rows.is_empty() || selected_columns.is_empty() {
        return Err(LinAlgError::NoData);
    }
    for &row in selected_rows {
        check_row_index(rows, row)?;
    }
    for &column in selected_columns {
        check_column_index(columns, column)?;
    }
    Ok(())
}

pub fn check_addition_compatible(
    rows: usize,
    columns: usize,
    other_rows: usize,
    other_columns: usize,
) -> Result<()> {
    if rows != other_rows || columns != other_columns {
        return Err(LinAlgError::MatrixDimensionMismatch {
            got_rows: other_rows,
            got_columns: other_columns,
            expected_rows: rows,
            expected_columns: columns,
        });
    }
    Ok(())
}

/// Left operand `rows x columns` times right operand `other_rows x other_columns`.
pub fn check_multiplication_compatible(
    _rows: usize,
    columns: usize,
    other_rows: usize,
    _other_columns: usize,
) -> Result<()> {
    if columns != other_rows {
        return Err(LinAlgError::DimensionMismatch {
            got: other_rows,
            expected: columns,
        });
    }
    Ok(())
}

/// Validates raw 2D data: at least one row, one column, and no ragged rows.
pub fn check_rectangular<T>(data: &[Vec<T>]) -> Result<()> {
    if data.is_empty() || data[0].is_empty() {
        return Err(LinAlgError::NoData);
    }
    let width = data[0].len();
    for (row, line) in data.iter().enumerate() {
        if line.len() != width {
            return Err(LinAlgError::RaggedArray {
                row,
                got: line.len(),
                expected: width,
            });
        }
    }
    Ok(())
}

pub fn create_real_matrix(rows: usize, columns: usize) -> Array2DRowRealMatrix {
    Array2DRowRealMatrix::new(rows, columns)
}

pub fn create_real_identity_matrix(dimension: usize) -> Array2DRowRealMatrix {
    let mut data = vec![vec![0.0; dimension]; dimension];
    for (i, row) in data.iter_mut().enumerate() {
        row[i] = 1.0;
    }
    Array2DRowRealMatrix::from_rows_unchecked(data)
}

pub fn create_real_diagonal_matrix(diagonal: &[f64]) -> Array2DRowRealMatrix {
    let n = diagonal.len();
    let mut data = vec![vec![0.0; n]; n];
    for (i, d) in diagonal.iter().enumerate() {
        data[i][i] = *d;
    }
    Array2DRowRealMatrix::from_rows_unchecked(data)
}

pub fn create_field_identity_matrix<T: FieldElement>(dimension: usize) -> Array2DRowFieldMatrix<T> {
    let mut m = Array2DRowFieldMatrix::new(dimension, dimension);
    for i in 0..dimension {
        m.data_mut()[i][i] = T::one();
    }
    m
}

pub fn create_field_diagonal_matrix<T: FieldElement>(diagonal: &[T]) -> Array2DRowFieldMatrix<T> {
    let n = diagonal.len();
    let mut m = Array2DRowFieldMatrix::new(n, n);
    for (i, d) in diagonal.iter().enumerate() {
        m.data_mut()[i][i] = d.clone();
    }
    m
}

/// Converts real matrix entries into any field that can be built from an `f64`.
pub fn real_to_field_matrix<T: FieldElement + From<f64>>(m: &dyn RealMatrix) -> Array2DRowFieldMatrix<T> {
    let data = m
        .get_data()
        .into_iter()
        .map(|row| row.into_iter().map(T::from).collect())
        .collect();
    Array2DRowFieldMatrix::from_rows_unchecked(data)
}

fn symmetry_violation(m: &dyn RealMatrix, relative_tolerance: f64) -> Option<(usize, usize)> {
    let n = m.row_dimension();
    for i in 0..n {
        for j in (i + 1)..n {
            let mij = m.entry(i, j);
            let mji = m.entry(j, i);
            if (mij - mji).abs() > mij.abs().max(mji.abs()) * relative_tolerance {
                return Some((i, j));
            }
        }
    }
    None
}

/// Symmetric within `|m_ij - m_ji| <= max(|m_ij|, |m_ji|) * eps`.
pub fn is_symmetric(m: &dyn RealMatrix, relative_tolerance: f64) -> bool {
    m.is_square() && symmetry_violation(m, relative_tolerance).is_none()
}

/// Like [`is_symmetric`] but reports which test failed.
pub fn check_symmetric(m: &dyn RealMatrix, relative_tolerance: f64) -> Result<()> {
    if !m.is_square() {
        return Err(LinAlgError::NonSquare {
            rows: m.row_dimension(),
            columns: m.column_dimension(),
        });
    }
    match symmetry_violation(m, relative_tolerance) {
        Some((row, column)) => Err(LinAlgError::NonSymmetric {
            row,
            column,
            threshold: relative_tolerance,
        }),
        None => Ok(()),
    }
}

fn check_triangular_system(rm: &dyn RealMatrix, b: &dyn RealVector) -> Result<()> {
    if !rm.is_square() {
        return Err(LinAlgError::NonSquare {
            rows: rm.row_dimension(),
            columns: rm.column_dimension(),
        });
    }
    if b.dimension() != rm.row_dimension() {
        return Err(LinAlgError::DimensionMismatch {
            got: b.dimension(),
            expected: rm.row_dimension(),
        });
    }
    Ok(())
}

/// Forward substitution for a lower triangular `rm`; `b` is overwritten with the solution.
pub fn solve_lower_triangular_system(rm: &dyn RealMatrix, b: &mut ArrayRealVector) -> Result<()> {
    check_triangular_system(rm, b)?;
    let n = rm.row_dimension();
    let x = b.data_mut();
    for i in 0..n {
        let diag = rm.entry(i, i);
        if diag.abs() < f64::MIN_POSITIVE {
            return Err(LinAlgError::Singular);
        }
        let xi = x[i] / diag;
        x[i] = xi;
        for j in (i + 1)..n {
            x[j] -= xi * rm.entry(j, i);
        }
    }
    Ok(())
}

/// Back substitution for an upper triangular `rm`; `b` is overwritten with the solution.
pub fn solve_upper_triangular_system(rm: &dyn RealMatrix, b: &mut ArrayRealVector) -> Result<()> {
    check_triangular_system(rm, b)?;
    let n = rm.row_dimension();
    let x = b.data_mut();
    for i in (0..n).rev() {
        let diag = rm.entry(i, i);
        if diag.abs() < f64::MIN_POSITIVE {
            return Err(LinAlgError::Singular);
        }
        let xi = x[i] / diag;
        x[i] = xi;
        for j in 0..i {
            x[j] -= xi * rm.entry(j, i);
        }
    }
    Ok(())
}

/// Inverse of a square matrix: diagonal matrices are inverted entry-wise, the
/// rest go through a QR decomposition with the given singularity threshold.
pub fn inverse(m: &dyn RealMatrix, threshold: f64) -> Result<Array2DRowRealMatrix> {
    if !m.is_square() {
        return Err(LinAlgError::NonSquare {
            rows: m.row_dimension(),
            columns: m.column_dimension(),
        });
    }
    let n = m.row_dimension();
    let is_diagonal = (0..n).all(|i| (0..n).all(|j| i == j || m.entry(i, j) == 0.0));
    if is_diagonal {
        debug!("inverting a {}x{} diagonal matrix entry-wise", n, n);
        let diagonal: Vec<f64> = (0..n).map(|i| m.entry(i, i)).collect();
        let inverse = DiagonalMatrix::from_vec(diagonal).inverse_with_threshold(threshold)?;
        return Ok(Array2DRowRealMatrix::from_matrix(&inverse));
    }
    let qr = QRDecomposition::with_threshold(m, threshold);
    qr.get_solver().get_inverse()
}

/// Inverse of a square matrix from the inverses of its four blocks. Row and
/// column `split_index` close the upper left block.
pub fn block_inverse(m: &dyn RealMatrix, split_index: usize) -> Result<Array2DRowRealMatrix> {
    let n = m.row_dimension();
    if m.column_dimension() != n {
        return Err(LinAlgError::NonSquare {
            rows: n,
            columns: m.column_dimension(),
        });
    }
    if split_index + 1 >= n {
        return Err(out_of_range("split index", split_index, n - 1));
    }
    let split1 = split_index + 1;
    let a = m.get_sub_matrix(0, split_index, 0, split_index)?;
    let b = m.get_sub_matrix(0, split_index, split1, n - 1)?;
    let c = m.get_sub_matrix(split1, n - 1, 0, split_index)?;
    let d = m.get_sub_matrix(split1, n - 1, split1, n - 1)?;

    let invert = |x: &dyn RealMatrix| LUDecomposition::new(x)?.get_solver().get_inverse();
    let a_inv = invert(a.as_ref())?;
    let d_inv = invert(d.as_ref())?;

    // Schur complements of d and a
    let tmp1 = a.subtract(b.multiply(&d_inv)?.multiply(c.as_ref())?.as_ref())?;
    let result00 = invert(tmp1.as_ref())?;
    let tmp2 = d.subtract(c.multiply(&a_inv)?.multiply(b.as_ref())?.as_ref())?;
    let result11 = invert(tmp2.as_ref())?;

    let result01 = a_inv
        .multiply(b.as_ref())?
        .multiply(&result11)?
        .scalar_multiply(-1.0)?;
    let result10 = d_inv
        .multiply(c.as_ref())?
        .multiply(&result00)?
        .scalar_multiply(-1.0)?;

    let mut result = Array2DRowRealMatrix::new(n, n);
    result.set_sub_matrix(result00.data_ref(), 0, 0)?;
    result.set_sub_matrix(&result01.get_data(), 0, split1)?;
    result.set_sub_matrix(&result10.get_data(), split1, 0)?;
    result.set_sub_matrix(result11.data_ref(), split1, split1)?;
    Ok(result)
}

const PADE_COEFFICIENTS_3: [f64; 4] = [120.0, 60.0, 12.0, 1.0];
const PADE_COEFFICIENTS_5: [f64; 6] = [30240.0, 15120.0, 3360.0, 420.0, 30.0, 1.0];
const PADE_COEFFICIENTS_7: [f64; 8] = [
    17297280.0, 8648640.0, 1995840.0, 277200.0, 25200.0, 1512.0, 56.0, 1.0,
];
const PADE_COEFFICIENTS_9: [f64; 10] = [
    17643225600.0,
    8821612800.0,
    2075673600.0,
    302702400.0,
    30270240.0,
    2162160.0,
    110880.0,
    3960.0,
    90.0,
    1.0,
];
const PADE_COEFFICIENTS_13: [f64; 14] = [
    6.476475253248e+16,
    3.238237626624e+16,
    7.7717703038976e+15,
    1.1873537964288e+15,
    129060195264000.0,
    10559470521600.0,
    670442572800.0,
    33522128640.0,
    1323241920.0,
    40840800.0,
    960960.0,
    16380.0,
    182.0,
    1.0,
];

/// `x + c·I` for a square dense `x`.
fn add_to_diagonal(x: &Array2DRowRealMatrix, c: f64) -> Array2DRowRealMatrix {
    let mut out = x.clone();
    for (i, row) in out.data_mut().iter_mut().enumerate() {
        row[i] += c;
    }
    out
}

/// Matrix exponential by scaling and squaring with a Padé approximant
/// (Higham 2005). The degree follows the 1-norm of `m`.
pub fn matrix_exponential(m: &dyn RealMatrix) -> Result<Array2DRowRealMatrix> {
    if !m.is_square() {
        return Err(LinAlgError::NonSquare {
            rows: m.row_dimension(),
            columns: m.column_dimension(),
        });
    }
    let dim = m.row_dimension();

    // shifting by the mean eigenvalue reduces the norm
    let preprocess_scale = m.get_trace()? / dim as f64;
    let mut scaled = add_to_diagonal(&Array2DRowRealMatrix::from_matrix(m), -preprocess_scale);

    let l1_norm = m.get_norm1();
    let mut squaring_count = 0;
    let coefficients: &[f64] = if l1_norm < 1.495585217958292e-2 {
        &PADE_COEFFICIENTS_3
    } else if l1_norm < 2.539398330063230e-1 {
        &PADE_COEFFICIENTS_5
    } else if l1_norm < 9.504178996162932e-1 {
        &PADE_COEFFICIENTS_7
    } else if l1_norm < 2.097847961257068 {
        &PADE_COEFFICIENTS_9
    } else {
        let norm_scale = 5.371920351148152;
        squaring_count = ((l1_norm / norm_scale).log2().floor() as i32).max(0);
        let factor = 2f64.powi(-squaring_count);
        for row in scaled.data_mut() {
            for value in row.iter_mut() {
                *value *= factor;
            }
        }
        &PADE_COEFFICIENTS_13
    };
    debug!(
        "matrix exponential: Pade degree {}, {} squarings",
        coefficients.len() - 1,
        squaring_count
    );

    // Horner evaluation of the odd (V) and even (U) parts
    let scaled2 = scaled.multiply_dense(&scaled)?;
    let length = coefficients.len();
    let mut pade_v = Array2DRowRealMatrix::new(dim, dim);
    for i in (2..length).rev().step_by(2) {
        pade_v = scaled2.multiply_dense(&add_to_diagonal(&pade_v, coefficients[i]))?;
    }
    pade_v = scaled.multiply_dense(&add_to_diagonal(&pade_v, coefficients[1]))?;

    let mut pade_u = Array2DRowRealMatrix::new(dim, dim);
    for i in (2..length - 1).rev().step_by(2) {
        pade_u = scaled2.multiply_dense(&add_to_diagonal(&pade_u, coefficients[i]))?;
    }
    pade_u = add_to_diagonal(&pade_u, coefficients[0]);

    // (U - V)·F = U + V
    let numerator = pade_u.add(&pade_v)?;
    let denominator = pade_u.subtract(&pade_v)?;
    let mut result = QRDecomposition::new(denominator.as_ref())
        .get_solver()
        .solve_matrix(numerator.as_ref())?;

    for _ in 0..squaring_count {
        result = result.multiply_dense(&result)?;
    }
    let factor = preprocess_scale.exp();
    for row in result.data_mut() {
        for value in row.iter_mut() {
            *value *= factor;
        }
    }
    Ok(result)
}

/// What [`orthonormalize`] does with a vector whose projection has a norm
/// at or below the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
pub enum DependentVectorsHandler {
    /// fail with [`LinAlgError::ZeroNorm`]
    GenerateException,
    /// keep a zero vector in its place
    AddZeroVector,
    /// drop it, the basis only spans the independent directions
    ReduceBaseToSpan,
}

/// Modified Gram-Schmidt orthonormalization of `independent`.
pub fn orthonormalize(
    independent: &[ArrayRealVector],
    threshold: f64,
    handler: DependentVectorsHandler,
) -> Result<Vec<ArrayRealVector>> {
    let mut basis: Vec<ArrayRealVector> = independent.to_vec();
    let mut index = 0;
    while index < basis.len() {
        let norm = basis[index].get_norm();
        if norm <= threshold {
            match handler {
                DependentVectorsHandler::GenerateException => return Err(LinAlgError::ZeroNorm),
                DependentVectorsHandler::AddZeroVector => {
                    basis[index] = ArrayRealVector::new(basis[index].dimension());
                    index += 1;
                }
                DependentVectorsHandler::ReduceBaseToSpan => {
                    debug!("orthonormalize: dropping dependent vector {}", index);
                    basis.remove(index);
                }
            }
            continue;
        }
        let (head, tail) = basis.split_at_mut(index + 1);
        let vi = &mut head[index];
        vi.map_divide_to_self(norm)?;
        for vj in tail.iter_mut() {
            let dot = vi.dot_product(&*vj)?;
            vj.combine_to_self(1.0, -dot, &*vi)?;
        }
        index += 1;
    }
    Ok(basis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linalg_error::ErrorKind;
    use crate::matrices::field_matrix::FieldMatrix;
    use approx::assert_relative_eq;

    #[test]
    fn test_checks() {
        assert!(check_row_index(3, 2).is_ok());
        assert_eq!(
            check_row_index(3, 3),
            Err(LinAlgError::IndexOutOfRange {
                what: "row",
                index: 3,
                min: 0,
                max: 2
            })
        );
        assert!(check_sub_vector_range(4, 3, 1).is_ok());
        assert!(check_sub_vector_range(4, 3, 2).is_err());
        assert!(check_sub_matrix_range(3, 3, 1, 0, 0, 0).is_err());
        assert!(check_sub_matrix_indices(3, 3, &[], &[0]).is_err());
        assert!(check_rectangular(&[vec![1.0], vec![1.0, 2.0]]).is_err());
        assert_eq!(check_rectangular::<f64>(&[]), Err(LinAlgError::NoData));
    }

    #[test]
    fn test_symmetry_uses_relative_tolerance() {
        let tiny = Array2DRowRealMatrix::from_rows(vec![
            vec![1e-30, 2e-30],
            vec![2.0000000000000004e-30, 3e-30],
        ])
        .unwrap();
        assert!(is_symmetric(&tiny, 1e-12));
        let skewed = Array2DRowRealMatrix::from_rows(vec![vec![1e-30, 2e-30], vec![3e-30, 1e-30]])
            .unwrap();
        assert!(!is_symmetric(&skewed, 1e-12));
        assert!(matches!(
            check_symmetric(&skewed, 1e-12),
            Err(LinAlgError::NonSymmetric { row: 0, column: 1, .. })
        ));
        let rect = Array2DRowRealMatrix::new(2, 3);
        assert!(matches!(
            check_symmetric(&rect, 1e-12),
            Err(LinAlgError::NonSquare { .. })
        ));
    }

    #[test]
    fn test_triangular_systems() {
        let l = Array2DRowRealMatrix::from_rows(vec![
            vec![2.0, 0.0, 0.0],
            vec![1.0, 1.0, 0.0],
            vec![3.0, -1.0, 4.0],
        ])
        .unwrap();
        let mut b = ArrayRealVector::from_vec(vec![2.0, 3.0, 9.0]);
        solve_lower_triangular_system(&l, &mut b).unwrap();
        assert_eq!(b.to_array(), vec![1.0, 2.0, 2.0]);
        let u = l.transpose().unwrap();
        let mut c = ArrayRealVector::from_vec(vec![9.0, 0.0, 8.0]);
        solve_upper_triangular_system(u.as_ref(), &mut c).unwrap();
        assert_relative_eq!(c[2], 2.0, epsilon = 1e-15);
        assert_relative_eq!(c[1], 2.0, epsilon = 1e-15);
        assert_relative_eq!(c[0], 0.5, epsilon = 1e-15);
        let singular = Array2DRowRealMatrix::from_rows(vec![vec![0.0, 0.0], vec![1.0, 1.0]]).unwrap();
        let mut d = ArrayRealVector::new(2);
        assert_eq!(
            solve_lower_triangular_system(&singular, &mut d),
            Err(LinAlgError::Singular)
        );
    }

    #[test]
    fn test_inverse() {
        let m = Array2DRowRealMatrix::from_rows(vec![
            vec![1.0, 2.0, 3.0],
            vec![2.0, 5.0, 3.0],
            vec![1.0, 0.0, 8.0],
        ])
        .unwrap();
        let inv = inverse(&m, 0.0).unwrap();
        let expected = Array2DRowRealMatrix::from_rows(vec![
            vec![-40.0, 16.0, 9.0],
            vec![13.0, -5.0, -3.0],
            vec![5.0, -2.0, -1.0],
        ])
        .unwrap();
        assert!(inv.subtract(&expected).unwrap().get_norm1() < 1e-10);
        let diag = create_real_diagonal_matrix(&[2.0, 4.0]);
        let inv = inverse(&diag, 0.0).unwrap();
        assert_eq!(inv.get_data(), vec![vec![0.5, 0.0], vec![0.0, 0.25]]);
        assert!(inverse(&create_real_diagonal_matrix(&[1.0, 0.0]), 1e-10).is_err());
        assert!(inverse(&Array2DRowRealMatrix::new(2, 3), 0.0).is_err());
    }

    #[test]
    fn test_factories() {
        let id = create_real_identity_matrix(3);
        assert_eq!(id.get_trace().unwrap(), 3.0);
        let fid = create_field_identity_matrix::<num::rational::Rational64>(2);
        assert_eq!(fid.get_data()[1][1], num::rational::Rational64::from_integer(1));
        let c = real_to_field_matrix::<num_complex::Complex<f64>>(&id);
        assert_eq!(c.get_data()[0][0], num_complex::Complex::new(1.0, 0.0));
    }

    fn assert_exponential(exponent: [[f64; 2]; 2], expected: [[f64; 2]; 2], epsilon: f64) {
        let m = Array2DRowRealMatrix::from_rows(exponent.iter().map(|r| r.to_vec()).collect())
            .unwrap();
        let result = matrix_exponential(&m).unwrap();
        for i in 0..2 {
            for j in 0..2 {
                assert_relative_eq!(result.entry(i, j), expected[i][j], epsilon = epsilon);
            }
        }
    }

    #[test]
    fn test_matrix_exponential_per_pade_degree() {
        // degree 3
        assert_exponential(
            [[0.0001, 0.001], [0.001, -0.0001]],
            [[1.00010050501688, 0.00100000016833332], [0.00100000016833332, 0.999900504983209]],
            1e-14,
        );
        // degree 5
        assert_exponential(
            [[0.1, 0.1], [0.001, -0.1]],
            [[1.10522267021001, 0.100168418362112], [0.00100168418362112, 0.904885833485786]],
            1e-13,
        );
        // degree 7
        assert_exponential(
            [[0.5, 0.1], [0.001, -0.5]],
            [[1.64878192423569, 0.104220769814317], [0.00104220769814317, 0.606574226092523]],
            1e-13,
        );
        // degree 9
        assert_exponential(
            [[1.8, 0.3], [0.001, -0.9]],
            [[6.05008743087114, 0.627036746099251], [0.00209012248699751, 0.406756715977872]],
            1e-13,
        );
    }

    #[test]
    fn test_matrix_exponential_with_squaring() {
        assert_exponential(
            [[3.4, 1.2], [0.001, -0.9]],
            [[29.9705442872504, 8.2499077972773], [0.00687492316439775, 0.408374680340048]],
            1e-11,
        );
        // stiff: eigenvalues 0 and -10001
        assert_exponential(
            [[-1e4, 1e4], [1.0, -1.0]],
            [[9.99900009999e-05, 0.999900009999], [9.99900009999e-05, 0.999900009999]],
            1e-11,
        );
        assert!(matrix_exponential(&Array2DRowRealMatrix::new(2, 3)).is_err());
    }

    #[test]
    fn test_block_inverse_every_split() {
        let m = Array2DRowRealMatrix::from_rows(vec![
            vec![-1.0, 0.0, 123.0, 4.0],
            vec![-56.0, 78.9, -0.1, -23.4],
            vec![5.67, 8.0, -9.0, 1011.0],
            vec![12.0, 345.0, -67.8, 9.0],
        ])
        .unwrap();
        for split in 0..3 {
            let inv = block_inverse(&m, split).unwrap();
            let id = m.multiply_dense(&inv).unwrap();
            for i in 0..4 {
                for j in 0..4 {
                    let expected = if i == j { 1.0 } else { 0.0 };
                    assert_relative_eq!(id.entry(i, j), expected, epsilon = 1e-12);
                }
            }
        }
        assert!(block_inverse(&m, 3).is_err());
        assert!(block_inverse(&Array2DRowRealMatrix::new(3, 4), 1).is_err());

        let singular_block = Array2DRowRealMatrix::from_rows(vec![
            vec![1.0, 2.0, 0.0],
            vec![2.0, 4.0, 0.0],
            vec![0.0, 0.0, 1.0],
        ])
        .unwrap();
        assert_eq!(
            block_inverse(&singular_block, 1).unwrap_err().kind(),
            ErrorKind::Singular
        );
    }

    fn vector(values: &[f64]) -> ArrayRealVector {
        ArrayRealVector::from_vec(values.to_vec())
    }

    fn assert_orthonormal(basis: &[ArrayRealVector]) {
        for (i, vi) in basis.iter().enumerate() {
            for (j, vj) in basis.iter().enumerate() {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_relative_eq!(vi.dot_product(vj).unwrap(), expected, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_orthonormalize() {
        let eps = f64::EPSILON / 2.0;
        let basis = orthonormalize(
            &[vector(&[1.0, 2.0, 2.0]), vector(&[-1.0, 0.0, 2.0]), vector(&[0.0, 0.0, 1.0])],
            eps,
            DependentVectorsHandler::GenerateException,
        )
        .unwrap();
        assert_orthonormal(&basis);
        let expected = [
            [1.0 / 3.0, 2.0 / 3.0, 2.0 / 3.0],
            [-2.0 / 3.0, -1.0 / 3.0, 2.0 / 3.0],
            [2.0 / 3.0, -2.0 / 3.0, 1.0 / 3.0],
        ];
        for (v, e) in basis.iter().zip(expected.iter()) {
            for k in 0..3 {
                assert_relative_eq!(v.entry(k), e[k], epsilon = 1e-15);
            }
        }

        let plane = orthonormalize(
            &[vector(&[3.0, 1.0]), vector(&[2.0, 2.0])],
            eps,
            DependentVectorsHandler::GenerateException,
        )
        .unwrap();
        let s10 = 10f64.sqrt();
        assert_relative_eq!(plane[0].entry(0), 3.0 / s10, epsilon = 1e-15);
        assert_relative_eq!(plane[1].entry(0), -1.0 / s10, epsilon = 1e-15);
        assert_relative_eq!(plane[1].entry(1), 3.0 / s10, epsilon = 1e-15);

        let small = 1e-12;
        let nearly_aligned = orthonormalize(
            &[
                vector(&[1.0, small, small]),
                vector(&[1.0, small, 0.0]),
                vector(&[1.0, 0.0, small]),
            ],
            eps,
            DependentVectorsHandler::GenerateException,
        )
        .unwrap();
        assert_orthonormal(&nearly_aligned);
        assert_relative_eq!(nearly_aligned[1].entry(2), -1.0, epsilon = 1e-15);
        assert_relative_eq!(nearly_aligned[2].entry(1), -1.0, epsilon = 1e-15);
    }

    #[test]
    fn test_orthonormalize_dependent_vectors() {
        let input = [
            vector(&[2.0, 3.0, 0.0]),
            vector(&[2.0, 7.0, 0.0]),
            vector(&[4.0, 5.0, 0.0]),
            vector(&[0.0, 0.0, 1.0]),
        ];
        let threshold = 7.0 * f64::EPSILON / 2.0;
        assert_eq!(
            orthonormalize(&input, threshold, DependentVectorsHandler::GenerateException),
            Err(LinAlgError::ZeroNorm)
        );

        let padded =
            orthonormalize(&input, threshold, DependentVectorsHandler::AddZeroVector).unwrap();
        assert_eq!(padded.len(), 4);
        assert_eq!(padded[2].get_norm(), 0.0);

        let span =
            orthonormalize(&input, threshold, DependentVectorsHandler::ReduceBaseToSpan).unwrap();
        assert_eq!(span.len(), 3);
        assert_relative_eq!(span[2].entry(2), 1.0, epsilon = 1e-15);
        assert_orthonormal(&span);
        // input is left untouched
        assert_eq!(input[0].to_array(), vec![2.0, 3.0, 0.0]);
    }
}
