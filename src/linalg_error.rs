//! Error type shared by the matrices, decompositions and iterative solvers.
use std::fmt;

use crate::matrices::real_vector::ArrayRealVector;

/// Broad category of a [`LinAlgError`]; callers match on this rather than on messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display, strum_macros::EnumIter)]
pub enum ErrorKind {
    DimensionMismatch,
    OutOfRange,
    Singular,
    NonSquare,
    NonSymmetric,
    NonPositiveDefinite,
    IterationExhausted,
    NumericalFailure,
    Unsupported,
    Settings,
}

/// Error types for matrix storage, factorizations and iterative solvers
#[derive(Debug, Clone, PartialEq)]
pub enum LinAlgError {
    /// vector or operand length does not match
    DimensionMismatch { got: usize, expected: usize },
    /// matrix shapes are incompatible
    MatrixDimensionMismatch {
        got_rows: usize,
        got_columns: usize,
        expected_rows: usize,
        expected_columns: usize,
    },
    /// raw data without any entry
    NoData,
    /// 2D data whose rows do not all have the same length
    RaggedArray { row: usize, got: usize, expected: usize },
    /// index outside `[min, max]`; `what` is "row", "column" or "index"
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        min: usize,
        max: usize,
    },
    /// sub-range whose end lies before its start
    InvalidRange { start: usize, end: usize },
    /// a non-zero value was written where the storage only holds zeros
    NonZeroOffDiagonal { row: usize, column: usize, value: f64 },
    Singular,
    SingularOperator,
    NonSquare { rows: usize, columns: usize },
    NonSquareOperator { rows: usize, columns: usize },
    NonSymmetric { row: usize, column: usize, threshold: f64 },
    NonSelfAdjointOperator,
    NonPositiveDefinite,
    /// iteration cap reached; `best` holds the iterate obtained so far when one exists
    MaxCountExceeded {
        max: usize,
        best: Option<ArrayRealVector>,
    },
    ConvergenceFailed { max_iterations: usize },
    IllConditionedOperator { condition: f64 },
    DecompositionFailed(String),
    ZeroNorm,
    DivisionByZero,
    UnsupportedOperation(String),
    Settings(String),
}

pub type Result<T> = std::result::Result<T, LinAlgError>;

impl LinAlgError {
    pub fn kind(&self) -> ErrorKind {
        use LinAlgError::*;
        match self {
            DimensionMismatch { .. } | MatrixDimensionMismatch { .. } | NoData | RaggedArray { .. } => {
                ErrorKind::DimensionMismatch
            }
            IndexOutOfRange { .. } | InvalidRange { .. } | NonZeroOffDiagonal { .. } => {
                ErrorKind::OutOfRange
            }
            Singular | SingularOperator => ErrorKind::Singular,
            NonSquare { .. } | NonSquareOperator { .. } => ErrorKind::NonSquare,
            NonSymmetric { .. } | NonSelfAdjointOperator => ErrorKind::NonSymmetric,
            NonPositiveDefinite => ErrorKind::NonPositiveDefinite,
            MaxCountExceeded { .. } => ErrorKind::IterationExhausted,
            ConvergenceFailed { .. }
            | IllConditionedOperator { .. }
            | DecompositionFailed(_)
            | ZeroNorm
            | DivisionByZero => ErrorKind::NumericalFailure,
            UnsupportedOperation(_) => ErrorKind::Unsupported,
            Settings(_) => ErrorKind::Settings,
        }
    }

    /// Best iterate carried by an iteration-exhausted failure.
    pub fn best_solution(&self) -> Option<&ArrayRealVector> {
        match self {
            LinAlgError::MaxCountExceeded { best, .. } => best.as_ref(),
            _ => None,
        }
    }
}

impl fmt::Display for LinAlgError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LinAlgError::DimensionMismatch { got, expected } => {
                write!(f, "dimensions mismatch: got {}, expected {}", got, expected)
            }
            LinAlgError::MatrixDimensionMismatch {
                got_rows,
                got_columns,
                expected_rows,
                expected_columns,
            } => write!(
                f,
                "dimensions mismatch: got {}x{} but expected {}x{}",
                got_rows, got_columns, expected_rows, expected_columns
            ),
            LinAlgError::NoData => write!(f, "no data: at least one element is required"),
            LinAlgError::RaggedArray { row, got, expected } => write!(
                f,
                "ragged array: row {} has {} entries, expected {}",
                row, got, expected
            ),
            LinAlgError::IndexOutOfRange {
                what,
                index,
                min,
                max,
            } => write!(f, "{} index {} out of allowed range [{}, {}]", what, index, min, max),
            LinAlgError::InvalidRange { start, end } => {
                write!(f, "initial index {} after final index {}", start, end)
            }
            LinAlgError::NonZeroOffDiagonal { row, column, value } => write!(
                f,
                "cannot store non-zero value {} at off-diagonal position ({}, {})",
                value, row, column
            ),
            LinAlgError::Singular => write!(f, "matrix is singular"),
            LinAlgError::SingularOperator => write!(f, "operator is singular"),
            LinAlgError::NonSquare { rows, columns } => {
                write!(f, "non square ({}x{}) matrix", rows, columns)
            }
            LinAlgError::NonSquareOperator { rows, columns } => {
                write!(f, "non square ({}x{}) linear operator", rows, columns)
            }
            LinAlgError::NonSymmetric {
                row,
                column,
                threshold,
            } => write!(
                f,
                "non symmetric matrix: the difference between entries at ({}, {}) and ({}, {}) is larger than {}",
                row, column, column, row, threshold
            ),
            LinAlgError::NonSelfAdjointOperator => write!(f, "non self-adjoint linear operator"),
            LinAlgError::NonPositiveDefinite => {
                write!(f, "matrix or operator is not positive definite")
            }
            LinAlgError::MaxCountExceeded { max, .. } => {
                write!(f, "maximal count ({}) exceeded", max)
            }
            LinAlgError::ConvergenceFailed { max_iterations } => write!(
                f,
                "convergence failed after {} iterations",
                max_iterations
            ),
            LinAlgError::IllConditionedOperator { condition } => write!(
                f,
                "ill-conditioned operator: condition number estimate {:e}",
                condition
            ),
            LinAlgError::DecompositionFailed(msg) => write!(f, "decomposition failed: {}", msg),
            LinAlgError::ZeroNorm => write!(f, "zero norm"),
            LinAlgError::DivisionByZero => write!(f, "division by zero"),
            LinAlgError::UnsupportedOperation(msg) => write!(f, "unsupported operation: {}", msg),
            LinAlgError::Settings(msg) => write!(f, "invalid settings: {}", msg),
        }
    }
}

impl std::error::Error for LinAlgError {}
