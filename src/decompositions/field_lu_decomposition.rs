//! LU decomposition over any field.
//!
//! Pivots are chosen by the largest `|real()|` (numeric choice) or as the
//! first entry the zero checker accepts as non-zero, which is what exact
//! fields such as rationals want.
use std::cell::OnceCell;

use log::debug;

use crate::decompositions::decomposition_solver::FieldDecompositionSolver;
use crate::linalg_error::{LinAlgError, Result};
use crate::matrices::array2d_field_matrix::Array2DRowFieldMatrix;
use crate::matrices::field::{Field, FieldElement};
use crate::matrices::field_matrix::FieldMatrix;
use crate::matrices::field_vector::{ArrayFieldVector, FieldVector};

#[derive(Debug)]
pub struct FieldLUDecomposition<T: FieldElement> {
    field: Field<T>,
    lu: Vec<Vec<T>>,
    pivot: Vec<usize>,
    even: bool,
    singular: bool,
    cached_l: OnceCell<Array2DRowFieldMatrix<T>>,
    cached_u: OnceCell<Array2DRowFieldMatrix<T>>,
    cached_p: OnceCell<Array2DRowFieldMatrix<T>>,
}

impl<T: FieldElement> FieldLUDecomposition<T> {
    /// Numeric pivot choice, exact zero test.
    pub fn new(matrix: &dyn FieldMatrix<T>) -> Result<Self> {
        Self::with_options(matrix, &|x: &T| x.is_zero(), true)
    }

    pub fn with_zero_checker(matrix: &dyn FieldMatrix<T>, zero_checker: &dyn Fn(&T) -> bool) -> Result<Self> {
        Self::with_options(matrix, zero_checker, true)
    }

    pub fn with_options(
        matrix: &dyn FieldMatrix<T>,
        zero_checker: &dyn Fn(&T) -> bool,
        numeric_permutation_choice: bool,
    ) -> Result<Self> {
        if !matrix.is_square() {
            return Err(LinAlgError::NonSquare {
                rows: matrix.row_dimension(),
                columns: matrix.column_dimension(),
            });
        }
        let m = matrix.column_dimension();
        let mut lu = matrix.get_data();
        let mut pivot: Vec<usize> = (0..m).collect();
        let mut even = true;
        let mut singular = false;

        for col in 0..m {
            for row in 0..col {
                let mut sum = lu[row][col].clone();
                for i in 0..row {
                    sum = sum - lu[row][i].clone() * lu[i][col].clone();
                }
                lu[row][col] = sum;
            }

            let mut max = col;
            let mut largest = f64::NEG_INFINITY;
            let mut non_zero = col;
            for row in col..m {
                let mut sum = lu[row][col].clone();
                for i in 0..col {
                    sum = sum - lu[row][i].clone() * lu[i][col].clone();
                }
                lu[row][col] = sum;
                if numeric_permutation_choice {
                    let abs_sum = lu[row][col].real().abs();
                    if abs_sum > largest {
                        largest = abs_sum;
                        max = row;
                    }
                } else if zero_checker(&lu[non_zero][col]) {
                    non_zero += 1;
                }
            }
            if !numeric_permutation_choice {
                max = non_zero.min(m - 1);
            }

            if zero_checker(&lu[max][col]) {
                debug!("field LU: no usable pivot in column {}, matrix is singular", col);
                singular = true;
                break;
            }

            if max != col {
                lu.swap(max, col);
                pivot.swap(max, col);
                even = !even;
            }

            let lu_diag = lu[col][col].clone();
            for row in (col + 1)..m {
                lu[row][col] = lu[row][col].clone() / lu_diag.clone();
            }
        }

        Ok(FieldLUDecomposition {
            field: matrix.field(),
            lu,
            pivot,
            even,
            singular,
            cached_l: OnceCell::new(),
            cached_u: OnceCell::new(),
            cached_p: OnceCell::new(),
        })
    }

    pub fn get_l(&self) -> Option<&Array2DRowFieldMatrix<T>> {
        if self.singular {
            return None;
        }
        Some(self.cached_l.get_or_init(|| {
            let m = self.pivot.len();
            let mut l = Array2DRowFieldMatrix::new(m, m);
            for i in 0..m {
                l.data_mut()[i][..i].clone_from_slice(&self.lu[i][..i]);
                l.data_mut()[i][i] = self.field.one();
            }
            l
        }))
    }

    pub fn get_u(&self) -> Option<&Array2DRowFieldMatrix<T>> {
        if self.singular {
            return None;
        }
        Some(self.cached_u.get_or_init(|| {
            let m = self.pivot.len();
            let mut u = Array2DRowFieldMatrix::new(m, m);
            for i in 0..m {
                u.data_mut()[i][i..].clone_from_slice(&self.lu[i][i..]);
            }
            u
        }))
    }

    pub fn get_p(&self) -> Option<&Array2DRowFieldMatrix<T>> {
        if self.singular {
            return None;
        }
        Some(self.cached_p.get_or_init(|| {
            let m = self.pivot.len();
            let mut p = Array2DRowFieldMatrix::new(m, m);
            for (i, &j) in self.pivot.iter().enumerate() {
                p.data_mut()[i][j] = self.field.one();
            }
            p
        }))
    }

    pub fn get_pivot(&self) -> &[usize] {
        &self.pivot
    }

    pub fn is_singular(&self) -> bool {
        self.singular
    }

    pub fn get_determinant(&self) -> T {
        if self.singular {
            return self.field.zero();
        }
        let sign = if self.even {
            self.field.one()
        } else {
            -self.field.one()
        };
        (0..self.pivot.len()).fold(sign, |det, i| det * self.lu[i][i].clone())
    }

    pub fn get_solver(&self) -> FieldLUSolver<'_, T> {
        FieldLUSolver { lu: self }
    }
}

pub struct FieldLUSolver<'a, T: FieldElement> {
    lu: &'a FieldLUDecomposition<T>,
}

impl<T: FieldElement> FieldDecompositionSolver<T> for FieldLUSolver<'_, T> {
    fn solve(&self, b: &dyn FieldVector<T>) -> Result<ArrayFieldVector<T>> {
        let m = self.lu.pivot.len();
        if b.dimension() != m {
            return Err(LinAlgError::DimensionMismatch {
                got: b.dimension(),
                expected: m,
            });
        }
        if self.lu.singular {
            return Err(LinAlgError::Singular);
        }
        let lu = &self.lu.lu;
        let mut bp: Vec<T> = self.lu.pivot.iter().map(|&p| b.entry(p)).collect();

        for col in 0..m {
            let bp_col = bp[col].clone();
            for i in (col + 1)..m {
                bp[i] = bp[i].clone() - bp_col.clone() * lu[i][col].clone();
            }
        }
        for col in (0..m).rev() {
            bp[col] = bp[col].clone() / lu[col][col].clone();
            let bp_col = bp[col].clone();
            for i in 0..col {
                bp[i] = bp[i].clone() - bp_col.clone() * lu[i][col].clone();
            }
        }
        Ok(ArrayFieldVector::with_field(self.lu.field, bp))
    }

    fn is_non_singular(&self) -> bool {
        !self.lu.singular
    }

    fn row_dimension(&self) -> usize {
        self.lu.pivot.len()
    }

    fn column_dimension(&self) -> usize {
        self.lu.pivot.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use num::rational::Rational64;
    use num_complex::Complex;

    fn r(n: i64) -> Rational64 {
        Rational64::from_integer(n)
    }

    fn testdata() -> Array2DRowFieldMatrix<Rational64> {
        Array2DRowFieldMatrix::from_rows(vec![
            vec![r(1), r(2), r(3)],
            vec![r(2), r(5), r(3)],
            vec![r(1), r(0), r(8)],
        ])
        .unwrap()
    }

    #[test]
    fn test_exact_determinant_and_inverse() {
        for numeric in [true, false] {
            let lu =
                FieldLUDecomposition::with_options(&testdata(), &|x: &Rational64| *x == r(0), numeric)
                    .unwrap();
            assert_eq!(lu.get_determinant(), r(-1));
            let inverse = lu.get_solver().get_inverse().unwrap();
            assert_eq!(
                inverse.get_data(),
                vec![
                    vec![r(-40), r(16), r(9)],
                    vec![r(13), r(-5), r(-3)],
                    vec![r(5), r(-2), r(-1)],
                ]
            );
        }
    }

    #[test]
    fn test_pa_equals_lu_exactly() {
        let a = testdata();
        let lu = FieldLUDecomposition::new(&a).unwrap();
        let pa = lu.get_p().unwrap().multiply(&a).unwrap();
        let product = lu.get_l().unwrap().multiply(lu.get_u().unwrap()).unwrap();
        assert_eq!(pa.get_data(), product.get_data());
        assert!(std::ptr::eq(lu.get_l().unwrap(), lu.get_l().unwrap()));
    }

    #[test]
    fn test_first_non_zero_pivot_skips_zero_leading_entry() {
        let a = Array2DRowFieldMatrix::from_rows(vec![vec![r(0), r(1)], vec![r(2), r(3)]]).unwrap();
        let lu = FieldLUDecomposition::with_options(&a, &|x: &Rational64| *x == r(0), false).unwrap();
        assert!(!lu.is_singular());
        assert_eq!(lu.get_pivot(), &[1, 0]);
        assert_eq!(lu.get_determinant(), r(-2));
    }

    #[test]
    fn test_singular_is_flagged_not_raised() {
        let a = Array2DRowFieldMatrix::from_rows(vec![vec![r(1), r(2)], vec![r(2), r(4)]]).unwrap();
        let lu = FieldLUDecomposition::new(&a).unwrap();
        assert!(lu.is_singular());
        assert_eq!(lu.get_determinant(), r(0));
        assert!(lu.get_l().is_none());
        let b = ArrayFieldVector::from_vec(vec![r(1), r(1)]).unwrap();
        assert!(matches!(lu.get_solver().solve(&b), Err(LinAlgError::Singular)));
        let rect = Array2DRowFieldMatrix::<Rational64>::new(2, 3);
        assert!(FieldLUDecomposition::new(&rect).is_err());
    }

    #[test]
    fn test_complex_solve_with_tolerant_zero_checker() {
        let c = |re: f64, im: f64| Complex::new(re, im);
        let a = Array2DRowFieldMatrix::from_rows(vec![
            vec![c(2.0, 1.0), c(1.0, 0.0)],
            vec![c(0.0, -1.0), c(3.0, 0.0)],
        ])
        .unwrap();
        let lu = FieldLUDecomposition::with_zero_checker(&a, &|z: &Complex<f64>| z.norm() < 1e-14)
            .unwrap();
        let x = ArrayFieldVector::from_vec(vec![c(1.0, 1.0), c(-2.0, 0.5)]).unwrap();
        let b = a.operate(&x).unwrap();
        let solved = lu.get_solver().solve(&b).unwrap();
        for i in 0..2 {
            assert_relative_eq!(solved.entry(i).re, x.entry(i).re, epsilon = 1e-14);
            assert_relative_eq!(solved.entry(i).im, x.entry(i).im, epsilon = 1e-14);
        }
    }
}
