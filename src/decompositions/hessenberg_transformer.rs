//! Orthogonal reduction of a general square matrix to upper Hessenberg form,
//! `A = P·H·Pᵗ`, by Householder similarity transformations.
use std::cell::OnceCell;

use crate::linalg_error::{LinAlgError, Result};
use crate::matrices::array2d_real_matrix::Array2DRowRealMatrix;
use crate::matrices::real_matrix::RealMatrix;

#[derive(Debug)]
pub struct HessenbergTransformer {
    householder_vectors: Vec<Vec<f64>>,
    ort: Vec<f64>,
    cached_p: OnceCell<Array2DRowRealMatrix>,
    cached_pt: OnceCell<Array2DRowRealMatrix>,
    cached_h: OnceCell<Array2DRowRealMatrix>,
}

impl HessenbergTransformer {
    pub fn new(matrix: &dyn RealMatrix) -> Result<Self> {
        if !matrix.is_square() {
            return Err(LinAlgError::NonSquare {
                rows: matrix.row_dimension(),
                columns: matrix.column_dimension(),
            });
        }
        let m = matrix.row_dimension();
        let mut transformer = HessenbergTransformer {
            householder_vectors: matrix.get_data(),
            ort: vec![0.0; m],
            cached_p: OnceCell::new(),
            cached_pt: OnceCell::new(),
            cached_h: OnceCell::new(),
        };
        transformer.transform();
        Ok(transformer)
    }

    fn transform(&mut self) {
        let n = self.householder_vectors.len();
        if n < 3 {
            return;
        }
        let high = n - 1;
        let hv = &mut self.householder_vectors;
        let ort = &mut self.ort;
        for m in 1..high {
            let scale: f64 = (m..=high).map(|i| hv[i][m - 1].abs()).sum();
            if scale == 0.0 {
                continue;
            }
            let mut h = 0.0;
            for i in (m..=high).rev() {
                ort[i] = hv[i][m - 1] / scale;
                h += ort[i] * ort[i];
            }
            let g = if ort[m] > 0.0 { -h.sqrt() } else { h.sqrt() };
            h -= ort[m] * g;
            ort[m] -= g;

            // H = (I - u uᵗ / h) H (I - u uᵗ / h)
            for j in m..n {
                let f = (m..=high).rev().map(|i| ort[i] * hv[i][j]).sum::<f64>() / h;
                for i in m..=high {
                    hv[i][j] -= f * ort[i];
                }
            }
            for row in hv.iter_mut() {
                let f = (m..=high).rev().map(|j| ort[j] * row[j]).sum::<f64>() / h;
                for j in m..=high {
                    row[j] -= f * ort[j];
                }
            }
            ort[m] *= scale;
            hv[m][m - 1] = scale * g;
        }
    }

    /// Accumulated orthogonal transformation `P`.
    pub fn get_p(&self) -> &Array2DRowRealMatrix {
        self.cached_p.get_or_init(|| {
            let hv = &self.householder_vectors;
            let n = hv.len();
            let mut p = vec![vec![0.0; n]; n];
            for (i, row) in p.iter_mut().enumerate() {
                row[i] = 1.0;
            }
            if n < 3 {
                return Array2DRowRealMatrix::from_rows_unchecked(p);
            }
            let high = n - 1;
            let mut ort = self.ort.clone();
            for m in (1..high).rev() {
                if hv[m][m - 1] == 0.0 {
                    continue;
                }
                for i in (m + 1)..=high {
                    ort[i] = hv[i][m - 1];
                }
                for j in m..=high {
                    let g: f64 = (m..=high).map(|i| ort[i] * p[i][j]).sum();
                    // double division avoids underflow
                    let g = (g / ort[m]) / hv[m][m - 1];
                    for i in m..=high {
                        p[i][j] += g * ort[i];
                    }
                }
            }
            Array2DRowRealMatrix::from_rows_unchecked(p)
        })
    }

    pub fn get_pt(&self) -> &Array2DRowRealMatrix {
        self.cached_pt.get_or_init(|| self.get_p().transpose_dense())
    }

    /// Upper Hessenberg matrix `H`; entries below the first subdiagonal are zero.
    pub fn get_h(&self) -> &Array2DRowRealMatrix {
        self.cached_h.get_or_init(|| {
            let hv = &self.householder_vectors;
            let m = hv.len();
            let mut h = vec![vec![0.0; m]; m];
            for (i, row) in h.iter_mut().enumerate() {
                if i > 0 {
                    row[i - 1] = hv[i][i - 1];
                }
                row[i..].copy_from_slice(&hv[i][i..]);
            }
            Array2DRowRealMatrix::from_rows_unchecked(h)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iterative_solvers::linear_operator::RealLinearOperator;
    use crate::matrices::matrix_utils::create_real_identity_matrix;
    use approx::assert_relative_eq;
    use rand::Rng;

    fn check(a: &Array2DRowRealMatrix) {
        let n = a.row_dimension();
        let t = HessenbergTransformer::new(a).unwrap();
        let php = t.get_p().multiply(t.get_h()).unwrap().multiply(t.get_pt()).unwrap();
        let ppt = t.get_p().multiply(t.get_pt()).unwrap();
        let identity = create_real_identity_matrix(n);
        for i in 0..n {
            for j in 0..n {
                assert_relative_eq!(php.entry(i, j), a.entry(i, j), epsilon = 1e-12);
                assert_relative_eq!(ppt.entry(i, j), identity.entry(i, j), epsilon = 1e-13);
                if i > j + 1 {
                    assert_eq!(t.get_h().entry(i, j), 0.0);
                }
            }
        }
    }

    #[test]
    fn test_php_is_a() {
        check(
            &Array2DRowRealMatrix::from_rows(vec![
                vec![3.0, -2.0, -4.0, 2.0],
                vec![-5.0, 1.0, 3.0, 0.0],
                vec![2.0, 7.0, -1.0, 8.0],
                vec![1.0, 0.0, 6.0, 4.0],
            ])
            .unwrap(),
        );
        let mut rng = rand::rng();
        let random = Array2DRowRealMatrix::from_rows(
            (0..7)
                .map(|_| (0..7).map(|_| rng.random_range(-10.0..10.0)).collect())
                .collect(),
        )
        .unwrap();
        check(&random);
    }

    #[test]
    fn test_small_and_invalid() {
        let two = Array2DRowRealMatrix::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        let t = HessenbergTransformer::new(&two).unwrap();
        assert_eq!(t.get_h(), &two);
        assert_eq!(t.get_p(), &create_real_identity_matrix(2));
        assert!(std::ptr::eq(t.get_h(), t.get_h()));
        assert!(HessenbergTransformer::new(&Array2DRowRealMatrix::new(3, 2)).is_err());
    }
}
