//! Orthogonal reduction of a symmetric matrix to tridiagonal form, `A = Q·T·Qᵗ`.
//!
//! Only the upper triangle of the input is read. Intended as the first stage
//! of the symmetric eigen decomposition.
use std::cell::OnceCell;

use crate::linalg_error::{LinAlgError, Result};
use crate::matrices::array2d_real_matrix::Array2DRowRealMatrix;
use crate::matrices::real_matrix::RealMatrix;

#[derive(Debug)]
pub struct TriDiagonalTransformer {
    householder_vectors: Vec<Vec<f64>>,
    main: Vec<f64>,
    secondary: Vec<f64>,
    cached_q: OnceCell<Array2DRowRealMatrix>,
    cached_qt: OnceCell<Array2DRowRealMatrix>,
    cached_t: OnceCell<Array2DRowRealMatrix>,
}

impl TriDiagonalTransformer {
    pub fn new(matrix: &dyn RealMatrix) -> Result<Self> {
        if !matrix.is_square() {
            return Err(LinAlgError::NonSquare {
                rows: matrix.row_dimension(),
                columns: matrix.column_dimension(),
            });
        }
        let m = matrix.row_dimension();
        let mut transformer = TriDiagonalTransformer {
            householder_vectors: matrix.get_data(),
            main: vec![0.0; m],
            secondary: vec![0.0; m.saturating_sub(1)],
            cached_q: OnceCell::new(),
            cached_qt: OnceCell::new(),
            cached_t: OnceCell::new(),
        };
        transformer.transform();
        Ok(transformer)
    }

    fn transform(&mut self) {
        let m = self.householder_vectors.len();
        if m == 0 {
            return;
        }
        let mut z = vec![0.0; m];
        for k in 0..(m - 1) {
            let (head, tail) = self.householder_vectors.split_at_mut(k + 1);
            let h_k = &mut head[k];
            self.main[k] = h_k[k];
            let x_norm_sqr: f64 = h_k[(k + 1)..m].iter().map(|c| c * c).sum();
            let a = if h_k[k + 1] > 0.0 {
                -x_norm_sqr.sqrt()
            } else {
                x_norm_sqr.sqrt()
            };
            self.secondary[k] = a;
            if a == 0.0 {
                continue;
            }

            h_k[k + 1] -= a;
            let beta = -1.0 / (a * h_k[k + 1]);

            // z = beta A v, reading only the upper triangle
            z[(k + 1)..m].fill(0.0);
            for i in (k + 1)..m {
                let h_i = &tail[i - k - 1];
                let h_ki = h_k[i];
                let mut z_i = h_i[i] * h_ki;
                for j in (i + 1)..m {
                    let h_ij = h_i[j];
                    z_i += h_ij * h_k[j];
                    z[j] += h_ij * h_ki;
                }
                z[i] = beta * (z[i] + z_i);
            }

            // gamma = beta vᵗ z / 2, then z -= gamma v
            let gamma = beta / 2.0 * ((k + 1)..m).map(|i| z[i] * h_k[i]).sum::<f64>();
            for i in (k + 1)..m {
                z[i] -= gamma * h_k[i];
            }

            // A -= v zᵗ + z vᵗ on the upper triangle
            for i in (k + 1)..m {
                let h_i = &mut tail[i - k - 1];
                for j in i..m {
                    h_i[j] -= h_k[i] * z[j] + z[i] * h_k[j];
                }
            }
        }
        self.main[m - 1] = self.householder_vectors[m - 1][m - 1];
    }

    pub fn get_q(&self) -> &Array2DRowRealMatrix {
        self.cached_q.get_or_init(|| self.get_qt().transpose_dense())
    }

    pub fn get_qt(&self) -> &Array2DRowRealMatrix {
        self.cached_qt.get_or_init(|| {
            let m = self.householder_vectors.len();
            let mut qt = Array2DRowRealMatrix::new(m, m);
            let qta = qt.data_mut();
            for k in (1..m).rev() {
                let h_k = &self.householder_vectors[k - 1];
                qta[k][k] = 1.0;
                if h_k[k] != 0.0 {
                    let inv = 1.0 / (self.secondary[k - 1] * h_k[k]);
                    let mut beta = 1.0 / self.secondary[k - 1];
                    qta[k][k] = 1.0 + beta * h_k[k];
                    for i in (k + 1)..m {
                        qta[k][i] = beta * h_k[i];
                    }
                    for j in (k + 1)..m {
                        beta = ((k + 1)..m).map(|i| qta[j][i] * h_k[i]).sum::<f64>() * inv;
                        qta[j][k] = beta * h_k[k];
                        for i in (k + 1)..m {
                            qta[j][i] += beta * h_k[i];
                        }
                    }
                }
            }
            if m > 0 {
                qta[0][0] = 1.0;
            }
            qt
        })
    }

    /// The tridiagonal matrix `T`.
    pub fn get_t(&self) -> &Array2DRowRealMatrix {
        self.cached_t.get_or_init(|| {
            let m = self.main.len();
            let mut t = Array2DRowRealMatrix::new(m, m);
            let ta = t.data_mut();
            for i in 0..m {
                ta[i][i] = self.main[i];
                if i > 0 {
                    ta[i][i - 1] = self.secondary[i - 1];
                }
                if i + 1 < m {
                    ta[i][i + 1] = self.secondary[i];
                }
            }
            t
        })
    }

    pub fn get_main_diagonal(&self) -> &[f64] {
        &self.main
    }

    pub fn get_secondary_diagonal(&self) -> &[f64] {
        &self.secondary
    }
}
