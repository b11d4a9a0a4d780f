//! Real Schur form `A = P·T·Pᵗ` by Francis double shift QR on the Hessenberg
//! form. `T` is quasi upper triangular: 1×1 blocks hold real eigenvalues and
//! 2×2 blocks hold complex conjugate pairs.
use std::cell::OnceCell;

use log::{debug, warn};

use crate::decompositions::hessenberg_transformer::HessenbergTransformer;
use crate::linalg_error::{LinAlgError, Result};
use crate::matrices::array2d_real_matrix::Array2DRowRealMatrix;
use crate::matrices::real_matrix::RealMatrix;

/// QR sweeps allowed before a block deflates.
pub const MAX_ITERATIONS: usize = 100;

#[derive(Debug, Default)]
struct ShiftInfo {
    x: f64,
    y: f64,
    w: f64,
    /// accumulated exceptional shift
    ex_shift: f64,
}

#[derive(Debug)]
pub struct SchurTransformer {
    matrix_p: Vec<Vec<f64>>,
    matrix_t: Vec<Vec<f64>>,
    epsilon: f64,
    cached_p: OnceCell<Array2DRowRealMatrix>,
    cached_t: OnceCell<Array2DRowRealMatrix>,
    cached_pt: OnceCell<Array2DRowRealMatrix>,
}

impl SchurTransformer {
    pub fn new(matrix: &dyn RealMatrix) -> Result<Self> {
        Self::with_epsilon(matrix, f64::EPSILON / 2.0)
    }

    /// `epsilon` is the relative size under which a subdiagonal entry counts as zero.
    pub fn with_epsilon(matrix: &dyn RealMatrix, epsilon: f64) -> Result<Self> {
        let hessenberg = HessenbergTransformer::new(matrix)?;
        let mut transformer = SchurTransformer {
            matrix_t: hessenberg.get_h().data_ref().to_vec(),
            matrix_p: hessenberg.get_p().data_ref().to_vec(),
            epsilon,
            cached_p: OnceCell::new(),
            cached_t: OnceCell::new(),
            cached_pt: OnceCell::new(),
        };
        transformer.transform()?;
        Ok(transformer)
    }

    pub fn get_p(&self) -> &Array2DRowRealMatrix {
        self.cached_p
            .get_or_init(|| Array2DRowRealMatrix::from_rows_unchecked(self.matrix_p.clone()))
    }

    pub fn get_pt(&self) -> &Array2DRowRealMatrix {
        self.cached_pt.get_or_init(|| self.get_p().transpose_dense())
    }

    pub fn get_t(&self) -> &Array2DRowRealMatrix {
        self.cached_t
            .get_or_init(|| Array2DRowRealMatrix::from_rows_unchecked(self.matrix_t.clone()))
    }

    fn transform(&mut self) -> Result<()> {
        let n = self.matrix_t.len();
        let norm = self.norm();
        let mut shift = ShiftInfo::default();
        let mut iteration = 0;
        // rows 0..end are still active
        let mut end = n;
        while end > 0 {
            let iu = end - 1;
            let il = self.find_small_sub_diagonal_element(iu, norm);
            if il == iu {
                // one real root
                self.matrix_t[iu][iu] += shift.ex_shift;
                end -= 1;
                iteration = 0;
            } else if il + 1 == iu {
                self.deflate_pair(iu, shift.ex_shift);
                end -= 2;
                iteration = 0;
            } else {
                self.compute_shift(il, iu, iteration, &mut shift);
                iteration += 1;
                if iteration > MAX_ITERATIONS {
                    warn!(
                        "Schur: block [{}, {}] did not deflate within {} iterations",
                        il, iu, MAX_ITERATIONS
                    );
                    return Err(LinAlgError::ConvergenceFailed {
                        max_iterations: MAX_ITERATIONS,
                    });
                }
                let mut h_vec = [0.0; 3];
                let im = self.init_qr_step(il, iu, &shift, &mut h_vec);
                self.perform_double_qr_step(il, im, iu, &mut shift, h_vec);
            }
        }
        debug!("Schur: {}x{} matrix reduced, exceptional shift {}", n, n, shift.ex_shift);
        Ok(())
    }

    /// Two roots at rows `iu - 1` and `iu`; a real pair is rotated to upper
    /// triangular form, a complex pair is left as a 2×2 block.
    fn deflate_pair(&mut self, iu: usize, ex_shift: f64) {
        let n = self.matrix_t.len();
        let t = &mut self.matrix_t;
        let mut p = (t[iu - 1][iu - 1] - t[iu][iu]) / 2.0;
        let mut q = p * p + t[iu][iu - 1] * t[iu - 1][iu];
        t[iu][iu] += ex_shift;
        t[iu - 1][iu - 1] += ex_shift;
        if q < 0.0 {
            return;
        }
        let mut z = q.abs().sqrt();
        z = if p >= 0.0 { p + z } else { p - z };
        let x = t[iu][iu - 1];
        let s = x.abs() + z.abs();
        p = x / s;
        q = z / s;
        let r = (p * p + q * q).sqrt();
        p /= r;
        q /= r;

        for j in (iu - 1)..n {
            z = t[iu - 1][j];
            t[iu - 1][j] = q * z + p * t[iu][j];
            t[iu][j] = q * t[iu][j] - p * z;
        }
        for row in t.iter_mut().take(iu + 1) {
            z = row[iu - 1];
            row[iu - 1] = q * z + p * row[iu];
            row[iu] = q * row[iu] - p * z;
        }
        for row in self.matrix_p.iter_mut() {
            z = row[iu - 1];
            row[iu - 1] = q * z + p * row[iu];
            row[iu] = q * row[iu] - p * z;
        }
    }

    /// L1 norm of the Hessenberg part.
    fn norm(&self) -> f64 {
        self.matrix_t
            .iter()
            .enumerate()
            .map(|(i, row)| row[i.saturating_sub(1)..].iter().map(|x| x.abs()).sum::<f64>())
            .sum()
    }

    fn find_small_sub_diagonal_element(&self, start: usize, norm: f64) -> usize {
        let t = &self.matrix_t;
        let mut l = start;
        while l > 0 {
            let mut s = t[l - 1][l - 1].abs() + t[l][l].abs();
            if s == 0.0 {
                s = norm;
            }
            if t[l][l - 1].abs() <= self.epsilon * s {
                break;
            }
            l -= 1;
        }
        l
    }

    fn compute_shift(&mut self, l: usize, idx: usize, iteration: usize, shift: &mut ShiftInfo) {
        let t = &mut self.matrix_t;
        shift.x = t[idx][idx];
        shift.y = 0.0;
        shift.w = 0.0;
        if l < idx {
            shift.y = t[idx - 1][idx - 1];
            shift.w = t[idx][idx - 1] * t[idx - 1][idx];
        }

        // Wilkinson's ad hoc shift
        if iteration == 10 {
            shift.ex_shift += shift.x;
            for (i, row) in t.iter_mut().enumerate().take(idx + 1) {
                row[i] -= shift.x;
            }
            let s = t[idx][idx - 1].abs() + t[idx - 1][idx - 2].abs();
            shift.x = 0.75 * s;
            shift.y = 0.75 * s;
            shift.w = -0.4375 * s * s;
        }

        // MATLAB's ad hoc shift
        if iteration == 30 {
            let mut s = (shift.y - shift.x) / 2.0;
            s = s * s + shift.w;
            if s > 0.0 {
                s = s.sqrt();
                if shift.y < shift.x {
                    s = -s;
                }
                s = shift.x - shift.w / ((shift.y - shift.x) / 2.0 + s);
                for (i, row) in t.iter_mut().enumerate().take(idx + 1) {
                    row[i] -= s;
                }
                shift.ex_shift += s;
                shift.x = 0.964;
                shift.y = 0.964;
                shift.w = 0.964;
            }
        }
    }

    /// Looks for two consecutive small subdiagonal entries and fills the
    /// first Householder vector of the step.
    fn init_qr_step(&self, il: usize, iu: usize, shift: &ShiftInfo, h_vec: &mut [f64; 3]) -> usize {
        let t = &self.matrix_t;
        let mut im = iu - 2;
        loop {
            let z = t[im][im];
            let r = shift.x - z;
            let s = shift.y - z;
            h_vec[0] = (r * s - shift.w) / t[im + 1][im] + t[im][im + 1];
            h_vec[1] = t[im + 1][im + 1] - z - r - s;
            h_vec[2] = t[im + 2][im + 1];

            if im == il {
                break;
            }
            let lhs = t[im][im - 1].abs() * (h_vec[1].abs() + h_vec[2].abs());
            let rhs = h_vec[0].abs()
                * (t[im - 1][im - 1].abs() + z.abs() + t[im + 1][im + 1].abs());
            if lhs < self.epsilon * rhs {
                break;
            }
            im -= 1;
        }
        im
    }

    fn perform_double_qr_step(
        &mut self,
        il: usize,
        im: usize,
        iu: usize,
        shift: &mut ShiftInfo,
        h_vec: [f64; 3],
    ) {
        let n = self.matrix_t.len();
        let [mut p, mut q, mut r] = h_vec;
        let t = &mut self.matrix_t;
        let pm = &mut self.matrix_p;

        for k in im..iu {
            let notlast = k != iu - 1;
            if k != im {
                p = t[k][k - 1];
                q = t[k + 1][k - 1];
                r = if notlast { t[k + 2][k - 1] } else { 0.0 };
                shift.x = p.abs() + q.abs() + r.abs();
                if shift.x.abs() <= self.epsilon {
                    continue;
                }
                p /= shift.x;
                q /= shift.x;
                r /= shift.x;
            }
            let mut s = (p * p + q * q + r * r).sqrt();
            if p < 0.0 {
                s = -s;
            }
            if s == 0.0 {
                continue;
            }
            if k != im {
                t[k][k - 1] = -s * shift.x;
            } else if il != im {
                t[k][k - 1] = -t[k][k - 1];
            }
            p += s;
            shift.x = p / s;
            shift.y = q / s;
            let z = r / s;
            q /= p;
            r /= p;

            // rows
            for j in k..n {
                p = t[k][j] + q * t[k + 1][j];
                if notlast {
                    p += r * t[k + 2][j];
                    t[k + 2][j] -= p * z;
                }
                t[k][j] -= p * shift.x;
                t[k + 1][j] -= p * shift.y;
            }

            // columns
            for row in t.iter_mut().take(iu.min(k + 3) + 1) {
                p = shift.x * row[k] + shift.y * row[k + 1];
                if notlast {
                    p += z * row[k + 2];
                    row[k + 2] -= p * r;
                }
                row[k] -= p;
                row[k + 1] -= p * q;
            }

            // accumulate
            for row in pm.iter_mut() {
                p = shift.x * row[k] + shift.y * row[k + 1];
                if notlast {
                    p += z * row[k + 2];
                    row[k + 2] -= p * r;
                }
                row[k] -= p;
                row[k + 1] -= p * q;
            }
        }

        // round-off pollution below the subdiagonal
        for i in (im + 2)..=iu {
            t[i][i - 2] = 0.0;
            if i > im + 2 {
                t[i][i - 3] = 0.0;
            }
        }
    }
}
