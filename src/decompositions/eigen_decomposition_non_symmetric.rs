//! Eigen decomposition of a general real square matrix.
//!
//! Eigenvalues come from the real Schur form and may be complex; complex
//! conjugate pairs are adjacent, positive imaginary part first. `V` and `D`
//! are real: a pair `a ± bi` shows up in `D` as the 2×2 block
//! `[[a, b], [-b, a]]` and in `V` as the real and imaginary parts of its
//! eigenvector, so that `A·V = V·D`.
use std::cell::OnceCell;

use log::debug;
use num_complex::Complex;

use crate::decompositions::schur_transformer::SchurTransformer;
use crate::linalg_error::{LinAlgError, Result};
use crate::matrices::array2d_real_matrix::Array2DRowRealMatrix;
use crate::matrices::field::Field;
use crate::matrices::field_vector::ArrayFieldVector;
use crate::matrices::matrix_utils::inverse;
use crate::matrices::real_matrix::RealMatrix;

pub const DEFAULT_EPSILON: f64 = 1e-12;
const PRECISION_EPSILON: f64 = f64::EPSILON / 2.0;

#[derive(Debug)]
pub struct EigenDecompositionNonSymmetric {
    epsilon: f64,
    eigenvalues: Vec<Complex<f64>>,
    eigenvectors: Vec<ArrayFieldVector<Complex<f64>>>,
    cached_v: OnceCell<Array2DRowRealMatrix>,
    cached_d: OnceCell<Array2DRowRealMatrix>,
    cached_v_inv: OnceCell<Array2DRowRealMatrix>,
}

/// `x` compared with zero under tolerance `eps`: -1, 0 or 1.
fn sign_within(x: f64, eps: f64) -> i8 {
    if x.abs() <= eps {
        0
    } else if x < 0.0 {
        -1
    } else {
        1
    }
}

impl EigenDecompositionNonSymmetric {
    pub fn new(matrix: &dyn RealMatrix) -> Result<Self> {
        Self::with_epsilon(matrix, DEFAULT_EPSILON)
    }

    pub fn with_epsilon(matrix: &dyn RealMatrix, epsilon: f64) -> Result<Self> {
        let schur = SchurTransformer::with_epsilon(matrix, epsilon)?;
        let eigenvalues = eigenvalues_from_schur(schur.get_t().data_ref(), matrix.get_norm1(), epsilon);
        debug!("non-symmetric eigen: eigenvalues {:?}", eigenvalues);
        let eigenvectors = eigenvectors_from_schur(&schur, &eigenvalues, epsilon)?;
        Ok(EigenDecompositionNonSymmetric {
            epsilon,
            eigenvalues,
            eigenvectors,
            cached_v: OnceCell::new(),
            cached_d: OnceCell::new(),
            cached_v_inv: OnceCell::new(),
        })
    }

    /// Real eigenvector matrix; for a conjugate pair the two columns hold the
    /// real and imaginary parts of the first eigenvector.
    pub fn get_v(&self) -> &Array2DRowRealMatrix {
        self.cached_v.get_or_init(|| {
            let m = self.eigenvectors.len();
            let mut v = Array2DRowRealMatrix::new(m, m);
            for (k, (ek, lambda)) in self.eigenvectors.iter().zip(&self.eigenvalues).enumerate() {
                for (l, row) in v.data_mut().iter_mut().enumerate() {
                    let entry = ek.data_ref()[l];
                    row[k] = if lambda.im >= 0.0 { entry.re } else { -entry.im };
                }
            }
            v
        })
    }

    /// Block diagonal eigenvalue matrix.
    pub fn get_d(&self) -> &Array2DRowRealMatrix {
        self.cached_d.get_or_init(|| {
            let m = self.eigenvalues.len();
            let mut d = Array2DRowRealMatrix::new(m, m);
            let data = d.data_mut();
            for (i, lambda) in self.eigenvalues.iter().enumerate() {
                data[i][i] = lambda.re;
                match sign_within(lambda.im, self.epsilon) {
                    1 => data[i][i + 1] = lambda.im,
                    -1 => data[i][i - 1] = lambda.im,
                    _ => {}
                }
            }
            d
        })
    }

    /// Inverse of `V`; fails when `V` is numerically singular.
    pub fn get_v_inv(&self) -> Result<&Array2DRowRealMatrix> {
        if let Some(v_inv) = self.cached_v_inv.get() {
            return Ok(v_inv);
        }
        let v_inv = inverse(self.get_v(), self.epsilon)?;
        Ok(self.cached_v_inv.get_or_init(|| v_inv))
    }

    pub fn get_epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn get_eigenvalues(&self) -> &[Complex<f64>] {
        &self.eigenvalues
    }

    /// Eigenvalue `i`; panics when `i` is not below the dimension.
    pub fn get_eigenvalue(&self, i: usize) -> Complex<f64> {
        self.eigenvalues[i]
    }

    /// Eigenvector `i`; panics when `i` is not below the dimension.
    pub fn get_eigenvector(&self, i: usize) -> &ArrayFieldVector<Complex<f64>> {
        &self.eigenvectors[i]
    }

    pub fn get_determinant(&self) -> Complex<f64> {
        self.eigenvalues
            .iter()
            .fold(Complex::new(1.0, 0.0), |det, lambda| det * lambda)
    }
}

/// Reads eigenvalues off the 1×1 and 2×2 diagonal blocks of `T`.
pub(crate) fn eigenvalues_from_schur(t: &[Vec<f64>], norm: f64, epsilon: f64) -> Vec<Complex<f64>> {
    let n = t.len();
    let mut eigenvalues = Vec::with_capacity(n);
    let mut i = 0;
    while i < n {
        if i == n - 1 || t[i + 1][i].abs() <= norm * epsilon {
            eigenvalues.push(Complex::new(t[i][i], 0.0));
            i += 1;
        } else {
            let x = t[i + 1][i + 1];
            let p = 0.5 * (t[i][i] - x);
            let z = (p * p + t[i + 1][i] * t[i][i + 1]).abs().sqrt();
            eigenvalues.push(Complex::new(x + p, z));
            eigenvalues.push(Complex::new(x + p, -z));
            i += 2;
        }
    }
    eigenvalues
}

fn cdiv(xr: f64, xi: f64, yr: f64, yi: f64) -> Complex<f64> {
    Complex::new(xr, xi) / Complex::new(yr, yi)
}

/// Back substitution on the quasi triangular `T`, then back transformation by `P`.
fn eigenvectors_from_schur(
    schur: &SchurTransformer,
    eigenvalues: &[Complex<f64>],
    epsilon: f64,
) -> Result<Vec<ArrayFieldVector<Complex<f64>>>> {
    let mut t = schur.get_t().data_ref().to_vec();
    let mut p_mat = schur.get_p().data_ref().to_vec();
    let n = t.len();

    let norm: f64 = t
        .iter()
        .enumerate()
        .map(|(i, row)| row[i.saturating_sub(1)..].iter().map(|x| x.abs()).sum::<f64>())
        .sum();
    if norm == 0.0 {
        return Err(LinAlgError::ZeroNorm);
    }

    let mut r = 0.0;
    let mut s = 0.0;
    let mut z = 0.0;

    for idx in (0..n).rev() {
        let p = eigenvalues[idx].re;
        let q = eigenvalues[idx].im;

        if q == 0.0 {
            // real vector
            let mut l = idx;
            t[idx][idx] = 1.0;
            for i in (0..idx).rev() {
                let w = t[i][i] - p;
                r = (l..=idx).map(|j| t[i][j] * t[j][idx]).sum();
                if sign_within(eigenvalues[i].im, epsilon) < 0 {
                    z = w;
                    s = r;
                    continue;
                }
                l = i;
                if eigenvalues[i].im == 0.0 {
                    t[i][idx] = if w != 0.0 {
                        -r / w
                    } else {
                        -r / (PRECISION_EPSILON * norm)
                    };
                } else {
                    // real 2×2 equations
                    let x = t[i][i + 1];
                    let y = t[i + 1][i];
                    let re = eigenvalues[i].re - p;
                    let denom = re * re + eigenvalues[i].im * eigenvalues[i].im;
                    let t_i = (x * s - z * r) / denom;
                    t[i][idx] = t_i;
                    t[i + 1][idx] = if x.abs() > z.abs() {
                        (-r - w * t_i) / x
                    } else {
                        (-s - y * t_i) / z
                    };
                }

                // overflow control
                let scale = t[i][idx].abs();
                if (PRECISION_EPSILON * scale) * scale > 1.0 {
                    for row in t.iter_mut().take(idx + 1).skip(i) {
                        row[idx] /= scale;
                    }
                }
            }
        } else if q < 0.0 {
            // complex vector, stored in columns idx - 1 and idx
            let mut l = idx - 1;
            if t[idx][idx - 1].abs() > t[idx - 1][idx].abs() {
                t[idx - 1][idx - 1] = q / t[idx][idx - 1];
                t[idx - 1][idx] = -(t[idx][idx] - p) / t[idx][idx - 1];
            } else {
                let result = cdiv(0.0, -t[idx - 1][idx], t[idx - 1][idx - 1] - p, q);
                t[idx - 1][idx - 1] = result.re;
                t[idx - 1][idx] = result.im;
            }
            t[idx][idx - 1] = 0.0;
            t[idx][idx] = 1.0;

            for i in (0..idx - 1).rev() {
                let mut ra = 0.0;
                let mut sa = 0.0;
                for j in l..=idx {
                    ra += t[i][j] * t[j][idx - 1];
                    sa += t[i][j] * t[j][idx];
                }
                let w = t[i][i] - p;

                if sign_within(eigenvalues[i].im, epsilon) < 0 {
                    z = w;
                    r = ra;
                    s = sa;
                    continue;
                }
                l = i;
                if eigenvalues[i].im == 0.0 {
                    let c = cdiv(-ra, -sa, w, q);
                    t[i][idx - 1] = c.re;
                    t[i][idx] = c.im;
                } else {
                    // complex 2×2 equations
                    let x = t[i][i + 1];
                    let y = t[i + 1][i];
                    let re = eigenvalues[i].re - p;
                    let mut vr = re * re + eigenvalues[i].im * eigenvalues[i].im - q * q;
                    let vi = re * 2.0 * q;
                    if vr == 0.0 && vi == 0.0 {
                        vr = PRECISION_EPSILON
                            * norm
                            * (w.abs() + q.abs() + x.abs() + y.abs() + z.abs());
                    }
                    let c = cdiv(x * r - z * ra + q * sa, x * s - z * sa - q * ra, vr, vi);
                    t[i][idx - 1] = c.re;
                    t[i][idx] = c.im;

                    if x.abs() > z.abs() + q.abs() {
                        t[i + 1][idx - 1] = (-ra - w * t[i][idx - 1] + q * t[i][idx]) / x;
                        t[i + 1][idx] = (-sa - w * t[i][idx] - q * t[i][idx - 1]) / x;
                    } else {
                        let c2 = cdiv(-r - y * t[i][idx - 1], -s - y * t[i][idx], z, q);
                        t[i + 1][idx - 1] = c2.re;
                        t[i + 1][idx] = c2.im;
                    }
                }

                // overflow control
                let scale = t[i][idx - 1].abs().max(t[i][idx].abs());
                if (PRECISION_EPSILON * scale) * scale > 1.0 {
                    for row in t.iter_mut().take(idx + 1).skip(i) {
                        row[idx - 1] /= scale;
                        row[idx] /= scale;
                    }
                }
            }
        }
    }

    // P·T, column by column from the right so unread columns stay intact
    for j in (0..n).rev() {
        for row in p_mat.iter_mut() {
            let value: f64 = (0..=j).map(|k| row[k] * t[k][j]).sum();
            row[j] = value;
        }
    }

    let field = Field::<Complex<f64>>::new();
    let eigenvectors = (0..n)
        .map(|i| {
            let data = p_mat
                .iter()
                .map(|row| match sign_within(eigenvalues[i].im, epsilon) {
                    1 => Complex::new(row[i], row[i + 1]),
                    -1 => Complex::new(row[i - 1], -row[i]),
                    _ => Complex::new(row[i], 0.0),
                })
                .collect();
            ArrayFieldVector::with_field(field, data)
        })
        .collect();
    Ok(eigenvectors)
}
