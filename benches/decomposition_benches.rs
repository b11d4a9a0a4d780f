use criterion::{Criterion, criterion_group, criterion_main};
use rand::Rng;
use std::hint::black_box;

use RustedLinAlg::decompositions::decomposition_solver::DecompositionSolver;
use RustedLinAlg::decompositions::eigen_decomposition_symmetric::EigenDecompositionSymmetric;
use RustedLinAlg::decompositions::lu_decomposition::LUDecomposition;
use RustedLinAlg::decompositions::qr_decomposition::QRDecomposition;
use RustedLinAlg::iterative_solvers::conjugate_gradient::ConjugateGradient;
use RustedLinAlg::matrices::array2d_real_matrix::Array2DRowRealMatrix;
use RustedLinAlg::matrices::real_vector::ArrayRealVector;

/// random symmetric, diagonally dominant matrix
fn spd_matrix(n: usize) -> Array2DRowRealMatrix {
    let mut rng = rand::rng();
    let mut rows = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..i {
            let value: f64 = rng.random_range(-1.0..1.0);
            rows[i][j] = value;
            rows[j][i] = value;
        }
        rows[i][i] = n as f64;
    }
    Array2DRowRealMatrix::from_rows(rows).unwrap()
}

fn bench_lu(c: &mut Criterion) {
    let a = spd_matrix(100);
    let b = ArrayRealVector::filled(100, 1.0);
    c.bench_function("LU solve 100x100", |bench| {
        bench.iter(|| {
            let lu = LUDecomposition::new(black_box(&a)).unwrap();
            lu.get_solver().solve(&b).unwrap()
        })
    });
}

fn bench_qr(c: &mut Criterion) {
    let a = spd_matrix(100);
    let b = ArrayRealVector::filled(100, 1.0);
    c.bench_function("QR solve 100x100", |bench| {
        bench.iter(|| QRDecomposition::new(black_box(&a)).get_solver().solve(&b).unwrap())
    });
}

fn bench_symmetric_eigen(c: &mut Criterion) {
    let a = spd_matrix(50);
    c.bench_function("symmetric eigen 50x50", |bench| {
        bench.iter(|| EigenDecompositionSymmetric::new(black_box(&a)).unwrap())
    });
}

fn bench_conjugate_gradient(c: &mut Criterion) {
    let a = spd_matrix(200);
    let b = ArrayRealVector::filled(200, 1.0);
    c.bench_function("conjugate gradient 200x200", |bench| {
        bench.iter(|| {
            ConjugateGradient::new(1000, 1e-10, false)
                .solve(black_box(&a), &b)
                .unwrap()
        })
    });
}

criterion_group!(
    benches,
    bench_lu,
    bench_qr,
    bench_symmetric_eigen,
    bench_conjugate_gradient
);
criterion_main!(benches);
