use std::time::Duration;

use criterion::{criterion_group, criterion_main, Criterion};
use treefmm::fmm::{chebyshev::ChebyshevExpansions, kernel::Multiquadric};
use treefmm::traits::fmm::Fmm;
use treefmm::tree::helpers::points_fixture;
use treefmm::{FmmBuilder, Octree};

fn multiquadric_potentials(c: &mut Criterion) {
    let _ = env_logger::builder().is_test(true).try_init();

    let n_points = 100_000;
    let order = Some(4);
    let n_crit = Some(20);

    let mut points_2d = points_fixture::<f64, 2>(n_points, None, None, Some(0));
    let mut fmm_2d = FmmBuilder::<Octree<f64, 2>, _, 2>::new()
        .particles(&mut points_2d, None, n_crit)
        .unwrap()
        .parameters(
            ChebyshevExpansions::new(Multiquadric::new(0.01), order).unwrap(),
            None,
        )
        .unwrap()
        .build()
        .unwrap();

    let mut points_3d = points_fixture::<f64, 3>(n_points, None, None, Some(0));
    let mut fmm_3d = FmmBuilder::<Octree<f64, 3>, _, 3>::new()
        .particles(&mut points_3d, None, n_crit)
        .unwrap()
        .parameters(
            ChebyshevExpansions::new(Multiquadric::new(0.01), order).unwrap(),
            None,
        )
        .unwrap()
        .build()
        .unwrap();

    let sources = vec![1.0; n_points];

    let mut group = c.benchmark_group("Multiquadric Potentials");
    group
        .sample_size(10)
        .measurement_time(Duration::from_secs(15));

    group.bench_function(format!("D=2, N={n_points}"), |b| {
        b.iter(|| fmm_2d.gemv(&sources).unwrap())
    });

    group.bench_function(format!("D=3, N={n_points}"), |b| {
        b.iter(|| fmm_3d.gemv(&sources).unwrap())
    });
}

criterion_group!(fmms, multiquadric_potentials);
criterion_main!(fmms);
