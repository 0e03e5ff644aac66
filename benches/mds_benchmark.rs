use classical_mds::{ClassicalMds, ClassicalMdsConfig, DissimilarityMatrix};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ndarray::{Array, Array2};
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;

// Squared Euclidean distances between random points in `dim` dimensions.
fn generate_dissimilarities(n_observations: usize, dim: usize) -> DissimilarityMatrix {
    let points: Array2<f64> = Array::random((n_observations, dim), Uniform::new(0., 10.));
    let d = Array2::from_shape_fn((n_observations, n_observations), |(i, j)| {
        if i == j {
            0.0
        } else {
            let diff = &points.row(i) - &points.row(j);
            diff.dot(&diff)
        }
    });
    DissimilarityMatrix::new(d).unwrap()
}

fn bench_classical_mds_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("ClassicalMds_fit");
    let mds = ClassicalMds::new(ClassicalMdsConfig::with_components(2));

    for &n_observations in [50, 200, 500].iter() {
        let d = generate_dissimilarities(n_observations, 10);
        group.throughput(Throughput::Elements((n_observations * n_observations) as u64));
        group.bench_with_input(BenchmarkId::new("fit", n_observations), &d, |b, d| {
            b.iter(|| mds.fit(d).unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_classical_mds_fit);
criterion_main!(benches);
