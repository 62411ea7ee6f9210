use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use rand::Rng;
use ragline::vector::VectorIndex;
use ragline::vector::similarity;

fn generate_test_vectors(count: usize, dimension: usize) -> Vec<Vec<f64>> {
    let mut vectors = Vec::with_capacity(count);
    for i in 0..count {
        let mut data = Vec::with_capacity(dimension);
        for j in 0..dimension {
            let value = ((i as f64 * 0.1 + j as f64 * 0.01).sin() * 0.5 + 0.5) * 2.0 - 1.0;
            data.push(value);
        }
        vectors.push(data);
    }
    vectors
}

fn random_query(dimension: usize) -> Vec<f64> {
    let mut rng = rand::rng();
    (0..dimension).map(|_| rng.random_range(-1.0..1.0)).collect()
}

fn bench_similarity(c: &mut Criterion) {
    let dimension = 384;
    let vectors = generate_test_vectors(101, dimension);
    let query = &vectors[0];
    let query_norm = similarity::l2_norm(query);
    let targets: Vec<(&Vec<f64>, f64)> = vectors[1..]
        .iter()
        .map(|v| (v, similarity::l2_norm(v)))
        .collect();

    c.bench_function("normalized_dot_384", |b| {
        b.iter(|| {
            for (target, norm) in &targets {
                let _ = black_box(similarity::normalized_dot(
                    black_box(query),
                    query_norm,
                    black_box(target),
                    *norm,
                ));
            }
        })
    });
}

fn bench_search(c: &mut Criterion) {
    let dimension = 384;
    let mut group = c.benchmark_group("exact_search");

    for count in [1_000, 10_000] {
        let query = random_query(dimension);
        let mut index = VectorIndex::new(dimension).unwrap();
        index
            .batch_insert(generate_test_vectors(count, dimension), None)
            .unwrap();

        group.bench_with_input(BenchmarkId::new("top5", count), &index, |b, index| {
            b.iter(|| black_box(index.search(black_box(&query), 5).unwrap()))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_similarity, bench_search);
criterion_main!(benches);
