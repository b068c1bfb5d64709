use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rug::Integer;
use vanityprime::primality::{mr_screened_test, MillerRabin};
use vanityprime::search::PrimeSearch;

fn bench_mr_screened_prime(c: &mut Criterion) {
    // 2^127 - 1 (Mersenne prime)
    let prime = (Integer::from(1u32) << 127u32) - 1u32;
    c.bench_function("mr_screened_test(M127, 20)", |b| {
        b.iter(|| mr_screened_test(black_box(&prime), black_box(20)));
    });
}

fn bench_mr_screened_composite(c: &mut Criterion) {
    // 71 * 881: survives the sieve, fails Miller-Rabin
    let composite = Integer::from(62551u32);
    c.bench_function("mr_screened_test(62551, 20)", |b| {
        b.iter(|| mr_screened_test(black_box(&composite), black_box(20)));
    });
}

fn bench_search_512(c: &mut Criterion) {
    let mut seed = 0u64;
    c.bench_function("PrimeSearch 512-bit", |b| {
        b.iter(|| {
            seed += 1;
            PrimeSearch::new(StdRng::seed_from_u64(seed), MillerRabin::default(), 512)
                .unwrap()
                .run()
                .unwrap()
        });
    });
}

fn bench_search_1024(c: &mut Criterion) {
    let mut group = c.benchmark_group("search");
    group.sample_size(10);
    let mut seed = 0u64;
    group.bench_function("PrimeSearch 1024-bit", |b| {
        b.iter(|| {
            seed += 1;
            PrimeSearch::new(StdRng::seed_from_u64(seed), MillerRabin::default(), 1024)
                .unwrap()
                .run()
                .unwrap()
        });
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_mr_screened_prime,
    bench_mr_screened_composite,
    bench_search_512,
    bench_search_1024,
);
criterion_main!(benches);
