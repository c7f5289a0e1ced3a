//! Resolution and compilation benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ioc_graph::{Arguments, Container, TypeManifest, TypeRegistry};

struct Layer {
    depth: usize,
}

/// `Layer{n}` depends on `Layer{n-1}` and `Layer{n-2}`; `Layer0` and `Layer1` are leaves.
fn layered_registry(depth: usize) -> TypeRegistry {
    let mut registry = TypeRegistry::new();
    for level in 0..depth {
        let mut manifest = TypeManifest::class(format!("Layer{level}"));
        if level >= 2 {
            manifest = manifest
                .param("near", format!("Layer{}", level - 1))
                .param("far", format!("Layer{}", level - 2));
        }
        let manifest = manifest.constructor(move |args: &Arguments| {
            let below = match args.get::<Layer>("near") {
                Ok(near) => near.depth + 1,
                Err(_) => 0,
            };
            Ok(Layer { depth: below.max(level) })
        });
        registry.register(manifest).unwrap();
    }
    registry
}

/// Fresh container: resolution plus compilation
fn bench_cold_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("cold_get");

    for depth in [4_usize, 16, 64].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(depth), depth, |b, &depth| {
            let top = format!("Layer{}", depth - 1);
            b.iter(|| {
                let mut container = Container::new(layered_registry(depth));
                black_box(container.get::<Layer>(&top).unwrap().depth)
            });
        });
    }

    group.finish();
}

/// Rebuild after a soft reset, reusing memoized maps
fn bench_memoized_rebuild(c: &mut Criterion) {
    let mut group = c.benchmark_group("memoized_rebuild");

    for depth in [4_usize, 16, 64].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(depth), depth, |b, &depth| {
            let top = format!("Layer{}", depth - 1);
            let mut container = Container::new(layered_registry(depth));
            container.get_instance(&top).unwrap();
            b.iter(|| {
                container.soft_reset();
                black_box(container.get_instance(&top).unwrap())
            });
        });
    }

    group.finish();
}

/// Cache hit
fn bench_cached_get(c: &mut Criterion) {
    let mut container = Container::new(layered_registry(16));
    container.get_instance("Layer15").unwrap();

    c.bench_function("cached_get", |b| {
        b.iter(|| black_box(container.get::<Layer>("Layer15").unwrap().depth))
    });
}

criterion_group!(benches, bench_cold_get, bench_memoized_rebuild, bench_cached_get);
criterion_main!(benches);
