use criterion::{Criterion, black_box, criterion_group, criterion_main};
use nimbus_core::{Aabb, EntityType, Vec2};
use nimbus_spatial::{MaintenanceMode, QuadtreeConfig, SpatialIndex, SpatialIndexConfig};

const ENTITIES: usize = 5_000;

fn scattered_bounds() -> Vec<Aabb> {
    // Deterministic low-discrepancy scatter so runs are comparable.
    (0..ENTITIES)
        .map(|i| {
            let x = (i as f32 * 0.618_034).fract() * 4000.0;
            let y = (i as f32 * 0.754_877).fract() * 4000.0;
            Aabb::new(x, y, 16.0, 16.0)
        })
        .collect()
}

fn build_index(bounds: &[Aabb]) -> SpatialIndex<usize> {
    let mut index = SpatialIndex::new(SpatialIndexConfig {
        tree: QuadtreeConfig {
            bounds: Aabb::new(0.0, 0.0, 4000.0, 4000.0),
            max_objects: 10,
            max_depth: 8,
        },
        maintenance: MaintenanceMode::Periodic { interval: 0.25 },
    })
    .unwrap();
    for (i, b) in bounds.iter().enumerate() {
        index.register(i, *b, EntityType::Enemy);
    }
    index
}

fn bench_range_query(c: &mut Criterion) {
    let bounds = scattered_bounds();
    let index = build_index(&bounds);
    let query = Aabb::new(1800.0, 1800.0, 400.0, 400.0);
    c.bench_function("quadtree_range_query", |bencher| {
        bencher.iter(|| black_box(index.query_range(black_box(&query))))
    });
}

fn bench_range_brute_force(c: &mut Criterion) {
    let bounds = scattered_bounds();
    let query = Aabb::new(1800.0, 1800.0, 400.0, 400.0);
    c.bench_function("brute_force_range_query", |bencher| {
        bencher.iter(|| {
            black_box(
                bounds
                    .iter()
                    .enumerate()
                    .filter(|(_, b)| b.intersects(black_box(&query)))
                    .map(|(i, _)| i)
                    .collect::<Vec<_>>(),
            )
        })
    });
}

fn bench_radius_query(c: &mut Criterion) {
    let bounds = scattered_bounds();
    let index = build_index(&bounds);
    let center = Vec2::new(2000.0, 2000.0);
    c.bench_function("quadtree_radius_query", |bencher| {
        bencher.iter(|| black_box(index.query_radius(black_box(center), 250.0)))
    });
}

fn bench_nearest(c: &mut Criterion) {
    let bounds = scattered_bounds();
    let index = build_index(&bounds);
    let center = Vec2::new(1234.0, 2345.0);
    c.bench_function("quadtree_nearest", |bencher| {
        bencher.iter(|| black_box(index.query_nearest(black_box(center), 300.0, None)))
    });
}

fn bench_full_rebuild(c: &mut Criterion) {
    let bounds = scattered_bounds();
    let mut index = build_index(&bounds);
    c.bench_function("spatial_index_rebuild_5k", |bencher| {
        bencher.iter(|| index.rebuild())
    });
}

criterion_group!(
    benches,
    bench_range_query,
    bench_range_brute_force,
    bench_radius_query,
    bench_nearest,
    bench_full_rebuild
);
criterion_main!(benches);
