//! # Frame Preparation Benchmark
//!
//! REQUIREMENTS:
//! - Full 256 × 256 cell world, thousands of structures and objects
//! - `prepare_draw` well under a frame budget
//! - 0 allocations once the draw lists are warm
//!
//! Run with: `cargo bench --package ozone_render`

// Benchmarks don't need docs
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ozone_core::Vec3;
use ozone_matrix::{Frag, Object, Orbis, OrbisCollider, Struct};
use ozone_render::{Camera, DrawRecorder, HeadlessDevice, RenderConfig, RenderScheduler, RenderStats};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Deterministic world of the default size.
fn populated_world(structs: usize, objects: usize) -> Orbis {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let mut orbis = Orbis::new();
    let dim = orbis.dim() - 64.0;

    for _ in 0..structs {
        let mins = Vec3::new(rng.gen_range(-dim..dim), rng.gen_range(-dim..dim), rng.gen_range(-10.0..10.0));
        let size = Vec3::new(rng.gen_range(4.0..60.0), rng.gen_range(4.0..60.0), rng.gen_range(4.0..40.0));
        orbis.add_struct(Struct::new(mins, mins + size));
    }

    for i in 0..objects {
        let p = Vec3::new(rng.gen_range(-dim..dim), rng.gen_range(-dim..dim), rng.gen_range(0.0..20.0));
        let mut obj = Object::new(p, Vec3::new(0.5, 0.5, 1.0));
        if i % 16 == 0 {
            obj = obj.with_flags(Object::WIDE_CULL_BIT);
        }
        orbis.add_object(obj);
    }

    for _ in 0..objects / 4 {
        let p = Vec3::new(rng.gen_range(-dim..dim), rng.gen_range(-dim..dim), rng.gen_range(0.0..20.0));
        orbis.add_frag(Frag::new(p, Vec3::ZERO));
    }
    orbis
}

fn camera() -> Camera {
    let mut camera = Camera::new(1920, 1080);
    camera.p = Vec3::new(0.0, 0.0, 20.0);
    camera.set_orientation(0.7, -0.1);
    camera
}

/// Cull and sort only.
fn bench_prepare_draw(c: &mut Criterion) {
    let mut group = c.benchmark_group("prepare_draw");

    for objects in [10_000, 100_000] {
        let orbis = populated_world(4_000, objects);
        let mut scheduler = RenderScheduler::new(&RenderConfig::default());
        let mut camera = camera();
        let mut stats = RenderStats::default();

        group.bench_with_input(BenchmarkId::from_parameter(objects), &orbis, |b, orbis| {
            b.iter(|| {
                scheduler.prepare_draw(black_box(orbis), &OrbisCollider, &mut camera, &mut stats);
                scheduler.objects().len()
            });
        });
    }

    group.finish();
}

/// Cull, sort and issue every pass to a recording sink.
fn bench_full_frame(c: &mut Criterion) {
    let orbis = populated_world(4_000, 50_000);
    let mut scheduler = RenderScheduler::new(&RenderConfig::default());
    let mut camera = camera();
    let mut stats = RenderStats::default();
    let mut device = HeadlessDevice::new();
    let mut sink = DrawRecorder::new();

    c.bench_function("full_frame_50k_objects", |b| {
        b.iter(|| {
            scheduler.prepare_draw(black_box(&orbis), &OrbisCollider, &mut camera, &mut stats);
            scheduler.draw_geometry(&mut device, &mut sink, &mut stats);
            device.take_calls();
            sink.calls.clear();
        });
    });
}

/// Wide view distance versus a short one.
fn bench_view_distance(c: &mut Criterion) {
    let orbis = populated_world(4_000, 50_000);
    let mut group = c.benchmark_group("view_distance");

    for distance in [100.0_f32, 350.0, 1000.0] {
        let config = RenderConfig {
            distance,
            ..RenderConfig::default()
        };
        let mut scheduler = RenderScheduler::new(&config);
        let mut camera = camera();
        let mut stats = RenderStats::default();

        group.bench_with_input(BenchmarkId::from_parameter(distance), &distance, |b, _| {
            b.iter(|| {
                scheduler.prepare_draw(black_box(&orbis), &OrbisCollider, &mut camera, &mut stats);
                scheduler.structs().len()
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_prepare_draw, bench_full_frame, bench_view_distance);
criterion_main!(benches);
