use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use meshcloud::{sample, Mesh, SamplingConfig, Strategy};

fn benchmark_surface(c: &mut Criterion) {
    let mesh = Mesh::cube([0.0, 0.0, 0.0], 1.0);
    let mut group = c.benchmark_group("surface_sampling");
    for count in [1024, 16384, 65536] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter(|| black_box(sample(&mesh, SamplingConfig::new(count, 0, Strategy::Surface))))
        });
    }
    group.finish();
}

fn benchmark_volume(c: &mut Criterion) {
    let mut group = c.benchmark_group("volume_sampling");
    group.sample_size(10);
    for (name, mesh) in [
        ("cube", Mesh::cube([0.0, 0.0, 0.0], 1.0)),
        ("octahedron", Mesh::octahedron([0.0, 0.0, 0.0], 1.0)),
    ] {
        group.bench_function(name, |b| {
            b.iter(|| black_box(sample(&mesh, SamplingConfig::new(4096, 0, Strategy::Volume))))
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_surface, benchmark_volume);
criterion_main!(benches);
