use charge_field_core::field::{FieldParams, LaneEvaluator, ScalarEvaluator};
use charge_field_core::{Preset, Xorshift64};
use charge_field_render::{render_scene, Kernel};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;

/// Random charges as `(q, x, y)` arrays.
fn charges(n: usize) -> (Vec<f32>, Vec<f32>, Vec<f32>) {
    let mut rng = Xorshift64::new(n as u64 + 1);
    let q = (0..n).map(|_| rng.next_sign() * 800.0).collect();
    let xs = (0..n).map(|_| rng.next_range(-1.0, 1.0)).collect();
    let ys = (0..n).map(|_| rng.next_range(-1.0, 1.0)).collect();
    (q, xs, ys)
}

/// Scalar vs lane kernel over a fixed image, varying the charge count.
fn bench_kernels(c: &mut Criterion) {
    let (width, height) = (256, 256);
    let counts = [4, 16, 64, 256];

    let mut group = c.benchmark_group("render_scene");

    for n in counts {
        let (q, xs, ys) = charges(n);
        let mut scratch = vec![0.0; n];
        let mut buffer = vec![0u8; width * height * 4];

        group.throughput(Throughput::Elements((width * height * n) as u64));

        let kernels = [
            Kernel::Scalar(ScalarEvaluator::new(FieldParams::RENDER)),
            Kernel::Lanes(LaneEvaluator::new(FieldParams::RENDER)),
        ];
        for kernel in kernels {
            group.bench_with_input(BenchmarkId::new(kernel.name(), n), &kernel, |b, kernel| {
                b.iter(|| {
                    render_scene(
                        width,
                        height,
                        black_box(&mut buffer),
                        black_box(&q),
                        &xs,
                        &ys,
                        &mut scratch,
                        0.0,
                        kernel,
                    )
                })
            });
        }
    }

    group.finish();
}

/// Grid overlay cost on top of a preset scene.
fn bench_grid(c: &mut Criterion) {
    let particles = Preset::Ring.particles(0);
    let q: Vec<f32> = particles.iter().map(|p| p.q).collect();
    let xs: Vec<f32> = particles.iter().map(|p| p.x).collect();
    let ys: Vec<f32> = particles.iter().map(|p| p.y).collect();
    let mut scratch = vec![0.0; q.len()];
    let (width, height) = (512, 512);
    let mut buffer = vec![0u8; width * height * 4];
    let kernel = Kernel::Lanes(LaneEvaluator::default());

    let mut group = c.benchmark_group("grid_overlay");
    for spacing in [0.0_f32, 0.5, 0.1] {
        group.bench_with_input(
            BenchmarkId::from_parameter(spacing),
            &spacing,
            |b, &spacing| {
                b.iter(|| {
                    render_scene(
                        width,
                        height,
                        &mut buffer,
                        &q,
                        &xs,
                        &ys,
                        &mut scratch,
                        black_box(spacing),
                        &kernel,
                    )
                })
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_kernels, bench_grid);
criterion_main!(benches);
