use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use mic_spectrum::spectrum::fft::{transform_recursive, Direction, FftEngine};
use mic_spectrum::{PipelineConfig, SpectrumPipeline};

fn tone(len: usize) -> Vec<f32> {
    (0..len)
        .map(|n| (2.0 * std::f32::consts::PI * 440.0 * n as f32 / 22050.0).sin())
        .collect()
}

fn bench_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("tick");

    for fft_size in [1024, 4096] {
        let mut pipeline = SpectrumPipeline::new();
        pipeline
            .initialize(PipelineConfig {
                fft_size,
                ..PipelineConfig::default()
            })
            .unwrap();
        let block = tone(fft_size);

        group.bench_with_input(BenchmarkId::from_parameter(fft_size), &block, |b, block| {
            b.iter(|| pipeline.tick(black_box(block)).unwrap())
        });
    }

    group.finish();
}

fn bench_fft(c: &mut Criterion) {
    let mut group = c.benchmark_group("fft_4096");
    let signal = tone(4096);
    let zeros = vec![0.0; 4096];

    let engine = FftEngine::new(4096).unwrap();
    let mut re = signal.clone();
    let mut im = zeros.clone();
    group.bench_function("planned", |b| {
        b.iter(|| {
            re.copy_from_slice(&signal);
            im.fill(0.0);
            engine.transform(&mut re, &mut im, Direction::Forward).unwrap();
        })
    });

    group.bench_function("recursive", |b| {
        b.iter(|| transform_recursive(black_box(&signal), &zeros, Direction::Forward).unwrap())
    });

    group.finish();
}

criterion_group!(benches, bench_tick, bench_fft);
criterion_main!(benches);
