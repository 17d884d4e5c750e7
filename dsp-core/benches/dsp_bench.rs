use criterion::{criterion_group, criterion_main, Criterion};
use spectral_dsp::{
    convolve, ConvolutionMethod, PitchShiftConfig, PitchShifter, SpectralTransform,
};

fn bench_transform(c: &mut Criterion) {
    let n = 2048;
    let mut transform = SpectralTransform::new(n).unwrap();
    let signal: Vec<f32> = (0..n).map(|i| (i as f32 * 0.173).sin()).collect();
    let mut re = vec![0.0; transform.num_bins()];
    let mut im = vec![0.0; transform.num_bins()];
    let mut restored = vec![0.0; n];

    c.bench_function("forward_2048", |b| {
        b.iter(|| transform.forward(&signal, &mut re, &mut im))
    });

    transform.forward(&signal, &mut re, &mut im);
    c.bench_function("inverse_2048", |b| {
        b.iter(|| transform.inverse(&re, &im, &mut restored))
    });
}

fn bench_convolution(c: &mut Criterion) {
    let signal: Vec<f32> = (0..48_000).map(|i| (i as f32 * 0.0371).sin()).collect();
    let kernel: Vec<f32> = (0..255).map(|i| ((i % 9) as f32 - 4.0) * 0.01).collect();

    c.bench_function("overlap_save_255tap_1s", |b| {
        b.iter(|| convolve(&signal, &kernel, ConvolutionMethod::OverlapSave).unwrap())
    });

    c.bench_function("overlap_add_255tap_1s", |b| {
        b.iter(|| convolve(&signal, &kernel, ConvolutionMethod::OverlapAdd).unwrap())
    });
}

fn bench_pitch_shift(c: &mut Criterion) {
    let signal: Vec<f32> = (0..16_384).map(|i| (i as f32 * 0.11).sin()).collect();
    let config = PitchShiftConfig {
        shift: 1.5,
        ..Default::default()
    };
    let mut shifter = PitchShifter::new(config).unwrap();

    c.bench_function("pitch_shift_16k", |b| b.iter(|| shifter.apply_to(&signal)));
}

criterion_group!(benches, bench_transform, bench_convolution, bench_pitch_shift);
criterion_main!(benches);
