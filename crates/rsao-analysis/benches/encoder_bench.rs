//! Criterion benchmarks for rsao-analysis stages
//!
//! Run with: cargo bench -p rsao-analysis

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use rsao_analysis::{
    BFormat, Beamformer, Encoder, EncoderConfig, PeakDetector, PeakDetectorConfig,
    RoomDimensions, ScanMode, energy_decay_curve,
};

const SAMPLE_RATE: f64 = 48000.0;

/// Generate an exponentially decaying noise burst
fn generate_decay(size: usize, rt60_secs: f64) -> Vec<f64> {
    let k = 3.0 * std::f64::consts::LN_10 / (rt60_secs * SAMPLE_RATE);
    let mut state = 0x12345678u64;
    (0..size)
        .map(|i| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            let e = (state >> 11) as f64 / (1u64 << 53) as f64 - 0.5;
            e * (-k * i as f64).exp()
        })
        .collect()
}

/// Decaying noise on all four channels with a direct-sound impulse at 1000
fn generate_room(size: usize) -> BFormat {
    let channels = (0..4)
        .map(|c| {
            let mut channel = generate_decay(size, 0.6);
            channel[1000] = if c == 0 { 4.0 } else { 2.0 };
            channel
        })
        .collect();
    BFormat::from_channels(channels, SAMPLE_RATE).expect("valid channels")
}

fn bench_peak_detection(c: &mut Criterion) {
    let mut group = c.benchmark_group("PeakDetector");

    for &size in &[4800, 24000, 48000] {
        let signal = generate_decay(size, 0.6);
        for use_lpc in [false, true] {
            let detector = PeakDetector::new(
                SAMPLE_RATE,
                PeakDetectorConfig {
                    use_lpc,
                    ..Default::default()
                },
            );
            let id = if use_lpc { "whitened" } else { "raw" };
            group.bench_with_input(BenchmarkId::new(id, size), &signal, |b, signal| {
                b.iter(|| black_box(detector.detect(black_box(signal))));
            });
        }
    }

    group.finish();
}

fn bench_beamformer(c: &mut Criterion) {
    let room = generate_room(4800);
    let channels = room.channels().map(|ch| &ch[936..1064]);

    c.bench_function("Beamformer_full_scan_128", |b| {
        let beamformer = Beamformer::new(1.0, ScanMode::Full);
        b.iter(|| black_box(beamformer.steer(black_box(channels))));
    });
}

fn bench_energy_decay(c: &mut Criterion) {
    let signal = generate_decay(48000, 0.6);
    c.bench_function("EnergyDecayCurve_48000", |b| {
        b.iter(|| black_box(energy_decay_curve(black_box(&signal))));
    });
}

fn bench_encoder(c: &mut Criterion) {
    let mut group = c.benchmark_group("Encoder");
    group.sample_size(10);

    let room = generate_room(48000);
    let dims = RoomDimensions::new(8.0, 6.0, 3.0).expect("valid room");
    let encoder = Encoder::new(EncoderConfig {
        n_discrete: 10,
        ..Default::default()
    })
    .expect("valid config");

    group.bench_function("encode_1s", |b| {
        b.iter(|| black_box(encoder.encode(black_box(&room), Some(&dims))));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_peak_detection,
    bench_beamformer,
    bench_energy_decay,
    bench_encoder
);
criterion_main!(benches);
