//! Negotiation and Queue Benchmarks
//!
//! Format negotiation runs once per attach; the queue and PCM conversion
//! sit on the per-buffer path.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use stream_encoder::{
    audio::{convert, negotiate, AudioFormat, ChannelLayout, CodecCapabilities, SampleFormat},
    queue::Queue,
};

const BUFFER_FRAMES: &[usize] = &[256, 1024, 4096];

fn bench_negotiate(c: &mut Criterion) {
    let caps = CodecCapabilities {
        sample_formats: Some(vec![SampleFormat::S16, SampleFormat::S32, SampleFormat::Flt, SampleFormat::FltP]),
        sample_rates: Some(vec![8000, 11025, 16000, 22050, 32000, 44100, 48000, 88200, 96000]),
        channel_layouts: Some(vec![ChannelLayout::MONO, ChannelLayout::STEREO, ChannelLayout::LAYOUT_5_1]),
    };
    let exact = AudioFormat::new(48000, SampleFormat::Flt, ChannelLayout::STEREO);
    let inexact = AudioFormat::new(47000, SampleFormat::Dbl, ChannelLayout::LAYOUT_7_1);

    c.bench_function("negotiate_exact", |b| b.iter(|| negotiate(black_box(&caps), black_box(&exact))));
    c.bench_function("negotiate_closest", |b| b.iter(|| negotiate(black_box(&caps), black_box(&inexact))));
}

fn bench_queue(c: &mut Criterion) {
    let mut group = c.benchmark_group("queue");

    group.bench_function("put_get", |b| {
        let queue = Queue::new();
        b.iter(|| {
            queue.put(black_box(1u64));
            black_box(queue.get(false))
        })
    });

    group.bench_function("purge_half_of_64", |b| {
        let queue = Queue::new();
        b.iter(|| {
            for i in 0..64u64 {
                queue.put(i);
            }
            black_box(queue.purge(|i| i % 2 == 0));
            queue.flush()
        })
    });

    group.finish();
}

fn bench_convert(c: &mut Criterion) {
    let mut group = c.benchmark_group("convert");

    for &frames in BUFFER_FRAMES {
        let format = AudioFormat::new(48000, SampleFormat::S16, ChannelLayout::STEREO);
        let samples: Vec<f32> = (0..frames * 2).map(|i| (i as f32 * 0.01).sin()).collect();
        group.throughput(Throughput::Elements(frames as u64));

        group.bench_with_input(BenchmarkId::new("encode_s16", frames), &frames, |b, _| {
            b.iter(|| black_box(convert::encode_interleaved(&samples, &format)))
        });

        let bytes = convert::encode_interleaved(&samples, &format);
        group.bench_with_input(BenchmarkId::new("decode_s16", frames), &frames, |b, _| {
            b.iter(|| black_box(convert::decode_interleaved(&bytes, &format)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_negotiate, bench_queue, bench_convert);
criterion_main!(benches);
