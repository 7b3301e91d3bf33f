// ABOUTME: Benchmark suite over frame encode/decode at a range of payload sizes
// ABOUTME: Grounded on the teacher's benches/smpp_benchmarks.rs group/BenchmarkId layout

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use netcore::frame;
use std::time::Duration;

const MAX_MESSAGE_SIZE: usize = 64 * 1024;

fn bench_stream_write_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("stream_write_frame");
    group.measurement_time(Duration::from_secs(10));

    for &size in &[0usize, 64, 1024, 16 * 1024] {
        let payload = vec![0xABu8; size];
        group.bench_with_input(BenchmarkId::new("payload_len", size), &payload, |b, payload| {
            b.iter(|| {
                let rt = tokio::runtime::Runtime::new().unwrap();
                rt.block_on(async {
                    let mut out = Vec::new();
                    frame::write_frame(&mut out, black_box(payload), MAX_MESSAGE_SIZE)
                        .await
                        .unwrap();
                    out
                })
            })
        });
    }

    group.finish();
}

fn bench_stream_read_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("stream_read_frame");
    group.measurement_time(Duration::from_secs(10));
    let rt = tokio::runtime::Runtime::new().unwrap();

    for &size in &[0usize, 64, 1024, 16 * 1024] {
        let payload = vec![0xCDu8; size];
        let encoded = rt.block_on(async {
            let mut out = Vec::new();
            frame::write_frame(&mut out, &payload, MAX_MESSAGE_SIZE).await.unwrap();
            out
        });

        group.bench_with_input(BenchmarkId::new("payload_len", size), &encoded, |b, encoded| {
            b.iter(|| {
                rt.block_on(async {
                    let mut cursor = std::io::Cursor::new(black_box(encoded.as_slice()));
                    frame::read_frame(&mut cursor, MAX_MESSAGE_SIZE).await.unwrap()
                })
            })
        });
    }

    group.finish();
}

fn bench_datagram_round_trip(c: &mut Criterion) {
    let mut group = c.benchmark_group("datagram_round_trip");
    group.measurement_time(Duration::from_secs(10));

    for &size in &[0usize, 64, 1024, 16 * 1024] {
        let payload = vec![0xEFu8; size];
        group.bench_with_input(BenchmarkId::new("payload_len", size), &payload, |b, payload| {
            b.iter(|| {
                let encoded = frame::encode_datagram(black_box(payload), MAX_MESSAGE_SIZE).unwrap();
                frame::decode_datagram(&encoded, MAX_MESSAGE_SIZE).unwrap().to_vec()
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_stream_write_frame,
    bench_stream_read_frame,
    bench_datagram_round_trip
);
criterion_main!(benches);
