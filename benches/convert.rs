use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;

use fast_iconv::Converter;

fn sample_text() -> String {
    "The quick brown fox jumps over the lazy dog. Café, naïve, façade, 5€. "
        .repeat(256)
}

fn encode_sample(to: &str) -> Vec<u8> {
    Converter::new("UTF-8", to)
        .and_then(|mut converter| converter.convert_all(sample_text().as_bytes()))
        .unwrap_or_default()
}

/// Decode throughput of each source into UTF-8.
fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_to_utf8");

    for source in ["ISO-8859-15", "WINDOWS-1252", "UTF-16LE", "UTF-32BE", "UTF-7"] {
        let input = encode_sample(source);
        group.throughput(Throughput::Bytes(input.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(source), &input, |b, input| {
            let mut converter = Converter::new(source, "UTF-8").unwrap();
            let mut output = vec![0u8; input.len() * 4];
            b.iter(|| {
                converter.reset();
                black_box(converter.convert(black_box(input), &mut output))
            });
        });
    }

    group.finish();
}

/// Encode throughput from UTF-8 into each target.
fn bench_encode(c: &mut Criterion) {
    let input = sample_text().into_bytes();
    let mut group = c.benchmark_group("encode_from_utf8");
    group.throughput(Throughput::Bytes(input.len() as u64));

    for target in ["ISO-8859-15", "IBM037//TRANSLIT", "UTF-16", "UTF-7"] {
        group.bench_function(target, |b| {
            let mut converter = Converter::new("UTF-8", target).unwrap();
            let mut output = vec![0u8; input.len() * 8];
            b.iter(|| {
                converter.reset();
                black_box(converter.convert(black_box(&input), &mut output))
            });
        });
    }

    group.bench_function("US-ASCII//TRANSLIT", |b| {
        let mut converter = Converter::new("UTF-8", "US-ASCII//TRANSLIT").unwrap();
        let mut output = vec![0u8; input.len() * 2];
        b.iter(|| black_box(converter.convert(black_box(&input), &mut output)));
    });

    group.finish();
}

/// Streaming with small chunks against one-shot conversion.
fn bench_streaming(c: &mut Criterion) {
    let input = sample_text().into_bytes();
    let mut group = c.benchmark_group("streaming");
    group.throughput(Throughput::Bytes(input.len() as u64));

    group.bench_function("convert_all", |b| {
        b.iter(|| {
            let mut converter = Converter::new("UTF-8", "UTF-16LE").unwrap();
            black_box(converter.convert_all(black_box(&input)).unwrap())
        });
    });

    group.bench_function("chunks_of_7", |b| {
        b.iter(|| {
            let converter = Converter::new("UTF-8", "UTF-16LE").unwrap();
            let mut stream = fast_iconv::StreamingConverter::with_buffer_size(converter, 256);
            let mut total = 0;
            for chunk in input.chunks(7) {
                total += stream.process_chunk(chunk).unwrap().len();
            }
            total += stream.finish().unwrap().len();
            black_box(total)
        });
    });

    group.finish();
}

criterion_group!(benches, bench_decode, bench_encode, bench_streaming);
criterion_main!(benches);
