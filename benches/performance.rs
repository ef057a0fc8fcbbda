// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Performance benchmarks for SEQGEN
//!
//! Run with: cargo bench
//!
//! These benchmarks measure:
//! - Vocabulary and window construction
//! - Model training and prediction
//! - Generation throughput
//! - MIDI encoding and tokenization

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use seqgen::dataset::prediction_input;
use seqgen::{
    Corpus, CorpusLoader, EventEncoder, Generator, MarkovModel, ModelPort, Token,
    TrainingWindows, Vocabulary,
};

/// Deterministic corpus mixing notes and chords
fn synthetic_corpus(len: usize) -> Corpus {
    let mut rng = StdRng::seed_from_u64(0x2545_F491);
    let tokens = (0..len)
        .map(|_| {
            if rng.gen_bool(1.0 / 7.0) {
                let root: u8 = rng.gen_range(0..12);
                Token::chord([root, root + 4, root + 7])
            } else {
                Token::note(rng.gen_range(48..72))
            }
        })
        .collect();
    Corpus::from_tokens(tokens)
}

fn bench_windowing(c: &mut Criterion) {
    let mut group = c.benchmark_group("windowing");

    for size in [1_000, 10_000, 50_000].iter() {
        let corpus = synthetic_corpus(*size);
        group.bench_with_input(BenchmarkId::new("vocabulary", size), &corpus, |b, corpus| {
            b.iter(|| black_box(Vocabulary::build(corpus).unwrap().len()))
        });

        let vocab = Vocabulary::build(&corpus).unwrap();
        group.bench_with_input(BenchmarkId::new("windows", size), &corpus, |b, corpus| {
            b.iter(|| black_box(TrainingWindows::build(corpus, &vocab, 20).unwrap().len()))
        });
    }

    group.finish();
}

fn bench_model(c: &mut Criterion) {
    let corpus = synthetic_corpus(10_000);
    let vocab = Vocabulary::build(&corpus).unwrap();
    let windows = TrainingWindows::build(&corpus, &vocab, 20).unwrap();
    let inputs = windows.inputs();
    let targets = windows.one_hot_targets();

    c.bench_function("markov_train", |b| {
        b.iter(|| {
            let mut model = MarkovModel::default();
            model.train(&inputs, &targets, 1).unwrap();
            black_box(model.context_count())
        })
    });

    let mut model = MarkovModel::default();
    model.train(&inputs, &targets, 1).unwrap();
    let input = prediction_input(windows.windows()[0].iter(), vocab.len());

    c.bench_function("markov_predict", |b| {
        b.iter(|| black_box(model.predict(black_box(&input)).unwrap()))
    });
}

fn bench_generation(c: &mut Criterion) {
    let corpus = synthetic_corpus(10_000);
    let vocab = Vocabulary::build(&corpus).unwrap();
    let windows = TrainingWindows::build(&corpus, &vocab, 20).unwrap();
    let mut model = MarkovModel::default();
    model
        .train(&windows.inputs(), &windows.one_hot_targets(), 1)
        .unwrap();

    let mut group = c.benchmark_group("generation");
    for length in [100, 300, 1_000].iter() {
        group.bench_with_input(BenchmarkId::new("greedy", length), length, |b, &length| {
            b.iter(|| {
                let mut generator = Generator::seeded(&vocab, &windows, 7);
                black_box(generator.generate(&model, length).unwrap())
            })
        });
    }
    group.finish();
}

fn bench_encoding(c: &mut Criterion) {
    let tokens = synthetic_corpus(300).tokens().to_vec();
    let encoder = EventEncoder::default();

    c.bench_function("encode_300_tokens", |b| {
        b.iter(|| black_box(encoder.encode(black_box(&tokens)).unwrap()))
    });

    let bytes = encoder.encode(&tokens).unwrap();
    let loader = CorpusLoader::default();
    c.bench_function("tokenize_300_tokens", |b| {
        b.iter(|| black_box(loader.tokenize_bytes(black_box(&bytes)).unwrap()))
    });
}

criterion_group!(
    benches,
    bench_windowing,
    bench_model,
    bench_generation,
    bench_encoding
);

criterion_main!(benches);
