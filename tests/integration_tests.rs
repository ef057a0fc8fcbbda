// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Integration tests for SEQGEN
//!
//! These tests drive the public API from MIDI files on disk through to a
//! written MIDI file.

use std::fs;
use std::path::{Path, PathBuf};

use ndarray::{Array1, Array2, Array3};
use seqgen::corpus::FileOutcome;
use seqgen::dataset::normalize;
use seqgen::{
    CancellationToken, Corpus, CorpusLoader, Decoding, EventEncoder, ModelPort, Pipeline,
    PipelineConfig, SeqGenError, Token, TrainingWindows, Vocabulary,
};
use tempfile::{tempdir, TempDir};

fn tokens(keys: &[&str]) -> Vec<Token> {
    keys.iter().map(|k| k.parse().unwrap()).collect()
}

/// Write a MIDI fixture holding one onset per token
fn write_fixture(dir: &Path, name: &str, keys: &[&str]) -> PathBuf {
    let path = dir.join(name);
    EventEncoder::default().write(&tokens(keys), &path).unwrap();
    path
}

fn config(window: usize, seed: u64) -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.sequence.length = window;
    config.generation.seed = Some(seed);
    config
}

fn arpeggio_corpus(dir: &TempDir) -> Vec<PathBuf> {
    vec![
        write_fixture(dir.path(), "a.mid", &["C4", "E4", "G4", "C4", "E4", "G4", "C4"]),
        write_fixture(dir.path(), "b.mid", &["E4", "G4", "C4", "E4", "0.4.7", "G4"]),
    ]
}

#[test]
fn test_full_pipeline_writes_midi() {
    let dir = tempdir().unwrap();
    let files = arpeggio_corpus(&dir);

    let mut pipeline = Pipeline::with_markov(config(3, 5));
    let report = pipeline.load_files(&files).unwrap();
    assert_eq!(report.loaded_count(), 2);
    assert_eq!(pipeline.corpus().len(), 13);

    let windows = pipeline.prepare().unwrap();
    assert_eq!(windows.len(), 10);

    pipeline.train().unwrap();
    let generated = pipeline.generate(16).unwrap().to_vec();
    assert_eq!(generated.len(), 16);

    let vocab = pipeline.vocabulary().unwrap();
    assert!(generated.iter().all(|t| vocab.index_of(t).is_some()));

    let out = dir.path().join("out").join("generated.mid");
    fs::create_dir_all(out.parent().unwrap()).unwrap();
    pipeline.save_midi(&out).unwrap();

    let bytes = fs::read(&out).unwrap();
    let smf = midly::Smf::parse(&bytes).unwrap();
    assert_eq!(smf.header.format, midly::Format::SingleTrack);
    assert_eq!(smf.tracks.len(), 1);

    let expected_notes: usize = generated
        .iter()
        .map(|t| match t {
            Token::Note(_) => 1,
            Token::Chord(pcs) => pcs.len(),
        })
        .sum();
    let note_ons = smf.tracks[0]
        .iter()
        .filter(|e| {
            matches!(
                e.kind,
                midly::TrackEventKind::Midi {
                    message: midly::MidiMessage::NoteOn { vel, .. },
                    ..
                } if vel.as_int() > 0
            )
        })
        .count();
    assert_eq!(note_ons, expected_notes);

    // Spacing is one token per step, so the stream comes back intact
    let reparsed = CorpusLoader::default().tokenize_file(&out).unwrap();
    assert_eq!(reparsed, generated);
}

#[test]
fn test_corrupt_file_skipped() {
    let dir = tempdir().unwrap();
    let good = write_fixture(dir.path(), "good.mid", &["C4", "D4", "E4", "F4"]);
    let bad = dir.path().join("bad.mid");
    fs::write(&bad, b"definitely not a midi file").unwrap();
    let missing = dir.path().join("missing.mid");

    let mut pipeline = Pipeline::with_markov(config(2, 1));
    let report = pipeline.load_files(&[&bad, &good, &missing]).unwrap();

    assert_eq!(report.files.len(), 3);
    assert_eq!(report.loaded_count(), 1);
    assert_eq!(report.failed_count(), 2);
    assert_eq!(report.tokens_added(), 4);
    assert!(matches!(report.files[1].outcome, FileOutcome::Loaded { tokens: 4 }));
    assert_eq!(report.failures().next().unwrap().path, bad);

    assert_eq!(pipeline.corpus().tokens(), tokens(&["C4", "D4", "E4", "F4"]).as_slice());
}

#[test]
fn test_all_files_fail() {
    let dir = tempdir().unwrap();
    let bad = dir.path().join("bad.mid");
    fs::write(&bad, b"MThd").unwrap();

    let mut pipeline = Pipeline::with_markov(config(2, 1));
    let report = pipeline.load_files(&[&bad]).unwrap();
    assert_eq!(report.loaded_count(), 0);

    assert!(matches!(pipeline.prepare(), Err(SeqGenError::EmptyCorpus)));
}

#[test]
fn test_cache_then_resume() {
    let dir = tempdir().unwrap();
    let files = arpeggio_corpus(&dir);
    let cache = dir.path().join("cache").join("corpus.bin");

    let mut cfg = config(3, 9);
    cfg.corpus.cache_path = Some(cache.clone());

    let mut first = Pipeline::with_markov(cfg.clone());
    first.load_files(&files).unwrap();
    assert!(cache.exists());

    let mut resumed = Pipeline::with_markov(cfg);
    assert_eq!(resumed.resume().unwrap(), first.corpus().len());
    assert_eq!(resumed.corpus(), first.corpus());

    first.prepare().unwrap();
    first.train().unwrap();
    resumed.prepare().unwrap();
    resumed.train().unwrap();
    assert_eq!(first.generate(12).unwrap(), resumed.generate(12).unwrap());
}

#[test]
fn test_resume_corrupt_cache() {
    let dir = tempdir().unwrap();
    let cache = dir.path().join("corpus.bin");
    fs::write(&cache, [0xFFu8; 3]).unwrap();

    let mut cfg = config(2, 1);
    cfg.corpus.cache_path = Some(cache);
    let mut pipeline = Pipeline::with_markov(cfg);

    assert!(matches!(pipeline.resume(), Err(SeqGenError::CorpusStore { .. })));
    assert!(pipeline.corpus().is_empty());
}

#[test]
fn test_seeded_generation_reproducible() {
    let dir = tempdir().unwrap();
    let files = arpeggio_corpus(&dir);

    let run = |decoding: Decoding| {
        let mut cfg = config(3, 42);
        cfg.generation.decoding = decoding;
        let mut pipeline = Pipeline::with_markov(cfg);
        pipeline.load_files(&files).unwrap();
        pipeline.prepare().unwrap();
        pipeline.train().unwrap();
        pipeline.generate(24).unwrap().to_vec()
    };

    assert_eq!(run(Decoding::Greedy), run(Decoding::Greedy));

    let sample = Decoding::Sample { temperature: 1.2 };
    assert_eq!(run(sample), run(sample));
}

#[test]
fn test_greedy_continues_cycle() {
    let mut pipeline = Pipeline::with_markov(config(3, 3));
    let dir = tempdir().unwrap();
    let file = write_fixture(
        dir.path(),
        "cycle.mid",
        &["C4", "E4", "G4", "C4", "E4", "G4", "C4", "E4", "G4"],
    );
    pipeline.load_files(&[file]).unwrap();
    pipeline.prepare().unwrap();
    pipeline.train().unwrap();

    let generated = pipeline.generate(9).unwrap();
    let next = |t: &Token| match t.key().as_str() {
        "C4" => "E4",
        "E4" => "G4",
        _ => "C4",
    };
    for pair in generated.windows(2) {
        assert_eq!(pair[1].key(), next(&pair[0]));
    }
}

#[test]
fn test_cancellation_stops_generation() {
    let dir = tempdir().unwrap();
    let files = arpeggio_corpus(&dir);

    let mut pipeline = Pipeline::with_markov(config(3, 2));
    pipeline.load_files(&files).unwrap();
    pipeline.prepare().unwrap();
    pipeline.train().unwrap();

    let token = CancellationToken::new();
    let mut steps = Vec::new();
    let result = pipeline.generate_with(100, Some(&token), |step| {
        steps.push(step.produced);
        assert_eq!(step.requested, 100);
        assert_eq!(step.pattern.len(), 3);
        if step.produced == 4 {
            token.cancel();
        }
    });

    assert!(matches!(result, Err(SeqGenError::Cancelled)));
    assert_eq!(steps, vec![1, 2, 3, 4]);
    assert!(pipeline.generated().is_none());
}

#[test]
fn test_end_to_end_windows() {
    let corpus = Corpus::from_tokens(tokens(&["C4", "E4", "G4", "C4", "E4", "G4", "C4"]));
    let vocab = Vocabulary::build(&corpus).unwrap();
    assert_eq!(vocab.len(), 3);
    assert_eq!(vocab.index_of(&Token::note(60)), Some(0));
    assert_eq!(vocab.index_of(&Token::note(64)), Some(1));
    assert_eq!(vocab.index_of(&Token::note(67)), Some(2));

    let windows = TrainingWindows::build(&corpus, &vocab, 3).unwrap();
    assert_eq!(windows.len(), 4);
    assert_eq!(windows.window(0), Some(&[0, 1, 2][..]));
    assert_eq!(windows.window(3), Some(&[0, 1, 2][..]));
    assert_eq!(windows.targets(), &[0, 1, 2, 0]);

    let inputs = windows.inputs();
    assert_eq!(inputs.shape(), &[4, 3, 1]);
    assert_eq!(inputs[[1, 0, 0]], normalize(1, 3));
    assert!((inputs[[0, 2, 0]] - 2.0 / 3.0).abs() < 1e-6);

    let targets = windows.one_hot_targets();
    assert_eq!(targets.shape(), &[4, 3]);
    assert_eq!(targets.row(1).to_vec(), vec![0.0, 1.0, 0.0]);
}

/// Always predicts the last index of the window
struct EchoModel {
    trained: bool,
    vocab_size: usize,
}

impl ModelPort for EchoModel {
    fn train(&mut self, _inputs: &Array3<f32>, targets: &Array2<f32>, _epochs: usize) -> seqgen::Result<()> {
        self.vocab_size = targets.ncols();
        self.trained = true;
        Ok(())
    }

    fn predict(&self, input: &Array3<f32>) -> seqgen::Result<Array1<f32>> {
        if !self.trained {
            return Err(SeqGenError::ModelNotTrained);
        }
        let last = input[[0, input.shape()[1] - 1, 0]];
        let index = (last * self.vocab_size as f32).round() as usize;
        let mut dist = Array1::zeros(self.vocab_size);
        dist[index] = 1.0;
        Ok(dist)
    }

    fn is_trained(&self) -> bool {
        self.trained
    }
}

#[test]
fn test_custom_model_behind_port() {
    let model: Box<dyn ModelPort> = Box::new(EchoModel {
        trained: false,
        vocab_size: 0,
    });
    let mut pipeline = Pipeline::new(config(2, 8), model);
    let dir = tempdir().unwrap();
    let file = write_fixture(dir.path(), "echo.mid", &["C4", "D4", "E4", "F4", "G4"]);
    pipeline.load_files(&[file]).unwrap();
    pipeline.prepare().unwrap();

    assert!(matches!(pipeline.generate(3), Err(SeqGenError::GenerationPrecondition(_))));
    pipeline.train().unwrap();

    let generated = pipeline.generate(5).unwrap();
    assert!(generated.windows(2).all(|pair| pair[0] == pair[1]));
}
