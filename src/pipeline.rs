// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Stage-ordered pipeline context.
//!
//! Owns everything one session produces: corpus, vocabulary, windows, model
//! and the last generated stream. Stages must run as
//! load -> prepare -> train -> generate -> save, and each one checks its
//! predecessor's output before doing any work.

use std::path::Path;

use tracing::info;

use crate::config::PipelineConfig;
use crate::corpus::{Corpus, CorpusLoader, CorpusStore, LoadReport, Token};
use crate::dataset::TrainingWindows;
use crate::encode::EventEncoder;
use crate::error::{Result, SeqGenError};
use crate::generate::{CancellationToken, Generator, Step};
use crate::model::{MarkovModel, ModelPort};
use crate::vocab::Vocabulary;

/// One session's state
pub struct Pipeline<M: ModelPort = MarkovModel> {
    config: PipelineConfig,
    corpus: Corpus,
    vocab: Option<Vocabulary>,
    windows: Option<TrainingWindows>,
    model: M,
    /// Set by `train`, cleared whenever the windows change
    trained: bool,
    generated: Option<Vec<Token>>,
}

impl Pipeline<MarkovModel> {
    /// Pipeline backed by the built-in Markov model
    pub fn with_markov(config: PipelineConfig) -> Self {
        let model = MarkovModel::new(config.training.order);
        Self::new(config, model)
    }
}

impl<M: ModelPort> Pipeline<M> {
    pub fn new(config: PipelineConfig, model: M) -> Self {
        Self {
            config,
            corpus: Corpus::new(),
            vocab: None,
            windows: None,
            model,
            trained: false,
            generated: None,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn vocabulary(&self) -> Option<&Vocabulary> {
        self.vocab.as_ref()
    }

    pub fn windows(&self) -> Option<&TrainingWindows> {
        self.windows.as_ref()
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn generated(&self) -> Option<&[Token]> {
        self.generated.as_deref()
    }

    /// Parse files and append their tokens to the corpus
    ///
    /// Unreadable files are reported, not raised. When a cache path is
    /// configured the grown corpus is saved first; if that fails the
    /// corpus is left as it was.
    pub fn load_files<P: AsRef<Path>>(&mut self, paths: &[P]) -> Result<LoadReport> {
        let loader = CorpusLoader::new(self.config.corpus.loader_options());
        let mut grown = self.corpus.clone();
        let report = loader.load_into(paths, &mut grown);

        if let Some(path) = &self.config.corpus.cache_path {
            CorpusStore::new(path).save(&grown)?;
        }
        self.commit_corpus(grown);
        Ok(report)
    }

    /// Append tokens from the configured cache; returns how many were added
    pub fn resume(&mut self) -> Result<usize> {
        let path = self.config.corpus.cache_path.as_ref().ok_or_else(|| {
            SeqGenError::Precondition("no corpus cache path configured".to_string())
        })?;
        let cached = CorpusStore::new(path).load()?;
        let added = cached.len();

        let mut grown = self.corpus.clone();
        grown.extend(cached.tokens().iter().cloned());
        self.commit_corpus(grown);
        Ok(added)
    }

    /// Replace the corpus; everything derived from the old one is dropped
    fn commit_corpus(&mut self, corpus: Corpus) {
        self.corpus = corpus;
        self.clear_derived();
    }

    fn clear_derived(&mut self) {
        self.vocab = None;
        self.windows = None;
        self.trained = false;
        self.generated = None;
    }

    /// Rebuild vocabulary and windows from the current corpus
    ///
    /// On failure both are cleared, so later stages cannot use stale data.
    pub fn prepare(&mut self) -> Result<&TrainingWindows> {
        self.clear_derived();

        let vocab = Vocabulary::build(&self.corpus)?;
        let windows = TrainingWindows::build(&self.corpus, &vocab, self.config.sequence.length)?;
        info!(vocab = vocab.len(), windows = windows.len(), "prepared sequences");

        self.vocab = Some(vocab);
        Ok(&*self.windows.insert(windows))
    }

    /// Train the model on the prepared windows
    pub fn train(&mut self) -> Result<()> {
        let windows = self.windows.as_ref().ok_or_else(|| {
            SeqGenError::Precondition("sequences must be prepared before training".to_string())
        })?;
        self.trained = false;
        self.model.train(
            &windows.inputs(),
            &windows.one_hot_targets(),
            self.config.training.epochs,
        )?;
        self.trained = true;
        info!("model trained");
        Ok(())
    }

    /// Generate `length` tokens with the configured seed and decoding
    pub fn generate(&mut self, length: usize) -> Result<&[Token]> {
        self.generate_with(length, None, |_| {})
    }

    /// Generate with cancellation and progress reporting
    pub fn generate_with<F>(
        &mut self,
        length: usize,
        cancel: Option<&CancellationToken>,
        on_step: F,
    ) -> Result<&[Token]>
    where
        F: FnMut(&Step<'_>),
    {
        let (vocab, windows) = match (&self.vocab, &self.windows) {
            (Some(vocab), Some(windows)) => (vocab, windows),
            _ => {
                return Err(SeqGenError::GenerationPrecondition(
                    "sequences must be prepared before generating".to_string(),
                ))
            }
        };
        if !self.trained {
            return Err(SeqGenError::GenerationPrecondition(
                "model must be trained on the current sequences".to_string(),
            ));
        }

        let generation = &self.config.generation;
        let tokens = match generation.seed {
            Some(seed) => Generator::seeded(vocab, windows, seed)
                .with_decoding(generation.decoding)
                .generate_with(&self.model, length, cancel, on_step)?,
            None => Generator::new(vocab, windows)
                .with_decoding(generation.decoding)
                .generate_with(&self.model, length, cancel, on_step)?,
        };

        Ok(self.generated.insert(tokens).as_slice())
    }

    /// Write the last generated stream as a MIDI file
    pub fn save_midi<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let tokens = self
            .generated
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| SeqGenError::Precondition("no generated music to save".to_string()))?;
        EventEncoder::new(self.config.output.encoder_options()).write(tokens, path)
    }
}
