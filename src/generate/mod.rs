// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Autoregressive token generation.
//!
//! The generator seeds a pattern buffer from a random training window, then
//! repeatedly asks the model for the next token, appends it to the output
//! and slides the buffer forward by one. The buffer always holds exactly
//! `L` raw indices; they are normalized the same way as the training inputs
//! before every prediction.

pub mod cancel;

pub use cancel::CancellationToken;

use std::collections::VecDeque;

use ndarray::Array1;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::corpus::Token;
use crate::dataset::{prediction_input, TrainingWindows};
use crate::error::{Result, SeqGenError};
use crate::model::ModelPort;
use crate::vocab::Vocabulary;

/// How the next index is chosen from a prediction
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum Decoding {
    /// Highest probability; first wins on ties
    #[default]
    Greedy,
    /// Weighted draw over `p^(1/temperature)`
    Sample { temperature: f32 },
}

impl Decoding {
    pub fn validate(&self) -> Result<()> {
        match *self {
            Decoding::Greedy => Ok(()),
            Decoding::Sample { temperature } if temperature.is_finite() && temperature > 0.0 => {
                Ok(())
            }
            Decoding::Sample { temperature } => Err(SeqGenError::InvalidConfig(format!(
                "sampling temperature must be positive, got {}",
                temperature
            ))),
        }
    }
}

/// Snapshot passed to the progress callback after each extension
#[derive(Debug)]
pub struct Step<'a> {
    /// Tokens produced so far
    pub produced: usize,
    /// Tokens requested
    pub requested: usize,
    /// Index chosen in this step
    pub index: usize,
    /// Token chosen in this step
    pub token: &'a Token,
    /// Pattern buffer after the slide
    pub pattern: &'a VecDeque<usize>,
}

/// Index of the largest entry, ignoring NaN
pub fn argmax(dist: &Array1<f32>) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &p) in dist.iter().enumerate() {
        if p.is_nan() {
            continue;
        }
        match best {
            Some((_, b)) if p <= b => {}
            _ => best = Some((i, p)),
        }
    }
    best.map(|(i, _)| i)
}

/// Generator over one vocabulary and window set
pub struct Generator<'a, R: Rng = StdRng> {
    vocab: &'a Vocabulary,
    windows: &'a TrainingWindows,
    decoding: Decoding,
    rng: R,
}

impl<'a> Generator<'a, StdRng> {
    /// Generator with an entropy-seeded random source
    pub fn new(vocab: &'a Vocabulary, windows: &'a TrainingWindows) -> Self {
        Self::with_rng(vocab, windows, StdRng::from_entropy())
    }

    /// Generator with a reproducible random source
    pub fn seeded(vocab: &'a Vocabulary, windows: &'a TrainingWindows, seed: u64) -> Self {
        Self::with_rng(vocab, windows, StdRng::seed_from_u64(seed))
    }
}

impl<'a, R: Rng> Generator<'a, R> {
    pub fn with_rng(vocab: &'a Vocabulary, windows: &'a TrainingWindows, rng: R) -> Self {
        Self {
            vocab,
            windows,
            decoding: Decoding::Greedy,
            rng,
        }
    }

    /// Set the decoding strategy
    pub fn with_decoding(mut self, decoding: Decoding) -> Self {
        self.decoding = decoding;
        self
    }

    pub fn decoding(&self) -> Decoding {
        self.decoding
    }

    /// Generate exactly `length` tokens
    pub fn generate<M: ModelPort + ?Sized>(&mut self, model: &M, length: usize) -> Result<Vec<Token>> {
        self.generate_with(model, length, None, |_| {})
    }

    /// Generate with optional cancellation and a per-step callback
    ///
    /// The token is checked once per iteration, after the prediction and
    /// before the pattern is extended.
    pub fn generate_with<M, F>(
        &mut self,
        model: &M,
        length: usize,
        cancel: Option<&CancellationToken>,
        mut on_step: F,
    ) -> Result<Vec<Token>>
    where
        M: ModelPort + ?Sized,
        F: FnMut(&Step<'_>),
    {
        self.check_preconditions(model)?;

        let v = self.vocab.len();
        let mut pattern = self.seed_pattern();
        let mut output = Vec::with_capacity(length);

        info!(length, window_len = pattern.len(), decoding = ?self.decoding, "generating");

        for produced in 1..=length {
            let input = prediction_input(pattern.iter(), v);
            let dist = model.predict(&input)?;
            if dist.len() != v {
                return Err(SeqGenError::Model(format!(
                    "prediction has {} entries, vocabulary has {}",
                    dist.len(),
                    v
                )));
            }

            if cancel.is_some_and(CancellationToken::is_cancelled) {
                info!(produced = produced - 1, "generation cancelled");
                return Err(SeqGenError::Cancelled);
            }

            let index = self.select(&dist)?;
            let token = self
                .vocab
                .token_at(index)
                .ok_or_else(|| SeqGenError::Model(format!("index {} outside vocabulary", index)))?;

            output.push(token.clone());
            pattern.push_back(index);
            pattern.pop_front();

            on_step(&Step {
                produced,
                requested: length,
                index,
                token,
                pattern: &pattern,
            });
        }

        info!(tokens = output.len(), "generation complete");
        Ok(output)
    }

    fn check_preconditions<M: ModelPort + ?Sized>(&self, model: &M) -> Result<()> {
        let fail = |msg: &str| Err(SeqGenError::GenerationPrecondition(msg.to_string()));

        if self.vocab.is_empty() {
            return fail("vocabulary is empty");
        }
        if self.windows.is_empty() {
            return fail("no training windows");
        }
        if self.windows.vocab_size() != self.vocab.len() {
            return fail("windows were built against a different vocabulary");
        }
        if !model.is_trained() {
            return fail("model has not been trained");
        }
        self.decoding.validate()
    }

    /// Copy a uniformly chosen window into a fresh pattern buffer
    fn seed_pattern(&mut self) -> VecDeque<usize> {
        let start = self.rng.gen_range(0..self.windows.len());
        debug!(start, "seeded");
        self.windows
            .window(start)
            .map(|w| w.iter().copied().collect())
            .unwrap_or_default()
    }

    fn select(&mut self, dist: &Array1<f32>) -> Result<usize> {
        let index = match self.decoding {
            Decoding::Greedy => argmax(dist),
            Decoding::Sample { temperature } => self.sample(dist, temperature).or_else(|| argmax(dist)),
        };
        index.ok_or_else(|| SeqGenError::Model("prediction has no usable entries".to_string()))
    }

    fn sample(&mut self, dist: &Array1<f32>, temperature: f32) -> Option<usize> {
        let exponent = 1.0 / temperature as f64;
        let weights: Vec<f64> = dist
            .iter()
            .map(|&p| {
                if p.is_finite() && p > 0.0 {
                    (p as f64).powf(exponent)
                } else {
                    0.0
                }
            })
            .collect();

        let total: f64 = weights.iter().sum();
        if !(total.is_finite() && total > 0.0) {
            return None;
        }

        let mut roll = self.rng.gen::<f64>() * total;
        let mut last = None;
        for (i, &weight) in weights.iter().enumerate() {
            if weight <= 0.0 {
                continue;
            }
            roll -= weight;
            last = Some(i);
            if roll <= 0.0 {
                break;
            }
        }
        last
    }
}
