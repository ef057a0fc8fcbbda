// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Variable-order Markov model with back-off.
//!
//! Counts which token follows each context (the last 1..=order tokens of a
//! window). Prediction uses the longest context seen during training and
//! falls back to overall token frequencies.

use std::collections::HashMap;

use ndarray::{Array1, Array2, Array3, ArrayView1, Axis};
use tracing::{debug, info};

use super::ModelPort;
use crate::error::{Result, SeqGenError};

/// Default context order
pub const DEFAULT_ORDER: usize = 3;

/// Reference next-token model
#[derive(Debug, Clone)]
pub struct MarkovModel {
    order: usize,
    vocab_size: usize,
    /// Context suffix -> next-token counts
    transitions: HashMap<Vec<usize>, Vec<f32>>,
    /// Next-token counts over all windows
    unigram: Vec<f32>,
    trained: bool,
}

impl MarkovModel {
    /// Create an untrained model; order is clamped to at least 1
    pub fn new(order: usize) -> Self {
        Self {
            order: order.max(1),
            vocab_size: 0,
            transitions: HashMap::new(),
            unigram: Vec::new(),
            trained: false,
        }
    }

    pub fn order(&self) -> usize {
        self.order
    }

    /// Number of distinct contexts observed
    pub fn context_count(&self) -> usize {
        self.transitions.len()
    }

    /// Recover raw indices from a normalized window
    fn denormalize(&self, window: ArrayView1<f32>) -> Vec<usize> {
        let v = self.vocab_size as f32;
        let max = self.vocab_size.saturating_sub(1);
        window
            .iter()
            .map(|&x| ((x * v).round().max(0.0) as usize).min(max))
            .collect()
    }

    fn distribution(counts: &[f32]) -> Array1<f32> {
        let total: f32 = counts.iter().sum();
        if total > 0.0 {
            counts.iter().map(|c| c / total).collect()
        } else {
            Array1::from_elem(counts.len(), 1.0 / counts.len().max(1) as f32)
        }
    }
}

impl Default for MarkovModel {
    fn default() -> Self {
        Self::new(DEFAULT_ORDER)
    }
}

impl ModelPort for MarkovModel {
    fn train(&mut self, inputs: &Array3<f32>, targets: &Array2<f32>, epochs: usize) -> Result<()> {
        let (n, l, depth) = inputs.dim();
        let (rows, v) = targets.dim();

        if n == 0 || l == 0 || v == 0 {
            return Err(SeqGenError::Model("empty training data".to_string()));
        }
        if depth != 1 || rows != n {
            return Err(SeqGenError::Model(format!(
                "inputs {:?} do not match targets {:?}",
                inputs.shape(),
                targets.shape()
            )));
        }
        if epochs == 0 {
            return Err(SeqGenError::InvalidConfig(
                "epochs must be positive".to_string(),
            ));
        }

        info!(windows = n, window_len = l, vocab = v, epochs, order = self.order, "training");

        self.vocab_size = v;
        self.transitions.clear();
        self.unigram = vec![0.0; v];

        for (window, target) in inputs
            .index_axis(Axis(2), 0)
            .outer_iter()
            .zip(targets.outer_iter())
        {
            let raw = self.denormalize(window);
            let next = target
                .iter()
                .enumerate()
                .fold((0, f32::MIN), |best, (i, &p)| if p > best.1 { (i, p) } else { best })
                .0;

            self.unigram[next] += 1.0;
            for k in 1..=self.order.min(l) {
                let context = raw[l - k..].to_vec();
                self.transitions.entry(context).or_insert_with(|| vec![0.0; v])[next] += 1.0;
            }
        }

        self.trained = true;
        info!(contexts = self.transitions.len(), "training complete");
        Ok(())
    }

    fn predict(&self, input: &Array3<f32>) -> Result<Array1<f32>> {
        if !self.trained {
            return Err(SeqGenError::ModelNotTrained);
        }
        let (batch, l, depth) = input.dim();
        if batch != 1 || depth != 1 || l == 0 {
            return Err(SeqGenError::Model(format!(
                "expected input of shape (1, L, 1), got {:?}",
                input.shape()
            )));
        }

        let raw = self.denormalize(input.slice(ndarray::s![0, .., 0]));
        for k in (1..=self.order.min(l)).rev() {
            if let Some(counts) = self.transitions.get(&raw[l - k..]) {
                debug!(context = k, "prediction from context");
                return Ok(Self::distribution(counts));
            }
        }
        Ok(Self::distribution(&self.unigram))
    }

    fn is_trained(&self) -> bool {
        self.trained
    }
}
