// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Sliding training windows.
//!
//! A corpus of `N` tokens with window length `L` yields exactly `N - L`
//! windows, one per start offset, each paired with the token that follows
//! it. Model inputs are the window indices divided by the vocabulary size.

use ndarray::{Array2, Array3};
use tracing::info;

use crate::corpus::Corpus;
use crate::error::{Result, SeqGenError};
use crate::vocab::Vocabulary;

/// Scale a raw index into model input range
#[inline]
pub fn normalize(index: usize, vocab_size: usize) -> f32 {
    index as f32 / vocab_size as f32
}

/// Windows of one corpus, in start-offset order
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingWindows {
    window_len: usize,
    vocab_size: usize,
    /// Raw indices per window
    windows: Vec<Vec<usize>>,
    /// Index of the token following each window
    targets: Vec<usize>,
}

impl TrainingWindows {
    /// Slice a corpus into windows of `window_len`
    pub fn build(corpus: &Corpus, vocab: &Vocabulary, window_len: usize) -> Result<Self> {
        if window_len == 0 {
            return Err(SeqGenError::InvalidConfig(
                "window length must be positive".to_string(),
            ));
        }
        if corpus.len() <= window_len {
            return Err(SeqGenError::InsufficientData {
                corpus_len: corpus.len(),
                window_len,
            });
        }

        let indices = vocab.encode(corpus)?;
        let count = indices.len() - window_len;

        let windows = indices
            .windows(window_len)
            .take(count)
            .map(<[usize]>::to_vec)
            .collect();
        let targets = indices[window_len..].to_vec();

        info!(windows = count, window_len, vocab = vocab.len(), "windows prepared");
        Ok(Self {
            window_len,
            vocab_size: vocab.len(),
            windows,
            targets,
        })
    }

    /// Number of windows
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Window length (L)
    pub fn window_len(&self) -> usize {
        self.window_len
    }

    /// Vocabulary size (V) the windows were normalized against
    pub fn vocab_size(&self) -> usize {
        self.vocab_size
    }

    /// Raw indices of one window
    pub fn window(&self, i: usize) -> Option<&[usize]> {
        self.windows.get(i).map(Vec::as_slice)
    }

    pub fn windows(&self) -> &[Vec<usize>] {
        &self.windows
    }

    pub fn targets(&self) -> &[usize] {
        &self.targets
    }

    /// Normalized inputs, shape (windows, L, 1)
    pub fn inputs(&self) -> Array3<f32> {
        let (n, l, v) = (self.len(), self.window_len, self.vocab_size);
        Array3::from_shape_fn((n, l, 1), |(i, j, _)| normalize(self.windows[i][j], v))
    }

    /// One-hot targets, shape (windows, V)
    pub fn one_hot_targets(&self) -> Array2<f32> {
        let mut out = Array2::zeros((self.len(), self.vocab_size));
        for (row, &target) in self.targets.iter().enumerate() {
            out[[row, target]] = 1.0;
        }
        out
    }
}

/// Normalize a pattern for a single prediction, shape (1, L, 1)
pub fn prediction_input<'a, I>(pattern: I, vocab_size: usize) -> Array3<f32>
where
    I: IntoIterator<Item = &'a usize>,
{
    let values: Vec<f32> = pattern
        .into_iter()
        .map(|&i| normalize(i, vocab_size))
        .collect();
    Array3::from_shape_fn((1, values.len(), 1), |(_, j, _)| values[j])
}
