// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Next-token model abstraction.
//!
//! The pipeline talks to its predictive model only through `ModelPort`,
//! exchanging normalized windows and probability vectors. Any numerical
//! backend can sit behind it.

pub mod markov;

pub use markov::MarkovModel;

use ndarray::{Array1, Array2, Array3};

use crate::error::Result;

/// Train/predict contract for a next-token model
pub trait ModelPort {
    /// Fit the model.
    ///
    /// # Arguments
    /// * `inputs` - Normalized windows, shape (windows, L, 1)
    /// * `targets` - One-hot next tokens, shape (windows, V)
    /// * `epochs` - Passes over the data
    fn train(&mut self, inputs: &Array3<f32>, targets: &Array2<f32>, epochs: usize) -> Result<()>;

    /// Distribution over the vocabulary for one window of shape (1, L, 1).
    ///
    /// Fails with `ModelNotTrained` until `train` has succeeded once.
    fn predict(&self, input: &Array3<f32>) -> Result<Array1<f32>>;

    /// Whether `train` has succeeded at least once
    fn is_trained(&self) -> bool;
}

impl<M: ModelPort + ?Sized> ModelPort for Box<M> {
    fn train(&mut self, inputs: &Array3<f32>, targets: &Array2<f32>, epochs: usize) -> Result<()> {
        (**self).train(inputs, targets, epochs)
    }

    fn predict(&self, input: &Array3<f32>) -> Result<Array1<f32>> {
        (**self).predict(input)
    }

    fn is_trained(&self) -> bool {
        (**self).is_trained()
    }
}
