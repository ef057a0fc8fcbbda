// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Error types shared by every pipeline stage.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result alias used throughout the library
pub type Result<T> = std::result::Result<T, SeqGenError>;

/// Failures that escape a pipeline stage
#[derive(Debug, Error)]
pub enum SeqGenError {
    /// The corpus holds no tokens
    #[error("corpus is empty")]
    EmptyCorpus,

    /// Not enough tokens to build a single window
    #[error("corpus has {corpus_len} tokens, need more than the window length {window_len}")]
    InsufficientData { corpus_len: usize, window_len: usize },

    /// The model was asked to predict before it was trained
    #[error("model has not been trained")]
    ModelNotTrained,

    /// Generation was requested before its inputs exist
    #[error("cannot generate: {0}")]
    GenerationPrecondition(String),

    /// A stage other than generation was invoked out of order
    #[error("stage precondition failed: {0}")]
    Precondition(String),

    /// The output MIDI file could not be written
    #[error("failed to write {path:?}: {source}")]
    Serialization {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The corpus cache blob could not be read or written
    #[error("corpus cache {path:?}: {reason}")]
    CorpusStore { path: PathBuf, reason: String },

    /// A token that has no event representation
    #[error("invalid token {0:?}")]
    InvalidToken(String),

    /// A configuration value outside its valid range
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Failure reported by a model implementation
    #[error("model error: {0}")]
    Model(String),

    /// Generation stopped by its cancellation token
    #[error("generation cancelled")]
    Cancelled,
}
