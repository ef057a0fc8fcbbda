// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! SEQGEN - learn a token model from MIDI files and write new ones.
//!
//! Stages, in the order they must run:
//! - `corpus`: MIDI files to tokens
//! - `vocab`: tokens to dense indices
//! - `dataset`: sliding windows and one-hot targets
//! - `model`: the train/predict contract and a built-in Markov model
//! - `generate`: autoregressive decoding
//! - `encode`: tokens back to a MIDI file
//!
//! `pipeline::Pipeline` ties them together and enforces the order.

pub mod config;
pub mod corpus;
pub mod dataset;
pub mod encode;
pub mod error;
pub mod generate;
pub mod model;
pub mod music;
pub mod pipeline;
pub mod vocab;

pub use config::PipelineConfig;
pub use corpus::{Corpus, CorpusLoader, LoadReport, Token};
pub use dataset::TrainingWindows;
pub use encode::{Event, EventEncoder};
pub use error::{Result, SeqGenError};
pub use generate::{CancellationToken, Decoding, Generator};
pub use model::{MarkovModel, ModelPort};
pub use pipeline::Pipeline;
pub use vocab::Vocabulary;
