// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Token corpus.
//!
//! This module provides:
//! - The `Token` type (single pitch or chord)
//! - The append-only `Corpus`
//! - MIDI file tokenization
//! - A cache blob for reusing a corpus across sessions

pub mod loader;
pub mod store;
pub mod token;

pub use loader::{CorpusLoader, FileOutcome, FileParseError, FileReport, LoadReport, LoaderOptions};
pub use store::CorpusStore;
pub use token::Token;

use serde::{Deserialize, Serialize};

/// Ordered token stream; tokens are only ever appended
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Corpus {
    tokens: Vec<Token>,
}

impl Corpus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tokens(tokens: Vec<Token>) -> Self {
        Self { tokens }
    }

    /// Append one token
    pub fn push(&mut self, token: Token) {
        self.tokens.push(token);
    }

    /// Append tokens in order
    pub fn extend<I: IntoIterator<Item = Token>>(&mut self, tokens: I) {
        self.tokens.extend(tokens);
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Token> {
        self.tokens.iter()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl<'a> IntoIterator for &'a Corpus {
    type Item = &'a Token;
    type IntoIter = std::slice::Iter<'a, Token>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.iter()
    }
}
