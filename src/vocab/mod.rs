// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Token vocabulary.
//!
//! Indices are the rank of each distinct token key in lexicographic order,
//! so the mapping depends only on which tokens occur, never on where.

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use crate::corpus::{Corpus, Token};
use crate::error::{Result, SeqGenError};

/// Bijection between distinct tokens and dense indices `0..len()`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    /// Index -> token, sorted by key
    tokens: Vec<Token>,
    /// Token -> index
    index: HashMap<Token, usize>,
}

impl Vocabulary {
    /// Build from a corpus
    pub fn build(corpus: &Corpus) -> Result<Self> {
        Self::from_tokens(corpus.iter())
    }

    /// Build from any token sequence; order and repetition are irrelevant
    pub fn from_tokens<'a, I>(tokens: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a Token>,
    {
        let distinct: BTreeMap<String, &Token> =
            tokens.into_iter().map(|t| (t.key(), t)).collect();

        if distinct.is_empty() {
            return Err(SeqGenError::EmptyCorpus);
        }

        let tokens: Vec<Token> = distinct.into_values().cloned().collect();
        let index = tokens
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i))
            .collect();

        debug!(size = tokens.len(), "vocabulary built");
        Ok(Self { tokens, index })
    }

    /// Number of distinct tokens (V)
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Always false for a built vocabulary
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn index_of(&self, token: &Token) -> Option<usize> {
        self.index.get(token).copied()
    }

    pub fn token_at(&self, index: usize) -> Option<&Token> {
        self.tokens.get(index)
    }

    /// Tokens in index order
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Indices of every corpus token, in corpus order
    pub fn encode(&self, corpus: &Corpus) -> Result<Vec<usize>> {
        corpus
            .iter()
            .map(|t| {
                self.index_of(t)
                    .ok_or_else(|| SeqGenError::InvalidToken(t.key()))
            })
            .collect()
    }
}
