// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Corpus cache blob.
//!
//! The blob is opaque to every other stage: it is written after a load and
//! read back to resume without re-parsing MIDI files.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use super::Corpus;
use crate::error::{Result, SeqGenError};

/// Reads and writes a corpus at a fixed path
#[derive(Debug, Clone)]
pub struct CorpusStore {
    path: PathBuf,
}

impl CorpusStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Write the corpus, creating parent directories as needed
    pub fn save(&self, corpus: &Corpus) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.error(e))?;
        }
        let blob = bincode::serialize(corpus).map_err(|e| self.error(e))?;
        fs::write(&self.path, blob).map_err(|e| self.error(e))?;
        info!(path = ?self.path, tokens = corpus.len(), "corpus cached");
        Ok(())
    }

    /// Read a previously saved corpus
    pub fn load(&self) -> Result<Corpus> {
        let blob = fs::read(&self.path).map_err(|e| self.error(e))?;
        let corpus: Corpus = bincode::deserialize(&blob).map_err(|e| self.error(e))?;
        info!(path = ?self.path, tokens = corpus.len(), "corpus restored");
        Ok(corpus)
    }

    fn error<E: std::fmt::Display>(&self, err: E) -> SeqGenError {
        SeqGenError::CorpusStore {
            path: self.path.clone(),
            reason: err.to_string(),
        }
    }
}
