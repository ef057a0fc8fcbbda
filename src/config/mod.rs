// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Pipeline configuration.
//!
//! Loaded from YAML or TOML (chosen by file extension). Every field has a
//! default, so an empty document is a valid configuration.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::corpus::LoaderOptions;
use crate::encode::EncoderOptions;
use crate::generate::Decoding;

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub corpus: CorpusConfig,
    pub sequence: SequenceConfig,
    pub training: TrainingConfig,
    pub generation: GenerationConfig,
    pub output: OutputConfig,
}

impl PipelineConfig {
    /// Load from a `.yaml`/`.yml` or `.toml` file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let config = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml(&contents)?,
            Some("yaml") | Some("yml") => Self::from_yaml(&contents)?,
            other => bail!("Unsupported config extension {:?} for {:?}", other, path),
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("Failed to parse YAML configuration")
    }

    /// Parse from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).context("Failed to parse TOML configuration")
    }

    /// Serialize to YAML string
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize configuration to YAML")
    }

    /// Save as YAML
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = self.to_yaml()?;
        fs::write(path.as_ref(), yaml)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))
    }

    /// Reject values no stage can work with
    pub fn validate(&self) -> Result<()> {
        if self.sequence.length == 0 {
            bail!("sequence.length must be positive");
        }
        if self.training.epochs == 0 {
            bail!("training.epochs must be positive");
        }
        if self.training.order == 0 {
            bail!("training.order must be positive");
        }
        self.generation.decoding.validate()?;

        let out = &self.output;
        if !(out.tempo.is_finite() && out.tempo > 0.0) {
            bail!("output.tempo must be positive");
        }
        if out.ppqn == 0 {
            bail!("output.ppqn must be positive");
        }
        if !(out.step_beats.is_finite() && out.step_beats > 0.0) {
            bail!("output.step_beats must be positive");
        }
        if !(out.note_beats.is_finite() && out.note_beats > 0.0) {
            bail!("output.note_beats must be positive");
        }
        if out.program > 127 || out.velocity == 0 || out.velocity > 127 {
            bail!("output.program must be 0-127 and output.velocity 1-127");
        }
        if out.channel > 15 {
            bail!("output.channel must be 0-15");
        }
        Ok(())
    }
}

/// Corpus loading settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusConfig {
    /// Where the token cache is written after each load
    pub cache_path: Option<PathBuf>,
    /// Ignore the percussion channel
    pub skip_percussion: bool,
    /// Only tokenize the first track with notes
    pub first_part_only: bool,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            cache_path: None,
            skip_percussion: true,
            first_part_only: false,
        }
    }
}

impl CorpusConfig {
    pub fn loader_options(&self) -> LoaderOptions {
        LoaderOptions {
            skip_percussion: self.skip_percussion,
            first_part_only: self.first_part_only,
        }
    }
}

/// Windowing settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceConfig {
    /// Window length (L)
    pub length: usize,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self { length: 20 }
    }
}

/// Training settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub epochs: usize,
    /// Context order of the built-in model
    pub order: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: 5,
            order: crate::model::markov::DEFAULT_ORDER,
        }
    }
}

/// Generation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Tokens to generate
    pub length: usize,
    /// Fixed seed for the start window and sampling; entropy when absent
    pub seed: Option<u64>,
    pub decoding: Decoding,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            length: 300,
            seed: None,
            decoding: Decoding::Greedy,
        }
    }
}

/// MIDI output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub tempo: f64,
    pub ppqn: u16,
    /// Beats between consecutive tokens
    pub step_beats: f64,
    /// Length of each note in beats
    pub note_beats: f64,
    pub program: u8,
    pub velocity: u8,
    /// MIDI channel (0-15)
    pub channel: u8,
}

impl Default for OutputConfig {
    fn default() -> Self {
        let options = EncoderOptions::default();
        Self {
            tempo: options.tempo,
            ppqn: options.ppqn,
            step_beats: options.step_beats,
            note_beats: options.note_beats,
            program: options.program,
            velocity: options.velocity,
            channel: options.channel,
        }
    }
}

impl OutputConfig {
    pub fn encoder_options(&self) -> EncoderOptions {
        EncoderOptions {
            tempo: self.tempo,
            ppqn: self.ppqn,
            step_beats: self.step_beats,
            note_beats: self.note_beats,
            program: self.program,
            velocity: self.velocity,
            channel: self.channel,
        }
    }
}
