// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Corpus tokens.
//!
//! A token is either a single named pitch or a chord reduced to its
//! pitch classes. The variant is fixed when the token is created, so later
//! stages never have to guess it from the token's text.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SeqGenError;
use crate::music::pitch::{self, MidiNote};

/// Separator between pitch classes in a chord key
pub const CHORD_SEPARATOR: char = '.';

/// One musical unit of the corpus
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Token {
    /// A single pitch, named with its octave ("C4")
    Note(String),
    /// Simultaneous pitch classes, ascending and unique
    Chord(Vec<u8>),
}

impl Token {
    /// Token for a single MIDI key
    pub fn note(key: MidiNote) -> Self {
        Token::Note(pitch::midi_to_name(key))
    }

    /// Chord token from arbitrary pitch classes
    ///
    /// Pitch classes are reduced mod 12, sorted and deduplicated.
    pub fn chord<I: IntoIterator<Item = u8>>(pitch_classes: I) -> Self {
        let mut pcs: Vec<u8> = pitch_classes.into_iter().map(|pc| pc % 12).collect();
        pcs.sort_unstable();
        pcs.dedup();
        Token::Chord(pcs)
    }

    /// Token for notes that start together
    ///
    /// One distinct key gives a note; more give a chord of their pitch classes.
    pub fn from_onset(keys: &[MidiNote]) -> Option<Self> {
        let mut keys = keys.to_vec();
        keys.sort_unstable();
        keys.dedup();
        match keys.as_slice() {
            [] => None,
            [key] => Some(Token::note(*key)),
            _ => Some(Token::chord(keys.iter().map(|k| k % 12))),
        }
    }

    /// Textual key used for vocabulary ordering
    pub fn key(&self) -> String {
        self.to_string()
    }

    pub fn is_chord(&self) -> bool {
        matches!(self, Token::Chord(_))
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Note(name) => f.write_str(name),
            Token::Chord(pcs) => {
                for (i, pc) in pcs.iter().enumerate() {
                    if i > 0 {
                        write!(f, "{}", CHORD_SEPARATOR)?;
                    }
                    write!(f, "{}", pc)?;
                }
                Ok(())
            }
        }
    }
}

impl FromStr for Token {
    type Err = SeqGenError;

    /// Parse a token key
    ///
    /// Keys containing the separator or made only of digits are chords;
    /// anything else must be a pitch name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || SeqGenError::InvalidToken(s.to_string());

        if s.is_empty() {
            return Err(invalid());
        }

        if s.contains(CHORD_SEPARATOR) || s.chars().all(|c| c.is_ascii_digit()) {
            let pcs = s
                .split(CHORD_SEPARATOR)
                .map(|part| part.parse::<u8>().ok().filter(|&pc| pc < 12))
                .collect::<Option<Vec<u8>>>()
                .ok_or_else(invalid)?;
            return Ok(Token::chord(pcs));
        }

        match pitch::Pitch::parse(s) {
            Some(p) if p.to_midi().is_some() => Ok(Token::Note(p.to_string())),
            _ => Err(invalid()),
        }
    }
}
