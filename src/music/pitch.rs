// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Pitch names and MIDI key conversion.
//!
//! Tokens name single pitches by letter, accidental and octave ("C4", "F#3").
//! Middle C is C4 = MIDI 60.

use std::fmt;

use serde::{Deserialize, Serialize};

/// MIDI note number type (0-127)
pub type MidiNote = u8;

/// Octave used when a bare pitch class has to become a sounding note
pub const DEFAULT_OCTAVE: i8 = 4;

/// Note names (pitch classes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Note {
    C,
    Cs, // C# / Db
    D,
    Ds, // D# / Eb
    E,
    F,
    Fs, // F# / Gb
    G,
    Gs, // G# / Ab
    A,
    As, // A# / Bb
    B,
}

impl Note {
    /// All notes in chromatic order
    pub const ALL: [Note; 12] = [
        Note::C,
        Note::Cs,
        Note::D,
        Note::Ds,
        Note::E,
        Note::F,
        Note::Fs,
        Note::G,
        Note::Gs,
        Note::A,
        Note::As,
        Note::B,
    ];

    /// Get the pitch class (0-11) for this note
    pub fn pitch_class(self) -> u8 {
        Note::ALL
            .iter()
            .position(|&n| n == self)
            .map(|i| i as u8)
            .unwrap_or(0)
    }

    /// Get note from pitch class
    pub fn from_pitch_class(pc: u8) -> Self {
        Note::ALL[(pc % 12) as usize]
    }

    /// Parse a note name with an optional accidental ("C", "C#", "Db")
    pub fn parse(s: &str) -> Option<Self> {
        let semitone = spelled_semitone(s)?;
        Some(Note::from_pitch_class(semitone.rem_euclid(12) as u8))
    }
}

/// Semitones above the written letter's C, before wrapping: "B#" is 12, "Cb" is -1
fn spelled_semitone(s: &str) -> Option<i8> {
    let mut chars = s.trim().chars();
    let letter = match chars.next()?.to_ascii_uppercase() {
        'C' => 0i8,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return None,
    };

    let mut offset = 0i8;
    for c in chars {
        match c {
            '#' | 's' | 'S' => offset = offset.checked_add(1)?,
            'b' => offset = offset.checked_sub(1)?,
            _ => return None,
        }
    }
    letter.checked_add(offset)
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Note::C => "C",
            Note::Cs => "C#",
            Note::D => "D",
            Note::Ds => "D#",
            Note::E => "E",
            Note::F => "F",
            Note::Fs => "F#",
            Note::G => "G",
            Note::Gs => "G#",
            Note::A => "A",
            Note::As => "A#",
            Note::B => "B",
        };
        f.write_str(name)
    }
}

/// A note name plus octave
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pitch {
    pub note: Note,
    pub octave: i8,
}

impl Pitch {
    pub fn new(note: Note, octave: i8) -> Self {
        Self { note, octave }
    }

    /// Pitch of a MIDI key
    pub fn from_midi(key: MidiNote) -> Self {
        Self {
            note: Note::from_pitch_class(key % 12),
            octave: (key / 12) as i8 - 1,
        }
    }

    /// MIDI key for this pitch, if it lies in 0-127
    pub fn to_midi(self) -> Option<MidiNote> {
        let midi = (self.octave as i16 + 1) * 12 + self.note.pitch_class() as i16;
        u8::try_from(midi).ok().filter(|&m| m <= 127)
    }

    /// Parse a name such as "C4", "F#3", "Bb-1"
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let split = s
            .char_indices()
            .skip(1)
            .find(|(_, c)| c.is_ascii_digit() || *c == '-')
            .map(|(i, _)| i)?;
        let (name, octave) = s.split_at(split);
        let semitone = spelled_semitone(name)?;
        let octave: i8 = octave.parse().ok()?;
        // B#4 sounds as C5, Cb4 as B3
        Some(Self {
            note: Note::from_pitch_class(semitone.rem_euclid(12) as u8),
            octave: octave.checked_add(semitone.div_euclid(12))?,
        })
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.note, self.octave)
    }
}

/// Name of a MIDI key, e.g. 60 -> "C4"
pub fn midi_to_name(key: MidiNote) -> String {
    Pitch::from_midi(key).to_string()
}

/// MIDI key of a pitch name, e.g. "C4" -> 60
pub fn name_to_midi(name: &str) -> Option<MidiNote> {
    Pitch::parse(name)?.to_midi()
}

/// MIDI key of a pitch class in the given octave
pub fn pitch_class_to_midi(pc: u8, octave: i8) -> Option<MidiNote> {
    Pitch::new(Note::from_pitch_class(pc), octave).to_midi()
}
