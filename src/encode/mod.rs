// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Token stream to MIDI file.
//!
//! Tokens are laid out one per fixed step, regardless of content. Chords
//! come back in a single octave and every note gets the same length and
//! velocity; only pitch identity and spacing survive the round trip.

pub mod export;

pub use export::{ExportNote, ExportTrack, MidiExporter, MidiFileFormat};

use std::path::Path;

use tracing::info;

use crate::corpus::Token;
use crate::error::{Result, SeqGenError};
use crate::music::pitch::{self, MidiNote, DEFAULT_OCTAVE};

/// A timed musical event
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Single note at a beat offset
    Note { offset: f64, key: MidiNote },
    /// Simultaneous notes at a beat offset
    Chord { offset: f64, keys: Vec<MidiNote> },
}

impl Event {
    /// Offset in beats
    pub fn offset(&self) -> f64 {
        match self {
            Event::Note { offset, .. } | Event::Chord { offset, .. } => *offset,
        }
    }

    /// Keys sounding at this event
    pub fn keys(&self) -> Vec<MidiNote> {
        match self {
            Event::Note { key, .. } => vec![*key],
            Event::Chord { keys, .. } => keys.clone(),
        }
    }

    /// Pitch classes of this event, ascending
    pub fn pitch_classes(&self) -> Vec<u8> {
        let mut pcs: Vec<u8> = self.keys().iter().map(|k| k % 12).collect();
        pcs.sort_unstable();
        pcs.dedup();
        pcs
    }
}

/// Encoder settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncoderOptions {
    /// Tempo in BPM
    pub tempo: f64,
    /// Ticks per quarter note
    pub ppqn: u16,
    /// Offset increment per token, in beats
    pub step_beats: f64,
    /// Length of every note, in beats
    pub note_beats: f64,
    /// General MIDI program for the single voice
    pub program: u8,
    pub velocity: u8,
    /// MIDI channel (0-15)
    pub channel: u8,
}

impl Default for EncoderOptions {
    fn default() -> Self {
        Self {
            tempo: 120.0,
            ppqn: 480,
            step_beats: 0.5,
            note_beats: 1.0,
            program: 0, // Acoustic grand piano
            velocity: 100,
            channel: 0,
        }
    }
}

/// Turns generated tokens into a MIDI file
#[derive(Debug, Clone, Default)]
pub struct EventEncoder {
    options: EncoderOptions,
}

impl EventEncoder {
    pub fn new(options: EncoderOptions) -> Self {
        Self { options }
    }

    /// Place tokens on the timeline
    pub fn events(&self, tokens: &[Token]) -> Result<Vec<Event>> {
        let mut events = Vec::with_capacity(tokens.len());
        let mut offset = 0.0;

        for token in tokens {
            let event = match token {
                Token::Note(name) => Event::Note {
                    offset,
                    key: pitch::name_to_midi(name)
                        .ok_or_else(|| SeqGenError::InvalidToken(name.clone()))?,
                },
                Token::Chord(pcs) => Event::Chord {
                    offset,
                    keys: pcs
                        .iter()
                        .map(|&pc| pitch::pitch_class_to_midi(pc, DEFAULT_OCTAVE))
                        .collect::<Option<Vec<_>>>()
                        .filter(|keys| !keys.is_empty())
                        .ok_or_else(|| SeqGenError::InvalidToken(token.key()))?,
                },
            };
            events.push(event);
            offset += self.options.step_beats;
        }

        Ok(events)
    }

    /// Single-track exporter holding the events
    pub fn exporter(&self, events: &[Event]) -> MidiExporter {
        let mut exporter = MidiExporter::new();
        exporter.set_format(MidiFileFormat::Type0);
        exporter.set_ppqn(self.options.ppqn);
        exporter.set_tempo(self.options.tempo);

        let duration = exporter.beats_to_ticks(self.options.note_beats).max(1);
        let mut track =
            ExportTrack::new("Piano", self.options.channel).with_program(self.options.program);
        for event in events {
            let tick = exporter.beats_to_ticks(event.offset());
            for key in event.keys() {
                track.add_note(ExportNote::new(tick, key, self.options.velocity, duration));
            }
        }
        exporter.add_track(track);
        exporter
    }

    /// Encode tokens to MIDI bytes
    pub fn encode(&self, tokens: &[Token]) -> Result<Vec<u8>> {
        let events = self.events(tokens)?;
        Ok(self.exporter(&events).export_to_bytes())
    }

    /// Encode tokens and write them to `path`
    pub fn write<P: AsRef<Path>>(&self, tokens: &[Token], path: P) -> Result<()> {
        let path = path.as_ref();
        let events = self.events(tokens)?;
        self.exporter(&events)
            .export(path)
            .map_err(|source| SeqGenError::Serialization {
                path: path.to_path_buf(),
                source,
            })?;
        info!(?path, events = events.len(), "MIDI file written");
        Ok(())
    }
}
