// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Standard MIDI file writer.
//!
//! Writes note tracks as Type 0 or Type 1 MIDI files.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::music::pitch::MidiNote;

/// Generated music is always written in common time
const TIME_SIGNATURE: (u8, u8) = (4, 4);

/// MIDI file format type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MidiFileFormat {
    /// Type 0: Single track with all channels
    #[default]
    Type0,
    /// Type 1: Multiple simultaneous tracks
    Type1,
}

/// A track for export
#[derive(Debug, Clone)]
pub struct ExportTrack {
    /// Track name
    pub name: String,
    /// MIDI channel (0-15)
    pub channel: u8,
    /// Notes in this track
    pub notes: Vec<ExportNote>,
    /// Program change at start (None = no change)
    pub program: Option<u8>,
}

impl ExportTrack {
    pub fn new(name: impl Into<String>, channel: u8) -> Self {
        Self {
            name: name.into(),
            channel,
            notes: Vec::new(),
            program: None,
        }
    }

    pub fn add_note(&mut self, note: ExportNote) {
        self.notes.push(note);
    }

    pub fn with_program(mut self, program: u8) -> Self {
        self.program = Some(program);
        self
    }

    /// Channel events of this track, unsorted
    fn events(&self) -> Vec<MidiExportEvent> {
        let mut events = Vec::with_capacity(self.notes.len() * 2 + 1);
        if let Some(program) = self.program {
            events.push(MidiExportEvent::program_change(0, self.channel, program));
        }
        for note in &self.notes {
            events.push(MidiExportEvent::note_on(note.tick, self.channel, note.note, note.velocity));
            events.push(MidiExportEvent::note_off(note.end_tick(), self.channel, note.note));
        }
        events
    }
}

/// A note for export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportNote {
    /// Start tick
    pub tick: u64,
    /// Note number (0-127)
    pub note: MidiNote,
    /// Velocity (1-127)
    pub velocity: u8,
    /// Duration in ticks
    pub duration: u64,
}

impl ExportNote {
    pub fn new(tick: u64, note: MidiNote, velocity: u8, duration: u64) -> Self {
        Self {
            tick,
            note,
            velocity,
            duration,
        }
    }

    pub fn end_tick(&self) -> u64 {
        self.tick + self.duration
    }
}

/// Sort rank within a tick: meta first, then releases, then program, then onsets
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum EventRank {
    Meta,
    NoteOff,
    Program,
    NoteOn,
}

#[derive(Debug, Clone)]
struct MidiExportEvent {
    /// Absolute tick
    tick: u64,
    rank: EventRank,
    data: Vec<u8>,
}

impl MidiExportEvent {
    fn note_on(tick: u64, channel: u8, note: u8, velocity: u8) -> Self {
        Self {
            tick,
            rank: EventRank::NoteOn,
            data: vec![0x90 | (channel & 0x0F), note & 0x7F, velocity.clamp(1, 127)],
        }
    }

    fn note_off(tick: u64, channel: u8, note: u8) -> Self {
        Self {
            tick,
            rank: EventRank::NoteOff,
            data: vec![0x80 | (channel & 0x0F), note & 0x7F, 0],
        }
    }

    fn program_change(tick: u64, channel: u8, program: u8) -> Self {
        Self {
            tick,
            rank: EventRank::Program,
            data: vec![0xC0 | (channel & 0x0F), program & 0x7F],
        }
    }

    fn tempo(bpm: f64) -> Self {
        let microseconds = (60_000_000.0 / bpm) as u32;
        Self {
            tick: 0,
            rank: EventRank::Meta,
            data: vec![
                0xFF, 0x51, 0x03,
                ((microseconds >> 16) & 0xFF) as u8,
                ((microseconds >> 8) & 0xFF) as u8,
                (microseconds & 0xFF) as u8,
            ],
        }
    }

    fn time_signature(numerator: u8, denominator: u8) -> Self {
        // Denominator is expressed as power of 2
        let denom_power = (denominator as f64).log2() as u8;
        Self {
            tick: 0,
            rank: EventRank::Meta,
            data: vec![
                0xFF, 0x58, 0x04,
                numerator,
                denom_power,
                24, // MIDI clocks per metronome click
                8,  // 32nd notes per MIDI quarter note
            ],
        }
    }

    fn track_name(name: &str) -> Self {
        let bytes = name.as_bytes();
        let mut data = vec![0xFF, 0x03];
        write_variable_length(&mut data, bytes.len() as u32);
        data.extend_from_slice(bytes);
        Self {
            tick: 0,
            rank: EventRank::Meta,
            data,
        }
    }
}

/// Append a variable-length quantity
fn write_variable_length(out: &mut Vec<u8>, mut value: u32) {
    let mut bytes = [0u8; 5];
    let mut i = bytes.len() - 1;
    bytes[i] = (value & 0x7F) as u8;
    value >>= 7;

    while value > 0 {
        i -= 1;
        bytes[i] = (value & 0x7F) as u8 | 0x80;
        value >>= 7;
    }

    out.extend_from_slice(&bytes[i..]);
}

/// MIDI file exporter
#[derive(Debug, Clone)]
pub struct MidiExporter {
    format: MidiFileFormat,
    /// Ticks per quarter note
    ppqn: u16,
    /// Tempo in BPM
    tempo: f64,
    tracks: Vec<ExportTrack>,
}

impl MidiExporter {
    pub fn new() -> Self {
        Self {
            format: MidiFileFormat::Type0,
            ppqn: 480,
            tempo: 120.0,
            tracks: Vec::new(),
        }
    }

    pub fn format(&self) -> MidiFileFormat {
        self.format
    }

    pub fn set_format(&mut self, format: MidiFileFormat) {
        self.format = format;
    }

    pub fn set_ppqn(&mut self, ppqn: u16) {
        self.ppqn = ppqn.clamp(1, 0x7FFF);
    }

    pub fn ppqn(&self) -> u16 {
        self.ppqn
    }

    pub fn set_tempo(&mut self, bpm: f64) {
        self.tempo = bpm.clamp(20.0, 300.0);
    }

    pub fn tempo(&self) -> f64 {
        self.tempo
    }

    pub fn add_track(&mut self, track: ExportTrack) {
        self.tracks.push(track);
    }

    /// Convert a beat offset to ticks at the current PPQN
    pub fn beats_to_ticks(&self, beats: f64) -> u64 {
        (beats.max(0.0) * self.ppqn as f64).round() as u64
    }

    /// Export to file
    pub fn export<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.write(&mut writer)?;
        writer.flush()
    }

    /// Export to bytes
    pub fn export_to_bytes(&self) -> Vec<u8> {
        let mut buffer = Vec::new();
        self.write_into(&mut buffer);
        buffer
    }

    /// Write MIDI data to writer
    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.export_to_bytes())
    }

    fn write_into(&self, out: &mut Vec<u8>) {
        let header = [
            MidiExportEvent::tempo(self.tempo),
            MidiExportEvent::time_signature(TIME_SIGNATURE.0, TIME_SIGNATURE.1),
        ];

        match self.format {
            MidiFileFormat::Type0 => {
                let mut events = header.to_vec();
                events.extend(self.tracks.iter().flat_map(ExportTrack::events));
                self.write_header(out, 0, 1);
                write_track(out, events);
            }
            MidiFileFormat::Type1 => {
                self.write_header(out, 1, self.tracks.len() as u16 + 1);

                let mut tempo_track = header.to_vec();
                tempo_track.push(MidiExportEvent::track_name("Tempo"));
                write_track(out, tempo_track);

                for track in &self.tracks {
                    let mut events = vec![MidiExportEvent::track_name(&track.name)];
                    events.extend(track.events());
                    write_track(out, events);
                }
            }
        }
    }

    fn write_header(&self, out: &mut Vec<u8>, format: u16, num_tracks: u16) {
        out.extend_from_slice(b"MThd");
        // Chunk length (always 6)
        out.extend_from_slice(&6u32.to_be_bytes());
        out.extend_from_slice(&format.to_be_bytes());
        out.extend_from_slice(&num_tracks.to_be_bytes());
        out.extend_from_slice(&self.ppqn.to_be_bytes());
    }
}

impl Default for MidiExporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Sort and write one MTrk chunk
fn write_track(out: &mut Vec<u8>, mut events: Vec<MidiExportEvent>) {
    events.sort_by_key(|e| (e.tick, e.rank));

    let mut data = Vec::new();
    let mut last_tick = 0u64;
    for event in &events {
        let delta = event.tick.saturating_sub(last_tick);
        write_variable_length(&mut data, delta.min(0x0FFF_FFFF) as u32);
        data.extend_from_slice(&event.data);
        last_tick = event.tick;
    }

    // End of track
    write_variable_length(&mut data, 0);
    data.extend_from_slice(&[0xFF, 0x2F, 0x00]);

    out.extend_from_slice(b"MTrk");
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    out.extend_from_slice(&data);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exporter_creation() {
        let exporter = MidiExporter::new();
        assert_eq!(exporter.format(), MidiFileFormat::Type0);
        assert_eq!(exporter.ppqn(), 480);
        assert_eq!(exporter.tempo(), 120.0);
    }

    #[test]
    fn test_common_time_written() {
        let bytes = MidiExporter::new().export_to_bytes();
        let meta: [u8; 7] = [0xFF, 0x58, 0x04, 4, 2, 24, 8];
        assert!(bytes.windows(meta.len()).any(|w| w == meta.as_slice()));
    }

    #[test]
    fn test_export_type0() {
        let mut exporter = MidiExporter::new();
        exporter.set_ppqn(24);

        let mut track = ExportTrack::new("Test", 0);
        track.add_note(ExportNote::new(0, 60, 100, 24));
        exporter.add_track(track);

        let bytes = exporter.export_to_bytes();
        assert_eq!(&bytes[0..4], b"MThd");
        assert_eq!(bytes[9], 0); // Format 0
        assert_eq!(&bytes[12..14], &24u16.to_be_bytes());
        assert_eq!(&bytes[14..18], b"MTrk");
        assert_eq!(&bytes[bytes.len() - 3..], &[0xFF, 0x2F, 0x00]);
    }

    #[test]
    fn test_export_type1() {
        let mut exporter = MidiExporter::new();
        exporter.set_format(MidiFileFormat::Type1);

        exporter.add_track(ExportTrack::new("Track 1", 0));
        exporter.add_track(ExportTrack::new("Track 2", 1));

        let bytes = exporter.export_to_bytes();
        assert_eq!(bytes[9], 1); // Format 1
        assert_eq!(&bytes[10..12], &3u16.to_be_bytes()); // 3 tracks
    }

    #[test]
    fn test_variable_length() {
        let cases: [(u32, &[u8]); 5] = [
            (0, &[0x00]),
            (127, &[0x7F]),
            (128, &[0x81, 0x00]),
            (16383, &[0xFF, 0x7F]),
            (0x0FFF_FFFF, &[0xFF, 0xFF, 0xFF, 0x7F]),
        ];
        for (value, expected) in cases {
            let mut buffer = Vec::new();
            write_variable_length(&mut buffer, value);
            assert_eq!(buffer, expected);
        }
    }

    #[test]
    fn test_release_sorts_before_onset() {
        let mut track = ExportTrack::new("Overlap", 0);
        track.add_note(ExportNote::new(0, 60, 100, 24));
        track.add_note(ExportNote::new(24, 60, 100, 24));

        let mut events = track.events();
        events.sort_by_key(|e| (e.tick, e.rank));
        let kinds: Vec<u8> = events.iter().map(|e| e.data[0] & 0xF0).collect();
        assert_eq!(kinds, vec![0x90, 0x80, 0x90, 0x80]);
    }

    #[test]
    fn test_tempo_event() {
        let event = MidiExportEvent::tempo(120.0);
        // 120 BPM = 500000 microseconds per beat = 0x07A120
        assert_eq!(&event.data, &[0xFF, 0x51, 0x03, 0x07, 0xA1, 0x20]);
    }

    #[test]
    fn test_beats_to_ticks() {
        let exporter = MidiExporter::new();
        assert_eq!(exporter.beats_to_ticks(0.5), 240);
        assert_eq!(exporter.beats_to_ticks(3.0), 1440);
        assert_eq!(exporter.beats_to_ticks(-1.0), 0);
    }

    #[test]
    fn test_export_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.mid");

        let mut exporter = MidiExporter::new();
        let mut track = ExportTrack::new("Piano", 0).with_program(0);
        track.add_note(ExportNote::new(0, 60, 100, 480));
        exporter.add_track(track);
        exporter.export(&path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes, exporter.export_to_bytes());
    }
}
