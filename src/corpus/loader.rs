// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! MIDI file tokenization.
//!
//! Each file is parsed on its own. Note-ons are placed on one absolute tick
//! timeline and grouped by onset: a lone key becomes a note token, several
//! keys become a chord token. A file that fails to parse is reported and
//! skipped; it never aborts the load.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use midly::{MidiMessage, Smf, Timing, TrackEventKind};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::token::Token;
use super::Corpus;
use crate::music::pitch::MidiNote;

/// General MIDI percussion channel (channel 10, zero-based)
pub const PERCUSSION_CHANNEL: u8 = 9;

/// Why a single file was skipped
#[derive(Debug, Clone, PartialEq, Error)]
#[error("failed to parse {path:?}: {reason}")]
pub struct FileParseError {
    pub path: PathBuf,
    pub reason: String,
}

/// Outcome of loading one file
#[derive(Debug, Clone, PartialEq)]
pub enum FileOutcome {
    /// Parsed; this many tokens were appended
    Loaded { tokens: usize },
    /// Skipped
    Failed(FileParseError),
}

/// Per-file entry of a load report
#[derive(Debug, Clone, PartialEq)]
pub struct FileReport {
    pub path: PathBuf,
    pub outcome: FileOutcome,
}

/// Aggregate result of a load, in file-list order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub files: Vec<FileReport>,
}

impl LoadReport {
    /// Number of files that parsed
    pub fn loaded_count(&self) -> usize {
        self.files
            .iter()
            .filter(|f| matches!(f.outcome, FileOutcome::Loaded { .. }))
            .count()
    }

    /// Number of files that were skipped
    pub fn failed_count(&self) -> usize {
        self.files.len() - self.loaded_count()
    }

    /// Total tokens appended to the corpus
    pub fn tokens_added(&self) -> usize {
        self.files
            .iter()
            .map(|f| match f.outcome {
                FileOutcome::Loaded { tokens } => tokens,
                FileOutcome::Failed(_) => 0,
            })
            .sum()
    }

    /// Errors of the skipped files
    pub fn failures(&self) -> impl Iterator<Item = &FileParseError> {
        self.files.iter().filter_map(|f| match &f.outcome {
            FileOutcome::Failed(err) => Some(err),
            FileOutcome::Loaded { .. } => None,
        })
    }
}

/// Loader options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoaderOptions {
    /// Ignore notes on the percussion channel
    pub skip_percussion: bool,
    /// Tokenize only the first track that contains notes
    pub first_part_only: bool,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            skip_percussion: true,
            first_part_only: false,
        }
    }
}

/// Parses MIDI files into corpus tokens
#[derive(Debug, Clone, Default)]
pub struct CorpusLoader {
    options: LoaderOptions,
}

impl CorpusLoader {
    pub fn new(options: LoaderOptions) -> Self {
        Self { options }
    }

    /// Load every file in order, appending tokens to the corpus
    pub fn load_into<P: AsRef<Path>>(&self, paths: &[P], corpus: &mut Corpus) -> LoadReport {
        info!(files = paths.len(), "loading MIDI files");
        let mut report = LoadReport::default();

        for path in paths {
            let path = path.as_ref();
            debug!(?path, "parsing");
            let outcome = match self.tokenize_file(path) {
                Ok(tokens) => {
                    let count = tokens.len();
                    corpus.extend(tokens);
                    debug!(?path, tokens = count, "parsed");
                    FileOutcome::Loaded { tokens: count }
                }
                Err(err) => {
                    warn!(?path, reason = %err.reason, "skipping file");
                    FileOutcome::Failed(err)
                }
            };
            report.files.push(FileReport {
                path: path.to_path_buf(),
                outcome,
            });
        }

        info!(
            loaded = report.loaded_count(),
            failed = report.failed_count(),
            tokens = report.tokens_added(),
            corpus = corpus.len(),
            "load complete"
        );
        report
    }

    /// Tokenize one file
    pub fn tokenize_file(&self, path: &Path) -> Result<Vec<Token>, FileParseError> {
        let fail = |reason: String| FileParseError {
            path: path.to_path_buf(),
            reason,
        };
        let bytes = fs::read(path).map_err(|e| fail(e.to_string()))?;
        self.tokenize_bytes(&bytes).map_err(fail)
    }

    /// Tokenize an in-memory MIDI file
    pub fn tokenize_bytes(&self, bytes: &[u8]) -> Result<Vec<Token>, String> {
        let smf = Smf::parse(bytes).map_err(|e| e.to_string())?;
        if let Timing::Timecode(..) = smf.header.timing {
            debug!("SMPTE timing; onsets grouped by raw tick");
        }
        let sequential = matches!(smf.header.format, midly::Format::Sequential);

        let mut onsets: BTreeMap<u64, Vec<MidiNote>> = BTreeMap::new();
        let mut track_start = 0u64;

        for track in &smf.tracks {
            let mut tick = track_start;
            let mut found = false;

            for event in track {
                tick += event.delta.as_int() as u64;
                if let TrackEventKind::Midi { channel, message } = event.kind {
                    if self.options.skip_percussion && channel.as_int() == PERCUSSION_CHANNEL {
                        continue;
                    }
                    if let MidiMessage::NoteOn { key, vel } = message {
                        // Velocity 0 is a note-off
                        if vel.as_int() > 0 {
                            onsets.entry(tick).or_default().push(key.as_int());
                            found = true;
                        }
                    }
                }
            }

            if sequential {
                track_start = tick;
            }
            if found && self.options.first_part_only {
                break;
            }
        }

        Ok(onsets
            .values()
            .filter_map(|keys| Token::from_onset(keys))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::export::{ExportNote, ExportTrack, MidiExporter, MidiFileFormat};
    use tempfile::tempdir;

    fn smf_bytes(tracks: Vec<ExportTrack>, format: MidiFileFormat) -> Vec<u8> {
        let mut exporter = MidiExporter::new();
        exporter.set_format(format);
        for track in tracks {
            exporter.add_track(track);
        }
        exporter.export_to_bytes()
    }

    fn melody_track() -> ExportTrack {
        let mut track = ExportTrack::new("Melody", 0);
        track.add_note(ExportNote::new(0, 60, 100, 240));
        track.add_note(ExportNote::new(480, 64, 100, 240));
        // C major triad
        track.add_note(ExportNote::new(960, 60, 100, 240));
        track.add_note(ExportNote::new(960, 64, 100, 240));
        track.add_note(ExportNote::new(960, 67, 100, 240));
        track
    }

    #[test]
    fn test_tokenize_notes_and_chords() {
        let loader = CorpusLoader::default();
        let bytes = smf_bytes(vec![melody_track()], MidiFileFormat::Type0);
        let tokens = loader.tokenize_bytes(&bytes).unwrap();

        assert_eq!(
            tokens,
            vec![
                Token::Note("C4".to_string()),
                Token::Note("E4".to_string()),
                Token::Chord(vec![0, 4, 7]),
            ]
        );
    }

    #[test]
    fn test_percussion_skipped() {
        let mut drums = ExportTrack::new("Drums", PERCUSSION_CHANNEL);
        drums.add_note(ExportNote::new(240, 36, 100, 24));
        let bytes = smf_bytes(vec![melody_track(), drums], MidiFileFormat::Type1);

        let tokens = CorpusLoader::default().tokenize_bytes(&bytes).unwrap();
        assert_eq!(tokens.len(), 3);

        let loader = CorpusLoader::new(LoaderOptions {
            skip_percussion: false,
            first_part_only: false,
        });
        let tokens = loader.tokenize_bytes(&bytes).unwrap();
        assert_eq!(tokens.len(), 4);
        assert_eq!(tokens[1], Token::Note("C2".to_string()));
    }

    #[test]
    fn test_tracks_merge_on_one_timeline() {
        let mut bass = ExportTrack::new("Bass", 1);
        bass.add_note(ExportNote::new(0, 36, 100, 480));
        let bytes = smf_bytes(vec![melody_track(), bass.clone()], MidiFileFormat::Type1);

        let tokens = CorpusLoader::default().tokenize_bytes(&bytes).unwrap();
        // C4 and C2 start together
        assert_eq!(tokens[0], Token::Chord(vec![0]));

        let first_only = CorpusLoader::new(LoaderOptions {
            skip_percussion: true,
            first_part_only: true,
        });
        let tokens = first_only.tokenize_bytes(&bytes).unwrap();
        assert_eq!(tokens[0], Token::Note("C4".to_string()));
        assert_eq!(tokens.len(), 3);
    }

    #[test]
    fn test_garbage_is_error() {
        let loader = CorpusLoader::default();
        assert!(loader.tokenize_bytes(b"definitely not midi").is_err());
    }

    #[test]
    fn test_failed_file_is_skipped() {
        let dir = tempdir().unwrap();
        let good = dir.path().join("good.mid");
        let bad = dir.path().join("bad.mid");
        let missing = dir.path().join("missing.mid");
        fs::write(&good, smf_bytes(vec![melody_track()], MidiFileFormat::Type0)).unwrap();
        fs::write(&bad, b"MThd garbage").unwrap();

        let mut corpus = Corpus::new();
        let report = CorpusLoader::default().load_into(&[&bad, &good, &missing], &mut corpus);

        assert_eq!(report.files.len(), 3);
        assert_eq!(report.loaded_count(), 1);
        assert_eq!(report.failed_count(), 2);
        assert_eq!(report.tokens_added(), 3);
        assert_eq!(corpus.len(), 3);
        assert_eq!(report.failures().next().unwrap().path, bad);
    }

    #[test]
    fn test_files_append_in_order() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.mid");
        let b = dir.path().join("b.mid");
        let mut single = ExportTrack::new("Single", 0);
        single.add_note(ExportNote::new(0, 69, 100, 240));
        fs::write(&a, smf_bytes(vec![single], MidiFileFormat::Type0)).unwrap();
        fs::write(&b, smf_bytes(vec![melody_track()], MidiFileFormat::Type0)).unwrap();

        let mut corpus = Corpus::new();
        let loader = CorpusLoader::default();
        loader.load_into(&[&b, &a], &mut corpus);
        loader.load_into(&[&a], &mut corpus);

        let keys: Vec<String> = corpus.iter().map(Token::key).collect();
        assert_eq!(keys, vec!["C4", "E4", "0.4.7", "A4", "A4"]);
    }
}
