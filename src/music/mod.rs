// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Music theory utilities.

pub mod pitch;

pub use pitch::{midi_to_name, name_to_midi, pitch_class_to_midi, MidiNote, Note, Pitch};
