use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

pub const NOTE_ON: u8 = 144;
pub const NOTE_OFF: u8 = 128;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MidiCommand {
    NoteOn(u8),
    NoteOff(u8),
    Other,
}

/// Raw payload delivered by a MIDI input: command byte first, note second.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct MidiMessage {
    pub message: Vec<u8>,
}

impl MidiMessage {
    pub fn new(message: impl Into<Vec<u8>>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn note_on(note: u8, velocity: u8) -> Self {
        Self::new([NOTE_ON, note, velocity])
    }

    pub fn note_off(note: u8) -> Self {
        Self::new([NOTE_OFF, note, 0])
    }

    /// Only the exact note-on/note-off command bytes are recognised.
    pub fn command(&self) -> MidiCommand {
        match self.message.as_slice() {
            [NOTE_ON, note, ..] => MidiCommand::NoteOn(*note),
            [NOTE_OFF, note, ..] => MidiCommand::NoteOff(*note),
            _ => MidiCommand::Other,
        }
    }
}

/// Note number to "currently pressed". A `false` entry means the same as no
/// entry at all.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ActiveNotes {
    notes: BTreeMap<u8, bool>,
}

impl ActiveNotes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, note: u8, pressed: bool) {
        self.notes.insert(note, pressed);
    }

    /// Applies a message and reports whether it touched the mapping.
    pub fn apply(&mut self, message: &MidiMessage) -> bool {
        match message.command() {
            MidiCommand::NoteOn(note) => {
                self.set(note, true);
                true
            }
            MidiCommand::NoteOff(note) => {
                self.set(note, false);
                true
            }
            MidiCommand::Other => false,
        }
    }

    pub fn get(&self, note: u8) -> Option<bool> {
        self.notes.get(&note).copied()
    }

    pub fn is_active(&self, note: u8) -> bool {
        self.get(note).unwrap_or(false)
    }

    pub fn active(&self) -> BTreeSet<u8> {
        self.notes
            .iter()
            .filter(|(_, pressed)| **pressed)
            .map(|(note, _)| *note)
            .collect()
    }

    pub fn clear(&mut self) {
        self.notes.clear();
    }
}

impl FromIterator<(u8, bool)> for ActiveNotes {
    fn from_iter<I: IntoIterator<Item = (u8, bool)>>(iter: I) -> Self {
        Self {
            notes: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_on_then_off() {
        let mut notes = ActiveNotes::new();
        assert!(notes.apply(&MidiMessage::new([144, 60, 100])));
        assert_eq!(notes.get(60), Some(true));
        assert!(notes.apply(&MidiMessage::new([128, 60, 0])));
        assert_eq!(notes.get(60), Some(false));
        assert!(notes.active().is_empty());
    }

    #[test]
    fn other_commands_are_ignored() {
        let mut notes = ActiveNotes::new();
        assert!(!notes.apply(&MidiMessage::new([176, 64, 127])));
        assert!(!notes.apply(&MidiMessage::new([144])));
        assert!(!notes.apply(&MidiMessage::new(Vec::<u8>::new())));
        assert_eq!(notes, ActiveNotes::new());
    }

    #[test]
    fn zero_velocity_note_on_still_presses() {
        let mut notes = ActiveNotes::new();
        notes.apply(&MidiMessage::note_on(60, 0));
        assert!(notes.is_active(60));
        notes.apply(&MidiMessage::note_off(60));
        assert!(!notes.is_active(60));
    }

    #[test]
    fn active_filters_released_notes() {
        let notes: ActiveNotes = [(60, true), (62, false), (64, true)].into_iter().collect();
        assert_eq!(notes.active(), BTreeSet::from([60, 64]));
        assert!(!notes.is_active(62));
        assert!(!notes.is_active(70));
    }
}
