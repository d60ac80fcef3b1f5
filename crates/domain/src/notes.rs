use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

const PITCH_NAMES: [&str; 12] = [
    "C", "Db", "D", "Eb", "E", "F", "Gb", "G", "Ab", "A", "Bb", "B",
];

/// Home-row shortcut slots as `(natural, flat)` pairs.
const HOME_ROW: [(char, char); 11] = [
    ('a', 'q'),
    ('s', 'w'),
    ('d', 'e'),
    ('f', 'r'),
    ('g', 't'),
    ('h', 'y'),
    ('j', 'u'),
    ('k', 'i'),
    ('l', 'o'),
    (';', 'p'),
    ('\'', '['),
];

pub const MAX_MIDI_NOTE: u8 = 127;

/// Returns true for the five accidentals of each octave.
pub fn is_black_key(note: u8) -> bool {
    matches!(note % 12, 1 | 3 | 6 | 8 | 10)
}

/// Scientific pitch name using flats, with MIDI 12 as `C0`.
pub fn note_name(note: u8) -> String {
    let octave = i16::from(note / 12) - 1;
    format!("{}{}", PITCH_NAMES[usize::from(note % 12)], octave)
}

/// Display label for a key: the note name without its octave.
pub fn note_label(note: u8) -> String {
    note_name(note)
        .trim_end_matches(|c: char| c.is_ascii_digit() || c == '-')
        .to_string()
}

/// Frequency in Hz under twelve-tone equal temperament with A4 = 440.
pub fn note_frequency(note: u8) -> f32 {
    440.0 * 2f32.powf((f32::from(note) - 69.0) / 12.0)
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct NoteRange {
    pub first: u8,
    pub last: u8,
}

impl NoteRange {
    pub const C3: u8 = 48;
    pub const C5: u8 = 72;

    pub fn new(first: u8, last: u8) -> Result<Self, DomainError> {
        if last > MAX_MIDI_NOTE {
            return Err(DomainError::validation(format!(
                "note {} is outside the MIDI range",
                last
            )));
        }
        if first > last {
            return Err(DomainError::validation(format!(
                "range start {} is above its end {}",
                first, last
            )));
        }
        Ok(Self { first, last })
    }

    /// The two octaves the trainer keyboard shows.
    pub fn practice() -> Self {
        Self {
            first: Self::C3,
            last: Self::C5,
        }
    }

    pub fn notes(&self) -> RangeInclusive<u8> {
        self.first..=self.last
    }

    pub fn contains(&self, note: u8) -> bool {
        self.notes().contains(&note)
    }

    pub fn white_key_count(&self) -> usize {
        self.notes().filter(|note| !is_black_key(*note)).count()
    }
}

impl Default for NoteRange {
    fn default() -> Self {
        Self::practice()
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeyShortcut {
    pub key: char,
    pub note: u8,
}

impl KeyShortcut {
    /// Assigns home-row keys upward from the first note of `range`.
    ///
    /// White keys consume a slot's natural key; black keys borrow the flat key
    /// of the slot the next white key would take. Assignment stops once every
    /// slot is used.
    pub fn home_row(range: &NoteRange) -> Vec<KeyShortcut> {
        let mut shortcuts = Vec::new();
        let mut slot = 0usize;
        for note in range.notes() {
            let Some(&(natural, flat)) = HOME_ROW.get(slot) else {
                break;
            };
            if is_black_key(note) {
                shortcuts.push(KeyShortcut { key: flat, note });
            } else {
                shortcuts.push(KeyShortcut { key: natural, note });
                slot += 1;
            }
        }
        shortcuts
    }

    pub fn for_note(shortcuts: &[KeyShortcut], note: u8) -> Option<char> {
        shortcuts.iter().find(|s| s.note == note).map(|s| s.key)
    }

    pub fn for_key(shortcuts: &[KeyShortcut], key: char) -> Option<u8> {
        let key = key.to_ascii_lowercase();
        shortcuts.iter().find(|s| s.key == key).map(|s| s.note)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_use_flats_and_octaves() {
        assert_eq!(note_name(12), "C0");
        assert_eq!(note_name(48), "C3");
        assert_eq!(note_name(61), "Db4");
        assert_eq!(note_name(72), "C5");
        assert_eq!(note_name(0), "C-1");
    }

    #[test]
    fn labels_strip_octave() {
        assert_eq!(note_label(61), "Db");
        assert_eq!(note_label(0), "C");
        assert_eq!(note_label(127), "G");
    }

    #[test]
    fn practice_range_is_two_octaves() {
        let range = NoteRange::practice();
        assert_eq!(range.notes().count(), 25);
        assert_eq!(range.white_key_count(), 15);
        assert!(range.contains(60));
        assert!(!range.contains(73));
    }

    #[test]
    fn range_rejects_inverted_bounds() {
        assert!(NoteRange::new(60, 48).is_err());
        assert!(NoteRange::new(0, 128).is_err());
    }

    #[test]
    fn home_row_covers_lower_octave_and_a_half() {
        let shortcuts = KeyShortcut::home_row(&NoteRange::practice());
        assert_eq!(KeyShortcut::for_note(&shortcuts, 48), Some('a'));
        assert_eq!(KeyShortcut::for_note(&shortcuts, 49), Some('w'));
        assert_eq!(KeyShortcut::for_note(&shortcuts, 54), Some('t'));
        assert_eq!(KeyShortcut::for_note(&shortcuts, 60), Some('k'));
        assert_eq!(KeyShortcut::for_note(&shortcuts, 65), Some('\''));
        // slots run out after F4
        assert_eq!(KeyShortcut::for_note(&shortcuts, 66), None);
        assert_eq!(KeyShortcut::for_key(&shortcuts, 'K'), Some(60));
    }

    #[test]
    fn a4_is_440() {
        assert!((note_frequency(69) - 440.0).abs() < 1e-3);
    }
}
