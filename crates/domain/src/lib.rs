pub mod error;
pub mod events;
pub mod notes;
pub mod preferences;

pub use crate::error::DomainError;
pub use crate::events::{ActiveNotes, MidiCommand, MidiMessage};
pub use crate::notes::{note_label, note_name, KeyShortcut, NoteRange};
pub use crate::preferences::{PreferenceKey, PreferenceValue, Preferences};
