pub mod piano;
pub mod theme;

pub use piano::{PianoInput, PianoKeyboard};
