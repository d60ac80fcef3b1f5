pub mod keyboard;
pub mod midi;
pub mod session;

pub use keyboard::{KeyboardView, DEFAULT_INPUT_INDEX};
pub use midi::{Drained, MidiBridge, MidiDevice, MidiManager, MidiSubscription, MidirBridge};
pub use session::{PracticeSession, TrainerContext};
