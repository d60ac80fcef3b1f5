pub mod backend;
pub mod renderer;
pub mod soundfont;
pub mod voice;

pub use backend::{open_renderer, ToneRenderer};
pub use renderer::{Muted, SilentRenderer, SoundRenderer};
pub use soundfont::{AudioFormat, Soundfont, SoundfontConfig, INSTRUMENTS};
pub use voice::{Timbre, VoiceBank};
