use std::fmt;

use serde::{Deserialize, Serialize};

/// Piano sounds offered in settings, named as in the General MIDI soundfonts.
pub const INSTRUMENTS: [&str; 7] = [
    "acoustic_grand_piano",
    "bright_acoustic_piano",
    "electric_grand_piano",
    "honkytonk_piano",
    "electric_piano_1",
    "electric_piano_2",
    "harpsichord",
];

pub const DEFAULT_SOUND_HOST: &str = "https://d1pzp51pvbm36p.cloudfront.net";

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum AudioFormat {
    Mp3,
    Ogg,
}

impl AudioFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Ogg => "ogg",
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Soundfont {
    MusyngKite,
    FluidR3Gm,
}

impl Soundfont {
    pub fn as_str(self) -> &'static str {
        match self {
            Soundfont::MusyngKite => "MusyngKite",
            Soundfont::FluidR3Gm => "FluidR3_GM",
        }
    }
}

/// Describes which sampled instrument a renderer stands in for.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SoundfontConfig {
    pub instrument: String,
    pub host: String,
    pub format: AudioFormat,
    pub soundfont: Soundfont,
}

impl SoundfontConfig {
    pub fn for_instrument(instrument: impl Into<String>) -> Self {
        Self {
            instrument: instrument.into(),
            ..Self::default()
        }
    }

    /// Location of the instrument's sample bank.
    pub fn source_url(&self) -> String {
        format!(
            "{}/{}/{}-{}.js",
            self.host.trim_end_matches('/'),
            self.soundfont.as_str(),
            self.instrument,
            self.format.as_str()
        )
    }

    pub fn is_known_instrument(&self) -> bool {
        INSTRUMENTS.contains(&self.instrument.as_str())
    }
}

impl Default for SoundfontConfig {
    fn default() -> Self {
        Self {
            instrument: INSTRUMENTS[0].to_string(),
            host: DEFAULT_SOUND_HOST.to_string(),
            format: AudioFormat::Mp3,
            soundfont: Soundfont::MusyngKite,
        }
    }
}

impl fmt::Display for SoundfontConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.instrument, self.soundfont.as_str())
    }
}
