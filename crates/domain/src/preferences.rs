use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DomainError;

pub const DEFAULT_PIANO_SOUND: &str = "acoustic_grand_piano";

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum PreferenceKey {
    PianoSound,
    ShowKeyboard,
    MuteSound,
}

impl PreferenceKey {
    pub const ALL: [PreferenceKey; 3] = [
        PreferenceKey::PianoSound,
        PreferenceKey::ShowKeyboard,
        PreferenceKey::MuteSound,
    ];

    /// Name under which the preference is persisted.
    pub fn as_str(self) -> &'static str {
        match self {
            PreferenceKey::PianoSound => "piano-sound",
            PreferenceKey::ShowKeyboard => "show-keyboard",
            PreferenceKey::MuteSound => "mute-sound",
        }
    }

    /// Coerces a stored value into this key's type.
    ///
    /// `null` counts as absent. Booleans accept JSON booleans, numbers
    /// (non-zero is true) and strings (non-empty is true). The piano sound
    /// only accepts strings.
    pub fn coerce(self, value: &Value) -> Option<PreferenceValue> {
        match self {
            PreferenceKey::PianoSound => match value {
                Value::String(name) => Some(PreferenceValue::PianoSound(name.clone())),
                _ => None,
            },
            PreferenceKey::ShowKeyboard => coerce_bool(value).map(PreferenceValue::ShowKeyboard),
            PreferenceKey::MuteSound => coerce_bool(value).map(PreferenceValue::MuteSound),
        }
    }
}

fn coerce_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(flag) => Some(*flag),
        Value::Number(number) => Some(number.as_f64().map_or(false, |n| n != 0.0)),
        Value::String(text) => Some(!text.is_empty()),
        _ => None,
    }
}

impl fmt::Display for PreferenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PreferenceKey {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PreferenceKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| DomainError::UnknownPreference(s.to_string()))
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum PreferenceValue {
    PianoSound(String),
    ShowKeyboard(bool),
    MuteSound(bool),
}

impl PreferenceValue {
    pub fn key(&self) -> PreferenceKey {
        match self {
            PreferenceValue::PianoSound(_) => PreferenceKey::PianoSound,
            PreferenceValue::ShowKeyboard(_) => PreferenceKey::ShowKeyboard,
            PreferenceValue::MuteSound(_) => PreferenceKey::MuteSound,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            PreferenceValue::PianoSound(name) => Value::String(name.clone()),
            PreferenceValue::ShowKeyboard(flag) | PreferenceValue::MuteSound(flag) => {
                Value::Bool(*flag)
            }
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Preferences {
    pub piano_sound: String,
    pub show_keyboard: bool,
    pub mute_sound: bool,
}

impl Preferences {
    pub fn get(&self, key: PreferenceKey) -> PreferenceValue {
        match key {
            PreferenceKey::PianoSound => PreferenceValue::PianoSound(self.piano_sound.clone()),
            PreferenceKey::ShowKeyboard => PreferenceValue::ShowKeyboard(self.show_keyboard),
            PreferenceKey::MuteSound => PreferenceValue::MuteSound(self.mute_sound),
        }
    }

    /// Stores `value`, returning whether anything changed.
    pub fn apply(&mut self, value: PreferenceValue) -> bool {
        match value {
            PreferenceValue::PianoSound(name) => replace_if_changed(&mut self.piano_sound, name),
            PreferenceValue::ShowKeyboard(flag) => replace_if_changed(&mut self.show_keyboard, flag),
            PreferenceValue::MuteSound(flag) => replace_if_changed(&mut self.mute_sound, flag),
        }
    }
}

fn replace_if_changed<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            piano_sound: DEFAULT_PIANO_SOUND.to_string(),
            show_keyboard: true,
            mute_sound: false,
        }
    }
}
