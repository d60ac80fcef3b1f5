use std::f32::consts::TAU;

use ivory_domain::notes::note_frequency;

const MAX_VOICES: usize = 16;
const SILENCE: f32 = 1e-4;

/// Additive stand-in for a sampled instrument.
#[derive(Clone, Debug, PartialEq)]
pub struct Timbre {
    /// Relative amplitude of the fundamental and each overtone.
    pub partials: Vec<f32>,
    /// Exponential decay rate while held, per second.
    pub decay: f32,
    pub release_secs: f32,
}

impl Timbre {
    pub fn for_instrument(name: &str) -> Self {
        let (partials, decay, release_secs): (&[f32], f32, f32) = match name {
            "bright_acoustic_piano" => (&[1.0, 0.7, 0.45, 0.3, 0.15], 1.3, 0.25),
            "electric_grand_piano" => (&[1.0, 0.5, 0.35, 0.1], 1.0, 0.3),
            "honkytonk_piano" => (&[1.0, 0.65, 0.3, 0.2], 1.1, 0.2),
            "electric_piano_1" | "electric_piano_2" => (&[1.0, 0.3, 0.05], 0.8, 0.4),
            "harpsichord" => (&[1.0, 0.8, 0.6, 0.45, 0.3, 0.2], 2.5, 0.08),
            _ => (&[1.0, 0.5, 0.25, 0.12], 1.2, 0.3),
        };
        Self {
            partials: partials.to_vec(),
            decay,
            release_secs,
        }
    }
}

impl Default for Timbre {
    fn default() -> Self {
        Self::for_instrument("acoustic_grand_piano")
    }
}

#[derive(Clone, Debug)]
struct Voice {
    note: u8,
    frequency: f32,
    age: f32,
    released_for: Option<f32>,
}

impl Voice {
    fn envelope(&self, timbre: &Timbre) -> f32 {
        let held = (-timbre.decay * self.age).exp();
        match self.released_for {
            Some(elapsed) if timbre.release_secs > 0.0 => {
                held * (1.0 - elapsed / timbre.release_secs).max(0.0)
            }
            Some(_) => 0.0,
            None => held,
        }
    }
}

/// The set of notes currently sounding.
#[derive(Clone, Debug)]
pub struct VoiceBank {
    voices: Vec<Voice>,
    timbre: Timbre,
    gain: f32,
}

impl VoiceBank {
    pub fn new(timbre: Timbre) -> Self {
        Self {
            voices: Vec::new(),
            timbre,
            gain: 0.25,
        }
    }

    pub fn set_timbre(&mut self, timbre: Timbre) {
        self.timbre = timbre;
    }

    pub fn set_gain(&mut self, gain: f32) {
        self.gain = gain.clamp(0.0, 1.0);
    }

    /// Starts `note`, retriggering it if it already sounds.
    pub fn note_on(&mut self, note: u8) {
        self.voices.retain(|voice| voice.note != note);
        if self.voices.len() >= MAX_VOICES {
            self.voices.remove(0);
        }
        self.voices.push(Voice {
            note,
            frequency: note_frequency(note),
            age: 0.0,
            released_for: None,
        });
    }

    pub fn note_off(&mut self, note: u8) {
        for voice in self.voices.iter_mut().filter(|v| v.note == note) {
            voice.released_for.get_or_insert(0.0);
        }
    }

    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }

    pub fn is_sounding(&self, note: u8) -> bool {
        self.voices.iter().any(|voice| voice.note == note)
    }

    /// Fills an interleaved buffer, writing the same sample to every channel.
    pub fn render(&mut self, out: &mut [f32], channels: usize, sample_rate: f32) {
        let channels = channels.max(1);
        let step = 1.0 / sample_rate;
        for frame in out.chunks_mut(channels) {
            let mut sample = 0.0f32;
            for voice in &mut self.voices {
                let envelope = voice.envelope(&self.timbre);
                let mut tone = 0.0f32;
                for (index, weight) in self.timbre.partials.iter().enumerate() {
                    let harmonic = (index + 1) as f32;
                    tone += weight * (TAU * voice.frequency * harmonic * voice.age).sin();
                }
                sample += tone * envelope;
                voice.age += step;
                if let Some(elapsed) = voice.released_for.as_mut() {
                    *elapsed += step;
                }
            }
            let timbre = &self.timbre;
            self.voices.retain(|voice| voice.envelope(timbre) > SILENCE);
            let value = (sample * self.gain).tanh();
            for slot in frame.iter_mut() {
                *slot = value;
            }
        }
    }
}

impl Default for VoiceBank {
    fn default() -> Self {
        Self::new(Timbre::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATE: f32 = 48_000.0;

    #[test]
    fn held_note_produces_signal() {
        let mut bank = VoiceBank::default();
        bank.note_on(69);
        let mut buffer = vec![0.0f32; 512];
        bank.render(&mut buffer, 2, RATE);
        assert!(buffer.iter().any(|s| s.abs() > 0.01));
        assert!(buffer.iter().all(|s| s.abs() <= 1.0));
        assert_eq!(buffer[10], buffer[11]);
    }

    #[test]
    fn released_note_fades_out() {
        let mut bank = VoiceBank::new(Timbre::for_instrument("harpsichord"));
        bank.note_on(60);
        bank.note_off(60);
        let mut buffer = vec![0.0f32; (RATE * 0.2) as usize];
        bank.render(&mut buffer, 1, RATE);
        assert_eq!(bank.active_voices(), 0);
        assert_eq!(*buffer.last().unwrap(), 0.0);
    }

    #[test]
    fn retrigger_keeps_one_voice() {
        let mut bank = VoiceBank::default();
        bank.note_on(60);
        bank.note_on(60);
        assert_eq!(bank.active_voices(), 1);
        assert!(bank.is_sounding(60));
    }

    #[test]
    fn polyphony_is_capped() {
        let mut bank = VoiceBank::default();
        for note in 40..80 {
            bank.note_on(note);
        }
        assert_eq!(bank.active_voices(), MAX_VOICES);
        assert!(!bank.is_sounding(40));
        assert!(bank.is_sounding(79));
    }

    #[test]
    fn unknown_instrument_uses_grand_piano() {
        assert_eq!(Timbre::for_instrument("kazoo"), Timbre::default());
    }
}
