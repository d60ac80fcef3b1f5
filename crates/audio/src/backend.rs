use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{anyhow, bail, Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, Stream};
use tracing::{debug, error, info, warn};

use crate::renderer::{SilentRenderer, SoundRenderer};
use crate::soundfont::SoundfontConfig;
use crate::voice::{Timbre, VoiceBank};

/// Synthesizes notes on the default output device.
pub struct ToneRenderer {
    bank: Arc<Mutex<VoiceBank>>,
    config: SoundfontConfig,
    _stream: Stream,
}

impl ToneRenderer {
    pub fn open(config: &SoundfontConfig) -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| anyhow!("no default output device"))?;
        let supported = device
            .default_output_config()
            .context("query default output config")?;
        let sample_format = supported.sample_format();
        let stream_config: cpal::StreamConfig = supported.into();
        let channels = usize::from(stream_config.channels);
        let sample_rate = stream_config.sample_rate.0 as f32;

        let bank = Arc::new(Mutex::new(VoiceBank::new(timbre_for(config))));
        let shared = Arc::clone(&bank);
        let on_error = |err: cpal::StreamError| error!(?err, "audio output stream error");

        let stream = match sample_format {
            SampleFormat::F32 => device.build_output_stream(
                &stream_config,
                move |data: &mut [f32], _| {
                    lock(&shared).render(data, channels, sample_rate);
                },
                on_error,
                None,
            )?,
            SampleFormat::I16 => {
                let mut scratch = Vec::new();
                device.build_output_stream(
                    &stream_config,
                    move |data: &mut [i16], _| {
                        scratch.resize(data.len(), 0.0f32);
                        lock(&shared).render(&mut scratch, channels, sample_rate);
                        for (out, sample) in data.iter_mut().zip(&scratch) {
                            *out = (sample * f32::from(i16::MAX)) as i16;
                        }
                    },
                    on_error,
                    None,
                )?
            }
            SampleFormat::U16 => {
                let mut scratch = Vec::new();
                device.build_output_stream(
                    &stream_config,
                    move |data: &mut [u16], _| {
                        let center = f32::from(u16::MAX / 2);
                        scratch.resize(data.len(), 0.0f32);
                        lock(&shared).render(&mut scratch, channels, sample_rate);
                        for (out, sample) in data.iter_mut().zip(&scratch) {
                            *out = (sample * center + center).clamp(0.0, f32::from(u16::MAX)) as u16;
                        }
                    },
                    on_error,
                    None,
                )?
            }
            other => bail!("unsupported sample format {other:?}"),
        };
        stream.play().context("start output stream")?;
        info!(
            instrument = %config,
            source = %config.source_url(),
            channels,
            sample_rate,
            "audio output ready"
        );

        Ok(Self {
            bank,
            config: config.clone(),
            _stream: stream,
        })
    }
}

/// Unknown instruments fall back to the grand piano timbre.
fn timbre_for(config: &SoundfontConfig) -> Timbre {
    if !config.is_known_instrument() {
        warn!(instrument = %config.instrument, "unknown instrument, using grand piano");
    }
    Timbre::for_instrument(&config.instrument)
}

fn lock(bank: &Mutex<VoiceBank>) -> std::sync::MutexGuard<'_, VoiceBank> {
    bank.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SoundRenderer for ToneRenderer {
    fn play_note(&mut self, note: u8) {
        lock(&self.bank).note_on(note);
    }

    fn stop_note(&mut self, note: u8) {
        lock(&self.bank).note_off(note);
    }

    fn set_instrument(&mut self, config: &SoundfontConfig) {
        if config.instrument == self.config.instrument {
            return;
        }
        debug!(from = %self.config, to = %config, source = %config.source_url(), "switching instrument");
        lock(&self.bank).set_timbre(timbre_for(config));
        self.config = config.clone();
    }
}

/// Opens the output device, or a silent renderer when there is none.
pub fn open_renderer(config: &SoundfontConfig) -> Box<dyn SoundRenderer> {
    match ToneRenderer::open(config) {
        Ok(renderer) => Box::new(renderer),
        Err(err) => {
            warn!(?err, "no audio output, notes will be silent");
            Box::new(SilentRenderer)
        }
    }
}
