use std::collections::BTreeSet;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::time::Duration;

use eframe::{egui, egui::Ui};
use ivory_audio::{open_renderer, Muted, SoundRenderer, SoundfontConfig, INSTRUMENTS};
use ivory_domain::notes::note_name;
use ivory_domain::{PreferenceValue, Preferences};
use ivory_settings::{JsonFileStore, SettingsProvider};
use ivory_tutor::{KeyboardView, MidiDevice, MidiManager, MidirBridge, PracticeSession, TrainerContext};
use ivory_ui::{theme as ui_theme, PianoKeyboard};
use tokio::runtime::Runtime;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const SETTINGS_FILE: &str = "settings.json";

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let rt = Arc::new(Runtime::new()?);
    let options = eframe::NativeOptions::default();
    eframe::run_native(
        "Ivory",
        options,
        Box::new(move |cc| {
            ui_theme::apply(&cc.egui_ctx);
            Box::new(DesktopApp::new(rt, cc.egui_ctx.clone()))
        }),
    )
    .map_err(|e| anyhow::anyhow!(format!("{e:?}")))?;
    Ok(())
}

type Settings = SettingsProvider<JsonFileStore>;

enum SettingsState {
    Loading(Receiver<Settings>),
    Ready(Settings),
}

struct DesktopApp {
    runtime: Arc<Runtime>,
    settings: SettingsState,
    trainer: Option<TrainerPane>,
}

impl DesktopApp {
    fn new(runtime: Arc<Runtime>, ctx: egui::Context) -> Self {
        let (tx, rx) = mpsc::channel();
        let mut provider = SettingsProvider::new(settings_store());
        runtime.spawn(async move {
            provider.load().await;
            let _ = tx.send(provider);
            ctx.request_repaint();
        });
        Self {
            runtime,
            settings: SettingsState::Loading(rx),
            trainer: None,
        }
    }

    /// Returns true once the settings are available.
    fn poll_settings(&mut self) -> bool {
        let SettingsState::Loading(rx) = &self.settings else {
            return true;
        };
        let provider = match rx.try_recv() {
            Ok(provider) => provider,
            Err(TryRecvError::Empty) => return false,
            Err(TryRecvError::Disconnected) => {
                error!("settings loader stopped without reporting back");
                let mut provider = SettingsProvider::new(settings_store());
                self.runtime.block_on(provider.load());
                provider
            }
        };
        self.trainer = Some(TrainerPane::mount(provider.preferences()));
        self.settings = SettingsState::Ready(provider);
        true
    }
}

fn settings_store() -> JsonFileStore {
    match JsonFileStore::in_config_dir(SETTINGS_FILE) {
        Ok(store) => store,
        Err(err) => {
            warn!(?err, "falling back to a settings file in the working directory");
            JsonFileStore::new(SETTINGS_FILE)
        }
    }
}

impl eframe::App for DesktopApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if !self.poll_settings() {
            egui::CentralPanel::default().show(ctx, |ui| {
                ui.centered_and_justified(|ui| {
                    ui.spinner();
                });
            });
            return;
        }
        let (SettingsState::Ready(settings), Some(trainer)) = (&mut self.settings, &mut self.trainer) else {
            return;
        };

        trainer.poll(ctx);

        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            trainer.status_ui(ui);
        });
        egui::SidePanel::right("settings").default_width(240.0).resizable(false).show(ctx, |ui| {
            ui.heading("Settings");
            ui.add_space(8.0);
            if let Some(change) = preferences_ui(ui, settings.preferences()) {
                trainer.apply_preference(&change);
                if let Some(write) = settings.set(change) {
                    self.runtime.spawn(async move {
                        if let Err(err) = write.await {
                            error!(?err, "failed to save setting");
                        }
                    });
                }
            }
            ui.add_space(12.0);
            ui.separator();
            trainer.midi_ui(ui);
        });
        egui::CentralPanel::default().show(ctx, |ui| {
            if settings.preferences().show_keyboard {
                trainer.keyboard_ui(ui);
            } else {
                ui.label("Keyboard hidden. Play from your MIDI instrument or the home row.");
            }
        });

        ctx.request_repaint_after(Duration::from_millis(16));
    }
}

/// Draws the preference controls and returns the value the user changed.
fn preferences_ui(ui: &mut Ui, prefs: &Preferences) -> Option<PreferenceValue> {
    let mut change = None;

    let mut sound = prefs.piano_sound.clone();
    ui.label("Piano sound");
    egui::ComboBox::from_id_source("piano_sound")
        .selected_text(sound.replace('_', " "))
        .show_ui(ui, |ui| {
            for name in INSTRUMENTS {
                ui.selectable_value(&mut sound, name.to_string(), name.replace('_', " "));
            }
        });
    if sound != prefs.piano_sound {
        change = Some(PreferenceValue::PianoSound(sound));
    }

    ui.add_space(6.0);
    let mut show_keyboard = prefs.show_keyboard;
    if ui.checkbox(&mut show_keyboard, "Show keyboard").changed() {
        change = Some(PreferenceValue::ShowKeyboard(show_keyboard));
    }
    let mut mute = prefs.mute_sound;
    if ui.checkbox(&mut mute, "Mute sound").changed() {
        change = Some(PreferenceValue::MuteSound(mute));
    }
    change
}

struct TrainerPane {
    keyboard: KeyboardView<MidirBridge>,
    session: PracticeSession,
    sound: Muted<Box<dyn SoundRenderer>>,
    pointer_held: Option<u8>,
    keys_held: BTreeSet<u8>,
    tapped: Vec<u8>,
    midi_inputs: Vec<MidiDevice>,
}

impl TrainerPane {
    fn mount(prefs: &Preferences) -> Self {
        let mut keyboard = KeyboardView::new(MidirBridge::new());
        keyboard.start_listening();
        let session = PracticeSession::white_keys(&keyboard.range());
        let renderer = open_renderer(&SoundfontConfig::for_instrument(prefs.piano_sound.clone()));
        info!(instrument = %prefs.piano_sound, muted = prefs.mute_sound, "trainer mounted");
        Self {
            keyboard,
            session,
            sound: Muted::new(renderer, prefs.mute_sound),
            pointer_held: None,
            keys_held: BTreeSet::new(),
            tapped: Vec::new(),
            midi_inputs: list_midi_inputs(),
        }
    }

    fn apply_preference(&mut self, value: &PreferenceValue) {
        match value {
            PreferenceValue::PianoSound(name) => {
                self.sound.set_instrument(&SoundfontConfig::for_instrument(name.clone()));
            }
            PreferenceValue::MuteSound(muted) => self.sound.set_muted(*muted),
            PreferenceValue::ShowKeyboard(_) => {}
        }
    }

    fn poll(&mut self, ctx: &egui::Context) {
        self.keyboard.sync(&mut self.session, &mut self.sound);

        for note in std::mem::take(&mut self.tapped) {
            if !self.keys_held.contains(&note) {
                self.keyboard.stop_note(note, &mut self.sound);
            }
        }

        let events = ctx.input(|i| i.events.clone());
        for input in events.iter().filter_map(shortcut_input) {
            let Some(note) = self.keyboard.note_for_key(input.key()) else {
                continue;
            };
            match input {
                ShortcutInput::Down(_) => {
                    if self.keys_held.insert(note) {
                        self.keyboard.play_note(note, &mut self.session, &mut self.sound);
                    }
                }
                ShortcutInput::Up(_) => {
                    if self.keys_held.remove(&note) {
                        self.keyboard.stop_note(note, &mut self.sound);
                    }
                }
                ShortcutInput::Tap(_) => {
                    if !self.keys_held.contains(&note) {
                        self.keyboard.play_note(note, &mut self.session, &mut self.sound);
                        self.tapped.push(note);
                    }
                }
            }
        }
    }

    fn status_ui(&mut self, ui: &mut Ui) {
        ui.horizontal(|ui| {
            ui.heading("Ivory");
            ui.separator();
            match self.session.next_target_note() {
                Some(target) => ui.label(format!("Play: {}", note_name(target))),
                None => ui.label("No target"),
            };
            ui.label(format!("Correct: {}", self.session.correct_count()));
            if ui.button("Restart").clicked() {
                self.session.reset();
            }
        });
    }

    fn midi_ui(&mut self, ui: &mut Ui) {
        ui.heading("MIDI");
        ui.add_space(6.0);
        match self.keyboard.input_name() {
            Some(name) => ui.label(format!("Listening: {name}")),
            None => ui.label("No MIDI input connected"),
        };
        ui.horizontal(|ui| {
            if ui.button("Refresh inputs").clicked() {
                self.midi_inputs = list_midi_inputs();
            }
            if ui.button("Reconnect").clicked() {
                self.keyboard.stop_listening();
                self.keyboard.start_listening();
            }
        });
        for device in &self.midi_inputs {
            ui.label(&device.name);
        }
    }

    fn keyboard_ui(&mut self, ui: &mut Ui) {
        let mut active = self.keyboard.active_notes();
        active.extend(self.keys_held.iter().copied());
        active.extend(self.tapped.iter().copied());
        let keyboard = &self.keyboard;
        let label = |note: u8| match keyboard.shortcut_for(note) {
            Some(key) => format!("{}\n{}", key.to_ascii_uppercase(), keyboard.note_label(note)),
            None => keyboard.note_label(note),
        };
        ui.add_space(12.0);
        let (_, input) =
            PianoKeyboard::new(keyboard.range(), &active, label).show(ui, &mut self.pointer_held);
        if let Some(note) = input.released {
            self.keyboard.stop_note(note, &mut self.sound);
        }
        if let Some(note) = input.pressed {
            self.keyboard.play_note(note, &mut self.session, &mut self.sound);
        }
    }
}

impl Drop for TrainerPane {
    fn drop(&mut self) {
        self.keyboard.stop_listening();
    }
}

fn list_midi_inputs() -> Vec<MidiDevice> {
    MidiManager::list_inputs().unwrap_or_else(|err| {
        error!(?err, "failed to list MIDI inputs");
        Vec::new()
    })
}

/// A home-row key as it arrives from egui.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ShortcutInput {
    Down(char),
    Up(char),
    /// Punctuation has no `egui::Key`, only typed text without a release, so
    /// it plays and stops on the next frame.
    Tap(char),
}

impl ShortcutInput {
    fn key(self) -> char {
        match self {
            Self::Down(c) | Self::Up(c) | Self::Tap(c) => c,
        }
    }
}

fn shortcut_input(event: &egui::Event) -> Option<ShortcutInput> {
    match event {
        egui::Event::Key {
            key,
            pressed,
            repeat,
            ..
        } => {
            let c = key_char(*key)?;
            match (*pressed, *repeat) {
                (true, false) => Some(ShortcutInput::Down(c)),
                (true, true) => None,
                (false, _) => Some(ShortcutInput::Up(c)),
            }
        }
        egui::Event::Text(text) => {
            let mut chars = text.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii_punctuation() => Some(ShortcutInput::Tap(c)),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Lower-case character for single-character key names (letters and digits).
fn key_char(key: egui::Key) -> Option<char> {
    let mut chars = key.name().chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c.to_ascii_lowercase()),
        _ => None,
    }
}
