use std::collections::BTreeSet;

use ivory_audio::SoundRenderer;
use ivory_domain::{note_label, ActiveNotes, KeyShortcut, MidiMessage, NoteRange};
use tracing::{debug, error, info};

use crate::midi::{MidiBridge, MidiSubscription};
use crate::session::TrainerContext;

/// MIDI input opened when the keyboard mounts.
pub const DEFAULT_INPUT_INDEX: usize = 0;

/// State behind the on-screen keyboard: which notes the MIDI input holds
/// down, and how plays reach the trainer and the speakers.
pub struct KeyboardView<B> {
    bridge: B,
    range: NoteRange,
    shortcuts: Vec<KeyShortcut>,
    notes: ActiveNotes,
    sounding: BTreeSet<u8>,
    subscription: Option<MidiSubscription>,
    reported_closed: bool,
}

impl<B: MidiBridge> KeyboardView<B> {
    pub fn new(bridge: B) -> Self {
        let range = NoteRange::practice();
        Self {
            bridge,
            shortcuts: KeyShortcut::home_row(&range),
            range,
            notes: ActiveNotes::new(),
            sounding: BTreeSet::new(),
            subscription: None,
            reported_closed: false,
        }
    }

    pub fn range(&self) -> NoteRange {
        self.range
    }

    pub fn shortcuts(&self) -> &[KeyShortcut] {
        &self.shortcuts
    }

    pub fn shortcut_for(&self, note: u8) -> Option<char> {
        KeyShortcut::for_note(&self.shortcuts, note)
    }

    pub fn note_for_key(&self, key: char) -> Option<u8> {
        KeyShortcut::for_key(&self.shortcuts, key)
    }

    pub fn note_label(&self, note: u8) -> String {
        note_label(note)
    }

    pub fn bridge(&self) -> &B {
        &self.bridge
    }

    pub fn is_listening(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn input_name(&self) -> Option<&str> {
        self.subscription.as_ref().map(MidiSubscription::input_name)
    }

    /// Opens the default MIDI input unless a subscription is already held.
    ///
    /// Returns whether a new connection was opened. Failures are logged and
    /// leave the keyboard without MIDI.
    pub fn start_listening(&mut self) -> bool {
        if self.subscription.is_some() {
            debug!("already listening for midi");
            return false;
        }
        match self.bridge.open(DEFAULT_INPUT_INDEX) {
            Ok(subscription) => {
                self.subscription = Some(subscription);
                self.reported_closed = false;
                true
            }
            Err(err) => {
                error!(?err, "failed to subscribe to midi input");
                false
            }
        }
    }

    pub fn stop_listening(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.close();
        }
    }

    /// Records a note-on or note-off; anything else is ignored.
    pub fn handle_message(&mut self, message: &MidiMessage) -> bool {
        self.notes.apply(message)
    }

    pub fn active_notes(&self) -> BTreeSet<u8> {
        self.notes.active()
    }

    /// Applies pending MIDI messages, playing and stopping notes as their
    /// state flips. Returns the number of messages handled.
    pub fn sync(
        &mut self,
        trainer: &mut dyn TrainerContext,
        sound: &mut dyn SoundRenderer,
    ) -> usize {
        let Some(subscription) = &self.subscription else {
            return 0;
        };
        let drained = subscription.drain();
        if drained.closed && !self.reported_closed {
            error!("midi input disconnected");
            self.reported_closed = true;
        }
        let count = drained.messages.len();
        for message in &drained.messages {
            if self.handle_message(message) {
                self.reconcile(trainer, sound);
            }
        }
        count
    }

    fn reconcile(&mut self, trainer: &mut dyn TrainerContext, sound: &mut dyn SoundRenderer) {
        let active = self.notes.active();
        for note in active.difference(&self.sounding) {
            self.play_note(*note, trainer, sound);
        }
        for note in self.sounding.difference(&active) {
            self.stop_note(*note, sound);
        }
        self.sounding = active;
    }

    /// Checks `note` against the trainer's target, then sounds it.
    pub fn play_note(
        &self,
        note: u8,
        trainer: &mut dyn TrainerContext,
        sound: &mut dyn SoundRenderer,
    ) {
        if trainer.next_target_note() == Some(note) {
            info!(note, "target note hit");
            trainer.increment_correct();
        }
        sound.play_note(note);
    }

    pub fn stop_note(&self, note: u8, sound: &mut dyn SoundRenderer) {
        sound.stop_note(note);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::{self, Sender};

    use anyhow::{anyhow, Result};

    use crate::session::PracticeSession;

    #[derive(Default)]
    struct FakeBridge {
        senders: Vec<Sender<MidiMessage>>,
        fail: bool,
    }

    impl MidiBridge for FakeBridge {
        fn open(&mut self, input_index: usize) -> Result<MidiSubscription> {
            if self.fail {
                return Err(anyhow!("no midi input at index {input_index}"));
            }
            let (tx, rx) = mpsc::channel();
            self.senders.push(tx);
            Ok(MidiSubscription::from_channel(rx, "fake"))
        }
    }

    #[derive(Default)]
    struct RecordingSound {
        played: Vec<u8>,
        stopped: Vec<u8>,
    }

    impl SoundRenderer for RecordingSound {
        fn play_note(&mut self, note: u8) {
            self.played.push(note);
        }

        fn stop_note(&mut self, note: u8) {
            self.stopped.push(note);
        }
    }

    struct CountingTrainer {
        target: Option<u8>,
        increments: u32,
    }

    impl TrainerContext for CountingTrainer {
        fn next_target_note(&self) -> Option<u8> {
            self.target
        }

        fn increment_correct(&mut self) {
            self.increments += 1;
        }
    }

    fn send(view: &KeyboardView<FakeBridge>, message: MidiMessage) {
        view.bridge().senders[0].send(message).unwrap();
    }

    #[test]
    fn start_listening_is_idempotent() {
        let mut view = KeyboardView::new(FakeBridge::default());
        assert!(view.start_listening());
        assert!(!view.start_listening());
        assert_eq!(view.bridge().senders.len(), 1);
        assert_eq!(view.input_name(), Some("fake"));
    }

    #[test]
    fn failed_open_leaves_view_inert() {
        let mut view = KeyboardView::new(FakeBridge {
            fail: true,
            ..FakeBridge::default()
        });
        assert!(!view.start_listening());
        assert!(!view.is_listening());
        let mut trainer = CountingTrainer { target: Some(60), increments: 0 };
        let mut sound = RecordingSound::default();
        assert_eq!(view.sync(&mut trainer, &mut sound), 0);
    }

    #[test]
    fn note_on_and_off_update_active_notes() {
        let mut view = KeyboardView::new(FakeBridge::default());
        assert!(view.handle_message(&MidiMessage::new([144, 62, 80])));
        assert_eq!(view.active_notes(), BTreeSet::from([62]));
        assert!(view.handle_message(&MidiMessage::new([128, 62, 0])));
        assert!(view.active_notes().is_empty());
        assert!(!view.handle_message(&MidiMessage::new([224, 0, 64])));
    }

    #[test]
    fn play_counts_only_the_target() {
        let view = KeyboardView::new(FakeBridge::default());
        let mut trainer = CountingTrainer { target: Some(60), increments: 0 };
        let mut sound = RecordingSound::default();
        view.play_note(60, &mut trainer, &mut sound);
        assert_eq!(trainer.increments, 1);
        view.play_note(61, &mut trainer, &mut sound);
        assert_eq!(trainer.increments, 1);
        view.play_note(60, &mut trainer, &mut sound);
        assert_eq!(trainer.increments, 2);
        assert_eq!(sound.played, vec![60, 61, 60]);
    }

    #[test]
    fn sync_plays_and_stops_midi_notes() {
        let mut view = KeyboardView::new(FakeBridge::default());
        view.start_listening();
        let mut session = PracticeSession::new(vec![60, 64]);
        let mut sound = RecordingSound::default();

        send(&view, MidiMessage::note_on(60, 100));
        send(&view, MidiMessage::note_on(61, 100));
        send(&view, MidiMessage::new([176, 64, 127]));
        assert_eq!(view.sync(&mut session, &mut sound), 3);
        assert_eq!(sound.played, vec![60, 61]);
        assert_eq!(session.correct_count(), 1);
        assert_eq!(session.next_target_note(), Some(64));

        send(&view, MidiMessage::note_off(60));
        view.sync(&mut session, &mut sound);
        assert_eq!(sound.stopped, vec![60]);
        assert_eq!(view.active_notes(), BTreeSet::from([61]));
    }

    #[test]
    fn quick_tap_within_one_poll_still_plays() {
        let mut view = KeyboardView::new(FakeBridge::default());
        view.start_listening();
        let mut trainer = CountingTrainer { target: Some(67), increments: 0 };
        let mut sound = RecordingSound::default();
        send(&view, MidiMessage::note_on(67, 100));
        send(&view, MidiMessage::note_off(67));
        view.sync(&mut trainer, &mut sound);
        assert_eq!(trainer.increments, 1);
        assert_eq!(sound.played, vec![67]);
        assert_eq!(sound.stopped, vec![67]);
    }

    #[test]
    fn stop_listening_allows_a_new_subscription() {
        let mut view = KeyboardView::new(FakeBridge::default());
        view.start_listening();
        view.stop_listening();
        assert!(!view.is_listening());
        assert!(view.start_listening());
        assert_eq!(view.bridge().senders.len(), 2);
    }

    #[test]
    fn labels_and_shortcuts() {
        let view = KeyboardView::new(FakeBridge::default());
        assert_eq!(view.range(), NoteRange::practice());
        assert_eq!(view.note_label(61), "Db");
        assert_eq!(view.shortcut_for(48), Some('a'));
        assert_eq!(view.note_for_key('a'), Some(48));
    }
}
