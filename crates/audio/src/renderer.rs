use tracing::debug;

use crate::soundfont::SoundfontConfig;

/// Turns note presses into sound.
pub trait SoundRenderer {
    fn play_note(&mut self, note: u8);
    fn stop_note(&mut self, note: u8);
    fn set_instrument(&mut self, _config: &SoundfontConfig) {}
}

impl<R: SoundRenderer + ?Sized> SoundRenderer for Box<R> {
    fn play_note(&mut self, note: u8) {
        (**self).play_note(note)
    }

    fn stop_note(&mut self, note: u8) {
        (**self).stop_note(note)
    }

    fn set_instrument(&mut self, config: &SoundfontConfig) {
        (**self).set_instrument(config)
    }
}

pub struct SilentRenderer;

impl SoundRenderer for SilentRenderer {
    fn play_note(&mut self, note: u8) {
        debug!(note, "silent renderer play");
    }

    fn stop_note(&mut self, _note: u8) {}
}

/// Drops new notes while muted. Stops still pass through so nothing hangs.
pub struct Muted<R> {
    inner: R,
    muted: bool,
}

impl<R: SoundRenderer> Muted<R> {
    pub fn new(inner: R, muted: bool) -> Self {
        Self { inner, muted }
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }
}

impl<R: SoundRenderer> SoundRenderer for Muted<R> {
    fn play_note(&mut self, note: u8) {
        if !self.muted {
            self.inner.play_note(note);
        }
    }

    fn stop_note(&mut self, note: u8) {
        self.inner.stop_note(note);
    }

    fn set_instrument(&mut self, config: &SoundfontConfig) {
        self.inner.set_instrument(config);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Log(Vec<String>);

    impl SoundRenderer for Log {
        fn play_note(&mut self, note: u8) {
            self.0.push(format!("play {note}"));
        }

        fn stop_note(&mut self, note: u8) {
            self.0.push(format!("stop {note}"));
        }
    }

    #[test]
    fn muted_drops_plays_but_forwards_stops() {
        let mut renderer = Muted::new(Log::default(), true);
        renderer.play_note(60);
        renderer.stop_note(60);
        renderer.set_muted(false);
        renderer.play_note(62);
        assert_eq!(renderer.inner().0, vec!["stop 60", "play 62"]);
    }

    #[test]
    fn boxed_renderer_forwards() {
        let mut renderer: Box<dyn SoundRenderer> = Box::new(SilentRenderer);
        renderer.play_note(60);
        renderer.stop_note(60);
    }
}
