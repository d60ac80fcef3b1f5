use std::collections::BTreeSet;

use egui::{pos2, vec2, Align2, FontId, Pos2, Rect, Response, Rounding, Sense, Stroke, Ui};
use ivory_domain::notes::is_black_key;
use ivory_domain::NoteRange;

use crate::theme;

const BLACK_WIDTH_RATIO: f32 = 0.6;
const BLACK_HEIGHT_RATIO: f32 = 0.62;
const MAX_HEIGHT: f32 = 180.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KeyRect {
    pub note: u8,
    pub rect: Rect,
    pub black: bool,
}

/// Places every key of `range` inside `area`, white keys first.
pub fn layout(range: &NoteRange, area: Rect) -> Vec<KeyRect> {
    let white_count = range.white_key_count().max(1) as f32;
    let white_width = area.width() / white_count;
    let black_width = white_width * BLACK_WIDTH_RATIO;
    let black_height = area.height() * BLACK_HEIGHT_RATIO;

    let mut whites = Vec::new();
    let mut blacks = Vec::new();
    let mut white_index = 0.0f32;
    for note in range.notes() {
        if is_black_key(note) {
            let center = area.left() + white_index * white_width;
            blacks.push(KeyRect {
                note,
                rect: Rect::from_min_size(
                    pos2(center - black_width / 2.0, area.top()),
                    vec2(black_width, black_height),
                ),
                black: true,
            });
        } else {
            whites.push(KeyRect {
                note,
                rect: Rect::from_min_size(
                    pos2(area.left() + white_index * white_width, area.top()),
                    vec2(white_width, area.height()),
                ),
                black: false,
            });
            white_index += 1.0;
        }
    }
    whites.extend(blacks);
    whites
}

/// The key under `pos`. Black keys sit on top, so they win.
pub fn note_at(keys: &[KeyRect], pos: Pos2) -> Option<u8> {
    keys.iter()
        .rev()
        .find(|key| key.rect.contains(pos))
        .map(|key| key.note)
}

/// Pointer presses and releases produced during one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PianoInput {
    pub pressed: Option<u8>,
    pub released: Option<u8>,
}

/// Draws a keyboard and reports pointer presses.
///
/// `held` carries the note currently held by the pointer between frames.
pub struct PianoKeyboard<'a, F> {
    range: NoteRange,
    active: &'a BTreeSet<u8>,
    label: F,
}

impl<'a, F: Fn(u8) -> String> PianoKeyboard<'a, F> {
    pub fn new(range: NoteRange, active: &'a BTreeSet<u8>, label: F) -> Self {
        Self {
            range,
            active,
            label,
        }
    }

    pub fn show(self, ui: &mut Ui, held: &mut Option<u8>) -> (Response, PianoInput) {
        let size = vec2(ui.available_width(), ui.available_height().min(MAX_HEIGHT));
        let (rect, response) = ui.allocate_exact_size(size, Sense::click_and_drag());
        let keys = layout(&self.range, rect);
        let tokens = theme::tokens();
        let painter = ui.painter_at(rect);

        let lit = |note: u8| self.active.contains(&note) || *held == Some(note);
        for key in &keys {
            let (fill, text_color) = match (key.black, lit(key.note)) {
                (_, true) => (tokens.accent_cool, tokens.neutral_bg),
                (true, false) => (tokens.key_black, tokens.text_primary),
                (false, false) => (tokens.key_white, tokens.neutral_bg),
            };
            painter.rect(
                key.rect.shrink(0.5),
                Rounding::same(3.0),
                fill,
                Stroke::new(1.0, tokens.key_outline),
            );
            let text = (self.label)(key.note);
            if !text.is_empty() {
                painter.text(
                    key.rect.center_bottom() - vec2(0.0, 6.0),
                    Align2::CENTER_BOTTOM,
                    text,
                    FontId::proportional(if key.black { 10.0 } else { 12.0 }),
                    text_color,
                );
            }
        }

        let mut input = PianoInput::default();
        let pointed = if response.is_pointer_button_down_on() {
            response
                .interact_pointer_pos()
                .and_then(|pos| note_at(&keys, pos))
        } else {
            None
        };
        if pointed != *held {
            input.released = held.take();
            input.pressed = pointed;
            *held = pointed;
        }
        (response, input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn area() -> Rect {
        Rect::from_min_size(Pos2::ZERO, vec2(150.0, 100.0))
    }

    #[test]
    fn layout_places_every_key() {
        let range = NoteRange::practice();
        let keys = layout(&range, area());
        assert_eq!(keys.len(), 25);
        assert_eq!(keys.iter().filter(|k| !k.black).count(), 15);
        assert_eq!(keys[0].note, 48);
        assert!((keys[0].rect.width() - 10.0).abs() < 1e-4);
    }

    #[test]
    fn black_keys_win_hit_tests() {
        let keys = layout(&NoteRange::practice(), area());
        // boundary between C3 and D3 near the top is Db3
        assert_eq!(note_at(&keys, pos2(10.0, 10.0)), Some(49));
        // same x near the bottom is a white key
        assert_eq!(note_at(&keys, pos2(9.0, 90.0)), Some(48));
        assert_eq!(note_at(&keys, pos2(400.0, 10.0)), None);
    }
}
