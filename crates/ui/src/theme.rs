use egui::{Color32, Rounding, Stroke, Visuals};

#[derive(Clone, Debug)]
pub struct ThemeTokens {
    pub accent_cool: Color32,
    pub neutral_bg: Color32,
    pub neutral_surface: Color32,
    pub neutral_panel: Color32,
    pub text_primary: Color32,
    pub key_white: Color32,
    pub key_black: Color32,
    pub key_outline: Color32,
}

pub fn tokens() -> ThemeTokens {
    ThemeTokens {
        accent_cool: Color32::from_rgb(0x00, 0xB4, 0xFF),
        neutral_bg: Color32::from_rgb(0x0F, 0x11, 0x15),
        neutral_surface: Color32::from_rgb(0x1C, 0x1F, 0x26),
        neutral_panel: Color32::from_rgb(0x23, 0x28, 0x34),
        text_primary: Color32::from_rgb(0xE6, 0xE6, 0xE6),
        key_white: Color32::from_rgb(0xF4, 0xF1, 0xEA), // ivory rather than pure white
        key_black: Color32::from_rgb(0x18, 0x19, 0x1D),
        key_outline: Color32::from_rgb(0x3A, 0x3F, 0x4B),
    }
}

pub fn visuals() -> Visuals {
    let tokens = tokens();

    let mut visuals = Visuals::dark();
    visuals.window_rounding = Rounding::same(8.0);
    visuals.panel_fill = tokens.neutral_surface;
    visuals.extreme_bg_color = tokens.neutral_bg;
    visuals.widgets.noninteractive.bg_fill = tokens.neutral_surface;
    visuals.widgets.inactive.bg_fill = tokens.neutral_panel;
    visuals.widgets.active.bg_fill = tokens.neutral_panel.linear_multiply(1.1);
    visuals.widgets.hovered.bg_fill = tokens.neutral_panel.linear_multiply(1.15);
    visuals.widgets.inactive.fg_stroke = Stroke::new(1.0, tokens.text_primary);
    visuals.selection.bg_fill = tokens.accent_cool;
    visuals
}

pub fn apply(ctx: &egui::Context) {
    ctx.set_visuals(visuals());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visuals_follow_tokens() {
        let tokens = tokens();
        let visuals = visuals();
        assert_eq!(visuals.selection.bg_fill, tokens.accent_cool);
        assert_eq!(visuals.panel_fill, tokens.neutral_surface);
        assert!(visuals.dark_mode);
    }
}
