use std::sync::Once;

use gtk4::CssProvider;

/// Compile-time layout tokens; not user-overridable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyleTokens {
    pub spacing_4: i32,
    pub spacing_8: i32,
    pub spacing_12: i32,
    pub spacing_24: i32,
    pub card_radius: u16,
    pub icon_size: i32,
    pub removed_row_opacity: f64,
    pub window_width: i32,
    pub window_height: i32,
}

pub const LAYOUT_TOKENS: StyleTokens = StyleTokens {
    spacing_4: 4,
    spacing_8: 8,
    spacing_12: 12,
    spacing_24: 24,
    card_radius: 12,
    icon_size: 32,
    removed_row_opacity: 0.5,
    window_width: 640,
    window_height: 720,
};

fn panel_css(tokens: StyleTokens) -> String {
    format!(
        "
.waydroid-panel {{
  padding: {outer}px;
}}
.waydroid-settings {{
  border-radius: {radius}px;
}}
.waydroid-section-title {{
  font-weight: bold;
  margin-top: {section}px;
}}
.waydroid-status {{
  font-size: 1.4em;
  font-weight: bold;
}}
.waydroid-row-subtitle {{
  opacity: 0.7;
  font-size: 0.9em;
}}
",
        outer = tokens.spacing_24,
        radius = tokens.card_radius,
        section = tokens.spacing_12,
    )
}

/// Installs the panel stylesheet on the default display. Safe to call repeatedly.
pub fn register_resources() {
    static RESOURCES: Once = Once::new();

    RESOURCES.call_once(|| {
        let Some(display) = gtk4::gdk::Display::default() else {
            tracing::warn!("no display available; panel stylesheet not installed");
            return;
        };
        let provider = CssProvider::new();
        provider.load_from_data(&panel_css(LAYOUT_TOKENS));
        gtk4::style_context_add_provider_for_display(
            &display,
            &provider,
            gtk4::STYLE_PROVIDER_PRIORITY_APPLICATION,
        );
        tracing::debug!("registered panel stylesheet");
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stylesheet_uses_layout_tokens() {
        let css = panel_css(LAYOUT_TOKENS);
        assert!(css.contains("padding: 24px;"));
        assert!(css.contains("border-radius: 12px;"));
    }
}
