//! Console color semantics and style constants.
//!
//! Color semantics:
//! - Cyan: interactive elements (quick-select digits, key hints)
//! - Green: success, online
//! - Yellow: busy, attention
//! - Red: errors, failed commands, offline
//! - Dark gray: de-emphasized (descriptions, dimmed sidebar, disabled items)

use ratatui::style::{Color, Modifier, Style};

use crate::types::Tone;

// ============================================================================
// SEMANTIC STYLES
// ============================================================================

pub const STYLE_SAFE: Style = Style::new().fg(Color::Green);

pub const STYLE_WARNING: Style = Style::new().fg(Color::Yellow);

pub const STYLE_DANGER: Style = Style::new().fg(Color::Red);

pub const STYLE_INTERACTIVE: Style = Style::new().fg(Color::Cyan);

pub const STYLE_DIM: Style = Style::new().fg(Color::DarkGray);

pub const STYLE_IMPORTANT: Style = Style::new().add_modifier(Modifier::BOLD);

// ============================================================================
// UI ELEMENT STYLES
// ============================================================================

/// Header bar.
pub const STYLE_TITLE: Style = Style::new().fg(Color::White).add_modifier(Modifier::BOLD);

/// Sidebar section header row.
pub const STYLE_SECTION: Style = Style::new().fg(Color::Magenta).add_modifier(Modifier::BOLD);

/// Item under the cursor.
pub const STYLE_SELECTED: Style = Style::new().fg(Color::Black).bg(Color::Cyan);

/// Cursor row while the sidebar is dimmed behind a sub-view.
pub const STYLE_CURSOR_DIM: Style = Style::new().fg(Color::DarkGray).add_modifier(Modifier::REVERSED);

/// Footer / help line.
pub const STYLE_HELP: Style = Style::new().fg(Color::DarkGray);

/// Body text style for a content tone.
pub fn tone_style(tone: Tone) -> Style {
    match tone {
        Tone::Normal => Style::new(),
        Tone::Success => STYLE_SAFE,
        Tone::Error => STYLE_DANGER,
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn semantic_styles_have_expected_colors() {
        assert_eq!(STYLE_SAFE.fg, Some(Color::Green));
        assert_eq!(STYLE_WARNING.fg, Some(Color::Yellow));
        assert_eq!(STYLE_DANGER.fg, Some(Color::Red));
        assert_eq!(STYLE_INTERACTIVE.fg, Some(Color::Cyan));
        assert_eq!(STYLE_DIM.fg, Some(Color::DarkGray));
    }

    #[test]
    fn tones_map_to_semantic_styles() {
        assert_eq!(tone_style(Tone::Error), STYLE_DANGER);
        assert_eq!(tone_style(Tone::Success), STYLE_SAFE);
        assert_eq!(tone_style(Tone::Normal).fg, None);
    }

    #[test]
    fn important_style_is_bold() {
        assert!(STYLE_IMPORTANT.add_modifier.contains(Modifier::BOLD));
    }
}
