//! Menu listing for the `list` subcommand.
//!
//! Pure functions: (profile, sections, OutputFormat) → String.
//! No I/O, no side effects.

use serde::Serialize;

use crate::tui::state::quick_key;
use crate::types::{MenuSection, OutputFormat, Profile};

#[derive(Serialize)]
struct Listing<'a> {
    profile: Profile,
    sections: &'a [MenuSection],
}

/// Format a profile's menu for output.
///
/// # Errors
/// Only JSON serialization can fail.
pub fn format_menu(
    profile: Profile,
    sections: &[MenuSection],
    format: OutputFormat,
) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Human => Ok(format_human(profile, sections)),
        OutputFormat::Json => serde_json::to_string_pretty(&Listing { profile, sections }),
    }
}

// ============================================================================
// HUMAN FORMAT
// ============================================================================

fn format_human(profile: Profile, sections: &[MenuSection]) -> String {
    let mut out = format!("=== UNIBOS {} ===\n", profile);

    for section in sections {
        out.push('\n');
        if section.icon.is_empty() {
            out.push_str(&format!("{}\n", section.label));
        } else {
            out.push_str(&format!("{} {}\n", section.icon, section.label));
        }

        let width = section.items.iter().map(|i| i.label.chars().count()).max().unwrap_or(0);
        for (i, item) in section.items.iter().enumerate() {
            let disabled = if item.enabled { "" } else { "  (disabled)" };
            out.push_str(&format!(
                "  {} {:<width$}  {}{}\n",
                quick_key(i),
                item.label,
                item.id,
                disabled,
                width = width
            ));
            if let Some(command) = item.command() {
                out.push_str(&format!("      $ {}\n", command));
            }
        }
    }

    out
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MenuItem, META_COMMAND};

    fn sample() -> Vec<MenuSection> {
        vec![
            MenuSection::new("development", "Development", "🛠")
                .item(MenuItem::new("git:status", "Git status").with_meta(META_COMMAND, "git status --short"))
                .item(MenuItem::new("git:log", "Git log").enabled(false)),
            MenuSection::new("session", "Session", "").item(MenuItem::new("quit", "Quit")),
        ]
    }

    #[test]
    fn human_listing_shows_digits_ids_and_commands() {
        let out = format_menu(Profile::Dev, &sample(), OutputFormat::Human).unwrap();
        assert!(out.starts_with("=== UNIBOS dev ===\n"));
        assert!(out.contains("🛠 Development\n"));
        assert!(out.contains("  0 Git status  git:status\n"));
        assert!(out.contains("      $ git status --short\n"));
        assert!(out.contains("  1 Git log     git:log  (disabled)\n"));
        assert!(out.contains("\nSession\n  0 Quit  quit\n"));
    }

    #[test]
    fn json_listing_round_trips_structure() {
        let out = format_menu(Profile::Server, &sample(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["profile"], "server");
        assert_eq!(value["sections"][0]["items"][0]["id"], "git:status");
        assert_eq!(value["sections"][0]["items"][0]["metadata"]["command"], "git status --short");
        assert_eq!(value["sections"][0]["items"][1]["enabled"], false);
        assert!(value["sections"][1]["items"][0].get("metadata").is_none());
    }
}
