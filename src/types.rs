//! Domain types for the UNIBOS console.
//!
//! Menu structure, content payloads and the profile enum. Everything here
//! is plain data; behavior lives in `tui` and `profile`.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// PROFILES
// ============================================================================

/// One of the four entry-point personas sharing the console framework.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    /// Local development workstation.
    #[default]
    Dev,
    /// Operator managing remote deployment targets.
    Manager,
    /// A deployed server managing its own services.
    Server,
    /// End-user client installation.
    Client,
}

impl Profile {
    pub const ALL: [Profile; 4] = [Profile::Dev, Profile::Manager, Profile::Server, Profile::Client];

    pub fn as_str(&self) -> &'static str {
        match self {
            Profile::Dev => "dev",
            Profile::Manager => "manager",
            Profile::Server => "server",
            Profile::Client => "client",
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// MENU
// ============================================================================

/// A single navigable entry in the sidebar (or in a sub-menu).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    /// Registry key for the item's handler.
    pub id: String,
    pub label: String,
    pub icon: String,
    pub description: String,
    pub enabled: bool,
    /// Free-form attributes (`command`, `path`, ...).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl MenuItem {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        MenuItem {
            id: id.into(),
            label: label.into(),
            icon: String::new(),
            description: String::new(),
            enabled: true,
            metadata: BTreeMap::new(),
        }
    }

    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Shell command attached to this item, if any.
    pub fn command(&self) -> Option<&str> {
        self.metadata.get(META_COMMAND).map(String::as_str)
    }

    pub fn meta(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }
}

/// Metadata key holding a shell command for the generic command handler.
pub const META_COMMAND: &str = "command";

/// Metadata key holding a filesystem path (discovered modules).
pub const META_PATH: &str = "path";

/// An ordered group of items shown under one sidebar header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuSection {
    pub id: String,
    pub label: String,
    pub icon: String,
    pub items: Vec<MenuItem>,
}

impl MenuSection {
    pub fn new(id: impl Into<String>, label: impl Into<String>, icon: impl Into<String>) -> Self {
        MenuSection {
            id: id.into(),
            label: label.into(),
            icon: icon.into(),
            items: Vec::new(),
        }
    }

    pub fn item(mut self, item: MenuItem) -> Self {
        self.items.push(item);
        self
    }

    pub fn items(mut self, items: impl IntoIterator<Item = MenuItem>) -> Self {
        self.items.extend(items);
        self
    }
}

// ============================================================================
// CONTENT
// ============================================================================

/// Prose handed to the content area by a producer.
///
/// Producers naturally hold either raw multi-line text (subprocess
/// stdout) or pre-split lines. Both are accepted here and normalized once,
/// so nothing downstream inspects the representation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Text(String),
    Lines(Vec<String>),
}

impl Content {
    /// Normalize into display lines.
    ///
    /// Embedded newlines split in both variants, `\r\n` is treated as one
    /// break, and a single trailing newline does not produce an empty line.
    pub fn into_lines(self) -> Vec<String> {
        match self {
            Content::Text(text) => split_text(&text),
            Content::Lines(lines) => lines.iter().flat_map(|line| split_text(line)).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Content::Text(text) => text.trim().is_empty(),
            Content::Lines(lines) => lines.iter().all(|l| l.trim().is_empty()),
        }
    }
}

fn split_text(text: &str) -> Vec<String> {
    if text.is_empty() {
        return vec![String::new()];
    }
    let body = text.strip_suffix('\n').unwrap_or(text);
    body.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
        .collect()
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        Content::Text(text)
    }
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Content::Text(text.to_string())
    }
}

impl From<Vec<String>> for Content {
    fn from(lines: Vec<String>) -> Self {
        Content::Lines(lines)
    }
}

impl From<Vec<&str>> for Content {
    fn from(lines: Vec<&str>) -> Self {
        Content::Lines(lines.into_iter().map(str::to_string).collect())
    }
}

/// Visual treatment of a block of content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tone {
    #[default]
    Normal,
    Success,
    Error,
}

/// What the content pane currently shows. Replaced wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ContentBuffer {
    pub title: String,
    pub lines: Vec<String>,
    pub tone: Tone,
}

impl ContentBuffer {
    pub fn new(title: impl Into<String>, content: impl Into<Content>) -> Self {
        ContentBuffer {
            title: title.into(),
            lines: content.into().into_lines(),
            tone: Tone::Normal,
        }
    }

    pub fn set(&mut self, title: impl Into<String>, content: impl Into<Content>, tone: Tone) {
        self.title = title.into();
        self.lines = content.into().into_lines();
        self.tone = tone;
    }
}

// ============================================================================
// OUTPUT
// ============================================================================

/// Output format for non-interactive listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Human,
    Json,
}

// ============================================================================
// TESTS
// ============================================================================
