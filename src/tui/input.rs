//! Logical keys and their sources.
//!
//! Interactive sessions get keys from crossterm events. Degraded (line)
//! mode decodes raw bytes and words from stdin into the same closed set,
//! so the controller never sees platform details.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// The closed set of keys the controller understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    Enter,
    Esc,
    Tab,
    PageUp,
    PageDown,
    CtrlC,
    Char(char),
}

/// Map a crossterm key event to a logical key.
///
/// Key releases are dropped; unknown keys map to `None`.
pub fn key_from_event(event: KeyEvent) -> Option<Key> {
    if event.kind == KeyEventKind::Release {
        return None;
    }

    if event.modifiers.contains(KeyModifiers::CONTROL) && event.code == KeyCode::Char('c') {
        return Some(Key::CtrlC);
    }

    match event.code {
        KeyCode::Up => Some(Key::Up),
        KeyCode::Down => Some(Key::Down),
        KeyCode::Left => Some(Key::Left),
        KeyCode::Right => Some(Key::Right),
        KeyCode::Enter => Some(Key::Enter),
        KeyCode::Esc => Some(Key::Esc),
        KeyCode::Tab => Some(Key::Tab),
        KeyCode::PageUp => Some(Key::PageUp),
        KeyCode::PageDown => Some(Key::PageDown),
        KeyCode::Char(c) => Some(Key::Char(c)),
        _ => None,
    }
}

// ============================================================================
// BYTE DECODING
// ============================================================================

const ESC: char = '\u{1b}';

/// Decode a raw terminal byte stream into logical keys.
///
/// `ESC [ A..D` (and the `ESC O` application-mode variants) are arrows,
/// `ESC [ 5 ~` / `ESC [ 6 ~` page keys, a lone `ESC` is Esc, `\r` or `\n`
/// (or `\r\n`) is Enter, `\t` is Tab and `0x03` is Ctrl+C. Unrecognized
/// escape sequences are consumed and dropped.
pub fn decode_keys(bytes: &[u8]) -> Vec<Key> {
    let text = String::from_utf8_lossy(bytes);
    let chars: Vec<char> = text.chars().collect();
    let mut keys = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            ESC => {
                let (key, consumed) = decode_escape(&chars[i..]);
                if let Some(key) = key {
                    keys.push(key);
                }
                i += consumed;
            }
            '\r' => {
                keys.push(Key::Enter);
                i += if chars.get(i + 1) == Some(&'\n') { 2 } else { 1 };
            }
            '\n' => {
                keys.push(Key::Enter);
                i += 1;
            }
            '\t' => {
                keys.push(Key::Tab);
                i += 1;
            }
            '\u{3}' => {
                keys.push(Key::CtrlC);
                i += 1;
            }
            c if c.is_control() => i += 1,
            c => {
                keys.push(Key::Char(c));
                i += 1;
            }
        }
    }

    keys
}

/// Decode one escape sequence starting at `seq[0] == ESC`.
///
/// Returns the key (if recognized) and the number of chars consumed.
fn decode_escape(seq: &[char]) -> (Option<Key>, usize) {
    match (seq.get(1), seq.get(2)) {
        (Some('[') | Some('O'), Some(&code)) => {
            let arrow = match code {
                'A' => Some(Key::Up),
                'B' => Some(Key::Down),
                'C' => Some(Key::Right),
                'D' => Some(Key::Left),
                _ => None,
            };
            if arrow.is_some() {
                return (arrow, 3);
            }
            if seq.get(1) == Some(&'[') && seq.get(3) == Some(&'~') {
                match code {
                    '5' => return (Some(Key::PageUp), 4),
                    '6' => return (Some(Key::PageDown), 4),
                    _ => {}
                }
            }
            // Skip an unknown CSI up to and including its final byte.
            let end = seq[2..]
                .iter()
                .position(|c| ('\u{40}'..='\u{7e}').contains(c))
                .map(|p| p + 3)
                .unwrap_or(seq.len());
            (None, end)
        }
        _ => (Some(Key::Esc), 1),
    }
}

/// Decode one line of degraded-mode input.
///
/// Lines carrying raw escape bytes are decoded byte-wise. Otherwise each
/// whitespace-separated word is a key name (`up`, `down`, `left`, `right`,
/// `enter`, `esc`, `tab`, `pgup`, `pgdn`, `q`) or a run of literal
/// characters such as quick-select digits.
pub fn decode_line(line: &str) -> Vec<Key> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.contains(ESC) {
        return decode_keys(line.as_bytes());
    }

    let mut keys = Vec::new();
    for word in line.split_whitespace() {
        match word.to_ascii_lowercase().as_str() {
            "up" | "u" => keys.push(Key::Up),
            "down" | "d" => keys.push(Key::Down),
            "left" => keys.push(Key::Left),
            "right" => keys.push(Key::Right),
            "enter" | "e" => keys.push(Key::Enter),
            "esc" | "back" | "b" => keys.push(Key::Esc),
            "tab" => keys.push(Key::Tab),
            "pgup" => keys.push(Key::PageUp),
            "pgdn" => keys.push(Key::PageDown),
            "q" | "quit" => keys.push(Key::Char('q')),
            _ => keys.extend(word.chars().map(Key::Char)),
        }
    }
    keys
}

// ============================================================================
// TESTS
// ============================================================================
