//! unibos-console: keyboard-driven terminal console for UNIBOS.

pub mod command;
pub mod config;
pub mod discovery;
pub mod error;
pub mod logging;
pub mod net;
pub mod profile;
pub mod report;
pub mod tui;
pub mod types;
