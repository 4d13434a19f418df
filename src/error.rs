//! Error types shared across the console.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;

/// Fatal errors: anything that stops the console from starting or a CLI
/// command from completing.
#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("profile '{profile}' produced no menu items")]
    EmptyMenu { profile: String },

    #[error("unknown menu item: {0}")]
    UnknownItem(String),

    #[error("failed to read module directory {}: {source}", path.display())]
    Discovery {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("{0}")]
    Handler(#[from] HandlerError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Errors raised by an action handler. Caught at the controller boundary
/// and shown in the content area; never fatal to the TUI.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("{0}")]
    Message(String),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("{item}: {reason}")]
    Failed { item: String, reason: String },
}

impl HandlerError {
    pub fn message(message: impl Into<String>) -> Self {
        HandlerError::Message(message.into())
    }
}
