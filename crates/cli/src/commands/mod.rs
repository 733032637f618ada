//! Command implementations.
//!
//! Each command prints its rendered output to stdout; failures are
//! returned as [`CommandError`] and logged by `main`.

#![allow(clippy::print_stdout)]

pub mod auth;
pub mod draft;
pub mod listings;
pub mod market;
pub mod settings;

use std::path::PathBuf;

use listing_desk::DeskError;
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Desk(#[from] DeskError),

    /// A file named on the command line could not be read.
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON input or output failed.
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A destructive command was run without `--yes`.
    #[error("Refusing to clear all data without --yes")]
    NotConfirmed,
}

impl CommandError {
    /// Hint printed after the error, if any.
    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Desk(e) if e.needs_login() => Some("Run `ldesk auth login` to connect to eBay."),
            _ => None,
        }
    }
}
