// src/repl/error.rs

use std::time::Duration;

use thiserror::Error;

/// Failures talking to the Disco child process.
///
/// `Eof` and `Timeout` carry whatever partial output had been read when the
/// wait ended, so callers can still show it.
#[derive(Error, Debug)]
pub enum ReplError {
    #[error("failed to launch '{binary}': {source}")]
    SpawnFailed {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{binary}' did not reach its first prompt: {source}")]
    StartupFailed {
        binary: String,
        #[source]
        source: Box<ReplError>,
    },

    #[error("Disco process closed its output (it probably exited)")]
    Eof { output: String },

    #[error("no prompt from Disco within {limit:?}")]
    Timeout { limit: Duration, output: String },

    #[error("continuation prompt found, input was incomplete: {command}")]
    IncompleteInput { command: String },

    #[error("no command was given")]
    EmptyCommand,

    #[error("failed to signal the Disco process: {0}")]
    Signal(#[from] nix::errno::Errno),

    #[error("IO error talking to the Disco process: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ReplError>;
