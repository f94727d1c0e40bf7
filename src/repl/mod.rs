// src/repl/mod.rs

//! Conversation with the Disco child process.
//!
//! - [`scanner`] is the I/O-free core: it buffers raw child output and finds
//!   the next prompt or line boundary.
//! - [`wrapper`] owns the child process and implements "send a line, wait
//!   for the prompt" in buffered and streaming form.
//! - [`signal`] holds the SIGINT plumbing (scoped default disposition while
//!   spawning, interrupt delivery to the child's process group).
//! - [`backend`] provides the `ReplBackend` trait the kernel talks to, so
//!   tests can swap in a scripted fake.

pub mod backend;
pub mod error;
pub mod scanner;
pub mod signal;
pub mod wrapper;

pub use backend::{BoxFuture, ReplBackend};
pub use error::{ReplError, Result};
pub use scanner::{Marker, MarkerSet, OutputScanner, PromptPattern, ScanMatch};
pub use wrapper::ReplWrapper;
