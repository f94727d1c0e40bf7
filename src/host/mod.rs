// src/host/mod.rs

//! A minimal notebook host: newline-delimited JSON on stdin/stdout.
//!
//! - [`protocol`] parses incoming request lines and builds outgoing messages.
//! - [`sink`] is the `OutputSink` that turns execution output into `stream`
//!   messages.
//! - [`session`] runs the request loop around a `Kernel`.

pub mod protocol;
pub mod session;
pub mod sink;

pub use protocol::{OutgoingMessage, ProtocolError, Request, RequestMessage};
pub use session::Session;
pub use sink::ChannelSink;
