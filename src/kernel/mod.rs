// src/kernel/mod.rs

//! The notebook-facing side: the host contract and its Disco implementation.
//!
//! - [`contract`] defines what a host expects from a kernel (`Kernel`) and
//!   what a kernel may write back while executing (`OutputSink`).
//! - [`adapter`] is `DiscoKernel`, which satisfies the contract by driving a
//!   [`ReplBackend`](crate::repl::ReplBackend).
//! - [`messages`] and [`info`] hold the request / reply shapes and the fixed
//!   kernel metadata.
//! - [`interrupt`] carries "abort the running request" from the host to the
//!   adapter.

pub mod adapter;
pub mod contract;
pub mod info;
pub mod interrupt;
pub mod messages;

pub use adapter::DiscoKernel;
pub use contract::{Kernel, OutputSink};
pub use info::{KernelInfo, LanguageInfo};
pub use interrupt::{InterruptHandle, InterruptListener, interrupt_channel};
pub use messages::{
    CompleteReply, CompleteRequest, ErrorContent, ExecuteReply, ExecuteRequest, ReplyStatus,
    StreamName,
};
