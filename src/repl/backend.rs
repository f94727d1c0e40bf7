// src/repl/backend.rs

//! Pluggable REPL backend abstraction.
//!
//! The kernel talks to a `ReplBackend` instead of a concrete child process.
//! `ReplWrapper` is the implementation used in production; tests provide a
//! scripted fake that records what the kernel sent.

use std::future::Future;
use std::pin::Pin;

use tokio::sync::mpsc;

use super::error::Result;
use super::wrapper::ReplWrapper;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// One interpreter conversation, one command in flight at a time.
pub trait ReplBackend: Send {
    /// Send `command` and return all output produced before the prompt
    /// reappears. Bounded by the command timeout.
    fn run_command<'a>(&'a mut self, command: &'a str) -> BoxFuture<'a, Result<String>>;

    /// Send `command` and emit each completed output line (with its trailing
    /// `\n`) on `lines` as soon as it arrives. A trailing partial line is
    /// emitted without a newline once the prompt shows up. Unbounded in time.
    fn run_command_streaming<'a>(
        &'a mut self,
        command: &'a str,
        lines: &'a mpsc::UnboundedSender<String>,
    ) -> BoxFuture<'a, Result<()>>;

    /// Interrupt the running command and wait for the prompt again,
    /// returning the output that preceded it.
    fn interrupt(&mut self) -> BoxFuture<'_, Result<String>>;

    /// Throw the current child away and start a fresh one.
    fn restart(&mut self) -> BoxFuture<'_, Result<()>>;

    /// Stop the child for good.
    fn shutdown(&mut self) -> BoxFuture<'_, Result<()>>;
}

impl ReplBackend for ReplWrapper {
    fn run_command<'a>(&'a mut self, command: &'a str) -> BoxFuture<'a, Result<String>> {
        Box::pin(ReplWrapper::run_command(self, command))
    }

    fn run_command_streaming<'a>(
        &'a mut self,
        command: &'a str,
        lines: &'a mpsc::UnboundedSender<String>,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(ReplWrapper::run_command_streaming(self, command, lines))
    }

    fn interrupt(&mut self) -> BoxFuture<'_, Result<String>> {
        Box::pin(ReplWrapper::interrupt(self))
    }

    fn restart(&mut self) -> BoxFuture<'_, Result<()>> {
        Box::pin(ReplWrapper::restart(self))
    }

    fn shutdown(&mut self) -> BoxFuture<'_, Result<()>> {
        Box::pin(ReplWrapper::shutdown(self))
    }
}
