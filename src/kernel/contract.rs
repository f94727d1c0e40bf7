// src/kernel/contract.rs

use crate::errors::Result;
use crate::repl::BoxFuture;

use super::info::KernelInfo;
use super::messages::{CompleteReply, ExecuteReply, ExecuteRequest, StreamName};

/// Requests a notebook host makes of a kernel.
///
/// The host dispatches one request at a time; `execute` may run for as long
/// as the interpreter keeps producing output.
pub trait Kernel: Send {
    fn info(&self) -> &KernelInfo;

    fn execute<'a>(
        &'a mut self,
        request: &'a ExecuteRequest,
        sink: &'a mut dyn OutputSink,
    ) -> BoxFuture<'a, ExecuteReply>;

    fn complete(&mut self, code: &str, cursor_pos: usize) -> CompleteReply;

    fn shutdown(&mut self) -> BoxFuture<'_, Result<()>>;
}

/// Where execution output goes while a request is running.
pub trait OutputSink: Send {
    fn stream(&mut self, name: StreamName, text: &str) -> Result<()>;
}
