// src/kernel/adapter.rs

//! `DiscoKernel`: the host contract implemented on top of a REPL backend.

use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::config::{ConfigFile, KernelSection};
use crate::errors::Result;
use crate::repl::{BoxFuture, ReplBackend, ReplError, ReplWrapper};

use super::contract::{Kernel, OutputSink};
use super::info::KernelInfo;
use super::interrupt::InterruptListener;
use super::messages::{CompleteReply, ExecuteReply, ExecuteRequest, StreamName};

/// How the REPL part of an execute request ended.
#[derive(Debug)]
enum CellOutcome {
    Completed,
    Interrupted,
    Failed(ReplError),
}

pub struct DiscoKernel<R: ReplBackend> {
    repl: R,
    settings: KernelSection,
    info: KernelInfo,
    execution_count: u32,
    interrupts: InterruptListener,
}

impl<R: ReplBackend> fmt::Debug for DiscoKernel<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiscoKernel")
            .field("execution_count", &self.execution_count)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl DiscoKernel<ReplWrapper> {
    /// Spawn Disco and wrap it. Failure to launch is fatal for the kernel.
    pub async fn start(config: &ConfigFile, interrupts: InterruptListener) -> Result<Self> {
        info!(binary = %config.repl.binary, "starting Disco kernel");
        let repl = ReplWrapper::spawn(config.repl.clone()).await?;
        Ok(Self::with_backend(repl, config.kernel.clone(), interrupts))
    }
}

impl<R: ReplBackend> DiscoKernel<R> {
    pub fn with_backend(repl: R, settings: KernelSection, interrupts: InterruptListener) -> Self {
        Self {
            repl,
            settings,
            info: KernelInfo::disco(),
            execution_count: 0,
            interrupts,
        }
    }

    pub fn execution_count(&self) -> u32 {
        self.execution_count
    }

    pub fn backend(&self) -> &R {
        &self.repl
    }

    /// Run one code cell.
    ///
    /// Output lines are forwarded to `sink` while Disco is still running,
    /// unless the request is silent. Interrupts turn into `abort`; a dead
    /// child is restarted and the request still reports `ok`.
    pub async fn execute(
        &mut self,
        request: &ExecuteRequest,
        sink: &mut dyn OutputSink,
    ) -> ExecuteReply {
        if !request.silent {
            self.execution_count += 1;
        }
        let count = self.execution_count;

        if request.code.trim().is_empty() {
            debug!(execution_count = count, "empty cell; nothing to run");
            return ExecuteReply::ok(count);
        }

        let silent = request.silent;
        self.interrupts.clear();

        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        let this = &mut *self;
        let run = async move {
            let outcome = this.run_cell(&request.code, &tx).await;
            drop(tx);
            outcome
        };
        let forward = async {
            while let Some(text) = rx.recv().await {
                if !silent {
                    publish(sink, &text);
                }
            }
        };
        let (outcome, ()) = tokio::join!(run, forward);

        match outcome {
            CellOutcome::Completed => ExecuteReply::ok(count),
            CellOutcome::Interrupted => self.recover_from_interrupt(count, silent, sink).await,
            CellOutcome::Failed(err) => self.recover_from_failure(err, count, silent, sink).await,
        }
    }

    /// Completion is not supported by Disco yet: always an empty match list.
    pub fn complete(&mut self, code: &str, cursor_pos: usize) -> CompleteReply {
        debug!(code_len = code.len(), cursor_pos, "complete request (no completions)");
        CompleteReply::empty(cursor_pos)
    }

    pub async fn shutdown(&mut self) -> Result<()> {
        self.repl.shutdown().await?;
        Ok(())
    }

    async fn run_cell(&mut self, code: &str, lines: &mpsc::UnboundedSender<String>) -> CellOutcome {
        tokio::select! {
            result = drive_cell(&mut self.repl, &self.settings, code, lines) => match result {
                Ok(()) => CellOutcome::Completed,
                Err(err) => CellOutcome::Failed(err),
            },
            _ = self.interrupts.interrupted() => CellOutcome::Interrupted,
        }
    }

    async fn recover_from_interrupt(
        &mut self,
        count: u32,
        silent: bool,
        sink: &mut dyn OutputSink,
    ) -> ExecuteReply {
        info!(execution_count = count, "execution interrupted");

        match self.repl.interrupt().await {
            Ok(output) => emit(sink, silent, &output),
            Err(ReplError::Eof { output }) => {
                // SIGINT took Disco down with it.
                if let Err(reply) = self.restart_after_eof(output, count, silent, sink).await {
                    return reply;
                }
            }
            Err(err) => warn!(error = %err, "Disco did not come back after the interrupt"),
        }

        ExecuteReply::abort(count)
    }

    async fn recover_from_failure(
        &mut self,
        err: ReplError,
        count: u32,
        silent: bool,
        sink: &mut dyn OutputSink,
    ) -> ExecuteReply {
        match err {
            ReplError::Eof { output } => {
                warn!(execution_count = count, "Disco exited during execution");
                match self.restart_after_eof(output, count, silent, sink).await {
                    Ok(()) => ExecuteReply::ok(count),
                    Err(reply) => reply,
                }
            }
            ReplError::Timeout { ref output, .. } => {
                warn!(execution_count = count, error = %err, "Disco timed out");
                emit(sink, silent, output);
                ExecuteReply::error(count, "Timeout", err.to_string())
            }
            ReplError::IncompleteInput { .. } => {
                ExecuteReply::error(count, "IncompleteInput", err.to_string())
            }
            other => {
                error!(execution_count = count, error = %other, "Disco execution failed");
                ExecuteReply::error(count, "DiscoError", other.to_string())
            }
        }
    }

    /// Show the last output plus the restart notice, then bring up a fresh
    /// child. The error side is the reply to send if that fails.
    async fn restart_after_eof(
        &mut self,
        output: String,
        count: u32,
        silent: bool,
        sink: &mut dyn OutputSink,
    ) -> std::result::Result<(), ExecuteReply> {
        let notice = format!("{output}{}", self.settings.restart_notice);
        emit(sink, silent, &notice);

        self.repl.restart().await.map_err(|err| {
            error!(error = %err, "failed to restart Disco");
            ExecuteReply::error(count, "RestartFailed", err.to_string())
        })
    }
}

/// Send a cell to the REPL: a single line as is, several lines wrapped in
/// the block markers. Only the cell's own lines stream output.
async fn drive_cell<R: ReplBackend>(
    repl: &mut R,
    settings: &KernelSection,
    code: &str,
    lines: &mpsc::UnboundedSender<String>,
) -> crate::repl::Result<()> {
    let code_lines: Vec<&str> = code.trim_end().lines().collect();

    if let [line] = code_lines.as_slice() {
        return repl.run_command_streaming(line, lines).await;
    }

    repl.run_command(&settings.block_begin).await?;
    for line in code_lines {
        repl.run_command_streaming(line.trim_end(), lines).await?;
    }
    repl.run_command(&settings.block_end).await?;
    Ok(())
}

fn emit(sink: &mut dyn OutputSink, silent: bool, text: &str) {
    if !silent && !text.is_empty() {
        publish(sink, text);
    }
}

fn publish(sink: &mut dyn OutputSink, text: &str) {
    if let Err(err) = sink.stream(StreamName::Stdout, text) {
        warn!(error = %err, "failed to publish Disco output");
    }
}

impl<R: ReplBackend> Kernel for DiscoKernel<R> {
    fn info(&self) -> &KernelInfo {
        &self.info
    }

    fn execute<'a>(
        &'a mut self,
        request: &'a ExecuteRequest,
        sink: &'a mut dyn OutputSink,
    ) -> BoxFuture<'a, ExecuteReply> {
        Box::pin(DiscoKernel::execute(self, request, sink))
    }

    fn complete(&mut self, code: &str, cursor_pos: usize) -> CompleteReply {
        DiscoKernel::complete(self, code, cursor_pos)
    }

    fn shutdown(&mut self) -> BoxFuture<'_, Result<()>> {
        Box::pin(DiscoKernel::shutdown(self))
    }
}
