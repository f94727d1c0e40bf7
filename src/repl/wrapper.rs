// src/repl/wrapper.rs

//! The Disco child process and its prompt-driven conversation.

use std::fmt;
use std::io;
use std::os::fd::OwnedFd;
use std::process::Stdio;
use std::time::Duration;

use nix::errno::Errno;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::unix::pipe;
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

use crate::config::ReplSection;

use super::error::{ReplError, Result};
use super::scanner::{Marker, MarkerSet, OutputScanner, ScanMatch};
use super::signal::{SigintDefaultGuard, interrupt_process_group, kill_process_group};

const READ_CHUNK: usize = 4096;
const OUTPUT_CHANNEL_CAPACITY: usize = 64;

/// Prompt wait after abandoning input that left Disco at a continuation prompt.
const INCOMPLETE_RESYNC: Duration = Duration::from_secs(1);

/// Owns one running Disco process.
///
/// stdout and stderr share one OS pipe, so bytes arrive in the order the
/// child wrote them. A background task pumps that pipe into a byte channel;
/// the channel closing means the child is gone. All methods take `&mut self`,
/// so only one command is ever in flight.
///
/// Every wait is cancel-safe: bytes are moved into the scanner before the
/// next await, so dropping a streaming run (e.g. on interrupt) loses nothing.
pub struct ReplWrapper {
    settings: ReplSection,
    child: Child,
    pgid: u32,
    stdin: ChildStdin,
    output_rx: mpsc::Receiver<Vec<u8>>,
    scanner: OutputScanner,
}

impl fmt::Debug for ReplWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplWrapper")
            .field("binary", &self.settings.binary)
            .field("pgid", &self.pgid)
            .finish_non_exhaustive()
    }
}

impl ReplWrapper {
    /// Launch the interpreter and wait for its first prompt.
    pub async fn spawn(settings: ReplSection) -> Result<Self> {
        let mut wrapper = Self::launch(settings)?;
        let limit = wrapper.settings.startup_timeout();

        match wrapper.expect(MarkerSet::Prompts, Some(limit)).await {
            Ok(banner) => {
                if !banner.before.trim().is_empty() {
                    debug!(banner = %banner.before.trim_end(), "Disco startup output");
                }
                info!(
                    binary = %wrapper.settings.binary,
                    pid = wrapper.pgid,
                    "Disco is ready"
                );
                Ok(wrapper)
            }
            Err(source) => Err(ReplError::StartupFailed {
                binary: wrapper.settings.binary.clone(),
                source: Box::new(source),
            }),
        }
    }

    fn launch(settings: ReplSection) -> Result<Self> {
        let (output, output_writer) = io::pipe()?;
        let stderr_writer = output_writer.try_clone()?;

        let mut cmd = Command::new(&settings.binary);
        cmd.args(&settings.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::from(output_writer))
            .stderr(Stdio::from(stderr_writer))
            .process_group(0)
            .kill_on_drop(true);

        let spawned = {
            let _sigint = SigintDefaultGuard::install()?;
            cmd.spawn()
        };
        // The command holds our copies of the pipe's write end; they must be
        // closed or the reader never sees end-of-stream.
        drop(cmd);
        let mut child = spawned.map_err(|source| ReplError::SpawnFailed {
            binary: settings.binary.clone(),
            source,
        })?;

        let pgid = child
            .id()
            .ok_or_else(|| io::Error::other("Disco exited before its pid was read"))?;
        let stdin = child.stdin.take().ok_or_else(|| missing_pipe("stdin"))?;
        let output = pipe::Receiver::from_owned_fd(OwnedFd::from(output))?;

        let (tx, output_rx) = mpsc::channel(OUTPUT_CHANNEL_CAPACITY);
        spawn_reader(output, tx);

        debug!(
            binary = %settings.binary,
            args = ?settings.args,
            pid = pgid,
            "spawned Disco process"
        );

        let scanner = OutputScanner::new(settings.prompt_pattern());
        Ok(Self {
            settings,
            child,
            pgid,
            stdin,
            output_rx,
            scanner,
        })
    }

    pub fn pid(&self) -> u32 {
        self.pgid
    }

    pub fn settings(&self) -> &ReplSection {
        &self.settings
    }

    /// Buffered mode: send each line of `command`, waiting for a prompt after
    /// each, and return everything printed before those prompts.
    pub async fn run_command(&mut self, command: &str) -> Result<String> {
        let inputs = command_lines(command)?;
        let limit = self.settings.command_timeout();
        let last = inputs.len() - 1;

        let mut output = String::new();
        for (idx, input) in inputs.iter().enumerate() {
            self.send_line(input).await?;
            let found = self.expect(MarkerSet::Prompts, Some(limit)).await?;
            output.push_str(&found.before);

            if idx == last && found.marker == Marker::ContinuationPrompt {
                return Err(self.abandon_incomplete(command).await);
            }
        }
        Ok(output)
    }

    /// Streaming mode: like [`run_command`](Self::run_command), but every
    /// completed output line goes out on `lines` as soon as it is seen, and
    /// there is no timeout.
    pub async fn run_command_streaming(
        &mut self,
        command: &str,
        lines: &mpsc::UnboundedSender<String>,
    ) -> Result<()> {
        let inputs = if command.is_empty() {
            vec![""]
        } else {
            command_lines(command)?
        };
        let last = inputs.len() - 1;

        for (idx, input) in inputs.iter().enumerate() {
            self.send_line(input).await?;
            let prompt = self.stream_until_prompt(lines).await?;

            if idx == last && prompt == Marker::ContinuationPrompt {
                return Err(self.abandon_incomplete(command).await);
            }
        }
        Ok(())
    }

    /// SIGINT the child's process group, then wait for the prompt and return
    /// whatever was printed before it.
    pub async fn interrupt(&mut self) -> Result<String> {
        info!(pgid = self.pgid, "interrupting Disco");
        if let Err(err) = interrupt_process_group(self.pgid) {
            if err == Errno::ESRCH {
                return Err(self.drain_until_eof().await);
            }
            return Err(err.into());
        }

        let limit = self.settings.command_timeout();
        let found = self.expect(MarkerSet::Prompts, Some(limit)).await?;
        Ok(found.before)
    }

    /// Kill the current child and replace it with a fresh one.
    pub async fn restart(&mut self) -> Result<()> {
        warn!(binary = %self.settings.binary, pid = self.pgid, "restarting Disco");
        self.kill().await;

        let fresh = Self::spawn(self.settings.clone()).await?;
        *self = fresh;
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<()> {
        info!(pid = self.pgid, "shutting down Disco");
        self.kill().await;
        Ok(())
    }

    /// SIGKILL the whole process group, so helpers Disco started cannot keep
    /// the output pipe open, then reap the child.
    async fn kill(&mut self) {
        match kill_process_group(self.pgid) {
            Ok(()) | Err(Errno::ESRCH) => {}
            Err(err) => {
                warn!(error = %err, pgid = self.pgid, "failed to kill Disco's process group");
            }
        }
        if let Err(err) = self.child.kill().await {
            debug!(error = %err, pid = self.pgid, "killing Disco failed (already gone?)");
        }
    }

    async fn stream_until_prompt(
        &mut self,
        lines: &mpsc::UnboundedSender<String>,
    ) -> Result<Marker> {
        loop {
            let found = self.expect(MarkerSet::PromptsOrLine, None).await?;

            if found.is_prompt() {
                if !found.before.is_empty() {
                    emit(lines, found.before);
                }
                return Ok(found.marker);
            }

            let mut line = found.before;
            line.push('\n');
            emit(lines, line);
        }
    }

    async fn send_line(&mut self, line: &str) -> Result<()> {
        trace!(line, "-> disco");

        let mut bytes = Vec::with_capacity(line.len() + 1);
        bytes.extend_from_slice(line.as_bytes());
        bytes.push(b'\n');

        let written = match self.stdin.write_all(&bytes).await {
            Ok(()) => self.stdin.flush().await,
            Err(err) => Err(err),
        };

        match written {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::BrokenPipe => {
                debug!("Disco stdin is closed; collecting its last output");
                Err(self.drain_until_eof().await)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Wait for the next marker in `set`, reading more output as needed.
    async fn expect(&mut self, set: MarkerSet, limit: Option<Duration>) -> Result<ScanMatch> {
        let deadline = limit.map(|limit| (Instant::now() + limit, limit));

        loop {
            if let Some(found) = self.scanner.next_match(set) {
                trace!(marker = ?found.marker, text = %found.before, "<- disco");
                return Ok(found);
            }

            let chunk = match deadline {
                Some((deadline, limit)) => {
                    match tokio::time::timeout_at(deadline, self.output_rx.recv()).await {
                        Ok(chunk) => chunk,
                        Err(_) => {
                            return Err(ReplError::Timeout {
                                limit,
                                output: self.scanner.take_remaining(),
                            });
                        }
                    }
                }
                None => self.output_rx.recv().await,
            };

            match chunk {
                Some(bytes) => self.scanner.push(&bytes),
                None => {
                    return Err(ReplError::Eof {
                        output: self.scanner.take_remaining(),
                    });
                }
            }
        }
    }

    /// The child is gone: collect what it printed last and report EOF.
    async fn drain_until_eof(&mut self) -> ReplError {
        let limit = self.settings.command_timeout();
        let drained = tokio::time::timeout(limit, async {
            while let Some(bytes) = self.output_rx.recv().await {
                self.scanner.push(&bytes);
            }
        })
        .await;

        if drained.is_err() {
            warn!(?limit, "Disco output still open after its stdin closed");
        }
        ReplError::Eof {
            output: self.scanner.take_remaining(),
        }
    }

    async fn abandon_incomplete(&mut self, command: &str) -> ReplError {
        warn!(command, "Disco is waiting for more input; interrupting");
        if let Err(err) = interrupt_process_group(self.pgid) {
            warn!(error = %err, "failed to interrupt Disco");
        }
        if let Err(err) = self.expect(MarkerSet::Prompts, Some(INCOMPLETE_RESYNC)).await {
            debug!(error = %err, "no prompt after abandoning incomplete input");
        }
        ReplError::IncompleteInput {
            command: command.to_string(),
        }
    }
}

fn emit(lines: &mpsc::UnboundedSender<String>, text: String) {
    if lines.send(text).is_err() {
        trace!("line receiver dropped; discarding Disco output");
    }
}

/// Split a command into the lines to send.
///
/// A trailing newline means one more (empty) line; an empty command is an
/// error rather than a silent no-op.
fn command_lines(command: &str) -> Result<Vec<&str>> {
    let mut lines: Vec<&str> = command.lines().collect();
    if command.ends_with('\n') {
        lines.push("");
    }
    if lines.is_empty() {
        return Err(ReplError::EmptyCommand);
    }
    Ok(lines)
}

fn missing_pipe(name: &str) -> ReplError {
    ReplError::Io(io::Error::other(format!("Disco {name} was not captured")))
}

fn spawn_reader<R>(mut reader: R, tx: mpsc::Sender<Vec<u8>>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = vec![0u8; READ_CHUNK];
        loop {
            match reader.read(&mut buf).await {
                Ok(0) => {
                    trace!("Disco output closed");
                    break;
                }
                Ok(n) => {
                    if tx.send(buf[..n].to_vec()).await.is_err() {
                        break;
                    }
                }
                Err(err) => {
                    warn!(error = %err, "reading Disco output failed");
                    break;
                }
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_lines_handles_trailing_newline_and_empty_input() {
        assert_eq!(command_lines("1+1").unwrap(), vec!["1+1"]);
        assert_eq!(command_lines("a\nb").unwrap(), vec!["a", "b"]);
        assert_eq!(command_lines("a\n").unwrap(), vec!["a", ""]);
        assert!(matches!(command_lines(""), Err(ReplError::EmptyCommand)));
    }
}
