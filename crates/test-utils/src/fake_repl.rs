use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use disco_kernel::repl::{
    BoxFuture, MarkerSet, OutputScanner, PromptPattern, ReplBackend, ReplError, Result,
};
use tokio::sync::mpsc;

/// What the kernel asked the fake to do, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeEvent {
    Buffered(String),
    Streaming(String),
    Interrupt,
    Restart,
    Shutdown,
}

/// Scripted behaviour for one command.
#[derive(Debug, Clone)]
pub enum FakeReply {
    /// Print this text, then the prompt.
    Output(String),
    /// Print this text, then exit (the kernel sees end-of-stream).
    Exit(String),
    /// Print this text, then never return a prompt until interrupted.
    Hang(String),
    /// Buffered commands run out of time with this partial output.
    Timeout(String),
}

/// A `ReplBackend` that never spawns anything.
///
/// Commands without a scripted reply produce no output.
pub struct FakeRepl {
    replies: HashMap<String, FakeReply>,
    events: Arc<Mutex<Vec<FakeEvent>>>,
    interrupt_output: String,
    fail_restart: bool,
}

impl FakeRepl {
    pub fn new() -> Self {
        Self {
            replies: HashMap::new(),
            events: Arc::new(Mutex::new(Vec::new())),
            interrupt_output: String::new(),
            fail_restart: false,
        }
    }

    pub fn reply(mut self, command: &str, reply: FakeReply) -> Self {
        self.replies.insert(command.to_string(), reply);
        self
    }

    pub fn output(self, command: &str, text: &str) -> Self {
        self.reply(command, FakeReply::Output(text.to_string()))
    }

    pub fn interrupt_output(mut self, text: &str) -> Self {
        self.interrupt_output = text.to_string();
        self
    }

    pub fn failing_restart(mut self) -> Self {
        self.fail_restart = true;
        self
    }

    /// Shared log of everything the kernel did; stays valid after the fake
    /// is moved into a kernel.
    pub fn events(&self) -> Arc<Mutex<Vec<FakeEvent>>> {
        Arc::clone(&self.events)
    }

    fn record(&self, event: FakeEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl Default for FakeRepl {
    fn default() -> Self {
        Self::new()
    }
}

/// Split `text` the way the real wrapper does: complete lines keep their
/// `\n`, the unterminated tail is returned separately.
fn split_output(text: &str) -> (Vec<String>, String) {
    let mut scanner = OutputScanner::new(PromptPattern::new("", ""));
    scanner.push(text.as_bytes());

    let mut lines = Vec::new();
    while let Some(found) = scanner.next_match(MarkerSet::PromptsOrLine) {
        lines.push(format!("{}\n", found.before));
    }
    (lines, scanner.take_remaining())
}

fn send_all(lines: &mpsc::UnboundedSender<String>, chunks: Vec<String>) {
    for chunk in chunks {
        let _ = lines.send(chunk);
    }
}

impl ReplBackend for FakeRepl {
    fn run_command<'a>(&'a mut self, command: &'a str) -> BoxFuture<'a, Result<String>> {
        self.record(FakeEvent::Buffered(command.to_string()));
        let reply = self.replies.get(command).cloned();

        Box::pin(async move {
            match reply {
                None => Ok(String::new()),
                Some(FakeReply::Output(text)) => Ok(text),
                Some(FakeReply::Exit(text)) => Err(ReplError::Eof { output: text }),
                Some(FakeReply::Hang(_)) => std::future::pending().await,
                Some(FakeReply::Timeout(text)) => Err(ReplError::Timeout {
                    limit: Duration::from_secs(1),
                    output: text,
                }),
            }
        })
    }

    fn run_command_streaming<'a>(
        &'a mut self,
        command: &'a str,
        lines: &'a mpsc::UnboundedSender<String>,
    ) -> BoxFuture<'a, Result<()>> {
        self.record(FakeEvent::Streaming(command.to_string()));
        let reply = self.replies.get(command).cloned();

        Box::pin(async move {
            match reply {
                None => Ok(()),
                Some(FakeReply::Output(text)) | Some(FakeReply::Timeout(text)) => {
                    let (complete, rest) = split_output(&text);
                    send_all(lines, complete);
                    if !rest.is_empty() {
                        let _ = lines.send(rest);
                    }
                    Ok(())
                }
                Some(FakeReply::Exit(text)) => {
                    let (complete, rest) = split_output(&text);
                    send_all(lines, complete);
                    Err(ReplError::Eof { output: rest })
                }
                Some(FakeReply::Hang(text)) => {
                    let (complete, _) = split_output(&text);
                    send_all(lines, complete);
                    std::future::pending().await
                }
            }
        })
    }

    fn interrupt(&mut self) -> BoxFuture<'_, Result<String>> {
        self.record(FakeEvent::Interrupt);
        let output = self.interrupt_output.clone();
        Box::pin(async move { Ok(output) })
    }

    fn restart(&mut self) -> BoxFuture<'_, Result<()>> {
        self.record(FakeEvent::Restart);
        let fail = self.fail_restart;
        Box::pin(async move {
            if fail {
                return Err(ReplError::SpawnFailed {
                    binary: "fake-disco".to_string(),
                    source: io::Error::new(io::ErrorKind::NotFound, "gone"),
                });
            }
            Ok(())
        })
    }

    fn shutdown(&mut self) -> BoxFuture<'_, Result<()>> {
        self.record(FakeEvent::Shutdown);
        Box::pin(async { Ok(()) })
    }
}
