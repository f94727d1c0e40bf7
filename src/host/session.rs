// src/host/session.rs

//! Request loop around a `Kernel`.
//!
//! Three pieces run concurrently:
//! - a reader task that parses request lines. Interrupt requests are acted
//!   on right there, so they reach a running `execute` instead of queueing
//!   behind it.
//! - the dispatch loop (this task), which hands the remaining requests to the
//!   kernel strictly one at a time.
//! - a writer task that serialises outgoing messages to the output stream.

use anyhow::Context;
use serde_json::json;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::errors::Result;
use crate::kernel::{InterruptHandle, Kernel};

use super::protocol::{OutgoingMessage, Request, RequestMessage};
use super::sink::ChannelSink;

const REQUEST_QUEUE: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

pub struct Session<K: Kernel> {
    kernel: K,
    interrupts: InterruptHandle,
}

impl<K: Kernel> Session<K> {
    pub fn new(kernel: K, interrupts: InterruptHandle) -> Self {
        Self { kernel, interrupts }
    }

    /// Serve requests from `input` until a shutdown request or end of input,
    /// then shut the kernel down and flush all output.
    pub async fn run<I, O>(mut self, input: I, output: O) -> Result<()>
    where
        I: AsyncBufRead + Unpin + Send + 'static,
        O: AsyncWrite + Unpin + Send + 'static,
    {
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let writer = tokio::spawn(write_messages(output, out_rx));

        let (req_tx, mut req_rx) = mpsc::channel(REQUEST_QUEUE);
        let reader = tokio::spawn(read_requests(
            input,
            req_tx,
            out_tx.clone(),
            self.interrupts.clone(),
        ));

        info!("kernel session started");
        let mut flow = Flow::Continue;
        while let Some(message) = req_rx.recv().await {
            flow = self.dispatch(message, &out_tx).await;
            if flow == Flow::Stop {
                break;
            }
        }

        if flow == Flow::Continue {
            info!("host input closed; shutting down");
            if let Err(err) = self.kernel.shutdown().await {
                warn!(error = %err, "kernel shutdown failed");
            }
        }

        reader.abort();
        drop(out_tx);
        writer.await.context("joining output writer")??;

        info!("kernel session finished");
        Ok(())
    }

    async fn dispatch(
        &mut self,
        message: RequestMessage,
        out: &mpsc::UnboundedSender<OutgoingMessage>,
    ) -> Flow {
        let parent = message.msg_id.clone();
        let request = match message.request() {
            Ok(request) => request,
            Err(err) => {
                warn!(msg_type = %message.msg_type, error = %err, "rejecting request");
                send(out, OutgoingMessage::error(parent, &err.to_string()));
                return Flow::Continue;
            }
        };

        debug!(msg_type = %message.msg_type, msg_id = ?parent, "dispatching request");
        send(out, OutgoingMessage::status(parent.clone(), "busy"));

        let flow = match request {
            Request::KernelInfo => {
                let mut content = serde_json::to_value(self.kernel.info())
                    .unwrap_or_else(|_| json!({}));
                content["status"] = json!("ok");
                reply(out, parent.clone(), "kernel_info_reply", &content);
                Flow::Continue
            }
            Request::Execute(request) => {
                let mut sink = ChannelSink::new(parent.clone(), out.clone());
                let result = self.kernel.execute(&request, &mut sink).await;
                reply(out, parent.clone(), "execute_reply", &result);
                Flow::Continue
            }
            Request::Complete(request) => {
                let result = self.kernel.complete(&request.code, request.cursor_pos);
                reply(out, parent.clone(), "complete_reply", &result);
                Flow::Continue
            }
            Request::Shutdown { restart } => {
                if let Err(err) = self.kernel.shutdown().await {
                    error!(error = %err, "kernel shutdown failed");
                }
                reply(
                    out,
                    parent.clone(),
                    "shutdown_reply",
                    &json!({ "status": "ok", "restart": restart }),
                );
                Flow::Stop
            }
        };

        send(out, OutgoingMessage::status(parent, "idle"));
        flow
    }
}

async fn read_requests<I>(
    input: I,
    requests: mpsc::Sender<RequestMessage>,
    out: mpsc::UnboundedSender<OutgoingMessage>,
    interrupts: InterruptHandle,
) where
    I: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(err) => {
                error!(error = %err, "reading host input failed");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let message = match RequestMessage::parse_line(&line) {
            Ok(message) => message,
            Err(err) => {
                warn!(error = %err, "skipping malformed request line");
                send(&out, OutgoingMessage::error(None, &err.to_string()));
                continue;
            }
        };

        if message.is_interrupt() {
            info!(msg_id = ?message.msg_id, "interrupt requested");
            interrupts.interrupt();
            reply(
                &out,
                message.msg_id,
                "interrupt_reply",
                &json!({ "status": "ok" }),
            );
            continue;
        }

        if requests.send(message).await.is_err() {
            break;
        }
    }
    debug!("request reader finished");
}

async fn write_messages<O>(
    mut output: O,
    mut messages: mpsc::UnboundedReceiver<OutgoingMessage>,
) -> Result<()>
where
    O: AsyncWrite + Unpin,
{
    while let Some(message) = messages.recv().await {
        let mut line = serde_json::to_string(&message)?;
        line.push('\n');
        output.write_all(line.as_bytes()).await?;
        output.flush().await?;
    }
    output.shutdown().await?;
    Ok(())
}

fn reply<T: serde::Serialize>(
    out: &mpsc::UnboundedSender<OutgoingMessage>,
    parent: Option<String>,
    msg_type: &str,
    content: &T,
) {
    match OutgoingMessage::new(parent, msg_type, content) {
        Ok(message) => send(out, message),
        Err(err) => error!(msg_type, error = %err, "failed to encode reply"),
    }
}

fn send(out: &mpsc::UnboundedSender<OutgoingMessage>, message: OutgoingMessage) {
    if out.send(message).is_err() {
        debug!("output writer is gone; dropping message");
    }
}
