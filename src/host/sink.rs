// src/host/sink.rs

use anyhow::anyhow;
use tokio::sync::mpsc;

use crate::errors::Result;
use crate::kernel::{OutputSink, StreamName};

use super::protocol::OutgoingMessage;

/// `OutputSink` that queues `stream` messages for the stdout writer,
/// tagged with the id of the request that produced them.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    parent_id: Option<String>,
    tx: mpsc::UnboundedSender<OutgoingMessage>,
}

impl ChannelSink {
    pub fn new(parent_id: Option<String>, tx: mpsc::UnboundedSender<OutgoingMessage>) -> Self {
        Self { parent_id, tx }
    }
}

impl OutputSink for ChannelSink {
    fn stream(&mut self, name: StreamName, text: &str) -> Result<()> {
        self.tx
            .send(OutgoingMessage::stream(self.parent_id.clone(), name, text))
            .map_err(|_| anyhow!("host output writer has stopped"))?;
        Ok(())
    }
}
