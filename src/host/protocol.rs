// src/host/protocol.rs

//! Wire format of the line-delimited JSON host.
//!
//! Incoming, one object per line:
//!
//! ```json
//! {"msg_id": "a1", "msg_type": "execute_request", "content": {"code": "1+1"}}
//! ```
//!
//! Outgoing messages echo the request id as `parent_id`:
//!
//! ```json
//! {"parent_id": "a1", "msg_type": "stream", "content": {"name": "stdout", "text": "2\n"}}
//! ```

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;

use crate::kernel::{CompleteRequest, ExecuteRequest, StreamName};

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("malformed request line: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("unsupported msg_type '{0}'")]
    UnknownType(String),

    #[error("'{0}' is answered as soon as it is read, never queued")]
    OutOfBand(String),

    #[error("invalid content for '{msg_type}': {source}")]
    InvalidContent {
        msg_type: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A request line before its content is interpreted.
#[derive(Debug, Clone, Deserialize)]
pub struct RequestMessage {
    #[serde(default)]
    pub msg_id: Option<String>,
    pub msg_type: String,
    #[serde(default)]
    pub content: Value,
}

pub const INTERRUPT_REQUEST: &str = "interrupt_request";

/// Requests served one at a time by the dispatch loop.
///
/// `interrupt_request` is not among them: it has to reach a running
/// `execute`, so the reader acts on it directly (see
/// [`RequestMessage::is_interrupt`]).
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    KernelInfo,
    Execute(ExecuteRequest),
    Complete(CompleteRequest),
    Shutdown { restart: bool },
}

#[derive(Debug, Default, Deserialize)]
struct ShutdownContent {
    #[serde(default)]
    restart: bool,
}

impl RequestMessage {
    pub fn parse_line(line: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(line)?)
    }

    pub fn is_interrupt(&self) -> bool {
        self.msg_type == INTERRUPT_REQUEST
    }

    pub fn request(&self) -> Result<Request, ProtocolError> {
        match self.msg_type.as_str() {
            "kernel_info_request" => Ok(Request::KernelInfo),
            "execute_request" => Ok(Request::Execute(self.content()?)),
            "complete_request" => Ok(Request::Complete(self.content()?)),
            INTERRUPT_REQUEST => Err(ProtocolError::OutOfBand(self.msg_type.clone())),
            "shutdown_request" => {
                let content: ShutdownContent = if self.content.is_null() {
                    ShutdownContent::default()
                } else {
                    self.content()?
                };
                Ok(Request::Shutdown {
                    restart: content.restart,
                })
            }
            other => Err(ProtocolError::UnknownType(other.to_string())),
        }
    }

    fn content<T: DeserializeOwned>(&self) -> Result<T, ProtocolError> {
        serde_json::from_value(self.content.clone()).map_err(|source| {
            ProtocolError::InvalidContent {
                msg_type: self.msg_type.clone(),
                source,
            }
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutgoingMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    pub msg_type: String,
    pub content: Value,
}

impl OutgoingMessage {
    pub fn new<T: Serialize>(
        parent_id: Option<String>,
        msg_type: &str,
        content: &T,
    ) -> serde_json::Result<Self> {
        Ok(Self {
            parent_id,
            msg_type: msg_type.to_string(),
            content: serde_json::to_value(content)?,
        })
    }

    pub fn status(parent_id: Option<String>, execution_state: &str) -> Self {
        Self {
            parent_id,
            msg_type: "status".to_string(),
            content: json!({ "execution_state": execution_state }),
        }
    }

    pub fn stream(parent_id: Option<String>, name: StreamName, text: &str) -> Self {
        Self {
            parent_id,
            msg_type: "stream".to_string(),
            content: json!({ "name": name, "text": text }),
        }
    }

    pub fn error(parent_id: Option<String>, message: &str) -> Self {
        Self {
            parent_id,
            msg_type: "error".to_string(),
            content: json!({ "evalue": message }),
        }
    }
}
