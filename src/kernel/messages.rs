// src/kernel/messages.rs

//! Request and reply shapes of the host contract.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyStatus {
    Ok,
    Abort,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamName {
    Stdout,
    Stderr,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExecuteRequest {
    pub code: String,

    #[serde(default)]
    pub silent: bool,

    #[serde(default = "default_true")]
    pub store_history: bool,

    /// Accepted for contract compatibility; Disco has nothing to evaluate
    /// them with, so replies always carry an empty map.
    #[serde(default)]
    pub user_expressions: Map<String, Value>,

    #[serde(default)]
    pub allow_stdin: bool,
}

fn default_true() -> bool {
    true
}

impl ExecuteRequest {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            silent: false,
            store_history: true,
            user_expressions: Map::new(),
            allow_stdin: false,
        }
    }

    pub fn silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorContent {
    pub ename: String,
    pub evalue: String,
    pub traceback: Vec<String>,
}

/// Reply to an execute request.
///
/// `abort` replies carry only status and count; `error` replies add the
/// error fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecuteReply {
    pub status: ReplyStatus,
    pub execution_count: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Vec<Value>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_expressions: Option<Map<String, Value>>,

    #[serde(flatten)]
    pub error: Option<ErrorContent>,
}

impl ExecuteReply {
    pub fn ok(execution_count: u32) -> Self {
        Self {
            status: ReplyStatus::Ok,
            execution_count,
            payload: Some(Vec::new()),
            user_expressions: Some(Map::new()),
            error: None,
        }
    }

    pub fn abort(execution_count: u32) -> Self {
        Self {
            status: ReplyStatus::Abort,
            execution_count,
            payload: None,
            user_expressions: None,
            error: None,
        }
    }

    pub fn error(execution_count: u32, ename: &str, evalue: impl Into<String>) -> Self {
        let evalue = evalue.into();
        Self {
            status: ReplyStatus::Error,
            execution_count,
            payload: None,
            user_expressions: None,
            error: Some(ErrorContent {
                ename: ename.to_string(),
                traceback: vec![format!("{ename}: {evalue}")],
                evalue,
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CompleteRequest {
    pub code: String,
    pub cursor_pos: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompleteReply {
    pub matches: Vec<String>,
    pub cursor_start: usize,
    pub cursor_end: usize,
    pub metadata: Map<String, Value>,
    pub status: ReplyStatus,
}

impl CompleteReply {
    /// No suggestions, with the range covering everything before the cursor.
    pub fn empty(cursor_pos: usize) -> Self {
        Self {
            matches: Vec::new(),
            cursor_start: 0,
            cursor_end: cursor_pos,
            metadata: Map::new(),
            status: ReplyStatus::Ok,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn ok_reply_has_payload_and_expressions() {
        let value = serde_json::to_value(ExecuteReply::ok(3)).unwrap();
        assert_eq!(
            value,
            json!({"status": "ok", "execution_count": 3, "payload": [], "user_expressions": {}})
        );
    }

    #[test]
    fn abort_reply_is_minimal() {
        let value = serde_json::to_value(ExecuteReply::abort(2)).unwrap();
        assert_eq!(value, json!({"status": "abort", "execution_count": 2}));
    }

    #[test]
    fn error_reply_flattens_error_fields() {
        let value = serde_json::to_value(ExecuteReply::error(1, "Timeout", "slow")).unwrap();
        assert_eq!(value["status"], "error");
        assert_eq!(value["ename"], "Timeout");
        assert_eq!(value["evalue"], "slow");
        assert_eq!(value["traceback"], json!(["Timeout: slow"]));
    }

    #[test]
    fn execute_request_defaults() {
        let req: ExecuteRequest = serde_json::from_value(json!({"code": "1+1"})).unwrap();
        assert_eq!(req, ExecuteRequest::new("1+1"));
    }
}
