//! JSON-lines transport for `serve`
//!
//! - Input: one JSON object per line on stdin,
//!   `{"id": "...", "group": "...", "user": "...", "text": "..."}`
//!   (`id` optional, echoed back)
//! - Output: one JSON object per line on stdout,
//!   `{"id": ..., "status": "ok", "reply": "..." | null}` or
//!   `{"id": ..., "status": "error", "code": "...", "message": "..."}`
//! - Responses are written as handlers finish, not in input order

use serde::{Deserialize, Serialize};

use crate::command::CommandFacade;
use crate::model::GroupId;
use crate::observability::{Event, Logger};

/// One chat message delivered to the bot
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub id: Option<String>,
    pub group: String,
    pub user: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ChatResponse {
    Ok {
        id: Option<String>,
        reply: Option<String>,
    },
    Error {
        id: Option<String>,
        code: &'static str,
        message: String,
    },
}

impl ChatResponse {
    fn rejected(id: Option<String>, code: &'static str, message: String) -> Self {
        Logger::warn(
            Event::RequestRejected,
            &[("code", code), ("error", message.as_str())],
        );
        ChatResponse::Error { id, code, message }
    }

    /// Render as one output line, newline included
    pub fn to_line(&self) -> String {
        let mut line = serde_json::to_string(self).unwrap_or_else(|e| {
            format!(
                r#"{{"status":"error","code":"ROLECALL_CLI_IO_ERROR","message":"{}"}}"#,
                e.to_string().replace('"', "'")
            )
        });
        line.push('\n');
        line
    }
}

/// Handle one input line end to end.
pub async fn handle_line(facade: &CommandFacade, line: &str) -> ChatResponse {
    let request: ChatRequest = match serde_json::from_str(line) {
        Ok(request) => request,
        Err(e) => {
            return ChatResponse::rejected(
                None,
                "ROLECALL_CLI_BAD_REQUEST",
                format!("invalid request JSON: {}", e),
            )
        }
    };
    let group = match GroupId::parse(&request.group) {
        Ok(group) => group,
        Err(e) => return ChatResponse::rejected(request.id, e.code(), e.to_string()),
    };

    let reply = facade.execute(&group, &request.user, &request.text).await;
    ChatResponse::Ok {
        id: request.id,
        reply,
    }
}
