use serde::{Deserialize, Serialize};

use super::{check_len, MAX_MESSAGE_CHARS};
use crate::error::ValidationError;
use crate::protocol::http::TaskMessage;
use crate::utils::{new_id, now_timestamp};

/// Messaggio accodato lato server che il dispositivo deve spedire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingMessage {
    pub id: String,
    pub to: String,
    pub message: String,
    pub created: String, // RFC3339 UTC
    pub sent: bool,
    pub sent_timestamp: Option<String>, // RFC3339 UTC, presente sse sent
}

impl OutgoingMessage {
    pub fn create(text: &str, to: &str) -> Result<Self, ValidationError> {
        if to.is_empty() {
            return Err(ValidationError::Empty("to"));
        }
        check_len("message", text, MAX_MESSAGE_CHARS)?;

        Ok(Self {
            id: new_id(),
            to: to.to_string(),
            message: text.to_string(),
            created: now_timestamp(),
            sent: false,
            sent_timestamp: None,
        })
    }

    /// Segna il messaggio come consegnato al dispositivo; false se lo era già.
    pub fn mark_as_sent(&mut self) -> bool {
        if self.sent {
            return false;
        }
        self.sent = true;
        self.sent_timestamp = Some(now_timestamp());
        true
    }

    pub fn task_message(&self) -> TaskMessage {
        TaskMessage {
            to: self.to.clone(),
            message: self.message.clone(),
            uuid: self.id.clone(),
        }
    }
}
