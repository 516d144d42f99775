use serde::{Deserialize, Serialize};

use super::{check_len, MAX_FIELD_CHARS, MAX_MESSAGE_CHARS};
use crate::error::ValidationError;
use crate::protocol::http::IncomingParams;
use crate::utils::{new_id, now_timestamp, timestamp_from_millis};

/// SMS ricevuto dal dispositivo e persistito dal server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingMessage {
    pub id: String,
    pub sent_from: String,
    pub message: String,
    pub message_id: String,
    pub sent_to: String,
    pub device_id: String,
    pub sent_timestamp: String, // RFC3339 UTC
    pub created: String,        // RFC3339 UTC
    pub received: bool,
    pub received_timestamp: Option<String>, // RFC3339 UTC, presente sse received
}

impl IncomingMessage {
    /// Ordine canonico dei campi obbligatori, usato anche nel messaggio d'errore.
    pub const REQUIRED_KEYWORDS: [&'static str; 4] = ["from", "message", "sent_timestamp", "message_id"];

    /// Costruisce un nuovo messaggio (non ancora salvato) dai parametri della POST.
    pub fn create(params: &IncomingParams) -> Result<Self, ValidationError> {
        let missing: Vec<&'static str> = Self::REQUIRED_KEYWORDS
            .into_iter()
            .filter(|k| params.required(k).map_or(true, str::is_empty))
            .collect();
        if !missing.is_empty() {
            return Err(ValidationError::MissingFields(missing));
        }

        // i campi obbligatori sono presenti, controllato sopra
        let sent_from = params.sent_from.clone().unwrap_or_default();
        let message = params.message.clone().unwrap_or_default();
        let message_id = params.message_id.clone().unwrap_or_default();
        let raw_timestamp = params.sent_timestamp.as_deref().unwrap_or_default();

        let sent_timestamp = timestamp_from_millis(raw_timestamp)?;

        let sent_to = params.sent_to.clone().unwrap_or_default();
        let device_id = params.device_id.clone().unwrap_or_default();

        check_len("message", &message, MAX_MESSAGE_CHARS)?;
        check_len("message_id", &message_id, MAX_FIELD_CHARS)?;
        check_len("sent_to", &sent_to, MAX_FIELD_CHARS)?;
        check_len("device_id", &device_id, MAX_FIELD_CHARS)?;

        Ok(Self {
            id: new_id(),
            sent_from,
            message,
            message_id,
            sent_to,
            device_id,
            sent_timestamp,
            created: now_timestamp(),
            received: false,
            received_timestamp: None,
        })
    }

    /// Segna il messaggio come consumato. Ritorna false se lo era già:
    /// received passa da false a true una volta sola.
    pub fn mark_as_received(&mut self) -> bool {
        if self.received {
            return false;
        }
        self.received = true;
        self.received_timestamp = Some(now_timestamp());
        true
    }
}

impl IncomingParams {
    fn required(&self, keyword: &str) -> Option<&str> {
        match keyword {
            "from" => self.sent_from.as_deref(),
            "message" => self.message.as_deref(),
            "sent_timestamp" => self.sent_timestamp.as_deref(),
            "message_id" => self.message_id.as_deref(),
            _ => None,
        }
    }
}
