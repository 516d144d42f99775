use serde::{Deserialize, Serialize};
/*
    dto per il protocollo HTTP di SMSSync.
    Il dispositivo usa nomi snake_case, quindi niente rename_all qui.
    Ogni risposta è un oggetto JSON con la sola chiave "payload".
*/

/// Busta { "payload": ... } attorno a ogni risposta.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub payload: T,
}

impl<T> Envelope<T> {
    pub fn new(payload: T) -> Self {
        Self { payload }
    }
}

/// Esito dell'invio di un messaggio in arrivo (e degli errori del gate).
/// `error` viene sempre serializzato, anche quando è null.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitResult {
    pub success: bool,
    pub error: Option<String>,
}

impl SubmitResult {
    pub fn ok() -> Self {
        Self { success: true, error: None }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self { success: false, error: Some(error.into()) }
    }
}

// GET task=send
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendTaskPayload {
    pub task: Task,
    /// Secret restituito al dispositivo (SMSSYNC_SECRET_VALUE).
    pub secret: String,
    pub messages: Vec<TaskMessage>,
    pub error: Option<String>,
}

impl SendTaskPayload {
    pub fn new(secret: impl Into<String>, messages: Vec<TaskMessage>) -> Self {
        Self { task: Task::Send, secret: secret.into(), messages, error: None }
    }
}

/// Un messaggio in uscita come lo vuole il dispositivo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskMessage {
    pub to: String,
    pub message: String,
    pub uuid: String,
}

/// Selettore della modalità di una richiesta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Task {
    Send,
    Result,
    Sent,
}

impl Task {
    /// Interpreta il parametro `task`; None se vuoto o sconosciuto.
    pub fn from_param(raw: &str) -> Option<Self> {
        match raw {
            "send" => Some(Task::Send),
            "result" => Some(Task::Result),
            "sent" => Some(Task::Sent),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Task::Send => "send",
            Task::Result => "result",
            Task::Sent => "sent",
        }
    }
}

/// Campi form di una POST del dispositivo. I campi non riconosciuti vengono ignorati.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingParams {
    #[serde(rename = "from", default, skip_serializing_if = "Option::is_none")]
    pub sent_from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sent_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sent_timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<String>,
}

impl IncomingParams {
    /// Costruisce i parametri dalle coppie chiave/valore del form.
    /// Per una chiave ripetuta vale l'ultimo valore; le chiavi sconosciute sono ignorate.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut params = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "from" => &mut params.sent_from,
                "message" => &mut params.message,
                "message_id" => &mut params.message_id,
                "sent_to" => &mut params.sent_to,
                "secret" => &mut params.secret,
                "device_id" => &mut params.device_id,
                "sent_timestamp" => &mut params.sent_timestamp,
                "task" => &mut params.task,
                _ => continue,
            };
            *slot = Some(value);
        }
        params
    }
}

// Query string di una GET (task=send&secret=...)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskQuery {
    #[serde(default)]
    pub task: Option<String>,
    #[serde(default)]
    pub secret: Option<String>,
}

impl TaskQuery {
    /// Come `IncomingParams::from_pairs`: l'ultimo valore di una chiave ripetuta vince.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut query = Self::default();
        for (key, value) in pairs {
            match key.as_str() {
                "task" => query.task = Some(value),
                "secret" => query.secret = Some(value),
                _ => {}
            }
        }
        query
    }
}
