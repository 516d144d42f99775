//! smssync-core: tipi condivisi tra server e codice applicativo (record dei messaggi,
//! payload HTTP del protocollo SMSSync, errori di validazione).
//! Niente I/O: la persistenza vive in smssync-server.

pub mod error;
pub mod models;
pub mod protocol;
pub mod utils;

// Re-export utili per ridurre i percorsi nel crate server
pub use error::ValidationError;
pub use models::{IncomingMessage, OutgoingMessage, MAX_MESSAGE_CHARS};
pub use protocol::http::{
    Envelope, IncomingParams, SendTaskPayload, SubmitResult, Task, TaskMessage, TaskQuery,
};
pub use utils::{new_id, now_timestamp, timestamp_from_millis};
