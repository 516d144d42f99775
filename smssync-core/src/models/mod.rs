pub mod incoming;
pub mod outgoing;

// Re-export per comodità
pub use incoming::IncomingMessage;
pub use outgoing::OutgoingMessage;

/// Lunghezza massima di un SMS, in caratteri.
pub const MAX_MESSAGE_CHARS: usize = 160;

/// Lunghezza massima dei campi identificativi (message_id, sent_to, device_id).
pub const MAX_FIELD_CHARS: usize = 32;

pub(crate) fn check_len(
    field: &'static str,
    value: &str,
    max: usize,
) -> Result<(), crate::ValidationError> {
    if value.chars().count() > max {
        return Err(crate::ValidationError::TooLong { field, max });
    }
    Ok(())
}
