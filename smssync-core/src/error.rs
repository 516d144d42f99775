use thiserror::Error;

/// Errore di validazione di un messaggio prima della persistenza.
///
/// Il testo (`Display`) finisce così com'è nel campo `error` del payload
/// restituito al dispositivo.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Campi obbligatori assenti o vuoti, nell'ordine canonico.
    #[error("Required keyword(s) missing: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("Invalid sent_timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("{field} exceeds {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("{0} must not be empty")]
    Empty(&'static str),
}
