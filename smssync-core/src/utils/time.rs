use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use crate::error::ValidationError;

/// Restituisce l'istante corrente in UTC formattato come RFC3339 (es. "2025-11-02T12:34:56Z").
pub fn now_timestamp() -> String {
    let now = OffsetDateTime::now_utc();
    now.format(&Rfc3339).expect("error formatting timestamp")
}

/// Converte i millisecondi epoch inviati dal dispositivo (come stringa) in RFC3339 UTC.
///
/// Accetta sia interi ("1298244863") che decimali ("1298244863.5").
pub fn timestamp_from_millis(raw: &str) -> Result<String, ValidationError> {
    let invalid = || ValidationError::InvalidTimestamp(raw.to_string());
    let trimmed = raw.trim();

    let nanos: i128 = match trimmed.parse::<i64>() {
        Ok(ms) => i128::from(ms) * 1_000_000,
        Err(_) => {
            let ms: f64 = trimmed.parse().map_err(|_| invalid())?;
            if !ms.is_finite() {
                return Err(invalid());
            }
            (ms * 1_000_000.0).round() as i128
        }
    };

    // anni fuori da 0..=9999 non sono rappresentabili in RFC3339
    OffsetDateTime::from_unix_timestamp_nanos(nanos)
        .map_err(|_| invalid())?
        .format(&Rfc3339)
        .map_err(|_| invalid())
}
