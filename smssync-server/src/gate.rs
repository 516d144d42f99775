use axum::body::{to_bytes, Body};
use axum::extract::{Extension, Request};
use axum::http::Method;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use sha2::{Digest, Sha256};
use smssync_core::{IncomingParams, TaskQuery};
use std::sync::Arc;

use crate::{AppState, SyncError};

/// Limite al corpo di una POST del dispositivo; un SMS sta abbondantemente sotto.
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Middleware: lascia passare la richiesta solo se il parametro `secret`
/// (query per GET, form per POST) coincide con SMSSYNC_SECRET_KEY.
/// Se `secret` è ripetuto vale l'ultimo.
pub async fn require_secret(
    Extension(state): Extension<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    let (secret, req) = if req.method() == Method::POST {
        // il corpo va letto per intero e poi rimesso nella richiesta per l'handler
        let (parts, body) = req.into_parts();
        let bytes = match to_bytes(body, MAX_BODY_BYTES).await {
            Ok(b) => b,
            Err(e) => {
                tracing::warn!("unreadable request body: {}", e);
                return SyncError::SecretMismatch.into_response();
            }
        };
        let secret = serde_urlencoded::from_bytes::<Vec<(String, String)>>(&bytes)
            .ok()
            .and_then(|pairs| IncomingParams::from_pairs(pairs).secret);
        (secret, Request::from_parts(parts, Body::from(bytes)))
    } else {
        let secret = req
            .uri()
            .query()
            .and_then(|q| serde_urlencoded::from_str::<Vec<(String, String)>>(q).ok())
            .and_then(|pairs| TaskQuery::from_pairs(pairs).secret);
        (secret, req)
    };

    if !secret_matches(secret.as_deref(), &state.settings.secret_key) {
        tracing::warn!("rejected {} {}: secret mismatch", req.method(), req.uri().path());
        return SyncError::SecretMismatch.into_response();
    }
    next.run(req).await
}

/// Confronta i digest SHA-256 invece delle stringhe; un secret assente non corrisponde mai.
pub fn secret_matches(sent: Option<&str>, expected: &str) -> bool {
    match sent {
        Some(sent) => Sha256::digest(sent.as_bytes()) == Sha256::digest(expected.as_bytes()),
        None => false,
    }
}
