use axum::{extract::Extension, extract::Query, Form, Json};
use smssync_core::{
    Envelope, IncomingMessage, IncomingParams, SendTaskPayload, SubmitResult, Task, TaskQuery,
};
use std::sync::Arc;

use crate::{store, AppState, SyncError};

/// Handler per POST / : il dispositivo notifica un SMS ricevuto.
///
/// `task=result` e `task=sent` fanno parte del protocollo SMSSync ma non sono gestiti:
/// rispondono 501 senza toccare il database.
pub async fn post_sync(
    Extension(state): Extension<Arc<AppState>>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Json<Envelope<SubmitResult>>, SyncError> {
    let params = IncomingParams::from_pairs(pairs);
    // qualsiasi altro valore di task è un nuovo messaggio
    if let Some(task @ (Task::Result | Task::Sent)) = params.task.as_deref().and_then(Task::from_param) {
        return Err(SyncError::UnsupportedTask(task.as_str()));
    }

    tracing::info!(
        "got message {:?} from {:?}",
        params.message_id.as_deref().unwrap_or_default(),
        params.sent_from.as_deref().unwrap_or_default()
    );

    let message = match IncomingMessage::create(&params) {
        Ok(m) => m,
        Err(e) => {
            tracing::info!("rejected incoming message: {}", e);
            return Ok(Json(Envelope::new(SubmitResult::failed(e.to_string()))));
        }
    };

    // insert dentro una transazione: o il record c'è tutto o non c'è
    let mut tx = state.pool.begin().await?;
    store::insert_incoming(&mut *tx, &message).await?;
    tx.commit().await?;

    Ok(Json(Envelope::new(SubmitResult::ok())))
}

/// Handler per GET / : task=send consegna al dispositivo la coda dei messaggi in uscita.
pub async fn get_sync(
    Extension(state): Extension<Arc<AppState>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<Envelope<SendTaskPayload>>, SyncError> {
    let raw = TaskQuery::from_pairs(pairs).task.unwrap_or_default();
    match Task::from_param(&raw) {
        Some(Task::Send) => {}
        Some(task @ Task::Result) => return Err(SyncError::UnsupportedTask(task.as_str())),
        _ => return Err(SyncError::UnknownTask(raw)),
    }

    // un solo UPDATE ... RETURNING dentro la transazione: niente finestra tra lettura e marcatura
    let mut tx = state.pool.begin().await?;
    let drained = store::drain_unsent(&mut *tx).await?;
    tx.commit().await?;

    let messages: Vec<_> = drained
        .iter()
        .inspect(|m| tracing::info!("sent message {} to {}", m.id, m.to))
        .map(|m| m.task_message())
        .collect();

    let payload = SendTaskPayload::new(state.settings.secret_value.clone(), messages);
    Ok(Json(Envelope::new(payload)))
}
