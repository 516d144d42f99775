//! API per il codice applicativo lato server: accodare SMS da spedire,
//! consumare quelli ricevuti e consultare lo stato dei messaggi.
//! Il dispositivo non passa di qui.

use futures_util::stream::{self, BoxStream, StreamExt};
use smssync_core::{IncomingMessage, OutgoingMessage};
use sqlx::SqlitePool;
use std::collections::VecDeque;

use crate::{store, SyncError};

/// Accoda un nuovo messaggio in uscita; verrà consegnato alla prossima GET task=send.
pub async fn send(pool: &SqlitePool, text: &str, to: &str) -> Result<OutgoingMessage, SyncError> {
    let message = OutgoingMessage::create(text, to)?;
    let mut conn = pool.acquire().await?;
    store::insert_outgoing(&mut *conn, &message).await?;
    tracing::info!("queued message {} to {}", message.id, message.to);
    Ok(message)
}

/// Stream dei messaggi in arrivo non ancora consumati, opzionalmente di un solo mittente.
///
/// La query parte al primo poll. Ogni messaggio viene segnato come ricevuto nel passo
/// che lo produce, non prima: se il chiamante smette di iterare, i messaggi rimanenti
/// restano non ricevuti e usciranno da una chiamata successiva.
pub fn receive(pool: &SqlitePool, sent_from: Option<&str>) -> BoxStream<'static, Result<IncomingMessage, sqlx::Error>> {
    let cursor = Cursor::Pending {
        pool: pool.clone(),
        sent_from: sent_from.map(str::to_owned),
    };
    stream::unfold(cursor, Cursor::step).boxed()
}

/// Messaggi in uscita ancora in coda (non segnati come inviati), dal più recente.
/// Solo lettura: non li segna come consegnati.
pub async fn pending_outgoing(pool: &SqlitePool) -> Result<Vec<OutgoingMessage>, sqlx::Error> {
    let mut conn = pool.acquire().await?;
    store::unsent_outgoing(&mut *conn).await
}

/// Stato attuale di un messaggio in uscita, ad es. per sapere se il dispositivo l'ha già preso.
pub async fn find_outgoing(pool: &SqlitePool, id: &str) -> Result<Option<OutgoingMessage>, sqlx::Error> {
    let mut conn = pool.acquire().await?;
    store::find_outgoing(&mut *conn, id).await
}

/// Messaggio in arrivo per id, senza segnarlo come ricevuto.
pub async fn find_incoming(pool: &SqlitePool, id: &str) -> Result<Option<IncomingMessage>, sqlx::Error> {
    let mut conn = pool.acquire().await?;
    store::find_incoming(&mut *conn, id).await
}

/// Tutti i record arrivati con un dato message_id del dispositivo, dal più recente.
/// Il dispositivo può ripetere un invio: i duplicati non vengono scartati.
pub async fn incoming_by_message_id(pool: &SqlitePool, message_id: &str) -> Result<Vec<IncomingMessage>, sqlx::Error> {
    let mut conn = pool.acquire().await?;
    store::incoming_by_message_id(&mut *conn, message_id).await
}

enum Cursor {
    Pending { pool: SqlitePool, sent_from: Option<String> },
    Draining { pool: SqlitePool, queue: VecDeque<IncomingMessage> },
    Done,
}

impl Cursor {
    async fn step(self) -> Option<(Result<IncomingMessage, sqlx::Error>, Cursor)> {
        let (pool, mut queue) = match self {
            Cursor::Pending { pool, sent_from } => match snapshot(&pool, sent_from.as_deref()).await {
                Ok(queue) => (pool, queue),
                Err(e) => return Some((Err(e), Cursor::Done)),
            },
            Cursor::Draining { pool, queue } => (pool, queue),
            Cursor::Done => return None,
        };

        while let Some(mut m) = queue.pop_front() {
            match mark(&pool, &mut m).await {
                Ok(true) => return Some((Ok(m), Cursor::Draining { pool, queue })),
                // preso da un altro consumatore nel frattempo
                Ok(false) => continue,
                Err(e) => return Some((Err(e), Cursor::Done)),
            }
        }
        None
    }
}

async fn snapshot(pool: &SqlitePool, sent_from: Option<&str>) -> Result<VecDeque<IncomingMessage>, sqlx::Error> {
    let mut conn = pool.acquire().await?;
    Ok(store::unreceived_incoming(&mut *conn, sent_from).await?.into())
}

async fn mark(pool: &SqlitePool, m: &mut IncomingMessage) -> Result<bool, sqlx::Error> {
    let mut conn = pool.acquire().await?;
    store::mark_incoming_received(&mut *conn, m).await
}
