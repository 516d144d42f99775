//! Accesso SQL alle tabelle dei messaggi.
//!
//! Le funzioni prendono una `SqliteConnection` così da poter girare sia su una
//! connessione del pool che dentro una transazione (`&mut *tx`).
//! Le code si leggono dal messaggio più recente: `created` decrescente, a parità
//! l'ultimo inserito.

use smssync_core::{now_timestamp, IncomingMessage, OutgoingMessage};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

const INCOMING_COLUMNS: &str = "id, sent_from, message, message_id, sent_to, device_id, \
    sent_timestamp, created, received, received_timestamp";
const OUTGOING_COLUMNS: &str = "id, recipient, message, created, sent, sent_timestamp";
// julianday() confronta gli istanti, non le stringhe RFC3339 (che hanno frazioni di lunghezza variabile)
const NEWEST_FIRST: &str = "ORDER BY julianday(created) DESC, rowid DESC";

fn incoming_from_row(row: &SqliteRow) -> Result<IncomingMessage, sqlx::Error> {
    Ok(IncomingMessage {
        id: row.try_get("id")?,
        sent_from: row.try_get("sent_from")?,
        message: row.try_get("message")?,
        message_id: row.try_get("message_id")?,
        sent_to: row.try_get("sent_to")?,
        device_id: row.try_get("device_id")?,
        sent_timestamp: row.try_get("sent_timestamp")?,
        created: row.try_get("created")?,
        received: row.try_get("received")?,
        received_timestamp: row.try_get("received_timestamp")?,
    })
}

fn outgoing_from_row(row: &SqliteRow) -> Result<OutgoingMessage, sqlx::Error> {
    Ok(OutgoingMessage {
        id: row.try_get("id")?,
        to: row.try_get("recipient")?,
        message: row.try_get("message")?,
        created: row.try_get("created")?,
        sent: row.try_get("sent")?,
        sent_timestamp: row.try_get("sent_timestamp")?,
    })
}

pub async fn insert_incoming(conn: &mut SqliteConnection, m: &IncomingMessage) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO incoming_messages (id, sent_from, message, message_id, sent_to, device_id, \
         sent_timestamp, created, received, received_timestamp) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&m.id)
    .bind(&m.sent_from)
    .bind(&m.message)
    .bind(&m.message_id)
    .bind(&m.sent_to)
    .bind(&m.device_id)
    .bind(&m.sent_timestamp)
    .bind(&m.created)
    .bind(m.received)
    .bind(&m.received_timestamp)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn insert_outgoing(conn: &mut SqliteConnection, m: &OutgoingMessage) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO outgoing_messages (id, recipient, message, created, sent, sent_timestamp) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&m.id)
    .bind(&m.to)
    .bind(&m.message)
    .bind(&m.created)
    .bind(m.sent)
    .bind(&m.sent_timestamp)
    .execute(conn)
    .await?;
    Ok(())
}

/// Messaggi in uscita non ancora consegnati al dispositivo, dal più recente.
pub async fn unsent_outgoing(conn: &mut SqliteConnection) -> Result<Vec<OutgoingMessage>, sqlx::Error> {
    let sql = format!("SELECT {} FROM outgoing_messages WHERE sent = 0 {}", OUTGOING_COLUMNS, NEWEST_FIRST);
    let rows = sqlx::query(&sql).fetch_all(conn).await?;
    rows.iter().map(outgoing_from_row).collect()
}

/// Segna come consegnati tutti i messaggi in uscita non ancora inviati e li restituisce,
/// dal più recente.
///
/// Un solo UPDATE: il lock in scrittura si prende subito, quindi due drain concorrenti
/// si mettono in coda (busy timeout) invece di fallire, e ogni messaggio esce una volta sola.
pub async fn drain_unsent(conn: &mut SqliteConnection) -> Result<Vec<OutgoingMessage>, sqlx::Error> {
    let sql = format!(
        "UPDATE outgoing_messages SET sent = 1, sent_timestamp = ? WHERE sent = 0 \
         RETURNING julianday(created) AS created_order, rowid AS seq, {}",
        OUTGOING_COLUMNS
    );
    let rows = sqlx::query(&sql).bind(now_timestamp()).fetch_all(conn).await?;

    // RETURNING non garantisce un ordine
    let mut drained = rows
        .iter()
        .map(|row| {
            let created_order: f64 = row.try_get("created_order")?;
            let seq: i64 = row.try_get("seq")?;
            Ok((created_order, seq, outgoing_from_row(row)?))
        })
        .collect::<Result<Vec<_>, sqlx::Error>>()?;
    drained.sort_by(|a, b| b.0.total_cmp(&a.0).then(b.1.cmp(&a.1)));
    Ok(drained.into_iter().map(|(_, _, m)| m).collect())
}

/// Messaggi in arrivo non ancora consumati, eventualmente di un solo mittente, dal più recente.
pub async fn unreceived_incoming(
    conn: &mut SqliteConnection,
    sent_from: Option<&str>,
) -> Result<Vec<IncomingMessage>, sqlx::Error> {
    let rows = match sent_from {
        Some(sender) => {
            let sql = format!(
                "SELECT {} FROM incoming_messages WHERE received = 0 AND sent_from = ? {}",
                INCOMING_COLUMNS, NEWEST_FIRST
            );
            sqlx::query(&sql).bind(sender).fetch_all(conn).await?
        }
        None => {
            let sql = format!(
                "SELECT {} FROM incoming_messages WHERE received = 0 {}",
                INCOMING_COLUMNS, NEWEST_FIRST
            );
            sqlx::query(&sql).fetch_all(conn).await?
        }
    };
    rows.iter().map(incoming_from_row).collect()
}

/// Messaggio in arrivo per id, consumato o no.
pub async fn find_incoming(conn: &mut SqliteConnection, id: &str) -> Result<Option<IncomingMessage>, sqlx::Error> {
    let sql = format!("SELECT {} FROM incoming_messages WHERE id = ?", INCOMING_COLUMNS);
    let row = sqlx::query(&sql).bind(id).fetch_optional(conn).await?;
    row.as_ref().map(incoming_from_row).transpose()
}

/// Tutti i record con un dato message_id del dispositivo (non c'è deduplica), dal più recente.
pub async fn incoming_by_message_id(
    conn: &mut SqliteConnection,
    message_id: &str,
) -> Result<Vec<IncomingMessage>, sqlx::Error> {
    let sql = format!(
        "SELECT {} FROM incoming_messages WHERE message_id = ? {}",
        INCOMING_COLUMNS, NEWEST_FIRST
    );
    let rows = sqlx::query(&sql).bind(message_id).fetch_all(conn).await?;
    rows.iter().map(incoming_from_row).collect()
}

/// Messaggio in uscita per id, consegnato o no.
pub async fn find_outgoing(conn: &mut SqliteConnection, id: &str) -> Result<Option<OutgoingMessage>, sqlx::Error> {
    let sql = format!("SELECT {} FROM outgoing_messages WHERE id = ?", OUTGOING_COLUMNS);
    let row = sqlx::query(&sql).bind(id).fetch_optional(conn).await?;
    row.as_ref().map(outgoing_from_row).transpose()
}

/// Segna il messaggio come ricevuto, in memoria e sul DB.
/// Ritorna false se un altro consumatore l'aveva già preso.
pub async fn mark_incoming_received(
    conn: &mut SqliteConnection,
    m: &mut IncomingMessage,
) -> Result<bool, sqlx::Error> {
    if !m.mark_as_received() {
        return Ok(false);
    }
    let done = sqlx::query(
        "UPDATE incoming_messages SET received = 1, received_timestamp = ? WHERE id = ? AND received = 0",
    )
    .bind(&m.received_timestamp)
    .bind(&m.id)
    .execute(conn)
    .await?;
    Ok(done.rows_affected() == 1)
}
