use anyhow::Result;
use futures_util::StreamExt;
use smssync_core::{IncomingMessage, IncomingParams, ValidationError};
use smssync_server::{api, connect_pool, run_migrations, sqlite_url_for_path, store, SyncError};
use sqlx::SqlitePool;
use tempfile::TempDir;

async fn setup() -> Result<(TempDir, SqlitePool)> {
    let td = TempDir::new()?;
    let url = sqlite_url_for_path(&td.path().join("smssync.db"))?;
    let pool = connect_pool(&url).await?;
    run_migrations(&pool).await?;
    Ok((td, pool))
}

// Salva un messaggio in arrivo come farebbe la POST del dispositivo
async fn incoming(pool: &SqlitePool, from: &str, message_id: &str) -> Result<IncomingMessage> {
    let params = IncomingParams {
        sent_from: Some(from.to_string()),
        message: Some("sample text".to_string()),
        message_id: Some(message_id.to_string()),
        sent_timestamp: Some("1298244863".to_string()),
        ..Default::default()
    };
    let m = IncomingMessage::create(&params)?;
    let mut conn = pool.acquire().await?;
    store::insert_incoming(&mut *conn, &m).await?;
    Ok(m)
}

async fn unreceived(pool: &SqlitePool) -> Result<i64> {
    Ok(sqlx::query_scalar("SELECT COUNT(*) FROM incoming_messages WHERE received = 0")
        .fetch_one(pool)
        .await?)
}

#[tokio::test]
async fn send_queues_an_unsent_message() -> Result<()> {
    let (_td, pool) = setup().await?;

    let m = api::send(&pool, "hello", "+1555").await?;
    assert!(!m.sent);

    let stored = api::find_outgoing(&pool, &m.id).await?.expect("stored");
    assert_eq!(stored, m);
    assert_eq!(api::pending_outgoing(&pool).await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn send_rejects_invalid_messages() -> Result<()> {
    let (_td, pool) = setup().await?;

    let err = api::send(&pool, "hello", "").await.unwrap_err();
    assert!(matches!(err, SyncError::Validation(ValidationError::Empty("to"))));

    let err = api::send(&pool, &"x".repeat(161), "+1555").await.unwrap_err();
    assert!(matches!(err, SyncError::Validation(ValidationError::TooLong { .. })));

    assert!(api::pending_outgoing(&pool).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn send_propagates_database_errors() -> Result<()> {
    let (_td, pool) = setup().await?;
    sqlx::query("DROP TABLE outgoing_messages").execute(&pool).await?;

    let err = api::send(&pool, "hello", "+1555").await.unwrap_err();
    assert!(matches!(err, SyncError::Database(_)));
    Ok(())
}

#[tokio::test]
async fn receive_yields_and_marks_every_unreceived_message() -> Result<()> {
    let (_td, pool) = setup().await?;
    let a = incoming(&pool, "+1", "a").await?;
    let b = incoming(&pool, "+2", "b").await?;

    let got: Vec<IncomingMessage> = api::receive(&pool, None)
        .map(|r| r.expect("db ok"))
        .collect()
        .await;

    // dal più recente
    assert_eq!(got.iter().map(|m| m.id.clone()).collect::<Vec<_>>(), vec![b.id, a.id.clone()]);
    assert!(got.iter().all(|m| m.received && m.received_timestamp.is_some()));
    assert_eq!(unreceived(&pool).await?, 0);

    let stored = api::find_incoming(&pool, &a.id).await?.expect("stored");
    assert!(stored.received);
    assert_eq!(stored.received_timestamp, got[1].received_timestamp);

    // già consumati: una nuova chiamata è vuota
    assert!(api::receive(&pool, None).next().await.is_none());
    Ok(())
}

#[tokio::test]
async fn receive_marks_only_what_was_consumed() -> Result<()> {
    let (_td, pool) = setup().await?;
    for id in ["m1", "m2", "m3"] {
        incoming(&pool, "+1555", id).await?;
    }

    {
        let mut stream = api::receive(&pool, None);
        let first = stream.next().await.expect("one message")?;
        assert_eq!(first.message_id, "m3");
        assert_eq!(unreceived(&pool).await?, 2);
        // il chiamante smette di iterare qui
    }
    assert_eq!(unreceived(&pool).await?, 2);

    let rest: Vec<String> = api::receive(&pool, None)
        .map(|r| r.expect("db ok").message_id)
        .collect()
        .await;
    assert_eq!(rest, vec!["m2", "m1"]);
    assert_eq!(unreceived(&pool).await?, 0);
    Ok(())
}

#[tokio::test]
async fn receive_serves_newest_first() -> Result<()> {
    let (_td, pool) = setup().await?;
    for id in ["old", "mid", "new"] {
        incoming(&pool, "+1555", id).await?;
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    let order: Vec<String> = api::receive(&pool, None)
        .map(|r| r.expect("db ok").message_id)
        .collect()
        .await;
    assert_eq!(order, vec!["new", "mid", "old"]);
    Ok(())
}

#[tokio::test]
async fn receive_is_lazy() -> Result<()> {
    let (_td, pool) = setup().await?;

    // nessuna query prima del primo poll
    let mut stream = api::receive(&pool, None);
    incoming(&pool, "+1555", "late").await?;
    assert_eq!(unreceived(&pool).await?, 1);

    let m = stream.next().await.expect("one message")?;
    assert_eq!(m.message_id, "late");
    assert_eq!(unreceived(&pool).await?, 0);
    Ok(())
}

#[tokio::test]
async fn receive_filters_by_sender() -> Result<()> {
    let (_td, pool) = setup().await?;
    incoming(&pool, "+000-000-000", "a").await?;
    let wanted = incoming(&pool, "+000-000-001", "b").await?;

    let got: Vec<IncomingMessage> = api::receive(&pool, Some("+000-000-001"))
        .map(|r| r.expect("db ok"))
        .collect()
        .await;

    assert_eq!(got.len(), 1);
    assert_eq!(got[0].id, wanted.id);
    assert_eq!(unreceived(&pool).await?, 1);
    Ok(())
}

#[tokio::test]
async fn receive_skips_messages_taken_by_another_consumer() -> Result<()> {
    let (_td, pool) = setup().await?;
    incoming(&pool, "+1555", "m1").await?;
    incoming(&pool, "+1555", "m2").await?;

    let mut first = api::receive(&pool, None);
    let m2 = first.next().await.expect("m2")?;
    assert_eq!(m2.message_id, "m2");

    // un secondo consumatore prende m1 prima del primo
    let mut second = api::receive(&pool, None);
    let m1 = second.next().await.expect("m1")?;
    assert_eq!(m1.message_id, "m1");

    assert!(first.next().await.is_none());
    Ok(())
}

#[tokio::test]
async fn receive_yields_database_error_once() -> Result<()> {
    let (_td, pool) = setup().await?;
    sqlx::query("DROP TABLE incoming_messages").execute(&pool).await?;

    let mut stream = api::receive(&pool, None);
    assert!(stream.next().await.expect("an item").is_err());
    assert!(stream.next().await.is_none());
    Ok(())
}
