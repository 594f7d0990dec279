//! Integration tests for `PgChangeSource` against a live PostgreSQL.

use std::time::Duration;

use sqlx::PgPool;
use stockrelay_change_listener::{PgChangeSource, StockListener};
use stockrelay_core::feed::StockChangeFeed;
use stockrelay_core::source::ChangeSource;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

const WAIT: Duration = Duration::from_secs(5);

const PAYLOAD: &str = r#"{"id":"abc","product_id":1,"branch_id":1,"quantity":10,"reserved":0,"created_at":"2025-07-29T05:17:55.443242","updated_at":"2025-07-29T05:17:55.443242"}"#;

async fn notify(pool: &PgPool, channel: &str, payload: &str) {
    sqlx::query("SELECT pg_notify($1, $2)")
        .bind(channel)
        .bind(payload)
        .execute(pool)
        .await
        .unwrap();
}

// --- ChangeSource ---

#[sqlx::test(migrations = false)]
async fn test_subscribe_ping_and_receive_notification(pool: PgPool) {
    let mut source = PgChangeSource::from_pool(pool.clone());

    source.subscribe("stock_changes").await.unwrap();
    source.ping().await.unwrap();
    notify(&pool, "stock_changes", PAYLOAD).await;

    let payload = timeout(WAIT, source.recv()).await.unwrap().unwrap();
    assert_eq!(payload.channel(), "stock_changes");
    assert_eq!(payload.body(), PAYLOAD);

    source.close().await.unwrap();
}

#[sqlx::test(migrations = false)]
async fn test_notifications_on_other_channels_are_not_received(pool: PgPool) {
    let mut source = PgChangeSource::from_pool(pool.clone());
    source.subscribe("stock_changes").await.unwrap();

    notify(&pool, "price_changes", PAYLOAD).await;

    assert!(
        timeout(Duration::from_millis(200), source.recv())
            .await
            .is_err()
    );
}

#[sqlx::test(migrations = false)]
async fn test_close_releases_the_pool_when_the_connection_is_gone(pool: PgPool) {
    let mut source = PgChangeSource::from_pool(pool.clone());
    source.subscribe("stock_changes").await.unwrap();

    sqlx::query(
        "SELECT pg_terminate_backend(pid) FROM pg_stat_activity \
         WHERE datname = current_database() AND pid <> pg_backend_pid()",
    )
    .execute(&pool)
    .await
    .unwrap();

    // Unlisten may fail on the dead connection; the pool is closed regardless.
    let _ = source.close().await;
    assert!(pool.is_closed());
}

// --- StockListener over PostgreSQL ---

#[sqlx::test(migrations = false)]
async fn test_listener_decodes_database_notification(pool: PgPool) {
    let listener = StockListener::new(PgChangeSource::from_pool(pool.clone()));
    let cancel = CancellationToken::new();

    let mut receiver = listener.listen_for_changes(cancel.clone()).await.unwrap();
    notify(&pool, "stock_changes", "not json").await;
    notify(&pool, "stock_changes", PAYLOAD).await;

    let event = timeout(WAIT, receiver.recv()).await.unwrap().unwrap();
    assert_eq!(event.id, "abc");
    assert_eq!(event.quantity, 10);

    cancel.cancel();
    assert!(timeout(WAIT, receiver.recv()).await.unwrap().is_none());
    listener.close().await.unwrap();
}
