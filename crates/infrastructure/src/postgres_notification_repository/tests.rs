use chrono::{Duration, Utc};
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;

use encore_application::NotificationRepository;
use encore_domain::{Notification, NotificationId, NotificationKind, UserId};

use super::PostgresNotificationRepository;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

async fn test_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        return None;
    };

    let pool = match PgPoolOptions::new()
        .max_connections(2)
        .connect(database_url.as_str())
        .await
    {
        Ok(pool) => pool,
        Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
    };

    if let Err(error) = MIGRATOR.run(&pool).await {
        panic!("failed to run migrations for postgres notification tests: {error}");
    }

    Some(pool)
}

fn notification(recipient: UserId, kind: NotificationKind, age: Duration) -> Notification {
    let created_at = Utc::now() - age;
    Notification {
        id: NotificationId::new(),
        recipient,
        title: "Test notification".to_owned(),
        message: "Something happened".to_owned(),
        kind,
        read: false,
        created_at,
        updated_at: created_at,
    }
}

#[tokio::test]
async fn unread_listing_excludes_rows_marked_read() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresNotificationRepository::new(pool);
    let recipient = UserId::new();

    let first = notification(recipient, NotificationKind::General, Duration::hours(2));
    let second = notification(
        recipient,
        NotificationKind::EventReminder,
        Duration::hours(1),
    );
    assert!(repository.insert(first.clone()).await.is_ok());
    assert!(repository.insert(second.clone()).await.is_ok());

    let marked = repository.mark_read(&[first.id], Utc::now()).await;
    assert!(marked.is_ok());

    let unread = repository.list_unread_for_user(recipient).await;
    assert!(unread.is_ok());
    let unread = unread.unwrap_or_default();
    assert_eq!(unread.len(), 1);
    assert_eq!(unread[0].id, second.id);

    let all = repository.list_for_user(recipient).await;
    assert!(all.is_ok());
    let all = all.unwrap_or_default();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].id, second.id, "newest row first");

    let reloaded = repository.find_by_id(first.id).await;
    assert!(reloaded.is_ok());
    let Ok(Some(reloaded)) = reloaded else {
        panic!("marked notification should still exist");
    };
    assert!(reloaded.read);
    assert_eq!(reloaded.kind, NotificationKind::General);
}

#[tokio::test]
async fn retention_sweep_only_removes_rows_before_cutoff() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresNotificationRepository::new(pool);
    let recipient = UserId::new();

    let cutoff = Utc::now() - Duration::days(30);

    let stale = notification(recipient, NotificationKind::General, Duration::days(45));
    let fresh = notification(recipient, NotificationKind::General, Duration::days(1));
    // A row stamped exactly at the cutoff must survive the strict sweep.
    let mut boundary = notification(recipient, NotificationKind::General, Duration::zero());
    boundary.created_at = cutoff;
    boundary.updated_at = cutoff;

    assert!(repository.insert(stale.clone()).await.is_ok());
    assert!(repository.insert(fresh.clone()).await.is_ok());
    assert!(repository.insert(boundary.clone()).await.is_ok());

    let deleted = repository.delete_created_before(cutoff).await;
    assert!(deleted.is_ok());
    assert!(deleted.unwrap_or(0) >= 1);

    let gone = repository.find_by_id(stale.id).await;
    assert!(matches!(gone, Ok(None)));

    let kept = repository.find_by_id(fresh.id).await;
    assert!(matches!(kept, Ok(Some(_))));

    let at_cutoff = repository.find_by_id(boundary.id).await;
    assert!(matches!(at_cutoff, Ok(Some(_))));
}

#[tokio::test]
async fn delete_removes_single_row() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresNotificationRepository::new(pool);
    let recipient = UserId::new();

    let row = notification(
        recipient,
        NotificationKind::BookingConfirmation,
        Duration::zero(),
    );
    assert!(repository.insert(row.clone()).await.is_ok());
    assert!(repository.delete(row.id).await.is_ok());

    let found = repository.find_by_id(row.id).await;
    assert!(matches!(found, Ok(None)));
}
