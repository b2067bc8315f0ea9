//! Encore maintenance worker.
//!
//! Runs the periodic housekeeping that the web application does not do
//! inline: sweeping expired notifications and keeping the analytics caches
//! warm so dashboard reads stay fast.

#![forbid(unsafe_code)]

use std::env;
use std::sync::Arc;
use std::time::Duration;

use encore_application::{
    AnalyticsService, AuditService, AuditStatus, CacheService, NotificationService,
};
use encore_core::{AppError, AppResult};
use encore_domain::AuditAction;
use encore_infrastructure::{
    PostgresAuditLogRepository, PostgresBookingRepository, PostgresEventCatalogRepository,
    PostgresNotificationPreferenceRepository, PostgresNotificationRepository, RedisCacheStore,
};

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
struct WorkerConfig {
    database_url: String,
    redis_url: Option<String>,
    cache_key_prefix: String,
    sweep_interval_seconds: u64,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = WorkerConfig::load()?;
    let pool = connect_pool(config.database_url.as_str()).await?;

    let notification_service = build_notification_service(&pool);
    let audit_service = AuditService::new(Arc::new(PostgresAuditLogRepository::new(pool.clone())));
    let analytics_service = build_analytics_service(&pool, &config)?;

    info!(
        sweep_interval_seconds = config.sweep_interval_seconds,
        analytics_warmup = analytics_service.is_some(),
        "encore-worker started"
    );

    loop {
        run_sweep(&notification_service, &audit_service).await;

        if let Some(analytics) = analytics_service.as_ref() {
            warm_analytics_caches(analytics).await;
        }

        tokio::time::sleep(Duration::from_secs(config.sweep_interval_seconds)).await;
    }
}

async fn run_sweep(notifications: &NotificationService, audit: &AuditService) {
    match notifications.delete_old_notifications().await {
        Ok(deleted) => {
            info!(deleted, "notification retention sweep finished");
            if deleted > 0 {
                let status = audit
                    .record(
                        None,
                        "Notification",
                        None,
                        AuditAction::Delete,
                        format!("{{\"swept\":{deleted}}}"),
                    )
                    .await;
                if let AuditStatus::Degraded(reason) = status {
                    warn!(reason = %reason, "retention sweep finished but the audit write degraded");
                }
            }
        }
        Err(error) => {
            warn!(error = %error, "notification retention sweep failed");
        }
    }
}

async fn warm_analytics_caches(analytics: &AnalyticsService) {
    match analytics.generate_dashboard().await {
        Ok(snapshot) => {
            info!(
                total_events = snapshot.total_events,
                total_bookings = snapshot.total_bookings,
                "analytics caches warmed"
            );
        }
        Err(error) => {
            warn!(error = %error, "analytics cache warmup failed");
        }
    }
}

async fn connect_pool(database_url: &str) -> AppResult<PgPool> {
    PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))
}

fn build_notification_service(pool: &PgPool) -> NotificationService {
    let notifications = Arc::new(PostgresNotificationRepository::new(pool.clone()));
    let preferences = Arc::new(PostgresNotificationPreferenceRepository::new(pool.clone()));
    NotificationService::new(notifications, preferences)
}

fn build_analytics_service(
    pool: &PgPool,
    config: &WorkerConfig,
) -> AppResult<Option<AnalyticsService>> {
    let Some(redis_url) = config.redis_url.as_deref() else {
        return Ok(None);
    };

    let client = redis::Client::open(redis_url)
        .map_err(|error| AppError::Internal(format!("failed to open redis client: {error}")))?;
    let store = Arc::new(RedisCacheStore::new(
        client,
        config.cache_key_prefix.clone(),
    ));
    let events = Arc::new(PostgresEventCatalogRepository::new(pool.clone()));
    let bookings = Arc::new(PostgresBookingRepository::new(pool.clone()));

    Ok(Some(AnalyticsService::new(
        events,
        bookings,
        CacheService::new(store),
    )))
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

impl WorkerConfig {
    fn load() -> AppResult<Self> {
        let database_url = required_env("DATABASE_URL")?;
        let redis_url = env::var("REDIS_URL")
            .ok()
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty());
        let cache_key_prefix =
            env::var("CACHE_KEY_PREFIX").unwrap_or_else(|_| "encore".to_owned());
        let sweep_interval_seconds = parse_env_u64("WORKER_SWEEP_INTERVAL_SECONDS", 3600)?;

        if sweep_interval_seconds == 0 {
            return Err(AppError::Validation(
                "WORKER_SWEEP_INTERVAL_SECONDS must be greater than zero".to_owned(),
            ));
        }

        Ok(Self {
            database_url,
            redis_url,
            cache_key_prefix,
            sweep_interval_seconds,
        })
    }
}

fn required_env(name: &str) -> AppResult<String> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}

fn parse_env_u64(name: &str, default: u64) -> AppResult<u64> {
    match env::var(name) {
        Ok(value) => value.parse::<u64>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        Err(_) => Ok(default),
    }
}
