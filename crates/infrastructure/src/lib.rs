//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod console_mail_transport;
mod in_memory_cache_store;
mod postgres_audit_log_repository;
mod postgres_booking_repository;
mod postgres_event_catalog_repository;
mod postgres_notification_preference_repository;
mod postgres_notification_repository;
mod redis_cache_store;
mod smtp_mail_transport;

pub use console_mail_transport::ConsoleMailTransport;
pub use in_memory_cache_store::InMemoryCacheStore;
pub use postgres_audit_log_repository::PostgresAuditLogRepository;
pub use postgres_booking_repository::PostgresBookingRepository;
pub use postgres_event_catalog_repository::PostgresEventCatalogRepository;
pub use postgres_notification_preference_repository::PostgresNotificationPreferenceRepository;
pub use postgres_notification_repository::PostgresNotificationRepository;
pub use redis_cache_store::RedisCacheStore;
pub use smtp_mail_transport::{SmtpMailConfig, SmtpMailTransport};
