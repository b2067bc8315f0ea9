//! Application services and ports for the Encore ticketing backend.
//!
//! Each service orchestrates one auxiliary concern (caching, audit,
//! notifications, email, analytics) behind async ports. Infrastructure
//! adapters implement the ports; the surrounding web layer wires the
//! services together.

#![forbid(unsafe_code)]

mod analytics_service;
mod audit_service;
mod cache_service;
mod email_service;
mod notification_service;

pub use analytics_service::{
    AnalyticsService, BookingRepository, DashboardSnapshot, EngagementMetrics, EventCatalogRepository,
    EventsTrend, RevenueMetrics, TopEvent,
};
pub use audit_service::{AuditLogRepository, AuditService, AuditStatus, ComplianceReport};
pub use cache_service::{CacheLookup, CacheService, CacheSource, CacheStore, CacheWrite};
pub use email_service::{
    DeliveryStatus, EmailConfig, EmailService, MailBody, MailTransport, OutgoingEmail,
};
pub use notification_service::{
    NotificationPreferenceRepository, NotificationRepository, NotificationService,
    NotificationStats,
};
