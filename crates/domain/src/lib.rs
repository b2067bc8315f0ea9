//! Domain types for the Encore ticketing backend.

#![forbid(unsafe_code)]

mod audit;
mod catalog;
mod ids;
mod notification;

pub use audit::{AuditAction, AuditLogEntry};
pub use catalog::EventSummary;
pub use ids::{BookingId, EventId, NotificationId, UserId};
pub use notification::{
    Notification, NotificationKind, NotificationPreferences, NotificationRequest,
};
