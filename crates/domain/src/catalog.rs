//! Read-only projections of catalogue rows owned by the web application.
//!
//! Analytics consumes these shapes; nothing in this workspace writes them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{EventId, UserId};

/// Summary of one event in the catalogue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSummary {
    /// Event identifier.
    pub id: EventId,
    /// Display title.
    pub title: String,
    /// Category label, when the organizer assigned one.
    pub category: Option<String>,
    /// Ticket price in the platform currency.
    pub ticket_price: Option<f64>,
    /// Scheduled start of the event.
    pub start_date: DateTime<Utc>,
    /// User that organizes the event.
    pub organizer: UserId,
}
