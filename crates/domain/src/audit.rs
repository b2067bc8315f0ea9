//! Append-only audit log types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ids::UserId;

/// Action tag attached to an audit entry.
///
/// The vocabulary is open-ended: well-known actions get a variant so reports
/// can bucket them, everything else is carried verbatim in [`AuditAction::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum AuditAction {
    /// A record was created.
    Create,
    /// A record was updated.
    Update,
    /// A record was deleted.
    Delete,
    /// A user signed in.
    Login,
    /// A user signed out.
    Logout,
    /// A booking or event was cancelled.
    Cancel,
    /// A file was uploaded.
    Upload,
    /// Any action outside the well-known vocabulary.
    Other(String),
}

impl AuditAction {
    /// Returns the stable uppercase tag for this action.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::Login => "LOGIN",
            Self::Logout => "LOGOUT",
            Self::Cancel => "CANCEL",
            Self::Upload => "UPLOAD",
            Self::Other(tag) => tag.as_str(),
        }
    }
}

impl From<String> for AuditAction {
    fn from(value: String) -> Self {
        match value.as_str() {
            "CREATE" => Self::Create,
            "UPDATE" => Self::Update,
            "DELETE" => Self::Delete,
            "LOGIN" => Self::Login,
            "LOGOUT" => Self::Logout,
            "CANCEL" => Self::Cancel,
            "UPLOAD" => Self::Upload,
            _ => Self::Other(value),
        }
    }
}

impl From<AuditAction> for String {
    fn from(value: AuditAction) -> Self {
        value.as_str().to_owned()
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.as_str())
    }
}

/// One immutable audit fact. Never edited after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    /// Entry identifier.
    pub id: Uuid,
    /// Actor that performed the action, when known.
    pub actor: Option<UserId>,
    /// Free-form entity type tag (`User`, `Event`, `Booking`, `File`, ...).
    pub entity_type: String,
    /// Identifier of the affected entity, when the action targets one.
    pub entity_id: Option<Uuid>,
    /// Action tag.
    pub action: AuditAction,
    /// JSON-serialized detail payload.
    pub detail: String,
    /// Server-assigned creation timestamp.
    pub created_at: DateTime<Utc>,
}
