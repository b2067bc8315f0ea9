//! Strongly-typed identifiers for persisted records.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an identifier from an existing UUID value.
            #[must_use]
            pub fn from_uuid(value: Uuid) -> Self {
                Self(value)
            }

            /// Returns the underlying UUID value.
            #[must_use]
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(formatter, "{}", self.0)
            }
        }
    };
}

uuid_id!(
    /// Unique identifier for a user record.
    UserId
);
uuid_id!(
    /// Unique identifier for an event in the catalogue.
    EventId
);
uuid_id!(
    /// Unique identifier for a booking record.
    BookingId
);
uuid_id!(
    /// Unique identifier for a notification record.
    NotificationId
);

#[cfg(test)]
mod tests {
    use super::{NotificationId, UserId};

    #[test]
    fn identifiers_format_as_uuid() {
        assert_eq!(UserId::new().to_string().len(), 36);
        assert_eq!(NotificationId::new().to_string().len(), 36);
    }

    #[test]
    fn identifiers_round_trip_through_uuid() {
        let id = UserId::new();
        assert_eq!(UserId::from_uuid(id.as_uuid()), id);
    }
}
