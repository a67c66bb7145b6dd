//! Strongly-typed identifier value objects.
//!
//! All identifiers here are opaque strings issued by an external system
//! (Firebase uids, Stripe object ids, catalog keys). They are validated
//! as non-empty on construction and never parsed further.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ValidationError;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $field:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates the identifier, returning error if empty or blank.
            pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
                let id = id.into();
                if id.trim().is_empty() {
                    return Err(ValidationError::empty_field($field));
                }
                Ok(Self(id))
            }

            /// Returns the inner string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// Firebase user id (`uid`). Owned by the auth provider.
    UserId,
    "uid"
);

string_id!(
    /// Purchase id. This is the Stripe checkout session id and doubles as
    /// the idempotency key for purchase recording.
    PurchaseId,
    "purchase_id"
);

string_id!(
    /// Content bundle reference.
    ProductBoxId,
    "product_box_id"
);

string_id!(
    /// Creator that sells a bundle or owns a connected account.
    CreatorId,
    "creator_id"
);

string_id!(
    /// Stripe webhook event id (`evt_...`).
    EventId,
    "event_id"
);
