//! Strongly typed identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Identifiers are assigned from 1 upwards; zero and negatives are never valid.
            pub fn is_valid(self) -> bool {
                self.0 > 0
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(
    /// Identity of a user account.
    UserId
);
id_type!(
    /// Identity of a payment gateway.
    GatewayId
);
id_type!(
    /// Identity of a country used for routing.
    CountryId
);
id_type!(
    /// Identity of a persisted transaction.
    TransactionId
);

impl TransactionId {
    /// Correlation string used as the event key and backend idempotency key.
    pub fn correlation_key(self) -> String {
        format!("txn-{}", self.0)
    }
}
