//! Users and countries (read-only reference data).

use serde::{Deserialize, Serialize};

use crate::domain::ids::{CountryId, UserId};

/// Account holder. The country drives gateway routing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub country_id: CountryId,
}

/// Routing country.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Country {
    pub id: CountryId,
    pub name: String,
    /// ISO 3166-1 alpha-2 code.
    pub code: String,
}
