//! Payment gateway reference data.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::ids::{CountryId, GatewayId};

/// Operational status of a gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatewayStatus {
    #[default]
    Active,
    Inactive,
}

/// Which backend variant talks to this gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// In-process backend that accepts every submission.
    #[default]
    Simulated,
    /// Remote backend reached over HTTP at the gateway endpoint.
    Http,
}

/// Payload encodings known to the system. The set is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadFormat {
    #[default]
    Json,
    Xml,
}

impl PayloadFormat {
    /// Canonical content type for the format.
    pub fn content_type(&self) -> &'static str {
        match self {
            PayloadFormat::Json => "application/json",
            PayloadFormat::Xml => "application/xml",
        }
    }
}

impl fmt::Display for PayloadFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.content_type())
    }
}

/// Raised when a content type is outside the closed format table.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported data format '{0}' - allowed formats: JSON, XML")]
pub struct UnsupportedFormat(pub String);

impl FromStr for PayloadFormat {
    type Err = UnsupportedFormat;

    /// Parse a content type. Parameters such as `; charset=utf-8` are ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let media_type = s.split(';').next().unwrap_or_default().trim();
        match media_type.to_ascii_lowercase().as_str() {
            "application/json" => Ok(PayloadFormat::Json),
            "text/xml" | "application/xml" => Ok(PayloadFormat::Xml),
            _ => Err(UnsupportedFormat(s.to_string())),
        }
    }
}

/// An interchangeable payment backend, ranked by priority (lower is preferred).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gateway {
    pub id: GatewayId,
    pub name: String,
    pub data_format: PayloadFormat,
    pub priority: u32,
    pub status: GatewayStatus,
    pub countries: Vec<CountryId>,
    pub kind: BackendKind,
    /// Base URL for `BackendKind::Http` gateways.
    pub endpoint: Option<String>,
}

impl Gateway {
    pub fn is_active(&self) -> bool {
        self.status == GatewayStatus::Active
    }

    pub fn serves(&self, country: CountryId) -> bool {
        self.countries.contains(&country)
    }
}
