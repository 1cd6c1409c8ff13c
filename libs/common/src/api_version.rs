//! Protocol versions spoken by mete servers

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::MeteError;

/// A concrete wire format and endpoint set
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiVersion {
    Legacy,
    V1,
    V2,
    V3,
}

impl ApiVersion {
    /// All versions, oldest first
    pub const ALL: [ApiVersion; 4] = [
        ApiVersion::Legacy,
        ApiVersion::V1,
        ApiVersion::V2,
        ApiVersion::V3,
    ];

    /// Get the version name as it is stored in the settings file
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiVersion::Legacy => "legacy",
            ApiVersion::V1 => "v1",
            ApiVersion::V2 => "v2",
            ApiVersion::V3 => "v3",
        }
    }

    /// Whether money travels as integer minor units instead of decimals
    pub fn uses_minor_units(&self) -> bool {
        matches!(self, ApiVersion::V2 | ApiVersion::V3)
    }

    pub fn supports_barcodes(&self) -> bool {
        matches!(self, ApiVersion::Legacy | ApiVersion::V1)
    }

    pub fn supports_bottle_size(&self) -> bool {
        matches!(self, ApiVersion::Legacy | ApiVersion::V1)
    }

    /// Guess the version from the shape of a base URL
    ///
    /// This is a heuristic, not a negotiation: a URL containing the v1 API path
    /// segment is assumed to speak v1, everything else is assumed to be legacy.
    pub fn detect(base_url: &str) -> Self {
        if base_url.contains("api/v1") {
            ApiVersion::V1
        } else {
            ApiVersion::Legacy
        }
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApiVersion {
    type Err = MeteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ApiVersion::ALL
            .into_iter()
            .find(|version| version.as_str() == s.trim())
            .ok_or_else(|| MeteError::config(format!("Unknown API version '{}'", s)))
    }
}
