//! Graph search regions.

use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Data-residency region sent with Graph search requests.
///
/// Application-permission searches must name the region that holds the
/// tenant's content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Region {
    #[default]
    Nam,
    Eur,
    Apc,
    Aus,
    Ind,
    Can,
}

impl Region {
    pub const ALL: [Region; 6] = [Region::Nam, Region::Eur, Region::Apc, Region::Aus, Region::Ind, Region::Can];

    pub fn as_str(&self) -> &'static str {
        match self {
            Region::Nam => "NAM",
            Region::Eur => "EUR",
            Region::Apc => "APC",
            Region::Aus => "AUS",
            Region::Ind => "IND",
            Region::Can => "CAN",
        }
    }

    /// Parse a region name, falling back to `NAM` for unknown values.
    pub fn parse_or_default(value: &str) -> Self {
        value.parse().unwrap_or_default()
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for region names outside the supported set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown region: {0}")]
pub struct UnknownRegion(pub String);

impl FromStr for Region {
    type Err = UnknownRegion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        Region::ALL
            .into_iter()
            .find(|r| r.as_str() == upper)
            .ok_or_else(|| UnknownRegion(s.to_string()))
    }
}
