use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Upstream history sources a facade can be bound to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    #[default]
    Tcbs,
    Yfinance,
    Bigquery,
}

impl ProviderId {
    pub const ALL: [Self; 3] = [Self::Tcbs, Self::Yfinance, Self::Bigquery];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tcbs => "tcbs",
            Self::Yfinance => "yfinance",
            Self::Bigquery => "bigquery",
        }
    }
}

impl Display for ProviderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "tcbs" => Ok(Self::Tcbs),
            "yfinance" => Ok(Self::Yfinance),
            "bigquery" => Ok(Self::Bigquery),
            _ => Err(ValidationError::InvalidSource {
                value: value.to_owned(),
            }),
        }
    }
}
