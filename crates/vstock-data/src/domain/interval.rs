use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::{Date, Duration};

use crate::ValidationError;

/// Sampling granularity of a history request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interval {
    #[default]
    #[serde(rename = "D")]
    Daily,
    #[serde(rename = "W")]
    Weekly,
    #[serde(rename = "M")]
    Monthly,
}

impl Interval {
    pub const ALL: [Self; 3] = [Self::Daily, Self::Weekly, Self::Monthly];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "D",
            Self::Weekly => "W",
            Self::Monthly => "M",
        }
    }

    /// Whether a bar labelled `label` at this granularity includes `date`.
    ///
    /// Weekly and monthly bars are labelled with the first day of their
    /// period, so a bar dated before a range start can still hold trading
    /// days inside the range.
    pub fn covers(self, label: Date, date: Date) -> bool {
        if date < label {
            return false;
        }
        match self {
            Self::Daily => date == label,
            Self::Weekly => date - label < Duration::days(7),
            Self::Monthly => date.year() == label.year() && date.month() == label.month(),
        }
    }
}

impl Display for Interval {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = ValidationError;

    /// Accepts the single-letter tokens plus their spelled-out forms. `B` and
    /// `ME` are kept for callers used to business-day / month-end codes.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "d" | "b" | "day" | "daily" | "1d" => Ok(Self::Daily),
            "w" | "week" | "weekly" | "1w" => Ok(Self::Weekly),
            "m" | "me" | "month" | "monthly" | "1mo" => Ok(Self::Monthly),
            _ => Err(ValidationError::InvalidInterval {
                value: value.to_owned(),
            }),
        }
    }
}
