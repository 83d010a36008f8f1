use std::fmt::{Display, Formatter};

use time::macros::{format_description, offset};
use time::{Date, OffsetDateTime, UtcOffset};

use crate::ValidationError;

/// Local time of the Ho Chi Minh and Hanoi exchanges.
pub const VIETNAM_OFFSET: UtcOffset = offset!(+7);

const SECONDS_PER_DAY: i64 = 86_400;

/// Parse a `YYYY-MM-DD` calendar date.
pub fn parse_date(input: &str) -> Result<Date, ValidationError> {
    Date::parse(input.trim(), format_description!("[year]-[month]-[day]")).map_err(|_| {
        ValidationError::InvalidDate {
            value: input.to_owned(),
        }
    })
}

/// Current calendar date on the Vietnamese exchanges.
pub fn today() -> Date {
    OffsetDateTime::now_utc().to_offset(VIETNAM_OFFSET).date()
}

/// Inclusive range of calendar dates, guaranteed `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateRange {
    start: Date,
    end: Date,
}

impl DateRange {
    pub fn new(start: Date, end: Date) -> Result<Self, ValidationError> {
        if start > end {
            return Err(ValidationError::InvertedDateRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end })
    }

    /// Parse `start` and optional `end`; a missing `end` means today.
    pub fn parse(start: &str, end: Option<&str>) -> Result<Self, ValidationError> {
        let start = parse_date(start)?;
        let end = match end {
            Some(end) => parse_date(end)?,
            None => today(),
        };
        Self::new(start, end)
    }

    pub const fn start(&self) -> Date {
        self.start
    }

    pub const fn end(&self) -> Date {
        self.end
    }

    pub fn contains(&self, date: Date) -> bool {
        self.start <= date && date <= self.end
    }

    /// Unix seconds of `start` midnight and of the midnight after `end`, both
    /// at `offset`. The upper bound is exclusive.
    pub fn unix_bounds(&self, offset: UtcOffset) -> (i64, i64) {
        let from = self.start.midnight().assume_offset(offset).unix_timestamp();
        let to = match self.end.next_day() {
            Some(next) => next.midnight().assume_offset(offset).unix_timestamp(),
            None => self.end.midnight().assume_offset(offset).unix_timestamp() + SECONDS_PER_DAY,
        };
        (from, to)
    }
}

impl Display for DateRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}
