//! Per-source interval vocabulary.
//!
//! | Source   | D     | W              | M       |
//! |----------|-------|----------------|---------|
//! | tcbs     | `D`   | `W`            | `M`     |
//! | yfinance | `1d`  | `1wk`          | `1mo`   |
//! | bigquery | `DAY` | `WEEK(MONDAY)` | `MONTH` |

use std::fmt::{Display, Formatter};

use crate::{Interval, ProviderId, SourceError};

/// Interval token in one provider's own query vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeInterval {
    pub interval: Interval,
    pub token: &'static str,
}

impl NativeInterval {
    pub const fn as_str(&self) -> &'static str {
        self.token
    }
}

impl Display for NativeInterval {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.token)
    }
}

const INTERVAL_TABLE: [(ProviderId, Interval, &str); 9] = [
    (ProviderId::Tcbs, Interval::Daily, "D"),
    (ProviderId::Tcbs, Interval::Weekly, "W"),
    (ProviderId::Tcbs, Interval::Monthly, "M"),
    (ProviderId::Yfinance, Interval::Daily, "1d"),
    (ProviderId::Yfinance, Interval::Weekly, "1wk"),
    (ProviderId::Yfinance, Interval::Monthly, "1mo"),
    (ProviderId::Bigquery, Interval::Daily, "DAY"),
    (ProviderId::Bigquery, Interval::Weekly, "WEEK(MONDAY)"),
    (ProviderId::Bigquery, Interval::Monthly, "MONTH"),
];

/// Translate a canonical interval into `provider`'s native token.
///
/// # Errors
///
/// Returns an invalid-argument error when the provider has no token for the
/// interval; there is no fallback to another granularity.
pub fn native_interval(
    provider: ProviderId,
    interval: Interval,
) -> Result<NativeInterval, SourceError> {
    lookup(&INTERVAL_TABLE, provider, interval)
}

fn lookup(
    table: &[(ProviderId, Interval, &'static str)],
    provider: ProviderId,
    interval: Interval,
) -> Result<NativeInterval, SourceError> {
    table
        .iter()
        .find(|(p, i, _)| *p == provider && *i == interval)
        .map(|&(_, interval, token)| NativeInterval { interval, token })
        .ok_or_else(|| {
            SourceError::invalid_argument(format!(
                "interval '{interval}' is not supported by source '{provider}'"
            ))
        })
}
