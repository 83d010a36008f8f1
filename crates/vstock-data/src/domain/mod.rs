//! # Domain Models
//!
//! Canonical domain types shared by every source adapter.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Symbol`] | Validated Vietnamese ticker |
//! | [`Interval`] | Requested granularity (D, W, M) |
//! | [`DateRange`] | Inclusive `start..=end` calendar range |
//! | [`CanonicalRow`] | One OHLCV observation for a trading date |
//! | [`CanonicalTable`] | Date-ordered, de-duplicated OHLCV rows |
//!
//! All types validate their invariants at construction time:
//!
//! ```rust
//! use vstock_data::{DateRange, ValidationError};
//!
//! let range = DateRange::parse("2024-01-01", Some("2024-01-10"));
//! assert!(range.is_ok());
//!
//! let inverted = DateRange::parse("2024-01-10", Some("2024-01-01"));
//! assert!(matches!(inverted, Err(ValidationError::InvertedDateRange { .. })));
//! ```

mod date_range;
mod interval;
mod symbol;
mod table;

pub use date_range::{parse_date, today, DateRange, VIETNAM_OFFSET};
pub use interval::Interval;
pub use symbol::{Symbol, VN_SUFFIX};
pub use table::{CanonicalRow, CanonicalTable};
