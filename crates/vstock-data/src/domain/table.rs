use std::collections::BTreeMap;

use serde::{Serialize, Serializer};
use time::Date;

use crate::domain::{DateRange, Interval};

/// One trading-date observation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalRow {
    #[serde(rename = "Date", serialize_with = "serialize_date")]
    pub date: Date,
    #[serde(rename = "Open")]
    pub open: f64,
    #[serde(rename = "High")]
    pub high: f64,
    #[serde(rename = "Low")]
    pub low: f64,
    #[serde(rename = "Close")]
    pub close: f64,
    #[serde(rename = "Volume")]
    pub volume: u64,
}

/// Source-independent OHLCV table keyed by ascending trading date.
///
/// Dates are unique. Building a table from rows that repeat a date keeps the
/// row that came last, so later upstream revisions win.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CanonicalTable {
    rows: Vec<CanonicalRow>,
}

impl CanonicalTable {
    pub const COLUMNS: [&'static str; 5] = ["Open", "High", "Low", "Close", "Volume"];
    pub const INDEX: &'static str = "Date";

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_rows(rows: impl IntoIterator<Item = CanonicalRow>) -> Self {
        let by_date = rows
            .into_iter()
            .map(|row| (row.date, row))
            .collect::<BTreeMap<_, _>>();
        Self {
            rows: by_date.into_values().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[CanonicalRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<CanonicalRow> {
        self.rows
    }

    pub fn dates(&self) -> impl Iterator<Item = Date> + '_ {
        self.rows.iter().map(|row| row.date)
    }

    pub fn first_date(&self) -> Option<Date> {
        self.rows.first().map(|row| row.date)
    }

    pub fn last_date(&self) -> Option<Date> {
        self.rows.last().map(|row| row.date)
    }

    pub fn get(&self, date: Date) -> Option<&CanonicalRow> {
        self.rows
            .binary_search_by_key(&date, |row| row.date)
            .ok()
            .map(|index| &self.rows[index])
    }

    /// Values of one canonical column, in date order.
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let pick: fn(&CanonicalRow) -> f64 = match name {
            "Open" => |row| row.open,
            "High" => |row| row.high,
            "Low" => |row| row.low,
            "Close" => |row| row.close,
            "Volume" => |row| row.volume as f64,
            _ => return None,
        };
        Some(self.rows.iter().map(pick).collect())
    }

    /// Drop rows holding no trading days inside `range`.
    ///
    /// A weekly or monthly bar labelled before `range.start()` whose period
    /// reaches into the range is kept and relabelled to the start date.
    /// Daily rows are clipped strictly.
    pub fn clip(mut self, range: &DateRange, interval: Interval) -> Self {
        let start = range.start();
        let leading = self.rows.partition_point(|row| row.date < start);
        if let Some(index) = leading.checked_sub(1) {
            let starts_next = self.rows.get(leading).is_some_and(|row| row.date == start);
            if !starts_next && interval.covers(self.rows[index].date, start) {
                self.rows[index].date = start;
            }
        }
        self.rows.retain(|row| range.contains(row.date));
        self
    }
}

fn serialize_date<S>(date: &Date, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_str(date)
}
