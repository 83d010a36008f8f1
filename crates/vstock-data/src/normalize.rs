//! Conversion of raw adapter rows into the canonical OHLCV table.
//!
//! Each source names and encodes its columns differently. A static
//! [`ColumnSchema`] per source says where the date and the five OHLCV values
//! live and how the date is encoded; [`normalize`] applies it row by row.
//!
//! Rows missing a required field, or carrying a value that is not a finite,
//! non-negative number, are dropped. They are never zero-filled.

use serde_json::Value;
use time::{Date, OffsetDateTime};
use tracing::debug;

use crate::data_source::RawRecord;
use crate::domain::parse_date;
use crate::{CanonicalRow, CanonicalTable, ProviderId};

/// How a source encodes the trading date of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateEncoding {
    /// `YYYY-MM-DD`.
    IsoDate,
    /// `YYYY-MM-DDThh:mm:ss...`; only the date part is kept.
    IsoDateTime,
    /// Unix seconds, shifted by the exchange offset found in `offset_field`.
    UnixSeconds { offset_field: &'static str },
}

/// Where one source keeps the canonical fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSchema {
    pub date: &'static str,
    pub date_encoding: DateEncoding,
    pub open: &'static str,
    pub high: &'static str,
    pub low: &'static str,
    pub close: &'static str,
    pub volume: &'static str,
    /// Split/dividend adjusted close; when present the prices are rescaled.
    pub adjusted_close: Option<&'static str>,
}

const TCBS_SCHEMA: ColumnSchema = ColumnSchema {
    date: "tradingDate",
    date_encoding: DateEncoding::IsoDateTime,
    open: "open",
    high: "high",
    low: "low",
    close: "close",
    volume: "volume",
    adjusted_close: None,
};

const YAHOO_SCHEMA: ColumnSchema = ColumnSchema {
    date: "timestamp",
    date_encoding: DateEncoding::UnixSeconds {
        offset_field: "gmtoffset",
    },
    open: "open",
    high: "high",
    low: "low",
    close: "close",
    volume: "volume",
    adjusted_close: Some("adjclose"),
};

const BIGQUERY_SCHEMA: ColumnSchema = ColumnSchema {
    date: "Date",
    date_encoding: DateEncoding::IsoDate,
    open: "Open",
    high: "High",
    low: "Low",
    close: "Close",
    volume: "Volume",
    adjusted_close: None,
};

pub const fn schema_for(provider: ProviderId) -> &'static ColumnSchema {
    match provider {
        ProviderId::Tcbs => &TCBS_SCHEMA,
        ProviderId::Yfinance => &YAHOO_SCHEMA,
        ProviderId::Bigquery => &BIGQUERY_SCHEMA,
    }
}

/// Build the canonical table from `provider`'s raw rows.
///
/// Output is sorted by ascending date; when a date repeats, the later row
/// wins.
pub fn normalize(provider: ProviderId, records: &[RawRecord]) -> CanonicalTable {
    let schema = schema_for(provider);
    let rows = records
        .iter()
        .filter_map(|record| normalize_record(schema, record))
        .collect::<Vec<_>>();

    let dropped = records.len() - rows.len();
    if dropped > 0 {
        debug!(
            source = %provider,
            dropped,
            total = records.len(),
            "dropped upstream rows with missing or invalid fields"
        );
    }

    CanonicalTable::from_rows(rows)
}

fn normalize_record(schema: &ColumnSchema, record: &RawRecord) -> Option<CanonicalRow> {
    let date = record_date(schema, record)?;
    let mut open = price(record, schema.open)?;
    let mut high = price(record, schema.high)?;
    let mut low = price(record, schema.low)?;
    let mut close = price(record, schema.close)?;
    let volume = volume(record, schema.volume)?;

    if let Some(adjusted) = schema.adjusted_close.and_then(|field| price(record, field)) {
        if close > 0.0 {
            let ratio = adjusted / close;
            open *= ratio;
            high *= ratio;
            low *= ratio;
            close = adjusted;
        }
    }

    Some(CanonicalRow {
        date,
        open,
        high,
        low,
        close,
        volume,
    })
}

fn record_date(schema: &ColumnSchema, record: &RawRecord) -> Option<Date> {
    let value = record.get(schema.date)?;
    match schema.date_encoding {
        DateEncoding::IsoDate => parse_date(value.as_str()?).ok(),
        DateEncoding::IsoDateTime => {
            let text = value.as_str()?;
            let date_part = text.split('T').next()?;
            parse_date(date_part).ok()
        }
        DateEncoding::UnixSeconds { offset_field } => {
            let seconds = value.as_i64()?;
            let offset = record.get(offset_field).and_then(Value::as_i64).unwrap_or(0);
            OffsetDateTime::from_unix_timestamp(seconds.checked_add(offset)?)
                .ok()
                .map(OffsetDateTime::date)
        }
    }
}

fn number(record: &RawRecord, field: &str) -> Option<f64> {
    let value = match record.get(field)? {
        Value::Number(number) => number.as_f64()?,
        Value::String(text) => text.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    value.is_finite().then_some(value)
}

fn price(record: &RawRecord, field: &str) -> Option<f64> {
    number(record, field).filter(|value| *value >= 0.0)
}

fn volume(record: &RawRecord, field: &str) -> Option<u64> {
    price(record, field).map(|value| value.round() as u64)
}
