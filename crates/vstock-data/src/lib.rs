//! # vstock-data
//!
//! Historical price/volume series for Vietnamese-listed equities from several
//! upstream sources, returned in one canonical OHLCV shape.
//!
//! ## Overview
//!
//! - **Facade** ([`StockVN`]) binding one symbol to one source
//! - **Source adapters** hiding each provider's endpoint, auth and schema
//! - **Interval normalizer** translating `D`/`W`/`M` into each provider's vocabulary
//! - **Dependency guard** for sources compiled in through optional features
//! - **Response normalizer** producing a date-ordered, de-duplicated table
//!
//! ## Feature Flags
//!
//! | Flag | Description |
//! |------|-------------|
//! | `default` | TCBS adapter only |
//! | `yfinance` | Yahoo Finance chart adapter (`<SYMBOL>.VN`) |
//! | `bigquery` | BigQuery warehouse adapter |
//! | `all` | `yfinance` + `bigquery` |
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | TCBS, Yahoo Finance and BigQuery adapters |
//! | [`data_source`] | Adapter trait, raw records, error types |
//! | [`dependency`] | Feature availability guard |
//! | [`domain`] | Symbol, interval, date range, canonical table |
//! | [`error`] | Validation and configuration errors |
//! | [`http_client`] | HTTP transport abstraction |
//! | [`interval_map`] | Per-source interval tokens |
//! | [`normalize`] | Raw rows to canonical table |
//! | [`source`] | Source identifiers |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use vstock_data::StockVN;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let stock = StockVN::new("FPT", "tcbs")?;
//!     let table = stock
//!         .fetch_data("2024-01-01", Some("2024-01-10"), Some("D"))
//!         .await?;
//!
//!     for row in table.rows() {
//!         println!("{} {:.2} {}", row.date, row.close, row.volume);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │ StockVN facade  │── validate dates / interval
//! └────────┬────────┘
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ Dependency guard│────▶│ Interval map     │
//! └─────────────────┘     └────────┬─────────┘
//!                                  ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ HistorySource   │────▶│ HttpClient       │
//! │ (TCBS/Yahoo/BQ) │     │ (reqwest)        │
//! └────────┬────────┘     └──────────────────┘
//!          ▼
//! ┌─────────────────┐
//! │ normalize + clip│──▶ CanonicalTable
//! └─────────────────┘
//! ```
//!
//! ## Error Handling
//!
//! Every failure surfaces as a [`SourceError`]; nothing is retried and
//! nothing is turned into an empty table.
//!
//! ```rust
//! use vstock_data::{SourceError, SourceErrorKind};
//!
//! fn describe(error: &SourceError) -> &'static str {
//!     match error.kind() {
//!         SourceErrorKind::InvalidArgument => "fix the call",
//!         SourceErrorKind::MissingDependency => "enable the source feature",
//!         SourceErrorKind::Connection => "network or upstream down",
//!         SourceErrorKind::Provider | SourceErrorKind::Query => "upstream refused",
//!         SourceErrorKind::MalformedResponse => "upstream changed its payload",
//!         SourceErrorKind::Runtime => "await fetch_data instead of blocking",
//!     }
//! }
//! ```

pub mod adapters;
pub mod data_source;
pub mod dependency;
pub mod domain;
pub mod error;
pub mod http_client;
pub mod interval_map;
pub mod normalize;
pub mod source;
mod stock_vn;

// Facade
pub use stock_vn::{StockVN, StockVNBuilder};

// Adapter implementations
#[cfg(feature = "bigquery")]
pub use adapters::{BigQueryAdapter, BigQueryCredential};
pub use adapters::{TcbsAdapter, TcbsConfig};
#[cfg(feature = "yfinance")]
pub use adapters::{YahooAdapter, YahooConfig};

// Data source trait and types
pub use data_source::{
    HistoryRequest, HistorySource, RawBatch, RawRecord, SourceError, SourceErrorKind,
};

// Domain models
pub use domain::{CanonicalRow, CanonicalTable, DateRange, Interval, Symbol};

// Error types
pub use error::{CoreError, ValidationError};

// HTTP client types
pub use http_client::{
    HttpAuth, HttpClient, HttpError, HttpMethod, HttpRequest, HttpResponse, ReqwestHttpClient,
};

pub use interval_map::NativeInterval;
pub use source::ProviderId;
