//! Upstream source adapters. TCBS is always built; the others sit behind the
//! Cargo feature of the same name.

#[cfg(feature = "bigquery")]
mod bigquery;
mod tcbs;
#[cfg(feature = "yfinance")]
mod yahoo;

#[cfg(feature = "bigquery")]
pub use bigquery::{BigQueryAdapter, BigQueryCredential, BIGQUERY_API_URL};
pub use tcbs::{TcbsAdapter, TcbsConfig, TCBS_BARS_URL};
#[cfg(feature = "yfinance")]
pub use yahoo::{YahooAdapter, YahooConfig, YAHOO_CHART_URL};
