//! Source adapter contract and the error/record types that cross it.
//!
//! Every upstream provider implements [`HistorySource`]: given a symbol, a
//! date range and that provider's native interval token, it returns the raw
//! rows exactly as the provider named them. Turning those rows into the
//! canonical table is the job of [`crate::normalize`].
//!
//! ```rust,ignore
//! use vstock_data::{HistoryRequest, HistorySource, TcbsAdapter};
//!
//! async fn raw_rows(adapter: &TcbsAdapter, request: HistoryRequest) {
//!     let batch = adapter.fetch(request).await.expect("upstream reachable");
//!     println!("{} raw rows from {}", batch.records.len(), batch.provider);
//! }
//! ```

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use serde_json::{Map, Value};

use crate::interval_map::NativeInterval;
use crate::{DateRange, ProviderId, Symbol, ValidationError};

/// Failure classification shared by every stage of a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    /// Caller input rejected before any network activity.
    InvalidArgument,
    /// The selected source was not compiled into this build.
    MissingDependency,
    /// Transport failure, or an HTTP error status from a plain REST source.
    Connection,
    /// The upstream market-data provider reported an error.
    Provider,
    /// The warehouse rejected or failed to complete the query.
    Query,
    /// The upstream answered with a payload that could not be decoded.
    MalformedResponse,
    /// The blocking entry point could not drive the fetch on its own runtime.
    Runtime,
}

/// Structured error surfaced by the facade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
}

impl SourceError {
    fn new(kind: SourceErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::InvalidArgument, message)
    }

    pub fn missing_dependency(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::MissingDependency, message)
    }

    pub fn connection(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::Connection, message)
    }

    pub fn provider(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::Provider, message)
    }

    pub fn query(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::Query, message)
    }

    pub fn malformed_response(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::MalformedResponse, message)
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::Runtime, message)
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::InvalidArgument => "source.invalid_argument",
            SourceErrorKind::MissingDependency => "source.missing_dependency",
            SourceErrorKind::Connection => "source.connection",
            SourceErrorKind::Provider => "source.provider",
            SourceErrorKind::Query => "source.query",
            SourceErrorKind::MalformedResponse => "source.malformed_response",
            SourceErrorKind::Runtime => "source.runtime",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

impl From<ValidationError> for SourceError {
    fn from(error: ValidationError) -> Self {
        Self::invalid_argument(error.to_string())
    }
}

/// One upstream row, keyed by the provider's own column names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord(Map<String, Value>);

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(field.into(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }
}

impl From<Map<String, Value>> for RawRecord {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

/// Rows returned by one adapter call, tagged with their origin.
#[derive(Debug, Clone, PartialEq)]
pub struct RawBatch {
    pub provider: ProviderId,
    pub records: Vec<RawRecord>,
}

impl RawBatch {
    pub fn new(provider: ProviderId, records: Vec<RawRecord>) -> Self {
        Self { provider, records }
    }

    pub fn empty(provider: ProviderId) -> Self {
        Self::new(provider, Vec::new())
    }
}

/// Request handed to an adapter once the facade has validated it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRequest {
    pub symbol: Symbol,
    pub range: DateRange,
    pub interval: NativeInterval,
}

impl HistoryRequest {
    pub fn new(symbol: Symbol, range: DateRange, interval: NativeInterval) -> Self {
        Self {
            symbol,
            range,
            interval,
        }
    }
}

/// Source adapter contract.
///
/// Implementations own everything provider-specific: endpoint layout,
/// authentication, the native interval vocabulary and the failure kind they
/// report. One call performs at most one upstream request and never retries.
pub trait HistorySource: Send + Sync {
    /// Returns the provider this adapter serves.
    fn id(&self) -> ProviderId;

    /// Fetches raw history rows for the request.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] of the adapter's own failure kind when the
    /// transport fails, the upstream reports an error, or the payload cannot
    /// be decoded. An upstream answer with no rows is not an error.
    fn fetch<'a>(
        &'a self,
        req: HistoryRequest,
    ) -> Pin<Box<dyn Future<Output = Result<RawBatch, SourceError>> + Send + 'a>>;
}
