//! Single entry point binding one symbol to one history source.

use std::fmt::{Debug, Formatter};
use std::str::FromStr;
use std::sync::Arc;

use tracing::{debug, info};

use crate::adapters::{TcbsAdapter, TcbsConfig};
#[cfg(feature = "bigquery")]
use crate::adapters::{BigQueryAdapter, BigQueryCredential};
#[cfg(feature = "yfinance")]
use crate::adapters::{YahooAdapter, YahooConfig};
use crate::data_source::{HistoryRequest, HistorySource, SourceError};
use crate::http_client::{HttpClient, ReqwestHttpClient};
use crate::interval_map::native_interval;
use crate::normalize::normalize;
use crate::{dependency, CanonicalTable, DateRange, Interval, ProviderId, Symbol};

/// Historical OHLCV loader for one Vietnamese-listed symbol.
///
/// The source is chosen once, at construction; every fetch then validates its
/// arguments, makes exactly one upstream call and returns the canonical
/// table. Nothing is cached between calls.
///
/// ```rust,ignore
/// use vstock_data::StockVN;
///
/// let stock = StockVN::new("FPT", "tcbs")?;
/// let table = stock.fetch_data("2024-01-01", Some("2024-01-10"), Some("D")).await?;
/// for row in table.rows() {
///     println!("{} close={}", row.date, row.close);
/// }
/// ```
pub struct StockVN {
    symbol: Symbol,
    provider: ProviderId,
    source: Arc<dyn HistorySource>,
}

impl StockVN {
    /// Bind `symbol` to `source` (`tcbs`, `yfinance` or `bigquery`).
    ///
    /// # Errors
    ///
    /// Invalid-argument for a malformed symbol or unknown source,
    /// missing-dependency when the source's feature is not compiled in, and
    /// invalid-argument for `bigquery`, which needs a credential and therefore
    /// the builder.
    pub fn new(symbol: &str, source: &str) -> Result<Self, SourceError> {
        Self::builder(symbol).source(source).build()
    }

    pub fn builder(symbol: &str) -> StockVNBuilder {
        StockVNBuilder::new(symbol)
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn source(&self) -> ProviderId {
        self.provider
    }

    /// Fetch history for `start..=end` (`YYYY-MM-DD`).
    ///
    /// `end` defaults to today and `interval` to daily. Dates and the
    /// interval token are validated before any network activity.
    pub async fn fetch_data(
        &self,
        start: &str,
        end: Option<&str>,
        interval: Option<&str>,
    ) -> Result<CanonicalTable, SourceError> {
        let range = DateRange::parse(start, end)?;
        let interval = match interval {
            Some(token) => Interval::from_str(token)?,
            None => Interval::default(),
        };
        self.fetch(range, interval).await
    }

    /// Typed variant of [`fetch_data`](Self::fetch_data).
    pub async fn fetch(
        &self,
        range: DateRange,
        interval: Interval,
    ) -> Result<CanonicalTable, SourceError> {
        dependency::ensure_available(self.provider)?;
        let native = native_interval(self.provider, interval)?;
        debug!(symbol = %self.symbol, source = %self.provider, %range, %native, "dispatching fetch");

        let request = HistoryRequest::new(self.symbol.clone(), range, native);
        let batch = self.source.fetch(request).await?;
        let raw_rows = batch.records.len();
        let table = normalize(batch.provider, &batch.records).clip(&range, interval);

        info!(
            symbol = %self.symbol,
            source = %self.provider,
            %interval,
            raw_rows,
            rows = table.len(),
            "fetched history"
        );
        Ok(table)
    }

    /// Blocking wrapper around [`fetch_data`](Self::fetch_data) for callers
    /// without an async runtime.
    ///
    /// # Errors
    ///
    /// Returns a runtime error, without contacting the source, when called
    /// from a thread that is already driving a Tokio runtime or when the
    /// private runtime cannot be started. Otherwise fails as `fetch_data`.
    pub fn fetch_data_blocking(
        &self,
        start: &str,
        end: Option<&str>,
        interval: Option<&str>,
    ) -> Result<CanonicalTable, SourceError> {
        if tokio::runtime::Handle::try_current().is_ok() {
            return Err(SourceError::runtime(
                "fetch_data_blocking cannot run inside an async runtime; await fetch_data instead",
            ));
        }
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| SourceError::runtime(format!("failed to start io runtime: {e}")))?;
        runtime.block_on(self.fetch_data(start, end, interval))
    }
}

impl Debug for StockVN {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StockVN")
            .field("symbol", &self.symbol)
            .field("source", &self.provider)
            .finish()
    }
}

/// Builder for [`StockVN`] carrying transport and per-source configuration.
pub struct StockVNBuilder {
    symbol: String,
    source: String,
    http_client: Option<Arc<dyn HttpClient>>,
    tcbs_config: TcbsConfig,
    #[cfg(feature = "yfinance")]
    yahoo_config: YahooConfig,
    #[cfg(feature = "bigquery")]
    credential: Option<BigQueryCredential>,
}

impl StockVNBuilder {
    fn new(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_owned(),
            source: ProviderId::default().as_str().to_owned(),
            http_client: None,
            tcbs_config: TcbsConfig::default(),
            #[cfg(feature = "yfinance")]
            yahoo_config: YahooConfig::default(),
            #[cfg(feature = "bigquery")]
            credential: None,
        }
    }

    /// Source name, matched case-insensitively at [`build`](Self::build).
    pub fn source(mut self, source: &str) -> Self {
        self.source = source.to_owned();
        self
    }

    pub fn provider(mut self, provider: ProviderId) -> Self {
        self.source = provider.as_str().to_owned();
        self
    }

    /// Transport shared by whichever adapter gets selected.
    pub fn http_client(mut self, http_client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(http_client);
        self
    }

    pub fn tcbs_config(mut self, config: TcbsConfig) -> Self {
        self.tcbs_config = config;
        self
    }

    #[cfg(feature = "yfinance")]
    pub fn yahoo_config(mut self, config: YahooConfig) -> Self {
        self.yahoo_config = config;
        self
    }

    #[cfg(feature = "bigquery")]
    pub fn credential(mut self, credential: BigQueryCredential) -> Self {
        self.credential = Some(credential);
        self
    }

    pub fn build(self) -> Result<StockVN, SourceError> {
        let provider = ProviderId::from_str(&self.source)?;
        let symbol = Symbol::parse(&self.symbol)?;
        dependency::ensure_available(provider)?;

        let http_client: Arc<dyn HttpClient> = match self.http_client {
            Some(client) => client,
            None => Arc::new(ReqwestHttpClient::default()),
        };

        let source: Arc<dyn HistorySource> = match provider {
            ProviderId::Tcbs => Arc::new(TcbsAdapter::new(http_client, self.tcbs_config)),
            #[cfg(feature = "yfinance")]
            ProviderId::Yfinance => Arc::new(YahooAdapter::new(http_client, self.yahoo_config)),
            #[cfg(feature = "bigquery")]
            ProviderId::Bigquery => {
                let credential =
                    self.credential
                        .ok_or(crate::ValidationError::MissingCredential {
                            source_id: ProviderId::Bigquery.as_str(),
                        })?;
                Arc::new(BigQueryAdapter::with_http_client(http_client, credential))
            }
            #[allow(unreachable_patterns)]
            other => return Err(dependency::missing(other)),
        };

        Ok(StockVN {
            symbol,
            provider,
            source,
        })
    }
}
