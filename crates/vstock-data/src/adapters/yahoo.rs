use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::data_source::{HistoryRequest, HistorySource, RawBatch, RawRecord, SourceError};
use crate::domain::{VIETNAM_OFFSET, VN_SUFFIX};
use crate::http_client::{HttpClient, HttpRequest, ReqwestHttpClient};
use crate::{ProviderId, Symbol};

pub const YAHOO_CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// Endpoint settings for the Yahoo Finance chart API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct YahooConfig {
    pub base_url: String,
    pub timeout_ms: u64,
    /// Exchange qualifier Yahoo expects on Vietnamese tickers.
    pub exchange_suffix: String,
}

impl Default for YahooConfig {
    fn default() -> Self {
        Self {
            base_url: String::from(YAHOO_CHART_URL),
            timeout_ms: 10_000,
            exchange_suffix: String::from(VN_SUFFIX),
        }
    }
}

/// Yahoo Finance chart adapter.
#[derive(Clone)]
pub struct YahooAdapter {
    http_client: Arc<dyn HttpClient>,
    config: YahooConfig,
}

impl Default for YahooAdapter {
    fn default() -> Self {
        Self::new(Arc::new(ReqwestHttpClient::default()), YahooConfig::default())
    }
}

impl YahooAdapter {
    pub fn new(http_client: Arc<dyn HttpClient>, config: YahooConfig) -> Self {
        Self {
            http_client,
            config,
        }
    }

    pub fn with_http_client(http_client: Arc<dyn HttpClient>) -> Self {
        Self::new(http_client, YahooConfig::default())
    }

    pub fn config(&self) -> &YahooConfig {
        &self.config
    }

    /// Ticker as Yahoo lists it, e.g. `VCB` becomes `VCB.VN`.
    pub fn ticker(&self, symbol: &Symbol) -> String {
        let suffix = self.config.exchange_suffix.as_str();
        if suffix.is_empty() || symbol.as_str().ends_with(suffix) {
            symbol.as_str().to_owned()
        } else {
            format!("{}{}", symbol.as_str(), suffix)
        }
    }

    fn endpoint(&self, req: &HistoryRequest) -> String {
        let (period1, period2) = req.range.unix_bounds(VIETNAM_OFFSET);
        format!(
            "{}/{}?period1={}&period2={}&interval={}&events=history&includeAdjustedClose=true",
            self.config.base_url,
            urlencoding::encode(&self.ticker(&req.symbol)),
            period1,
            period2,
            req.interval.as_str()
        )
    }

    async fn fetch_chart(&self, req: &HistoryRequest) -> Result<RawBatch, SourceError> {
        let endpoint = self.endpoint(req);
        debug!(symbol = %req.symbol, interval = %req.interval, %endpoint, "requesting yahoo chart");

        let request = HttpRequest::get(&endpoint)
            .with_header("referer", "https://finance.yahoo.com/")
            .with_timeout_ms(self.config.timeout_ms);

        let response = self.http_client.execute(request).await.map_err(|e| {
            warn!(symbol = %req.symbol, error = %e, "yahoo transport error");
            SourceError::connection(format!("yahoo transport error: {}", e.message()))
        })?;

        if !response.is_success() {
            let detail = serde_json::from_str::<YahooChartResponse>(&response.body)
                .ok()
                .and_then(|parsed| parsed.chart.error)
                .map(|error| format!(": {}", error.describe()))
                .unwrap_or_default();
            warn!(symbol = %req.symbol, status = response.status, "yahoo returned error status");
            return Err(SourceError::provider(format!(
                "yahoo returned status {}{detail}",
                response.status
            )));
        }

        parse_chart_response(&response.body)
    }
}

impl HistorySource for YahooAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Yfinance
    }

    fn fetch<'a>(
        &'a self,
        req: HistoryRequest,
    ) -> Pin<Box<dyn Future<Output = Result<RawBatch, SourceError>> + Send + 'a>> {
        Box::pin(async move { self.fetch_chart(&req).await })
    }
}

fn parse_chart_response(body: &str) -> Result<RawBatch, SourceError> {
    let chart_response: YahooChartResponse = serde_json::from_str(body).map_err(|e| {
        SourceError::malformed_response(format!("failed to parse yahoo chart: {e}"))
    })?;

    if let Some(error) = chart_response.chart.error {
        return Err(SourceError::provider(format!(
            "yahoo chart API error: {}",
            error.describe()
        )));
    }

    let Some(result) = chart_response
        .chart
        .result
        .and_then(|results| results.into_iter().next())
    else {
        return Ok(RawBatch::empty(ProviderId::Yfinance));
    };

    let timestamps = result.timestamp.unwrap_or_default();
    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();
    let adjclose = result
        .indicators
        .adjclose
        .into_iter()
        .next()
        .map(|adj| adj.adjclose)
        .unwrap_or_default();
    let gmtoffset = result.meta.gmtoffset;

    let records = timestamps
        .iter()
        .enumerate()
        .map(|(i, &ts)| {
            RawRecord::new()
                .with("timestamp", ts)
                .with("gmtoffset", gmtoffset)
                .with("open", cell(&quote.open, i))
                .with("high", cell(&quote.high, i))
                .with("low", cell(&quote.low, i))
                .with("close", cell(&quote.close, i))
                .with("adjclose", cell(&adjclose, i))
                .with("volume", cell(&quote.volume, i))
        })
        .collect();

    Ok(RawBatch::new(ProviderId::Yfinance, records))
}

fn cell(column: &[Option<f64>], index: usize) -> Value {
    Value::from(column.get(index).copied().flatten())
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartResponse {
    chart: YahooChartData,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartData {
    #[serde(default)]
    result: Option<Vec<YahooChartResult>>,
    #[serde(default)]
    error: Option<YahooChartError>,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    description: String,
}

impl YahooChartError {
    fn describe(&self) -> String {
        if self.description.is_empty() {
            self.code.clone()
        } else {
            format!("{} ({})", self.description, self.code)
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartResult {
    #[serde(default)]
    meta: YahooChartMeta,
    timestamp: Option<Vec<i64>>,
    indicators: YahooChartIndicators,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct YahooChartMeta {
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartIndicators {
    #[serde(default)]
    quote: Vec<YahooChartQuote>,
    #[serde(default)]
    adjclose: Vec<YahooAdjClose>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct YahooChartQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooAdjClose {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}
