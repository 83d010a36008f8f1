use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::data_source::{HistoryRequest, HistorySource, RawBatch, RawRecord, SourceError};
use crate::domain::VIETNAM_OFFSET;
use crate::http_client::{HttpClient, HttpRequest, ReqwestHttpClient};
use crate::ProviderId;

pub const TCBS_BARS_URL: &str =
    "https://apipubaws.tcbs.com.vn/stock-insight/v1/stock/bars-long-term";

/// Endpoint settings for the TCBS market-data API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TcbsConfig {
    pub base_url: String,
    pub timeout_ms: u64,
}

impl Default for TcbsConfig {
    fn default() -> Self {
        Self {
            base_url: String::from(TCBS_BARS_URL),
            timeout_ms: 10_000,
        }
    }
}

/// TCBS long-term bars adapter.
///
/// The long-term endpoint answers a whole `from..to` window in one response,
/// so every fetch is a single GET.
#[derive(Clone)]
pub struct TcbsAdapter {
    http_client: Arc<dyn HttpClient>,
    config: TcbsConfig,
}

impl Default for TcbsAdapter {
    fn default() -> Self {
        Self::new(Arc::new(ReqwestHttpClient::default()), TcbsConfig::default())
    }
}

impl TcbsAdapter {
    pub fn new(http_client: Arc<dyn HttpClient>, config: TcbsConfig) -> Self {
        Self {
            http_client,
            config,
        }
    }

    pub fn with_http_client(http_client: Arc<dyn HttpClient>) -> Self {
        Self::new(http_client, TcbsConfig::default())
    }

    pub fn config(&self) -> &TcbsConfig {
        &self.config
    }

    fn endpoint(&self, req: &HistoryRequest) -> String {
        let (from, to) = req.range.unix_bounds(VIETNAM_OFFSET);
        let kind = if req.symbol.is_index() { "index" } else { "stock" };
        format!(
            "{}?ticker={}&type={}&resolution={}&from={}&to={}",
            self.config.base_url,
            urlencoding::encode(req.symbol.base()),
            kind,
            req.interval.as_str(),
            from,
            to
        )
    }

    async fn fetch_bars(&self, req: &HistoryRequest) -> Result<RawBatch, SourceError> {
        let endpoint = self.endpoint(req);
        debug!(symbol = %req.symbol, interval = %req.interval, %endpoint, "requesting tcbs bars");

        let request = HttpRequest::get(&endpoint).with_timeout_ms(self.config.timeout_ms);
        let response = self.http_client.execute(request).await.map_err(|e| {
            warn!(symbol = %req.symbol, error = %e, "tcbs transport error");
            SourceError::connection(format!("tcbs transport error: {}", e.message()))
        })?;

        if !response.is_success() {
            warn!(symbol = %req.symbol, status = response.status, "tcbs returned error status");
            return Err(SourceError::connection(format!(
                "tcbs returned status {}",
                response.status
            )));
        }

        parse_bars_response(&response.body)
    }
}

impl HistorySource for TcbsAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Tcbs
    }

    fn fetch<'a>(
        &'a self,
        req: HistoryRequest,
    ) -> Pin<Box<dyn Future<Output = Result<RawBatch, SourceError>> + Send + 'a>> {
        Box::pin(async move { self.fetch_bars(&req).await })
    }
}

#[derive(Debug, Deserialize)]
struct TcbsBarsResponse {
    #[serde(default)]
    data: Option<Vec<Map<String, Value>>>,
}

fn parse_bars_response(body: &str) -> Result<RawBatch, SourceError> {
    let parsed: TcbsBarsResponse = serde_json::from_str(body).map_err(|e| {
        SourceError::malformed_response(format!("failed to parse tcbs bars: {e}"))
    })?;

    let records = parsed
        .data
        .unwrap_or_default()
        .into_iter()
        .map(RawRecord::from)
        .collect();
    Ok(RawBatch::new(ProviderId::Tcbs, records))
}
