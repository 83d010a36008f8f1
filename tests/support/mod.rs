//! Offline transport and upstream payload fixtures shared by the integration
//! tests.

#![allow(dead_code)]

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use serde_json::json;
use vstock_data::{HttpClient, HttpError, HttpRequest, HttpResponse};

/// Transport that records every request and answers with one canned response.
#[derive(Debug)]
pub struct FixtureHttpClient {
    response: Result<HttpResponse, HttpError>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl FixtureHttpClient {
    pub fn new(response: Result<HttpResponse, HttpError>) -> Arc<Self> {
        Arc::new(Self {
            response,
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn ok(body: impl Into<String>) -> Arc<Self> {
        Self::new(Ok(HttpResponse::new(200, body)))
    }

    pub fn status(status: u16, body: impl Into<String>) -> Arc<Self> {
        Self::new(Ok(HttpResponse::new(status, body)))
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Self::new(Err(HttpError::new(message)))
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .expect("request store should not be poisoned")
            .clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests().len()
    }
}

impl HttpClient for FixtureHttpClient {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        self.requests
            .lock()
            .expect("request store should not be poisoned")
            .push(request);
        let response = self.response.clone();
        Box::pin(async move { response })
    }
}

/// TCBS bars for FPT around early January 2024: one bar before the range, a
/// revised 2024-01-05 bar, and a 2024-01-09 bar with no close.
pub const TCBS_FPT_JAN_2024: &str = r#"{"ticker":"FPT","data":[
  {"open":94.1,"high":95.0,"low":93.8,"close":94.6,"volume":1802300,"tradingDate":"2023-12-29T00:00:00.000Z"},
  {"open":94.6,"high":95.9,"low":94.5,"close":95.8,"volume":2156100,"tradingDate":"2024-01-02T00:00:00.000Z"},
  {"open":95.8,"high":96.5,"low":95.1,"close":96.2,"volume":1987400,"tradingDate":"2024-01-03T00:00:00.000Z"},
  {"open":96.2,"high":96.4,"low":94.9,"close":95.3,"volume":2310500,"tradingDate":"2024-01-04T00:00:00.000Z"},
  {"open":95.3,"high":96.0,"low":95.0,"close":95.5,"volume":1650000,"tradingDate":"2024-01-05T00:00:00.000Z"},
  {"open":95.6,"high":97.2,"low":95.4,"close":97.0,"volume":2870200,"tradingDate":"2024-01-08T00:00:00.000Z"},
  {"open":97.0,"high":97.5,"low":96.1,"close":null,"volume":1904300,"tradingDate":"2024-01-09T00:00:00.000Z"},
  {"open":96.8,"high":97.9,"low":96.5,"close":97.6,"volume":2433800,"tradingDate":"2024-01-10T00:00:00.000Z"},
  {"open":95.3,"high":96.1,"low":95.0,"close":95.9,"volume":1688000,"tradingDate":"2024-01-05T00:00:00.000Z"}
]}"#;

pub const TCBS_EMPTY: &str = r#"{"ticker":"FPT","data":[]}"#;

/// TCBS monthly bars for FPT, each labelled with the first day of its month.
pub const TCBS_FPT_MONTHLY_2025: &str = r#"{"ticker":"FPT","data":[
  {"open":131.0,"high":139.6,"low":128.4,"close":136.2,"volume":48120300,"tradingDate":"2024-12-01T00:00:00.000Z"},
  {"open":136.2,"high":142.9,"low":133.0,"close":140.5,"volume":51377800,"tradingDate":"2025-01-01T00:00:00.000Z"}
]}"#;

/// TCBS weekly bars for FPT, each labelled with its Monday.
pub const TCBS_FPT_WEEKLY_JAN_2025: &str = r#"{"ticker":"FPT","data":[
  {"open":136.0,"high":138.1,"low":134.9,"close":137.4,"volume":9201100,"tradingDate":"2025-01-06T00:00:00.000Z"},
  {"open":137.4,"high":139.8,"low":136.5,"close":139.0,"volume":10344000,"tradingDate":"2025-01-13T00:00:00.000Z"},
  {"open":139.0,"high":141.2,"low":138.2,"close":140.5,"volume":11872500,"tradingDate":"2025-01-20T00:00:00.000Z"}
]}"#;

pub const VN_GMT_OFFSET: i64 = 25_200;
pub const ONE_WEEK_SECS: i64 = 7 * 86_400;
/// 2024-12-30T00:00:00+07:00, a Monday.
pub const MONDAY_2024_12_30: i64 = 1_735_491_600;

/// Yahoo weekly chart for VCB.VN with `weeks` Monday bars starting on
/// 2024-12-30.
pub fn yahoo_vcb_weekly(weeks: usize) -> String {
    let timestamps = (0..weeks)
        .map(|week| MONDAY_2024_12_30 + ONE_WEEK_SECS * week as i64)
        .collect::<Vec<_>>();
    let closes = (0..weeks)
        .map(|week| 91_000.0 + 250.0 * week as f64)
        .collect::<Vec<_>>();
    let opens = closes.iter().map(|close| close - 500.0).collect::<Vec<_>>();
    let highs = closes.iter().map(|close| close + 800.0).collect::<Vec<_>>();
    let lows = closes.iter().map(|close| close - 900.0).collect::<Vec<_>>();
    let volumes = (0..weeks)
        .map(|week| 7_000_000 + 10_000 * week as i64)
        .collect::<Vec<_>>();

    json!({
        "chart": {
            "result": [{
                "meta": { "currency": "VND", "symbol": "VCB.VN", "gmtoffset": VN_GMT_OFFSET },
                "timestamp": timestamps,
                "indicators": {
                    "quote": [{
                        "open": opens,
                        "high": highs,
                        "low": lows,
                        "close": closes,
                        "volume": volumes
                    }],
                    "adjclose": [{ "adjclose": closes }]
                }
            }],
            "error": null
        }
    })
    .to_string()
}

pub const YAHOO_NO_TRADES: &str =
    r#"{"chart":{"result":[{"meta":{"symbol":"VCB.VN","gmtoffset":25200},"indicators":{"quote":[{}],"adjclose":[{}]}}],"error":null}}"#;

/// BigQuery `jobs.query` answer with three daily FPT rows, one repeated.
pub const BIGQUERY_FPT_DAILY: &str = r#"{
  "kind":"bigquery#queryResponse",
  "schema":{"fields":[
    {"name":"Date","type":"DATE"},{"name":"Open","type":"FLOAT"},{"name":"High","type":"FLOAT"},
    {"name":"Low","type":"FLOAT"},{"name":"Close","type":"FLOAT"},{"name":"Volume","type":"INTEGER"}]},
  "rows":[
    {"f":[{"v":"2024-01-02"},{"v":"94600.0"},{"v":"95900.0"},{"v":"94500.0"},{"v":"95800.0"},{"v":"2156100"}]},
    {"f":[{"v":"2024-01-03"},{"v":"95800.0"},{"v":"96500.0"},{"v":"95100.0"},{"v":"96200.0"},{"v":"1987400"}]},
    {"f":[{"v":"2024-01-03"},{"v":"95800.0"},{"v":"96500.0"},{"v":"95100.0"},{"v":"96300.0"},{"v":"1990000"}]}
  ],
  "totalRows":"3",
  "jobComplete":true
}"#;

pub const BIGQUERY_EMPTY: &str =
    r#"{"kind":"bigquery#queryResponse","schema":{"fields":[{"name":"Date","type":"DATE"}]},"totalRows":"0","jobComplete":true}"#;
