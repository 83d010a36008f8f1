use std::fmt::{Debug, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::data_source::{HistoryRequest, HistorySource, RawBatch, RawRecord, SourceError};
use crate::http_client::{HttpAuth, HttpClient, HttpRequest, ReqwestHttpClient};
use crate::interval_map::NativeInterval;
use crate::{CoreError, Interval, ProviderId, ValidationError};

pub const BIGQUERY_API_URL: &str = "https://bigquery.googleapis.com/bigquery/v2";

fn default_location() -> String {
    String::from("US")
}

fn default_table() -> String {
    String::from("histories")
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_base_url() -> String {
    String::from(BIGQUERY_API_URL)
}

/// Connection settings for the price-history warehouse.
///
/// Obtaining `access_token` (service-account exchange, workload identity, ...)
/// is the caller's concern; this crate only presents it as a bearer token.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct BigQueryCredential {
    pub project_id: String,
    pub dataset_id: String,
    pub access_token: String,
    #[serde(default = "default_location")]
    pub location: String,
    #[serde(default = "default_table")]
    pub table: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl BigQueryCredential {
    pub fn new(
        project_id: impl Into<String>,
        dataset_id: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let credential = Self {
            project_id: project_id.into(),
            dataset_id: dataset_id.into(),
            access_token: access_token.into(),
            location: default_location(),
            table: default_table(),
            timeout_ms: default_timeout_ms(),
            base_url: default_base_url(),
        };
        credential.validate()?;
        Ok(credential)
    }

    /// Parse a JSON credential document and validate its identifiers.
    pub fn from_json(document: &str) -> Result<Self, CoreError> {
        let credential: Self = serde_json::from_str(document)?;
        credential.validate()?;
        Ok(credential)
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Result<Self, ValidationError> {
        self.table = table.into();
        self.validate()?;
        Ok(self)
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Identifiers are spliced into SQL, so only plain names are accepted.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_identifier("project_id", &self.project_id, |c| {
            c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | ':')
        })?;
        check_identifier("dataset_id", &self.dataset_id, |c| {
            c.is_ascii_alphanumeric() || c == '_'
        })?;
        check_identifier("table", &self.table, |c| {
            c.is_ascii_alphanumeric() || matches!(c, '_' | '-')
        })
    }

    fn table_path(&self) -> String {
        format!("`{}.{}.{}`", self.project_id, self.dataset_id, self.table)
    }
}

impl Debug for BigQueryCredential {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BigQueryCredential")
            .field("project_id", &self.project_id)
            .field("dataset_id", &self.dataset_id)
            .field("access_token", &"<redacted>")
            .field("location", &self.location)
            .field("table", &self.table)
            .finish()
    }
}

fn check_identifier(
    field: &'static str,
    value: &str,
    allowed: impl Fn(char) -> bool,
) -> Result<(), ValidationError> {
    if value.is_empty() || !value.chars().all(allowed) {
        return Err(ValidationError::InvalidIdentifier {
            field,
            value: value.to_owned(),
        });
    }
    Ok(())
}

/// Warehouse adapter running one parameterized `jobs.query` call per fetch.
///
/// The warehouse stores adjusted prices in thousands of VND; the query scales
/// them back to VND.
#[derive(Clone)]
pub struct BigQueryAdapter {
    http_client: Arc<dyn HttpClient>,
    credential: BigQueryCredential,
}

impl BigQueryAdapter {
    pub fn new(credential: BigQueryCredential) -> Self {
        Self::with_http_client(Arc::new(ReqwestHttpClient::default()), credential)
    }

    pub fn with_http_client(
        http_client: Arc<dyn HttpClient>,
        credential: BigQueryCredential,
    ) -> Self {
        Self {
            http_client,
            credential,
        }
    }

    pub fn credential(&self) -> &BigQueryCredential {
        &self.credential
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/projects/{}/queries",
            self.credential.base_url,
            urlencoding::encode(&self.credential.project_id)
        )
    }

    /// SQL for one request; weekly and monthly buckets are rolled up in the
    /// warehouse and labelled by their first trading date.
    pub fn build_query(&self, interval: &NativeInterval) -> String {
        let table = self.credential.table_path();
        match interval.interval {
            Interval::Daily => format!(
                "SELECT `Date`, `Open Adj` * 1000 AS `Open`, `High Adj` * 1000 AS `High`, \
                 `Low Adj` * 1000 AS `Low`, `Close Adj` * 1000 AS `Close`, `Volume` \
                 FROM {table} \
                 WHERE `Symbol` = @symbol AND `Date` >= @start_date AND `Date` <= @end_date \
                 ORDER BY `Date` ASC"
            ),
            Interval::Weekly | Interval::Monthly => format!(
                "SELECT MIN(`Date`) AS `Date`, \
                 ARRAY_AGG(`Open Adj` ORDER BY `Date` ASC LIMIT 1)[OFFSET(0)] * 1000 AS `Open`, \
                 MAX(`High Adj`) * 1000 AS `High`, MIN(`Low Adj`) * 1000 AS `Low`, \
                 ARRAY_AGG(`Close Adj` ORDER BY `Date` DESC LIMIT 1)[OFFSET(0)] * 1000 AS `Close`, \
                 SUM(`Volume`) AS `Volume` \
                 FROM {table} \
                 WHERE `Symbol` = @symbol AND `Date` >= @start_date AND `Date` <= @end_date \
                 GROUP BY DATE_TRUNC(`Date`, {}) \
                 ORDER BY `Date` ASC",
                interval.as_str()
            ),
        }
    }

    fn request_body(&self, req: &HistoryRequest) -> Value {
        json!({
            "query": self.build_query(&req.interval),
            "useLegacySql": false,
            "parameterMode": "NAMED",
            "location": self.credential.location,
            "timeoutMs": self.credential.timeout_ms,
            "queryParameters": [
                scalar_parameter("symbol", "STRING", req.symbol.base()),
                scalar_parameter("start_date", "DATE", &req.range.start().to_string()),
                scalar_parameter("end_date", "DATE", &req.range.end().to_string()),
            ],
        })
    }

    async fn run_query(&self, req: &HistoryRequest) -> Result<RawBatch, SourceError> {
        let endpoint = self.endpoint();
        debug!(
            symbol = %req.symbol,
            interval = %req.interval,
            dataset = %self.credential.dataset_id,
            "running bigquery history query"
        );

        let request = HttpRequest::post(&endpoint)
            .with_auth(&HttpAuth::BearerToken(self.credential.access_token.clone()))
            .with_json_body(self.request_body(req).to_string())
            .with_timeout_ms(self.credential.timeout_ms);

        let response = self.http_client.execute(request).await.map_err(|e| {
            warn!(symbol = %req.symbol, error = %e, "bigquery transport error");
            SourceError::connection(format!("bigquery transport error: {}", e.message()))
        })?;

        if !response.is_success() {
            let detail = serde_json::from_str::<BigQueryErrorResponse>(&response.body)
                .map(|parsed| format!(": {}", parsed.error.message))
                .unwrap_or_default();
            warn!(symbol = %req.symbol, status = response.status, "bigquery rejected query");
            return Err(SourceError::query(format!(
                "bigquery returned status {}{detail}",
                response.status
            )));
        }

        parse_query_response(&response.body, self.credential.timeout_ms)
    }
}

impl HistorySource for BigQueryAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Bigquery
    }

    fn fetch<'a>(
        &'a self,
        req: HistoryRequest,
    ) -> Pin<Box<dyn Future<Output = Result<RawBatch, SourceError>> + Send + 'a>> {
        Box::pin(async move { self.run_query(&req).await })
    }
}

fn scalar_parameter(name: &str, kind: &str, value: &str) -> Value {
    json!({
        "name": name,
        "parameterType": { "type": kind },
        "parameterValue": { "value": value },
    })
}

fn parse_query_response(body: &str, timeout_ms: u64) -> Result<RawBatch, SourceError> {
    let parsed: QueryResponse = serde_json::from_str(body).map_err(|e| {
        SourceError::malformed_response(format!("failed to parse bigquery response: {e}"))
    })?;

    // A finished job may still list warnings in `errors`.
    let finished = parsed.job_complete == Some(true) && parsed.schema.is_some();
    if let Some(error) = parsed.errors.first() {
        if !finished {
            return Err(SourceError::query(format!(
                "bigquery query failed: {} ({})",
                error.message, error.reason
            )));
        }
        for warning in &parsed.errors {
            warn!(reason = %warning.reason, message = %warning.message, "bigquery job warning");
        }
    }

    if parsed.job_complete == Some(false) {
        return Err(SourceError::query(format!(
            "bigquery query did not complete within {timeout_ms}ms"
        )));
    }

    let fields = parsed.schema.map(|schema| schema.fields).unwrap_or_default();
    let records = parsed
        .rows
        .into_iter()
        .map(|row| {
            fields
                .iter()
                .zip(row.f)
                .fold(RawRecord::new(), |record, (field, cell)| {
                    record.with(field.name.as_str(), cell.v)
                })
        })
        .collect();

    Ok(RawBatch::new(ProviderId::Bigquery, records))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryResponse {
    #[serde(default)]
    job_complete: Option<bool>,
    #[serde(default)]
    schema: Option<TableSchema>,
    #[serde(default)]
    rows: Vec<TableRow>,
    #[serde(default)]
    errors: Vec<ErrorProto>,
}

#[derive(Debug, Deserialize)]
struct TableSchema {
    #[serde(default)]
    fields: Vec<FieldSchema>,
}

#[derive(Debug, Deserialize)]
struct FieldSchema {
    name: String,
}

#[derive(Debug, Deserialize)]
struct TableRow {
    #[serde(default)]
    f: Vec<TableCell>,
}

#[derive(Debug, Deserialize)]
struct TableCell {
    #[serde(default)]
    v: Value,
}

#[derive(Debug, Deserialize)]
struct ErrorProto {
    #[serde(default)]
    reason: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct BigQueryErrorResponse {
    error: BigQueryErrorBody,
}

#[derive(Debug, Deserialize)]
struct BigQueryErrorBody {
    #[serde(default)]
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_source::SourceErrorKind;
    use crate::http_client::{HttpError, HttpResponse};
    use crate::interval_map::native_interval;
    use crate::{DateRange, Symbol};
    use std::sync::Mutex;

    struct RecordingHttpClient {
        response: Result<HttpResponse, HttpError>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl RecordingHttpClient {
        fn new(response: Result<HttpResponse, HttpError>) -> Self {
            Self {
                response,
                requests: Mutex::new(Vec::new()),
            }
        }

        fn recorded_requests(&self) -> Vec<HttpRequest> {
            self.requests
                .lock()
                .expect("request store should not be poisoned")
                .clone()
        }
    }

    impl HttpClient for RecordingHttpClient {
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

    fn credential() -> BigQueryCredential {
        BigQueryCredential::new("vn-market", "stock_data", "ya29.token").expect("valid credential")
    }

    fn request(interval: Interval) -> HistoryRequest {
        HistoryRequest::new(
            Symbol::parse("FPT").expect("valid symbol"),
            DateRange::parse("2024-01-01", Some("2024-01-31")).expect("valid range"),
            native_interval(ProviderId::Bigquery, interval).expect("mapped"),
        )
    }

    const QUERY_BODY: &str = r#"{
        "kind":"bigquery#queryResponse",
        "schema":{"fields":[{"name":"Date","type":"DATE"},{"name":"Open","type":"FLOAT"},{"name":"High","type":"FLOAT"},{"name":"Low","type":"FLOAT"},{"name":"Close","type":"FLOAT"},{"name":"Volume","type":"INTEGER"}]},
        "rows":[{"f":[{"v":"2024-01-02"},{"v":"95000.0"},{"v":"96500.0"},{"v":"94800.0"},{"v":"96100.0"},{"v":"1520300"}]}],
        "totalRows":"1",
        "jobComplete":true
    }"#;

    #[test]
    fn credential_parses_from_json_with_defaults() {
        let credential = BigQueryCredential::from_json(
            r#"{"project_id":"vn-market","dataset_id":"stock_data","access_token":"t"}"#,
        )
        .expect("valid document");

        assert_eq!(credential.location, "US");
        assert_eq!(credential.table, "histories");
        assert!(!format!("{credential:?}").contains("\"t\""));
    }

    #[test]
    fn credential_rejects_injected_identifiers() {
        let err = BigQueryCredential::new("vn-market", "stock_data`; DROP", "t")
            .expect_err("must fail");
        assert!(matches!(
            err,
            ValidationError::InvalidIdentifier { field: "dataset_id", .. }
        ));
    }

    #[test]
    fn credential_document_missing_dataset_fails() {
        let err = BigQueryCredential::from_json(r#"{"project_id":"p","access_token":"t"}"#)
            .expect_err("must fail");
        assert!(matches!(err, CoreError::Serialization(_)));
    }

    #[test]
    fn daily_query_filters_by_parameters() {
        let adapter = BigQueryAdapter::new(credential());
        let sql = adapter.build_query(&native_interval(ProviderId::Bigquery, Interval::Daily).expect("mapped"));

        assert!(sql.contains("FROM `vn-market.stock_data.histories`"));
        assert!(sql.contains("`Symbol` = @symbol"));
        assert!(sql.contains("`Close Adj` * 1000 AS `Close`"));
        assert!(!sql.contains("GROUP BY"));
    }

    #[test]
    fn monthly_query_rolls_up_in_warehouse() {
        let adapter = BigQueryAdapter::new(credential());
        let sql = adapter.build_query(&native_interval(ProviderId::Bigquery, Interval::Monthly).expect("mapped"));

        assert!(sql.contains("GROUP BY DATE_TRUNC(`Date`, MONTH)"));
        assert!(sql.contains("SUM(`Volume`)"));
    }

    #[tokio::test]
    async fn posts_parameterized_query_with_bearer_token() {
        let client = Arc::new(RecordingHttpClient::new(Ok(HttpResponse::new(200, QUERY_BODY))));
        let adapter = BigQueryAdapter::with_http_client(client.clone(), credential());

        adapter.fetch(request(Interval::Weekly)).await.expect("fetch should succeed");

        let requests = client.recorded_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].url,
            format!("{BIGQUERY_API_URL}/projects/vn-market/queries")
        );
        assert_eq!(
            requests[0].headers.get("authorization").map(String::as_str),
            Some("Bearer ya29.token")
        );

        let body: Value =
            serde_json::from_str(requests[0].body.as_deref().unwrap_or_default()).expect("json body");
        assert_eq!(body["parameterMode"], "NAMED");
        assert_eq!(body["queryParameters"][0]["parameterValue"]["value"], "FPT");
        assert_eq!(body["queryParameters"][1]["parameterValue"]["value"], "2024-01-01");
        assert_eq!(body["queryParameters"][2]["parameterValue"]["value"], "2024-01-31");
        assert!(body["query"]
            .as_str()
            .unwrap_or_default()
            .contains("WEEK(MONDAY)"));
    }

    #[tokio::test]
    async fn zips_schema_into_records() {
        let adapter = BigQueryAdapter::with_http_client(
            Arc::new(RecordingHttpClient::new(Ok(HttpResponse::new(200, QUERY_BODY)))),
            credential(),
        );

        let batch = adapter.fetch(request(Interval::Daily)).await.expect("fetch should succeed");

        assert_eq!(batch.records.len(), 1);
        assert_eq!(batch.records[0].get("Date").and_then(Value::as_str), Some("2024-01-02"));
        assert_eq!(batch.records[0].get("Volume").and_then(Value::as_str), Some("1520300"));
    }

    #[tokio::test]
    async fn empty_result_has_no_rows_field() {
        let body = r#"{"schema":{"fields":[{"name":"Date"}]},"totalRows":"0","jobComplete":true}"#;
        let adapter = BigQueryAdapter::with_http_client(
            Arc::new(RecordingHttpClient::new(Ok(HttpResponse::new(200, body)))),
            credential(),
        );

        let batch = adapter.fetch(request(Interval::Daily)).await.expect("fetch should succeed");
        assert!(batch.records.is_empty());
    }

    #[tokio::test]
    async fn bad_request_is_a_query_error() {
        let body = r#"{"error":{"code":400,"message":"Unrecognized name: `Close Adj`","status":"INVALID_ARGUMENT"}}"#;
        let adapter = BigQueryAdapter::with_http_client(
            Arc::new(RecordingHttpClient::new(Ok(HttpResponse::new(400, body)))),
            credential(),
        );

        let error = adapter.fetch(request(Interval::Daily)).await.expect_err("must fail");
        assert_eq!(error.kind(), SourceErrorKind::Query);
        assert!(error.message().contains("Unrecognized name"));
    }

    #[tokio::test]
    async fn incomplete_job_is_a_query_error() {
        let adapter = BigQueryAdapter::with_http_client(
            Arc::new(RecordingHttpClient::new(Ok(HttpResponse::new(
                200,
                r#"{"jobComplete":false}"#,
            )))),
            credential(),
        );

        let error = adapter.fetch(request(Interval::Daily)).await.expect_err("must fail");
        assert_eq!(error.kind(), SourceErrorKind::Query);
    }

    #[tokio::test]
    async fn warnings_on_a_finished_job_keep_the_rows() {
        let body = r#"{
            "schema":{"fields":[{"name":"Date"},{"name":"Close"}]},
            "rows":[{"f":[{"v":"2024-01-02"},{"v":"95800.0"}]}],
            "errors":[{"reason":"invalidQuery","message":"Partition filter is recommended"}],
            "jobComplete":true
        }"#;
        let adapter = BigQueryAdapter::with_http_client(
            Arc::new(RecordingHttpClient::new(Ok(HttpResponse::new(200, body)))),
            credential(),
        );

        let batch = adapter.fetch(request(Interval::Daily)).await.expect("warnings are not fatal");
        assert_eq!(batch.records.len(), 1);
        assert_eq!(batch.records[0].get("Close").and_then(Value::as_str), Some("95800.0"));
    }

    #[tokio::test]
    async fn errors_on_an_unfinished_job_fail_the_query() {
        let body = r#"{
            "errors":[{"reason":"notFound","message":"Not found: Table vn-market:stock_data.histories"}],
            "jobComplete":false
        }"#;
        let adapter = BigQueryAdapter::with_http_client(
            Arc::new(RecordingHttpClient::new(Ok(HttpResponse::new(200, body)))),
            credential(),
        );

        let error = adapter.fetch(request(Interval::Daily)).await.expect_err("must fail");
        assert_eq!(error.kind(), SourceErrorKind::Query);
        assert!(error.message().contains("Not found: Table"));
    }

    #[tokio::test]
    async fn transport_failure_is_a_connection_error() {
        let adapter = BigQueryAdapter::with_http_client(
            Arc::new(RecordingHttpClient::new(Err(HttpError::new("tls handshake failed")))),
            credential(),
        );

        let error = adapter.fetch(request(Interval::Daily)).await.expect_err("must fail");
        assert_eq!(error.kind(), SourceErrorKind::Connection);
    }
}
