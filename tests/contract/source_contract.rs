//! Adapter contract tests.
//!
//! Every compiled-in adapter must turn its upstream payload into a batch the
//! response normalizer maps onto the canonical column set, in ascending date
//! order with no duplicate dates.

#[path = "../support/mod.rs"]
mod support;

use std::sync::Arc;

use vstock_data::interval_map::native_interval;
use vstock_data::normalize::normalize;
use vstock_data::{
    CanonicalTable, DateRange, HistoryRequest, HistorySource, HttpClient, Interval, ProviderId,
    Symbol, TcbsAdapter,
};

use support::{FixtureHttpClient, TCBS_FPT_JAN_2024};

struct ContractCase {
    source: Arc<dyn HistorySource>,
    client: Arc<FixtureHttpClient>,
    symbol: &'static str,
    range: DateRange,
    interval: Interval,
}

fn range(start: &str, end: &str) -> DateRange {
    DateRange::parse(start, Some(end)).expect("valid range")
}

fn transport(client: &Arc<FixtureHttpClient>) -> Arc<dyn HttpClient> {
    client.clone()
}

fn cases() -> Vec<ContractCase> {
    let tcbs_client = FixtureHttpClient::ok(TCBS_FPT_JAN_2024);
    let mut cases = vec![ContractCase {
        source: Arc::new(TcbsAdapter::with_http_client(transport(&tcbs_client))),
        client: tcbs_client,
        symbol: "FPT",
        range: range("2024-01-01", "2024-01-10"),
        interval: Interval::Daily,
    }];

    #[cfg(feature = "yfinance")]
    {
        let client = FixtureHttpClient::ok(support::yahoo_vcb_weekly(6));
        cases.push(ContractCase {
            source: Arc::new(vstock_data::YahooAdapter::with_http_client(transport(&client))),
            client,
            symbol: "VCB",
            range: range("2025-01-01", "2025-02-10"),
            interval: Interval::Weekly,
        });
    }

    #[cfg(feature = "bigquery")]
    {
        let client = FixtureHttpClient::ok(support::BIGQUERY_FPT_DAILY);
        let credential = vstock_data::BigQueryCredential::new("vn-market", "prices", "token")
            .expect("valid credential");
        cases.push(ContractCase {
            source: Arc::new(vstock_data::BigQueryAdapter::with_http_client(
                transport(&client),
                credential,
            )),
            client,
            symbol: "FPT",
            range: range("2024-01-01", "2024-01-05"),
            interval: Interval::Daily,
        });
    }

    cases
}

async fn fetch_canonical(case: &ContractCase) -> (ProviderId, CanonicalTable) {
    let provider = case.source.id();
    let native = native_interval(provider, case.interval).expect("interval supported");
    let request = HistoryRequest::new(
        Symbol::parse(case.symbol).expect("valid symbol"),
        case.range,
        native,
    );
    let batch = case.source.fetch(request).await.expect("fetch should succeed");
    assert_eq!(batch.provider, provider);
    (provider, normalize(batch.provider, &batch.records))
}

#[tokio::test]
async fn adapters_produce_ascending_unique_dates() {
    for case in cases() {
        let (provider, table) = fetch_canonical(&case).await;

        assert!(!table.is_empty(), "{provider} returned no rows");
        let dates = table.dates().collect::<Vec<_>>();
        assert!(
            dates.windows(2).all(|pair| pair[0] < pair[1]),
            "{provider} dates not strictly ascending: {dates:?}"
        );
    }
}

#[tokio::test]
async fn adapters_fill_every_canonical_column() {
    for case in cases() {
        let (provider, table) = fetch_canonical(&case).await;

        for column in CanonicalTable::COLUMNS {
            let values = table
                .column(column)
                .unwrap_or_else(|| panic!("{provider} lacks column {column}"));
            assert_eq!(values.len(), table.len(), "{provider} {column}");
            assert!(
                values.iter().all(|v| v.is_finite() && *v >= 0.0),
                "{provider} {column} has invalid values"
            );
        }
        for row in table.rows() {
            assert!(row.low <= row.high, "{provider} low above high on {}", row.date);
        }
    }
}

#[tokio::test]
async fn adapters_issue_exactly_one_request_per_fetch() {
    for case in cases() {
        let (provider, _) = fetch_canonical(&case).await;

        assert_eq!(case.client.request_count(), 1, "{provider}");
    }
}

#[tokio::test]
async fn canonical_table_serializes_with_canonical_field_names() {
    for case in cases() {
        let (provider, table) = fetch_canonical(&case).await;

        let value = serde_json::to_value(&table).expect("table serializes");
        let first = &value.as_array().expect("rows array")[0];
        for field in std::iter::once(CanonicalTable::INDEX).chain(CanonicalTable::COLUMNS) {
            assert!(first.get(field).is_some(), "{provider} row lacks {field}");
        }
    }
}
