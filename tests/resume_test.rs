//! Resumability and idempotence: a warm cache short-circuits every network
//! call, an interrupted run picks up at the first uncached page, and
//! overlapping batches never fetch the same order twice.

use anyhow::Result;
use httpmock::prelude::*;
use order_etl::{CliConfig, FileCache, LocalStorage, OrderPipeline, ScrapeEngine};
use std::sync::Arc;
use tempfile::TempDir;

fn test_config(server: &MockServer, cache_dir: &TempDir, output_dir: &TempDir) -> CliConfig {
    CliConfig {
        session_id: "test-session".to_string(),
        api_endpoint: server.url("/graphql"),
        output_path: output_dir.path().to_str().unwrap().to_string(),
        cache_path: cache_dir.path().to_str().unwrap().to_string(),
        batch_size: 20,
        concurrent_requests: 4,
        max_retries: 0,
        verbose: false,
        monitor: false,
    }
}

async fn run_scrape(config: CliConfig) -> Result<order_etl::ScrapeReport> {
    let cache = Arc::new(FileCache::new(config.cache_path.clone()));
    let storage = LocalStorage::new(config.output_path.clone());
    let pipeline = OrderPipeline::new(cache, storage, config).unwrap();
    Ok(ScrapeEngine::new(pipeline).run().await?)
}

fn summary_page(orders: &[&str]) -> String {
    let entries: Vec<String> = orders
        .iter()
        .map(|id| format!(r#"{{"id":"{id}","orderUuid":"{id}"}}"#))
        .collect();
    format!(
        r#"{{"data":{{"getConsumerOrdersWithDetails":[{}]}}}}"#,
        entries.join(",")
    )
}

fn detail_payload(order_id: &str, store: &str) -> String {
    format!(
        r#"{{"data":{{"getConsumerOrderDetail":{{
            "orderUuid":"{order_id}",
            "submittedAt":"2025-11-05T01:30:00Z",
            "store":{{"name":"{store}"}},
            "creator":{{"firstName":"Ada","lastName":"Lovelace"}},
            "items":[{{"name":"House Special","orderItemExtras":[]}}]
        }}}}}}"#
    )
}

fn mock_summary_page(server: &MockServer, offset: usize, body: String) -> httpmock::Mock<'_> {
    server.mock(move |when, then| {
        when.method(POST)
            .path("/graphql")
            .body_contains("getConsumerOrdersWithDetails")
            .body_contains(format!(r#""offset":{}"#, offset));
        then.status(200)
            .header("Content-Type", "application/json")
            .body(body);
    })
}

fn mock_detail<'a>(server: &'a MockServer, order_id: &str, body: String) -> httpmock::Mock<'a> {
    let needle = format!(r#""orderUuid":"{}""#, order_id);
    server.mock(move |when, then| {
        when.method(POST)
            .path("/graphql")
            .body_contains("getConsumerOrderDetail")
            .body_contains(needle);
        then.status(200)
            .header("Content-Type", "application/json")
            .body(body);
    })
}

#[tokio::test]
async fn second_run_with_warm_cache_makes_no_network_calls() -> Result<()> {
    let cache_dir = TempDir::new()?;
    let output_dir = TempDir::new()?;
    let server = MockServer::start();

    let page0 = mock_summary_page(&server, 0, summary_page(&["uuid-1"]));
    let page1 = mock_summary_page(&server, 20, summary_page(&[]));
    let detail = mock_detail(&server, "uuid-1", detail_payload("uuid-1", "Panda Express"));

    let config = test_config(&server, &cache_dir, &output_dir);
    let first = run_scrape(config.clone()).await?;
    assert_eq!(first.orders, 1);

    let first_long = std::fs::read(output_dir.path().join("orders.csv"))?;
    let first_pivot = std::fs::read(output_dir.path().join("orders-pivot.csv"))?;

    let second = run_scrape(config).await?;
    assert_eq!(second.orders, 1);

    // Every endpoint was hit exactly once: the whole second run came from cache.
    page0.assert_hits(1);
    page1.assert_hits(1);
    detail.assert_hits(1);

    // And the exports are byte-identical.
    assert_eq!(first_long, std::fs::read(output_dir.path().join("orders.csv"))?);
    assert_eq!(
        first_pivot,
        std::fs::read(output_dir.path().join("orders-pivot.csv"))?
    );

    Ok(())
}

#[tokio::test]
async fn interrupted_run_resumes_from_first_uncached_page() -> Result<()> {
    let cache_dir = TempDir::new()?;
    let output_dir = TempDir::new()?;
    let server = MockServer::start();

    // Simulate a previous run that died after caching page 0: seed the cache
    // file directly. No mock exists for offset 0, so any network fetch of it
    // would fail the run.
    std::fs::write(
        cache_dir.path().join("summary-limit-20-offset-0.json"),
        summary_page(&["uuid-1"]),
    )?;

    let page1 = mock_summary_page(&server, 20, summary_page(&[]));
    let detail = mock_detail(&server, "uuid-1", detail_payload("uuid-1", "Panda Express"));

    let config = test_config(&server, &cache_dir, &output_dir);
    let report = run_scrape(config).await?;

    page1.assert();
    detail.assert();
    assert_eq!(report.orders, 1);

    let long_csv = std::fs::read_to_string(output_dir.path().join("orders.csv"))?;
    assert!(long_csv.contains("House Special"));

    Ok(())
}

#[tokio::test]
async fn overlapping_batches_fetch_each_order_once() -> Result<()> {
    let cache_dir = TempDir::new()?;
    let output_dir = TempDir::new()?;
    let server = MockServer::start();

    // "uuid-x" appears in both batches; the listing ends at offset 40.
    mock_summary_page(&server, 0, summary_page(&["uuid-x", "uuid-y"]));
    mock_summary_page(&server, 20, summary_page(&["uuid-x"]));
    mock_summary_page(&server, 40, summary_page(&[]));
    let detail_x = mock_detail(&server, "uuid-x", detail_payload("uuid-x", "Taqueria"));
    let detail_y = mock_detail(&server, "uuid-y", detail_payload("uuid-y", "Ramen-ya"));

    let config = test_config(&server, &cache_dir, &output_dir);
    let report = run_scrape(config).await?;

    detail_x.assert_hits(1);
    detail_y.assert_hits(1);
    assert_eq!(report.orders, 2);

    // One row per order in the long export, duplicate summary dropped.
    let long_csv = std::fs::read_to_string(output_dir.path().join("orders.csv"))?;
    assert_eq!(long_csv.matches("Taqueria").count(), 1);
    assert_eq!(long_csv.matches("Ramen-ya").count(), 1);

    Ok(())
}
