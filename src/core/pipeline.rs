use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::core::export::{self, LONG_EXPORT_FILE, PIVOT_EXPORT_FILE};
use crate::core::fetch::{
    detail_cache_key, parse_order_detail, parse_summary_batch, retry_with_backoff,
    summary_cache_key, OrderApiClient, RETRY_BASE_DELAY,
};
use crate::core::transform;
use crate::domain::model::{Extraction, LoadOutcome, OrderDetail, OrderSummary, TransformResult};
use crate::domain::ports::{CacheStore, ConfigProvider, Pipeline, Storage};
use crate::utils::error::{Result, ScrapeError};

/// Guard against a listing endpoint that never returns an empty batch.
const MAX_SUMMARY_PAGES: usize = 500;

/// The one concrete pipeline: paginated summary fetch → parallel detail
/// fetch → flatten/pivot → CSV exports. Both fetch stages go through the
/// cache first, which is what makes an interrupted run resumable.
pub struct OrderPipeline<S, O, C> {
    cache: Arc<S>,
    storage: O,
    config: C,
    client: OrderApiClient,
}

impl<S, O, C> OrderPipeline<S, O, C>
where
    S: CacheStore + 'static,
    O: Storage,
    C: ConfigProvider,
{
    pub fn new(cache: Arc<S>, storage: O, config: C) -> Result<Self> {
        let client = OrderApiClient::new(config.api_endpoint(), config.session_token())?;
        Ok(Self {
            cache,
            storage,
            config,
            client,
        })
    }

    async fn summary_payload(&self, offset: usize) -> Result<String> {
        let limit = self.config.batch_size();
        let key = summary_cache_key(limit, offset);

        match self.cache.get(&key).await {
            Ok(Some(payload)) => {
                tracing::debug!(offset, "summary page served from cache");
                return Ok(payload);
            }
            Ok(None) => {}
            Err(err) => tracing::warn!(offset, error = %err, "cache read failed, refetching"),
        }

        let payload = retry_with_backoff(self.config.max_retries(), RETRY_BASE_DELAY, || {
            self.client.list_summaries(offset, limit)
        })
        .await?;

        if let Err(err) = self.cache.put(&key, &payload).await {
            tracing::warn!(offset, error = %err, "cache write failed, page will be refetched next run");
        }
        Ok(payload)
    }

    /// Walks offsets 0, B, 2B, … until the first empty batch. Order ids are
    /// deduplicated across batches, first occurrence winning.
    async fn collect_summaries(&self) -> Result<Vec<OrderSummary>> {
        let batch_size = self.config.batch_size();
        let mut summaries: Vec<OrderSummary> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut offset = 0usize;
        let mut pages = 0usize;

        loop {
            if pages >= MAX_SUMMARY_PAGES {
                return Err(ScrapeError::PaginationLimit {
                    max_pages: MAX_SUMMARY_PAGES,
                });
            }

            let payload = self.summary_payload(offset).await?;
            match parse_summary_batch(offset, &payload) {
                Ok(batch) => {
                    if batch.is_empty() {
                        tracing::info!(offset, "empty batch, order listing complete");
                        break;
                    }
                    for summary in batch {
                        if seen.insert(summary.order_id.clone()) {
                            summaries.push(summary);
                        }
                    }
                }
                Err(err @ ScrapeError::AuthFailure { .. }) => return Err(err),
                Err(err) => {
                    tracing::warn!(offset, error = %err, "skipping malformed summary page");
                }
            }

            offset += batch_size;
            pages += 1;
        }

        tracing::info!(
            "discovered {} distinct orders across {} pages",
            summaries.len(),
            pages
        );
        Ok(summaries)
    }

    /// Fetches details on a bounded worker pool. Per-order failures are
    /// collected, not fatal; an auth rejection aborts the whole run.
    async fn fetch_details(&self, summaries: &[OrderSummary]) -> Result<Extraction> {
        let semaphore = Arc::new(Semaphore::new(self.config.concurrent_requests().max(1)));
        let mut tasks: JoinSet<(String, Result<OrderDetail>)> = JoinSet::new();

        for summary in summaries {
            let order_id = summary.order_id.clone();
            let client = self.client.clone();
            let cache = Arc::clone(&self.cache);
            let semaphore = Arc::clone(&semaphore);
            let max_retries = self.config.max_retries();
            tasks.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        return (
                            order_id,
                            Err(ScrapeError::ProcessingError {
                                message: "detail worker pool closed unexpectedly".to_string(),
                            }),
                        );
                    }
                };
                let result =
                    match detail_payload(&client, cache.as_ref(), max_retries, &order_id).await {
                        Ok(payload) => parse_order_detail(&order_id, &payload),
                        Err(err) => Err(err),
                    };
                (order_id, result)
            });
        }

        let mut fetched: HashMap<String, OrderDetail> = HashMap::new();
        while let Some(joined) = tasks.join_next().await {
            let (order_id, result) = joined.map_err(|e| ScrapeError::ProcessingError {
                message: format!("detail task aborted: {}", e),
            })?;
            match result {
                Ok(detail) => {
                    fetched.insert(order_id, detail);
                }
                Err(err @ ScrapeError::AuthFailure { .. }) => return Err(err),
                Err(err) => {
                    tracing::error!(order_id = %order_id, error = %err, "order detail failed");
                }
            }
        }

        // Completion order is arbitrary; reassemble in summary order so the
        // exports come out identical run to run.
        let mut extraction = Extraction::default();
        for summary in summaries {
            match fetched.remove(&summary.order_id) {
                Some(detail) => extraction.orders.push(detail),
                None => extraction.failed_order_ids.push(summary.order_id.clone()),
            }
        }
        Ok(extraction)
    }
}

async fn detail_payload<S: CacheStore>(
    client: &OrderApiClient,
    cache: &S,
    max_retries: u32,
    order_id: &str,
) -> Result<String> {
    let key = detail_cache_key(order_id);

    match cache.get(&key).await {
        Ok(Some(payload)) => {
            tracing::debug!(order_id, "order detail served from cache");
            return Ok(payload);
        }
        Ok(None) => {}
        Err(err) => tracing::warn!(order_id, error = %err, "cache read failed, refetching"),
    }

    let payload =
        retry_with_backoff(max_retries, RETRY_BASE_DELAY, || client.order_detail(order_id)).await?;

    if let Err(err) = cache.put(&key, &payload).await {
        tracing::warn!(order_id, error = %err, "cache write failed, order will be refetched next run");
    }
    Ok(payload)
}

#[async_trait]
impl<S, O, C> Pipeline for OrderPipeline<S, O, C>
where
    S: CacheStore + 'static,
    O: Storage,
    C: ConfigProvider,
{
    async fn extract(&self) -> Result<Extraction> {
        let summaries = self.collect_summaries().await?;
        self.fetch_details(&summaries).await
    }

    async fn transform(&self, orders: Vec<OrderDetail>) -> Result<TransformResult> {
        let long_rows = transform::flatten(&orders);
        let pivot_rows = transform::pivot(&long_rows);
        Ok(TransformResult {
            long_rows,
            pivot_rows,
        })
    }

    async fn load(&self, result: TransformResult) -> Result<LoadOutcome> {
        let exports = [
            (LONG_EXPORT_FILE, export::render_long(&result.long_rows)),
            (PIVOT_EXPORT_FILE, export::render_pivot(&result.pivot_rows)),
        ];

        let mut outcome = LoadOutcome::default();
        for (name, rendered) in exports {
            let path = format!("{}/{}", self.config.output_path(), name);
            let written = match rendered {
                Ok(bytes) => self.storage.write_file(name, &bytes).await,
                Err(err) => Err(err),
            };
            match written {
                Ok(()) => {
                    tracing::info!("wrote {}", path);
                    outcome.written.push(path);
                }
                Err(err) => {
                    tracing::error!(error = %err, "failed to write {}", path);
                    outcome.failed.push((path, err.to_string()));
                }
            }
        }

        // One export failing must not stop the other; both failing is fatal.
        if outcome.written.is_empty() {
            if let Some((path, reason)) = outcome.failed.first() {
                return Err(ScrapeError::ExportError {
                    path: path.clone(),
                    reason: reason.clone(),
                });
            }
        }
        Ok(outcome)
    }
}
