use crate::core::Pipeline;
use crate::utils::error::Result;

#[cfg(feature = "cli")]
use crate::utils::monitor::SystemMonitor;

/// Final accounting for a run. `failed_order_ids` being non-empty does not
/// make the run a failure; it is reported so the user can retry or clear
/// those cache entries.
#[derive(Debug, Default)]
pub struct ScrapeReport {
    pub orders: usize,
    pub items: usize,
    pub failed_order_ids: Vec<String>,
    pub exports_written: Vec<String>,
    pub exports_failed: Vec<(String, String)>,
}

pub struct ScrapeEngine<P: Pipeline> {
    pipeline: P,
    #[cfg(feature = "cli")]
    monitor: SystemMonitor,
}

impl<P: Pipeline> ScrapeEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self {
            pipeline,
            #[cfg(feature = "cli")]
            monitor: SystemMonitor::new(false),
        }
    }

    #[cfg(feature = "cli")]
    pub fn new_with_monitoring(pipeline: P, enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(enabled),
        }
    }

    pub async fn run(&self) -> Result<ScrapeReport> {
        tracing::info!("Fetching order history...");
        let extraction = self.pipeline.extract().await?;
        tracing::info!(
            "Fetched {} orders ({} failed)",
            extraction.orders.len(),
            extraction.failed_order_ids.len()
        );

        tracing::info!("Flattening orders...");
        let order_count = extraction.orders.len();
        let transformed = self.pipeline.transform(extraction.orders).await?;
        tracing::info!("Flattened into {} item rows", transformed.long_rows.len());

        tracing::info!("Writing exports...");
        let item_count = transformed.long_rows.len();
        let outcome = self.pipeline.load(transformed).await?;

        self.log_resource_usage();

        Ok(ScrapeReport {
            orders: order_count,
            items: item_count,
            failed_order_ids: extraction.failed_order_ids,
            exports_written: outcome.written,
            exports_failed: outcome.failed,
        })
    }

    #[cfg(feature = "cli")]
    fn log_resource_usage(&self) {
        if let Some(stats) = self.monitor.stats() {
            tracing::info!(
                "Resource usage: {:.1}% CPU, {} MB memory, {:.1}s elapsed",
                stats.cpu_usage,
                stats.memory_usage_mb,
                stats.elapsed_time.as_secs_f64()
            );
        }
    }

    #[cfg(not(feature = "cli"))]
    fn log_resource_usage(&self) {}
}
