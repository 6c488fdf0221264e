use crate::domain::model::{Extraction, LoadOutcome, OrderDetail, TransformResult};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Key → raw payload persistence consulted before every network call.
/// Entries are write-once and there is deliberately no delete operation;
/// clearing the cache is an external action.
pub trait CacheStore: Send + Sync {
    fn get(&self, key: &str) -> impl std::future::Future<Output = Result<Option<String>>> + Send;
    fn put(
        &self,
        key: &str,
        payload: &str,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Sink for the finished exports.
pub trait Storage: Send + Sync {
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn api_endpoint(&self) -> &str;
    fn session_token(&self) -> &str;
    fn output_path(&self) -> &str;
    fn batch_size(&self) -> usize;
    fn concurrent_requests(&self) -> usize;
    fn max_retries(&self) -> u32;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Extraction>;
    async fn transform(&self, orders: Vec<OrderDetail>) -> Result<TransformResult>;
    async fn load(&self, result: TransformResult) -> Result<LoadOutcome>;
}
