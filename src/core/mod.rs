pub mod etl;
pub mod export;
pub mod fetch;
pub mod pipeline;
pub mod transform;

pub use crate::domain::model::{Extraction, LoadOutcome, TransformResult};
pub use crate::domain::ports::{CacheStore, ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
