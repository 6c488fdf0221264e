pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::cli::{FileCache, LocalStorage};
pub use core::etl::{ScrapeEngine, ScrapeReport};
pub use core::pipeline::OrderPipeline;
pub use utils::error::{Result, ScrapeError};
