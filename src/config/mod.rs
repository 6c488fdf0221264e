pub mod cli;

#[cfg(feature = "cli")]
pub use cli_config::CliConfig;

#[cfg(feature = "cli")]
mod cli_config {
    use crate::domain::ports::ConfigProvider;
    use crate::utils::error::Result;
    use crate::utils::validation::{
        validate_non_empty_string, validate_path, validate_range, validate_url, Validate,
    };
    use clap::Parser;

    #[derive(Clone, Parser)]
    #[command(name = "order-etl")]
    #[command(about = "Scrapes your order history into flat CSV exports")]
    pub struct CliConfig {
        #[arg(
            help = "your sessionid cookie value, or the full cookie string copied from the browser"
        )]
        pub session_id: String,

        #[arg(
            long,
            default_value = "https://api-consumer-client.doordash.com/graphql"
        )]
        pub api_endpoint: String,

        #[arg(long, default_value = ".")]
        pub output_path: String,

        #[arg(long, default_value = "./order-cache")]
        pub cache_path: String,

        #[arg(long, default_value = "20")]
        pub batch_size: usize,

        #[arg(long, default_value = "4")]
        pub concurrent_requests: usize,

        #[arg(long, default_value = "3")]
        pub max_retries: u32,

        #[arg(short, long, help = "Show more detailed logs")]
        pub verbose: bool,

        #[arg(long, help = "Report CPU/memory usage at end of run")]
        pub monitor: bool,
    }

    // The session cookie is a credential; keep it out of debug logs.
    impl std::fmt::Debug for CliConfig {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("CliConfig")
                .field("session_id", &"<redacted>")
                .field("api_endpoint", &self.api_endpoint)
                .field("output_path", &self.output_path)
                .field("cache_path", &self.cache_path)
                .field("batch_size", &self.batch_size)
                .field("concurrent_requests", &self.concurrent_requests)
                .field("max_retries", &self.max_retries)
                .field("verbose", &self.verbose)
                .field("monitor", &self.monitor)
                .finish()
        }
    }

    impl Validate for CliConfig {
        fn validate(&self) -> Result<()> {
            validate_non_empty_string("session_id", &self.session_id)?;
            validate_url("api_endpoint", &self.api_endpoint)?;
            validate_path("output_path", &self.output_path)?;
            validate_path("cache_path", &self.cache_path)?;
            validate_range("batch_size", self.batch_size, 1, 100)?;
            validate_range("concurrent_requests", self.concurrent_requests, 1, 16)?;
            validate_range("max_retries", self.max_retries, 0, 10)?;
            Ok(())
        }
    }

    impl ConfigProvider for CliConfig {
        fn api_endpoint(&self) -> &str {
            &self.api_endpoint
        }

        fn session_token(&self) -> &str {
            &self.session_id
        }

        fn output_path(&self) -> &str {
            &self.output_path
        }

        fn batch_size(&self) -> usize {
            self.batch_size
        }

        fn concurrent_requests(&self) -> usize {
            self.concurrent_requests
        }

        fn max_retries(&self) -> u32 {
            self.max_retries
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        fn config() -> CliConfig {
            CliConfig {
                session_id: "abc123".to_string(),
                api_endpoint: "https://example.com/graphql".to_string(),
                output_path: ".".to_string(),
                cache_path: "./order-cache".to_string(),
                batch_size: 20,
                concurrent_requests: 4,
                max_retries: 3,
                verbose: false,
                monitor: false,
            }
        }

        #[test]
        fn default_shape_validates() {
            assert!(config().validate().is_ok());
        }

        #[test]
        fn empty_session_is_rejected() {
            let mut c = config();
            c.session_id = "  ".to_string();
            assert!(c.validate().is_err());
        }

        #[test]
        fn out_of_range_concurrency_is_rejected() {
            let mut c = config();
            c.concurrent_requests = 64;
            assert!(c.validate().is_err());
        }

        #[test]
        fn debug_output_redacts_the_session_cookie() {
            let rendered = format!("{:?}", config());
            assert!(rendered.contains("<redacted>"));
            assert!(!rendered.contains("abc123"));
        }
    }
}
