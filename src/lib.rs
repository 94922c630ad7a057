// Re-export modules
pub mod config;
pub mod driver;
pub mod error;
pub mod extractor;
pub mod frequency;
pub mod persist;
pub mod pipeline;
pub mod report;
pub mod results;
pub mod translator;
pub mod utils;

#[cfg(test)]
mod tests;

// Re-export commonly used types for convenience
pub use config::{AppConfig, EnvironmentSpec};
pub use error::{ConfigError, PipelineError};
pub use pipeline::{EnvironmentRun, RunReport};
pub use results::{ArticleRecord, TranslatedPair, WordFrequencyTable};

use driver::Connector;
use driver::webdriver::WebDriverConnector;
use std::sync::Arc;

/// Main builder for a digest run
pub struct Digest {
    config: AppConfig,
}

impl Digest {
    /// Create a new builder from a complete configuration
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    /// Load configuration from a JSON file
    pub fn from_config_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        Ok(Self::new(AppConfig::from_file(path)?))
    }

    /// Overlay environment variables (`WEBDRIVER_URL`, `RAPID_API_KEY`, grid credentials)
    pub fn with_env(mut self) -> Self {
        self.config.apply_env();
        self
    }

    /// Set the maximum number of articles to extract
    pub fn with_max_articles(mut self, max_articles: usize) -> Self {
        self.config.extractor.max_articles = max_articles;
        self
    }

    /// Set the directory cover images are written to
    pub fn with_output_dir(mut self, dir: impl Into<String>) -> Self {
        self.config.assets.output_dir = dir.into();
        self
    }

    /// Set the local WebDriver URL
    pub fn with_webdriver_url(mut self, url: impl Into<String>) -> Self {
        self.config.webdriver_url = url.into();
        self
    }

    /// Set the repetition threshold for the word table
    pub fn with_threshold(mut self, threshold: usize) -> Self {
        self.config.frequency_threshold = threshold;
        self
    }

    pub fn with_headless(mut self, headless: bool) -> Self {
        self.config.headless = headless;
        self
    }

    /// Ignore any grid section and run against the local WebDriver
    pub fn local_only(mut self) -> Self {
        self.config.grid = None;
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Validate the configuration and run against real browsers
    pub async fn run(self) -> Result<Vec<EnvironmentRun>, ConfigError> {
        self.config.validate()?;
        let config = Arc::new(self.config);
        let connector = Arc::new(WebDriverConnector::new(Arc::clone(&config)));
        Ok(pipeline::run_all(connector, config).await)
    }

    /// Run with a caller-supplied session factory
    pub async fn run_with<C: Connector>(
        self,
        connector: Arc<C>,
    ) -> Result<Vec<EnvironmentRun>, ConfigError> {
        self.config.validate()?;
        Ok(pipeline::run_all(connector, Arc::new(self.config)).await)
    }
}
