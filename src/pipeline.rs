//! Run coordination: extraction, then per-article image and translation,
//! then aggregation. One run per session; grid environments fan out into
//! independent tasks.

use crate::config::{AppConfig, EnvironmentSpec};
use crate::driver::{Connector, PageDriver, SessionStatus};
use crate::error::{PersistError, PipelineError};
use crate::extractor::Extractor;
use crate::frequency::aggregate;
use crate::persist::{AssetPersister, PersistOutcome};
use crate::results::{ArticleRecord, TranslatedPair, WordFrequencyTable};
use crate::translator::Translator;
use crate::utils::dir_name;
use std::path::PathBuf;
use std::sync::Arc;

/// Label used for runs against the local WebDriver
pub const LOCAL_LABEL: &str = "local";

/// What happened to an article's cover image
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageStatus {
    /// The article had no image
    Missing,
    Saved(PathBuf),
    Failed(String),
    /// Persistence was turned off after the output directory could not be created
    Disabled,
}

/// One article after the per-article stages
#[derive(Debug, Clone)]
pub struct ProcessedArticle {
    pub record: ArticleRecord,
    /// `None` when translation failed
    pub translation: Option<TranslatedPair>,
    pub image: ImageStatus,
}

/// Everything one pipeline run produced
#[derive(Debug, Clone)]
pub struct RunReport {
    pub environment: String,
    pub articles: Vec<ProcessedArticle>,
    /// Translated titles in document order; failed translations are absent
    pub translated_titles: Vec<String>,
    pub frequencies: WordFrequencyTable,
}

impl RunReport {
    /// A run passes when at least one title came back with text
    pub fn passed(&self) -> bool {
        self.nonempty_titles() > 0
    }

    fn nonempty_titles(&self) -> usize {
        self.translated_titles
            .iter()
            .filter(|title| !title.trim().is_empty())
            .count()
    }

    pub fn status(&self) -> SessionStatus {
        if self.passed() {
            SessionStatus::Passed
        } else {
            SessionStatus::Failed
        }
    }

    pub fn status_reason(&self) -> String {
        if self.passed() {
            format!(
                "{} of {} titles translated",
                self.nonempty_titles(),
                self.articles.len()
            )
        } else {
            "no titles were translated".to_string()
        }
    }

    pub fn images_saved(&self) -> usize {
        self.articles
            .iter()
            .filter(|a| matches!(a.image, ImageStatus::Saved(_)))
            .count()
    }
}

/// Outcome of one environment's run
#[derive(Debug)]
pub struct EnvironmentRun {
    pub label: String,
    pub outcome: Result<RunReport, PipelineError>,
}

/// The per-run stages, owning their own HTTP clients
pub struct Pipeline {
    config: Arc<AppConfig>,
    translator: Translator,
    persister: AssetPersister,
}

impl Pipeline {
    pub fn new(config: Arc<AppConfig>) -> Result<Self, PipelineError> {
        let translator = Translator::new(config.translator.clone())?;
        let persister = AssetPersister::new(&config.assets)?;
        Ok(Self {
            config,
            translator,
            persister,
        })
    }

    /// Save images under their own subdirectory of the output directory
    pub fn with_image_subdir(mut self, name: &str) -> Self {
        self.persister = self.persister.with_subdir(name);
        self
    }

    /// Run every stage against an open session
    pub async fn process<D: PageDriver>(
        &self,
        driver: &D,
        label: &str,
    ) -> Result<RunReport, PipelineError> {
        let records = Extractor::new(driver, &self.config.extractor)
            .extract()
            .await?;

        let mut images_enabled = true;
        let mut articles = Vec::with_capacity(records.len());
        let mut translated_titles = Vec::new();

        for (index, record) in records.into_iter().enumerate() {
            let number = index + 1;

            let image = if images_enabled {
                self.save_image(label, number, &record, &mut images_enabled)
                    .await
            } else {
                ImageStatus::Disabled
            };

            let translation = match self
                .translator
                .translate(&record.title, record.content.as_deref())
                .await
            {
                Ok(pair) => {
                    translated_titles.push(pair.title_en.clone());
                    Some(pair)
                }
                Err(e) => {
                    ::log::warn!("[{}] Article {}: translation failed: {}", label, number, e);
                    None
                }
            };

            articles.push(ProcessedArticle {
                record,
                translation,
                image,
            });
        }

        let frequencies = aggregate(&translated_titles, self.config.frequency_threshold);
        ::log::info!(
            "[{}] Processed {} articles, {} translated, {} repeated words",
            label,
            articles.len(),
            translated_titles.len(),
            frequencies.len()
        );

        Ok(RunReport {
            environment: label.to_string(),
            articles,
            translated_titles,
            frequencies,
        })
    }

    async fn save_image(
        &self,
        label: &str,
        number: usize,
        record: &ArticleRecord,
        images_enabled: &mut bool,
    ) -> ImageStatus {
        match self.persister.persist(record.image_url.as_deref()).await {
            Ok(PersistOutcome::Skipped) => ImageStatus::Missing,
            Ok(PersistOutcome::Saved { path, .. }) => ImageStatus::Saved(path),
            Err(e @ PersistError::CreateDir { .. }) => {
                ::log::error!(
                    "[{}] {}; skipping image persistence for the rest of this run",
                    label,
                    e
                );
                *images_enabled = false;
                ImageStatus::Failed(e.to_string())
            }
            Err(e) => {
                ::log::warn!("[{}] Article {}: failed to download image: {}", label, number, e);
                ImageStatus::Failed(e.to_string())
            }
        }
    }
}

/// Open a session, run the pipeline, report status and always close the session
pub async fn run_session<C: Connector>(
    connector: &C,
    config: Arc<AppConfig>,
    environment: Option<&EnvironmentSpec>,
) -> EnvironmentRun {
    let label = environment
        .map(EnvironmentSpec::label)
        .unwrap_or_else(|| LOCAL_LABEL.to_string());
    let report_status = environment.is_some()
        && config.grid.as_ref().is_some_and(|grid| grid.report_status);

    let pipeline = match Pipeline::new(config) {
        // Grid environments run side by side; each keeps its images apart
        Ok(pipeline) if environment.is_some() => pipeline.with_image_subdir(&dir_name(&label)),
        Ok(pipeline) => pipeline,
        Err(e) => {
            return EnvironmentRun {
                label,
                outcome: Err(e),
            };
        }
    };

    let driver = match connector.connect(environment).await {
        Ok(driver) => driver,
        Err(e) => {
            ::log::error!("[{}] Could not open a browser session: {}", label, e);
            return EnvironmentRun {
                label,
                outcome: Err(e.into()),
            };
        }
    };

    let outcome = pipeline.process(&driver, &label).await;

    if report_status {
        let (status, reason) = match &outcome {
            Ok(report) => (report.status(), report.status_reason()),
            Err(e) => (SessionStatus::Failed, e.to_string()),
        };
        if let Err(e) = driver.report_status(status, &reason).await {
            ::log::warn!("[{}] Failed to report session status: {}", label, e);
        }
    }

    if let Err(e) = driver.close().await {
        ::log::warn!("[{}] Failed to close browser session: {}", label, e);
    } else {
        ::log::debug!("[{}] Browser session closed", label);
    }

    EnvironmentRun { label, outcome }
}

/// Run once locally, or once per grid environment in parallel.
///
/// Results come back in the order the environments were declared.
pub async fn run_all<C: Connector>(connector: Arc<C>, config: Arc<AppConfig>) -> Vec<EnvironmentRun> {
    let environments = config
        .grid
        .as_ref()
        .map(|grid| grid.environments.clone())
        .unwrap_or_default();

    if environments.is_empty() {
        if config.grid.is_some() {
            ::log::warn!("Grid configured without environments; running locally");
        }
        return vec![run_session(connector.as_ref(), config, None).await];
    }

    ::log::info!("Starting {} environment runs", environments.len());
    let mut handles = Vec::with_capacity(environments.len());
    for env in environments {
        let connector = Arc::clone(&connector);
        let config = Arc::clone(&config);
        let label = env.label();
        let handle =
            tokio::spawn(async move { run_session(connector.as_ref(), config, Some(&env)).await });
        handles.push((label, handle));
    }

    let mut runs = Vec::with_capacity(handles.len());
    for (label, handle) in handles {
        match handle.await {
            Ok(run) => runs.push(run),
            Err(e) => {
                ::log::error!("[{}] Environment task failed: {}", label, e);
                runs.push(EnvironmentRun {
                    label,
                    outcome: Err(e.into()),
                });
            }
        }
    }
    runs
}
