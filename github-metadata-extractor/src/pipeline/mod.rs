//! Extraction run orchestration.
//!
//! A run goes through the following steps:
//!
//! ```text
//! preflight_check
//!   -> fetch_user_metadata || fetch_repositories_metadata
//!   -> [extract_keywords -> compute_quality_metrics -> write_analysis_files]
//!      || [write_output_files | transform_assets -> upload_assets]
//! ```
//!
//! Every step runs through a [`StepExecutor`] with the configured retry
//! policy and its own timeout. The analysis branch and the sink branch both
//! read the same fetched data and run concurrently.

mod config;
mod error;

pub use config::PipelineConfig;
pub use error::PipelineError;

use crate::catalog::{transform, CatalogClient, HttpCatalogClient};
use crate::client::{
    is_valid_login, AccountMetadata, GitHubClient, MetadataSource, RepositoryMetadata,
    MAX_LOGIN_LENGTH,
};
use crate::config::{validate_http_url, Settings};
use crate::enrich::{enrich, KeywordExtractor, RakeExtractor};
use crate::metrics::QualityMetrics;
use crate::secrets::{CredentialSource, SecretStore};
use crate::sink::{FileSink, SinkError, SinkKind, SinkOutcome};
use crate::workflow::{StepExecutor, StepOptions, StepRecord};
use futures::future::try_join;
use serde::Serialize;
use std::convert::Infallible;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, info_span, Instrument};

pub const PREFLIGHT_TIMEOUT: Duration = Duration::from_secs(60);
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(5 * 60);
pub const ANALYSIS_TIMEOUT: Duration = Duration::from_secs(5 * 60);
pub const WRITE_TIMEOUT: Duration = Duration::from_secs(5 * 60);
pub const TRANSFORM_TIMEOUT: Duration = Duration::from_secs(5 * 60);
pub const UPLOAD_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Step names as they appear in the step history.
pub mod steps {
    pub const PREFLIGHT: &str = "preflight_check";
    pub const FETCH_ACCOUNT: &str = "fetch_user_metadata";
    pub const FETCH_REPOSITORIES: &str = "fetch_repositories_metadata";
    pub const EXTRACT_KEYWORDS: &str = "extract_keywords";
    pub const COMPUTE_METRICS: &str = "compute_quality_metrics";
    pub const WRITE_ANALYSIS: &str = "write_analysis_files";
    pub const WRITE_OUTPUT: &str = "write_output_files";
    pub const TRANSFORM: &str = "transform_assets";
    pub const UPLOAD: &str = "upload_assets";
}

/// Returns the workflow id of runs for `identifier`.
pub fn workflow_id(identifier: &str) -> String {
    format!("github_extraction_{identifier}")
}

/// Rejects identifiers that are not GitHub logins.
///
/// The identifier becomes part of API paths and output file names.
fn check_identifier(identifier: &str) -> Result<(), PipelineError> {
    if identifier.trim().is_empty() {
        return Err(PipelineError::Configuration(
            "identifier must not be empty".to_string(),
        ));
    }
    if !is_valid_login(identifier) {
        return Err(PipelineError::Configuration(format!(
            "identifier '{identifier}' must be 1 to {MAX_LOGIN_LENGTH} ASCII letters, digits or hyphens"
        )));
    }
    Ok(())
}

/// Everything a successful run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// `github_extraction_{identifier}`.
    pub workflow_id: String,
    pub identifier: String,
    pub account: AccountMetadata,
    /// Enriched repositories when analysis ran, fetched ones otherwise.
    pub repositories: Vec<RepositoryMetadata>,
    pub metrics: Option<QualityMetrics>,
    pub sink: SinkOutcome,
    /// Every file written by the run.
    pub files: Vec<PathBuf>,
    /// Every step that ran, in completion order.
    pub steps: Vec<StepRecord>,
}

/// Output of the analysis branch.
struct Analysis {
    repositories: Vec<RepositoryMetadata>,
    metrics: QualityMetrics,
    files: Vec<PathBuf>,
}

/// One extraction run.
pub struct Pipeline {
    config: PipelineConfig,
    source: Arc<dyn MetadataSource>,
    extractor: Arc<dyn KeywordExtractor>,
    catalog: Option<Arc<dyn CatalogClient>>,
}

impl Pipeline {
    /// Creates a pipeline reading from `source`, using the default keyword
    /// extractor and no catalog.
    pub fn new(config: PipelineConfig, source: Arc<dyn MetadataSource>) -> Self {
        Self {
            config,
            source,
            extractor: Arc::new(RakeExtractor::default()),
            catalog: None,
        }
    }

    /// Replaces the keyword extractor used by the analysis branch.
    #[must_use]
    pub fn with_extractor(mut self, extractor: Arc<dyn KeywordExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Sets the catalog client that the catalog sink uploads through.
    #[must_use]
    pub fn with_catalog(mut self, catalog: Arc<dyn CatalogClient>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Builds a pipeline talking to the services configured in `settings`.
    ///
    /// Credentials are resolved lazily on first use, so this does no I/O.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Configuration`] if the identifier is not a
    /// GitHub login, if a configured URL is invalid, or if the catalog sink
    /// is selected without a catalog URL.
    pub fn from_settings(
        config: PipelineConfig,
        credential: CredentialSource,
        settings: &Settings,
        secrets: Arc<dyn SecretStore>,
    ) -> Result<Self, PipelineError> {
        check_identifier(config.identifier())?;
        let api_base_url = validate_http_url("github.api-base-url", &settings.github.api_base_url)
            .map_err(PipelineError::Configuration)?;
        let client = GitHubClient::new(api_base_url, credential, Arc::clone(&secrets));
        let mut pipeline = Self::new(config, Arc::new(client));

        match &settings.catalog.base_url {
            Some(base_url) => {
                let base_url = validate_http_url("catalog.base-url", base_url)
                    .map_err(PipelineError::Configuration)?;
                let catalog = HttpCatalogClient::new(
                    &base_url,
                    settings.catalog.api_key_reference.clone(),
                    secrets,
                )
                .map_err(|e| PipelineError::Configuration(e.to_string()))?;
                pipeline = pipeline.with_catalog(Arc::new(catalog));
            }
            None if pipeline.config.sink() == SinkKind::Catalog => {
                return Err(PipelineError::Configuration(
                    "the catalog sink requires catalog.base-url".to_string(),
                ));
            }
            None => {}
        }

        Ok(pipeline)
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Workflow id of this run.
    pub fn workflow_id(&self) -> String {
        workflow_id(self.config.identifier())
    }

    /// Executes the run.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Configuration`] before any step runs if the
    /// identifier is not a GitHub login. Returns [`PipelineError::Step`] for the first step that failed for
    /// good. Uploads already made to the catalog are not rolled back.
    pub async fn run(&self) -> Result<RunReport, PipelineError> {
        let identifier = self.config.identifier();
        check_identifier(identifier)?;
        let catalog = match (self.config.sink(), &self.catalog) {
            (SinkKind::Catalog, None) => {
                return Err(PipelineError::Configuration(
                    "the catalog sink requires a catalog client".to_string(),
                ));
            }
            (_, catalog) => catalog.as_deref(),
        };

        let workflow_id = self.workflow_id();
        let span = info_span!("pipeline", workflow_id = %workflow_id, identifier);
        let run = Run {
            pipeline: self,
            identifier,
            catalog,
            executor: StepExecutor::new(),
        };

        async {
            info!(sink = %self.config.sink(), analyze = self.config.analyze(), "Starting extraction");
            run.preflight().await?;

            let (account, repositories) =
                try_join(run.fetch_account(), run.fetch_repositories()).await?;

            let (analysis, (sink, sink_files)) = try_join(
                run.analyze(&account, &repositories),
                run.deliver(&account, &repositories),
            )
            .await?;

            let mut files = sink_files;
            let (repositories, metrics) = match analysis {
                Some(analysis) => {
                    files.extend(analysis.files);
                    (analysis.repositories, Some(analysis.metrics))
                }
                None => (repositories, None),
            };

            info!(
                repositories = repositories.len(),
                files = files.len(),
                "Extraction completed"
            );
            Ok(RunReport {
                workflow_id: workflow_id.clone(),
                identifier: identifier.to_string(),
                account,
                repositories,
                metrics,
                sink,
                files,
                steps: run.executor.history(),
            })
        }
        .instrument(span)
        .await
    }
}

/// State of a single execution of a [`Pipeline`].
struct Run<'a> {
    pipeline: &'a Pipeline,
    identifier: &'a str,
    catalog: Option<&'a dyn CatalogClient>,
    executor: StepExecutor,
}

impl Run<'_> {
    fn options(&self, name: &str, timeout: Duration) -> StepOptions {
        let config = &self.pipeline.config;
        StepOptions::new(name, timeout)
            .with_retry(config.retry_policy().clone())
            .with_heartbeat_interval(config.heartbeat_interval())
    }

    /// Validates credentials and identifier with a throwaway account fetch.
    async fn preflight(&self) -> Result<(), PipelineError> {
        let options = self.options(steps::PREFLIGHT, PREFLIGHT_TIMEOUT);
        self.executor
            .execute(&options, || self.pipeline.source.fetch_account(self.identifier))
            .await?;
        Ok(())
    }

    async fn fetch_account(&self) -> Result<AccountMetadata, PipelineError> {
        let options = self.options(steps::FETCH_ACCOUNT, FETCH_TIMEOUT);
        Ok(self
            .executor
            .execute(&options, || self.pipeline.source.fetch_account(self.identifier))
            .await?)
    }

    async fn fetch_repositories(&self) -> Result<Vec<RepositoryMetadata>, PipelineError> {
        let options = self.options(steps::FETCH_REPOSITORIES, FETCH_TIMEOUT);
        Ok(self
            .executor
            .execute(&options, || {
                self.pipeline.source.fetch_repositories(self.identifier)
            })
            .await?)
    }

    /// Enriches repositories, computes metrics and, for the files sink,
    /// writes both. Returns `None` when analysis is disabled.
    async fn analyze(
        &self,
        account: &AccountMetadata,
        repositories: &[RepositoryMetadata],
    ) -> Result<Option<Analysis>, PipelineError> {
        if !self.pipeline.config.analyze() {
            return Ok(None);
        }

        let options = self.options(steps::EXTRACT_KEYWORDS, ANALYSIS_TIMEOUT);
        let enriched = self
            .executor
            .execute(&options, || {
                let repositories = repositories.to_vec();
                let extractor = Arc::clone(&self.pipeline.extractor);
                tokio::task::spawn_blocking(move || enrich(repositories, extractor.as_ref()))
            })
            .await?;

        let options = self.options(steps::COMPUTE_METRICS, ANALYSIS_TIMEOUT);
        let metrics = self
            .executor
            .execute(&options, || async {
                Ok::<_, Infallible>(QualityMetrics::compute(account, &enriched))
            })
            .await?;

        let mut files = Vec::new();
        if self.pipeline.config.sink() == SinkKind::Files {
            let sink = FileSink::new(self.pipeline.config.output_dir());
            let options = self.options(steps::WRITE_ANALYSIS, WRITE_TIMEOUT);
            files = self
                .executor
                .execute(&options, || async {
                    sink.write_analysis(self.identifier, &enriched, &metrics)
                })
                .await?;
        }

        Ok(Some(Analysis {
            repositories: enriched,
            metrics,
            files,
        }))
    }

    /// Delivers the fetched data to the configured sink.
    async fn deliver(
        &self,
        account: &AccountMetadata,
        repositories: &[RepositoryMetadata],
    ) -> Result<(SinkOutcome, Vec<PathBuf>), PipelineError> {
        let config = &self.pipeline.config;
        match (config.sink(), self.catalog) {
            (SinkKind::Files, _) => {
                let sink = FileSink::new(config.output_dir());
                let options = self.options(steps::WRITE_OUTPUT, WRITE_TIMEOUT);
                let paths = self
                    .executor
                    .execute(&options, || async {
                        sink.write_fetched(self.identifier, account, repositories)
                    })
                    .await?;
                Ok((SinkOutcome::Files { paths: paths.clone() }, paths))
            }
            (SinkKind::Catalog, Some(catalog)) => {
                let options = self.options(steps::TRANSFORM, TRANSFORM_TIMEOUT);
                let assets = self
                    .executor
                    .execute(&options, || async {
                        Ok::<_, Infallible>(transform(
                            Some(account),
                            repositories,
                            config.connection_name(),
                            config.connection_qualified_name(),
                        ))
                    })
                    .await?;

                let options = self.options(steps::UPLOAD, UPLOAD_TIMEOUT);
                let summary = self
                    .executor
                    .execute(&options, || async {
                        catalog
                            .save_assets(&assets, true)
                            .await
                            .map_err(SinkError::from)
                    })
                    .await?;

                Ok((
                    SinkOutcome::Catalog {
                        assets: assets.len(),
                        created: summary.created_count,
                    },
                    Vec::new(),
                ))
            }
            (SinkKind::Catalog, None) => Err(PipelineError::Configuration(
                "the catalog sink requires a catalog client".to_string(),
            )),
            (SinkKind::None, _) => Ok((SinkOutcome::None, Vec::new())),
        }
    }
}
