#![doc = include_str!(concat!("../", env!("CARGO_PKG_README")))]

pub mod catalog;
pub mod client;
pub mod config;
pub mod enrich;
pub mod metrics;
pub mod pipeline;
pub mod secrets;
pub mod server;
pub mod sink;
pub mod workflow;

pub use catalog::{
    transform, CatalogAsset, CatalogClient, CatalogError, Connection, Folder, HttpCatalogClient,
    UploadSummary,
};
pub use client::{
    is_valid_login, AccountMetadata, ClientError, GitHubClient, MetadataSource,
    RepositoryMetadata, MAX_LOGIN_LENGTH, REPOSITORIES_PER_PAGE,
};
pub use config::{load_settings, ConfigError, Settings};
pub use enrich::{enrich, KeywordExtractor, RakeExtractor, ScoredKeyword, MAX_KEYWORDS};
pub use metrics::QualityMetrics;
pub use pipeline::{Pipeline, PipelineConfig, PipelineError, RunReport};
pub use secrets::{
    CredentialSource, Credentials, EnvSecretStore, SecretError, SecretStore, StaticSecretStore,
};
pub use server::{router, serve, AppState, RunRegistry, RunStatus, ServerError};
pub use sink::{FileSink, SinkError, SinkKind, SinkOutcome};
pub use workflow::{
    RetryPolicy, Retryable, StepError, StepExecutor, StepOptions, StepRecord, StepStatus,
};
