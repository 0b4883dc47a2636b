//! CLI for the GitHub Metadata Extractor.
//!
//! Runs a single extraction in the foreground, or serves the HTTP trigger
//! that starts extractions in the background.

use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use github_metadata_extractor::{
    serve, AppState, CredentialSource, EnvSecretStore, Pipeline, PipelineConfig, PipelineError,
    RunReport, SecretStore, Settings, SinkKind, SinkOutcome,
};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// GitHub Metadata Extractor - Extract account and repository metadata from GitHub.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a settings file (extractor.toml).
    #[arg(long, global = true, env = "EXTRACTOR_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one extraction and wait for it to finish.
    Run(RunArgs),
    /// Serve the HTTP trigger.
    Serve(ServeArgs),
}

#[derive(ClapArgs, Debug)]
struct RunArgs {
    /// GitHub user or organization to extract.
    #[arg(long, env = "GITHUB_USERNAME")]
    identifier: String,

    /// GitHub Personal Access Token.
    #[arg(long, env = "GITHUB_PAT", hide_env_values = true)]
    token: Option<String>,

    /// Secret reference resolving to the token, looked up in the environment.
    #[arg(long, conflicts_with = "token")]
    credential_reference: Option<String>,

    /// Where to deliver the output.
    #[arg(long, value_enum, default_value_t = SinkArg::Files)]
    sink: SinkArg,

    /// Skip keyword enrichment and quality metrics.
    #[arg(long)]
    skip_analysis: bool,

    /// Directory for output files. Overrides the settings file.
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

#[derive(ClapArgs, Debug)]
struct ServeArgs {
    /// Address to listen on.
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    host: IpAddr,

    /// Port to listen on.
    #[arg(long, default_value_t = 8000)]
    port: u16,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum SinkArg {
    Files,
    Catalog,
    None,
}

impl From<SinkArg> for SinkKind {
    fn from(sink: SinkArg) -> Self {
        match sink {
            SinkArg::Files => SinkKind::Files,
            SinkArg::Catalog => SinkKind::Catalog,
            SinkArg::None => SinkKind::None,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    install_crypto_provider();

    let args = Args::parse();

    let settings = match Settings::load_or_default(args.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            error!(error = %e, "Failed to load settings");
            return ExitCode::from(2);
        }
    };

    match args.command {
        Command::Run(run_args) => run(run_args, settings).await,
        Command::Serve(serve_args) => serve_trigger(serve_args, settings).await,
    }
}

/// Initializes tracing with environment filter support.
///
/// Sets up the global tracing subscriber with:
/// - Compact log formatting (single-line output)
/// - Log level filtering via `RUST_LOG` env var (defaults to "info")
fn init_tracing() {
    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_target(false))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

fn install_crypto_provider() {
    // Fails only if a provider is already installed.
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();
}

/// Runs one extraction and maps its outcome to an exit code.
async fn run(args: RunArgs, settings: Settings) -> ExitCode {
    let credential = match (args.token, args.credential_reference) {
        (Some(token), _) if !token.is_empty() => CredentialSource::Token(token),
        (_, Some(reference)) => CredentialSource::Reference(reference),
        _ => CredentialSource::None,
    };

    let mut config = PipelineConfig::from_settings(args.identifier, &settings)
        .with_sink(args.sink.into())
        .with_analysis(!args.skip_analysis);
    if let Some(output_dir) = args.output_dir {
        config = config.with_output_dir(output_dir);
    }

    let secrets: Arc<dyn SecretStore> = Arc::new(EnvSecretStore::new());
    let pipeline = match Pipeline::from_settings(config, credential, &settings, secrets) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            error!(error = %e, "Critical failure");
            return ExitCode::from(2);
        }
    };

    match pipeline.run().await {
        Ok(report) => {
            print_summary(&report);
            ExitCode::from(0)
        }
        Err(e @ PipelineError::Configuration(_)) => {
            error!(error = %e, "Critical failure");
            ExitCode::from(2)
        }
        Err(e) => {
            error!(error = %e, "Extraction failed");
            ExitCode::from(1)
        }
    }
}

async fn serve_trigger(args: ServeArgs, settings: Settings) -> ExitCode {
    let state = AppState::new(settings, Arc::new(EnvSecretStore::new()));
    match serve(SocketAddr::new(args.host, args.port), state).await {
        Ok(()) => ExitCode::from(0),
        Err(e) => {
            error!(error = %e, "Critical failure");
            ExitCode::from(2)
        }
    }
}

/// Prints the final run summary.
fn print_summary(report: &RunReport) {
    println!("\nSummary:");
    println!("  Workflow: {}", report.workflow_id);
    println!("  Account: {}", report.account.name);
    println!("  Repositories: {}", report.repositories.len());

    if let Some(metrics) = &report.metrics {
        println!(
            "  Average stars per repository: {:.2}",
            metrics.average_stars_per_repo
        );
        println!(
            "  Repositories with description: {:.1}%",
            metrics.repos_with_description_percentage
        );
        println!(
            "  Repositories with tags: {:.1}%",
            metrics.repos_with_auto_tags_percentage
        );
    }

    match &report.sink {
        SinkOutcome::Files { .. } => {
            for file in &report.files {
                println!("  Wrote: {}", file.display());
            }
        }
        SinkOutcome::Catalog { assets, created } => {
            println!("  Catalog assets uploaded: {assets} ({created} created)");
        }
        SinkOutcome::None => {}
    }

    let attempts: u32 = report.steps.iter().map(|s| s.attempts).sum();
    println!("  Steps: {} ({} attempts)", report.steps.len(), attempts);
}
