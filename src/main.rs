//! pullrequestd - caches DependsOn links between GitHub pull requests.
//!
//! Loads the open pull requests of the configured repositories at startup,
//! keeps the cache current from webhooks, and triggers Jenkins jobs when a
//! pull request's dependencies are edited.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pullrequestd::bootstrap::bootstrap;
use pullrequestd::cache::DependencyCache;
use pullrequestd::config::Config;
use pullrequestd::github::GitHubClient;
use pullrequestd::ingest::Ingest;
use pullrequestd::jenkins::{JenkinsClient, JobTrigger};
use pullrequestd::server::{AppState, build_router};

/// Tiny API to store GitHub pull request dependencies.
#[derive(Parser)]
#[command(name = "pullrequestd")]
#[command(about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Starts the API
    Start {
        /// Config file
        #[arg(short, long, value_parser = existing_file)]
        config: PathBuf,
    },

    /// Prints version
    Version,
}

fn existing_file(value: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(value);
    if path.is_file() {
        Ok(path)
    } else {
        Err(format!("{} does not exist", value))
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            ExitCode::SUCCESS
        }
        Commands::Start { config } => {
            init_tracing();
            match start(&config) {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    error!("{:#}", e);
                    ExitCode::FAILURE
                }
            }
        }
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pullrequestd=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn start(config_path: &Path) -> anyhow::Result<()> {
    let config = Config::load(config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    let filter = config.repository_filter()?;
    let addr = config.listen_addr()?;
    let cache = DependencyCache::new();

    if let Some(depends_on) = &config.pull_request_depends_on {
        let github = GitHubClient::from_token(
            config.token.as_str(),
            depends_on.owner.as_str(),
            depends_on.organization,
        )
        .context("building GitHub client")?;
        let report = bootstrap(&github, &filter, &cache)
            .await
            .context("loading open pull requests")?;
        info!(
            repositories = report.repositories.len(),
            pull_requests = report.pull_requests,
            dependencies = report.dependencies,
            "Bootstrap complete"
        );
    }

    let jenkins = JenkinsClient::new(
        config.jenkins.base_url.as_str(),
        config.jenkins.user.as_str(),
        config.jenkins.token.as_str(),
    )
    .context("building Jenkins client")?;
    let trigger = JobTrigger::new(jenkins, config.jenkins.endpoints.clone());
    let ingest = Ingest::new(cache, filter, trigger);
    let app = build_router(AppState::new(
        ingest,
        config.webhook_secret(),
        config.api_token(),
    ));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!("Starting daemon listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
