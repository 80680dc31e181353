//! Autograder - Application Entry Point

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use autograder::{cli::Cli, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so notification messages on stdout stay clean
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "autograder=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::from_env()?;
    tracing::debug!(
        course_dir = %config.paths.course_dir.display(),
        support_dir = %config.paths.support_dir.display(),
        results_dir = %config.paths.results_dir.display(),
        "Configuration loaded"
    );

    if let Err(e) = autograder::cli::run(cli, config).await {
        tracing::error!(error = %format!("{:#}", e), "Run failed");
        return Err(e);
    }
    Ok(())
}
