// Purpose: Provides the entry point for the banker-sim CLI.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Diagnostics go to stderr; stdout carries the outcome lines and report.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "banker_simulation=info,banker_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Run the CLI
    banker_simulation::cli::run().await
}
