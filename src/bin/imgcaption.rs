use anyhow::Context as _;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use imgcaption::config::{ConfigOverrides, ServiceConfig};

#[derive(Parser, Debug)]
#[command(name = "imgcaption", version, about = "Image caption and upload HTTP service")]
struct Cli {
    #[command(flatten)]
    overrides: ConfigOverrides,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match dotenv {
        Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!(error = %e, "could not read .env"),
    }

    let cli = Cli::parse();
    let config = ServiceConfig::from_env()
        .context("read configuration from environment")?
        .with_overrides(cli.overrides);
    tracing::info!(
        font_path = %config.font_path.display(),
        image_dir = %config.image_dir.display(),
        public_dir = %config.public_dir.display(),
        "starting imgcaption"
    );

    imgcaption::server::serve(config).await
}
