///
/// This module implements the CLI interface for notion-mirror: command parsing,
/// argument validation and the async entrypoint used by `main` and the tests.
///
/// All pipeline logic (walking, layout, image caching, rendering) lives in the
/// [`notion-mirror-core`] crate. This module only loads configuration, builds the
/// concrete Notion and HTTP clients, and reports the outcome.
///
/// ## How To Use
/// - From the shell: `notion-mirror pull --config mirror.yaml`, with `NOTION_TOKEN`
///   set in the environment or a `.env` file.
/// - Programmatically: call [`run`] with a constructed [`Cli`].
///
/// [`notion-mirror-core`]: ../../notion-mirror-core/
use crate::load_config::load_config;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use notion_mirror_core::markdown::MarkdownRenderer;
use notion_mirror_core::notion::{HttpAssetSource, NotionClient};
use notion_mirror_core::pull::{pull, PullReport};
use std::path::PathBuf;
use std::sync::Arc;

/// CLI for notion-mirror: mirror a Notion outline into markdown.
#[derive(Parser)]
#[clap(
    name = "notion-mirror",
    version,
    about = "Mirror a Notion page outline into a markdown tree with cached images"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Pull the configured outline into the markdown and image directories
    Pull {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
    },
}

/// Async CLI entrypoint for main() and integration tests.
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Pull { config } => {
            let config = load_config(config)?;
            tracing::info!(command = "pull", root_page = %config.pull.root_page, "Starting pull");

            let api = NotionClient::new_from_env().context("Failed to construct Notion client")?;
            let report = pull(
                &config.pull,
                Arc::new(api),
                Arc::new(HttpAssetSource::new()),
                Arc::new(MarkdownRenderer::new()),
            )
            .await;

            match report {
                Ok(report) => {
                    tracing::info!(command = "pull", ?report, "Pull complete");
                    println!("{}", summary(&report));
                    Ok(())
                }
                Err(e) => {
                    tracing::error!(command = "pull", error = %e, "Pull failed");
                    Err(anyhow::Error::new(e).context("Pull failed"))
                }
            }
        }
    }
}

/// One-line, human-readable outcome of a pull.
pub fn summary(report: &PullReport) -> String {
    format!(
        "Pull complete: {} pages written, {} skipped, {} images downloaded ({} failed), {} markdown files and {} images removed",
        report.pages_written.len(),
        report.pages_skipped.len(),
        report.images_downloaded,
        report.image_failures,
        report.markdown_removed.len(),
        report.images_removed.len(),
    )
}
