//! CLI glue for wiki-pdf: command parsing, identity resolution, wiring the
//! CLI-backed collaborators into the core pipeline, and user-visible output.
//!
//! All pipeline logic lives in `wiki-pdf-core`; this module only orchestrates.
//! [`run`] is the entrypoint for both `main()` and integration tests.

use crate::load_config::{load_config, Overrides};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use wiki_pdf_core::assemble::PandocConverter;
use wiki_pdf_core::config::DocumentKind;
use wiki_pdf_core::directory::{CliSecretStore, Identity};
use wiki_pdf_core::pipeline::{run_pipeline, RefreshOutcome};
use wiki_pdf_core::refresh::GitRefresher;
use wiki_pdf_core::sidebar::parse_sidebar;

/// Environment variable overriding the detected home directory.
pub const HOME_ENV: &str = "WIKI_PDF_HOME";

/// CLI for wiki-pdf: render a wiki or codebase checkout into one PDF.
#[derive(Parser)]
#[clap(
    name = "wiki-pdf",
    version,
    about = "Render a wiki or codebase checkout into a single PDF ordered by its sidebar"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Pull the wiki and render the pages listed in its sidebar
    Wiki(RenderArgs),
    /// Pull the codebase and render the files listed in its manifest
    Codebase(RenderArgs),
    /// Print the page order a manifest defines, one file per line
    Order {
        /// Directory containing the manifest
        dir: PathBuf,
        #[clap(long, default_value = "_Sidebar.md")]
        manifest: String,
        /// Appended to every link target
        #[clap(long, default_value = ".md")]
        extension: String,
    },
}

#[derive(Args, Debug, Clone)]
pub struct RenderArgs {
    /// Path to the YAML config file
    #[clap(long)]
    pub config: PathBuf,
    /// Render the local copy without running `git pull`
    #[clap(long)]
    pub no_pull: bool,
    /// Label of the secret note field to use instead of the account name
    #[clap(long)]
    pub profile: Option<String>,
}

/// Home directory from `WIKI_PDF_HOME`, else the platform's notion of home.
pub fn resolve_identity() -> Result<Identity> {
    if let Some(home) = std::env::var_os(HOME_ENV) {
        return Ok(Identity::new(PathBuf::from(home)));
    }
    let dirs = directories::BaseDirs::new().context("cannot determine the home directory")?;
    Ok(Identity::new(dirs.home_dir()))
}

async fn render(kind: DocumentKind, args: RenderArgs) -> Result<()> {
    let config = load_config(&args.config)?;
    let overrides = Overrides {
        field_label: args.profile.clone(),
        no_pull: args.no_pull,
    };
    let pipeline_config = config.pipeline_config(kind, &overrides);
    pipeline_config.trace_loaded();

    let identity = resolve_identity()?;
    tracing::info!(home = %identity.home_dir().display(), "Resolved identity");

    let store = CliSecretStore::new(config.secret.tool.clone());
    let refresher = GitRefresher::new(config.git.clone());
    let converter = PandocConverter::from_config(&pipeline_config.converter);

    match run_pipeline(&pipeline_config, &identity, &store, &refresher, &converter).await {
        Ok(report) => {
            if let RefreshOutcome::Failed(reason) = &report.refresh {
                eprintln!("[WARN] git pull failed, rendered the local copy: {reason}");
            }
            println!(
                "Wrote {} ({} pages)",
                report.output.display(),
                report.pages.len()
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!(
                error = %e,
                missing_input = e.is_missing_input(),
                "Pipeline failed"
            );
            if e.is_missing_input() {
                Err(anyhow::Error::new(e).context("document assembly stopped on a missing input file"))
            } else {
                Err(anyhow::Error::new(e).context("document assembly failed"))
            }
        }
    }
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("run_started");

    match cli.command {
        Commands::Wiki(args) => {
            tracing::info!(command = "wiki", "Starting wiki render");
            render(DocumentKind::Wiki, args).await
        }
        Commands::Codebase(args) => {
            tracing::info!(command = "codebase", "Starting codebase render");
            render(DocumentKind::Codebase, args).await
        }
        Commands::Order {
            dir,
            manifest,
            extension,
        } => {
            let pages = parse_sidebar(&dir, &manifest, &extension)?;
            for page in pages {
                println!("{page}");
            }
            Ok(())
        }
    }
}
