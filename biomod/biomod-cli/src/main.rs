//! biomake: anthropometric body snapshot to bioMod.
//!
//! # Commands
//!
//! - `biomake build --body <snapshot.json>` - Render the bioMod document
//! - `biomake check --body <snapshot.json>` - Build and validate without writing
//! - `biomake segments` - List the segments of the configured layout
//!
//! Every command takes `--config <file>` (TOML or JSON) with per-segment
//! options and the whole-body `Human` table.

mod config;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use biomod_build::{assemble, Configuration, TreeLayout, ROOT_SENTINEL};

/// Convert a human body model into a bioMod kinematic tree
#[derive(Parser, Debug)]
#[command(name = "biomake")]
#[command(version, about = "Human body model to bioMod converter", long_about = None)]
struct Cli {
    /// Logging verbosity level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render the bioMod document
    Build {
        /// Body snapshot (JSON)
        #[arg(short, long)]
        body: PathBuf,

        /// Segment and model options (TOML or JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Build and validate the tree without writing it
    Check {
        /// Body snapshot (JSON)
        #[arg(short, long)]
        body: PathBuf,

        /// Segment and model options (TOML or JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// List the segments of the configured layout
    Segments {
        /// Segment and model options (TOML or JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(parse_level(&cli.log_level))
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Build {
            body,
            config,
            output,
        } => build(&body, config.as_deref(), output.as_deref()),
        Commands::Check { body, config } => check(&body, config.as_deref()),
        Commands::Segments { config } => segments(config.as_deref()),
    }
}

fn build(body: &Path, config: Option<&Path>, output: Option<&Path>) -> Result<()> {
    let config = config::load_config(config)?;
    let body = config::load_body(body)?;
    let document = assemble(&body, &config).context("failed to build the kinematic tree")?;
    let text = document.to_string();

    match output {
        Some(path) => {
            write_document(path, &text)?;
            info!(path = %path.display(), segments = document.segments.len(), "wrote bioMod");
        }
        None => print!("{text}"),
    }
    Ok(())
}

/// Write `text` next to `path` first, then rename it into place, so a failed
/// write never leaves a truncated document at `path`.
fn write_document(path: &Path, text: &str) -> Result<()> {
    let mut staging = path.as_os_str().to_owned();
    staging.push(".tmp");
    let staging = PathBuf::from(staging);

    std::fs::write(&staging, text)
        .with_context(|| format!("failed to write {}", staging.display()))?;
    if let Err(err) = std::fs::rename(&staging, path) {
        let _ = std::fs::remove_file(&staging);
        return Err(err).with_context(|| format!("failed to write {}", path.display()));
    }
    Ok(())
}

fn check(body: &Path, config: Option<&Path>) -> Result<()> {
    let config = config::load_config(config)?;
    let body = config::load_body(body)?;
    let document = assemble(&body, &config).context("failed to build the kinematic tree")?;
    println!(
        "ok: {} segments, total mass {} kg",
        document.segments.len(),
        document.total_mass()
    );
    Ok(())
}

fn segments(config: Option<&Path>) -> Result<()> {
    let config: Configuration = config::load_config(config)?;
    let layout = TreeLayout::from(&config.model);
    // Validates the options the same way `build` does.
    let resolved = config.resolve(&layout.segments())?;
    for (kind, options) in resolved {
        let parent = kind
            .parent()
            .map_or_else(|| ROOT_SENTINEL.to_string(), |p| p.label());
        println!(
            "{:<22} {:<18} translations={:<3} rotations={}",
            kind.label(),
            parent,
            options.translations.to_string(),
            options.rotations.to_string()
        );
    }
    Ok(())
}
