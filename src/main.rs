//! # lexalign CLI
//!
//! Batch driver for the cross-referencing pipeline. It iterates the
//! declared mapping tasks (draft vs. current law), writes one JSON mapping
//! file per task into the configured output directory, and continues to
//! the next task when one task's inputs are missing.
//!
//! ## Usage
//!
//! ```bash
//! lexalign --config ./config/lexalign.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `lexalign run` | Execute all mapping tasks and write their outputs |
//! | `lexalign run --task NAME` | Execute a single task |
//! | `lexalign tasks` | List declared tasks and their input files |

mod config;
mod embedding;
mod loader;
mod matcher;
mod models;
mod progress;
mod reconstruct;
mod similarity;
mod tasks;
mod transform;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// lexalign — semantic cross-referencing of draft legislation against
/// current law.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/lexalign.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "lexalign",
    about = "Semantic cross-referencing of draft legislation against current law",
    version,
    long_about = "lexalign reconstructs the full text of each structural unit (article, \
    provision) from a paragraph store, embeds both corpora through an OpenAI-compatible \
    endpoint, and computes threshold-filtered similarity matches at article and paragraph \
    level, writing one JSON mapping file per task."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/lexalign.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Run the mapping tasks.
    ///
    /// Loads each task's inputs, computes the cross-reference matches, and
    /// writes `{task}.json` (plus `{task}_paragraphs.json` for the
    /// article-level task) into the output directory. Tasks with missing
    /// inputs are skipped with a warning.
    Run {
        /// Only run the task with this name (see `lexalign tasks`).
        #[arg(long)]
        task: Option<String>,

        /// Progress reporting on stderr: `off`, `human`, or `json`.
        /// Defaults to `human` when stderr is a TTY.
        #[arg(long)]
        progress: Option<String>,
    },

    /// List the declared mapping tasks.
    ///
    /// Shows each task's reconstruction modes, input files, and the output
    /// files it writes.
    Tasks,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Run { task, progress } => {
            let mode = match progress.as_deref() {
                Some(value) => progress::ProgressMode::parse(value).ok_or_else(|| {
                    anyhow::anyhow!("Invalid --progress value '{}': use off, human, or json", value)
                })?,
                None => progress::ProgressMode::default_for_tty(),
            };

            if !cfg.embedding.is_enabled() {
                eprintln!(
                    "Warning: embedding provider is disabled; all similarities will be zero"
                );
            }

            let provider = embedding::create_provider(&cfg.embedding)?;
            tasks::run_all(&cfg, provider.as_ref(), task.as_deref(), mode).await?;
        }
        Commands::Tasks => {
            tasks::list_tasks(&cfg);
        }
    }

    Ok(())
}
