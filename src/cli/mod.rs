pub mod batch;
pub mod config;
pub mod extract;
pub mod inspect;

use std::path::Path;

use clap::{Parser, Subcommand};

use crate::config::ExtractorConfig;
use crate::pipeline::NotePipeline;

#[derive(Parser)]
#[command(
    name = "corretagem",
    about = "Extract trades, fees and metadata from brokerage settlement note dumps."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract a single note and print transactions, fees and summary.
    Extract {
        /// Path to a .txt or .json document dump
        file: String,
        /// Emit the full extraction result as JSON
        #[arg(long)]
        json: bool,
        /// Pattern configuration file (default: built-in tables)
        #[arg(long)]
        config: Option<String>,
    },
    /// Process folders/files of note dumps and write per-month CSV reports.
    Batch {
        /// Folders or files to process
        #[arg(required = true)]
        paths: Vec<String>,
        /// Output directory for per-month CSV files
        #[arg(long, default_value = "relatorio-notas")]
        output: String,
        /// Worker threads (0 = one per CPU core)
        #[arg(long, default_value_t = 0)]
        threads: usize,
        /// Pattern configuration file (default: built-in tables)
        #[arg(long)]
        config: Option<String>,
    },
    /// Show how a document dump is read: pages, tables, classification.
    Inspect {
        /// Path to a .txt or .json document dump
        file: String,
        /// Pattern configuration file (default: built-in tables)
        #[arg(long)]
        config: Option<String>,
    },
    /// Manage the extraction pattern tables.
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Write the built-in pattern tables as editable JSON.
    Export {
        /// Destination file (default: stdout)
        #[arg(long)]
        output: Option<String>,
    },
    /// Show where the user pattern file is looked up.
    Path,
}

pub(crate) fn build_pipeline(config_path: Option<&str>) -> anyhow::Result<NotePipeline> {
    let config = ExtractorConfig::load_or_default(config_path.map(Path::new))?;
    Ok(NotePipeline::new(&config)?)
}
