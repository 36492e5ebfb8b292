mod adapter;
mod batch;
mod broker;
mod cascade;
mod cli;
mod config;
mod error;
mod fees;
mod futures;
mod metadata;
mod models;
mod money;
mod pipeline;
mod report;
mod table;

use clap::Parser;

use cli::{Cli, Commands, ConfigCommands};

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Extract { file, json, config } => {
            cli::extract::run(&file, json, config.as_deref())
        }
        Commands::Batch {
            paths,
            output,
            threads,
            config,
        } => cli::batch::run(&paths, &output, threads, config.as_deref()),
        Commands::Inspect { file, config } => cli::inspect::run(&file, config.as_deref()),
        Commands::Config { command } => match command {
            ConfigCommands::Export { output } => cli::config::export(output.as_deref()),
            ConfigCommands::Path => cli::config::path(),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
