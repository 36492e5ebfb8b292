use std::path::{Path, PathBuf};

use anyhow::Context;
use colored::Colorize;

use crate::batch::{collect_documents, process_batch};
use crate::report;

pub fn run(
    paths: &[String],
    output: &str,
    threads: usize,
    config_path: Option<&str>,
) -> anyhow::Result<()> {
    let pipeline = super::build_pipeline(config_path)?;
    let paths: Vec<PathBuf> = paths.iter().map(PathBuf::from).collect();
    let files = collect_documents(&paths)?;
    println!("Processing {} document(s)...", files.len());

    let outcome = process_batch(&pipeline, &files, threads, |result| {
        if result.success {
            println!(
                "  {} {} ({} transactions)",
                "ok".green(),
                result.source_file,
                result.transactions.len()
            );
        } else {
            println!(
                "  {} {} — {}",
                "failed".red(),
                result.source_file,
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    })?;

    let out_dir = Path::new(output);
    std::fs::create_dir_all(out_dir).with_context(|| format!("creating {output}"))?;
    for (period, rows) in &outcome.by_period {
        let path = out_dir.join(format!("notas_{period}.csv"));
        report::write_csv(&path, rows).with_context(|| format!("writing {}", path.display()))?;
        println!("Wrote {} ({} rows)", path.display(), rows.len());
    }

    println!();
    let failures = outcome.failures();
    let summary = format!(
        "{} document(s), {} transaction(s), {} failure(s)",
        outcome.results.len(),
        outcome.total_transactions(),
        failures
    );
    if failures > 0 {
        println!("{}", summary.yellow());
    } else {
        println!("{}", summary.green());
    }
    Ok(())
}
