use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::NaiveDate;
use rayon::prelude::*;

use crate::adapter;
use crate::error::{NotaError, Result};
use crate::models::ExtractionResult;
use crate::pipeline::NotePipeline;
use crate::report::{export_rows, ExportRow};

pub struct BatchOutcome {
    pub results: Vec<ExtractionResult>,
    /// Export rows grouped by the trade date's YYYY-MM.
    pub by_period: BTreeMap<String, Vec<ExportRow>>,
}

impl BatchOutcome {
    pub fn failures(&self) -> usize {
        self.results.iter().filter(|r| !r.success).count()
    }

    pub fn total_transactions(&self) -> usize {
        self.results.iter().map(|r| r.transactions.len()).sum()
    }
}

/// Expand directories into their .txt/.json documents; explicit file paths
/// are taken as-is so unsupported ones surface as per-document failures.
pub fn collect_documents(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut entries: Vec<PathBuf> = std::fs::read_dir(path)?
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.path())
                .filter(|p| {
                    matches!(
                        p.extension().and_then(|e| e.to_str()),
                        Some("txt") | Some("text") | Some("json")
                    )
                })
                .collect();
            entries.sort();
            files.extend(entries);
        } else {
            files.push(path.clone());
        }
    }
    if files.is_empty() {
        return Err(NotaError::Other(
            "no .txt or .json documents to process".to_string(),
        ));
    }
    Ok(files)
}

/// Aggregation key: the trade date's year-month. Undated notes fall back to
/// the current month, the one wall-clock dependence in the crate.
pub fn period_key(trade_date: Option<&str>) -> String {
    if let Some(raw) = trade_date {
        if let Ok(date) = NaiveDate::parse_from_str(raw, "%d/%m/%Y") {
            return date.format("%Y-%m").to_string();
        }
    }
    chrono::Local::now().format("%Y-%m").to_string()
}

/// Run the pipeline over many documents on a bounded worker pool
/// (`threads` 0 = auto). Failures are isolated per document: an unreadable
/// dump yields a failed result and the batch continues. `progress` is
/// invoked from worker threads as each document completes.
pub fn process_batch<F>(
    pipeline: &NotePipeline,
    files: &[PathBuf],
    threads: usize,
    progress: F,
) -> Result<BatchOutcome>
where
    F: Fn(&ExtractionResult) + Sync,
{
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|e| NotaError::Other(format!("worker pool: {e}")))?;

    let results: Vec<ExtractionResult> = pool.install(|| {
        files
            .par_iter()
            .map(|path| {
                let result = match adapter::load_document(path) {
                    Ok(doc) => pipeline.extract(&doc),
                    Err(err) => {
                        let name = path
                            .file_name()
                            .and_then(|n| n.to_str())
                            .map(|n| n.to_string())
                            .unwrap_or_else(|| path.display().to_string());
                        ExtractionResult::failure(name, err.to_string())
                    }
                };
                progress(&result);
                result
            })
            .collect()
    });

    // The merge into the shared per-period aggregate is the single
    // synchronization point, after the parallel phase.
    let mut by_period: BTreeMap<String, Vec<ExportRow>> = BTreeMap::new();
    for result in &results {
        let key = period_key(result.metadata.trade_date.as_deref());
        for row in export_rows(result) {
            by_period.entry(key.clone()).or_default().push(row);
        }
    }

    Ok(BatchOutcome { results, by_period })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExtractorConfig;

    #[test]
    fn test_period_key_from_trade_date() {
        assert_eq!(period_key(Some("02/04/2025")), "2025-04");
        assert_eq!(period_key(Some("31/12/2024")), "2024-12");
    }

    #[test]
    fn test_collect_documents_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.txt"), "x").unwrap();
        std::fs::write(dir.path().join("a.json"), "{}").unwrap();
        std::fs::write(dir.path().join("ignore.pdf"), "x").unwrap();
        let files = collect_documents(&[dir.path().to_path_buf()]).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a.json", "b.txt"]);
    }

    #[test]
    fn test_collect_documents_empty_dir_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(collect_documents(&[dir.path().to_path_buf()]).is_err());
    }

    #[test]
    fn test_batch_isolates_failures() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("123_20250402_nota.txt");
        std::fs::write(&good, "Nr. nota: 123\nData pregão: 02/04/2025\nC VISTA PETR4 100 28,50 2850,00").unwrap();
        let bad = dir.path().join("quebrada.json");
        std::fs::write(&bad, "{not json").unwrap();

        let pipeline = NotePipeline::new(&ExtractorConfig::default()).unwrap();
        let outcome =
            process_batch(&pipeline, &[good, bad], 1, |_| {}).unwrap();

        assert_eq!(outcome.results.len(), 2);
        assert_eq!(outcome.failures(), 1);
        let failed = outcome.results.iter().find(|r| !r.success).unwrap();
        assert_eq!(failed.source_file, "quebrada.json");
        assert!(failed.error.is_some());

        // The good document still landed in its period bucket.
        let rows = outcome.by_period.get("2025-04").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].ticker, "PETR4");
    }
}
