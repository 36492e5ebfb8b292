use std::path::Path;

use crate::adapter;
use crate::broker::identify_broker;
use crate::table::{classify_tables, locate_columns};

pub fn run(file: &str, config_path: Option<&str>) -> anyhow::Result<()> {
    let pipeline = super::build_pipeline(config_path)?;
    let cfg = pipeline.config();
    let doc = adapter::load_document(Path::new(file))?;
    let text = doc.full_text();

    println!("File:    {}", doc.file_name);
    println!(
        "Pages:   {} ({} with text)",
        doc.pages.len(),
        doc.pages.iter().filter(|p| !p.trim().is_empty()).count()
    );
    println!("Tables:  {}", doc.tables.len());
    println!("Broker:  {}", identify_broker(&text, cfg));
    println!();

    let classified = classify_tables(&doc.tables, cfg);
    if classified.is_empty() {
        println!("No usable tables; extraction will rely on the text cascade.");
        return Ok(());
    }
    for (i, table) in classified.iter().enumerate() {
        let verdict = if table.looks_like_transactions {
            "transaction table"
        } else {
            "skipped (no transaction header)"
        };
        println!("Table {} — {} row(s): {}", i + 1, table.rows.len(), verdict);
        println!("  header: {}", table.header_text);
        if table.looks_like_transactions {
            let cols = locate_columns(&table.header, &cfg.columns);
            println!(
                "  columns: type={:?} asset={:?} qty={:?} price={:?} total={:?}",
                cols.trade_type, cols.asset, cols.quantity, cols.price, cols.total_value
            );
            if !cols.has_mandatory() {
                println!("  asset or quantity column missing — rows will be skipped");
            }
        }
    }
    Ok(())
}
