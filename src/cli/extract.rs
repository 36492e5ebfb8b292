use std::path::Path;

use anyhow::Context;
use colored::Colorize;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, ContentArrangement, Table};

use crate::adapter;
use crate::models::ExtractionResult;
use crate::money::brl;

pub fn run(file: &str, json: bool, config_path: Option<&str>) -> anyhow::Result<()> {
    let pipeline = super::build_pipeline(config_path)?;
    let doc = adapter::load_document(Path::new(file)).with_context(|| format!("loading {file}"))?;
    let result = pipeline.extract(&doc);

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }
    print_result(&result);
    Ok(())
}

fn print_result(result: &ExtractionResult) {
    println!("File:    {}", result.source_file);
    println!("Broker:  {}", result.metadata.broker);
    println!(
        "Note:    {}",
        result.metadata.note_number.as_deref().unwrap_or("(not found)")
    );
    println!(
        "Date:    {}",
        result.metadata.trade_date.as_deref().unwrap_or("(not found)")
    );
    if let Some(client) = &result.metadata.client {
        println!("Client:  {client}");
    }
    println!();

    if result.transactions.is_empty() {
        println!("{}", "No transactions extracted.".yellow());
    } else if result.transactions.len() == 1 && result.transactions[0].is_placeholder() {
        println!(
            "{}",
            "No trade rows found; placeholder emitted to keep note metadata.".yellow()
        );
    } else {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                "C/V",
                "Ativo",
                "Qtd",
                "Preço",
                "Total",
                "Tipo Negócio",
                "Vencimento",
            ]);
        for t in &result.transactions {
            table.add_row(vec![
                Cell::new(t.trade_type.code()),
                Cell::new(&t.asset),
                Cell::new(t.quantity),
                Cell::new(brl(t.price)),
                Cell::new(brl(t.total_value)),
                Cell::new(t.trade_nature.as_deref().unwrap_or("")),
                Cell::new(t.expiration_date.as_deref().unwrap_or("")),
            ]);
        }
        println!("{table}");
    }

    if !result.fees.is_empty() {
        println!();
        println!("Fees ({}):", result.fees.len());
        for (kind, amount) in result.fees.iter() {
            println!("  {:<22} {}", kind.label(), brl(amount));
        }
    }

    println!();
    println!("{}  {}", "Total buys:".bold(), brl(result.summary.total_buys));
    println!("{} {}", "Total sells:".bold(), brl(result.summary.total_sells));
    println!("{}   {}", "Net value:".bold(), brl(result.summary.net_value));
}
