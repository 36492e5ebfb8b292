use std::path::Path;

use crate::error::Result;
use crate::models::{ExtractionResult, FeeKind};

/// One tabular row per transaction, ready for the export collaborator.
/// Note-level fees are prorated equally across the note's transactions.
#[derive(Debug, Clone)]
pub struct ExportRow {
    pub date: String,
    pub note_number: String,
    pub broker: String,
    pub trade_type: String,
    pub ticker: String,
    pub expiration: String,
    pub quantity: f64,
    pub price: f64,
    pub total_value: f64,
    pub trade_nature: String,
    pub debit_credit: String,
    pub operational_fee: f64,
    /// Prorated amounts aligned with [`fee_columns`].
    pub fees: Vec<f64>,
    pub asset: String,
}

/// Fee kinds exported as per-row columns. The note's net value is a
/// summary-level figure and is not prorated.
pub fn fee_columns() -> impl Iterator<Item = FeeKind> {
    FeeKind::ALL
        .into_iter()
        .filter(|k| *k != FeeKind::NetValue)
}

pub fn export_rows(result: &ExtractionResult) -> Vec<ExportRow> {
    if result.transactions.is_empty() {
        return Vec::new();
    }
    let divisor = result.transactions.len() as f64;
    result
        .transactions
        .iter()
        .map(|t| ExportRow {
            date: result.metadata.trade_date.clone().unwrap_or_default(),
            note_number: result.metadata.note_number.clone().unwrap_or_default(),
            broker: result.metadata.broker.clone(),
            trade_type: t.trade_type.code().to_string(),
            ticker: t.ticker.clone(),
            expiration: t.expiration_date.clone().unwrap_or_default(),
            quantity: t.quantity,
            price: t.price,
            total_value: t.total_value,
            trade_nature: t.trade_nature.clone().unwrap_or_default(),
            debit_credit: t
                .debit_credit
                .map(|d| d.code().to_string())
                .unwrap_or_default(),
            operational_fee: t.operational_fee,
            fees: fee_columns()
                .map(|kind| result.fees.get(kind).unwrap_or(0.0) / divisor)
                .collect(),
            asset: t.asset.clone(),
        })
        .collect()
}

pub fn csv_headers() -> Vec<String> {
    let mut headers: Vec<String> = [
        "Data",
        "Número da Nota",
        "Corretora",
        "C/V",
        "Mercadoria",
        "Vencimento",
        "Quantidade",
        "Preço / Ajuste",
        "Valor Total",
        "Tipo Negócio",
        "D/C",
        "Taxa Operacional",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    headers.extend(fee_columns().map(|k| k.label().to_string()));
    headers.push("Ativo Original".to_string());
    headers
}

pub fn write_csv(path: &Path, rows: &[ExportRow]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(csv_headers())?;
    for row in rows {
        let mut record = vec![
            row.date.clone(),
            row.note_number.clone(),
            row.broker.clone(),
            row.trade_type.clone(),
            row.ticker.clone(),
            row.expiration.clone(),
            format_quantity(row.quantity),
            format!("{:.2}", row.price),
            format!("{:.2}", row.total_value),
            row.trade_nature.clone(),
            row.debit_credit.clone(),
            format!("{:.2}", row.operational_fee),
        ];
        record.extend(row.fees.iter().map(|fee| format!("{fee:.2}")));
        record.push(row.asset.clone());
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

fn format_quantity(quantity: f64) -> String {
    if quantity.fract() == 0.0 {
        format!("{quantity:.0}")
    } else {
        format!("{quantity:.2}")
    }
}
