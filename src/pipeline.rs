use std::collections::HashSet;

use crate::broker::identify_broker;
use crate::cascade::extract_from_text;
use crate::config::{CompiledConfig, ExtractorConfig};
use crate::error::Result;
use crate::fees::extract_fees;
use crate::metadata::extract_metadata;
use crate::models::{
    ExtractionResult, FeeKind, FeeSet, RawDocument, Summary, TradeType, Transaction,
};
use crate::table::{build_transactions, classify_tables, locate_columns};

/// The per-document extraction pipeline. Construction compiles the pattern
/// configuration once; extraction itself is a pure function of the document.
pub struct NotePipeline {
    cfg: CompiledConfig,
}

impl NotePipeline {
    pub fn new(config: &ExtractorConfig) -> Result<Self> {
        Ok(Self {
            cfg: config.compile()?,
        })
    }

    pub fn config(&self) -> &CompiledConfig {
        &self.cfg
    }

    /// Run every stage over one document. Stage-level failures degrade to
    /// absence; the result is always well-formed and flagged successful.
    /// Adapter-level failures are represented by the caller via
    /// [`ExtractionResult::failure`].
    pub fn extract(&self, doc: &RawDocument) -> ExtractionResult {
        let text = doc.full_text();

        let mut metadata = extract_metadata(&text, &doc.file_name, &self.cfg);
        metadata.broker = identify_broker(&text, &self.cfg);

        // Row extraction and the text cascade run independently; their
        // outputs are unioned before deduplication.
        let mut candidates = Vec::new();
        for table in classify_tables(&doc.tables, &self.cfg)
            .iter()
            .filter(|t| t.looks_like_transactions)
        {
            let cols = locate_columns(&table.header, &self.cfg.columns);
            if !cols.has_mandatory() {
                continue;
            }
            candidates.extend(build_transactions(table, &cols, &self.cfg.futures_roots));
        }
        candidates.extend(extract_from_text(&text, &self.cfg));

        let mut transactions = dedup(candidates);
        let fees = extract_fees(&text, &self.cfg);

        if transactions.is_empty() && (!fees.is_empty() || metadata.note_number.is_some()) {
            transactions.push(Transaction::placeholder());
        }

        let summary = build_summary(&transactions, &fees);

        ExtractionResult {
            success: true,
            error: None,
            source_file: doc.file_name.clone(),
            metadata,
            transactions,
            fees,
            summary,
        }
    }
}

/// Merge candidates that collide on (type, asset, quantity, price); the
/// first occurrence survives, preserving strategy priority order.
fn dedup(candidates: Vec<Transaction>) -> Vec<Transaction> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(candidates.len());
    for txn in candidates {
        if seen.insert(txn.dedup_key()) {
            out.push(txn);
        }
    }
    out
}

fn build_summary(transactions: &[Transaction], fees: &FeeSet) -> Summary {
    let total_buys: f64 = transactions
        .iter()
        .filter(|t| t.trade_type == TradeType::Buy)
        .map(|t| t.total_value)
        .sum();
    let total_sells: f64 = transactions
        .iter()
        .filter(|t| t.trade_type == TradeType::Sell)
        .map(|t| t.total_value)
        .sum();
    let net_value = fees
        .get(FeeKind::NetValue)
        .unwrap_or_else(|| total_sells - total_buys - fees.total_excluding_net());
    Summary {
        total_buys,
        total_sells,
        net_value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pipeline() -> NotePipeline {
        NotePipeline::new(&ExtractorConfig::default()).unwrap()
    }

    fn doc(file_name: &str, text: &str) -> RawDocument {
        RawDocument {
            file_name: file_name.to_string(),
            pages: vec![text.to_string()],
            tables: Vec::new(),
        }
    }

    #[test]
    fn test_end_to_end_cash_market_note() {
        let p = pipeline();
        let result = p.extract(&doc(
            "nota.txt",
            "XP INVESTIMENTOS CCTVM S/A\nNr. nota: 12345\nData pregão: 02/04/2025\n\
             C VISTA PETR4 1000 28,50 28500,00\nCorretagem: R$ 12,50",
        ));
        assert!(result.success);
        assert_eq!(result.metadata.broker, "XP");
        assert_eq!(result.metadata.note_number.as_deref(), Some("12345"));
        assert_eq!(result.metadata.trade_date.as_deref(), Some("02/04/2025"));
        assert_eq!(result.transactions.len(), 1);
        assert_eq!(result.transactions[0].asset, "PETR4");
        assert_eq!(result.transactions[0].total_value, 28500.0);
        assert_eq!(result.fees.get(FeeKind::Brokerage), Some(12.5));
        assert_eq!(result.summary.total_buys, 28500.0);
        assert_eq!(result.summary.total_sells, 0.0);
    }

    #[test]
    fn test_placeholder_when_fees_but_no_rows() {
        let p = pipeline();
        let result = p.extract(&doc("nota.txt", "Corretagem: R$ 12,50"));
        assert_eq!(result.transactions.len(), 1);
        let t = &result.transactions[0];
        assert!(t.is_placeholder());
        assert_eq!(t.quantity, 1.0);
        assert_eq!(t.price, 0.0);
        assert_eq!(result.fees.get(FeeKind::Brokerage), Some(12.5));
    }

    #[test]
    fn test_placeholder_when_note_number_but_nothing_else() {
        let p = pipeline();
        let result = p.extract(&doc("nota.txt", "Nr. nota: 777"));
        assert_eq!(result.transactions.len(), 1);
        assert!(result.transactions[0].is_placeholder());
    }

    #[test]
    fn test_no_placeholder_without_any_signal() {
        let p = pipeline();
        let result = p.extract(&doc("nota.txt", "pagina sem conteudo util"));
        assert!(result.success);
        assert!(result.transactions.is_empty());
        assert!(result.fees.is_empty());
    }

    #[test]
    fn test_table_and_cascade_outputs_dedup() {
        let p = pipeline();
        // The same trade arrives via the classified table and the text
        // cascade; exactly one survives.
        let document = RawDocument {
            file_name: "nota.txt".to_string(),
            pages: vec!["C VISTA PETR4 1000 28,50 28500,00".to_string()],
            tables: vec![vec![
                vec![
                    Some("C/V".to_string()),
                    Some("Ativo".to_string()),
                    Some("Quantidade".to_string()),
                    Some("Preço".to_string()),
                ],
                vec![
                    Some("C".to_string()),
                    Some("PETR4".to_string()),
                    Some("1000".to_string()),
                    Some("28,50".to_string()),
                ],
            ]],
        };
        let result = p.extract(&document);
        assert_eq!(result.transactions.len(), 1);
        assert_eq!(result.transactions[0].asset, "PETR4");
    }

    #[test]
    fn test_pipeline_is_idempotent() {
        let p = pipeline();
        let document = doc(
            "008401877_20250402_20250403_BMF.txt",
            "BTG PACTUAL CTVM\nC WDO F25 02/01/2025 1 6.088,0000 DAY TRADE\nCorretagem: 10,00",
        );
        let first = serde_json::to_string(&p.extract(&document)).unwrap();
        let second = serde_json::to_string(&p.extract(&document)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_filename_fallback_feeds_metadata() {
        let p = pipeline();
        let result = p.extract(&doc(
            "008401877_20250402_20250403_BMF.txt",
            "conteudo sem rotulos",
        ));
        assert_eq!(result.metadata.note_number.as_deref(), Some("008401877"));
        assert_eq!(result.metadata.trade_date.as_deref(), Some("02/04/2025"));
    }

    #[test]
    fn test_summary_prefers_extracted_net_value() {
        let p = pipeline();
        let result = p.extract(&doc(
            "nota.txt",
            "V VISTA PETR4 100 30,00 3.000,00\nCorretagem: 10,00\nValor Líquido: R$ 2.985,00",
        ));
        assert_eq!(result.summary.total_sells, 3000.0);
        assert_eq!(result.summary.net_value, 2985.0);
    }

    #[test]
    fn test_summary_computed_from_fees_when_net_absent() {
        let p = pipeline();
        let result = p.extract(&doc(
            "nota.txt",
            "V VISTA PETR4 100 30,00 3.000,00\nCorretagem: 10,00",
        ));
        assert_eq!(result.summary.net_value, 2990.0);
    }

    #[test]
    fn test_dedup_keeps_distinct_trades() {
        let p = pipeline();
        let result = p.extract(&doc(
            "nota.txt",
            "C VISTA PETR4 1000 28,50 28500,00\nV VISTA PETR4 1000 28,50 28500,00\n\
             C VISTA VALE3 200 77,10 15420,00",
        ));
        assert_eq!(result.transactions.len(), 3);
    }
}
