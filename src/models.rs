use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Asset label used for the sentinel record emitted when a note yields
/// metadata or fees but no extractable trade rows.
pub const PLACEHOLDER_ASSET: &str = "NO TRANSACTIONS FOUND";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TradeType {
    Buy,
    Sell,
    Placeholder,
}

impl TradeType {
    /// One-letter code as printed on Brazilian notes (C = compra, V = venda).
    pub fn code(&self) -> &'static str {
        match self {
            Self::Buy => "C",
            Self::Sell => "V",
            Self::Placeholder => "X",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DebitCredit {
    Debit,
    Credit,
}

impl DebitCredit {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Debit => "D",
            Self::Credit => "C",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub trade_type: TradeType,
    /// Asset label as printed, internal whitespace collapsed.
    pub asset: String,
    /// Asset stripped of descriptive suffixes (ON, PN, N2, ...).
    pub ticker: String,
    pub quantity: f64,
    pub price: f64,
    pub total_value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trade_nature: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debit_credit: Option<DebitCredit>,
    /// Raw futures expiration code embedded in the ticker, e.g. "J25".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_month: Option<String>,
    /// DD/MM/YYYY; day defaults to 15 when derived from a ticker code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<String>,
    #[serde(default)]
    pub operational_fee: f64,
}

impl Transaction {
    pub fn new(
        trade_type: TradeType,
        asset: impl Into<String>,
        quantity: f64,
        price: f64,
        total_value: f64,
    ) -> Self {
        let asset = asset.into();
        let ticker = ticker_from_asset(&asset);
        Self {
            trade_type,
            asset,
            ticker,
            quantity,
            price,
            total_value,
            trade_nature: None,
            debit_credit: None,
            expiration_code: None,
            expiration_month: None,
            expiration_date: None,
            operational_fee: 0.0,
        }
    }

    pub fn placeholder() -> Self {
        Self::new(TradeType::Placeholder, PLACEHOLDER_ASSET, 1.0, 0.0, 0.0)
    }

    pub fn is_placeholder(&self) -> bool {
        self.trade_type == TradeType::Placeholder
    }

    /// Equivalence key for cross-strategy deduplication.
    pub fn dedup_key(&self) -> (TradeType, String, u64, u64) {
        (
            self.trade_type,
            self.asset.clone(),
            self.quantity.to_bits(),
            self.price.to_bits(),
        )
    }
}

/// Descriptive suffix tokens that follow the ticker on equity rows.
const DESCRIPTOR_SUFFIXES: &[&str] = &[
    "ON", "PN", "PNA", "PNB", "UNT", "UNIT", "N1", "N2", "NM", "MA", "MB", "ED", "EJ", "EDJ",
    "CI", "ER",
];

pub fn ticker_from_asset(asset: &str) -> String {
    let mut tokens: Vec<&str> = asset.split_whitespace().collect();
    while tokens.len() > 1 {
        let last = tokens.last().unwrap_or(&"").to_uppercase();
        if DESCRIPTOR_SUFFIXES.contains(&last.as_str()) {
            tokens.pop();
        } else {
            break;
        }
    }
    tokens.join(" ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FeeKind {
    Settlement,
    Registration,
    TermOptions,
    Exchange,
    Operational,
    Brokerage,
    WithholdingTax,
    OtherTaxes,
    NetValue,
    Adjustment,
    OperationDc,
}

impl FeeKind {
    pub const ALL: [FeeKind; 11] = [
        FeeKind::Settlement,
        FeeKind::Registration,
        FeeKind::TermOptions,
        FeeKind::Exchange,
        FeeKind::Operational,
        FeeKind::Brokerage,
        FeeKind::WithholdingTax,
        FeeKind::OtherTaxes,
        FeeKind::NetValue,
        FeeKind::Adjustment,
        FeeKind::OperationDc,
    ];

    /// Column label as it appears on the exported report.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Settlement => "Taxa de Liquidação",
            Self::Registration => "Taxa de Registro",
            Self::TermOptions => "Taxa de Termo/Opções",
            Self::Exchange => "Emolumentos",
            Self::Operational => "Taxa Operacional",
            Self::Brokerage => "Corretagem",
            Self::WithholdingTax => "IRRF",
            Self::OtherTaxes => "Outros Impostos",
            Self::NetValue => "Valor Líquido",
            Self::Adjustment => "Ajuste",
            Self::OperationDc => "Valor Operação D/C",
        }
    }
}

/// Named fee amounts extracted from a note. A fee that was not found is
/// absent, never assumed zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeeSet(BTreeMap<FeeKind, f64>);

impl FeeSet {
    pub fn insert(&mut self, kind: FeeKind, amount: f64) {
        self.0.insert(kind, amount);
    }

    pub fn get(&self, kind: FeeKind) -> Option<f64> {
        self.0.get(&kind).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FeeKind, f64)> + '_ {
        self.0.iter().map(|(k, v)| (*k, *v))
    }

    /// Sum of every extracted fee except the note's own net value line.
    pub fn total_excluding_net(&self) -> f64 {
        self.0
            .iter()
            .filter(|(k, _)| **k != FeeKind::NetValue)
            .map(|(_, v)| v)
            .sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note_number: Option<String>,
    /// Canonical DD/MM/YYYY, or the raw capture when unparseable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trade_date: Option<String>,
    pub broker: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client: Option<String>,
}

impl Default for NoteMetadata {
    fn default() -> Self {
        Self {
            note_number: None,
            trade_date: None,
            broker: "Unknown".to_string(),
            client: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total_buys: f64,
    pub total_sells: f64,
    pub net_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub source_file: String,
    pub metadata: NoteMetadata,
    pub transactions: Vec<Transaction>,
    pub fees: FeeSet,
    pub summary: Summary,
}

impl ExtractionResult {
    /// Document-level failure: the adapter could not produce a document.
    /// Filename and success flag are still populated.
    pub fn failure(source_file: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            source_file: source_file.into(),
            metadata: NoteMetadata::default(),
            transactions: Vec::new(),
            fees: FeeSet::default(),
            summary: Summary::default(),
        }
    }
}

/// Raw table as delivered by the external extraction primitive: rows of
/// nullable cells.
pub type RawTable = Vec<Vec<Option<String>>>;

/// Pre-extracted document content, owned by a single pipeline invocation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawDocument {
    pub file_name: String,
    pub pages: Vec<String>,
    #[serde(default)]
    pub tables: Vec<RawTable>,
}

impl RawDocument {
    /// Joined document text. Pages with no text are skipped.
    pub fn full_text(&self) -> String {
        self.pages
            .iter()
            .filter(|p| !p.trim().is_empty())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticker_strips_descriptor_suffixes() {
        assert_eq!(ticker_from_asset("PETROBRAS PN N2"), "PETROBRAS");
        assert_eq!(ticker_from_asset("VALE3 ON"), "VALE3");
        assert_eq!(ticker_from_asset("PETR4"), "PETR4");
        assert_eq!(ticker_from_asset("WDO F25"), "WDO F25");
    }

    #[test]
    fn test_placeholder_shape() {
        let t = Transaction::placeholder();
        assert_eq!(t.trade_type, TradeType::Placeholder);
        assert_eq!(t.asset, PLACEHOLDER_ASSET);
        assert_eq!(t.quantity, 1.0);
        assert_eq!(t.price, 0.0);
        assert_eq!(t.total_value, 0.0);
    }

    #[test]
    fn test_dedup_key_distinguishes_price() {
        let a = Transaction::new(TradeType::Buy, "PETR4", 100.0, 28.5, 2850.0);
        let b = Transaction::new(TradeType::Buy, "PETR4", 100.0, 28.6, 2860.0);
        assert_ne!(a.dedup_key(), b.dedup_key());
        let c = Transaction::new(TradeType::Buy, "PETR4", 100.0, 28.5, 0.0);
        assert_eq!(a.dedup_key(), c.dedup_key());
    }

    #[test]
    fn test_fee_set_total_excludes_net_value() {
        let mut fees = FeeSet::default();
        fees.insert(FeeKind::Brokerage, 10.0);
        fees.insert(FeeKind::Settlement, 2.5);
        fees.insert(FeeKind::NetValue, 1000.0);
        assert_eq!(fees.total_excluding_net(), 12.5);
        assert_eq!(fees.len(), 3);
    }

    #[test]
    fn test_full_text_skips_blank_pages() {
        let doc = RawDocument {
            file_name: "nota.txt".into(),
            pages: vec!["first".into(), "   ".into(), "second".into()],
            tables: Vec::new(),
        };
        assert_eq!(doc.full_text(), "first\nsecond");
    }
}
