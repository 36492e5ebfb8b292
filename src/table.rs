use crate::config::{ColumnCandidates, CompiledConfig};
use crate::futures::{annotate_expiration, is_futures_asset, month_from_code};
use crate::models::{DebitCredit, RawTable, TradeType, Transaction};
use crate::money::{parse_amount, repair_price};

// ---------------------------------------------------------------------------
// Normalization helpers shared with the text cascade
// ---------------------------------------------------------------------------

/// Fold Portuguese accents so keyword tables can stay ASCII. Extracted
/// headers are inconsistent about accents ("Preço" vs "Preco").
pub(crate) fn fold_accents(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'é' | 'è' | 'ê' => 'e',
            'í' | 'î' => 'i',
            'ó' | 'ò' | 'ô' | 'õ' => 'o',
            'ú' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            _ => c,
        })
        .collect()
}

pub(crate) fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub(crate) fn normalize_trade_type(raw: &str) -> Option<TradeType> {
    // "D" follows the debit-coded convention some brokers print in the
    // operation column: a purchase settles as a debit.
    match raw.trim().to_uppercase().as_str() {
        "C" | "COMPRA" | "COMPRAR" | "COMPRAS" | "BUY" | "D" => Some(TradeType::Buy),
        "V" | "VENDA" | "VENDER" | "VENDAS" | "SELL" => Some(TradeType::Sell),
        _ => None,
    }
}

pub(crate) fn normalize_debit_credit(raw: &str) -> Option<DebitCredit> {
    match fold_accents(&raw.trim().to_lowercase()).as_str() {
        "d" | "debito" => Some(DebitCredit::Debit),
        "c" | "credito" => Some(DebitCredit::Credit),
        _ => None,
    }
}

pub(crate) fn normalize_trade_nature(raw: &str) -> Option<String> {
    let upper = collapse_whitespace(&raw.trim().to_uppercase());
    if upper.is_empty() {
        return None;
    }
    if upper.contains("DAY") {
        return Some("DAY TRADE".to_string());
    }
    Some(upper)
}

/// Trade type resolution chain shared by the table and cascade builders:
/// explicit cell, then D/C flag (debit ⇒ buy), then the sign of the total
/// (negative ⇒ buy), then buy.
pub(crate) fn resolve_trade_type(
    explicit: Option<TradeType>,
    dc: Option<DebitCredit>,
    default_type: Option<TradeType>,
    total: f64,
) -> TradeType {
    explicit
        .or_else(|| {
            dc.map(|d| match d {
                DebitCredit::Debit => TradeType::Buy,
                DebitCredit::Credit => TradeType::Sell,
            })
        })
        .or(default_type)
        .or_else(|| {
            if total != 0.0 {
                Some(if total < 0.0 {
                    TradeType::Buy
                } else {
                    TradeType::Sell
                })
            } else {
                None
            }
        })
        .unwrap_or(TradeType::Buy)
}

// ---------------------------------------------------------------------------
// Table classifier
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ClassifiedTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Lowercased, accent-folded, space-joined header.
    pub header_text: String,
    pub looks_like_transactions: bool,
}

/// Clean raw tables and flag the ones whose header matches a transaction
/// keyword set. Tables too small to carry a header plus data are dropped.
pub fn classify_tables(tables: &[RawTable], cfg: &CompiledConfig) -> Vec<ClassifiedTable> {
    let mut out = Vec::new();
    for table in tables {
        let cleaned: Vec<Vec<String>> = table
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| cell.as_deref().unwrap_or("").trim().to_string())
                    .collect::<Vec<String>>()
            })
            .filter(|row| row.iter().any(|cell| !cell.is_empty()))
            .collect();
        if cleaned.len() < 2 || cleaned[0].len() < 3 {
            continue;
        }
        let header = cleaned[0].clone();
        let header_text = fold_accents(&header.join(" ").to_lowercase());
        let looks_like_transactions = cfg
            .table_keyword_sets
            .iter()
            .any(|set| set.iter().all(|kw| header_text.contains(kw.as_str())));
        out.push(ClassifiedTable {
            rows: cleaned[1..].to_vec(),
            header,
            header_text,
            looks_like_transactions,
        });
    }
    out
}

// ---------------------------------------------------------------------------
// Column locator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct ColumnMap {
    pub trade_type: Option<usize>,
    pub asset: Option<usize>,
    pub quantity: Option<usize>,
    pub price: Option<usize>,
    pub total_value: Option<usize>,
    pub trade_nature: Option<usize>,
    pub debit_credit: Option<usize>,
    pub expiration: Option<usize>,
    pub operational_fee: Option<usize>,
}

impl ColumnMap {
    /// Asset and quantity are mandatory for row building.
    pub fn has_mandatory(&self) -> bool {
        self.asset.is_some() && self.quantity.is_some()
    }
}

pub fn locate_columns(header: &[String], candidates: &ColumnCandidates) -> ColumnMap {
    let folded: Vec<String> = header
        .iter()
        .map(|h| fold_accents(&h.to_lowercase()))
        .collect();
    ColumnMap {
        trade_type: find_column(&folded, &candidates.trade_type),
        asset: find_column(&folded, &candidates.asset),
        quantity: find_column(&folded, &candidates.quantity),
        price: find_column(&folded, &candidates.price),
        total_value: find_column(&folded, &candidates.total_value),
        trade_nature: find_column(&folded, &candidates.trade_nature),
        debit_credit: find_column(&folded, &candidates.debit_credit),
        expiration: find_column(&folded, &candidates.expiration),
        operational_fee: find_column(&folded, &candidates.operational_fee),
    }
}

/// Two-tier lookup: an exact header match for any candidate term wins over
/// a substring match.
fn find_column(header: &[String], terms: &[String]) -> Option<usize> {
    for term in terms {
        for (i, cell) in header.iter().enumerate() {
            if cell == term {
                return Some(i);
            }
        }
    }
    for term in terms {
        for (i, cell) in header.iter().enumerate() {
            if cell.contains(term.as_str()) {
                return Some(i);
            }
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Row transaction builder
// ---------------------------------------------------------------------------

pub fn build_transactions(
    table: &ClassifiedTable,
    cols: &ColumnMap,
    futures_roots: &[String],
) -> Vec<Transaction> {
    if !cols.has_mandatory() {
        return Vec::new();
    }
    let mut out = Vec::new();

    for row in &table.rows {
        if row.iter().all(|cell| cell.is_empty()) {
            continue;
        }

        let asset = collapse_whitespace(cell(row, cols.asset));
        if asset.is_empty() || asset.eq_ignore_ascii_case("n/a") {
            continue;
        }
        let quantity = parse_amount(cell(row, cols.quantity));
        if quantity <= 0.0 {
            continue;
        }

        let price_raw = cell(row, cols.price);
        let futures_like = is_futures_asset(&asset, futures_roots);
        let price = repair_price(parse_amount(price_raw), price_raw, futures_like);

        let mut total = parse_amount(cell(row, cols.total_value));
        if total == 0.0 && price > 0.0 {
            total = quantity * price;
        }

        let explicit = normalize_trade_type(cell(row, cols.trade_type));
        let dc = normalize_debit_credit(cell(row, cols.debit_credit));
        let trade_type = resolve_trade_type(explicit, dc, None, total);

        let mut txn = Transaction::new(trade_type, asset, quantity, price, total);
        txn.trade_nature = normalize_trade_nature(cell(row, cols.trade_nature));
        txn.debit_credit = dc;
        txn.operational_fee = parse_amount(cell(row, cols.operational_fee));
        apply_expiration_cell(&mut txn, cell(row, cols.expiration));
        annotate_expiration(&mut txn);
        out.push(txn);
    }
    out
}

fn cell<'a>(row: &'a [String], idx: Option<usize>) -> &'a str {
    idx.and_then(|i| row.get(i)).map(String::as_str).unwrap_or("")
}

/// Explicit expiration column: either a month-letter code ("J25") or a date
/// in one of the layouts brokers print.
fn apply_expiration_cell(txn: &mut Transaction, raw: &str) {
    let raw = raw.trim();
    if raw.is_empty() {
        return;
    }
    let upper = raw.to_uppercase();
    let chars: Vec<char> = upper.chars().collect();
    if chars.len() == 3 && chars[1].is_ascii_digit() && chars[2].is_ascii_digit() {
        if let Some((month_number, month_name)) = month_from_code(chars[0]) {
            txn.expiration_code = Some(upper.clone());
            txn.expiration_month = Some(month_name.to_string());
            txn.expiration_date =
                Some(format!("15/{month_number:02}/20{}{}", chars[1], chars[2]));
            return;
        }
    }
    txn.expiration_date = Some(normalize_expiration_date(raw));
}

fn normalize_expiration_date(raw: &str) -> String {
    let parts: Vec<&str> = raw.split(['-', '/']).collect();
    if parts.len() == 3 {
        if parts[0].len() == 4 {
            // ISO order
            return format!("{}/{}/{}", parts[2], parts[1], parts[0]);
        }
        return format!("{}/{}/{}", parts[0], parts[1], parts[2]);
    }
    raw.to_string()
}
