use regex::Captures;

use crate::config::{CompiledConfig, FieldBindings};
use crate::futures::{annotate_expiration, is_futures_asset};
use crate::models::Transaction;
use crate::money::{parse_amount, repair_price};
use crate::table::{
    collapse_whitespace, normalize_debit_credit, normalize_trade_nature, normalize_trade_type,
    resolve_trade_type,
};

/// Run the ordered rule cascade over the raw text, then again over every
/// marker-delimited section. Rules are not mutually exclusive; overlapping
/// hits are absorbed by the deduplication stage.
pub fn extract_from_text(text: &str, cfg: &CompiledConfig) -> Vec<Transaction> {
    let mut out = scan_rules(text, cfg);
    for (_, span) in &cfg.sections {
        for caps in span.captures_iter(text) {
            if let Some(section) = caps.get(1) {
                out.extend(scan_rules(section.as_str(), cfg));
            }
        }
    }
    out
}

fn scan_rules(text: &str, cfg: &CompiledConfig) -> Vec<Transaction> {
    let mut out = Vec::new();
    for rule in &cfg.cascade {
        for caps in rule.regex.captures_iter(text) {
            if let Some(txn) = bind_transaction(&caps, &rule.bindings, &cfg.futures_roots) {
                out.push(txn);
            }
        }
    }
    out
}

/// Materialize one rule match through its field bindings. A match without a
/// resolvable asset or a positive quantity yields nothing.
fn group<'a>(caps: &'a Captures, idx: Option<usize>) -> Option<&'a str> {
    idx.and_then(|g| caps.get(g)).map(|m| m.as_str())
}

fn bind_transaction(
    caps: &Captures,
    bindings: &FieldBindings,
    futures_roots: &[String],
) -> Option<Transaction> {
    let asset = collapse_whitespace(group(caps, bindings.asset)?).to_uppercase();
    if asset.is_empty() {
        return None;
    }

    let quantity = group(caps, bindings.quantity)
        .map(parse_amount)
        .unwrap_or(0.0);
    if quantity <= 0.0 {
        return None;
    }

    let price_raw = group(caps, bindings.price).unwrap_or("");
    let price = repair_price(
        parse_amount(price_raw),
        price_raw,
        is_futures_asset(&asset, futures_roots),
    );

    let mut total = group(caps, bindings.total_value)
        .map(parse_amount)
        .unwrap_or(0.0);
    if total == 0.0 && price > 0.0 {
        total = quantity * price;
    }

    let explicit = group(caps, bindings.trade_type).and_then(normalize_trade_type);
    let dc = group(caps, bindings.debit_credit).and_then(normalize_debit_credit);
    let trade_type = resolve_trade_type(explicit, dc, bindings.default_type, total);

    let mut txn = Transaction::new(trade_type, asset, quantity, price, total);
    txn.trade_nature = group(caps, bindings.trade_nature).and_then(normalize_trade_nature);
    txn.debit_credit = dc;
    txn.operational_fee = group(caps, bindings.operational_fee)
        .map(parse_amount)
        .unwrap_or(0.0);
    annotate_expiration(&mut txn);
    Some(txn)
}
