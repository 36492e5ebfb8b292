use crate::config::CompiledConfig;
use crate::models::FeeSet;
use crate::money::parse_amount;

/// Extract named fee amounts from the document text. Per fee kind the
/// pattern list is ordered; the first pattern whose captured amount parses
/// to a positive value wins. Kinds with no usable match stay absent.
pub fn extract_fees(text: &str, cfg: &CompiledConfig) -> FeeSet {
    let mut fees = FeeSet::default();
    for (kind, patterns) in &cfg.fees {
        for pattern in patterns {
            if let Some(caps) = pattern.captures(text) {
                let amount = caps.get(1).map(|m| parse_amount(m.as_str())).unwrap_or(0.0);
                if amount > 0.0 {
                    fees.insert(*kind, amount);
                    break;
                }
            }
        }
    }
    fees
}
