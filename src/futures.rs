use crate::models::Transaction;

/// Decomposed futures contract ticker, e.g. WINJ25 or "WDO F25".
#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq)]
pub struct FuturesContract {
    pub root: String,
    /// Expiration code as printed: month letter + two-digit year.
    pub code: String,
    pub month_number: u32,
    pub month_name: &'static str,
    pub year: i32,
    /// DD/MM/YYYY. The note carries no expiration day, so the 15th stands in.
    pub expiration_date: String,
}

/// B3 month-code convention for derivative contract tickers.
pub fn month_from_code(letter: char) -> Option<(u32, &'static str)> {
    Some(match letter.to_ascii_uppercase() {
        'F' => (1, "January"),
        'G' => (2, "February"),
        'H' => (3, "March"),
        'J' => (4, "April"),
        'K' => (5, "May"),
        'M' => (6, "June"),
        'N' => (7, "July"),
        'Q' => (8, "August"),
        'U' => (9, "September"),
        'V' => (10, "October"),
        'X' => (11, "November"),
        'Z' => (12, "December"),
        _ => return None,
    })
}

/// Decompose an asset label into a futures contract, accepting the compact
/// form (WINJ25, 3-4 letter root) and the spaced form (WDO F25).
pub fn decompose(asset: &str) -> Option<FuturesContract> {
    let asset = asset.trim().to_uppercase();
    let parts: Vec<&str> = asset.split_whitespace().collect();
    let (root, code) = match parts.as_slice() {
        [compact] => {
            if compact.len() < 6 || compact.len() > 7 {
                return None;
            }
            let (root, code) = compact.split_at(compact.len() - 3);
            if !root.chars().all(|c| c.is_ascii_alphabetic()) {
                return None;
            }
            (root.to_string(), code.to_string())
        }
        [root, code] => {
            if root.len() < 2
                || root.len() > 5
                || !root.chars().all(|c| c.is_ascii_alphanumeric())
            {
                return None;
            }
            (root.to_string(), code.to_string())
        }
        _ => return None,
    };

    let mut chars = code.chars();
    let letter = chars.next()?;
    let (month_number, month_name) = month_from_code(letter)?;
    let year_digits: String = chars.collect();
    if year_digits.len() != 2 || !year_digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let year: i32 = format!("20{year_digits}").parse().ok()?;

    Some(FuturesContract {
        expiration_date: format!("15/{month_number:02}/{year}"),
        root,
        code,
        month_number,
        month_name,
        year,
    })
}

/// Whether an asset label names a futures instrument, either by a known
/// contract root or by a decomposable expiration code.
pub fn is_futures_asset(asset: &str, roots: &[String]) -> bool {
    let upper = asset.trim().to_uppercase();
    if decompose(&upper).is_some() {
        return true;
    }
    let head = upper.split_whitespace().next().unwrap_or("");
    roots.iter().any(|r| head == *r)
}

/// Fill a transaction's expiration fields from its ticker when they are not
/// already set from an explicit column.
pub fn annotate_expiration(txn: &mut Transaction) {
    if txn.expiration_date.is_some() {
        return;
    }
    if let Some(contract) = decompose(&txn.asset) {
        txn.expiration_code = Some(contract.code);
        txn.expiration_month = Some(contract.month_name.to_string());
        txn.expiration_date = Some(contract.expiration_date);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TradeType;

    #[test]
    fn test_decompose_compact_ticker() {
        let c = decompose("WINJ25").unwrap();
        assert_eq!(c.root, "WIN");
        assert_eq!(c.code, "J25");
        assert_eq!(c.month_name, "April");
        assert_eq!(c.year, 2025);
        assert_eq!(c.expiration_date, "15/04/2025");
    }

    #[test]
    fn test_decompose_spaced_ticker() {
        let c = decompose("WDO F25").unwrap();
        assert_eq!(c.root, "WDO");
        assert_eq!(c.code, "F25");
        assert_eq!(c.month_name, "January");
        assert_eq!(c.expiration_date, "15/01/2025");
    }

    #[test]
    fn test_decompose_mid_year_code() {
        let c = decompose("WDOK23").unwrap();
        assert_eq!(c.root, "WDO");
        assert_eq!(c.code, "K23");
        assert_eq!(c.month_name, "May");
        assert_eq!(c.year, 2023);
    }

    #[test]
    fn test_decompose_rejects_equities() {
        assert!(decompose("PETR4").is_none());
        assert!(decompose("VALE3").is_none());
        // Unit tickers end in two digits but carry no month letter.
        assert!(decompose("TAEE11").is_none());
        assert!(decompose("BPAC11").is_none());
    }

    #[test]
    fn test_is_futures_asset_by_root() {
        let roots = vec!["WIN".to_string(), "WDO".to_string()];
        assert!(is_futures_asset("WIN J25", &roots));
        assert!(is_futures_asset("WDOK23", &roots));
        assert!(!is_futures_asset("PETR4", &roots));
    }

    #[test]
    fn test_annotate_expiration_respects_explicit_date() {
        let mut txn = Transaction::new(TradeType::Buy, "WINJ25", 1.0, 130000.0, 130000.0);
        txn.expiration_date = Some("16/04/2025".to_string());
        annotate_expiration(&mut txn);
        assert_eq!(txn.expiration_date.as_deref(), Some("16/04/2025"));
        assert!(txn.expiration_code.is_none());

        let mut txn = Transaction::new(TradeType::Buy, "WINJ25", 1.0, 130000.0, 130000.0);
        annotate_expiration(&mut txn);
        assert_eq!(txn.expiration_code.as_deref(), Some("J25"));
        assert_eq!(txn.expiration_month.as_deref(), Some("April"));
        assert_eq!(txn.expiration_date.as_deref(), Some("15/04/2025"));
    }
}
