/// Parse a Brazilian-formatted amount string ("1.234,56") into a float.
///
/// Everything except digits, comma, period and minus is stripped first, so
/// currency prefixes ("R$") and stray D/C markers are tolerated. A value
/// that still cannot be parsed resolves to 0, never to an error.
pub fn parse_amount(raw: &str) -> f64 {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, ',' | '.' | '-'))
        .collect();
    if cleaned.is_empty() {
        return 0.0;
    }
    let normalized = if cleaned.contains(',') {
        // Comma present: Brazilian convention, period is a thousands separator.
        cleaned.replace('.', "").replace(',', ".")
    } else {
        // Period only: already a decimal point.
        cleaned
    };
    normalized.parse().unwrap_or(0.0)
}

/// Repair a price that was printed without its decimal separator.
///
/// Only fires when the raw capture carries no separator at all and the
/// instrument is not a futures contract (futures price levels legitimately
/// exceed 10,000).
pub fn repair_price(price: f64, raw: &str, futures: bool) -> f64 {
    if !futures && price > 10_000.0 && !raw.contains(',') && !raw.contains('.') {
        price / 100.0
    } else {
        price
    }
}

/// Format a float as a Brazilian currency amount: R$ 1.234,56
pub fn brl(val: f64) -> String {
    let negative = val < 0.0;
    let cents = format!("{:.2}", val.abs());
    let (int_part, dec_part) = cents.split_once('.').unwrap_or((cents.as_str(), "00"));

    let mut with_dots = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_dots.push('.');
        }
        with_dots.push(c);
    }
    let with_dots: String = with_dots.chars().rev().collect();

    if negative {
        format!("-R$ {with_dots},{dec_part}")
    } else {
        format!("R$ {with_dots},{dec_part}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount_both_separators() {
        assert_eq!(parse_amount("1.234,56"), 1234.56);
        assert_eq!(parse_amount("131.820,0000"), 131820.0);
    }

    #[test]
    fn test_parse_amount_comma_only() {
        assert_eq!(parse_amount("1234,56"), 1234.56);
        assert_eq!(parse_amount("28,50"), 28.5);
    }

    #[test]
    fn test_parse_amount_period_only_is_decimal() {
        assert_eq!(parse_amount("115180.0"), 115180.0);
        assert_eq!(parse_amount("12.5"), 12.5);
    }

    #[test]
    fn test_parse_amount_garbage_resolves_to_zero() {
        assert_eq!(parse_amount(""), 0.0);
        assert_eq!(parse_amount("abc"), 0.0);
        assert_eq!(parse_amount("--,,"), 0.0);
    }

    #[test]
    fn test_parse_amount_currency_prefix() {
        assert_eq!(parse_amount("R$ 12,50"), 12.5);
        assert_eq!(parse_amount("R$ 1.000,00 D"), 1000.0);
    }

    #[test]
    fn test_repair_price_missing_decimal() {
        assert_eq!(repair_price(28500.0, "28500", false), 285.0);
        // A separator in the raw capture means the value is trustworthy.
        assert_eq!(repair_price(28500.0, "28.500,00", false), 28500.0);
        assert_eq!(repair_price(115180.0, "115180.0", false), 115180.0);
    }

    #[test]
    fn test_repair_price_skips_futures() {
        assert_eq!(repair_price(131820.0, "131820", true), 131820.0);
    }

    #[test]
    fn test_brl_formatting() {
        assert_eq!(brl(1234.56), "R$ 1.234,56");
        assert_eq!(brl(-500.0), "-R$ 500,00");
        assert_eq!(brl(0.0), "R$ 0,00");
        assert_eq!(brl(1000000.99), "R$ 1.000.000,99");
    }
}
