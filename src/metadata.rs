use regex::RegexBuilder;

use crate::config::CompiledConfig;
use crate::models::NoteMetadata;

/// Resolve note number, trade date and client name. Text patterns run
/// first; filename conventions are the fallback. Broker identification is
/// a separate stage; the caller fills `broker` afterwards.
pub fn extract_metadata(text: &str, file_name: &str, cfg: &CompiledConfig) -> NoteMetadata {
    NoteMetadata {
        note_number: note_number_from_text(text, cfg)
            .or_else(|| note_number_from_filename(file_name)),
        trade_date: trade_date_from_text(text, cfg).or_else(|| trade_date_from_filename(file_name)),
        client: client_from_text(text),
        ..NoteMetadata::default()
    }
}

fn note_number_from_text(text: &str, cfg: &CompiledConfig) -> Option<String> {
    for pattern in &cfg.note_number {
        if let Some(caps) = pattern.captures(text) {
            if let Some(m) = caps.get(1) {
                return Some(m.as_str().to_string());
            }
        }
    }
    None
}

fn trade_date_from_text(text: &str, cfg: &CompiledConfig) -> Option<String> {
    for pattern in &cfg.trade_date {
        if let Some(caps) = pattern.captures(text) {
            if let Some(m) = caps.get(1) {
                return Some(normalize_date_capture(m.as_str()));
            }
        }
    }
    None
}

/// Canonicalize a captured date to DD/MM/YYYY. Two-digit years are widened
/// with "20"; bare 8-digit captures are read as YYYYMMDD. Anything else is
/// kept verbatim rather than discarded.
pub fn normalize_date_capture(raw: &str) -> String {
    let raw = raw.trim();
    if raw.len() == 8 && raw.chars().all(|c| c.is_ascii_digit()) {
        return format!("{}/{}/{}", &raw[6..8], &raw[4..6], &raw[0..4]);
    }
    let sep = if raw.contains('/') {
        '/'
    } else if raw.contains('-') {
        '-'
    } else {
        return raw.to_string();
    };
    let parts: Vec<&str> = raw.split(sep).collect();
    if parts.len() != 3 {
        return raw.to_string();
    }
    let (day, month, year) = (parts[0], parts[1], parts[2]);
    let year = if year.len() == 2 {
        format!("20{year}")
    } else {
        year.to_string()
    };
    format!("{day}/{month}/{year}")
}

/// Filename convention: `<digits><separator>...` at the start of the name.
pub fn note_number_from_filename(file_name: &str) -> Option<String> {
    let digits: String = file_name
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if digits.is_empty() {
        return None;
    }
    match file_name[digits.len()..].chars().next() {
        Some('_') | Some(' ') => Some(digits),
        _ => None,
    }
}

/// Filename convention: first 8-digit segment (`..._YYYYMMDD...`).
pub fn trade_date_from_filename(file_name: &str) -> Option<String> {
    file_name
        .split(['_', ' ', '.'])
        .find(|seg| seg.len() == 8 && seg.chars().all(|c| c.is_ascii_digit()))
        .map(normalize_date_capture)
}

/// Client name from a `Cliente:`/`Nome:` label in the first lines of the
/// note header.
fn client_from_text(text: &str) -> Option<String> {
    let pattern = RegexBuilder::new(r"(?:cliente|nome)\s*:\s*(.+)")
        .case_insensitive(true)
        .build()
        .ok()?;
    for line in text.lines().take(10) {
        if let Some(caps) = pattern.captures(line) {
            let raw = caps.get(1)?.as_str();
            // Header lines often pack several fields separated by runs of
            // spaces; keep only the first one.
            let name = raw.split("  ").next().unwrap_or(raw).trim();
            if !name.is_empty() {
                return Some(name.to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExtractorConfig;

    fn cfg() -> CompiledConfig {
        ExtractorConfig::default().compile().unwrap()
    }

    #[test]
    fn test_note_number_from_label() {
        let cfg = cfg();
        let meta = extract_metadata("Nr. nota: 334455\nData pregão: 02/04/2025", "nota.txt", &cfg);
        assert_eq!(meta.note_number.as_deref(), Some("334455"));
        assert_eq!(meta.trade_date.as_deref(), Some("02/04/2025"));
    }

    #[test]
    fn test_two_digit_year_is_widened() {
        let cfg = cfg();
        let meta = extract_metadata("Data: 15/03/24", "nota.txt", &cfg);
        assert_eq!(meta.trade_date.as_deref(), Some("15/03/2024"));
    }

    #[test]
    fn test_dash_separated_date() {
        let cfg = cfg();
        let meta = extract_metadata("Data pregão: 02-04-2025", "nota.txt", &cfg);
        assert_eq!(meta.trade_date.as_deref(), Some("02/04/2025"));
    }

    #[test]
    fn test_filename_fallback_pair() {
        let cfg = cfg();
        let meta = extract_metadata(
            "nota sem rotulos reconheciveis",
            "008401877_20250402_20250403_BMF.pdf",
            &cfg,
        );
        assert_eq!(meta.note_number.as_deref(), Some("008401877"));
        // First 8-digit group wins.
        assert_eq!(meta.trade_date.as_deref(), Some("02/04/2025"));
    }

    #[test]
    fn test_text_patterns_beat_filename() {
        let cfg = cfg();
        let meta = extract_metadata(
            "Nr. nota: 999\nData pregão: 10/01/2025",
            "111_20240101_nota.txt",
            &cfg,
        );
        assert_eq!(meta.note_number.as_deref(), Some("999"));
        assert_eq!(meta.trade_date.as_deref(), Some("10/01/2025"));
    }

    #[test]
    fn test_embedded_eight_digit_capture() {
        let cfg = cfg();
        let meta = extract_metadata("arquivo 12345_20250402_20250403", "nota.txt", &cfg);
        assert_eq!(meta.trade_date.as_deref(), Some("02/04/2025"));
    }

    #[test]
    fn test_unparseable_capture_kept_verbatim() {
        assert_eq!(normalize_date_capture("02/2025"), "02/2025");
        assert_eq!(normalize_date_capture("abc"), "abc");
    }

    #[test]
    fn test_client_from_header() {
        let cfg = cfg();
        let meta = extract_metadata(
            "NOTA DE NEGOCIAÇÃO\nCliente: JOAO DA SILVA   CPF: 111.222.333-44",
            "nota.txt",
            &cfg,
        );
        assert_eq!(meta.client.as_deref(), Some("JOAO DA SILVA"));
    }

    #[test]
    fn test_absent_metadata_stays_absent() {
        let cfg = cfg();
        let meta = extract_metadata("texto qualquer", "nota.txt", &cfg);
        assert!(meta.note_number.is_none());
        assert!(meta.trade_date.is_none());
        assert!(meta.client.is_none());
        assert_eq!(meta.broker, "Unknown");
    }
}
