use crate::config::CompiledConfig;

/// Identify the issuing broker from the document text. The signature table
/// is ordered; the first match anywhere in the text wins.
pub fn identify_broker(text: &str, cfg: &CompiledConfig) -> String {
    for (name, pattern) in &cfg.brokers {
        if pattern.is_match(text) {
            return name.clone();
        }
    }
    "Unknown".to_string()
}
