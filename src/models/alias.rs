//! Deterministic spellings under which an engine id is also reachable.

use std::sync::OnceLock;

use regex::Regex;

fn camel_boundary_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([a-z0-9])([A-Z])").expect("valid camel boundary regex"))
}

fn letter_digit_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([a-zA-Z])([0-9]+)").expect("valid letter digit regex"))
}

fn separator_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[_\s]+").expect("valid separator regex"))
}

fn dash_run_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"-+").expect("valid dash run regex"))
}

fn kebab(value: &str) -> String {
    let value = separator_regex().replace_all(value, "-");
    dash_run_regex().replace_all(&value, "-").to_lowercase()
}

/// `klingV2Turbo` -> `kling-v2-turbo`
pub fn camel_to_kebab(engine_id: &str) -> String {
    kebab(&camel_boundary_regex().replace_all(engine_id, "${1}-${2}"))
}

/// `kling25turbo` -> `kling-25turbo`
pub fn digits_to_kebab(engine_id: &str) -> String {
    kebab(&letter_digit_regex().replace_all(engine_id, "${1}-${2}"))
}

/// The id itself followed by its lowercase, camel-kebab and digit-kebab
/// spellings, without duplicates or empty strings. Order is registration
/// priority.
pub fn alias_variants(engine_id: &str) -> Vec<String> {
    let candidates = [
        engine_id.to_string(),
        engine_id.to_lowercase(),
        camel_to_kebab(engine_id),
        digits_to_kebab(engine_id),
    ];

    let mut variants: Vec<String> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if !candidate.is_empty() && !variants.contains(&candidate) {
            variants.push(candidate);
        }
    }
    variants
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kebab_id_is_stable() {
        assert_eq!(alias_variants("kling-2-5-turbo"), vec!["kling-2-5-turbo"]);
    }

    #[test]
    fn test_camel_case_variants() {
        let variants = alias_variants("Veo3Fast");
        assert_eq!(variants, vec!["Veo3Fast", "veo3fast", "veo3-fast", "veo-3fast"]);
    }

    #[test]
    fn test_separators_collapse() {
        assert_eq!(camel_to_kebab("luma__ray  flash"), "luma-ray-flash");
        assert_eq!(digits_to_kebab("sora_2--pro"), "sora-2-pro");
    }

    #[test]
    fn test_letter_digit_boundary() {
        assert_eq!(digits_to_kebab("kling25turbo"), "kling-25turbo");
        assert_eq!(digits_to_kebab("pika22"), "pika-22");
    }

    #[test]
    fn test_empty_id_has_no_variants() {
        assert!(alias_variants("").is_empty());
    }
}
