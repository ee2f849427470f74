use anyhow::{Result, anyhow};
use isolang::Language;

/// Language utilities for language code handling
///
/// This module validates ISO 639 codes, maps generic codes to the formats
/// the translation backends expect, and makes a best-effort guess of the
/// language a text is written in.

/// Map an ISO 639-2/B code to its ISO 639-2/T equivalent, if it differs
fn part2b_to_part2t(code: &str) -> Option<&'static str> {
    let mapped = match code {
        "fre" => "fra",
        "ger" => "deu",
        "dut" => "nld",
        "gre" => "ell",
        "chi" => "zho",
        "cze" => "ces",
        "ice" => "isl",
        "alb" => "sqi",
        "arm" => "hye",
        "baq" => "eus",
        "bur" => "mya",
        "per" => "fas",
        "geo" => "kat",
        "may" => "msa",
        "mac" => "mkd",
        "rum" => "ron",
        "slo" => "slk",
        "wel" => "cym",
        _ => return None,
    };
    Some(mapped)
}

/// Strip a region or script suffix: `pt-BR` → `pt`, `zh_Hant` → `zh`
pub fn base_code(code: &str) -> String {
    code.trim()
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_lowercase()
}

/// Resolve a language code (optionally region-qualified) to an isolang language
fn resolve(code: &str) -> Option<Language> {
    let base = base_code(code);
    match base.len() {
        2 => Language::from_639_1(&base),
        3 => Language::from_639_3(part2b_to_part2t(&base).unwrap_or(base.as_str())),
        _ => None,
    }
}

/// Validate a target language code such as `de`, `deu`, `ger` or `pt-BR`
pub fn validate_target_language(code: &str) -> Result<()> {
    resolve(code)
        .map(|_| ())
        .ok_or_else(|| anyhow!("Invalid language code: {}", code))
}

/// Normalize a language code to ISO 639-2/T (3-letter) format
pub fn normalize_to_part2t(code: &str) -> Result<String> {
    resolve(code)
        .map(|lang| lang.to_639_3().to_string())
        .ok_or_else(|| anyhow!("Cannot normalize invalid language code: {}", code))
}

/// Normalize a language code to ISO 639-1 (2-letter) format if possible
/// Falls back to ISO 639-2/T if no ISO 639-1 code exists
pub fn normalize_to_part1_or_part2t(code: &str) -> Result<String> {
    let lang = resolve(code)
        .ok_or_else(|| anyhow!("Cannot normalize invalid language code: {}", code))?;

    Ok(lang
        .to_639_1()
        .map(|c| c.to_string())
        .unwrap_or_else(|| lang.to_639_3().to_string()))
}

/// Check if two language codes match (represent the same language)
pub fn language_codes_match(code1: &str, code2: &str) -> bool {
    match (normalize_to_part2t(code1), normalize_to_part2t(code2)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Get the English language name from a code
pub fn get_language_name(code: &str) -> Result<String> {
    let lang = resolve(code).ok_or_else(|| anyhow!("Failed to get language from code: {}", code))?;
    Ok(lang.to_name().to_string())
}

/// Target code in the format DeepL expects
///
/// DeepL wants region-qualified codes for English and Portuguese; anything
/// not in the table is passed through upper-cased.
pub fn deepl_target_code(code: &str) -> String {
    let lower = code.trim().to_lowercase();
    let mapped = match lower.as_str() {
        "en" => "EN-GB",
        "de" => "DE",
        "fr" => "FR",
        "es" => "ES",
        "it" => "IT",
        "nl" => "NL",
        "pt" => "PT-PT",
        "sv" => "SV",
        "da" => "DA",
        "fi" => "FI",
        "no" => "NO",
        "pl" => "PL",
        _ => return code.trim().to_uppercase(),
    };
    mapped.to_string()
}

/// Target code in the format Google Translate expects
pub fn google_target_code(code: &str) -> String {
    let lower = code.trim().to_lowercase().replace('_', "-");
    match lower.as_str() {
        "zh" => "zh-CN".to_string(),
        "zh-cn" => "zh-CN".to_string(),
        "zh-tw" => "zh-TW".to_string(),
        _ => lower,
    }
}

/// Best-effort guess of the language a text is written in
///
/// Returns the ISO 639-1 code of the detected language, or `None` when the
/// text has no letters or the language has no two-letter code.
pub fn detect_language(text: &str) -> Option<&'static str> {
    let info = whatlang::detect(text)?;
    let code = info.lang().code();
    // Mandarin has no 639-1 code of its own
    if code == "cmn" {
        return Some("zh");
    }
    Language::from_639_3(code).and_then(|language| language.to_639_1())
}
