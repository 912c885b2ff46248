use anyhow::{Result, anyhow};
use isolang::Language;

/// Language utilities for translation targets
///
/// This module holds the fixed set of target languages offered to users and
/// helpers for validating and naming language codes.
/// Target languages accepted by the pipeline (Google-style tags)
pub const SUPPORTED_TARGET_LANGUAGES: &[&str] = &[
    "af", "sq", "am", "ar", "hy", "as", "ay", "az", "bm", "eu", "be", "bn", "bho", "bs", "bg",
    "ca", "ceb", "ny", "zh-CN", "zh-TW", "co", "hr", "cs", "da", "dv", "doi", "nl", "en", "eo",
    "et", "ee", "tl", "fi", "fr", "fy", "gl", "ka", "de", "el", "gn", "gu", "ht", "ha", "haw",
    "iw", "hi", "hmn", "hu", "is", "ig", "ilo", "id", "ga", "it", "ja", "jw", "kn", "kk", "km",
    "rw", "gom", "ko", "kri", "ku", "ckb", "ky", "lo", "la", "lv", "ln", "lt", "lg", "lb", "mk",
    "mai", "mg", "ms", "ml", "mt", "mi", "mr", "mni-Mtei", "lus", "mn", "my", "ne", "no", "or",
    "om", "ps", "fa", "pl", "pt", "pa", "qu", "ro", "ru", "sm", "sa", "gd", "nso", "sr", "st",
    "sn", "sd", "si", "sk", "sl", "so", "es", "su", "sw", "sv", "tg", "ta", "tt", "te", "th",
    "ti", "ts", "tr", "tk", "ak", "uk", "ur", "ug", "uz", "vi", "cy", "xh", "yi", "yo", "zu",
];

/// Source language value that lets the backend detect the language
pub const AUTO_DETECT: &str = "auto";

/// Check whether `code` is one of the supported target languages
pub fn is_supported_target(code: &str) -> bool {
    SUPPORTED_TARGET_LANGUAGES
        .iter()
        .any(|supported| supported.eq_ignore_ascii_case(code.trim()))
}

/// Validate a source language code.
///
/// Accepts `auto`, any supported target tag, and any ISO 639-1/639-3 code.
pub fn validate_source_language(code: &str) -> Result<()> {
    let code = code.trim();
    if code.eq_ignore_ascii_case(AUTO_DETECT) || is_supported_target(code) || iso_language(code).is_some() {
        Ok(())
    } else {
        Err(anyhow!("Invalid source language code: '{}'", code))
    }
}

/// Primary subtag of a tag such as `zh-CN`, lowercased
fn primary_subtag(code: &str) -> String {
    code.trim().split('-').next().unwrap_or_default().to_lowercase()
}

/// Resolve a code (or its primary subtag) through ISO 639-1 or 639-3
fn iso_language(code: &str) -> Option<Language> {
    let primary = primary_subtag(code);
    match primary.len() {
        2 => Language::from_639_1(&primary),
        3 => Language::from_639_3(&primary),
        _ => None,
    }
}

/// Check if two language codes refer to the same language
pub fn language_codes_match(code1: &str, code2: &str) -> bool {
    if code1.trim().eq_ignore_ascii_case(code2.trim()) {
        return true;
    }

    match (iso_language(code1), iso_language(code2)) {
        (Some(a), Some(b)) => a == b && primary_subtag(code1) != "zh",
        _ => false,
    }
}

/// Get the English language name for a code, falling back to the code itself
/// for tags isolang does not know (e.g. `mni-Mtei`, legacy `iw`/`jw`)
pub fn get_language_name(code: &str) -> String {
    match primary_subtag(code).as_str() {
        "iw" => return "Hebrew".to_string(),
        "jw" => return "Javanese".to_string(),
        _ => {}
    }

    match iso_language(code) {
        Some(lang) => {
            let name = lang.to_name();
            if code.contains('-') {
                format!("{} ({})", name, code.trim())
            } else {
                name.to_string()
            }
        }
        None => code.trim().to_string(),
    }
}
