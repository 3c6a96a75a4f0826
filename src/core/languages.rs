//! Language code normalization for the DeepL API

use once_cell::sync::Lazy;
use regex::Regex;

use crate::core::errors::{ProviderError, Result};

/// Sentinel asking the service to detect the source language
pub const AUTO_DETECT: &str = "auto";

/// Bare target codes the service only accepts as a regional variant
const TARGET_VARIANTS: &[(&str, &str)] = &[
    ("en", "EN-US"),
    ("pt", "PT-PT"),
];

static LANGUAGE_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z]{2,3}(-[A-Za-z0-9]{2,4})?$").expect("language tag pattern is valid")
});

/// Source and target codes in the form the service expects
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguagePair {
    /// `None` lets the service detect the source language
    pub source: Option<String>,
    pub target: String,
}

impl LanguagePair {
    /// Normalize a caller-supplied source/target pair
    pub fn resolve(source_lang: &str, target_lang: &str) -> Result<Self> {
        Ok(Self {
            source: normalize_source(source_lang)?,
            target: normalize_target(target_lang)?,
        })
    }
}

/// Map a target code to the service's variant.
///
/// Codes listed in the variant table get their default region, everything
/// else is upper-cased unchanged.
pub fn normalize_target(code: &str) -> Result<String> {
    let code = validate(code)?;

    let mapped = TARGET_VARIANTS
        .iter()
        .find(|(bare, _)| bare.eq_ignore_ascii_case(code))
        .map(|(_, variant)| variant.to_string())
        .unwrap_or_else(|| code.to_ascii_uppercase());

    Ok(mapped)
}

/// Map a source code to its upper-cased root, or `None` for auto-detection.
pub fn normalize_source(code: &str) -> Result<Option<String>> {
    if code.trim().eq_ignore_ascii_case(AUTO_DETECT) {
        return Ok(None);
    }

    let code = validate(code)?;
    Ok(Some(root_code(code).to_ascii_uppercase()))
}

/// Strip any regional part: `en-US` -> `en`
pub fn root_code(code: &str) -> &str {
    code.split('-').next().unwrap_or(code)
}

fn validate(code: &str) -> Result<&str> {
    let code = code.trim();
    if LANGUAGE_TAG.is_match(code) {
        Ok(code)
    } else {
        Err(ProviderError::translation(format!(
            "Unsupported language code: '{}'",
            code
        )))
    }
}
