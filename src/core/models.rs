//! Core data models for translation results, usage and languages

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::core::errors::{ErrorKind, ProviderError};

/// Provider identifier reported in result metadata
pub const PROVIDER_ID: &str = "deepl";

/// Model identifier reported in result metadata
pub const MODEL_ID: &str = "deepl-api";

/// Outcome of a single translation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranslationStatus {
    Success,
    Error,
}

impl fmt::Display for TranslationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranslationStatus::Success => write!(f, "success"),
            TranslationStatus::Error => write!(f, "error"),
        }
    }
}

/// Metadata attached to a successful translation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationMetadata {
    pub detected_language: String,
    /// DeepL reports no scores, always 1.0
    pub confidence: f32,
    pub provider: String,
    pub model: String,
    pub billed_characters: usize,
}

/// Uniform result of a translate call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationResponse {
    pub translated_text: String,
    pub source_lang: String,
    pub target_lang: String,
    pub char_count: usize,
    pub status: TranslationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<TranslationMetadata>,
}

impl TranslationResponse {
    /// Successful no-op result for empty or whitespace-only input
    pub fn empty(source_lang: &str, target_lang: &str) -> Self {
        Self {
            translated_text: String::new(),
            source_lang: source_lang.to_string(),
            target_lang: target_lang.to_string(),
            char_count: 0,
            status: TranslationStatus::Success,
            error: None,
            error_kind: None,
            metadata: None,
        }
    }

    /// Successful translation with metadata
    pub fn success(
        text: &str,
        translated_text: String,
        source_lang: &str,
        target_lang: &str,
        detected_language: Option<&str>,
        billed_characters: Option<usize>,
    ) -> Self {
        let char_count = text.chars().count();
        let detected_language = detected_language
            .map(|lang| lang.to_lowercase())
            .unwrap_or_else(|| source_lang.to_string());

        Self {
            translated_text,
            source_lang: source_lang.to_string(),
            target_lang: target_lang.to_string(),
            char_count,
            status: TranslationStatus::Success,
            error: None,
            error_kind: None,
            metadata: Some(TranslationMetadata {
                detected_language,
                confidence: 1.0,
                provider: PROVIDER_ID.to_string(),
                model: MODEL_ID.to_string(),
                billed_characters: billed_characters.unwrap_or(char_count),
            }),
        }
    }

    /// Failed translation carrying a readable message and the error kind
    pub fn failure(
        text: &str,
        source_lang: &str,
        target_lang: &str,
        error: &ProviderError,
        message: String,
    ) -> Self {
        Self {
            translated_text: String::new(),
            source_lang: source_lang.to_string(),
            target_lang: target_lang.to_string(),
            char_count: text.chars().count(),
            status: TranslationStatus::Error,
            error: Some(message),
            error_kind: Some(error.kind()),
            metadata: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == TranslationStatus::Success
    }
}

/// Point-in-time usage snapshot of the account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageInfo {
    pub character_count: u64,
    pub character_limit: u64,
    pub character_limit_reached: bool,
    pub document_count: u64,
    pub document_limit: u64,
    pub team_document_count: u64,
    pub team_document_limit: u64,
    pub fetched_at: DateTime<Utc>,
}

impl UsageInfo {
    /// Build a snapshot from raw counts; the limit flag is derived from them
    pub fn new(character_count: u64, character_limit: u64) -> Self {
        Self {
            character_count,
            character_limit,
            character_limit_reached: character_count >= character_limit,
            document_count: 0,
            document_limit: 0,
            team_document_count: 0,
            team_document_limit: 0,
            fetched_at: Utc::now(),
        }
    }

    pub fn with_documents(mut self, count: u64, limit: u64) -> Self {
        self.document_count = count;
        self.document_limit = limit;
        self
    }

    pub fn with_team_documents(mut self, count: u64, limit: u64) -> Self {
        self.team_document_count = count;
        self.team_document_limit = limit;
        self
    }

    /// Characters left before the limit is hit
    pub fn remaining(&self) -> u64 {
        self.character_limit.saturating_sub(self.character_count)
    }

    /// Check if quota is low (less than 10% remaining)
    pub fn is_low(&self) -> bool {
        self.remaining() < self.character_limit / 10
    }
}

/// Language codes the service accepts, lower-cased
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportedLanguages {
    pub source: BTreeSet<String>,
    pub target: BTreeSet<String>,
}

const FALLBACK_SOURCE: &[&str] = &[
    "en", "de", "fr", "es", "pt", "it", "ru", "ja", "zh", "pl", "nl", "sv", "da", "no", "fi",
];

const FALLBACK_TARGET: &[&str] = &[
    "en-us", "en-gb", "de", "fr", "es", "pt-pt", "pt-br", "it", "ru", "ja", "zh", "pl", "nl",
    "sv", "da", "no", "fi",
];

impl SupportedLanguages {
    /// Build from raw codes as reported by the service
    pub fn from_codes<S, T>(source: S, target: T) -> Self
    where
        S: IntoIterator,
        S::Item: AsRef<str>,
        T: IntoIterator,
        T::Item: AsRef<str>,
    {
        Self {
            source: source.into_iter().map(|c| c.as_ref().to_lowercase()).collect(),
            target: target.into_iter().map(|c| c.as_ref().to_lowercase()).collect(),
        }
    }

    /// Common DeepL languages, for callers that cannot reach the service
    pub fn fallback() -> Self {
        Self::from_codes(FALLBACK_SOURCE, FALLBACK_TARGET)
    }

    pub fn supports_source(&self, code: &str) -> bool {
        self.source.contains(&code.to_lowercase())
    }

    pub fn supports_target(&self, code: &str) -> bool {
        self.target.contains(&code.to_lowercase())
    }
}
