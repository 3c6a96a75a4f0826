//! DeepL Provider - DeepL translation adapter for provider-discovery hosts
//!
//! This library wraps the DeepL REST API behind a uniform result shape, with
//! sync, async and batch translation plus usage and language lookups.

#![forbid(unsafe_code)]

pub mod cli;
pub mod core;
pub mod provider;

// Re-export key types for convenience
pub use crate::core::{
    client::{DeepLTranslator, MAX_TEXT_CHARS},
    config::{ApiTier, ProviderConfig},
    errors::{ErrorKind, ProviderError},
    models::{
        SupportedLanguages, TranslationMetadata, TranslationResponse, TranslationStatus,
        UsageInfo,
    },
};

pub use crate::provider::{
    registry::{get_provider, ProviderRegistry},
    ProviderInfo, TranslationProvider,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
