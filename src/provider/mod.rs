//! Provider abstraction for hosts that discover translators by name

use async_trait::async_trait;
use serde::Serialize;
use std::fmt::Debug;

use crate::core::client::{DeepLTranslator, MAX_TEXT_CHARS};
use crate::core::errors::Result;
use crate::core::models::{SupportedLanguages, TranslationResponse, UsageInfo};

pub mod registry;

/// Static description of a provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderInfo {
    pub name: &'static str,
    pub requires_region: bool,
    pub supports_async: bool,
    /// Oldest host framework version this provider works with
    pub min_supported_version: &'static str,
    /// Characters accepted per text
    pub max_chunk_size: usize,
}

/// Metadata of the DeepL provider
pub const DEEPL_INFO: ProviderInfo = ProviderInfo {
    name: "deepl",
    requires_region: false,
    supports_async: true,
    min_supported_version: "0.1.8",
    max_chunk_size: MAX_TEXT_CHARS,
};

/// Common surface of every translation provider
#[async_trait]
pub trait TranslationProvider: Send + Sync + Debug {
    /// Static provider metadata
    fn info(&self) -> ProviderInfo;

    fn name(&self) -> &'static str {
        self.info().name
    }

    fn translate(&self, text: &str, source_lang: &str, target_lang: &str) -> TranslationResponse;

    fn bulk_translate(
        &self,
        texts: &[String],
        source_lang: &str,
        target_lang: &str,
    ) -> Vec<TranslationResponse>;

    async fn translate_async(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> TranslationResponse;

    async fn bulk_translate_async(
        &self,
        texts: &[String],
        source_lang: &str,
        target_lang: &str,
    ) -> Vec<TranslationResponse>;

    fn get_usage_info(&self) -> Result<UsageInfo>;

    async fn get_usage_info_async(&self) -> Result<UsageInfo>;

    fn get_supported_languages(&self) -> Result<SupportedLanguages>;

    async fn get_supported_languages_async(&self) -> Result<SupportedLanguages>;
}

#[async_trait]
impl TranslationProvider for DeepLTranslator {
    fn info(&self) -> ProviderInfo {
        DEEPL_INFO
    }

    fn translate(&self, text: &str, source_lang: &str, target_lang: &str) -> TranslationResponse {
        DeepLTranslator::translate(self, text, source_lang, target_lang)
    }

    fn bulk_translate(
        &self,
        texts: &[String],
        source_lang: &str,
        target_lang: &str,
    ) -> Vec<TranslationResponse> {
        DeepLTranslator::bulk_translate(self, texts, source_lang, target_lang)
    }

    async fn translate_async(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> TranslationResponse {
        DeepLTranslator::translate_async(self, text, source_lang, target_lang).await
    }

    async fn bulk_translate_async(
        &self,
        texts: &[String],
        source_lang: &str,
        target_lang: &str,
    ) -> Vec<TranslationResponse> {
        DeepLTranslator::bulk_translate_async(self, texts, source_lang, target_lang).await
    }

    fn get_usage_info(&self) -> Result<UsageInfo> {
        DeepLTranslator::get_usage_info(self)
    }

    async fn get_usage_info_async(&self) -> Result<UsageInfo> {
        DeepLTranslator::get_usage_info_async(self).await
    }

    fn get_supported_languages(&self) -> Result<SupportedLanguages> {
        DeepLTranslator::get_supported_languages(self)
    }

    async fn get_supported_languages_async(&self) -> Result<SupportedLanguages> {
        DeepLTranslator::get_supported_languages_async(self).await
    }
}
