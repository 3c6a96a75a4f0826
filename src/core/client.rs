//! DeepL translation client with sync, async and batch variants

use futures::stream::{self, StreamExt};
use once_cell::sync::OnceCell;
use std::time::Duration;
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::task;
use tracing::{debug, error, info, warn};

use crate::core::api::{
    self, ApiTranslation, LanguageType, TranslateRequestBody, LANGUAGES_PATH,
    MAX_REQUEST_BYTES, MAX_TEXTS_PER_REQUEST, REQUEST_ENVELOPE_BYTES, TRANSLATE_PATH, USAGE_PATH,
};
use crate::core::config::{ApiTier, ProviderConfig};
use crate::core::errors::{ProviderError, Result};
use crate::core::languages::LanguagePair;
use crate::core::models::{SupportedLanguages, TranslationResponse, UsageInfo};

/// DeepL's character limit per text
pub const MAX_TEXT_CHARS: usize = 30_000;

/// How a sync call reaches the service from the current thread
enum SyncMode {
    /// No runtime here, the blocking client can be used
    Blocking,
    /// Inside a multi-thread runtime; the async path is driven in place
    InRuntime(Handle),
    /// Inside a current-thread runtime, where nothing may block
    Unavailable,
}

fn sync_mode() -> SyncMode {
    match Handle::try_current() {
        Err(_) => SyncMode::Blocking,
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            SyncMode::InRuntime(handle)
        }
        Ok(_) => SyncMode::Unavailable,
    }
}

fn no_blocking_runtime() -> ProviderError {
    ProviderError::config(
        "Sync call made inside a current-thread tokio runtime, use the async variant instead",
    )
}

/// DeepL translation adapter
///
/// The async client is built up front. The blocking client is only created
/// on the first sync call made outside a tokio runtime, so an adapter used
/// from async code never owns a blocking runtime. Sync calls made inside a
/// multi-thread runtime run the async path through `block_in_place`.
#[derive(Debug)]
pub struct DeepLTranslator {
    config: ProviderConfig,
    base_url: String,
    client: reqwest::Client,
    blocking: OnceCell<reqwest::blocking::Client>,
}

impl DeepLTranslator {
    /// Create a new translator, validating the configuration
    pub fn new(config: ProviderConfig) -> Result<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(api::default_headers(&config.api_key)?)
            .pool_idle_timeout(Some(Duration::from_secs(30)))
            .build()
            .map_err(|e| ProviderError::config(format!("Failed to build HTTP client: {}", e)))?;

        let base_url = config.base_url();
        info!("DeepL translator ready ({:?} tier, {})", config.tier(), base_url);

        Ok(Self {
            config,
            base_url,
            client,
            blocking: OnceCell::new(),
        })
    }

    /// Create from environment
    pub fn from_env() -> anyhow::Result<Self> {
        let config = ProviderConfig::from_env()?;
        Ok(Self::new(config)?)
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    pub fn tier(&self) -> ApiTier {
        self.config.tier()
    }

    pub fn is_free_api(&self) -> bool {
        self.tier() == ApiTier::Free
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn blocking_client(&self) -> Result<&reqwest::blocking::Client> {
        self.blocking.get_or_try_init(|| {
            debug!("Creating blocking HTTP client");
            reqwest::blocking::Client::builder()
                .timeout(Duration::from_secs(self.config.timeout_secs))
                .default_headers(api::default_headers(&self.config.api_key)?)
                .build()
                .map_err(|e| ProviderError::config(format!("Failed to build HTTP client: {}", e)))
        })
    }

    /// Translate a single text
    pub fn translate(&self, text: &str, source_lang: &str, target_lang: &str) -> TranslationResponse {
        if text.trim().is_empty() {
            return TranslationResponse::empty(source_lang, target_lang);
        }

        let body = match prepare_single(text, source_lang, target_lang) {
            Ok(body) => body,
            Err(e) => return local_failure(text, source_lang, target_lang, e),
        };

        match sync_mode() {
            SyncMode::InRuntime(handle) => {
                return task::block_in_place(|| {
                    handle.block_on(self.translate_async(text, source_lang, target_lang))
                });
            }
            SyncMode::Unavailable => {
                return local_failure(text, source_lang, target_lang, no_blocking_runtime());
            }
            SyncMode::Blocking => {}
        }

        match self.send_translate_blocking(&body) {
            Ok(mut translations) => {
                let translation = translations.remove(0);
                success(text, source_lang, target_lang, translation)
            }
            Err(e) => remote_failure(text, source_lang, target_lang, e),
        }
    }

    /// Translate a single text without blocking
    pub async fn translate_async(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> TranslationResponse {
        if text.trim().is_empty() {
            return TranslationResponse::empty(source_lang, target_lang);
        }

        let body = match prepare_single(text, source_lang, target_lang) {
            Ok(body) => body,
            Err(e) => return local_failure(text, source_lang, target_lang, e),
        };

        match self.send_translate(&body).await {
            Ok(mut translations) => {
                let translation = translations.remove(0);
                success(text, source_lang, target_lang, translation)
            }
            Err(e) => remote_failure(text, source_lang, target_lang, e),
        }
    }

    /// Translate many texts, one result per input in input order
    pub fn bulk_translate<S: AsRef<str>>(
        &self,
        texts: &[S],
        source_lang: &str,
        target_lang: &str,
    ) -> Vec<TranslationResponse> {
        match sync_mode() {
            SyncMode::InRuntime(handle) => {
                return task::block_in_place(|| {
                    handle.block_on(self.bulk_translate_async(texts, source_lang, target_lang))
                });
            }
            SyncMode::Unavailable => {
                let mut batch = Batch::plan(texts, source_lang, target_lang);
                for (indices, _) in batch.jobs() {
                    batch.reject(&indices, no_blocking_runtime);
                }
                return batch.finish();
            }
            SyncMode::Blocking => {}
        }

        let mut batch = Batch::plan(texts, source_lang, target_lang);

        for (indices, body) in batch.jobs() {
            let outcome = self.send_translate_blocking(&body);
            batch.complete(&indices, outcome);
        }

        batch.finish()
    }

    /// Translate many texts without blocking.
    ///
    /// Requests run concurrently up to `max_concurrent`; results keep input order.
    pub async fn bulk_translate_async<S: AsRef<str>>(
        &self,
        texts: &[S],
        source_lang: &str,
        target_lang: &str,
    ) -> Vec<TranslationResponse> {
        let mut batch = Batch::plan(texts, source_lang, target_lang);

        let outcomes: Vec<_> = stream::iter(batch.jobs())
            .map(move |(indices, body)| async move {
                let outcome = self.send_translate(&body).await;
                (indices, outcome)
            })
            .buffered(self.config.max_concurrent)
            .collect()
            .await;

        for (indices, outcome) in outcomes {
            batch.complete(&indices, outcome);
        }

        batch.finish()
    }

    /// Current usage snapshot, fetched fresh
    pub fn get_usage_info(&self) -> Result<UsageInfo> {
        match sync_mode() {
            SyncMode::InRuntime(handle) => {
                return task::block_in_place(|| handle.block_on(self.get_usage_info_async()));
            }
            SyncMode::Unavailable => return Err(no_blocking_runtime()),
            SyncMode::Blocking => {}
        }

        let body = self.get_blocking(USAGE_PATH, &[]).map_err(|e| {
            error!("Error fetching usage info: {}", e);
            e
        })?;
        api::parse_usage(&body)
    }

    pub async fn get_usage_info_async(&self) -> Result<UsageInfo> {
        let body = self.get(USAGE_PATH, &[]).await.map_err(|e| {
            error!("Error fetching usage info: {}", e);
            e
        })?;
        api::parse_usage(&body)
    }

    /// Source and target languages as reported by the service right now
    pub fn get_supported_languages(&self) -> Result<SupportedLanguages> {
        match sync_mode() {
            SyncMode::InRuntime(handle) => {
                return task::block_in_place(|| {
                    handle.block_on(self.get_supported_languages_async())
                });
            }
            SyncMode::Unavailable => return Err(no_blocking_runtime()),
            SyncMode::Blocking => {}
        }

        let source = self.fetch_languages_blocking(LanguageType::Source)?;
        let target = self.fetch_languages_blocking(LanguageType::Target)?;
        Ok(SupportedLanguages::from_codes(source, target))
    }

    pub async fn get_supported_languages_async(&self) -> Result<SupportedLanguages> {
        let (source, target) = futures::try_join!(
            self.fetch_languages(LanguageType::Source),
            self.fetch_languages(LanguageType::Target)
        )?;
        Ok(SupportedLanguages::from_codes(source, target))
    }

    fn fetch_languages_blocking(&self, kind: LanguageType) -> Result<Vec<String>> {
        let body = self.get_blocking(LANGUAGES_PATH, &kind.as_query()).map_err(|e| {
            error!("Error fetching supported languages: {}", e);
            e
        })?;
        api::parse_languages(&body)
    }

    async fn fetch_languages(&self, kind: LanguageType) -> Result<Vec<String>> {
        let body = self.get(LANGUAGES_PATH, &kind.as_query()).await.map_err(|e| {
            error!("Error fetching supported languages: {}", e);
            e
        })?;
        api::parse_languages(&body)
    }

    /// Send a translate request on the async client
    async fn send_translate(&self, body: &TranslateRequestBody) -> Result<Vec<ApiTranslation>> {
        debug!(
            "POST {} ({} texts, target {})",
            TRANSLATE_PATH,
            body.text.len(),
            body.target_lang
        );

        let response = self
            .client
            .post(self.url(TRANSLATE_PATH))
            .json(body)
            .send()
            .await
            .map_err(|e| api::transport_error(e, self.config.timeout_secs))?;

        let text = read_async(response, self.config.timeout_secs).await?;
        api::parse_translations(&text, body.text.len())
    }

    /// Send a translate request on the blocking client
    fn send_translate_blocking(&self, body: &TranslateRequestBody) -> Result<Vec<ApiTranslation>> {
        debug!(
            "POST {} ({} texts, target {})",
            TRANSLATE_PATH,
            body.text.len(),
            body.target_lang
        );

        let response = self
            .blocking_client()?
            .post(self.url(TRANSLATE_PATH))
            .json(body)
            .send()
            .map_err(|e| api::transport_error(e, self.config.timeout_secs))?;

        let text = read_blocking(response, self.config.timeout_secs)?;
        api::parse_translations(&text, body.text.len())
    }

    async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<String> {
        debug!("GET {}", path);
        let response = self
            .client
            .get(self.url(path))
            .query(query)
            .send()
            .await
            .map_err(|e| api::transport_error(e, self.config.timeout_secs))?;

        read_async(response, self.config.timeout_secs).await
    }

    fn get_blocking(&self, path: &str, query: &[(&str, &str)]) -> Result<String> {
        debug!("GET {}", path);
        let response = self
            .blocking_client()?
            .get(self.url(path))
            .query(query)
            .send()
            .map_err(|e| api::transport_error(e, self.config.timeout_secs))?;

        read_blocking(response, self.config.timeout_secs)
    }
}

async fn read_async(response: reqwest::Response, timeout_secs: u64) -> Result<String> {
    let status = response.status();
    let retry_after = api::retry_after(response.headers());
    let text = response
        .text()
        .await
        .map_err(|e| api::transport_error(e, timeout_secs))?;

    if status.is_success() {
        Ok(text)
    } else {
        Err(api::status_error(status, retry_after, &text))
    }
}

fn read_blocking(response: reqwest::blocking::Response, timeout_secs: u64) -> Result<String> {
    let status = response.status();
    let retry_after = api::retry_after(response.headers());
    let text = response
        .text()
        .map_err(|e| api::transport_error(e, timeout_secs))?;

    if status.is_success() {
        Ok(text)
    } else {
        Err(api::status_error(status, retry_after, &text))
    }
}

fn check_length(text: &str) -> Result<()> {
    let len = text.chars().count();
    if len > MAX_TEXT_CHARS {
        return Err(ProviderError::translation(format!(
            "Text length ({}) exceeds DeepL's maximum of {} characters",
            len, MAX_TEXT_CHARS
        )));
    }
    Ok(())
}

fn prepare_single(text: &str, source_lang: &str, target_lang: &str) -> Result<TranslateRequestBody> {
    check_length(text)?;
    let pair = LanguagePair::resolve(source_lang, target_lang)?;
    Ok(TranslateRequestBody::new(vec![text.to_string()], &pair))
}

fn success(
    text: &str,
    source_lang: &str,
    target_lang: &str,
    translation: ApiTranslation,
) -> TranslationResponse {
    TranslationResponse::success(
        text,
        translation.text,
        source_lang,
        target_lang,
        translation.detected_source_language.as_deref(),
        translation.billed_characters,
    )
}

fn local_failure(
    text: &str,
    source_lang: &str,
    target_lang: &str,
    err: ProviderError,
) -> TranslationResponse {
    warn!("Translation rejected: {}", err);
    let message = message_of(&err);
    TranslationResponse::failure(text, source_lang, target_lang, &err, message)
}

/// Bare message of a locally raised error, without the variant prefix
fn message_of(err: &ProviderError) -> String {
    match err {
        ProviderError::TranslationError { message } | ProviderError::ConfigError { message } => {
            message.clone()
        }
        other => other.to_string(),
    }
}

fn remote_failure(
    text: &str,
    source_lang: &str,
    target_lang: &str,
    err: ProviderError,
) -> TranslationResponse {
    error!("DeepL API error: {}", err);
    let message = format!("DeepL API error: {}", err);
    TranslationResponse::failure(text, source_lang, target_lang, &err, message)
}

/// Per-item bookkeeping of a batch call
struct Batch {
    texts: Vec<String>,
    source_lang: String,
    target_lang: String,
    pair: Option<LanguagePair>,
    slots: Vec<Option<TranslationResponse>>,
    pending: Vec<usize>,
}

impl Batch {
    /// Settle everything that needs no request and queue the rest
    fn plan<S: AsRef<str>>(texts: &[S], source_lang: &str, target_lang: &str) -> Self {
        let texts: Vec<String> = texts.iter().map(|t| t.as_ref().to_string()).collect();
        let mut slots: Vec<Option<TranslationResponse>> = vec![None; texts.len()];
        let mut pending = Vec::new();

        let pair = LanguagePair::resolve(source_lang, target_lang);
        let pair_error = pair.as_ref().err().map(message_of);

        for (i, text) in texts.iter().enumerate() {
            if text.trim().is_empty() {
                continue;
            }

            let checked = match &pair_error {
                Some(message) => Err(ProviderError::translation(message.clone())),
                None => check_length(text),
            };

            match checked {
                Ok(()) => pending.push(i),
                Err(e) => slots[i] = Some(local_failure(text, source_lang, target_lang, e)),
            }
        }

        debug!(
            "Batch of {} texts: {} to send, {} settled locally",
            texts.len(),
            pending.len(),
            texts.len() - pending.len()
        );

        Self {
            texts,
            source_lang: source_lang.to_string(),
            target_lang: target_lang.to_string(),
            pair: pair.ok(),
            slots,
            pending,
        }
    }

    /// Request bodies for the queued texts, with the indices each carries
    fn jobs(&self) -> Vec<(Vec<usize>, TranslateRequestBody)> {
        let Some(pair) = &self.pair else {
            return Vec::new();
        };

        self.chunks()
            .into_iter()
            .map(|indices| {
                let text = indices.iter().map(|&i| self.texts[i].clone()).collect();
                (indices, TranslateRequestBody::new(text, pair))
            })
            .collect()
    }

    /// Group queued items into requests bounded by text count and body size.
    /// An item too large to share a request goes out alone.
    fn chunks(&self) -> Vec<Vec<usize>> {
        let mut chunks = Vec::new();
        let mut current: Vec<usize> = Vec::new();
        let mut bytes = REQUEST_ENVELOPE_BYTES;

        for &i in &self.pending {
            let size = api::encoded_text_len(&self.texts[i]);
            let full = current.len() == MAX_TEXTS_PER_REQUEST
                || bytes.saturating_add(size) > MAX_REQUEST_BYTES;
            if full && !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                bytes = REQUEST_ENVELOPE_BYTES;
            }
            bytes = bytes.saturating_add(size);
            current.push(i);
        }

        if !current.is_empty() {
            chunks.push(current);
        }
        chunks
    }

    /// Fail queued items locally without sending them
    fn reject(&mut self, indices: &[usize], err: impl Fn() -> ProviderError) {
        for &i in indices {
            self.slots[i] = Some(local_failure(
                &self.texts[i],
                &self.source_lang,
                &self.target_lang,
                err(),
            ));
        }
    }

    /// Record the outcome of one request
    fn complete(&mut self, indices: &[usize], outcome: Result<Vec<ApiTranslation>>) {
        match outcome {
            Ok(translations) => {
                for (&i, translation) in indices.iter().zip(translations) {
                    self.slots[i] = Some(success(
                        &self.texts[i],
                        &self.source_lang,
                        &self.target_lang,
                        translation,
                    ));
                }
            }
            Err(e) => {
                error!("DeepL bulk translation error: {}", e);
                let message = format!("DeepL API error: {}", e);
                for &i in indices {
                    self.slots[i] = Some(TranslationResponse::failure(
                        &self.texts[i],
                        &self.source_lang,
                        &self.target_lang,
                        &e,
                        message.clone(),
                    ));
                }
            }
        }
    }

    /// Fill untouched slots (empty inputs) and return results in input order
    fn finish(self) -> Vec<TranslationResponse> {
        let source_lang = self.source_lang;
        let target_lang = self.target_lang;
        self.slots
            .into_iter()
            .map(|slot| slot.unwrap_or_else(|| TranslationResponse::empty(&source_lang, &target_lang)))
            .collect()
    }
}
