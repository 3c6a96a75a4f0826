//! DeepL REST v2 wire types and response decoding

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, RETRY_AFTER, USER_AGENT};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::core::errors::{ProviderError, Result};
use crate::core::languages::LanguagePair;
use crate::core::models::UsageInfo;

pub const TRANSLATE_PATH: &str = "/v2/translate";
pub const USAGE_PATH: &str = "/v2/usage";
pub const LANGUAGES_PATH: &str = "/v2/languages";

/// Maximum number of texts DeepL accepts in one translate request
pub const MAX_TEXTS_PER_REQUEST: usize = 50;

/// Body size budget of one translate request, below DeepL's 128 KiB limit
pub const MAX_REQUEST_BYTES: usize = 120 * 1024;

/// Room left for the fields of a translate body other than `text`
pub const REQUEST_ENVELOPE_BYTES: usize = 256;

/// DeepL's quota-exceeded status code
const STATUS_QUOTA_EXCEEDED: u16 = 456;

/// Body of `POST /v2/translate`
#[derive(Debug, Clone, Serialize)]
pub struct TranslateRequestBody {
    pub text: Vec<String>,
    pub target_lang: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_lang: Option<String>,
    pub show_billed_characters: bool,
}

impl TranslateRequestBody {
    pub fn new(text: Vec<String>, pair: &LanguagePair) -> Self {
        Self {
            text,
            target_lang: pair.target.clone(),
            source_lang: pair.source.clone(),
            show_billed_characters: true,
        }
    }
}

/// One entry of the translate response
#[derive(Debug, Clone, Deserialize)]
pub struct ApiTranslation {
    pub text: String,
    #[serde(default)]
    pub detected_source_language: Option<String>,
    #[serde(default)]
    pub billed_characters: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct TranslateResponseBody {
    translations: Vec<ApiTranslation>,
}

#[derive(Debug, Deserialize)]
struct UsageResponseBody {
    #[serde(default)]
    character_count: u64,
    #[serde(default)]
    character_limit: u64,
    #[serde(default)]
    document_count: u64,
    #[serde(default)]
    document_limit: u64,
    #[serde(default)]
    team_document_count: u64,
    #[serde(default)]
    team_document_limit: u64,
}

#[derive(Debug, Deserialize)]
struct ApiLanguage {
    language: String,
}

/// `type` query parameter of the languages endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageType {
    Source,
    Target,
}

impl LanguageType {
    pub fn as_query(&self) -> [(&'static str, &'static str); 1] {
        match self {
            LanguageType::Source => [("type", "source")],
            LanguageType::Target => [("type", "target")],
        }
    }
}

/// Bytes a text adds to the `text` array of a request body, separator included
pub fn encoded_text_len(text: &str) -> usize {
    serde_json::to_string(text).map_or(usize::MAX, |encoded| encoded.len() + 1)
}

/// Headers sent with every request
pub fn default_headers(api_key: &str) -> Result<HeaderMap> {
    let mut auth = HeaderValue::from_str(&format!("DeepL-Auth-Key {}", api_key.trim()))
        .map_err(|_| ProviderError::config("API key contains invalid header characters"))?;
    auth.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, auth);
    headers.insert(
        USER_AGENT,
        HeaderValue::from_static(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"))),
    );
    Ok(headers)
}

/// Seconds from a numeric `Retry-After` header
pub fn retry_after(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
}

/// Map a non-success status to the provider's error taxonomy
pub fn status_error(status: StatusCode, retry_after: Option<u64>, body: &str) -> ProviderError {
    let message = error_message(body);

    match status.as_u16() {
        400 => ProviderError::translation(format!("Bad request: {}", message)),
        401 | 403 => ProviderError::config(format!(
            "Authorization failure, check API key: {}",
            message
        )),
        413 => ProviderError::translation(format!("Request size limit exceeded: {}", message)),
        429 => ProviderError::RateLimitError { retry_after },
        STATUS_QUOTA_EXCEEDED => ProviderError::QuotaExceededError { message },
        code => ProviderError::ApiError {
            status: code,
            message,
        },
    }
}

/// Pull `message` out of a DeepL error body, falling back to the raw text
fn error_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        message: String,
        #[serde(default)]
        detail: Option<String>,
    }

    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            message,
            detail: Some(detail),
        }) => format!("{}, {}", message, detail),
        Ok(ErrorBody { message, .. }) => message,
        Err(_) if body.trim().is_empty() => "no details".to_string(),
        Err(_) => body.trim().to_string(),
    }
}

/// Map a transport failure from either reqwest client
pub fn transport_error(err: reqwest::Error, timeout_secs: u64) -> ProviderError {
    if err.is_timeout() {
        ProviderError::TimeoutError { timeout_secs }
    } else {
        ProviderError::NetworkError {
            message: err.to_string(),
        }
    }
}

fn invalid(err: serde_json::Error) -> ProviderError {
    ProviderError::InvalidResponseError {
        message: err.to_string(),
    }
}

/// Decode a translate response, checking it has one entry per text sent
pub fn parse_translations(body: &str, expected: usize) -> Result<Vec<ApiTranslation>> {
    let parsed: TranslateResponseBody = serde_json::from_str(body).map_err(invalid)?;

    if parsed.translations.len() != expected {
        return Err(ProviderError::InvalidResponseError {
            message: format!(
                "Expected {} translations, got {}",
                expected,
                parsed.translations.len()
            ),
        });
    }

    Ok(parsed.translations)
}

pub fn parse_usage(body: &str) -> Result<UsageInfo> {
    let usage: UsageResponseBody = serde_json::from_str(body).map_err(invalid)?;

    Ok(UsageInfo::new(usage.character_count, usage.character_limit)
        .with_documents(usage.document_count, usage.document_limit)
        .with_team_documents(usage.team_document_count, usage.team_document_limit))
}

/// Decode a languages response into its codes
pub fn parse_languages(body: &str) -> Result<Vec<String>> {
    let languages: Vec<ApiLanguage> = serde_json::from_str(body).map_err(invalid)?;
    Ok(languages.into_iter().map(|l| l.language).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::ErrorKind;
    use assert_json_diff::assert_json_eq;

    #[test]
    fn test_encoded_text_len_counts_escapes() {
        assert_eq!(encoded_text_len("abc"), 6);
        assert_eq!(encoded_text_len("a\"b"), 7);
        assert_eq!(encoded_text_len("é"), 5);
    }

    #[test]
    fn test_request_body_shape() {
        let pair = LanguagePair::resolve("en", "de").unwrap();
        let body = TranslateRequestBody::new(vec!["Hello world".into()], &pair);

        assert_json_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({
                "text": ["Hello world"],
                "target_lang": "DE",
                "source_lang": "EN",
                "show_billed_characters": true
            })
        );
    }

    #[test]
    fn test_request_body_omits_auto_source() {
        let pair = LanguagePair::resolve("auto", "en").unwrap();
        let body = TranslateRequestBody::new(vec!["Bonjour".into()], &pair);
        let json = serde_json::to_value(&body).unwrap();

        assert!(json.get("source_lang").is_none());
        assert_eq!(json["target_lang"], "EN-US");
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (400, ErrorKind::Translation),
            (403, ErrorKind::Configuration),
            (413, ErrorKind::Translation),
            (429, ErrorKind::RateLimit),
            (456, ErrorKind::Provider),
            (503, ErrorKind::Provider),
        ];

        for (code, kind) in cases {
            let status = StatusCode::from_u16(code).unwrap();
            assert_eq!(status_error(status, None, "").kind(), kind, "status {}", code);
        }
    }

    #[test]
    fn test_quota_and_rate_limit_details() {
        let err = status_error(
            StatusCode::from_u16(456).unwrap(),
            None,
            r#"{"message": "Quota exceeded"}"#,
        );
        assert!(matches!(err, ProviderError::QuotaExceededError { ref message } if message == "Quota exceeded"));

        let err = status_error(StatusCode::TOO_MANY_REQUESTS, Some(2), "");
        assert!(matches!(err, ProviderError::RateLimitError { retry_after: Some(2) }));
    }

    #[test]
    fn test_error_message_with_detail() {
        let err = status_error(
            StatusCode::BAD_REQUEST,
            None,
            r#"{"message": "Value for 'target_lang' not supported.", "detail": "XX"}"#,
        );
        assert_eq!(
            err.to_string(),
            "Translation error: Bad request: Value for 'target_lang' not supported., XX"
        );
    }

    #[test]
    fn test_retry_after_header() {
        let mut headers = HeaderMap::new();
        assert_eq!(retry_after(&headers), None);

        headers.insert(RETRY_AFTER, HeaderValue::from_static("7"));
        assert_eq!(retry_after(&headers), Some(7));
    }

    #[test]
    fn test_default_headers() {
        let headers = default_headers("abc:fx").unwrap();
        assert_eq!(headers[AUTHORIZATION], "DeepL-Auth-Key abc:fx");
        assert!(headers[USER_AGENT].to_str().unwrap().starts_with("deepl-provider/"));

        assert!(default_headers("bad\nkey").is_err());
    }

    #[test]
    fn test_parse_translations_count_mismatch() {
        let body = r#"{"translations": [{"text": "Hola", "detected_source_language": "EN"}]}"#;
        assert_eq!(parse_translations(body, 1).unwrap()[0].text, "Hola");

        let err = parse_translations(body, 2).unwrap_err();
        assert!(matches!(err, ProviderError::InvalidResponseError { .. }));
        assert!(parse_translations("not json", 1).is_err());
    }

    #[test]
    fn test_parse_usage() {
        let usage = parse_usage(r#"{"character_count": 12345, "character_limit": 500000}"#).unwrap();
        assert_eq!(usage.character_count, 12345);
        assert_eq!(usage.character_limit, 500000);
        assert!(!usage.character_limit_reached);
        assert_eq!(usage.document_count, 0);
    }

    #[test]
    fn test_parse_languages() {
        let codes = parse_languages(
            r#"[{"language": "EN", "name": "English"}, {"language": "DE", "name": "German"}]"#,
        )
        .unwrap();
        assert_eq!(codes, vec!["EN".to_string(), "DE".to_string()]);
    }
}
