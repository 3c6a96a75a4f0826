//! CLI command definitions and handlers

use clap::Subcommand;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::core::models::{SupportedLanguages, TranslationResponse};
use crate::provider::registry::default_registry;
use crate::provider::TranslationProvider;

/// Commands for the DeepL provider CLI
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Translate a single text
    Translate {
        /// Text to translate
        text: String,

        /// Source language ("auto" to detect)
        #[arg(short, long, default_value = "auto")]
        source_lang: String,

        /// Target language
        #[arg(short, long)]
        target_lang: String,
    },

    /// Translate every line of a file, printing a JSON array
    Bulk {
        /// Input file, one text per line
        #[arg(short, long)]
        file: PathBuf,

        /// Source language ("auto" to detect)
        #[arg(short, long, default_value = "auto")]
        source_lang: String,

        /// Target language
        #[arg(short, long)]
        target_lang: String,
    },

    /// Show character and document usage of the account
    Usage,

    /// List source and target languages
    Languages {
        /// Print a built-in list if the service cannot be reached
        #[arg(long)]
        fallback: bool,
    },

    /// List compiled-in providers
    Providers,
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Handle single translation command
pub async fn handle_translate(
    provider: &dyn TranslationProvider,
    text: String,
    source_lang: String,
    target_lang: String,
) -> anyhow::Result<()> {
    let result = provider.translate_async(&text, &source_lang, &target_lang).await;
    report_failure(&result);
    print_json(&result)
}

/// Handle bulk translation command
pub async fn handle_bulk(
    provider: &dyn TranslationProvider,
    file: PathBuf,
    source_lang: String,
    target_lang: String,
) -> anyhow::Result<()> {
    use indicatif::{ProgressBar, ProgressStyle};

    let start_time = Instant::now();
    let content = std::fs::read_to_string(&file)?;
    let texts: Vec<String> = content.lines().map(|l| l.to_string()).collect();

    info!("Input: {}", file.display());
    info!("Texts: {}", texts.len());
    info!("Target language: {}", target_lang);

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.set_message(format!("Translating {} texts", texts.len()));
    pb.enable_steady_tick(Duration::from_millis(100));

    let results = provider
        .bulk_translate_async(&texts, &source_lang, &target_lang)
        .await;

    pb.finish_and_clear();

    let failed = results.iter().filter(|r| !r.is_success()).count();
    results.iter().for_each(report_failure);

    info!(
        "Completed: {} translated, {} failed in {:?}",
        results.len() - failed,
        failed,
        start_time.elapsed()
    );

    print_json(&results)
}

/// Handle usage command
pub async fn handle_usage(provider: &dyn TranslationProvider) -> anyhow::Result<()> {
    let usage = provider.get_usage_info_async().await?;

    if usage.character_limit_reached {
        warn!("Character limit reached");
    } else if usage.is_low() {
        warn!("Less than 10% of the character quota left ({} characters)", usage.remaining());
    }

    print_json(&usage)
}

/// Handle languages command
pub async fn handle_languages(
    provider: &dyn TranslationProvider,
    fallback: bool,
) -> anyhow::Result<()> {
    let languages = match provider.get_supported_languages_async().await {
        Ok(languages) => languages,
        Err(e) if fallback => {
            warn!("Using built-in language list: {}", e);
            SupportedLanguages::fallback()
        }
        Err(e) => return Err(e.into()),
    };

    print_json(&languages)
}

/// Handle providers command
pub fn handle_providers() -> anyhow::Result<()> {
    print_json(&default_registry().list())
}

fn report_failure(result: &TranslationResponse) {
    if let Some(error) = &result.error {
        warn!("Translation failed: {}", error);
    }
}
