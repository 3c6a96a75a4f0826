//! Main entry point for the DeepL provider CLI

#![forbid(unsafe_code)]

use clap::Parser;
use dotenvy::dotenv;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use deepl_provider::cli::commands::{self, Commands};
use deepl_provider::provider::registry::default_registry;
use deepl_provider::ProviderConfig;

/// DeepL provider - translate text and inspect account usage
#[derive(Parser, Debug)]
#[command(name = "deepl-provider", version, about, long_about = None)]
struct Args {
    /// API key for DeepL (optional, defaults to DEEPL_API_KEY env var)
    #[arg(long)]
    api_key: Option<String>,

    /// Custom API endpoint
    #[arg(long)]
    endpoint: Option<String>,

    /// Request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Maximum concurrent requests during bulk translation
    #[arg(long)]
    max_concurrent: Option<usize>,

    /// Config file (TOML, JSON or YAML); DEEPL_* env vars override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Provider to use
    #[arg(long, default_value = "deepl")]
    provider: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();

    let args = Args::parse();

    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("deepl_provider={}", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let command = match args.command {
        Some(Commands::Providers) => return commands::handle_providers(),
        Some(command) => command,
        None => {
            println!("Please specify a command. Use --help for more information.");
            return Ok(());
        }
    };

    // Override config with CLI args if provided
    let mut config = ProviderConfig::load(args.config.as_deref())?;
    if let Some(api_key) = args.api_key {
        config.api_key = api_key;
    }
    if let Some(endpoint) = args.endpoint {
        config.endpoint = Some(endpoint);
    }
    if let Some(timeout) = args.timeout {
        config.timeout_secs = timeout;
    }
    if let Some(max_concurrent) = args.max_concurrent {
        config.max_concurrent = max_concurrent;
    }

    let provider = default_registry().create(&args.provider, config)?;

    match command {
        Commands::Translate {
            text,
            source_lang,
            target_lang,
        } => {
            commands::handle_translate(provider.as_ref(), text, source_lang, target_lang).await?;
        }
        Commands::Bulk {
            file,
            source_lang,
            target_lang,
        } => {
            commands::handle_bulk(provider.as_ref(), file, source_lang, target_lang).await?;
        }
        Commands::Usage => {
            commands::handle_usage(provider.as_ref()).await?;
        }
        Commands::Languages { fallback } => {
            commands::handle_languages(provider.as_ref(), fallback).await?;
        }
        Commands::Providers => commands::handle_providers()?,
    }

    Ok(())
}
