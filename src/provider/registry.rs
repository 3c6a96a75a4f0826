//! Registry of compiled-in translation providers

use once_cell::sync::Lazy;
use std::collections::HashMap;
use tracing::debug;

use crate::core::client::DeepLTranslator;
use crate::core::config::ProviderConfig;
use crate::core::errors::{ProviderError, Result};
use crate::provider::{ProviderInfo, TranslationProvider, DEEPL_INFO};

/// Builds provider instances from configuration
pub trait ProviderFactory: Send + Sync {
    /// Metadata of the providers this factory produces
    fn info(&self) -> ProviderInfo;

    /// Create a provider; configuration errors surface here
    fn create(&self, config: ProviderConfig) -> Result<Box<dyn TranslationProvider>>;
}

/// Factory for [`DeepLTranslator`]
#[derive(Debug, Default, Clone, Copy)]
pub struct DeepLFactory;

impl ProviderFactory for DeepLFactory {
    fn info(&self) -> ProviderInfo {
        DEEPL_INFO
    }

    fn create(&self, config: ProviderConfig) -> Result<Box<dyn TranslationProvider>> {
        Ok(Box::new(DeepLTranslator::new(config)?))
    }
}

/// Name-keyed provider registry
pub struct ProviderRegistry {
    factories: HashMap<&'static str, Box<dyn ProviderFactory>>,
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.factories.keys().collect();
        names.sort();
        f.debug_struct("ProviderRegistry")
            .field("providers", &names)
            .finish()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registry with every compiled-in provider
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(DeepLFactory));
        registry
    }

    /// Register a factory under its provider name, replacing any previous one
    pub fn register(&mut self, factory: Box<dyn ProviderFactory>) {
        let name = factory.info().name;
        debug!("Registering provider '{}'", name);
        self.factories.insert(name, factory);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Get a factory by provider name
    pub fn get(&self, name: &str) -> Option<&dyn ProviderFactory> {
        self.factories.get(name).map(|f| &**f)
    }

    /// Instantiate a provider by name
    pub fn create(&self, name: &str, config: ProviderConfig) -> Result<Box<dyn TranslationProvider>> {
        let factory = self
            .get(name)
            .ok_or_else(|| ProviderError::config(format!("Unknown provider: {}", name)))?;
        factory.create(config)
    }

    /// Infos of all providers, sorted by name
    pub fn list(&self) -> Vec<ProviderInfo> {
        let mut infos: Vec<ProviderInfo> = self.factories.values().map(|f| f.info()).collect();
        infos.sort_by(|a, b| a.name.cmp(b.name));
        infos
    }
}

static DEFAULT_REGISTRY: Lazy<ProviderRegistry> = Lazy::new(ProviderRegistry::with_builtin);

/// Process-wide registry of compiled-in providers
pub fn default_registry() -> &'static ProviderRegistry {
    &DEFAULT_REGISTRY
}

/// Look up a provider factory in the default registry
pub fn get_provider(name: &str) -> Option<&'static dyn ProviderFactory> {
    default_registry().get(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::ErrorKind;

    #[test]
    fn test_provider_discovery() {
        let factory = get_provider("deepl").expect("deepl is built in");
        let provider = factory.create(ProviderConfig::new("test-deepl-key:fx")).unwrap();

        assert_eq!(provider.name(), "deepl");
        assert_eq!(factory.info(), DEEPL_INFO);
    }

    #[test]
    fn test_unknown_provider() {
        assert!(get_provider("google").is_none());

        let registry = ProviderRegistry::with_builtin();
        let err = registry
            .create("google", ProviderConfig::new("key"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_create_propagates_config_errors() {
        let err = default_registry()
            .create("deepl", ProviderConfig::new(""))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_list_and_register() {
        let mut registry = ProviderRegistry::new();
        assert!(registry.list().is_empty());
        assert!(!registry.contains("deepl"));

        registry.register(Box::new(DeepLFactory));
        registry.register(Box::new(DeepLFactory));

        let names: Vec<_> = registry.list().into_iter().map(|i| i.name).collect();
        assert_eq!(names, vec!["deepl"]);
        assert!(format!("{:?}", registry).contains("deepl"));
    }
}
