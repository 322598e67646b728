use std::collections::HashMap;

use async_trait::async_trait;

use super::provider::{ProviderError, RateProvider};

/// Backend-agnostic rate provider configuration.
///
/// `backend` must match the [`RateProviderFactory::backend_name`] of a
/// registered factory.  `source` is passed through to that factory
/// unchanged; its meaning is entirely backend-specific.
///
/// | backend | source examples                                  |
/// |---------|--------------------------------------------------|
/// | `http`  | `http://localhost:5000`, `https://rates.example` |
/// | `csv`   | `brackets.csv`, `bundled`                        |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Lowercase identifier matching a registered factory (e.g. `"http"`).
    pub backend: String,
    /// Opaque value forwarded to the factory's `create` method.
    pub source: String,
    /// Request timeout for backends that talk to a remote service.
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            backend: "http".to_string(),
            source: "http://localhost:5000".to_string(),
            timeout_secs: 30,
        }
    }
}

/// One implementation per provider backend.  Each backend crate exports a
/// single unit struct that implements this trait and is registered with a
/// [`ProviderRegistry`] at startup.
#[async_trait]
pub trait RateProviderFactory: Send + Sync {
    /// Unique, lowercase identifier for this backend.
    fn backend_name(&self) -> &'static str;

    /// Build a ready-to-use provider.  Implementations are free to load
    /// files or build HTTP clients inside this method.
    async fn create(
        &self,
        config: &ProviderConfig,
    ) -> Result<Box<dyn RateProvider>, ProviderError>;
}

/// Registry of [`RateProviderFactory`] instances, keyed by backend name.
///
/// Typical lifetime:
/// 1. Create with `ProviderRegistry::new()`.
/// 2. Call `register` once per known backend.
/// 3. Call `create` with the configured backend.
pub struct ProviderRegistry {
    factories: HashMap<&'static str, Box<dyn RateProviderFactory>>,
}

impl ProviderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a backend factory.
    ///
    /// If a factory with the same [`RateProviderFactory::backend_name`] is
    /// already present it is silently replaced.
    pub fn register(
        &mut self,
        factory: Box<dyn RateProviderFactory>,
    ) {
        self.factories.insert(factory.backend_name(), factory);
    }

    /// Names of every registered backend, sorted alphabetically.
    pub fn available_backends(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Dispatch to the factory that matches `config.backend` and return
    /// the provider it produces.
    ///
    /// # Errors
    /// * [`ProviderError::Configuration`]: no factory is registered for
    ///   the requested backend name.
    /// * Any error the chosen factory itself returns.
    pub async fn create(
        &self,
        config: &ProviderConfig,
    ) -> Result<Box<dyn RateProvider>, ProviderError> {
        let factory = self
            .factories
            .get(config.backend.as_str())
            .ok_or_else(|| {
                ProviderError::Configuration(format!(
                    "unknown backend '{}'; available: {:?}",
                    config.backend,
                    self.available_backends()
                ))
            })?;

        tracing::debug!(backend = %config.backend, source = %config.source, "creating rate provider");
        factory.create(config).await
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
