use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, trace};

use super::domain::{Configuration, Domain};
use super::error::UnderwritingError;

/// Read-only document store addressed by relative paths such as `mortgage/default.json`.
pub trait ConfigSource: Send + Sync {
    fn read(&self, path: &str) -> Result<String, ConfigSourceError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigSourceError {
    #[error("document not found")]
    NotFound,
    #[error("document unreadable: {0}")]
    Unreadable(#[from] io::Error),
}

/// Configuration documents laid out under a directory on disk.
#[derive(Debug, Clone)]
pub struct DirectoryConfigSource {
    root: PathBuf,
}

impl DirectoryConfigSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }
}

impl ConfigSource for DirectoryConfigSource {
    fn read(&self, path: &str) -> Result<String, ConfigSourceError> {
        std::fs::read_to_string(self.root.join(path)).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => ConfigSourceError::NotFound,
            _ => ConfigSourceError::Unreadable(err),
        })
    }
}

/// Map-backed source for tests and embedded deployments.
#[derive(Debug, Clone, Default)]
pub struct InMemoryConfigSource {
    documents: BTreeMap<String, String>,
}

impl InMemoryConfigSource {
    pub fn with_document(mut self, path: impl Into<String>, body: impl Into<String>) -> Self {
        self.insert(path, body);
        self
    }

    pub fn insert(&mut self, path: impl Into<String>, body: impl Into<String>) {
        self.documents.insert(path.into(), body.into());
    }
}

impl ConfigSource for InMemoryConfigSource {
    fn read(&self, path: &str) -> Result<String, ConfigSourceError> {
        self.documents
            .get(path)
            .cloned()
            .ok_or(ConfigSourceError::NotFound)
    }
}

/// Precedence tiers, most specific first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigTier {
    ProductClient,
    Client,
    DomainDefault,
}

impl ConfigTier {
    pub const ORDER: [ConfigTier; 3] = [
        ConfigTier::ProductClient,
        ConfigTier::Client,
        ConfigTier::DomainDefault,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            ConfigTier::ProductClient => "product_client",
            ConfigTier::Client => "client",
            ConfigTier::DomainDefault => "domain_default",
        }
    }

    /// Document path for this tier, or `None` when an identifier cannot address a document.
    pub fn path(self, domain: Domain, product: &str, client_id: &str) -> Option<String> {
        match self {
            ConfigTier::ProductClient => (is_path_safe(product) && is_path_safe(client_id))
                .then(|| format!("{domain}/{product}-{client_id}.json")),
            ConfigTier::Client => {
                is_path_safe(client_id).then(|| format!("{domain}/{client_id}.json"))
            }
            ConfigTier::DomainDefault => Some(format!("{domain}/default.json")),
        }
    }
}

fn is_path_safe(segment: &str) -> bool {
    !segment.is_empty()
        && !segment.contains("..")
        && !segment.contains(['/', '\\'])
        && !segment.chars().any(char::is_control)
}

/// Picks the first configuration tier that exists and parses. Tiers are never merged.
#[derive(Clone)]
pub struct ConfigurationResolver {
    source: Arc<dyn ConfigSource>,
}

impl ConfigurationResolver {
    pub fn new(source: Arc<dyn ConfigSource>) -> Self {
        Self { source }
    }

    pub fn from_directory(root: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(DirectoryConfigSource::new(root)))
    }

    /// Resolver that never finds a document, so every decision runs without overrides.
    pub fn empty() -> Self {
        Self::new(Arc::new(InMemoryConfigSource::default()))
    }

    pub fn resolve(&self, domain: Domain, product: &str, client_id: &str) -> Configuration {
        self.resolve_with_tier(domain, product, client_id).0
    }

    /// Resolve and report which tier supplied the document.
    pub fn resolve_with_tier(
        &self,
        domain: Domain,
        product: &str,
        client_id: &str,
    ) -> (Configuration, Option<ConfigTier>) {
        for tier in ConfigTier::ORDER {
            let Some(path) = tier.path(domain, product, client_id) else {
                trace!(tier = tier.label(), "identifier cannot address a configuration tier");
                continue;
            };

            match self.load(&path) {
                Ok(config) => {
                    debug!(tier = tier.label(), %path, options = config.len(), "configuration resolved");
                    return (config, Some(tier));
                }
                Err(err) => trace!(tier = tier.label(), error = %err, "configuration tier skipped"),
            }
        }

        debug!(%domain, product, client_id, "no configuration tier resolved, using empty configuration");
        (Configuration::empty(), None)
    }

    fn load(&self, path: &str) -> Result<Configuration, UnderwritingError> {
        let unavailable = |reason: String| UnderwritingError::ConfigurationUnavailable {
            path: path.to_string(),
            reason,
        };

        let body = self
            .source
            .read(path)
            .map_err(|err| unavailable(err.to_string()))?;
        match serde_json::from_str::<Value>(&body) {
            Ok(Value::Object(options)) => Ok(Configuration::from(options)),
            Ok(_) => Err(unavailable("document is not a JSON object".to_string())),
            Err(err) => Err(unavailable(err.to_string())),
        }
    }
}

impl std::fmt::Debug for ConfigurationResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigurationResolver").finish_non_exhaustive()
    }
}
