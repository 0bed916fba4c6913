use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use tracing::{info, warn};

use super::{RuleSet, RuleSetError};
use crate::underwriting::domain::Domain;

#[derive(Debug, Clone)]
enum RuleSource {
    /// `<dir>/<domain>.json`, falling back to the bundled set when unusable.
    Directory(PathBuf),
    Bundled,
    /// Only the rule sets handed to the constructor.
    Fixed,
}

/// Read-only lookup of compiled rule sets per domain. Each domain loads at most once,
/// on first use or through [`RuleRegistry::preload`].
#[derive(Debug)]
pub struct RuleRegistry {
    source: RuleSource,
    slots: [OnceLock<Result<Arc<RuleSet>, RuleSetError>>; 4],
}

impl RuleRegistry {
    fn with_source(source: RuleSource) -> Self {
        Self {
            source,
            slots: Default::default(),
        }
    }

    /// Rule sets compiled into the crate.
    pub fn bundled() -> Self {
        Self::with_source(RuleSource::Bundled)
    }

    pub fn with_directory(dir: impl Into<PathBuf>) -> Self {
        Self::with_source(RuleSource::Directory(dir.into()))
    }

    /// Registry bound to the given rule sets; other domains have no session available.
    pub fn from_rule_sets(rule_sets: impl IntoIterator<Item = RuleSet>) -> Self {
        let registry = Self::with_source(RuleSource::Fixed);
        for rule_set in rule_sets {
            let slot = &registry.slots[rule_set.domain.index()];
            // A later set for the same domain is ignored.
            let _ = slot.set(Ok(Arc::new(rule_set)));
        }
        registry
    }

    pub fn rule_set(&self, domain: Domain) -> Result<Arc<RuleSet>, RuleSetError> {
        self.slots[domain.index()]
            .get_or_init(|| self.load(domain))
            .clone()
    }

    /// Initialize every catalog domain, returning the outcome per domain.
    pub fn preload(&self) -> Vec<(Domain, Result<Arc<RuleSet>, RuleSetError>)> {
        Domain::ALL
            .into_iter()
            .map(|domain| (domain, self.rule_set(domain)))
            .collect()
    }

    /// Load every domain's `<dir>/<domain>.json` without falling back to the bundled
    /// sets, so a broken directory reports its own errors.
    pub fn validate_directory(
        dir: &std::path::Path,
    ) -> Vec<(Domain, Result<RuleSet, RuleSetError>)> {
        Domain::ALL
            .into_iter()
            .map(|domain| (domain, from_directory(dir, domain)))
            .collect()
    }

    fn load(&self, domain: Domain) -> Result<Arc<RuleSet>, RuleSetError> {
        let loaded = match &self.source {
            RuleSource::Fixed => Err(RuleSetError::Missing(domain)),
            RuleSource::Bundled => bundled(domain),
            RuleSource::Directory(dir) => from_directory(dir, domain).or_else(|err| {
                warn!(%domain, error = %err, "rule directory unusable, falling back to bundled rules");
                bundled(domain)
            }),
        };

        if let Ok(rule_set) = &loaded {
            info!(
                %domain,
                version = %rule_set.version,
                rules = rule_set.rules.len(),
                "rule set loaded"
            );
        }
        loaded.map(Arc::new)
    }
}

fn from_directory(dir: &std::path::Path, domain: Domain) -> Result<RuleSet, RuleSetError> {
    let path = dir.join(format!("{domain}.json"));
    let body = std::fs::read_to_string(&path).map_err(|err| RuleSetError::Unreadable {
        domain,
        path: path.display().to_string(),
        reason: err.to_string(),
    })?;
    RuleSet::from_json(domain, &body)
}

fn bundled(domain: Domain) -> Result<RuleSet, RuleSetError> {
    RuleSet::from_json(domain, bundled_document(domain))
}

pub(crate) fn bundled_document(domain: Domain) -> &'static str {
    match domain {
        Domain::Auto => include_str!("../../../rules/auto.json"),
        Domain::Life => include_str!("../../../rules/life.json"),
        Domain::Mortgage => include_str!("../../../rules/mortgage.json"),
        Domain::Travel => include_str!("../../../rules/travel.json"),
    }
}
