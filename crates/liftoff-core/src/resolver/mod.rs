//! Declared-to-actual base URL resolution.
//!
//! A descriptor's `BaseURL` may be an indirection (such as a GitHub
//! "latest release" page) rather than the place files are served from.
//! [`UrlResolver`] runs an ordered chain of [`BaseUrlStrategy`] lookups,
//! memoizing the outcome per declared URL for its own lifetime.

mod github;

pub use github::{GitHubLatestRelease, parse_tag_version};

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, info};
use url::Url;

use crate::net::Retriever;
use crate::version::Version;

/// Where remote files for a descriptor are really fetched from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActualBaseUrl {
    pub url: Url,
    /// Release version reported alongside the URL, if any.
    pub release_version: Option<Version>,
}

impl ActualBaseUrl {
    /// The declared URL used as is.
    pub fn direct(url: Url) -> Self {
        Self {
            url,
            release_version: None,
        }
    }
}

/// A single way of turning a declared base URL into an actual one.
pub trait BaseUrlStrategy: Send + Sync {
    fn name(&self) -> &str;

    /// Returns `None` when the strategy does not apply or cannot decide.
    fn lookup(&self, declared: &Url, descriptor_file_name: &str) -> Option<ActualBaseUrl>;
}

/// Cached, ordered chain of base URL strategies.
pub struct UrlResolver {
    cache: Mutex<HashMap<String, ActualBaseUrl>>,
    strategies: Vec<Box<dyn BaseUrlStrategy>>,
}

impl UrlResolver {
    /// Resolver with the default strategies.
    pub fn new(retriever: Arc<dyn Retriever>) -> Self {
        Self::with_strategies(vec![Box::new(GitHubLatestRelease::new(retriever))])
    }

    pub fn with_strategies(strategies: Vec<Box<dyn BaseUrlStrategy>>) -> Self {
        Self {
            cache: Mutex::new(HashMap::new()),
            strategies,
        }
    }

    /// Resolver that always uses the declared URL.
    pub fn direct() -> Self {
        Self::with_strategies(Vec::new())
    }

    /// Resolve `declared`, consulting the cache first.
    pub fn resolve(&self, declared: &Url, descriptor_file_name: &str) -> ActualBaseUrl {
        let key = declared.as_str().to_string();

        if let Some(cached) = self.lock_cache().get(&key) {
            debug!("Actual base URL for {} found in cache: {}", key, cached.url);
            return cached.clone();
        }

        let resolved = self
            .strategies
            .iter()
            .find_map(|strategy| {
                let found = strategy.lookup(declared, descriptor_file_name)?;
                info!(
                    "Actual base URL found by {} strategy: {}",
                    strategy.name(),
                    found.url
                );
                Some(found)
            })
            .unwrap_or_else(|| {
                debug!("The actual base URL matches the declared one: {}", declared);
                ActualBaseUrl::direct(declared.clone())
            });

        self.lock_cache().insert(key, resolved.clone());
        resolved
    }

    /// Number of memoized declared URLs.
    pub fn cached_len(&self) -> usize {
        self.lock_cache().len()
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, HashMap<String, ActualBaseUrl>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for UrlResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.strategies.iter().map(|s| s.name()).collect();
        f.debug_struct("UrlResolver")
            .field("strategies", &names)
            .field("cached", &self.cached_len())
            .finish()
    }
}
