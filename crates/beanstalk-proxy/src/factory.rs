//! Proxy cache and factory
//!
//! Proxies are cached by (class-loader scope, implementation type). The first
//! request for a key synthesizes; concurrent first requests for the same key
//! wait for that single synthesis instead of defining duplicates.
//!
//! The cache is unbounded: a proxy class lives as long as its scope, and
//! entries leave only through [`ProxyFactory::evict_scope`].

use crate::class::ProxyClass;
use crate::error::ProxyGenerationError;
use crate::scope::{ClassLoaderScope, LoaderId};
use crate::synthesizer::{ProxyRequest, ProxySynthesizer};
use beanstalk_model::TypeName;
use moka::sync::Cache;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::trace;

/// Cache key: scope plus implementation type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProxyCacheKey {
    /// Scope the proxy is defined in
    pub loader: LoaderId,
    /// Implementation type
    pub class: TypeName,
}

/// Statistics for cache monitoring
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProxyCacheStats {
    /// Number of cached proxies
    pub entry_count: u64,
    /// Number of syntheses performed
    pub syntheses: u64,
}

/// Caching proxy factory
#[derive(Debug)]
pub struct ProxyFactory {
    synthesizer: ProxySynthesizer,
    cache: Cache<ProxyCacheKey, Arc<ProxyClass>>,
    syntheses: AtomicU64,
}

impl Default for ProxyFactory {
    fn default() -> Self {
        Self::new(ProxySynthesizer::new())
    }
}

impl ProxyFactory {
    /// Create a factory
    #[must_use]
    pub fn new(synthesizer: ProxySynthesizer) -> Self {
        Self {
            synthesizer,
            cache: Cache::builder().name("proxy-classes").build(),
            syntheses: AtomicU64::new(0),
        }
    }

    /// Underlying synthesizer
    #[inline]
    #[must_use]
    pub fn synthesizer(&self) -> &ProxySynthesizer {
        &self.synthesizer
    }

    /// Cached proxy, or synthesize and cache one
    ///
    /// # Errors
    /// Returns the synthesis error; failures are not cached.
    pub fn get_or_create(
        &self,
        scope: &ClassLoaderScope,
        request: ProxyRequest<'_>,
    ) -> Result<Arc<ProxyClass>, ProxyGenerationError> {
        let key = ProxyCacheKey {
            loader: scope.id(),
            class: request.class.clone(),
        };
        self.cache
            .try_get_with(key, || {
                self.syntheses.fetch_add(1, Ordering::Relaxed);
                self.synthesizer.synthesize(scope, request)
            })
            .map_err(|e| (*e).clone())
    }

    /// Cached proxy without synthesizing
    #[must_use]
    pub fn cached(&self, scope: &ClassLoaderScope, class: &TypeName) -> Option<Arc<ProxyClass>> {
        let key = ProxyCacheKey {
            loader: scope.id(),
            class: class.clone(),
        };
        let hit = self.cache.get(&key);
        trace!(class = %class, hit = hit.is_some(), "proxy cache lookup");
        hit
    }

    /// Drop every cached proxy of a scope, for scope teardown
    ///
    /// The scope keeps its defined classes; only call this once the scope
    /// itself is discarded.
    pub fn evict_scope(&self, loader: LoaderId) {
        let keys: Vec<_> = self
            .cache
            .iter()
            .filter(|(k, _)| k.loader == loader)
            .map(|(k, _)| (*k).clone())
            .collect();
        for key in keys {
            self.cache.invalidate(&key);
        }
    }

    /// Cache statistics
    #[must_use]
    pub fn stats(&self) -> ProxyCacheStats {
        self.cache.run_pending_tasks();
        ProxyCacheStats {
            entry_count: self.cache.entry_count(),
            syntheses: self.syntheses.load(Ordering::Relaxed),
        }
    }
}
