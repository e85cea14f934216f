//! Chain construction and caching keyed by call identity.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use courier_protocol::MethodSignature;

use crate::chain::{Interceptor, InterceptorChain};
use crate::invoker::Invoker;

/// Tracing target for chain cache operations.
pub(crate) const CACHE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::cache");

/// Call identity a cached chain is stored under.
///
/// Derived from the resolved target and the formatted method signature; when
/// either is absent the key degenerates to the empty default, giving one
/// shared chain for all untyped calls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ChainKey(String);

impl ChainKey {
    /// Derives a key from the resolved target and method signature.
    #[must_use]
    pub fn from_parts(target: Option<&str>, signature: Option<&MethodSignature>) -> Self {
        match (target, signature) {
            (Some(target), Some(signature)) => Self(format!("{target}::{signature}")),
            _ => Self::default(),
        }
    }

    /// The derived key text (empty for the degenerate key).
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChainKey {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

/// The statically configured recipe chains are built from.
///
/// Holds the ordered interceptor list and the terminal invoker; built chains
/// share both through `Arc`, so building is cheap and idempotent.
#[derive(Clone)]
pub struct ChainBlueprint {
    interceptors: Vec<Arc<dyn Interceptor>>,
    terminal: Arc<dyn Invoker>,
}

impl ChainBlueprint {
    /// Creates a blueprint from an ordered interceptor list and a terminal
    /// invoker.
    #[must_use]
    pub fn new(interceptors: Vec<Arc<dyn Interceptor>>, terminal: Arc<dyn Invoker>) -> Self {
        Self {
            interceptors,
            terminal,
        }
    }

    /// Builds a chain sharing this blueprint's interceptors and invoker.
    #[must_use]
    pub fn build(&self) -> InterceptorChain {
        InterceptorChain::new(self.interceptors.clone(), Arc::clone(&self.terminal))
    }
}

impl fmt::Debug for ChainBlueprint {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self
            .interceptors
            .iter()
            .map(|interceptor| interceptor.name())
            .collect();
        formatter
            .debug_struct("ChainBlueprint")
            .field("interceptors", &names)
            .finish_non_exhaustive()
    }
}

/// Insert-if-absent cache of built chains keyed by call identity.
///
/// Lookups are concurrent; a racing first use may build the chain twice, but
/// construction is idempotent and only one instance is stored. Entries are
/// never evicted — the key space is bounded by the registered handlers and
/// their method tables.
pub struct ChainCache {
    blueprint: ChainBlueprint,
    // Writers only insert fully built chains, so a poisoned lock still
    // guards a structurally intact map and accesses recover from it.
    chains: RwLock<HashMap<ChainKey, Arc<InterceptorChain>>>,
}

impl ChainCache {
    /// Creates an empty cache over a blueprint.
    #[must_use]
    pub fn new(blueprint: ChainBlueprint) -> Self {
        Self {
            blueprint,
            chains: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the chain for a key, building and storing it on first use.
    #[must_use]
    pub fn get_or_build(&self, key: &ChainKey) -> Arc<InterceptorChain> {
        {
            let chains = self.chains.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(chain) = chains.get(key) {
                return Arc::clone(chain);
            }
        }

        // Built outside the write lock; a racing builder may get here too
        // and the first insert wins.
        let built = Arc::new(self.blueprint.build());
        let mut chains = self.chains.write().unwrap_or_else(PoisonError::into_inner);
        let chain = chains.entry(key.clone()).or_insert_with(|| {
            debug!(target: CACHE_TARGET, key = %key, "built interceptor chain");
            built
        });
        Arc::clone(chain)
    }

    /// Number of cached chains.
    #[must_use]
    pub fn len(&self) -> usize {
        self.chains
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the cache holds no chains.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for ChainCache {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ChainCache")
            .field("blueprint", &self.blueprint)
            .field("cached", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::invoker::RegistryInvoker;

    use super::*;

    fn blueprint() -> ChainBlueprint {
        ChainBlueprint::new(Vec::new(), Arc::new(RegistryInvoker::new()))
    }

    fn echo_key() -> ChainKey {
        ChainKey::from_parts(
            Some("svc1"),
            Some(&MethodSignature::new("echo", ["String"])),
        )
    }

    #[test]
    fn derives_key_from_target_and_signature() {
        assert_eq!(echo_key().as_str(), "svc1::echo(String)");
    }

    #[test]
    fn key_degenerates_when_parts_are_absent() {
        assert_eq!(ChainKey::from_parts(None, None), ChainKey::default());
        assert_eq!(
            ChainKey::from_parts(Some("svc1"), None),
            ChainKey::default()
        );
        assert_eq!(ChainKey::default().as_str(), "");
    }

    #[test]
    fn equal_keys_reuse_the_same_chain_structure() {
        let cache = ChainCache::new(blueprint());
        let first = cache.get_or_build(&echo_key());
        let second = cache.get_or_build(&echo_key());
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn distinct_keys_get_distinct_chains() {
        let cache = ChainCache::new(blueprint());
        let first = cache.get_or_build(&echo_key());
        let second = cache.get_or_build(&ChainKey::from_parts(
            Some("svc2"),
            Some(&MethodSignature::new("echo", ["String"])),
        ));
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 2);
    }
}
