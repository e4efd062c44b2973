//! Name to backend lookup for bundle stores.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use anyhow::Result;

use super::git::{self, GitCli, GitStore};
use super::local::{self, LocalStore};
use super::{Store, StoreError};
use crate::runtime::RealRuntime;

/// Builds a fresh, uninitialized store.
pub type StoreFactory = Arc<dyn Fn() -> Box<dyn Store> + Send + Sync>;

/// Registry of store factories.
///
/// Built once at startup and owned by the command dispatcher. Every
/// [`StoreRegistry::resolve`] returns a new instance, so commands never share
/// store state.
pub struct StoreRegistry {
    factories: HashMap<String, StoreFactory>,
    default_store: String,
}

impl StoreRegistry {
    /// Create an empty registry defaulting to the git store.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
            default_store: git::STORE_NAME.to_string(),
        }
    }

    /// Registry with the `git` and `local` stores, `git` being the default.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register_builtin();
        registry
    }

    fn register_builtin(&mut self) {
        self.register(
            git::STORE_NAME,
            Arc::new(|| Box::new(GitStore::new(GitCli)) as Box<dyn Store>),
        );
        self.register(
            local::STORE_NAME,
            Arc::new(|| Box::new(LocalStore::new(RealRuntime)) as Box<dyn Store>),
        );
    }

    /// Register a factory. An existing entry with the same name is replaced.
    pub fn register(&mut self, name: impl Into<String>, factory: StoreFactory) {
        self.factories.insert(name.into(), factory);
    }

    /// Instantiate the store registered as `name`.
    pub fn resolve(&self, name: &str) -> Result<Box<dyn Store>> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| StoreError::UnknownStore {
                name: name.to_string(),
            })?;
        Ok(factory())
    }

    pub fn default_store(&self) -> &str {
        &self.default_store
    }

    pub fn set_default(&mut self, name: impl Into<String>) {
        self.default_store = name.into();
    }

    pub fn has(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered store names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }

    /// Drop every registration and restore the built-in stores.
    pub fn reset(&mut self) {
        self.factories.clear();
        self.default_store = git::STORE_NAME.to_string();
        self.register_builtin();
    }
}

impl Default for StoreRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}

impl fmt::Debug for StoreRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreRegistry")
            .field("stores", &self.names())
            .field("default_store", &self.default_store)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_new_is_empty() {
        let registry = StoreRegistry::new();
        assert!(registry.names().is_empty());
        assert_eq!(registry.default_store(), "git");
        assert!(registry.resolve("git").is_err());
    }

    #[test]
    fn test_registry_builtin_stores() {
        let registry = StoreRegistry::with_builtin();
        assert_eq!(registry.names(), vec!["git", "local"]);
        assert_eq!(registry.resolve("git").unwrap().name(), "git");
        assert_eq!(registry.resolve("local").unwrap().name(), "local");
    }

    #[test]
    fn test_registry_unknown_store() {
        let registry = StoreRegistry::with_builtin();
        let err = registry.resolve("s3").err().unwrap();
        assert_eq!(err.to_string(), "Unknown store - s3");
        assert!(matches!(
            err.downcast_ref::<StoreError>(),
            Some(StoreError::UnknownStore { .. })
        ));
    }

    #[test]
    fn test_registry_register_replaces_and_reset_restores() {
        let mut registry = StoreRegistry::with_builtin();
        registry.register(
            "remote",
            Arc::new(|| Box::new(GitStore::new(GitCli)) as Box<dyn Store>),
        );
        registry.register(
            "git",
            Arc::new(|| Box::new(LocalStore::new(RealRuntime)) as Box<dyn Store>),
        );
        registry.set_default("remote");

        assert!(registry.has("remote"));
        assert_eq!(registry.default_store(), "remote");
        assert_eq!(registry.resolve("git").unwrap().name(), "local");

        registry.reset();
        assert!(!registry.has("remote"));
        assert_eq!(registry.default_store(), "git");
        assert_eq!(registry.resolve("git").unwrap().name(), "git");
    }
}
