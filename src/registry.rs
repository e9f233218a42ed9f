//! Name-keyed registries for backends, checkers and interfaces
//!
//! A registry is built once at process start and handed to whatever needs
//! to resolve names. Lookup is exact; a missing name is an error for the
//! caller to report, never a silent fallback.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("no {kind} registered under `{name}'")]
    NotFound { kind: &'static str, name: String },
}

/// Registry mapping logical names to shared entries
pub struct Registry<T: ?Sized> {
    kind: &'static str,
    entries: BTreeMap<String, Arc<T>>,
}

impl<T: ?Sized> Registry<T> {
    /// Create an empty registry; `kind` names the entries in error messages
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            entries: BTreeMap::new(),
        }
    }

    /// Register an entry under `name`
    ///
    /// # Panics
    ///
    /// Panics if `name` is already taken. Registries are assembled in code
    /// at startup, so a clash is a wiring bug.
    pub fn register(&mut self, name: impl Into<String>, entry: Arc<T>) {
        let name = name.into();
        assert!(
            !self.entries.contains_key(&name),
            "{} `{}' registered twice",
            self.kind,
            name
        );
        self.entries.insert(name, entry);
    }

    /// Builder-style [`Registry::register`]
    pub fn with(mut self, name: impl Into<String>, entry: Arc<T>) -> Self {
        self.register(name, entry);
        self
    }

    pub fn resolve(&self, name: &str) -> Result<Arc<T>, RegistryError> {
        self.entries
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound {
                kind: self.kind,
                name: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }
}

impl<T: ?Sized> Clone for Registry<T> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            entries: self.entries.clone(),
        }
    }
}

impl<T: ?Sized> fmt::Debug for Registry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("kind", &self.kind)
            .field("names", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}
