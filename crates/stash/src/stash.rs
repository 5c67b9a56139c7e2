//! The aggregate configuration store.
//!
//! Responsibilities:
//! - Accumulate values from the source loaders under per-operation merge
//!   policies.
//! - Mirror every stored key into the process environment on write.
//!
//! Does NOT handle:
//! - Placeholder resolution (see `loader/yaml.rs`).
//! - The secret fetch itself (delegated to the `VaultFetcher` capability).
//!
//! Invariants:
//! - Every key present was written through [`ConfigStash::insert`], the
//!   single write path, and is therefore mirrored in the environment.
//! - A failed multi-key load leaves the stash untouched.

use std::fmt;
use std::path::Path;

use secrecy::ExposeSecret;

use crate::error::StashError;
use crate::loader::env::{read_prefixed, read_var, read_vars};
use crate::loader::vault::{VaultFetcher, read_secret};
use crate::loader::yaml::YamlResolver;
use crate::value::{ConfigMap, ConfigValue};

/// Aggregate key-value store fed by the source loaders.
///
/// Each `load_*` operation pulls from one source and merges into the stash
/// under its own policy. Every successful write is mirrored into the process
/// environment as a string.
///
/// # Concurrency hazard
///
/// The environment mirror is process-wide global state. The stash itself is
/// not designed for concurrent mutation: callers sharing one across threads
/// must serialize all load and write operations externally (for example
/// behind one exclusive lock). Writers racing on the same key through
/// separate stashes are last-write-wins with no ordering guarantee.
pub struct ConfigStash {
    values: ConfigMap,
    fetcher: Option<Box<dyn VaultFetcher>>,
}

impl ConfigStash {
    /// Create an empty stash with no secret-fetch capability.
    pub fn new() -> Self {
        Self {
            values: ConfigMap::new(),
            fetcher: None,
        }
    }

    /// Create an empty stash wired to a secret-fetch capability.
    pub fn with_fetcher(fetcher: impl VaultFetcher + 'static) -> Self {
        Self {
            values: ConfigMap::new(),
            fetcher: Some(Box::new(fetcher)),
        }
    }

    /// Create a stash pre-seeded with `values`.
    ///
    /// Seeding goes through the normal write path, so seeded keys are
    /// mirrored into the environment like any other write.
    pub fn from_values<I, K, V>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<ConfigValue>,
    {
        let mut stash = Self::new();
        for (key, value) in values {
            stash.insert(key, value);
        }
        stash
    }

    /// Write one key, mirroring the stringified value into the process
    /// environment. This is the single write path every load operation and
    /// constructor uses.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ConfigValue>) {
        let key = key.into();
        let value = value.into();
        tracing::trace!(key = %key, "stash write");
        // SAFETY: the mirror is a process-global write; embedders that
        // mutate a stash from multiple threads must serialize access
        // externally (see the struct-level hazard note).
        unsafe { std::env::set_var(&key, value.to_env_string()) };
        self.values.insert(key, value);
    }

    /// Look up a value.
    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.values.get(key)
    }

    /// Look up a value, narrowing to a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(ConfigValue::as_str)
    }

    /// Whether a key is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Iterate over the stored keys.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Iterate over the stored entries.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConfigValue)> {
        self.values.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the stash is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Resolve one environment variable and store it under `key`,
    /// overwriting unconditionally.
    pub fn load_from_env(&mut self, key: &str) -> Result<(), StashError> {
        let value = read_var(key)?;
        self.insert(key, value);
        Ok(())
    }

    /// Resolve one environment variable and store it under `alias`,
    /// overwriting unconditionally.
    pub fn load_from_env_as(&mut self, key: &str, alias: &str) -> Result<(), StashError> {
        let value = read_var(key)?;
        self.insert(alias, value);
        Ok(())
    }

    /// Resolve all given environment variables and store each under its own
    /// name, overwriting unconditionally.
    ///
    /// All-or-nothing: if any key is unset the stash is left untouched.
    pub fn load_many_keys_from_env<I>(&mut self, keys: I) -> Result<(), StashError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        // Resolve everything before the first write.
        let values = read_vars(keys)?;
        for (key, value) in values {
            self.insert(key, value);
        }
        Ok(())
    }

    /// Scan the environment for keys matching any of the given prefixes and
    /// store each match only if the key is not already present.
    pub fn load_prefixed_env_vars<I>(&mut self, prefixes: I) -> Result<(), StashError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let values = read_prefixed(prefixes)?;
        for (key, value) in values {
            if !self.values.contains_key(&key) {
                self.insert(key, value);
            }
        }
        Ok(())
    }

    /// Resolve a full YAML document and merge the result into the stash.
    ///
    /// A fresh resolver runs per call; its internal policies (first-write-
    /// wins for plain values, overwrite for placeholder resolutions) are
    /// already applied to the result, and each resolved top-level key then
    /// overwrites the stash entry of the same name.
    pub fn load_from_yaml_file(&mut self, path: impl AsRef<Path>) -> Result<(), StashError> {
        let mut resolver = YamlResolver::new(self.fetcher.as_deref());
        resolver.load_file(path)?;
        for (key, value) in resolver.into_resolved() {
            self.insert(key, value);
        }
        Ok(())
    }

    /// Resolve one secret and store it under `key`, overwriting
    /// unconditionally.
    pub fn load_from_vault(&mut self, path: &str, key: &str) -> Result<(), StashError> {
        let secret = read_secret(path, key, self.fetcher.as_deref())?;
        self.insert(key, secret.expose_secret().to_owned());
        Ok(())
    }

    /// Resolve one secret and store it under `alias`, only when `alias` is
    /// not already present. The fetch still runs when it is.
    pub fn load_from_vault_as(
        &mut self,
        path: &str,
        key: &str,
        alias: &str,
    ) -> Result<(), StashError> {
        let secret = read_secret(path, key, self.fetcher.as_deref())?;
        if !self.values.contains_key(alias) {
            self.insert(alias, secret.expose_secret().to_owned());
        }
        Ok(())
    }
}

impl Default for ConfigStash {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ConfigStash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigStash")
            .field("values", &self.values)
            .field("fetcher", &self.fetcher.is_some())
            .finish()
    }
}
