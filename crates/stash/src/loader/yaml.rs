//! Recursive placeholder resolution over YAML documents.
//!
//! Responsibilities:
//! - Walk parsed mappings depth-first in document order.
//! - Resolve `ENV.` and `VAULT.` string markers through the env and vault
//!   loaders.
//! - Accumulate resolved values across load calls (the resolver is stateful;
//!   loading several documents through one resolver merges them).
//!
//! Does NOT handle:
//! - Merging into a stash (`ConfigStash` applies its own per-operation
//!   policy on top of the resolved result).
//! - The secret fetch itself (delegated to the `VaultFetcher` capability).
//!
//! Invariants:
//! - Plain values are first-write-wins; placeholder resolutions always
//!   overwrite. The two policies are intentionally distinct.
//! - Dotted paths route values to their nesting level during the walk and
//!   never appear as keys in the resolved result.

use std::path::Path;

use secrecy::ExposeSecret;

use crate::error::StashError;
use crate::loader::env::{ENV_PREFIX, read_var};
use crate::loader::vault::{VAULT_PREFIX, VaultFetcher, parse_vault_reference, read_secret};
use crate::value::{ConfigMap, ConfigValue, map_key};

/// Write policy for one resolved entry.
#[derive(Clone, Copy)]
enum WritePolicy {
    /// Keep an existing value at the path (plain values).
    FirstWriteWins,
    /// Replace whatever is at the path (placeholder resolutions).
    Overwrite,
}

/// Stateful resolver for YAML documents containing placeholder markers.
///
/// Values are accumulated across [`load_file`](Self::load_file) calls: plain
/// values are first-write-wins across documents, while `ENV.` and `VAULT.`
/// resolutions overwrite whatever an earlier document put at the same key.
pub struct YamlResolver<'f> {
    fetcher: Option<&'f dyn VaultFetcher>,
    resolved: ConfigMap,
}

impl<'f> YamlResolver<'f> {
    /// Create a resolver, optionally wired to a secret-fetch capability.
    pub fn new(fetcher: Option<&'f dyn VaultFetcher>) -> Self {
        Self {
            fetcher,
            resolved: ConfigMap::new(),
        }
    }

    /// Read and resolve one YAML file into the accumulated result.
    ///
    /// File and parse failures are wrapped with the failing path
    /// ([`StashError::FileAccess`], [`StashError::DocumentParse`]);
    /// placeholder resolution failures propagate as themselves.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<(), StashError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| StashError::FileAccess {
            path: path.to_path_buf(),
            source,
        })?;

        let document: serde_yaml::Value =
            serde_yaml::from_str(&text).map_err(|source| StashError::DocumentParse {
                path: path.to_path_buf(),
                source,
            })?;
        // An empty file parses as null; it resolves to nothing.
        if document.is_null() {
            return Ok(());
        }
        let mapping: serde_yaml::Mapping =
            serde_yaml::from_value(document).map_err(|source| StashError::DocumentParse {
                path: path.to_path_buf(),
                source,
            })?;

        self.resolve_mapping(&mapping, "")?;
        tracing::debug!(
            path = %path.display(),
            keys = self.resolved.len(),
            "resolved yaml document"
        );
        Ok(())
    }

    /// Borrow the accumulated result.
    pub fn resolved(&self) -> &ConfigMap {
        &self.resolved
    }

    /// Consume the resolver, returning the accumulated result.
    pub fn into_resolved(self) -> ConfigMap {
        self.resolved
    }

    fn resolve_mapping(
        &mut self,
        mapping: &serde_yaml::Mapping,
        parent: &str,
    ) -> Result<(), StashError> {
        for (key, value) in mapping.iter() {
            let key = map_key(key);
            let path = if parent.is_empty() {
                key
            } else {
                format!("{parent}.{key}")
            };
            match value {
                serde_yaml::Value::Mapping(nested) => {
                    // Reattachment replaces any scalar routed here earlier;
                    // the recursive pass then fills the nested level in
                    // place, so an empty mapping stays an empty map.
                    self.ensure_map(&path);
                    self.resolve_mapping(nested, &path)?;
                }
                serde_yaml::Value::String(s) if s.starts_with(ENV_PREFIX) => {
                    let name = &s[ENV_PREFIX.len()..];
                    let value = read_var(name)?;
                    tracing::trace!(key = %path, variable = name, "resolved env marker");
                    self.write(&path, ConfigValue::String(value), WritePolicy::Overwrite);
                }
                serde_yaml::Value::String(s) if s.starts_with(VAULT_PREFIX) => {
                    let (vault_path, vault_key) = parse_vault_reference(s)?;
                    let secret = read_secret(vault_path, vault_key, self.fetcher)?;
                    tracing::trace!(key = %path, "resolved vault marker");
                    self.write(
                        &path,
                        ConfigValue::String(secret.expose_secret().to_owned()),
                        WritePolicy::Overwrite,
                    );
                }
                other => {
                    self.write(&path, ConfigValue::from(other.clone()), WritePolicy::FirstWriteWins);
                }
            }
        }
        Ok(())
    }

    /// Route one resolved value to its nesting level.
    fn write(&mut self, path: &str, value: ConfigValue, policy: WritePolicy) {
        let (level, key) = Self::level_for(&mut self.resolved, path);
        match policy {
            WritePolicy::Overwrite => {
                level.insert(key.to_owned(), value);
            }
            WritePolicy::FirstWriteWins => {
                level.entry(key.to_owned()).or_insert(value);
            }
        }
    }

    /// Make sure a nested map exists at `path`, replacing any non-map entry.
    fn ensure_map(&mut self, path: &str) {
        let (level, key) = Self::level_for(&mut self.resolved, path);
        if !matches!(level.get(key), Some(ConfigValue::Map(_))) {
            level.insert(key.to_owned(), ConfigValue::Map(ConfigMap::new()));
        }
    }

    /// Walk the dotted `path` down to the level owning its final segment,
    /// creating intermediate maps and replacing non-map entries on the way.
    fn level_for<'m, 'p>(root: &'m mut ConfigMap, path: &'p str) -> (&'m mut ConfigMap, &'p str) {
        let mut level = root;
        let mut rest = path;
        while let Some((head, tail)) = rest.split_once('.') {
            let entry = level
                .entry(head.to_owned())
                .or_insert_with(|| ConfigValue::Map(ConfigMap::new()));
            if !matches!(entry, ConfigValue::Map(_)) {
                *entry = ConfigValue::Map(ConfigMap::new());
            }
            level = match entry {
                ConfigValue::Map(next) => next,
                _ => unreachable!("entry was normalized to a map above"),
            };
            rest = tail;
        }
        (level, rest)
    }
}
