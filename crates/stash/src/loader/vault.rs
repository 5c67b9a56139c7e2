//! Secret-fetch capability and loader.
//!
//! Responsibilities:
//! - Define the `VaultFetcher` capability the embedding application supplies.
//! - Resolve `(path, key)` pairs through that capability.
//! - Parse `VAULT.<path>.<key>` placeholder references.
//!
//! Does NOT handle:
//! - The fetch itself (HTTP, caching, auth); that is the collaborator's
//!   concern. Fetch errors pass through uninterpreted.
//!
//! Invariants:
//! - A missing fetcher is a wiring error (`MissingFetcher`), kept distinct
//!   from fetch failures (`Fetch`).

use secrecy::SecretString;

use crate::error::StashError;

/// Prefix marking a deferred vault resolution in YAML values.
pub const VAULT_PREFIX: &str = "VAULT.";

/// Capability for resolving `(path, key)` pairs against a secret store.
///
/// Supplied by the embedding application; this crate never performs the
/// fetch itself and does not retry or cache. Errors are opaque to the stash
/// and propagate unmodified.
pub trait VaultFetcher: Send + Sync {
    /// Fetch the secret stored under `key` at `path`.
    fn fetch(&self, path: &str, key: &str) -> anyhow::Result<SecretString>;
}

/// Resolve one secret through the supplied fetcher capability.
///
/// Fails with [`StashError::MissingFetcher`] when no capability is supplied;
/// fetch failures pass through as [`StashError::Fetch`].
pub fn read_secret(
    path: &str,
    key: &str,
    fetcher: Option<&dyn VaultFetcher>,
) -> Result<SecretString, StashError> {
    let fetcher = fetcher.ok_or(StashError::MissingFetcher)?;
    Ok(fetcher.fetch(path, key)?)
}

/// Split a `VAULT.` placeholder into its path and key components.
///
/// The remainder after the prefix must split on `.` into exactly two parts;
/// anything else fails with [`StashError::MalformedVaultReference`] carrying
/// the offending value.
pub fn parse_vault_reference(raw: &str) -> Result<(&str, &str), StashError> {
    let malformed = || StashError::MalformedVaultReference(raw.to_owned());
    let rest = raw.strip_prefix(VAULT_PREFIX).ok_or_else(malformed)?;
    let mut parts = rest.split('.');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(path), Some(key), None) => Ok((path, key)),
        _ => Err(malformed()),
    }
}
