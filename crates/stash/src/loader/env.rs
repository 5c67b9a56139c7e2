//! Environment variable loaders.
//!
//! Responsibilities:
//! - Read single, multiple, and prefix-matched environment variables.
//! - Load `.env` files into the process environment (dotenvy).
//!
//! Does NOT handle:
//! - Writing environment variables (the stash mirror does that, see
//!   `stash.rs`).
//! - Placeholder markers in YAML values (see `yaml.rs`).
//!
//! Invariants:
//! - Prefix matching is case sensitive, anchored at position 0.
//! - Multi-key reads are all-or-nothing: the first unset key aborts before
//!   any partial result is returned.
//! - `DOTENV_DISABLED` is checked before `dotenvy::dotenv()` is called.

use std::collections::BTreeMap;

use crate::error::StashError;

/// Prefix marking a deferred environment resolution in YAML values.
pub const ENV_PREFIX: &str = "ENV.";

/// Read a single required environment variable.
pub fn read_var(key: &str) -> Result<String, StashError> {
    std::env::var(key).map_err(|_| StashError::MissingVariable(key.to_owned()))
}

/// Read several required environment variables, preserving input order.
///
/// Fails with [`StashError::MissingVariable`] naming the first unset key,
/// without returning any partial result.
pub fn read_vars<I>(keys: I) -> Result<Vec<(String, String)>, StashError>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut values = Vec::new();
    for key in keys {
        let key = key.as_ref();
        values.push((key.to_owned(), read_var(key)?));
    }
    Ok(values)
}

/// Scan the environment for keys starting with any of the given prefixes.
///
/// Matching is case sensitive and anchored at position 0. An empty prefix
/// set fails with [`StashError::MissingPrefixList`]; no matches is an empty
/// result, not an error. Non-UTF-8 environment entries are skipped.
pub fn read_prefixed<I>(prefixes: I) -> Result<BTreeMap<String, String>, StashError>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let prefixes: Vec<String> = prefixes
        .into_iter()
        .map(|prefix| prefix.as_ref().to_owned())
        .collect();
    if prefixes.is_empty() {
        return Err(StashError::MissingPrefixList);
    }

    let mut values = BTreeMap::new();
    for (key, value) in std::env::vars_os() {
        let (Some(key), Some(value)) = (key.to_str(), value.to_str()) else {
            continue;
        };
        if prefixes.iter().any(|prefix| key.starts_with(prefix)) {
            values.insert(key.to_owned(), value.to_owned());
        }
    }
    Ok(values)
}

/// Load environment variables from a `.env` file, if one is present.
///
/// If the `DOTENV_DISABLED` environment variable is set to "true" or "1",
/// the `.env` file will not be loaded (useful for testing). A missing file
/// is silently ignored. This populates the process environment only; pair
/// it with the env load operations to pull values into a stash.
///
/// Error messages never include raw `.env` line contents.
pub fn load_dotenv() -> Result<(), StashError> {
    if dotenv_disabled() {
        return Ok(());
    }

    match dotenvy::dotenv() {
        Ok(path) => {
            tracing::debug!(path = %path.display(), "loaded .env file");
            Ok(())
        }
        Err(e) if is_not_found(&e) => Ok(()),
        Err(dotenvy::Error::LineParse(_, idx)) => Err(StashError::DotenvParse { error_index: idx }),
        Err(dotenvy::Error::Io(io_err)) => Err(StashError::DotenvIo {
            kind: io_err.kind(),
        }),
        Err(_) => Err(StashError::DotenvUnknown),
    }
}

/// Check if dotenv loading is disabled via environment variable.
fn dotenv_disabled() -> bool {
    matches!(
        std::env::var("DOTENV_DISABLED").ok().as_deref(),
        Some("true") | Some("1")
    )
}

/// Check if a dotenv error indicates the file was not found.
fn is_not_found(err: &dotenvy::Error) -> bool {
    matches!(
        err,
        dotenvy::Error::Io(io_err) if io_err.kind() == std::io::ErrorKind::NotFound
    )
}
