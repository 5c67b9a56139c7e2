//! Error types for stash load operations.
//!
//! Responsibilities:
//! - Define error variants for every load failure the crate can surface.
//!
//! Does NOT handle:
//! - Retrying. Every load operation is single-attempt; retry policy belongs
//!   to the embedding application.
//!
//! Invariants:
//! - Every variant carries enough context to act on (variable names, file
//!   paths, the offending placeholder value).
//! - Wiring errors (`MissingFetcher`, `MissingPrefixList`) are distinct from
//!   data and source errors.
//! - Dotenv errors NEVER include raw .env line contents to prevent secret
//!   leakage.

use std::io::ErrorKind;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading configuration into a stash.
#[derive(Error, Debug)]
pub enum StashError {
    /// A required environment variable is absent.
    #[error("environment variable {0} isn't set")]
    MissingVariable(String),

    /// Prefix-based loading was invoked with an empty prefix set.
    #[error("no prefixes were provided for prefixed environment loading")]
    MissingPrefixList,

    /// Secret loading was requested but no fetcher capability is wired in.
    #[error("no vault fetcher is configured")]
    MissingFetcher,

    /// A `VAULT.` placeholder did not decompose into exactly a path and a key.
    #[error("malformed vault reference `{0}`: expected VAULT.<path>.<key>")]
    MalformedVaultReference(String),

    /// A YAML file could not be read.
    #[error("failed to read config file at {path}")]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A YAML file could not be parsed into a mapping.
    #[error("failed to parse config file at {path}")]
    DocumentParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A secret fetch failed; the fetcher's error passes through
    /// uninterpreted.
    #[error(transparent)]
    Fetch(#[from] anyhow::Error),

    /// Failed to parse the `.env` file due to invalid syntax.
    ///
    /// Only the byte index of the failure is reported, never the offending
    /// line content.
    #[error(
        "failed to parse .env file at position {error_index}. Hint: set DOTENV_DISABLED=1 to skip .env loading"
    )]
    DotenvParse { error_index: usize },

    /// Failed to read the `.env` file due to an I/O error.
    #[error("failed to read .env file: {kind}")]
    DotenvIo { kind: ErrorKind },

    /// Unknown dotenv error (future variants from the dotenvy crate).
    #[error("failed to load .env file. Hint: set DOTENV_DISABLED=1 to skip .env loading")]
    DotenvUnknown,
}
