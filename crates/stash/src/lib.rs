//! Configuration aggregation from environment variables, YAML files, and an
//! external secret store.
//!
//! [`ConfigStash`] accumulates key-value pairs from a sequence of load
//! operations, each pulling from one source. YAML values may contain
//! placeholder markers (`ENV.<name>`, `VAULT.<path>.<key>`) that resolve
//! against the other sources during loading, and every stored key is
//! mirrored into the process environment as a string.
//!
//! ```no_run
//! use config_stash::ConfigStash;
//!
//! # fn main() -> Result<(), config_stash::StashError> {
//! let mut stash = ConfigStash::new();
//! stash.load_from_env("HOME")?;
//! stash.load_prefixed_env_vars(["APP_"])?;
//! stash.load_from_yaml_file("config.yaml")?;
//! # Ok(())
//! # }
//! ```
//!
//! There is no escape mechanism for literal string values that happen to
//! start with a marker prefix; such values are always treated as markers.

mod error;
mod loader;
mod stash;
mod value;

pub use error::StashError;
pub use loader::env::{ENV_PREFIX, load_dotenv, read_prefixed, read_var, read_vars};
pub use loader::vault::{VAULT_PREFIX, VaultFetcher, parse_vault_reference, read_secret};
pub use loader::yaml::YamlResolver;
pub use stash::ConfigStash;
pub use value::{ConfigMap, ConfigValue};
