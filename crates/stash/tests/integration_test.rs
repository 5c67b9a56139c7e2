//! End-to-end scenarios driving a stash through every load path.
//!
//! Invariants:
//! - Tests use `serial_test` and `temp_env` to isolate process-global
//!   environment state.
//! - Every environment key a test writes (directly or through the mirror)
//!   is listed in `temp_env::with_vars` so it is restored afterwards.

use std::io::Write;

use secrecy::SecretString;
use serial_test::serial;
use tempfile::NamedTempFile;

use config_stash::{ConfigStash, ConfigValue, StashError, VaultFetcher};

#[derive(Clone, Copy)]
struct SingleSecret {
    path: &'static str,
    key: &'static str,
    value: &'static str,
}

impl VaultFetcher for SingleSecret {
    fn fetch(&self, path: &str, key: &str) -> anyhow::Result<SecretString> {
        if path == self.path && key == self.key {
            Ok(SecretString::from(self.value))
        } else {
            Err(anyhow::anyhow!("no secret at {path}.{key}"))
        }
    }
}

fn write_yaml(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
#[serial]
fn multi_key_loads_store_every_key() {
    temp_env::with_vars(
        [
            ("API_KEY", Some("default_api_key")),
            ("DATABASE_URL", Some("default_database_url")),
        ],
        || {
            let mut stash = ConfigStash::new();
            stash
                .load_many_keys_from_env(["API_KEY", "DATABASE_URL"])
                .unwrap();

            assert_eq!(stash.get_str("API_KEY"), Some("default_api_key"));
            assert_eq!(stash.get_str("DATABASE_URL"), Some("default_database_url"));
        },
    );
}

#[test]
#[serial]
fn multi_key_loads_are_all_or_nothing() {
    temp_env::with_vars(
        [
            ("API_KEY", Some("default_api_key")),
            ("DATABASE_URL", Some("default_database_url")),
            ("MISSING", None),
        ],
        || {
            let mut stash = ConfigStash::new();
            let err = stash
                .load_many_keys_from_env(["API_KEY", "DATABASE_URL", "MISSING"])
                .unwrap_err();

            assert!(matches!(err, StashError::MissingVariable(ref key) if key == "MISSING"));
            assert!(!stash.contains_key("API_KEY"));
            assert!(!stash.contains_key("DATABASE_URL"));
            assert!(!stash.contains_key("MISSING"));
        },
    );
}

#[test]
#[serial]
fn yaml_markers_resolve_against_env_and_vault() {
    let file = write_yaml("db_pass: VAULT.secret/path.secret_key\nusername: ENV.USER\n");

    temp_env::with_vars(
        [
            ("USER", Some("alice")),
            ("db_pass", None),
            ("username", None),
        ],
        || {
            let mut stash = ConfigStash::with_fetcher(SingleSecret {
                path: "secret/path",
                key: "secret_key",
                value: "s3cr3t",
            });
            stash.load_from_yaml_file(file.path()).unwrap();

            assert_eq!(stash.get_str("db_pass"), Some("s3cr3t"));
            assert_eq!(stash.get_str("username"), Some("alice"));
            // Both resolved values are mirrored.
            assert_eq!(std::env::var("db_pass").unwrap(), "s3cr3t");
            assert_eq!(std::env::var("username").unwrap(), "alice");
        },
    );
}

#[test]
#[serial]
fn prefix_loads_only_pick_up_matching_keys() {
    temp_env::with_vars(
        [("RM_API_KEY", Some("x")), ("API_KEY", Some("y"))],
        || {
            let mut stash = ConfigStash::new();
            stash.load_prefixed_env_vars(["RM"]).unwrap();

            assert_eq!(stash.get_str("RM_API_KEY"), Some("x"));
            assert!(!stash.contains_key("API_KEY"));
            assert_eq!(stash.len(), 1);
        },
    );
}

#[test]
#[serial]
fn nested_yaml_values_reattach_fully_resolved() {
    let file = write_yaml(
        "cloudaccessdb:\n  user: ENV.USER\n  host: example.com\ncloud_access_db:\n  port: 1234\n",
    );

    temp_env::with_vars(
        [
            ("USER", Some("cloud_access_user")),
            ("cloudaccessdb", None),
            ("cloud_access_db", None),
        ],
        || {
            let mut stash = ConfigStash::new();
            stash.load_from_yaml_file(file.path()).unwrap();

            let nested = stash
                .get("cloudaccessdb")
                .and_then(ConfigValue::as_map)
                .expect("nested mapping is preserved");
            assert_eq!(
                nested.get("user"),
                Some(&ConfigValue::String("cloud_access_user".into()))
            );
            assert_eq!(
                nested.get("host"),
                Some(&ConfigValue::String("example.com".into()))
            );

            let ports = stash
                .get("cloud_access_db")
                .and_then(ConfigValue::as_map)
                .expect("second nested mapping is preserved");
            assert_eq!(ports.get("port"), Some(&ConfigValue::Int(1234)));

            // Structured values mirror as compact JSON.
            assert_eq!(
                std::env::var("cloud_access_db").unwrap(),
                r#"{"port":1234}"#
            );
        },
    );
}

#[test]
#[serial]
fn every_load_path_mirrors_into_the_environment() {
    let file = write_yaml("yaml_key: yaml_value\n");

    temp_env::with_vars(
        [
            ("STASH_IT_SOURCE", Some("source_value")),
            ("STASH_IT_ALIAS", None),
            ("yaml_key", None),
            ("vault_key", None),
        ],
        || {
            let mut stash = ConfigStash::with_fetcher(SingleSecret {
                path: "secret/path",
                key: "vault_key",
                value: "vault_value",
            });

            stash
                .load_from_env_as("STASH_IT_SOURCE", "STASH_IT_ALIAS")
                .unwrap();
            stash.load_from_yaml_file(file.path()).unwrap();
            stash.load_from_vault("secret/path", "vault_key").unwrap();

            for key in ["STASH_IT_ALIAS", "yaml_key", "vault_key"] {
                assert!(stash.contains_key(key));
                assert_eq!(
                    std::env::var(key).unwrap(),
                    stash.get(key).unwrap().to_env_string()
                );
            }
        },
    );
}
