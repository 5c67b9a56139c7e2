//! Value types stored by the stash.
//!
//! Environment and vault sources only ever produce `String`; the richer
//! variants come from YAML documents and pass through unchanged.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// Ordered mapping used for the stash itself and for nested levels.
pub type ConfigMap = BTreeMap<String, ConfigValue>;

/// A configuration value as produced by the supported sources.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<ConfigValue>),
    Map(ConfigMap),
}

impl ConfigValue {
    /// Borrow the value as a string, if it is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow the value as an integer, if it is one.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ConfigValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Borrow the value as a boolean, if it is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Borrow the value as a nested mapping, if it is one.
    pub fn as_map(&self) -> Option<&ConfigMap> {
        match self {
            ConfigValue::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Textual form used when mirroring into the process environment.
    ///
    /// Strings mirror verbatim; ints, floats and booleans use their display
    /// form; null, lists and maps use the compact JSON encoding.
    pub fn to_env_string(&self) -> String {
        match self {
            ConfigValue::String(s) => s.clone(),
            ConfigValue::Bool(b) => b.to_string(),
            ConfigValue::Int(i) => i.to_string(),
            ConfigValue::Float(f) => f.to_string(),
            // Non-finite floats nested in a list or map have no JSON form;
            // such values mirror as an empty string.
            other => serde_json::to_string(other).unwrap_or_default(),
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_env_string())
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::String(value.to_owned())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        ConfigValue::String(value)
    }
}

impl From<i32> for ConfigValue {
    fn from(value: i32) -> Self {
        ConfigValue::Int(i64::from(value))
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        ConfigValue::Int(value)
    }
}

impl From<f64> for ConfigValue {
    fn from(value: f64) -> Self {
        ConfigValue::Float(value)
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        ConfigValue::Bool(value)
    }
}

impl From<Vec<ConfigValue>> for ConfigValue {
    fn from(value: Vec<ConfigValue>) -> Self {
        ConfigValue::List(value)
    }
}

impl From<ConfigMap> for ConfigValue {
    fn from(value: ConfigMap) -> Self {
        ConfigValue::Map(value)
    }
}

impl From<serde_yaml::Value> for ConfigValue {
    fn from(value: serde_yaml::Value) -> Self {
        match value {
            serde_yaml::Value::Null => ConfigValue::Null,
            serde_yaml::Value::Bool(b) => ConfigValue::Bool(b),
            serde_yaml::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    ConfigValue::Int(i)
                } else {
                    // u64 beyond i64::MAX or a true float.
                    ConfigValue::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_yaml::Value::String(s) => ConfigValue::String(s),
            serde_yaml::Value::Sequence(seq) => {
                ConfigValue::List(seq.into_iter().map(ConfigValue::from).collect())
            }
            serde_yaml::Value::Mapping(mapping) => {
                let mut map = ConfigMap::new();
                for (key, value) in mapping {
                    map.insert(map_key(&key), ConfigValue::from(value));
                }
                ConfigValue::Map(map)
            }
            serde_yaml::Value::Tagged(tagged) => ConfigValue::from(tagged.value),
        }
    }
}

/// Stringify a YAML mapping key on entry into the stash key space.
///
/// YAML permits keys of any scalar type; the stash key space is strings.
pub(crate) fn map_key(key: &serde_yaml::Value) -> String {
    match key {
        serde_yaml::Value::String(s) => s.clone(),
        other => ConfigValue::from(other.clone()).to_env_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalars_mirror_in_display_form() {
        assert_eq!(ConfigValue::String("plain".into()).to_env_string(), "plain");
        assert_eq!(ConfigValue::Int(1234).to_env_string(), "1234");
        assert_eq!(ConfigValue::Float(1.5).to_env_string(), "1.5");
        assert_eq!(ConfigValue::Bool(true).to_env_string(), "true");
        assert_eq!(ConfigValue::Null.to_env_string(), "null");
    }

    #[test]
    fn structured_values_mirror_as_compact_json() {
        let list = ConfigValue::List(vec![ConfigValue::Int(1), ConfigValue::String("a".into())]);
        assert_eq!(list.to_env_string(), r#"[1,"a"]"#);

        let mut map = ConfigMap::new();
        map.insert("port".into(), ConfigValue::Int(1234));
        assert_eq!(ConfigValue::Map(map).to_env_string(), r#"{"port":1234}"#);
    }

    #[test]
    fn yaml_numbers_convert_by_shape() {
        let int: serde_yaml::Value = serde_yaml::from_str("1234").unwrap();
        assert_eq!(ConfigValue::from(int), ConfigValue::Int(1234));

        let float: serde_yaml::Value = serde_yaml::from_str("12.5").unwrap();
        assert_eq!(ConfigValue::from(float), ConfigValue::Float(12.5));
    }

    #[test]
    fn yaml_nested_shapes_convert_recursively() {
        let value: serde_yaml::Value =
            serde_yaml::from_str("hosts:\n  - a\n  - b\nport: 1234\n").unwrap();
        let converted = ConfigValue::from(value);

        let map = converted.as_map().expect("top level is a map");
        assert_eq!(map.get("port"), Some(&ConfigValue::Int(1234)));
        assert_eq!(
            map.get("hosts"),
            Some(&ConfigValue::List(vec![
                ConfigValue::String("a".into()),
                ConfigValue::String("b".into()),
            ]))
        );
    }

    #[test]
    fn non_string_mapping_keys_are_stringified() {
        let value: serde_yaml::Value = serde_yaml::from_str("1234: a\ntrue: b\n").unwrap();
        let converted = ConfigValue::from(value);

        let map = converted.as_map().expect("top level is a map");
        assert_eq!(map.get("1234"), Some(&ConfigValue::String("a".into())));
        assert_eq!(map.get("true"), Some(&ConfigValue::String("b".into())));
    }
}
