//! Read-only views over resolved configuration.
//!
//! [`Config`] owns the merged mapping behind an [`Arc`], so clones are cheap
//! and the value can be shared across threads. Nested mappings are exposed
//! lazily as borrowed [`ConfigView`]s; no copy of the data is made until a
//! caller asks for one with [`Config::to_map`] or [`Config::to_value`].

use std::fmt;
use std::ops::Index;
use std::sync::Arc;

use figment::value::{Dict, Map};
use figment::{Metadata, Profile, Provider};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{ConfigError, ConfigMap, ConfigResult, ConfigResultExt};

const DEBUG_PREVIEW_KEYS: usize = 5;

/// Immutable result of [`crate::ConfigManager::load`].
///
/// # Examples
///
/// ```rust
/// use serde_json::json;
/// use tiered_config::Config;
///
/// let config = Config::try_from(json!({"db": {"host": "localhost", "port": 5432}}))
///     .unwrap_or_default();
/// assert_eq!(config.path("db.port").and_then(|item| item.as_i64()), Some(5432));
/// assert_eq!(config["db"]["host"], json!("localhost"));
/// ```
#[derive(Clone, Default, PartialEq)]
pub struct Config {
    data: Arc<ConfigMap>,
}

impl Config {
    /// Wrap an already merged mapping.
    #[must_use]
    pub fn new(data: ConfigMap) -> Self {
        Self {
            data: Arc::new(data),
        }
    }

    /// Borrow the top level as a [`ConfigView`].
    #[must_use]
    pub fn as_view(&self) -> ConfigView<'_> {
        ConfigView::new(&self.data)
    }

    /// Item stored under `key`, if present.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<ConfigItem<'_>> {
        self.as_view().get(key)
    }

    /// Item stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::KeyNotFound`] when the key is absent.
    pub fn lookup(&self, key: &str) -> ConfigResult<ConfigItem<'_>> {
        self.as_view().lookup(key)
    }

    /// Deep copy of the value under `key`, or `default` when absent.
    #[must_use]
    pub fn get_or(&self, key: &str, default: Value) -> Value {
        self.as_view().get_or(key, default)
    }

    /// Item at a dotted path such as `"db.port"`.
    #[must_use]
    pub fn path(&self, dotted: &str) -> Option<ConfigItem<'_>> {
        self.as_view().path(dotted)
    }

    /// Whether `key` is present at the top level.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Top-level keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(String::as_str)
    }

    /// Number of top-level keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the configuration has no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Independent deep copy of the mapping.
    #[must_use]
    pub fn to_map(&self) -> ConfigMap {
        self.data.as_ref().clone()
    }

    /// Independent deep copy as a JSON object.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Object(self.to_map())
    }

    /// Deserialise the whole configuration into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Deserialize`] when the data does not fit `T`.
    pub fn extract<T: DeserializeOwned>(&self) -> ConfigResult<T> {
        serde_json::from_value(self.to_value()).into_config()
    }
}

impl From<ConfigMap> for Config {
    fn from(data: ConfigMap) -> Self {
        Self::new(data)
    }
}

impl TryFrom<Value> for Config {
    type Error = Arc<ConfigError>;

    fn try_from(value: Value) -> ConfigResult<Self> {
        match value {
            Value::Object(map) => Ok(Self::new(map)),
            other => Err(Arc::new(ConfigError::NotAMapping {
                label: String::from("configuration"),
                found: crate::value::kind_name(&other),
            })),
        }
    }
}

impl Index<&str> for Config {
    type Output = Value;

    /// # Panics
    ///
    /// Panics when `key` is absent, like indexing a `HashMap`.
    fn index(&self, key: &str) -> &Value {
        index_or_panic(&self.data, key)
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        debug_preview(f, "Config", &self.data)
    }
}

impl Provider for Config {
    fn metadata(&self) -> Metadata {
        Metadata::named("tiered configuration")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, figment::Error> {
        figment::providers::Serialized::defaults(self.data.as_ref()).data()
    }
}

/// Borrowed view over one mapping inside a [`Config`].
#[derive(Clone, Copy, PartialEq)]
pub struct ConfigView<'a> {
    map: &'a ConfigMap,
}

impl<'a> ConfigView<'a> {
    /// View over `map`.
    #[must_use]
    pub const fn new(map: &'a ConfigMap) -> Self {
        Self { map }
    }

    /// Item stored under `key`, if present.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<ConfigItem<'a>> {
        self.map.get(key).map(ConfigItem::from)
    }

    /// Item stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::KeyNotFound`] when the key is absent.
    pub fn lookup(&self, key: &str) -> ConfigResult<ConfigItem<'a>> {
        self.get(key).ok_or_else(|| ConfigError::key_not_found(key))
    }

    /// Deep copy of the value under `key`, or `default` when absent.
    #[must_use]
    pub fn get_or(&self, key: &str, default: Value) -> Value {
        self.map.get(key).cloned().unwrap_or(default)
    }

    /// Item at a dotted path relative to this view.
    #[must_use]
    pub fn path(&self, dotted: &str) -> Option<ConfigItem<'a>> {
        let mut segments = dotted.split('.');
        let first = self.map.get(segments.next()?)?;
        segments
            .try_fold(first, |value, segment| value.as_object()?.get(segment))
            .map(ConfigItem::from)
    }

    /// Whether `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &'a str> + use<'a> {
        self.map.keys().map(String::as_str)
    }

    /// Number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether the view has no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Independent deep copy of the mapping.
    #[must_use]
    pub fn to_map(&self) -> ConfigMap {
        self.map.clone()
    }

    /// Independent deep copy as a JSON object.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Object(self.to_map())
    }

    /// Deserialise this section into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Deserialize`] when the data does not fit `T`.
    pub fn extract<T: DeserializeOwned>(&self) -> ConfigResult<T> {
        serde_json::from_value(self.to_value()).into_config()
    }
}

impl Index<&str> for ConfigView<'_> {
    type Output = Value;

    /// # Panics
    ///
    /// Panics when `key` is absent.
    fn index(&self, key: &str) -> &Value {
        index_or_panic(self.map, key)
    }
}

impl fmt::Debug for ConfigView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        debug_preview(f, "ConfigView", self.map)
    }
}

/// Value found under a key: a nested section or a leaf.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigItem<'a> {
    /// Nested mapping.
    Section(ConfigView<'a>),
    /// Any non-mapping value, including sequences and null.
    Value(&'a Value),
}

impl<'a> From<&'a Value> for ConfigItem<'a> {
    fn from(value: &'a Value) -> Self {
        match value {
            Value::Object(map) => Self::Section(ConfigView::new(map)),
            other => Self::Value(other),
        }
    }
}

impl<'a> ConfigItem<'a> {
    /// Nested section, if this item is one.
    #[must_use]
    pub const fn as_section(&self) -> Option<ConfigView<'a>> {
        match self {
            Self::Section(view) => Some(*view),
            Self::Value(_) => None,
        }
    }

    /// Leaf value, if this item is not a section.
    #[must_use]
    pub const fn as_value(&self) -> Option<&'a Value> {
        match self {
            Self::Section(_) => None,
            Self::Value(value) => Some(*value),
        }
    }

    /// Boolean leaf.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        self.as_value().and_then(Value::as_bool)
    }

    /// Signed integer leaf.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        self.as_value().and_then(Value::as_i64)
    }

    /// Unsigned integer leaf.
    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        self.as_value().and_then(Value::as_u64)
    }

    /// Numeric leaf as a float.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        self.as_value().and_then(Value::as_f64)
    }

    /// String leaf.
    #[must_use]
    pub fn as_str(&self) -> Option<&'a str> {
        self.as_value().and_then(Value::as_str)
    }

    /// Deep copy of the item.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Section(view) => view.to_value(),
            Self::Value(value) => (*value).clone(),
        }
    }
}

fn index_or_panic<'a>(map: &'a ConfigMap, key: &str) -> &'a Value {
    match map.get(key) {
        Some(value) => value,
        None => panic!("configuration key not found: '{key}'"),
    }
}

struct KeyPreview<'a>(&'a ConfigMap);

impl fmt::Debug for KeyPreview<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_list();
        list.entries(self.0.keys().take(DEBUG_PREVIEW_KEYS));
        if self.0.len() > DEBUG_PREVIEW_KEYS {
            list.entry(&format_args!("..."));
        }
        list.finish()
    }
}

fn debug_preview(f: &mut fmt::Formatter<'_>, name: &str, map: &ConfigMap) -> fmt::Result {
    f.debug_struct(name)
        .field("keys", &KeyPreview(map))
        .field("len", &map.len())
        .finish()
}
