//! Decoding of prefixed environment variables into nested mappings.
//!
//! Given the prefix `APP_`, the variable `APP_DB__PORT=5432` becomes
//! `{"db": {"port": 5432}}`: the prefix is stripped, the remainder is split on
//! `__`, each segment is lower-cased and the value is coerced with
//! [`coerce_scalar`].
//!
//! Variables are decoded in byte-wise order of their full names. When two
//! names normalise to the same path (for example `APP_Db__Port` and
//! `APP_DB__PORT` on a case-sensitive platform) the one sorting last wins.

use serde_json::{Number, Value};

use crate::value::{ConfigMap, merge_into};

/// Separator between nested key segments.
pub const NESTING_SEPARATOR: &str = "__";

/// Coerce a raw textual value into the most specific scalar it denotes.
///
/// Rules, first match wins:
/// 1. `true`, `yes`, `on` become `true` and `false`, `no`, `off` become
///    `false` (surrounding whitespace and case are ignored);
/// 2. integer literals become integers;
/// 3. finite floating-point literals become floats;
/// 4. anything else is kept verbatim as a string.
///
/// # Examples
///
/// ```rust
/// use tiered_config::coerce_scalar;
/// use serde_json::json;
///
/// assert_eq!(coerce_scalar("On"), json!(true));
/// assert_eq!(coerce_scalar("5432"), json!(5432));
/// assert_eq!(coerce_scalar("0.5"), json!(0.5));
/// assert_eq!(coerce_scalar("foo"), json!("foo"));
/// ```
#[must_use]
pub fn coerce_scalar(raw: &str) -> Value {
    let trimmed = raw.trim();
    if let Some(flag) = parse_bool(trimmed) {
        return Value::Bool(flag);
    }
    if let Ok(int) = trimmed.parse::<i64>() {
        return Value::from(int);
    }
    if let Ok(int) = trimmed.parse::<u64>() {
        return Value::from(int);
    }
    if let Some(float) = trimmed
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
    {
        return Value::Number(float);
    }
    Value::String(raw.to_owned())
}

fn parse_bool(text: &str) -> Option<bool> {
    const TRUTHY: [&str; 3] = ["true", "yes", "on"];
    const FALSY: [&str; 3] = ["false", "no", "off"];
    if TRUTHY.iter().any(|t| t.eq_ignore_ascii_case(text)) {
        Some(true)
    } else if FALSY.iter().any(|f| f.eq_ignore_ascii_case(text)) {
        Some(false)
    } else {
        None
    }
}

/// Split the remainder of a variable name into lower-cased key segments.
///
/// Empty segments are dropped, so `DB____HOST` and `__DB__HOST` both yield
/// `["db", "host"]`.
#[must_use]
pub fn key_path(name: &str) -> Vec<String> {
    name.split(NESTING_SEPARATOR)
        .filter(|segment| !segment.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Build a nested mapping from the variables in `vars` that start with
/// `prefix`.
///
/// Variables that do not carry the prefix, or whose remainder is empty, are
/// ignored.
///
/// # Examples
///
/// ```rust
/// use tiered_config::decode_vars;
/// use serde_json::{Value, json};
///
/// let vars = [
///     ("APP_DB__HOST".to_owned(), "localhost".to_owned()),
///     ("APP_DB__PORT".to_owned(), "5432".to_owned()),
///     ("OTHER_DEBUG".to_owned(), "true".to_owned()),
/// ];
/// let decoded = decode_vars("APP_", vars);
/// assert_eq!(Value::Object(decoded), json!({"db": {"host": "localhost", "port": 5432}}));
/// ```
pub fn decode_vars<I>(prefix: &str, vars: I) -> ConfigMap
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut matching: Vec<(String, String)> = vars
        .into_iter()
        .filter(|(name, _)| name.starts_with(prefix))
        .collect();
    matching.sort_by(|(left, _), (right, _)| left.cmp(right));

    let mut decoded = ConfigMap::new();
    for (name, raw) in matching {
        let Some(remainder) = name.strip_prefix(prefix) else {
            continue;
        };
        let path = key_path(remainder);
        let Some(nested) = nest(&path, coerce_scalar(&raw)) else {
            continue;
        };
        tracing::trace!(variable = %name, "decoded environment variable");
        merge_into(&mut decoded, nested);
    }
    decoded
}

/// Wrap `leaf` in one single-key mapping per segment of `path`.
fn nest(path: &[String], leaf: Value) -> Option<ConfigMap> {
    let (last, parents) = path.split_last()?;
    let mut inner = ConfigMap::new();
    inner.insert(last.clone(), leaf);
    Some(parents.iter().rev().fold(inner, |child, segment| {
        let mut parent = ConfigMap::new();
        parent.insert(segment.clone(), Value::Object(child));
        parent
    }))
}
