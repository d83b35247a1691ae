//! INI codec for the common dialect of sectioned key/value files.
//!
//! Supported syntax: `[section]` headers, `key = value` and `key: value`
//! options, full-line `#` and `;` comments, indented continuation lines and a
//! `DEFAULT` section whose options are inherited by every other section.
//! Option names are lower-cased. Values are coerced with
//! [`crate::coerce_scalar`], so `port = 8080` decodes to an integer.

use serde_json::Value;
use thiserror::Error;

use super::{CodecError, FormatCodec};
use crate::env::coerce_scalar;
use crate::value::{ConfigMap, kind_name};

const DEFAULT_SECTION: &str = "DEFAULT";

/// INI documents: a mapping of section names to flat mappings of scalars.
#[derive(Debug, Clone, Copy, Default)]
pub struct IniCodec;

#[derive(Debug, Error)]
enum IniError {
    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error(
        "INI root must be a mapping of section names to mappings; found {found} at top-level key '{key}'"
    )]
    NotASection { key: String, found: &'static str },

    #[error(
        "cannot write {found} at '{path}' to INI; INI is limited to flat key/value pairs, use JSON, TOML or YAML for nested structures"
    )]
    NotAScalar { path: String, found: &'static str },
}

fn syntax(line: usize, message: impl Into<String>) -> IniError {
    IniError::Syntax {
        line,
        message: message.into(),
    }
}

impl FormatCodec for IniCodec {
    fn name(&self) -> &'static str {
        "INI"
    }

    fn decode(&self, bytes: &[u8]) -> Result<Value, CodecError> {
        let text = std::str::from_utf8(bytes)?;
        Ok(Value::Object(parse(text)?))
    }

    fn encode(&self, map: &ConfigMap) -> Result<Vec<u8>, CodecError> {
        Ok(render(map)?.into_bytes())
    }
}

/// Option currently accepting continuation lines.
struct OpenOption {
    key: String,
    indent: usize,
}

fn parse(text: &str) -> Result<ConfigMap, IniError> {
    let mut sections = ConfigMap::new();
    let mut current: Option<String> = None;
    let mut open: Option<OpenOption> = None;

    for (index, line) in text.lines().enumerate() {
        let number = index + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            open = None;
            continue;
        }
        if trimmed.starts_with('#') || trimmed.starts_with(';') {
            continue;
        }
        let indent = line.len() - line.trim_start().len();

        if let (Some(option), Some(section)) = (&open, &current) {
            if indent > option.indent {
                let options = section_mut(&mut sections, section, number)?;
                if let Some(Value::String(existing)) = options.get_mut(&option.key) {
                    existing.push('\n');
                    existing.push_str(trimmed);
                }
                continue;
            }
        }
        open = None;

        if let Some(header) = trimmed
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
        {
            let name = header.trim();
            if name.is_empty() {
                return Err(syntax(number, "empty section name"));
            }
            if sections.contains_key(name) {
                return Err(syntax(number, format!("section '{name}' already exists")));
            }
            sections.insert(name.to_owned(), Value::Object(ConfigMap::new()));
            current = Some(name.to_owned());
            continue;
        }

        let Some(section) = &current else {
            return Err(syntax(number, "option found before any section header"));
        };
        let Some(split_at) = trimmed.find(['=', ':']) else {
            return Err(syntax(number, format!("expected 'key = value', found '{trimmed}'")));
        };
        let (raw_key, rest) = trimmed.split_at(split_at);
        let key = raw_key.trim().to_lowercase();
        if key.is_empty() {
            return Err(syntax(number, "option name is empty"));
        }
        let value = rest.get(1..).unwrap_or_default().trim();
        let options = section_mut(&mut sections, section, number)?;
        if options.contains_key(&key) {
            return Err(syntax(
                number,
                format!("option '{key}' in section '{section}' already exists"),
            ));
        }
        options.insert(key.clone(), Value::String(value.to_owned()));
        open = Some(OpenOption { key, indent });
    }

    Ok(resolve_sections(&sections))
}

fn section_mut<'a>(
    sections: &'a mut ConfigMap,
    name: &str,
    line: usize,
) -> Result<&'a mut ConfigMap, IniError> {
    sections
        .get_mut(name)
        .and_then(Value::as_object_mut)
        .ok_or_else(|| syntax(line, format!("section '{name}' is not open")))
}

/// Apply `DEFAULT` inheritance and scalar coercion to the raw sections.
fn resolve_sections(raw: &ConfigMap) -> ConfigMap {
    let defaults = raw
        .get(DEFAULT_SECTION)
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();
    raw.iter()
        .filter(|(name, _)| name.as_str() != DEFAULT_SECTION)
        .map(|(name, options)| {
            let mut resolved = ConfigMap::new();
            let own = options.as_object().into_iter().flatten();
            for (key, value) in defaults.iter().chain(own) {
                let coerced = value.as_str().map_or(Value::Null, coerce_scalar);
                resolved.insert(key.clone(), coerced);
            }
            (name.clone(), Value::Object(resolved))
        })
        .collect()
}

fn render(map: &ConfigMap) -> Result<String, IniError> {
    let mut out = String::new();
    for (section, value) in map {
        let Value::Object(options) = value else {
            return Err(IniError::NotASection {
                key: section.clone(),
                found: kind_name(value),
            });
        };
        out.push('[');
        out.push_str(section);
        out.push_str("]\n");
        for (option, option_value) in options {
            let text = scalar_text(option_value).ok_or_else(|| IniError::NotAScalar {
                path: format!("{section}.{option}"),
                found: kind_name(option_value),
            })?;
            out.push_str(option);
            out.push_str(" = ");
            out.push_str(&text.replace('\n', "\n\t"));
            out.push('\n');
        }
        out.push('\n');
    }
    Ok(out)
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
