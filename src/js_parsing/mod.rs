//! JavaScript literal parsing utilities (does NOT execute JavaScript).
//!
//! Marketing snippets in the wild are rarely valid JSON: unquoted keys,
//! single quotes, trailing commas, and template placeholders are all common.
//! This module pulls raw `{...}`/`[...]` literals out of script text with a
//! string/escape-aware brace balancer, then converts object literals to
//! key/value maps with a normalize-then-JSON-parse strategy and a manual
//! regex fallback. Nothing here throws; unusable input degrades to
//! `None`/empty.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Number, Value};

/// Extracts the first complete brace-balanced `{...}` substring starting at
/// or after `start_index` (a byte offset).
///
/// The scan tracks string state (`'`, `"`, and backtick delimiters, with
/// backslash escapes) so braces inside string literals do not affect the
/// depth counter.
///
/// # Returns
///
/// The balanced substring including both braces, or `None` if no opening
/// brace exists at or after `start_index` or the literal never closes. The
/// caller must treat `None` as "no parameters available", not an error.
pub fn extract_object_literal(text: &str, start_index: usize) -> Option<&str> {
    extract_balanced(text, start_index, b'{', b'}')
}

/// Extracts the first complete bracket-balanced `[...]` substring starting
/// at or after `start_index`. Same string/escape handling as
/// [`extract_object_literal`]; used for embedded JSON arrays such as
/// Shopify's `webPixelsConfigList`.
pub fn extract_array_literal(text: &str, start_index: usize) -> Option<&str> {
    extract_balanced(text, start_index, b'[', b']')
}

// Delimiters and escapes are all ASCII, so a byte scan is safe on UTF-8
// input and every returned slice lands on char boundaries.
fn extract_balanced(text: &str, start_index: usize, open: u8, close: u8) -> Option<&str> {
    let bytes = text.as_bytes();
    if start_index >= bytes.len() {
        return None;
    }
    let open_pos = bytes[start_index..].iter().position(|&b| b == open)? + start_index;

    let mut depth: usize = 0;
    let mut string_delim: Option<u8> = None;
    let mut escaped = false;

    for (offset, &byte) in bytes[open_pos..].iter().enumerate() {
        if let Some(delim) = string_delim {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == delim {
                string_delim = None;
            }
            continue;
        }
        if byte == b'\'' || byte == b'"' || byte == b'`' {
            string_delim = Some(byte);
        } else if byte == open {
            depth += 1;
        } else if byte == close {
            depth -= 1;
            if depth == 0 {
                return Some(&text[open_pos..=open_pos + offset]);
            }
        }
    }
    None
}

static BARE_KEY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([{,]\s*)([A-Za-z_$][A-Za-z0-9_$]*)\s*:"#)
        .expect("bare key pattern is a compile-time constant")
});

static TRAILING_COMMA_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#",\s*([}\]])"#).expect("trailing comma pattern is a compile-time constant")
});

static KEY_VALUE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"['"]?([A-Za-z_$][A-Za-z0-9_$.-]*)['"]?\s*:\s*('[^']*'|"[^"]*"|[^,{}\[\]\n]+)"#)
        .expect("key/value pattern is a compile-time constant")
});

/// Converts a JS object-literal string into a key -> value map.
///
/// Tier 1 normalizes the literal into JSON (escaped quotes, single to double
/// quotes, quoting bare identifier keys, stripping trailing commas) and runs
/// it through `serde_json`. Tier 2 falls back to a flat `key: value` regex
/// scan that trims surrounding quotes and coerces booleans, `null`, and
/// numbers. An unusable literal yields an empty map.
pub fn parse_params(literal: &str) -> Map<String, Value> {
    if let Some(map) = parse_normalized_json(literal) {
        return map;
    }
    log::debug!(
        "object literal is not normalizable JSON, falling back to key/value scan ({} bytes)",
        literal.len()
    );
    scan_key_values(literal)
}

fn parse_normalized_json(literal: &str) -> Option<Map<String, Value>> {
    let mut normalized = literal.replace("\\\"", "\"").replace("\\'", "'");
    normalized = normalized.replace('\'', "\"");
    normalized = BARE_KEY_PATTERN
        .replace_all(&normalized, "$1\"$2\":")
        .into_owned();
    normalized = TRAILING_COMMA_PATTERN
        .replace_all(&normalized, "$1")
        .into_owned();

    match serde_json::from_str::<Value>(&normalized) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

fn scan_key_values(literal: &str) -> Map<String, Value> {
    let mut map = Map::new();
    for cap in KEY_VALUE_PATTERN.captures_iter(literal) {
        let key = cap[1].to_string();
        let raw = cap[2].trim();
        let raw = raw
            .strip_prefix('\'')
            .and_then(|v| v.strip_suffix('\''))
            .or_else(|| raw.strip_prefix('"').and_then(|v| v.strip_suffix('"')))
            .unwrap_or(raw);
        // First occurrence wins, matching JSON-parse behavior closely enough
        if !map.contains_key(&key) {
            map.insert(key, coerce_scalar(raw));
        }
    }
    map
}

fn coerce_scalar(raw: &str) -> Value {
    match raw {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        "null" => Value::Null,
        _ => {
            if let Ok(int) = raw.parse::<i64>() {
                return Value::Number(Number::from(int));
            }
            if let Ok(float) = raw.parse::<f64>() {
                if let Some(number) = Number::from_f64(float) {
                    return Value::Number(number);
                }
            }
            Value::String(raw.to_string())
        }
    }
}
