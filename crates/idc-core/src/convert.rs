//! Key normalizer for desired-state trees.
//!
//! Invocation parameters arrive as snake_case trees. The directory API uses
//! PascalCase on create payloads and camelCase inside attribute paths, and the
//! result we hand back to the caller is snake_case again. Everything here is a
//! pure transform over `serde_json::Value`.

use serde_json::{Map, Value};

/// Naming convention for mapping keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Convention {
    /// `given_name`
    Snake,
    /// `GivenName`
    Pascal,
    /// `givenName`
    Camel,
}

impl Convention {
    /// Convert a single key into this convention.
    ///
    /// Words are split on `_` and on lower-to-upper case boundaries, so the
    /// conversion is idempotent: `GivenName` stays `GivenName` under
    /// [`Convention::Pascal`].
    pub fn convert(self, key: &str) -> String {
        let words = split_words(key);
        match self {
            Convention::Snake => words
                .iter()
                .map(|w| w.to_lowercase())
                .collect::<Vec<_>>()
                .join("_"),
            Convention::Pascal => words.iter().map(|w| capitalize(w)).collect(),
            Convention::Camel => words
                .iter()
                .enumerate()
                .map(|(i, w)| if i == 0 { w.to_lowercase() } else { capitalize(w) })
                .collect(),
        }
    }
}

fn split_words(key: &str) -> Vec<String> {
    let mut words = Vec::new();

    for part in key.split('_') {
        let chars: Vec<char> = part.chars().collect();
        let mut current = String::new();

        for (i, &c) in chars.iter().enumerate() {
            if c.is_uppercase() && !current.is_empty() {
                let prev = chars[i - 1];
                let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
                // "userName" -> user|Name, "HTTPServer" -> HTTP|Server
                if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower) {
                    words.push(std::mem::take(&mut current));
                }
            }
            current.push(c);
        }

        if !current.is_empty() {
            words.push(current);
        }
    }

    words
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Recursively rename every mapping key into `convention`.
///
/// Applies to nested objects and to every object inside a list. Values are
/// never touched.
pub fn normalize(tree: &Value, convention: Convention) -> Value {
    match tree {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (convention.convert(k), normalize(v, convention)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(|v| normalize(v, convention)).collect()),
        other => other.clone(),
    }
}

/// `null`, `""`, `[]` and `{}` count as empty. `false` and `0` do not.
pub fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Recursively drop empty values, bottom-up.
///
/// Children are pruned before their parent is tested, so a branch that only
/// held empty leaves disappears as well.
pub fn prune_empty(tree: &Value) -> Value {
    match tree {
        Value::Object(map) => {
            let mut pruned = Map::new();
            for (k, v) in map {
                let v = prune_empty(v);
                if !is_empty(&v) {
                    pruned.insert(k.clone(), v);
                }
            }
            Value::Object(pruned)
        }
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(prune_empty)
                .filter(|v| !is_empty(v))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Recursively strip `keys` from every mapping in the tree.
pub fn remove_keys(tree: &Value, keys: &[&str]) -> Value {
    match tree {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(k, _)| !keys.contains(&k.as_str()))
                .map(|(k, v)| (k.clone(), remove_keys(v, keys)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(|v| remove_keys(v, keys)).collect()),
        other => other.clone(),
    }
}
