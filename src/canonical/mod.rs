use serde_json::Value;
use sha2::{Digest, Sha256};

/// Recursively sorts mapping keys (lists keep their element order) and
/// renders the result as a compact, ASCII-safe JSON string.
///
/// `serde_json::Map` is a `BTreeMap` by default (the `preserve_order`
/// feature is not enabled in this crate), so keys already come out sorted
/// once rebuilt through [`sort_keys_recursive`] — matching the original's
/// `json.dumps(..., sort_keys=True, ensure_ascii=True, separators=(",", ":"))`.
pub fn canonicalize(value: &Value) -> String {
    let normalized = sort_keys_recursive(value);
    to_ascii_compact(&normalized)
}

/// First 16 hex characters of the SHA-256 digest of [`canonicalize`]'s output.
pub fn hash(value: &Value) -> String {
    let canonical = canonicalize(value);
    let digest = Sha256::digest(canonical.as_bytes());
    hex::encode(digest)[..16].to_string()
}

fn sort_keys_recursive(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut sorted = serde_json::Map::new();
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            for key in keys {
                sorted.insert(key.clone(), sort_keys_recursive(&map[key]));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(sort_keys_recursive).collect()),
        other => other.clone(),
    }
}

/// Renders JSON with non-ASCII characters escaped as `\uXXXX`, matching
/// Python's `ensure_ascii=True`. `serde_json::to_string` already produces
/// compact output with no extraneous whitespace, matching
/// `separators=(",", ":")`.
fn to_ascii_compact(value: &Value) -> String {
    let compact = serde_json::to_string(value).expect("Value serialization is infallible");
    let mut out = String::with_capacity(compact.len());
    for ch in compact.chars() {
        if ch.is_ascii() {
            out.push(ch);
        } else {
            let mut buf = [0u16; 2];
            for unit in ch.encode_utf16(&mut buf) {
                out.push_str(&format!("\\u{:04x}", unit));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sorts_nested_keys_but_keeps_list_order() {
        let value = json!({"b": 1, "a": [3, 2, {"z": 1, "y": 2}]});
        let canon = canonicalize(&value);
        assert_eq!(canon, r#"{"a":[3,2,{"y":2,"z":1}],"b":1}"#);
    }

    #[test]
    fn hash_is_sixteen_hex_chars() {
        let value = json!({"a": 1});
        let h = hash(&value);
        assert_eq!(h.len(), 16);
        assert!(h.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn hash_is_stable_under_key_reordering() {
        let a = json!({"a": 1, "b": 2});
        let b = json!({"b": 2, "a": 1});
        assert_eq!(hash(&a), hash(&b));
    }

    #[test]
    fn hash_differs_on_list_order_change() {
        let a = json!({"a": [1, 2]});
        let b = json!({"a": [2, 1]});
        assert_ne!(hash(&a), hash(&b));
    }

    #[test]
    fn escapes_non_ascii() {
        let value = json!({"a": "caf\u{e9}"});
        let canon = canonicalize(&value);
        assert_eq!(canon, "{\"a\":\"caf\\u00e9\"}");
    }
}
