//! Canonical JSON rendering for comparing simulation snapshots.
//!
//! Object keys are sorted recursively so two values that serialize the same
//! fields in a different order still compare equal.

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;

/// Serialize `value` as pretty JSON with sorted object keys and a trailing newline.
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String> {
    let value = serde_json::to_value(value).context("Failed to serialize snapshot value")?;
    let value = canonicalize_value(value);
    let mut s = serde_json::to_string_pretty(&value).context("Failed to format snapshot JSON")?;
    s.push('\n');
    Ok(s)
}

/// Fail with the first differing line if `left` and `right` serialize differently.
pub fn assert_json_eq<A: Serialize, B: Serialize>(left: &A, right: &B) -> Result<()> {
    let left = canonical_json(left)?;
    let right = canonical_json(right)?;
    if left == right {
        return Ok(());
    }
    let (line, (l, r)) = left
        .lines()
        .zip(right.lines())
        .enumerate()
        .find(|(_, (l, r))| l != r)
        .unwrap_or((left.lines().count().min(right.lines().count()), ("<end>", "<end>")));
    anyhow::bail!("Snapshots diverge at line {}: {} != {}", line + 1, l.trim(), r.trim())
}

fn canonicalize_value(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            let mut out = serde_json::Map::with_capacity(entries.len());
            for (k, v) in entries {
                out.insert(k, canonicalize_value(v));
            }
            Value::Object(out)
        }
        Value::Array(values) => Value::Array(values.into_iter().map(canonicalize_value).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn key_order_does_not_matter() {
        let a = json!({"b": 1, "a": {"y": 2, "x": 3}});
        let b = json!({"a": {"x": 3, "y": 2}, "b": 1});
        assert_eq!(canonical_json(&a).unwrap(), canonical_json(&b).unwrap());
        assert!(assert_json_eq(&a, &b).is_ok());
    }

    #[test]
    fn mismatch_names_the_line() {
        let err = assert_json_eq(&json!({"a": 1}), &json!({"a": 2})).unwrap_err();
        assert!(err.to_string().contains("line 2"), "{err}");
    }
}
