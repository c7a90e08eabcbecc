//! Recursive helpers over raw API JSON
//!
//! The export API nests interesting values at varying depths depending on
//! endpoint and version. These helpers walk an arbitrary tree of objects
//! and arrays depth-first in pre-order, without mutating the input.
//! `serde_json::Value` trees are acyclic by construction, so no cycle guard
//! is needed.

use serde_json::Value;

/// Collect every value stored under `key` anywhere in the tree
///
/// Matches are returned in depth-first, pre-order encounter order. When a
/// key's value is itself an object or array, the walk descends into it and
/// does NOT also record the container as a match, even if the key matches —
/// only leaf values are collected. That asymmetry is intentional; callers
/// relying on this helper expect leaf extraction semantics.
pub fn extract_values<'a>(tree: &'a Value, key: &str) -> Vec<&'a Value> {
    let mut values = Vec::new();
    collect_values(tree, key, &mut values);
    values
}

fn collect_values<'a>(node: &'a Value, key: &str, values: &mut Vec<&'a Value>) {
    match node {
        Value::Object(map) => {
            for (k, v) in map {
                if v.is_object() || v.is_array() {
                    collect_values(v, key, values);
                } else if k == key {
                    values.push(v);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_values(item, key, values);
            }
        }
        _ => {}
    }
}

/// Collect every key present anywhere in the tree
///
/// Keys are recorded in depth-first, pre-order encounter order; a key whose
/// value is a container is recorded before the keys inside it. Duplicate
/// key names at different depths appear once per occurrence.
pub fn extract_keys(tree: &Value) -> Vec<&str> {
    let mut keys = Vec::new();
    collect_keys(tree, &mut keys);
    keys
}

fn collect_keys<'a>(node: &'a Value, keys: &mut Vec<&'a str>) {
    match node {
        Value::Object(map) => {
            for (k, v) in map {
                keys.push(k.as_str());
                if v.is_object() || v.is_array() {
                    collect_keys(v, keys);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_keys(item, keys);
            }
        }
        _ => {}
    }
}
