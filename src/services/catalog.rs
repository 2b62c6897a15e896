//! Shaping of the public catalog tables (categories, icons).
//!
//! Both functions are pure: rows in, JSON out.

use std::collections::{HashMap, HashSet};

use serde_json::{Map, Value};

/// Identifier used to join a subcategory's `parent` to a category's `id`.
///
/// Numbers and their string spelling join (`1` and `"1"` are the same key).
/// A missing field joins nothing.
fn join_key(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Attach to every category the subcategories whose `parent` is its `id`.
///
/// Category order and the relative order of each category's children are
/// preserved. Subcategories pointing at an unknown parent are dropped.
pub fn nest_categories(categories: Vec<Value>, subcategories: Vec<Value>) -> Vec<Value> {
    let mut by_parent: HashMap<String, Vec<Value>> = HashMap::new();
    for sub in subcategories {
        if let Some(key) = join_key(sub.get("parent")) {
            by_parent.entry(key).or_default().push(sub);
        }
    }

    categories
        .into_iter()
        .map(|category| {
            let children = join_key(category.get("id"))
                .and_then(|key| by_parent.get(&key).cloned())
                .unwrap_or_default();

            let mut fields = match category {
                Value::Object(map) => map,
                _ => Map::new(),
            };
            fields.insert("subcategories".to_string(), Value::Array(children));
            Value::Object(fields)
        })
        .collect()
}

/// Icon tokens of the default row (the one whose `user_id` is null),
/// de-duplicated in first-seen order. No default row yields no icons.
pub fn default_icons(rows: &[Value]) -> Vec<Value> {
    let base = rows
        .iter()
        .find(|row| matches!(row.get("user_id"), Some(Value::Null)))
        .and_then(|row| row.get("emojis"));

    let tokens: Vec<Value> = match base {
        Some(Value::Array(items)) => items.clone(),
        // a single string spreads into its characters
        Some(Value::String(s)) => s.chars().map(|c| Value::String(c.to_string())).collect(),
        _ => Vec::new(),
    };

    let mut seen = HashSet::new();
    tokens
        .into_iter()
        .filter(|token| seen.insert(token.to_string()))
        .collect()
}
