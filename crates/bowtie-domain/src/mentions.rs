//! `*_mentioned` evidence flags
//!
//! Any field whose name ends in `_mentioned` records whether the narrative
//! explicitly mentions something. Such fields are booleans and default to
//! `false` absent direct textual evidence.

use serde_json::Value;

/// Suffix identifying an evidence flag
pub const MENTION_SUFFIX: &str = "_mentioned";

/// Whether a field name is an evidence flag
pub fn is_mention_field(name: &str) -> bool {
    name.ends_with(MENTION_SUFFIX)
}

/// Visit every `*_mentioned` field in a JSON document
///
/// The callback receives the dotted path of the field (`bowtie.controls[0].human.training_mentioned`)
/// and its raw value. Traversal order is deterministic: object keys in map
/// order, arrays by index.
pub fn visit_mentions<F>(value: &Value, mut visit: F)
where
    F: FnMut(&str, &Value),
{
    walk(value, String::new(), &mut visit);
}

fn walk<F>(value: &Value, path: String, visit: &mut F)
where
    F: FnMut(&str, &Value),
{
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let child_path = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", path, key)
                };
                if is_mention_field(key) {
                    visit(&child_path, child);
                }
                walk(child, child_path, visit);
            }
        }
        Value::Array(items) => {
            for (idx, child) in items.iter().enumerate() {
                walk(child, format!("{}[{}]", path, idx), visit);
            }
        }
        _ => {}
    }
}
