//! Property tree merge and lookup
//!
//! Deployment-wide properties form the base tree; each job may override
//! parts of it. The merge is structural: where both sides hold mappings
//! the merge recurses, anywhere else the override wins outright, including
//! a scalar replacing a whole subtree. Both inputs are left untouched.

use convoy_types::Properties;
use serde_json::Value;

/// Merge `overrides` on top of `base`, returning a new tree
pub fn merge(base: &Properties, overrides: &Properties) -> Properties {
    let mut merged = base.clone();
    for (key, value) in overrides {
        match (base.get(key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                merged.insert(key.clone(), Value::Object(merge(existing, incoming)));
            }
            _ => {
                merged.insert(key.clone(), value.clone());
            }
        }
    }
    merged
}

/// Traverse a tree along a dotted path; absent if any segment is missing
/// or an intermediate value is not a mapping
pub fn lookup_path<'a>(tree: &'a Properties, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = tree.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}
