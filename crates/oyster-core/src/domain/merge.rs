//! Deep merge used to back-fill a stored document from the defaults.
//!
//! # How schema evolution works here
//!
//! The stored document carries no version number.  Instead, every load starts
//! from a *complete* default document and overlays whatever was stored on top
//! of it, key by key:
//!
//! ```text
//! defaults  { ui: { glow: 25, fontScale: 110 }, display: {...} }
//! stored    { ui: { glow: 70 } }
//! ─────────────────────────────────────────────────────────────
//! merged    { ui: { glow: 70, fontScale: 110 }, display: {...} }
//! ```
//!
//! Objects recurse; every other value (numbers, strings, `null`, arrays)
//! replaces the target value wholesale.  A field added to the defaults in a
//! newer release therefore shows up automatically for documents saved by an
//! older one.
//!
//! A stored leaf of the wrong type (`"glow": "bright"`) is dropped on its own
//! by [`merge_onto_defaults`]; the rest of the stored document is kept.

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

use super::document::SettingsDocument;

/// Error returned when a merged value does not fit the document schema.
#[derive(Debug, Error)]
pub enum MergeError {
    #[error("merged document does not match the settings schema: {0}")]
    Schema(#[source] serde_json::Error),
}

/// Recursively overlays `source` onto `target`.
///
/// For every key in `source`:
/// - a non-array object recurses into the matching sub-object of `target`
///   (created, or replaced by an empty object, when missing or not an object);
/// - any other value is assigned directly, overwriting `target`'s value.
///
/// Keys absent from `source` are left untouched.  A `source` that is not an
/// object changes nothing.
pub fn merge_deep(target: &mut Value, source: &Value) {
    let Some(source_map) = source.as_object() else {
        return;
    };
    if !target.is_object() {
        *target = Value::Object(Map::new());
    }
    let Some(target_map) = target.as_object_mut() else {
        return;
    };

    for (key, incoming) in source_map {
        if incoming.is_object() {
            let slot = target_map
                .entry(key.clone())
                .or_insert_with(|| Value::Object(Map::new()));
            merge_deep(slot, incoming);
        } else {
            target_map.insert(key.clone(), incoming.clone());
        }
    }
}

/// Merges `parsed` onto a fresh default document.
///
/// # Errors
///
/// Returns [`MergeError::Schema`] when a stored value has the wrong shape
/// (for example `"glow": "bright"`).
pub fn try_merge_onto_defaults(parsed: &Value) -> Result<SettingsDocument, MergeError> {
    let mut merged = serde_json::to_value(SettingsDocument::default()).map_err(MergeError::Schema)?;
    merge_deep(&mut merged, parsed);
    serde_json::from_value(merged).map_err(MergeError::Schema)
}

/// Like [`try_merge_onto_defaults`] but never fails.
///
/// A stored value with the wrong shape is dropped on its own: that leaf takes
/// its default and every other stored field is kept.
pub fn merge_onto_defaults(parsed: &Value) -> SettingsDocument {
    match try_merge_onto_defaults(parsed) {
        Ok(doc) => doc,
        Err(e) => {
            warn!("repairing stored settings: {e}");
            repair_leaf_by_leaf(parsed)
        }
    }
}

/// Rebuilds the document from the defaults, adopting each merged leaf only
/// while the whole document still deserializes with it.
fn repair_leaf_by_leaf(parsed: &Value) -> SettingsDocument {
    let defaults = SettingsDocument::default();
    let Ok(default_tree) = serde_json::to_value(&defaults) else {
        return defaults;
    };
    let mut merged = default_tree.clone();
    merge_deep(&mut merged, parsed);

    let mut repaired = default_tree.clone();
    adopt_leaves(&default_tree, &merged, &mut repaired, &mut Vec::new());
    serde_json::from_value(repaired).unwrap_or(defaults)
}

fn adopt_leaves(default: &Value, merged: &Value, repaired: &mut Value, path: &mut Vec<String>) {
    match (default, merged) {
        (Value::Object(defaults), Value::Object(stored)) => {
            for (key, default_child) in defaults {
                let Some(stored_child) = stored.get(key) else {
                    continue;
                };
                path.push(key.clone());
                adopt_leaves(default_child, stored_child, repaired, path);
                path.pop();
            }
        }
        (Value::Object(_), _) => {
            warn!("stored '{}' is not an object; using its defaults", path.join("."));
        }
        _ if default == merged => {}
        _ => {
            let Some(slot) = node_mut(repaired, path) else {
                return;
            };
            let previous = std::mem::replace(slot, merged.clone());
            if serde_json::from_value::<SettingsDocument>(repaired.clone()).is_err() {
                warn!("stored '{}' has the wrong type; using its default", path.join("."));
                if let Some(slot) = node_mut(repaired, path) {
                    *slot = previous;
                }
            }
        }
    }
}

fn node_mut<'a>(root: &'a mut Value, path: &[String]) -> Option<&'a mut Value> {
    path.iter().try_fold(root, |node, key| node.get_mut(key.as_str()))
}
