//! Tolerant JSON loading and pretty-printed saving.
//!
//! Every loader returns an empty structure when the file is missing or
//! malformed — a warning goes to stderr, nothing propagates. Downstream
//! code treats an empty side as "nothing to match" and skips the task.

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::Path;

use crate::models::{ParagraphStore, UnitMeta};

/// Load a JSON file expected to hold a single top-level object.
///
/// Key order is preserved (it defines unit iteration order downstream).
/// Missing file, unreadable file, non-object root: warn and return an
/// empty map.
pub fn load_object(path: &Path) -> Map<String, Value> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Warning: could not read {}: {}", path.display(), e);
            return Map::new();
        }
    };

    match serde_json::from_str::<Value>(&content) {
        Ok(Value::Object(map)) => map,
        Ok(_) => {
            eprintln!(
                "Warning: {} does not contain a JSON object, ignoring",
                path.display()
            );
            Map::new()
        }
        Err(e) => {
            eprintln!("Warning: {} is not valid JSON: {}", path.display(), e);
            Map::new()
        }
    }
}

/// Load unit metadata (`articles.json`, `provisions.json`) as an ordered
/// list of `(unit_id, meta)`. Entries that fail to deserialize are dropped
/// with a warning; the unit simply never enters the pipeline.
pub fn load_units(path: &Path) -> Vec<(String, UnitMeta)> {
    let raw = load_object(path);
    let mut units = Vec::with_capacity(raw.len());

    for (id, value) in raw {
        match serde_json::from_value::<UnitMeta>(value) {
            Ok(meta) => units.push((id, meta)),
            Err(e) => {
                eprintln!(
                    "Warning: skipping malformed unit '{}' in {}: {}",
                    id,
                    path.display(),
                    e
                );
            }
        }
    }

    units
}

/// Load a paragraph store (`paragraphs.json`): paragraph id → text.
/// Non-string values are dropped with a warning.
pub fn load_paragraphs(path: &Path) -> ParagraphStore {
    let raw = load_object(path);
    let mut texts = std::collections::HashMap::with_capacity(raw.len());

    for (id, value) in raw {
        match value {
            Value::String(text) => {
                texts.insert(id, text);
            }
            _ => {
                eprintln!(
                    "Warning: paragraph '{}' in {} is not a string, skipping",
                    id,
                    path.display()
                );
            }
        }
    }

    ParagraphStore::new(texts)
}

/// Load a flat text file (`preamble.json`): id → text block. Same shape as
/// a paragraph store, reused for flat reconstruction.
pub fn load_flat_texts(path: &Path) -> Vec<(String, String)> {
    let raw = load_object(path);
    let mut texts = Vec::with_capacity(raw.len());

    for (id, value) in raw {
        match value {
            Value::String(text) => texts.push((id, text)),
            _ => {
                eprintln!(
                    "Warning: entry '{}' in {} is not a string, skipping",
                    id,
                    path.display()
                );
            }
        }
    }

    texts
}

/// Write `value` as pretty-printed UTF-8 JSON, creating parent directories
/// and fully overwriting any previous file. This is the one loader-side
/// operation that propagates errors: an unwritable output directory is a
/// configuration problem, not a degradation.
pub fn save_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory {}", parent.display()))?;
    }

    let json = serde_json::to_string_pretty(value).context("Failed to serialize results")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_empty() {
        let tmp = TempDir::new().unwrap();
        let units = load_units(&tmp.path().join("absent.json"));
        assert!(units.is_empty());
        let store = load_paragraphs(&tmp.path().join("absent.json"));
        assert!(store.is_empty());
    }

    #[test]
    fn malformed_json_yields_empty() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bad.json");
        fs::write(&path, "{not json").unwrap();
        assert!(load_units(&path).is_empty());
    }

    #[test]
    fn units_preserve_file_order() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("articles.json");
        fs::write(
            &path,
            r#"{"2": {"title": "B", "begin": 3, "end": 4},
                "10": {"title": "C", "begin": 5, "end": 6},
                "1": {"title": "A", "begin": 1, "end": 2}}"#,
        )
        .unwrap();
        let units = load_units(&path);
        let ids: Vec<&str> = units.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["2", "10", "1"]);
    }

    #[test]
    fn malformed_unit_dropped_others_kept() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("articles.json");
        fs::write(
            &path,
            r#"{"1": {"begin": 1, "end": 2}, "2": {"begin": -5, "end": 2}}"#,
        )
        .unwrap();
        let units = load_units(&path);
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].0, "1");
    }

    #[test]
    fn save_json_creates_directories() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested/out/result.json");
        save_json(&serde_json::json!({"pairs": []}), &path).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("pairs"));
    }
}
