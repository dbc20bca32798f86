//! Hierarchical text reconstruction.
//!
//! Assembles the flat paragraph store and per-unit metadata into complete
//! texts for each structural unit. Two modes:
//!
//! - **hierarchical** — each unit's `full_text` is the space-joined
//!   concatenation of the paragraphs in its `[begin, end]` range;
//! - **flat** — each id maps directly to one text block (preamble and other
//!   corpora without an article/paragraph hierarchy).

use crate::models::{ParagraphRange, ParagraphStore, TextItem, UnitMeta};

/// Build text items for hierarchical units.
///
/// Units missing `begin` or `end` are skipped entirely; units with
/// `begin > end` are treated the same way (warned, excluded). Paragraphs
/// absent from the store contribute empty text. Titles default to a
/// synthesized `Artículo {id}` label.
pub fn reconstruct_units(units: &[(String, UnitMeta)], store: &ParagraphStore) -> Vec<TextItem> {
    let mut items = Vec::with_capacity(units.len());

    for (id, meta) in units {
        let (begin, end) = match (meta.begin, meta.end) {
            (Some(b), Some(e)) => (b, e),
            _ => continue,
        };

        if begin > end {
            eprintln!(
                "Warning: unit '{}' has begin {} > end {}, excluding",
                id, begin, end
            );
            continue;
        }

        let range = ParagraphRange { begin, end };
        let full_text = range
            .paragraph_ids()
            .iter()
            .map(|pid| store.text(pid))
            .collect::<Vec<_>>()
            .join(" ")
            .trim()
            .to_string();

        let title = match &meta.title {
            Some(t) if !t.is_empty() => t.clone(),
            _ => format!("Artículo {}", id),
        };

        items.push(TextItem {
            id: id.clone(),
            title,
            full_text,
            range: Some(range),
        });
    }

    items
}

/// Build text items for a flat corpus: one item per entry, no range.
pub fn flat_items(entries: &[(String, String)]) -> Vec<TextItem> {
    entries
        .iter()
        .map(|(id, text)| TextItem {
            id: id.clone(),
            title: format!("Elemento {}", id),
            full_text: text.clone(),
            range: None,
        })
        .collect()
}
