//! Core data models used throughout lexalign.
//!
//! These types represent the structural units, paragraph stores, and match
//! results that flow through the cross-referencing pipeline.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Raw per-unit metadata as found in `articles.json` / `provisions.json`.
///
/// `begin`/`end` are inclusive paragraph-id bounds. Either may be absent,
/// in which case the unit is skipped during reconstruction.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UnitMeta {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub begin: Option<u64>,
    #[serde(default)]
    pub end: Option<u64>,
}

/// Inclusive paragraph-id range of a structural unit.
///
/// `begin <= end` holds by construction — the reconstructor refuses to
/// build items with inverted bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParagraphRange {
    pub begin: u64,
    pub end: u64,
}

impl ParagraphRange {
    /// Paragraph ids covered by the range, as string keys into the store.
    pub fn paragraph_ids(&self) -> Vec<String> {
        (self.begin..=self.end).map(|i| i.to_string()).collect()
    }
}

/// A reconstructed text item: one structural unit (article, provision) or
/// one flat block (preamble entry), with its complete text.
///
/// `full_text` is always populated by whichever reconstruction mode built
/// the item. `range` is `Some` for hierarchical units and `None` for flat
/// items, which have no paragraph structure to sub-match.
#[derive(Debug, Clone)]
pub struct TextItem {
    pub id: String,
    pub title: String,
    pub full_text: String,
    pub range: Option<ParagraphRange>,
}

/// Flat mapping from paragraph id (stringified positive integer) to
/// paragraph text. Immutable once loaded; missing ids read as empty text.
#[derive(Debug, Clone, Default)]
pub struct ParagraphStore {
    texts: HashMap<String, String>,
}

impl ParagraphStore {
    pub fn new(texts: HashMap<String, String>) -> Self {
        Self { texts }
    }

    /// Text of paragraph `id`, or `""` when the store has no such paragraph.
    pub fn text(&self, id: &str) -> &str {
        self.texts.get(id).map(String::as_str).unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }
}

/// One retained target match for a source unit, with the paragraph ids
/// inside both units that were judged mutually corresponding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitMatch {
    pub id: String,
    /// Cosine similarity rounded to 4 decimals for storage.
    pub similarity: f64,
    pub source_paragraphs: Vec<String>,
    pub target_paragraphs: Vec<String>,
}

/// The source side of a cross-reference pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceRef {
    pub id: String,
    pub title: String,
}

/// A source unit together with its ordered (similarity-descending) list of
/// retained target matches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrossRefPair {
    pub source: SourceRef,
    pub targets: Vec<UnitMatch>,
}

/// Raw output of the unit-level matcher; the `{task}.json` artifact.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchReport {
    pub pairs: Vec<CrossRefPair>,
}

/// Sub-match result for one (source unit, target unit) pair: the distinct
/// paragraph ids on each side that participated in a qualifying pairing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParagraphMatches {
    pub source_paragraphs: Vec<String>,
    pub target_paragraphs: Vec<String>,
}

/// One above-threshold match in a flat (no hierarchy) comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlatMatch {
    pub target_id: String,
    pub target_text: String,
    pub similarity: f64,
}

/// All qualifying matches for one flat source item. Sources with no
/// qualifying target are omitted from the report entirely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlatSourceMatches {
    pub source_id: String,
    pub source_text: String,
    pub matches: Vec<FlatMatch>,
}

/// Output of the flat matcher; the `{task}.json` artifact for flat tasks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlatMatchReport {
    pub matches: Vec<FlatSourceMatches>,
}

/// One entry of the Output Mapping: a target unit plus the paragraph ids
/// judged corresponding on each side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingTarget {
    pub target_id: String,
    pub source_paragraphs: Vec<String>,
    pub target_paragraphs: Vec<String>,
}

/// Final persisted artifact of the article-level task: source unit id →
/// ordered target entries, preserving the similarity-descending order of
/// the match report. Serializes as a JSON object in insertion order.
#[derive(Debug, Clone, Default)]
pub struct OutputMapping {
    entries: Vec<(String, Vec<MappingTarget>)>,
}

impl OutputMapping {
    pub fn push(&mut self, source_id: String, targets: Vec<MappingTarget>) {
        self.entries.push((source_id, targets));
    }

    pub fn get(&self, source_id: &str) -> Option<&[MappingTarget]> {
        self.entries
            .iter()
            .find(|(id, _)| id == source_id)
            .map(|(_, t)| t.as_slice())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for OutputMapping {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (id, targets) in &self.entries {
            map.serialize_entry(id, targets)?;
        }
        map.end()
    }
}
