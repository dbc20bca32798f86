//! Cross-reference matching between two collections of text items.
//!
//! Two-level algorithm:
//!
//! 1. **Unit level** — every source unit is compared against every target
//!    unit by embedding cosine similarity. All targets at or above the unit
//!    threshold are retained (a draft article may have been split or merged,
//!    so one-to-many is deliberate); when none qualifies, the single best
//!    candidate is retained anyway so every source unit reaches human
//!    review with at least one correspondence.
//! 2. **Paragraph level** — for each retained pair, the paragraphs inside
//!    the two units are compared. Each source paragraph keeps its best
//!    target only if that best clears the paragraph threshold; there is no
//!    fallback at this level.
//!
//! Embeddings are computed in batched calls per collection, never per pair
//! of texts: embedding cost scales with `|S| + |T|`, not `|S| × |T|`.

use crate::config::MatchingConfig;
use crate::embedding::{embed_all, EmbeddingProvider};
use crate::models::{
    CrossRefPair, FlatMatch, FlatMatchReport, FlatSourceMatches, MatchReport, ParagraphMatches,
    ParagraphStore, SourceRef, TextItem, UnitMatch,
};
use crate::progress::{MatchProgressEvent, MatchProgressReporter, NoProgress};
use crate::similarity::{cosine_similarity, round_similarity};

pub struct Matcher<'a> {
    provider: &'a dyn EmbeddingProvider,
    batch_size: usize,
    unit_threshold: f32,
    paragraph_threshold: f32,
    reporter: Box<dyn MatchProgressReporter>,
    task: String,
}

impl<'a> Matcher<'a> {
    pub fn new(
        provider: &'a dyn EmbeddingProvider,
        matching: &MatchingConfig,
        batch_size: usize,
    ) -> Self {
        Self {
            provider,
            batch_size,
            unit_threshold: matching.unit_threshold,
            paragraph_threshold: matching.paragraph_threshold,
            reporter: Box::new(NoProgress),
            task: String::new(),
        }
    }

    /// Attach a progress reporter; `task` labels the emitted events.
    pub fn with_progress(
        mut self,
        reporter: Box<dyn MatchProgressReporter>,
        task: impl Into<String>,
    ) -> Self {
        self.reporter = reporter;
        self.task = task.into();
        self
    }

    /// Unit-to-unit matching with paragraph sub-matching per retained pair.
    ///
    /// An empty side, or a side whose embeddings cannot be computed at all,
    /// short-circuits to an empty report — logged, never fatal.
    pub async fn match_units(
        &self,
        source: &[TextItem],
        target: &[TextItem],
        source_store: &ParagraphStore,
        target_store: &ParagraphStore,
    ) -> MatchReport {
        if source.is_empty() || target.is_empty() {
            return MatchReport::default();
        }

        let source_texts: Vec<String> = source.iter().map(|s| s.full_text.clone()).collect();
        let target_texts: Vec<String> = target.iter().map(|t| t.full_text.clone()).collect();

        let source_vecs = embed_all(self.provider, self.batch_size, &source_texts).await;
        self.report(MatchProgressEvent::Embedded {
            task: self.task.clone(),
            side: "source",
            count: source_vecs.len(),
        });
        let target_vecs = embed_all(self.provider, self.batch_size, &target_texts).await;
        self.report(MatchProgressEvent::Embedded {
            task: self.task.clone(),
            side: "target",
            count: target_vecs.len(),
        });

        if source_vecs.is_empty() || target_vecs.is_empty() {
            eprintln!("Warning: no embeddings could be computed, skipping comparison");
            return MatchReport::default();
        }

        let mut pairs = Vec::with_capacity(source.len());

        for (i, source_item) in source.iter().enumerate() {
            let similarities: Vec<f32> = target_vecs
                .iter()
                .map(|tv| cosine_similarity(&source_vecs[i], tv))
                .collect();

            let retained = retain_matches(&similarities, self.unit_threshold);

            let mut targets = Vec::with_capacity(retained.len());
            for (j, sim) in retained {
                let target_item = &target[j];
                let sub = self
                    .match_paragraphs(source_item, target_item, source_store, target_store)
                    .await;
                targets.push(UnitMatch {
                    id: target_item.id.clone(),
                    similarity: round_similarity(sim),
                    source_paragraphs: sub.source_paragraphs,
                    target_paragraphs: sub.target_paragraphs,
                });
            }

            pairs.push(CrossRefPair {
                source: SourceRef {
                    id: source_item.id.clone(),
                    title: source_item.title.clone(),
                },
                targets,
            });

            self.report(MatchProgressEvent::Matching {
                task: self.task.clone(),
                n: i + 1,
                total: source.len(),
            });
        }

        MatchReport { pairs }
    }

    /// Paragraph sub-matching for one retained (source, target) pair.
    ///
    /// Each source paragraph keeps the target paragraph with the highest
    /// similarity, and only if that maximum clears the paragraph threshold.
    /// Participating ids are accumulated in first-seen order, deduplicated.
    /// Items without a paragraph range (flat mode) yield an empty result.
    async fn match_paragraphs(
        &self,
        source: &TextItem,
        target: &TextItem,
        source_store: &ParagraphStore,
        target_store: &ParagraphStore,
    ) -> ParagraphMatches {
        let (Some(source_range), Some(target_range)) = (source.range, target.range) else {
            return ParagraphMatches::default();
        };

        let source_ids = source_range.paragraph_ids();
        let target_ids = target_range.paragraph_ids();

        let source_texts: Vec<String> = source_ids
            .iter()
            .map(|id| source_store.text(id).to_string())
            .collect();
        let target_texts: Vec<String> = target_ids
            .iter()
            .map(|id| target_store.text(id).to_string())
            .collect();

        let source_vecs = embed_all(self.provider, self.batch_size, &source_texts).await;
        let target_vecs = embed_all(self.provider, self.batch_size, &target_texts).await;

        if source_vecs.is_empty() || target_vecs.is_empty() {
            return ParagraphMatches::default();
        }

        let mut matches = ParagraphMatches::default();

        for (i, source_id) in source_ids.iter().enumerate() {
            let mut best_similarity = 0.0f32;
            let mut best_target: Option<&String> = None;

            for (j, target_id) in target_ids.iter().enumerate() {
                let similarity = cosine_similarity(&source_vecs[i], &target_vecs[j]);
                if similarity > best_similarity && similarity >= self.paragraph_threshold {
                    best_similarity = similarity;
                    best_target = Some(target_id);
                }
            }

            if let Some(target_id) = best_target {
                if !matches.source_paragraphs.contains(source_id) {
                    matches.source_paragraphs.push(source_id.clone());
                }
                if !matches.target_paragraphs.contains(target_id) {
                    matches.target_paragraphs.push(target_id.clone());
                }
            }
        }

        matches
    }

    /// Direct matching between two flat collections (no hierarchy).
    ///
    /// Above-threshold only — no fallback — and sources with no qualifying
    /// target are omitted from the report entirely.
    pub async fn match_flat(&self, source: &[TextItem], target: &[TextItem]) -> FlatMatchReport {
        if source.is_empty() || target.is_empty() {
            return FlatMatchReport::default();
        }

        let source_texts: Vec<String> = source.iter().map(|s| s.full_text.clone()).collect();
        let target_texts: Vec<String> = target.iter().map(|t| t.full_text.clone()).collect();

        let source_vecs = embed_all(self.provider, self.batch_size, &source_texts).await;
        let target_vecs = embed_all(self.provider, self.batch_size, &target_texts).await;

        if source_vecs.is_empty() || target_vecs.is_empty() {
            eprintln!("Warning: no embeddings could be computed, skipping comparison");
            return FlatMatchReport::default();
        }

        let mut all_matches = Vec::new();

        for (i, source_item) in source.iter().enumerate() {
            let mut matches: Vec<(usize, f32)> = target_vecs
                .iter()
                .enumerate()
                .map(|(j, tv)| (j, cosine_similarity(&source_vecs[i], tv)))
                .filter(|(_, sim)| *sim >= self.unit_threshold)
                .collect();

            if matches.is_empty() {
                continue;
            }

            matches.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

            all_matches.push(FlatSourceMatches {
                source_id: source_item.id.clone(),
                source_text: source_item.full_text.clone(),
                matches: matches
                    .into_iter()
                    .map(|(j, sim)| FlatMatch {
                        target_id: target[j].id.clone(),
                        target_text: target[j].full_text.clone(),
                        similarity: round_similarity(sim),
                    })
                    .collect(),
            });

            self.report(MatchProgressEvent::Matching {
                task: self.task.clone(),
                n: i + 1,
                total: source.len(),
            });
        }

        FlatMatchReport {
            matches: all_matches,
        }
    }

    fn report(&self, event: MatchProgressEvent) {
        self.reporter.report(event);
    }
}

/// Retain all target indices at or above `threshold`, ordered by similarity
/// descending (stable — ties keep original target order). When none
/// qualifies, retain the single best candidate: the first maximum.
fn retain_matches(similarities: &[f32], threshold: f32) -> Vec<(usize, f32)> {
    let mut above: Vec<(usize, f32)> = similarities
        .iter()
        .enumerate()
        .filter(|(_, sim)| **sim >= threshold)
        .map(|(j, sim)| (j, *sim))
        .collect();

    if above.is_empty() {
        let mut best = (0usize, similarities[0]);
        for (j, sim) in similarities.iter().enumerate().skip(1) {
            if *sim > best.1 {
                best = (j, *sim);
            }
        }
        return vec![best];
    }

    above.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    above
}
