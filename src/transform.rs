//! Reshaping of the raw match report into the consumer-facing mapping.
//!
//! Pure restructuring: no re-sorting, no re-thresholding, no new
//! computation. The similarity-descending order produced by the matcher is
//! preserved as-is.

use crate::models::{MappingTarget, MatchReport, OutputMapping};

/// Build the Output Mapping: source unit id → ordered target entries with
/// their corresponding paragraph id lists.
pub fn to_paragraph_structure(report: &MatchReport) -> OutputMapping {
    let mut mapping = OutputMapping::default();

    for pair in &report.pairs {
        let targets = pair
            .targets
            .iter()
            .map(|m| MappingTarget {
                target_id: m.id.clone(),
                source_paragraphs: m.source_paragraphs.clone(),
                target_paragraphs: m.target_paragraphs.clone(),
            })
            .collect();

        mapping.push(pair.source.id.clone(), targets);
    }

    mapping
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CrossRefPair, SourceRef, UnitMatch};

    fn unit_match(id: &str, similarity: f64, src: &[&str], tgt: &[&str]) -> UnitMatch {
        UnitMatch {
            id: id.to_string(),
            similarity,
            source_paragraphs: src.iter().map(|s| s.to_string()).collect(),
            target_paragraphs: tgt.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn report() -> MatchReport {
        MatchReport {
            pairs: vec![
                CrossRefPair {
                    source: SourceRef {
                        id: "A1".to_string(),
                        title: "Artículo A1".to_string(),
                    },
                    targets: vec![
                        unit_match("B1", 0.96, &["1", "2"], &["1"]),
                        unit_match("B2", 0.8, &["2"], &["3"]),
                    ],
                },
                CrossRefPair {
                    source: SourceRef {
                        id: "A2".to_string(),
                        title: "Artículo A2".to_string(),
                    },
                    targets: vec![unit_match("B5", 0.42, &[], &[])],
                },
            ],
        }
    }

    #[test]
    fn preserves_pair_and_target_order() {
        let mapping = to_paragraph_structure(&report());
        assert_eq!(mapping.len(), 2);

        let a1 = mapping.get("A1").unwrap();
        assert_eq!(a1.len(), 2);
        assert_eq!(a1[0].target_id, "B1");
        assert_eq!(a1[1].target_id, "B2");
        assert_eq!(a1[0].source_paragraphs, vec!["1", "2"]);
        assert_eq!(a1[0].target_paragraphs, vec!["1"]);

        let a2 = mapping.get("A2").unwrap();
        assert_eq!(a2.len(), 1);
        assert_eq!(a2[0].target_id, "B5");
        assert!(a2[0].source_paragraphs.is_empty());
    }

    #[test]
    fn empty_report_yields_empty_mapping() {
        let mapping = to_paragraph_structure(&MatchReport::default());
        assert!(mapping.is_empty());
    }

    #[test]
    fn serializes_as_ordered_object() {
        let mapping = to_paragraph_structure(&report());
        let json = serde_json::to_string(&mapping).unwrap();
        // A1 comes before A2, and similarity is not part of the mapping
        let a1_pos = json.find("\"A1\"").unwrap();
        let a2_pos = json.find("\"A2\"").unwrap();
        assert!(a1_pos < a2_pos);
        assert!(!json.contains("similarity"));
        assert!(json.contains("\"target_id\": \"B5\"") || json.contains("\"target_id\":\"B5\""));
    }
}
