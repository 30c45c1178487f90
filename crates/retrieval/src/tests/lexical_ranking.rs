//! Tests for lexical ranking correctness.

use crate::lexical::LexicalIndex;
use crate::types::{ChunkingOptions, PageText};
use tempfile::TempDir;

#[cfg(test)]
mod tests {
    use super::*;

    fn open(dir: &TempDir) -> LexicalIndex {
        LexicalIndex::open_in_dir(dir.path(), ChunkingOptions::default()).unwrap()
    }

    /// A small plan corpus over two documents.
    fn seeded(dir: &TempDir) -> LexicalIndex {
        let index = open(dir);
        index
            .ingest_pages(
                "summary_of_benefits",
                &[
                    PageText::new(1, "Preventive care is covered at no cost when you use in-network providers."),
                    PageText::new(2, "Specialist visits require a copay of $40 per visit."),
                    PageText::new(3, "Emergency room visits are covered after the deductible is met."),
                ],
            )
            .unwrap();
        index
            .ingest_pages(
                "claims_policy",
                &[
                    PageText::new(1, "Claims must be submitted within 90 days of the date of service."),
                    PageText::new(2, "Denied claims may be appealed in writing within 180 days."),
                ],
            )
            .unwrap();
        index
    }

    #[test]
    fn test_deductible_question_finds_deductible_chunk() {
        let temp_dir = TempDir::new().unwrap();
        let index = open(&temp_dir);
        index
            .ingest_pages(
                "plan",
                &[PageText::new(1, "The deductible is $500 for individuals.")],
            )
            .unwrap();

        let results = index.search("what is the deductible", 5);
        assert_eq!(results.len(), 1);
        assert!(results[0].text.contains("deductible"));
        assert!(results[0].text.contains("$500"));
        assert_eq!(results[0].page, 1);
        assert!(results[0].score > 0.0);
    }

    #[test]
    fn test_exact_phrase_ranks_top() {
        let temp_dir = TempDir::new().unwrap();
        let index = seeded(&temp_dir);

        let results = index.search("denied claims may be appealed", 5);
        assert_eq!(results[0].doc_name, "claims_policy");
        assert_eq!(results[0].page, 2);

        let copay = index.search("specialist copay", 5);
        assert_eq!(copay[0].doc_name, "summary_of_benefits");
        assert_eq!(copay[0].page, 2);
    }

    #[test]
    fn test_results_are_ordered_by_descending_score() {
        let temp_dir = TempDir::new().unwrap();
        let index = seeded(&temp_dir);

        let results = index.search("claims visits covered", 5);
        assert_eq!(results.len(), 5);
        for pair in results.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn test_repeated_search_is_identical() {
        let temp_dir = TempDir::new().unwrap();
        let index = seeded(&temp_dir);

        let first = index.search("visits covered deductible", 5);
        let second = index.search("visits covered deductible", 5);
        assert_eq!(first, second);
    }

    #[test]
    fn test_stop_word_only_query_returns_zero_scores() {
        let temp_dir = TempDir::new().unwrap();
        let index = seeded(&temp_dir);

        let results = index.search("what is it", 3);
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.score == 0.0));
    }

    #[test]
    fn test_reingest_replaces_chunks_by_name() {
        let temp_dir = TempDir::new().unwrap();
        let index = seeded(&temp_dir);
        assert_eq!(index.chunk_count(), 5);

        index
            .ingest_pages(
                "summary_of_benefits",
                &[PageText::new(1, "Vision exams are covered once per year.")],
            )
            .unwrap();

        assert_eq!(index.chunk_count(), 3);
        assert_eq!(index.document_count(), 2);
        assert!(index
            .search("copay", 5)
            .iter()
            .all(|r| !r.text.contains("copay")));
        assert_eq!(index.search("vision exams", 1)[0].doc_name, "summary_of_benefits");
    }

    #[test]
    fn test_persisted_index_survives_reopen_without_duplicates() {
        let temp_dir = TempDir::new().unwrap();
        let before = {
            let index = seeded(&temp_dir);
            index
                .ingest_pages(
                    "claims_policy",
                    &[
                        PageText::new(1, "Claims must be submitted within 90 days of the date of service."),
                        PageText::new(2, "Denied claims may be appealed in writing within 180 days."),
                    ],
                )
                .unwrap();
            index.search("claims appealed", 5)
        };

        let reopened = open(&temp_dir);
        assert_eq!(reopened.chunk_count(), 5);
        assert_eq!(reopened.document_count(), 2);
        assert_eq!(reopened.search("claims appealed", 5), before);
    }

    #[test]
    fn test_other_documents_keep_relative_order() {
        let temp_dir = TempDir::new().unwrap();
        let index = open(&temp_dir);
        for name in ["a", "b", "c"] {
            index
                .ingest_pages(name, &[PageText::new(1, format!("shared {}", name))])
                .unwrap();
        }
        index
            .ingest_pages("a", &[PageText::new(1, "shared a again")])
            .unwrap();

        // Equal scores fall back to collection order
        let order: Vec<_> = index
            .search("unmatched", 3)
            .into_iter()
            .map(|r| r.doc_name)
            .collect();
        assert_eq!(order, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_searches_during_reingest_see_one_version() {
        let temp_dir = TempDir::new().unwrap();
        let index = open(&temp_dir);
        let pages = |version: usize| -> Vec<PageText> {
            (1..=3)
                .map(|p| PageText::new(p, format!("revision {} deductible page {}", version, p)))
                .collect()
        };
        index.ingest_pages("plan", &pages(0)).unwrap();

        std::thread::scope(|scope| {
            let index = &index;
            scope.spawn(move || {
                for version in 1..40 {
                    index.ingest_pages("plan", &pages(version)).unwrap();
                }
            });
            for _ in 0..4 {
                scope.spawn(move || {
                    for _ in 0..250 {
                        let results = index.search("deductible", 10);
                        assert_eq!(results.len(), 3);
                        let versions: Vec<_> = results
                            .iter()
                            .map(|r| r.text.split_whitespace().nth(1).unwrap().to_string())
                            .collect();
                        assert!(versions.iter().all(|v| *v == versions[0]));
                    }
                });
            }
        });

        assert_eq!(index.chunk_count(), 3);
        assert!(index.search("deductible", 1)[0].text.starts_with("revision 39 "));
    }
}
