//! Cosine-similarity ranking over an index snapshot

use std::cmp::Ordering;

use super::index::{weigh_tokens, IndexSnapshot};
use crate::ingestion::tokenize;
use crate::types::{Chunk, ScoredChunk, TermWeights};

/// Cosine similarity between a question vector and a chunk.
///
/// Zero when either side has zero magnitude.
pub fn cosine_similarity(query: &TermWeights, query_magnitude: f64, chunk: &Chunk) -> f64 {
    if query_magnitude == 0.0 || chunk.magnitude() == 0.0 {
        return 0.0;
    }

    let chunk_vector = chunk.tfidf_vector();
    let dot: f64 = query
        .iter()
        .filter_map(|(token, weight)| chunk_vector.get(token).map(|w| w * weight))
        .sum();

    dot / (chunk.magnitude() * query_magnitude)
}

/// Ranks indexed chunks against a question
#[derive(Debug, Clone)]
pub struct Retriever {
    top_k: usize,
}

impl Default for Retriever {
    fn default() -> Self {
        Self::new(5)
    }
}

impl Retriever {
    pub fn new(top_k: usize) -> Self {
        Self { top_k }
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Chunks scoring above zero, best first, at most `top_k`
    pub fn retrieve(&self, question: &str, snapshot: &IndexSnapshot) -> Vec<ScoredChunk> {
        if snapshot.is_empty() || snapshot.idf.is_empty() {
            return Vec::new();
        }

        let (query, magnitude) = weigh_tokens(&tokenize(question), &snapshot.idf);
        if magnitude == 0.0 {
            tracing::debug!("Question has no indexed terms: {:?}", question);
            return Vec::new();
        }

        let mut scored: Vec<(usize, f64)> = snapshot
            .documents
            .iter()
            .enumerate()
            .map(|(i, chunk)| (i, cosine_similarity(&query, magnitude, chunk)))
            .filter(|(_, score)| *score > 0.0)
            .collect();

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        scored.truncate(self.top_k);

        tracing::debug!(
            "Retrieved {} chunk(s) from index v{}",
            scored.len(),
            snapshot.version
        );

        scored
            .into_iter()
            .map(|(i, score)| ScoredChunk {
                chunk: snapshot.documents[i].clone(),
                score,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use crate::retrieval::IndexBuilder;

    fn build(texts: &[(&str, &str)]) -> IndexSnapshot {
        let chunks = texts
            .iter()
            .map(|(source, text)| Chunk::new(*source, *text, tokenize(text)))
            .collect();
        IndexBuilder::build(chunks, 1)
    }

    fn pets() -> IndexSnapshot {
        build(&[
            ("cats.txt", "The cat sat on the mat."),
            ("dogs.txt", "Dogs are great pets and dogs are loyal."),
            ("birds.txt", "Birds can fly over the tall mountains."),
            ("fish.txt", "Fish swim quietly in the deep blue sea."),
        ])
    }

    #[test]
    fn test_dogs_question_ranks_dog_chunk_first() {
        let index = pets();
        let results = Retriever::default().retrieve("Tell me about dogs", &index);

        assert!(!results.is_empty());
        assert_eq!(results[0].chunk.source, "dogs.txt");
        assert!(results[0].score > 0.0);
        assert!(results.iter().all(|r| r.chunk.source != "cats.txt"));
    }

    #[test]
    fn test_unindexed_question_is_empty() {
        let index = pets();
        // "the" appears in three of four chunks (idf 0); "of" is never indexed
        assert_eq!(index.idf["the"], 0.0);
        assert!(!index.idf.contains_key("of"));
        assert!(Retriever::default().retrieve("of the", &index).is_empty());
    }

    #[test]
    fn test_empty_index() {
        let index = IndexBuilder::build(Vec::new(), 0);
        assert!(Retriever::default().retrieve("anything at all", &index).is_empty());
    }

    #[test]
    fn test_retrieval_bound() {
        let texts: Vec<(String, String)> = (0..12)
            .map(|i| {
                (
                    format!("doc{}.txt", i),
                    format!("shared topic words plus unique{} marker{} tail", i, i % 3),
                )
            })
            .chain((0..8).map(|i| (format!("other{}.txt", i), format!("unrelated filler text number{}", i))))
            .collect();
        let refs: Vec<(&str, &str)> = texts.iter().map(|(s, t)| (s.as_str(), t.as_str())).collect();
        let index = build(&refs);

        for question in ["shared topic", "marker1 unique4", "words", "nothing here", ""] {
            let results = Retriever::default().retrieve(question, &index);
            assert!(results.len() <= 5);
            assert!(results.iter().all(|r| r.score > 0.0));
            for pair in results.windows(2) {
                assert!(pair[0].score >= pair[1].score);
            }
        }
    }

    #[test]
    fn test_zero_magnitude_chunk_scores_zero() {
        let index = pets();
        let empty = Chunk::new("blank", "......................", Vec::new());
        let (query, magnitude) = weigh_tokens(&tokenize("dogs"), &index.idf);
        assert!(magnitude > 0.0);
        assert_eq!(cosine_similarity(&query, magnitude, &empty), 0.0);
        assert_eq!(cosine_similarity(&TermWeights::new(), 0.0, &index.documents[1]), 0.0);
    }

    #[test]
    fn test_identical_text_scores_one() {
        let index = pets();
        let results = Retriever::default().retrieve("Dogs are great pets and dogs are loyal.", &index);
        assert!((results[0].score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_top_k_is_configurable() {
        let index = pets();
        let results = Retriever::new(1).retrieve("dogs cat birds fish", &index);
        assert_eq!(results.len(), 1);
    }

    const WORDS: &[&str] = &[
        "cat", "dog", "bird", "fish", "sea", "mat", "loyal", "fly", "deep", "blue", "tall", "the",
        "of",
    ];

    fn sentence() -> impl Strategy<Value = String> {
        prop::collection::vec(prop::sample::select(WORDS), 0..10).prop_map(|words| words.join(" "))
    }

    fn generated(texts: &[String]) -> IndexSnapshot {
        let chunks = texts
            .iter()
            .map(|text| Chunk::new("generated.txt", text.as_str(), tokenize(text)))
            .collect();
        IndexBuilder::build(chunks, 1)
    }

    proptest! {
        #[test]
        fn prop_results_bounded_positive_and_ranked(
            texts in prop::collection::vec(sentence(), 0..25),
            question in sentence(),
        ) {
            let index = generated(&texts);
            let results = Retriever::default().retrieve(&question, &index);

            prop_assert!(results.len() <= 5);
            for result in &results {
                prop_assert!(result.score > 0.0);
                prop_assert!(result.score <= 1.0 + 1e-9);
            }
            // Identical chunks tie; ties keep collection order
            for pair in results.windows(2) {
                prop_assert!(pair[0].score >= pair[1].score);
            }
        }

        #[test]
        fn prop_zero_magnitude_chunks_score_zero(
            texts in prop::collection::vec(sentence(), 1..25),
            question in sentence(),
        ) {
            let index = generated(&texts);
            let (query, magnitude) = weigh_tokens(&tokenize(&question), &index.idf);

            for chunk in index.documents.iter().filter(|c| c.magnitude() == 0.0) {
                prop_assert_eq!(cosine_similarity(&query, magnitude, chunk), 0.0);
            }
        }
    }
}
