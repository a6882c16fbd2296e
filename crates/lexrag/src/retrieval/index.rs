//! TF-IDF index construction

use std::collections::{HashMap, HashSet};

use crate::types::{Chunk, DocumentSummary, TermWeights};

/// Inverse document frequency per token
pub type IdfTable = HashMap<String, f64>;

/// An immutable, fully built index.
///
/// `idf` and every chunk vector in `documents` come from the same build.
/// Snapshots are replaced wholesale, never patched.
#[derive(Debug, Clone, Default)]
pub struct IndexSnapshot {
    /// Monotonic build counter (0 for the initial empty index)
    pub version: u64,
    pub idf: IdfTable,
    /// Every chunk from every successfully parsed file, in arrival order
    pub documents: Vec<Chunk>,
}

impl IndexSnapshot {
    /// Empty index carrying the given version
    pub fn empty(version: u64) -> Self {
        Self {
            version,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn chunk_count(&self) -> usize {
        self.documents.len()
    }

    pub fn vocabulary_size(&self) -> usize {
        self.idf.len()
    }

    /// Per-source chunk counts, in order of first appearance
    pub fn document_summaries(&self) -> Vec<DocumentSummary> {
        let mut summaries: Vec<DocumentSummary> = Vec::new();
        let mut positions: HashMap<&str, usize> = HashMap::new();

        for chunk in &self.documents {
            match positions.get(chunk.source.as_str()) {
                Some(&i) => summaries[i].chunk_count += 1,
                None => {
                    positions.insert(&chunk.source, summaries.len());
                    summaries.push(DocumentSummary {
                        name: chunk.source.clone(),
                        chunk_count: 1,
                    });
                }
            }
        }

        summaries
    }
}

/// Weight `tokens` against `idf`.
///
/// Term frequency is `count / tokens.len()`. Tokens missing from `idf` or
/// with an idf of exactly zero are left out. Returns the vector and its
/// Euclidean norm.
pub fn weigh_tokens(tokens: &[String], idf: &IdfTable) -> (TermWeights, f64) {
    if tokens.is_empty() {
        return (TermWeights::new(), 0.0);
    }

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for token in tokens {
        *counts.entry(token.as_str()).or_insert(0) += 1;
    }

    let total = tokens.len() as f64;
    let mut vector = TermWeights::with_capacity(counts.len());
    for (token, count) in counts {
        match idf.get(token) {
            Some(&weight) if weight != 0.0 => {
                vector.insert(token.to_string(), (count as f64 / total) * weight);
            }
            _ => {}
        }
    }

    let magnitude = vector.values().map(|v| v * v).sum::<f64>().sqrt();
    (vector, magnitude)
}

/// Builds index snapshots from the full chunk collection
pub struct IndexBuilder;

impl IndexBuilder {
    /// Document frequency: each distinct token counts once per chunk
    pub fn document_frequency(documents: &[Chunk]) -> HashMap<String, usize> {
        let mut df: HashMap<String, usize> = HashMap::new();
        for chunk in documents {
            let distinct: HashSet<&String> = chunk.tokens().iter().collect();
            for token in distinct {
                *df.entry(token.clone()).or_insert(0) += 1;
            }
        }
        df
    }

    /// `ln(N / (1 + df))`, unclamped
    pub fn inverse_document_frequency(doc_count: usize, df: &HashMap<String, usize>) -> IdfTable {
        let n = doc_count as f64;
        df.iter()
            .map(|(token, &freq)| (token.clone(), (n / (1.0 + freq as f64)).ln()))
            .collect()
    }

    /// Rebuild every weight from scratch. Deterministic for a given collection.
    pub fn build(mut documents: Vec<Chunk>, version: u64) -> IndexSnapshot {
        let df = Self::document_frequency(&documents);
        let idf = Self::inverse_document_frequency(documents.len(), &df);

        for chunk in &mut documents {
            let (vector, magnitude) = weigh_tokens(chunk.tokens(), &idf);
            chunk.set_weights(vector, magnitude);
        }

        tracing::debug!(
            "Built index v{}: {} chunks, {} terms",
            version,
            documents.len(),
            idf.len()
        );

        IndexSnapshot {
            version,
            idf,
            documents,
        }
    }
}
