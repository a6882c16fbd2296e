//! Query request types

use serde::{Deserialize, Serialize};

/// Question submitted to the system
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    /// The question to answer
    pub question: String,

    /// Include chunk text in the citations (default: false)
    #[serde(default)]
    pub include_chunks: bool,
}

impl QueryRequest {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            include_chunks: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_minimal() {
        let request: QueryRequest =
            serde_json::from_str(r#"{"question": "What is the refund policy?"}"#).unwrap();
        assert_eq!(request.question, "What is the refund policy?");
        assert!(!request.include_chunks);
    }
}
