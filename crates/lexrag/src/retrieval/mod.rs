//! Lexical retrieval: index building, snapshot storage, and ranking

mod index;
mod search;
mod store;

pub use index::{weigh_tokens, IdfTable, IndexBuilder, IndexSnapshot};
pub use search::{cosine_similarity, Retriever};
pub use store::IndexStore;
