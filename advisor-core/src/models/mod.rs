//! Generation model prices and the embedding model description.

mod pricing;

pub use pricing::{ChatModel, EmbeddingModel, PriceList};
