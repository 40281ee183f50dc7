pub mod retriever;

pub use retriever::{
    normalize_relevance, RawHit, SimilarityDocument, SimilarityIndex, SimilarityRetriever,
    OPEN_COLLECTION, RESOLVED_COLLECTION,
};
