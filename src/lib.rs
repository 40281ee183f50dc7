//! Auto-resolution decision engine for support ticket triage.
//!
//! The engine takes a structured ticket, retrieves semantically similar
//! historical tickets, decides whether the ticket can be resolved
//! automatically, routes it to the best-matching team, and executes the
//! resolution plan when automation is possible. Ingestion, embedding
//! generation, and the backing relational/vector stores are external
//! collaborators consumed through the [`directory::TeamBackend`] and
//! [`retrieval::SimilarityIndex`] traits.

pub mod classification;
pub mod config;
pub mod directory;
pub mod error;
pub mod execution;
pub mod models;
pub mod pipeline;
pub mod retrieval;

pub use classification::AutoResolutionClassifier;
pub use config::Config;
pub use directory::TeamDirectory;
pub use error::{AppError, Result};
pub use execution::{ResolutionStepExecutor, ToolRegistry};
pub use pipeline::TicketPipeline;
pub use retrieval::SimilarityRetriever;
