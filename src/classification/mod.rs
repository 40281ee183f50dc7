pub mod classifier;
pub mod scoring;

pub use classifier::{AutoResolutionClassifier, ResolutionAssessment};
pub use scoring::{is_unclear, score_team};
