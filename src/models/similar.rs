use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A historical ticket returned by similarity retrieval.
///
/// Read-only to downstream components; produced per-query by the retriever.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarTicket {
    /// Identifier of the historical ticket
    pub ticket_id: String,

    /// Content snapshot stored alongside the embedding
    pub content: String,

    /// Normalized similarity score in [0, 1]
    pub similarity_score: f64,

    /// Recorded solution text, if the ticket was solved
    pub solution: Option<String>,

    /// Recorded resolution steps, in execution order
    #[serde(default)]
    pub resolution_steps: Vec<String>,

    /// Whether the ticket was resolved without human handling
    #[serde(default)]
    pub auto_resolved: bool,

    /// Wall-clock hours the resolution took
    pub resolution_time_hours: Option<f64>,

    /// Historical success rate of the recorded solution, in [0, 1]
    #[serde(default)]
    pub success_rate: f64,

    /// Auxiliary metadata carried through from the similarity store
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl SimilarTicket {
    pub fn new(ticket_id: String, content: String, similarity_score: f64) -> Self {
        Self {
            ticket_id,
            content,
            similarity_score: clamp_unit(similarity_score),
            solution: None,
            resolution_steps: Vec::new(),
            auto_resolved: false,
            resolution_time_hours: None,
            success_rate: 0.0,
            metadata: Map::new(),
        }
    }

    pub fn with_solution(mut self, solution: String, success_rate: f64) -> Self {
        self.solution = Some(solution);
        self.success_rate = clamp_unit(success_rate);
        self
    }
}

/// Clamp a score into the [0, 1] similarity space
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}
