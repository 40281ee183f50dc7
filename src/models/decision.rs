use crate::models::similar::clamp_unit;
use crate::models::team::Team;
use serde::{Deserialize, Serialize};

/// A team paired with its match score
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamMatch {
    pub team: Team,
    pub score: f64,
}

impl TeamMatch {
    pub fn new(team: Team, score: f64) -> Self {
        Self {
            team,
            score: clamp_unit(score),
        }
    }
}

/// Terminal classification verdict for a ticket.
///
/// Produced exactly once per ticket; immutable once returned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationDecision {
    /// Whether the ticket is eligible for automated resolution
    pub can_auto_resolve: bool,

    /// Confidence in the decision, bounded by its weakest supporting signal
    pub confidence_score: f64,

    /// Team the ticket is routed to; never absent
    pub routing_team: Team,

    /// Score the routing team matched with
    pub team_match_score: f64,

    /// Ordered resolution plan; present only when auto-resolvable
    pub auto_resolution_steps: Option<Vec<String>>,

    /// Whether the ticket is too vague to act on
    pub needs_more_info: bool,

    /// Human-readable explanation of the verdict
    pub reasoning: String,
}

impl ClassificationDecision {
    /// Build a decision, enforcing that a non-auto-resolvable verdict never
    /// carries a resolution plan.
    pub fn new(
        can_auto_resolve: bool,
        confidence_score: f64,
        team_match: TeamMatch,
        auto_resolution_steps: Option<Vec<String>>,
        needs_more_info: bool,
        reasoning: String,
    ) -> Self {
        Self {
            can_auto_resolve,
            confidence_score: clamp_unit(confidence_score),
            routing_team: team_match.team,
            team_match_score: team_match.score,
            auto_resolution_steps: if can_auto_resolve {
                auto_resolution_steps
            } else {
                None
            },
            needs_more_info,
            reasoning,
        }
    }

    /// Safe verdict used when classification itself fails: route to the
    /// default team for human review.
    pub fn fallback(reason: &str) -> Self {
        Self {
            can_auto_resolve: false,
            confidence_score: 0.1,
            routing_team: Team::default_team(),
            team_match_score: 0.5,
            auto_resolution_steps: None,
            needs_more_info: true,
            reasoning: reason.to_string(),
        }
    }
}
