use crate::classification::scoring::{is_unclear, score_team};
use crate::config::ClassificationConfig;
use crate::directory::TeamDirectory;
use crate::error::Result;
use crate::models::{
    clamp_unit, ClassificationDecision, SimilarTicket, Team, TeamMatch, Ticket,
};
use crate::retrieval::retriever::split_step_lines;
use std::cmp::Ordering;
use std::sync::Arc;

/// Verdict of the auto-resolution test, before routing
#[derive(Debug, Clone)]
pub struct ResolutionAssessment {
    /// Whether automation should be attempted
    pub eligible: bool,

    /// Confidence in the verdict: the mean historical success rate when
    /// eligible, its complement when not
    pub confidence: f64,

    /// Plan derived from the strongest precedent, when eligible
    pub plan: Option<Vec<String>>,

    /// Mean success rate of the auto-resolved precedents
    pub mean_success_rate: f64,
}

/// Decides whether a ticket can be resolved automatically and which team it
/// routes to.
///
/// `classify` is infallible: connectivity and data errors degrade to the
/// default team, and an unexpected internal failure yields a safe
/// "requires human review" decision.
pub struct AutoResolutionClassifier {
    directory: Arc<TeamDirectory>,
    config: ClassificationConfig,
}

impl AutoResolutionClassifier {
    pub fn new(directory: Arc<TeamDirectory>, config: ClassificationConfig) -> Self {
        Self { directory, config }
    }

    /// Classify a ticket against its retrieved similar tickets
    pub async fn classify(
        &self,
        ticket: &Ticket,
        similar_tickets: &[SimilarTicket],
    ) -> ClassificationDecision {
        match self.try_classify(ticket, similar_tickets).await {
            Ok(decision) => decision,
            Err(e) => {
                tracing::error!(
                    ticket_id = %ticket.id,
                    error = %e,
                    "Classification failed, routing to default team for human review"
                );
                ClassificationDecision::fallback(&e.to_string())
            }
        }
    }

    async fn try_classify(
        &self,
        ticket: &Ticket,
        similar_tickets: &[SimilarTicket],
    ) -> Result<ClassificationDecision> {
        let assessment = self.assess_auto_resolution(ticket, similar_tickets);
        let team_match = self.select_team(ticket, assessment.eligible).await;

        // Never more confident than the weakest supporting signal
        let confidence = clamp_unit(assessment.confidence.min(team_match.score));
        let needs_more_info =
            !assessment.eligible && is_unclear(&ticket.category, &ticket.tags);

        let reasoning = if assessment.eligible {
            format!(
                "{} auto-resolved precedents with mean success rate {:.2}; routed to {}",
                similar_tickets.iter().filter(|t| t.auto_resolved).count(),
                assessment.mean_success_rate,
                team_match.team.name
            )
        } else if needs_more_info {
            format!(
                "ticket is too vague to route with confidence; assigned to {} pending more information",
                team_match.team.name
            )
        } else {
            format!(
                "no qualifying automation precedent; routed to {} (match score {:.2})",
                team_match.team.name, team_match.score
            )
        };

        tracing::info!(
            ticket_id = %ticket.id,
            can_auto_resolve = assessment.eligible,
            confidence = confidence,
            routing_team = %team_match.team.name,
            "Classification complete"
        );

        Ok(ClassificationDecision::new(
            assessment.eligible,
            confidence,
            team_match,
            assessment.plan,
            needs_more_info,
            reasoning,
        ))
    }

    /// Stage 1: decide whether automation should be attempted, based on
    /// auto-resolved precedents and the category allow-list.
    pub fn assess_auto_resolution(
        &self,
        ticket: &Ticket,
        similar_tickets: &[SimilarTicket],
    ) -> ResolutionAssessment {
        let precedents: Vec<&SimilarTicket> = similar_tickets
            .iter()
            .filter(|t| t.auto_resolved)
            .collect();

        if precedents.is_empty() {
            // No precedent at all is the strongest evidence against automation
            return ResolutionAssessment {
                eligible: false,
                confidence: 1.0,
                plan: None,
                mean_success_rate: 0.0,
            };
        }

        let mean_success_rate = clamp_unit(
            precedents.iter().map(|t| t.success_rate).sum::<f64>() / precedents.len() as f64,
        );

        let category_allowed = self
            .config
            .auto_resolvable_categories
            .iter()
            .any(|c| c.eq_ignore_ascii_case(ticket.category.trim()));

        if mean_success_rate > self.config.auto_resolve_success_threshold && category_allowed {
            let plan = precedents
                .iter()
                .max_by(|a, b| {
                    a.success_rate
                        .partial_cmp(&b.success_rate)
                        .unwrap_or(Ordering::Equal)
                })
                .map(|best| plan_from_precedent(best))
                .filter(|steps| !steps.is_empty());

            match plan {
                Some(steps) => {
                    return ResolutionAssessment {
                        eligible: true,
                        confidence: mean_success_rate,
                        plan: Some(steps),
                        mean_success_rate,
                    }
                }
                None => {
                    tracing::warn!(
                        ticket_id = %ticket.id,
                        "Qualifying precedent carries no resolution steps, skipping automation"
                    );
                }
            }
        }

        ResolutionAssessment {
            eligible: false,
            confidence: clamp_unit(1.0 - mean_success_rate),
            plan: None,
            mean_success_rate,
        }
    }

    /// Stage 2: pick the routing team.
    ///
    /// Auto-resolvable tickets go to the reserved auto-resolution team when
    /// one exists; everything else is scored, with a floor below which the
    /// default team is substituted.
    pub async fn select_team(&self, ticket: &Ticket, auto_resolvable: bool) -> TeamMatch {
        let teams = self.directory.get_teams(false).await;

        if auto_resolvable {
            if let Some(team) = teams.iter().find(|t| t.is_auto_resolution()) {
                return TeamMatch::new(team.clone(), 1.0);
            }
        }

        let best = teams
            .iter()
            .map(|team| {
                let score = score_team(team, &ticket.category, &ticket.tags);
                (team, score)
            })
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));

        match best {
            Some((team, score)) if score >= self.config.team_match_floor => {
                TeamMatch::new(team.clone(), score)
            }
            _ => {
                tracing::debug!(
                    ticket_id = %ticket.id,
                    "No team cleared the match floor, using default team"
                );
                TeamMatch::new(Team::default_team(), self.config.fallback_team_score)
            }
        }
    }
}

/// Derive the ordered step plan from a precedent: its recorded steps when
/// present, otherwise its solution text split into lines.
fn plan_from_precedent(precedent: &SimilarTicket) -> Vec<String> {
    if !precedent.resolution_steps.is_empty() {
        return precedent.resolution_steps.clone();
    }
    precedent
        .solution
        .as_deref()
        .map(split_step_lines)
        .unwrap_or_default()
}
