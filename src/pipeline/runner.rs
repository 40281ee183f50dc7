use crate::classification::AutoResolutionClassifier;
use crate::config::Config;
use crate::error::AppError;
use crate::execution::ResolutionStepExecutor;
use crate::models::{
    ClassificationDecision, ResolutionResult, ResolutionStep, Ticket, TicketStatus,
};
use crate::pipeline::state::{PipelineOutcome, PipelineState, PipelineStatus, Stage};
use crate::retrieval::SimilarityRetriever;
use std::sync::Arc;
use validator::Validate;

/// Orchestrates one ticket through retrieve → classify → execute → finalize.
///
/// The runner is an interpreter over the closed [`Stage`] set: each stage
/// handler mutates the run's state and returns the next stage. Every error
/// routes to the finalize transition with a fabricated safe result, so a run
/// always terminates with a valid outcome.
pub struct TicketPipeline {
    retriever: Arc<SimilarityRetriever>,
    classifier: Arc<AutoResolutionClassifier>,
    executor: Arc<ResolutionStepExecutor>,
    config: Config,
}

impl TicketPipeline {
    pub fn new(
        retriever: Arc<SimilarityRetriever>,
        classifier: Arc<AutoResolutionClassifier>,
        executor: Arc<ResolutionStepExecutor>,
        config: Config,
    ) -> Self {
        Self {
            retriever,
            classifier,
            executor,
            config,
        }
    }

    /// Process a ticket to a terminal outcome. Infallible by design: faults
    /// surface in the outcome's decision/result fields, never as errors.
    pub async fn run(&self, ticket: Ticket) -> PipelineOutcome {
        tracing::info!(
            ticket_id = %ticket.id,
            category = %ticket.category,
            priority = %ticket.priority,
            "Pipeline started"
        );

        let mut state = PipelineState::new(ticket);

        let mut stage = match state.ticket.validate() {
            Ok(()) => Stage::Retrieve,
            Err(e) => self.fail(&mut state, AppError::from(e)),
        };

        while stage != Stage::Done {
            stage = match stage {
                Stage::Retrieve => self.retrieve(&mut state).await,
                Stage::Classify => self.classify(&mut state).await,
                Stage::PlanAndExecute => self.plan_and_execute(&mut state).await,
                Stage::Finalize => self.finalize(&mut state).await,
                Stage::Done => Stage::Done,
            };
        }

        self.outcome(state)
    }

    async fn retrieve(&self, state: &mut PipelineState) -> Stage {
        let retrieval = &self.config.retrieval;
        let query = state.ticket.embedding_text();

        match self
            .retriever
            .find_similar(
                &query,
                retrieval.default_n_results,
                retrieval.score_threshold,
                true,
            )
            .await
        {
            Ok(similar_tickets) => {
                tracing::debug!(
                    ticket_id = %state.ticket.id,
                    similar_count = similar_tickets.len(),
                    "Retrieved similar tickets"
                );
                state.similar_tickets = similar_tickets;
                Stage::Classify
            }
            Err(e) => self.fail(state, e),
        }
    }

    async fn classify(&self, state: &mut PipelineState) -> Stage {
        let decision = self
            .classifier
            .classify(&state.ticket, &state.similar_tickets)
            .await;

        let next_status = if decision.can_auto_resolve {
            TicketStatus::AutoResolving
        } else if decision.needs_more_info {
            TicketStatus::Pending
        } else {
            TicketStatus::Assigned
        };
        state.ticket.update_status(next_status);

        if let Some(lines) = decision.auto_resolution_steps.as_deref() {
            state.plan = lines
                .iter()
                .map(|line| {
                    ResolutionStep::manual(line.clone(), "recorded resolution from similar ticket")
                })
                .collect();
        }

        let auto = decision.can_auto_resolve;
        state.classification = Some(decision);
        state.status = PipelineStatus::Processed;

        if auto {
            Stage::PlanAndExecute
        } else {
            Stage::Finalize
        }
    }

    async fn plan_and_execute(&self, state: &mut PipelineState) -> Stage {
        while state.current_step < state.plan.len() {
            let step = state.plan[state.current_step].clone();
            let record = self.executor.execute_step(&step).await;
            let failed = record.outcome.is_failure();

            state.step_records.push(record);
            state.current_step += 1;

            if failed {
                break;
            }
        }

        Stage::Finalize
    }

    async fn finalize(&self, state: &mut PipelineState) -> Stage {
        let resolution = if let Some(error) = state.error.clone() {
            // Error transition: fabricate a safe fallback so the run still
            // terminates with a valid decision record.
            if state.classification.is_none() {
                state.classification = Some(ClassificationDecision::fallback(&error));
            }
            state.ticket.update_status(TicketStatus::Pending);
            ResolutionResult::failed(std::mem::take(&mut state.step_records), error)
        } else {
            if state.classification.is_none() {
                state.classification = Some(ClassificationDecision::fallback(
                    "pipeline produced no classification",
                ));
                state.ticket.update_status(TicketStatus::Pending);
            }

            match state.classification.as_ref() {
                Some(decision) if decision.can_auto_resolve => {
                    if state.all_steps_succeeded() {
                        let solution = decision
                            .auto_resolution_steps
                            .as_ref()
                            .map(|steps| steps.join("\n"));
                        state.ticket.update_status(TicketStatus::Resolved);
                        ResolutionResult::succeeded(
                            std::mem::take(&mut state.step_records),
                            solution,
                        )
                    } else {
                        // Automation was attempted and failed: hand the ticket
                        // to the routing team.
                        state.ticket.update_status(TicketStatus::Assigned);
                        ResolutionResult::failed(
                            std::mem::take(&mut state.step_records),
                            "one or more resolution steps failed".to_string(),
                        )
                    }
                }
                _ => ResolutionResult::not_attempted(),
            }
        };

        // Keep the processed ticket searchable for future triage runs.
        if let Err(e) = self.retriever.add(&state.ticket).await {
            tracing::warn!(
                ticket_id = %state.ticket.id,
                error = %e,
                "Failed to store processed ticket in similarity index"
            );
        }

        state.resolution = Some(resolution);
        state.status = PipelineStatus::Completed;

        tracing::info!(
            ticket_id = %state.ticket.id,
            ticket_status = %state.ticket.status,
            "Pipeline completed"
        );

        Stage::Done
    }

    fn fail(&self, state: &mut PipelineState, error: AppError) -> Stage {
        tracing::error!(
            ticket_id = %state.ticket.id,
            error = %error,
            "Pipeline stage failed, routing to error handling"
        );
        state.error = Some(error.to_string());
        state.status = PipelineStatus::Error;
        Stage::Finalize
    }

    fn outcome(&self, state: PipelineState) -> PipelineOutcome {
        let decision = state
            .classification
            .unwrap_or_else(|| ClassificationDecision::fallback("pipeline produced no classification"));
        let resolution = state
            .resolution
            .unwrap_or_else(ResolutionResult::not_attempted);

        PipelineOutcome {
            ticket_id: state.ticket.id,
            decision,
            resolution,
            ticket_status: state.ticket.status,
            status: state.status,
        }
    }
}
