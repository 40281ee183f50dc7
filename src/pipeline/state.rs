use crate::models::{
    ClassificationDecision, ResolutionResult, ResolutionStep, SimilarTicket, StepRecord, Ticket,
    TicketStatus,
};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

/// Stages of a pipeline run. Closed set; the runner is a small interpreter
/// over these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Stage {
    Retrieve,
    Classify,
    PlanAndExecute,
    Finalize,
    Done,
}

/// Lifecycle tag of a pipeline run
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, EnumString, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PipelineStatus {
    Started,
    Processed,
    Error,
    Completed,
}

/// Mutable working record threaded through one pipeline run.
///
/// Owned exclusively by that run; never shared across tickets.
#[derive(Debug)]
pub struct PipelineState {
    pub ticket: Ticket,
    pub similar_tickets: Vec<SimilarTicket>,
    pub classification: Option<ClassificationDecision>,
    pub plan: Vec<ResolutionStep>,
    pub current_step: usize,
    pub step_records: Vec<StepRecord>,
    pub resolution: Option<ResolutionResult>,
    pub error: Option<String>,
    pub status: PipelineStatus,
}

impl PipelineState {
    pub fn new(ticket: Ticket) -> Self {
        Self {
            ticket,
            similar_tickets: Vec::new(),
            classification: None,
            plan: Vec::new(),
            current_step: 0,
            step_records: Vec::new(),
            resolution: None,
            error: None,
            status: PipelineStatus::Started,
        }
    }

    /// Whether every attempted step so far has succeeded
    pub fn all_steps_succeeded(&self) -> bool {
        self.step_records.iter().all(|r| !r.outcome.is_failure())
    }
}

/// Terminal artifact of a pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineOutcome {
    pub ticket_id: Uuid,
    pub decision: ClassificationDecision,
    pub resolution: ResolutionResult,
    pub ticket_status: TicketStatus,
    pub status: PipelineStatus,
}
