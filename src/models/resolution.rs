use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single step in a resolution plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionStep {
    /// The action to take
    pub action: String,

    /// Why this action is needed
    pub reason: String,

    /// Name of the tool to use, if any
    pub tool_name: Option<String>,

    /// Arguments for the tool
    pub tool_args: Option<Map<String, Value>>,
}

impl ResolutionStep {
    /// A step carrying no tool binding; executes as a no-op success
    pub fn manual(action: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            reason: reason.into(),
            tool_name: None,
            tool_args: None,
        }
    }

    /// A step bound to a named tool
    pub fn with_tool(
        action: impl Into<String>,
        reason: impl Into<String>,
        tool_name: impl Into<String>,
        tool_args: Option<Map<String, Value>>,
    ) -> Self {
        Self {
            action: action.into(),
            reason: reason.into(),
            tool_name: Some(tool_name.into()),
            tool_args,
        }
    }
}

/// Outcome of one attempted step
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
    Success { output: Value },
    Failure { error: String },
}

impl StepOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, StepOutcome::Failure { .. })
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            StepOutcome::Failure { error } => Some(error),
            StepOutcome::Success { .. } => None,
        }
    }
}

/// A step the executor actually attempted, with its outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    pub step: ResolutionStep,
    pub outcome: StepOutcome,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

/// Result of an auto-resolution attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionResult {
    /// Whether every attempted step succeeded
    pub success: bool,

    /// Steps attempted, in order, through the first failure (inclusive)
    pub steps_taken: Vec<StepRecord>,

    /// The final solution if successful
    pub solution: Option<String>,

    /// Reason for failure if unsuccessful
    pub failure_reason: Option<String>,
}

impl ResolutionResult {
    pub fn succeeded(steps_taken: Vec<StepRecord>, solution: Option<String>) -> Self {
        Self {
            success: true,
            steps_taken,
            solution,
            failure_reason: None,
        }
    }

    pub fn failed(steps_taken: Vec<StepRecord>, failure_reason: String) -> Self {
        Self {
            success: false,
            steps_taken,
            solution: None,
            failure_reason: Some(failure_reason),
        }
    }

    /// Automation was never attempted; the ticket was routed to a team
    pub fn not_attempted() -> Self {
        Self {
            success: false,
            steps_taken: Vec::new(),
            solution: None,
            failure_reason: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_step_constructors() {
        let manual = ResolutionStep::manual("verify identity", "precedes any account change");
        assert!(manual.tool_name.is_none());

        let mut args = Map::new();
        args.insert("user_id".to_string(), json!("u-1"));
        let bound = ResolutionStep::with_tool(
            "send reset link",
            "completes the password reset",
            "reset_user_password",
            Some(args),
        );
        assert_eq!(bound.tool_name.as_deref(), Some("reset_user_password"));
    }

    #[test]
    fn test_outcome_accessors() {
        let ok = StepOutcome::Success {
            output: json!({"result": "done"}),
        };
        assert!(!ok.is_failure());
        assert!(ok.error().is_none());

        let failed = StepOutcome::Failure {
            error: "tool reset_user_password not found".to_string(),
        };
        assert!(failed.is_failure());
        assert_eq!(failed.error(), Some("tool reset_user_password not found"));
    }

    #[test]
    fn test_not_attempted_result_shape() {
        let result = ResolutionResult::not_attempted();
        assert!(!result.success);
        assert!(result.steps_taken.is_empty());
        assert!(result.failure_reason.is_none());
    }
}
