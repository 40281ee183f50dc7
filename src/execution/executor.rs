use crate::config::ExecutionConfig;
use crate::execution::tools::ToolRegistry;
use crate::models::{ResolutionResult, ResolutionStep, StepOutcome, StepRecord};
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

/// Executes a resolution plan step by step.
///
/// Steps run strictly in plan order; later steps may depend on the side
/// effects of earlier ones. The first failing step stops the plan.
pub struct ResolutionStepExecutor {
    registry: Arc<ToolRegistry>,
    tool_timeout: Duration,
}

impl ResolutionStepExecutor {
    pub fn new(registry: Arc<ToolRegistry>, config: &ExecutionConfig) -> Self {
        Self {
            registry,
            tool_timeout: config.tool_timeout(),
        }
    }

    /// Execute a full plan.
    ///
    /// On success, `solution` carries the originating classification's
    /// explanation text. On failure, `steps_taken` includes the failed step
    /// and nothing after it.
    pub async fn execute(
        &self,
        plan: &[ResolutionStep],
        solution: Option<&str>,
    ) -> ResolutionResult {
        let mut steps_taken = Vec::with_capacity(plan.len());

        for step in plan {
            let record = self.execute_step(step).await;
            let failure = record.outcome.error().map(|e| e.to_string());
            steps_taken.push(record);

            if let Some(error) = failure {
                tracing::warn!(
                    action = %step.action,
                    error = %error,
                    steps_attempted = steps_taken.len(),
                    "Resolution plan aborted at failing step"
                );
                return ResolutionResult::failed(
                    steps_taken,
                    format!("step '{}' failed: {error}", step.action),
                );
            }
        }

        tracing::info!(steps = steps_taken.len(), "Resolution plan completed");
        ResolutionResult::succeeded(steps_taken, solution.map(|s| s.to_string()))
    }

    /// Execute one step, converting every failure mode into a structured
    /// outcome. Never panics or propagates tool errors.
    pub async fn execute_step(&self, step: &ResolutionStep) -> StepRecord {
        let started_at = Utc::now();

        let outcome = match step.tool_name.as_deref() {
            None => StepOutcome::Success {
                output: json!({"result": "no tool action needed"}),
            },
            Some(name) => match self.registry.get(name) {
                None => StepOutcome::Failure {
                    error: format!("tool {name} not found"),
                },
                Some(tool) => {
                    let args = step.tool_args.clone().unwrap_or_default();
                    match timeout(self.tool_timeout, tool.invoke(&args)).await {
                        Err(_) => StepOutcome::Failure {
                            error: format!(
                                "tool {name} timed out after {}s",
                                self.tool_timeout.as_secs()
                            ),
                        },
                        Ok(Err(e)) => StepOutcome::Failure {
                            error: e.to_string(),
                        },
                        Ok(Ok(output)) => match structured_error(&output) {
                            Some(error) => StepOutcome::Failure { error },
                            None => StepOutcome::Success { output },
                        },
                    }
                }
            },
        };

        StepRecord {
            step: step.clone(),
            outcome,
            started_at,
            completed_at: Utc::now(),
        }
    }
}

/// A tool result map with a non-empty `error` field is a failure even when
/// the tool did not raise.
fn structured_error(output: &Value) -> Option<String> {
    output
        .as_object()
        .and_then(|map| map.get("error"))
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.to_string())
}
