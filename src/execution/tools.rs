use crate::error::{AppError, Result};
use crate::models::ResolutionStep;
use crate::retrieval::SimilarityRetriever;
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::{json, Map, Value};
use std::sync::Arc;

/// An external capability a resolution step can be bound to.
///
/// Implementations signal structured failure either by returning `Err` or by
/// returning a JSON object with a non-empty `error` field.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Registry name steps bind to
    fn name(&self) -> &str;

    /// Short description for operator-facing listings
    fn description(&self) -> &str;

    /// Invoke the tool
    async fn invoke(&self, args: &Map<String, Value>) -> Result<Value>;
}

/// Registry of tools available to the step executor
pub struct ToolRegistry {
    tools: DashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: DashMap::new(),
        }
    }

    /// Register a tool under its own name
    pub fn register(&self, tool: Arc<dyn Tool>) {
        tracing::info!(tool = tool.name(), "Registered tool");
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Name/description pairs, sorted by name
    pub fn describe_all(&self) -> Vec<(String, String)> {
        let mut descriptions: Vec<_> = self
            .tools
            .iter()
            .map(|entry| {
                (
                    entry.key().clone(),
                    entry.value().description().to_string(),
                )
            })
            .collect();
        descriptions.sort();
        descriptions
    }

    /// Reject a plan referencing tools that are not registered.
    ///
    /// Lets callers surface unknown bindings at plan-construction time
    /// instead of mid-execution.
    pub fn validate_plan(&self, plan: &[ResolutionStep]) -> Result<()> {
        for step in plan {
            if let Some(ref name) = step.tool_name {
                if !self.contains(name) {
                    return Err(AppError::Validation(format!(
                        "plan references unknown tool: {name}"
                    )));
                }
            }
        }
        Ok(())
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Built-in tool that searches the resolved collection for relevant prior
/// solutions.
pub struct KnowledgeBaseSearchTool {
    retriever: Arc<SimilarityRetriever>,
}

impl KnowledgeBaseSearchTool {
    pub const NAME: &'static str = "search_knowledge_base";

    pub fn new(retriever: Arc<SimilarityRetriever>) -> Self {
        Self { retriever }
    }
}

#[async_trait]
impl Tool for KnowledgeBaseSearchTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "Search resolved tickets for relevant articles or solutions"
    }

    async fn invoke(&self, args: &Map<String, Value>) -> Result<Value> {
        let query = args
            .get("query")
            .and_then(|v| v.as_str())
            .ok_or_else(|| AppError::Validation("'query' argument required".to_string()))?;

        let articles = self.retriever.find_similar(query, 3, 0.7, true).await?;

        if articles.is_empty() {
            return Ok(json!({"results": [], "message": "No relevant articles found"}));
        }

        let results: Vec<Value> = articles
            .iter()
            .map(|ticket| {
                json!({
                    "ticket_id": ticket.ticket_id,
                    "solution": ticket.solution,
                    "auto_resolved": ticket.auto_resolved,
                    "success_rate": ticket.success_rate,
                    "similarity_score": ticket.similarity_score,
                })
            })
            .collect();

        Ok(json!({ "results": results }))
    }
}
