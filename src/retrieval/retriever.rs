use crate::config::RetrievalConfig;
use crate::error::{AppError, Result};
use crate::models::{clamp_unit, SimilarTicket, Ticket};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Map, Value};
use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

/// Collection holding tickets that are still open
pub const OPEN_COLLECTION: &str = "open_tickets";

/// Collection holding tickets with a recorded solution
pub const RESOLVED_COLLECTION: &str = "resolved_tickets";

/// A raw hit from a similarity collection.
///
/// `raw_score` is the backend's relevance score in [-1, 1]; normalization to
/// the [0, 1] similarity space happens in the retriever.
#[derive(Debug, Clone)]
pub struct RawHit {
    pub id: String,
    pub content: String,
    pub metadata: Map<String, Value>,
    pub raw_score: f64,
}

/// A document stored in a similarity collection
#[derive(Debug, Clone)]
pub struct SimilarityDocument {
    pub id: String,
    pub content: String,
    pub metadata: Map<String, Value>,
}

/// Trait for one backing similarity collection
#[async_trait]
pub trait SimilarityIndex: Send + Sync {
    /// Collection name, for logging
    fn collection(&self) -> &str;

    /// Query the k nearest documents for a text
    async fn query(&self, text: &str, k: usize) -> Result<Vec<RawHit>>;

    /// Insert or replace a document
    async fn upsert(&self, document: SimilarityDocument) -> Result<()>;

    /// Fetch a document by id
    async fn fetch(&self, id: &str) -> Result<Option<SimilarityDocument>>;

    /// Delete a document by id
    async fn delete(&self, id: &str) -> Result<()>;
}

/// Map a raw relevance score in [-1, 1] to the [0, 1] similarity space
pub fn normalize_relevance(raw_score: f64) -> f64 {
    clamp_unit((raw_score + 1.0) / 2.0)
}

/// Retrieves semantically similar historical tickets across the open and
/// resolved collections.
pub struct SimilarityRetriever {
    open: Arc<dyn SimilarityIndex>,
    resolved: Arc<dyn SimilarityIndex>,
    query_timeout: Duration,
}

impl SimilarityRetriever {
    pub fn new(
        open: Arc<dyn SimilarityIndex>,
        resolved: Arc<dyn SimilarityIndex>,
        config: &RetrievalConfig,
    ) -> Self {
        Self {
            open,
            resolved,
            query_timeout: config.query_timeout(),
        }
    }

    /// Find tickets similar to a query text.
    ///
    /// Results are threshold-filtered, merged across collections, sorted by
    /// score descending, and truncated to `n_results`.
    pub async fn find_similar(
        &self,
        query_text: &str,
        n_results: usize,
        score_threshold: f64,
        include_resolved: bool,
    ) -> Result<Vec<SimilarTicket>> {
        let mut tickets = self
            .query_collection(&self.open, query_text, n_results, score_threshold)
            .await?;

        if include_resolved {
            // A degraded resolved collection reduces recall but must not fail
            // the query that the open collection already answered.
            match self
                .query_collection(&self.resolved, query_text, n_results, score_threshold)
                .await
            {
                Ok(resolved_hits) => tickets.extend(resolved_hits),
                Err(e) => {
                    tracing::warn!(
                        collection = self.resolved.collection(),
                        error = %e,
                        "Resolved collection query failed, continuing with open results"
                    );
                }
            }
        }

        tickets.sort_by(|a, b| {
            b.similarity_score
                .partial_cmp(&a.similarity_score)
                .unwrap_or(Ordering::Equal)
        });
        tickets.truncate(n_results);

        tracing::debug!(
            results = tickets.len(),
            n_results = n_results,
            score_threshold = score_threshold,
            include_resolved = include_resolved,
            "Similarity query complete"
        );

        Ok(tickets)
    }

    /// Store a ticket in the open collection
    pub async fn add(&self, ticket: &Ticket) -> Result<()> {
        let mut metadata = Map::new();
        metadata.insert("ticket_id".to_string(), json!(ticket.id.to_string()));
        metadata.insert(
            "creator_id".to_string(),
            json!(ticket.creator_id.map(|id| id.to_string())),
        );
        metadata.insert("category".to_string(), json!(ticket.category));
        metadata.insert("priority".to_string(), json!(ticket.priority.to_string()));
        metadata.insert("status".to_string(), json!(ticket.status.to_string()));
        metadata.insert("auto_resolved".to_string(), json!(false));
        metadata.insert("fingerprint".to_string(), json!(ticket.fingerprint()));
        metadata.insert("stored_at".to_string(), json!(Utc::now().to_rfc3339()));

        self.open
            .upsert(SimilarityDocument {
                id: ticket.id.to_string(),
                content: ticket.embedding_text(),
                metadata,
            })
            .await?;

        tracing::debug!(ticket_id = %ticket.id, "Stored ticket in open collection");
        Ok(())
    }

    /// Record a solution for a ticket, moving it from the open collection to
    /// the resolved one.
    ///
    /// The resolved write happens before the open delete so the ticket is
    /// never absent from both collections.
    pub async fn update_solution(
        &self,
        ticket_id: &str,
        solution: &str,
        success_rate: f64,
        auto_resolved: bool,
        resolution_time_hours: f64,
    ) -> Result<()> {
        let (mut document, was_open) = match self.open.fetch(ticket_id).await? {
            Some(doc) => (doc, true),
            None => match self.resolved.fetch(ticket_id).await? {
                Some(doc) => (doc, false),
                None => {
                    return Err(AppError::NotFound(format!(
                        "ticket {ticket_id} not present in any similarity collection"
                    )))
                }
            },
        };

        document
            .metadata
            .insert("solution".to_string(), json!(solution));
        document
            .metadata
            .insert("success_rate".to_string(), json!(clamp_unit(success_rate)));
        document
            .metadata
            .insert("auto_resolved".to_string(), json!(auto_resolved));
        document.metadata.insert(
            "resolution_time_hours".to_string(),
            json!(resolution_time_hours),
        );
        document
            .metadata
            .insert("resolved_at".to_string(), json!(Utc::now().to_rfc3339()));

        self.resolved.upsert(document).await?;

        if was_open {
            self.open.delete(ticket_id).await?;
        }

        tracing::info!(
            ticket_id = ticket_id,
            auto_resolved = auto_resolved,
            "Recorded solution and moved ticket to resolved collection"
        );
        Ok(())
    }

    async fn query_collection(
        &self,
        index: &Arc<dyn SimilarityIndex>,
        query_text: &str,
        n_results: usize,
        score_threshold: f64,
    ) -> Result<Vec<SimilarTicket>> {
        let hits = timeout(self.query_timeout, index.query(query_text, n_results))
            .await
            .map_err(|_| {
                AppError::Timeout(format!(
                    "similarity query against {} exceeded {}s",
                    index.collection(),
                    self.query_timeout.as_secs()
                ))
            })??;

        Ok(hits
            .into_iter()
            .filter_map(similar_from_hit)
            .filter(|t| t.similarity_score >= score_threshold)
            .collect())
    }
}

/// Build a `SimilarTicket` from a raw hit, degrading field by field when the
/// stored metadata is partial. A hit without an id is unusable and dropped.
fn similar_from_hit(hit: RawHit) -> Option<SimilarTicket> {
    if hit.id.is_empty() {
        tracing::warn!("Dropping similarity hit without a document id");
        return None;
    }

    let metadata = hit.metadata;

    let solution = metadata
        .get("solution")
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.to_string());

    let resolution_steps = match metadata.get("resolution_steps") {
        Some(Value::Array(lines)) => lines
            .iter()
            .filter_map(|v| v.as_str())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        Some(Value::String(block)) => split_step_lines(block),
        _ => Vec::new(),
    };

    Some(SimilarTicket {
        ticket_id: hit.id,
        content: hit.content,
        similarity_score: normalize_relevance(hit.raw_score),
        solution,
        resolution_steps,
        auto_resolved: metadata
            .get("auto_resolved")
            .and_then(|v| v.as_bool())
            .unwrap_or(false),
        resolution_time_hours: metadata
            .get("resolution_time_hours")
            .and_then(|v| v.as_f64()),
        success_rate: clamp_unit(
            metadata
                .get("success_rate")
                .and_then(|v| v.as_f64())
                .unwrap_or(0.0),
        ),
        metadata,
    })
}

/// Split recorded resolution text into ordered, non-empty trimmed lines
pub fn split_step_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .map(|line| line.to_string())
        .collect()
}
