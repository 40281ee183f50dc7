//! Common test utilities for triage integration tests.
//!
//! Provides in-memory similarity indexes, scripted team backends, and
//! recording tools so pipelines can run end-to-end without real stores.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use ticket_triage::directory::TeamBackend;
use ticket_triage::error::{AppError, Result};
use ticket_triage::execution::Tool;
use ticket_triage::models::{Priority, TeamRow, Ticket};
use ticket_triage::retrieval::{RawHit, SimilarityDocument, SimilarityIndex};

/// In-memory similarity collection with scripted query hits
pub struct InMemoryIndex {
    name: &'static str,
    hits: Mutex<Vec<RawHit>>,
    documents: Mutex<HashMap<String, SimilarityDocument>>,
    fail_queries: bool,
}

impl InMemoryIndex {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            hits: Mutex::new(Vec::new()),
            documents: Mutex::new(HashMap::new()),
            fail_queries: false,
        }
    }

    pub fn failing(name: &'static str) -> Self {
        Self {
            name,
            hits: Mutex::new(Vec::new()),
            documents: Mutex::new(HashMap::new()),
            fail_queries: true,
        }
    }

    /// Script a hit to be returned by every query
    pub fn push_hit(&self, hit: RawHit) {
        self.hits.lock().push(hit);
    }

    pub fn document_count(&self) -> usize {
        self.documents.lock().len()
    }

    pub fn document(&self, id: &str) -> Option<SimilarityDocument> {
        self.documents.lock().get(id).cloned()
    }
}

#[async_trait]
impl SimilarityIndex for InMemoryIndex {
    fn collection(&self) -> &str {
        self.name
    }

    async fn query(&self, _text: &str, _k: usize) -> Result<Vec<RawHit>> {
        if self.fail_queries {
            return Err(AppError::Network(format!("{} unreachable", self.name)));
        }
        Ok(self.hits.lock().clone())
    }

    async fn upsert(&self, document: SimilarityDocument) -> Result<()> {
        self.documents.lock().insert(document.id.clone(), document);
        Ok(())
    }

    async fn fetch(&self, id: &str) -> Result<Option<SimilarityDocument>> {
        Ok(self.documents.lock().get(id).cloned())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.documents.lock().remove(id);
        Ok(())
    }
}

/// Team backend that always returns the same rows
pub struct StaticTeamBackend {
    rows: Vec<TeamRow>,
}

impl StaticTeamBackend {
    pub fn new(rows: Vec<TeamRow>) -> Self {
        Self { rows }
    }
}

#[async_trait]
impl TeamBackend for StaticTeamBackend {
    async fn list_teams(&self) -> Result<Vec<TeamRow>> {
        Ok(self.rows.clone())
    }
}

/// Team backend that fails every call
pub struct FailingTeamBackend;

#[async_trait]
impl TeamBackend for FailingTeamBackend {
    async fn list_teams(&self) -> Result<Vec<TeamRow>> {
        Err(AppError::Network("team store unreachable".to_string()))
    }
}

/// Tool that records its invocations and returns a scripted response
pub struct RecordingTool {
    name: &'static str,
    response: Value,
    pub invocations: Mutex<Vec<Map<String, Value>>>,
}

impl RecordingTool {
    pub fn succeeding(name: &'static str) -> Self {
        Self {
            name,
            response: json!({"result": "done"}),
            invocations: Mutex::new(Vec::new()),
        }
    }

    pub fn with_error(name: &'static str, error: &str) -> Self {
        Self {
            name,
            response: json!({ "error": error }),
            invocations: Mutex::new(Vec::new()),
        }
    }

    pub fn invocation_count(&self) -> usize {
        self.invocations.lock().len()
    }
}

#[async_trait]
impl Tool for RecordingTool {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        "recording test tool"
    }

    async fn invoke(&self, args: &Map<String, Value>) -> Result<Value> {
        self.invocations.lock().push(args.clone());
        Ok(self.response.clone())
    }
}

/// Build a standard team row with the metadata shape the backend stores
pub fn team_row(name: &str, focus_area: &str, tags: &[&str]) -> TeamRow {
    TeamRow {
        id: uuid::Uuid::new_v4().to_string(),
        name: name.to_string(),
        description: Some(format!("{name} description")),
        metadata: Some(json!({
            "focus_area": {"value": focus_area, "label": name},
            "Skills": ["troubleshooting"],
            "technical_level": "mid",
            "tags": tags,
        })),
        created_at: Some(chrono::Utc::now()),
        updated_at: Some(chrono::Utc::now()),
    }
}

/// The three-team directory used across scenarios
pub fn standard_team_rows() -> Vec<TeamRow> {
    vec![
        team_row(
            "Engineering Team",
            "technical",
            &["technical", "engineering"],
        ),
        team_row("Customer Support", "general", &["support", "customer"]),
        team_row("Auto Resolution", "auto_resolution", &["auto", "automated"]),
    ]
}

/// Build a ticket with the given category and tags
pub fn make_ticket(title: &str, category: &str, tags: &[&str]) -> Ticket {
    Ticket::new(
        title.to_string(),
        format!("{title} - details"),
        Priority::Medium,
        category.to_string(),
        tags.iter().map(|t| t.to_string()).collect(),
    )
}

/// A raw hit representing an auto-resolved precedent with a recorded solution
pub fn auto_resolved_hit(id: &str, raw_score: f64, success_rate: f64, solution: &str) -> RawHit {
    let mut metadata = Map::new();
    metadata.insert("auto_resolved".to_string(), json!(true));
    metadata.insert("success_rate".to_string(), json!(success_rate));
    metadata.insert("solution".to_string(), json!(solution));
    metadata.insert("resolution_steps".to_string(), json!(solution));
    RawHit {
        id: id.to_string(),
        content: format!("content for {id}"),
        metadata,
        raw_score,
    }
}

/// A raw hit for a ticket that needed human handling
pub fn manual_hit(id: &str, raw_score: f64) -> RawHit {
    let mut metadata = Map::new();
    metadata.insert("auto_resolved".to_string(), json!(false));
    metadata.insert("success_rate".to_string(), json!(0.0));
    RawHit {
        id: id.to_string(),
        content: format!("content for {id}"),
        metadata,
        raw_score,
    }
}
