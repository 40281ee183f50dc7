use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strum::{Display, EnumString};
use uuid::Uuid;
use validator::Validate;

/// A support ticket as produced by the ingestion collaborator.
///
/// The triage engine treats tickets as immutable except for the status and
/// assignment updates applied by the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Ticket {
    /// Unique identifier
    pub id: Uuid,

    /// Human-readable title
    #[validate(length(min = 1, max = 500))]
    pub title: String,

    /// Detailed description
    #[validate(length(min = 1))]
    pub description: String,

    /// Urgency level
    pub priority: Priority,

    /// Current lifecycle status
    pub status: TicketStatus,

    /// Creator reference
    pub creator_id: Option<Uuid>,

    /// Issue category derived by the ingestion heuristics
    #[serde(default)]
    pub category: String,

    /// Ordered, de-duplicated tag set
    #[serde(default)]
    pub tags: Vec<String>,

    /// Free-form extensible attributes
    #[serde(default)]
    pub attributes: HashMap<String, serde_json::Value>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Ticket {
    /// Create a new ticket
    pub fn new(
        title: String,
        description: String,
        priority: Priority,
        category: String,
        tags: Vec<String>,
    ) -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::new_v4(),
            title,
            description,
            priority,
            status: TicketStatus::New,
            creator_id: None,
            category,
            tags: dedup_tags(tags),
            attributes: HashMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Update ticket status
    pub fn update_status(&mut self, new_status: TicketStatus) {
        if self.status == new_status {
            return;
        }
        let old_status = self.status;
        self.status = new_status;
        self.updated_at = Utc::now();

        tracing::debug!(
            ticket_id = %self.id,
            old_status = %old_status,
            new_status = %new_status,
            "Ticket status changed"
        );
    }

    /// Check if the ticket has reached a terminal status
    pub fn is_terminal(&self) -> bool {
        matches!(self.status, TicketStatus::Resolved | TicketStatus::Closed)
    }

    /// Text representation used for embedding and similarity queries.
    /// Matches the shape the ingestion collaborator stores alongside vectors.
    pub fn embedding_text(&self) -> String {
        let category = if self.category.is_empty() {
            "category: unspecified".to_string()
        } else {
            format!("category: {}", self.category)
        };
        let tags = if self.tags.is_empty() {
            "tags: none".to_string()
        } else {
            format!("tags: {}", self.tags.join(", "))
        };

        format!(
            "title: {}\ndescription: {}\npriority: {}\n{}\n{}",
            self.title, self.description, self.priority, category, tags
        )
    }

    /// Stable content fingerprint, used as the similarity-document identifier
    pub fn fingerprint(&self) -> String {
        use sha2::{Digest, Sha256};

        let mut hasher = Sha256::new();
        hasher.update(self.title.as_bytes());
        hasher.update(self.description.as_bytes());
        hasher.update(self.created_at.to_rfc3339().as_bytes());

        format!("{:x}", hasher.finalize())
    }
}

fn dedup_tags(tags: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    tags.into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty() && seen.insert(t.to_lowercase()))
        .collect()
}

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Priority {
    /// Get numeric rank (higher is more urgent)
    pub fn rank(&self) -> u8 {
        match self {
            Priority::Low => 0,
            Priority::Medium => 1,
            Priority::High => 2,
            Priority::Urgent => 3,
        }
    }

    /// Check if priority requires immediate attention
    pub fn is_urgent(&self) -> bool {
        matches!(self, Priority::High | Priority::Urgent)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, EnumString, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum TicketStatus {
    New,
    AutoResolving,
    Pending,
    Assigned,
    Resolved,
    Closed,
}
