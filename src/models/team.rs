use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

/// Focus area marking a generalist team
pub const GENERAL_FOCUS_AREA: &str = "general";

/// Reserved focus area for the team that owns automated resolutions
pub const AUTO_RESOLUTION_FOCUS_AREA: &str = "auto_resolution";

/// An organizational team that tickets can be routed to
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Team {
    /// Unique identifier
    pub id: Uuid,

    /// Team name
    pub name: String,

    /// Free-text description
    pub description: String,

    /// Category label the team specializes in
    pub focus_area: String,

    /// Skill set
    pub skills: Vec<String>,

    /// Seniority of the team
    pub technical_level: TechnicalLevel,

    /// Optional routing tags
    pub tags: Vec<String>,
}

impl Team {
    /// The synthetic fallback team. Always available, even when the backing
    /// store is empty or unreachable.
    pub fn default_team() -> Self {
        Self {
            id: Uuid::nil(),
            name: "General Support".to_string(),
            description: "Default team for tickets without a specialist match".to_string(),
            focus_area: GENERAL_FOCUS_AREA.to_string(),
            skills: vec![
                "customer service".to_string(),
                "basic troubleshooting".to_string(),
            ],
            technical_level: TechnicalLevel::Junior,
            tags: vec!["support".to_string(), "general".to_string()],
        }
    }

    pub fn is_general(&self) -> bool {
        self.focus_area.eq_ignore_ascii_case(GENERAL_FOCUS_AREA)
    }

    pub fn is_auto_resolution(&self) -> bool {
        self.focus_area
            .eq_ignore_ascii_case(AUTO_RESOLUTION_FOCUS_AREA)
    }

    /// Parse a team from a raw backend row.
    ///
    /// Metadata fields that are missing or malformed are treated as unset
    /// rather than failing the row; a row without a usable name is skipped.
    pub fn from_row(row: TeamRow) -> Option<Self> {
        if row.name.trim().is_empty() {
            tracing::warn!(team_id = %row.id, "Skipping team row without a name");
            return None;
        }

        let metadata = row.metadata.unwrap_or(serde_json::Value::Null);

        Some(Self {
            id: Uuid::parse_str(&row.id).unwrap_or_else(|_| Uuid::new_v4()),
            name: row.name,
            description: row.description.unwrap_or_default(),
            focus_area: parse_focus_area(&metadata),
            skills: parse_string_list(metadata.get("Skills").or_else(|| metadata.get("skills"))),
            technical_level: metadata
                .get("technical_level")
                .and_then(|v| v.as_str())
                .and_then(|s| s.parse().ok())
                .unwrap_or(TechnicalLevel::Junior),
            tags: parse_string_list(metadata.get("tags")),
        })
    }
}

/// The `focus_area` metadata entry is stored either as a bare string or as an
/// object carrying `value`/`label`.
fn parse_focus_area(metadata: &serde_json::Value) -> String {
    match metadata.get("focus_area") {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(serde_json::Value::Object(obj)) => obj
            .get("value")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string(),
        _ => String::new(),
    }
}

fn parse_string_list(value: Option<&serde_json::Value>) -> Vec<String> {
    value
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str())
                .map(|s| s.to_string())
                .collect()
        })
        .unwrap_or_default()
}

/// Raw team record as returned by the team backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamRow {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum TechnicalLevel {
    Junior,
    Mid,
    Senior,
}
