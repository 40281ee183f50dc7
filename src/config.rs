use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Similarity retrieval configuration
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Classification configuration
    #[serde(default)]
    pub classification: ClassificationConfig,

    /// Team directory configuration
    #[serde(default)]
    pub directory: DirectoryConfig,

    /// Resolution step execution configuration
    #[serde(default)]
    pub execution: ExecutionConfig,
}

impl Config {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path =
            std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config/default.toml".to_string());

        config::Config::builder()
            // Start with default values
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            // Override with config file if it exists
            .add_source(config::File::with_name(&config_path).required(false))
            // Override with environment variables (prefix: TRIAGE_)
            .add_source(
                config::Environment::with_prefix("TRIAGE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Maximum number of similar tickets returned per query
    #[serde(default = "default_n_results")]
    pub default_n_results: usize,

    /// Minimum normalized similarity score for a hit to be kept
    #[serde(default = "default_score_threshold")]
    pub score_threshold: f64,

    /// Similarity query timeout (seconds)
    #[serde(default = "default_query_timeout")]
    pub query_timeout_secs: u64,
}

impl RetrievalConfig {
    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            default_n_results: default_n_results(),
            score_threshold: default_score_threshold(),
            query_timeout_secs: default_query_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationConfig {
    /// Mean historical success rate required before automation is attempted
    #[serde(default = "default_success_threshold")]
    pub auto_resolve_success_threshold: f64,

    /// Minimum team match score accepted before falling back to the default team
    #[serde(default = "default_team_match_floor")]
    pub team_match_floor: f64,

    /// Score reported when the default team is substituted for a weak match
    #[serde(default = "default_fallback_team_score")]
    pub fallback_team_score: f64,

    /// Categories eligible for automated resolution
    #[serde(default = "default_auto_resolvable_categories")]
    pub auto_resolvable_categories: Vec<String>,
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            auto_resolve_success_threshold: default_success_threshold(),
            team_match_floor: default_team_match_floor(),
            fallback_team_score: default_fallback_team_score(),
            auto_resolvable_categories: default_auto_resolvable_categories(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Team cache time-to-live (seconds)
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,

    /// Team backend fetch timeout (seconds)
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,
}

impl DirectoryConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: default_cache_ttl(),
            fetch_timeout_secs: default_fetch_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Per-tool invocation timeout (seconds)
    #[serde(default = "default_tool_timeout")]
    pub tool_timeout_secs: u64,
}

impl ExecutionConfig {
    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_secs)
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            tool_timeout_secs: default_tool_timeout(),
        }
    }
}

// Default value functions
fn default_n_results() -> usize {
    5
}

fn default_score_threshold() -> f64 {
    0.7
}

fn default_query_timeout() -> u64 {
    30
}

fn default_success_threshold() -> f64 {
    0.8
}

fn default_team_match_floor() -> f64 {
    0.3
}

fn default_fallback_team_score() -> f64 {
    0.5
}

fn default_auto_resolvable_categories() -> Vec<String> {
    vec![
        "password_reset".to_string(),
        "account_unlock".to_string(),
        "credential_reset".to_string(),
    ]
}

fn default_cache_ttl() -> u64 {
    300 // 5 minutes
}

fn default_fetch_timeout() -> u64 {
    10
}

fn default_tool_timeout() -> u64 {
    30
}
