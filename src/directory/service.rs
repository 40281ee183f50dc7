use crate::config::DirectoryConfig;
use crate::error::{AppError, Result};
use crate::models::{Team, TeamRow};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;

/// Trait for the backing team store.
///
/// `Ok(vec![])` is the "no teams configured" state; `Err` is the fault state.
/// Callers never need to inspect error types to tell the two apart.
#[async_trait]
pub trait TeamBackend: Send + Sync {
    async fn list_teams(&self) -> Result<Vec<TeamRow>>;
}

/// Clock abstraction so tests can control cache expiry without sleeping
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall-clock implementation used outside of tests
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

struct CachedTeams {
    teams: Vec<Team>,
    fetched_at: Instant,
}

/// Caching directory of organizational teams.
///
/// Keeps a TTL-bounded snapshot of the backing store and degrades instead of
/// failing: an empty or unreachable store resolves to the default team, and a
/// backend fault is served from the stale cache when one exists. Concurrent
/// refreshes may duplicate a fetch; the cache cell is replaced atomically so
/// duplicated work is the worst case.
pub struct TeamDirectory {
    backend: Arc<dyn TeamBackend>,
    cache: RwLock<Option<CachedTeams>>,
    cache_ttl: Duration,
    fetch_timeout: Duration,
    clock: Arc<dyn Clock>,
}

impl TeamDirectory {
    pub fn new(backend: Arc<dyn TeamBackend>, config: &DirectoryConfig) -> Self {
        Self::with_clock(backend, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        backend: Arc<dyn TeamBackend>,
        config: &DirectoryConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            backend,
            cache: RwLock::new(None),
            cache_ttl: config.cache_ttl(),
            fetch_timeout: config.fetch_timeout(),
            clock,
        }
    }

    /// Get the current team list.
    ///
    /// Never fails and never returns an empty list: degraded backend states
    /// resolve to `[Team::default_team()]`.
    pub async fn get_teams(&self, force_refresh: bool) -> Vec<Team> {
        if !force_refresh {
            if let Some(teams) = self.fresh_cached() {
                return teams;
            }
        }

        match self.fetch_teams().await {
            Ok(teams) => {
                *self.cache.write() = Some(CachedTeams {
                    teams: teams.clone(),
                    fetched_at: self.clock.now(),
                });
                teams
            }
            Err(e) => {
                if let Some(stale) = self.any_cached() {
                    tracing::warn!(
                        error = %e,
                        cached_teams = stale.len(),
                        "Team backend unavailable, serving stale cache"
                    );
                    stale
                } else {
                    tracing::warn!(
                        error = %e,
                        "Team backend unavailable with no prior cache, using default team"
                    );
                    vec![Team::default_team()]
                }
            }
        }
    }

    /// Drop the cached snapshot; the next read refetches
    pub fn invalidate(&self) {
        *self.cache.write() = None;
    }

    async fn fetch_teams(&self) -> Result<Vec<Team>> {
        let rows = timeout(self.fetch_timeout, self.backend.list_teams())
            .await
            .map_err(|_| {
                AppError::Timeout(format!(
                    "team fetch exceeded {}s",
                    self.fetch_timeout.as_secs()
                ))
            })??;

        let total_rows = rows.len();
        let teams: Vec<Team> = rows.into_iter().filter_map(Team::from_row).collect();

        if teams.len() < total_rows {
            tracing::warn!(
                skipped = total_rows - teams.len(),
                "Skipped unusable team rows"
            );
        }

        if teams.is_empty() {
            tracing::info!("Team backend returned no usable teams, using default team");
            return Ok(vec![Team::default_team()]);
        }

        tracing::debug!(team_count = teams.len(), "Refreshed team cache");
        Ok(teams)
    }

    fn fresh_cached(&self) -> Option<Vec<Team>> {
        let guard = self.cache.read();
        let cached = guard.as_ref()?;
        if self.clock.now().duration_since(cached.fetched_at) < self.cache_ttl {
            Some(cached.teams.clone())
        } else {
            None
        }
    }

    /// Cached snapshot regardless of age; the stale-fallback read path
    fn any_cached(&self) -> Option<Vec<Team>> {
        self.cache.read().as_ref().map(|c| c.teams.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ManualClock {
        base: Instant,
        offset: Mutex<Duration>,
    }

    impl ManualClock {
        fn new() -> Self {
            Self {
                base: Instant::now(),
                offset: Mutex::new(Duration::ZERO),
            }
        }

        fn advance(&self, by: Duration) {
            *self.offset.lock() += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> Instant {
            self.base + *self.offset.lock()
        }
    }

    struct ScriptedBackend {
        rows: Mutex<Vec<Result<Vec<TeamRow>>>>,
        calls: AtomicUsize,
    }

    impl ScriptedBackend {
        fn new(responses: Vec<Result<Vec<TeamRow>>>) -> Self {
            let mut rows = responses;
            rows.reverse();
            Self {
                rows: Mutex::new(rows),
                calls: AtomicUsize::new(0),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TeamBackend for ScriptedBackend {
        async fn list_teams(&self) -> Result<Vec<TeamRow>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.rows
                .lock()
                .pop()
                .unwrap_or_else(|| Err(AppError::Database("script exhausted".to_string())))
        }
    }

    fn engineering_row() -> TeamRow {
        TeamRow {
            id: uuid::Uuid::new_v4().to_string(),
            name: "Engineering Team".to_string(),
            description: None,
            metadata: Some(json!({
                "focus_area": {"value": "technical"},
                "Skills": ["api"],
                "technical_level": "senior"
            })),
            created_at: None,
            updated_at: None,
        }
    }

    fn config() -> DirectoryConfig {
        DirectoryConfig {
            cache_ttl_secs: 300,
            fetch_timeout_secs: 5,
        }
    }

    #[tokio::test]
    async fn test_cache_hit_skips_backend() {
        let backend = Arc::new(ScriptedBackend::new(vec![
            Ok(vec![engineering_row()]),
            Ok(vec![]),
        ]));
        let directory = TeamDirectory::new(backend.clone(), &config());

        let first = directory.get_teams(false).await;
        let second = directory.get_teams(false).await;

        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test]
    async fn test_force_refresh_bypasses_cache() {
        let backend = Arc::new(ScriptedBackend::new(vec![
            Ok(vec![engineering_row()]),
            Ok(vec![engineering_row(), engineering_row()]),
        ]));
        let directory = TeamDirectory::new(backend.clone(), &config());

        directory.get_teams(false).await;
        let refreshed = directory.get_teams(true).await;

        assert_eq!(refreshed.len(), 2);
        assert_eq!(backend.call_count(), 2);
    }

    #[tokio::test]
    async fn test_ttl_expiry_triggers_refetch() {
        let clock = Arc::new(ManualClock::new());
        let backend = Arc::new(ScriptedBackend::new(vec![
            Ok(vec![engineering_row()]),
            Ok(vec![engineering_row(), engineering_row()]),
        ]));
        let directory = TeamDirectory::with_clock(backend.clone(), &config(), clock.clone());

        directory.get_teams(false).await;
        clock.advance(Duration::from_secs(301));
        let after_expiry = directory.get_teams(false).await;

        assert_eq!(after_expiry.len(), 2);
        assert_eq!(backend.call_count(), 2);
    }

    #[tokio::test]
    async fn test_empty_store_yields_default_team() {
        let backend = Arc::new(ScriptedBackend::new(vec![Ok(vec![])]));
        let directory = TeamDirectory::new(backend, &config());

        let teams = directory.get_teams(false).await;

        assert_eq!(teams.len(), 1);
        assert_eq!(teams[0].name, "General Support");
    }

    #[tokio::test]
    async fn test_backend_error_without_cache_yields_default_team() {
        let backend = Arc::new(ScriptedBackend::new(vec![Err(AppError::Network(
            "connection refused".to_string(),
        ))]));
        let directory = TeamDirectory::new(backend, &config());

        let teams = directory.get_teams(false).await;

        assert_eq!(teams.len(), 1);
        assert_eq!(teams[0].name, "General Support");
    }

    #[tokio::test]
    async fn test_backend_error_serves_stale_cache() {
        let clock = Arc::new(ManualClock::new());
        let backend = Arc::new(ScriptedBackend::new(vec![
            Ok(vec![engineering_row()]),
            Err(AppError::Network("connection refused".to_string())),
        ]));
        let directory = TeamDirectory::with_clock(backend.clone(), &config(), clock.clone());

        let fresh = directory.get_teams(false).await;
        clock.advance(Duration::from_secs(301));
        let stale = directory.get_teams(false).await;

        assert_eq!(backend.call_count(), 2);
        assert_eq!(stale.len(), fresh.len());
        assert_eq!(stale[0].name, "Engineering Team");
    }

    #[tokio::test]
    async fn test_unusable_rows_are_skipped() {
        let mut nameless = engineering_row();
        nameless.name = String::new();
        let backend = Arc::new(ScriptedBackend::new(vec![Ok(vec![
            nameless,
            engineering_row(),
        ])]));
        let directory = TeamDirectory::new(backend, &config());

        let teams = directory.get_teams(false).await;

        assert_eq!(teams.len(), 1);
        assert_eq!(teams[0].name, "Engineering Team");
    }

    #[tokio::test]
    async fn test_invalidate_forces_refetch() {
        let backend = Arc::new(ScriptedBackend::new(vec![
            Ok(vec![engineering_row()]),
            Ok(vec![engineering_row()]),
        ]));
        let directory = TeamDirectory::new(backend.clone(), &config());

        directory.get_teams(false).await;
        directory.invalidate();
        directory.get_teams(false).await;

        assert_eq!(backend.call_count(), 2);
    }
}
