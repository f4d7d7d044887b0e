pub mod date_util;
pub mod error;
pub mod gitlab;
pub mod issue_ref;
pub mod settings;
pub mod storage;
pub mod summary;
pub mod sync;
pub mod timesheet;

pub use error::{Error, Result};
pub use gitlab::{GitlabClient, GraphqlTransport, IssueTimelogs, Timelog, TimelogUser};
pub use issue_ref::{
    extract_issue_reference, IssueReference, IssueReferenceExtractor, ProjectRef,
};
pub use settings::{Settings, SettingsProvider, ACCESS_TOKEN_KEY, BASE_URL_KEY};
pub use storage::Database;
pub use sync::events::TimesheetEvent;
pub use sync::reconcile::TimelogSync;
pub use sync::{NoopProgress, SkipReason, SyncOutcome, SyncProgress, SyncReport, SyncStatus};
pub use timesheet::{Project, TimesheetEntry};

use storage::repository;

/// Main entry point for the Kimai to GitLab timelog sync.
pub struct KimaiGitlab {
    db: Database,
    http: reqwest::Client,
}

impl KimaiGitlab {
    pub fn new(db: Database, http: reqwest::Client) -> Self {
        Self { db, http }
    }

    /// Access the database (for direct queries in the CLI).
    pub fn db(&self) -> &Database {
        &self.db
    }

    // ── Sync ───────────────────────────────────────────────────────

    /// Snapshot of the base URL and every stored access token.
    pub async fn settings(&self) -> Result<Settings> {
        self.db
            .reader()
            .call(|conn| repository::load_settings(conn))
            .await
            .map_err(|e| Error::Database(e.to_string()))
    }

    /// Reconcile all entries of a lifecycle event with GitLab.
    ///
    /// Settings are read fresh for every event.
    pub async fn handle(
        &self,
        event: &TimesheetEvent,
        progress: &dyn SyncProgress,
    ) -> Result<Vec<SyncReport>> {
        let settings = self.settings().await?;
        let sync = TimelogSync::new(settings, self.http.clone());
        Ok(sync.handle(event, progress).await)
    }

    /// Find the issue reference in a timesheet description.
    pub async fn extract(&self, text: &str) -> Result<IssueReference> {
        let base_url = self
            .settings()
            .await?
            .base_url()
            .ok_or_else(|| Error::Config(format!("{BASE_URL_KEY} is not set")))?;
        extract_issue_reference(issue_ref::normalize_base_url(&base_url), text)
    }

    // ── Config commands ────────────────────────────────────────────

    pub async fn config_get(&self, key: &str) -> Result<Option<String>> {
        self.db
            .reader()
            .call({
                let key = key.to_string();
                move |conn| repository::get_config(conn, &key)
            })
            .await
            .map_err(|e| Error::Database(e.to_string()))
    }

    /// Store a config value. The GitLab base URL is validated and stored
    /// without trailing slashes.
    pub async fn config_set(&self, key: &str, value: &str) -> Result<()> {
        let value = if key == BASE_URL_KEY {
            issue_ref::validate_base_url(value)?
        } else {
            value.to_string()
        };
        self.db
            .writer()
            .call({
                let key = key.to_string();
                move |conn| repository::set_config(conn, &key, &value)
            })
            .await
            .map_err(|e| Error::Database(e.to_string()))
    }

    pub async fn config_unset(&self, key: &str) -> Result<bool> {
        self.db
            .writer()
            .call({
                let key = key.to_string();
                move |conn| repository::unset_config(conn, &key)
            })
            .await
            .map_err(|e| Error::Database(e.to_string()))
    }

    pub async fn config_list(&self) -> Result<Vec<(String, String)>> {
        self.db
            .reader()
            .call(|conn| repository::list_config(conn))
            .await
            .map_err(|e| Error::Database(e.to_string()))
    }

    // ── Access tokens ──────────────────────────────────────────────

    pub async fn token_set(&self, user: &str, token: &str) -> Result<()> {
        let token = token.trim();
        if token.is_empty() {
            return Err(Error::Config("access token must not be empty".into()));
        }
        self.db
            .writer()
            .call({
                let user = user.to_string();
                let token = token.to_string();
                move |conn| repository::set_preference(conn, &user, ACCESS_TOKEN_KEY, &token)
            })
            .await
            .map_err(|e| Error::Database(e.to_string()))
    }

    pub async fn token_remove(&self, user: &str) -> Result<bool> {
        self.db
            .writer()
            .call({
                let user = user.to_string();
                move |conn| repository::remove_preference(conn, &user, ACCESS_TOKEN_KEY)
            })
            .await
            .map_err(|e| Error::Database(e.to_string()))
    }

    /// Users with a stored access token.
    pub async fn token_users(&self) -> Result<Vec<String>> {
        self.db
            .reader()
            .call(|conn| repository::users_with_preference(conn, ACCESS_TOKEN_KEY))
            .await
            .map_err(|e| Error::Database(e.to_string()))
    }
}
