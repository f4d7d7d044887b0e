use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A GitLab timelog as returned by the issue timelog query.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Timelog {
    pub id: String,
    pub time_spent: i64,
    #[serde(default)]
    pub user: Option<TimelogUser>,
    #[serde(default)]
    pub spent_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub summary: Option<String>,
}

impl Timelog {
    pub fn summary(&self) -> &str {
        self.summary.as_deref().unwrap_or("")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TimelogUser {
    pub id: String,
    pub name: String,
}

/// An issue's global id together with its current timelogs.
#[derive(Debug, Clone, PartialEq)]
pub struct IssueTimelogs {
    pub issue_gid: String,
    pub timelogs: Vec<Timelog>,
}

// ── Response envelopes ─────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub(crate) struct ProjectsData {
    pub projects: Option<Connection<ProjectNode>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProjectNode {
    pub full_path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct IssueTimelogsData {
    pub workspace: Option<Workspace>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Workspace {
    pub issuable: Option<Issuable>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Issuable {
    pub id: String,
    pub timelogs: Option<Connection<Timelog>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Connection<T> {
    #[serde(default = "Vec::new")]
    pub nodes: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TimelogCreateData {
    pub timelog_create: Option<MutationPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TimelogDeleteData {
    pub timelog_delete: Option<MutationPayload>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MutationPayload {
    #[serde(default)]
    pub errors: Vec<String>,
    pub timelog: Option<TimelogId>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TimelogId {
    pub id: String,
}

// ── Mutation inputs ────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub(crate) struct MutationVariables<T> {
    pub input: T,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TimelogCreateInput {
    pub issuable_id: String,
    pub time_spent: String,
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spent_at: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct TimelogDeleteInput {
    pub id: String,
}
