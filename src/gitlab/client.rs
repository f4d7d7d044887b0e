use chrono::{DateTime, FixedOffset};
use serde_json::json;

use crate::date_util::format_duration;
use crate::error::{Error, RemoteItem, Result};
use crate::gitlab::transport::GraphqlTransport;
use crate::gitlab::types::{
    IssueTimelogs, IssueTimelogsData, MutationPayload, MutationVariables, ProjectsData,
    TimelogCreateData, TimelogCreateInput, TimelogDeleteData, TimelogDeleteInput,
};
use crate::issue_ref::ProjectRef;
use crate::summary::build_summary;

const PROJECT_FULL_PATH_QUERY: &str = r#"
query projectFullPath($ids: [ID!]) {
    projects: projects(ids: $ids) {
        nodes {
            fullPath
        }
    }
}
"#;

const ISSUE_TIMELOGS_QUERY: &str = r#"
query issueTimelogs($fullPath: ID!, $iid: String) {
    workspace: project(fullPath: $fullPath) {
        issuable: issue(iid: $iid) {
            id
            timelogs {
                nodes {
                    id
                    timeSpent
                    user {
                        id
                        name
                    }
                    spentAt
                    summary
                }
            }
        }
    }
}
"#;

const CREATE_TIMELOG_MUTATION: &str = r#"
mutation createTimelog($input: TimelogCreateInput!) {
    timelogCreate(input: $input) {
        errors
        timelog {
            id
        }
    }
}
"#;

const DELETE_TIMELOG_MUTATION: &str = r#"
mutation deleteTimelog($input: TimelogDeleteInput!) {
    timelogDelete(input: $input) {
        errors
        timelog {
            id
        }
    }
}
"#;

/// Timelog operations against one GitLab instance.
#[derive(Debug, Clone)]
pub struct GitlabClient {
    transport: GraphqlTransport,
    base_url: String,
}

impl GitlabClient {
    /// `base_url` must already be normalized (no trailing slash).
    pub fn new(http: reqwest::Client, base_url: &str, access_token: &str) -> Self {
        Self {
            transport: GraphqlTransport::new(http, base_url, access_token),
            base_url: base_url.to_string(),
        }
    }

    /// Resolve a numeric project id to its full path (`group/project`).
    pub async fn project_full_path(&self, project_id: u64) -> Result<String> {
        let variables = json!({ "ids": [format!("gid://gitlab/Project/{project_id}")] });
        let data: ProjectsData = self
            .transport
            .execute(PROJECT_FULL_PATH_QUERY, variables)
            .await?;

        data.projects
            .and_then(|projects| projects.nodes.into_iter().next())
            .and_then(|node| node.full_path)
            .ok_or(Error::RemoteItemNotFound(RemoteItem::ProjectId(project_id)))
    }

    /// Fetch an issue's global id and all of its timelogs.
    ///
    /// Numeric project ids are resolved to a full path first, which costs
    /// one extra round trip.
    pub async fn issue_timelogs(&self, project: &ProjectRef, issue_iid: u64) -> Result<IssueTimelogs> {
        let full_path = match project {
            ProjectRef::Id(id) => self.project_full_path(*id).await?,
            ProjectRef::Path(path) => path.clone(),
        };

        let variables = json!({ "fullPath": full_path, "iid": issue_iid.to_string() });
        let data: IssueTimelogsData = self
            .transport
            .execute(ISSUE_TIMELOGS_QUERY, variables)
            .await?;

        let project_url = format!("{}/{}", self.base_url, full_path);
        let workspace = data
            .workspace
            .ok_or_else(|| Error::RemoteItemNotFound(RemoteItem::Project { url: project_url.clone() }))?;
        let issuable = workspace.issuable.ok_or(Error::RemoteItemNotFound(RemoteItem::Issue {
            iid: issue_iid,
            project_url,
        }))?;

        Ok(IssueTimelogs {
            issue_gid: issuable.id,
            timelogs: issuable.timelogs.map(|t| t.nodes).unwrap_or_default(),
        })
    }

    /// Create a timelog for a timesheet on the given issue and return its id.
    ///
    /// `spent_at` is sent as-is; pass `None` to let GitLab use the current time.
    pub async fn create_timelog(
        &self,
        timesheet_id: i64,
        issue_gid: &str,
        spent_at: Option<DateTime<FixedOffset>>,
        description: &str,
        duration_seconds: i64,
    ) -> Result<String> {
        let input = TimelogCreateInput {
            issuable_id: issue_gid.to_string(),
            time_spent: format_duration(duration_seconds),
            summary: build_summary(timesheet_id, description),
            spent_at: spent_at.map(|at| at.to_rfc3339()),
        };
        let data: TimelogCreateData = self
            .transport
            .execute(CREATE_TIMELOG_MUTATION, MutationVariables { input })
            .await?;
        timelog_id(data.timelog_create)
    }

    /// Delete a timelog by global id and return the deleted id.
    pub async fn delete_timelog(&self, timelog_gid: &str) -> Result<String> {
        let input = TimelogDeleteInput {
            id: timelog_gid.to_string(),
        };
        let data: TimelogDeleteData = self
            .transport
            .execute(DELETE_TIMELOG_MUTATION, MutationVariables { input })
            .await?;
        timelog_id(data.timelog_delete)
    }
}

fn timelog_id(payload: Option<MutationPayload>) -> Result<String> {
    let payload =
        payload.ok_or_else(|| Error::SyncRejected("GitLab returned no mutation result".into()))?;
    if !payload.errors.is_empty() {
        return Err(Error::SyncRejected(payload.errors.join(" | ")));
    }
    payload
        .timelog
        .map(|t| t.id)
        .ok_or_else(|| Error::SyncRejected("GitLab returned no timelog".into()))
}
