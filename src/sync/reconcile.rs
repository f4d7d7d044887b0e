//! Reconciliation of one timesheet entry with its GitLab timelog.
//!
//! GitLab timelogs have no field for a foreign id, so the entry is found by
//! the `[Kimai-ID <id>]` tag at the end of the timelog summary. GitLab also
//! has no update mutation: a changed entry is delete-then-create.

use chrono::Utc;

use crate::date_util::past_or_present;
use crate::error::Result;
use crate::gitlab::{GitlabClient, IssueTimelogs, Timelog};
use crate::issue_ref::{extract_issue_reference, normalize_base_url, ProjectRef};
use crate::settings::SettingsProvider;
use crate::summary::{build_summary, is_tagged_for};
use crate::sync::{SkipReason, SyncOutcome};
use crate::timesheet::TimesheetEntry;

/// The GitLab project and issue a timesheet entry is booked against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTarget {
    pub project: ProjectRef,
    pub issue_id: u64,
}

/// Work out which issue `entry` belongs to.
///
/// Meta fields come first. Without an issue meta value the description is
/// scanned, and whatever the scan finds replaces the meta value for that
/// part only. Returns `None` when project or issue stays unknown.
pub fn resolve_target(base_url: &str, entry: &TimesheetEntry) -> Result<Option<RemoteTarget>> {
    let mut project = entry.project_meta().map(str::to_string);
    let mut issue_id = entry.issue_id();

    if issue_id.is_none() {
        let found = extract_issue_reference(base_url, entry.description())?;
        if found.project_path.is_some() {
            project = found.project_path;
        }
        issue_id = found.issue_id.filter(|id| *id != 0);
    }

    let project = project.as_deref().and_then(ProjectRef::parse);
    match (project, issue_id) {
        (Some(project), Some(issue_id)) => Ok(Some(RemoteTarget { project, issue_id })),
        _ => Ok(None),
    }
}

/// True if `timelog` already carries what a fresh one for `entry` would.
pub fn is_up_to_date(timelog: &Timelog, entry: &TimesheetEntry) -> bool {
    timelog.time_spent == entry.duration_seconds()
        && timelog.summary() == build_summary(entry.id, entry.description())
        && timelog.spent_at.map(|at| at.timestamp()) == Some(entry.begin.timestamp())
}

/// Keeps GitLab timelogs in line with Kimai timesheet entries.
pub struct TimelogSync<S> {
    settings: S,
    http: reqwest::Client,
}

impl<S: SettingsProvider> TimelogSync<S> {
    pub fn new(settings: S, http: reqwest::Client) -> Self {
        Self { settings, http }
    }

    pub fn settings(&self) -> &S {
        &self.settings
    }

    /// Bring the GitLab side of `entry` up to date.
    ///
    /// Missing credentials or an unresolvable issue end in
    /// [`SyncOutcome::Skipped`] without any request. Once GitLab is
    /// contacted, every failure is returned as is, without retry.
    pub async fn process(&self, entry: &TimesheetEntry, deleting: bool) -> Result<SyncOutcome> {
        let (base_url, access_token) = match (
            self.settings.base_url(),
            self.settings.access_token(&entry.user),
        ) {
            (Some(url), Some(token)) => (url, token),
            _ => {
                log::debug!(
                    "Timesheet {}: GitLab sync not configured for user {}",
                    entry.id,
                    entry.user
                );
                return Ok(SyncOutcome::Skipped {
                    reason: SkipReason::NotConfigured,
                });
            }
        };
        let base_url = normalize_base_url(&base_url);

        let target = match resolve_target(base_url, entry)? {
            Some(target) => target,
            None => {
                log::debug!("Timesheet {}: no GitLab project/issue found", entry.id);
                return Ok(SyncOutcome::Skipped {
                    reason: SkipReason::NoTarget,
                });
            }
        };

        let client = GitlabClient::new(self.http.clone(), base_url, &access_token);
        let IssueTimelogs {
            issue_gid,
            timelogs,
        } = client
            .issue_timelogs(&target.project, target.issue_id)
            .await?;

        let existing: Vec<Timelog> = timelogs
            .into_iter()
            .filter(|t| is_tagged_for(t.summary(), entry.id))
            .collect();
        log::debug!(
            "Timesheet {}: {} tagged timelog(s) on issue {:?}#{}",
            entry.id,
            existing.len(),
            target.project,
            target.issue_id
        );

        if let [timelog] = existing.as_slice() {
            if !deleting && is_up_to_date(timelog, entry) {
                return Ok(SyncOutcome::Unchanged {
                    timelog_id: timelog.id.clone(),
                });
            }
        } else if existing.len() > 1 {
            log::warn!(
                "Timesheet {} has {} GitLab timelogs, removing all of them",
                entry.id,
                existing.len()
            );
        }

        let mut deleted = Vec::with_capacity(existing.len());
        for timelog in &existing {
            deleted.push(client.delete_timelog(&timelog.id).await?);
            log::info!("Timesheet {}: deleted GitLab timelog {}", entry.id, timelog.id);
        }

        if deleting || entry.duration_seconds() == 0 {
            return Ok(SyncOutcome::Applied {
                deleted,
                created: None,
            });
        }

        let spent_at = past_or_present(entry.begin, &Utc::now());
        if spent_at.is_none() {
            log::debug!("Timesheet {}: begin lies in the future, omitting spentAt", entry.id);
        }
        let created = client
            .create_timelog(
                entry.id,
                &issue_gid,
                spent_at,
                entry.description(),
                entry.duration_seconds(),
            )
            .await?;
        log::info!("Timesheet {}: created GitLab timelog {created}", entry.id);

        Ok(SyncOutcome::Applied {
            deleted,
            created: Some(created),
        })
    }
}
