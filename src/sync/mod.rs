pub mod events;
pub mod reconcile;

use serde::Serialize;

use crate::error::Error;

/// Why a reconciliation did not talk to GitLab at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// No base URL, or no token for the entry's user.
    NotConfigured,
    /// No project or no issue could be determined for the entry.
    NoTarget,
}

/// What a single reconciliation did on the GitLab side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SyncOutcome {
    Skipped { reason: SkipReason },
    /// The one matching timelog already reflects the entry.
    Unchanged { timelog_id: String },
    /// Timelogs removed and, unless the entry is deleted or running, the one created.
    Applied {
        deleted: Vec<String>,
        created: Option<String>,
    },
}

impl SyncOutcome {
    /// True when no mutation was sent to GitLab.
    pub fn is_noop(&self) -> bool {
        match self {
            SyncOutcome::Skipped { .. } | SyncOutcome::Unchanged { .. } => true,
            SyncOutcome::Applied { deleted, created } => deleted.is_empty() && created.is_none(),
        }
    }
}

/// Report for one timesheet entry of a lifecycle event.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub timesheet_id: i64,
    pub status: SyncStatus,
    pub outcome: Option<SyncOutcome>,
    pub error: Option<String>,
}

impl SyncReport {
    pub fn from_result(timesheet_id: i64, result: Result<SyncOutcome, Error>) -> Self {
        match result {
            Ok(outcome) => {
                let status = match outcome {
                    SyncOutcome::Skipped { .. } => SyncStatus::Skipped,
                    _ => SyncStatus::Success,
                };
                Self {
                    timesheet_id,
                    status,
                    outcome: Some(outcome),
                    error: None,
                }
            }
            Err(e) => Self {
                timesheet_id,
                status: SyncStatus::Failed,
                outcome: None,
                error: Some(e.to_string()),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SyncStatus {
    Success,
    Skipped,
    Failed,
}

/// Callbacks for reporting progress while an event is handled.
pub trait SyncProgress: Send + Sync {
    fn on_entry_start(&self, _timesheet_id: i64, _index: usize, _total: usize) {}
    fn on_entry_complete(&self, _report: &SyncReport) {}
}

/// Progress reporter that ignores every callback.
pub struct NoopProgress;

impl SyncProgress for NoopProgress {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_from_outcome() {
        let report = SyncReport::from_result(
            3,
            Ok(SyncOutcome::Applied {
                deleted: vec![],
                created: Some("gid://gitlab/Timelog/1".into()),
            }),
        );
        assert_eq!(report.status, SyncStatus::Success);
        assert!(report.error.is_none());

        let report = SyncReport::from_result(
            3,
            Ok(SyncOutcome::Skipped {
                reason: SkipReason::NoTarget,
            }),
        );
        assert_eq!(report.status, SyncStatus::Skipped);
    }

    #[test]
    fn test_report_from_error() {
        let report = SyncReport::from_result(4, Err(Error::AuthenticationFailed));
        assert_eq!(report.status, SyncStatus::Failed);
        assert!(report.outcome.is_none());
        assert!(report.error.unwrap().contains("access token"));
    }

    #[test]
    fn test_is_noop() {
        assert!(SyncOutcome::Unchanged {
            timelog_id: "t".into()
        }
        .is_noop());
        assert!(SyncOutcome::Applied {
            deleted: vec![],
            created: None
        }
        .is_noop());
        assert!(!SyncOutcome::Applied {
            deleted: vec!["t".into()],
            created: None
        }
        .is_noop());
    }

    #[test]
    fn test_outcome_serializes_with_kind() {
        let value = serde_json::to_value(SyncOutcome::Skipped {
            reason: SkipReason::NotConfigured,
        })
        .unwrap();
        assert_eq!(
            value,
            serde_json::json!({"kind": "skipped", "reason": "not_configured"})
        );
    }
}
