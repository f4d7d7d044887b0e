use std::slice;

use crate::settings::SettingsProvider;
use crate::sync::reconcile::TimelogSync;
use crate::sync::{SyncProgress, SyncReport, SyncStatus};
use crate::timesheet::TimesheetEntry;

/// Timesheet lifecycle notifications from the host application.
///
/// Duplicated and restarted timesheets arrive as `Created`.
#[derive(Debug, Clone)]
pub enum TimesheetEvent {
    Created(TimesheetEntry),
    Updated(TimesheetEntry),
    Stopped(TimesheetEntry),
    /// Sent before the entry is removed.
    DeleteRequested(TimesheetEntry),
    BulkUpdated(Vec<TimesheetEntry>),
    /// Sent before the entries are removed.
    BulkDeleteRequested(Vec<TimesheetEntry>),
}

impl TimesheetEvent {
    pub fn entries(&self) -> &[TimesheetEntry] {
        match self {
            TimesheetEvent::Created(entry)
            | TimesheetEvent::Updated(entry)
            | TimesheetEvent::Stopped(entry)
            | TimesheetEvent::DeleteRequested(entry) => slice::from_ref(entry),
            TimesheetEvent::BulkUpdated(entries) | TimesheetEvent::BulkDeleteRequested(entries) => {
                entries
            }
        }
    }

    /// Whether the entries are about to be deleted.
    pub fn is_delete(&self) -> bool {
        matches!(
            self,
            TimesheetEvent::DeleteRequested(_) | TimesheetEvent::BulkDeleteRequested(_)
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            TimesheetEvent::Created(_) => "created",
            TimesheetEvent::Updated(_) => "updated",
            TimesheetEvent::Stopped(_) => "stopped",
            TimesheetEvent::DeleteRequested(_) => "delete",
            TimesheetEvent::BulkUpdated(_) => "bulk-update",
            TimesheetEvent::BulkDeleteRequested(_) => "bulk-delete",
        }
    }
}

impl<S: SettingsProvider> TimelogSync<S> {
    /// Reconcile every entry of `event`, one after another.
    ///
    /// Each entry gets its own report. A failing entry is logged and does
    /// not stop the ones after it.
    pub async fn handle(
        &self,
        event: &TimesheetEvent,
        progress: &dyn SyncProgress,
    ) -> Vec<SyncReport> {
        let deleting = event.is_delete();
        let entries = event.entries();
        let total = entries.len();

        let mut reports = Vec::with_capacity(total);
        for (i, entry) in entries.iter().enumerate() {
            progress.on_entry_start(entry.id, i, total);
            let report = SyncReport::from_result(entry.id, self.process(entry, deleting).await);
            if report.status == SyncStatus::Failed {
                log::error!(
                    "Failed to sync timesheet {} ({} event): {}",
                    entry.id,
                    event.name(),
                    report.error.as_deref().unwrap_or_default()
                );
            }
            progress.on_entry_complete(&report);
            reports.push(report);
        }
        reports
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::sync::reconcile::tests::{
        entry, mount_create, mount_delete, mount_issue, operations, timelog,
    };
    use crate::sync::{NoopProgress, SyncOutcome};
    use serde_json::json;
    use std::sync::Mutex;
    use wiremock::matchers::{body_string_contains, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sync_for(server: &MockServer) -> TimelogSync<Settings> {
        TimelogSync::new(
            Settings::new(server.uri()).with_token("jane", "glpat-test"),
            reqwest::Client::new(),
        )
    }

    #[derive(Default)]
    struct RecordingProgress {
        seen: Mutex<Vec<(i64, usize, usize)>>,
        completed: Mutex<Vec<SyncStatus>>,
    }

    impl SyncProgress for RecordingProgress {
        fn on_entry_start(&self, timesheet_id: i64, index: usize, total: usize) {
            self.seen.lock().unwrap().push((timesheet_id, index, total));
        }

        fn on_entry_complete(&self, report: &SyncReport) {
            self.completed.lock().unwrap().push(report.status);
        }
    }

    #[test]
    fn test_delete_flag_per_event() {
        let e = entry(1, "", Some(60));
        assert!(!TimesheetEvent::Created(e.clone()).is_delete());
        assert!(!TimesheetEvent::Updated(e.clone()).is_delete());
        assert!(!TimesheetEvent::Stopped(e.clone()).is_delete());
        assert!(!TimesheetEvent::BulkUpdated(vec![e.clone()]).is_delete());
        assert!(TimesheetEvent::DeleteRequested(e.clone()).is_delete());
        assert!(TimesheetEvent::BulkDeleteRequested(vec![e]).is_delete());
    }

    #[test]
    fn test_entries() {
        let single = TimesheetEvent::Stopped(entry(1, "", None));
        assert_eq!(single.entries().len(), 1);
        let bulk = TimesheetEvent::BulkUpdated(vec![entry(1, "", None), entry(2, "", None)]);
        assert_eq!(
            bulk.entries().iter().map(|e| e.id).collect::<Vec<_>>(),
            vec![1, 2]
        );
        assert!(TimesheetEvent::BulkDeleteRequested(vec![]).entries().is_empty());
    }

    #[tokio::test]
    async fn test_delete_event_removes_timelog() {
        let server = MockServer::start().await;
        mount_issue(
            &server,
            json!([timelog("gid://gitlab/Timelog/1", 60, "x [Kimai-ID 3]", "2024-07-22T07:00:00Z")]),
        )
        .await;
        mount_delete(&server, 1).await;
        mount_create(&server, 0).await;

        let reports = sync_for(&server)
            .handle(&TimesheetEvent::DeleteRequested(entry(3, "x", Some(60))), &NoopProgress)
            .await;
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].status, SyncStatus::Success);
        assert_eq!(operations(&server).await, vec!["issueTimelogs", "deleteTimelog"]);
    }

    #[tokio::test]
    async fn test_bulk_update_continues_after_failure() {
        let server = MockServer::start().await;
        // Entry 1 points at an issue that does not exist, entry 2 is fine.
        Mock::given(method("POST"))
            .and(body_string_contains(r#""iid":"404""#))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"workspace": {"issuable": null}}
            })))
            .with_priority(1)
            .mount(&server)
            .await;
        mount_issue(&server, json!([])).await;
        mount_create(&server, 1).await;

        let mut missing = entry(1, "a", Some(60));
        missing.gitlab_issue_id = Some(404);
        let mut untracked = entry(3, "Weekly planning", Some(60));
        untracked.gitlab_issue_id = None;
        let event = TimesheetEvent::BulkUpdated(vec![missing, entry(2, "b", Some(60)), untracked]);

        let progress = RecordingProgress::default();
        let reports = sync_for(&server).handle(&event, &progress).await;

        let statuses: Vec<SyncStatus> = reports.iter().map(|r| r.status).collect();
        assert_eq!(
            statuses,
            vec![SyncStatus::Failed, SyncStatus::Success, SyncStatus::Skipped]
        );
        assert!(reports[0].error.as_deref().unwrap().contains("404"));
        assert!(matches!(
            reports[1].outcome,
            Some(SyncOutcome::Applied { created: Some(_), .. })
        ));
        assert_eq!(
            *progress.seen.lock().unwrap(),
            vec![(1, 0, 3), (2, 1, 3), (3, 2, 3)]
        );
        assert_eq!(*progress.completed.lock().unwrap(), statuses);
    }

    #[tokio::test]
    async fn test_bulk_delete_never_creates() {
        let server = MockServer::start().await;
        mount_issue(&server, json!([])).await;
        mount_create(&server, 0).await;

        let event =
            TimesheetEvent::BulkDeleteRequested(vec![entry(1, "a", Some(60)), entry(2, "b", Some(60))]);
        let reports = sync_for(&server).handle(&event, &NoopProgress).await;
        assert!(reports.iter().all(|r| r.status == SyncStatus::Success));
        assert_eq!(operations(&server).await, vec!["issueTimelogs", "issueTimelogs"]);
    }
}
