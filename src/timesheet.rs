use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer, Serialize};

/// A Kimai timesheet entry, as handed over by the host on a lifecycle event.
/// Read-only from the point of view of the sync.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimesheetEntry {
    pub id: i64,
    pub user: String,
    #[serde(default)]
    pub project: Option<Project>,
    /// `gitlab_issue_id` meta field of the timesheet.
    #[serde(default, deserialize_with = "issue_id_meta")]
    pub gitlab_issue_id: Option<u64>,
    #[serde(default)]
    pub description: Option<String>,
    pub begin: DateTime<FixedOffset>,
    /// Seconds; unset or zero while the timer is running.
    #[serde(default)]
    pub duration: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    /// `gitlab_project_id` meta field: a numeric id or a full path.
    #[serde(default, deserialize_with = "project_id_meta")]
    pub gitlab_project_id: Option<String>,
}

impl TimesheetEntry {
    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }

    pub fn duration_seconds(&self) -> i64 {
        self.duration.unwrap_or(0)
    }

    /// Explicit issue link; zero counts as unset.
    pub fn issue_id(&self) -> Option<u64> {
        self.gitlab_issue_id.filter(|id| *id != 0)
    }

    /// Explicit project link from the project's meta field; blank counts as unset.
    pub fn project_meta(&self) -> Option<&str> {
        self.project
            .as_ref()
            .and_then(|p| p.gitlab_project_id.as_deref())
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

/// Meta field values arrive either as JSON numbers or strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum MetaValue {
    Number(u64),
    Text(String),
}

fn project_id_meta<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<MetaValue>::deserialize(deserializer)?.map(|value| match value {
        MetaValue::Number(n) => n.to_string(),
        MetaValue::Text(s) => s,
    }))
}

fn issue_id_meta<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<MetaValue>::deserialize(deserializer)? {
        None => Ok(None),
        Some(MetaValue::Number(n)) => Ok(Some(n)),
        Some(MetaValue::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(MetaValue::Text(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid gitlab_issue_id '{s}'"))),
    }
}
