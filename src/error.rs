use std::fmt;
use thiserror::Error;

/// A remote GitLab entity that a reconciliation needed but could not find.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteItem {
    /// Numeric project id that `projects(ids:)` did not return.
    ProjectId(u64),
    /// Project full path, rendered as `<base_url>/<path>`.
    Project { url: String },
    /// Issue iid inside an existing project.
    Issue { iid: u64, project_url: String },
}

impl fmt::Display for RemoteItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteItem::ProjectId(id) => {
                write!(f, "There is no GitLab project with the ID {id}.")
            }
            RemoteItem::Project { url } => write!(f, "There is no GitLab project at {url}."),
            RemoteItem::Issue { iid, project_url } => write!(
                f,
                "There is no GitLab issue with the ID {iid} in the project {project_url}."
            ),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    RemoteItemNotFound(RemoteItem),

    #[error(
        "You are not authorized to access the GitLab API. \
         Please check your access token, it might have been expired."
    )]
    AuthenticationFailed,

    #[error("The GraphQL request to the GitLab server failed: {0}")]
    GraphQL(String),

    #[error("The timesheet could not be synced with GitLab: {0}")]
    SyncRejected(String),

    #[error("GitLab transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Invalid URL: {0}")]
    UrlParse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid timesheet entry: {0}")]
    InvalidEntry(String),

    #[error("Invalid issue pattern: {0}")]
    Pattern(#[from] regex::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(e: rusqlite::Error) -> Self {
        Error::Database(e.to_string())
    }
}

impl From<rusqlite_migration::Error> for Error {
    fn from(e: rusqlite_migration::Error) -> Self {
        Error::Migration(e.to_string())
    }
}

impl<E: fmt::Display> From<tokio_rusqlite::Error<E>> for Error {
    fn from(e: tokio_rusqlite::Error<E>) -> Self {
        Error::Database(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
