//! GitLab GraphQL API access: the raw transport and the four timelog
//! operations built on it.

pub mod client;
pub mod transport;
pub mod types;

pub use client::GitlabClient;
pub use transport::GraphqlTransport;
pub use types::{IssueTimelogs, Timelog, TimelogUser};
