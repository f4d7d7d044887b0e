use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Serialize)]
struct GraphqlRequest<'a, V> {
    query: &'a str,
    variables: V,
}

#[derive(Debug, Deserialize)]
struct GraphqlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Option<Vec<GraphqlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    #[serde(default)]
    message: String,
}

/// One GraphQL endpoint plus the bearer token used to call it.
///
/// Every failure comes back already classified: a 401 becomes
/// [`Error::AuthenticationFailed`], a non-empty top-level `errors` array
/// becomes [`Error::GraphQL`], and anything else on the wire is
/// [`Error::Transport`]. Callers only ever see `data`.
#[derive(Debug, Clone)]
pub struct GraphqlTransport {
    http: Client,
    endpoint: String,
    access_token: String,
}

impl GraphqlTransport {
    /// `base_url` must not end with a slash.
    pub fn new(http: Client, base_url: &str, access_token: &str) -> Self {
        Self {
            http,
            endpoint: format!("{base_url}/api/graphql"),
            access_token: access_token.to_string(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn execute<V, T>(&self, query: &str, variables: V) -> Result<T>
    where
        V: Serialize,
        T: DeserializeOwned,
    {
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.access_token)
            .json(&GraphqlRequest { query, variables })
            .send()
            .await?;

        let status = response.status();
        log::debug!("POST {} -> {status}", self.endpoint);
        if status == StatusCode::UNAUTHORIZED {
            return Err(Error::AuthenticationFailed);
        }

        let body: GraphqlResponse<T> = response.error_for_status()?.json().await?;

        if let Some(errors) = body.errors.filter(|errors| !errors.is_empty()) {
            let messages: Vec<String> = errors.into_iter().map(|e| e.message).collect();
            return Err(Error::GraphQL(messages.join(" | ")));
        }

        body.data
            .ok_or_else(|| Error::GraphQL("the response contained no data".into()))
    }
}
