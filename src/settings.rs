use std::collections::HashMap;

/// System-wide key holding the GitLab instance URL.
pub const BASE_URL_KEY: &str = "gitlab_instance_base_url";
/// Per-user preference holding the GitLab access token.
pub const ACCESS_TOKEN_KEY: &str = "gitlab_private_token";

/// Where the sync reads its credentials from. Consulted on every
/// reconciliation; nothing is cached between calls.
pub trait SettingsProvider {
    /// The configured GitLab instance URL, if any.
    fn base_url(&self) -> Option<String>;

    /// The GitLab access token stored for `user`, if any.
    fn access_token(&self, user: &str) -> Option<String>;
}

/// An in-memory snapshot of the system configuration and user tokens.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub base_url: Option<String>,
    pub tokens: HashMap<String, String>,
}

impl Settings {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: Some(base_url.into()),
            tokens: HashMap::new(),
        }
    }

    pub fn with_token(mut self, user: impl Into<String>, token: impl Into<String>) -> Self {
        self.tokens.insert(user.into(), token.into());
        self
    }
}

impl SettingsProvider for Settings {
    fn base_url(&self) -> Option<String> {
        self.base_url.clone().filter(|url| !url.trim().is_empty())
    }

    fn access_token(&self, user: &str) -> Option<String> {
        self.tokens
            .get(user)
            .filter(|token| !token.trim().is_empty())
            .cloned()
    }
}

impl<T: SettingsProvider + ?Sized> SettingsProvider for &T {
    fn base_url(&self) -> Option<String> {
        (**self).base_url()
    }

    fn access_token(&self, user: &str) -> Option<String> {
        (**self).access_token(user)
    }
}
