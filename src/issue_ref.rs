use regex::{Captures, Regex};
use serde::Serialize;

use crate::error::{Error, Result};

/// Project and issue found in free text. Either part may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IssueReference {
    pub project_path: Option<String>,
    pub issue_id: Option<u64>,
}

/// How a GitLab project is addressed: numeric id or full path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectRef {
    Id(u64),
    Path(String),
}

impl ProjectRef {
    /// Normalize a raw project identifier.
    ///
    /// Surrounding slashes are trimmed; a purely numeric remainder becomes
    /// [`ProjectRef::Id`], anything else is kept as a path. Returns `None`
    /// when nothing is left.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim().trim_matches('/');
        if trimmed.is_empty() {
            return None;
        }
        if is_numeric_id(trimmed) {
            if let Ok(id) = trimmed.parse() {
                return Some(ProjectRef::Id(id));
            }
        }
        Some(ProjectRef::Path(trimmed.to_string()))
    }
}

type Extract = fn(&Captures) -> IssueReference;

/// Scans timesheet descriptions for GitLab issue references.
///
/// Patterns are tried in priority order and the first match wins:
/// 1. `[<base_url>/<path>/-/issues/<iid>]` anywhere
/// 2. `<base_url>/<path>/-/issues/<iid>` at the start
/// 3. `[#<iid>]` anywhere
/// 4. `#<iid>` at the start
#[derive(Debug)]
pub struct IssueReferenceExtractor {
    patterns: Vec<(Regex, Extract)>,
}

impl IssueReferenceExtractor {
    /// Build the pattern table for a GitLab instance. `base_url` should
    /// already be normalized with [`normalize_base_url`].
    pub fn new(base_url: &str) -> Result<Self> {
        let base = regex::escape(base_url);
        let patterns: Vec<(Regex, Extract)> = vec![
            (
                Regex::new(&format!(r"\[{base}/([\w\-/]+)/-/issues/(\d+)\]"))?,
                full_reference as Extract,
            ),
            (
                Regex::new(&format!(r"^{base}/([\w\-/]+)/-/issues/(\d+)"))?,
                full_reference as Extract,
            ),
            (Regex::new(r"\[#(\d+)\]")?, short_reference as Extract),
            (Regex::new(r"^#(\d+)")?, short_reference as Extract),
        ];
        Ok(Self { patterns })
    }

    pub fn extract(&self, text: &str) -> IssueReference {
        self.patterns
            .iter()
            .find_map(|(pattern, extract)| pattern.captures(text).map(|caps| extract(&caps)))
            .unwrap_or_default()
    }
}

fn full_reference(caps: &Captures) -> IssueReference {
    IssueReference {
        project_path: caps.get(1).map(|m| m.as_str().to_string()),
        issue_id: caps.get(2).and_then(|m| m.as_str().parse().ok()),
    }
}

fn short_reference(caps: &Captures) -> IssueReference {
    IssueReference {
        project_path: None,
        issue_id: caps.get(1).and_then(|m| m.as_str().parse().ok()),
    }
}

/// One-shot form of [`IssueReferenceExtractor::extract`].
pub fn extract_issue_reference(base_url: &str, text: &str) -> Result<IssueReference> {
    Ok(IssueReferenceExtractor::new(base_url)?.extract(text))
}

/// Strip trailing slashes from a GitLab base URL.
pub fn normalize_base_url(base_url: &str) -> &str {
    base_url.trim().trim_end_matches('/')
}

/// Check that a base URL is an absolute http(s) URL and return it normalized.
pub fn validate_base_url(input: &str) -> Result<String> {
    let url = url::Url::parse(input.trim()).map_err(|e| Error::UrlParse(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(Error::UrlParse(format!(
                "unsupported scheme '{other}' in {input}"
            )))
        }
    }
    if url.host_str().is_none() {
        return Err(Error::UrlParse(format!("missing host in {input}")));
    }
    Ok(normalize_base_url(input).to_string())
}

/// Check if a string is a bare numeric id.
pub fn is_numeric_id(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}
