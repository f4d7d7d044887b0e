//! The `[Kimai-ID <id>]` tag that links a GitLab timelog back to its timesheet.
//!
//! GitLab has no field for foreign ids, so the tag is appended to the
//! timelog summary and recovered by suffix match. This module is the only
//! place the tag format is defined.

/// The tag identifying timesheet `timesheet_id`.
pub fn timesheet_tag(timesheet_id: i64) -> String {
    format!("[Kimai-ID {timesheet_id}]")
}

/// Build the timelog summary: the description followed by the tag.
/// An empty description yields the bare tag.
pub fn build_summary(timesheet_id: i64, description: &str) -> String {
    let tag = timesheet_tag(timesheet_id);
    if description.is_empty() {
        tag
    } else {
        format!("{description} {tag}")
    }
}

/// True if `summary` ends with the tag of `timesheet_id`.
pub fn is_tagged_for(summary: &str, timesheet_id: i64) -> bool {
    summary.ends_with(&timesheet_tag(timesheet_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_summary() {
        assert_eq!(
            build_summary(42, "Fix login redirect"),
            "Fix login redirect [Kimai-ID 42]"
        );
    }

    #[test]
    fn test_build_summary_empty_description() {
        assert_eq!(build_summary(7, ""), "[Kimai-ID 7]");
    }

    #[test]
    fn test_built_summary_is_recognised() {
        for (id, desc) in [(1, ""), (5, "#12 review"), (123456, "[#3] multi\nline")] {
            let summary = build_summary(id, desc);
            assert!(is_tagged_for(&summary, id), "{summary:?} should match {id}");
        }
    }

    #[test]
    fn test_other_ids_are_rejected() {
        let summary = build_summary(5, "pairing");
        assert!(!is_tagged_for(&summary, 15));
        assert!(!is_tagged_for(&summary, 50));
        assert!(!is_tagged_for(&build_summary(15, "pairing"), 5));
    }

    #[test]
    fn test_tag_must_be_suffix() {
        assert!(!is_tagged_for("[Kimai-ID 5] moved by hand", 5));
        assert!(!is_tagged_for("manual entry", 5));
    }
}
