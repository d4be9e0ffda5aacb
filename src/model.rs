//! Repository, run and job records plus the pure formatting helpers shared by
//! the card state machine and the painters.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A tracked repository. `owner` + `name` is the identity; `path` is where it was found locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoRef {
    pub path: String,
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    pub fn new(path: impl Into<String>, owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// `owner/name`, the form used by `/remove` and in card headers.
    pub fn key(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    pub fn same_repo(&self, other: &RepoRef) -> bool {
        self.owner == other.owner && self.name == other.name
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunStatus {
    Success,
    Failure,
    InProgress,
    Pending,
    Cancelled,
    Unknown,
}

/// Collapse GitHub's `(status, conclusion)` pair into a single display status.
pub fn derive_status(status: &str, conclusion: Option<&str>) -> RunStatus {
    match status {
        "completed" => match conclusion {
            Some("success") => RunStatus::Success,
            Some("failure") => RunStatus::Failure,
            Some("cancelled") => RunStatus::Cancelled,
            _ => RunStatus::Unknown,
        },
        "in_progress" | "queued" => RunStatus::InProgress,
        "pending" | "waiting" => RunStatus::Pending,
        _ => RunStatus::Unknown,
    }
}

pub fn status_icon(status: RunStatus) -> &'static str {
    match status {
        RunStatus::Success => "✓",
        RunStatus::Failure => "✗",
        RunStatus::InProgress => "⟳",
        RunStatus::Pending => "○",
        RunStatus::Cancelled => "⊘",
        RunStatus::Unknown => "·",
    }
}

fn nullable_string<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(de)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WorkflowRun {
    pub id: u64,
    #[serde(default, deserialize_with = "nullable_string")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub workflow_name: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub head_branch: String,
    #[serde(default)]
    pub run_number: u64,
    #[serde(default, deserialize_with = "nullable_string")]
    pub status: String,
    #[serde(default)]
    pub conclusion: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl WorkflowRun {
    pub fn run_status(&self) -> RunStatus {
        derive_status(&self.status, self.conclusion.as_deref())
    }

    pub fn display_name(&self) -> &str {
        if self.workflow_name.is_empty() {
            &self.name
        } else {
            &self.workflow_name
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Job {
    pub id: u64,
    #[serde(default, deserialize_with = "nullable_string")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub status: String,
    #[serde(default)]
    pub conclusion: Option<String>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Job {
    pub fn job_status(&self) -> RunStatus {
        derive_status(&self.status, self.conclusion.as_deref())
    }

    /// `None` until the job has both started and completed.
    pub fn duration(&self) -> Option<Duration> {
        match (self.started_at, self.completed_at) {
            (Some(start), Some(end)) => Some(end.signed_duration_since(start)),
            _ => None,
        }
    }
}

/// Age bucket of `t` relative to `now`: "now", "Nm", "Nh" or "Nd".
pub fn format_time_ago(t: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = now.signed_duration_since(t).num_seconds();
    if secs < 60 {
        "now".to_string()
    } else if secs < 3600 {
        format!("{}m", secs / 60)
    } else if secs < 86_400 {
        format!("{}h", secs / 3600)
    } else {
        format!("{}d", secs / 86_400)
    }
}

/// Compact duration: "42s", "3m7s", "1h12m".
pub fn format_duration(d: Duration) -> String {
    let secs = d.num_seconds().max(0);
    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        format!("{}m{}s", secs / 60, secs % 60)
    } else {
        format!("{}h{}m", secs / 3600, (secs % 3600) / 60)
    }
}

/// Unicode-width-aware truncation with ellipsis.
/// Returns `""` when `max_width` is 0.
pub fn truncate(s: &str, max_width: usize) -> String {
    use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};
    if max_width == 0 {
        return String::new();
    }
    if UnicodeWidthStr::width(s) <= max_width {
        return s.to_string();
    }
    let mut result = String::new();
    let mut width = 0;
    for c in s.chars() {
        let cw = UnicodeWidthChar::width(c).unwrap_or(0);
        if width + cw + 1 > max_width {
            break;
        }
        result.push(c);
        width += cw;
    }
    result.push('…');
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn derive_status_table() {
        let cases = [
            ("completed", Some("success"), RunStatus::Success),
            ("completed", Some("failure"), RunStatus::Failure),
            ("completed", Some("cancelled"), RunStatus::Cancelled),
            ("completed", Some("timed_out"), RunStatus::Unknown),
            ("completed", Some("skipped"), RunStatus::Unknown),
            ("completed", None, RunStatus::Unknown),
            ("in_progress", None, RunStatus::InProgress),
            ("queued", Some(""), RunStatus::InProgress),
            ("pending", None, RunStatus::Pending),
            ("waiting", Some(""), RunStatus::Pending),
            ("requested", None, RunStatus::Unknown),
            ("", None, RunStatus::Unknown),
        ];
        for (status, conclusion, expected) in cases {
            assert_eq!(
                derive_status(status, conclusion),
                expected,
                "({status:?}, {conclusion:?})"
            );
        }
    }

    #[test]
    fn conclusion_ignored_unless_completed() {
        assert_eq!(derive_status("in_progress", Some("failure")), RunStatus::InProgress);
    }

    #[test]
    fn time_ago_buckets() {
        let now = at(0);
        assert_eq!(format_time_ago(at(-59), now), "now");
        assert_eq!(format_time_ago(at(-90), now), "1m");
        assert_eq!(format_time_ago(at(-3599), now), "59m");
        assert_eq!(format_time_ago(at(-3600), now), "1h");
        assert_eq!(format_time_ago(at(-25 * 3600), now), "1d");
        assert_eq!(format_time_ago(at(-72 * 3600), now), "3d");
    }

    #[test]
    fn time_ago_future_timestamp_is_now() {
        assert_eq!(format_time_ago(at(30), at(0)), "now");
    }

    #[test]
    fn duration_formats() {
        assert_eq!(format_duration(Duration::seconds(0)), "0s");
        assert_eq!(format_duration(Duration::seconds(59)), "59s");
        assert_eq!(format_duration(Duration::seconds(187)), "3m7s");
        assert_eq!(format_duration(Duration::seconds(3600 + 12 * 60 + 5)), "1h12m");
        assert_eq!(format_duration(Duration::seconds(-5)), "0s");
    }

    #[test]
    fn job_duration_requires_both_timestamps() {
        let mut job = Job {
            id: 1,
            name: "build".into(),
            status: "completed".into(),
            conclusion: Some("success".into()),
            started_at: Some(at(0)),
            completed_at: None,
        };
        assert_eq!(job.duration(), None);
        job.completed_at = Some(at(125));
        assert_eq!(job.duration(), Some(Duration::seconds(125)));
        job.started_at = None;
        assert_eq!(job.duration(), None);
    }

    #[test]
    fn display_name_falls_back_to_name() {
        let mut run = WorkflowRun {
            id: 1,
            name: "CI".into(),
            workflow_name: String::new(),
            head_branch: "main".into(),
            run_number: 3,
            status: "completed".into(),
            conclusion: Some("success".into()),
            created_at: at(0),
        };
        assert_eq!(run.display_name(), "CI");
        run.workflow_name = "Release".into();
        assert_eq!(run.display_name(), "Release");
    }

    #[test]
    fn truncate_short_string_unchanged() {
        assert_eq!(truncate("hello", 10), "hello");
    }

    #[test]
    fn truncate_adds_ellipsis() {
        assert_eq!(truncate("hello world", 6), "hello…");
    }

    #[test]
    fn truncate_wide_chars() {
        // each CJK char is 2 columns
        assert_eq!(truncate("构建测试", 5), "构建…");
    }

    #[test]
    fn truncate_zero_width() {
        assert_eq!(truncate("abc", 0), "");
    }

    #[test]
    fn repo_identity_ignores_path() {
        let a = RepoRef::new("/a", "octo", "cat");
        let b = RepoRef::new("/b", "octo", "cat");
        assert!(a.same_repo(&b));
        assert_eq!(a.key(), "octo/cat");
    }
}
