use crate::model::{Job, WorkflowRun};
use color_eyre::eyre::{Result, WrapErr};

#[derive(serde::Deserialize)]
struct RunsResponse {
    workflow_runs: Vec<WorkflowRun>,
}

/// Decodes `GET /repos/{o}/{n}/actions/runs`. Runs without a workflow name
/// take the run name instead.
pub fn parse_runs(json: &str) -> Result<Vec<WorkflowRun>> {
    let resp: RunsResponse =
        serde_json::from_str(json).wrap_err("Failed to parse workflow runs")?;
    Ok(resp
        .workflow_runs
        .into_iter()
        .map(|mut run| {
            if run.workflow_name.is_empty() {
                run.workflow_name.clone_from(&run.name);
            }
            run
        })
        .collect())
}

#[derive(serde::Deserialize)]
struct JobsResponse {
    jobs: Vec<Job>,
}

/// Decodes `GET /repos/{o}/{n}/actions/runs/{id}/jobs`.
pub fn parse_jobs(json: &str) -> Result<Vec<Job>> {
    let resp: JobsResponse = serde_json::from_str(json).wrap_err("Failed to parse jobs")?;
    Ok(resp.jobs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RunStatus;
    use chrono::Duration;

    const SINGLE_RUN_JSON: &str = r#"{
        "total_count": 1,
        "workflow_runs": [
            {
                "id": 123,
                "name": "CI",
                "head_branch": "main",
                "run_number": 42,
                "status": "completed",
                "conclusion": "success",
                "created_at": "2024-01-15T10:00:00Z",
                "updated_at": "2024-01-15T10:05:00Z",
                "html_url": "https://github.com/octo/cat/actions/runs/123",
                "event": "push",
                "display_title": "Fix the build"
            }
        ]
    }"#;

    #[test]
    fn parse_single_completed_run() {
        let runs = parse_runs(SINGLE_RUN_JSON).unwrap();
        assert_eq!(runs.len(), 1);
        let run = &runs[0];
        assert_eq!(run.id, 123);
        assert_eq!(run.name, "CI");
        assert_eq!(run.head_branch, "main");
        assert_eq!(run.run_number, 42);
        assert_eq!(run.run_status(), RunStatus::Success);
    }

    #[test]
    fn missing_workflow_name_falls_back_to_name() {
        let runs = parse_runs(SINGLE_RUN_JSON).unwrap();
        assert_eq!(runs[0].workflow_name, "CI");
        assert_eq!(runs[0].display_name(), "CI");
    }

    #[test]
    fn explicit_workflow_name_kept() {
        let json = r#"{"workflow_runs":[{
            "id": 1, "name": "run", "workflow_name": "Release",
            "head_branch": "main", "run_number": 1, "status": "queued",
            "conclusion": null, "created_at": "2024-01-01T00:00:00Z"
        }]}"#;
        let runs = parse_runs(json).unwrap();
        assert_eq!(runs[0].display_name(), "Release");
        assert_eq!(runs[0].run_status(), RunStatus::InProgress);
        assert_eq!(runs[0].conclusion, None);
    }

    #[test]
    fn null_branch_and_name_become_empty() {
        let json = r#"{"workflow_runs":[{
            "id": 1, "name": null, "head_branch": null, "run_number": 1,
            "status": "waiting", "conclusion": null, "created_at": "2024-01-01T00:00:00Z"
        }]}"#;
        let runs = parse_runs(json).unwrap();
        assert_eq!(runs[0].head_branch, "");
        assert_eq!(runs[0].display_name(), "");
        assert_eq!(runs[0].run_status(), RunStatus::Pending);
    }

    #[test]
    fn parse_unicode_name() {
        let json = r#"{"workflow_runs":[{
            "id": 1, "name": "构建 🚀 テスト", "head_branch": "m", "run_number": 1,
            "status": "completed", "conclusion": "success", "created_at": "2024-01-01T00:00:00Z"
        }]}"#;
        let runs = parse_runs(json).unwrap();
        assert_eq!(runs[0].display_name(), "构建 🚀 テスト");
    }

    #[test]
    fn parse_empty_run_list() {
        let runs = parse_runs(r#"{"total_count":0,"workflow_runs":[]}"#).unwrap();
        assert!(runs.is_empty());
    }

    #[test]
    fn parse_invalid_json_error() {
        assert!(parse_runs("not json").is_err());
        assert!(parse_runs("[]").is_err());
    }

    #[test]
    fn parse_missing_created_at_error() {
        assert!(parse_runs(r#"{"workflow_runs":[{"id": 1}]}"#).is_err());
    }

    #[test]
    fn parse_jobs_with_durations() {
        let json = r#"{"total_count": 2, "jobs":[
            {
                "id": 10, "name": "build", "status": "completed", "conclusion": "success",
                "started_at": "2024-01-01T00:00:00Z", "completed_at": "2024-01-01T00:05:00Z",
                "steps": []
            },
            {
                "id": 11, "name": "test", "status": "in_progress", "conclusion": null,
                "started_at": "2024-01-01T00:00:00Z", "completed_at": null
            }
        ]}"#;
        let jobs = parse_jobs(json).unwrap();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].job_status(), RunStatus::Success);
        assert_eq!(jobs[0].duration(), Some(Duration::minutes(5)));
        assert_eq!(jobs[1].job_status(), RunStatus::InProgress);
        assert_eq!(jobs[1].duration(), None);
    }

    #[test]
    fn parse_jobs_null_timestamps() {
        let json = r#"{"jobs":[{
            "id": 1, "name": "build", "status": "queued", "conclusion": null,
            "started_at": null, "completed_at": null
        }]}"#;
        let jobs = parse_jobs(json).unwrap();
        assert!(jobs[0].started_at.is_none());
        assert!(jobs[0].completed_at.is_none());
    }

    #[test]
    fn parse_jobs_empty() {
        assert!(parse_jobs(r#"{"jobs":[]}"#).unwrap().is_empty());
    }

    #[test]
    fn parse_jobs_invalid_wrapper_error() {
        assert!(parse_jobs(r#"{"not_jobs": []}"#).is_err());
    }
}
