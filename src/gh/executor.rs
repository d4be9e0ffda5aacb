use crate::model::RepoRef;
use crate::traits::CiExecutor;
use async_trait::async_trait;
use color_eyre::eyre::{eyre, Result};
use std::time::Duration;
use tokio::process::Command;

const GH_TIMEOUT: Duration = Duration::from_secs(30);

/// Talks to the GitHub REST API through the `gh` CLI, which owns authentication.
pub struct GhExecutor;

#[async_trait]
impl CiExecutor for GhExecutor {
    async fn is_tool_installed(&self) -> bool {
        run_gh(&["--version"]).await.is_ok()
    }

    async fn is_authenticated(&self) -> bool {
        match run_gh(&["auth", "status"]).await {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!(error = %e, "gh auth status failed");
                false
            }
        }
    }

    async fn fetch_runs(&self, repo: &RepoRef, limit: usize) -> Result<String> {
        let endpoint = runs_endpoint(repo, limit);
        run_gh(&["api", &endpoint]).await
    }

    async fn fetch_jobs(&self, repo: &RepoRef, run_id: u64) -> Result<String> {
        let endpoint = jobs_endpoint(repo, run_id);
        run_gh(&["api", &endpoint]).await
    }
}

pub fn runs_endpoint(repo: &RepoRef, limit: usize) -> String {
    format!(
        "repos/{}/{}/actions/runs?per_page={limit}",
        repo.owner, repo.name
    )
}

pub fn jobs_endpoint(repo: &RepoRef, run_id: u64) -> String {
    format!("repos/{}/{}/actions/runs/{run_id}/jobs", repo.owner, repo.name)
}

async fn run_gh(args: &[&str]) -> Result<String> {
    let start = std::time::Instant::now();
    let output = tokio::time::timeout(GH_TIMEOUT, Command::new("gh").args(args).output())
        .await
        .map_err(|_| eyre!("gh command timed out after {}s", GH_TIMEOUT.as_secs()))?
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                eyre!("gh CLI not found. Install it from https://cli.github.com/")
            } else {
                eyre!("Failed to run gh: {}", e)
            }
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(eyre!("{}", classify_gh_error(&stderr)));
    }

    tracing::debug!(
        args = ?args,
        elapsed_ms = start.elapsed().as_millis(),
        "gh command completed"
    );
    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

pub fn classify_gh_error(stderr: &str) -> String {
    if stderr.contains("not logged") || stderr.contains("auth login") {
        "Not authenticated with gh. Run `gh auth login` first.".to_string()
    } else if stderr.contains("HTTP 404") || stderr.contains("Not Found") {
        "Repository not found or Actions not enabled".to_string()
    } else if stderr.contains("rate limit") {
        "GitHub API rate limit exceeded".to_string()
    } else {
        let trimmed = stderr.trim();
        if trimmed.is_empty() {
            "gh command failed".to_string()
        } else {
            format!("gh command failed: {trimmed}")
        }
    }
}
