//! One-shot fetches started on the dashboard's behalf.
//!
//! Each fetch reports exactly one result event carrying the correlation data it
//! was started with. Failures travel as strings so the card can render them.
//! There is no retry here; the next refresh tries again.

use crate::dashboard::Request;
use crate::events::AppEvent;
use crate::gh::parser;
use crate::model::RepoRef;
use crate::traits::CiExecutor;
use tokio::sync::mpsc;

pub async fn fetch_runs_for_card(
    executor: &dyn CiExecutor,
    index: usize,
    repo: &RepoRef,
    limit: usize,
    tx: &mpsc::UnboundedSender<AppEvent>,
) {
    let result = match executor.fetch_runs(repo, limit).await {
        Ok(json) => parser::parse_runs(&json).map_err(|e| format!("{e}")),
        Err(e) => Err(format!("{e}")),
    };
    if let Err(e) = &result {
        tracing::debug!(repo = %repo.key(), error = %e, "run fetch failed");
    }
    let event = AppEvent::RunsResult {
        index,
        repo_key: repo.key(),
        result,
    };
    if tx.send(event).is_err() {
        tracing::warn!("fetch_runs: channel closed");
    }
}

pub async fn fetch_jobs_for_card(
    executor: &dyn CiExecutor,
    index: usize,
    repo: &RepoRef,
    run_id: u64,
    tx: &mpsc::UnboundedSender<AppEvent>,
) {
    let result = match executor.fetch_jobs(repo, run_id).await {
        Ok(json) => parser::parse_jobs(&json).map_err(|e| format!("Job parse error: {e}")),
        Err(e) => Err(format!("{e}")),
    };
    if tx.send(AppEvent::JobsResult { index, run_id, result }).is_err() {
        tracing::warn!("fetch_jobs: channel closed");
    }
}

/// Runs one dashboard request to completion.
pub async fn perform(
    executor: &dyn CiExecutor,
    request: Request,
    tx: &mpsc::UnboundedSender<AppEvent>,
) {
    match request {
        Request::FetchRuns { index, repo, limit } => {
            fetch_runs_for_card(executor, index, &repo, limit, tx).await;
        }
        Request::FetchJobs { index, repo, run_id } => {
            fetch_jobs_for_card(executor, index, &repo, run_id, tx).await;
        }
    }
}
