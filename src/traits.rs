use crate::config::Config;
use crate::model::RepoRef;
use async_trait::async_trait;
use color_eyre::eyre::Result;

/// Remote CI queries. Implementations return the raw JSON body; decoding lives in `gh::parser`.
#[async_trait]
pub trait CiExecutor: Send + Sync {
    async fn is_tool_installed(&self) -> bool;
    async fn is_authenticated(&self) -> bool;
    async fn fetch_runs(&self, repo: &RepoRef, limit: usize) -> Result<String>;
    async fn fetch_jobs(&self, repo: &RepoRef, run_id: u64) -> Result<String>;
}

/// Turns a local directory into a tracked repository.
pub trait RepoResolver {
    fn is_repo(&self, path: &str) -> bool;
    /// `Ok(None)` when `path` is not a GitHub-backed git checkout.
    fn resolve(&self, path: &str) -> Result<Option<RepoRef>>;
}

/// Persisted configuration and named profiles.
pub trait ConfigStore {
    fn load(&self) -> Result<Config>;
    fn save(&self, cfg: &Config) -> Result<()>;
    fn list_profiles(&self) -> Result<Vec<String>>;
    fn load_profile(&self, name: &str) -> Result<Config>;
    fn save_profile(&self, name: &str, cfg: &Config) -> Result<()>;
}
