//! Tracked-repository configuration and its JSON-on-disk store.

use crate::model::RepoRef;
use crate::traits::ConfigStore;
use color_eyre::eyre::{eyre, Result, WrapErr};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_NAME: &str = "ghd";
const CONFIG_FILE: &str = "config.json";
const PROFILES_DIR: &str = "profiles";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub repos: Vec<RepoRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_name: Option<String>,
}

impl Config {
    /// Returns `false` when a repo with the same owner/name is already tracked.
    pub fn add_repo(&mut self, repo: RepoRef) -> bool {
        if self.repos.iter().any(|r| r.same_repo(&repo)) {
            return false;
        }
        self.repos.push(repo);
        true
    }

    pub fn remove_repo(&mut self, owner: &str, name: &str) -> bool {
        let before = self.repos.len();
        self.repos.retain(|r| !(r.owner == owner && r.name == name));
        self.repos.len() != before
    }
}

/// `$XDG_CONFIG_HOME/ghd`, falling back to `$HOME/.config/ghd`.
pub fn default_config_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os("XDG_CONFIG_HOME").filter(|d| !d.is_empty()) {
        PathBuf::from(dir).join(APP_NAME)
    } else if let Some(home) = std::env::var_os("HOME") {
        PathBuf::from(home).join(".config").join(APP_NAME)
    } else {
        PathBuf::from(".").join(format!(".{APP_NAME}"))
    }
}

/// Stores `config.json` and `profiles/<name>.json` under one directory.
pub struct FsConfigStore {
    dir: PathBuf,
}

impl FsConfigStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn config_path(&self) -> PathBuf {
        self.dir.join(CONFIG_FILE)
    }

    fn profiles_dir(&self) -> PathBuf {
        self.dir.join(PROFILES_DIR)
    }

    fn profile_path(&self, name: &str) -> PathBuf {
        self.profiles_dir().join(format!("{name}.json"))
    }
}

fn read_config(path: &Path) -> Result<Config> {
    let data = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&data).wrap_err_with(|| format!("Invalid config in {}", path.display()))
}

fn write_config(path: &Path, cfg: &Config) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .wrap_err_with(|| format!("Failed to create {}", parent.display()))?;
    }
    let data = serde_json::to_string_pretty(cfg)?;
    std::fs::write(path, data).wrap_err_with(|| format!("Failed to write {}", path.display()))?;
    tracing::debug!(path = %path.display(), repos = cfg.repos.len(), "config written");
    Ok(())
}

impl ConfigStore for FsConfigStore {
    fn load(&self) -> Result<Config> {
        let path = self.config_path();
        if !path.exists() {
            return Ok(Config::default());
        }
        read_config(&path)
    }

    fn save(&self, cfg: &Config) -> Result<()> {
        write_config(&self.config_path(), cfg)
    }

    fn list_profiles(&self) -> Result<Vec<String>> {
        let dir = self.profiles_dir();
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(eyre!("Failed to list {}: {e}", dir.display())),
        };
        let mut names: Vec<String> = entries
            .filter_map(std::result::Result::ok)
            .filter(|e| e.file_type().is_ok_and(|t| t.is_file()))
            .filter_map(|e| {
                let file_name = e.file_name().into_string().ok()?;
                file_name.strip_suffix(".json").map(str::to_string)
            })
            .collect();
        names.sort();
        Ok(names)
    }

    fn load_profile(&self, name: &str) -> Result<Config> {
        let path = self.profile_path(name);
        if !path.exists() {
            return Err(eyre!("No profile named '{name}'"));
        }
        read_config(&path)
    }

    fn save_profile(&self, name: &str, cfg: &Config) -> Result<()> {
        write_config(&self.profile_path(name), cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn repo(owner: &str, name: &str) -> RepoRef {
        RepoRef::new(format!("/src/{name}"), owner, name)
    }

    #[test]
    fn add_repo_deduplicates_by_owner_and_name() {
        let mut cfg = Config::default();
        assert!(cfg.add_repo(repo("octo", "cat")));
        let mut moved = repo("octo", "cat");
        moved.path = "/elsewhere".into();
        assert!(!cfg.add_repo(moved));
        assert_eq!(cfg.repos.len(), 1);
        assert_eq!(cfg.repos[0].path, "/src/cat");
    }

    #[test]
    fn remove_repo_reports_whether_found() {
        let mut cfg = Config::default();
        cfg.add_repo(repo("octo", "cat"));
        cfg.add_repo(repo("octo", "dog"));
        assert!(cfg.remove_repo("octo", "cat"));
        assert!(!cfg.remove_repo("octo", "cat"));
        assert_eq!(cfg.repos, vec![repo("octo", "dog")]);
    }

    #[test]
    fn profile_name_omitted_when_unset() {
        let json = serde_json::to_string(&Config::default()).unwrap();
        assert_eq!(json, r#"{"repos":[]}"#);
    }

    #[test]
    fn missing_config_loads_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FsConfigStore::new(tmp.path().join("ghd"));
        assert_eq!(store.load().unwrap(), Config::default());
    }

    #[test]
    fn save_then_load_config() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FsConfigStore::new(tmp.path().join("ghd"));
        let mut cfg = Config::default();
        cfg.add_repo(repo("octo", "cat"));
        cfg.profile_name = Some("work".into());
        store.save(&cfg).unwrap();
        assert_eq!(store.load().unwrap(), cfg);
    }

    #[test]
    fn corrupt_config_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join(CONFIG_FILE), "{not json").unwrap();
        let store = FsConfigStore::new(tmp.path().to_path_buf());
        assert!(store.load().is_err());
    }

    #[test]
    fn profiles_listed_sorted_and_filtered() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FsConfigStore::new(tmp.path().to_path_buf());
        assert!(store.list_profiles().unwrap().is_empty());

        store.save_profile("zeta", &Config::default()).unwrap();
        store.save_profile("alpha", &Config::default()).unwrap();
        std::fs::write(tmp.path().join(PROFILES_DIR).join("notes.txt"), "x").unwrap();
        std::fs::create_dir(tmp.path().join(PROFILES_DIR).join("dir.json")).unwrap();

        assert_eq!(store.list_profiles().unwrap(), vec!["alpha", "zeta"]);
    }

    #[test]
    fn load_missing_profile_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FsConfigStore::new(tmp.path().to_path_buf());
        let err = store.load_profile("nope").unwrap_err();
        assert!(err.to_string().contains("nope"));
    }
}
