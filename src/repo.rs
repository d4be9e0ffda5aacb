//! Local git checkout detection.

use crate::model::RepoRef;
use crate::traits::RepoResolver;
use color_eyre::eyre::{eyre, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

pub struct GitRepoResolver;

impl RepoResolver for GitRepoResolver {
    fn is_repo(&self, path: &str) -> bool {
        expand_home(path).join(".git").exists()
    }

    fn resolve(&self, path: &str) -> Result<Option<RepoRef>> {
        let dir = expand_home(path);
        if !dir.join(".git").exists() {
            return Ok(None);
        }
        let output = Command::new("git")
            .arg("-C")
            .arg(&dir)
            .args(["remote", "get-url", "origin"])
            .output()
            .map_err(|e| eyre!("Failed to run git: {e}"))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(eyre!("git remote get-url failed: {}", stderr.trim()));
        }
        let url = String::from_utf8_lossy(&output.stdout);
        let Some((owner, name)) = parse_github_url(url.trim()) else {
            tracing::debug!(url = %url.trim(), "origin is not a GitHub remote");
            return Ok(None);
        };
        let abs = dir.canonicalize().unwrap_or(dir);
        Ok(Some(RepoRef::new(abs.to_string_lossy(), owner, name)))
    }
}

/// Expands a leading `~` to `$HOME`.
pub fn expand_home(path: &str) -> PathBuf {
    let home = || std::env::var_os("HOME").map(PathBuf::from);
    if path == "~" {
        if let Some(h) = home() {
            return h;
        }
    } else if let Some(rest) = path.strip_prefix("~/") {
        if let Some(h) = home() {
            return h.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Extracts `(owner, name)` from an SSH, scp-style or HTTPS GitHub remote URL.
pub fn parse_github_url(url: &str) -> Option<(String, String)> {
    let rest = url
        .strip_prefix("git@github.com:")
        .or_else(|| url.strip_prefix("ssh://git@github.com/"))
        .or_else(|| url.strip_prefix("https://github.com/"))
        .or_else(|| url.strip_prefix("http://github.com/"))?;
    let rest = rest.trim_end_matches('/');
    let rest = rest.strip_suffix(".git").unwrap_or(rest);
    let (owner, name) = rest.split_once('/')?;
    if owner.is_empty() || name.is_empty() || name.contains('/') {
        return None;
    }
    Some((owner.to_string(), name.to_string()))
}

/// Parent directory of `path` as a string, used as the next browse root.
pub fn parent_dir(path: &str) -> Option<String> {
    Path::new(path)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(|p| p.to_string_lossy().into_owned())
}
