use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, bail};
use log::warn;

use crate::CatalogConfig;
use crate::domain::RemoteInfo;
use crate::fs::normalize_path;

/// Where the catalog learns the repository's origin URL. Abstracted so the
/// builder runs against checkouts without a configured remote, and so tests
/// need no real repository.
pub trait RemoteSource {
    fn origin_url(&self, repo_root: &Path) -> anyhow::Result<String>;
}

/// Reads the origin remote through the git CLI.
pub struct GitCli;

impl RemoteSource for GitCli {
    fn origin_url(&self, repo_root: &Path) -> anyhow::Result<String> {
        let output = Command::new("git")
            .arg("-C")
            .arg(repo_root)
            .args(["config", "--get", "remote.origin.url"])
            .output()
            .context("running git")?;
        if !output.status.success() {
            bail!(
                "git config failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(String::from_utf8(output.stdout)
            .context("git returned a non-utf8 remote url")?
            .trim()
            .to_string())
    }
}

/// Resolves the org/repo/url triple for catalog links. A failing provider
/// falls back to the configured defaults across all three fields; a remote
/// whose path has no org/repo keeps its url but takes the default
/// identifiers.
pub fn resolve_remote(
    source: &dyn RemoteSource,
    repo_root: &Path,
    config: &CatalogConfig,
) -> RemoteInfo {
    let raw = match source.origin_url(repo_root) {
        Ok(url) => url,
        Err(e) => {
            warn!(
                "Could not get git remote info from {}: {e:#}",
                repo_root.display()
            );
            return RemoteInfo {
                org: config.default_org.clone(),
                repo: config.default_repo.clone(),
                url: format!(
                    "https://github.com/{}/{}",
                    config.default_org, config.default_repo
                ),
            };
        }
    };

    let url = normalize_remote_url(&raw);
    match parse_org_repo(&url) {
        Some((org, repo)) => RemoteInfo { org, repo, url },
        None => {
            warn!("Remote url {url} has no org/repo path, keeping default identifiers");
            RemoteInfo {
                org: config.default_org.clone(),
                repo: config.default_repo.clone(),
                url,
            }
        }
    }
}

/// `git@host:org/repo.git` and `https://host/org/repo.git` both normalize to
/// the https form without the `.git` suffix.
pub fn normalize_remote_url(url: &str) -> String {
    let url = url.strip_suffix(".git").unwrap_or(url);
    if url.starts_with("git@") {
        url.replace(':', "/").replace("git@", "https://")
    } else {
        url.to_string()
    }
}

fn parse_org_repo(url: &str) -> Option<(String, String)> {
    let path = match url.find("://") {
        Some(scheme_end) => {
            let rest = &url[scheme_end + 3..];
            match rest.find('/') {
                Some(host_end) => &rest[host_end..],
                None => "",
            }
        }
        None => url,
    };
    let mut parts = path.trim_matches('/').split('/').filter(|s| !s.is_empty());
    let org = parts.next()?;
    let repo = parts.next()?;
    Some((org.to_string(), repo.to_string()))
}

/// Maps declared submodule checkout paths to their remote info, for
/// cataloging notebook sources beyond the local tree. Entries missing a path
/// or url, or whose url has no org/repo, are dropped.
pub fn parse_gitmodules(repo_root: &Path) -> anyhow::Result<HashMap<PathBuf, RemoteInfo>> {
    let path = repo_root.join(".gitmodules");
    if !path.exists() {
        return Ok(HashMap::new());
    }
    let content = fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;

    let mut entries: Vec<(String, String)> = Vec::new();
    let mut sub_path: Option<String> = None;
    let mut sub_url: Option<String> = None;
    for line in content.lines() {
        let line = line.trim();
        if line.starts_with("[submodule") {
            if let (Some(p), Some(u)) = (sub_path.take(), sub_url.take()) {
                entries.push((p, u));
            }
        } else if let Some((key, value)) = line.split_once('=') {
            match key.trim() {
                "path" => sub_path = Some(value.trim().to_string()),
                "url" => sub_url = Some(value.trim().to_string()),
                _ => {}
            }
        }
    }
    if let (Some(p), Some(u)) = (sub_path, sub_url) {
        entries.push((p, u));
    }

    let mut submodules = HashMap::new();
    for (checkout, raw_url) in entries {
        let url = normalize_remote_url(&raw_url);
        if let Some((org, repo)) = parse_org_repo(&url) {
            submodules.insert(
                normalize_path(Path::new(&checkout)),
                RemoteInfo { org, repo, url },
            );
        }
    }
    Ok(submodules)
}
