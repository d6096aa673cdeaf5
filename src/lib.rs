use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use log::info;
use serde_json::Value;
use walkdir::WalkDir;

use crate::domain::NotebookRecord;
use crate::fs::rel_path_slash;
use crate::notebook::{NOTEBOOK_EXT, extract_frontmatter, read_notebook, resolve_title};
use crate::preview::extract_last_image;
use crate::remote::{RemoteSource, resolve_remote};
use crate::slug::sanitize_link;

pub mod domain;
pub mod fs;
pub mod notebook;
pub mod preview;
pub mod remote;
pub mod slug;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Repository root containing the lecture tree
    #[arg(short, long, default_value = ".")]
    pub root_dir: PathBuf,

    /// Path of the generated catalog file
    #[arg(short, long, default_value = "notebooks.json")]
    pub output: PathBuf,
}

impl Args {
    pub fn into_config(self) -> CatalogConfig {
        CatalogConfig {
            root_dir: self.root_dir,
            output_file: self.output,
            ..CatalogConfig::default()
        }
    }
}

/// Everything the builder needs, passed in explicitly so runs against
/// temporary trees need no global state.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub root_dir: PathBuf,
    /// Folder under the root that holds the lecture notebooks.
    pub notebook_dir: String,
    pub output_file: PathBuf,
    /// Substrings that exclude a whole subtree when they appear anywhere in a
    /// directory's path, not just as its leaf name.
    pub ignore_folders: Vec<String>,
    pub default_org: String,
    pub default_repo: String,
    /// Hub that serves the "open in workspace" git-pull links.
    pub hub_host: String,
    /// Where resized previews are written.
    pub preview_dir: PathBuf,
    /// Prefix the emitted records use to point at those previews.
    pub preview_link_dir: String,
    pub preview_width: u32,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        CatalogConfig {
            root_dir: PathBuf::from("."),
            notebook_dir: "lectures".to_string(),
            output_file: PathBuf::from("notebooks.json"),
            ignore_folders: [
                "venv",
                ".git",
                ".github",
                "_build",
                "dist",
                "9.9_master_asi_conae",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            default_org: "EO-college".to_string(),
            default_repo: "cubes-and-clouds".to_string(),
            hub_host: "workspace.earthcode.eox.at".to_string(),
            preview_dir: PathBuf::from("_build/html/build/_assets/previews"),
            preview_link_dir: "build/_assets/previews".to_string(),
            preview_width: 300,
        }
    }
}

/// Walks the lecture tree, builds one record per notebook, and writes the
/// sorted catalog. Returns the number of records written. A notebook that
/// cannot be parsed at all aborts the run; degraded metadata does not.
pub fn build_catalog(config: &CatalogConfig, remote: &dyn RemoteSource) -> anyhow::Result<usize> {
    let git_url = resolve_remote(remote, &config.root_dir, config).url;

    std::fs::create_dir_all(&config.preview_dir)
        .with_context(|| format!("creating {}", config.preview_dir.display()))?;

    let mut records: Vec<NotebookRecord> = Vec::new();
    let walker = WalkDir::new(config.root_dir.join(&config.notebook_dir))
        .into_iter()
        .filter_entry(|e| !(e.file_type().is_dir() && is_ignored_dir(e.path(), &config.ignore_folders)));
    for entry in walker.filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let is_notebook = entry
            .file_name()
            .to_str()
            .map(|name| name.ends_with(NOTEBOOK_EXT))
            .unwrap_or(false);
        if !is_notebook {
            continue;
        }
        records.push(notebook_record(config, entry.path(), &git_url)?);
    }

    records.sort_by(|a, b| a.title.cmp(&b.title));

    let file = File::create(&config.output_file)
        .with_context(|| format!("creating {}", config.output_file.display()))?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, &records)
        .with_context(|| format!("writing {}", config.output_file.display()))?;

    Ok(records.len())
}

fn is_ignored_dir(path: &Path, ignore_folders: &[String]) -> bool {
    let path = path.to_string_lossy();
    ignore_folders.iter().any(|name| path.contains(name.as_str()))
}

fn notebook_record(config: &CatalogConfig, path: &Path, git_url: &str) -> anyhow::Result<NotebookRecord> {
    info!("Cataloging notebook: {}", path.display());

    let rel_path = rel_path_slash(&config.root_dir, path)?;
    let nb = read_notebook(path)?;
    let meta = extract_frontmatter(&nb, path);

    // An explicit front-matter image skips discovery entirely.
    let image = meta
        .get("image")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .or_else(|| extract_last_image(config, &nb, &rel_path));

    let title = resolve_title(&meta, &nb, path);
    let description = meta
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();
    let stem = rel_path.strip_suffix(NOTEBOOK_EXT).unwrap_or(&rel_path);
    let link = sanitize_link(stem);
    let gitpuller = format!(
        "https://{}/hub/user-redirect/git-pull?repo={}&urlpath=lab/tree/{}/{}&branch=main",
        config.hub_host, git_url, config.default_repo, rel_path
    );

    Ok(NotebookRecord {
        title,
        description,
        metadata: meta,
        image,
        link,
        org: config.default_org.clone(),
        repo: config.default_repo.clone(),
        source: "local".to_string(),
        path: rel_path,
        gitpuller,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ignore_matching_is_a_path_substring_check() {
        let ignored = vec!["dist".to_string(), "_build".to_string()];
        assert!(is_ignored_dir(Path::new("lectures/dist"), &ignored));
        assert!(is_ignored_dir(Path::new("lectures/dist/nested"), &ignored));
        assert!(is_ignored_dir(Path::new("lectures/distros"), &ignored));
        assert!(!is_ignored_dir(Path::new("lectures/3.1_data"), &ignored));
    }
}
