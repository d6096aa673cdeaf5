use std::fs;
use std::path::Path;

use anyhow::Context;
use gray_matter::Matter;
use gray_matter::engine::YAML;
use log::warn;
use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value};

pub const NOTEBOOK_EXT: &str = ".ipynb";

/// The subset of the notebook document format the catalog needs: an ordered
/// list of cells, each markdown text or code with outputs. Everything else in
/// the file is ignored.
#[derive(Deserialize, Debug)]
pub struct Notebook {
    #[serde(default)]
    pub cells: Vec<Cell>,
}

#[derive(Deserialize, Debug)]
pub struct Cell {
    pub cell_type: String,
    #[serde(default)]
    pub source: SourceText,
    #[serde(default)]
    pub outputs: Vec<CellOutput>,
}

/// Cell text is stored either as a single string or as a list of lines that
/// already carry their newlines.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub enum SourceText {
    Joined(String),
    Lines(Vec<String>),
}

impl Default for SourceText {
    fn default() -> Self {
        SourceText::Joined(String::new())
    }
}

impl SourceText {
    pub fn text(&self) -> String {
        match self {
            SourceText::Joined(s) => s.clone(),
            SourceText::Lines(lines) => lines.concat(),
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct CellOutput {
    #[serde(default)]
    pub data: Map<String, Value>,
}

pub fn read_notebook(path: &Path) -> anyhow::Result<Notebook> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing notebook {}", path.display()))
}

/// Front-matter lives in the first cell, which must be markdown and must open
/// with a `---` delimiter line. Anything that fails to parse as a YAML mapping
/// degrades to an empty map; the notebook still gets cataloged.
pub fn extract_frontmatter(nb: &Notebook, path: &Path) -> Map<String, Value> {
    let first = match nb.cells.first() {
        Some(cell) if cell.cell_type == "markdown" => cell,
        _ => return Map::new(),
    };
    let source = first.source.text();
    let content = source.trim_start();
    if !content.starts_with("---") {
        return Map::new();
    }

    let matter = Matter::<YAML>::new();
    match matter.parse(content).data {
        Some(data) => match data.deserialize::<Map<String, Value>>() {
            Ok(meta) => meta,
            Err(e) => {
                warn!("Failed to extract frontmatter from {}: {e}", path.display());
                Map::new()
            }
        },
        None => Map::new(),
    }
}

/// Title resolution order: front-matter `title`, then the first level-1
/// markdown heading, then the file stem with underscores as spaces.
pub fn resolve_title(meta: &Map<String, Value>, nb: &Notebook, path: &Path) -> String {
    if let Some(title) = meta.get("title").and_then(Value::as_str) {
        return title.to_string();
    }
    if let Some(heading) = first_heading(nb) {
        return heading;
    }
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("untitled")
        .replace('_', " ")
}

fn first_heading(nb: &Notebook) -> Option<String> {
    let heading = Regex::new(r"^\s*#\s+(.*)").unwrap();
    for cell in &nb.cells {
        if cell.cell_type != "markdown" {
            continue;
        }
        let source = cell.source.text();
        for line in source.lines() {
            if let Some(caps) = heading.captures(line) {
                return Some(caps[1].trim().to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn notebook(value: Value) -> Notebook {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn frontmatter_comes_from_the_first_markdown_cell() {
        let nb = notebook(json!({
            "cells": [{
                "cell_type": "markdown",
                "source": "---\ntitle: Foo\ndescription: A lecture\n---\n# Heading"
            }]
        }));
        let meta = extract_frontmatter(&nb, Path::new("a.ipynb"));
        assert_eq!(meta.get("title").and_then(Value::as_str), Some("Foo"));
        assert_eq!(meta.get("description").and_then(Value::as_str), Some("A lecture"));
    }

    #[test]
    fn frontmatter_requires_a_leading_delimiter() {
        let nb = notebook(json!({
            "cells": [{"cell_type": "markdown", "source": "# Just a heading"}]
        }));
        assert!(extract_frontmatter(&nb, Path::new("a.ipynb")).is_empty());
    }

    #[test]
    fn frontmatter_in_a_code_cell_is_ignored() {
        let nb = notebook(json!({
            "cells": [{"cell_type": "code", "source": "---\ntitle: Foo\n---"}]
        }));
        assert!(extract_frontmatter(&nb, Path::new("a.ipynb")).is_empty());
    }

    #[test]
    fn non_mapping_frontmatter_degrades_to_empty() {
        let nb = notebook(json!({
            "cells": [{"cell_type": "markdown", "source": "---\n- just\n- a list\n---\n"}]
        }));
        assert!(extract_frontmatter(&nb, Path::new("a.ipynb")).is_empty());
    }

    #[test]
    fn source_lines_are_joined_before_parsing() {
        let nb = notebook(json!({
            "cells": [{"cell_type": "markdown", "source": ["---\n", "title: Foo\n", "---\n"]}]
        }));
        let meta = extract_frontmatter(&nb, Path::new("a.ipynb"));
        assert_eq!(meta.get("title").and_then(Value::as_str), Some("Foo"));
    }

    #[test]
    fn title_prefers_frontmatter_over_headings() {
        let nb = notebook(json!({
            "cells": [{"cell_type": "markdown", "source": "# Heading"}]
        }));
        let mut meta = Map::new();
        meta.insert("title".to_string(), Value::String("Foo".to_string()));
        assert_eq!(resolve_title(&meta, &nb, Path::new("a.ipynb")), "Foo");
    }

    #[test]
    fn title_falls_back_to_the_first_level_one_heading() {
        let nb = notebook(json!({
            "cells": [
                {"cell_type": "code", "source": "print(1)"},
                {"cell_type": "markdown", "source": "intro text\n  # Cloud Masking  \nmore"}
            ]
        }));
        assert_eq!(resolve_title(&Map::new(), &nb, Path::new("a.ipynb")), "Cloud Masking");
    }

    #[test]
    fn deeper_headings_are_not_titles() {
        let nb = notebook(json!({
            "cells": [{"cell_type": "markdown", "source": "## Subsection\n# Real Title"}]
        }));
        assert_eq!(resolve_title(&Map::new(), &nb, Path::new("a.ipynb")), "Real Title");
    }

    #[test]
    fn title_falls_back_to_the_file_stem() {
        let nb = notebook(json!({"cells": []}));
        let title = resolve_title(&Map::new(), &nb, Path::new("lectures/my_notebook.ipynb"));
        assert_eq!(title, "my notebook");
    }
}
