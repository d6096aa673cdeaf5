use std::path::Path;

use anyhow::Context;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use log::{info, warn};
use regex::Regex;
use serde_json::Value;

use crate::CatalogConfig;
use crate::fs::normalize_path;
use crate::notebook::{NOTEBOOK_EXT, Notebook};

/// Finds a preview for a notebook: images referenced from markdown cells
/// first, embedded code-output PNGs second. The winning image is resized to
/// the configured width and written under the preview directory; the returned
/// link is the catalog-relative path of that copy.
pub fn extract_last_image(config: &CatalogConfig, nb: &Notebook, rel_path: &str) -> Option<String> {
    if let Some(link) = markdown_preview(config, nb, rel_path) {
        return Some(link);
    }
    output_preview(config, nb, rel_path)
}

/// Phase 1: the last image referenced across all markdown cells, in document
/// order. Failures fall through to the code-output phase.
fn markdown_preview(config: &CatalogConfig, nb: &Notebook, rel_path: &str) -> Option<String> {
    let inline = Regex::new(r"!\[.*?\]\((.*?)\)").unwrap();
    let figure = Regex::new(r":::\{figure\}\s+(.*?)\s*$").unwrap();

    let mut found = Vec::new();
    for cell in &nb.cells {
        if cell.cell_type != "markdown" {
            continue;
        }
        let source = cell.source.text();
        for line in source.lines() {
            for caps in inline.captures_iter(line) {
                found.push(caps[1].to_string());
            }
            if let Some(caps) = figure.captures(line) {
                found.push(caps[1].to_string());
            }
        }
    }

    let last = found.last()?.trim().to_string();
    let notebook_dir = Path::new(rel_path).parent().unwrap_or_else(|| Path::new(""));
    let image_path = normalize_path(&config.root_dir.join(notebook_dir).join(&last));
    info!("Found image: {}", image_path.display());
    if !image_path.exists() {
        return None;
    }

    let img = match image::open(&image_path) {
        Ok(img) => img,
        Err(e) => {
            warn!("Couldn't load markdown image for {rel_path}: {e}");
            return None;
        }
    };
    match save_preview(config, &img, rel_path) {
        Ok(link) => Some(link),
        Err(e) => {
            warn!("Couldn't resize markdown image for {rel_path}: {e:#}");
            None
        }
    }
}

/// Phase 2: code cells in reverse document order, outputs in reverse order,
/// first PNG payload wins. A payload that fails to decode ends the search for
/// this notebook instead of falling back to earlier outputs.
fn output_preview(config: &CatalogConfig, nb: &Notebook, rel_path: &str) -> Option<String> {
    for cell in nb.cells.iter().rev() {
        if cell.cell_type != "code" {
            continue;
        }
        for output in cell.outputs.iter().rev() {
            let value = match output.data.get("image/png") {
                Some(value) => value,
                None => continue,
            };
            let bytes = match STANDARD.decode(png_payload(value)) {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!("Failed to process image in {rel_path}: {e}");
                    return None;
                }
            };
            let img = match image::load_from_memory(&bytes) {
                Ok(img) => img,
                Err(e) => {
                    warn!("Failed to process image in {rel_path}: {e}");
                    return None;
                }
            };
            return match save_preview(config, &img, rel_path) {
                Ok(link) => Some(link),
                Err(e) => {
                    warn!("Failed to process image in {rel_path}: {e:#}");
                    None
                }
            };
        }
    }
    None
}

/// PNG payloads appear either as one base64 string or as a list of chunks;
/// embedded newlines are not part of the encoding.
fn png_payload(value: &Value) -> String {
    let joined: String = match value {
        Value::String(s) => s.clone(),
        Value::Array(parts) => parts.iter().filter_map(Value::as_str).collect(),
        _ => String::new(),
    };
    joined.chars().filter(|c| !c.is_whitespace()).collect()
}

fn save_preview(config: &CatalogConfig, img: &DynamicImage, rel_path: &str) -> anyhow::Result<String> {
    let w_percent = config.preview_width as f32 / img.width() as f32;
    let height = (img.height() as f32 * w_percent) as u32;
    let resized = img.resize_exact(config.preview_width, height, FilterType::Lanczos3);

    let name = preview_name(rel_path);
    let out_path = config.preview_dir.join(&name);
    resized
        .save(&out_path)
        .with_context(|| format!("saving {}", out_path.display()))?;
    Ok(format!("{}/{}", config.preview_link_dir, name))
}

fn preview_name(rel_path: &str) -> String {
    rel_path.replace('/', "_").replace(NOTEBOOK_EXT, "_preview.png")
}
