//! Artifact Generators
//!
//! One function per artifact. Each reads at most one upstream file, writes
//! exactly one destination, and reports what it wrote.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::formats::OutputFormat;
use crate::graph::DependencyGraph;
use crate::hashing::sha256_hex;
use crate::renderer::{LayoutOptions, LayoutRenderer, RenderError};
use crate::templates::DotRenderer;

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Read,
    Write,
    Render,
    Serialize,
}

impl GenerateError {
    pub fn kind(&self) -> FailureKind {
        match self {
            GenerateError::Read { .. } => FailureKind::Read,
            GenerateError::Write { .. } => FailureKind::Write,
            GenerateError::Render(_) => FailureKind::Render,
            GenerateError::Serialize(_) => FailureKind::Serialize,
        }
    }
}

/// A file written by a generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub format: OutputFormat,
    pub path: PathBuf,
    pub bytes: u64,
    pub sha256: String,
}

const HTML_STYLE: &str = r#"<style>
    .edge {
        transition: opacity 0.5s;
        opacity: 0.2;
    }
    .node {
        transition: transform 0.1s;
        transform-origin: center center;
    }
    .node:hover {
        transform: scale(1.03);
    }
    .node:hover + .edge {
        opacity: 1;
    }
</style>"#;

pub async fn generate_description(
    renderer: &DotRenderer,
    graph: &DependencyGraph,
    dest: &Path,
) -> Result<Artifact, GenerateError> {
    let dot = renderer.render(graph);
    let artifact = write_artifact(OutputFormat::Dot, dest, dot.as_bytes()).await?;
    info!(path = %dest.display(), "creating DOT");
    Ok(artifact)
}

pub async fn generate_image(
    layout: &dyn LayoutRenderer,
    options: &LayoutOptions,
    source: &Path,
    dest: &Path,
) -> Result<Artifact, GenerateError> {
    let dot = read_artifact(source).await?;
    let svg = layout.render(&dot, options).await?;
    let artifact = write_artifact(OutputFormat::Svg, dest, &svg).await?;
    info!(path = %dest.display(), renderer = layout.name(), "creating SVG");
    Ok(artifact)
}

pub async fn generate_document(source: &Path, dest: &Path) -> Result<Artifact, GenerateError> {
    let svg = read_artifact_bytes(source).await?;
    let html = wrap_document(&svg);
    let artifact = write_artifact(OutputFormat::Html, dest, &html).await?;
    info!(path = %dest.display(), "creating HTML");
    Ok(artifact)
}

pub async fn generate_data(graph: &DependencyGraph, dest: &Path) -> Result<Artifact, GenerateError> {
    let json = serde_json::to_string_pretty(graph)?;
    let artifact = write_artifact(OutputFormat::Json, dest, json.as_bytes()).await?;
    info!(path = %dest.display(), "creating JSON");
    Ok(artifact)
}

/// Minimal static page around the SVG. The SVG bytes go in verbatim.
pub fn wrap_document(svg: &[u8]) -> Vec<u8> {
    let head = format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>Dependencies</title>\n{HTML_STYLE}\n</head>\n<body>\n"
    );
    let tail = "\n</body>\n</html>\n";

    let mut page = Vec::with_capacity(head.len() + svg.len() + tail.len());
    page.extend_from_slice(head.as_bytes());
    page.extend_from_slice(svg);
    page.extend_from_slice(tail.as_bytes());
    page
}

async fn read_artifact_bytes(path: &Path) -> Result<Vec<u8>, GenerateError> {
    tokio::fs::read(path)
        .await
        .map_err(|source| GenerateError::Read { path: path.to_path_buf(), source })
}

async fn read_artifact(path: &Path) -> Result<String, GenerateError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| GenerateError::Read { path: path.to_path_buf(), source })
}

/// Write `data` to `dest`, creating missing parent directories.
async fn write_artifact(
    format: OutputFormat,
    dest: &Path,
    data: &[u8],
) -> Result<Artifact, GenerateError> {
    let write_error = |source: std::io::Error| GenerateError::Write { path: dest.to_path_buf(), source };

    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_error)?;
    }
    tokio::fs::write(dest, data).await.map_err(write_error)?;

    Ok(Artifact {
        format,
        path: dest.to_path_buf(),
        bytes: data.len() as u64,
        sha256: sha256_hex(data),
    })
}
