//! Output Formats and Destination Paths

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Fixed basename shared by every artifact.
pub const ARTIFACT_BASENAME: &str = "dependencies";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Dot,
    Svg,
    Json,
    Html,
    /// Reserved. Never produced.
    Png,
}

/// Requested formats. Order and duplicates are irrelevant.
pub type FormatSet = BTreeSet<OutputFormat>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unknown output format: {0:?} (expected one of dot, svg, json, html, png)")]
pub struct UnknownFormat(pub String);

impl OutputFormat {
    pub const ALL: [OutputFormat; 5] = [
        OutputFormat::Dot,
        OutputFormat::Svg,
        OutputFormat::Json,
        OutputFormat::Html,
        OutputFormat::Png,
    ];

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Dot => "dot",
            OutputFormat::Svg => "svg",
            OutputFormat::Json => "json",
            OutputFormat::Html => "html",
            OutputFormat::Png => "png",
        }
    }

    /// Parse a comma separated list such as `"html, json"`.
    pub fn parse_list(list: &str) -> Result<FormatSet, UnknownFormat> {
        list.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::parse)
            .collect()
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        OutputFormat::ALL
            .into_iter()
            .find(|f| f.extension() == lowered)
            .ok_or_else(|| UnknownFormat(s.to_string()))
    }
}

/// One destination per artifact, fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    dot: PathBuf,
    json: PathBuf,
    svg: PathBuf,
    png: PathBuf,
    html: PathBuf,
}

impl OutputPaths {
    pub fn new(output_directory: impl AsRef<Path>) -> Self {
        let dir = output_directory.as_ref();
        let at = |format: OutputFormat| {
            dir.join(format!("{}.{}", ARTIFACT_BASENAME, format.extension()))
        };
        Self {
            dot: at(OutputFormat::Dot),
            json: at(OutputFormat::Json),
            svg: at(OutputFormat::Svg),
            png: at(OutputFormat::Png),
            html: at(OutputFormat::Html),
        }
    }

    pub fn get(&self, format: OutputFormat) -> &Path {
        match format {
            OutputFormat::Dot => &self.dot,
            OutputFormat::Svg => &self.svg,
            OutputFormat::Json => &self.json,
            OutputFormat::Html => &self.html,
            OutputFormat::Png => &self.png,
        }
    }

    pub fn dot(&self) -> &Path { &self.dot }
    pub fn svg(&self) -> &Path { &self.svg }
    pub fn json(&self) -> &Path { &self.json }
    pub fn html(&self) -> &Path { &self.html }
    pub fn png(&self) -> &Path { &self.png }
}
