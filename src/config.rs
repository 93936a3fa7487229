//! Generator Configuration
//!
//! Resolved and validated once, before any artifact is touched.

use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::formats::{FormatSet, OutputFormat, OutputPaths, UnknownFormat};
use crate::renderer::{LayoutEngine, LayoutOptions, UnknownEngine};
use crate::templates::{DotStyle, RenderOptions};

pub const DEFAULT_OUTPUT_DIRECTORY: &str = "./dependency-graph";
pub const DEFAULT_COLOR_SCHEME: &str = "set312";

#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Option \"output\" has been provided but it is not a valid directory name")]
    EmptyOutputDirectory,

    #[error("Output path {} exists and is not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("Invalid color scheme: {0:?}")]
    InvalidColorScheme(String),

    #[error("Invalid node shape for {field}: {value:?}")]
    InvalidShape { field: &'static str, value: String },

    #[error("Palette size must be at least 1")]
    EmptyPalette,

    #[error("No output formats requested")]
    NoOutputFormats,

    #[error(transparent)]
    UnknownFormat(#[from] UnknownFormat),

    #[error(transparent)]
    UnknownEngine(#[from] UnknownEngine),

    #[error("Failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratorConfig {
    #[serde(default = "default_output_directory")]
    pub output_directory: PathBuf,
    #[serde(default, deserialize_with = "bool_or_string")]
    pub display_legend: bool,
    #[serde(default = "default_color_scheme")]
    pub color_scheme: String,
    #[serde(default = "default_output_formats")]
    pub output_formats: FormatSet,
    #[serde(default)]
    pub style: DotStyle,
    #[serde(default)]
    pub layout_engine: LayoutEngine,
    #[serde(default = "default_dot_binary")]
    pub dot_binary: PathBuf,
}

fn default_output_directory() -> PathBuf { PathBuf::from(DEFAULT_OUTPUT_DIRECTORY) }
fn default_color_scheme() -> String { DEFAULT_COLOR_SCHEME.to_string() }
fn default_dot_binary() -> PathBuf { PathBuf::from("dot") }

fn default_output_formats() -> FormatSet {
    [OutputFormat::Html, OutputFormat::Json].into_iter().collect()
}

/// `true`, `false`, `"true"` and `"false"` are all accepted.
fn bool_or_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => Ok(b),
        Flag::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(true),
            "false" | "" => Ok(false),
            other => Err(serde::de::Error::custom(format!("expected a boolean, got {other:?}"))),
        },
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            output_directory: default_output_directory(),
            display_legend: false,
            color_scheme: default_color_scheme(),
            output_formats: default_output_formats(),
            style: DotStyle::default(),
            layout_engine: LayoutEngine::default(),
            dot_binary: default_dot_binary(),
        }
    }
}

impl GeneratorConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigurationError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigurationError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigurationError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.output_directory.as_os_str().is_empty() {
            return Err(ConfigurationError::EmptyOutputDirectory);
        }
        if self.output_directory.exists() && !self.output_directory.is_dir() {
            return Err(ConfigurationError::NotADirectory(self.output_directory.clone()));
        }
        if !is_graphviz_name(&self.color_scheme) {
            return Err(ConfigurationError::InvalidColorScheme(self.color_scheme.clone()));
        }
        for (field, value) in [
            ("moduleShape", &self.style.module_shape),
            ("providerShape", &self.style.provider_shape),
            ("directiveShape", &self.style.directive_shape),
        ] {
            if !is_graphviz_name(value) {
                return Err(ConfigurationError::InvalidShape { field, value: value.clone() });
            }
        }
        if self.style.palette_size == 0 {
            return Err(ConfigurationError::EmptyPalette);
        }
        Ok(())
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            display_legend: self.display_legend,
            color_scheme: self.color_scheme.clone(),
            style: self.style.clone(),
        }
    }

    pub fn layout_options(&self) -> LayoutOptions {
        LayoutOptions {
            engine: self.layout_engine,
            ..LayoutOptions::default()
        }
    }

    pub fn output_paths(&self) -> OutputPaths {
        OutputPaths::new(&self.output_directory)
    }
}

/// Scheme and shape names end up inside quoted DOT attributes.
fn is_graphviz_name(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '/')
}
