//! Layout Renderer - external boundary
//!
//! Contract: valid DOT in, image bytes out; anything else is a [`RenderError`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::Stdio;
use std::str::FromStr;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Layout renderer `{binary}` could not be started: {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Layout renderer rejected the graph description (exit code {code}): {stderr}")]
    Rejected { code: i32, stderr: String },

    #[error("Layout renderer I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Layout renderer produced no output")]
    EmptyOutput,
}

/// Output kind requested from the renderer. Vector only for now.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutFormat {
    #[default]
    Svg,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutEngine {
    #[default]
    Dot,
    Neato,
    Fdp,
    Sfdp,
    Circo,
    Twopi,
}

impl LayoutEngine {
    pub const ALL: [LayoutEngine; 6] = [
        LayoutEngine::Dot,
        LayoutEngine::Neato,
        LayoutEngine::Fdp,
        LayoutEngine::Sfdp,
        LayoutEngine::Circo,
        LayoutEngine::Twopi,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LayoutEngine::Dot => "dot",
            LayoutEngine::Neato => "neato",
            LayoutEngine::Fdp => "fdp",
            LayoutEngine::Sfdp => "sfdp",
            LayoutEngine::Circo => "circo",
            LayoutEngine::Twopi => "twopi",
        }
    }
}

impl fmt::Display for LayoutEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unknown layout engine: {0:?}")]
pub struct UnknownEngine(pub String);

impl FromStr for LayoutEngine {
    type Err = UnknownEngine;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        LayoutEngine::ALL
            .into_iter()
            .find(|e| e.as_str() == lowered)
            .ok_or_else(|| UnknownEngine(s.to_string()))
    }
}

/// `{ format: "svg", engine: "dot" }`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutOptions {
    pub format: LayoutFormat,
    pub engine: LayoutEngine,
}

#[async_trait]
pub trait LayoutRenderer: Send + Sync {
    fn name(&self) -> &str;

    async fn render(&self, dot: &str, options: &LayoutOptions) -> Result<Vec<u8>, RenderError>;
}

/// Renders through the Graphviz command line tool.
#[derive(Debug, Clone)]
pub struct GraphvizCli {
    binary: PathBuf,
}

impl GraphvizCli {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self { binary: binary.into() }
    }
}

impl Default for GraphvizCli {
    fn default() -> Self {
        Self::new("dot")
    }
}

#[async_trait]
impl LayoutRenderer for GraphvizCli {
    fn name(&self) -> &str {
        "graphviz"
    }

    async fn render(&self, dot: &str, options: &LayoutOptions) -> Result<Vec<u8>, RenderError> {
        let format = match options.format {
            LayoutFormat::Svg => "svg",
        };

        let mut child = Command::new(&self.binary)
            .arg(format!("-T{format}"))
            .arg(format!("-K{}", options.engine))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| RenderError::Spawn {
                binary: self.binary.display().to_string(),
                source,
            })?;

        // Feed stdin while draining stdout so large graphs cannot deadlock the pipe.
        let mut stdin = child.stdin.take();
        let feed = async move {
            if let Some(stdin) = stdin.as_mut() {
                stdin.write_all(dot.as_bytes()).await?;
                stdin.shutdown().await?;
            }
            drop(stdin);
            Ok::<(), std::io::Error>(())
        };
        let (fed, output) = tokio::join!(feed, child.wait_with_output());
        let output = output?;

        if !output.status.success() {
            return Err(RenderError::Rejected {
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        // A renderer may exit without reading all of stdin; its output decides.
        match fed {
            Err(e) if e.kind() != ErrorKind::BrokenPipe => return Err(e.into()),
            _ => {}
        }

        if output.stdout.is_empty() {
            return Err(RenderError::EmptyOutput);
        }
        Ok(output.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options_are_svg_with_dot_engine() {
        let options = LayoutOptions::default();
        assert_eq!(options.format, LayoutFormat::Svg);
        assert_eq!(options.engine, LayoutEngine::Dot);
    }

    #[test]
    fn test_engine_parsing() {
        assert_eq!("NEATO".parse::<LayoutEngine>().unwrap(), LayoutEngine::Neato);
        assert!("osage".parse::<LayoutEngine>().is_err());
    }

    #[tokio::test]
    async fn test_missing_binary_is_spawn_error() {
        let renderer = GraphvizCli::new("/nonexistent/graphviz/dot");
        let err = renderer
            .render("digraph { a -> b }", &LayoutOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RenderError::Spawn { .. }));
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_rejected() {
        let renderer = GraphvizCli::new("false");
        let err = renderer
            .render("digraph { a -> b }", &LayoutOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RenderError::Rejected { code: 1, .. }));
    }

    #[tokio::test]
    async fn test_silent_success_is_empty_output() {
        let renderer = GraphvizCli::new("true");
        let err = renderer
            .render("digraph { a -> b }", &LayoutOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RenderError::EmptyOutput));
    }
}
