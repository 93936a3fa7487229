//! Dependency Graph Artifacts - Multi-Format Output Pipeline
//!
//! # Output Chain
//! 1. DOT is rendered from the graph through the template
//! 2. SVG is laid out from the DOT file
//! 3. HTML wraps the SVG file
//! 4. JSON is the graph itself, independent of the chain
//!
//! Intermediates nobody asked for are removed once every step has settled.

pub mod formats;
pub mod graph;
pub mod config;
pub mod templates;
pub mod renderer;
pub mod generators;
pub mod plan;
pub mod cleanup;
pub mod hashing;
pub mod pipeline;

pub use formats::{OutputFormat, FormatSet, OutputPaths, ARTIFACT_BASENAME};
pub use graph::DependencyGraph;
pub use config::{GeneratorConfig, ConfigurationError};
pub use templates::{RenderOptions, DotStyle, DotRenderer, preprocess};
pub use renderer::{LayoutRenderer, LayoutOptions, LayoutEngine, GraphvizCli, RenderError};
pub use generators::{Artifact, GenerateError, FailureKind};
pub use plan::{Step, TaskGraph, TaskNode, resolve};
pub use cleanup::{CleanupPlan, CleanupReport, cleanup};
pub use pipeline::{ArtifactPipeline, GenerationReport, StepReport, StepStatus, PipelineError};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
