//! Artifact Pipeline - Single Entry Point
//!
//! Resolve the plan, run every branch to completion, then clean up.
//! A failed step skips its dependents but never its siblings.

use chrono::{DateTime, Utc};
use futures::future::{join_all, BoxFuture, FutureExt};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::cleanup::{cleanup, CleanupReport};
use crate::config::{ConfigurationError, GeneratorConfig};
use crate::formats::{FormatSet, OutputFormat, OutputPaths};
use crate::generators::{self, Artifact, FailureKind, GenerateError};
use crate::graph::DependencyGraph;
use crate::plan::{resolve, Step, TaskGraph, TaskNode, Unsupported};
use crate::renderer::{GraphvizCli, LayoutOptions, LayoutRenderer};
use crate::templates::{preprocess, DotRenderer, RenderOptions};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(OutputFormat),

    #[error("{failed} generation step(s) failed")]
    StepsFailed {
        failed: usize,
        report: Box<GenerationReport>,
    },
}

impl From<Unsupported> for PipelineError {
    fn from(Unsupported(format): Unsupported) -> Self {
        PipelineError::UnsupportedFormat(format)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Succeeded,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepFailure {
    pub kind: FailureKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
    pub step: Step,
    pub status: StepStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<Artifact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<StepFailure>,
    /// Upstream step whose failure prevented this one from running.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocked_by: Option<Step>,
}

impl StepReport {
    fn succeeded(step: Step, artifact: Artifact) -> Self {
        Self { step, status: StepStatus::Succeeded, artifact: Some(artifact), failure: None, blocked_by: None }
    }

    fn failed(step: Step, err: &GenerateError) -> Self {
        let failure = StepFailure { kind: err.kind(), message: err.to_string() };
        Self { step, status: StepStatus::Failed, artifact: None, failure: Some(failure), blocked_by: None }
    }

    fn skipped(step: Step, blocked_by: Step) -> Self {
        Self { step, status: StepStatus::Skipped, artifact: None, failure: None, blocked_by: Some(blocked_by) }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationReport {
    pub run_id: Uuid,
    pub engine_version: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub requested: FormatSet,
    pub steps: Vec<StepReport>,
    pub cleanup: CleanupReport,
}

impl GenerationReport {
    pub fn step(&self, step: Step) -> Option<&StepReport> {
        self.steps.iter().find(|s| s.step == step)
    }

    pub fn failures(&self) -> Vec<&StepReport> {
        self.steps.iter().filter(|s| s.status == StepStatus::Failed).collect()
    }

    pub fn is_success(&self) -> bool {
        self.failures().is_empty()
    }

    /// Artifacts the caller asked for that were produced.
    pub fn outputs(&self) -> Vec<&Artifact> {
        self.steps
            .iter()
            .filter_map(|s| s.artifact.as_ref())
            .filter(|a| self.requested.contains(&a.format))
            .collect()
    }
}

/// Per-run state shared by every step. Dropped when the run ends.
struct RunContext<'a> {
    graph: &'a DependencyGraph,
    template: DotRenderer,
}

/// The artifact pipeline - single entry point for all generation runs
pub struct ArtifactPipeline {
    paths: OutputPaths,
    render_options: RenderOptions,
    layout_options: LayoutOptions,
    layout: Box<dyn LayoutRenderer>,
}

impl std::fmt::Debug for ArtifactPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactPipeline")
            .field("paths", &self.paths)
            .field("render_options", &self.render_options)
            .field("layout_options", &self.layout_options)
            .field("layout", &self.layout.name())
            .finish()
    }
}

impl ArtifactPipeline {
    /// Validate `config` and build a pipeline around `layout`.
    pub fn new(config: &GeneratorConfig, layout: Box<dyn LayoutRenderer>) -> Result<Self, ConfigurationError> {
        config.validate()?;
        Ok(Self {
            paths: config.output_paths(),
            render_options: config.render_options(),
            layout_options: config.layout_options(),
            layout,
        })
    }

    /// Pipeline using the Graphviz binary named in `config`.
    pub fn with_graphviz(config: &GeneratorConfig) -> Result<Self, ConfigurationError> {
        Self::new(config, Box::new(GraphvizCli::new(&config.dot_binary)))
    }

    pub fn paths(&self) -> &OutputPaths {
        &self.paths
    }

    /// Generate every requested artifact.
    ///
    /// Returns [`PipelineError::StepsFailed`] with the full report when any
    /// step failed; artifacts from healthy branches are still on disk.
    pub async fn generate(
        &self,
        graph: &DependencyGraph,
        requested: &FormatSet,
    ) -> Result<GenerationReport, PipelineError> {
        if requested.is_empty() {
            return Err(ConfigurationError::NoOutputFormats.into());
        }
        let (tasks, cleanup_plan) = resolve(requested)?;

        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!(%run_id, formats = ?requested, "generating dependency graph artifacts");

        let ctx = RunContext {
            graph,
            template: preprocess(&self.render_options),
        };
        let steps = self.run(&tasks, &ctx).await;
        let cleanup = cleanup(cleanup_plan, &self.paths).await;

        let report = GenerationReport {
            run_id,
            engine_version: crate::ENGINE_VERSION.to_string(),
            started_at,
            finished_at: Utc::now(),
            requested: requested.clone(),
            steps,
            cleanup,
        };

        let failed = report.failures().len();
        if failed > 0 {
            warn!(%run_id, failed, "generation finished with failures");
            return Err(PipelineError::StepsFailed { failed, report: Box::new(report) });
        }
        info!(%run_id, outputs = report.outputs().len(), "generation finished");
        Ok(report)
    }

    async fn run(&self, tasks: &TaskGraph, ctx: &RunContext<'_>) -> Vec<StepReport> {
        let branches = tasks.roots().iter().map(|root| self.run_node(root, ctx));
        join_all(branches).await.into_iter().flatten().collect()
    }

    fn run_node<'a>(&'a self, node: &'a TaskNode, ctx: &'a RunContext<'a>) -> BoxFuture<'a, Vec<StepReport>> {
        async move {
            match self.run_step(node.step, ctx).await {
                Ok(artifact) => {
                    let mut reports = vec![StepReport::succeeded(node.step, artifact)];
                    let dependents = node.dependents.iter().map(|d| self.run_node(d, ctx));
                    reports.extend(join_all(dependents).await.into_iter().flatten());
                    reports
                }
                Err(err) => {
                    error!(step = %node.step, error = %err, "generation step failed");
                    let mut reports = vec![StepReport::failed(node.step, &err)];
                    skip_dependents(node, node.step, &mut reports);
                    reports
                }
            }
        }
        .boxed()
    }

    async fn run_step(&self, step: Step, ctx: &RunContext<'_>) -> Result<Artifact, GenerateError> {
        let dest = self.paths.get(step.output());
        match step {
            Step::Description => generators::generate_description(&ctx.template, ctx.graph, dest).await,
            Step::Image => {
                generators::generate_image(self.layout.as_ref(), &self.layout_options, self.paths.dot(), dest).await
            }
            Step::Document => generators::generate_document(self.paths.svg(), dest).await,
            Step::Data => generators::generate_data(ctx.graph, dest).await,
        }
    }
}

fn skip_dependents(node: &TaskNode, blocked_by: Step, reports: &mut Vec<StepReport>) {
    for dependent in &node.dependents {
        reports.push(StepReport::skipped(dependent.step, blocked_by));
        skip_dependents(dependent, blocked_by, reports);
    }
}
