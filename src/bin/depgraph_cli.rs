//! Dependency Graph Artifacts CLI
//!
//! Reads a dependency graph JSON file, writes the requested artifacts and
//! prints the generation report as JSON to stdout.
//! Exit codes: 0 success, 1 configuration or input error, 2 step failure.

use clap::{ArgAction, Parser};
use std::path::PathBuf;
use std::process::ExitCode;

use depgraph_artifacts::{
    ArtifactPipeline, ConfigurationError, DependencyGraph, GeneratorConfig, LayoutEngine,
    OutputFormat, PipelineError,
};

#[derive(Parser)]
#[command(name = "depgraph-artifacts-cli")]
#[command(about = "Render a dependency graph to DOT, SVG, HTML and JSON", version)]
struct Cli {
    /// Dependency graph JSON file
    #[arg(short, long)]
    graph: PathBuf,

    /// JSON config file; flags below override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output directory
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Comma separated output formats (dot, svg, json, html)
    #[arg(short, long)]
    formats: Option<String>,

    /// Draw the legend cluster; `--display-legend false` hides it
    #[arg(
        long,
        value_name = "BOOL",
        num_args = 0..=1,
        default_missing_value = "true",
        action = ArgAction::Set
    )]
    display_legend: Option<bool>,

    /// Graphviz color scheme name
    #[arg(long)]
    color_scheme: Option<String>,

    /// Graphviz layout engine
    #[arg(long)]
    layout_engine: Option<String>,

    /// Path to the Graphviz `dot` binary
    #[arg(long)]
    dot_binary: Option<PathBuf>,
}

impl Cli {
    fn resolve_config(&self) -> Result<GeneratorConfig, ConfigurationError> {
        let mut config = match &self.config {
            Some(path) => GeneratorConfig::load(path)?,
            None => GeneratorConfig::default(),
        };
        if let Some(output) = &self.output {
            config.output_directory = output.clone();
        }
        if let Some(formats) = &self.formats {
            config.output_formats = OutputFormat::parse_list(formats)?;
        }
        if let Some(show) = self.display_legend {
            config.display_legend = show;
        }
        if let Some(scheme) = &self.color_scheme {
            config.color_scheme = scheme.clone();
        }
        if let Some(engine) = &self.layout_engine {
            config.layout_engine = engine.parse::<LayoutEngine>()?;
        }
        if let Some(binary) = &self.dot_binary {
            config.dot_binary = binary.clone();
        }
        Ok(config)
    }
}

fn fail(error: impl std::fmt::Display) -> ExitCode {
    let output = serde_json::json!({ "success": false, "error": error.to_string() });
    println!("{}", output);
    ExitCode::FAILURE
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .init();
    }

    let cli = Cli::parse();

    let config = match cli.resolve_config() {
        Ok(c) => c,
        Err(e) => return fail(e),
    };

    let graph = match DependencyGraph::load(&cli.graph) {
        Ok(g) => g,
        Err(e) => return fail(format!("Failed to load graph {}: {}", cli.graph.display(), e)),
    };

    let pipeline = match ArtifactPipeline::with_graphviz(&config) {
        Ok(p) => p,
        Err(e) => return fail(e),
    };

    match pipeline.generate(&graph, &config.output_formats).await {
        Ok(report) => {
            let output = serde_json::json!({ "success": true, "report": report });
            println!("{}", serde_json::to_string_pretty(&output).unwrap_or_default());
            ExitCode::SUCCESS
        }
        Err(PipelineError::StepsFailed { failed, report }) => {
            let output = serde_json::json!({
                "success": false,
                "failed": failed,
                "report": report,
            });
            println!("{}", serde_json::to_string_pretty(&output).unwrap_or_default());
            ExitCode::from(2)
        }
        Err(e) => fail(e),
    }
}
