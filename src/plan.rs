//! Format Resolution
//!
//! Each [`Step`] declares the artifact it consumes. Requested formats are
//! expanded through those declarations into a forest in which every step
//! appears once, so chains that share a prefix share the work.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::cleanup::CleanupPlan;
use crate::formats::{FormatSet, OutputFormat};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Description,
    Image,
    Document,
    Data,
}

impl Step {
    pub const ALL: [Step; 4] = [Step::Description, Step::Image, Step::Document, Step::Data];

    /// The step producing `format`, if any is implemented.
    pub fn producing(format: OutputFormat) -> Option<Step> {
        Step::ALL.into_iter().find(|s| s.output() == format)
    }

    pub fn output(self) -> OutputFormat {
        match self {
            Step::Description => OutputFormat::Dot,
            Step::Image => OutputFormat::Svg,
            Step::Document => OutputFormat::Html,
            Step::Data => OutputFormat::Json,
        }
    }

    /// Artifact that must exist on disk before this step runs.
    pub fn input(self) -> Option<OutputFormat> {
        match self {
            Step::Description | Step::Data => None,
            Step::Image => Some(OutputFormat::Dot),
            Step::Document => Some(OutputFormat::Svg),
        }
    }

    pub fn depends_on(self) -> Option<Step> {
        self.input().and_then(Step::producing)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::Description => "description",
            Step::Image => "image",
            Step::Document => "document",
            Step::Data => "data",
        };
        f.write_str(name)
    }
}

/// A scheduled step and the steps waiting on its output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskNode {
    pub step: Step,
    pub dependents: Vec<TaskNode>,
}

impl TaskNode {
    fn collect(&self, out: &mut Vec<Step>) {
        out.push(self.step);
        for dependent in &self.dependents {
            dependent.collect(out);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskGraph {
    roots: Vec<TaskNode>,
}

impl TaskGraph {
    /// Independent branches. Branches may run concurrently.
    pub fn roots(&self) -> &[TaskNode] {
        &self.roots
    }

    /// All scheduled steps, each before its dependents.
    pub fn steps(&self) -> Vec<Step> {
        let mut out = vec![];
        for root in &self.roots {
            root.collect(&mut out);
        }
        out
    }

    pub fn contains(&self, step: Step) -> bool {
        self.steps().contains(&step)
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    fn contains_output(&self, format: OutputFormat) -> bool {
        self.steps().iter().any(|s| s.output() == format)
    }
}

/// Requested format that has no generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unsupported(pub OutputFormat);

/// Resolve requested formats into a task forest and its cleanup plan.
pub fn resolve(requested: &FormatSet) -> Result<(TaskGraph, CleanupPlan), Unsupported> {
    let mut needed = Vec::new();
    for &format in requested {
        let mut next = Some(Step::producing(format).ok_or(Unsupported(format))?);
        while let Some(step) = next {
            if !needed.contains(&step) {
                needed.push(step);
            }
            next = step.depends_on();
        }
    }
    needed.sort();

    let roots = needed
        .iter()
        .filter(|s| s.depends_on().is_none())
        .map(|&root| build_node(root, &needed))
        .collect();
    let graph = TaskGraph { roots };

    let produced_only_for_others =
        |format: OutputFormat| graph.contains_output(format) && !requested.contains(&format);
    let cleanup = CleanupPlan {
        remove_dot_after: produced_only_for_others(OutputFormat::Dot),
        remove_svg_after: produced_only_for_others(OutputFormat::Svg),
    };

    debug!(steps = ?graph.steps(), ?cleanup, "resolved generation plan");
    Ok((graph, cleanup))
}

fn build_node(step: Step, needed: &[Step]) -> TaskNode {
    TaskNode {
        step,
        dependents: needed
            .iter()
            .filter(|s| s.depends_on() == Some(step))
            .map(|&s| build_node(s, needed))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(formats: &[OutputFormat]) -> FormatSet {
        formats.iter().copied().collect()
    }

    /// Every subset of the implemented formats.
    fn all_requests() -> Vec<FormatSet> {
        let formats = [OutputFormat::Dot, OutputFormat::Svg, OutputFormat::Json, OutputFormat::Html];
        (1u8..16)
            .map(|mask| {
                formats
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| mask & (1 << i) != 0)
                    .map(|(_, f)| *f)
                    .collect()
            })
            .collect()
    }

    fn position(steps: &[Step], step: Step) -> usize {
        steps.iter().position(|s| *s == step).unwrap()
    }

    #[test]
    fn test_html_schedules_one_chain_in_order() {
        for request in all_requests().into_iter().filter(|r| r.contains(&OutputFormat::Html)) {
            let (graph, _) = resolve(&request).unwrap();
            let steps = graph.steps();
            assert_eq!(steps.iter().filter(|s| **s == Step::Description).count(), 1);
            assert_eq!(steps.iter().filter(|s| **s == Step::Image).count(), 1);
            assert!(position(&steps, Step::Description) < position(&steps, Step::Image));
            assert!(position(&steps, Step::Image) < position(&steps, Step::Document));
        }
    }

    #[test]
    fn test_svg_without_html_removes_dot_iff_unrequested() {
        for request in all_requests()
            .into_iter()
            .filter(|r| r.contains(&OutputFormat::Svg) && !r.contains(&OutputFormat::Html))
        {
            let (_, cleanup) = resolve(&request).unwrap();
            assert_eq!(cleanup.remove_dot_after, !request.contains(&OutputFormat::Dot));
            assert!(!cleanup.remove_svg_after);
        }
    }

    #[test]
    fn test_no_image_without_svg_or_html() {
        for request in all_requests().into_iter().filter(|r| {
            !r.contains(&OutputFormat::Svg) && !r.contains(&OutputFormat::Html)
        }) {
            let (graph, cleanup) = resolve(&request).unwrap();
            assert!(!graph.contains(Step::Image));
            assert!(!graph.contains(Step::Document));
            assert_eq!(cleanup, CleanupPlan::default());
        }
    }

    #[test]
    fn test_html_cleanup_flags() {
        let (_, cleanup) = resolve(&set(&[OutputFormat::Html])).unwrap();
        assert!(cleanup.remove_dot_after && cleanup.remove_svg_after);

        let (_, cleanup) = resolve(&set(&[OutputFormat::Html, OutputFormat::Dot])).unwrap();
        assert!(!cleanup.remove_dot_after && cleanup.remove_svg_after);

        let (_, cleanup) = resolve(&set(&[OutputFormat::Html, OutputFormat::Svg])).unwrap();
        assert!(cleanup.remove_dot_after && !cleanup.remove_svg_after);
    }

    #[test]
    fn test_json_is_an_independent_branch() {
        let (graph, _) = resolve(&set(&[OutputFormat::Json, OutputFormat::Svg])).unwrap();
        assert_eq!(graph.roots().len(), 2);
        let data = graph.roots().iter().find(|r| r.step == Step::Data).unwrap();
        assert!(data.dependents.is_empty());

        let (graph, cleanup) = resolve(&set(&[OutputFormat::Json])).unwrap();
        assert_eq!(graph.steps(), vec![Step::Data]);
        assert_eq!(cleanup, CleanupPlan::default());
    }

    #[test]
    fn test_svg_and_html_share_prefix() {
        let (graph, _) = resolve(&set(&[OutputFormat::Svg, OutputFormat::Html])).unwrap();
        assert_eq!(
            graph.roots(),
            &[TaskNode {
                step: Step::Description,
                dependents: vec![TaskNode {
                    step: Step::Image,
                    dependents: vec![TaskNode { step: Step::Document, dependents: vec![] }],
                }],
            }]
        );
    }

    #[test]
    fn test_png_unsupported() {
        let err = resolve(&set(&[OutputFormat::Png, OutputFormat::Dot])).unwrap_err();
        assert_eq!(err, Unsupported(OutputFormat::Png));
    }

    #[test]
    fn test_empty_request_schedules_nothing() {
        let (graph, cleanup) = resolve(&FormatSet::new()).unwrap();
        assert!(graph.is_empty());
        assert_eq!(cleanup, CleanupPlan::default());
    }
}
