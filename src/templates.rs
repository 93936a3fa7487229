//! DOT Template - Placeholder Preprocessing
//!
//! Global placeholders (legend, color scheme, node shapes) are filled once per
//! run by [`preprocess`]. The resulting [`DotRenderer`] maps a graph to DOT.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Write;

use crate::graph::DependencyGraph;

const LEGEND_SLOT: &str = "###legend###";
const SCHEME_SLOT: &str = "###scheme###";
const MODULE_SHAPE_SLOT: &str = "###moduleShape###";
const PROVIDER_SHAPE_SLOT: &str = "###providerShape###";
const DIRECTIVE_SHAPE_SLOT: &str = "###directiveShape###";
const MODULES_SLOT: &str = "###modules###";

pub const DOT_TEMPLATE: &str = r####"digraph dependencies {
  node [shape="rect", style="filled", colorscheme="###scheme###", fontname="sans-serif", fontsize=10];
  edge [arrowsize=0.6];
  compound=true;
  remincross=true;
  splines=ortho;
  rankdir=LR;
  ranksep=0.4;
  nodesep=0.3;
###legend###
###modules###
}
"####;

pub const LEGEND: &str = r####"  subgraph "cluster_legend" {
    label="Legend";
    fontsize=10;
    style="dashed";
    "Module" [shape="###moduleShape###", fillcolor=1];
    "Declarations" [shape="###directiveShape###", fillcolor=2];
    "Providers" [shape="###providerShape###", fillcolor=3];
    "Exports" [shape="rect", fillcolor=4];
    "Bootstrap" [shape="rect", fillcolor=5];
  }"####;

/// Node shapes and palette. Values are Graphviz names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DotStyle {
    #[serde(default = "default_module_shape")]
    pub module_shape: String,
    #[serde(default = "default_provider_shape")]
    pub provider_shape: String,
    #[serde(default = "default_directive_shape")]
    pub directive_shape: String,
    /// Number of colors cycled through the color scheme.
    #[serde(default = "default_palette_size")]
    pub palette_size: usize,
}

fn default_module_shape() -> String { "component".to_string() }
fn default_provider_shape() -> String { "ellipse".to_string() }
fn default_directive_shape() -> String { "cds".to_string() }
fn default_palette_size() -> usize { 12 }

impl Default for DotStyle {
    fn default() -> Self {
        Self {
            module_shape: default_module_shape(),
            provider_shape: default_provider_shape(),
            directive_shape: default_directive_shape(),
            palette_size: default_palette_size(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    pub display_legend: bool,
    pub color_scheme: String,
    pub style: DotStyle,
}

/// Compiled template: global placeholders already substituted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DotRenderer {
    head: String,
    tail: String,
    style: DotStyle,
}

/// Fill the global placeholders of [`DOT_TEMPLATE`].
///
/// The legend goes in first so its own scheme and shape placeholders are
/// resolved by the passes that follow.
pub fn preprocess(options: &RenderOptions) -> DotRenderer {
    let legend = if options.display_legend { LEGEND } else { "" };
    let filled = DOT_TEMPLATE
        .replace(LEGEND_SLOT, legend)
        .replace(SCHEME_SLOT, &options.color_scheme)
        .replace(MODULE_SHAPE_SLOT, &options.style.module_shape)
        .replace(PROVIDER_SHAPE_SLOT, &options.style.provider_shape)
        .replace(DIRECTIVE_SHAPE_SLOT, &options.style.directive_shape);

    let (head, tail) = match filled.split_once(MODULES_SLOT) {
        Some((head, tail)) => (head.to_string(), tail.to_string()),
        None => (filled, String::new()),
    };

    DotRenderer {
        head,
        tail,
        style: options.style.clone(),
    }
}

impl DotRenderer {
    pub fn render(&self, graph: &DependencyGraph) -> String {
        let mut out = String::with_capacity(self.head.len() + self.tail.len());
        out.push_str(&self.head);
        for (index, module) in modules(graph.as_value()).iter().enumerate() {
            self.render_module(&mut out, index, module);
        }
        out.push_str(&self.tail);
        out
    }

    fn render_module(&self, out: &mut String, index: usize, module: &Module<'_>) {
        let name = quote(module.name);
        let color = index % self.style.palette_size.max(1) + 1;

        let _ = writeln!(out, "  subgraph \"cluster_{}\" {{", escape(module.name));
        let _ = writeln!(out, "    label=\"\";");
        let _ = writeln!(out, "    style=\"dotted\";");
        let _ = writeln!(out, "    node [fillcolor={color}];");
        let _ = writeln!(out, "    {name} [shape=\"{}\"];", self.style.module_shape);

        for declaration in module.edges("declarations") {
            let declaration = quote(declaration);
            let _ = writeln!(out, "    {declaration} [shape=\"{}\"];", self.style.directive_shape);
            let _ = writeln!(out, "    {declaration} -> {name} [style=\"solid\"];");
        }
        for provider in module.edges("providers") {
            let provider = quote(provider);
            let _ = writeln!(out, "    {provider} [shape=\"{}\"];", self.style.provider_shape);
            let _ = writeln!(out, "    {provider} -> {name} [style=\"dashed\"];");
        }
        for export in module.edges("exports") {
            let _ = writeln!(out, "    {name} -> {} [style=\"dotted\"];", quote(export));
        }
        for bootstrap in module.edges("bootstrap") {
            let _ = writeln!(out, "    {name} -> {} [style=\"bold\"];", quote(bootstrap));
        }
        let _ = writeln!(out, "  }}");

        for import in module.edges("imports") {
            let _ = writeln!(out, "  {} -> {name};", quote(import));
        }
    }
}

struct Module<'a> {
    name: &'a str,
    meta: &'a Value,
}

impl<'a> Module<'a> {
    fn edges(&self, kind: &str) -> Vec<&'a str> {
        self.meta
            .get(kind)
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(entry_name).collect())
            .unwrap_or_default()
    }
}

/// Accepts `{ "AppModule": {...} }` or `[{ "name": "AppModule", ... }]`.
fn modules(value: &Value) -> Vec<Module<'_>> {
    match value {
        Value::Object(map) => map
            .iter()
            .map(|(id, meta)| Module {
                name: meta.get("name").and_then(Value::as_str).unwrap_or(id.as_str()),
                meta,
            })
            .collect(),
        Value::Array(items) => items
            .iter()
            .filter_map(|meta| entry_name(meta).map(|name| Module { name, meta }))
            .collect(),
        _ => vec![],
    }
}

fn entry_name(value: &Value) -> Option<&str> {
    match value {
        Value::String(s) => Some(s),
        other => other.get("name").and_then(Value::as_str),
    }
}

fn escape(id: &str) -> String {
    id.replace('\\', "\\\\").replace('"', "\\\"")
}

fn quote(id: &str) -> String {
    format!("\"{}\"", escape(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn options(display_legend: bool, scheme: &str) -> RenderOptions {
        RenderOptions {
            display_legend,
            color_scheme: scheme.to_string(),
            style: DotStyle::default(),
        }
    }

    fn sample_graph() -> DependencyGraph {
        DependencyGraph::new(json!([
            {
                "name": "AppModule",
                "declarations": [{ "name": "AppComponent" }],
                "providers": ["AuthService"],
                "imports": [{ "name": "SharedModule" }],
                "exports": [],
                "bootstrap": [{ "name": "AppComponent" }]
            },
            { "name": "SharedModule", "exports": ["ButtonComponent"] }
        ]))
    }

    #[test]
    fn test_legend_toggled() {
        let graph = DependencyGraph::new(json!({}));
        let with = preprocess(&options(true, "set312")).render(&graph);
        let without = preprocess(&options(false, "set312")).render(&graph);
        assert!(with.contains("cluster_legend"));
        assert!(with.contains(r#""Module" [shape="component", fillcolor=1];"#));
        assert!(!without.contains("cluster_legend"));
    }

    #[test]
    fn test_scheme_substituted_and_no_placeholder_left() {
        let out = preprocess(&options(true, "pastel19")).render(&sample_graph());
        assert!(out.contains(r#"colorscheme="pastel19""#));
        assert!(!out.contains("###"));
        assert!(out.starts_with("digraph dependencies {"));
        assert!(out.trim_end().ends_with('}'));
    }

    #[test]
    fn test_preprocess_is_pure() {
        let opts = options(false, "set312");
        let a = preprocess(&opts);
        let b = preprocess(&opts);
        assert_eq!(a, b);
        assert_eq!(a.render(&sample_graph()), b.render(&sample_graph()));
        assert_eq!(a.render(&sample_graph()), a.render(&sample_graph()));
    }

    #[test]
    fn test_module_edges_rendered() {
        let out = preprocess(&options(false, "set312")).render(&sample_graph());
        assert!(out.contains(r#"subgraph "cluster_AppModule" {"#));
        assert!(out.contains(r#""AppComponent" [shape="cds"];"#));
        assert!(out.contains(r#""AppComponent" -> "AppModule" [style="solid"];"#));
        assert!(out.contains(r#""AuthService" [shape="ellipse"];"#));
        assert!(out.contains(r#""AppModule" -> "AppComponent" [style="bold"];"#));
        assert!(out.contains(r#"  "SharedModule" -> "AppModule";"#));
        assert!(out.contains(r#""SharedModule" -> "ButtonComponent" [style="dotted"];"#));
        assert!(out.contains("node [fillcolor=2];"));
    }

    #[test]
    fn test_map_shaped_graph_uses_keys() {
        let graph = DependencyGraph::new(json!({
            "core": { "imports": ["http"] },
            "http": {}
        }));
        let out = preprocess(&options(false, "set312")).render(&graph);
        assert!(out.contains(r#"subgraph "cluster_core" {"#));
        assert!(out.contains(r#"subgraph "cluster_http" {"#));
        assert!(out.contains(r#"  "http" -> "core";"#));
    }

    #[test]
    fn test_default_scheme_and_legend_shapes_filled() {
        let out = preprocess(&options(true, "set312")).render(&sample_graph());
        assert!(out.contains(r#"colorscheme="set312""#));
        assert!(out.contains(r#""Declarations" [shape="cds", fillcolor=2];"#));
        assert!(out.contains(r#""Providers" [shape="ellipse", fillcolor=3];"#));
    }

    #[test]
    fn test_map_modules_keep_input_order() {
        let graph = DependencyGraph::from_json_str(r#"{ "zeta": {}, "alpha": {} }"#).unwrap();
        let out = preprocess(&options(false, "set312")).render(&graph);
        let zeta = out.find(r#"cluster_zeta"#).unwrap();
        let alpha = out.find(r#"cluster_alpha"#).unwrap();
        assert!(zeta < alpha);
    }

    #[test]
    fn test_identifiers_escaped() {
        let graph = DependencyGraph::new(json!([{ "name": "Odd\"Name" }]));
        let out = preprocess(&options(false, "set312")).render(&graph);
        assert!(out.contains(r#""Odd\"Name" [shape="component"];"#));
    }

    #[test]
    fn test_palette_cycles() {
        let mut opts = options(false, "set13");
        opts.style.palette_size = 3;
        let graph = DependencyGraph::new(json!(["a", "b", "c", "d"]));
        let out = preprocess(&opts).render(&graph);
        assert_eq!(out.matches("node [fillcolor=1];").count(), 2);
        assert_eq!(out.matches("node [fillcolor=3];").count(), 1);
    }
}
