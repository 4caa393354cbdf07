use crate::config::{LayoutConfig, RenderConfig};
use crate::error::{Error, Result};
use crate::graph::{Attributes, GraphId, GraphModel};
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Dot,
    Svg,
    Png,
    Jpeg,
}

impl OutputFormat {
    /// Format for an output file, by extension. Unknown extensions get PNG.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "dot" => Self::Dot,
            "svg" => Self::Svg,
            "jpg" | "jpeg" => Self::Jpeg,
            _ => Self::Png,
        }
    }

    /// Graphviz `-T` name.
    pub fn graphviz_name(self) -> &'static str {
        match self {
            Self::Dot => "dot",
            Self::Svg => "svg",
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }
}

pub fn to_dot(model: &GraphModel) -> String {
    let mut out = String::new();
    out.push_str(&format!("digraph {} {{\n", quote(model.name())));
    write_graph_body(&mut out, model, model.root(), 1);
    out.push_str("}\n");
    out
}

fn write_graph_body(out: &mut String, model: &GraphModel, graph: GraphId, depth: usize) {
    let indent = "  ".repeat(depth);
    for (key, value) in model.subgraph(graph).attrs.iter() {
        out.push_str(&format!("{indent}{key}={};\n", quote(value)));
    }
    for (_, node) in model.nodes_in(graph) {
        out.push_str(&format!("{indent}{}{};\n", quote(&node.id), attr_list(&node.attrs)));
    }
    // Children before edges, so that edges never declare nodes by accident
    for child in model.children(graph) {
        let sub = model.subgraph(child);
        out.push_str(&format!("{indent}subgraph {} {{\n", quote(&sub.dot_name())));
        write_graph_body(out, model, child, depth + 1);
        out.push_str(&format!("{indent}}}\n"));
    }
    for (_, edge) in model.edges_in(graph) {
        out.push_str(&format!(
            "{indent}{} -> {}{};\n",
            quote(&model.node(edge.from).id),
            quote(&model.node(edge.to).id),
            attr_list(&edge.attrs)
        ));
    }
}

fn attr_list(attrs: &Attributes) -> String {
    if attrs.is_empty() {
        return String::new();
    }
    let items = attrs
        .iter()
        .map(|(key, value)| format!("{key}={}", quote(value)))
        .collect::<Vec<_>>()
        .join(", ");
    format!(" [{items}]")
}

fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            _ => out.push(ch),
        }
    }
    out.push('"');
    out
}

/// Render the graph. DOT is written directly, everything else goes through
/// the Graphviz layout engine named in `layout`.
pub fn render(
    model: &GraphModel,
    format: OutputFormat,
    layout: &LayoutConfig,
    render_cfg: &RenderConfig,
) -> Result<Vec<u8>> {
    let dot = to_dot(model);
    match format {
        OutputFormat::Dot => Ok(dot.into_bytes()),
        OutputFormat::Png => render_png(&dot, &layout.engine, render_cfg),
        _ => run_graphviz(&dot, &layout.engine, format),
    }
}

#[cfg(feature = "png")]
fn render_png(dot: &str, engine: &str, render_cfg: &RenderConfig) -> Result<Vec<u8>> {
    let svg = run_graphviz(dot, engine, OutputFormat::Svg)?;
    rasterize_svg(&svg, render_cfg)
}

#[cfg(not(feature = "png"))]
fn render_png(dot: &str, engine: &str, _render_cfg: &RenderConfig) -> Result<Vec<u8>> {
    run_graphviz(dot, engine, OutputFormat::Png)
}

fn run_graphviz(dot: &str, engine: &str, format: OutputFormat) -> Result<Vec<u8>> {
    let mut child = Command::new("dot")
        .arg(format!("-K{engine}"))
        .arg(format!("-T{}", format.graphviz_name()))
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|err| Error::Render {
            message: format!("cannot start Graphviz (dot): {err}"),
        })?;

    {
        let stdin = child.stdin.as_mut().ok_or_else(|| Error::Render {
            message: "cannot open stdin of Graphviz".to_string(),
        })?;
        stdin.write_all(dot.as_bytes())?;
    }

    let output = child.wait_with_output()?;
    if !output.status.success() {
        return Err(Error::Render {
            message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(output.stdout)
}

#[cfg(feature = "png")]
fn rasterize_svg(svg: &[u8], render_cfg: &RenderConfig) -> Result<Vec<u8>> {
    let render_error = |message: String| Error::Render { message };

    let mut opt = usvg::Options::default();
    opt.fontdb_mut().load_system_fonts();
    let tree = usvg::Tree::from_data(svg, &opt).map_err(|err| render_error(err.to_string()))?;
    let scale = render_cfg.scale.max(0.1);
    let size = tree
        .size()
        .to_int_size()
        .scale_by(scale)
        .ok_or_else(|| render_error("image too large".to_string()))?;
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| render_error("failed to allocate pixmap".to_string()))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(
        &tree,
        resvg::tiny_skia::Transform::from_scale(scale, scale),
        &mut pixmap_mut,
    );
    pixmap.encode_png().map_err(|err| render_error(err.to_string()))
}

/// Write to `output`, or to stdout without a path.
pub fn write_output(data: &[u8], output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, data)?;
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(data)?;
            stdout.flush()?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{NodeShape, Style};

    #[test]
    fn formats_by_extension() {
        assert_eq!(OutputFormat::from_path(Path::new("out.png")), OutputFormat::Png);
        assert_eq!(OutputFormat::from_path(Path::new("out.JPG")), OutputFormat::Jpeg);
        assert_eq!(OutputFormat::from_path(Path::new("out.jpeg")), OutputFormat::Jpeg);
        assert_eq!(OutputFormat::from_path(Path::new("out.svg")), OutputFormat::Svg);
        assert_eq!(OutputFormat::from_path(Path::new("out.dot")), OutputFormat::Dot);
        assert_eq!(OutputFormat::from_path(Path::new("out.gif")), OutputFormat::Png);
        assert_eq!(OutputFormat::from_path(Path::new("out")), OutputFormat::Png);
    }

    #[test]
    fn dot_output_nests_clusters() {
        let mut model = GraphModel::new("cs-1");
        model.root_attrs_mut().set_compound(true);
        let child = model.create_subgraph(model.root(), "app-Child", true).unwrap();
        model.subgraph_mut(child).attrs.set_label("Child\napp-Child");
        let a = model.create_node(model.root(), "app.A").unwrap();
        model.node_mut(a).attrs.set_shape(NodeShape::Box);
        model.node_mut(a).attrs.set_label("~ A\nAWS::S3::Bucket");
        let proxy = model.create_node(child, "app-Child._").unwrap();
        model.node_mut(proxy).attrs.set_style(Style::Invisible);
        let edge = model.create_edge(model.root(), "ResourceReference", a, proxy).unwrap();
        model.edge_mut(edge).attrs.set_logical_head("cluster_app-Child");

        let dot = to_dot(&model);
        assert!(dot.starts_with("digraph \"cs-1\" {\n"));
        assert!(dot.contains("  compound=\"true\";\n"));
        assert!(dot.contains("\"app.A\" [label=\"~ A\\nAWS::S3::Bucket\", shape=\"box\"];"));
        assert!(dot.contains("  subgraph \"cluster_app-Child\" {\n"));
        assert!(dot.contains("    \"app-Child._\" [style=\"invis\"];"));
        assert!(dot.contains("\"app.A\" -> \"app-Child._\" [lhead=\"cluster_app-Child\"];"));
        let cluster = dot.find("subgraph").unwrap();
        let edge = dot.find("->").unwrap();
        assert!(cluster < edge);
        assert!(dot.trim_end().ends_with('}'));
    }

    #[test]
    fn quotes_are_escaped() {
        assert_eq!(quote("say \"hi\""), "\"say \\\"hi\\\"\"");
        assert_eq!(quote("<A>A|<B>B"), "\"<A>A|<B>B\"");
    }

    #[test]
    fn dot_format_needs_no_graphviz() {
        let model = GraphModel::new("cs");
        let layout = LayoutConfig::default();
        let bytes = render(&model, OutputFormat::Dot, &layout, &RenderConfig::default()).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "digraph \"cs\" {\n}\n");
    }
}
