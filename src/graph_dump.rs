use crate::graph::{Attributes, GraphModel};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct GraphDump {
    pub name: String,
    pub subgraphs: Vec<SubgraphDump>,
    pub nodes: Vec<NodeDump>,
    pub edges: Vec<EdgeDump>,
}

#[derive(Debug, Serialize)]
pub struct SubgraphDump {
    pub index: usize,
    pub name: String,
    pub parent: Option<usize>,
    pub cluster: bool,
    pub attributes: BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
pub struct NodeDump {
    pub index: usize,
    pub id: String,
    pub subgraph: usize,
    pub proxy_for: Option<usize>,
    pub attributes: BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
pub struct EdgeDump {
    pub name: String,
    pub subgraph: usize,
    pub from: String,
    pub to: String,
    pub attributes: BTreeMap<String, String>,
}

fn attributes(attrs: &Attributes) -> BTreeMap<String, String> {
    attrs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

impl GraphDump {
    pub fn from_model(model: &GraphModel) -> Self {
        let subgraphs = model
            .subgraphs()
            .map(|(id, sub)| SubgraphDump {
                index: id.index(),
                name: sub.name.clone(),
                parent: sub.parent.map(|parent| parent.index()),
                cluster: sub.cluster,
                attributes: attributes(&sub.attrs),
            })
            .collect();

        let nodes = model
            .nodes()
            .map(|(id, node)| NodeDump {
                index: id.index(),
                id: node.id.clone(),
                subgraph: node.graph.index(),
                proxy_for: node.proxy_for.map(|graph| graph.index()),
                attributes: attributes(&node.attrs),
            })
            .collect();

        let edges = model
            .edges()
            .map(|(_, edge)| EdgeDump {
                name: edge.name.clone(),
                subgraph: edge.graph.index(),
                from: model.node(edge.from).id.clone(),
                to: model.node(edge.to).id.clone(),
                attributes: attributes(&edge.attrs),
            })
            .collect();

        GraphDump {
            name: model.name().to_string(),
            subgraphs,
            nodes,
            edges,
        }
    }
}

pub fn write_graph_dump(path: &Path, model: &GraphModel) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = GraphDump::from_model(model);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}
