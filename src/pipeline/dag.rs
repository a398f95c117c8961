// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 batchflow contributors

//! Dependency graph views
//!
//! Collects the processes of a pipeline and the edges between them for
//! text, DOT and Mermaid output. Nodes are named the way dependencies are
//! rendered in the document (qualified outside the main task).

use super::graph::{Pipeline, ProcessId};

/// Kind of edge between two processes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    /// The target runs after the source
    After,
    /// The source spawns the task holding the target
    Spawns,
}

/// Snapshot of the process graph of a pipeline
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    nodes: Vec<Node>,
    edges: Vec<(usize, usize, EdgeKind)>,
}

#[derive(Debug, Clone)]
struct Node {
    name: String,
    kind: String,
    task: String,
}

impl DependencyGraph {
    /// Build the graph for every process reachable from the main task
    pub fn build(pipeline: &Pipeline) -> Self {
        let order = pipeline.walk_processes();
        let index_of = |id: ProcessId| order.iter().position(|&p| p == id);

        let nodes = order
            .iter()
            .map(|&id| {
                let process = pipeline.process(id);
                Node {
                    name: pipeline.qualified_name(id),
                    kind: process.kind.to_string(),
                    task: process
                        .owner()
                        .map(|t| pipeline.task(t).name().to_string())
                        .unwrap_or_default(),
                }
            })
            .collect();

        let mut edges = Vec::new();
        for (to, &id) in order.iter().enumerate() {
            let process = pipeline.process(id);

            for &req in process.requirements() {
                if let Some(from) = index_of(req) {
                    edges.push((from, to, EdgeKind::After));
                }
            }

            for &sub in process.subtasks() {
                for child in pipeline.task(sub).processes() {
                    if let Some(target) = index_of(child) {
                        edges.push((to, target, EdgeKind::Spawns));
                    }
                }
            }
        }

        Self { nodes, edges }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Edges as `(from, to, kind)` node names
    pub fn edges(&self) -> Vec<(&str, &str, EdgeKind)> {
        self.edges
            .iter()
            .map(|&(a, b, k)| (self.nodes[a].name.as_str(), self.nodes[b].name.as_str(), k))
            .collect()
    }

    /// Processes the named process runs after
    pub fn dependencies(&self, name: &str) -> Option<Vec<&str>> {
        let idx = self.nodes.iter().position(|n| n.name == name)?;
        Some(
            self.edges
                .iter()
                .filter(|&&(_, to, kind)| to == idx && kind == EdgeKind::After)
                .map(|&(from, _, _)| self.nodes[from].name.as_str())
                .collect(),
        )
    }

    /// Identifier usable as a Mermaid node id
    fn mermaid_id(name: &str) -> String {
        name.replace('.', "__")
    }

    /// Generate Mermaid diagram of the graph
    pub fn to_mermaid(&self) -> String {
        let mut out = String::from("graph TD\n");

        for node in &self.nodes {
            out.push_str(&format!("    {}[{}]\n", Self::mermaid_id(&node.name), node.name));
        }

        for &(from, to, kind) in &self.edges {
            let arrow = match kind {
                EdgeKind::After => "-->",
                EdgeKind::Spawns => "-.->",
            };
            out.push_str(&format!(
                "    {} {} {}\n",
                Self::mermaid_id(&self.nodes[from].name),
                arrow,
                Self::mermaid_id(&self.nodes[to].name)
            ));
        }

        out
    }

    /// Generate DOT diagram of the graph
    pub fn to_dot(&self) -> String {
        let mut out = String::from("digraph pipeline {\n");
        out.push_str("    rankdir=TB;\n");
        out.push_str("    node [shape=box, style=rounded];\n\n");

        for node in &self.nodes {
            out.push_str(&format!("    \"{}\";\n", node.name));
        }

        if !self.edges.is_empty() {
            out.push('\n');
        }

        for &(from, to, kind) in &self.edges {
            let style = match kind {
                EdgeKind::After => "",
                EdgeKind::Spawns => " [style=dashed]",
            };
            out.push_str(&format!(
                "    \"{}\" -> \"{}\"{};\n",
                self.nodes[from].name, self.nodes[to].name, style
            ));
        }

        out.push_str("}\n");
        out
    }

    /// Generate text listing in document order
    pub fn to_text(&self) -> String {
        let mut out = String::new();

        for (i, node) in self.nodes.iter().enumerate() {
            out.push_str(&format!("{}. {} ({}, {})", i + 1, node.name, node.kind, node.task));

            let deps = self.dependencies(&node.name).unwrap_or_default();
            if !deps.is_empty() {
                out.push_str(&format!(" [after: {}]", deps.join(", ")));
            }

            out.push('\n');
        }

        out
    }
}
