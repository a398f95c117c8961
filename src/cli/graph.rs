// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 batchflow contributors

//! Graph command - visualize pipeline as a graph

use miette::Result;
use std::path::PathBuf;

use super::{GlobalOptions, GraphFormat};
use crate::pipeline::DependencyGraph;

/// Run the graph command
pub fn run(definition: PathBuf, format: GraphFormat, options: &GlobalOptions) -> Result<()> {
    let pipeline = options.load_pipeline(&definition)?;
    let graph = DependencyGraph::build(&pipeline);

    let output = match format {
        GraphFormat::Text => graph.to_text(),
        GraphFormat::Dot => graph.to_dot(),
        GraphFormat::Mermaid => graph.to_mermaid(),
    };

    println!("{}", output);

    Ok(())
}
