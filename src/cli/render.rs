// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 batchflow contributors

//! Render command - write the pipeline document

use miette::Result;
use std::path::PathBuf;

use super::GlobalOptions;
use crate::utils::print_success;

/// Run the render command
pub fn run(definition: PathBuf, output: Option<PathBuf>, options: &GlobalOptions) -> Result<()> {
    let pipeline = options.load_pipeline(&definition)?;

    match output {
        Some(path) => {
            pipeline.write_xml(&path)?;
            print_success(&format!("Wrote {}", path.display()));
        }
        None => print!("{}", pipeline.to_xml()),
    }

    Ok(())
}
