// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 batchflow contributors

//! Launcher module generation
//!
//! Every embedded script in the document calls a function named after its
//! process. Plain script processes get a no-op placeholder. Setup processes
//! get a `<task>_jobs` list per spawned task and a launcher that creates one
//! substream of that task per list entry.

use std::path::{Path, PathBuf};
use tracing::info;

use super::write_unless_present;
use crate::errors::BatchflowResult;
use crate::pipeline::{ExecutionKind, Pipeline};

/// Main task variable naming the launcher module file
pub const LAUNCHER_VARIABLE: &str = "SCRIPT_NAME";

/// Source of the launcher module for `pipeline`
pub fn launcher_module(pipeline: &Pipeline) -> String {
    let mut out = format!(
        "\"\"\"Launcher functions for the {} pipeline.\"\"\"\n",
        pipeline.main_task().name()
    );

    for id in pipeline.walk_processes() {
        let process = pipeline.process(id);

        if process.is_setup() {
            let subtasks: Vec<&str> = process
                .subtasks()
                .iter()
                .map(|&t| pipeline.task(t).name())
                .collect();

            out.push('\n');
            for task in &subtasks {
                out.push_str(&format!("{}_jobs = []\n", task));
            }

            out.push_str(&format!("\n\ndef {}():\n", process.name()));
            for task in &subtasks {
                out.push_str(&format!(
                    "    for stream, job_vars in enumerate({}_jobs):\n",
                    task
                ));
                out.push_str(&format!(
                    "        pipeline.createSubstream(\"{}\", stream, job_vars)\n",
                    task
                ));
            }
        } else if process.kind == ExecutionKind::ScriptBacked {
            out.push_str(&format!("\n\ndef {}():\n    pass\n", process.name()));
        }
    }

    out
}

/// Write the launcher module into `dir`, named by the main task's
/// `SCRIPT_NAME` variable.
///
/// Returns the path when the file was written and `None` when an existing
/// file was kept.
pub fn write_launcher_module(
    pipeline: &Pipeline,
    dir: &Path,
    clobber: bool,
) -> BatchflowResult<Option<PathBuf>> {
    let file_name = pipeline.get_variable(pipeline.root(), LAUNCHER_VARIABLE)?;
    let path = dir.join(file_name);

    if write_unless_present(&path, &launcher_module(pipeline), clobber)? {
        info!(path = %path.display(), "wrote launcher module");
        Ok(Some(path))
    } else {
        Ok(None)
    }
}
