// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 batchflow contributors

//! Per-process shell script stubs

use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

use super::write_unless_present;
use crate::errors::{BatchflowError, BatchflowResult};
use crate::pipeline::Pipeline;

/// Stub script for a batch job process
pub fn process_script(process_name: &str) -> String {
    format!("#!/bin/bash\necho \"Running process {}\"\n", process_name)
}

/// Write a stub script for every batch job process into `dir`, named after
/// the process.
///
/// Script-backed processes and setup processes get no script. Batch jobs
/// sharing a name across tasks share one script, written once. Returns the
/// number of scripts written; files that already exist are kept and not
/// counted unless `clobber` is set.
pub fn write_process_scripts(pipeline: &Pipeline, dir: &Path, clobber: bool) -> BatchflowResult<usize> {
    let mut written = 0;
    let mut seen = HashSet::new();

    for id in pipeline.walk_processes() {
        let process = pipeline.process(id);
        if !process.kind.is_batch_job() || process.is_setup() {
            continue;
        }

        if !seen.insert(process.name()) {
            debug!(process = process.name(), "script already generated in this pass");
            continue;
        }

        let path = dir.join(process.name());
        if write_unless_present(&path, &process_script(process.name()), clobber)? {
            make_executable(&path)?;
            written += 1;
        }
    }

    info!(written, dir = %dir.display(), "wrote process scripts");
    Ok(written)
}

#[cfg(unix)]
fn make_executable(path: &Path) -> BatchflowResult<()> {
    use std::os::unix::fs::PermissionsExt;

    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).map_err(|e| {
        BatchflowError::FileWriteError {
            path: path.to_path_buf(),
            error: e.to_string(),
        }
    })
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> BatchflowResult<()> {
    Ok(())
}
