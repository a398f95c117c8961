// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 batchflow contributors

//! Companion artifacts for a rendered pipeline
//!
//! The workflow engine expects a launcher module providing the functions the
//! embedded scripts call, and one shell script per batch job. Both are
//! generated from the same tree as the document. Existing files are never
//! overwritten unless clobbering is requested, so hand edits survive
//! regeneration. The exists-then-write check is best effort, not atomic.

mod launcher;
mod scripts;

pub use launcher::{launcher_module, write_launcher_module, LAUNCHER_VARIABLE};
pub use scripts::{process_script, write_process_scripts};

use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::errors::{BatchflowError, BatchflowResult};
use crate::pipeline::Pipeline;

/// Options for artifact generation
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Directory receiving the generated files
    pub output_dir: PathBuf,
    /// Overwrite files that already exist
    pub clobber: bool,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            clobber: false,
        }
    }
}

/// What a generation run wrote
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationReport {
    /// Launcher module path, if it was written
    pub launcher: Option<PathBuf>,
    /// Number of process scripts written
    pub scripts_written: usize,
}

/// Runs both generation passes over a pipeline
pub struct ArtifactGenerator<'a> {
    pipeline: &'a Pipeline,
    options: GenerateOptions,
}

impl<'a> ArtifactGenerator<'a> {
    pub fn new(pipeline: &'a Pipeline, options: GenerateOptions) -> Self {
        Self { pipeline, options }
    }

    /// Write the launcher module and the process scripts
    pub fn generate(&self) -> BatchflowResult<GenerationReport> {
        let dir = &self.options.output_dir;
        if !dir.exists() {
            std::fs::create_dir_all(dir).map_err(|e| BatchflowError::FileWriteError {
                path: dir.clone(),
                error: e.to_string(),
            })?;
        }

        let launcher = write_launcher_module(self.pipeline, dir, self.options.clobber)?;
        let scripts_written = write_process_scripts(self.pipeline, dir, self.options.clobber)?;

        info!(
            launcher = launcher.is_some(),
            scripts = scripts_written,
            "generated pipeline artifacts"
        );

        Ok(GenerationReport {
            launcher,
            scripts_written,
        })
    }
}

/// Write `content` to `path` unless it exists and `clobber` is off.
///
/// Returns whether the file was written.
pub(crate) fn write_unless_present(path: &Path, content: &str, clobber: bool) -> BatchflowResult<bool> {
    if path.exists() && !clobber {
        debug!(path = %path.display(), "keeping existing file");
        return Ok(false);
    }

    std::fs::write(path, content).map_err(|e| BatchflowError::FileWriteError {
        path: path.to_path_buf(),
        error: e.to_string(),
    })?;

    debug!(path = %path.display(), "wrote file");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::ExecutionKind;
    use tempfile::TempDir;

    fn pipeline() -> Pipeline {
        let mut p = Pipeline::new("JC_WLPipeline", "0.3").unwrap();
        let root = p.root();
        p.declare_variable(root, LAUNCHER_VARIABLE, "wl_pipeline_workflow.py")
            .unwrap();

        let catsel = p
            .create_process(root, "catalogSelection", ExecutionKind::StandardJob, &[])
            .unwrap();
        let null_test = p
            .create_parallel_process(root, "catSelNullTest", ExecutionKind::StandardJob, &[catsel])
            .unwrap();
        p.create_process(root, "TJPCosmo", ExecutionKind::LongJob, &[null_test])
            .unwrap();
        p.create_process(root, "summarize", ExecutionKind::ScriptBacked, &[])
            .unwrap();
        p
    }

    fn snapshot(dir: &Path) -> Vec<(String, String)> {
        let mut files: Vec<(String, String)> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| {
                let path = e.unwrap().path();
                (
                    path.file_name().unwrap().to_string_lossy().to_string(),
                    std::fs::read_to_string(&path).unwrap(),
                )
            })
            .collect();
        files.sort();
        files
    }

    #[test]
    fn test_generate_creates_output_dir() {
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("scripts");
        let p = pipeline();

        let report = ArtifactGenerator::new(
            &p,
            GenerateOptions {
                output_dir: out.clone(),
                clobber: false,
            },
        )
        .generate()
        .unwrap();

        assert_eq!(report.launcher, Some(out.join("wl_pipeline_workflow.py")));
        // catalogSelection, catSelNullTest, TJPCosmo
        assert_eq!(report.scripts_written, 3);
        assert_eq!(snapshot(&out).len(), 4);
    }

    #[test]
    fn test_generation_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let p = pipeline();
        let options = GenerateOptions {
            output_dir: temp.path().to_path_buf(),
            clobber: false,
        };

        ArtifactGenerator::new(&p, options.clone()).generate().unwrap();
        let first = snapshot(temp.path());

        let report = ArtifactGenerator::new(&p, options).generate().unwrap();
        assert_eq!(report, GenerationReport::default());
        assert_eq!(snapshot(temp.path()), first);
    }

    #[test]
    fn test_hand_edits_survive_unless_clobbered() {
        let temp = TempDir::new().unwrap();
        let p = pipeline();
        let module = temp.path().join("wl_pipeline_workflow.py");
        std::fs::write(&module, "# edited by hand\n").unwrap();

        let kept = ArtifactGenerator::new(
            &p,
            GenerateOptions {
                output_dir: temp.path().to_path_buf(),
                clobber: false,
            },
        )
        .generate()
        .unwrap();
        assert!(kept.launcher.is_none());
        assert_eq!(std::fs::read_to_string(&module).unwrap(), "# edited by hand\n");

        let clobbered = ArtifactGenerator::new(
            &p,
            GenerateOptions {
                output_dir: temp.path().to_path_buf(),
                clobber: true,
            },
        )
        .generate()
        .unwrap();
        assert_eq!(clobbered.scripts_written, 3);
        assert_eq!(
            std::fs::read_to_string(&module).unwrap(),
            launcher_module(&p)
        );
    }

    #[test]
    fn test_write_unless_present() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("file");

        assert!(write_unless_present(&path, "a", false).unwrap());
        assert!(!write_unless_present(&path, "b", false).unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "a");
        assert!(write_unless_present(&path, "c", true).unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "c");
    }
}
