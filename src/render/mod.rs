// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 batchflow contributors

//! Workflow engine XML rendering
//!
//! The main task is rendered first. Every task spawned by a process is
//! rendered inside its enclosing task, right after the process that spawns
//! it, so the document is a depth-first walk of the tree.

mod writer;

pub use writer::{escape_attr, escape_text, XmlWriter};

use std::path::Path;
use tracing::info;

use crate::errors::{BatchflowError, BatchflowResult};
use crate::pipeline::{Pipeline, ProcessId, TaskId};

/// Namespace of the workflow engine pipeline schema
pub const PIPELINE_NAMESPACE: &str = "http://glast-ground.slac.stanford.edu/pipeline";

/// Task type attribute expected by the engine
pub const TASK_TYPE: &str = "LSST";

/// Site attribute of every process, resolved by the engine
pub const JOB_SITE: &str = "${JOBSITE}";

/// Renders a [`Pipeline`] as a workflow engine document
pub struct DocumentRenderer<'a> {
    pipeline: &'a Pipeline,
}

impl<'a> DocumentRenderer<'a> {
    pub fn new(pipeline: &'a Pipeline) -> Self {
        Self { pipeline }
    }

    /// Render the whole document
    pub fn render(&self) -> String {
        let mut w = XmlWriter::new();
        w.line(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        w.open(
            "pipeline",
            &[
                ("xmlns", PIPELINE_NAMESPACE),
                ("xmlns:xs", "http://www.w3.org/2001/XMLSchema-instance"),
            ],
        );
        w.raw(self.pipeline.header());
        self.render_task(&mut w, self.pipeline.root());
        w.close("pipeline");
        w.finish()
    }

    fn render_task(&self, w: &mut XmlWriter, id: TaskId) {
        let task = self.pipeline.task(id);

        let mut attrs = vec![("name", task.name()), ("type", TASK_TYPE)];
        if let Some(version) = task.version() {
            attrs.push(("version", version));
        }
        w.open("task", &attrs);

        if let Some(notation) = &task.notation {
            w.text("notation", notation);
        }

        if !task.variables().is_empty() {
            w.open("variables", &[]);
            for line in task.variables().lines() {
                w.line(line.trim());
            }
            w.close("variables");
        }

        for process in task.processes() {
            self.render_process(w, process);
            for &sub in self.pipeline.process(process).subtasks() {
                self.render_task(w, sub);
            }
        }

        w.close("task");
    }

    fn render_process(&self, w: &mut XmlWriter, id: ProcessId) {
        let process = self.pipeline.process(id);
        w.open("process", &[("name", process.name()), ("site", JOB_SITE)]);

        if let Some(notation) = &process.notation {
            w.text("notation", notation);
        }

        match process.kind.directive(process.name()) {
            Some(directive) => w.line(&directive),
            None => {
                w.line("<script><![CDATA[");
                w.raw(&format!(
                    "  execfile(\"%s/%s\" % (SLAC_SCRIPT_LOCATION, SCRIPT_NAME))\n  {}()",
                    process.name()
                ));
                w.line("]]></script>");
            }
        }

        if !process.requirements().is_empty() {
            w.open("depends", &[]);
            for &req in process.requirements() {
                let name = self.pipeline.qualified_name(req);
                w.empty("after", &[("process", name.as_str())]);
            }
            w.close("depends");
        }

        if !process.subtasks().is_empty() {
            w.open("createsSubtasks", &[]);
            for &sub in process.subtasks() {
                w.text("subtask", self.pipeline.task(sub).name());
            }
            w.close("createsSubtasks");
        }

        w.close("process");
    }
}

impl Pipeline {
    /// Render this pipeline as a workflow engine XML document
    pub fn to_xml(&self) -> String {
        DocumentRenderer::new(self).render()
    }

    /// Render this pipeline and write it to `path`
    pub fn write_xml(&self, path: &Path) -> BatchflowResult<()> {
        std::fs::write(path, self.to_xml()).map_err(|e| BatchflowError::FileWriteError {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        info!(path = %path.display(), "wrote pipeline document");
        Ok(())
    }
}
