// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 batchflow contributors

//! Pipeline definition files
//!
//! A YAML description of a pipeline, built into a [`Pipeline`] through the
//! same construction calls a program would make.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

use super::graph::{Pipeline, ProcessId, TaskId};
use super::job::ExecutionKind;
use crate::config::{EngineConfig, LineSource};
use crate::errors::{BatchflowError, BatchflowResult};

/// Pipeline definition file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDefinition {
    /// Main task name
    pub name: String,

    /// Pipeline version
    #[serde(default = "default_version")]
    pub version: String,

    /// Main task notation
    #[serde(default)]
    pub notation: Option<String>,

    /// Main task variables, set over the loaded declarations
    #[serde(default)]
    pub variables: IndexMap<String, String>,

    /// Tasks spawned by processes, referenced from `ProcessDefinition::subtasks`
    #[serde(default)]
    pub subtasks: Vec<TaskDefinition>,

    /// Main task processes, in order
    #[serde(default)]
    pub processes: Vec<ProcessDefinition>,
}

fn default_version() -> String {
    "0.1".to_string()
}

/// A task spawned by a setup process
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDefinition {
    pub name: String,

    #[serde(default)]
    pub notation: Option<String>,

    #[serde(default)]
    pub variables: IndexMap<String, String>,

    #[serde(default)]
    pub processes: Vec<ProcessDefinition>,
}

/// A process of a task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessDefinition {
    pub name: String,

    #[serde(default)]
    pub notation: Option<String>,

    /// Job kind (`job`, `long_job` or `script`)
    #[serde(default)]
    pub job: ExecutionKind,

    /// Processes this one runs after: a process of the same task or of the
    /// main task, or `task.process`
    #[serde(default)]
    pub requires: Vec<String>,

    /// Names of tasks this process spawns
    #[serde(default)]
    pub subtasks: Vec<String>,

    /// Expand into a setup process spawning a task that runs this process
    #[serde(default)]
    pub parallel: bool,
}

impl PipelineDefinition {
    /// Load a definition from a YAML file
    pub fn from_file(path: &Path) -> BatchflowResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| BatchflowError::FileReadError {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::from_yaml(&content)
    }

    /// Parse a definition from a YAML string
    pub fn from_yaml(yaml: &str) -> BatchflowResult<Self> {
        serde_yaml::from_str(yaml).map_err(Into::into)
    }

    /// Serialize the definition to YAML
    pub fn to_yaml(&self) -> BatchflowResult<String> {
        serde_yaml::to_string(self).map_err(Into::into)
    }

    /// Build the pipeline with an empty header and no loaded variables
    pub fn build(&self) -> BatchflowResult<Pipeline> {
        let pipeline = Pipeline::new(&self.name, &self.version)?;
        Builder::new(pipeline).populate(self)
    }

    /// Build the pipeline on top of the header and variables from `source`
    pub fn build_from_source(
        &self,
        config: &EngineConfig,
        source: &dyn LineSource,
    ) -> BatchflowResult<Pipeline> {
        let pipeline = Pipeline::from_source(&self.name, &self.version, config, source)?;
        Builder::new(pipeline).populate(self)
    }
}

/// Tracks declared names while a definition is built
struct Builder {
    pipeline: Pipeline,
    tasks: HashMap<String, TaskId>,
    declared: HashMap<(TaskId, String), ProcessId>,
}

impl Builder {
    fn new(pipeline: Pipeline) -> Self {
        let mut tasks = HashMap::new();
        tasks.insert(pipeline.main_task().name().to_string(), pipeline.root());

        Self {
            pipeline,
            tasks,
            declared: HashMap::new(),
        }
    }

    fn populate(mut self, def: &PipelineDefinition) -> BatchflowResult<Pipeline> {
        let root = self.pipeline.root();
        self.pipeline.task_mut(root).notation = def.notation.clone();
        self.apply_variables(root, &def.variables)?;

        // Every task exists before any process, so `subtasks:` may name a
        // task defined later in the file.
        for sub in &def.subtasks {
            if self.tasks.contains_key(&sub.name) {
                return Err(BatchflowError::invalid_definition(
                    format!("task '{}' is defined more than once", sub.name),
                    None,
                ));
            }

            let id = self.pipeline.new_task(&sub.name)?;
            self.tasks.insert(sub.name.clone(), id);
            self.pipeline.task_mut(id).notation = sub.notation.clone();
            self.apply_variables(id, &sub.variables)?;
        }

        let mut pending = Vec::new();
        for sub in &def.subtasks {
            let id = self.tasks[&sub.name];
            self.build_processes(id, &sub.processes, &mut pending)?;
        }
        self.build_processes(root, &def.processes, &mut pending)?;

        for sub in &def.subtasks {
            let id = self.tasks[&sub.name];
            if self.pipeline.task(id).parent().is_none() {
                return Err(BatchflowError::invalid_definition(
                    format!("task '{}' is never spawned", sub.name),
                    Some("List it under 'subtasks' of a process"),
                ));
            }
        }

        // Requirements are wired once the tree is complete so that requiring
        // a setup process sees every process it fans out to.
        for (task, receiver, process) in pending {
            for reference in &process.requires {
                let target = self.resolve(task, &process.name, reference)?;
                self.pipeline.requires(receiver, target);
            }
        }

        debug!(
            pipeline = %def.name,
            tasks = self.pipeline.walk_tasks().len(),
            processes = self.pipeline.walk_processes().len(),
            "built pipeline definition"
        );
        Ok(self.pipeline)
    }

    fn apply_variables(&mut self, task: TaskId, vars: &IndexMap<String, String>) -> BatchflowResult<()> {
        for (key, value) in vars {
            if self.pipeline.task(task).variables().contains(key) {
                self.pipeline.set_variable(task, key, value)?;
            } else {
                self.pipeline.declare_variable(task, key, value)?;
            }
        }
        Ok(())
    }

    /// Create the processes of `task` and attach the tasks they spawn.
    ///
    /// Each created process is queued in `pending` with the process that
    /// receives its requirements (the setup process for a parallel one).
    fn build_processes<'d>(
        &mut self,
        task: TaskId,
        defs: &'d [ProcessDefinition],
        pending: &mut Vec<(TaskId, ProcessId, &'d ProcessDefinition)>,
    ) -> BatchflowResult<()> {
        for def in defs {
            let (id, receiver) = if def.parallel {
                if !def.subtasks.is_empty() {
                    return Err(BatchflowError::invalid_definition(
                        format!("parallel process '{}' cannot list subtasks", def.name),
                        Some("The spawned task of a parallel process is created automatically"),
                    ));
                }
                let inner = self
                    .pipeline
                    .create_parallel_process(task, &def.name, def.job, &[])?;
                let setup = self
                    .pipeline
                    .process(inner)
                    .owner()
                    .and_then(|child| self.pipeline.task(child).parent())
                    .unwrap_or(inner);
                (inner, setup)
            } else {
                let id = self.pipeline.create_process(task, &def.name, def.job, &[])?;
                (id, id)
            };

            self.pipeline.process_mut(id).notation = def.notation.clone();

            for sub in &def.subtasks {
                let sub_id = self
                    .tasks
                    .get(sub)
                    .copied()
                    .filter(|&t| t != self.pipeline.root())
                    .ok_or_else(|| BatchflowError::UnknownTask { task: sub.clone() })?;
                self.pipeline.add_subtask(id, sub_id)?;
            }

            self.declared.insert((task, def.name.clone()), id);
            pending.push((task, receiver, def));
        }
        Ok(())
    }

    fn lookup(&self, task: TaskId, name: &str) -> Option<ProcessId> {
        self.declared
            .get(&(task, name.to_string()))
            .copied()
            .or_else(|| self.pipeline.task(task).process(name))
    }

    fn resolve(&self, task: TaskId, process: &str, reference: &str) -> BatchflowResult<ProcessId> {
        let found = match reference.split_once('.') {
            Some((task_name, name)) => self
                .tasks
                .get(task_name)
                .and_then(|&t| self.lookup(t, name)),
            None => self
                .lookup(task, reference)
                .or_else(|| self.lookup(self.pipeline.root(), reference)),
        };

        found.ok_or_else(|| BatchflowError::UnknownReference {
            process: process.to_string(),
            reference: reference.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MemorySource;

    const PHOSIM: &str = r#"
name: JC_phoSim_pipeline
version: "0.1"
notation: PhoSim Execution Pipeline
variables:
  SCRIPT_NAME: phosim_pipeline_workflow.py
subtasks:
  - name: singleVisitTask
    processes:
      - name: smokeTest
      - name: runPhoSim
        requires: [smokeTest]
      - name: phoSimReg
        requires: [runPhoSim]
      - name: phoSimFinalize
        job: script
        requires: [phoSimReg]
processes:
  - name: setupVisits
  - name: setupPhosim
    job: script
    requires: [setupVisits]
    subtasks: [singleVisitTask]
  - name: wrapUp
    job: script
    requires: [singleVisitTask.phoSimFinalize]
"#;

    #[test]
    fn test_parse_definition() {
        let def = PipelineDefinition::from_yaml(PHOSIM).unwrap();
        assert_eq!(def.name, "JC_phoSim_pipeline");
        assert_eq!(def.subtasks.len(), 1);
        assert_eq!(def.processes[0].job, ExecutionKind::StandardJob);
        assert_eq!(def.processes[1].job, ExecutionKind::ScriptBacked);
        assert_eq!(def.processes[1].subtasks, vec!["singleVisitTask"]);
    }

    #[test]
    fn test_build_phosim() {
        let p = PipelineDefinition::from_yaml(PHOSIM).unwrap().build().unwrap();
        let root = p.root();

        assert_eq!(p.main_task().version(), Some("0.1"));
        assert_eq!(p.get_variable(root, "SCRIPT_NAME").unwrap(), "phosim_pipeline_workflow.py");

        let setup = p.main_task().process("setupPhosim").unwrap();
        let visit = p.find_task("singleVisitTask").unwrap();
        assert_eq!(p.process(setup).subtasks(), &[visit]);

        let wrap_up = p.main_task().process("wrapUp").unwrap();
        let fin = p.task(visit).process("phoSimFinalize").unwrap();
        assert_eq!(p.process(wrap_up).requirements(), &[fin]);
        assert_eq!(p.walk_processes().len(), 7);
    }

    #[test]
    fn test_requiring_setup_flattens() {
        let yaml = r#"
name: main
subtasks:
  - name: visitTask
    processes:
      - name: a
      - name: b
processes:
  - name: setup
    job: script
    subtasks: [visitTask]
  - name: after
    requires: [setup]
"#;
        let p = PipelineDefinition::from_yaml(yaml).unwrap().build().unwrap();
        let visit = p.find_task("visitTask").unwrap();
        let after = p.main_task().process("after").unwrap();
        assert_eq!(
            p.process(after).requirements(),
            &[
                p.task(visit).process("a").unwrap(),
                p.task(visit).process("b").unwrap()
            ]
        );
    }

    #[test]
    fn test_parallel_reference_resolves_to_inner_process() {
        let yaml = r#"
name: JC_WLPipeline
version: "0.3"
processes:
  - name: catalogSelection
    notation: Make selections on the DM Catalog data
  - name: catSelNullTest
    parallel: true
    requires: [catalogSelection]
    notation: Null tests
  - name: photoZ
    parallel: true
    job: long_job
    requires: [catSelNullTest]
"#;
        let p = PipelineDefinition::from_yaml(yaml).unwrap().build().unwrap();

        let null_task = p.find_task("catSelNullTestsTask").unwrap();
        let inner = p.task(null_task).process("catSelNullTest").unwrap();
        assert_eq!(p.process(inner).notation.as_deref(), Some("Null tests"));

        let setup_pz = p.main_task().process("setup_photoZs").unwrap();
        assert_eq!(p.process(setup_pz).requirements(), &[inner]);

        let pz_task = p.find_task("photoZsTask").unwrap();
        let pz = p.task(pz_task).process("photoZ").unwrap();
        assert_eq!(p.process(pz).kind, ExecutionKind::LongJob);
    }

    #[test]
    fn test_unknown_reference() {
        let yaml = r#"
name: main
processes:
  - name: b
    requires: [missing]
  - name: a
"#;
        let err = PipelineDefinition::from_yaml(yaml).unwrap().build().unwrap_err();
        assert!(matches!(err, BatchflowError::UnknownReference { ref reference, .. } if reference == "missing"));
    }

    #[test]
    fn test_references_resolve_regardless_of_order() {
        let yaml = r#"
name: main
subtasks:
  - name: outerTask
    processes:
      - name: prepare
        requires: [ingest]
      - name: fanOut
        job: script
        subtasks: [innerTask]
  - name: innerTask
    processes:
      - name: work
        requires: [outerTask.prepare]
processes:
  - name: report
    job: script
    requires: [setup]
  - name: ingest
  - name: setup
    job: script
    requires: [ingest]
    subtasks: [outerTask]
"#;
        let p = PipelineDefinition::from_yaml(yaml).unwrap().build().unwrap();
        let root = p.root();
        let outer = p.find_task("outerTask").unwrap();
        let inner = p.find_task("innerTask").unwrap();

        let ingest = p.main_task().process("ingest").unwrap();
        let prepare = p.task(outer).process("prepare").unwrap();
        let fan_out = p.task(outer).process("fanOut").unwrap();
        let work = p.task(inner).process("work").unwrap();

        // a subtask process can require a main task process
        assert_eq!(p.process(prepare).requirements(), &[ingest]);
        // a task spawned from a subtask may be listed after it
        assert_eq!(p.process(fan_out).subtasks(), &[inner]);
        assert_eq!(p.process(work).requirements(), &[prepare]);
        // requiring setup reaches the leaves of both fan-out levels
        let report = p.task(root).process("report").unwrap();
        assert_eq!(p.process(report).requirements(), &[prepare, work]);
    }

    #[test]
    fn test_unknown_subtask() {
        let yaml = r#"
name: main
processes:
  - name: setup
    job: script
    subtasks: [missingTask]
"#;
        let err = PipelineDefinition::from_yaml(yaml).unwrap().build().unwrap_err();
        assert!(matches!(err, BatchflowError::UnknownTask { .. }));
    }

    #[test]
    fn test_unspawned_subtask() {
        let yaml = r#"
name: main
subtasks:
  - name: orphanTask
    processes:
      - name: a
"#;
        let err = PipelineDefinition::from_yaml(yaml).unwrap().build().unwrap_err();
        assert!(matches!(err, BatchflowError::InvalidDefinition { .. }));
    }

    #[test]
    fn test_parallel_script_rejected() {
        let yaml = r#"
name: main
processes:
  - name: scatter
    parallel: true
    job: script
"#;
        let err = PipelineDefinition::from_yaml(yaml).unwrap().build().unwrap_err();
        assert!(matches!(err, BatchflowError::InvalidKind { .. }));
    }

    #[test]
    fn test_build_from_source_overrides_variables() {
        let source = MemorySource::new()
            .with("pipeline_header.txt", "")
            .with(
                "main_task_variables.txt",
                "<var name=\"SCRIPT_NAME\">default.py</var>\n<var name=\"MAXCPU\">1000</var>",
            );
        let def = PipelineDefinition::from_yaml(PHOSIM).unwrap();

        let p = def.build_from_source(&EngineConfig::default(), &source).unwrap();
        let root = p.root();

        assert_eq!(p.get_variable(root, "SCRIPT_NAME").unwrap(), "phosim_pipeline_workflow.py");
        assert_eq!(p.get_variable(root, "MAXCPU").unwrap(), "1000");
        assert_eq!(p.main_task().variables().keys(), vec!["SCRIPT_NAME", "MAXCPU"]);
    }

    #[test]
    fn test_round_trip_yaml() {
        let def = PipelineDefinition::from_yaml(PHOSIM).unwrap();
        let parsed = PipelineDefinition::from_yaml(&def.to_yaml().unwrap()).unwrap();

        assert_eq!(parsed.name, def.name);
        assert_eq!(parsed.processes.len(), def.processes.len());
        assert_eq!(
            parsed.build().unwrap().to_xml(),
            def.build().unwrap().to_xml()
        );
    }

    #[test]
    fn test_demo_definitions_build() {
        let wl = PipelineDefinition::from_yaml(include_str!("../../demos/wl_pipeline.yaml"))
            .unwrap()
            .build()
            .unwrap();
        let tjp = wl.main_task().process("TJPCosmo").unwrap();
        assert_eq!(wl.process(tjp).requirements().len(), 3);

        let phosim = PipelineDefinition::from_yaml(include_str!("../../demos/phosim_pipeline.yaml"))
            .unwrap()
            .build()
            .unwrap();
        assert!(phosim.find_task("singleVisitTask").is_some());
    }
}
