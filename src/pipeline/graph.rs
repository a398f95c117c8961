// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 batchflow contributors

//! The pipeline tree
//!
//! Tasks and processes live in an arena owned by [`Pipeline`] and refer to
//! each other through copyable [`TaskId`] / [`ProcessId`] handles. Owner
//! back-references are set exactly once, by the arena, so a process belongs to
//! at most one task and a task is spawned by at most one process.
//!
//! Mutation takes `&mut Pipeline` while rendering and artifact generation take
//! `&Pipeline`; build the tree completely before handing it to other threads.

use indexmap::IndexMap;
use tracing::debug;

use super::identifier::validate_name;
use super::job::ExecutionKind;
use super::variables::VariableDeclarations;
use crate::config::{EngineConfig, LineSource};
use crate::errors::{BatchflowError, BatchflowResult};

/// Handle to a process in a [`Pipeline`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProcessId(usize);

/// Handle to a task in a [`Pipeline`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(usize);

/// A single schedulable unit of work
#[derive(Debug, Clone)]
pub struct Process {
    name: String,
    /// Free-text description
    pub notation: Option<String>,
    /// How the engine runs this process
    pub kind: ExecutionKind,
    requirements: Vec<ProcessId>,
    subtasks: Vec<TaskId>,
    owner: Option<TaskId>,
}

impl Process {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Processes this one runs after, in declaration order
    pub fn requirements(&self) -> &[ProcessId] {
        &self.requirements
    }

    /// Tasks this process spawns at runtime
    pub fn subtasks(&self) -> &[TaskId] {
        &self.subtasks
    }

    /// The task holding this process, if it has been added to one
    pub fn owner(&self) -> Option<TaskId> {
        self.owner
    }

    /// Whether this is a setup (fan-out) process
    pub fn is_setup(&self) -> bool {
        !self.subtasks.is_empty()
    }
}

/// A named, ordered collection of processes
#[derive(Debug, Clone)]
pub struct Task {
    name: String,
    version: Option<String>,
    /// Free-text description
    pub notation: Option<String>,
    variables: VariableDeclarations,
    processes: IndexMap<String, ProcessId>,
    parent: Option<ProcessId>,
}

impl Task {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Pipeline version, present only on the main task
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn variables(&self) -> &VariableDeclarations {
        &self.variables
    }

    /// Processes in insertion order
    pub fn processes(&self) -> impl Iterator<Item = ProcessId> + '_ {
        self.processes.values().copied()
    }

    /// Look up a process of this task by name
    pub fn process(&self, name: &str) -> Option<ProcessId> {
        self.processes.get(name).copied()
    }

    /// The process that spawns this task
    pub fn parent(&self) -> Option<ProcessId> {
        self.parent
    }
}

/// A pipeline: header text plus the main task and everything it spawns
#[derive(Debug, Clone)]
pub struct Pipeline {
    header: String,
    root: TaskId,
    tasks: Vec<Task>,
    processes: Vec<Process>,
}

impl Pipeline {
    /// Create a pipeline whose main task is `name` at `version`
    pub fn new(name: &str, version: &str) -> BatchflowResult<Self> {
        Self::with_header(name, version, String::new())
    }

    /// Create a pipeline with an opaque header preamble
    pub fn with_header(name: &str, version: &str, header: impl Into<String>) -> BatchflowResult<Self> {
        validate_name(name)?;

        let root = Task {
            name: name.to_string(),
            version: Some(version.to_string()),
            notation: None,
            variables: VariableDeclarations::new(),
            processes: IndexMap::new(),
            parent: None,
        };

        Ok(Self {
            header: header.into(),
            root: TaskId(0),
            tasks: vec![root],
            processes: Vec::new(),
        })
    }

    /// Create a pipeline, loading the header and the main task variables
    /// through `source`.
    pub fn from_source(
        name: &str,
        version: &str,
        config: &EngineConfig,
        source: &dyn LineSource,
    ) -> BatchflowResult<Self> {
        let header = source.load_lines(&config.header_file)?.join("\n");
        let variables = source.load_lines(&config.variables_file)?;

        let mut pipeline = Self::with_header(name, version, header)?;
        let root = pipeline.root;
        pipeline.load_variables(root, variables)?;

        debug!(
            pipeline = name,
            variables = pipeline.task(root).variables.len(),
            "loaded pipeline configuration"
        );
        Ok(pipeline)
    }

    pub fn header(&self) -> &str {
        &self.header
    }

    /// The main task
    pub fn root(&self) -> TaskId {
        self.root
    }

    pub fn main_task(&self) -> &Task {
        self.task(self.root)
    }

    pub fn task(&self, id: TaskId) -> &Task {
        &self.tasks[id.0]
    }

    pub fn task_mut(&mut self, id: TaskId) -> &mut Task {
        &mut self.tasks[id.0]
    }

    pub fn process(&self, id: ProcessId) -> &Process {
        &self.processes[id.0]
    }

    pub fn process_mut(&mut self, id: ProcessId) -> &mut Process {
        &mut self.processes[id.0]
    }

    /// Find a task by name
    pub fn find_task(&self, name: &str) -> Option<TaskId> {
        self.tasks.iter().position(|t| t.name == name).map(TaskId)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Construction
    // ─────────────────────────────────────────────────────────────────────────

    /// Create a detached task, to be attached with [`Pipeline::add_subtask`]
    pub fn new_task(&mut self, name: &str) -> BatchflowResult<TaskId> {
        validate_name(name)?;

        let id = TaskId(self.tasks.len());
        self.tasks.push(Task {
            name: name.to_string(),
            version: None,
            notation: None,
            variables: VariableDeclarations::new(),
            processes: IndexMap::new(),
            parent: None,
        });
        Ok(id)
    }

    /// Create a process that is not yet part of any task
    pub fn new_process(&mut self, name: &str, kind: ExecutionKind) -> BatchflowResult<ProcessId> {
        validate_name(name)?;

        let id = ProcessId(self.processes.len());
        self.processes.push(Process {
            name: name.to_string(),
            notation: None,
            kind,
            requirements: Vec::new(),
            subtasks: Vec::new(),
            owner: None,
        });
        Ok(id)
    }

    /// Add `process` to `task`
    pub fn add_process(&mut self, task: TaskId, process: ProcessId) -> BatchflowResult<()> {
        let proc = &self.processes[process.0];

        if let Some(owner) = proc.owner {
            return Err(BatchflowError::AlreadyOwned {
                node: format!("Process '{}'", proc.name),
                owner: self.tasks[owner.0].name.clone(),
            });
        }

        if self.tasks[task.0].processes.contains_key(&proc.name) {
            return Err(BatchflowError::DuplicateProcess {
                task: self.tasks[task.0].name.clone(),
                process: proc.name.clone(),
            });
        }

        let name = proc.name.clone();
        self.tasks[task.0].processes.insert(name, process);
        self.processes[process.0].owner = Some(task);
        Ok(())
    }

    /// Make `process` spawn `task`
    pub fn add_subtask(&mut self, process: ProcessId, task: TaskId) -> BatchflowResult<()> {
        let sub = &self.tasks[task.0];

        if task == self.root {
            return Err(BatchflowError::AlreadyOwned {
                node: format!("Task '{}'", sub.name),
                owner: "the pipeline".to_string(),
            });
        }

        if let Some(parent) = sub.parent {
            return Err(BatchflowError::AlreadyOwned {
                node: format!("Task '{}'", sub.name),
                owner: self.processes[parent.0].name.clone(),
            });
        }

        self.tasks[task.0].parent = Some(process);
        self.processes[process.0].subtasks.push(task);
        Ok(())
    }

    /// Record that `process` runs after `requirement`.
    ///
    /// Depending on a setup process means depending on every leaf process of
    /// every task it spawns, not on the setup process itself. Nested setup
    /// processes are expanded depth first (tasks in spawn order, processes in
    /// insertion order). The expansion happens now: processes added to those
    /// tasks later are not picked up.
    pub fn requires(&mut self, process: ProcessId, requirement: ProcessId) {
        let mut targets = Vec::new();
        let mut visited = Vec::new();
        self.collect_leaves(requirement, &mut targets, &mut visited);

        self.processes[process.0].requirements.extend(targets);
    }

    fn collect_leaves(&self, process: ProcessId, out: &mut Vec<ProcessId>, visited: &mut Vec<TaskId>) {
        let proc = &self.processes[process.0];
        if !proc.is_setup() {
            out.push(process);
            return;
        }

        for &sub in &proc.subtasks {
            // a detached task may spawn itself; expand each task once
            if visited.contains(&sub) {
                continue;
            }
            visited.push(sub);
            for &child in self.tasks[sub.0].processes.values() {
                self.collect_leaves(child, out, visited);
            }
        }
    }

    /// Create a process, add it to `task` and wire its requirements
    pub fn create_process(
        &mut self,
        task: TaskId,
        name: &str,
        kind: ExecutionKind,
        requirements: &[ProcessId],
    ) -> BatchflowResult<ProcessId> {
        validate_name(name)?;
        self.ensure_free_name(task, name)?;

        let id = self.new_process(name, kind)?;
        self.add_process(task, id)?;
        for &req in requirements {
            self.requires(id, req);
        }

        let task_name = &self.tasks[task.0].name;
        debug!(task = %task_name, process = name, %kind, "created process");
        Ok(id)
    }

    /// Create a parallel process group in `task`.
    ///
    /// Builds a script-backed setup process `setup_<name>s` (with the given
    /// requirements) that spawns a task `<name>sTask` holding a process
    /// `<name>` of `kind`. Returns the inner process.
    pub fn create_parallel_process(
        &mut self,
        task: TaskId,
        name: &str,
        kind: ExecutionKind,
        requirements: &[ProcessId],
    ) -> BatchflowResult<ProcessId> {
        if !kind.is_batch_job() {
            return Err(BatchflowError::InvalidKind {
                process: name.to_string(),
                kind: kind.to_string(),
            });
        }

        let setup_name = format!("setup_{}s", name);
        let task_name = format!("{}sTask", name);
        validate_name(name)?;
        validate_name(&setup_name)?;
        validate_name(&task_name)?;
        self.ensure_free_name(task, &setup_name)?;

        let setup = self.create_process(task, &setup_name, ExecutionKind::ScriptBacked, requirements)?;
        let child = self.new_task(&task_name)?;
        self.add_subtask(setup, child)?;
        let inner = self.create_process(child, name, kind, &[])?;

        let parent_name = &self.tasks[task.0].name;
        debug!(
            task = %parent_name,
            setup = %setup_name,
            subtask = %task_name,
            "created parallel process"
        );
        Ok(inner)
    }

    fn ensure_free_name(&self, task: TaskId, name: &str) -> BatchflowResult<()> {
        let task = &self.tasks[task.0];
        if task.processes.contains_key(name) {
            return Err(BatchflowError::DuplicateProcess {
                task: task.name.clone(),
                process: name.to_string(),
            });
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Variables
    // ─────────────────────────────────────────────────────────────────────────

    /// Load pre-rendered variable declaration lines into `task`
    pub fn load_variables<I, S>(&mut self, task: TaskId, lines: I) -> BatchflowResult<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let task = &mut self.tasks[task.0];
        task.variables.load(&task.name, lines)
    }

    pub fn get_variable(&self, task: TaskId, key: &str) -> BatchflowResult<String> {
        let task = &self.tasks[task.0];
        task.variables.get(&task.name, key)
    }

    /// Update an existing variable; unknown keys are an error
    pub fn set_variable(&mut self, task: TaskId, key: &str, value: &str) -> BatchflowResult<()> {
        let task = &mut self.tasks[task.0];
        task.variables.set(&task.name, key, value)
    }

    /// Add a variable that is not yet declared
    pub fn declare_variable(&mut self, task: TaskId, key: &str, value: &str) -> BatchflowResult<()> {
        let task = &mut self.tasks[task.0];
        task.variables.declare(&task.name, key, value)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    /// Name used to refer to `process` from a dependency: qualified with its
    /// task name unless it belongs to the main task.
    pub fn qualified_name(&self, process: ProcessId) -> String {
        let proc = &self.processes[process.0];
        match proc.owner {
            Some(owner) if owner != self.root => {
                format!("{}.{}", self.tasks[owner.0].name, proc.name)
            }
            _ => proc.name.clone(),
        }
    }

    /// Tasks reachable from the main task, depth first in document order
    pub fn walk_tasks(&self) -> Vec<TaskId> {
        let mut order = Vec::new();
        self.walk_from(self.root, &mut order);
        order
    }

    fn walk_from(&self, task: TaskId, order: &mut Vec<TaskId>) {
        order.push(task);
        for process in self.tasks[task.0].processes.values() {
            for &sub in &self.processes[process.0].subtasks {
                self.walk_from(sub, order);
            }
        }
    }

    /// Processes reachable from the main task, in document order
    pub fn walk_processes(&self) -> Vec<ProcessId> {
        let mut order = Vec::new();
        self.walk_processes_from(self.root, &mut order);
        order
    }

    fn walk_processes_from(&self, task: TaskId, order: &mut Vec<ProcessId>) {
        for &process in self.tasks[task.0].processes.values() {
            order.push(process);
            for &sub in &self.processes[process.0].subtasks {
                self.walk_processes_from(sub, order);
            }
        }
    }
}
