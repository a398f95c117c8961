// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 batchflow contributors

//! Pipeline model
//!
//! This module defines the pipeline tree (tasks, processes, dependencies),
//! the construction API used to build it, and the YAML definition format.

mod dag;
mod definition;
mod graph;
mod identifier;
mod job;
mod variables;

pub use dag::{DependencyGraph, EdgeKind};
pub use definition::{PipelineDefinition, ProcessDefinition, TaskDefinition};
pub use graph::{Pipeline, Process, ProcessId, Task, TaskId};
pub use identifier::{is_valid_name, validate_name, MAX_NAME_LEN};
pub use job::ExecutionKind;
pub use variables::{render_var, VariableDeclarations};
