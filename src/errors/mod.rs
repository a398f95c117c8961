// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 batchflow contributors

//! Error types
//!
//! Every construction error is raised before the pipeline tree is touched,
//! so a failed call never leaves a partially built node behind.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for batchflow operations
pub type BatchflowResult<T> = Result<T, BatchflowError>;

/// Main error type for batchflow
#[derive(Error, Debug, Diagnostic)]
pub enum BatchflowError {
    // ─────────────────────────────────────────────────────────────────────────
    // Construction Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Invalid name '{name}': {reason}")]
    #[diagnostic(
        code(batchflow::invalid_name),
        help("Names must be at most 30 characters of letters, digits and underscores, not starting with a digit")
    )]
    InvalidName { name: String, reason: String },

    #[error("{node} is already owned by '{owner}'")]
    #[diagnostic(
        code(batchflow::already_owned),
        help("A process belongs to exactly one task and a task is spawned by at most one process")
    )]
    AlreadyOwned { node: String, owner: String },

    #[error("Process '{process}' cannot use job kind '{kind}'")]
    #[diagnostic(
        code(batchflow::invalid_kind),
        help("Parallel processes must use 'job' or 'long_job'")
    )]
    InvalidKind { process: String, kind: String },

    #[error("Task '{task}' already contains a process named '{process}'")]
    #[diagnostic(code(batchflow::duplicate_process))]
    DuplicateProcess { task: String, process: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Variable Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Task '{task}' has no variable '{key}'")]
    #[diagnostic(
        code(batchflow::unknown_variable),
        help("Add '{key}' to the variables file or declare it explicitly")
    )]
    UnknownVariable { task: String, key: String },

    #[error("Task '{task}' already declares variable '{key}'")]
    #[diagnostic(code(batchflow::duplicate_variable))]
    DuplicateVariable { task: String, key: String },

    #[error("Malformed variable declaration: {line}")]
    #[diagnostic(
        code(batchflow::malformed_variable),
        help("Variable lines look like <var name=\"KEY\">VALUE</var>")
    )]
    MalformedVariable { line: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Definition Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Process '{process}' refers to unknown process '{reference}'")]
    #[diagnostic(
        code(batchflow::unknown_reference),
        help("Declare '{reference}' before it is required, or qualify it as 'task.process'")
    )]
    UnknownReference { process: String, reference: String },

    #[error("Unknown task '{task}'")]
    #[diagnostic(code(batchflow::unknown_task))]
    UnknownTask { task: String },

    #[error("Invalid pipeline definition: {reason}")]
    #[diagnostic(code(batchflow::invalid_definition))]
    InvalidDefinition {
        reason: String,
        #[help]
        help: Option<String>,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // File Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Failed to read file '{path}': {error}")]
    #[diagnostic(code(batchflow::file_read_error))]
    FileReadError { path: PathBuf, error: String },

    #[error("Failed to write file '{path}': {error}")]
    #[diagnostic(code(batchflow::file_write_error))]
    FileWriteError { path: PathBuf, error: String },

    // ─────────────────────────────────────────────────────────────────────────
    // IO/System Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("IO error: {message}")]
    #[diagnostic(code(batchflow::io_error))]
    Io { message: String },

    #[error("YAML parsing error: {message}")]
    #[diagnostic(code(batchflow::yaml_error))]
    Yaml { message: String },
}

impl From<std::io::Error> for BatchflowError {
    fn from(e: std::io::Error) -> Self {
        Self::Io { message: e.to_string() }
    }
}

impl From<serde_yaml::Error> for BatchflowError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Yaml { message: e.to_string() }
    }
}

impl BatchflowError {
    /// Create an invalid name error
    pub fn invalid_name(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidName {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    /// Create a definition error with an optional hint
    pub fn invalid_definition(reason: impl Into<String>, help: Option<&str>) -> Self {
        Self::InvalidDefinition {
            reason: reason.into(),
            help: help.map(String::from),
        }
    }

    /// Whether this error was raised while building the tree
    pub fn is_construction_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidName { .. }
                | Self::AlreadyOwned { .. }
                | Self::InvalidKind { .. }
                | Self::DuplicateProcess { .. }
                | Self::UnknownVariable { .. }
                | Self::DuplicateVariable { .. }
                | Self::MalformedVariable { .. }
        )
    }
}
