// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 batchflow contributors

//! # batchflow - Batch Pipeline Builder
//!
//! `batchflow` builds hierarchical batch-pipeline descriptions for the SLAC
//! workflow engine: tasks holding named processes, dependencies between
//! processes, and setup processes that fan out into parallel subtasks.
//!
//! ## Features
//!
//! - **Pipeline tree** - Tasks and processes with checked names and single ownership
//! - **Parallel processes** - One call builds the setup process, subtask and inner process
//! - **XML rendering** - Deterministic engine documents with nested subtasks
//! - **Companion stubs** - Launcher module and per-process scripts that respect hand edits
//!
//! ## Example
//!
//! ```
//! use batchflow::{ExecutionKind, Pipeline};
//!
//! let mut pipeline = Pipeline::new("JC_WLPipeline", "0.3")?;
//! let main = pipeline.root();
//! let catsel = pipeline.create_process(main, "catalogSelection", ExecutionKind::StandardJob, &[])?;
//! let null_test = pipeline.create_parallel_process(
//!     main,
//!     "catSelNullTest",
//!     ExecutionKind::StandardJob,
//!     &[catsel],
//! )?;
//! pipeline.create_process(main, "TJPCosmo", ExecutionKind::LongJob, &[null_test])?;
//!
//! let xml = pipeline.to_xml();
//! assert!(xml.contains(r#"<after process="catSelNullTestsTask.catSelNullTest"/>"#));
//! # Ok::<(), batchflow::BatchflowError>(())
//! ```

pub mod artifacts;
pub mod cli;
pub mod config;
pub mod errors;
pub mod pipeline;
pub mod render;
pub mod utils;

// Re-export commonly used types
pub use artifacts::{ArtifactGenerator, GenerateOptions, GenerationReport};
pub use config::{DirectorySource, EngineConfig, LineSource, MemorySource};
pub use errors::{BatchflowError, BatchflowResult};
pub use pipeline::{ExecutionKind, Pipeline, PipelineDefinition, ProcessId, TaskId};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
