// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 batchflow contributors

//! Job kinds and their execution directives

use serde::{Deserialize, Serialize};

/// How the workflow engine runs a process
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionKind {
    /// Batch job with the standard CPU ceiling
    #[default]
    #[serde(rename = "job", alias = "standard")]
    StandardJob,
    /// Batch job with the long CPU ceiling
    #[serde(alias = "long")]
    LongJob,
    /// Embedded script calling a launcher function of the same name
    #[serde(rename = "script")]
    ScriptBacked,
}

impl ExecutionKind {
    /// Placeholder for the CPU-time ceiling of a batch job
    fn max_cpu(&self) -> Option<&'static str> {
        match self {
            Self::StandardJob => Some("${MAXCPU}"),
            Self::LongJob => Some("${MAXCPULONG}"),
            Self::ScriptBacked => None,
        }
    }

    /// The `<job/>` directive for a process named `process_name`, or `None`
    /// for script-backed processes.
    pub fn directive(&self, process_name: &str) -> Option<String> {
        self.max_cpu().map(|max_cpu| {
            format!(
                r#"<job maxCPU="{}" batchOptions="${{BATCH_OPTIONS}}" executable="${{SCRIPT_LOCATION}}/{}"/>"#,
                max_cpu, process_name
            )
        })
    }

    /// Whether the process is dispatched as a batch job
    pub fn is_batch_job(&self) -> bool {
        !matches!(self, Self::ScriptBacked)
    }
}

impl std::fmt::Display for ExecutionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StandardJob => write!(f, "job"),
            Self::LongJob => write!(f, "long_job"),
            Self::ScriptBacked => write!(f, "script"),
        }
    }
}

impl std::str::FromStr for ExecutionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "job" | "standard" => Ok(Self::StandardJob),
            "long_job" | "long" => Ok(Self::LongJob),
            "script" => Ok(Self::ScriptBacked),
            _ => Err(format!("Unknown job kind: {}", s)),
        }
    }
}
