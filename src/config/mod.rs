// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 batchflow contributors

//! Engine configuration and line sources
//!
//! The header preamble and the main task variables come from plain text
//! files in a data directory. The directory is an explicit [`EngineConfig`]
//! value; the library never consults the process environment for it.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::errors::{BatchflowError, BatchflowResult};

/// Where configuration text is read from
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EngineConfig {
    /// Directory holding the header and variables files
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Pipeline header preamble, relative to `data_dir`
    #[serde(default = "default_header_file")]
    pub header_file: String,

    /// Main task variable declarations, relative to `data_dir`
    #[serde(default = "default_variables_file")]
    pub variables_file: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            header_file: default_header_file(),
            variables_file: default_variables_file(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_header_file() -> String {
    "pipeline_header.txt".to_string()
}

fn default_variables_file() -> String {
    "main_task_variables.txt".to_string()
}

impl EngineConfig {
    /// Load configuration from a YAML file
    pub fn from_file(path: &Path) -> BatchflowResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| BatchflowError::FileReadError {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> BatchflowResult<Self> {
        serde_yaml::from_str(yaml).map_err(Into::into)
    }

    /// Override the data directory
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    /// A line source reading from `data_dir`
    pub fn source(&self) -> DirectorySource {
        DirectorySource::new(self.data_dir.clone())
    }
}

/// Supplies named text resources as lines
pub trait LineSource {
    /// Load the resource `name` as a list of lines
    fn load_lines(&self, name: &str) -> BatchflowResult<Vec<String>>;
}

/// Reads resources as files relative to a base directory
#[derive(Debug, Clone)]
pub struct DirectorySource {
    base_dir: PathBuf,
}

impl DirectorySource {
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}

impl LineSource for DirectorySource {
    fn load_lines(&self, name: &str) -> BatchflowResult<Vec<String>> {
        let path = self.base_dir.join(name);
        let content = std::fs::read_to_string(&path).map_err(|e| BatchflowError::FileReadError {
            path: path.clone(),
            error: e.to_string(),
        })?;

        Ok(content.lines().map(String::from).collect())
    }
}

/// In-memory resources, for tests and embedded defaults
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    resources: HashMap<String, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resource
    pub fn with(mut self, name: &str, content: &str) -> Self {
        self.resources.insert(name.to_string(), content.to_string());
        self
    }
}

impl LineSource for MemorySource {
    fn load_lines(&self, name: &str) -> BatchflowResult<Vec<String>> {
        self.resources
            .get(name)
            .map(|content| content.lines().map(String::from).collect())
            .ok_or_else(|| BatchflowError::FileReadError {
                path: PathBuf::from(name),
                error: "no such resource".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::from_yaml("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.variables_file, "main_task_variables.txt");
    }

    #[test]
    fn test_load_config() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("batchflow.yaml");
        std::fs::write(
            &path,
            r#"
data_dir: /opt/pipelines/data
header_file: header.xml
"#,
        )
        .unwrap();

        let config = EngineConfig::from_file(&path).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/opt/pipelines/data"));
        assert_eq!(config.header_file, "header.xml");
        assert_eq!(config.variables_file, "main_task_variables.txt");
    }

    #[test]
    fn test_missing_config_file() {
        let temp = TempDir::new().unwrap();
        let err = EngineConfig::from_file(&temp.path().join("missing.yaml")).unwrap_err();
        assert!(matches!(err, BatchflowError::FileReadError { .. }));
    }

    #[test]
    fn test_directory_source() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("vars.txt"), "one\ntwo\n").unwrap();

        let config = EngineConfig::default().with_data_dir(temp.path());
        let lines = config.source().load_lines("vars.txt").unwrap();
        assert_eq!(lines, vec!["one", "two"]);
        assert!(config.source().load_lines("absent.txt").is_err());
    }

    #[test]
    fn test_memory_source() {
        let source = MemorySource::new().with("header", "a\nb");
        assert_eq!(source.load_lines("header").unwrap(), vec!["a", "b"]);
        assert!(source.load_lines("other").is_err());
    }
}
