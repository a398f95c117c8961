// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 batchflow contributors

//! CLI command definitions and handlers
//!
//! Defines the command-line interface for batchflow.

pub mod generate;
pub mod graph;
pub mod render;
pub mod validate;

use clap::{Parser, Subcommand, ValueEnum};
use miette::Result;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::EngineConfig;
use crate::pipeline::{Pipeline, PipelineDefinition};

/// Batch pipeline builder
///
/// Turn pipeline definitions into workflow engine documents and stubs.
#[derive(Parser, Debug)]
#[clap(
    name = "batchflow",
    version,
    about = "Build workflow engine pipeline documents from pipeline definitions",
    long_about = None,
    after_help = "Examples:\n\
        batchflow render pipeline.yaml -o pipeline.xml   Write the XML document\n\
        batchflow generate pipeline.yaml -o scripts      Write launcher and script stubs\n\
        batchflow graph pipeline.yaml -f dot             Show the dependency graph\n\n\
        See 'batchflow <command> --help' for more information on a specific command."
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[clap(short, long, global = true)]
    pub verbose: bool,

    /// Change to directory before executing
    #[clap(short = 'C', long, global = true, value_name = "DIR")]
    pub directory: Option<PathBuf>,

    /// Engine configuration file
    #[clap(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory holding the header and main task variables files
    #[clap(long, global = true, value_name = "DIR", env = "BATCHFLOW_DATA_DIR")]
    pub data_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render the pipeline document
    Render {
        /// Pipeline definition file
        #[clap(default_value = "pipeline.yaml")]
        definition: PathBuf,

        /// Output file (default: stdout)
        #[clap(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate the launcher module and process scripts
    Generate {
        /// Pipeline definition file
        #[clap(default_value = "pipeline.yaml")]
        definition: PathBuf,

        /// Output directory
        #[clap(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// Overwrite existing files
        #[clap(long)]
        clobber: bool,
    },

    /// Validate a pipeline definition
    Validate {
        /// Pipeline definition file
        #[clap(default_value = "pipeline.yaml")]
        definition: PathBuf,
    },

    /// Show the dependency graph
    Graph {
        /// Pipeline definition file
        #[clap(default_value = "pipeline.yaml")]
        definition: PathBuf,

        /// Output format
        #[clap(short, long, value_enum, default_value = "text")]
        format: GraphFormat,
    },
}

/// Options shared by every command
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    pub config: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
    pub verbose: bool,
}

impl GlobalOptions {
    /// Engine configuration from `--config` and `--data-dir`, if either was given
    pub fn engine_config(&self) -> Result<Option<EngineConfig>> {
        let base = match &self.config {
            Some(path) => Some(EngineConfig::from_file(path)?),
            None => None,
        };

        Ok(match &self.data_dir {
            Some(dir) => Some(base.unwrap_or_default().with_data_dir(dir)),
            None => base,
        })
    }

    /// Load and build the pipeline described by `definition`
    pub fn load_pipeline(&self, definition: &Path) -> Result<Pipeline> {
        if !definition.exists() {
            return Err(miette::miette!(
                "Pipeline definition not found: {}",
                definition.display()
            ));
        }

        let def = PipelineDefinition::from_file(definition)?;

        let pipeline = match self.engine_config()? {
            Some(config) => {
                debug!(data_dir = %config.data_dir.display(), "loading engine configuration");
                def.build_from_source(&config, &config.source())?
            }
            None => def.build()?,
        };

        Ok(pipeline)
    }
}

/// Graph output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GraphFormat {
    Text,
    Dot,
    Mermaid,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use tempfile::TempDir;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_generate() {
        let cli = Cli::parse_from(["batchflow", "generate", "wl.yaml", "-o", "out", "--clobber"]);
        match cli.command {
            Commands::Generate {
                definition,
                output_dir,
                clobber,
            } => {
                assert_eq!(definition, PathBuf::from("wl.yaml"));
                assert_eq!(output_dir, PathBuf::from("out"));
                assert!(clobber);
            }
            _ => panic!("Expected generate command"),
        }
    }

    #[test]
    fn test_parse_graph_format() {
        let cli = Cli::parse_from(["batchflow", "graph", "-f", "mermaid"]);
        match cli.command {
            Commands::Graph { definition, format } => {
                assert_eq!(definition, PathBuf::from("pipeline.yaml"));
                assert_eq!(format, GraphFormat::Mermaid);
            }
            _ => panic!("Expected graph command"),
        }
    }

    #[test]
    fn test_engine_config_from_data_dir() {
        let options = GlobalOptions {
            data_dir: Some(PathBuf::from("/srv/data")),
            ..Default::default()
        };
        let config = options.engine_config().unwrap().unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/srv/data"));
        assert!(GlobalOptions::default().engine_config().unwrap().is_none());
    }

    #[test]
    fn test_load_pipeline_with_data_dir() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("pipeline_header.txt"), "<!-- hdr -->\n").unwrap();
        std::fs::write(
            temp.path().join("main_task_variables.txt"),
            "<var name=\"SCRIPT_NAME\">wl.py</var>\n",
        )
        .unwrap();
        let def = temp.path().join("pipeline.yaml");
        std::fs::write(&def, "name: wl\nprocesses:\n  - name: a\n").unwrap();

        let options = GlobalOptions {
            data_dir: Some(temp.path().to_path_buf()),
            ..Default::default()
        };
        let pipeline = options.load_pipeline(&def).unwrap();

        assert_eq!(pipeline.header(), "<!-- hdr -->");
        assert_eq!(pipeline.get_variable(pipeline.root(), "SCRIPT_NAME").unwrap(), "wl.py");
    }

    #[test]
    fn test_load_missing_definition() {
        let temp = TempDir::new().unwrap();
        let result = GlobalOptions::default().load_pipeline(&temp.path().join("nope.yaml"));
        assert!(result.is_err());
    }
}
