// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 batchflow contributors

//! Validate command - build a pipeline definition and summarize it

use colored::Colorize;
use miette::Result;
use std::path::PathBuf;

use super::GlobalOptions;
use crate::pipeline::Pipeline;
use crate::utils::{print_error, print_section, print_success};

/// Run the validate command
pub fn run(definition: PathBuf, options: &GlobalOptions) -> Result<()> {
    println!("{}", "Validating pipeline...".bold());
    println!();

    let pipeline = match options.load_pipeline(&definition) {
        Ok(p) => p,
        Err(e) => {
            print_error("Failed to build pipeline");
            println!();
            return Err(e);
        }
    };

    print_success("Pipeline definition is valid");

    let tasks = pipeline.walk_tasks();
    let processes = pipeline.walk_processes();
    println!(
        "  Name: {} (version {})",
        pipeline.main_task().name(),
        pipeline.main_task().version().unwrap_or("-")
    );
    println!("  Tasks: {}", tasks.len());
    println!("  Processes: {}", processes.len());

    if options.verbose {
        print_summary(&pipeline);
    }

    println!();
    println!("{}", "Pipeline is valid!".green().bold());
    Ok(())
}

fn print_summary(pipeline: &Pipeline) {
    for task in pipeline.walk_tasks() {
        let task = pipeline.task(task);
        print_section(task.name());

        for id in task.processes() {
            let process = pipeline.process(id);
            let deps: Vec<String> = process
                .requirements()
                .iter()
                .map(|&r| pipeline.qualified_name(r))
                .collect();

            let deps = if deps.is_empty() {
                String::new()
            } else {
                format!(" [after: {}]", deps.join(", "))
            };
            println!("    - {} ({}){}", process.name(), process.kind, deps.dimmed());
        }
    }
}
