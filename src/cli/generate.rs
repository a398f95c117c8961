// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 batchflow contributors

//! Generate command - write the launcher module and process scripts

use colored::Colorize;
use miette::Result;
use std::path::PathBuf;

use super::GlobalOptions;
use crate::artifacts::{ArtifactGenerator, GenerateOptions, LAUNCHER_VARIABLE};
use crate::utils::{print_info, print_success};

/// Run the generate command
pub fn run(
    definition: PathBuf,
    output_dir: PathBuf,
    clobber: bool,
    options: &GlobalOptions,
) -> Result<()> {
    let pipeline = options.load_pipeline(&definition)?;

    println!("{}", "Generating pipeline artifacts...".bold());
    println!();

    let report = ArtifactGenerator::new(
        &pipeline,
        GenerateOptions {
            output_dir: output_dir.clone(),
            clobber,
        },
    )
    .generate()?;

    match &report.launcher {
        Some(path) => print_success(&format!("Wrote launcher module {}", path.display())),
        None => {
            let name = pipeline.get_variable(pipeline.root(), LAUNCHER_VARIABLE)?;
            print_info(&format!("Kept existing launcher module {}", name));
        }
    }

    print_success(&format!(
        "Wrote {} process script(s) to {}",
        report.scripts_written,
        output_dir.display()
    ));

    if !clobber && options.verbose {
        println!();
        println!(
            "{}",
            "Existing files were left untouched. Use --clobber to overwrite them.".dimmed()
        );
    }

    Ok(())
}
