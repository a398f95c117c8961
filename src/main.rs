// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 batchflow contributors

//! batchflow - Batch pipeline builder
//!
//! Build workflow engine pipeline documents and their companion stubs.

use clap::Parser;
use miette::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use batchflow::cli::{Cli, Commands, GlobalOptions};

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "batchflow=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();

    // Change to specified directory if provided
    if let Some(ref dir) = cli.directory {
        std::env::set_current_dir(dir).map_err(|e| {
            miette::miette!("Failed to change to directory '{}': {}", dir.display(), e)
        })?;
    }

    let options = GlobalOptions {
        config: cli.config,
        data_dir: cli.data_dir,
        verbose: cli.verbose,
    };

    // Dispatch to command handlers
    match cli.command {
        Commands::Render { definition, output } => {
            batchflow::cli::render::run(definition, output, &options)
        }
        Commands::Generate {
            definition,
            output_dir,
            clobber,
        } => batchflow::cli::generate::run(definition, output_dir, clobber, &options),
        Commands::Validate { definition } => batchflow::cli::validate::run(definition, &options),
        Commands::Graph { definition, format } => {
            batchflow::cli::graph::run(definition, format, &options)
        }
    }
}
