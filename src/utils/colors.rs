// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 batchflow contributors

//! Terminal output helpers
//!
//! Consistent markers for CLI status lines.

use colored::Colorize;

/// Print a styled section
pub fn print_section(title: &str) {
    println!();
    println!("{}:", title.bold());
}

/// Print a success check
pub fn print_success(msg: &str) {
    println!("  {} {}", "✓".green(), msg);
}

/// Print an error cross
pub fn print_error(msg: &str) {
    eprintln!("  {} {}", "✗".red(), msg);
}

/// Print an info item
pub fn print_info(msg: &str) {
    println!("  {} {}", "→".blue(), msg);
}
