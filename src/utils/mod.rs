// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 batchflow contributors

//! Utility modules
//!
//! Common utilities for the batchflow CLI.

pub mod colors;

pub use colors::*;
