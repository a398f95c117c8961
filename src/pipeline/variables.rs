// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 batchflow contributors

//! Task variable declarations
//!
//! Declarations are kept as the pre-rendered `<var name="KEY">VALUE</var>`
//! lines they were loaded from. Lookup and update match the literal
//! `<var name="KEY">` marker at the start of a line. Keys are identifiers,
//! so the marker never needs escaping.

use super::identifier::is_identifier;
use crate::errors::{BatchflowError, BatchflowResult};

/// Ordered, uniquely keyed variable declarations of a task
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableDeclarations {
    lines: Vec<String>,
}

/// Marker that starts the declaration of `key`
fn marker(key: &str) -> String {
    format!(r#"<var name="{}">"#, key)
}

/// Render a single declaration line
pub fn render_var(key: &str, value: &str) -> String {
    format!("{}{}</var>", marker(key), escape_text(value))
}

/// Extract the key of a pre-rendered declaration line
fn key_of(line: &str) -> Option<&str> {
    let rest = line.trim().strip_prefix(r#"<var name=""#)?;
    let end = rest.find('"')?;
    rest[end..].starts_with(r#"">"#).then(|| &rest[..end])
}

fn escape_text(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn unescape_text(value: &str) -> String {
    value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

impl VariableDeclarations {
    /// Create an empty set of declarations
    pub fn new() -> Self {
        Self::default()
    }

    /// Load pre-rendered declaration lines.
    ///
    /// Blank lines are skipped. Every other line must be a `<var>` declaration
    /// and keys must be unique; nothing is stored if any line is rejected.
    pub fn load<I, S>(&mut self, task: &str, lines: I) -> BatchflowResult<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut staged = self.lines.clone();

        for line in lines {
            let line = line.as_ref().trim();
            if line.is_empty() {
                continue;
            }

            let key = key_of(line)
                .filter(|key| is_identifier(key))
                .ok_or_else(|| BatchflowError::MalformedVariable {
                    line: line.to_string(),
                })?;

            if staged.iter().any(|l| key_of(l) == Some(key)) {
                return Err(BatchflowError::DuplicateVariable {
                    task: task.to_string(),
                    key: key.to_string(),
                });
            }

            staged.push(line.to_string());
        }

        self.lines = staged;
        Ok(())
    }

    fn position(&self, key: &str) -> Option<usize> {
        let marker = marker(key);
        self.lines
            .iter()
            .position(|line| line.trim_start().starts_with(&marker))
    }

    /// Whether `key` is declared
    pub fn contains(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    /// Get the value of `key`
    pub fn get(&self, task: &str, key: &str) -> BatchflowResult<String> {
        let idx = self.position(key).ok_or_else(|| BatchflowError::UnknownVariable {
            task: task.to_string(),
            key: key.to_string(),
        })?;

        let line = self.lines[idx].trim();
        let value = line[marker(key).len()..]
            .strip_suffix("</var>")
            .ok_or_else(|| BatchflowError::MalformedVariable {
                line: line.to_string(),
            })?;

        Ok(unescape_text(value))
    }

    /// Replace the value of an existing `key`
    pub fn set(&mut self, task: &str, key: &str, value: &str) -> BatchflowResult<()> {
        let idx = self.position(key).ok_or_else(|| BatchflowError::UnknownVariable {
            task: task.to_string(),
            key: key.to_string(),
        })?;

        self.lines[idx] = render_var(key, value);
        Ok(())
    }

    /// Append a declaration for a new `key`
    pub fn declare(&mut self, task: &str, key: &str, value: &str) -> BatchflowResult<()> {
        if !is_identifier(key) {
            return Err(BatchflowError::MalformedVariable {
                line: render_var(key, value),
            });
        }

        if self.contains(key) {
            return Err(BatchflowError::DuplicateVariable {
                task: task.to_string(),
                key: key.to_string(),
            });
        }

        self.lines.push(render_var(key, value));
        Ok(())
    }

    /// Declared keys, in declaration order
    pub fn keys(&self) -> Vec<&str> {
        self.lines.iter().filter_map(|l| key_of(l)).collect()
    }

    /// The pre-rendered lines, in declaration order
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
