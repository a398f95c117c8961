// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 batchflow contributors

//! Minimal indenting XML writer

const INDENT: &str = "    ";

/// Escape text for use in element content
pub fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Escape text for use in a double-quoted attribute value
pub fn escape_attr(text: &str) -> String {
    escape_text(text).replace('"', "&quot;")
}

/// Line-oriented XML builder tracking the current nesting depth
#[derive(Debug, Default)]
pub struct XmlWriter {
    out: String,
    depth: usize,
}

impl XmlWriter {
    pub fn new() -> Self {
        Self::default()
    }

    fn attrs(attrs: &[(&str, &str)]) -> String {
        attrs
            .iter()
            .map(|(k, v)| format!(" {}=\"{}\"", k, escape_attr(v)))
            .collect()
    }

    /// Append a line at the current depth, without escaping
    pub fn line(&mut self, text: &str) {
        for _ in 0..self.depth {
            self.out.push_str(INDENT);
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    /// Append text verbatim, one line per input line, without indentation
    pub fn raw(&mut self, text: &str) {
        for line in text.lines() {
            self.out.push_str(line);
            self.out.push('\n');
        }
    }

    /// Open an element and descend into it
    pub fn open(&mut self, tag: &str, attrs: &[(&str, &str)]) {
        self.line(&format!("<{}{}>", tag, Self::attrs(attrs)));
        self.depth += 1;
    }

    /// Close the innermost element
    pub fn close(&mut self, tag: &str) {
        self.depth = self.depth.saturating_sub(1);
        self.line(&format!("</{}>", tag));
    }

    /// An element without content
    pub fn empty(&mut self, tag: &str, attrs: &[(&str, &str)]) {
        self.line(&format!("<{}{}/>", tag, Self::attrs(attrs)));
    }

    /// An element holding escaped text
    pub fn text(&mut self, tag: &str, text: &str) {
        self.line(&format!("<{}>{}</{}>", tag, escape_text(text), tag));
    }

    pub fn finish(self) -> String {
        self.out
    }
}
