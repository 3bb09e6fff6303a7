// Per-file size and complexity metrics
//
// Calculates:
// - Total, code, comment and blank line counts
// - A basic cyclomatic complexity estimate (1 + decision points)
//
// Python complexity is counted from syntax nodes by the Python extractor;
// C# complexity is counted from tokens on comment/string-masked text.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Metrics for a single file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetrics {
    /// Total lines in file
    pub total_lines: usize,
    /// Lines of code (non-blank, non-comment)
    pub code_lines: usize,
    /// Comment lines
    pub comment_lines: usize,
    /// Blank lines
    pub blank_lines: usize,
    /// Basic cyclomatic complexity estimate
    pub complexity: usize,
}

/// Comment syntax used when counting lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentStyle {
    /// `#` line comments
    Hash,
    /// `//` line comments and `/* */` blocks
    CFamily,
}

impl FileMetrics {
    /// Count lines of `source`; complexity starts at the base value of 1
    pub fn from_source(source: &str, style: CommentStyle) -> Self {
        let mut metrics = FileMetrics {
            complexity: 1,
            ..Default::default()
        };
        let mut in_block = false;

        for line in source.lines() {
            metrics.total_lines += 1;
            let trimmed = line.trim();

            if trimmed.is_empty() {
                metrics.blank_lines += 1;
                continue;
            }

            match style {
                CommentStyle::Hash => {
                    if trimmed.starts_with('#') {
                        metrics.comment_lines += 1;
                    } else {
                        metrics.code_lines += 1;
                    }
                }
                CommentStyle::CFamily => {
                    if in_block {
                        metrics.comment_lines += 1;
                        if trimmed.contains("*/") {
                            in_block = false;
                        }
                    } else if trimmed.starts_with("//") {
                        metrics.comment_lines += 1;
                    } else if trimmed.starts_with("/*") {
                        metrics.comment_lines += 1;
                        in_block = !trimmed.contains("*/");
                    } else {
                        metrics.code_lines += 1;
                    }
                }
            }
        }

        metrics
    }

    /// Add decision points to the complexity estimate
    pub fn add_decisions(&mut self, count: usize) {
        self.complexity += count;
    }
}

static CSHARP_DECISION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:if|while|for|foreach|case|catch)\b|&&|\|\||\?\?|\s\?\s").unwrap()
});

/// Count decision points in C# text whose comments and strings are masked
pub fn csharp_decisions(masked: &str) -> usize {
    CSHARP_DECISION_RE.find_iter(masked).count()
}
