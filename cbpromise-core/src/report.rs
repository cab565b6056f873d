//! Reporting and output generation
//!
//! Global invariants enforced:
//! - Deterministic output ordering
//! - Byte-for-byte identical output across runs

use crate::ast::Rewrite;
use serde::{Deserialize, Serialize};

/// One rewritten function
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RewriteReport {
    pub file: String,
    pub function: String,
    pub line: u32,
    /// Holder of the inner function
    #[serde(rename = "fn")]
    pub inner_fn: String,
    pub resolve: String,
    pub reject: String,
}

impl RewriteReport {
    /// Create a report for one rewrite
    pub fn new(rewrite: &Rewrite, file: String, source_map: &swc_common::SourceMap) -> Self {
        let line = rewrite.start_line(source_map);
        let function = rewrite
            .name
            .clone()
            .unwrap_or_else(|| format!("<anonymous>@{}:{}", file, line));

        RewriteReport {
            file,
            function,
            line,
            inner_fn: rewrite.names.inner_fn.clone(),
            resolve: rewrite.names.resolve.clone(),
            reject: rewrite.names.reject.clone(),
        }
    }
}

/// Sort reports deterministically
pub fn sort_reports(mut reports: Vec<RewriteReport>) -> Vec<RewriteReport> {
    reports.sort_by(|a, b| {
        a.file
            .cmp(&b.file)
            .then_with(|| a.line.cmp(&b.line))
            .then_with(|| a.function.cmp(&b.function))
    });
    reports
}

/// Render reports as text output
pub fn render_text(reports: &[RewriteReport]) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "{:<30} {:<6} {:<24} {}\n",
        "FILE", "LINE", "FUNCTION", "HELPERS"
    ));

    for report in reports {
        output.push_str(&format!(
            "{:<30} {:<6} {:<24} {}, {}, {}\n",
            truncate_or_pad(&report.file, 30),
            report.line,
            truncate_or_pad(&report.function, 24),
            report.inner_fn,
            report.resolve,
            report.reject,
        ));
    }

    output.push_str(&format!("\n{} function(s) rewritten\n", reports.len()));
    output
}

/// Render reports as JSON output
pub fn render_json(reports: &[RewriteReport]) -> String {
    serde_json::to_string_pretty(reports).unwrap_or_else(|_| "[]".to_string())
}

/// Truncate or pad string to fixed width
fn truncate_or_pad(s: &str, width: usize) -> String {
    if s.chars().count() > width {
        let kept: String = s.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", kept)
    } else {
        format!("{:<width$}", s, width = width)
    }
}
