//! Per-file orchestration - ties together parsing, the rewrite pass, and reporting

use crate::ast::Rewrite;
use crate::matcher::CallbackConvention;
use crate::parser;
use crate::report::RewriteReport;
use crate::transform;
use anyhow::{Context, Result};
use std::path::Path;
use swc_common::{sync::Lrc, SourceMap};
use swc_ecma_ast::Module;
use tracing::debug;

/// Parse `src` into `source_map` and apply the rewrite pass
pub fn transform_with_source_map(
    src: &str,
    source_map: &Lrc<SourceMap>,
    filename: &str,
    convention: &CallbackConvention,
) -> Result<(Module, Vec<Rewrite>)> {
    let mut module = parser::parse_source(src, source_map, filename)?;
    let rewrites = transform::transform_module(&mut module, convention)
        .with_context(|| format!("Failed to transform {}", filename))?;
    Ok((module, rewrites))
}

/// Transform a source file in memory and report every rewritten function
pub fn analyze_file(
    path: &Path,
    source_map: &Lrc<SourceMap>,
    convention: &CallbackConvention,
) -> Result<Vec<RewriteReport>> {
    let src = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    let file = path.to_string_lossy().to_string();

    let (_module, rewrites) = transform_with_source_map(&src, source_map, &file, convention)?;
    debug!(file = %file, rewrites = rewrites.len(), "transformed file");

    Ok(rewrites
        .iter()
        .map(|rewrite| RewriteReport::new(rewrite, file.clone(), source_map))
        .collect())
}
