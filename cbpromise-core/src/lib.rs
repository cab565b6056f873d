//! cbpromise core library - rewrites callback-last async functions so they also return a promise

#![deny(warnings)]

// Global invariants enforced in this crate:
// - A function is rewritten only if it is async and its last parameter is the callback name
// - Non-matching functions are left byte-for-byte untouched in the tree
// - Allocated identifiers never collide with any name already used in the module
// - No global mutable state
// - Deterministic traversal and output order must be explicit

pub mod analysis;
pub mod ast;
pub mod config;
pub mod error;
pub mod matcher;
pub mod names;
pub mod parser;
pub mod report;
pub mod rule;
pub mod runtime;
pub mod template;
pub mod transform;

pub use ast::{FunctionNode, HelperNames, Rewrite};
pub use config::ResolvedConfig;
pub use error::TransformError;
pub use matcher::{CallbackConvention, DEFAULT_CALLBACK_NAME};
pub use names::{ModuleScope, NameAllocator};
pub use report::{render_json, render_text, sort_reports, RewriteReport};
pub use rule::PromisifyRule;
pub use runtime::{call_dual, Callback, Deferred, DeferredError, WrappedCallback};
pub use transform::transform_module;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use swc_common::{sync::Lrc, SourceMap};
use swc_ecma_ast::Module;
use tracing::warn;

#[derive(Debug, Clone, Default)]
pub struct PlanOptions {
    pub convention: CallbackConvention,
}

/// Parse and transform a single source text
///
/// The dialect is chosen from `filename`'s extension.
pub fn transform_source(
    src: &str,
    filename: &str,
    convention: &CallbackConvention,
) -> Result<(Module, Vec<Rewrite>)> {
    let cm: Lrc<SourceMap> = Default::default();
    analysis::transform_with_source_map(src, &cm, filename, convention)
}

/// Plan rewrites for files at the given path with default configuration
pub fn plan(path: &Path, options: PlanOptions) -> Result<Vec<RewriteReport>> {
    plan_with_config(path, options, None)
}

/// Plan rewrites for files at the given path with optional resolved configuration
///
/// Files are transformed in memory only. A file that fails to read, parse or
/// transform is skipped with a warning.
pub fn plan_with_config(
    path: &Path,
    options: PlanOptions,
    resolved_config: Option<&ResolvedConfig>,
) -> Result<Vec<RewriteReport>> {
    let cm: Lrc<SourceMap> = Default::default();
    let mut all_reports = Vec::new();

    let source_files = collect_source_files(path)?;

    let mut skipped_files: usize = 0;
    for file_path in source_files {
        if let Some(config) = resolved_config {
            if !config.should_include(&file_path) {
                continue;
            }
        }

        match analysis::analyze_file(&file_path, &cm, &options.convention) {
            Ok(reports) => all_reports.extend(reports),
            Err(e) => {
                warn!(file = %file_path.display(), "skipping file: {:#}", e);
                skipped_files += 1;
            }
        }
    }
    if skipped_files > 0 {
        warn!("skipped {} file(s) due to errors", skipped_files);
    }

    Ok(sort_reports(all_reports))
}

fn is_supported_source_file(path: &Path) -> bool {
    parser::Dialect::from_path(path).is_some()
}

/// Collect all supported source files from a path (file or directory)
///
/// Supported extensions:
/// - TypeScript: .ts, .mts, .cts (excludes declaration files)
/// - TSX: .tsx
/// - JavaScript: .js, .mjs, .cjs
/// - JSX: .jsx
fn collect_source_files(path: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    if path.is_file() {
        if is_supported_source_file(path) {
            files.push(path.to_path_buf());
        }
    } else if path.is_dir() {
        collect_source_files_recursive(path, &mut files)?;
    } else {
        anyhow::bail!("Path does not exist: {}", path.display());
    }

    // Sort files for deterministic order
    files.sort();

    Ok(files)
}

/// Returns true for directory names that should not be traversed
fn is_skipped_dir(name: &str) -> bool {
    name.starts_with('.') || name == "node_modules"
}

fn process_dir_entry(path: PathBuf, metadata: std::fs::Metadata, files: &mut Vec<PathBuf>) -> Result<()> {
    if metadata.is_symlink() {
        return Ok(());
    }

    if metadata.is_dir() {
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            if is_skipped_dir(name) {
                return Ok(());
            }
        }
        collect_source_files_recursive(&path, files)?;
    } else if metadata.is_file() && is_supported_source_file(&path) {
        files.push(path);
    }

    Ok(())
}

/// Recursively collect supported source files from a directory
fn collect_source_files_recursive(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    for entry_result in
        std::fs::read_dir(dir).with_context(|| format!("Failed to read directory: {}", dir.display()))?
    {
        let entry = entry_result?;
        let path = entry.path();
        let metadata = std::fs::symlink_metadata(&path)
            .with_context(|| format!("Failed to read metadata: {}", path.display()))?;
        process_dir_entry(path, metadata, files)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_collect_skips_node_modules_and_dot_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
        fs::create_dir_all(root.join(".cache")).unwrap();
        fs::write(root.join("src/b.ts"), "").unwrap();
        fs::write(root.join("src/a.js"), "").unwrap();
        fs::write(root.join("src/types.d.ts"), "").unwrap();
        fs::write(root.join("src/readme.md"), "").unwrap();
        fs::write(root.join("node_modules/pkg/index.js"), "").unwrap();
        fs::write(root.join(".cache/x.js"), "").unwrap();

        let files = collect_source_files(root).unwrap();
        assert_eq!(files, vec![root.join("src/a.js"), root.join("src/b.ts")]);
    }

    #[test]
    fn test_collect_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("one.mjs");
        fs::write(&file, "").unwrap();
        assert_eq!(collect_source_files(&file).unwrap(), vec![file]);
    }

    #[test]
    fn test_collect_missing_path_is_an_error() {
        assert!(collect_source_files(Path::new("/nonexistent/cbpromise/dir")).is_err());
    }

    #[test]
    fn test_transform_source_returns_rewrites() {
        let (module, rewrites) = transform_source(
            "export const load = async (id, cb) => cb(null, id);",
            "load.mjs",
            &CallbackConvention::default(),
        )
        .unwrap();
        assert_eq!(module.body.len(), 1);
        assert_eq!(rewrites.len(), 1);
        assert_eq!(rewrites[0].name.as_deref(), Some("load"));
    }

    #[test]
    fn test_transform_source_surfaces_rule_errors() {
        let err = transform_source(
            "async function* gen(cb) { yield 1; }",
            "gen.js",
            &CallbackConvention::default(),
        )
        .unwrap_err();
        assert!(err.downcast_ref::<TransformError>().is_some());
    }

    #[test]
    fn test_plan_skips_unparseable_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bad.js"), "async function (cb {").unwrap();
        fs::write(dir.path().join("good.js"), "async function ok(cb) { cb(null); }").unwrap();

        let reports = plan(dir.path(), PlanOptions::default()).unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].function, "ok");
    }
}
