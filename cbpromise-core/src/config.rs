//! Configuration file support for cbpromise
//!
//! Loads project-specific configuration from JSON files.
//!
//! Search order:
//! 1. Explicit path (--config CLI flag)
//! 2. `.cbpromiserc.json` in project root
//! 3. `cbpromise.config.json` in project root
//! 4. `"cbpromise"` key in `package.json`
//!
//! All fields are optional. CLI flags take precedence over config file values.

use crate::matcher::{is_valid_callback_name, CallbackConvention, DEFAULT_CALLBACK_NAME};
use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default exclude patterns applied when no config is specified
const DEFAULT_EXCLUDES: &[&str] = &[
    "**/node_modules/**",
    "**/dist/**",
    "**/build/**",
    "**/*.d.ts",
    "**/*.min.js",
];

/// cbpromise configuration loaded from a JSON config file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Name of the trailing callback parameter (default: `cb`)
    #[serde(default)]
    pub callback_name: Option<String>,

    /// Glob patterns for files to include (default: all supported extensions)
    #[serde(default)]
    pub include: Vec<String>,

    /// Glob patterns for files to exclude (default: node_modules, dist, build, .d.ts)
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// Resolved configuration with compiled glob patterns
#[derive(Debug)]
pub struct ResolvedConfig {
    pub convention: CallbackConvention,
    /// Compiled include patterns (None means include all)
    pub include: Option<GlobSet>,
    /// Compiled exclude patterns
    pub exclude: GlobSet,
    /// Number of exclude patterns in effect
    pub exclude_count: usize,
    /// Path the config was loaded from (None if defaults)
    pub config_path: Option<PathBuf>,
}

impl ProjectConfig {
    /// Validate the configuration for logical errors
    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.callback_name {
            if !is_valid_callback_name(name) {
                anyhow::bail!(
                    "callback_name must be a plain JavaScript identifier other than err, args or Promise (got {:?})",
                    name
                );
            }
        }

        for pattern in &self.include {
            Glob::new(pattern).with_context(|| format!("invalid include pattern: {}", pattern))?;
        }
        for pattern in &self.exclude {
            Glob::new(pattern).with_context(|| format!("invalid exclude pattern: {}", pattern))?;
        }

        Ok(())
    }

    /// Resolve config into compiled form ready for use
    pub fn resolve(&self) -> Result<ResolvedConfig> {
        self.validate()?;

        let include = if self.include.is_empty() {
            None
        } else {
            Some(build_globset(self.include.iter().map(String::as_str))?)
        };

        // User excludes replace the defaults rather than extending them
        let (exclude, exclude_count) = if self.exclude.is_empty() {
            (build_globset(DEFAULT_EXCLUDES.iter().copied())?, DEFAULT_EXCLUDES.len())
        } else {
            (build_globset(self.exclude.iter().map(String::as_str))?, self.exclude.len())
        };

        let callback_name = self.callback_name.as_deref().unwrap_or(DEFAULT_CALLBACK_NAME);

        Ok(ResolvedConfig {
            convention: CallbackConvention::new(callback_name),
            include,
            exclude,
            exclude_count,
            config_path: None,
        })
    }
}

fn build_globset<'a>(patterns: impl Iterator<Item = &'a str>) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

impl ResolvedConfig {
    /// Check if a file path should be included based on include/exclude patterns
    pub fn should_include(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy();

        if self.exclude.is_match(path_str.as_ref()) {
            return false;
        }

        if let Some(ref include) = self.include {
            return include.is_match(path_str.as_ref());
        }

        true
    }

    /// Replace the callback convention (CLI override)
    pub fn with_callback_name(mut self, name: &str) -> Result<Self> {
        if !is_valid_callback_name(name) {
            anyhow::bail!(
                "--callback-name must be a plain JavaScript identifier other than err, args or Promise (got {:?})",
                name
            );
        }
        self.convention = CallbackConvention::new(name);
        Ok(self)
    }

    /// Build a ResolvedConfig with all defaults (no config file)
    pub fn defaults() -> Result<Self> {
        ProjectConfig::default().resolve()
    }
}

/// Discover and load a config file from the project root
///
/// Returns `None` if no config file is found (use defaults).
pub fn discover_config(project_root: &Path) -> Result<Option<(ProjectConfig, PathBuf)>> {
    for name in [".cbpromiserc.json", "cbpromise.config.json"] {
        let path = project_root.join(name);
        if path.exists() {
            let config = load_config_file(&path)?;
            return Ok(Some((config, path)));
        }
    }

    let pkg_path = project_root.join("package.json");
    if pkg_path.exists() {
        if let Some(config) = load_from_package_json(&pkg_path)? {
            return Ok(Some((config, pkg_path)));
        }
    }

    Ok(None)
}

/// Load config from an explicit file path
pub fn load_config_file(path: &Path) -> Result<ProjectConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;

    let config: ProjectConfig = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse config file: {}", path.display()))?;

    config
        .validate()
        .with_context(|| format!("invalid config in: {}", path.display()))?;

    Ok(config)
}

/// Load config from the "cbpromise" key in package.json
fn load_from_package_json(path: &Path) -> Result<Option<ProjectConfig>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    let pkg: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse {}", path.display()))?;

    match pkg.get("cbpromise") {
        Some(value) => {
            let config: ProjectConfig = serde_json::from_value(value.clone())
                .with_context(|| format!("invalid cbpromise config in {}", path.display()))?;
            config
                .validate()
                .with_context(|| format!("invalid cbpromise config in {}", path.display()))?;
            Ok(Some(config))
        }
        None => Ok(None),
    }
}

/// Load and resolve config for a project
///
/// If `config_path` is provided, loads from that file.
/// Otherwise, discovers config from the project root.
/// Returns default config if nothing is found.
pub fn load_and_resolve(project_root: &Path, config_path: Option<&Path>) -> Result<ResolvedConfig> {
    let (config, source_path) = if let Some(path) = config_path {
        let config = load_config_file(path)?;
        (config, Some(path.to_path_buf()))
    } else {
        match discover_config(project_root)? {
            Some((config, path)) => (config, Some(path)),
            None => (ProjectConfig::default(), None),
        }
    };

    let mut resolved = config.resolve()?;
    resolved.config_path = source_path;
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_default_config_is_valid() {
        let resolved = ResolvedConfig::defaults().expect("default config should resolve");
        assert!(resolved.include.is_none());
        assert_eq!(resolved.convention.name(), "cb");
        assert_eq!(resolved.exclude_count, DEFAULT_EXCLUDES.len());
        assert!(resolved.config_path.is_none());
    }

    #[test]
    fn test_parse_full_config() {
        let json = r#"{
            "callback_name": "done",
            "include": ["src/**/*.js"],
            "exclude": ["**/vendor/**"]
        }"#;
        let config: ProjectConfig = serde_json::from_str(json).unwrap();
        let resolved = config.resolve().unwrap();
        assert_eq!(resolved.convention.name(), "done");
        assert!(resolved.include.is_some());
        assert_eq!(resolved.exclude_count, 1);
    }

    #[test]
    fn test_reject_unknown_fields() {
        let result: Result<ProjectConfig, _> = serde_json::from_str(r#"{"callbackName": "cb"}"#);
        assert!(result.is_err(), "unknown fields should be rejected");
    }

    #[test]
    fn test_reject_invalid_callback_name() {
        for name in ["", "my-cb", "9cb", "function", "err", "args", "Promise"] {
            let config = ProjectConfig {
                callback_name: Some(name.to_string()),
                ..Default::default()
            };
            assert!(config.validate().is_err(), "{:?} should be rejected", name);
        }
    }

    #[test]
    fn test_accept_helper_hint_callback_names() {
        for name in ["resolve", "reject", "fn"] {
            let config = ProjectConfig {
                callback_name: Some(name.to_string()),
                ..Default::default()
            };
            assert!(config.validate().is_ok(), "{:?} should be accepted", name);
        }
    }

    #[test]
    fn test_reject_invalid_glob_pattern() {
        let config: ProjectConfig = serde_json::from_str(r#"{"include": ["[invalid"]}"#).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_should_include_default_excludes() {
        let resolved = ResolvedConfig::defaults().unwrap();
        assert!(resolved.should_include(Path::new("src/api/users.js")));
        assert!(!resolved.should_include(Path::new("project/node_modules/pkg/index.js")));
        assert!(!resolved.should_include(Path::new("project/dist/bundle.js")));
        assert!(!resolved.should_include(Path::new("src/types.d.ts")));
    }

    #[test]
    fn test_should_include_with_include_patterns() {
        let config: ProjectConfig = serde_json::from_str(r#"{"include": ["src/**"]}"#).unwrap();
        let resolved = config.resolve().unwrap();
        assert!(resolved.should_include(Path::new("src/a.js")));
        assert!(!resolved.should_include(Path::new("scripts/a.js")));
    }

    #[test]
    fn test_cli_callback_override() {
        let resolved = ResolvedConfig::defaults().unwrap().with_callback_name("next").unwrap();
        assert_eq!(resolved.convention.name(), "next");
        assert!(ResolvedConfig::defaults().unwrap().with_callback_name("a b").is_err());
        assert!(ResolvedConfig::defaults().unwrap().with_callback_name("err").is_err());
    }

    #[test]
    fn test_discover_rc_file_first() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".cbpromiserc.json"), r#"{"callback_name": "rc"}"#).unwrap();
        fs::write(dir.path().join("cbpromise.config.json"), r#"{"callback_name": "other"}"#).unwrap();

        let resolved = load_and_resolve(dir.path(), None).unwrap();
        assert_eq!(resolved.convention.name(), "rc");
        assert_eq!(resolved.config_path, Some(dir.path().join(".cbpromiserc.json")));
    }

    #[test]
    fn test_discover_package_json_key() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("package.json"),
            r#"{"name": "app", "cbpromise": {"callback_name": "callback"}}"#,
        )
        .unwrap();

        let resolved = load_and_resolve(dir.path(), None).unwrap();
        assert_eq!(resolved.convention.name(), "callback");
    }

    #[test]
    fn test_package_json_without_key_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("package.json"), r#"{"name": "app"}"#).unwrap();

        let resolved = load_and_resolve(dir.path(), None).unwrap();
        assert_eq!(resolved.convention.name(), "cb");
        assert!(resolved.config_path.is_none());
    }

    #[test]
    fn test_explicit_path_overrides_discovery() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".cbpromiserc.json"), r#"{"callback_name": "rc"}"#).unwrap();
        let explicit = dir.path().join("custom.json");
        fs::write(&explicit, r#"{"callback_name": "explicit"}"#).unwrap();

        let resolved = load_and_resolve(dir.path(), Some(&explicit)).unwrap();
        assert_eq!(resolved.convention.name(), "explicit");
    }

    #[test]
    fn test_invalid_config_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".cbpromiserc.json"), r#"{"callback_name": 3}"#).unwrap();
        assert!(load_and_resolve(dir.path(), None).is_err());
    }
}
