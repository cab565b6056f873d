//! Fresh identifier allocation for injected helpers
//!
//! Global invariants enforced:
//! - A generated name never equals any identifier text present in the module
//! - Two allocations within one pass never return the same name
//! - Candidates are tried in a fixed order, so output is deterministic

use crate::error::TransformError;
use std::collections::HashSet;
use swc_common::{SyntaxContext, DUMMY_SP};
use swc_ecma_ast::{Ident, Module};
use swc_ecma_visit::{Visit, VisitWith};
use tracing::trace;

/// Upper bound on suffixes tried for a single hint
const MAX_ATTEMPTS: u32 = 10_000;

/// Scope handle handed to the rule for fresh-name allocation
pub trait NameAllocator {
    /// Return an identifier derived from `hint` that collides with nothing
    /// visible in the scope and nothing previously allocated
    fn fresh_name(&mut self, hint: &str) -> Result<Ident, TransformError>;

    /// Mark a name as taken without allocating it
    fn reserve(&mut self, name: &str);
}

/// Module-wide identifier table
///
/// Every identifier text in the module is treated as taken, whether it is a
/// binding, a reference or a label. This over-approximates each function's
/// enclosing lexical scope, so a name free here is free in every scope.
#[derive(Debug, Default, Clone)]
pub struct ModuleScope {
    used: HashSet<String>,
}

impl ModuleScope {
    /// Build the table from every identifier in `module`
    pub fn from_module(module: &Module) -> Self {
        let mut collector = IdentCollector {
            used: HashSet::new(),
        };
        module.visit_with(&mut collector);
        ModuleScope {
            used: collector.used,
        }
    }

    /// Seed a scope from explicit names (used by tests and embedders without a module)
    pub fn with_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ModuleScope {
            used: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.used.contains(name)
    }
}

impl NameAllocator for ModuleScope {
    fn fresh_name(&mut self, hint: &str) -> Result<Ident, TransformError> {
        let base = normalize_hint(hint);
        for attempt in 1..=MAX_ATTEMPTS {
            let candidate = candidate_name(&base, attempt);
            if self.used.insert(candidate.clone()) {
                trace!(hint, name = %candidate, "allocated fresh identifier");
                return Ok(Ident::new(candidate.into(), DUMMY_SP, SyntaxContext::empty()));
            }
        }
        Err(TransformError::NameExhausted {
            hint: hint.to_string(),
            attempts: MAX_ATTEMPTS,
        })
    }

    fn reserve(&mut self, name: &str) {
        self.used.insert(name.to_string());
    }
}

/// Strip characters that cannot appear in an identifier, leading underscores
/// and trailing digits, so suffixes stay readable (`_fn`, `_fn2`, ...)
fn normalize_hint(hint: &str) -> String {
    let cleaned: String = hint
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '$')
        .collect();
    let trimmed = cleaned
        .trim_start_matches('_')
        .trim_end_matches(|c: char| c.is_ascii_digit());
    if trimmed.is_empty() {
        "temp".to_string()
    } else {
        trimmed.to_string()
    }
}

fn candidate_name(base: &str, attempt: u32) -> String {
    if attempt > 1 {
        format!("_{}{}", base, attempt)
    } else {
        format!("_{}", base)
    }
}

/// Visitor collecting every identifier text in a module
struct IdentCollector {
    used: HashSet<String>,
}

impl Visit for IdentCollector {
    fn visit_ident(&mut self, ident: &Ident) {
        self.used.insert(ident.sym.to_string());
    }
}
