//! Callback convention and the predicate deciding which functions are rewritten

use crate::ast::FunctionNode;
use crate::template::FIXED_NAMES;

/// Parameter name that marks a completion callback unless configured otherwise
pub const DEFAULT_CALLBACK_NAME: &str = "cb";

/// The "last parameter is the callback" convention
///
/// Matching is exact and case-sensitive. The wrapped-callback holder inside a
/// replacement body is named `_` followed by the callback name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackConvention {
    name: String,
}

impl CallbackConvention {
    pub fn new(name: impl Into<String>) -> Self {
        CallbackConvention { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fixed name of the wrapped callback holder
    pub fn wrapped_name(&self) -> String {
        format!("_{}", self.name)
    }

    /// Whether the rewrite applies to `node`
    ///
    /// Only `async` and the last parameter are consulted.
    pub fn matches(&self, node: &FunctionNode<'_>) -> bool {
        if !node.is_async() {
            return false;
        }
        node.last_param_name() == Some(self.name.as_str())
    }
}

impl Default for CallbackConvention {
    fn default() -> Self {
        CallbackConvention::new(DEFAULT_CALLBACK_NAME)
    }
}

const RESERVED_WORDS: &[&str] = &[
    "arguments", "await", "break", "case", "catch", "class", "const", "continue", "debugger",
    "default", "delete", "do", "else", "enum", "eval", "export", "extends", "false", "finally",
    "for", "function", "if", "implements", "import", "in", "instanceof", "interface", "let", "new",
    "null", "package", "private", "protected", "public", "return", "static", "super", "switch",
    "this", "throw", "true", "try", "typeof", "var", "void", "while", "with", "yield",
];

/// Check that `name` can be used as a JavaScript binding identifier
///
/// ASCII-only; strict-mode reserved words are rejected.
pub fn is_valid_identifier(name: &str) -> bool {
    if RESERVED_WORDS.contains(&name) {
        return false;
    }
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Check that `name` can serve as the callback parameter name
///
/// Besides being a valid identifier, it must not be one of the names the
/// replacement body binds or references on its own (`err`, `args`, `Promise`).
pub fn is_valid_callback_name(name: &str) -> bool {
    is_valid_identifier(name) && !FIXED_NAMES.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser;
    use swc_common::{sync::Lrc, SourceMap};
    use swc_ecma_ast::*;

    fn first_function(src: &str) -> Function {
        let cm: Lrc<SourceMap> = Default::default();
        let module = parser::parse_source(src, &cm, "test.js").unwrap();
        match module.body.into_iter().next() {
            Some(ModuleItem::Stmt(Stmt::Decl(Decl::Fn(decl)))) => *decl.function,
            other => panic!("expected a function declaration, got {:?}", other),
        }
    }

    fn first_arrow(src: &str) -> ArrowExpr {
        let cm: Lrc<SourceMap> = Default::default();
        let module = parser::parse_source(src, &cm, "test.js").unwrap();
        let Some(ModuleItem::Stmt(Stmt::Decl(Decl::Var(var)))) = module.body.into_iter().next() else {
            panic!("expected a variable declaration");
        };
        let init = var.decls.into_iter().next().and_then(|d| d.init).unwrap();
        match *init {
            Expr::Arrow(arrow) => arrow,
            other => panic!("expected an arrow function, got {:?}", other),
        }
    }

    fn matches_fn(src: &str) -> bool {
        let mut function = first_function(src);
        CallbackConvention::default().matches(&FunctionNode::Function(&mut function))
    }

    #[test]
    fn test_matches_async_with_trailing_cb() {
        assert!(matches_fn("async function load(path, cb) {}"));
        assert!(matches_fn("async function only(cb) {}"));
    }

    #[test]
    fn test_rejects_non_async() {
        assert!(!matches_fn("function load(path, cb) {}"));
    }

    #[test]
    fn test_rejects_other_last_param() {
        assert!(!matches_fn("async function load(cb, path) {}"));
        assert!(!matches_fn("async function load(callback) {}"));
        assert!(!matches_fn("async function load() {}"));
    }

    #[test]
    fn test_match_is_case_sensitive() {
        assert!(!matches_fn("async function load(path, CB) {}"));
        assert!(!matches_fn("async function load(path, Cb) {}"));
    }

    #[test]
    fn test_rejects_non_identifier_last_param() {
        assert!(!matches_fn("async function load(path, cb = noop) {}"));
        assert!(!matches_fn("async function load(path, ...cb) {}"));
        assert!(!matches_fn("async function load(path, { cb }) {}"));
    }

    #[test]
    fn test_matches_arrow() {
        let mut arrow = first_arrow("const load = async (path, cb) => path;");
        assert!(CallbackConvention::default().matches(&FunctionNode::Arrow(&mut arrow)));

        let mut sync_arrow = first_arrow("const load = (path, cb) => path;");
        assert!(!CallbackConvention::default().matches(&FunctionNode::Arrow(&mut sync_arrow)));
    }

    #[test]
    fn test_custom_convention() {
        let convention = CallbackConvention::new("done");
        let mut function = first_function("async function load(path, done) {}");
        assert!(convention.matches(&FunctionNode::Function(&mut function)));

        let mut function = first_function("async function load(path, cb) {}");
        assert!(!convention.matches(&FunctionNode::Function(&mut function)));
        assert_eq!(convention.wrapped_name(), "_done");
    }

    #[test]
    fn test_valid_identifier() {
        assert!(is_valid_identifier("cb"));
        assert!(is_valid_identifier("$done_1"));
        assert!(!is_valid_identifier(""));
        assert!(!is_valid_identifier("1cb"));
        assert!(!is_valid_identifier("c-b"));
        assert!(!is_valid_identifier("await"));
    }

    #[test]
    fn test_callback_name_excludes_template_names() {
        assert!(is_valid_callback_name("cb"));
        assert!(is_valid_callback_name("resolve"));
        assert!(is_valid_callback_name("reject"));
        assert!(!is_valid_callback_name("err"));
        assert!(!is_valid_callback_name("args"));
        assert!(!is_valid_callback_name("Promise"));
        assert!(!is_valid_callback_name("2cb"));
    }
}
