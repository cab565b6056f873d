//! AST adapter layer for rewritable functions
//!
//! SWC models plain functions (`Function`, shared by declarations, expressions
//! and methods) and arrow functions (`ArrowExpr`) as separate node types. The
//! rule treats both identically, so it works through this borrowed view.

use swc_common::{Span, SyntaxContext, DUMMY_SP};
use swc_ecma_ast::*;

/// Mutable view of a function node for the duration of one rewrite
///
/// The view never outlives the visitor call that created it.
pub enum FunctionNode<'a> {
    Function(&'a mut Function),
    Arrow(&'a mut ArrowExpr),
}

impl FunctionNode<'_> {
    pub fn is_async(&self) -> bool {
        match self {
            FunctionNode::Function(function) => function.is_async,
            FunctionNode::Arrow(arrow) => arrow.is_async,
        }
    }

    pub fn is_generator(&self) -> bool {
        match self {
            FunctionNode::Function(function) => function.is_generator,
            FunctionNode::Arrow(arrow) => arrow.is_generator,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            FunctionNode::Function(function) => function.span,
            FunctionNode::Arrow(arrow) => arrow.span,
        }
    }

    /// Name of the last parameter, if it is a plain identifier
    ///
    /// Destructuring, default values and rest parameters have no single name.
    pub fn last_param_name(&self) -> Option<&str> {
        match self.last_param()? {
            Pat::Ident(binding) => Some(&*binding.id.sym),
            _ => None,
        }
    }

    /// TypeScript annotation on the last parameter, if it is a plain identifier
    pub fn last_param_type_ann(&self) -> Option<Box<TsTypeAnn>> {
        match self.last_param()? {
            Pat::Ident(binding) => binding.type_ann.clone(),
            _ => None,
        }
    }

    fn last_param(&self) -> Option<&Pat> {
        match self {
            FunctionNode::Function(function) => function.params.last().map(|p| &p.pat),
            FunctionNode::Arrow(arrow) => arrow.params.last(),
        }
    }

    pub fn has_body(&self) -> bool {
        match self {
            FunctionNode::Function(function) => function.body.is_some(),
            FunctionNode::Arrow(_) => true,
        }
    }

    /// Move the body out of the node
    ///
    /// Arrow functions are left with an empty block until `replace_body` runs.
    pub fn take_body(&mut self) -> Option<BlockStmtOrExpr> {
        match self {
            FunctionNode::Function(function) => function.body.take().map(BlockStmtOrExpr::BlockStmt),
            FunctionNode::Arrow(arrow) => {
                let empty = Box::new(BlockStmtOrExpr::BlockStmt(empty_block()));
                Some(*std::mem::replace(&mut arrow.body, empty))
            }
        }
    }

    /// Install the replacement body and drop the `async` modifier
    ///
    /// The wrapper constructs its promise synchronously; only the inner
    /// function holding the original body stays async.
    pub fn replace_body(&mut self, body: BlockStmt) {
        match self {
            FunctionNode::Function(function) => {
                function.body = Some(body);
                function.is_async = false;
            }
            FunctionNode::Arrow(arrow) => {
                arrow.body = Box::new(BlockStmtOrExpr::BlockStmt(body));
                arrow.is_async = false;
            }
        }
    }
}

fn empty_block() -> BlockStmt {
    BlockStmt {
        span: DUMMY_SP,
        ctxt: SyntaxContext::empty(),
        stmts: vec![],
    }
}

/// Record of one applied rewrite
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    /// Declared or inferred function name (`None` for anonymous functions)
    pub name: Option<String>,
    pub span: Span,
    pub names: HelperNames,
}

impl Rewrite {
    /// Extract the start line number from the span
    pub fn start_line(&self, source_map: &swc_common::SourceMap) -> u32 {
        let loc = source_map.lookup_char_pos(self.span.lo);
        loc.line as u32
    }
}

/// Identifier texts injected into one replacement body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelperNames {
    /// Holder of the inner function that carries the original body
    pub inner_fn: String,
    pub resolve: String,
    pub reject: String,
    /// Fixed name derived from the callback convention
    pub wrapped_callback: String,
}
