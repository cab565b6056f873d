//! Module traversal driver
//!
//! Global invariants enforced:
//! - Nested functions are rewritten before their enclosing function
//! - A replacement body is never revisited within the same pass
//! - The first error stops the pass; later functions are left untouched
//!
//! Supported constructs:
//! - Function declarations (`FnDecl`)
//! - Function expressions (`FnExpr`)
//! - Arrow functions (`ArrowExpr`)
//! - Class methods and private methods (`ClassMethod`, `PrivateMethod`)
//! - Object literal methods (`MethodProp`)

use crate::ast::{FunctionNode, Rewrite};
use crate::error::TransformError;
use crate::matcher::CallbackConvention;
use crate::names::ModuleScope;
use crate::rule::PromisifyRule;
use swc_common::Span;
use swc_ecma_ast::*;
use swc_ecma_visit::{VisitMut, VisitMutWith};

/// Apply the promisify rule to every function in `module`
///
/// Returns one `Rewrite` per rewritten function, in the order rewrites were
/// applied (innermost first, then source order).
pub fn transform_module(
    module: &mut Module,
    convention: &CallbackConvention,
) -> Result<Vec<Rewrite>, TransformError> {
    let mut driver = RuleDriver {
        rule: PromisifyRule::new(convention.clone()),
        scope: ModuleScope::from_module(module),
        pending_name: None,
        rewrites: Vec::new(),
        error: None,
    };

    module.visit_mut_with(&mut driver);

    match driver.error {
        Some(err) => Err(err),
        None => Ok(driver.rewrites),
    }
}

/// Visitor applying the rule to each function node it reaches
struct RuleDriver {
    rule: PromisifyRule,
    scope: ModuleScope,
    /// Name for the next function node, set by the enclosing declaration
    pending_name: Option<String>,
    rewrites: Vec<Rewrite>,
    error: Option<TransformError>,
}

impl RuleDriver {
    fn rewrite(&mut self, mut node: FunctionNode<'_>, name: Option<String>) {
        if self.error.is_some() {
            return;
        }
        let span: Span = node.span();
        let display_name = name.as_deref().unwrap_or("<anonymous>").to_string();
        match self.rule.apply(&mut node, &mut self.scope, &display_name) {
            Ok(Some(names)) => self.rewrites.push(Rewrite { name, span, names }),
            Ok(None) => {}
            Err(err) => self.error = Some(err),
        }
    }
}

impl VisitMut for RuleDriver {
    fn visit_mut_fn_decl(&mut self, decl: &mut FnDecl) {
        self.pending_name = Some(decl.ident.sym.to_string());
        decl.function.visit_mut_with(self);
    }

    fn visit_mut_fn_expr(&mut self, expr: &mut FnExpr) {
        if let Some(ident) = &expr.ident {
            self.pending_name = Some(ident.sym.to_string());
        }
        expr.function.visit_mut_with(self);
    }

    fn visit_mut_class_method(&mut self, method: &mut ClassMethod) {
        method.key.visit_mut_with(self);
        self.pending_name = prop_name(&method.key);
        method.function.visit_mut_with(self);
    }

    fn visit_mut_private_method(&mut self, method: &mut PrivateMethod) {
        self.pending_name = Some(format!("#{}", method.key.name));
        method.function.visit_mut_with(self);
    }

    fn visit_mut_method_prop(&mut self, method: &mut MethodProp) {
        method.key.visit_mut_with(self);
        self.pending_name = prop_name(&method.key);
        method.function.visit_mut_with(self);
    }

    fn visit_mut_var_declarator(&mut self, declarator: &mut VarDeclarator) {
        declarator.name.visit_mut_with(self);
        if let (Pat::Ident(binding), Some(init)) = (&declarator.name, &declarator.init) {
            if matches!(&**init, Expr::Arrow(_) | Expr::Fn(FnExpr { ident: None, .. })) {
                self.pending_name = Some(binding.id.sym.to_string());
            }
        }
        declarator.init.visit_mut_with(self);
    }

    fn visit_mut_function(&mut self, function: &mut Function) {
        let name = self.pending_name.take();
        function.visit_mut_children_with(self);
        self.rewrite(FunctionNode::Function(function), name);
    }

    fn visit_mut_arrow_expr(&mut self, arrow: &mut ArrowExpr) {
        let name = self.pending_name.take();
        arrow.visit_mut_children_with(self);
        self.rewrite(FunctionNode::Arrow(arrow), name);
    }
}

fn prop_name(key: &PropName) -> Option<String> {
    match key {
        PropName::Ident(ident) => Some(ident.sym.to_string()),
        PropName::Str(str_lit) => Some(str_lit.value.to_atom_lossy().to_string()),
        PropName::Num(num) => Some(num.to_string()),
        _ => None,
    }
}
