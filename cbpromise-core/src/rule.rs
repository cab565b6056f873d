//! The promisify rule: matcher, allocator and expander wired together

use crate::ast::{FunctionNode, HelperNames};
use crate::error::TransformError;
use crate::matcher::{is_valid_callback_name, CallbackConvention};
use crate::names::NameAllocator;
use crate::template;
use tracing::debug;

/// Rewrites async callback-last functions so they also return a promise
#[derive(Debug, Clone, Default)]
pub struct PromisifyRule {
    convention: CallbackConvention,
}

impl PromisifyRule {
    pub fn new(convention: CallbackConvention) -> Self {
        PromisifyRule { convention }
    }

    pub fn convention(&self) -> &CallbackConvention {
        &self.convention
    }

    pub fn matches(&self, node: &FunctionNode<'_>) -> bool {
        self.convention.matches(node)
    }

    /// Apply the rule to one function node
    ///
    /// Returns `Ok(None)` and leaves the node untouched when it does not match.
    /// Preconditions are checked before the body is moved, so an error also
    /// leaves the node untouched.
    pub fn apply(
        &self,
        node: &mut FunctionNode<'_>,
        scope: &mut dyn NameAllocator,
        display_name: &str,
    ) -> Result<Option<HelperNames>, TransformError> {
        if !self.matches(node) {
            return Ok(None);
        }
        if !is_valid_callback_name(self.convention.name()) {
            return Err(TransformError::InvalidCallbackName {
                name: self.convention.name().to_string(),
            });
        }
        if !node.has_body() {
            return Err(TransformError::MissingBody {
                name: display_name.to_string(),
                span: node.span(),
            });
        }
        if node.is_generator() {
            return Err(TransformError::GeneratorBody {
                name: display_name.to_string(),
                span: node.span(),
            });
        }

        // The wrapped callback holder shares the executor scope with the
        // resolver and rejecter.
        let wrapped_callback = self.convention.wrapped_name();
        scope.reserve(&wrapped_callback);

        let names = HelperNames {
            inner_fn: scope.fresh_name("fn")?.sym.to_string(),
            resolve: scope.fresh_name("resolve")?.sym.to_string(),
            reject: scope.fresh_name("reject")?.sym.to_string(),
            wrapped_callback,
        };

        let is_async = node.is_async();
        let callback_type = node.last_param_type_ann();
        let body = node.take_body().ok_or_else(|| TransformError::MissingBody {
            name: display_name.to_string(),
            span: node.span(),
        })?;
        node.replace_body(template::expand(
            body,
            &names,
            &self.convention,
            is_async,
            callback_type,
        ));

        debug!(
            function = display_name,
            inner_fn = %names.inner_fn,
            resolve = %names.resolve,
            reject = %names.reject,
            "wrapped callback-last function in promise"
        );
        Ok(Some(names))
    }
}
