//! Errors raised by the promisify rule
//!
//! A function that does not match the callback convention is never an error.
//! These variants cover matching functions the rule cannot rewrite without
//! producing a malformed tree.

use swc_common::Span;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransformError {
    /// The function matched but has no body (overload signature or `declare`)
    #[error("async function `{name}` ends in a callback parameter but has no body")]
    MissingBody { name: String, span: Span },

    /// Async generators cannot have their body moved into a plain async arrow
    #[error("async generator `{name}` cannot be rewritten: `yield` is not valid in the inner function")]
    GeneratorBody { name: String, span: Span },

    /// The callback name would clash with a name the replacement body uses itself
    #[error("callback name `{name}` clashes with a name used by the generated code")]
    InvalidCallbackName { name: String },

    /// The allocator ran out of candidate names for a hint
    #[error("could not allocate a fresh identifier for hint `{hint}` after {attempts} attempts")]
    NameExhausted { hint: String, attempts: u32 },
}

impl TransformError {
    /// Source span of the offending function, when one is known
    pub fn span(&self) -> Option<Span> {
        match self {
            TransformError::MissingBody { span, .. } | TransformError::GeneratorBody { span, .. } => {
                Some(*span)
            }
            TransformError::InvalidCallbackName { .. } | TransformError::NameExhausted { .. } => None,
        }
    }
}
