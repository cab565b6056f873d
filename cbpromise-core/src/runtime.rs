//! Rust model of the dual-mode call contract produced by the rewrite
//!
//! A rewritten JavaScript function can be awaited or given a trailing
//! `(err, ...results)` callback, and both observe the same outcome. This
//! module expresses that contract with Rust types:
//!
//! - the optional user callback is `Option<Callback<T, E>>` instead of a
//!   runtime `typeof` check
//! - trailing result values are packed into an ordered `Vec<T>`
//! - the first settlement wins; later calls still reach the user callback
//!   but never change the outcome of the `Deferred`

use futures::channel::oneshot;
use parking_lot::Mutex;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use thiserror::Error;
use tracing::trace;

/// User-supplied completion callback, invoked as `(err, results)`
pub type Callback<T, E> = Box<dyn FnMut(Option<&E>, &[T]) + Send>;

type Outcome<T, E> = Result<Vec<T>, E>;

/// Why a `Deferred` did not fulfill
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeferredError<E> {
    /// The wrapped callback was invoked with an error
    #[error("deferred result was rejected")]
    Rejected(E),
    /// Every wrapped callback handle was dropped before settling
    #[error("deferred result was abandoned without settling")]
    Abandoned,
}

struct Shared<T, E> {
    callback: Mutex<Option<Callback<T, E>>>,
    settle: Mutex<Option<oneshot::Sender<Outcome<T, E>>>>,
}

/// The callback handed to the function body
///
/// Cloning yields another handle to the same settlement slot.
pub struct WrappedCallback<T, E> {
    shared: Arc<Shared<T, E>>,
}

impl<T, E> Clone for WrappedCallback<T, E> {
    fn clone(&self) -> Self {
        WrappedCallback {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T, E> fmt::Debug for WrappedCallback<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WrappedCallback")
            .field("settled", &self.is_settled())
            .field("callback", &"<function>")
            .finish()
    }
}

impl<T, E> WrappedCallback<T, E> {
    /// Invoke with the raw `(err, ...results)` convention
    ///
    /// The user callback, if any, sees the same values first. Then `Some(err)`
    /// rejects and `None` fulfills with `results`.
    pub fn call(&self, err: Option<E>, results: Vec<T>) {
        // Taken out for the call so a re-entrant invocation cannot deadlock;
        // such an invocation skips the user callback.
        let taken = self.shared.callback.lock().take();
        if let Some(mut callback) = taken {
            callback(err.as_ref(), &results);
            *self.shared.callback.lock() = Some(callback);
        }

        let Some(sender) = self.shared.settle.lock().take() else {
            trace!("ignoring settlement after the first");
            return;
        };
        let outcome = match err {
            Some(err) => Err(err),
            None => Ok(results),
        };
        // The caller may have dropped the Deferred; callback-only use is fine.
        let _ = sender.send(outcome);
    }

    /// Fulfill: same as `call(None, results)`
    pub fn resolve(&self, results: Vec<T>) {
        self.call(None, results);
    }

    /// Reject: same as `call(Some(err), vec![])`
    pub fn reject(&self, err: E) {
        self.call(Some(err), Vec::new());
    }

    /// Whether a settlement has already happened
    pub fn is_settled(&self) -> bool {
        self.shared.settle.lock().is_none()
    }
}

/// Deferred result returned to the caller
///
/// Resolves to the packed result values or a `DeferredError`.
#[must_use = "a Deferred does nothing unless awaited or polled"]
pub struct Deferred<T, E> {
    receiver: oneshot::Receiver<Outcome<T, E>>,
}

impl<T, E> Future for Deferred<T, E> {
    type Output = Result<Vec<T>, DeferredError<E>>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.receiver).poll(cx) {
            Poll::Ready(Ok(Ok(results))) => Poll::Ready(Ok(results)),
            Poll::Ready(Ok(Err(err))) => Poll::Ready(Err(DeferredError::Rejected(err))),
            Poll::Ready(Err(oneshot::Canceled)) => Poll::Ready(Err(DeferredError::Abandoned)),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Run `body` with a wrapped callback and return the deferred result
///
/// `body` runs synchronously, like a promise executor; it may move the
/// wrapped callback into another thread or task and settle later. An `Err`
/// returned by `body` goes through the wrapped callback exactly like
/// `reject`, so the user callback sees it too.
pub fn call_dual<T, E, F>(body: F, callback: Option<Callback<T, E>>) -> Deferred<T, E>
where
    F: FnOnce(WrappedCallback<T, E>) -> Result<(), E>,
{
    let (sender, receiver) = oneshot::channel();
    let wrapped = WrappedCallback {
        shared: Arc::new(Shared {
            callback: Mutex::new(callback),
            settle: Mutex::new(Some(sender)),
        }),
    };
    if let Err(err) = body(wrapped.clone()) {
        wrapped.reject(err);
    }
    Deferred { receiver }
}
