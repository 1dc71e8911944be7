//! Interception hooks wrapped around synthesized methods
//!
//! Every decorator is an `around` hook: it receives the join point and
//! decides whether, when and with which arguments to continue. The
//! `before`, `after` and `on_error` adapters cover the common shapes.

use std::sync::Arc;

use crate::error::{CallError, CallResult};
use crate::join_point::JoinPoint;
use crate::value::Value;

/// An interception hook.
///
/// Returning without calling `jp.execute()` short-circuits the invocation:
/// neither the later decorators nor the implementation run, and the value
/// returned here becomes the method's result.
pub trait Decorator: Send + Sync {
    /// Intercept one invocation
    fn around(&self, jp: &JoinPoint<'_>) -> CallResult;
}

impl<D: Decorator + ?Sized> Decorator for Arc<D> {
    fn around(&self, jp: &JoinPoint<'_>) -> CallResult {
        (**self).around(jp)
    }
}

impl<D: Decorator + ?Sized> Decorator for Box<D> {
    fn around(&self, jp: &JoinPoint<'_>) -> CallResult {
        (**self).around(jp)
    }
}

/// Decorator built from a closure with full control over the invocation
pub struct Around<F>(F);

impl<F> Decorator for Around<F>
where
    F: Fn(&JoinPoint<'_>) -> CallResult + Send + Sync,
{
    fn around(&self, jp: &JoinPoint<'_>) -> CallResult {
        (self.0)(jp)
    }
}

/// Wrap a closure as an around decorator
pub fn around<F>(f: F) -> Around<F>
where
    F: Fn(&JoinPoint<'_>) -> CallResult + Send + Sync,
{
    Around(f)
}

/// Runs a hook before the invocation; an error from the hook aborts it
pub struct Before<F>(F);

impl<F> Decorator for Before<F>
where
    F: Fn(&JoinPoint<'_>) -> Result<(), CallError> + Send + Sync,
{
    fn around(&self, jp: &JoinPoint<'_>) -> CallResult {
        (self.0)(jp)?;
        jp.execute()
    }
}

/// Wrap a closure as a before hook
pub fn before<F>(f: F) -> Before<F>
where
    F: Fn(&JoinPoint<'_>) -> Result<(), CallError> + Send + Sync,
{
    Before(f)
}

/// Runs a hook on a successful result; the hook's return replaces it
pub struct After<F>(F);

impl<F> Decorator for After<F>
where
    F: Fn(&JoinPoint<'_>, Value) -> CallResult + Send + Sync,
{
    fn around(&self, jp: &JoinPoint<'_>) -> CallResult {
        let result = jp.execute()?;
        (self.0)(jp, result)
    }
}

/// Wrap a closure as an after hook
pub fn after<F>(f: F) -> After<F>
where
    F: Fn(&JoinPoint<'_>, Value) -> CallResult + Send + Sync,
{
    After(f)
}

/// Runs a hook when the invocation fails; it may recover or re-raise
pub struct OnError<F>(F);

impl<F> Decorator for OnError<F>
where
    F: Fn(&JoinPoint<'_>, CallError) -> CallResult + Send + Sync,
{
    fn around(&self, jp: &JoinPoint<'_>) -> CallResult {
        match jp.execute() {
            Ok(value) => Ok(value),
            Err(err) => (self.0)(jp, err),
        }
    }
}

/// Wrap a closure as an error hook
pub fn on_error<F>(f: F) -> OnError<F>
where
    F: Fn(&JoinPoint<'_>, CallError) -> CallResult + Send + Sync,
{
    OnError(f)
}
