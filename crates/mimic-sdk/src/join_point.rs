//! The context object handed to each decorator

use std::fmt;
use std::sync::Arc;

use crate::callable::Callable;
use crate::decorator::Decorator;
use crate::error::CallResult;
use crate::value::Value;

/// One intercepted invocation of a synthesized method.
///
/// A join point borrows everything from the dispatching frame; it is only
/// alive while the decorator that received it runs. `execute` continues
/// with the decorators that come after the current one and finally the
/// implementation closure.
#[derive(Clone, Copy)]
pub struct JoinPoint<'a> {
    class_name: &'a str,
    method_name: &'a str,
    receiver: Option<&'a Value>,
    arguments: &'a [Value],
    remaining: &'a [Arc<dyn Decorator>],
    target: &'a Callable,
}

impl<'a> JoinPoint<'a> {
    pub(crate) fn new(
        class_name: &'a str,
        method_name: &'a str,
        receiver: Option<&'a Value>,
        arguments: &'a [Value],
        remaining: &'a [Arc<dyn Decorator>],
        target: &'a Callable,
    ) -> Self {
        Self {
            class_name,
            method_name,
            receiver,
            arguments,
            remaining,
            target,
        }
    }

    /// Name of the synthesized class the method was invoked on
    pub fn class_name(&self) -> &'a str {
        self.class_name
    }

    /// Name of the intercepted method
    pub fn method_name(&self) -> &'a str {
        self.method_name
    }

    /// Instance the method was invoked on; `None` for static methods
    pub fn receiver(&self) -> Option<&'a Value> {
        self.receiver
    }

    /// Whether the intercepted method is static
    pub fn is_static(&self) -> bool {
        self.receiver.is_none()
    }

    /// Arguments of the invocation
    pub fn arguments(&self) -> &'a [Value] {
        self.arguments
    }

    /// Argument at `index`, if passed
    pub fn argument(&self, index: usize) -> Option<&'a Value> {
        self.arguments.get(index)
    }

    /// Number of decorators still to run after the current one
    pub fn remaining_decorators(&self) -> usize {
        self.remaining.len()
    }

    /// Continue the invocation with the original arguments
    pub fn execute(&self) -> CallResult {
        proceed(*self)
    }

    /// Continue the invocation with replacement arguments
    pub fn execute_with(&self, arguments: &[Value]) -> CallResult {
        proceed(JoinPoint {
            class_name: self.class_name,
            method_name: self.method_name,
            receiver: self.receiver,
            arguments,
            remaining: self.remaining,
            target: self.target,
        })
    }
}

fn proceed(jp: JoinPoint<'_>) -> CallResult {
    match jp.remaining.split_first() {
        Some((next, rest)) => next.around(&JoinPoint {
            class_name: jp.class_name,
            method_name: jp.method_name,
            receiver: jp.receiver,
            arguments: jp.arguments,
            remaining: rest,
            target: jp.target,
        }),
        None => jp.target.call(jp.arguments),
    }
}

impl fmt::Debug for JoinPoint<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JoinPoint")
            .field("class", &self.class_name)
            .field("method", &self.method_name)
            .field("static", &self.is_static())
            .field("arguments", &self.arguments)
            .field("remaining", &self.remaining.len())
            .finish()
    }
}
