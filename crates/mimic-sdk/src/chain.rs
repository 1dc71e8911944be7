//! Ordered decorator chain bound to one method

use std::fmt;
use std::sync::Arc;

use crate::callable::Callable;
use crate::decorator::Decorator;
use crate::error::CallResult;
use crate::join_point::JoinPoint;
use crate::value::Value;

/// Decorators in registration order; the first registered is outermost.
///
/// The chain is immutable once built and cheap to clone, so every method of
/// a class can share the same snapshot.
#[derive(Clone)]
pub struct DecoratorChain {
    decorators: Arc<[Arc<dyn Decorator>]>,
}

impl DecoratorChain {
    /// Build a chain from decorators in registration order
    pub fn new(decorators: Vec<Arc<dyn Decorator>>) -> Self {
        Self {
            decorators: decorators.into(),
        }
    }

    /// Chain with no decorators; invocation goes straight to the target
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Number of decorators
    pub fn len(&self) -> usize {
        self.decorators.len()
    }

    /// Whether the chain has no decorators
    pub fn is_empty(&self) -> bool {
        self.decorators.is_empty()
    }

    /// Run one invocation through the chain and then `target`
    pub fn invoke(
        &self,
        class_name: &str,
        method_name: &str,
        receiver: Option<&Value>,
        arguments: &[Value],
        target: &Callable,
    ) -> CallResult {
        JoinPoint::new(
            class_name,
            method_name,
            receiver,
            arguments,
            &self.decorators,
            target,
        )
        .execute()
    }
}

impl Default for DecoratorChain {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for DecoratorChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DecoratorChain({} decorators)", self.decorators.len())
    }
}
