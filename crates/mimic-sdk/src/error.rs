//! Per-call failure type
//!
//! Everything that can go wrong while a synthesized method runs is a
//! `CallError`. Failures raised by user closures or decorators travel through
//! the decorator chain untouched, so the caller sees exactly what was raised.

/// Result of invoking a callable, a decorator or a synthesized method
pub type CallResult = Result<crate::value::Value, CallError>;

/// Failure of a single method invocation
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CallError {
    /// Failure raised by an implementation closure or a decorator
    #[error("{kind}: {message}")]
    Raised {
        /// Failure kind (e.g. "InvalidArgument", "Timeout")
        kind: String,
        /// Human readable message
        message: String,
    },

    /// No method with this name exists on the class
    #[error("Call to undefined method {class}::{method}()")]
    UndefinedMethod {
        /// Class the call was dispatched on
        class: String,
        /// Requested method name
        method: String,
    },

    /// An instance method was invoked without an instance
    #[error("Non-static method {class}::{method}() cannot be called statically")]
    NonStaticCall {
        /// Class the call was dispatched on
        class: String,
        /// Requested method name
        method: String,
    },

    /// Fewer arguments than the declared signature requires
    #[error("Too few arguments to {class}::{method}(): {expected} required, {given} given")]
    ArgumentCount {
        /// Class the call was dispatched on
        class: String,
        /// Method name
        method: String,
        /// Number of required parameters
        expected: usize,
        /// Number of arguments passed
        given: usize,
    },

    /// An argument does not satisfy its parameter's type constraint
    #[error("Argument {position} passed to {class}::{method}() must be of type {expected}, {given} given")]
    ArgumentType {
        /// Class the call was dispatched on
        class: String,
        /// Method name
        method: String,
        /// 1-based argument position
        position: usize,
        /// Declared constraint
        expected: String,
        /// Type of the value actually passed
        given: String,
    },

    /// A value could not be converted into the requested Rust type
    #[error("Type mismatch: expected {expected}, got {got}")]
    Conversion {
        /// Expected type name
        expected: String,
        /// Actual type name
        got: String,
    },
}

impl CallError {
    /// Raise a user failure of the given kind
    pub fn raised(kind: impl Into<String>, message: impl Into<String>) -> Self {
        CallError::Raised {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// Kind of a raised failure, `None` for engine dispatch failures
    pub fn kind(&self) -> Option<&str> {
        match self {
            CallError::Raised { kind, .. } => Some(kind.as_str()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raised_display() {
        let err = CallError::raised("Timeout", "backend did not answer");
        assert_eq!(err.to_string(), "Timeout: backend did not answer");
        assert_eq!(err.kind(), Some("Timeout"));
    }

    #[test]
    fn test_dispatch_errors_have_no_kind() {
        let err = CallError::UndefinedMethod {
            class: "Mimic_1".to_string(),
            method: "nope".to_string(),
        };
        assert_eq!(err.kind(), None);
        assert_eq!(err.to_string(), "Call to undefined method Mimic_1::nope()");
    }
}
